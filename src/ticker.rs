// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The tick service itself.
//!
//! A [`Ticker`] is designed to live in a `static`, shared by reference between
//! the timer ISR (which advances it) and the rest of the program (which reads
//! it and waits on it):
//!
//! ```ignore
//! static TICKER: Ticker<Tick64> = Ticker::new();
//!
//! #[interrupt]
//! fn TIMER_IRQ_0() {
//!     TICKER.on_interrupt_if(|| acknowledge_alarm());
//! }
//! ```
//!
//! It starts out [`State::Uninitialized`]. [`Ticker::init`] zeroes the
//! counter, starts the timer, and moves it to [`State::Running`], where it
//! stays. There's no way to stop it.
//!
//! Calling `init` a second time is allowed, and resets the counter to zero
//! again. Anybody holding a tick value from before that will get nonsense if
//! they compare it to one from after, so don't re-initialize once other code
//! has started reading the clock.

use core::future::Future;
use core::pin::Pin;
use core::task::{Context, Poll};

use portable_atomic::{AtomicBool, AtomicU32, Ordering};

use crate::cheap_assert;
use crate::counter::{Counter, Tick32, TickWord};
use crate::cycles::{self, CycleBurner};
use crate::source::TickSource;
use crate::wait::WaitPolicy;

/// Lifecycle of a [`Ticker`].
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum State {
    /// `init` hasn't been called. The counter isn't advancing.
    Uninitialized,
    /// The timer is running and the counter advances once per millisecond.
    Running,
}

/// A millisecond tick counter and the delays built on it.
///
/// `C` selects the counter width; see [`Tick32`] and
/// [`Tick64`][crate::Tick64].
#[derive(Debug)]
pub struct Ticker<C: Counter = Tick32> {
    counter: C,
    /// Core clock recorded by `init`, used to scale `delay_us`.
    clock_hz: AtomicU32,
    running: AtomicBool,
}

impl<C: Counter> Ticker<C> {
    /// Creates an uninitialized ticker. This is `const` so it can initialize a
    /// `static`.
    pub const fn new() -> Self {
        Self {
            counter: C::INIT,
            clock_hz: AtomicU32::new(0),
            running: AtomicBool::new(false),
        }
    }

    /// Returns where this ticker is in its lifecycle.
    pub fn state(&self) -> State {
        if self.running.load(Ordering::Acquire) {
            State::Running
        } else {
            State::Uninitialized
        }
    }

    /// Resets the tick counter to zero and starts `source` interrupting at
    /// 1 kHz, given a core clock of `clock_hz`.
    ///
    /// Call this once, before anything else, and before the timer interrupt is
    /// enabled. (If the source is what enables the interrupt, which is the
    /// usual case, that takes care of itself.)
    pub fn init(&self, source: &mut impl TickSource, clock_hz: u32) {
        self.init_at(source, clock_hz, C::Ticks::ZERO);
    }

    /// Like [`init`][Self::init], but starts the counter at `start` instead of
    /// zero.
    ///
    /// Starting just short of [`TickWord::MAX`] makes the counter wrap shortly
    /// after boot, instead of a month and a half later, which is a good way to
    /// flush out code that gets the wraparound wrong.
    pub fn init_at(&self, source: &mut impl TickSource, clock_hz: u32, start: C::Ticks) {
        self.counter.reset_to(start);
        self.clock_hz.store(clock_hz, Ordering::Release);
        self.running.store(true, Ordering::Release);

        #[cfg(feature = "defmt")]
        defmt::debug!(
            "ticker: {=u32} Hz core, {=u32}-bit counter",
            clock_hz,
            C::Ticks::BITS,
        );

        source.start(clock_hz);
    }

    /// Advances the counter by one tick. Call this, and only this, from the
    /// timer ISR.
    #[inline(always)]
    pub fn on_interrupt(&self) {
        self.counter.increment();
    }

    /// Advances the counter by one tick if `pending` reports that the tick
    /// event is what caused this interrupt. Returns whether it did.
    ///
    /// This is for timer interrupts that are shared with other events. The
    /// `pending` check is expected to acknowledge the event as well, so that it
    /// doesn't immediately fire again.
    #[inline(always)]
    pub fn on_interrupt_if(&self, pending: impl FnOnce() -> bool) -> bool {
        let hit = pending();
        if hit {
            self.counter.increment();
        }
        hit
    }

    /// Returns the current tick count at the full width of the counter.
    pub fn now(&self) -> C::Ticks {
        self.counter.load()
    }

    /// Returns the current tick count in milliseconds, narrowed to 32 bits.
    pub fn now_ms(&self) -> u32 {
        self.now().low_u32()
    }

    /// Returns the number of ticks since the counter read `start`.
    ///
    /// This is a modular difference, and is correct across a wraparound of the
    /// counter, so long as less than one full counter period has passed.
    pub fn elapsed_since(&self, start: C::Ticks) -> C::Ticks {
        self.now().wrapping_sub(start)
    }

    /// Blocks until the counter has advanced by at least `ms` ticks, calling
    /// `policy` between checks.
    ///
    /// `delay_ms(0)` returns without waiting. For any other value, the start
    /// point is taken somewhere in the middle of the current tick, so the time
    /// that actually passes is between `ms - 1` and `ms` milliseconds, plus
    /// however long `policy` takes to notice the last tick.
    ///
    /// # Panics
    ///
    /// If the ticker hasn't been initialized, since the counter would never
    /// advance and this would never return.
    pub fn delay_ms(&self, ms: u32, policy: &mut impl WaitPolicy) {
        cheap_assert!(self.state() == State::Running);

        let start = self.now();
        let ticks = C::Ticks::from_millis(ms);
        while self.elapsed_since(start) < ticks {
            policy.wait();
        }
    }

    /// Busy-waits for at least `us` microseconds by burning core cycles.
    ///
    /// This doesn't read the tick counter at all; the cycle count is computed
    /// from the core clock given to `init`. See the [`cycles`][crate::cycles]
    /// module for the available burners.
    ///
    /// # Panics
    ///
    /// If the ticker hasn't been initialized, since the core clock isn't known.
    pub fn delay_us(&self, us: u32, burner: &mut impl CycleBurner) {
        cheap_assert!(self.state() == State::Running);

        let clock_hz = self.clock_hz.load(Ordering::Acquire);
        cycles::burn(burner, cycles::cycles_for_micros(us, clock_hz));
    }

    /// Returns a future that resolves once the counter has advanced by at
    /// least `ms` ticks, measured from when `sleep_ms` is called (not when
    /// it's first polled).
    ///
    /// This is the cooperative flavor of [`delay_ms`][Self::delay_ms]: instead
    /// of blocking, it returns `Pending` and asks to be polled again, so that
    /// other tasks can run in the meantime.
    ///
    /// # Panics
    ///
    /// If the ticker hasn't been initialized.
    ///
    /// # Cancellation
    ///
    /// Dropping this future does nothing in particular.
    pub fn sleep_ms(&self, ms: u32) -> SleepMs<'_, C> {
        cheap_assert!(self.state() == State::Running);

        SleepMs {
            ticker: self,
            start: self.now(),
            ticks: C::Ticks::from_millis(ms),
        }
    }
}

impl Ticker<Tick32> {
    /// Returns the current tick count scaled to microseconds.
    ///
    /// This is only as precise as the tick, which is to say, to the nearest
    /// millisecond. It's a unit conversion, not a better clock.
    pub fn now_us(&self) -> u64 {
        u64::from(self.now()) * 1000
    }
}

impl<C: Counter> Default for Ticker<C> {
    fn default() -> Self {
        Self::new()
    }
}

/// Future returned by [`Ticker::sleep_ms`].
#[must_use = "futures do nothing unless you `.await` or poll them"]
#[derive(Debug)]
pub struct SleepMs<'a, C: Counter> {
    ticker: &'a Ticker<C>,
    start: C::Ticks,
    ticks: C::Ticks,
}

impl<C: Counter> Future for SleepMs<'_, C> {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if self.ticker.elapsed_since(self.start) >= self.ticks {
            Poll::Ready(())
        } else {
            // Nothing will wake us when the tick arrives, so ask to be polled
            // again next time around.
            cx.waker().wake_by_ref();
            Poll::Pending
        }
    }
}

#[cfg(test)]
mod tests {
    use core::pin::pin;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    use futures::task::ArcWake;

    use super::*;
    use crate::counter::Tick64;

    fn no_source(_: u32) {}

    fn running<C: Counter>() -> Ticker<C> {
        let t = Ticker::new();
        t.init(&mut no_source, 32_000_000);
        t
    }

    fn running_at<C: Counter>(start: C::Ticks) -> Ticker<C> {
        let t = Ticker::new();
        t.init_at(&mut no_source, 32_000_000, start);
        t
    }

    /// Runs `delay_ms(ms)` with a policy that fires one simulated ISR per wait,
    /// and returns how many ISRs it took.
    fn ticks_to_delay<C: Counter>(t: &Ticker<C>, ms: u32) -> u32 {
        let mut fired = 0;
        t.delay_ms(ms, &mut || {
            fired += 1;
            t.on_interrupt();
        });
        fired
    }

    #[test]
    fn starts_uninitialized() {
        let t = Ticker::<Tick32>::new();
        assert_eq!(t.state(), State::Uninitialized);
        assert_eq!(t.now(), 0);
    }

    #[test]
    fn init_starts_source_with_clock() {
        let t = Ticker::<Tick32>::new();
        let mut seen = None;
        t.init(&mut |hz: u32| seen = Some(hz), 48_000_000);
        assert_eq!(seen, Some(48_000_000));
        assert_eq!(t.state(), State::Running);
    }

    #[test]
    fn reinit_resets_to_zero() {
        let t = running::<Tick64>();
        for _ in 0..25 {
            t.on_interrupt();
        }
        assert_eq!(t.now(), 25);
        t.init(&mut no_source, 32_000_000);
        assert_eq!(t.now(), 0);
        assert_eq!(t.state(), State::Running);
    }

    #[test]
    fn counter_is_monotonic() {
        let t = running::<Tick32>();
        let mut last = t.now_ms();
        for _ in 0..1000 {
            t.on_interrupt();
            let now = t.now_ms();
            assert!(now > last);
            last = now;
        }
    }

    #[test]
    fn shared_vector_only_counts_tick_events() {
        let t = running::<Tick32>();
        assert!(!t.on_interrupt_if(|| false));
        assert_eq!(t.now(), 0);
        assert!(t.on_interrupt_if(|| true));
        assert_eq!(t.now(), 1);
    }

    #[test]
    fn delay_zero_does_not_wait() {
        let t = running::<Tick32>();
        let mut waits = 0;
        t.delay_ms(0, &mut || waits += 1);
        assert_eq!(waits, 0);
    }

    #[test]
    fn delay_waits_exactly_the_requested_ticks() {
        let t32 = running::<Tick32>();
        let t64 = running::<Tick64>();
        for ms in [1, 2, 17, 1000] {
            assert_eq!(ticks_to_delay(&t32, ms), ms);
            assert_eq!(ticks_to_delay(&t64, ms), ms);
        }
    }

    #[test]
    fn delay_counts_ticks_already_in_flight() {
        // Ticks arriving between checks without the policy's help still count.
        let t = running::<Tick32>();
        let mut waits = 0;
        t.delay_ms(10, &mut || {
            waits += 1;
            for _ in 0..4 {
                t.on_interrupt();
            }
        });
        assert_eq!(waits, 3);
        assert_eq!(t.now(), 12);
    }

    #[test]
    fn delay_spans_32_bit_wraparound() {
        let t = running_at::<Tick32>(u32::MAX - 2);
        assert_eq!(ticks_to_delay(&t, 10), 10);
        assert_eq!(t.now(), 7);
    }

    #[test]
    fn delay_spans_64_bit_wraparound() {
        let t = running_at::<Tick64>(u64::MAX - 2);
        assert_eq!(ticks_to_delay(&t, 10), 10);
        assert_eq!(t.now(), 7);
    }

    #[test]
    fn naive_deadline_fails_at_wraparound() {
        // `now >= start + d` with the deadline computed modularly: the
        // deadline wraps to a small number and the comparison is satisfied
        // at once, nine ticks early.
        let start = u32::MAX - 2;
        let deadline = start.wrapping_add(10);
        let now = start.wrapping_add(1);
        assert!(now >= deadline);
        assert!(now.wrapping_sub(start) < 10);
    }

    #[test]
    fn elapsed_since_is_modular() {
        let t = running_at::<Tick32>(u32::MAX);
        let start = t.now();
        t.on_interrupt();
        t.on_interrupt();
        assert_eq!(t.now(), 1);
        assert_eq!(t.elapsed_since(start), 2);
    }

    #[test]
    fn now_ms_narrows_wide_counter() {
        let t = running_at::<Tick64>((7 << 32) + 1234);
        assert_eq!(t.now(), (7 << 32) + 1234);
        assert_eq!(t.now_ms(), 1234);
    }

    #[test]
    fn now_us_is_scaled_millis() {
        for start in [0, 1, 999, 4_000_000, u32::MAX] {
            let t = running_at::<Tick32>(start);
            assert_eq!(t.now_us(), u64::from(t.now_ms()) * 1000);
        }
        let t = running_at::<Tick32>(u32::MAX);
        assert_eq!(t.now_us(), 4_294_967_295_000);
    }

    #[test]
    fn delay_us_burns_scaled_cycles_without_touching_counter() {
        let t = running::<Tick32>();
        let mut burned = 0u64;
        t.delay_us(250, &mut |c: u32| burned += u64::from(c));
        assert_eq!(burned, 250 * 32);
        assert_eq!(t.now(), 0);
    }

    #[test]
    #[should_panic]
    fn delay_before_init_panics() {
        let t = Ticker::<Tick32>::new();
        t.delay_ms(1, &mut || ());
    }

    #[test]
    #[should_panic]
    fn delay_us_before_init_panics() {
        let t = Ticker::<Tick32>::new();
        t.delay_us(10, &mut |_: u32| ());
    }

    #[test]
    #[should_panic]
    fn sleep_before_init_panics() {
        let t = Ticker::<Tick32>::new();
        let _ = t.sleep_ms(1);
    }

    struct WakeCount(AtomicUsize);

    impl ArcWake for WakeCount {
        fn wake_by_ref(arc_self: &Arc<Self>) {
            arc_self.0.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[test]
    fn sleep_is_pending_until_deadline() {
        let t = running::<Tick64>();
        let count = Arc::new(WakeCount(AtomicUsize::new(0)));
        let waker = futures::task::waker(Arc::clone(&count));
        let mut cx = Context::from_waker(&waker);

        let mut sleep = pin!(t.sleep_ms(3));
        for i in 0..3 {
            assert!(sleep.as_mut().poll(&mut cx).is_pending());
            assert_eq!(count.0.load(Ordering::Relaxed), i + 1);
            t.on_interrupt();
        }
        assert!(sleep.as_mut().poll(&mut cx).is_ready());
        assert_eq!(count.0.load(Ordering::Relaxed), 3);
    }

    #[test]
    fn sleep_zero_is_ready_at_once() {
        let t = running::<Tick32>();
        let mut cx = Context::from_waker(futures::task::noop_waker_ref());
        assert!(pin!(t.sleep_ms(0)).poll(&mut cx).is_ready());
    }

    #[test]
    fn sleep_measures_from_creation() {
        let t = running::<Tick32>();
        let sleep = t.sleep_ms(2);
        t.on_interrupt();
        t.on_interrupt();
        let mut cx = Context::from_waker(futures::task::noop_waker_ref());
        assert!(pin!(sleep).poll(&mut cx).is_ready());
    }
}
