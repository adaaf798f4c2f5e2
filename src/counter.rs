// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Tick counter storage.
//!
//! A counter has exactly one writer, the timer ISR, which calls
//! [`Counter::increment`] once per tick. Everyone else only reads. Because the
//! ISR never nests and is never interrupted by readers, the increment doesn't
//! need to be an atomic read-modify-write: a load followed by a store is
//! enough. That matters on ARMv6-M parts like the Cortex-M0+, which don't have
//! RMW instructions at all.
//!
//! The reading side is where the two widths differ.
//!
//! [`Tick32`] is a single word, so a read is a single load and can't tear.
//!
//! [`Tick64`] is two words: the bottom 32 bits (`tick`) and the top 32 bits
//! (`epoch`). The ISR bumps `tick`, and if that wrapped to zero, bumps `epoch`.
//! A reader loads `epoch`, then `tick`, then `epoch` again. If the ISR ran
//! anywhere in that sequence *and* carried into `epoch`, the two `epoch` reads
//! disagree and the reader tries again. Since the ISR occurs once per
//! millisecond, the loop repeats at most twice. If the ISR ran but didn't
//! carry, the reader sees either the old or the new `tick` alongside an
//! unchanged `epoch`, and both of those are real values the counter held.
//!
//! Note that this argument relies on the ISR running to completion from the
//! reader's point of view, which is what interrupts do on a single core. It is
//! not a general-purpose lock-free algorithm for two truly parallel threads.

use core::fmt::Debug;

use portable_atomic::{AtomicU32, Ordering};

/// An unsigned integer used to count ticks.
///
/// All arithmetic on tick values is modular in the width of the type. Use
/// [`TickWord::wrapping_sub`] to measure the distance between two values; that
/// gives the right answer across a single wraparound.
pub trait TickWord: Copy + Eq + Ord + Default + Debug + Send + Sync + 'static {
    /// Tick value at initialization.
    const ZERO: Self;
    /// Largest representable tick value. The next increment wraps to `ZERO`.
    const MAX: Self;
    /// Width of the type in bits.
    const BITS: u32;

    /// Modular subtraction.
    fn wrapping_sub(self, earlier: Self) -> Self;
    /// Modular addition.
    fn wrapping_add(self, other: Self) -> Self;
    /// Converts a millisecond count into ticks. Lossless for both widths.
    fn from_millis(ms: u32) -> Self;
    /// Bottom 32 bits of the value.
    fn low_u32(self) -> u32;
}

macro_rules! impl_tick_word {
    ($t:ty) => {
        impl TickWord for $t {
            const ZERO: Self = 0;
            const MAX: Self = <$t>::MAX;
            const BITS: u32 = <$t>::BITS;

            #[inline(always)]
            fn wrapping_sub(self, earlier: Self) -> Self {
                <$t>::wrapping_sub(self, earlier)
            }

            #[inline(always)]
            fn wrapping_add(self, other: Self) -> Self {
                <$t>::wrapping_add(self, other)
            }

            #[inline(always)]
            fn from_millis(ms: u32) -> Self {
                Self::from(ms)
            }

            #[inline(always)]
            #[allow(trivial_numeric_casts)]
            fn low_u32(self) -> u32 {
                self as u32
            }
        }
    };
}

impl_tick_word!(u32);
impl_tick_word!(u64);

/// Storage for a tick counter with a single writer (the timer ISR) and any
/// number of readers.
pub trait Counter: Sync {
    /// Type of the values this counter produces.
    type Ticks: TickWord;

    /// A counter holding zero, for use in `const` contexts such as a `static`
    /// initializer.
    #[allow(clippy::declare_interior_mutable_const)]
    const INIT: Self;

    /// Overwrites the counter with `value`.
    ///
    /// This is a second writer, so it must not race the ISR: call it before
    /// the timer interrupt is enabled.
    fn reset_to(&self, value: Self::Ticks);

    /// Advances the counter by one, wrapping at [`TickWord::MAX`].
    ///
    /// Only the timer ISR may call this.
    fn increment(&self);

    /// Reads the counter. Never returns a value the counter did not hold.
    fn load(&self) -> Self::Ticks;
}

/// A 32-bit tick counter. Wraps after 2^32 ms, roughly 49.7 days.
#[derive(Debug)]
pub struct Tick32 {
    tick: AtomicU32,
}

impl Tick32 {
    /// Creates a counter holding zero.
    pub const fn new() -> Self {
        Self { tick: AtomicU32::new(0) }
    }
}

impl Default for Tick32 {
    fn default() -> Self {
        Self::new()
    }
}

impl Counter for Tick32 {
    type Ticks = u32;

    const INIT: Self = Self::new();

    fn reset_to(&self, value: u32) {
        self.tick.store(value, Ordering::Release);
    }

    #[inline(always)]
    fn increment(&self) {
        let t = self.tick.load(Ordering::Relaxed);
        self.tick.store(t.wrapping_add(1), Ordering::Release);
    }

    #[inline(always)]
    fn load(&self) -> u32 {
        self.tick.load(Ordering::Acquire)
    }
}

/// A 64-bit tick counter built from two 32-bit words, for cores that can't
/// load 64 bits in one go. Wraps after 2^64 ms, which is not a practical
/// concern.
#[derive(Debug)]
pub struct Tick64 {
    /// Bottom 32 bits of the tick counter.
    tick: AtomicU32,
    /// Top 32 bits of the tick counter.
    epoch: AtomicU32,
}

/// Points in the middle of a [`Tick64`] read where the ISR might land.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum ReadStep {
    AfterEpoch,
    AfterTick,
}

impl Tick64 {
    /// Creates a counter holding zero.
    pub const fn new() -> Self {
        Self {
            tick: AtomicU32::new(0),
            epoch: AtomicU32::new(0),
        }
    }

    /// Reads the counter, calling `between` at each point where the ISR could
    /// preempt us.
    #[inline(always)]
    fn read(&self, mut between: impl FnMut(ReadStep)) -> u64 {
        // This loop will only repeat if e != e2, which means we raced the
        // ISR as it carried into the epoch.
        loop {
            let e = self.epoch.load(Ordering::Acquire);
            between(ReadStep::AfterEpoch);
            let t = self.tick.load(Ordering::Acquire);
            between(ReadStep::AfterTick);
            let e2 = self.epoch.load(Ordering::Acquire);
            if e == e2 {
                break (u64::from(e) << 32) | u64::from(t);
            }
        }
    }
}

impl Default for Tick64 {
    fn default() -> Self {
        Self::new()
    }
}

impl Counter for Tick64 {
    type Ticks = u64;

    const INIT: Self = Self::new();

    fn reset_to(&self, value: u64) {
        self.epoch.store((value >> 32) as u32, Ordering::Release);
        self.tick.store(value as u32, Ordering::Release);
    }

    #[inline(always)]
    fn increment(&self) {
        let t = self.tick.load(Ordering::Relaxed).wrapping_add(1);
        self.tick.store(t, Ordering::Release);
        if t == 0 {
            let e = self.epoch.load(Ordering::Relaxed);
            self.epoch.store(e.wrapping_add(1), Ordering::Release);
        }
    }

    fn load(&self) -> u64 {
        self.read(|_| ())
    }
}
