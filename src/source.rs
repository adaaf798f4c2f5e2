// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Hardware timers that can drive a [`Ticker`][crate::Ticker].
//!
//! A [`TickSource`] has one job: when [`Ticker::init`][crate::Ticker::init]
//! asks, start an interrupt that fires every millisecond. The ISR itself is
//! yours to write; it just needs to call
//! [`Ticker::on_interrupt`][crate::Ticker::on_interrupt] (or
//! [`on_interrupt_if`][crate::Ticker::on_interrupt_if] if the vector is shared
//! with other events).
//!
//! Two sources are provided for Cortex-M:
//!
//! - [`SysTickSource`] programs the core's SysTick timer from the core clock
//!   frequency. Requires the `systick` feature, which is on by default.
//! - [`IrqSource`] is for a vendor timer peripheral that board code has
//!   already set up to interrupt at 1 kHz. It ignores the clock frequency and
//!   just unmasks the timer's interrupt line in the NVIC.
//!
//! Neither source can tell whether the hardware actually started, and neither
//! tries to: the configuration is passed through to the hardware as-is.

#[cfg(target_arch = "arm")]
use cortex_m::interrupt::InterruptNumber;
#[cfg(target_arch = "arm")]
use cortex_m::peripheral::NVIC;
#[cfg(all(target_arch = "arm", feature = "systick"))]
use cortex_m::peripheral::{syst::SystClkSource, SYST};

#[cfg(all(target_arch = "arm", feature = "systick"))]
use crate::cheap_assert;

/// A timer that can be started as a 1 kHz periodic interrupt.
pub trait TickSource {
    /// Starts the timer interrupting once per millisecond, assuming a core
    /// clock of `clock_hz`. Sources that don't derive their rate from the core
    /// clock may ignore it.
    fn start(&mut self, clock_hz: u32);
}

impl<F: FnMut(u32)> TickSource for F {
    fn start(&mut self, clock_hz: u32) {
        self(clock_hz)
    }
}

/// Largest value the SysTick reload register can hold (it's 24 bits wide).
const SYST_MAX_RELOAD: u32 = 0x00FF_FFFF;

// A millisecond at the fastest clock a `u32` can describe still fits in the
// reload register, so `start` only has to check the slow end.
const _: () = assert!(u32::MAX / 1000 - 1 <= SYST_MAX_RELOAD);

/// Drives a ticker from the Cortex-M SysTick timer, clocked from the core.
#[cfg(all(target_arch = "arm", feature = "systick"))]
#[derive(Debug)]
pub struct SysTickSource<'a> {
    syst: &'a mut SYST,
}

#[cfg(all(target_arch = "arm", feature = "systick"))]
impl<'a> SysTickSource<'a> {
    /// Wraps the SysTick peripheral. Nothing is touched until `start`.
    pub fn new(syst: &'a mut SYST) -> Self {
        Self { syst }
    }
}

#[cfg(all(target_arch = "arm", feature = "systick"))]
impl TickSource for SysTickSource<'_> {
    /// Sets up SysTick for 1kHz operation, assuming a CPU core clock of
    /// `clock_hz`.
    ///
    /// # Panics
    ///
    /// If `clock_hz` is below 1 kHz.
    fn start(&mut self, clock_hz: u32) {
        let cycles_per_millisecond = clock_hz / 1000;
        cheap_assert!(cycles_per_millisecond != 0);

        self.syst.set_reload(cycles_per_millisecond - 1);
        self.syst.clear_current();
        self.syst.set_clock_source(SystClkSource::Core);
        self.syst.enable_interrupt();
        self.syst.enable_counter();
    }
}

/// Drives a ticker from a peripheral timer whose interrupt is already set up
/// to fire every millisecond.
#[cfg(target_arch = "arm")]
#[derive(Copy, Clone, Debug)]
pub struct IrqSource<I> {
    irq: I,
}

#[cfg(target_arch = "arm")]
impl<I: InterruptNumber> IrqSource<I> {
    /// Creates a source that will unmask `irq` when started.
    ///
    /// # Safety
    ///
    /// Starting this source unmasks `irq` in the NVIC. That can break code
    /// that relies on `irq` being masked to form a critical section, so the
    /// caller must make sure nothing does.
    pub unsafe fn new(irq: I) -> Self {
        Self { irq }
    }
}

#[cfg(target_arch = "arm")]
impl<I: InterruptNumber> TickSource for IrqSource<I> {
    fn start(&mut self, _clock_hz: u32) {
        // Drop anything that latched before we were ready for it; otherwise
        // the first tick would arrive early.
        NVIC::unpend(self.irq);
        // Safety: the obligation to not break mask-based critical sections was
        // taken on by whoever called `IrqSource::new`.
        unsafe {
            NVIC::unmask(self.irq);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closures_are_sources() {
        let mut seen = None;
        (|hz: u32| seen = Some(hz)).start(12_000_000);
        assert_eq!(seen, Some(12_000_000));
    }

    #[test]
    fn reload_fits_at_any_clock() {
        let fastest = u32::MAX / 1000 - 1;
        assert!(fastest <= SYST_MAX_RELOAD);
    }
}
