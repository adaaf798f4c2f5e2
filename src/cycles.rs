// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Cycle-counted busy waiting, for delays shorter than a tick.
//!
//! A microsecond delay can't be measured with a millisecond counter, so
//! [`Ticker::delay_us`][crate::Ticker::delay_us] doesn't try. It converts the
//! requested time into core clock cycles and hands them to a [`CycleBurner`],
//! which is expected to keep the CPU busy for at least that many cycles.
//!
//! Interrupts that arrive during the burn (including the tick ISR) make the
//! delay longer, never shorter. If that matters for a short, precise delay,
//! [`MaskedCycles`] holds interrupts off for the duration. Keep such delays
//! well under a millisecond, or the tick counter will fall behind.

/// Something that can stall the CPU for a number of core clock cycles.
pub trait CycleBurner {
    /// Spends at least `cycles` core clock cycles.
    fn burn(&mut self, cycles: u32);
}

impl<F: FnMut(u32)> CycleBurner for F {
    fn burn(&mut self, cycles: u32) {
        self(cycles)
    }
}

/// Burns cycles with `cortex_m::asm::delay`, leaving interrupts enabled.
#[cfg(target_arch = "arm")]
#[derive(Copy, Clone, Debug, Default)]
pub struct CoreCycles;

#[cfg(target_arch = "arm")]
impl CycleBurner for CoreCycles {
    #[inline(always)]
    fn burn(&mut self, cycles: u32) {
        cortex_m::asm::delay(cycles);
    }
}

/// Burns cycles with `cortex_m::asm::delay` inside a critical section, so no
/// interrupt can stretch the delay.
#[cfg(target_arch = "arm")]
#[derive(Copy, Clone, Debug, Default)]
pub struct MaskedCycles;

#[cfg(target_arch = "arm")]
impl CycleBurner for MaskedCycles {
    #[inline(always)]
    fn burn(&mut self, cycles: u32) {
        cortex_m::interrupt::free(|_| cortex_m::asm::delay(cycles));
    }
}

/// Number of core clock cycles in `us` microseconds at `clock_hz`.
///
/// Computed in 64 bits, so this can't overflow for any inputs.
pub fn cycles_for_micros(us: u32, clock_hz: u32) -> u64 {
    u64::from(us) * u64::from(clock_hz) / 1_000_000
}

/// Feeds `cycles` to `burner` in chunks that fit its 32-bit interface.
pub(crate) fn burn(burner: &mut impl CycleBurner, mut cycles: u64) {
    while cycles != 0 {
        let chunk = cycles.min(u64::from(u32::MAX)) as u32;
        burner.burn(chunk);
        cycles -= u64::from(chunk);
    }
}
