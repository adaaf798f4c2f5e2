// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Test suite, run on real (or emulated) hardware.
//!
//! The host tests in the main crate simulate the timer interrupt. These don't:
//! SysTick drives two tickers, one of each width, and the tests check that
//! the delays and accessors behave against the real thing.
//!
//! The test suite is SoC-independent; see the SoC-specific subdirectories for
//! wrappers.

#![no_std]

mod delay;
mod wide;

use cortex_m_rt::exception;
use cortex_m_semihosting::{debug, hprintln};
use tickdelay::source::SysTickSource;
use tickdelay::{Tick32, Tick64, Ticker};

/// The ticker most tests use.
pub(crate) static TICKER: Ticker<Tick32> = Ticker::new();

/// A 64-bit ticker advanced by the same ISR, started just short of the point
/// where its low word carries into its high word.
pub(crate) static WIDE: Ticker<Tick64> = Ticker::new();

/// Where `WIDE` starts counting from.
pub(crate) const WIDE_START: u64 = u32::MAX as u64 - 5;

macro_rules! tests {
    ($($name:path,)*) => {
        $(
            cortex_m_semihosting::hprint!(concat!(stringify!($name), "... "));
            $name();
            cortex_m_semihosting::hprintln!("OK");
        )*
    };
}

/// Starts the tick and runs every test, then exits through semihosting.
pub fn run_test_suite(hz: u32) -> ! {
    // Check out peripherals from the runtime.
    let mut cp = cortex_m::Peripherals::take().unwrap();

    // WIDE has no timer of its own; it piggybacks on TICKER's, so it must be
    // set up before that starts.
    WIDE.init_at(&mut |_: u32| (), hz, WIDE_START);
    TICKER.init(&mut SysTickSource::new(&mut cp.SYST), hz);

    tests! {
        delay::test_clock_advancing,
        delay::test_delay_zero_is_immediate,
        delay::test_delay_spin,
        delay::test_delay_wfi,
        delay::test_delay_closure_policy,
        delay::test_delay_us_core,
        delay::test_delay_us_masked,
        delay::test_now_us_tracks_now_ms,
        wide::test_wide_tracks_narrow,
        wide::test_wide_carries,
        wide::test_wide_reads_monotonic,
    }

    hprintln!("tests complete.");
    debug::exit(debug::EXIT_SUCCESS);

    #[allow(clippy::empty_loop)]
    loop {}
}

#[exception]
fn SysTick() {
    TICKER.on_interrupt();
    WIDE.on_interrupt();
}
