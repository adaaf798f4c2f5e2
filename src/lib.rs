// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! A millisecond tick counter driven by a periodic timer interrupt, plus the
//! delay primitives built on it.
//!
//! This is the bit of a firmware image that answers "what time is it?" and
//! "wait here for a while." It's deliberately small:
//!
//! - A [`Ticker`] owns a tick counter that a timer interrupt advances once per
//!   millisecond. You put it in a `static`, call [`Ticker::on_interrupt`] from
//!   your timer ISR, and read it from anywhere else.
//! - [`Ticker::delay_ms`] blocks until some number of ticks have gone by.
//!   *How* it waits between checks is up to you, through a
//!   [`WaitPolicy`][wait::WaitPolicy]: spin, sleep the core with `wfi`, or run
//!   some code of your own.
//! - [`Ticker::delay_us`] burns core cycles for short delays that need more
//!   resolution than a millisecond tick can give.
//! - [`Ticker::sleep_ms`] is the cooperative flavor of `delay_ms`, for code
//!   running as an `async` task under a polling executor.
//!
//! # Choosing a counter width
//!
//! The counter comes in two widths, selected by the `Ticker`'s type parameter:
//!
//! - [`Tick32`]: a single 32-bit word. Reads are a single load on any
//!   Cortex-M. It wraps after about 49.7 days, which is fine so long as you
//!   only ever care about *differences* between tick values (and the API here
//!   makes sure you do).
//! - [`Tick64`]: two 32-bit words. It will outlive the hardware, at the cost
//!   of a slightly more involved read that must cope with the ISR landing in
//!   the middle of it. See the [`counter`] module for how that works.
//!
//! Either way, elapsed time is always computed as `now - start` in the
//! counter's own modular arithmetic. Comparing `now >= start + duration`
//! instead is wrong near the wraparound point, and this crate never does it.
//!
//! # Choosing a timer
//!
//! Something has to fire the interrupt. [`Ticker::init`] takes a
//! [`TickSource`][source::TickSource], which is handed the core clock and
//! expected to start a 1 kHz periodic interrupt. On Cortex-M, the `source`
//! module provides one for the SysTick timer and one for a vendor timer that
//! board code has already configured.
//!
//! # Example
//!
//! ```ignore
//! static TICKER: Ticker<Tick32> = Ticker::new();
//!
//! #[cortex_m_rt::exception]
//! fn SysTick() {
//!     TICKER.on_interrupt();
//! }
//!
//! #[cortex_m_rt::entry]
//! fn main() -> ! {
//!     let mut cp = cortex_m::Peripherals::take().unwrap();
//!     TICKER.init(&mut SysTickSource::new(&mut cp.SYST), 16_000_000);
//!     loop {
//!         toggle_led();
//!         TICKER.delay_ms(500, &mut Wfi);
//!     }
//! }
//! ```

#![cfg_attr(not(test), no_std)]

#![warn(
    elided_lifetimes_in_paths,
    explicit_outlives_requirements,
    missing_debug_implementations,
    missing_docs,
    semicolon_in_expressions_from_macros,
    single_use_lifetimes,
    trivial_casts,
    trivial_numeric_casts,
    unreachable_pub,
    unsafe_op_in_unsafe_fn,
    unused_qualifications,
)]

/// Internal assert macro that doesn't stringify its expression or generate any
/// fancy messages. This means failures must be diagnosed by file:line only, so,
/// don't use this more than once on the same line. In exchange, this makes
/// asserts significantly smaller in terms of text size.
macro_rules! cheap_assert {
    ($x:expr) => {
        if !$x { panic!(); };
    }
}
pub(crate) use cheap_assert;

pub mod counter;
pub mod cycles;
pub mod source;
pub mod ticker;
#[cfg(target_arch = "arm")]
pub mod trap;
pub mod wait;

pub use counter::{Counter, Tick32, Tick64, TickWord};
pub use ticker::{State, Ticker};
