// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! What to do while waiting for the tick counter to advance.
//!
//! [`Ticker::delay_ms`][crate::Ticker::delay_ms] checks the counter, and if the
//! delay hasn't elapsed yet, calls [`WaitPolicy::wait`] before checking again.
//! The policy doesn't change *when* the delay returns, only what the CPU gets
//! up to in the meantime:
//!
//! - [`Spin`] keeps the core busy. Lowest latency, highest power.
//! - [`Wfi`] sleeps the core until the next interrupt. Since the tick interrupt
//!   arrives every millisecond, this costs at most one tick of latency and
//!   saves a fair bit of power. Only available on Cortex-M.
//! - Any `FnMut()` closure, for everything else: feeding a watchdog, polling a
//!   peripheral, or driving a simulated clock in a test.

/// Strategy for spending time between checks of the tick counter.
pub trait WaitPolicy {
    /// Called once each time a delay finds that it must keep waiting.
    fn wait(&mut self);
}

impl<F: FnMut()> WaitPolicy for F {
    fn wait(&mut self) {
        self()
    }
}

/// Busy-waits, hinting to the CPU that we're in a spin loop.
#[derive(Copy, Clone, Debug, Default)]
pub struct Spin;

impl WaitPolicy for Spin {
    #[inline(always)]
    fn wait(&mut self) {
        core::hint::spin_loop();
    }
}

/// Sleeps the core with the `wfi` instruction until an interrupt arrives.
///
/// If interrupts are masked when you use this, `wfi` will still wake on a
/// pending interrupt, but the tick ISR won't run, so the delay will never end.
/// Don't do that.
#[cfg(target_arch = "arm")]
#[derive(Copy, Clone, Debug, Default)]
pub struct Wfi;

#[cfg(target_arch = "arm")]
impl WaitPolicy for Wfi {
    #[inline(always)]
    fn wait(&mut self) {
        cortex_m::asm::wfi();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wait_n(policy: &mut impl WaitPolicy, n: usize) {
        for _ in 0..n {
            policy.wait();
        }
    }

    #[test]
    fn closures_are_policies() {
        let mut calls = 0;
        wait_n(&mut || calls += 1, 3);
        assert_eq!(calls, 3);
    }

    #[test]
    fn spin_returns() {
        wait_n(&mut Spin, 100);
    }
}
