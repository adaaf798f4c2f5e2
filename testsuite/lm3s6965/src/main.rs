// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Test suite, LM3S6965 wrapper.

#![no_std]
#![no_main]

// get the panic handler
use panic_semihosting as _;

/// This constant assumes a 12MHz clock at reset, which is what QEMU models.
/// None of the tests rely on this being _correct,_ only on the tick running.
const HZ: u32 = 12_000_000;

#[cortex_m_rt::entry]
fn main() -> ! {
    tickdelay_testsuite::run_test_suite(HZ)
}
