// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use tickdelay::cycles::{CoreCycles, CycleBurner, MaskedCycles};
use tickdelay::wait::{Spin, Wfi};

use crate::TICKER;

const A_BIT: u32 = 2;

pub fn test_clock_advancing() {
    let t1 = TICKER.now_ms();
    TICKER.delay_ms(A_BIT, &mut Wfi);
    let t2 = TICKER.now_ms();
    assert!(t2 > t1);
}

pub fn test_delay_zero_is_immediate() {
    let mut waits = 0;
    TICKER.delay_ms(0, &mut || waits += 1);
    assert_eq!(waits, 0);
}

pub fn test_delay_spin() {
    let start = TICKER.now_ms();
    TICKER.delay_ms(10, &mut Spin);
    assert!(TICKER.now_ms().wrapping_sub(start) >= 10);
}

pub fn test_delay_wfi() {
    let start = TICKER.now_ms();
    TICKER.delay_ms(10, &mut Wfi);
    assert!(TICKER.now_ms().wrapping_sub(start) >= 10);
}

pub fn test_delay_closure_policy() {
    // Each wait sleeps until an interrupt, and SysTick is the only one
    // enabled, so we should wait about once per tick.
    let mut waits = 0u32;
    TICKER.delay_ms(5, &mut || {
        waits += 1;
        cortex_m::asm::wfi();
    });
    assert!(waits >= 4);
}

pub fn test_delay_us_core() {
    let start = TICKER.now_ms();
    TICKER.delay_us(500, &mut CoreCycles);
    // Half a millisecond can straddle at most one tick boundary.
    assert!(TICKER.now_ms().wrapping_sub(start) <= 1);
}

pub fn test_delay_us_masked() {
    // Start just after a tick.
    TICKER.delay_ms(1, &mut Wfi);
    let start = TICKER.now_ms();
    let mut burned = 0u64;
    TICKER.delay_us(500, &mut |c: u32| {
        burned += u64::from(c);
        MaskedCycles.burn(c);
    });
    // With interrupts held off, at most one tick can be pending when the
    // burn ends, and it's counted only once.
    assert!(TICKER.now_ms().wrapping_sub(start) <= 1);
    assert!(burned > 0);
}

pub fn test_now_us_tracks_now_ms() {
    let ms = TICKER.now_ms();
    let us = TICKER.now_us();
    // A tick may land between the two reads.
    let from_us = us / 1000;
    assert!(from_us == u64::from(ms) || from_us == u64::from(ms) + 1);
    assert_eq!(us % 1000, 0);
}
