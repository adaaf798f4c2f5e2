// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use tickdelay::wait::Wfi;

use crate::{TICKER, WIDE, WIDE_START};

pub fn test_wide_tracks_narrow() {
    // Both counters are advanced by the same ISR, WIDE from an offset. Mask
    // interrupts so both reads see the same tick.
    let (narrow, wide) = cortex_m::interrupt::free(|_| (TICKER.now(), WIDE.now()));
    assert_eq!(wide.wrapping_sub(WIDE_START), u64::from(narrow));
}

pub fn test_wide_carries() {
    // By now at least a few dozen ticks have passed since WIDE_START; make
    // sure of it.
    WIDE.delay_ms(10, &mut Wfi);
    let now = WIDE.now();
    assert!(now > u64::from(u32::MAX));
    assert_eq!(now >> 32, 1);
    assert_eq!(u64::from(WIDE.now_ms()), now & 0xFFFF_FFFF);
}

pub fn test_wide_reads_monotonic() {
    let mut last = WIDE.now();
    let start = TICKER.now_ms();
    while TICKER.now_ms().wrapping_sub(start) < 5 {
        let now = WIDE.now();
        assert!(now >= last);
        last = now;
    }
}
