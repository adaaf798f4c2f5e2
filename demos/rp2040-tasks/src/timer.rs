// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Board setup for the RP2040 TIMER peripheral, used as a 1 kHz tick.
//!
//! TIMER counts microseconds, off a tick generated by the watchdog block from
//! `clk_ref`. We use alarm 0: each time it fires, the ISR acknowledges it and
//! re-arms it 1000 counts past the previous deadline, so the period doesn't
//! drift with interrupt latency.

use core::sync::atomic::{AtomicU32, Ordering};

use rp2040_pac as pac;

/// TIMER counts per tick.
const MICROS_PER_TICK: u32 = 1000;

/// `clk_ref` cycles per TIMER count. `clk_ref` is the ring oscillator at
/// _roughly_ 6 MHz, so these microseconds are approximate too.
const REF_CYCLES_PER_MICRO: u16 = 6;

/// Where alarm 0 is set to fire next, in TIMER counts. Written by `start`
/// before the interrupt is unmasked, and by the ISR after that.
static NEXT_ALARM: AtomicU32 = AtomicU32::new(0);

/// Brings TIMER out of reset and arms alarm 0 one tick from now, with its
/// interrupt enabled at the peripheral. The NVIC line stays masked; unmasking
/// it is the tick source's job.
pub fn start(resets: &pac::RESETS, watchdog: &pac::WATCHDOG, timer: &pac::TIMER) {
    resets.reset.modify(|_, w| w.timer().clear_bit());
    while !resets.reset_done.read().timer().bit() {}

    watchdog.tick.write(|w| unsafe {
        w.cycles().bits(REF_CYCLES_PER_MICRO).enable().set_bit()
    });

    let first = timer.timerawl.read().bits().wrapping_add(MICROS_PER_TICK);
    NEXT_ALARM.store(first, Ordering::Relaxed);
    timer.intr.write(|w| w.alarm_0().set_bit());
    timer.inte.modify(|_, w| w.alarm_0().set_bit());
    timer.alarm0.write(|w| unsafe { w.bits(first) });
}

/// Checks whether alarm 0 is why we're in the TIMER_IRQ_0 handler. If so,
/// acknowledges it, re-arms it for the next tick, and returns `true`.
pub fn take_alarm(timer: &pac::timer::RegisterBlock) -> bool {
    if !timer.ints.read().alarm_0().bit_is_set() {
        return false;
    }

    timer.intr.write(|w| w.alarm_0().set_bit());
    let next = NEXT_ALARM.load(Ordering::Relaxed).wrapping_add(MICROS_PER_TICK);
    NEXT_ALARM.store(next, Ordering::Relaxed);
    timer.alarm0.write(|w| unsafe { w.bits(next) });
    true
}
