// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The simplest possible use of `tickdelay`: a superloop that says hello over
//! RTT, waits a second, and toggles the LED on the Raspberry Pi Pico (GPIO 25).
//!
//! This demonstrates
//!
//! 1. How to put a `Ticker` in a `static` and drive it from SysTick.
//! 2. How to block in a low-power wait with `delay_ms` and `Wfi`.
//! 3. How to timestamp log output with the tick counter.
//! 4. How to send panics and faults to the halt trap.

// We won't be using the standard library.
#![no_std]
// We don't have a conventional `main` (`cortex_m_rt::entry` is different).
#![no_main]

use cortex_m_rt::{exception, ExceptionFrame};
use defmt_rtt as _;
use rp2040_pac as pac;

use tickdelay::source::SysTickSource;
use tickdelay::wait::Wfi;
use tickdelay::{trap, Tick32, Ticker};

// For RP2040, we need to include a bootloader. The general Cargo build process
// doesn't have great support for this, so we included it as a binary constant.
#[link_section = ".boot2"]
#[used]
static BOOT2: [u8; 256] = rp2040_boot2::BOOT_LOADER_W25Q080;

/// The RP2040 comes out of reset running from its ring oscillator at
/// _roughly_ 6 MHz. We don't touch the clocks, so that's what we've got.
const CLOCK_HZ: u32 = 6_000_000;

/// Pico on-board LED.
const LED_PIN: usize = 25;

/// Time between LED toggles.
const PERIOD_MS: u32 = 1000;

static TICKER: Ticker<Tick32> = Ticker::new();

defmt::timestamp!("{=u32:ms}", TICKER.now_ms());

#[cortex_m_rt::entry]
fn main() -> ! {
    // Check out peripherals from the runtime.
    let mut cp = cortex_m::Peripherals::take().unwrap();
    let p = pac::Peripherals::take().unwrap();

    // Bring IO BANK0 out of reset.
    p.RESETS.reset.modify(|_, w| w.io_bank0().clear_bit());
    while !p.RESETS.reset_done.read().io_bank0().bit() {}

    // Hand the LED pin to SIO and make it an output.
    p.IO_BANK0.gpio[LED_PIN].gpio_ctrl.write(|w| w.funcsel().sio());
    p.SIO.gpio_oe_set.write(|w| unsafe { w.bits(1 << LED_PIN) });

    TICKER.init(&mut SysTickSource::new(&mut cp.SYST), CLOCK_HZ);
    defmt::info!("tick running, state {}", TICKER.state());

    loop {
        defmt::info!("Hello from the Pico!");
        TICKER.delay_ms(PERIOD_MS, &mut Wfi);
        p.SIO.gpio_out_xor.write(|w| unsafe { w.bits(1 << LED_PIN) });
    }
}

/// System tick ISR. Advances the tick counter and nothing else.
#[exception]
fn SysTick() {
    TICKER.on_interrupt();
}

#[exception]
unsafe fn HardFault(ef: &ExceptionFrame) -> ! {
    defmt::error!("hard fault, pc={=u32:#x}", ef.pc());
    trap::halt()
}

#[panic_handler]
fn panic(info: &core::panic::PanicInfo<'_>) -> ! {
    defmt::error!("{}", defmt::Display2Format(info));
    trap::halt()
}
