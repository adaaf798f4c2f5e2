// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Four periodic tasks on the Raspberry Pi Pico, sharing one tick.
//!
//! One task blinks the LED on GPIO 25 and logs how many times it has done so;
//! the other three just say hello. All of them run every 100 ms.
//!
//! Unlike the superloop demo, the tick here comes from the RP2040's TIMER
//! peripheral rather than SysTick, and uses the 64-bit counter. The timer
//! interrupt is shared with the other alarm events, so the ISR checks that
//! it's really the tick before counting it.
//!
//! This demonstrates
//!
//! 1. How to drive a `Ticker` from a vendor timer through `IrqSource`.
//! 2. How to wait cooperatively with `sleep_ms` inside `async` tasks.
//! 3. How to customize a single `async fn` to create multiple tasks.

#![no_std]
#![no_main]

mod exec;
mod timer;

use core::convert::Infallible;
use core::pin::pin;

use cortex_m_rt::{exception, ExceptionFrame};
use defmt_rtt as _;
use rp2040_pac::{self as pac, interrupt};

use tickdelay::source::IrqSource;
use tickdelay::{trap, Tick64, Ticker};

#[link_section = ".boot2"]
#[used]
static BOOT2: [u8; 256] = rp2040_boot2::BOOT_LOADER_W25Q080;

/// Ring oscillator, roughly. Only recorded for `delay_us`; the tick itself
/// comes from TIMER.
const CLOCK_HZ: u32 = 6_000_000;

/// Pico on-board LED.
const LED_PIN: usize = 25;

/// How often each task runs.
const PERIOD_MS: u32 = 100;

static TICKER: Ticker<Tick64> = Ticker::new();

defmt::timestamp!("{=u32:ms}", TICKER.now_ms());

#[cortex_m_rt::entry]
fn main() -> ! {
    let p = pac::Peripherals::take().unwrap();

    p.RESETS.reset.modify(|_, w| w.io_bank0().clear_bit());
    while !p.RESETS.reset_done.read().io_bank0().bit() {}

    p.IO_BANK0.gpio[LED_PIN].gpio_ctrl.write(|w| w.funcsel().sio());
    p.SIO.gpio_oe_set.write(|w| unsafe { w.bits(1 << LED_PIN) });

    // Configure the alarm first, then let the ticker unmask its interrupt.
    timer::start(&p.RESETS, &p.WATCHDOG, &p.TIMER);
    // Safety: nothing in this program masks TIMER_IRQ_0 to get exclusion.
    let mut source = unsafe { IrqSource::new(pac::Interrupt::TIMER_IRQ_0) };
    TICKER.init(&mut source, CLOCK_HZ);

    let tasks = pin!(async {
        let out = futures::join!(
            led_task(&p.SIO),
            hello_task(1),
            hello_task(2),
            hello_task(3),
        );
        out.0
    });

    exec::run(tasks)
}

/// Toggles the LED and reports progress, every `PERIOD_MS`.
async fn led_task(sio: &pac::SIO) -> Infallible {
    let mut count: u32 = 0;

    loop {
        sio.gpio_out_xor.write(|w| unsafe { w.bits(1 << LED_PIN) });
        defmt::info!(
            "LED Task running, count: {=u32}, tick: {=u64}",
            count,
            TICKER.now(),
        );
        count = count.wrapping_add(1);
        TICKER.sleep_ms(PERIOD_MS).await;
    }
}

/// Prints a greeting tagged with `n`, every `PERIOD_MS`.
async fn hello_task(n: u8) -> Infallible {
    loop {
        defmt::println!("Task{=u8}: Hello from Thread {=u8}", n, n);
        TICKER.sleep_ms(PERIOD_MS).await;
    }
}

#[interrupt]
fn TIMER_IRQ_0() {
    // Safety: after `timer::start`, this ISR is the only code that touches
    // the TIMER registers.
    let timer = unsafe { &*pac::TIMER::ptr() };
    TICKER.on_interrupt_if(|| timer::take_alarm(timer));
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
