// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Whole-service scenarios, with the timer interrupt simulated in software.

use std::sync::atomic::{AtomicBool, Ordering};
use std::task::Poll;
use std::thread;
use std::time::Duration;

use futures::future::{join, poll_fn};
use tickdelay::wait::Spin;
use tickdelay::{State, Tick32, Tick64, Ticker};

fn no_source(_: u32) {}

/// Gives up the CPU once, asking to be polled again right away.
async fn yield_now() {
    let mut yielded = false;
    poll_fn(|cx| {
        if yielded {
            Poll::Ready(())
        } else {
            yielded = true;
            cx.waker().wake_by_ref();
            Poll::Pending
        }
    })
    .await
}

#[test]
fn boot_tick_then_delay() {
    let ticker = Ticker::<Tick32>::new();
    assert_eq!(ticker.state(), State::Uninitialized);

    ticker.init(&mut no_source, 32_000_000);
    for _ in 0..1500 {
        ticker.on_interrupt();
    }
    assert_eq!(ticker.now_ms(), 1500);
    assert_eq!(ticker.now_us(), 1_500_000);

    let mut fired = 0;
    ticker.delay_ms(500, &mut || {
        fired += 1;
        ticker.on_interrupt();
    });
    assert_eq!(fired, 500);
    assert_eq!(ticker.now_ms(), 2000);
}

#[test]
fn boot_tick_then_delay_wide() {
    static TICKER: Ticker<Tick64> = Ticker::new();

    TICKER.init(&mut no_source, 80_000_000);
    for _ in 0..1500 {
        TICKER.on_interrupt();
    }
    assert_eq!(TICKER.now(), 1500);

    let mut fired = 0;
    TICKER.delay_ms(500, &mut || {
        fired += 1;
        TICKER.on_interrupt();
    });
    assert_eq!(fired, 500);
    assert_eq!(TICKER.now_ms(), 2000);
}

#[test]
fn delay_against_free_running_interrupt() {
    // A second thread plays the part of the timer ISR: the only writer.
    static TICKER: Ticker<Tick32> = Ticker::new();
    static STOP: AtomicBool = AtomicBool::new(false);

    TICKER.init(&mut no_source, 16_000_000);
    let isr = thread::spawn(|| {
        while !STOP.load(Ordering::Relaxed) {
            TICKER.on_interrupt();
            thread::sleep(Duration::from_micros(50));
        }
    });

    let mut last = TICKER.now_ms();
    for _ in 0..5 {
        let start = TICKER.now_ms();
        TICKER.delay_ms(20, &mut Spin);
        let end = TICKER.now_ms();
        assert!(end.wrapping_sub(start) >= 20);
        assert!(end >= last);
        last = end;
    }

    STOP.store(true, Ordering::Relaxed);
    isr.join().unwrap();
}

#[test]
fn cooperative_sleep_alongside_interrupt_task() {
    let ticker = Ticker::<Tick32>::new();
    ticker.init(&mut no_source, 16_000_000);

    // The "interrupt" is another task that ticks once per poll.
    let isr = async {
        for _ in 0..100 {
            ticker.on_interrupt();
            yield_now().await;
        }
    };
    let sleeper = async {
        ticker.sleep_ms(40).await;
        ticker.now_ms()
    };

    let (woke_at, ()) = futures::executor::block_on(join(sleeper, isr));
    assert!((40..100).contains(&woke_at));
    assert_eq!(ticker.now_ms(), 100);
}
