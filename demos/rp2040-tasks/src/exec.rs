// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The smallest executor that can run our tasks.
//!
//! Every task here waits on `Ticker::sleep_ms`, which can only notice that
//! time has passed after an interrupt has advanced the counter. So there's
//! nothing to gain from tracking wakeups: we poll the whole task set, sleep the
//! core until the next interrupt, and do it again.

use core::convert::Infallible;
use core::future::Future;
use core::pin::Pin;
use core::task::{Context, Poll};

/// Polls `tasks` forever, sleeping the core between passes.
pub fn run(mut tasks: Pin<&mut impl Future<Output = Infallible>>) -> ! {
    let mut cx = Context::from_waker(futures::task::noop_waker_ref());
    loop {
        match tasks.as_mut().poll(&mut cx) {
            Poll::Ready(never) => match never {},
            Poll::Pending => cortex_m::asm::wfi(),
        }
    }
}
