// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The place firmware goes when something has gone irrecoverably wrong.
//!
//! There's no recovery here. [`halt`] masks interrupts, so the tick and every
//! other ISR stop dead and the machine state stays as it was, then spins
//! forever waiting for somebody to attach a debugger and look around.
//!
//! Wire your panic handler and `HardFault` handler to it:
//!
//! ```ignore
//! #[panic_handler]
//! fn panic(_: &core::panic::PanicInfo<'_>) -> ! {
//!     tickdelay::trap::halt()
//! }
//! ```

use core::sync::atomic::{compiler_fence, Ordering};

/// Masks interrupts and spins forever.
#[inline(never)]
pub fn halt() -> ! {
    cortex_m::interrupt::disable();
    loop {
        // Keeps the loop from being optimized into something a debugger
        // can't break on.
        compiler_fence(Ordering::SeqCst);
    }
}
