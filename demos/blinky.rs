//! Blinks an LED on GPIO pin 16 at 1 Hz.
//!
//! Build for `aarch64-unknown-none` with the `rt` feature and let the
//! boot image call `kmain`. Exception level, stack and BSS setup belong
//! to that earliest-stage boot code, not to this program.

#![no_main]
#![no_std]

use panic_halt as _;

use bcm283x_hal::{blink::Blinker, delay::Delay, pac, prelude::*};

#[no_mangle]
pub extern "C" fn kmain() -> ! {
    let dp = pac::Peripherals::take().unwrap();

    // Take the GPIO block and put pin 16 into output mode.
    let gpio = dp.GPIO.split();
    let led = gpio.p16.into_output();

    // 500 ms high, 500 ms low, forever.
    Blinker::new(led, Delay::new()).run()
}
