//! HAL for the GPIO block of the Broadcom BCM283x SoCs, the application
//! processors on the Raspberry Pi 1 through 3.
//!
//! Bare metal only: registers are touched through their physical
//! addresses, and delays come from a calibrated busy-wait because the
//! crate deliberately leaves every timer peripheral alone.

#![cfg_attr(not(test), no_std)]

#[cfg(not(any(feature = "raspi1", feature = "raspi2", feature = "raspi3")))]
compile_error!(
    "This crate requires one of the following features enabled: raspi1, raspi2, raspi3"
);

use embedded_hal as hal;

pub mod blink;
pub mod delay;
pub mod gpio;
pub mod pac;
pub mod prelude;
pub mod time;

pub use crate::pac as device;
