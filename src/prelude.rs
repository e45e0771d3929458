pub use embedded_hal::digital::v2::*;
pub use embedded_hal::prelude::*;

pub use crate::gpio::GpioExt as _;
pub use crate::time::U32Ext as _;
