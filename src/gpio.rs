//! General Purpose Input / Output
//!
//! The BCM283x exposes all 54 pins through a single register block:
//! 3-bit function-select fields spread over six `GPFSEL` registers, and
//! write-only `GPSET`/`GPCLR` pairs that toggle a pin without a
//! read-modify-write cycle on the output state.

use core::marker::PhantomData;

use crate::hal::digital::v2::{toggleable, InputPin, OutputPin, StatefulOutputPin};
use crate::pac::{self, RegisterBlock};

/// Extension trait to split the GPIO peripheral into independent pins
pub trait GpioExt {
    /// The parts to split the GPIO into
    type Parts;

    /// Splits the GPIO block into independent pins
    fn split(self) -> Self::Parts;
}

/// Input mode (type state)
pub struct Input;

/// Output mode (type state)
pub struct Output;

/// Alternate function mode (type state)
pub struct Alternate;

mod sealed {
    pub trait Sealed {}
}

/// Marker trait for valid pin modes (type state).
///
/// It can not be implemented by outside types.
pub trait PinMode: sealed::Sealed {
    // Used to implement the pin configuration code.
    // Not part of public API.

    #[doc(hidden)]
    const FSEL: u32;
}

impl sealed::Sealed for Input {}
impl PinMode for Input {
    const FSEL: u32 = 0b000;
}

impl sealed::Sealed for Output {}
impl PinMode for Output {
    const FSEL: u32 = 0b001;
}

/// Alternate function selection.
///
/// The encodings are the function-select field values from the BCM2835
/// ARM Peripherals manual, which do not count up in order.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AltMode {
    AF0 = 0b100,
    AF1 = 0b101,
    AF2 = 0b110,
    AF3 = 0b111,
    AF4 = 0b011,
    AF5 = 0b010,
}

/// Partially erased pin
pub struct Pin<MODE> {
    i: u8,
    regs: &'static RegisterBlock,
    _mode: PhantomData<MODE>,
}

impl<MODE> Pin<MODE> {
    /// Returns this pin's number on the BCM header.
    pub fn pin_number(&self) -> u8 {
        self.i
    }
}

impl OutputPin for Pin<Output> {
    type Error = void::Void;

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.regs.set[(self.i / 32) as usize].write(1 << (self.i % 32));
        Ok(())
    }

    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.regs.clr[(self.i / 32) as usize].write(1 << (self.i % 32));
        Ok(())
    }
}

impl StatefulOutputPin for Pin<Output> {
    fn is_set_high(&self) -> Result<bool, Self::Error> {
        let is_set_high = !self.is_set_low()?;
        Ok(is_set_high)
    }

    fn is_set_low(&self) -> Result<bool, Self::Error> {
        let is_set_low =
            self.regs.lev[(self.i / 32) as usize].read() & (1 << (self.i % 32)) == 0;
        Ok(is_set_low)
    }
}

impl toggleable::Default for Pin<Output> {}

impl InputPin for Pin<Output> {
    type Error = void::Void;

    fn is_high(&self) -> Result<bool, Self::Error> {
        let is_high = !self.is_low()?;
        Ok(is_high)
    }

    fn is_low(&self) -> Result<bool, Self::Error> {
        let is_low = self.regs.lev[(self.i / 32) as usize].read() & (1 << (self.i % 32)) == 0;
        Ok(is_low)
    }
}

impl InputPin for Pin<Input> {
    type Error = void::Void;

    fn is_high(&self) -> Result<bool, Self::Error> {
        let is_high = !self.is_low()?;
        Ok(is_high)
    }

    fn is_low(&self) -> Result<bool, Self::Error> {
        let is_low = self.regs.lev[(self.i / 32) as usize].read() & (1 << (self.i % 32)) == 0;
        Ok(is_low)
    }
}

macro_rules! gpio {
    ([
        $($PXi:ident: ($pxi:ident, $i:expr, $MODE:ty),)+
    ]) => {
        /// GPIO parts
        pub struct Parts {
            $(
                /// Pin
                pub $pxi: $PXi<$MODE>,
            )+
        }

        impl GpioExt for pac::GPIO {
            type Parts = Parts;

            fn split(self) -> Parts {
                Parts::new(unsafe { &*pac::GPIO::ptr() })
            }
        }

        impl Parts {
            pub(crate) fn new(regs: &'static RegisterBlock) -> Parts {
                Parts {
                    $(
                        $pxi: $PXi {
                            regs,
                            _mode: PhantomData,
                        },
                    )+
                }
            }
        }

        $(
            /// Pin
            pub struct $PXi<MODE> {
                regs: &'static RegisterBlock,
                _mode: PhantomData<MODE>,
            }

            impl<MODE> $PXi<MODE> {
                /// The pin's number on the BCM header.
                pub const PIN_NUMBER: u8 = $i;

                /// Returns this pin's number.
                pub fn pin_number(&self) -> u8 {
                    $i
                }

                /// Rewrites the pin's 3-bit field in its function-select
                /// register, leaving the nine neighbouring fields as they
                /// were.
                fn set_function(&mut self, bits: u32) {
                    let offset = 3 * ($i % 10);
                    self.regs.fsel[$i / 10]
                        .modify(|r| (r & !(0b111 << offset)) | (bits << offset));
                }

                /// Configures the pin to operate as an input pin.
                pub fn into_input(mut self) -> $PXi<Input> {
                    self.set_function(Input::FSEL);
                    $PXi {
                        regs: self.regs,
                        _mode: PhantomData,
                    }
                }

                /// Configures the pin to operate as an output pin.
                pub fn into_output(mut self) -> $PXi<Output> {
                    self.set_function(Output::FSEL);
                    $PXi {
                        regs: self.regs,
                        _mode: PhantomData,
                    }
                }

                /// Hands the pin over to one of its alternate functions.
                pub fn into_alternate(mut self, mode: AltMode) -> $PXi<Alternate> {
                    self.set_function(mode as u32);
                    $PXi {
                        regs: self.regs,
                        _mode: PhantomData,
                    }
                }
            }

            impl $PXi<Output> {
                /// Erases the pin number from the type
                ///
                /// This is useful when you want to collect the pins into an array where you
                /// need all the elements to have the same type
                pub fn downgrade(self) -> Pin<Output> {
                    Pin {
                        i: $i,
                        regs: self.regs,
                        _mode: self._mode,
                    }
                }
            }

            impl OutputPin for $PXi<Output> {
                type Error = void::Void;

                fn set_high(&mut self) -> Result<(), Self::Error> {
                    self.regs.set[$i / 32].write(1 << ($i % 32));
                    Ok(())
                }

                fn set_low(&mut self) -> Result<(), Self::Error> {
                    self.regs.clr[$i / 32].write(1 << ($i % 32));
                    Ok(())
                }
            }

            impl StatefulOutputPin for $PXi<Output> {
                fn is_set_high(&self) -> Result<bool, Self::Error> {
                    let is_set_high = !self.is_set_low()?;
                    Ok(is_set_high)
                }

                fn is_set_low(&self) -> Result<bool, Self::Error> {
                    let is_set_low = self.regs.lev[$i / 32].read() & (1 << ($i % 32)) == 0;
                    Ok(is_set_low)
                }
            }

            impl toggleable::Default for $PXi<Output> {}

            impl InputPin for $PXi<Output> {
                type Error = void::Void;

                fn is_high(&self) -> Result<bool, Self::Error> {
                    let is_high = !self.is_low()?;
                    Ok(is_high)
                }

                fn is_low(&self) -> Result<bool, Self::Error> {
                    let is_low = self.regs.lev[$i / 32].read() & (1 << ($i % 32)) == 0;
                    Ok(is_low)
                }
            }

            impl $PXi<Input> {
                /// Erases the pin number from the type
                ///
                /// This is useful when you want to collect the pins into an array where you
                /// need all the elements to have the same type
                pub fn downgrade(self) -> Pin<Input> {
                    Pin {
                        i: $i,
                        regs: self.regs,
                        _mode: self._mode,
                    }
                }
            }

            impl InputPin for $PXi<Input> {
                type Error = void::Void;

                fn is_high(&self) -> Result<bool, Self::Error> {
                    let is_high = !self.is_low()?;
                    Ok(is_high)
                }

                fn is_low(&self) -> Result<bool, Self::Error> {
                    let is_low = self.regs.lev[$i / 32].read() & (1 << ($i % 32)) == 0;
                    Ok(is_low)
                }
            }
        )+
    }
}

gpio!([
    P0: (p0, 0, Input),
    P1: (p1, 1, Input),
    P2: (p2, 2, Input),
    P3: (p3, 3, Input),
    P4: (p4, 4, Input),
    P5: (p5, 5, Input),
    P6: (p6, 6, Input),
    P7: (p7, 7, Input),
    P8: (p8, 8, Input),
    P9: (p9, 9, Input),
    P10: (p10, 10, Input),
    P11: (p11, 11, Input),
    P12: (p12, 12, Input),
    P13: (p13, 13, Input),
    P14: (p14, 14, Input),
    P15: (p15, 15, Input),
    P16: (p16, 16, Input),
    P17: (p17, 17, Input),
    P18: (p18, 18, Input),
    P19: (p19, 19, Input),
    P20: (p20, 20, Input),
    P21: (p21, 21, Input),
    P22: (p22, 22, Input),
    P23: (p23, 23, Input),
    P24: (p24, 24, Input),
    P25: (p25, 25, Input),
    P26: (p26, 26, Input),
    P27: (p27, 27, Input),
    P28: (p28, 28, Input),
    P29: (p29, 29, Input),
    P30: (p30, 30, Input),
    P31: (p31, 31, Input),
    P32: (p32, 32, Input),
    P33: (p33, 33, Input),
    P34: (p34, 34, Input),
    P35: (p35, 35, Input),
    P36: (p36, 36, Input),
    P37: (p37, 37, Input),
    P38: (p38, 38, Input),
    P39: (p39, 39, Input),
    P40: (p40, 40, Input),
    P41: (p41, 41, Input),
    P42: (p42, 42, Input),
    P43: (p43, 43, Input),
    P44: (p44, 44, Input),
    P45: (p45, 45, Input),
    P46: (p46, 46, Input),
    P47: (p47, 47, Input),
    P48: (p48, 48, Input),
    P49: (p49, 49, Input),
    P50: (p50, 50, Input),
    P51: (p51, 51, Input),
    P52: (p52, 52, Input),
    P53: (p53, 53, Input),
]);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::digital::v2::ToggleableOutputPin;
    use crate::pac::RegisterBlock;

    fn registers() -> &'static RegisterBlock {
        Box::leak(Box::new(RegisterBlock::zeroed()))
    }

    #[test]
    fn output_configuration_preserves_neighbouring_fields() {
        for &seed in &[0x0000_0000u32, 0xFFFF_FFFF, 0xDEAD_BEEF, 0x5555_5555] {
            let regs = registers();
            for fsel in regs.fsel.iter() {
                fsel.write(seed);
            }
            let gpio = Parts::new(regs);

            let _ = gpio.p16.into_output();

            let expected = (seed & !(0b111 << 18)) | (0b001 << 18);
            assert_eq!(regs.fsel[1].read(), expected);
            for (i, fsel) in regs.fsel.iter().enumerate() {
                if i != 1 {
                    assert_eq!(fsel.read(), seed);
                }
            }
        }
    }

    #[test]
    fn field_offsets_cover_the_register_boundaries() {
        let regs = registers();
        let gpio = Parts::new(regs);

        // One pin per interesting spot: first and last field of GPFSEL0,
        // first field of GPFSEL1, last valid field of GPFSEL5.
        let _ = gpio.p0.into_output();
        let _ = gpio.p9.into_output();
        let _ = gpio.p10.into_output();
        let _ = gpio.p53.into_output();

        assert_eq!(regs.fsel[0].read(), (0b001 << 0) | (0b001 << 27));
        assert_eq!(regs.fsel[1].read(), 0b001 << 0);
        assert_eq!(regs.fsel[5].read(), 0b001 << 9);
    }

    #[test]
    fn output_configuration_is_idempotent() {
        let regs = registers();
        regs.fsel[2].write(0xFFFF_FFFF);
        let gpio = Parts::new(regs);

        let pin = gpio.p21.into_output();
        let once = regs.fsel[2].read();
        let _ = pin.into_output();

        assert_eq!(regs.fsel[2].read(), once);
    }

    #[test]
    fn set_and_clear_write_exactly_one_bit() {
        let regs = registers();
        let gpio = Parts::new(regs);
        let mut led = gpio.p16.into_output();

        led.set_high().unwrap();
        assert_eq!(regs.set[0].read(), 1 << 16);
        assert_eq!(regs.set[1].read(), 0);
        assert_eq!(regs.clr[0].read(), 0);

        led.set_low().unwrap();
        assert_eq!(regs.clr[0].read(), 1 << 16);
        assert_eq!(regs.clr[1].read(), 0);
    }

    #[test]
    fn high_numbered_pins_use_the_second_bank() {
        let regs = registers();
        let gpio = Parts::new(regs);
        let mut pin = gpio.p42.into_output();

        pin.set_high().unwrap();
        assert_eq!(regs.set[1].read(), 1 << 10);
        assert_eq!(regs.set[0].read(), 0);

        pin.set_low().unwrap();
        assert_eq!(regs.clr[1].read(), 1 << 10);
        assert_eq!(regs.clr[0].read(), 0);
    }

    #[test]
    fn alternate_functions_use_the_documented_encodings() {
        let regs = registers();
        let gpio = Parts::new(regs);

        // TXD1 is alternate function 5 on pin 14.
        let _ = gpio.p14.into_alternate(AltMode::AF5);
        assert_eq!(regs.fsel[1].read(), 0b010 << 12);

        let regs = registers();
        let gpio = Parts::new(regs);
        let _ = gpio.p0.into_alternate(AltMode::AF0);
        assert_eq!(regs.fsel[0].read(), 0b100);
    }

    #[test]
    fn input_pins_read_the_level_register() {
        let regs = registers();
        let gpio = Parts::new(regs);
        let pin = gpio.p4.into_input();

        assert!(pin.is_low().unwrap());
        regs.lev[0].write(1 << 4);
        assert!(pin.is_high().unwrap());
    }

    #[test]
    fn toggle_follows_the_observed_level() {
        let regs = registers();
        let gpio = Parts::new(regs);
        let mut led = gpio.p16.into_output();

        // Line reads low, so toggling drives it high.
        led.toggle().unwrap();
        assert_eq!(regs.set[0].read(), 1 << 16);
        assert_eq!(regs.clr[0].read(), 0);

        // Line reads high, so toggling drives it low.
        regs.lev[0].write(1 << 16);
        led.toggle().unwrap();
        assert_eq!(regs.clr[0].read(), 1 << 16);
    }

    #[test]
    fn downgraded_pins_keep_their_number_and_registers() {
        let regs = registers();
        let gpio = Parts::new(regs);
        let mut led = gpio.p31.into_output().downgrade();

        assert_eq!(led.pin_number(), 31);
        led.set_high().unwrap();
        assert_eq!(regs.set[0].read(), 1 << 31);

        let button = gpio.p33.into_input().downgrade();
        assert_eq!(button.pin_number(), 33);
        regs.lev[1].write(1 << 1);
        assert!(button.is_high().unwrap());
    }
}
