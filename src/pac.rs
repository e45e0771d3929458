//! Memory-mapped access to the BCM283x GPIO controller.
//!
//! There is no vendor SVD for these SoCs, so the register block is written
//! out by hand. Addresses and layout are from the BCM2835 ARM Peripherals
//! manual, section 6; the block is unchanged across the family, only the
//! base address the VideoCore maps it at differs.

use core::marker::PhantomData;
use core::ops::Deref;
use core::sync::atomic::{AtomicBool, Ordering};

use vcell::VolatileCell;

/// Start of the memory-mapped peripheral window.
#[cfg(feature = "raspi1")]
pub const PERIPHERAL_BASE: usize = 0x2000_0000;

/// Start of the memory-mapped peripheral window.
#[cfg(all(any(feature = "raspi2", feature = "raspi3"), not(feature = "raspi1")))]
pub const PERIPHERAL_BASE: usize = 0x3F00_0000;

/// Start of the GPIO register block.
pub const GPIO_BASE: usize = PERIPHERAL_BASE + 0x20_0000;

/// Function select register (`GPFSELn`).
///
/// Each pin owns a 3-bit field; ten pins per register. Updates must
/// read-modify-write so the neighbouring fields survive.
#[repr(transparent)]
pub struct Fsel {
    register: VolatileCell<u32>,
}

impl Fsel {
    #[inline]
    pub fn read(&self) -> u32 {
        self.register.get()
    }

    #[inline]
    pub fn write(&self, bits: u32) {
        self.register.set(bits)
    }

    #[inline]
    pub fn modify<F>(&self, f: F)
    where
        F: FnOnce(u32) -> u32,
    {
        self.register.set(f(self.register.get()))
    }
}

/// Output set register (`GPSETn`), write-only.
///
/// Writing 1 to bit n drives pin n high; writing 0 is a no-op for that
/// bit, so no read-modify-write cycle is needed (or possible).
#[repr(transparent)]
pub struct Set {
    register: VolatileCell<u32>,
}

impl Set {
    #[inline]
    pub fn write(&self, bits: u32) {
        self.register.set(bits)
    }

    /// Hardware never lets this register be read back; host tests do.
    #[cfg(test)]
    pub(crate) fn read(&self) -> u32 {
        self.register.get()
    }
}

/// Output clear register (`GPCLRn`), write-only.
///
/// Writing 1 to bit n drives pin n low; writing 0 is a no-op for that bit.
#[repr(transparent)]
pub struct Clr {
    register: VolatileCell<u32>,
}

impl Clr {
    #[inline]
    pub fn write(&self, bits: u32) {
        self.register.set(bits)
    }

    /// Hardware never lets this register be read back; host tests do.
    #[cfg(test)]
    pub(crate) fn read(&self) -> u32 {
        self.register.get()
    }
}

/// Pin level register (`GPLEVn`), read-only. Bit n is the actual level
/// on pin n, regardless of its function.
#[repr(transparent)]
pub struct Lev {
    register: VolatileCell<u32>,
}

impl Lev {
    #[inline]
    pub fn read(&self) -> u32 {
        self.register.get()
    }

    /// Hardware drives this register; host tests do it by hand.
    #[cfg(test)]
    pub(crate) fn write(&self, bits: u32) {
        self.register.set(bits)
    }
}

/// GPIO register block.
#[repr(C)]
pub struct RegisterBlock {
    /// GPFSEL0..5: 0x00..0x14
    pub fsel: [Fsel; 6],
    _reserved0: u32,
    /// GPSET0..1: 0x1C, 0x20
    pub set: [Set; 2],
    _reserved1: u32,
    /// GPCLR0..1: 0x28, 0x2C
    pub clr: [Clr; 2],
    _reserved2: u32,
    /// GPLEV0..1: 0x34, 0x38
    pub lev: [Lev; 2],
}

#[cfg(test)]
impl RegisterBlock {
    /// An all-zero block in host memory, standing in for the hardware
    /// in unit tests.
    pub(crate) fn zeroed() -> Self {
        unsafe { core::mem::zeroed() }
    }
}

/// The GPIO peripheral.
pub struct GPIO {
    _marker: PhantomData<*const ()>,
}

impl GPIO {
    /// Returns a pointer to the register block.
    pub const fn ptr() -> *const RegisterBlock {
        GPIO_BASE as *const _
    }
}

impl Deref for GPIO {
    type Target = RegisterBlock;

    #[inline]
    fn deref(&self) -> &RegisterBlock {
        unsafe { &*Self::ptr() }
    }
}

/// All the peripherals this HAL knows about.
#[allow(non_snake_case)]
pub struct Peripherals {
    pub GPIO: GPIO,
}

static DEVICE_PERIPHERALS: AtomicBool = AtomicBool::new(false);

impl Peripherals {
    /// Returns all the peripherals the first time it is called, `None`
    /// afterwards.
    pub fn take() -> Option<Self> {
        if DEVICE_PERIPHERALS.swap(true, Ordering::AcqRel) {
            None
        } else {
            Some(unsafe { Peripherals::steal() })
        }
    }

    /// Unchecked version of `take`. Aliasing the register block is on
    /// the caller.
    pub unsafe fn steal() -> Self {
        Peripherals {
            GPIO: GPIO {
                _marker: PhantomData,
            },
        }
    }
}
