//! Delays
//!
//! The BCM283x system timer is deliberately left alone here; delays are
//! produced by spinning the core for a calibrated number of iterations.
//! Accuracy is best-effort and tracks the actual core clock, but a spin
//! delay is always monotonic: asking for longer never waits less.

use core::arch::asm;

use cast::u32;

use crate::hal::blocking::delay::{DelayMs, DelayUs};
use crate::time::MicroSeconds;

/// Spin loop iterations consumed per microsecond.
///
/// Empirically tuned against a stopwatch, not derived from the clock
/// tree. Use [`Delay::with_calibration`] when the core runs at another
/// frequency.
pub const SPINS_PER_US: u32 = 6;

/// Busy-wait loop as a delay provider
pub struct Delay {
    spins_per_us: u32,
}

impl Delay {
    /// Configures a delay provider with the stock calibration.
    pub fn new() -> Self {
        Delay {
            spins_per_us: SPINS_PER_US,
        }
    }

    /// Configures a delay provider with a caller-supplied calibration.
    pub fn with_calibration(spins_per_us: u32) -> Self {
        assert!(spins_per_us > 0);
        Delay { spins_per_us }
    }

    /// Wait for the given time.
    pub fn delay<T>(&mut self, delay: T)
    where
        T: Into<MicroSeconds>,
    {
        let MicroSeconds(us) = delay.into();
        self.delay_us(us);
    }

    /// Iterations to burn for the requested duration. Widened to `u64`
    /// so the product cannot wrap for any `u32` input.
    fn spins(&self, us: u32) -> u64 {
        u64::from(us) * u64::from(self.spins_per_us)
    }
}

impl Default for Delay {
    fn default() -> Self {
        Delay::new()
    }
}

/// Spins for the given number of iterations.
///
/// The `nop` is an opaque instruction to the optimizer, so the loop is
/// executed in full even at `opt-level = "s"`; an empty body would be
/// folded away entirely.
#[inline(never)]
fn spin(iterations: u64) {
    for _ in 0..iterations {
        unsafe { asm!("nop", options(nomem, nostack, preserves_flags)) };
    }
}

impl DelayMs<u32> for Delay {
    fn delay_ms(&mut self, ms: u32) {
        self.delay_us(ms * 1_000);
    }
}

impl DelayMs<u16> for Delay {
    fn delay_ms(&mut self, ms: u16) {
        self.delay_ms(u32(ms));
    }
}

impl DelayMs<u8> for Delay {
    fn delay_ms(&mut self, ms: u8) {
        self.delay_ms(u32(ms));
    }
}

impl DelayUs<u32> for Delay {
    fn delay_us(&mut self, us: u32) {
        spin(self.spins(us));
    }
}

impl DelayUs<u16> for Delay {
    fn delay_us(&mut self, us: u16) {
        self.delay_us(u32(us))
    }
}

impl DelayUs<u8> for Delay {
    fn delay_us(&mut self, us: u8) {
        self.delay_us(u32(us))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::U32Ext;

    #[test]
    fn iteration_count_is_monotonic() {
        let delay = Delay::new();

        assert_eq!(delay.spins(0), 0);
        for &(a, b) in &[(0u32, 1u32), (1, 2), (999, 1_000), (1_000, 250_000)] {
            assert!(delay.spins(a) < delay.spins(b));
        }
    }

    #[test]
    fn milliseconds_expand_to_exactly_a_thousand_microseconds() {
        let delay = Delay::new();

        // delay_ms(ms) is defined as delay_us(ms * 1000); the iteration
        // counts must line up exactly.
        for &ms in &[1u32, 250, 500, 2_000] {
            assert_eq!(delay.spins(ms * 1_000), u64::from(ms) * 1_000 * 6);
        }
    }

    #[test]
    fn calibration_scales_the_iteration_count_linearly() {
        let stock = Delay::new();
        let faster_core = Delay::with_calibration(SPINS_PER_US * 200);

        assert_eq!(stock.spins(10), 60);
        assert_eq!(faster_core.spins(10), 12_000);
    }

    #[test]
    fn widened_product_does_not_wrap() {
        let delay = Delay::with_calibration(u32::max_value());

        assert_eq!(
            delay.spins(u32::max_value()),
            u64::from(u32::max_value()) * u64::from(u32::max_value())
        );
    }

    #[test]
    #[should_panic]
    fn zero_calibration_is_rejected() {
        let _ = Delay::with_calibration(0);
    }

    #[test]
    fn duration_wrappers_feed_the_microsecond_path() {
        let delay = Delay::new();
        let MicroSeconds(us) = 2u32.ms();

        assert_eq!(delay.spins(us), 2 * 1_000 * 6);
    }
}
