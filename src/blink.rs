//! Periodic LED blinking
//!
//! Generic over [`OutputPin`] and [`DelayMs`], so it drives a real GPIO
//! pin on hardware and recording fakes in tests. Configuration of the
//! pin itself (function select) happens before construction, when the
//! pin is converted into output mode.

use crate::hal::blocking::delay::DelayMs;
use crate::hal::digital::v2::OutputPin;

/// Half of the blink period: 500 ms on, 500 ms off, one full cycle per
/// second.
pub const DEFAULT_HALF_PERIOD_MS: u32 = 500;

/// Drives an output pin high and low forever with a fixed half-period.
pub struct Blinker<LED, D> {
    led: LED,
    delay: D,
    half_period_ms: u32,
}

impl<LED, D> Blinker<LED, D>
where
    LED: OutputPin,
    D: DelayMs<u32>,
{
    /// Creates a 1 Hz blinker.
    pub fn new(led: LED, delay: D) -> Self {
        Blinker::with_half_period(led, delay, DEFAULT_HALF_PERIOD_MS)
    }

    /// Creates a blinker with a caller-chosen half-period.
    pub fn with_half_period(led: LED, delay: D, half_period_ms: u32) -> Self {
        Blinker {
            led,
            delay,
            half_period_ms,
        }
    }

    /// One full on/off cycle: set, wait, clear, wait.
    fn cycle(&mut self) -> Result<(), LED::Error> {
        self.led.set_high()?;
        self.delay.delay_ms(self.half_period_ms);
        self.led.set_low()?;
        self.delay.delay_ms(self.half_period_ms);
        Ok(())
    }

    /// Runs a bounded number of cycles. Test harnesses use this; the
    /// device itself runs [`Blinker::run`].
    pub fn run_cycles(&mut self, cycles: usize) -> Result<(), LED::Error> {
        for _ in 0..cycles {
            self.cycle()?;
        }
        Ok(())
    }

    /// Blinks until the power goes out.
    ///
    /// There is no exit path; the device has nothing else to do. A pin
    /// whose writes are infallible (every pin in this crate) cannot make
    /// `cycle` fail, so the error case is unreachable here and dropped.
    pub fn run(mut self) -> ! {
        loop {
            let _ = self.cycle();
        }
    }

    /// Releases the pin and the delay provider.
    pub fn free(self) -> (LED, D) {
        (self.led, self.delay)
    }
}
