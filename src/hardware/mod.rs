//! # Thermocouple logger firmware
//!
//! Hardware specific setup etc.

pub use stm32h7xx_hal as hal;

use rtic_monotonics::Monotonic;

use crate::poll::{Clock, Duration, Instant};

pub mod setup;

/// System timer (RTIC Monotonic) tick frequency
pub const MONOTONIC_FREQUENCY: u32 = 1_000;
rtic_monotonics::systick_monotonic!(Systick, MONOTONIC_FREQUENCY);

pub type I2c = hal::i2c::I2c<hal::stm32::I2C1>;

/// Handle to the I2C bus shared by the multiplexer and the amplifiers.
pub type I2cBus = shared_bus_rtic::SharedBus<I2c>;

pub type SerialTx = hal::serial::Tx<hal::stm32::USART3>;

/// [`Clock`] backed by the system monotonic.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystickClock;

impl Clock for SystickClock {
    fn now(&self) -> Instant {
        Systick::now()
    }

    async fn delay(&mut self, duration: Duration) {
        Systick::delay(duration).await;
    }
}
