// (MCP9600 https://ww1.microchip.com/downloads/en/DeviceDoc/MCP960X-Data-Sheet-20005426.pdf)
//
// Only the registers the poll cycle needs are bound here.

use bitbybit::bitfield;
use embedded_hal::blocking::i2c::{Write, WriteRead};
use num_enum::IntoPrimitive;

use crate::thermocouple::{AdcResolution, Junctions, Thermocouple, ThermocoupleType};

/// Register pointers
#[allow(unused)]
#[derive(Clone, Copy, Debug, IntoPrimitive)]
#[repr(u8)]
pub enum Register {
    HotJunction = 0x00,
    JunctionDelta = 0x01,
    ColdJunction = 0x02,
    RawData = 0x03,
    Status = 0x04,
    SensorConfiguration = 0x05,
    DeviceConfiguration = 0x06,
    DeviceId = 0x20,
}

/// Expected content of the upper byte of the device ID register.
pub const DEVICE_ID: u8 = 0x40;

/// Temperature register LSB in °C.
const LSB: f32 = 0.0625;

#[bitfield(u8)]
struct Status {
    #[bit(7, rw)]
    burst_complete: bool,
    #[bit(6, rw)]
    conversion_complete: bool,
}

#[bitfield(u8)]
struct SensorConfiguration {
    #[bits(4..=6, rw)]
    thermocouple: ThermocoupleType,
}

#[bitfield(u8)]
struct DeviceConfiguration {
    // 0: 0.0625 °C, 1: 0.25 °C
    #[bit(7, rw)]
    coarse_cold_junction: bool,
    #[bits(5..=6, rw)]
    resolution: AdcResolution,
}

#[derive(Debug, PartialEq, Eq)]
pub enum Error<E> {
    I2c(E),
    /// Something answered that is not an MCP9600.
    DeviceId(u8),
}

impl<E> From<E> for Error<E> {
    fn from(value: E) -> Self {
        Self::I2c(value)
    }
}

/// MCP9600 binding over a blocking I2C bus.
pub struct Mcp9600<I2C> {
    i2c: I2C,
}

impl<I2C, E> Mcp9600<I2C>
where
    I2C: Write<Error = E> + WriteRead<Error = E>,
{
    pub fn new(i2c: I2C) -> Self {
        Self { i2c }
    }

    pub fn release(self) -> I2C {
        self.i2c
    }

    fn read(&mut self, address: u8, reg: Register, buf: &mut [u8]) -> Result<(), E> {
        self.i2c.write_read(address, &[reg.into()], buf)
    }

    fn write(&mut self, address: u8, reg: Register, value: u8) -> Result<(), E> {
        self.i2c.write(address, &[reg.into(), value])
    }

    fn read_temperature_register(&mut self, address: u8, reg: Register) -> Result<f32, E> {
        let mut buf = [0u8; 2];
        self.read(address, reg, &mut buf)?;
        Ok(f32::from(i16::from_be_bytes(buf)) * LSB)
    }
}

impl<I2C, E> Thermocouple for Mcp9600<I2C>
where
    I2C: Write<Error = E> + WriteRead<Error = E>,
{
    type Error = Error<E>;

    fn configure(
        &mut self,
        address: u8,
        thermocouple: ThermocoupleType,
        resolution: AdcResolution,
    ) -> Result<(), Self::Error> {
        // ID byte followed by the revision byte.
        let mut id = [0u8; 2];
        self.read(address, Register::DeviceId, &mut id)?;
        if id[0] != DEVICE_ID {
            return Err(Error::DeviceId(id[0]));
        }

        // Filter off.
        let sensor = SensorConfiguration::new_with_raw_value(0).with_thermocouple(thermocouple);
        self.write(address, Register::SensorConfiguration, sensor.raw_value())?;

        // Normal mode, single-sample burst.
        let device = DeviceConfiguration::new_with_raw_value(0)
            .with_coarse_cold_junction(false)
            .with_resolution(resolution);
        self.write(address, Register::DeviceConfiguration, device.raw_value())?;

        // Drop any result converted under the previous configuration.
        let status = Status::new_with_raw_value(0);
        self.write(address, Register::Status, status.raw_value())?;
        Ok(())
    }

    fn conversion_ready(&mut self, address: u8) -> Result<bool, Self::Error> {
        let mut buf = [0u8; 1];
        self.read(address, Register::Status, &mut buf)?;
        Ok(Status::new_with_raw_value(buf[0]).conversion_complete())
    }

    fn read_temperature(&mut self, address: u8) -> Result<Junctions, Self::Error> {
        let hot = self.read_temperature_register(address, Register::HotJunction)?;
        let cold = self.read_temperature_register(address, Register::ColdJunction)?;

        // Acknowledge the conversion so the next ready check waits for fresh data.
        let status = Status::new_with_raw_value(0)
            .with_burst_complete(false)
            .with_conversion_complete(false);
        self.write(address, Register::Status, status.raw_value())?;

        Ok(Junctions { hot, cold })
    }
}
