//! Packed binary form of the configuration table.
//!
//! The layout is 30 bytes: eight `(channel, type code, resolution code)` rows followed by the
//! channel switch delay and read interval (both `u16`, little endian), the multiplexer address
//! and the amplifier address. Type and resolution codes are the amplifier register codes.

use bytemuck::{Pod, Zeroable};

use crate::config::{Config, SensorConfig, SENSOR_COUNT};
use crate::thermocouple::{AdcResolution, ThermocoupleType};

#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
struct RawSensor {
    channel: u8,
    thermocouple: u8,
    resolution: u8,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
struct RawConfig {
    sensors: [RawSensor; SENSOR_COUNT],
    channel_switch_delay_ms: [u8; 2],
    read_interval_ms: [u8; 2],
    mux_address: u8,
    chip_address: u8,
}

/// Size of the packed table in bytes.
pub const LAYOUT_SIZE: usize = core::mem::size_of::<RawConfig>();

/// Packed table decode failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LayoutError {
    /// Input is not exactly [`LAYOUT_SIZE`] bytes long.
    Length(usize),
    UnknownThermocoupleType { sensor: usize, code: u8 },
    UnknownResolution { sensor: usize, code: u8 },
}

impl From<&Config> for RawConfig {
    fn from(config: &Config) -> Self {
        Self {
            sensors: config.sensors.map(|s| RawSensor {
                channel: s.channel,
                thermocouple: s.thermocouple.code(),
                resolution: s.resolution.code(),
            }),
            channel_switch_delay_ms: config.channel_switch_delay_ms.to_le_bytes(),
            read_interval_ms: config.read_interval_ms.to_le_bytes(),
            mux_address: config.mux_address,
            chip_address: config.chip_address,
        }
    }
}

impl TryFrom<&RawConfig> for Config {
    type Error = LayoutError;

    fn try_from(raw: &RawConfig) -> Result<Self, LayoutError> {
        let mut sensors = [SensorConfig::new(0, ThermocoupleType::K, AdcResolution::Bits18);
            SENSOR_COUNT];
        for (sensor, (config, raw)) in sensors.iter_mut().zip(raw.sensors.iter()).enumerate() {
            let thermocouple = ThermocoupleType::from_code(raw.thermocouple).ok_or(
                LayoutError::UnknownThermocoupleType {
                    sensor,
                    code: raw.thermocouple,
                },
            )?;
            let resolution = AdcResolution::from_code(raw.resolution).ok_or(
                LayoutError::UnknownResolution {
                    sensor,
                    code: raw.resolution,
                },
            )?;
            *config = SensorConfig::new(raw.channel, thermocouple, resolution);
        }

        Ok(Self {
            sensors,
            channel_switch_delay_ms: u16::from_le_bytes(raw.channel_switch_delay_ms),
            read_interval_ms: u16::from_le_bytes(raw.read_interval_ms),
            mux_address: raw.mux_address,
            chip_address: raw.chip_address,
        })
    }
}

impl Config {
    /// Pack into the binary layout.
    pub fn to_layout(&self) -> [u8; LAYOUT_SIZE] {
        bytemuck::cast(RawConfig::from(self))
    }

    /// Unpack from the binary layout.
    ///
    /// # Note
    /// Only the encoding is checked. Call [`Config::validate`] before using the result.
    pub fn from_layout(bytes: &[u8]) -> Result<Self, LayoutError> {
        let raw: &RawConfig =
            bytemuck::try_from_bytes(bytes).map_err(|_| LayoutError::Length(bytes.len()))?;
        Self::try_from(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEFAULT_LAYOUT: [u8; 30] = [
        4, 0, 3, //
        5, 0, 3, //
        6, 0, 3, //
        7, 0, 3, //
        0, 2, 3, //
        1, 2, 3, //
        2, 2, 3, //
        3, 2, 3, //
        5, 0, // channel switch delay
        0xe8, 0x03, // read interval
        0x70, 0x67,
    ];

    #[test]
    fn size() {
        assert_eq!(LAYOUT_SIZE, 30);
    }

    #[test]
    fn default_is_bit_exact() {
        assert_eq!(Config::DEFAULT.to_layout(), DEFAULT_LAYOUT);
        assert_eq!(Config::from_layout(&DEFAULT_LAYOUT), Ok(Config::DEFAULT));
    }

    #[test]
    fn rejects_unknown_codes() {
        let mut bytes = DEFAULT_LAYOUT;
        bytes[3 * 6 + 1] = 9;
        assert_eq!(
            Config::from_layout(&bytes),
            Err(LayoutError::UnknownThermocoupleType { sensor: 6, code: 9 })
        );

        let mut bytes = DEFAULT_LAYOUT;
        bytes[2] = 4;
        assert_eq!(
            Config::from_layout(&bytes),
            Err(LayoutError::UnknownResolution { sensor: 0, code: 4 })
        );
    }

    #[test]
    fn rejects_wrong_length() {
        assert_eq!(
            Config::from_layout(&DEFAULT_LAYOUT[..29]),
            Err(LayoutError::Length(29))
        );
    }

    #[test]
    fn decode_does_not_validate() {
        let mut bytes = DEFAULT_LAYOUT;
        bytes[3] = 4;
        let config = Config::from_layout(&bytes).unwrap();
        assert!(config.validate().is_err());
    }
}
