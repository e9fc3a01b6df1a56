//! Sensor table and bus constants.
//!
//! The table is fixed at build time (see [`Config::DEFAULT`]), checked once by
//! [`Config::validate`] before polling starts and never mutated afterwards.

use core::fmt;

use fugit::ExtU32;
use serde::{Deserialize, Serialize};

use crate::poll::Duration;
use crate::thermocouple::{AdcResolution, ThermocoupleType};

/// Number of thermocouple amplifiers installed.
pub const SENSOR_COUNT: usize = 8;

/// Number of downstream channels on the TCA9548A multiplexer.
pub const MUX_CHANNELS: u8 = 8;

/// Serial line rate of the record stream.
pub const BAUD_RATE: u32 = 115_200;

/// Configuration of one sensor slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SensorConfig {
    /// Multiplexer channel the amplifier is wired to.
    pub channel: u8,
    pub thermocouple: ThermocoupleType,
    pub resolution: AdcResolution,
}

impl SensorConfig {
    pub const fn new(channel: u8, thermocouple: ThermocoupleType, resolution: AdcResolution) -> Self {
        Self {
            channel,
            thermocouple,
            resolution,
        }
    }
}

/// Complete logger configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Per-sensor settings, indexed by sensor number.
    pub sensors: [SensorConfig; SENSOR_COUNT],

    /// Settling time after a multiplexer channel switch before the amplifier may be read.
    ///
    /// # Value
    /// Milliseconds, 0 to 65535
    pub channel_switch_delay_ms: u16,

    /// Minimum time between the starts of two poll cycles.
    ///
    /// # Value
    /// Milliseconds, 1 to 65535
    pub read_interval_ms: u16,

    /// 7-bit bus address of the multiplexer.
    pub mux_address: u8,

    /// 7-bit bus address shared by all amplifiers.
    pub chip_address: u8,
}

impl Config {
    /// The installed sensor table: K-type on channels 4..=7, T-type on channels 0..=3, all at
    /// 12 bit.
    pub const DEFAULT: Self = {
        use AdcResolution::Bits12;
        use ThermocoupleType::{K, T};
        Self {
            sensors: [
                SensorConfig::new(4, K, Bits12),
                SensorConfig::new(5, K, Bits12),
                SensorConfig::new(6, K, Bits12),
                SensorConfig::new(7, K, Bits12),
                SensorConfig::new(0, T, Bits12),
                SensorConfig::new(1, T, Bits12),
                SensorConfig::new(2, T, Bits12),
                SensorConfig::new(3, T, Bits12),
            ],
            channel_switch_delay_ms: 5,
            read_interval_ms: 1000,
            mux_address: 0x70,
            chip_address: 0x67,
        }
    };

    pub fn channel_switch_delay(&self) -> Duration {
        u32::from(self.channel_switch_delay_ms).millis()
    }

    pub fn read_interval(&self) -> Duration {
        u32::from(self.read_interval_ms).millis()
    }

    /// Check the table for wiring mistakes.
    ///
    /// A failure here is a programming error in the table. The logger must not start polling
    /// with a configuration that fails validation.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        for (sensor, config) in self.sensors.iter().enumerate() {
            let channel = config.channel;
            if channel >= MUX_CHANNELS {
                return Err(ConfigValidationError::ChannelOutOfRange { sensor, channel });
            }
            if let Some(first) = self.sensors[..sensor]
                .iter()
                .position(|other| other.channel == channel)
            {
                return Err(ConfigValidationError::DuplicateChannel {
                    first,
                    second: sensor,
                    channel,
                });
            }
        }

        for address in [self.mux_address, self.chip_address] {
            if address > 0x7f {
                return Err(ConfigValidationError::AddressOutOfRange(address));
            }
        }
        if self.mux_address == self.chip_address {
            return Err(ConfigValidationError::AddressConflict(self.mux_address));
        }

        if self.read_interval_ms == 0 {
            return Err(ConfigValidationError::ZeroReadInterval);
        }

        Ok(())
    }

    /// Load and validate a configuration from its JSON form.
    pub fn from_json(json: &[u8]) -> Result<Self, LoadError> {
        let (config, _) = serde_json_core::from_slice::<Self>(json).map_err(LoadError::Json)?;
        config.validate().map_err(LoadError::Invalid)?;
        Ok(config)
    }

    /// Serialize into JSON.
    pub fn to_json<const N: usize>(
        &self,
    ) -> Result<heapless::String<N>, serde_json_core::ser::Error> {
        serde_json_core::to_string(self)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Startup validation failure. Fatal: the logger refuses to poll.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigValidationError {
    /// A sensor is wired to a channel the multiplexer does not have.
    ChannelOutOfRange { sensor: usize, channel: u8 },
    /// Two sensors claim the same multiplexer channel.
    DuplicateChannel {
        first: usize,
        second: usize,
        channel: u8,
    },
    /// Not a 7-bit bus address.
    AddressOutOfRange(u8),
    /// Multiplexer and amplifiers share a bus address.
    AddressConflict(u8),
    ZeroReadInterval,
}

impl fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ChannelOutOfRange { sensor, channel } => write!(
                f,
                "sensor {sensor} uses channel {channel}, multiplexer has {MUX_CHANNELS}"
            ),
            Self::DuplicateChannel {
                first,
                second,
                channel,
            } => write!(f, "sensors {first} and {second} both use channel {channel}"),
            Self::AddressOutOfRange(address) => {
                write!(f, "bus address {address:#04x} is not a 7-bit address")
            }
            Self::AddressConflict(address) => write!(
                f,
                "multiplexer and amplifiers share bus address {address:#04x}"
            ),
            Self::ZeroReadInterval => f.write_str("read interval must be non-zero"),
        }
    }
}

/// Failure to load a configuration from JSON.
#[derive(Debug)]
pub enum LoadError {
    Json(serde_json_core::de::Error),
    Invalid(ConfigValidationError),
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json(e) => write!(f, "malformed configuration: {e:?}"),
            Self::Invalid(e) => write!(f, "invalid configuration: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table() {
        let config = Config::DEFAULT;
        let channels = config.sensors.map(|s| s.channel);
        assert_eq!(channels, [4, 5, 6, 7, 0, 1, 2, 3]);
        for (i, sensor) in config.sensors.iter().enumerate() {
            let expected = if i < 4 {
                ThermocoupleType::K
            } else {
                ThermocoupleType::T
            };
            assert_eq!(sensor.thermocouple, expected);
            assert_eq!(sensor.resolution, AdcResolution::Bits12);
        }
        assert_eq!(config.channel_switch_delay_ms, 5);
        assert_eq!(config.read_interval_ms, 1000);
        assert_eq!(config.mux_address, 0x70);
        assert_eq!(config.chip_address, 0x67);
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn default_channels_are_distinct_and_in_range() {
        let sensors = Config::DEFAULT.sensors;
        for (i, a) in sensors.iter().enumerate() {
            assert!(a.channel < MUX_CHANNELS);
            for b in &sensors[i + 1..] {
                assert_ne!(a.channel, b.channel);
            }
        }
    }

    #[test]
    fn duplicate_channel() {
        let mut config = Config::DEFAULT;
        config.sensors[0].channel = 4;
        config.sensors[5].channel = 4;
        assert_eq!(
            config.validate(),
            Err(ConfigValidationError::DuplicateChannel {
                first: 0,
                second: 5,
                channel: 4
            })
        );
    }

    #[test]
    fn channel_out_of_range() {
        let mut config = Config::DEFAULT;
        config.sensors[2].channel = MUX_CHANNELS;
        assert_eq!(
            config.validate(),
            Err(ConfigValidationError::ChannelOutOfRange {
                sensor: 2,
                channel: MUX_CHANNELS
            })
        );
    }

    #[test]
    fn addresses() {
        let mut config = Config::DEFAULT;
        config.chip_address = config.mux_address;
        assert_eq!(
            config.validate(),
            Err(ConfigValidationError::AddressConflict(0x70))
        );

        config.chip_address = 0x80;
        assert_eq!(
            config.validate(),
            Err(ConfigValidationError::AddressOutOfRange(0x80))
        );
    }

    #[test]
    fn zero_interval() {
        let config = Config {
            read_interval_ms: 0,
            ..Config::DEFAULT
        };
        assert_eq!(
            config.validate(),
            Err(ConfigValidationError::ZeroReadInterval)
        );
    }

    #[test]
    fn durations() {
        let config = Config::DEFAULT;
        assert_eq!(config.channel_switch_delay().to_millis(), 5);
        assert_eq!(config.read_interval().to_millis(), 1000);
    }

    #[test]
    fn json() {
        let json = Config::DEFAULT.to_json::<1024>().unwrap();
        assert!(json.contains(r#""thermocouple":"K""#));
        assert!(json.contains(r#""resolution":"Bits12""#));
        assert_eq!(Config::from_json(json.as_bytes()).unwrap(), Config::DEFAULT);
    }

    #[test]
    fn json_rejects_unknown_type() {
        let json = Config::DEFAULT.to_json::<1024>().unwrap();
        let json = json.replacen(r#""thermocouple":"K""#, r#""thermocouple":"X""#, 1);
        assert!(matches!(
            Config::from_json(json.as_bytes()),
            Err(LoadError::Json(_))
        ));
    }

    #[test]
    fn json_rejects_duplicate_channel() {
        let mut config = Config::DEFAULT;
        config.sensors[1].channel = 4;
        let json = config.to_json::<1024>().unwrap();
        assert!(matches!(
            Config::from_json(json.as_bytes()),
            Err(LoadError::Invalid(
                ConfigValidationError::DuplicateChannel { channel: 4, .. }
            ))
        ));
    }
}
