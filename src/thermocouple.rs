//! Thermocouple amplifier port and the per-sensor enums it is configured with.

use arbitrary_int::{u2, u3, Number};
use bitbybit::bitenum;
use serde::{Deserialize, Serialize};
use strum::{EnumIter, IntoStaticStr};

/// Thermocouple wire material.
///
/// Discriminants are the amplifier's 3-bit type code. The type only changes the amplifier's
/// internal linearization, never the poll cycle.
#[bitenum(u3, exhaustive = true)]
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize, EnumIter, IntoStaticStr)]
pub enum ThermocoupleType {
    K = 0,
    J = 1,
    T = 2,
    N = 3,
    S = 4,
    E = 5,
    B = 6,
    R = 7,
}

impl ThermocoupleType {
    /// Decode a raw type code. `None` for codes that do not fit the 3-bit field.
    pub fn from_code(code: u8) -> Option<Self> {
        (code <= u3::MAX.value()).then(|| Self::new_with_raw_value(u3::new(code)))
    }

    pub fn code(self) -> u8 {
        self.raw_value().value()
    }
}

/// Amplifier ADC resolution. Trades conversion time against bit depth.
///
/// Discriminants are the amplifier's 2-bit resolution code.
#[bitenum(u2, exhaustive = true)]
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize, EnumIter, IntoStaticStr)]
pub enum AdcResolution {
    Bits18 = 0,
    Bits16 = 1,
    Bits14 = 2,
    Bits12 = 3,
}

impl AdcResolution {
    /// Decode a raw resolution code. `None` for codes that do not fit the 2-bit field.
    pub fn from_code(code: u8) -> Option<Self> {
        (code <= u2::MAX.value()).then(|| Self::new_with_raw_value(u2::new(code)))
    }

    pub fn code(self) -> u8 {
        self.raw_value().value()
    }

    /// Nominal conversion time in milliseconds.
    pub fn conversion_time_ms(self) -> u32 {
        match self {
            Self::Bits18 => 320,
            Self::Bits16 => 80,
            Self::Bits14 => 20,
            Self::Bits12 => 5,
        }
    }
}

/// One temperature sample in degrees Celsius.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Junctions {
    /// Thermocouple (hot junction) temperature.
    pub hot: f32,
    /// Amplifier die (cold junction) temperature.
    pub cold: f32,
}

/// Port to the thermocouple amplifier that answers on the currently selected multiplexer
/// channel.
///
/// Every amplifier behind the multiplexer shares one bus address, so all methods act on
/// whichever amplifier the multiplexer currently connects.
pub trait Thermocouple {
    type Error;

    /// Set the wire type and ADC resolution of the amplifier at `address`.
    fn configure(
        &mut self,
        address: u8,
        thermocouple: ThermocoupleType,
        resolution: AdcResolution,
    ) -> Result<(), Self::Error>;

    /// Check whether a new conversion result is available.
    fn conversion_ready(&mut self, address: u8) -> Result<bool, Self::Error>;

    /// Read the latest conversion result.
    fn read_temperature(&mut self, address: u8) -> Result<Junctions, Self::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn type_codes_follow_register_encoding() {
        assert_eq!(ThermocoupleType::K.code(), 0);
        assert_eq!(ThermocoupleType::T.code(), 2);
        for t in ThermocoupleType::iter() {
            assert_eq!(ThermocoupleType::from_code(t.code()), Some(t));
        }
        assert_eq!(ThermocoupleType::from_code(8), None);
    }

    #[test]
    fn resolution_codes_follow_register_encoding() {
        assert_eq!(AdcResolution::Bits12.code(), 3);
        assert_eq!(AdcResolution::from_code(4), None);
        assert_eq!(AdcResolution::from_code(0), Some(AdcResolution::Bits18));
    }

    #[test]
    fn finer_resolution_converts_slower() {
        let times: heapless::Vec<u32, 4> = AdcResolution::iter()
            .map(AdcResolution::conversion_time_ms)
            .collect();
        assert!(times.windows(2).all(|w| w[0] > w[1]));
    }

    #[test]
    fn names() {
        let name: &'static str = ThermocoupleType::K.into();
        assert_eq!(name, "K");
        let name: &'static str = AdcResolution::Bits12.into();
        assert_eq!(name, "Bits12");
    }
}
