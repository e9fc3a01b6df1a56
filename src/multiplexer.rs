//! I2C multiplexer port and its TCA9548A binding.

use embedded_hal::blocking::i2c::Write;

use crate::config::MUX_CHANNELS;

/// Port to the bus switch that connects exactly one downstream channel to the shared bus.
pub trait Multiplexer {
    type Error;

    /// Connect `channel` and disconnect every other channel.
    fn select_channel(&mut self, address: u8, channel: u8) -> Result<(), Self::Error>;
}

#[derive(Debug, PartialEq, Eq)]
pub enum Error<E> {
    I2c(E),
    /// The switch has no such channel.
    Channel(u8),
}

/// TCA9548A eight channel switch.
///
/// The control register is a channel bitmask written as a single byte. Writing a mask with a
/// single bit set selects that channel exclusively.
pub struct Tca9548a<I2C> {
    i2c: I2C,
}

impl<I2C: Write> Tca9548a<I2C> {
    pub fn new(i2c: I2C) -> Self {
        Self { i2c }
    }

    pub fn release(self) -> I2C {
        self.i2c
    }
}

impl<I2C: Write> Multiplexer for Tca9548a<I2C> {
    type Error = Error<I2C::Error>;

    fn select_channel(&mut self, address: u8, channel: u8) -> Result<(), Self::Error> {
        if channel >= MUX_CHANNELS {
            return Err(Error::Channel(channel));
        }
        self.i2c.write(address, &[1 << channel]).map_err(Error::I2c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq, Eq)]
    struct Nack;

    #[derive(Default)]
    struct FakeBus {
        writes: Vec<(u8, Vec<u8>)>,
        nack: bool,
    }

    impl Write for FakeBus {
        type Error = Nack;

        fn write(&mut self, address: u8, bytes: &[u8]) -> Result<(), Nack> {
            if self.nack {
                return Err(Nack);
            }
            self.writes.push((address, bytes.to_vec()));
            Ok(())
        }
    }

    #[test]
    fn select_writes_one_hot_mask() {
        let mut mux = Tca9548a::new(FakeBus::default());
        mux.select_channel(0x70, 0).unwrap();
        mux.select_channel(0x70, 4).unwrap();
        mux.select_channel(0x70, 7).unwrap();
        assert_eq!(
            mux.release().writes,
            [
                (0x70, vec![0b0000_0001]),
                (0x70, vec![0b0001_0000]),
                (0x70, vec![0b1000_0000])
            ]
        );
    }

    #[test]
    fn no_such_channel() {
        let mut mux = Tca9548a::new(FakeBus::default());
        assert_eq!(
            mux.select_channel(0x70, MUX_CHANNELS),
            Err(Error::Channel(MUX_CHANNELS))
        );
        assert!(mux.release().writes.is_empty());
    }

    #[test]
    fn nack() {
        let mut mux = Tca9548a::new(FakeBus {
            nack: true,
            ..Default::default()
        });
        assert_eq!(mux.select_channel(0x70, 1), Err(Error::I2c(Nack)));
    }
}
