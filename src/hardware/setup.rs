//! Board bring-up: clocks, logger, monotonic, I2C and the record UART.

use log::info;
use rtt_logger::RTTLogger;

use super::hal::{self, prelude::*};
use super::{I2c, I2cBus, SerialTx, Systick};
use crate::config::BAUD_RATE;
use crate::mcp9600::Mcp9600;
use crate::multiplexer::Tca9548a;

/// I2C bus clock. The TCA9548A and MCP9600 both support fast mode but long sensor cabling does
/// not.
const I2C_FREQUENCY_KHZ: u32 = 100;

pub struct LoggerDevices {
    pub mux: Tca9548a<I2cBus>,
    pub chip: Mcp9600<I2cBus>,
    pub serial: SerialTx,
}

/// Configure the board.
///
/// # Args
/// * `core` - Core peripherals
/// * `device` - Device peripherals
///
/// # Returns
/// The bus bindings and the record UART transmitter.
pub fn setup(core: rtic::export::Peripherals, device: hal::stm32::Peripherals) -> LoggerDevices {
    static LOGGER: RTTLogger = RTTLogger::new(log::LevelFilter::Debug);
    rtt_target::rtt_init_print!();
    log::set_logger(&LOGGER)
        .map(|()| log::set_max_level(log::LevelFilter::Debug))
        .unwrap();
    info!("---Starting hardware setup");

    let pwr = device.PWR.constrain();
    let pwrcfg = pwr.freeze();
    let ccdr = device
        .RCC
        .constrain()
        .sysclk(400.MHz())
        .hclk(200.MHz())
        .freeze(pwrcfg, &device.SYSCFG);

    Systick::start(core.SYST, ccdr.clocks.sysclk().to_Hz());

    let gpiob = device.GPIOB.split(ccdr.peripheral.GPIOB);
    let gpiod = device.GPIOD.split(ccdr.peripheral.GPIOD);

    let scl = gpiob.pb8.into_alternate::<4>().set_open_drain();
    let sda = gpiob.pb9.into_alternate::<4>().set_open_drain();
    let i2c = device.I2C1.i2c(
        (scl, sda),
        I2C_FREQUENCY_KHZ.kHz(),
        ccdr.peripheral.I2C1,
        &ccdr.clocks,
    );
    let bus_manager = shared_bus_rtic::new!(i2c, I2c);

    let tx = gpiod.pd8.into_alternate::<7>();
    let rx = gpiod.pd9.into_alternate::<7>();
    let serial = device
        .USART3
        .serial(
            (tx, rx),
            BAUD_RATE.bps(),
            ccdr.peripheral.USART3,
            &ccdr.clocks,
        )
        .unwrap();
    let (serial, _) = serial.split();

    info!("---Hardware setup complete");

    LoggerDevices {
        mux: Tca9548a::new(bus_manager.acquire()),
        chip: Mcp9600::new(bus_manager.acquire()),
        serial,
    }
}
