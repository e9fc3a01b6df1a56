//! # Thermocouple logger
//!
//! Firmware polling eight MCP9600 thermocouple amplifiers behind a TCA9548A I2C multiplexer and
//! streaming one CSV record per cycle over the serial port.

#![cfg_attr(target_os = "none", no_std)]
#![cfg_attr(target_os = "none", no_main)]

#[cfg(target_os = "none")]
use panic_probe as _; // global panic handler

use thermocouple_logger::{config::Config, metadata::ApplicationMetadata};

/// Print the build information, the built-in sensor table as JSON and its binary layout.
///
/// With a path argument, load and validate that JSON table instead.
#[cfg(not(target_os = "none"))]
fn main() -> std::process::ExitCode {
    use std::process::ExitCode;
    use strum::IntoEnumIterator;
    use thermocouple_logger::{
        config::LoadError,
        thermocouple::{AdcResolution, ThermocoupleType},
    };

    let Some(path) = std::env::args().nth(1) else {
        let meta = serde_json_core::to_string::<_, 512>(&ApplicationMetadata::new()).unwrap();
        println!("{meta}");
        println!("{}", Config::DEFAULT.to_json::<1024>().unwrap());
        for (i, sensor) in Config::DEFAULT.sensors.iter().enumerate() {
            println!(
                "sensor {i}: channel {}, type {}, {}",
                sensor.channel,
                <&str>::from(sensor.thermocouple),
                <&str>::from(sensor.resolution)
            );
        }
        let layout: Vec<String> = Config::DEFAULT
            .to_layout()
            .iter()
            .map(|b| format!("{b:02x}"))
            .collect();
        println!("{}", layout.join(" "));
        return ExitCode::SUCCESS;
    };

    let json = match std::fs::read(&path) {
        Ok(json) => json,
        Err(e) => {
            eprintln!("{path}: {e}");
            return ExitCode::FAILURE;
        }
    };
    match Config::from_json(&json) {
        Ok(config) => {
            println!("{path}: ok");
            println!("{config:?}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{path}: {e}");
            if let LoadError::Json(_) = e {
                let types: Vec<&str> = ThermocoupleType::iter().map(<&str>::from).collect();
                let resolutions: Vec<&str> = AdcResolution::iter().map(<&str>::from).collect();
                eprintln!("thermocouple: {}", types.join(", "));
                eprintln!("resolution: {}", resolutions.join(", "));
            }
            ExitCode::FAILURE
        }
    }
}

#[cfg(target_os = "none")]
#[cfg_attr(target_os = "none", rtic::app(device = hal::stm32, peripherals = true, dispatchers=[DCMI]))]
mod app {
    use super::*;
    use embedded_hal::blocking::serial::Write;
    use log::{error, info, warn};
    use thermocouple_logger::{
        hardware::{hal, setup::setup, I2cBus, SerialTx, SystickClock},
        mcp9600::Mcp9600,
        multiplexer::Tca9548a,
        poll::Poller,
        report::{csv_line, READY},
    };

    type Logger = Poller<Tca9548a<I2cBus>, Mcp9600<I2cBus>, SystickClock>;

    #[shared]
    struct Shared {}

    #[local]
    struct Local {
        poller: Logger,
        serial: SerialTx,
    }

    #[init]
    fn init(c: init::Context) -> (Shared, Local) {
        let devices = setup(c.core, c.device);

        let metadata = ApplicationMetadata::new();
        info!(
            "{} {} ({}, {})",
            metadata.app, metadata.firmware_version, metadata.profile, metadata.rust_version
        );

        let poller = match Poller::new(Config::DEFAULT, devices.mux, devices.chip, SystickClock) {
            Ok(poller) => poller,
            Err(e) => {
                error!("Refusing to start: {}", e);
                panic!("invalid sensor table: {}", e);
            }
        };

        acquire::spawn().unwrap();

        (
            Shared {},
            Local {
                poller,
                serial: devices.serial,
            },
        )
    }

    #[task(priority = 1, local=[poller, serial])]
    async fn acquire(c: acquire::Context) {
        let serial = c.local.serial;
        if let Err(e) = serial.bwrite_all(READY.as_bytes()) {
            warn!("serial: {:?}", e);
        }

        c.local
            .poller
            .run(|cycle| match csv_line(cycle) {
                Ok(line) => {
                    if let Err(e) = serial.bwrite_all(line.as_bytes()) {
                        warn!("serial: {:?}", e);
                    }
                }
                Err(_) => warn!("record exceeds line capacity"),
            })
            .await;
    }
}
