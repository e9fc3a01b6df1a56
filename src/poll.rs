//! # Sensor poll cycle
//!
//! All amplifiers answer on the same bus address, so only the one behind the currently selected
//! multiplexer channel is reachable. A cycle therefore walks the sensor table in index order and,
//! for each sensor, selects its channel, waits for the bus to settle, waits for a finished
//! conversion and reads it. A failing sensor is reported and skipped; it never stops the
//! remaining sensors. The next cycle is the retry.
//!
//! Exclusive access to the shared address is guaranteed by program order alone: there is a
//! single poller and it never yields between a channel select and the matching read except to
//! wait on its own clock.

use fugit::ExtU32;
use heapless::Vec;
use log::{debug, info, trace, warn};

use crate::config::{Config, ConfigValidationError, SENSOR_COUNT};
use crate::multiplexer::Multiplexer;
use crate::thermocouple::{AdcResolution, Thermocouple};

/// Millisecond time base of the poller.
pub type Instant = fugit::Instant<u32, 1, 1_000>;
pub type Duration = fugit::Duration<u32, 1, 1_000>;

/// Interval between conversion-complete checks.
const READY_POLL_PERIOD_MS: u32 = 1;

/// Time source and timed wait used by the poller.
#[allow(async_fn_in_trait)]
pub trait Clock {
    fn now(&self) -> Instant;

    /// Suspend the poller for `duration`.
    async fn delay(&mut self, duration: Duration);
}

/// One successful sample.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Reading {
    /// Index into the sensor table.
    pub sensor: usize,
    pub channel: u8,
    /// Thermocouple temperature in °C.
    pub temperature: f32,
    /// Amplifier cold junction temperature in °C.
    pub cold_junction: f32,
    pub timestamp: Instant,
}

/// Amplifier side failure of a single sensor.
#[derive(Debug, PartialEq, Eq)]
pub enum SensorReadError<E> {
    /// Applying type and resolution failed.
    Configure(E),
    /// No conversion completed within the ready timeout.
    NotReady,
    /// The amplifier did not acknowledge the ready check or the read.
    Read(E),
}

/// Failure of a single sensor within a cycle.
#[derive(Debug, PartialEq, Eq)]
pub enum PollError<M, T> {
    /// The multiplexer did not acknowledge the channel select.
    Bus(M),
    SensorRead(SensorReadError<T>),
}

impl<M, T> From<SensorReadError<T>> for PollError<M, T> {
    fn from(value: SensorReadError<T>) -> Self {
        Self::SensorRead(value)
    }
}

pub type SensorResult<M, T> = Result<Reading, PollError<M, T>>;

/// Outcome of one pass over the sensor table.
#[derive(Debug)]
pub struct Cycle<M, T> {
    pub started: Instant,
    /// One entry per sensor, in table order.
    pub results: Vec<SensorResult<M, T>, SENSOR_COUNT>,
}

impl<M, T> Cycle<M, T> {
    pub fn failures(&self) -> usize {
        self.results.iter().filter(|r| r.is_err()).count()
    }
}

/// Drives the multiplexer and the amplifiers through the configured table.
pub struct Poller<M, T, C> {
    config: Config,
    mux: M,
    chip: T,
    clock: C,
    // Amplifiers lose their configuration on power loss. A slot is reconfigured on first use
    // and after any failure.
    configured: [bool; SENSOR_COUNT],
}

impl<M, T, C> Poller<M, T, C>
where
    M: Multiplexer,
    M::Error: core::fmt::Debug,
    T: Thermocouple,
    T::Error: core::fmt::Debug,
    C: Clock,
{
    /// Construct a poller.
    ///
    /// # Args
    /// * `config` - Sensor table. Validated here; an invalid table is refused.
    /// * `mux` - Multiplexer port.
    /// * `chip` - Amplifier port.
    /// * `clock` - Time base for settling, ready and interval waits.
    pub fn new(config: Config, mux: M, chip: T, clock: C) -> Result<Self, ConfigValidationError> {
        config.validate()?;
        info!(
            "Polling {} sensors every {} ms",
            SENSOR_COUNT, config.read_interval_ms
        );
        Ok(Self {
            config,
            mux,
            chip,
            clock,
            configured: [false; SENSOR_COUNT],
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn release(self) -> (M, T, C) {
        (self.mux, self.chip, self.clock)
    }

    /// Poll every sensor once, in table order.
    pub async fn poll(&mut self) -> Cycle<M::Error, T::Error> {
        let started = self.clock.now();
        let mut results = Vec::new();

        for sensor in 0..SENSOR_COUNT {
            let result = self.poll_sensor(sensor).await;
            match &result {
                Ok(reading) => debug!(
                    "sensor {}: {} °C (cold junction {} °C)",
                    sensor, reading.temperature, reading.cold_junction
                ),
                Err(e) => {
                    self.configured[sensor] = false;
                    let slot = self.config.sensors[sensor];
                    warn!(
                        "sensor {} (channel {}, type {}): {:?}",
                        sensor,
                        slot.channel,
                        <&'static str>::from(slot.thermocouple),
                        e
                    );
                }
            }
            let pushed = results.push(result).is_ok();
            debug_assert!(pushed, "cycle holds one result per sensor");
        }

        let cycle = Cycle { started, results };
        trace!(
            "cycle done in {} ms, {} failures",
            self.elapsed_since(started).to_millis(),
            cycle.failures()
        );
        cycle
    }

    /// Wait until the read interval has passed since `started`.
    ///
    /// Returns immediately if the cycle overran the interval.
    pub async fn wait_for_next_cycle(&mut self, started: Instant) {
        let next = started + self.config.read_interval();
        match next.checked_duration_since(self.clock.now()) {
            Some(remaining) => {
                if remaining.ticks() > 0 {
                    self.clock.delay(remaining).await;
                }
            }
            None => warn!(
                "cycle overran the {} ms interval",
                self.config.read_interval_ms
            ),
        }
    }

    /// Poll forever, handing each finished cycle to `emit`.
    pub async fn run(&mut self, mut emit: impl FnMut(&Cycle<M::Error, T::Error>)) {
        loop {
            let cycle = self.poll().await;
            emit(&cycle);
            self.wait_for_next_cycle(cycle.started).await;
        }
    }

    async fn poll_sensor(&mut self, sensor: usize) -> SensorResult<M::Error, T::Error> {
        let config = self.config.sensors[sensor];
        let address = self.config.chip_address;

        self.mux
            .select_channel(self.config.mux_address, config.channel)
            .map_err(PollError::Bus)?;

        // The previous channel's amplifier may still drive the bus.
        self.clock.delay(self.config.channel_switch_delay()).await;

        if !self.configured[sensor] {
            self.chip
                .configure(address, config.thermocouple, config.resolution)
                .map_err(SensorReadError::Configure)?;
            self.configured[sensor] = true;
        }

        self.wait_ready(address, config.resolution).await?;

        let junctions = self
            .chip
            .read_temperature(address)
            .map_err(SensorReadError::Read)?;

        Ok(Reading {
            sensor,
            channel: config.channel,
            temperature: junctions.hot,
            cold_junction: junctions.cold,
            timestamp: self.clock.now(),
        })
    }

    /// Wait for a completed conversion, bounded by twice the nominal conversion time.
    async fn wait_ready(
        &mut self,
        address: u8,
        resolution: AdcResolution,
    ) -> Result<(), SensorReadError<T::Error>> {
        let start = self.clock.now();
        let timeout: Duration = (2 * resolution.conversion_time_ms()).millis();
        loop {
            if self
                .chip
                .conversion_ready(address)
                .map_err(SensorReadError::Read)?
            {
                return Ok(());
            }
            if self.elapsed_since(start) >= timeout {
                return Err(SensorReadError::NotReady);
            }
            self.clock.delay(READY_POLL_PERIOD_MS.millis()).await;
        }
    }

    fn elapsed_since(&self, start: Instant) -> Duration {
        self.clock
            .now()
            .checked_duration_since(start)
            .unwrap_or(Duration::from_ticks(0))
    }
}
