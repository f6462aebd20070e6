// * Sensor Source - pH and temperature from Atlas Scientific EZO boards over I2C
// * Falls back to simulated values when the bus cannot be opened

use crate::config::constants::{
    EZO_RESPONSE_DELAY, I2C_BUS, PH_I2C_ADDR, SIM_PH_RANGE, SIM_TEMP_RANGE, TEMP_I2C_ADDR,
};
use crate::config::SensorConfig;
use embedded_hal::i2c::{Error as _, I2c};
use rand::Rng;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

// * EZO "R" (single read) command
const EZO_READ_COMMAND: u8 = 0x52;
// * Status byte for a successful response
const EZO_STATUS_OK: u8 = 1;
const EZO_RESPONSE_LEN: usize = 16;

#[derive(Debug, Error, PartialEq)]
pub enum SensorError {
    #[error("I2C error at 0x{addr:02x}: {reason}")]
    Bus { addr: u8, reason: String },

    #[error("EZO at 0x{addr:02x} returned status {status}")]
    Status { addr: u8, status: u8 },

    #[error("EZO at 0x{addr:02x} sent unparseable value {raw:?}")]
    Parse { addr: u8, raw: String },
}

/// Which physical quantity to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Ph,
    Temperature,
}

impl Channel {
    pub fn address(self) -> u8 {
        match self {
            Channel::Ph => PH_I2C_ADDR,
            Channel::Temperature => TEMP_I2C_ADDR,
        }
    }

    fn simulated_range(self) -> (f64, f64) {
        match self {
            Channel::Ph => SIM_PH_RANGE,
            Channel::Temperature => SIM_TEMP_RANGE,
        }
    }
}

/// EZO boards sharing one I2C bus.
pub struct EzoBus<I> {
    bus: I,
    response_delay: Duration,
}

impl<I: I2c> EzoBus<I> {
    pub fn new(bus: I) -> Self {
        Self::with_delay(bus, EZO_RESPONSE_DELAY)
    }

    pub fn with_delay(bus: I, response_delay: Duration) -> Self {
        Self {
            bus,
            response_delay,
        }
    }

    /// Issues a read command and parses the ASCII decimal response.
    pub async fn read(&mut self, addr: u8) -> Result<f64, SensorError> {
        let bus_err = |e: I::Error| SensorError::Bus {
            addr,
            reason: format!("{:?}", e.kind()),
        };

        self.bus.write(addr, &[EZO_READ_COMMAND]).map_err(bus_err)?;
        tokio::time::sleep(self.response_delay).await;

        let mut raw = [0u8; EZO_RESPONSE_LEN];
        self.bus.write_read(addr, &[0x00], &mut raw).map_err(bus_err)?;

        if raw[0] != EZO_STATUS_OK {
            return Err(SensorError::Status {
                addr,
                status: raw[0],
            });
        }

        let text: String = raw[1..]
            .iter()
            .filter(|b| **b != 0)
            .map(|b| *b as char)
            .collect();
        text.trim().parse::<f64>().map_err(|_| SensorError::Parse { addr, raw: text })
    }
}

/// Data source fixed at startup for the lifetime of the process.
pub enum SensorSource<I> {
    Hardware(EzoBus<I>),
    Simulated,
}

impl<I: I2c> SensorSource<I> {
    pub fn is_simulated(&self) -> bool {
        matches!(self, SensorSource::Simulated)
    }

    /// One value for `channel`.
    pub async fn read(&mut self, channel: Channel) -> Result<f64, SensorError> {
        match self {
            SensorSource::Hardware(bus) => bus.read(channel.address()).await,
            SensorSource::Simulated => Ok(simulated_value(channel)),
        }
    }
}

/// Uniform sample in the channel's plausible range, rounded to 2 decimals.
pub fn simulated_value(channel: Channel) -> f64 {
    let (lo, hi) = channel.simulated_range();
    let value = rand::thread_rng().gen_range(lo..=hi);
    (value * 100.0).round() / 100.0
}

/// Decides hardware vs. simulation once, from config and a bus open attempt.
pub fn probe_with<I, F, E>(config: &SensorConfig, open: F) -> SensorSource<I>
where
    I: I2c,
    F: FnOnce() -> Result<I, E>,
    E: std::fmt::Display,
{
    if config.simulate {
        info!("Running in SIMULATION mode (requested)");
        return SensorSource::Simulated;
    }

    match open() {
        Ok(bus) => {
            info!(bus = I2C_BUS, "I2C bus opened");
            SensorSource::Hardware(EzoBus::new(bus))
        }
        Err(e) => {
            warn!(bus = I2C_BUS, error = %e, "Cannot open I2C bus, falling back to simulated data");
            SensorSource::Simulated
        }
    }
}

#[cfg(target_os = "linux")]
pub type HardwareBus = linux_embedded_hal::I2cdev;

/// Opens `/dev/i2c-1` and probes.
#[cfg(target_os = "linux")]
pub fn probe(config: &SensorConfig) -> SensorSource<HardwareBus> {
    probe_with(config, || {
        linux_embedded_hal::I2cdev::new(format!("/dev/i2c-{}", I2C_BUS))
    })
}

/// Stand-in bus type where no I2C device layer exists.
#[cfg(not(target_os = "linux"))]
pub enum HardwareBus {}

#[cfg(not(target_os = "linux"))]
impl embedded_hal::i2c::ErrorType for HardwareBus {
    type Error = core::convert::Infallible;
}

#[cfg(not(target_os = "linux"))]
impl I2c for HardwareBus {
    fn transaction(
        &mut self,
        _address: u8,
        _operations: &mut [embedded_hal::i2c::Operation<'_>],
    ) -> Result<(), Self::Error> {
        match *self {}
    }
}

#[cfg(not(target_os = "linux"))]
pub fn probe(config: &SensorConfig) -> SensorSource<HardwareBus> {
    probe_with(config, || Err::<HardwareBus, _>("I2C is only available on Linux"))
}
