// * Sensor Agent - read enabled channels, append to the CSV, check ranges, forward alerts

use crate::config::constants::SENSOR_ALERT_SOURCE;
use crate::config::SensorConfig;
use crate::engine::poller::PollTask;
use crate::engine::PollError;
use crate::network::CollectorClient;
use crate::ops::{alerting, telemetry};
use crate::persistence::{Reading, ReadingLog};
use crate::sources::{Channel, SensorError, SensorSource};
use chrono::Local;
use embedded_hal::i2c::I2c;
use tracing::{info, warn};

pub struct SensorAgent<I> {
    source: SensorSource<I>,
    config: SensorConfig,
    log: ReadingLog,
    collector: Option<CollectorClient>,
}

impl<I: I2c> SensorAgent<I> {
    pub fn new(
        source: SensorSource<I>,
        config: SensorConfig,
        log: ReadingLog,
        collector: Option<CollectorClient>,
    ) -> Self {
        Self {
            source,
            config,
            log,
            collector,
        }
    }

    pub fn log(&self) -> &ReadingLog {
        &self.log
    }

    pub fn is_simulated(&self) -> bool {
        self.source.is_simulated()
    }

    async fn read_channel(&mut self, channel: Channel, enabled: bool) -> Option<Result<f64, SensorError>> {
        if !enabled {
            return None;
        }
        let result = self.source.read(channel).await;
        if let Err(e) = &result {
            warn!(channel = ?channel, error = %e, "Sensor read failed");
        }
        Some(result)
    }

    /// Reads every enabled channel.
    ///
    /// A channel that fails is recorded as absent. The acquisition as a whole
    /// fails only when channels were enabled and none of them produced a value.
    pub async fn acquire(&mut self) -> Result<Reading, PollError> {
        let stamped = Local::now().naive_local();
        let ph = self.read_channel(Channel::Ph, self.config.ph_enabled).await;
        let temp = self
            .read_channel(Channel::Temperature, self.config.temp_enabled)
            .await;

        match (ph, temp) {
            (Some(Err(e)), None | Some(Err(_))) | (None, Some(Err(e))) => Err(PollError::Sensor(e)),
            (ph, temp) => Ok(Reading::at(
                stamped,
                ph.and_then(Result::ok),
                temp.and_then(Result::ok),
            )),
        }
    }
}

impl<I: I2c> PollTask for SensorAgent<I> {
    const NAME: &'static str = "sensors";
    type Error = PollError;

    async fn poll_once(&mut self) -> Result<(), PollError> {
        let reading = self.acquire().await?;
        info!(ph = ?reading.ph, temp_c = ?reading.temp_c, "Sensor reading");

        let stored = self.log.append(&reading);

        let alerts = alerting::check_thresholds(&reading, &self.config);
        if !alerts.is_empty() {
            let delivered = match &self.collector {
                Some(client) => {
                    client
                        .post_alerts_best_effort(SENSOR_ALERT_SOURCE, &alerts)
                        .await
                }
                None => false,
            };
            telemetry::record_alerts(alerts.len(), delivered);
        }

        stored.map_err(PollError::from)
    }
}
