// * Alerting - out-of-range checks on sensor readings
// * Produces alert records; delivery to the collector lives in network::client

use crate::config::{Range, SensorConfig};
use crate::persistence::Reading;
use std::collections::HashMap;

/// Alert types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlertType {
    /// pH outside the configured range
    PhOutOfRange,
    /// Temperature outside the configured range
    TemperatureOutOfRange,
}

impl std::fmt::Display for AlertType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlertType::PhOutOfRange => write!(f, "PH_OUT_OF_RANGE"),
            AlertType::TemperatureOutOfRange => write!(f, "TEMPERATURE_OUT_OF_RANGE"),
        }
    }
}

/// An alert event
#[derive(Debug, Clone, PartialEq)]
pub struct Alert {
    pub alert_type: AlertType,
    pub message: String,
    pub context: HashMap<String, String>,
}

impl Alert {
    /// Creates a new alert
    pub fn new(alert_type: AlertType, message: impl Into<String>) -> Self {
        Self {
            alert_type,
            message: message.into(),
            context: HashMap::new(),
        }
    }

    /// Adds context to the alert
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Logs the alert using tracing
    pub fn log(&self) {
        let context_str = self
            .context
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join(", ");

        tracing::warn!(
            alert_type = %self.alert_type,
            context = context_str,
            "ALERT: {}", self.message
        );
    }

    fn out_of_range(alert_type: AlertType, value: f64, range: Range) -> Self {
        let message = match alert_type {
            AlertType::PhOutOfRange => format!(
                "pH OUT OF RANGE: {:?} (expected {:?}-{:?})",
                value, range.min, range.max
            ),
            AlertType::TemperatureOutOfRange => format!(
                "Temperature OUT OF RANGE: {:?}°C (expected {:?}-{:?}°C)",
                value, range.min, range.max
            ),
        };

        Self::new(alert_type, message)
            .with_context("value", format!("{:?}", value))
            .with_context("min", format!("{:?}", range.min))
            .with_context("max", format!("{:?}", range.max))
    }
}

/// Checks a reading against the configured ranges.
///
/// Absent values never alert; bounds are inclusive.
pub fn check_thresholds(reading: &Reading, config: &SensorConfig) -> Vec<Alert> {
    let checks = [
        (reading.ph, config.ph_range, AlertType::PhOutOfRange),
        (reading.temp_c, config.temp_range, AlertType::TemperatureOutOfRange),
    ];

    checks
        .into_iter()
        .filter_map(|(value, range, alert_type)| {
            let value = value?;
            (!range.contains(value)).then(|| Alert::out_of_range(alert_type, value, range))
        })
        .inspect(Alert::log)
        .collect()
}
