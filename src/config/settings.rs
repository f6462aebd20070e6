// * Lab configuration loaded once from ~/lab-config.yaml
// * Every field has a default; sections merge shallowly over those defaults

use crate::config::constants::DEFAULT_SERVER;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_yaml::{Mapping, Value};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Config document is not a mapping of sections")]
    NotAMapping,
}

/// Inclusive numeric bounds, written as `[min, max]` in YAML.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(from = "[f64; 2]")]
pub struct Range {
    pub min: f64,
    pub max: f64,
}

impl Range {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

impl From<[f64; 2]> for Range {
    fn from([min, max]: [f64; 2]) -> Self {
        Self { min, max }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub device: String,
    #[serde(deserialize_with = "non_negative")]
    pub interval_seconds: f64,
    #[serde(deserialize_with = "non_negative")]
    pub keep_hours: f64,
    pub upload_to_server: bool,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            device: "/dev/video0".to_string(),
            interval_seconds: 30.0,
            keep_hours: 24.0,
            upload_to_server: false,
        }
    }
}

impl CameraConfig {
    pub fn interval(&self) -> Duration {
        seconds(self.interval_seconds)
    }

    pub fn max_age(&self) -> Duration {
        seconds(self.keep_hours * 3600.0)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SensorConfig {
    pub ph_enabled: bool,
    pub temp_enabled: bool,
    #[serde(deserialize_with = "non_negative")]
    pub read_interval_seconds: f64,
    pub ph_range: Range,
    pub temp_range: Range,
    pub simulate: bool,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            ph_enabled: true,
            temp_enabled: true,
            read_interval_seconds: 10.0,
            ph_range: Range::new(4.0, 10.0),
            temp_range: Range::new(15.0, 45.0),
            simulate: false,
        }
    }
}

impl SensorConfig {
    pub fn interval(&self) -> Duration {
        seconds(self.read_interval_seconds)
    }
}

// * Values are validated on parse; anything too large to represent saturates
fn seconds(secs: f64) -> Duration {
    Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
}

fn non_negative<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = f64::deserialize(deserializer)?;
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(serde::de::Error::custom(format!(
            "expected a non-negative number, got {}",
            value
        )))
    }
}

// * Notification targets; carried for the collector side, not used locally
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AlertTargets {
    pub telegram_chat_id: String,
    pub email: String,
}

/// Process-wide configuration, immutable after startup.
#[derive(Debug, Clone, PartialEq)]
pub struct LabConfig {
    pub camera: CameraConfig,
    pub sensors: SensorConfig,
    pub neverot_server: String,
    pub alerts: AlertTargets,
}

impl Default for LabConfig {
    fn default() -> Self {
        Self {
            camera: CameraConfig::default(),
            sensors: SensorConfig::default(),
            neverot_server: DEFAULT_SERVER.to_string(),
            alerts: AlertTargets::default(),
        }
    }
}

/// Reads one top-level section.
///
/// Absent or `~` means defaults. A section that does not parse is logged and
/// replaced by its defaults without touching the other sections.
fn section<T>(doc: &Mapping, key: &str) -> Option<T>
where
    T: DeserializeOwned,
{
    match doc.get(key) {
        None | Some(Value::Null) => None,
        Some(value) => match serde_yaml::from_value(value.clone()) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                warn!(section = key, error = %e, "Invalid config section, using its defaults");
                None
            }
        },
    }
}

impl LabConfig {
    /// Parses a YAML document; an empty document yields all defaults.
    ///
    /// Only a document that is not YAML (or not a mapping) is an error.
    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }

        let doc = match serde_yaml::from_str::<Value>(text)? {
            Value::Null => return Ok(Self::default()),
            Value::Mapping(doc) => doc,
            _ => return Err(ConfigError::NotAMapping),
        };

        Ok(Self {
            camera: section(&doc, "camera").unwrap_or_default(),
            sensors: section(&doc, "sensors").unwrap_or_default(),
            neverot_server: section(&doc, "neverot_server")
                .unwrap_or_else(|| DEFAULT_SERVER.to_string()),
            alerts: section(&doc, "alerts").unwrap_or_default(),
        })
    }

    /// Loads the config file. A missing file is not an error.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(text) => Self::from_yaml(&text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(path = %path.display(), "Config not found, using defaults");
                Ok(Self::default())
            }
            Err(source) => Err(ConfigError::Io {
                path: path.display().to_string(),
                source,
            }),
        }
    }

    /// Loads the config file, logging and falling back to defaults on any error.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_else(|e| {
            tracing::error!(error = %e, "Config unusable, using defaults");
            Self::default()
        })
    }
}
