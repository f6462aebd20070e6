// * Configuration: fixed constants, file-backed settings and on-disk layout

pub mod constants;
pub mod paths;
pub mod settings;

pub use paths::LabPaths;
pub use settings::{AlertTargets, CameraConfig, ConfigError, LabConfig, Range, SensorConfig};
