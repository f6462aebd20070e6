// * Poll engine: the loop driver, the two agents and the retention sweeper

pub mod camera_agent;
pub mod poller;
pub mod retention;
pub mod sensor_agent;

use crate::persistence::StorageError;
use crate::sources::{CaptureError, SensorError};
use thiserror::Error;

pub use camera_agent::CameraAgent;
pub use poller::{PollTask, Poller};
pub use retention::{RetentionSweeper, SweepReport};
pub use sensor_agent::SensorAgent;

// * Why a single iteration failed; the loop logs it and carries on
#[derive(Debug, Error)]
pub enum PollError {
    #[error("Capture failed: {0}")]
    Capture(#[from] CaptureError),

    #[error("Sensor unavailable: {0}")]
    Sensor(#[from] SensorError),

    #[error("Storage failed: {0}")]
    Storage(#[from] StorageError),

    #[error("Frame source lock poisoned")]
    SourcePoisoned,

    #[error("Capture task aborted: {0}")]
    Join(String),
}
