// * Local persistence: frame artifacts, the reading log and the inbound alert log
// * Files are shared between processes without locks; readers tolerate stale or torn data

pub mod alert_log;
pub mod frames;
pub mod readings;

use thiserror::Error;

pub use alert_log::AlertLog;
pub use frames::FrameStore;
pub use readings::{Reading, ReadingLog};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}
