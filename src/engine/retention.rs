// * Retention Sweeper - age-based deletion of stored frames
// * Decides purely on modification time; filename timestamps are never consulted

use crate::ops::telemetry;
use crate::persistence::frames::is_frame;
use crate::persistence::StorageError;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tracing::{debug, info, warn};

/// Outcome of one sweep.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SweepReport {
    pub removed: Vec<PathBuf>,
    pub kept: usize,
    pub failed: usize,
}

#[derive(Debug, Clone)]
pub struct RetentionSweeper {
    dir: PathBuf,
    max_age: Duration,
}

impl RetentionSweeper {
    pub fn new(dir: impl Into<PathBuf>, max_age: Duration) -> Self {
        Self {
            dir: dir.into(),
            max_age,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Sweeps against the current wall clock.
    pub fn sweep(&self) -> Result<SweepReport, StorageError> {
        self.sweep_at(SystemTime::now())
    }

    /// Deletes every frame whose mtime is strictly before `now - max_age`.
    ///
    /// A file that cannot be inspected or removed is logged and counted as
    /// failed; the sweep carries on with the rest.
    pub fn sweep_at(&self, now: SystemTime) -> Result<SweepReport, StorageError> {
        let cutoff = now.checked_sub(self.max_age).unwrap_or(SystemTime::UNIX_EPOCH);
        let mut report = SweepReport::default();

        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(report),
            Err(e) => return Err(e.into()),
        };

        for path in entries.filter_map(Result::ok).map(|e| e.path()) {
            if !is_frame(&path) {
                continue;
            }

            let modified = match fs::metadata(&path).and_then(|m| m.modified()) {
                Ok(modified) => modified,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Cannot read frame mtime");
                    report.failed += 1;
                    continue;
                }
            };

            if modified >= cutoff {
                report.kept += 1;
                continue;
            }

            match fs::remove_file(&path) {
                Ok(()) => {
                    info!(path = %path.display(), "Cleaned up old image");
                    report.removed.push(path);
                }
                // * Already gone is as good as removed
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Failed to remove old image");
                    report.failed += 1;
                }
            }
        }

        telemetry::record_frames_swept(report.removed.len() as u64);
        debug!(
            removed = report.removed.len(),
            kept = report.kept,
            failed = report.failed,
            "Retention sweep complete"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;

    const HOUR: Duration = Duration::from_secs(3600);

    fn frame_with_age(dir: &Path, name: &str, now: SystemTime, age: Duration) -> PathBuf {
        let path = dir.join(name);
        let file = File::create(&path).unwrap();
        file.set_modified(now - age).unwrap();
        path
    }

    #[test]
    fn test_sweep_respects_cutoff() {
        let dir = tempfile::tempdir().unwrap();
        let now = SystemTime::now();

        let old = frame_with_age(dir.path(), "20200101_000000.jpg", now, 25 * HOUR);
        let ancient = frame_with_age(dir.path(), "20190101_000000.jpg", now, 400 * HOUR);
        let fresh = frame_with_age(dir.path(), "20200102_000000.jpg", now, 23 * HOUR);
        let brand_new = frame_with_age(dir.path(), "20200103_000000.jpg", now, Duration::ZERO);

        let sweeper = RetentionSweeper::new(dir.path(), 24 * HOUR);
        let report = sweeper.sweep_at(now).unwrap();

        assert!(!old.exists());
        assert!(!ancient.exists());
        assert!(fresh.exists());
        assert!(brand_new.exists());
        assert_eq!(report.removed.len(), 2);
        assert_eq!(report.kept, 2);
        assert_eq!(report.failed, 0);
    }

    #[test]
    fn test_sweep_ignores_filename_time() {
        let dir = tempfile::tempdir().unwrap();
        let now = SystemTime::now();

        // * Name claims 1999, mtime says fresh
        let misnamed = frame_with_age(dir.path(), "19990101_000000.jpg", now, HOUR);
        RetentionSweeper::new(dir.path(), 2 * HOUR).sweep_at(now).unwrap();
        assert!(misnamed.exists());
    }

    #[test]
    fn test_sweep_only_touches_frames() {
        let dir = tempfile::tempdir().unwrap();
        let now = SystemTime::now();
        let notes = frame_with_age(dir.path(), "notes.txt", now, 100 * HOUR);

        let report = RetentionSweeper::new(dir.path(), HOUR).sweep_at(now).unwrap();
        assert!(notes.exists());
        assert!(report.removed.is_empty());
    }

    #[test]
    fn test_sweep_missing_dir_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let sweeper = RetentionSweeper::new(dir.path().join("nope"), HOUR);
        assert_eq!(sweeper.sweep().unwrap(), SweepReport::default());
    }

    #[test]
    fn test_zero_window_clears_everything_older_than_now() {
        let dir = tempfile::tempdir().unwrap();
        let now = SystemTime::now();
        frame_with_age(dir.path(), "a.jpg", now, Duration::from_secs(1));
        frame_with_age(dir.path(), "b.jpg", now, Duration::from_secs(60));

        let report = RetentionSweeper::new(dir.path(), Duration::ZERO)
            .sweep_at(now)
            .unwrap();
        assert_eq!(report.removed.len(), 2);
    }
}
