// * Frame Store - one JPEG per capture, named by capture time
// * Filename order is capture order (fixed-width YYYYMMDD_HHMMSS)

use crate::config::constants::{FRAME_EXTENSION, FRAME_TIME_FORMAT};
use crate::persistence::StorageError;
use chrono::NaiveDateTime;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::warn;

#[derive(Debug, Clone)]
pub struct FrameStore {
    dir: PathBuf,
}

impl FrameStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Filename for a frame captured at `time`.
    pub fn file_name(time: NaiveDateTime) -> String {
        format!("{}.{}", time.format(FRAME_TIME_FORMAT), FRAME_EXTENSION)
    }

    /// Writes a frame, replacing any frame from the same second.
    ///
    /// The bytes land in a temporary sibling first and are renamed into place,
    /// so readers never see a partial JPEG under the final name.
    pub fn save(&self, captured_at: NaiveDateTime, bytes: &[u8]) -> Result<PathBuf, StorageError> {
        fs::create_dir_all(&self.dir)?;

        let name = Self::file_name(captured_at);
        let path = self.dir.join(&name);
        if path.exists() {
            warn!(path = %path.display(), "Frame from the same second already stored, overwriting");
        }

        let staging = self.dir.join(format!("{}.tmp", name));
        let written = fs::write(&staging, bytes).and_then(|_| fs::rename(&staging, &path));
        if let Err(e) = written {
            // * Never matches `is_frame`, so the sweeper would not reclaim it
            if let Err(cleanup) = fs::remove_file(&staging) {
                if cleanup.kind() != ErrorKind::NotFound {
                    warn!(path = %staging.display(), error = %cleanup, "Cannot remove staging file");
                }
            }
            return Err(e.into());
        }
        Ok(path)
    }

    /// All stored frames, oldest first.
    pub fn list(&self) -> Result<Vec<PathBuf>, StorageError> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut frames: Vec<PathBuf> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| is_frame(path))
            .collect();
        frames.sort();
        Ok(frames)
    }

    /// The lexicographically greatest frame, if any.
    pub fn latest(&self) -> Result<Option<PathBuf>, StorageError> {
        Ok(self.list()?.pop())
    }

    /// Bytes of the latest frame. A frame swept between listing and reading counts as absent.
    pub fn read_latest(&self) -> Result<Option<Vec<u8>>, StorageError> {
        let Some(path) = self.latest()? else {
            return Ok(None);
        };
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn has_frames(&self) -> bool {
        matches!(self.latest(), Ok(Some(_)))
    }
}

/// True for regular `*.jpg` files.
pub fn is_frame(path: &Path) -> bool {
    path.is_file() && path.extension().and_then(|ext| ext.to_str()) == Some(FRAME_EXTENSION)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, 1)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    #[test]
    fn test_file_name_format() {
        assert_eq!(FrameStore::file_name(at(7, 5, 9)), "20250601_070509.jpg");
    }

    #[test]
    fn test_save_and_latest() {
        let dir = tempfile::tempdir().unwrap();
        let store = FrameStore::new(dir.path().join("camera"));
        assert_eq!(store.latest().unwrap(), None);
        assert!(!store.has_frames());

        store.save(at(10, 0, 0), b"first").unwrap();
        store.save(at(9, 59, 59), b"older").unwrap();
        let newest = store.save(at(10, 0, 1), b"second").unwrap();

        assert_eq!(store.latest().unwrap(), Some(newest));
        assert_eq!(store.read_latest().unwrap(), Some(b"second".to_vec()));
        assert_eq!(store.list().unwrap().len(), 3);
        assert!(store.has_frames());
    }

    #[test]
    fn test_same_second_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let store = FrameStore::new(dir.path());

        store.save(at(10, 0, 0), b"a").unwrap();
        store.save(at(10, 0, 0), b"b").unwrap();

        assert_eq!(store.list().unwrap().len(), 1);
        assert_eq!(store.read_latest().unwrap(), Some(b"b".to_vec()));
    }

    #[test]
    fn test_ignores_non_frames() {
        let dir = tempfile::tempdir().unwrap();
        let store = FrameStore::new(dir.path());
        fs::write(dir.path().join("zzz.txt"), b"x").unwrap();
        fs::write(dir.path().join("20990101_000000.jpg.tmp"), b"x").unwrap();
        fs::create_dir(dir.path().join("99999999_999999.jpg")).unwrap();

        assert_eq!(store.latest().unwrap(), None);
    }

    #[test]
    fn test_latest_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = FrameStore::new(dir.path());
        store.save(at(12, 0, 0), &[0xFF, 0xD8, 0xFF, 0xD9]).unwrap();

        let first = store.read_latest().unwrap();
        let second = store.read_latest().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_failed_save_leaves_no_staging_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = FrameStore::new(dir.path());
        // * A directory squatting on the frame name makes the rename fail
        let name = FrameStore::file_name(at(8, 0, 0));
        fs::create_dir(dir.path().join(&name)).unwrap();
        fs::write(dir.path().join(&name).join("keep"), b"x").unwrap();

        assert!(store.save(at(8, 0, 0), b"frame").is_err());

        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }
}
