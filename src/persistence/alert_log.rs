// * Alert Log - append-only `<timestamp> | <message>` lines

use crate::config::constants::ISO_TIME_FORMAT;
use crate::persistence::StorageError;
use chrono::{Local, NaiveDateTime};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct AlertLog {
    path: PathBuf,
}

impl AlertLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, message: &str) -> Result<(), StorageError> {
        self.append_at(Local::now().naive_local(), message)
    }

    pub fn append_at(&self, time: NaiveDateTime, message: &str) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let line = format!("{} | {}\n", time.format(ISO_TIME_FORMAT), one_line(message));
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        // * Single write call per line keeps concurrent appends from interleaving mid-line
        file.write_all(line.as_bytes())?;
        Ok(())
    }
}

// * One alert per line: embedded line breaks are escaped
fn one_line(message: &str) -> String {
    message.replace('\r', "\\r").replace('\n', "\\n")
}
