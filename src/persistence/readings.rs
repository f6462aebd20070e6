// * Reading Log - append-only CSV of sensor samples
// * Written by the sensor poller, read by the bridge with no locking

use crate::config::constants::{CSV_HEADER, ISO_TIME_FORMAT};
use crate::persistence::StorageError;
use chrono::{Local, NaiveDateTime, TimeDelta};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// One timestamped sensor sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub timestamp: String,
    pub ph: Option<f64>,
    pub temp_c: Option<f64>,
}

impl Reading {
    /// Stamps a sample with the current local time.
    pub fn now(ph: Option<f64>, temp_c: Option<f64>) -> Self {
        Self::at(Local::now().naive_local(), ph, temp_c)
    }

    pub fn at(time: NaiveDateTime, ph: Option<f64>, temp_c: Option<f64>) -> Self {
        Self {
            timestamp: time.format(ISO_TIME_FORMAT).to_string(),
            ph,
            temp_c,
        }
    }

    pub fn parsed_timestamp(&self) -> Option<NaiveDateTime> {
        parse_timestamp(&self.timestamp)
    }
}

// * Accepts ISO-8601 with or without fractional seconds
fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    raw.trim().parse::<NaiveDateTime>().ok()
}

/// Handle on the readings CSV file.
#[derive(Debug, Clone)]
pub struct ReadingLog {
    path: PathBuf,
}

impl ReadingLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one row, writing the header first if the file is new.
    pub fn append(&self, reading: &Reading) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let write_header = !self.path.exists();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        if write_header {
            writer.write_record(CSV_HEADER)?;
        }
        writer.serialize(reading)?;
        writer.flush()?;
        Ok(())
    }

    /// Returns the most recent well-formed row, or `None` if the log is absent or empty.
    pub fn latest(&self) -> Result<Option<Reading>, StorageError> {
        let Some(mut reader) = self.open_reader()? else {
            return Ok(None);
        };

        // * A torn trailing row is skipped in favour of the last complete one
        let latest = reader
            .deserialize::<Reading>()
            .filter_map(Result::ok)
            .filter(|r| r.parsed_timestamp().is_some())
            .last();
        Ok(latest)
    }

    /// Renders rows stamped at or after `cutoff` as CSV text with the fixed header.
    ///
    /// Field text is passed through as stored. Rows whose timestamp does not
    /// parse are dropped.
    pub fn history_since(&self, cutoff: NaiveDateTime) -> Result<String, StorageError> {
        let mut out = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(Vec::new());
        out.write_record(CSV_HEADER)?;

        if let Some(mut reader) = self.open_reader()? {
            for record in reader.records().filter_map(Result::ok) {
                let stamp = record.get(0).and_then(parse_timestamp);
                if matches!(stamp, Some(ts) if ts >= cutoff) {
                    out.write_record([
                        record.get(0).unwrap_or(""),
                        record.get(1).unwrap_or(""),
                        record.get(2).unwrap_or(""),
                    ])?;
                }
            }
        }

        let bytes = out
            .into_inner()
            .map_err(|e| StorageError::Io(e.into_error()))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Same as [`history_since`](Self::history_since) with a lookback from local now.
    ///
    /// A lookback reaching past the representable calendar has no lower bound.
    pub fn history_hours(&self, hours: i64) -> Result<String, StorageError> {
        let now = Local::now().naive_local();
        let cutoff = TimeDelta::try_hours(hours)
            .and_then(|lookback| now.checked_sub_signed(lookback))
            .unwrap_or(NaiveDateTime::MIN);
        self.history_since(cutoff)
    }

    fn open_reader(&self) -> Result<Option<csv::Reader<fs::File>>, StorageError> {
        match fs::File::open(&self.path) {
            Ok(file) => Ok(Some(
                csv::ReaderBuilder::new()
                    .has_headers(true)
                    .flexible(true)
                    .from_reader(file),
            )),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
