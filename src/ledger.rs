//! Append-only annotation ledger.
//!
//! The ledger is a UTF-8 CSV file: one header line, then exactly one data
//! line per save action. Revisiting an entry appends again — nothing is ever
//! rewritten or deleted here, which keeps the file a faithful journal of
//! every decision the operator confirmed.
//!
//! [`Ledger::append`] opens for append, writes one line, flushes, and closes
//! before returning, so a record is durable and readable by the time the call
//! comes back. A crash strictly before the append loses nothing already
//! written; a crash while a line is going out can leave one partial final
//! line, which downstream consumers are expected to tolerate.

use crate::error::{PickError, PickResult};
use chrono::DateTime;
use serde::Serialize;
use std::fs::OpenOptions;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Column order of the ledger file.
pub const LEDGER_HEADER: [&str; 6] = [
    "station",
    "reference_epoch",
    "manual_pick",
    "auto_pick",
    "confidence",
    "valid",
];

/// One annotation outcome, as persisted per save action.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnotationRecord {
    pub station: String,
    /// The raw reference token from the filename; empty when the name
    /// carried none.
    pub reference_raw: String,
    /// Manual override pick, epoch seconds.
    pub manual: Option<f64>,
    /// Automated pick chosen by arbitration, epoch seconds.
    pub automated: Option<f64>,
    /// Confidence of the automated pick, when known.
    pub confidence: Option<f64>,
    /// True iff a manual or automated timestamp is present.
    pub valid: bool,
}

impl AnnotationRecord {
    fn fields(&self) -> [String; 6] {
        [
            self.station.clone(),
            self.reference_raw.clone(),
            self.manual.map(format_epoch).unwrap_or_default(),
            self.automated.map(format_epoch).unwrap_or_default(),
            self.confidence
                .map(|c| format!("{c:.4}"))
                .unwrap_or_default(),
            if self.valid { "true" } else { "false" }.to_string(),
        ]
    }
}

/// Formats an epoch in the ledger's fixed UTC timestamp format,
/// `%Y-%m-%dT%H:%M:%S%.6fZ`. Epochs chrono cannot represent come back empty
/// rather than corrupting the line shape.
pub fn format_epoch(epoch: f64) -> String {
    let mut secs = epoch.floor() as i64;
    let mut nanos = ((epoch - secs as f64) * 1e9).round() as u32;
    if nanos >= 1_000_000_000 {
        secs += 1;
        nanos -= 1_000_000_000;
    }
    match DateTime::from_timestamp(secs, nanos) {
        Some(dt) => dt.format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string(),
        None => String::new(),
    }
}

/// Durable, append-only store of annotation records.
#[derive(Debug, Clone)]
pub struct Ledger {
    path: PathBuf,
}

impl Ledger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Creates the ledger file with its header line only if it does not
    /// already exist. Idempotent across process restarts; never truncates or
    /// overwrites existing content.
    pub fn ensure_header(&self) -> PickResult<()> {
        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&self.path)
        {
            Ok(file) => {
                let mut writer = csv::Writer::from_writer(file);
                writer
                    .write_record(LEDGER_HEADER)
                    .and_then(|()| writer.flush().map_err(csv::Error::from))
                    .map_err(|e| PickError::Ledger(format!("header write: {e}")))?;
                info!(path = %self.path.display(), "ledger created");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                debug!(path = %self.path.display(), "ledger already present");
                Ok(())
            }
            Err(e) => Err(PickError::Ledger(format!(
                "create {}: {e}",
                self.path.display()
            ))),
        }
    }

    /// Serializes one record to one line and makes it durable before
    /// returning.
    pub fn append(&self, record: &AnnotationRecord) -> PickResult<()> {
        let file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)
            .map_err(|e| PickError::Ledger(format!("open {}: {e}", self.path.display())))?;
        let mut writer = csv::Writer::from_writer(file);
        writer
            .write_record(record.fields())
            .and_then(|()| writer.flush().map_err(csv::Error::from))
            .map_err(|e| PickError::Ledger(format!("append: {e}")))?;
        debug!(station = %record.station, valid = record.valid, "record appended");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn epoch_formats_with_fixed_microsecond_width() {
        assert_eq!(format_epoch(1696204160.0), "2023-10-01T23:49:20.000000Z");
        assert_eq!(format_epoch(1696204158.5), "2023-10-01T23:49:18.500000Z");
    }

    #[test]
    fn fractional_rounding_never_produces_invalid_nanos() {
        // A fraction that rounds up to a full second.
        let formatted = format_epoch(9.9999999999);
        assert_eq!(formatted, "1970-01-01T00:00:10.000000Z");
    }

    #[test]
    fn record_fields_follow_the_column_contract() {
        let record = AnnotationRecord {
            station: "STA1".into(),
            reference_raw: "1696204158.5".into(),
            manual: None,
            automated: Some(1696204160.0),
            confidence: Some(0.81),
            valid: true,
        };
        assert_eq!(
            record.fields(),
            [
                "STA1".to_string(),
                "1696204158.5".to_string(),
                String::new(),
                "2023-10-01T23:49:20.000000Z".to_string(),
                "0.8100".to_string(),
                "true".to_string(),
            ]
        );
    }
}
