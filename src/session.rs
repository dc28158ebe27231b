//! Annotation session controller.
//!
//! [`AnnotationSession`] is the single sequential driver of the pipeline: it
//! owns the store, the admission gate, the oracle, the arbitrator, and the
//! ledger, and walks the catalog one entry at a time. No global connector
//! state exists anywhere — whoever builds the session hands it an explicitly
//! owned store.
//!
//! ## States
//!
//! - **Idle** — the catalog is empty (or nothing was loaded yet); saves and
//!   advances are no-ops.
//! - **Loaded** — the cursor points at an entry. The entry may have a
//!   normalized segment, or none at all when the fetch or admission failed;
//!   a segmentless entry still accepts a manual pick. A `finished` flag is
//!   set once the cursor has been advanced past the last entry.
//!
//! ## Save discipline
//!
//! `advance` saves the current entry unconditionally before moving, in either
//! direction, and `save` can also be called on its own. Every save appends a
//! fresh ledger line — revisiting an entry appends again rather than
//! overwriting, by design.

use crate::admission::AdmissionPipeline;
use crate::arbiter::{ArbitrationResult, PickArbitrator};
use crate::error::PickResult;
use crate::ledger::{AnnotationRecord, Ledger};
use crate::oracle::DetectionOracle;
use crate::remote::{CatalogEntry, RemoteStore};
use crate::waveform::WaveformSegment;
use tracing::{info, warn};

/// Cursor movement direction for [`AnnotationSession::advance`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Forward,
    Back,
}

/// Per-entry working state while the cursor rests on it.
#[derive(Debug)]
pub struct LoadedEntry {
    /// The admitted segment, absent when the fetch or admission failed.
    pub segment: Option<WaveformSegment>,
    /// Arbitrated automated pick for this entry.
    pub automated: ArbitrationResult,
    /// Manual override, epoch seconds.
    pub manual: Option<f64>,
}

/// Sequences catalog entries and persists one record per save action.
pub struct AnnotationSession {
    store: Box<dyn RemoteStore>,
    admission: AdmissionPipeline,
    oracle: Box<dyn DetectionOracle>,
    arbitrator: PickArbitrator,
    ledger: Ledger,
    entries: Vec<CatalogEntry>,
    cursor: usize,
    finished: bool,
    current: Option<LoadedEntry>,
}

impl AnnotationSession {
    /// Builds a session over an enumerated catalog and makes sure the ledger
    /// file exists with its header. The session starts Idle; call
    /// [`load`](Self::load) to put the cursor on an entry.
    pub fn new(
        store: Box<dyn RemoteStore>,
        admission: AdmissionPipeline,
        oracle: Box<dyn DetectionOracle>,
        arbitrator: PickArbitrator,
        ledger: Ledger,
        entries: Vec<CatalogEntry>,
    ) -> PickResult<Self> {
        ledger.ensure_header()?;
        Ok(Self {
            store,
            admission,
            oracle,
            arbitrator,
            ledger,
            entries,
            cursor: 0,
            finished: false,
            current: None,
        })
    }

    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Index of the entry the cursor rests on.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// True once the cursor has been advanced past the last entry.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// The catalog entry under the cursor, if anything is loaded.
    pub fn entry(&self) -> Option<&CatalogEntry> {
        self.current.as_ref().map(|_| &self.entries[self.cursor])
    }

    /// Working state of the loaded entry.
    pub fn current(&self) -> Option<&LoadedEntry> {
        self.current.as_ref()
    }

    /// Loads the entry at `index` (clamped into bounds): fetch the bytes,
    /// run admission, ask the oracle, arbitrate against the entry's
    /// reference. A fetch or admission failure leaves the entry loaded with
    /// no segment so a manual pick is still possible; an oracle failure
    /// degrades to zero candidates. With an empty catalog this is a no-op
    /// and the session stays Idle.
    pub fn load(&mut self, index: usize) {
        if self.entries.is_empty() {
            info!("catalog is empty, nothing to load");
            return;
        }
        self.cursor = index.min(self.entries.len() - 1);
        let entry = &self.entries[self.cursor];
        info!(
            position = self.cursor + 1,
            total = self.entries.len(),
            station = %entry.station,
            path = %entry.path,
            "loading entry"
        );

        let segment = match self.store.read_all(&entry.path) {
            Ok(raw) => match self.admission.admit(&raw) {
                Ok(segment) => Some(segment),
                Err(err) => {
                    warn!(path = %entry.path, error = %err, "admission rejected entry");
                    None
                }
            },
            Err(err) => {
                warn!(path = %entry.path, error = %err, "fetch failed");
                None
            }
        };

        let candidates = match &segment {
            Some(segment) => match self.oracle.detect(segment) {
                Ok(candidates) => candidates,
                Err(err) => {
                    warn!(error = %err, "oracle failed, treating as zero candidates");
                    Vec::new()
                }
            },
            None => Vec::new(),
        };

        let automated = self.arbitrator.arbitrate(&candidates, entry.reference);
        info!(
            reason = %automated.reason,
            time = ?automated.time,
            confidence = ?automated.confidence,
            "arbitration complete"
        );

        self.current = Some(LoadedEntry {
            segment,
            automated,
            manual: None,
        });
    }

    /// Sets the manual override on the in-memory record. No I/O happens
    /// until the next save.
    pub fn set_manual_pick(&mut self, epoch: f64) {
        if let Some(current) = self.current.as_mut() {
            current.manual = Some(epoch);
        }
    }

    /// Clears the manual override on the in-memory record.
    pub fn clear_manual_pick(&mut self) {
        if let Some(current) = self.current.as_mut() {
            current.manual = None;
        }
    }

    /// Appends one record for the current entry. Every call appends,
    /// regardless of whether anything changed since a previous save of the
    /// same entry. Idle sessions save nothing. A ledger failure is returned
    /// to the caller — it means an annotation decision may not have been
    /// persisted.
    pub fn save(&self) -> PickResult<()> {
        let Some(current) = &self.current else {
            return Ok(());
        };
        let entry = &self.entries[self.cursor];
        let automated = current.automated.time;
        let record = AnnotationRecord {
            station: entry.station.clone(),
            reference_raw: entry.reference_raw.clone(),
            manual: current.manual,
            automated,
            confidence: current.automated.confidence,
            valid: current.manual.is_some() || automated.is_some(),
        };
        self.ledger.append(&record)?;
        info!(station = %record.station, valid = record.valid, "record saved");
        Ok(())
    }

    /// Saves the current entry unconditionally, then moves the cursor one
    /// step, clamped to bounds. Stepping forward past the last entry sets
    /// the `finished` flag without moving further; stepping back from the
    /// first entry stays put (the save still happened).
    pub fn advance(&mut self, step: Step) -> PickResult<()> {
        if self.current.is_none() {
            return Ok(());
        }
        self.save()?;
        match step {
            Step::Forward => {
                if self.cursor + 1 < self.entries.len() {
                    let next = self.cursor + 1;
                    self.load(next);
                } else {
                    self.finished = true;
                    info!("reached last entry");
                }
            }
            Step::Back => {
                if self.cursor > 0 {
                    let prev = self.cursor - 1;
                    self.load(prev);
                }
            }
        }
        Ok(())
    }
}
