//! Detection oracle contract.
//!
//! The phase detector is an external collaborator: this module defines only
//! the boundary it is used through. An oracle receives one normalized
//! [`WaveformSegment`] (read-only, never mutated) and returns zero or more
//! [`Candidate`] picks for the phase of interest. It also dictates the sample
//! rate the admission gate must normalize traces to before inference.
//!
//! Oracle failures surface as [`PickError::Oracle`]; callers treat them as
//! "zero candidates" so the entry remains manually annotatable.

use crate::error::PickResult;
use crate::validation::is_in_range;
use crate::waveform::WaveformSegment;
use serde::{Deserialize, Serialize};

/// One timestamped pick proposed by the detection oracle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// Pick time as epoch seconds.
    pub time: f64,
    /// Detector confidence in `[0, 1]`, if the oracle reports one.
    pub confidence: Option<f64>,
}

impl Candidate {
    /// A candidate with unknown confidence.
    pub fn new(time: f64) -> Self {
        Self {
            time,
            confidence: None,
        }
    }

    /// A candidate with a reported confidence. Non-finite or out-of-range
    /// values are recorded as unknown, the same way a NaN probability column
    /// is treated upstream.
    pub fn with_confidence(time: f64, confidence: f64) -> Self {
        let confidence = (confidence.is_finite()
            && is_in_range(confidence, 0.0..=1.0).is_ok())
        .then_some(confidence);
        Self { time, confidence }
    }
}

/// The external phase detector, treated as an opaque pick source.
pub trait DetectionOracle {
    /// Sample rate the model expects its input normalized to, in Hz.
    fn sample_rate_hz(&self) -> f64;

    /// Runs inference on a normalized segment and returns every candidate
    /// pick for the phase of interest, in emission order. The emission order
    /// is load-bearing: arbitration uses it as the deterministic tie-break.
    fn detect(&self, segment: &WaveformSegment) -> PickResult<Vec<Candidate>>;
}
