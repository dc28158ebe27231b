//! Admission gate for raw waveform bytes.
//!
//! [`AdmissionPipeline::admit`] turns the bytes read from a remote file into
//! a canonical [`WaveformSegment`], or rejects them with an
//! [`AdmissionError`]. The policy lives here; the binary format work (decode,
//! detrend, resample, gap-filling merge) is delegated to a [`WaveformCodec`]
//! implementation, which is an external collaborator of the core.
//!
//! The gate is atomic. Steps run in a fixed order and any failure discards
//! the whole attempt:
//!
//! 1. decode bytes into traces (`DecodeFailure`);
//! 2. reject zero traces (`EmptyStream`);
//! 3. reject any trace whose duration is below the configured floor,
//!    boundary inclusive — exactly at the floor passes (`TooShort`);
//! 4. per trace, remove mean and linear trend, then resample to the oracle's
//!    required rate; merge same-channel fragments into one continuous trace
//!    with linearly interpolated gaps (`NormalizationFailure` on any internal
//!    codec error).

use crate::error::AdmissionError;
use crate::waveform::{Trace, WaveformSegment};
use thiserror::Error;
use tracing::debug;

/// Default minimum trace duration accepted by the gate, in seconds.
pub const DEFAULT_MIN_TRACE_DURATION_SECS: f64 = 30.0;

/// Internal error reported by a codec step. The pipeline maps it onto the
/// appropriate [`AdmissionError`] subkind depending on which step failed.
#[derive(Error, Debug, Clone)]
#[error("{0}")]
pub struct CodecError(pub String);

impl CodecError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Binary waveform format operations, implemented outside the core.
pub trait WaveformCodec {
    /// Decodes raw bytes into traces. An empty vector is a valid decode of a
    /// stream that contains no traces; the pipeline turns it into
    /// [`AdmissionError::EmptyStream`].
    fn decode(&self, raw: &[u8]) -> Result<Vec<Trace>, CodecError>;

    /// Removes the mean and linear trend from a trace.
    fn detrend(&self, trace: Trace) -> Result<Trace, CodecError>;

    /// Resamples a trace to `target_hz`, preserving its time span.
    fn resample(&self, trace: Trace, target_hz: f64) -> Result<Trace, CodecError>;

    /// Merges same-channel fragments into one continuous trace per channel,
    /// filling gaps by linear interpolation.
    fn merge(&self, traces: Vec<Trace>) -> Result<Vec<Trace>, CodecError>;
}

/// Validates and normalizes raw waveform bytes into admitted segments.
pub struct AdmissionPipeline {
    codec: Box<dyn WaveformCodec>,
    min_duration_secs: f64,
    target_rate_hz: f64,
}

impl AdmissionPipeline {
    pub fn new(codec: Box<dyn WaveformCodec>, min_duration_secs: f64, target_rate_hz: f64) -> Self {
        Self {
            codec,
            min_duration_secs,
            target_rate_hz,
        }
    }

    /// Sample rate every admitted trace is normalized to, in Hz.
    pub fn target_rate_hz(&self) -> f64 {
        self.target_rate_hz
    }

    /// Runs the admission policy. Returns a fully normalized segment or the
    /// reason the bytes were rejected; no partial segment ever escapes.
    pub fn admit(&self, raw: &[u8]) -> Result<WaveformSegment, AdmissionError> {
        let traces = self
            .codec
            .decode(raw)
            .map_err(|e| AdmissionError::DecodeFailure(e.to_string()))?;

        if traces.is_empty() {
            return Err(AdmissionError::EmptyStream);
        }

        for trace in &traces {
            let duration = trace.duration_secs();
            if duration < self.min_duration_secs {
                return Err(AdmissionError::TooShort {
                    channel: trace.channel().to_string(),
                    duration,
                    floor: self.min_duration_secs,
                });
            }
        }

        let mut normalized = Vec::with_capacity(traces.len());
        for trace in traces {
            let trace = self
                .codec
                .detrend(trace)
                .map_err(|e| AdmissionError::NormalizationFailure(e.to_string()))?;
            let trace = self
                .codec
                .resample(trace, self.target_rate_hz)
                .map_err(|e| AdmissionError::NormalizationFailure(e.to_string()))?;
            normalized.push(trace);
        }

        let merged = self
            .codec
            .merge(normalized)
            .map_err(|e| AdmissionError::NormalizationFailure(e.to_string()))?;

        debug!(
            traces = merged.len(),
            rate_hz = self.target_rate_hz,
            "segment admitted"
        );
        Ok(WaveformSegment::new(merged))
    }
}
