//! Canonical waveform data model.
//!
//! A [`Trace`] is one channel's worth of evenly sampled ground motion; a
//! [`WaveformSegment`] is the ordered collection of traces that the admission
//! gate produced for one catalog entry. Segments are immutable once admitted:
//! the fields are private and there is no mutating API, so a segment either
//! went through the full normalization chain or it does not exist.

use serde::{Deserialize, Serialize};

/// One continuous, evenly sampled channel of waveform data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trace {
    channel: String,
    sample_rate_hz: f64,
    start_epoch: f64,
    samples: Vec<f64>,
}

impl Trace {
    pub fn new(
        channel: impl Into<String>,
        sample_rate_hz: f64,
        start_epoch: f64,
        samples: Vec<f64>,
    ) -> Self {
        Self {
            channel: channel.into(),
            sample_rate_hz,
            start_epoch,
            samples,
        }
    }

    /// Channel code, e.g. `BHZ`.
    pub fn channel(&self) -> &str {
        &self.channel
    }

    pub fn sample_rate_hz(&self) -> f64 {
        self.sample_rate_hz
    }

    /// Start time as epoch seconds.
    pub fn start_epoch(&self) -> f64 {
        self.start_epoch
    }

    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    /// Trace duration in seconds: `sample_count / sample_rate`.
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate_hz <= 0.0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate_hz
    }

    /// Consumes the trace, returning its sample buffer.
    pub fn into_samples(self) -> Vec<f64> {
        self.samples
    }
}

/// An ordered collection of normalized traces. Immutable once admitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaveformSegment {
    traces: Vec<Trace>,
}

impl WaveformSegment {
    /// Assembles a segment from fully normalized traces. Only the admission
    /// gate should call this; everything downstream receives the segment
    /// read-only.
    pub(crate) fn new(traces: Vec<Trace>) -> Self {
        Self { traces }
    }

    pub fn traces(&self) -> &[Trace] {
        &self.traces
    }

    pub fn trace_count(&self) -> usize {
        self.traces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.traces.is_empty()
    }

    /// Earliest start time across all traces, if any.
    pub fn start_epoch(&self) -> Option<f64> {
        self.traces
            .iter()
            .map(Trace::start_epoch)
            .fold(None, |acc, t| match acc {
                None => Some(t),
                Some(a) => Some(a.min(t)),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_is_count_over_rate() {
        let trace = Trace::new("BHZ", 100.0, 0.0, vec![0.0; 3000]);
        assert!((trace.duration_secs() - 30.0).abs() < 1e-12);
    }

    #[test]
    fn zero_rate_trace_has_zero_duration() {
        let trace = Trace::new("BHZ", 0.0, 0.0, vec![0.0; 100]);
        assert_eq!(trace.duration_secs(), 0.0);
    }

    #[test]
    fn segment_start_is_earliest_trace_start() {
        let segment = WaveformSegment::new(vec![
            Trace::new("BHZ", 100.0, 20.0, vec![0.0; 10]),
            Trace::new("BHN", 100.0, 5.0, vec![0.0; 10]),
        ]);
        assert_eq!(segment.start_epoch(), Some(5.0));
    }
}
