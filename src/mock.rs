//! Mock implementations for running without a remote host or a trained
//! model.
//!
//! Three mocks cover the three external seams:
//!
//! - `MockRemoteStore` — an in-memory directory tree with per-path fault
//!   injection, standing in for the SSH/SFTP channel.
//! - `MockCodec` — decodes a plain-text trace descriptor into synthetic
//!   waveforms and implements honest (if simplistic) detrend, resample, and
//!   gap-filling merge steps.
//! - `MockOracle` — returns a configured candidate list, or fails on demand.
//!
//! The descriptor format consumed by `MockCodec` is one trace per line:
//!
//! ```text
//! channel sample_rate_hz start_epoch duration_secs
//! ```

use crate::admission::{CodecError, WaveformCodec};
use crate::error::{PickError, PickResult};
use crate::oracle::{Candidate, DetectionOracle};
use crate::remote::RemoteStore;
use crate::waveform::{Trace, WaveformSegment};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::{BTreeMap, BTreeSet};

// =============================================================================
// MockRemoteStore - In-Memory File Tree
// =============================================================================

/// In-memory store. Registering a file creates every directory above it, so
/// tests only state the leaves they care about.
#[derive(Debug, Default)]
pub struct MockRemoteStore {
    dirs: BTreeMap<String, Vec<String>>,
    files: BTreeMap<String, Vec<u8>>,
    failing_listings: BTreeSet<String>,
    failing_reads: BTreeSet<String>,
}

impl MockRemoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_dir(&mut self, path: &str) {
        self.dirs.entry(path.to_string()).or_default();
        if let Some((parent, name)) = path.rsplit_once('/') {
            if !parent.is_empty() {
                self.insert_child(parent, name);
                self.add_dir(parent);
            }
        }
    }

    pub fn add_file(&mut self, path: &str, contents: impl Into<Vec<u8>>) {
        if let Some((parent, name)) = path.rsplit_once('/') {
            self.add_dir(parent);
            self.insert_child(parent, name);
        }
        self.files.insert(path.to_string(), contents.into());
    }

    /// Makes every listing of `path` fail with an access error.
    pub fn fail_listing(&mut self, path: &str) {
        self.failing_listings.insert(path.to_string());
    }

    /// Makes every read of `path` fail mid-transfer.
    pub fn fail_read(&mut self, path: &str) {
        self.failing_reads.insert(path.to_string());
    }

    fn insert_child(&mut self, parent: &str, name: &str) {
        let children = self.dirs.entry(parent.to_string()).or_default();
        if !children.iter().any(|c| c == name) {
            children.push(name.to_string());
        }
    }
}

impl RemoteStore for MockRemoteStore {
    fn list(&self, path: &str) -> PickResult<Vec<String>> {
        if self.failing_listings.contains(path) {
            return Err(PickError::Access(format!("{path}: simulated failure")));
        }
        let mut names = self
            .dirs
            .get(path)
            .ok_or_else(|| PickError::Access(format!("{path}: no such directory")))?
            .clone();
        names.sort();
        Ok(names)
    }

    fn read_all(&self, path: &str) -> PickResult<Vec<u8>> {
        if self.failing_reads.contains(path) {
            return Err(PickError::Read(format!("{path}: simulated transfer loss")));
        }
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| PickError::Access(format!("{path}: no such file")))
    }
}

// =============================================================================
// MockCodec - Synthetic Waveform Decoder
// =============================================================================

/// Decodes the plain-text descriptor format into synthetic sine traces with
/// seeded noise, and normalizes them with real (if naive) arithmetic.
#[derive(Debug, Clone)]
pub struct MockCodec {
    seed: u64,
    fail_decode: bool,
    fail_normalize: bool,
}

impl MockCodec {
    pub fn new() -> Self {
        Self {
            seed: 7,
            fail_decode: false,
            fail_normalize: false,
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self { seed, ..Self::new() }
    }

    /// A codec whose decode step always fails.
    pub fn failing_decode() -> Self {
        Self {
            fail_decode: true,
            ..Self::new()
        }
    }

    /// A codec whose normalization steps always fail.
    pub fn failing_normalization() -> Self {
        Self {
            fail_normalize: true,
            ..Self::new()
        }
    }

    fn synthesize(&self, rate_hz: f64, duration_secs: f64) -> Vec<f64> {
        let count = (rate_hz * duration_secs).round() as usize;
        let mut rng = StdRng::seed_from_u64(self.seed);
        (0..count)
            .map(|i| {
                let t = i as f64 / rate_hz;
                (2.0 * std::f64::consts::PI * 1.5 * t).sin() + rng.gen_range(-0.05..0.05)
            })
            .collect()
    }
}

impl Default for MockCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl WaveformCodec for MockCodec {
    fn decode(&self, raw: &[u8]) -> Result<Vec<Trace>, CodecError> {
        if self.fail_decode {
            return Err(CodecError::new("forced decode failure"));
        }
        let text = std::str::from_utf8(raw)
            .map_err(|e| CodecError::new(format!("descriptor is not UTF-8: {e}")))?;
        let mut traces = Vec::new();
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() != 4 {
                return Err(CodecError::new(format!("bad descriptor line: {line}")));
            }
            let rate_hz: f64 = parts[1]
                .parse()
                .map_err(|_| CodecError::new(format!("bad sample rate: {}", parts[1])))?;
            let start_epoch: f64 = parts[2]
                .parse()
                .map_err(|_| CodecError::new(format!("bad start epoch: {}", parts[2])))?;
            let duration_secs: f64 = parts[3]
                .parse()
                .map_err(|_| CodecError::new(format!("bad duration: {}", parts[3])))?;
            if rate_hz <= 0.0 {
                return Err(CodecError::new(format!("bad sample rate: {rate_hz}")));
            }
            let samples = self.synthesize(rate_hz, duration_secs);
            traces.push(Trace::new(parts[0], rate_hz, start_epoch, samples));
        }
        Ok(traces)
    }

    fn detrend(&self, trace: Trace) -> Result<Trace, CodecError> {
        if self.fail_normalize {
            return Err(CodecError::new("forced normalization failure"));
        }
        let channel = trace.channel().to_string();
        let rate = trace.sample_rate_hz();
        let start = trace.start_epoch();
        let samples = trace.into_samples();
        let n = samples.len();
        if n < 2 {
            return Ok(Trace::new(channel, rate, start, samples));
        }

        // Least-squares line over sample index; subtracting it removes both
        // mean and linear trend.
        let nf = n as f64;
        let sx = (nf - 1.0) * nf / 2.0;
        let sxx = (nf - 1.0) * nf * (2.0 * nf - 1.0) / 6.0;
        let sy: f64 = samples.iter().sum();
        let sxy: f64 = samples.iter().enumerate().map(|(i, y)| i as f64 * y).sum();
        let denom = nf * sxx - sx * sx;
        let slope = if denom.abs() < f64::EPSILON {
            0.0
        } else {
            (nf * sxy - sx * sy) / denom
        };
        let intercept = (sy - slope * sx) / nf;

        let detrended = samples
            .iter()
            .enumerate()
            .map(|(i, y)| y - (intercept + slope * i as f64))
            .collect();
        Ok(Trace::new(channel, rate, start, detrended))
    }

    fn resample(&self, trace: Trace, target_hz: f64) -> Result<Trace, CodecError> {
        if self.fail_normalize {
            return Err(CodecError::new("forced normalization failure"));
        }
        if target_hz <= 0.0 {
            return Err(CodecError::new(format!("bad target rate: {target_hz}")));
        }
        let rate = trace.sample_rate_hz();
        if (rate - target_hz).abs() < 1e-9 {
            return Ok(trace);
        }
        let channel = trace.channel().to_string();
        let start = trace.start_epoch();
        let duration = trace.duration_secs();
        let samples = trace.into_samples();
        if samples.is_empty() {
            return Ok(Trace::new(channel, target_hz, start, samples));
        }
        let count = (duration * target_hz).round() as usize;
        let last = samples.len() - 1;
        let resampled = (0..count)
            .map(|i| {
                let position = i as f64 / target_hz * rate;
                let lower = (position.floor() as usize).min(last);
                let upper = (lower + 1).min(last);
                let frac = position - lower as f64;
                samples[lower] * (1.0 - frac) + samples[upper] * frac
            })
            .collect();
        Ok(Trace::new(channel, target_hz, start, resampled))
    }

    fn merge(&self, traces: Vec<Trace>) -> Result<Vec<Trace>, CodecError> {
        if self.fail_normalize {
            return Err(CodecError::new("forced normalization failure"));
        }
        // Group fragments per channel, preserving first-seen channel order.
        let mut order: Vec<String> = Vec::new();
        let mut groups: BTreeMap<String, Vec<Trace>> = BTreeMap::new();
        for trace in traces {
            let channel = trace.channel().to_string();
            if !groups.contains_key(&channel) {
                order.push(channel.clone());
            }
            groups.entry(channel).or_default().push(trace);
        }

        let mut merged = Vec::with_capacity(order.len());
        for channel in order {
            let mut fragments = match groups.remove(&channel) {
                Some(fragments) => fragments,
                None => continue,
            };
            fragments.sort_by(|a, b| a.start_epoch().total_cmp(&b.start_epoch()));
            let rate = fragments[0].sample_rate_hz();
            if fragments.iter().any(|f| (f.sample_rate_hz() - rate).abs() > 1e-9) {
                return Err(CodecError::new(format!(
                    "channel {channel}: fragments disagree on sample rate"
                )));
            }
            let start = fragments[0].start_epoch();
            let mut samples: Vec<f64> = Vec::new();
            for fragment in fragments {
                let fragment_start = fragment.start_epoch();
                let fragment_samples = fragment.into_samples();
                if samples.is_empty() {
                    samples = fragment_samples;
                    continue;
                }
                let current_end = start + samples.len() as f64 / rate;
                let gap_samples = ((fragment_start - current_end) * rate).round() as i64;
                if gap_samples > 0 {
                    // Fill the gap by linear interpolation between the edges.
                    let from = *samples.last().unwrap_or(&0.0);
                    let to = *fragment_samples.first().unwrap_or(&0.0);
                    let steps = gap_samples as f64 + 1.0;
                    for k in 1..=gap_samples {
                        samples.push(from + (to - from) * k as f64 / steps);
                    }
                    samples.extend(fragment_samples);
                } else {
                    // Overlapping or contiguous: drop the overlapping head.
                    let skip = (-gap_samples) as usize;
                    samples.extend(fragment_samples.into_iter().skip(skip));
                }
            }
            merged.push(Trace::new(channel, rate, start, samples));
        }
        Ok(merged)
    }
}

// =============================================================================
// MockOracle - Configurable Pick Source
// =============================================================================

/// Detection oracle returning a fixed candidate list.
#[derive(Debug, Clone)]
pub struct MockOracle {
    sample_rate_hz: f64,
    candidates: Vec<Candidate>,
    fail: bool,
}

impl MockOracle {
    pub fn new(sample_rate_hz: f64) -> Self {
        Self {
            sample_rate_hz,
            candidates: Vec::new(),
            fail: false,
        }
    }

    pub fn with_candidates(mut self, candidates: Vec<Candidate>) -> Self {
        self.candidates = candidates;
        self
    }

    /// An oracle whose detect step always fails.
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }
}

impl DetectionOracle for MockOracle {
    fn sample_rate_hz(&self) -> f64 {
        self.sample_rate_hz
    }

    fn detect(&self, _segment: &WaveformSegment) -> PickResult<Vec<Candidate>> {
        if self.fail {
            return Err(PickError::Oracle("forced oracle failure".into()));
        }
        Ok(self.candidates.clone())
    }
}
