//! Deterministic arbitration over ambiguous candidate picks.
//!
//! The detector regularly emits several plausible picks for one segment. The
//! arbitrator reconciles them against the catalog's reference timestamp and
//! selects at most one, deterministically: the same candidates in the same
//! emission order always produce the same result, and every tie breaks toward
//! the earliest emission index.
//!
//! The fallback chain is an explicit ordered table of rules evaluated
//! top-to-bottom, so the tie-break policy is testable without any I/O:
//!
//! 1. **nearest within tolerance** — needs a reference; picks the candidate
//!    with the minimum absolute distance to it, and fires only when that
//!    distance is within the tolerance window (boundary inclusive);
//! 2. **highest known confidence** — among candidates that report a
//!    confidence;
//! 3. **first available** — the first candidate in emission order.
//!
//! The tolerance gate never discards candidates outright; it only decides
//! whether proximity or confidence drives the choice. A reference that exists
//! but has no candidate nearby falls through to the same confidence chain as
//! a missing reference.

use crate::oracle::Candidate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which rule of the fallback chain selected the pick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionReason {
    WithinTolerance,
    MaxConfidenceFallback,
    FirstAvailable,
    /// No candidates were available to select from.
    #[serde(rename = "none")]
    NoCandidates,
}

impl fmt::Display for SelectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            SelectionReason::WithinTolerance => "within_tolerance",
            SelectionReason::MaxConfidenceFallback => "max_confidence_fallback",
            SelectionReason::FirstAvailable => "first_available",
            SelectionReason::NoCandidates => "none",
        };
        f.write_str(tag)
    }
}

/// Outcome of one arbitration pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ArbitrationResult {
    /// Chosen pick time as epoch seconds, if any candidate was selected.
    pub time: Option<f64>,
    /// Confidence of the chosen candidate, if it reported one.
    pub confidence: Option<f64>,
    pub reason: SelectionReason,
}

impl ArbitrationResult {
    fn none() -> Self {
        Self {
            time: None,
            confidence: None,
            reason: SelectionReason::NoCandidates,
        }
    }

    fn select(candidate: &Candidate, reason: SelectionReason) -> Self {
        Self {
            time: Some(candidate.time),
            confidence: candidate.confidence,
            reason,
        }
    }

    /// Whether arbitration produced an automated pick.
    pub fn is_pick(&self) -> bool {
        self.time.is_some()
    }
}

struct RuleContext<'a> {
    candidates: &'a [Candidate],
    reference: Option<f64>,
    tolerance_secs: f64,
}

type Rule = fn(&RuleContext<'_>) -> Option<ArbitrationResult>;

/// The fallback chain, evaluated top-to-bottom. Order is the policy.
const FALLBACK_CHAIN: &[Rule] = &[
    nearest_within_tolerance,
    highest_known_confidence,
    first_available,
];

fn nearest_within_tolerance(ctx: &RuleContext<'_>) -> Option<ArbitrationResult> {
    let reference = ctx.reference?;
    let mut best: Option<(usize, f64)> = None;
    for (index, candidate) in ctx.candidates.iter().enumerate() {
        let distance = (candidate.time - reference).abs();
        // Strict inequality keeps the earliest index on ties.
        if best.map_or(true, |(_, d)| distance < d) {
            best = Some((index, distance));
        }
    }
    let (index, distance) = best?;
    if distance <= ctx.tolerance_secs {
        Some(ArbitrationResult::select(
            &ctx.candidates[index],
            SelectionReason::WithinTolerance,
        ))
    } else {
        None
    }
}

fn highest_known_confidence(ctx: &RuleContext<'_>) -> Option<ArbitrationResult> {
    let mut best: Option<(usize, f64)> = None;
    for (index, candidate) in ctx.candidates.iter().enumerate() {
        if let Some(confidence) = candidate.confidence {
            // Strict inequality keeps the earliest index on ties.
            if best.map_or(true, |(_, c)| confidence > c) {
                best = Some((index, confidence));
            }
        }
    }
    let (index, _) = best?;
    Some(ArbitrationResult::select(
        &ctx.candidates[index],
        SelectionReason::MaxConfidenceFallback,
    ))
}

fn first_available(ctx: &RuleContext<'_>) -> Option<ArbitrationResult> {
    ctx.candidates
        .first()
        .map(|c| ArbitrationResult::select(c, SelectionReason::FirstAvailable))
}

/// Selects at most one candidate against an optional reference timestamp.
pub struct PickArbitrator {
    tolerance_secs: f64,
}

impl PickArbitrator {
    pub fn new(tolerance_secs: f64) -> Self {
        Self { tolerance_secs }
    }

    pub fn tolerance_secs(&self) -> f64 {
        self.tolerance_secs
    }

    /// Runs the fallback chain over candidates in their emission order.
    pub fn arbitrate(
        &self,
        candidates: &[Candidate],
        reference: Option<f64>,
    ) -> ArbitrationResult {
        if candidates.is_empty() {
            return ArbitrationResult::none();
        }
        let ctx = RuleContext {
            candidates,
            reference,
            tolerance_secs: self.tolerance_secs,
        };
        for rule in FALLBACK_CHAIN {
            if let Some(result) = rule(&ctx) {
                return result;
            }
        }
        // first_available always selects when candidates exist.
        ArbitrationResult::none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_candidates_yield_none_reason() {
        let result = PickArbitrator::new(11.0).arbitrate(&[], Some(100.0));
        assert_eq!(result.reason, SelectionReason::NoCandidates);
        assert_eq!(result.time, None);
        assert_eq!(result.confidence, None);
    }

    #[test]
    fn tolerance_boundary_is_inclusive() {
        let arbitrator = PickArbitrator::new(5.0);
        let at_boundary = arbitrator.arbitrate(&[Candidate::new(105.0)], Some(100.0));
        assert_eq!(at_boundary.reason, SelectionReason::WithinTolerance);

        let past_boundary = arbitrator.arbitrate(&[Candidate::new(105.001)], Some(100.0));
        assert_eq!(past_boundary.reason, SelectionReason::FirstAvailable);
    }

    #[test]
    fn zero_tolerance_accepts_exact_match_only() {
        let arbitrator = PickArbitrator::new(0.0);
        let exact = arbitrator.arbitrate(&[Candidate::new(100.0)], Some(100.0));
        assert_eq!(exact.reason, SelectionReason::WithinTolerance);

        let off = arbitrator.arbitrate(&[Candidate::new(100.5)], Some(100.0));
        assert_ne!(off.reason, SelectionReason::WithinTolerance);
    }

    #[test]
    fn nearest_distance_tie_takes_earliest_index() {
        // Both candidates sit 5 s from the reference, on opposite sides.
        let candidates = [Candidate::new(105.0), Candidate::new(95.0)];
        let result = PickArbitrator::new(11.0).arbitrate(&candidates, Some(100.0));
        assert_eq!(result.reason, SelectionReason::WithinTolerance);
        assert_eq!(result.time, Some(105.0));
    }

    #[test]
    fn reason_tags_render_as_snake_case() {
        assert_eq!(SelectionReason::WithinTolerance.to_string(), "within_tolerance");
        assert_eq!(
            SelectionReason::MaxConfidenceFallback.to_string(),
            "max_confidence_fallback"
        );
        assert_eq!(SelectionReason::FirstAvailable.to_string(), "first_available");
        assert_eq!(SelectionReason::NoCandidates.to_string(), "none");
    }
}
