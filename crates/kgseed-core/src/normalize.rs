//! Score normalization for a single search response.
//!
//! Raw relevance scores are only comparable within one response, so every
//! response is rescaled by its own maximum before any threshold applies.

use crate::types::{RawScore, Score};

/// Statistics over the normalized scores of one response.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreStats {
    raw_max: f64,
    pub max: f64,
    pub min: f64,
    pub avg: f64,
    /// Items strictly below this are noise.
    pub threshold: f64,
    /// Advisory only; logged, never used for admission.
    pub deep_threshold: f64,
}

impl ScoreStats {
    /// Normalize `raw` against the response maximum.
    pub fn normalize(&self, raw: RawScore) -> Score {
        Score::normalized(raw, self.raw_max)
    }

    /// True when the normalized score clears the noise threshold.
    pub fn admits(&self, score: Score) -> bool {
        score.value() >= self.threshold
    }
}

/// Compute [`ScoreStats`] for one response.
///
/// Returns `None` when there is nothing to normalize: no scores, or a maximum
/// that is not a positive finite number.
pub fn score_stats(raw: &[RawScore]) -> Option<ScoreStats> {
    let raw_max = raw
        .iter()
        .map(|s| s.0)
        .filter(|s| s.is_finite())
        .fold(f64::NEG_INFINITY, f64::max);
    if !(raw_max.is_finite() && raw_max > 0.0) {
        return None;
    }

    let normalized: Vec<f64> = raw
        .iter()
        .filter(|s| s.0.is_finite())
        .map(|s| Score::normalized(*s, raw_max).value())
        .collect();

    let max = normalized.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let min = normalized.iter().copied().fold(f64::INFINITY, f64::min);
    let avg = normalized.iter().sum::<f64>() / normalized.len() as f64;

    Some(ScoreStats {
        raw_max,
        max,
        min,
        avg,
        threshold: avg,
        deep_threshold: avg * 0.1 + max * 0.9,
    })
}
