//! Tunable thresholds of the resolution pipeline.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Heuristic constants. None of them are load-bearing for correctness; they
/// trade recall against noise and request cost.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverPolicy {
    /// A branch recurses only if `score > recursion_score_gate / inherited_confidence`.
    pub recursion_score_gate: f64,
    /// A branch recurses only if `similarity(origin, name) > similarity_gate`.
    pub similarity_gate: f64,
    /// Seeds below this score never reach the caller.
    pub score_floor: f64,
    /// Width of the best-only acceptance window.
    pub best_band: f64,
    /// Maximum in-flight enrichment lookups per request.
    pub enrichment_concurrency: usize,
    /// Result limit passed to the search collaborator.
    pub search_limit: Option<usize>,
    /// Recognized mentions at or below this confidence are ignored.
    pub mention_confidence_floor: f64,
}

impl Default for ResolverPolicy {
    fn default() -> Self {
        Self {
            recursion_score_gate: 0.5,
            similarity_gate: 0.5,
            score_floor: 0.1,
            best_band: 0.05,
            enrichment_concurrency: 8,
            search_limit: None,
            mention_confidence_floor: 0.5,
        }
    }
}

impl ResolverPolicy {
    /// Load a policy from a JSON file. Missing fields take their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self, std::io::Error> {
        let raw = std::fs::read_to_string(path)?;
        serde_json::from_str(&raw)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }
}
