//! Rendering of seed responses, shared by the CLI and the HTTP front door.

use colored::Colorize;
use kgseed_core::{EnrichedCandidate, ResultSet, SeedResponse};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write as _;

/// Wire shape of one seed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeedView {
    pub entity: String,
    pub name: String,
    pub score: f64,
    pub canonical_id: Option<String>,
    pub linked_data: String,
    pub article: String,
}

impl From<&EnrichedCandidate> for SeedView {
    fn from(seed: &EnrichedCandidate) -> Self {
        Self {
            entity: seed.uri.clone(),
            name: seed.name.clone(),
            score: seed.score.value(),
            canonical_id: seed.canonical_id.clone(),
            linked_data: seed.linked_data_uri.clone(),
            article: seed.encyclopedia_uri.clone(),
        }
    }
}

pub fn seeds_view(seeds: &ResultSet) -> BTreeMap<String, Vec<SeedView>> {
    seeds
        .iter()
        .map(|(ty, bucket)| (ty.to_string(), bucket.iter().map(SeedView::from).collect()))
        .collect()
}

pub fn response_json(response: &SeedResponse) -> serde_json::Value {
    match response {
        SeedResponse::Seeds(seeds) => serde_json::json!(seeds_view(seeds)),
        SeedResponse::Labels(labels) => serde_json::json!({ "labels": labels }),
    }
}

/// Human-readable listing, one block per type.
pub fn render_colored(response: &SeedResponse) -> String {
    let mut out = String::new();
    match response {
        SeedResponse::Labels(labels) => {
            if labels.is_empty() {
                let _ = writeln!(out, "{}", "no labels detected".yellow());
            }
            for label in labels {
                let _ = writeln!(out, "{} {}", "label".cyan().bold(), label);
            }
        }
        SeedResponse::Seeds(seeds) => {
            if seeds.is_empty() {
                let _ = writeln!(out, "{}", "no seeds found".yellow());
            }
            for (ty, bucket) in seeds {
                let _ = writeln!(out, "{} ({})", ty.to_string().green().bold(), bucket.len());
                for seed in bucket {
                    let id = seed.canonical_id.as_deref().unwrap_or("-");
                    let _ = writeln!(
                        out,
                        "  {} {} {} {}",
                        seed.score.to_string().bold(),
                        seed.name,
                        id.dimmed(),
                        seed.encyclopedia_uri.dimmed()
                    );
                }
            }
        }
    }
    out
}
