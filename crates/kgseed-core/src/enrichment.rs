//! Flat, bounded fan-out of cross-reference lookups over the final candidate
//! set of a request.

use crate::collaborators::{CrossReference, TypeLookup};
use crate::links::linked_data_uri;
use crate::types::{Candidate, EnrichedCandidate};
use futures::stream::{self, StreamExt};
use std::sync::Arc;

pub struct Enricher {
    cross_reference: Arc<dyn CrossReference>,
    types: Arc<dyn TypeLookup>,
}

impl Enricher {
    pub fn new(cross_reference: Arc<dyn CrossReference>, types: Arc<dyn TypeLookup>) -> Self {
        Self {
            cross_reference,
            types,
        }
    }

    /// Enrich every candidate with at most `concurrency` lookups in flight.
    ///
    /// Returns once every lookup has finished. Output order matches input
    /// order and no candidate is ever dropped.
    pub async fn enrich(
        &self,
        candidates: Vec<Candidate>,
        concurrency: usize,
    ) -> Vec<EnrichedCandidate> {
        let total = candidates.len();
        let enriched: Vec<EnrichedCandidate> = stream::iter(candidates)
            .map(|candidate| self.enrich_one(candidate))
            .buffered(concurrency.max(1))
            .collect()
            .await;
        let linked = enriched.iter().filter(|c| c.canonical_id.is_some()).count();
        tracing::debug!(total, linked, "enrichment finished");
        enriched
    }

    async fn enrich_one(&self, candidate: Candidate) -> EnrichedCandidate {
        let Candidate {
            uri,
            name,
            mut types,
            score,
        } = candidate;
        let linked_data_uri = linked_data_uri(&uri);

        let canonical_id = match self.cross_reference.lookup(&uri).await {
            Ok(id) => id,
            Err(err) => {
                tracing::warn!(uri = %uri, error = %err, "cross-reference lookup failed");
                None
            }
        };

        if let Some(id) = canonical_id.as_deref() {
            match self.types.canonical_types(id).await {
                Ok(found) => types.extend(found),
                Err(err) => {
                    tracing::warn!(id = %id, error = %err, "canonical type lookup failed");
                }
            }
        }

        EnrichedCandidate {
            encyclopedia_uri: uri.clone(),
            uri,
            name,
            types,
            score,
            canonical_id,
            linked_data_uri,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{article, ScriptedCollaborators};
    use crate::types::{type_set, Score};

    fn candidate(name: &str, score: f64) -> Candidate {
        Candidate {
            uri: article(name),
            name: name.to_string(),
            types: type_set(["Place"]),
            score: Score::from_unit(score),
        }
    }

    fn enricher(fake: &Arc<ScriptedCollaborators>) -> Enricher {
        Enricher::new(fake.clone(), fake.clone())
    }

    #[tokio::test]
    async fn links_identifier_and_derives_resources() {
        let fake = Arc::new(ScriptedCollaborators::new());
        fake.script_cross_reference(&article("Madrid"), "Q2807");
        fake.script_canonical_types("Q2807", type_set(["City", "AdministrativeArea"]));

        let out = enricher(&fake).enrich(vec![candidate("Madrid", 1.0)], 4).await;

        assert_eq!(out.len(), 1);
        let madrid = &out[0];
        assert_eq!(madrid.canonical_id.as_deref(), Some("Q2807"));
        assert_eq!(madrid.linked_data_uri, "http://dbpedia.org/resource/Madrid");
        assert_eq!(madrid.encyclopedia_uri, article("Madrid"));
        assert_eq!(madrid.types, type_set(["AdministrativeArea", "City", "Place"]));
    }

    #[tokio::test]
    async fn failed_lookup_keeps_candidate_without_id() {
        let fake = Arc::new(ScriptedCollaborators::new());
        fake.fail_cross_reference(&article("Atlantis"));

        let out = enricher(&fake).enrich(vec![candidate("Atlantis", 0.7)], 4).await;

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].canonical_id, None);
        assert_eq!(out[0].name, "Atlantis");
        assert_eq!(out[0].types, type_set(["Place"]));
    }

    #[tokio::test]
    async fn preserves_order_under_a_narrow_pool() {
        let fake = Arc::new(ScriptedCollaborators::new());
        let names = ["Paris", "Lyon", "Nice", "Lille", "Nantes"];
        for (i, name) in names.iter().enumerate() {
            fake.script_cross_reference(&article(name), &format!("Q{i}"));
        }
        let input = names.iter().map(|n| candidate(n, 0.5)).collect();

        let out = enricher(&fake).enrich(input, 2).await;

        let got: Vec<_> = out.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(got, names);
        assert!(out.iter().all(|c| c.canonical_id.is_some()));
    }

    #[tokio::test]
    async fn zero_concurrency_still_runs() {
        let fake = Arc::new(ScriptedCollaborators::new());
        let out = enricher(&fake).enrich(vec![candidate("Porto", 0.9)], 0).await;
        assert_eq!(out.len(), 1);
    }
}
