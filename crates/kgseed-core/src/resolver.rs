//! Recursive seed resolution.
//!
//! One call to [`Resolver::resolve`] walks a node through
//!
//! ```text
//! PENDING ─► FETCHED ─► FILTERED ─► (DEEPENED) ─► EXPANDED ─► MERGED
//!    │
//!    └─► SKIPPED   (pair already in the request trace)
//! ```
//!
//! Expansion re-queries the search collaborator with each discovered type as a
//! filter, using the candidate's own name as the query. Two gates keep the
//! tree small: the candidate must stay similar to the query the request
//! started from, and its score must beat a bar that rises as the parent's
//! confidence falls.

use crate::collaborators::{EntitySearch, TypeLookup};
use crate::context::RequestContext;
use crate::links::linked_data_uri;
use crate::normalize::score_stats;
use crate::similarity::sequence_ratio;
use crate::types::{Candidate, CandidateMap, SchemaType, SearchHit, TypeSet};
use futures::future::{join_all, BoxFuture};
use futures::FutureExt;
use std::collections::btree_map::Entry;
use std::collections::HashSet;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

/// One node of a resolution tree.
#[derive(Debug, Clone, PartialEq)]
pub struct SeedQuery {
    pub text: String,
    pub filter: Option<TypeSet>,
    /// Query the whole tree started from; anchors the similarity gate.
    pub origin: String,
    /// Score of the candidate that spawned this node (1.0 at the root).
    pub inherited_confidence: f64,
}

impl SeedQuery {
    /// A tree root. An empty filter means "no filter".
    pub fn root(text: impl Into<String>, filter: Option<TypeSet>) -> Self {
        let text = text.into();
        Self {
            origin: text.clone(),
            text,
            filter: filter.filter(|f| !f.is_empty()),
            inherited_confidence: 1.0,
        }
    }

    fn branch(&self, candidate: &Candidate, ty: &SchemaType) -> Self {
        Self {
            text: candidate.name.clone(),
            filter: Some(TypeSet::from([ty.clone()])),
            origin: self.origin.clone(),
            inherited_confidence: candidate.score.value(),
        }
    }
}

pub struct Resolver {
    search: Arc<dyn EntitySearch>,
    types: Arc<dyn TypeLookup>,
}

impl Resolver {
    pub fn new(search: Arc<dyn EntitySearch>, types: Arc<dyn TypeLookup>) -> Self {
        Self { search, types }
    }

    /// Resolve `query` and everything it expands into.
    ///
    /// Never fails: collaborator errors and broken branches degrade to fewer
    /// candidates.
    pub fn resolve<'a>(
        &'a self,
        ctx: &'a RequestContext,
        query: SeedQuery,
    ) -> BoxFuture<'a, CandidateMap> {
        async move {
            if !ctx.try_visit(&query.text, query.filter.as_ref()) {
                tracing::debug!(query = %query.text, filter = ?query.filter, "SKIPPED: already traced");
                return CandidateMap::new();
            }

            let hits = self.fetch(ctx, &query).await;
            let mut candidates = filter_hits(&query, hits);
            if candidates.is_empty() {
                return candidates;
            }

            self.deepen(&mut candidates).await;

            let branches = expansion_queries(ctx, &query, &candidates);
            tracing::debug!(
                query = %query.text,
                candidates = candidates.len(),
                branches = branches.len(),
                "EXPANDED"
            );

            let children = branches
                .into_iter()
                .map(|child| self.resolve_isolated(ctx, child));

            for found in join_all(children).await {
                for (uri, candidate) in found {
                    candidates.entry(uri).or_insert(candidate);
                }
            }

            tracing::debug!(query = %query.text, total = candidates.len(), "MERGED");
            candidates
        }
        .boxed()
    }

    /// [`Resolver::resolve`], with a panic anywhere below `query` contained
    /// to this tree.
    pub fn resolve_isolated<'a>(
        &'a self,
        ctx: &'a RequestContext,
        query: SeedQuery,
    ) -> BoxFuture<'a, CandidateMap> {
        let label = query.text.clone();
        let tree = self.resolve(ctx, query);
        async move {
            match AssertUnwindSafe(tree).catch_unwind().await {
                Ok(found) => found,
                Err(_) => {
                    tracing::warn!(query = %label, "resolution branch panicked; dropping it");
                    CandidateMap::new()
                }
            }
        }
        .boxed()
    }

    async fn fetch(&self, ctx: &RequestContext, query: &SeedQuery) -> Vec<SearchHit> {
        match self
            .search
            .search(&query.text, query.filter.as_ref(), ctx.policy().search_limit)
            .await
        {
            Ok(hits) => {
                tracing::debug!(query = %query.text, filter = ?query.filter, hits = hits.len(), "FETCHED");
                hits
            }
            Err(err) => {
                tracing::warn!(query = %query.text, error = %err, "entity search failed");
                Vec::new()
            }
        }
    }

    /// Ask the type collaborator about candidates typed only `Thing`.
    async fn deepen(&self, candidates: &mut CandidateMap) {
        let pending: Vec<String> = candidates
            .values()
            .filter(|c| c.is_uncategorized())
            .map(|c| c.uri.clone())
            .collect();
        if pending.is_empty() {
            return;
        }

        let lookups = pending.into_iter().map(|uri| async move {
            let resource = linked_data_uri(&uri);
            let found = match self.types.types_of(&resource).await {
                Ok(types) => types,
                Err(err) => {
                    tracing::warn!(resource = %resource, error = %err, "type lookup failed");
                    TypeSet::new()
                }
            };
            (uri, found)
        });

        for (uri, found) in join_all(lookups).await {
            if let Some(candidate) = candidates.get_mut(&uri) {
                if !found.is_empty() {
                    tracing::debug!(uri = %uri, types = ?found, "DEEPENED");
                }
                candidate.types.extend(found);
            }
        }
    }
}

/// Normalize, threshold and group one response into candidates.
fn filter_hits(query: &SeedQuery, hits: Vec<SearchHit>) -> CandidateMap {
    let mut candidates = CandidateMap::new();
    // one score per result item, however many type rows it produced
    let mut seen = HashSet::new();
    let raw: Vec<_> = hits
        .iter()
        .filter(|h| seen.insert(h.uri.as_str()))
        .map(|h| h.raw_score)
        .collect();
    let Some(stats) = score_stats(&raw) else {
        return candidates;
    };
    tracing::debug!(
        query = %query.text,
        max = stats.max,
        min = stats.min,
        avg = stats.avg,
        threshold = stats.threshold,
        deep_threshold = stats.deep_threshold,
        "score statistics"
    );

    for hit in hits {
        let score = stats.normalize(hit.raw_score);
        if !stats.admits(score) {
            continue;
        }
        match candidates.entry(hit.uri.clone()) {
            Entry::Occupied(mut slot) => {
                slot.get_mut().types.insert(hit.schema_type);
            }
            Entry::Vacant(slot) => {
                slot.insert(Candidate {
                    uri: hit.uri,
                    name: hit.name,
                    types: TypeSet::from([hit.schema_type]),
                    score,
                });
            }
        }
    }
    tracing::debug!(query = %query.text, kept = candidates.len(), "FILTERED");
    candidates
}

/// Child queries for every candidate/type pair that passes both gates.
fn expansion_queries(
    ctx: &RequestContext,
    query: &SeedQuery,
    candidates: &CandidateMap,
) -> Vec<SeedQuery> {
    let policy = ctx.policy();
    let score_bar = policy.recursion_score_gate / query.inherited_confidence;

    let mut branches = Vec::new();
    for candidate in candidates.values() {
        if candidate.score.value() <= score_bar {
            continue;
        }
        if sequence_ratio(&query.origin, &candidate.name) <= policy.similarity_gate {
            continue;
        }
        for ty in candidate.types.iter().filter(|t| !t.is_thing()) {
            branches.push(query.branch(candidate, ty));
        }
    }
    branches
}
