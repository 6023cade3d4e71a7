//! Request boundary: one input in, typed seed buckets out.

use crate::aggregate::{aggregate, AggregateOptions};
use crate::collaborators::Collaborators;
use crate::context::RequestContext;
use crate::discovery::{Discovery, SeedPlan};
use crate::enrichment::Enricher;
use crate::error::ResolveError;
use crate::policy::ResolverPolicy;
use crate::resolver::Resolver;
use crate::types::{Candidate, CandidateMap, ImageSource, ResultSet, TypeSet};
use futures::future::join_all;
use std::cmp::Ordering;

/// What the caller wants seeds for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeedInput {
    Text(String),
    Image(ImageSource),
    Url(String),
}

impl SeedInput {
    pub fn kind(&self) -> &'static str {
        match self {
            SeedInput::Text(_) => "text",
            SeedInput::Image(_) => "image",
            SeedInput::Url(_) => "url",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedRequest {
    pub input: SeedInput,
    /// Restrict results to these types. Empty means unrestricted.
    pub types: TypeSet,
    /// Maximum number of distinct seeds returned.
    pub limit: Option<usize>,
    pub best_only: bool,
    /// Images only: return the detected labels without resolving them.
    pub raw: bool,
}

impl SeedRequest {
    pub fn new(input: SeedInput) -> Self {
        Self {
            input,
            types: TypeSet::new(),
            limit: None,
            best_only: false,
            raw: false,
        }
    }

    pub fn with_types(mut self, types: TypeSet) -> Self {
        self.types = types;
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn best_only(mut self) -> Self {
        self.best_only = true;
        self
    }

    pub fn raw(mut self) -> Self {
        self.raw = true;
        self
    }

    fn validate(&self) -> Result<(), ResolveError> {
        if self.limit == Some(0) {
            return Err(ResolveError::InvalidInput("limit must be positive".into()));
        }
        match &self.input {
            SeedInput::Text(text) if text.trim().is_empty() => {
                Err(ResolveError::InvalidInput("empty text".into()))
            }
            SeedInput::Url(raw) => validate_url(raw),
            SeedInput::Image(ImageSource::Bytes(bytes)) if bytes.is_empty() => {
                Err(ResolveError::InvalidInput("empty image".into()))
            }
            SeedInput::Image(ImageSource::Remote(raw)) => validate_url(raw),
            _ => Ok(()),
        }
    }
}

fn validate_url(raw: &str) -> Result<(), ResolveError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ResolveError::InvalidInput("empty url".into()));
    }
    let parsed = url::Url::parse(raw)
        .map_err(|e| ResolveError::InvalidInput(format!("unparsable url {raw:?}: {e}")))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ResolveError::InvalidInput(format!(
            "unsupported url scheme {other:?}"
        ))),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SeedResponse {
    Seeds(ResultSet),
    /// Raw image mode.
    Labels(Vec<String>),
}

impl SeedResponse {
    pub fn seeds(&self) -> Option<&ResultSet> {
        match self {
            SeedResponse::Seeds(seeds) => Some(seeds),
            SeedResponse::Labels(_) => None,
        }
    }
}

/// Shared, stateless engine. Every call to [`SeedEngine::resolve_seeds`] gets
/// its own trace.
pub struct SeedEngine {
    collaborators: Collaborators,
    policy: ResolverPolicy,
    resolver: Resolver,
    enricher: Enricher,
}

impl SeedEngine {
    pub fn new(collaborators: Collaborators, policy: ResolverPolicy) -> Self {
        let resolver = Resolver::new(collaborators.search.clone(), collaborators.types.clone());
        let enricher = Enricher::new(
            collaborators.cross_reference.clone(),
            collaborators.types.clone(),
        );
        Self {
            collaborators,
            policy,
            resolver,
            enricher,
        }
    }

    pub async fn resolve_seeds(&self, request: SeedRequest) -> Result<SeedResponse, ResolveError> {
        request.validate()?;
        tracing::info!(
            input = request.input.kind(),
            types = ?request.types,
            limit = ?request.limit,
            best_only = request.best_only,
            "resolving seeds"
        );

        let discovery = Discovery::new(&self.collaborators, &self.policy);
        let plan = match &request.input {
            SeedInput::Text(text) => discovery.plan_text(text.trim(), &request.types).await,
            SeedInput::Url(url) => discovery.plan_url(url.trim(), &request.types).await,
            SeedInput::Image(image) => {
                let labels = discovery.image_labels(image).await;
                if request.raw {
                    tracing::info!(labels = labels.len(), "returning raw image labels");
                    return Ok(SeedResponse::Labels(labels));
                }
                discovery.plan_image(&labels, &request.types).await
            }
        };

        let ctx = RequestContext::new(self.policy.clone());
        let candidates = self.run_plan(&ctx, plan).await;
        let enriched = self
            .enricher
            .enrich(candidates, self.policy.enrichment_concurrency)
            .await;

        let options = AggregateOptions::from_policy(&self.policy, request.best_only, request.limit);
        let seeds = aggregate(enriched, &options);
        tracing::info!(
            visited = ctx.visited_count(),
            buckets = seeds.len(),
            seeds = seeds.values().map(Vec::len).sum::<usize>(),
            "seeds resolved"
        );
        Ok(SeedResponse::Seeds(seeds))
    }

    /// Resolve every planned query under one trace, merge first-writer-wins,
    /// then add recognized mentions not already found. Highest score first.
    async fn run_plan(&self, ctx: &RequestContext, plan: SeedPlan) -> Vec<Candidate> {
        let SeedPlan { queries, mentions } = plan;
        tracing::debug!(queries = queries.len(), mentions = mentions.len(), "plan ready");

        let trees = join_all(
            queries
                .into_iter()
                .map(|q| self.resolver.resolve_isolated(ctx, q)),
        )
        .await;

        let mut merged = CandidateMap::new();
        for tree in trees {
            for (uri, candidate) in tree {
                merged.entry(uri).or_insert(candidate);
            }
        }
        for mention in mentions {
            merged.entry(mention.uri.clone()).or_insert(mention);
        }

        let mut ranked: Vec<Candidate> = merged.into_values().collect();
        ranked.sort_by(|a, b| {
            b.score
                .value()
                .partial_cmp(&a.score.value())
                .unwrap_or(Ordering::Equal)
        });
        ranked
    }
}
