//! Contracts of the external services the engine depends on.
//!
//! The core never assumes a transport. Implementations must behave like pure
//! functions of their arguments so a memoizing layer can sit in front of them.

use crate::error::CollaboratorResult;
use crate::types::{EncyclopediaPage, ImageSource, Mention, SchemaType, SearchHit, TypeSet, WebLabel};
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Ranked entity search.
#[async_trait]
pub trait EntitySearch: Send + Sync {
    /// Search `query`, optionally restricted to `types`. One hit per
    /// `(result item, type)` pair.
    async fn search(
        &self,
        query: &str,
        types: Option<&BTreeSet<SchemaType>>,
        limit: Option<usize>,
    ) -> CollaboratorResult<Vec<SearchHit>>;
}

/// Canonical knowledge-base identifier for an encyclopedia article.
#[async_trait]
pub trait CrossReference: Send + Sync {
    async fn lookup(&self, article_uri: &str) -> CollaboratorResult<Option<String>>;
}

/// Type inference over linked data.
#[async_trait]
pub trait TypeLookup: Send + Sync {
    /// Schema types asserted for a linked-data resource.
    async fn types_of(&self, linked_data_uri: &str) -> CollaboratorResult<TypeSet>;

    /// Schema types inherited by a canonical entity through its class hierarchy.
    async fn canonical_types(&self, _canonical_id: &str) -> CollaboratorResult<TypeSet> {
        Ok(TypeSet::new())
    }
}

/// Named-entity recognition.
#[async_trait]
pub trait EntityRecognizer: Send + Sync {
    async fn recognize_text(&self, text: &str) -> CollaboratorResult<Vec<Mention>>;
    async fn recognize_url(&self, url: &str) -> CollaboratorResult<Vec<Mention>>;
}

/// Reverse-image web-entity detection.
#[async_trait]
pub trait WebDetector: Send + Sync {
    async fn detect(&self, image: &ImageSource) -> CollaboratorResult<Vec<WebLabel>>;
}

/// Encyclopedia page search. Disambiguation pages expand into their options.
#[async_trait]
pub trait EncyclopediaSearch: Send + Sync {
    async fn search(&self, text: &str) -> CollaboratorResult<Vec<EncyclopediaPage>>;
}

/// The full set of collaborators handed to the engine.
#[derive(Clone)]
pub struct Collaborators {
    pub search: Arc<dyn EntitySearch>,
    pub cross_reference: Arc<dyn CrossReference>,
    pub types: Arc<dyn TypeLookup>,
    pub recognizer: Arc<dyn EntityRecognizer>,
    pub web_detector: Arc<dyn WebDetector>,
    pub encyclopedia: Arc<dyn EncyclopediaSearch>,
}

impl Collaborators {
    /// Use one object for every role.
    pub fn uniform<C>(collaborator: Arc<C>) -> Self
    where
        C: EntitySearch
            + CrossReference
            + TypeLookup
            + EntityRecognizer
            + WebDetector
            + EncyclopediaSearch
            + 'static,
    {
        Self {
            search: collaborator.clone(),
            cross_reference: collaborator.clone(),
            types: collaborator.clone(),
            recognizer: collaborator.clone(),
            web_detector: collaborator.clone(),
            encyclopedia: collaborator,
        }
    }
}
