//! kgseed core: recursive entity-seed resolution over a ranked entity search.
//!
//! Given free text, a document URL or an image, the engine finds the
//! knowledge-base entities the input is about, groups them by schema type and
//! links each one to a canonical identifier and a linked-data resource.
//!
//! ## Pipeline
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────────────┐
//! │                         SEED RESOLUTION                                │
//! ├────────────────────────────────────────────────────────────────────────┤
//! │                                                                        │
//! │  text / url / image                                                    │
//! │        │                                                               │
//! │  ┌─────▼─────┐   {query, types}*   ┌──────────┐                        │
//! │  │ Discovery │───────────────────►│ Resolver │◄──┐ type-filtered      │
//! │  └───────────┘                     └────┬─────┘   │ re-query           │
//! │        │ mentions                       │  ├──────┘                    │
//! │        │                          normalize │ deepen                   │
//! │        ▼                                ▼                              │
//! │  ┌──────────────────────────────────────────┐                         │
//! │  │ merge (first writer wins), rank by score │                         │
//! │  └───────────────────┬──────────────────────┘                         │
//! │                ┌─────▼──────┐    ┌────────────┐                       │
//! │                │ Enrichment │───►│ Aggregator │───► Type → [Seed]     │
//! │                └────────────┘    └────────────┘                       │
//! │                                                                        │
//! └────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The core never talks to the network itself. Every external service sits
//! behind a trait in [`collaborators`]; `kgseed-services` provides the HTTP
//! implementations.

pub mod aggregate;
pub mod collaborators;
pub mod context;
pub mod discovery;
pub mod engine;
pub mod enrichment;
pub mod error;
pub mod links;
pub mod normalize;
pub mod policy;
pub mod resolver;
pub mod similarity;
pub mod types;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use collaborators::{
    Collaborators, CrossReference, EncyclopediaSearch, EntityRecognizer, EntitySearch,
    TypeLookup, WebDetector,
};
pub use context::RequestContext;
pub use engine::{SeedEngine, SeedInput, SeedRequest, SeedResponse};
pub use error::{CollaboratorError, CollaboratorResult, ResolveError};
pub use policy::ResolverPolicy;
pub use types::{
    Candidate, EncyclopediaPage, EnrichedCandidate, ImageSource, Mention, RawScore, ResultSet,
    SchemaType, Score, SearchHit, TypeSet, WebLabel,
};
