//! Core value types shared by every stage of the pipeline.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

// ============================================================================
// Types
// ============================================================================

/// A schema-level category label such as `Person` or `Place`.
///
/// Labels are stored without any namespace prefix (`schema:Place` and
/// `http://schema.org/Place` both become `Place`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SchemaType(String);

impl SchemaType {
    /// The "uncategorized" type. Candidates carrying only this type get deepened.
    pub const THING: &'static str = "Thing";

    pub fn new(label: impl AsRef<str>) -> Self {
        let label = label.as_ref().trim();
        let local = label
            .strip_prefix("http://schema.org/")
            .or_else(|| label.strip_prefix("https://schema.org/"))
            .or_else(|| label.strip_prefix("schema:"))
            .unwrap_or(label);
        Self(local.to_string())
    }

    pub fn thing() -> Self {
        Self(Self::THING.to_string())
    }

    pub fn is_thing(&self) -> bool {
        self.0 == Self::THING
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SchemaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SchemaType {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

pub type TypeSet = BTreeSet<SchemaType>;

/// Build a type set from plain labels.
pub fn type_set<I, S>(labels: I) -> TypeSet
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    labels.into_iter().map(SchemaType::new).collect()
}

// ============================================================================
// Scores
// ============================================================================

/// A relevance score in the units of whatever service produced it.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawScore(pub f64);

/// A relative score in `[0, 1]`.
///
/// Only the score normalizer turns a [`RawScore`] into a `Score`; confidences
/// that already live on a unit scale (NER, web detection) enter through
/// [`Score::from_unit`].
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Score(f64);

impl Score {
    pub const ONE: Score = Score(1.0);

    pub(crate) fn normalized(raw: RawScore, max: f64) -> Self {
        Self::from_unit(raw.0 / max)
    }

    /// Clamp a unit-scale confidence into a score. NaN becomes zero.
    pub fn from_unit(value: f64) -> Self {
        if value.is_nan() {
            Score(0.0)
        } else {
            Score(value.clamp(0.0, 1.0))
        }
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}", self.0)
    }
}

// ============================================================================
// Candidates
// ============================================================================

/// One raw row from the entity-search collaborator: a single `(uri, type)`
/// pairing of a search result item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Encyclopedia article URL identifying the entity.
    pub uri: String,
    pub schema_type: SchemaType,
    pub raw_score: RawScore,
    pub name: String,
}

/// An entity produced by one resolution pass, not yet enriched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub uri: String,
    pub name: String,
    pub types: TypeSet,
    pub score: Score,
}

impl Candidate {
    /// True when the search collaborator could not categorize the entity.
    pub fn is_uncategorized(&self) -> bool {
        self.types.len() == 1 && self.types.iter().all(SchemaType::is_thing)
    }
}

/// Candidates of one resolution tree keyed by knowledge-base URI.
pub type CandidateMap = BTreeMap<String, Candidate>;

/// A candidate after cross-reference enrichment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedCandidate {
    pub uri: String,
    pub name: String,
    pub types: TypeSet,
    pub score: Score,
    /// Canonical knowledge-base id; `None` when the lookup found nothing or failed.
    pub canonical_id: Option<String>,
    pub linked_data_uri: String,
    pub encyclopedia_uri: String,
}

/// Final answer: type bucket → seeds.
pub type ResultSet = BTreeMap<SchemaType, Vec<EnrichedCandidate>>;

// ============================================================================
// Collaborator payloads
// ============================================================================

/// An entity mention recognized in free text or a remote document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mention {
    /// Encyclopedia article URL of the recognized entity.
    pub uri: String,
    pub name: String,
    pub confidence: f64,
}

/// A label returned by reverse-image web detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebLabel {
    pub label: Option<String>,
    pub score: f64,
}

/// An encyclopedia page returned for a free-text search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncyclopediaPage {
    pub title: String,
    pub url: String,
}

/// Image payload for web detection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ImageSource {
    Bytes(Vec<u8>),
    Remote(String),
}
