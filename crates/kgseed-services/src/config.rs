//! Service configuration loaded from the environment.

use std::time::Duration;
use thiserror::Error;

// ============================================================================
// Configuration
// ============================================================================

pub const DEFAULT_TIMEOUT_SECS: u64 = 20;
/// Ten days.
pub const DEFAULT_CACHE_TTL_SECS: u64 = 864_000;
/// Answers kept per collaborator method.
pub const DEFAULT_CACHE_CAPACITY: u64 = 10_000;

/// Base URLs of every remote service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub kg_search: String,
    pub vision: String,
    pub wikidata_sparql: String,
    pub dbpedia_sparql: String,
    pub dandelion: String,
    pub wikipedia_api: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            kg_search: "https://kgsearch.googleapis.com/v1/entities:search".to_string(),
            vision: "https://vision.googleapis.com/v1/images:annotate".to_string(),
            wikidata_sparql: "https://query.wikidata.org/sparql".to_string(),
            dbpedia_sparql: "http://dbpedia.org/sparql".to_string(),
            dandelion: "https://api.dandelion.eu/datatxt/nex/v1".to_string(),
            wikipedia_api: "https://en.wikipedia.org/w/api.php".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Knowledge Graph Search and Cloud Vision.
    pub google_api_key: String,
    /// Entity recognition. Without it recognition yields nothing.
    pub dandelion_api_key: Option<String>,
    pub endpoints: Endpoints,
    pub timeout: Duration,
    /// How long a successful collaborator answer is reused.
    pub cache_ttl: Duration,
    pub cache_capacity: u64,
}

impl ServiceConfig {
    pub fn new(google_api_key: impl Into<String>) -> Self {
        Self {
            google_api_key: google_api_key.into(),
            dandelion_api_key: None,
            endpoints: Endpoints::default(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }

    /// Load from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load from any variable source. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let google_api_key = var("GOOGLE_API_KEY").ok_or(ConfigError::MissingCredential("GOOGLE_API_KEY"))?;
        let mut config = Self::new(google_api_key);
        config.dandelion_api_key = var("DANDELION_API_KEY");

        let endpoints = &mut config.endpoints;
        for (name, slot) in [
            ("KGSEED_KG_ENDPOINT", &mut endpoints.kg_search),
            ("KGSEED_VISION_ENDPOINT", &mut endpoints.vision),
            ("KGSEED_WIKIDATA_SPARQL", &mut endpoints.wikidata_sparql),
            ("KGSEED_DBPEDIA_SPARQL", &mut endpoints.dbpedia_sparql),
            ("KGSEED_DANDELION_ENDPOINT", &mut endpoints.dandelion),
            ("KGSEED_WIKIPEDIA_API", &mut endpoints.wikipedia_api),
        ] {
            if let Some(value) = var(name) {
                url::Url::parse(&value).map_err(|e| ConfigError::Invalid {
                    name,
                    value: value.clone(),
                    reason: e.to_string(),
                })?;
                *slot = value;
            }
        }

        if let Some(secs) = var("KGSEED_TIMEOUT_SECS") {
            config.timeout = Duration::from_secs(parse_u64("KGSEED_TIMEOUT_SECS", &secs)?);
        }
        if let Some(secs) = var("KGSEED_CACHE_TTL_SECS") {
            config.cache_ttl = Duration::from_secs(parse_u64("KGSEED_CACHE_TTL_SECS", &secs)?);
        }
        if let Some(count) = var("KGSEED_CACHE_CAPACITY") {
            config.cache_capacity = parse_u64("KGSEED_CACHE_CAPACITY", &count)?;
        }

        Ok(config)
    }
}

fn parse_u64(name: &'static str, value: &str) -> Result<u64, ConfigError> {
    value.trim().parse().map_err(|e: std::num::ParseIntError| ConfigError::Invalid {
        name,
        value: value.to_string(),
        reason: e.to_string(),
    })
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing credential: set {0}")]
    MissingCredential(&'static str),
    #[error("invalid {name}={value:?}: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn google_key_is_required() {
        let err = ServiceConfig::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingCredential("GOOGLE_API_KEY")));

        let err = ServiceConfig::from_lookup(lookup(&[("GOOGLE_API_KEY", "  ")])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingCredential(_)));
    }

    #[test]
    fn defaults_apply() {
        let config = ServiceConfig::from_lookup(lookup(&[("GOOGLE_API_KEY", "g")])).unwrap();
        assert_eq!(config.google_api_key, "g");
        assert_eq!(config.dandelion_api_key, None);
        assert_eq!(config.endpoints, Endpoints::default());
        assert_eq!(config.timeout, Duration::from_secs(20));
        assert_eq!(config.cache_ttl, Duration::from_secs(864_000));
        assert_eq!(config.cache_capacity, 10_000);
    }

    #[test]
    fn overrides_are_read() {
        let config = ServiceConfig::from_lookup(lookup(&[
            ("GOOGLE_API_KEY", "g"),
            ("DANDELION_API_KEY", "d"),
            ("KGSEED_KG_ENDPOINT", "http://localhost:9000/search"),
            ("KGSEED_TIMEOUT_SECS", "5"),
            ("KGSEED_CACHE_TTL_SECS", "0"),
            ("KGSEED_CACHE_CAPACITY", "250"),
        ]))
        .unwrap();
        assert_eq!(config.dandelion_api_key.as_deref(), Some("d"));
        assert_eq!(config.endpoints.kg_search, "http://localhost:9000/search");
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.cache_ttl, Duration::ZERO);
        assert_eq!(config.cache_capacity, 250);
    }

    #[test]
    fn malformed_values_are_rejected() {
        let err = ServiceConfig::from_lookup(lookup(&[
            ("GOOGLE_API_KEY", "g"),
            ("KGSEED_TIMEOUT_SECS", "soon"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "KGSEED_TIMEOUT_SECS", .. }));

        let err = ServiceConfig::from_lookup(lookup(&[
            ("GOOGLE_API_KEY", "g"),
            ("KGSEED_WIKIPEDIA_API", "not a url"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }
}
