//! HTTP-backed collaborators for the kgseed engine.
//!
//! | Role | Service |
//! |---|---|
//! | entity search | Google Knowledge Graph Search |
//! | cross-reference, canonical types | Wikidata SPARQL |
//! | resource types | DBpedia SPARQL |
//! | entity recognition | Dandelion dataTXT |
//! | web detection | Google Cloud Vision |
//! | encyclopedia search | MediaWiki API |
//!
//! Every service is wrapped in [`Memoized`] so repeated lookups inside and
//! across requests cost one round trip per TTL window.

pub mod config;
pub mod dandelion;
pub mod dbpedia;
pub mod http;
pub mod kg_search;
pub mod memo;
pub mod sparql;
pub mod vision;
pub mod wikidata;
pub mod wikipedia;

pub use config::{ConfigError, Endpoints, ServiceConfig};
pub use memo::Memoized;

use dandelion::DandelionRecognizer;
use dbpedia::{DbpediaTypes, LinkedDataTypes};
use kg_search::KnowledgeGraphSearch;
use kgseed_core::Collaborators;
use sparql::SparqlClient;
use std::sync::Arc;
use vision::VisionWebDetector;
use wikidata::WikidataCrossReference;
use wikipedia::WikipediaSearch;

/// Wire every collaborator role to its HTTP service.
pub fn build_collaborators(config: &ServiceConfig) -> Result<Collaborators, ConfigError> {
    let client = http::build_client(config.timeout)?;
    let endpoints = &config.endpoints;
    let ttl = config.cache_ttl;
    let capacity = config.cache_capacity;

    let wikidata = WikidataCrossReference::new(SparqlClient::new(
        client.clone(),
        &endpoints.wikidata_sparql,
    ));
    let dbpedia = DbpediaTypes::new(SparqlClient::new(client.clone(), &endpoints.dbpedia_sparql));

    if config.dandelion_api_key.is_none() {
        tracing::warn!("DANDELION_API_KEY not set; entity recognition disabled");
    }

    tracing::info!(
        timeout_secs = config.timeout.as_secs(),
        cache_ttl_secs = ttl.as_secs(),
        cache_capacity = capacity,
        "collaborators configured"
    );

    Ok(Collaborators {
        search: Arc::new(Memoized::new(
            KnowledgeGraphSearch::new(client.clone(), &endpoints.kg_search, &config.google_api_key),
            ttl,
            capacity,
        )),
        cross_reference: Arc::new(Memoized::new(wikidata.clone(), ttl, capacity)),
        types: Arc::new(Memoized::new(LinkedDataTypes::new(dbpedia, wikidata), ttl, capacity)),
        recognizer: Arc::new(Memoized::new(
            DandelionRecognizer::new(
                client.clone(),
                &endpoints.dandelion,
                config.dandelion_api_key.clone(),
            ),
            ttl,
            capacity,
        )),
        web_detector: Arc::new(Memoized::new(
            VisionWebDetector::new(client.clone(), &endpoints.vision, &config.google_api_key),
            ttl,
            capacity,
        )),
        encyclopedia: Arc::new(Memoized::new(
            WikipediaSearch::new(client, &endpoints.wikipedia_api),
            ttl,
            capacity,
        )),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_with_minimal_config() {
        let config = ServiceConfig::new("test-key");
        assert!(build_collaborators(&config).is_ok());
    }
}
