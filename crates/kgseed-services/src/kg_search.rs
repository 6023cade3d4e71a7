//! Google Knowledge Graph Search API.

use crate::http::send_json;
use async_trait::async_trait;
use kgseed_core::links::normalize_article_uri;
use kgseed_core::{CollaboratorResult, EntitySearch, RawScore, SchemaType, SearchHit};
use reqwest::Client;
use serde::Deserialize;
use std::collections::BTreeSet;

pub struct KnowledgeGraphSearch {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl KnowledgeGraphSearch {
    pub fn new(client: Client, endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
        }
    }
}

#[async_trait]
impl EntitySearch for KnowledgeGraphSearch {
    async fn search(
        &self,
        query: &str,
        types: Option<&BTreeSet<SchemaType>>,
        limit: Option<usize>,
    ) -> CollaboratorResult<Vec<SearchHit>> {
        let mut params: Vec<(&str, String)> = vec![
            ("query", query.to_string()),
            ("key", self.api_key.clone()),
        ];
        if let Some(limit) = limit {
            params.push(("limit", limit.to_string()));
        }
        if let Some(types) = types.filter(|t| !t.is_empty()) {
            let joined: Vec<&str> = types.iter().map(SchemaType::as_str).collect();
            params.push(("types", joined.join(",")));
        }
        tracing::debug!(query = %query, types = ?types, limit = ?limit, "knowledge graph search");

        let request = self.client.get(&self.endpoint).query(&params);
        let response: SearchResponse = send_json("kgsearch", request).await?;
        Ok(response.into_hits())
    }
}

// ============================================================================
// Wire format
// ============================================================================

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(rename = "itemListElement", default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    result: EntityResult,
    #[serde(rename = "resultScore", default)]
    score: f64,
}

#[derive(Debug, Deserialize)]
struct EntityResult {
    #[serde(default)]
    name: Option<String>,
    #[serde(rename = "@type", default)]
    types: Vec<String>,
    #[serde(rename = "detailedDescription", default)]
    detailed_description: Option<DetailedDescription>,
}

#[derive(Debug, Deserialize)]
struct DetailedDescription {
    #[serde(default)]
    url: Option<String>,
}

impl SearchResponse {
    /// One hit per `(item, @type)`. Items without an article URL or a name
    /// cannot become candidates and are skipped.
    fn into_hits(self) -> Vec<SearchHit> {
        let mut hits = Vec::new();
        for item in self.items {
            let EntityResult {
                name,
                types,
                detailed_description,
            } = item.result;
            let Some(url) = detailed_description.and_then(|d| d.url) else {
                continue;
            };
            let Some(name) = name else {
                continue;
            };
            let uri = normalize_article_uri(&url);

            let types: Vec<SchemaType> = if types.is_empty() {
                vec![SchemaType::thing()]
            } else {
                types.iter().map(SchemaType::new).collect()
            };
            for schema_type in types {
                hits.push(SearchHit {
                    uri: uri.clone(),
                    schema_type,
                    raw_score: RawScore(item.score),
                    name: name.clone(),
                });
            }
        }
        hits
    }
}
