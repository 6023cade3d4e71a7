//! Dandelion dataTXT named-entity extraction.

use crate::http::send_json;
use async_trait::async_trait;
use kgseed_core::{CollaboratorResult, EntityRecognizer, Mention};
use reqwest::Client;
use serde::Deserialize;

pub struct DandelionRecognizer {
    client: Client,
    endpoint: String,
    /// Without a token every call answers with no mentions.
    token: Option<String>,
}

impl DandelionRecognizer {
    pub fn new(client: Client, endpoint: impl Into<String>, token: Option<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            token,
        }
    }

    async fn extract(&self, source: (&str, &str)) -> CollaboratorResult<Vec<Mention>> {
        let Some(token) = self.token.as_deref() else {
            tracing::debug!("no recognition token configured");
            return Ok(Vec::new());
        };
        let request = self
            .client
            .get(&self.endpoint)
            .query(&[("token", token), source]);
        let response: NexResponse = send_json("dandelion", request).await?;
        Ok(response.into_mentions())
    }
}

#[async_trait]
impl EntityRecognizer for DandelionRecognizer {
    async fn recognize_text(&self, text: &str) -> CollaboratorResult<Vec<Mention>> {
        self.extract(("text", text)).await
    }

    async fn recognize_url(&self, url: &str) -> CollaboratorResult<Vec<Mention>> {
        self.extract(("url", url)).await
    }
}

#[derive(Debug, Deserialize)]
struct NexResponse {
    #[serde(default)]
    annotations: Vec<Annotation>,
}

#[derive(Debug, Deserialize)]
struct Annotation {
    uri: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    spot: Option<String>,
    #[serde(default)]
    confidence: f64,
}

impl NexResponse {
    fn into_mentions(self) -> Vec<Mention> {
        self.annotations
            .into_iter()
            .filter_map(|a| {
                let name = a.title.or(a.spot)?;
                Some(Mention {
                    uri: a.uri,
                    name,
                    confidence: a.confidence,
                })
            })
            .collect()
    }
}
