//! Google Cloud Vision web detection.

use crate::http::send_json;
use async_trait::async_trait;
use base64::Engine as _;
use kgseed_core::{CollaboratorResult, ImageSource, WebDetector, WebLabel};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

pub struct VisionWebDetector {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl VisionWebDetector {
    pub fn new(client: Client, endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
        }
    }
}

fn annotate_body(image: &ImageSource) -> Value {
    let image = match image {
        ImageSource::Bytes(bytes) => json!({
            "content": base64::engine::general_purpose::STANDARD.encode(bytes)
        }),
        ImageSource::Remote(uri) => json!({ "source": { "imageUri": uri } }),
    };
    json!({
        "requests": [{
            "image": image,
            "features": [{ "type": "WEB_DETECTION" }]
        }]
    })
}

#[async_trait]
impl WebDetector for VisionWebDetector {
    async fn detect(&self, image: &ImageSource) -> CollaboratorResult<Vec<WebLabel>> {
        let request = self
            .client
            .post(&self.endpoint)
            .query(&[("key", self.api_key.as_str())])
            .json(&annotate_body(image));
        let response: AnnotateResponse = send_json("vision", request).await?;
        let labels = response.into_labels();
        tracing::debug!(labels = labels.len(), "web detection");
        Ok(labels)
    }
}

#[derive(Debug, Deserialize)]
struct AnnotateResponse {
    #[serde(default)]
    responses: Vec<ImageResponse>,
}

#[derive(Debug, Deserialize)]
struct ImageResponse {
    #[serde(rename = "webDetection", default)]
    web_detection: Option<WebDetection>,
}

#[derive(Debug, Deserialize)]
struct WebDetection {
    #[serde(rename = "webEntities", default)]
    web_entities: Vec<WebEntity>,
}

#[derive(Debug, Deserialize)]
struct WebEntity {
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    score: f64,
}

impl AnnotateResponse {
    fn into_labels(self) -> Vec<WebLabel> {
        self.responses
            .into_iter()
            .next()
            .and_then(|r| r.web_detection)
            .map(|d| {
                d.web_entities
                    .into_iter()
                    .map(|e| WebLabel {
                        label: e.description,
                        score: e.score,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}
