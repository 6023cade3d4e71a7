//! Shared reqwest plumbing.

use crate::config::ConfigError;
use kgseed_core::{CollaboratorError, CollaboratorResult};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use std::time::Duration;

const USER_AGENT: &str = concat!("kgseed/", env!("CARGO_PKG_VERSION"));

/// One client per process; every service clones it.
pub fn build_client(timeout: Duration) -> Result<Client, ConfigError> {
    Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| ConfigError::Client(e.to_string()))
}

/// Send `request` and decode a JSON body.
pub(crate) async fn send_json<T: DeserializeOwned>(
    service: &'static str,
    request: RequestBuilder,
) -> CollaboratorResult<T> {
    let response = request
        .send()
        .await
        .map_err(|e| CollaboratorError::Network(format!("{service}: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        tracing::debug!(service, status = status.as_u16(), "non-success response");
        return Err(CollaboratorError::Status {
            service,
            status: status.as_u16(),
        });
    }

    response
        .json::<T>()
        .await
        .map_err(|e| CollaboratorError::Payload(format!("{service}: {e}")))
}
