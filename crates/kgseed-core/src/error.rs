//! Error types for the seed-resolution core.

use thiserror::Error;

/// A failed call to an external collaborator.
///
/// Every variant is transient from the core's point of view: the caller logs it
/// and carries on with whatever data it already has.
#[derive(Debug, Clone, Error)]
pub enum CollaboratorError {
    #[error("network error: {0}")]
    Network(String),
    #[error("{service} returned status {status}")]
    Status { service: &'static str, status: u16 },
    #[error("malformed payload: {0}")]
    Payload(String),
    #[error("collaborator unavailable: {0}")]
    Unavailable(String),
}

pub type CollaboratorResult<T> = Result<T, CollaboratorError>;

/// A request-level failure. Only invalid input aborts a request.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
}
