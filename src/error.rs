//! Error types for the record store
//!
//! Provides a closed set of error kinds using thiserror. Every variant carries
//! owned strings so one outcome can be cloned out to every coalesced caller.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Store Error Enum ==
/// Unified error type for the record store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Key or namespace absent from the store
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Record exists but its TTL has elapsed
    #[error("Key expired: {0}")]
    Expired(String),

    /// Invalid key, value or undecodable bytes
    #[error("Bad value: {0}")]
    BadValue(String),

    /// Every write attempt failed
    #[error("Failed to put key {key}: {reason}")]
    WriteFailed { key: String, reason: String },

    /// Engine failure outside of the write path (open, read, delete)
    #[error("Engine error: {0}")]
    Engine(String),

    /// A memoized computation returned an error
    #[error("Computation failed: {0}")]
    Compute(String),
}

impl StoreError {
    /// True for the two outcomes that make `memoize` recompute.
    pub fn is_miss(&self) -> bool {
        matches!(self, StoreError::NotFound(_) | StoreError::Expired(_))
    }
}

impl From<heed::Error> for StoreError {
    fn from(e: heed::Error) -> Self {
        StoreError::Engine(e.to_string())
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for StoreError {
    fn into_response(self) -> Response {
        let status = match &self {
            StoreError::NotFound(_) | StoreError::Expired(_) => StatusCode::NOT_FOUND,
            StoreError::BadValue(_) => StatusCode::BAD_REQUEST,
            StoreError::WriteFailed { .. } | StoreError::Engine(_) | StoreError::Compute(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = Json(ErrorResponse::new(self.to_string()));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the record store.
pub type Result<T> = std::result::Result<T, StoreError>;
