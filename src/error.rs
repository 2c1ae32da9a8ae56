//! Error types for the cache
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::cache::EventKind;

/// Error returned by a listener to abort dispatch.
pub type ListenerError = Box<dyn std::error::Error + Send + Sync + 'static>;

// == Cache Error Enum ==
/// Unified error type for the cache.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Listener registration named an event kind that does not exist
    #[error("Unknown event: {0}")]
    UnknownEvent(String),

    /// A listener failed; remaining listeners for the event were skipped
    #[error("Listener for '{event}' event failed: {source}")]
    Listener {
        event: EventKind,
        #[source]
        source: ListenerError,
    },

    /// Key not found in cache (or expired)
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::NotFound(_) => StatusCode::NOT_FOUND,
            CacheError::UnknownEvent(_) | CacheError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            CacheError::Listener { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;
