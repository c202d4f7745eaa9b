//! Error types for the offline layer
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Storage Error ==
/// Failure reported by a [`Storage`](crate::ports::Storage) adapter.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Underlying I/O failed for a key
    #[error("I/O error on key '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    /// The backing store has no room left
    #[error("storage quota exceeded: {used} of {limit} bytes in use")]
    QuotaExceeded { used: u64, limit: u64 },
}

// == Cache Error ==
/// Errors surfaced by the cache store.
///
/// Read paths never return these; they degrade to a miss instead.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Storage layer could not complete the operation
    #[error("cache storage failure: {0}")]
    StorageFailure(#[from] StorageError),

    /// Payload or record could not be (de)serialized
    #[error("cache serialization failure: {0}")]
    SerializationFailure(#[from] serde_json::Error),

    /// Key is empty or too long
    #[error("invalid cache key: {0}")]
    InvalidKey(String),

    /// A single payload is larger than the whole cache budget
    #[error("entry of {size} bytes exceeds cache budget of {limit} bytes")]
    EntryTooLarge { size: u64, limit: u64 },
}

// == Queue Error ==
/// Errors surfaced by the action queue.
#[derive(Error, Debug)]
pub enum QueueError {
    /// Storage layer could not complete the operation
    #[error("queue storage failure: {0}")]
    StorageFailure(#[from] StorageError),

    /// Persisted queue could not be decoded
    #[error("queue record corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

// == Transport Error ==
/// Errors returned by a [`Transport`](crate::ports::Transport).
///
/// The sync engine treats both variants the same way: the action's retry
/// counter is bumped and it stays queued until exhausted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Request never produced a usable response (offline, timeout, 5xx)
    #[error("network failure: {0}")]
    NetworkFailure(String),

    /// Backend refused the request
    #[error("rejected with status {status}: {message}")]
    Rejected { status: u16, message: String },
}

// == API Error ==
/// Error type for the HTTP facade handlers.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Queue(#[from] QueueError),
}

impl From<crate::reporter::ReportError> for ApiError {
    fn from(err: crate::reporter::ReportError) -> Self {
        match err {
            crate::reporter::ReportError::Cache(e) => ApiError::Cache(e),
            crate::reporter::ReportError::Queue(e) => ApiError::Queue(e),
        }
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Cache(CacheError::InvalidKey(_))
            | ApiError::Cache(CacheError::EntryTooLarge { .. }) => StatusCode::BAD_REQUEST,
            ApiError::Cache(CacheError::StorageFailure(_))
            | ApiError::Queue(QueueError::StorageFailure(_)) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Cache(CacheError::SerializationFailure(_))
            | ApiError::Queue(QueueError::Corrupt(_)) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Aliases ==
/// Convenience Result type for cache operations.
pub type CacheResult<T> = std::result::Result<T, CacheError>;

/// Convenience Result type for queue operations.
pub type QueueResult<T> = std::result::Result<T, QueueError>;

/// Convenience Result type for HTTP handlers.
pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_error_converts_into_cache_error() {
        let err: CacheError = StorageError::QuotaExceeded { used: 10, limit: 5 }.into();
        assert!(matches!(err, CacheError::StorageFailure(_)));
        assert!(err.to_string().contains("quota exceeded"));
    }

    #[test]
    fn test_api_error_status_codes() {
        let cases = vec![
            (ApiError::InvalidRequest("x".into()), StatusCode::BAD_REQUEST),
            (ApiError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (
                ApiError::Cache(CacheError::InvalidKey("".into())),
                StatusCode::BAD_REQUEST,
            ),
            (
                ApiError::Queue(QueueError::StorageFailure(StorageError::QuotaExceeded {
                    used: 1,
                    limit: 1,
                })),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }
}
