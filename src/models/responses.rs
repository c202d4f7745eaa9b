//! Response DTOs for the HTTP facade
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::cache::{Category, Payload};
use crate::connectivity::ConnectivityState;
use crate::sync::PerformOutcome;

/// Response body for a cache read (GET /cache/:category/:key)
#[derive(Debug, Clone, Serialize)]
pub struct CachedDataResponse {
    pub key: String,
    pub category: Category,
    pub data: Payload,
}

/// Generic acknowledgement for writes and deletes.
#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Response body for bulk removals (DELETE /cache, DELETE /actions/failed)
#[derive(Debug, Clone, Serialize)]
pub struct ClearResponse {
    pub removed: usize,
}

/// Response body for an action submission (POST /actions)
///
/// `status` is `"executed"` when delivered immediately, `"queued"` otherwise.
#[derive(Debug, Clone, Serialize)]
pub struct PerformResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl From<PerformOutcome> for PerformResponse {
    fn from(outcome: PerformOutcome) -> Self {
        match outcome {
            PerformOutcome::Executed => Self {
                status: "executed",
                id: None,
            },
            PerformOutcome::Queued(id) => Self {
                status: "queued",
                id: Some(id.as_str().to_string()),
            },
        }
    }
}

/// Response body for the connectivity endpoints
#[derive(Debug, Clone, Serialize)]
pub struct ConnectivityResponse {
    pub state: ConnectivityState,
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}
