//! Request DTOs for the HTTP facade
//!
//! Defines the structure of incoming HTTP request bodies. Action submissions
//! deserialize straight into [`ActionRequest`](crate::queue::ActionRequest).

use serde::Deserialize;

use crate::cache::{Category, Payload, MAX_KEY_LENGTH};

/// Request body for caching a payload (PUT /cache)
///
/// # Fields
/// - `key`: Identifier within the category
/// - `category`: One of the fixed cache categories
/// - `data`: Any JSON value
/// - `ttl_ms`: Optional TTL in milliseconds; absent uses the default, 0 never expires
#[derive(Debug, Clone, Deserialize)]
pub struct CacheRequest {
    pub key: String,
    pub category: Category,
    pub data: Payload,
    #[serde(default)]
    pub ttl_ms: Option<u64>,
}

impl CacheRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.key.is_empty() {
            return Some("Key cannot be empty".to_string());
        }
        if self.key.len() > MAX_KEY_LENGTH {
            return Some(format!(
                "Key exceeds maximum length of {} bytes",
                MAX_KEY_LENGTH
            ));
        }
        None
    }
}

/// Request body for a platform network-change event (PUT /connectivity)
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ConnectivityRequest {
    pub online: bool,
}
