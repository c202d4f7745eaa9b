//! Queued Action Module
//!
//! Pending mutation records and the request used to create them.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

// == Action Kind ==
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Create,
    Update,
    Delete,
    Like,
    Comment,
}

// == HTTP Method ==
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Post,
    Put,
    Delete,
    Patch,
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
        })
    }
}

// == Action Id ==
/// Queue-unique action identifier: creation millis plus a random suffix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionId(String);

impl ActionId {
    pub fn generate(now_ms: u64) -> Self {
        let random = Uuid::new_v4().simple().to_string();
        Self(format!("{}-{}", now_ms, &random[..12]))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for ActionId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for ActionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

// == Action Request ==
/// Everything a caller supplies for a new mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRequest {
    pub kind: ActionKind,
    pub method: HttpMethod,
    pub endpoint: String,
    #[serde(default)]
    pub payload: Value,
    /// Falls back to the queue default when unset
    #[serde(default)]
    pub max_retries: Option<u32>,
}

impl ActionRequest {
    pub fn new(
        kind: ActionKind,
        method: HttpMethod,
        endpoint: impl Into<String>,
        payload: Value,
    ) -> Self {
        Self {
            kind,
            method,
            endpoint: endpoint.into(),
            payload,
            max_retries: None,
        }
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }
}

// == Queued Action ==
/// A persisted pending mutation.
///
/// Invariant: `retry_count <= max_retries`. A failure at
/// `retry_count == max_retries` removes the action from the queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueuedAction {
    pub id: ActionId,
    pub kind: ActionKind,
    pub endpoint: String,
    pub method: HttpMethod,
    pub payload: Value,
    /// Unix milliseconds
    pub created_at: u64,
    pub retry_count: u32,
    pub max_retries: u32,
    /// Message from the most recent failed attempt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

impl QueuedAction {
    pub fn from_request(request: ActionRequest, default_max_retries: u32, now_ms: u64) -> Self {
        Self {
            id: ActionId::generate(now_ms),
            kind: request.kind,
            endpoint: request.endpoint,
            method: request.method,
            payload: request.payload,
            created_at: now_ms,
            retry_count: 0,
            max_retries: request.max_retries.unwrap_or(default_max_retries),
            last_error: None,
        }
    }

    /// True when one more failure drops the action.
    pub fn is_last_attempt(&self) -> bool {
        self.retry_count >= self.max_retries
    }
}

// == Dead Letter ==
/// An action archived after exhausting its retries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeadLetter {
    pub action: QueuedAction,
    /// Unix milliseconds
    pub failed_at: u64,
    pub reason: String,
}
