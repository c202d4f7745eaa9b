//! Cache Entry Module
//!
//! Defines the persisted cache record and the category namespace.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Opaque cached payload.
pub type Payload = Value;

// == Category ==
/// Namespace a cache entry belongs to. Keys are unique per category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Insect,
    Post,
    User,
    Discovery,
    Chat,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Insect,
        Category::Post,
        Category::User,
        Category::Discovery,
        Category::Chat,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Insect => "insect",
            Category::Post => "post",
            Category::User => "user",
            Category::Discovery => "discovery",
            Category::Chat => "chat",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("unknown category '{}'", s))
    }
}

// == Cache Entry ==
/// A single persisted cache record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub key: String,
    pub category: Category,
    pub payload: Payload,
    /// Creation timestamp (Unix milliseconds)
    pub created_at: u64,
    /// Expiration timestamp (Unix milliseconds), None = no expiration
    pub expires_at: Option<u64>,
    /// Serialized length of `payload`
    pub size_bytes: u64,
    /// Insertion order assigned by the store; breaks `created_at` ties
    #[serde(default)]
    pub seq: u64,
}

impl CacheEntry {
    // == Constructor ==
    /// Builds an entry created at `now`. A `ttl_ms` of zero means no expiry.
    pub fn new(
        key: impl Into<String>,
        category: Category,
        payload: Payload,
        now: u64,
        ttl_ms: u64,
    ) -> serde_json::Result<Self> {
        let size_bytes = payload_size(&payload)?;
        let expires_at = (ttl_ms > 0).then(|| now.saturating_add(ttl_ms));

        Ok(Self {
            key: key.into(),
            category,
            payload,
            created_at: now,
            expires_at,
            size_bytes,
            seq: 0,
        })
    }

    // == Is Expired ==
    /// Checks if the entry has expired at `now`.
    ///
    /// An entry is expired once `now >= expires_at`; both the read path and
    /// the sweep go through here.
    pub fn is_expired_at(&self, now: u64) -> bool {
        match self.expires_at {
            Some(expires) => now >= expires,
            None => false,
        }
    }

    /// Remaining TTL in milliseconds, `Some(0)` once expired, `None` if unbounded.
    pub fn ttl_remaining_ms(&self, now: u64) -> Option<u64> {
        self.expires_at.map(|expires| expires.saturating_sub(now))
    }

    /// Storage key for this entry.
    pub fn storage_key(&self) -> String {
        storage_key(self.category, &self.key)
    }
}

/// Prefix shared by every cache record in storage.
pub const STORAGE_PREFIX: &str = "cache:";

/// Storage key for `(category, key)`.
pub fn storage_key(category: Category, key: &str) -> String {
    format!("{}{}:{}", STORAGE_PREFIX, category, key)
}

/// Byte length of the serialized payload.
pub fn payload_size(payload: &Payload) -> serde_json::Result<u64> {
    serde_json::to_vec(payload).map(|bytes| bytes.len() as u64)
}
