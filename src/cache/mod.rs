//! Cache Module
//!
//! Provides persistent read-through caching with TTL expiration and
//! oldest-first eviction under a byte budget.

mod entry;
mod stats;
mod store;


// Re-export public types
pub use entry::{payload_size, storage_key, CacheEntry, Category, Payload};
pub use stats::{format_bytes, CacheStats, SweepReport};
pub use store::{CacheStore, SharedCache};

// == Public Constants ==
/// Maximum allowed key length in bytes
pub const MAX_KEY_LENGTH: usize = 256;
