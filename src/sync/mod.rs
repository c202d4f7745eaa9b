//! Sync Module
//!
//! Connectivity-aware execution and replay of queued mutations.

mod engine;

pub use engine::{PerformOutcome, SyncEngine, SyncReport};
