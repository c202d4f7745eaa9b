//! Cache Statistics Module
//!
//! Tracks cache performance metrics and the footprint snapshot.

use serde::Serialize;

// == Cache Stats ==
/// Cache footprint plus running counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    /// Number of records in storage, expired ones included
    pub total_items: usize,
    /// Sum of `size_bytes` over all records
    pub total_size: u64,
    /// Records past their expiry (or unreadable) awaiting the sweep
    pub expired_items: usize,
    /// `total_size` formatted for display
    pub human_readable_size: String,
    /// Configured byte budget
    pub max_size: u64,
    /// Number of successful cache retrievals
    pub hits: u64,
    /// Number of failed cache retrievals (absent, expired or unreadable)
    pub misses: u64,
    /// Number of entries evicted by budget enforcement
    pub evictions: u64,
}

impl CacheStats {
    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no requests have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

// == Counters ==
/// Running counters owned by the store.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Counters {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

impl Counters {
    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_evictions(&mut self, count: usize) {
        self.evictions += count as u64;
    }
}

// == Sweep Report ==
/// Outcome of an expiry sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub removed: usize,
    pub freed_bytes: u64,
}

// == Byte Formatting ==
const UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];

/// Formats a byte count as e.g. `"512 B"`, `"1.50 KB"`, `"20.00 MB"`.
pub fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        return format!("{} B", bytes);
    }

    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.2} {}", value, UNITS[unit])
}
