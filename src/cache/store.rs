//! Cache Store Module
//!
//! Persistent cache engine with per-entry TTL and a global byte budget.
//! Eviction order is insertion order; reads never refresh an entry.
//!
//! Record metadata is indexed in memory on first use, so budget checks,
//! sweeps and stats never re-read payloads. The store must be the only
//! writer of `cache:` keys in its storage.

use std::collections::HashMap;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::cache::entry::{storage_key, STORAGE_PREFIX};
use crate::cache::stats::{format_bytes, Counters};
use crate::cache::{CacheEntry, CacheStats, Category, Payload, SweepReport, MAX_KEY_LENGTH};
use crate::error::{CacheError, CacheResult};
use crate::ports::{Clock, Storage};

/// Cache store shared between the service and the sweep task.
///
/// Every mutation, including the background sweep and post-put eviction,
/// goes through the same lock.
pub type SharedCache = Arc<RwLock<CacheStore>>;

/// Indexed metadata for one record in storage.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Slot {
    Live {
        created_at: u64,
        seq: u64,
        expires_at: Option<u64>,
        size_bytes: u64,
    },
    /// Present in storage but not decodable; counted as expired
    Unreadable { raw_len: u64 },
}

impl Slot {
    fn from_entry(entry: &CacheEntry) -> Self {
        Slot::Live {
            created_at: entry.created_at,
            seq: entry.seq,
            expires_at: entry.expires_at,
            size_bytes: entry.size_bytes,
        }
    }

    fn size(&self) -> u64 {
        match *self {
            Slot::Live { size_bytes, .. } => size_bytes,
            Slot::Unreadable { raw_len } => raw_len,
        }
    }

    /// Same rule as [`CacheEntry::is_expired_at`], plus unreadable records.
    fn is_stale_at(&self, now: u64) -> bool {
        match *self {
            Slot::Live { expires_at, .. } => expires_at.is_some_and(|expires| now >= expires),
            Slot::Unreadable { .. } => true,
        }
    }
}

// == Cache Store ==
/// Main cache storage with TTL expiry and size-budget eviction.
pub struct CacheStore {
    storage: Arc<dyn Storage>,
    clock: Arc<dyn Clock>,
    /// Byte budget over all payloads
    max_size: u64,
    counters: Counters,
    index: HashMap<String, Slot>,
    indexed: bool,
    next_seq: u64,
}

impl CacheStore {
    // == Constructor ==
    /// Creates a new CacheStore over `storage` with a byte budget of `max_size`.
    pub fn new(storage: Arc<dyn Storage>, clock: Arc<dyn Clock>, max_size: u64) -> Self {
        Self {
            storage,
            clock,
            max_size,
            counters: Counters::default(),
            index: HashMap::new(),
            indexed: false,
            next_seq: 0,
        }
    }

    /// Wraps the store for sharing across tasks.
    pub fn shared(self) -> SharedCache {
        Arc::new(RwLock::new(self))
    }

    pub fn max_size(&self) -> u64 {
        self.max_size
    }

    /// Size the budget enforcer evicts down to (80% of the budget).
    pub fn eviction_target(&self) -> u64 {
        self.max_size.saturating_mul(4) / 5
    }

    // == Put ==
    /// Stores `payload` under `(category, key)`.
    ///
    /// A `ttl_ms` of zero means the entry never expires. Any existing entry
    /// with the same `(category, key)` is replaced and moves to the back of
    /// the eviction order. Budget enforcement runs after the write and never
    /// evicts the entry just written.
    pub async fn put(
        &mut self,
        key: &str,
        category: Category,
        payload: Payload,
        ttl_ms: u64,
    ) -> CacheResult<()> {
        validate_key(key)?;
        self.ensure_index().await?;

        let mut entry = CacheEntry::new(key, category, payload, self.clock.now_ms(), ttl_ms)?;
        if entry.size_bytes > self.max_size {
            return Err(CacheError::EntryTooLarge {
                size: entry.size_bytes,
                limit: self.max_size,
            });
        }
        entry.seq = self.next_seq;

        let skey = entry.storage_key();
        let bytes = serde_json::to_vec(&entry)?;
        self.storage.set_item(&skey, bytes).await?;
        self.next_seq += 1;
        self.index.insert(skey.clone(), Slot::from_entry(&entry));
        debug!(
            "Cached {}/{} ({} bytes, expires_at={:?})",
            category, key, entry.size_bytes, entry.expires_at
        );

        // The write itself succeeded; a failed eviction pass is retried on the next put.
        if let Err(e) = self.evict_over_budget(Some(&skey)).await {
            warn!("Cache budget enforcement failed after put: {}", e);
        }

        Ok(())
    }

    // == Get ==
    /// Retrieves the payload for `(category, key)`.
    ///
    /// Returns `None` when the entry is absent, expired or unreadable, and
    /// on storage failure. Expired and unreadable records are deleted on the way out.
    pub async fn get(&mut self, key: &str, category: Category) -> Option<Payload> {
        let skey = storage_key(category, key);

        let bytes = match self.storage.get_item(&skey).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                self.index.remove(&skey);
                self.counters.record_miss();
                return None;
            }
            Err(e) => {
                warn!("Cache read failed for {}: {}", skey, e);
                self.counters.record_miss();
                return None;
            }
        };

        let entry: CacheEntry = match serde_json::from_slice(&bytes) {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Discarding unreadable cache record {}: {}", skey, e);
                self.discard(&skey).await;
                self.counters.record_miss();
                return None;
            }
        };

        if entry.is_expired_at(self.clock.now_ms()) {
            debug!("Cache entry {} expired, removing", skey);
            self.discard(&skey).await;
            self.counters.record_miss();
            return None;
        }

        // Picks up records skipped by an earlier failed read
        if self.indexed {
            self.index
                .entry(skey)
                .or_insert_with(|| Slot::from_entry(&entry));
        }
        self.counters.record_hit();
        Some(entry.payload)
    }

    /// Typed variant of [`get`](Self::get); a payload of the wrong shape is a miss.
    pub async fn get_as<T: DeserializeOwned>(&mut self, key: &str, category: Category) -> Option<T> {
        let payload = self.get(key, category).await?;
        match serde_json::from_value(payload) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Cached {}/{} has unexpected shape: {}", category, key, e);
                None
            }
        }
    }

    // == Remove ==
    /// Removes `(category, key)`. Removing an absent entry succeeds.
    pub async fn remove(&mut self, key: &str, category: Category) -> CacheResult<()> {
        let skey = storage_key(category, key);
        self.storage.remove_item(&skey).await?;
        self.index.remove(&skey);
        Ok(())
    }

    // == Sweep Expired ==
    /// Removes every expired or undecodable record.
    ///
    /// Records that could not be read because of an I/O error are left alone.
    pub async fn sweep_expired(&mut self) -> CacheResult<SweepReport> {
        self.ensure_index().await?;
        let now = self.clock.now_ms();

        let mut doomed = Vec::new();
        let mut freed_bytes = 0;
        for (skey, slot) in &self.index {
            if slot.is_stale_at(now) {
                freed_bytes += slot.size();
                doomed.push(skey.clone());
            }
        }

        if doomed.is_empty() {
            return Ok(SweepReport::default());
        }

        self.storage.multi_remove(&doomed).await?;
        for skey in &doomed {
            self.index.remove(skey);
        }

        let report = SweepReport {
            removed: doomed.len(),
            freed_bytes,
        };
        info!(
            "Cache sweep removed {} entries ({})",
            report.removed,
            format_bytes(report.freed_bytes)
        );
        Ok(report)
    }

    // == Enforce Budget ==
    /// Evicts the oldest entries while the total exceeds the budget.
    ///
    /// Once triggered, eviction continues until the total is at or below
    /// [`eviction_target`](Self::eviction_target). Returns the number evicted.
    pub async fn enforce_budget(&mut self) -> CacheResult<usize> {
        self.ensure_index().await?;
        self.evict_over_budget(None).await
    }

    // == Clear All ==
    /// Removes every cache record regardless of expiry. Returns how many were removed.
    pub async fn clear_all(&mut self) -> CacheResult<usize> {
        let keys = self.cache_keys().await?;
        self.storage.multi_remove(&keys).await?;
        self.index.clear();
        self.indexed = true;
        info!("Cleared {} cache entries", keys.len());
        Ok(keys.len())
    }

    // == Stats ==
    /// Returns a footprint snapshot plus running counters.
    pub async fn stats(&mut self) -> CacheResult<CacheStats> {
        self.ensure_index().await?;
        let now = self.clock.now_ms();

        let total_size: u64 = self.index.values().map(Slot::size).sum();
        let expired_items = self.index.values().filter(|s| s.is_stale_at(now)).count();

        Ok(CacheStats {
            total_items: self.index.len(),
            total_size,
            expired_items,
            human_readable_size: format_bytes(total_size),
            max_size: self.max_size,
            hits: self.counters.hits,
            misses: self.counters.misses,
            evictions: self.counters.evictions,
        })
    }

    // == Helpers ==
    async fn cache_keys(&self) -> CacheResult<Vec<String>> {
        Ok(self
            .storage
            .get_all_keys()
            .await?
            .into_iter()
            .filter(|k| k.starts_with(STORAGE_PREFIX))
            .collect())
    }

    /// Builds the index from storage the first time it is needed.
    ///
    /// Undecodable records are indexed as unreadable so the sweep removes
    /// them; records that fail with an I/O error are skipped.
    async fn ensure_index(&mut self) -> CacheResult<()> {
        if self.indexed {
            return Ok(());
        }

        let mut index = HashMap::new();
        let mut next_seq = 0;
        for skey in self.cache_keys().await? {
            match self.storage.get_item(&skey).await {
                Ok(Some(bytes)) => match serde_json::from_slice::<CacheEntry>(&bytes) {
                    Ok(entry) => {
                        next_seq = next_seq.max(entry.seq + 1);
                        index.insert(skey, Slot::from_entry(&entry));
                    }
                    Err(_) => {
                        index.insert(
                            skey,
                            Slot::Unreadable {
                                raw_len: bytes.len() as u64,
                            },
                        );
                    }
                },
                // Removed between listing and reading
                Ok(None) => {}
                Err(e) => warn!("Skipping cache record {} while indexing: {}", skey, e),
            }
        }

        debug!("Indexed {} cache records", index.len());
        self.index = index;
        self.next_seq = self.next_seq.max(next_seq);
        self.indexed = true;
        Ok(())
    }

    /// Budget pass over the index. `protect` is never evicted.
    async fn evict_over_budget(&mut self, protect: Option<&str>) -> CacheResult<usize> {
        let mut live: Vec<(u64, u64, String, u64)> = self
            .index
            .iter()
            .filter_map(|(skey, slot)| match *slot {
                Slot::Live {
                    created_at,
                    seq,
                    size_bytes,
                    ..
                } => Some((created_at, seq, skey.clone(), size_bytes)),
                Slot::Unreadable { .. } => None,
            })
            .collect();

        let mut total: u64 = live.iter().map(|(_, _, _, size)| size).sum();
        if total <= self.max_size {
            return Ok(0);
        }

        // Oldest first; the insertion sequence breaks same-millisecond ties
        live.sort();
        let target = self.eviction_target();
        let mut evicted = Vec::new();
        for (_, _, skey, size) in live {
            if total <= target {
                break;
            }
            if protect == Some(skey.as_str()) {
                continue;
            }
            total -= size;
            evicted.push(skey);
        }

        self.storage.multi_remove(&evicted).await?;
        for skey in &evicted {
            self.index.remove(skey);
        }
        self.counters.record_evictions(evicted.len());
        info!(
            "Cache over budget: evicted {} entries, {} remaining",
            evicted.len(),
            format_bytes(total)
        );
        Ok(evicted.len())
    }

    async fn discard(&mut self, storage_key: &str) {
        match self.storage.remove_item(storage_key).await {
            Ok(()) => {
                self.index.remove(storage_key);
            }
            Err(e) => warn!("Failed to remove cache record {}: {}", storage_key, e),
        }
    }
}

fn validate_key(key: &str) -> CacheResult<()> {
    if key.is_empty() {
        return Err(CacheError::InvalidKey("key cannot be empty".to_string()));
    }
    if key.len() > MAX_KEY_LENGTH {
        return Err(CacheError::InvalidKey(format!(
            "key exceeds maximum length of {} bytes",
            MAX_KEY_LENGTH
        )));
    }
    Ok(())
}
