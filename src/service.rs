//! Offline Service
//!
//! The UI-facing API: one handle bundling the cache, the action queue, the
//! sync engine and the stats reporter, constructed from injected ports.

use std::sync::Arc;

use tracing::info;

use crate::cache::{CacheStats, CacheStore, Category, Payload, SharedCache, SweepReport};
use crate::config::Config;
use crate::connectivity::ConnectivityMonitor;
use crate::error::{CacheResult, QueueResult};
use crate::ports::{Clock, Storage, Transport};
use crate::queue::{ActionId, ActionQueue, ActionRequest, DeadLetter, QueuedAction};
use crate::reporter::{OfflineStats, ReportError, StatsReporter};
use crate::sync::{PerformOutcome, SyncEngine, SyncReport};

#[derive(Clone)]
pub struct OfflineService {
    cache: SharedCache,
    engine: Arc<SyncEngine>,
    reporter: StatsReporter,
    default_ttl_ms: u64,
}

impl OfflineService {
    pub fn new(
        config: &Config,
        storage: Arc<dyn Storage>,
        transport: Arc<dyn Transport>,
        connectivity: Arc<ConnectivityMonitor>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let cache = CacheStore::new(storage.clone(), clock.clone(), config.max_cache_size).shared();
        let queue = ActionQueue::new(
            storage,
            clock.clone(),
            config.max_retries,
            config.dead_letter_capacity,
        )
        .shared();
        let reporter = StatsReporter::new(cache.clone(), queue.clone(), clock);
        let engine = Arc::new(SyncEngine::new(queue, transport, connectivity));

        Self {
            cache,
            engine,
            reporter,
            default_ttl_ms: config.default_ttl_ms(),
        }
    }

    pub fn cache(&self) -> &SharedCache {
        &self.cache
    }

    pub fn engine(&self) -> &Arc<SyncEngine> {
        &self.engine
    }

    pub fn connectivity(&self) -> &Arc<ConnectivityMonitor> {
        self.engine.connectivity()
    }

    // == Cache ==
    /// Caches `data`; `ttl_ms` of `None` uses the configured default, `Some(0)` never expires.
    pub async fn cache_data(
        &self,
        key: &str,
        category: Category,
        data: Payload,
        ttl_ms: Option<u64>,
    ) -> CacheResult<()> {
        let ttl = ttl_ms.unwrap_or(self.default_ttl_ms);
        self.cache.write().await.put(key, category, data, ttl).await
    }

    pub async fn get_cached_data(&self, key: &str, category: Category) -> Option<Payload> {
        self.cache.write().await.get(key, category).await
    }

    pub async fn remove_cached_data(&self, key: &str, category: Category) -> CacheResult<()> {
        self.cache.write().await.remove(key, category).await
    }

    pub async fn get_cache_stats(&self) -> CacheResult<CacheStats> {
        self.cache.write().await.stats().await
    }

    pub async fn cleanup_expired_cache(&self) -> CacheResult<SweepReport> {
        self.cache.write().await.sweep_expired().await
    }

    pub async fn clear_all_cache(&self) -> CacheResult<usize> {
        self.cache.write().await.clear_all().await
    }

    // == Actions ==
    pub async fn perform_offline_action(
        &self,
        request: ActionRequest,
    ) -> QueueResult<PerformOutcome> {
        self.engine.perform_action(request).await
    }

    pub async fn get_offline_actions(&self) -> QueueResult<Vec<QueuedAction>> {
        self.engine.queue().lock().await.list().await
    }

    /// Withdraws a queued action that no drain has reached yet.
    pub async fn cancel_offline_action(&self, id: &ActionId) -> QueueResult<bool> {
        self.engine.queue().lock().await.remove(id).await
    }

    pub async fn get_failed_actions(&self) -> QueueResult<Vec<DeadLetter>> {
        self.engine.queue().lock().await.dead_letters().await
    }

    pub async fn clear_failed_actions(&self) -> QueueResult<usize> {
        self.engine.queue().lock().await.clear_dead_letters().await
    }

    /// Drains the queue once. Surfacing a confirmation when
    /// `succeeded > 0` is left to the caller.
    pub async fn sync_offline_actions(&self) -> SyncReport {
        let report = self.engine.sync().await;
        if report.succeeded > 0 {
            info!("{} offline actions synced", report.succeeded);
        }
        report
    }

    // == Stats ==
    pub async fn stats(&self) -> Result<OfflineStats, ReportError> {
        self.reporter.report(self.connectivity().state()).await
    }
}
