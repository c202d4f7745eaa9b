//! Stats Reporter
//!
//! Read-only aggregation over the cache and the action queue.

use std::sync::Arc;

use serde::Serialize;

use crate::cache::{CacheStats, SharedCache};
use crate::connectivity::ConnectivityState;
use crate::error::{CacheError, QueueError};
use crate::ports::Clock;
use crate::queue::{QueueCounters, QueuedAction, SharedQueue};

/// Number of failing actions listed by default.
pub const DEFAULT_TOP_FAILURES: usize = 5;

/// A queued action that has failed at least once.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailureSummary {
    pub id: String,
    pub endpoint: String,
    pub retry_count: u32,
    pub max_retries: u32,
    pub last_error: Option<String>,
}

impl From<&QueuedAction> for FailureSummary {
    fn from(action: &QueuedAction) -> Self {
        Self {
            id: action.id.to_string(),
            endpoint: action.endpoint.clone(),
            retry_count: action.retry_count,
            max_retries: action.max_retries,
            last_error: action.last_error.clone(),
        }
    }
}

/// Combined snapshot of the offline layer.
#[derive(Debug, Clone, Serialize)]
pub struct OfflineStats {
    pub connectivity: ConnectivityState,
    pub cache: CacheStats,
    pub queued_actions: usize,
    pub failed_actions: usize,
    /// Age of the oldest pending action in milliseconds
    pub oldest_pending_ms: Option<u64>,
    pub queue_counters: QueueCounters,
    pub top_failures: Vec<FailureSummary>,
}

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error(transparent)]
    Cache(#[from] CacheError),
    #[error(transparent)]
    Queue(#[from] QueueError),
}

// == Stats Reporter ==
#[derive(Clone)]
pub struct StatsReporter {
    cache: SharedCache,
    queue: SharedQueue,
    clock: Arc<dyn Clock>,
    top_failures: usize,
}

impl StatsReporter {
    pub fn new(cache: SharedCache, queue: SharedQueue, clock: Arc<dyn Clock>) -> Self {
        Self {
            cache,
            queue,
            clock,
            top_failures: DEFAULT_TOP_FAILURES,
        }
    }

    pub fn with_top_failures(mut self, count: usize) -> Self {
        self.top_failures = count;
        self
    }

    pub async fn report(&self, connectivity: ConnectivityState) -> Result<OfflineStats, ReportError> {
        let cache = self.cache.write().await.stats().await?;

        let (pending, failed_actions, queue_counters) = {
            let queue = self.queue.lock().await;
            (
                queue.list().await?,
                queue.dead_letters().await?.len(),
                queue.counters(),
            )
        };

        let now = self.clock.now_ms();
        let oldest_pending_ms = pending
            .iter()
            .map(|a| a.created_at)
            .min()
            .map(|created| now.saturating_sub(created));

        Ok(OfflineStats {
            connectivity,
            cache,
            queued_actions: pending.len(),
            failed_actions,
            oldest_pending_ms,
            queue_counters,
            top_failures: top_failures(&pending, self.top_failures),
        })
    }
}

/// Actions with the most retries first; ties keep queue order.
fn top_failures(pending: &[QueuedAction], limit: usize) -> Vec<FailureSummary> {
    let mut failing: Vec<&QueuedAction> = pending.iter().filter(|a| a.retry_count > 0).collect();
    failing.sort_by(|a, b| b.retry_count.cmp(&a.retry_count));
    failing.into_iter().take(limit).map(FailureSummary::from).collect()
}
