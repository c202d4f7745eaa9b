//! Expiry Sweep Task
//!
//! Background task that periodically removes expired cache entries.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::clamp_interval;
use crate::cache::{format_bytes, SharedCache};

/// Spawns a background task that periodically sweeps expired cache entries.
///
/// The task sleeps for `interval` between runs and takes the cache write
/// lock for each sweep, the same lock explicit cache operations use.
/// Intervals below [`MIN_TASK_INTERVAL`](super::MIN_TASK_INTERVAL) are
/// clamped.
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown.
pub fn spawn_sweep_task(cache: SharedCache, interval: Duration) -> JoinHandle<()> {
    let interval = clamp_interval("Cache sweep", interval);

    tokio::spawn(async move {
        info!("Starting cache sweep task with interval of {:?}", interval);

        loop {
            tokio::time::sleep(interval).await;

            let result = {
                let mut cache_guard = cache.write().await;
                cache_guard.sweep_expired().await
            };

            match result {
                Ok(report) if report.removed > 0 => info!(
                    "Cache sweep: removed {} expired entries, freed {}",
                    report.removed,
                    format_bytes(report.freed_bytes)
                ),
                Ok(_) => debug!("Cache sweep: no expired entries found"),
                Err(e) => warn!("Cache sweep failed: {}", e),
            }
        }
    })
}
