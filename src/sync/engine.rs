//! Sync Engine
//!
//! Executes mutations immediately when online, queues them otherwise, and
//! drains the queue through the transport when asked (typically on reconnect).
//!
//! ## Drain rules
//!
//! - One drain at a time: a `sync()` that arrives while another is running
//!   returns an empty report without touching the queue.
//! - Strictly sequential, oldest first, one outstanding transport call.
//! - A failing action never blocks the ones behind it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::connectivity::ConnectivityMonitor;
use crate::error::QueueResult;
use crate::ports::Transport;
use crate::queue::{ActionId, ActionRequest, FailureOutcome, QueuedAction, SharedQueue};

/// What happened to a submitted action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PerformOutcome {
    /// Delivered right away; nothing was queued
    Executed,
    /// Stored for a later drain
    Queued(ActionId),
}

/// Aggregate result of one drain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub succeeded: u32,
    pub failed: u32,
    /// Failures that exhausted their retries during this drain
    pub dropped: u32,
}

impl SyncReport {
    pub fn attempted(&self) -> u32 {
        self.succeeded + self.failed
    }
}

// == Drain Guard ==
/// Holds the draining flag; clears it on drop, including on early return.
struct DrainGuard<'a>(&'a AtomicBool);

impl<'a> DrainGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

// == Sync Engine ==
pub struct SyncEngine {
    queue: SharedQueue,
    transport: Arc<dyn Transport>,
    connectivity: Arc<ConnectivityMonitor>,
    draining: AtomicBool,
}

impl SyncEngine {
    pub fn new(
        queue: SharedQueue,
        transport: Arc<dyn Transport>,
        connectivity: Arc<ConnectivityMonitor>,
    ) -> Self {
        Self {
            queue,
            transport,
            connectivity,
            draining: AtomicBool::new(false),
        }
    }

    pub fn queue(&self) -> &SharedQueue {
        &self.queue
    }

    pub fn connectivity(&self) -> &Arc<ConnectivityMonitor> {
        &self.connectivity
    }

    pub fn is_draining(&self) -> bool {
        self.draining.load(Ordering::Acquire)
    }

    // == Perform Action ==
    /// Executes `request` now if online, otherwise (or on failure) queues it.
    ///
    /// Errors only when the action could not be queued, in which case the
    /// caller still owns it.
    pub async fn perform_action(&self, request: ActionRequest) -> QueueResult<PerformOutcome> {
        if self.connectivity.is_online() {
            match self
                .transport
                .execute(request.method, &request.endpoint, &request.payload)
                .await
            {
                Ok(()) => {
                    debug!("{} {} delivered immediately", request.method, request.endpoint);
                    return Ok(PerformOutcome::Executed);
                }
                Err(e) => {
                    warn!(
                        "{} {} failed, queueing for retry: {}",
                        request.method, request.endpoint, e
                    );
                }
            }
        } else {
            debug!("Offline, queueing {} {}", request.method, request.endpoint);
        }

        let id = self.queue.lock().await.enqueue(request).await?;
        Ok(PerformOutcome::Queued(id))
    }

    // == Sync ==
    /// Drains the queue once.
    ///
    /// Returns an empty report when another drain is running, when offline,
    /// or when the queue cannot be read.
    pub async fn sync(&self) -> SyncReport {
        let Some(_guard) = DrainGuard::acquire(&self.draining) else {
            debug!("Sync already in progress, skipping");
            return SyncReport::default();
        };

        if !self.connectivity.is_online() {
            debug!("Offline, nothing to sync");
            return SyncReport::default();
        }

        let pending = match self.queue.lock().await.list().await {
            Ok(pending) => pending,
            Err(e) => {
                error!("Cannot read action queue: {}", e);
                return SyncReport::default();
            }
        };
        if pending.is_empty() {
            return SyncReport::default();
        }

        info!("Draining {} queued actions", pending.len());
        let mut report = SyncReport::default();
        for action in pending {
            if !self.still_queued(&action).await {
                debug!("Action {} withdrawn before delivery", action.id);
                continue;
            }
            self.deliver(&action, &mut report).await;
        }

        info!(
            "Sync finished: {} succeeded, {} failed, {} dropped",
            report.succeeded, report.failed, report.dropped
        );
        report
    }

    // == Helpers ==
    async fn still_queued(&self, action: &QueuedAction) -> bool {
        match self.queue.lock().await.get(&action.id).await {
            Ok(found) => found.is_some(),
            // Attempt anyway; the mark below reports the storage problem
            Err(_) => true,
        }
    }

    async fn deliver(&self, action: &QueuedAction, report: &mut SyncReport) {
        let result = self
            .transport
            .execute(action.method, &action.endpoint, &action.payload)
            .await;

        let mut queue = self.queue.lock().await;
        match result {
            Ok(()) => {
                report.succeeded += 1;
                if let Err(e) = queue.mark_succeeded(&action.id).await {
                    warn!("Delivered {} but could not dequeue it: {}", action.id, e);
                }
            }
            Err(transport_error) => {
                report.failed += 1;
                match queue
                    .mark_failed(&action.id, &transport_error.to_string())
                    .await
                {
                    Ok(FailureOutcome::Dropped) => report.dropped += 1,
                    Ok(_) => {}
                    Err(e) => warn!("Could not record failure of {}: {}", action.id, e),
                }
            }
        }
    }
}
