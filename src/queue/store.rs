//! Action Queue Module
//!
//! Durable FIFO of pending mutations with retry bookkeeping. The whole
//! queue is one storage record so a single write commits each change.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::QueueResult;
use crate::ports::{Clock, Storage};
use crate::queue::{ActionId, ActionRequest, DeadLetter, QueuedAction};

/// Storage key of the pending queue.
pub const QUEUE_KEY: &str = "offline_actions";
/// Storage key of the exhausted-action archive.
pub const DEAD_LETTER_KEY: &str = "offline_actions_failed";

/// Queue shared between the service and the sync engine.
pub type SharedQueue = Arc<Mutex<ActionQueue>>;

/// Result of recording a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureOutcome {
    /// Still queued with the new retry count
    Retrying { retry_count: u32 },
    /// Retries exhausted; removed from the queue
    Dropped,
    /// No action with that id was queued
    Missing,
}

/// Lifetime counters for this process.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct QueueCounters {
    pub enqueued: u64,
    pub succeeded: u64,
    pub failed_attempts: u64,
    pub dropped: u64,
}

// == Action Queue ==
pub struct ActionQueue {
    storage: Arc<dyn Storage>,
    clock: Arc<dyn Clock>,
    default_max_retries: u32,
    /// Zero disables archiving: exhausted actions are silently discarded
    dead_letter_capacity: usize,
    counters: QueueCounters,
}

impl ActionQueue {
    pub fn new(
        storage: Arc<dyn Storage>,
        clock: Arc<dyn Clock>,
        default_max_retries: u32,
        dead_letter_capacity: usize,
    ) -> Self {
        Self {
            storage,
            clock,
            default_max_retries,
            dead_letter_capacity,
            counters: QueueCounters::default(),
        }
    }

    /// Wraps the queue for sharing across tasks.
    pub fn shared(self) -> SharedQueue {
        Arc::new(Mutex::new(self))
    }

    pub fn default_max_retries(&self) -> u32 {
        self.default_max_retries
    }

    pub fn counters(&self) -> QueueCounters {
        self.counters
    }

    // == Enqueue ==
    /// Appends a new action to the end of the queue and returns its id.
    pub async fn enqueue(&mut self, request: ActionRequest) -> QueueResult<ActionId> {
        let action =
            QueuedAction::from_request(request, self.default_max_retries, self.clock.now_ms());
        let id = action.id.clone();

        let mut actions = self.load().await?;
        debug!(
            "Queueing {} {} as {} (position {})",
            action.method,
            action.endpoint,
            id,
            actions.len()
        );
        actions.push(action);
        self.save(&actions).await?;

        self.counters.enqueued += 1;
        Ok(id)
    }

    // == List ==
    /// Full snapshot, oldest first.
    pub async fn list(&self) -> QueueResult<Vec<QueuedAction>> {
        self.load().await
    }

    pub async fn get(&self, id: &ActionId) -> QueueResult<Option<QueuedAction>> {
        Ok(self.load().await?.into_iter().find(|a| &a.id == id))
    }

    pub async fn len(&self) -> QueueResult<usize> {
        Ok(self.load().await?.len())
    }

    pub async fn is_empty(&self) -> QueueResult<bool> {
        Ok(self.len().await? == 0)
    }

    // == Mark Succeeded ==
    /// Removes a delivered action. Returns false if it was not queued.
    pub async fn mark_succeeded(&mut self, id: &ActionId) -> QueueResult<bool> {
        let removed = self.remove_entry(id).await?.is_some();
        if removed {
            self.counters.succeeded += 1;
        }
        Ok(removed)
    }

    // == Mark Failed ==
    /// Records a failed attempt.
    ///
    /// Increments `retry_count`, or drops the action when it had already
    /// reached `max_retries`. Dropped actions go to the dead-letter archive.
    pub async fn mark_failed(&mut self, id: &ActionId, reason: &str) -> QueueResult<FailureOutcome> {
        let mut actions = self.load().await?;
        let Some(index) = actions.iter().position(|a| &a.id == id) else {
            return Ok(FailureOutcome::Missing);
        };
        self.counters.failed_attempts += 1;

        if !actions[index].is_last_attempt() {
            let action = &mut actions[index];
            action.retry_count += 1;
            action.last_error = Some(reason.to_string());
            let retry_count = action.retry_count;
            self.save(&actions).await?;
            debug!("Action {} failed, retry {}", id, retry_count);
            return Ok(FailureOutcome::Retrying { retry_count });
        }

        let mut action = actions.remove(index);
        action.last_error = Some(reason.to_string());
        self.save(&actions).await?;
        self.counters.dropped += 1;
        warn!(
            "Action {} ({} {}) dropped after {} retries: {}",
            id, action.method, action.endpoint, action.max_retries, reason
        );

        // The drop is already committed; a failed archive only loses the audit record.
        if let Err(e) = self.archive(action, reason).await {
            warn!("Failed to archive dropped action {}: {}", id, e);
        }
        Ok(FailureOutcome::Dropped)
    }

    // == Remove ==
    /// Withdraws a pending action. Returns false if it was not queued.
    pub async fn remove(&mut self, id: &ActionId) -> QueueResult<bool> {
        let removed = self.remove_entry(id).await?;
        if let Some(action) = &removed {
            info!("Withdrew queued action {} ({})", id, action.endpoint);
        }
        Ok(removed.is_some())
    }

    // == Dead Letters ==
    /// Archived exhausted actions, oldest first.
    pub async fn dead_letters(&self) -> QueueResult<Vec<DeadLetter>> {
        match self.storage.get_item(DEAD_LETTER_KEY).await? {
            Some(bytes) => Ok(serde_json::from_slice(&bytes)?),
            None => Ok(Vec::new()),
        }
    }

    /// Empties the archive and returns how many records it held.
    pub async fn clear_dead_letters(&mut self) -> QueueResult<usize> {
        let count = self.dead_letters().await?.len();
        self.storage.remove_item(DEAD_LETTER_KEY).await?;
        Ok(count)
    }

    // == Helpers ==
    async fn load(&self) -> QueueResult<Vec<QueuedAction>> {
        match self.storage.get_item(QUEUE_KEY).await? {
            Some(bytes) => Ok(serde_json::from_slice(&bytes)?),
            None => Ok(Vec::new()),
        }
    }

    async fn save(&self, actions: &[QueuedAction]) -> QueueResult<()> {
        let bytes = serde_json::to_vec(actions)?;
        self.storage.set_item(QUEUE_KEY, bytes).await?;
        Ok(())
    }

    async fn remove_entry(&self, id: &ActionId) -> QueueResult<Option<QueuedAction>> {
        let mut actions = self.load().await?;
        let Some(index) = actions.iter().position(|a| &a.id == id) else {
            return Ok(None);
        };
        let action = actions.remove(index);
        self.save(&actions).await?;
        Ok(Some(action))
    }

    async fn archive(&self, action: QueuedAction, reason: &str) -> QueueResult<()> {
        if self.dead_letter_capacity == 0 {
            return Ok(());
        }

        let mut letters = self.dead_letters().await?;
        letters.push(DeadLetter {
            action,
            failed_at: self.clock.now_ms(),
            reason: reason.to_string(),
        });
        if letters.len() > self.dead_letter_capacity {
            let overflow = letters.len() - self.dead_letter_capacity;
            letters.drain(..overflow);
        }

        let bytes = serde_json::to_vec(&letters)?;
        self.storage.set_item(DEAD_LETTER_KEY, bytes).await?;
        Ok(())
    }
}
