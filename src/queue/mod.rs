//! Queue Module
//!
//! Durable ordered list of pending mutations awaiting delivery.

mod action;
mod store;

pub use action::{ActionId, ActionKind, ActionRequest, DeadLetter, HttpMethod, QueuedAction};
pub use store::{ActionQueue, FailureOutcome, QueueCounters, SharedQueue, DEAD_LETTER_KEY, QUEUE_KEY};
