//! Offline Sync - an offline-first durability layer
//!
//! Caches read data with TTL and a byte budget, queues mutations made while
//! disconnected, and replays them in order once connectivity returns.

pub mod api;
pub mod cache;
pub mod config;
pub mod connectivity;
pub mod error;
pub mod models;
pub mod ports;
pub mod queue;
pub mod reporter;
pub mod service;
pub mod sync;
pub mod tasks;

pub use api::AppState;
pub use config::Config;
pub use connectivity::{ConnectivityMonitor, ConnectivityState};
pub use service::OfflineService;
pub use tasks::{
    spawn_network_watch_task, spawn_probe_task, spawn_reconnect_task, spawn_sweep_task,
};
