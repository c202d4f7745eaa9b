//! Background Tasks Module
//!
//! Contains background tasks that run for the lifetime of the service.
//!
//! # Tasks
//! - Cache sweep: removes expired cache entries at configured intervals
//! - Connectivity probe: polls reachability so polled ports publish changes
//! - Network watch: forwards the port's published changes to the monitor
//! - Reconnect sync: drains the action queue whenever connectivity returns

use std::time::Duration;

use tracing::warn;

mod cleanup;
mod network;
mod probe;
mod reconnect;

pub use cleanup::spawn_sweep_task;
pub use network::spawn_network_watch_task;
pub use probe::spawn_probe_task;
pub use reconnect::spawn_reconnect_task;

/// Shortest period a periodic task runs at.
pub const MIN_TASK_INTERVAL: Duration = Duration::from_millis(10);

fn clamp_interval(task: &str, interval: Duration) -> Duration {
    if interval < MIN_TASK_INTERVAL {
        warn!(
            "{} interval {:?} is below {:?}, clamping",
            task, interval, MIN_TASK_INTERVAL
        );
        MIN_TASK_INTERVAL
    } else {
        interval
    }
}
