//! Network Watch Task
//!
//! Feeds reachability changes published by the network port into the
//! connectivity monitor.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::connectivity::ConnectivityMonitor;
use crate::ports::NetworkProbe;

/// Subscribes to `network` and applies every published value to `monitor`.
///
/// The current value is applied once at start. The task ends when the port
/// drops its sender; aborting it drops the receiver, which unsubscribes.
pub fn spawn_network_watch_task(
    monitor: Arc<ConnectivityMonitor>,
    network: Arc<dyn NetworkProbe>,
) -> JoinHandle<()> {
    let mut rx = network.subscribe();

    tokio::spawn(async move {
        info!("Network watch task started");

        loop {
            let connected = *rx.borrow_and_update();
            monitor.update(connected);

            if rx.changed().await.is_err() {
                debug!("Network status sender closed, stopping watch");
                break;
            }
        }
    })
}
