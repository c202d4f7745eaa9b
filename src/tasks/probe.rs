//! Connectivity Probe Task
//!
//! Polls a [`NetworkProbe`] on an interval. Polled ports publish the result
//! to their subscribers, which the network watch task forwards to the
//! monitor.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use super::clamp_interval;
use crate::ports::NetworkProbe;

pub fn spawn_probe_task(network: Arc<dyn NetworkProbe>, interval: Duration) -> JoinHandle<()> {
    let interval = clamp_interval("Connectivity probe", interval);

    tokio::spawn(async move {
        info!("Starting connectivity probe with interval of {:?}", interval);
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            let connected = network.is_connected().await;
            debug!("Connectivity probe: connected={}", connected);
        }
    })
}
