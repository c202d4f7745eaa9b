//! Network status port
//!
//! Reports whether the backend looks reachable and publishes changes through
//! a `watch` channel. Push-capable platform adapters send on the channel as
//! events arrive; polled adapters such as [`TcpProbe`] publish from
//! `is_connected`, which the probe task calls on an interval.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::TcpStream;
use tokio::sync::watch;

#[async_trait]
pub trait NetworkProbe: Send + Sync {
    /// Checks reachability now.
    async fn is_connected(&self) -> bool;

    /// Receiver that observes every published reachability change.
    /// Dropping it unsubscribes.
    fn subscribe(&self) -> watch::Receiver<bool>;
}

// == TCP Probe ==
/// Considers the network up when a TCP connection to `addr` opens in time.
#[derive(Debug, Clone)]
pub struct TcpProbe {
    addr: String,
    timeout: Duration,
    status: Arc<watch::Sender<bool>>,
}

impl TcpProbe {
    /// `timeout` bounds each connect attempt.
    pub fn new(addr: impl Into<String>, timeout: Duration) -> Self {
        let (status, _) = watch::channel(false);
        Self {
            addr: addr.into(),
            timeout,
            status: Arc::new(status),
        }
    }
}

#[async_trait]
impl NetworkProbe for TcpProbe {
    async fn is_connected(&self) -> bool {
        let up = matches!(
            tokio::time::timeout(self.timeout, TcpStream::connect(&self.addr)).await,
            Ok(Ok(_))
        );
        self.status.send_if_modified(|current| {
            let changed = *current != up;
            *current = up;
            changed
        });
        up
    }

    fn subscribe(&self) -> watch::Receiver<bool> {
        self.status.subscribe()
    }
}
