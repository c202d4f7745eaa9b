//! Reconnect Sync Task
//!
//! Turns Offline -> Online transitions into queue drains. Listeners may be
//! invoked on any thread, so the listener only signals a channel and the
//! drain itself runs on this task.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::connectivity::{ConnectivityMonitor, ListenerId};
use crate::sync::{SyncEngine, SyncReport};

/// Unsubscribes the reconnect listener when the task ends or is aborted.
struct ListenerGuard {
    monitor: Arc<ConnectivityMonitor>,
    id: ListenerId,
}

impl Drop for ListenerGuard {
    fn drop(&mut self) {
        self.monitor.unsubscribe(self.id);
    }
}

/// Spawns the task and registers its reconnect listener.
///
/// Every reconnect runs `sync()` once. `on_report` receives each drain's
/// result, e.g. so a UI can confirm when `succeeded > 0`.
pub fn spawn_reconnect_task<F>(engine: Arc<SyncEngine>, on_report: F) -> JoinHandle<()>
where
    F: Fn(SyncReport) + Send + Sync + 'static,
{
    let (tx, mut rx) = mpsc::unbounded_channel();
    let monitor = engine.connectivity().clone();
    let id = monitor.on_reconnect(move || {
        let _ = tx.send(());
    });
    let guard = ListenerGuard { monitor, id };

    tokio::spawn(async move {
        let _guard = guard;
        info!("Reconnect sync task started");

        while rx.recv().await.is_some() {
            debug!("Connectivity restored, draining action queue");
            let report = engine.sync().await;
            if report.succeeded > 0 {
                info!("Reconnect sync delivered {} actions", report.succeeded);
            }
            on_report(report);
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connectivity::{ConnectivityMonitor, ConnectivityState};
    use crate::error::TransportError;
    use crate::ports::{ManualClock, MemoryStorage, Transport};
    use crate::queue::{ActionKind, ActionQueue, ActionRequest, HttpMethod};
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Default)]
    struct CountingTransport(AtomicUsize);

    #[async_trait]
    impl Transport for CountingTransport {
        async fn execute(&self, _: HttpMethod, _: &str, _: &Value) -> Result<(), TransportError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_reconnect_triggers_one_sync_per_transition() {
        let transport = Arc::new(CountingTransport::default());
        let monitor = Arc::new(ConnectivityMonitor::new(ConnectivityState::Offline));
        let queue = ActionQueue::new(
            Arc::new(MemoryStorage::new()),
            Arc::new(ManualClock::new(0)),
            3,
            10,
        )
        .shared();
        let engine = Arc::new(SyncEngine::new(queue, transport.clone(), monitor.clone()));

        let reports = Arc::new(AtomicUsize::new(0));
        let seen = reports.clone();
        let handle = spawn_reconnect_task(engine.clone(), move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        });

        engine
            .perform_action(ActionRequest::new(
                ActionKind::Like,
                HttpMethod::Post,
                "/posts/1/like",
                json!({}),
            ))
            .await
            .unwrap();

        monitor.update(true);
        monitor.update(true);
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(reports.load(Ordering::SeqCst), 1);
        assert_eq!(transport.0.load(Ordering::SeqCst), 1);
        assert!(engine.queue().lock().await.is_empty().await.unwrap());

        // A disconnect alone triggers nothing; the next reconnect drains again
        monitor.update(false);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(reports.load(Ordering::SeqCst), 1);

        monitor.update(true);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(reports.load(Ordering::SeqCst), 2);

        handle.abort();
    }

    #[tokio::test]
    async fn test_abort_unsubscribes_the_listener() {
        let monitor = Arc::new(ConnectivityMonitor::new(ConnectivityState::Offline));
        let queue = ActionQueue::new(
            Arc::new(MemoryStorage::new()),
            Arc::new(ManualClock::new(0)),
            3,
            10,
        )
        .shared();
        let engine = Arc::new(SyncEngine::new(
            queue,
            Arc::new(CountingTransport::default()),
            monitor.clone(),
        ));

        let handle = spawn_reconnect_task(engine, |_| {});
        assert_eq!(monitor.listener_count(), 1);

        handle.abort();
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(monitor.listener_count(), 0);
    }
}
