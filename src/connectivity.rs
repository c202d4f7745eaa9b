//! Connectivity Module
//!
//! Process-wide online/offline state with edge-triggered listeners.
//!
//! Platform network callbacks may arrive on any thread, so updates are a
//! single atomic swap: of two racing identical updates only one observes
//! the edge and notifies.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;
use tracing::info;

use crate::ports::NetworkProbe;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectivityState {
    Offline,
    Online,
}

impl ConnectivityState {
    pub fn from_connected(connected: bool) -> Self {
        if connected {
            ConnectivityState::Online
        } else {
            ConnectivityState::Offline
        }
    }
}

impl fmt::Display for ConnectivityState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ConnectivityState::Offline => "offline",
            ConnectivityState::Online => "online",
        })
    }
}

/// A state transition delivered to listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityEvent {
    /// Offline -> Online
    Reconnected,
    /// Online -> Offline
    Disconnected,
}

/// Handle returned by [`ConnectivityMonitor::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Arc<dyn Fn(ConnectivityEvent) + Send + Sync>;

// == Connectivity Monitor ==
pub struct ConnectivityMonitor {
    online: AtomicBool,
    listeners: Mutex<Vec<(ListenerId, Listener)>>,
    next_id: AtomicU64,
}

impl ConnectivityMonitor {
    pub fn new(initial: ConnectivityState) -> Self {
        Self {
            online: AtomicBool::new(initial == ConnectivityState::Online),
            listeners: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(0),
        }
    }

    /// Creates a monitor whose initial state comes from one probe.
    pub async fn from_probe(probe: &dyn NetworkProbe) -> Self {
        let initial = ConnectivityState::from_connected(probe.is_connected().await);
        info!("Initial connectivity: {}", initial);
        Self::new(initial)
    }

    pub fn state(&self) -> ConnectivityState {
        ConnectivityState::from_connected(self.is_online())
    }

    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }

    // == Update ==
    /// Feeds a platform observation. Listeners fire only when the state changes.
    ///
    /// Returns the transition, if there was one.
    pub fn update(&self, connected: bool) -> Option<ConnectivityEvent> {
        let previous = self.online.swap(connected, Ordering::SeqCst);
        if previous == connected {
            return None;
        }

        let event = if connected {
            ConnectivityEvent::Reconnected
        } else {
            ConnectivityEvent::Disconnected
        };
        info!("Connectivity changed: {}", ConnectivityState::from_connected(connected));
        self.notify(event);
        Some(event)
    }

    // == Subscribe ==
    /// Registers a listener for every transition.
    pub fn subscribe<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(ConnectivityEvent) + Send + Sync + 'static,
    {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.lock_listeners().push((id, Arc::new(listener)));
        id
    }

    /// Registers a listener for Offline -> Online transitions only.
    pub fn on_reconnect<F>(&self, listener: F) -> ListenerId
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.subscribe(move |event| {
            if event == ConnectivityEvent::Reconnected {
                listener();
            }
        })
    }

    /// Registers a listener for Online -> Offline transitions only.
    pub fn on_disconnect<F>(&self, listener: F) -> ListenerId
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.subscribe(move |event| {
            if event == ConnectivityEvent::Disconnected {
                listener();
            }
        })
    }

    /// Removes a listener. Returns false if it was already gone.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut listeners = self.lock_listeners();
        let before = listeners.len();
        listeners.retain(|(lid, _)| *lid != id);
        listeners.len() != before
    }

    pub fn listener_count(&self) -> usize {
        self.lock_listeners().len()
    }

    // == Helpers ==
    /// Invokes listeners without holding the lock, re-checking registration
    /// before each call so a listener removed mid-notification is skipped.
    fn notify(&self, event: ConnectivityEvent) {
        let ids: Vec<ListenerId> = self.lock_listeners().iter().map(|(id, _)| *id).collect();

        for id in ids {
            let listener = self
                .lock_listeners()
                .iter()
                .find(|(lid, _)| *lid == id)
                .map(|(_, l)| Arc::clone(l));
            if let Some(listener) = listener {
                listener(event);
            }
        }
    }

    fn lock_listeners(&self) -> MutexGuard<'_, Vec<(ListenerId, Listener)>> {
        // A panicking listener runs outside the lock; recover the list regardless.
        self.listeners.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl fmt::Debug for ConnectivityMonitor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectivityMonitor")
            .field("state", &self.state())
            .field("listeners", &self.listener_count())
            .finish()
    }
}
