//! Shared test doubles for the integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::watch;

use offline_sync::connectivity::{ConnectivityMonitor, ConnectivityState};
use offline_sync::error::TransportError;
use offline_sync::ports::{ManualClock, MemoryStorage, NetworkProbe, Storage, Transport};
use offline_sync::queue::HttpMethod;
use offline_sync::{Config, OfflineService};

/// One delivered request, as the backend saw it.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub method: HttpMethod,
    pub endpoint: String,
    pub payload: Value,
}

/// Transport that replays scripted results, then succeeds.
#[derive(Default)]
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Result<(), TransportError>>>,
    always_fail: Mutex<bool>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push(&self, result: Result<(), TransportError>) {
        self.script.lock().unwrap().push_back(result);
    }

    /// Every request fails with a network error until turned off.
    pub fn set_down(&self, down: bool) {
        *self.always_fail.lock().unwrap() = down;
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn endpoints(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.endpoint).collect()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn execute(
        &self,
        method: HttpMethod,
        endpoint: &str,
        payload: &Value,
    ) -> Result<(), TransportError> {
        self.calls.lock().unwrap().push(Call {
            method,
            endpoint: endpoint.to_string(),
            payload: payload.clone(),
        });

        if *self.always_fail.lock().unwrap() {
            return Err(TransportError::NetworkFailure("backend down".to_string()));
        }
        self.script.lock().unwrap().pop_front().unwrap_or(Ok(()))
    }
}

/// Network port driven by the test, the way platform events would push it.
pub struct FakeNetwork(watch::Sender<bool>);

impl FakeNetwork {
    pub fn new(connected: bool) -> Arc<Self> {
        Arc::new(Self(watch::channel(connected).0))
    }

    pub fn set(&self, connected: bool) {
        self.0.send_replace(connected);
    }
}

#[async_trait]
impl NetworkProbe for FakeNetwork {
    async fn is_connected(&self) -> bool {
        *self.0.borrow()
    }

    fn subscribe(&self) -> watch::Receiver<bool> {
        self.0.subscribe()
    }
}

/// A service over in-memory storage with every port reachable from the test.
pub struct Harness {
    pub service: OfflineService,
    pub storage: Arc<dyn Storage>,
    pub transport: Arc<ScriptedTransport>,
    pub clock: Arc<ManualClock>,
    pub monitor: Arc<ConnectivityMonitor>,
}

impl Harness {
    pub fn new(initial: ConnectivityState) -> Self {
        Self::with(initial, Config::default(), Arc::new(MemoryStorage::new()))
    }

    pub fn with(initial: ConnectivityState, config: Config, storage: Arc<dyn Storage>) -> Self {
        let transport = ScriptedTransport::new();
        let clock = Arc::new(ManualClock::new(1_000_000));
        let monitor = Arc::new(ConnectivityMonitor::new(initial));
        let service = OfflineService::new(
            &config,
            storage.clone(),
            transport.clone(),
            monitor.clone(),
            clock.clone(),
        );

        Self {
            service,
            storage,
            transport,
            clock,
            monitor,
        }
    }
}
