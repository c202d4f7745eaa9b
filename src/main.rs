//! Offline Sync daemon
//!
//! Runs the offline layer as a loopback service: file-backed storage, an
//! HTTP transport to the backend, and a TCP reachability probe.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use offline_sync::api::{create_router, AppState};
use offline_sync::ports::{FileStorage, HttpTransport, NetworkProbe, SystemClock, TcpProbe};
use offline_sync::{
    spawn_network_watch_task, spawn_probe_task, spawn_reconnect_task, spawn_sweep_task, Config,
    ConnectivityMonitor, OfflineService,
};

/// Main entry point for the offline sync daemon.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Open storage, build the transport and probe the network once
/// 4. Start the sweep, probe, network watch and reconnect tasks
/// 5. Serve the HTTP facade on loopback
/// 6. Handle graceful shutdown on SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "offline_sync=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Offline Sync");

    let config = Config::from_env();
    info!(
        "Configuration loaded: max_cache_size={}, default_ttl={}s, max_retries={}, port={}, backend={}",
        config.max_cache_size,
        config.default_ttl,
        config.max_retries,
        config.server_port,
        config.api_base_url
    );

    let storage = FileStorage::open(&config.data_dir)
        .await
        .with_context(|| format!("failed to open data dir {}", config.data_dir))?;
    let transport = HttpTransport::new(config.api_base_url.clone(), config.transport_timeout())
        .context("failed to build HTTP transport")?;
    let probe: Arc<dyn NetworkProbe> = Arc::new(TcpProbe::new(
        config.probe_addr.clone(),
        config.probe_timeout(),
    ));

    let connectivity = Arc::new(ConnectivityMonitor::from_probe(probe.as_ref()).await);

    let service = OfflineService::new(
        &config,
        Arc::new(storage),
        Arc::new(transport),
        connectivity.clone(),
        Arc::new(SystemClock),
    );

    let tasks = vec![
        spawn_sweep_task(service.cache().clone(), config.sweep_interval()),
        spawn_network_watch_task(connectivity, probe.clone()),
        spawn_probe_task(probe, config.probe_interval()),
        spawn_reconnect_task(service.engine().clone(), |_| {}),
    ];
    info!("Background tasks started");

    // Drain anything left over from a previous run
    let report = service.sync_offline_actions().await;
    if report.attempted() > 0 {
        info!(
            "Startup sync: {} succeeded, {} failed",
            report.succeeded, report.failed
        );
    }

    let app = create_router(AppState::new(service));

    let addr = SocketAddr::from(([127, 0, 0, 1], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Facade listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(tasks))
        .await
        .context("server error")?;

    info!("Shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM), then aborts background tasks.
async fn shutdown_signal(tasks: Vec<JoinHandle<()>>) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }

    for task in &tasks {
        task.abort();
    }
    warn!("Background tasks aborted");
}
