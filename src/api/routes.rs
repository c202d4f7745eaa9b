//! API Routes
//!
//! Configures the Axum router with all facade endpoints.

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    cache_stats_handler, cancel_action_handler, cleanup_cache_handler, clear_cache_handler,
    clear_failed_handler, connectivity_handler, delete_cache_handler, failed_actions_handler,
    get_cache_handler, health_handler, list_actions_handler, perform_action_handler,
    put_cache_handler, set_connectivity_handler, stats_handler, sync_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Middleware
/// - CORS: Allows any origin; the facade only binds loopback
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/cache", put(put_cache_handler).delete(clear_cache_handler))
        .route("/cache/stats", get(cache_stats_handler))
        .route("/cache/cleanup", post(cleanup_cache_handler))
        .route(
            "/cache/:category/:key",
            get(get_cache_handler).delete(delete_cache_handler),
        )
        .route("/actions", post(perform_action_handler).get(list_actions_handler))
        .route(
            "/actions/failed",
            get(failed_actions_handler).delete(clear_failed_handler),
        )
        .route("/actions/:id", delete(cancel_action_handler))
        .route("/sync", post(sync_handler))
        .route(
            "/connectivity",
            get(connectivity_handler).put(set_connectivity_handler),
        )
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
