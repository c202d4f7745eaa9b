//! API Handlers
//!
//! HTTP request handlers for each facade endpoint. Every handler is a thin
//! shim over [`OfflineService`].

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::cache::{CacheStats, Category, SweepReport};
use crate::error::{ApiError, ApiResult};
use crate::models::{
    CacheRequest, CachedDataResponse, ClearResponse, ConnectivityRequest, ConnectivityResponse,
    HealthResponse, MessageResponse, PerformResponse,
};
use crate::queue::{ActionId, ActionRequest, DeadLetter, QueuedAction};
use crate::reporter::OfflineStats;
use crate::service::OfflineService;
use crate::sync::{PerformOutcome, SyncReport};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: OfflineService,
}

impl AppState {
    pub fn new(service: OfflineService) -> Self {
        Self { service }
    }
}

// == Cache ==

/// Handler for PUT /cache
pub async fn put_cache_handler(
    State(state): State<AppState>,
    Json(req): Json<CacheRequest>,
) -> ApiResult<Json<MessageResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(ApiError::InvalidRequest(error_msg));
    }

    state
        .service
        .cache_data(&req.key, req.category, req.data, req.ttl_ms)
        .await?;

    Ok(Json(MessageResponse::new(format!(
        "Cached '{}' in {}",
        req.key, req.category
    ))))
}

/// Handler for GET /cache/:category/:key
///
/// Expired, corrupt and unreadable entries all answer 404.
pub async fn get_cache_handler(
    State(state): State<AppState>,
    Path((category, key)): Path<(Category, String)>,
) -> ApiResult<Json<CachedDataResponse>> {
    let data = state
        .service
        .get_cached_data(&key, category)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("{}/{}", category, key)))?;

    Ok(Json(CachedDataResponse {
        key,
        category,
        data,
    }))
}

/// Handler for DELETE /cache/:category/:key
pub async fn delete_cache_handler(
    State(state): State<AppState>,
    Path((category, key)): Path<(Category, String)>,
) -> ApiResult<Json<MessageResponse>> {
    state.service.remove_cached_data(&key, category).await?;
    Ok(Json(MessageResponse::new(format!(
        "Removed '{}' from {}",
        key, category
    ))))
}

/// Handler for DELETE /cache
pub async fn clear_cache_handler(State(state): State<AppState>) -> ApiResult<Json<ClearResponse>> {
    let removed = state.service.clear_all_cache().await?;
    Ok(Json(ClearResponse { removed }))
}

/// Handler for POST /cache/cleanup
pub async fn cleanup_cache_handler(
    State(state): State<AppState>,
) -> ApiResult<Json<SweepReport>> {
    Ok(Json(state.service.cleanup_expired_cache().await?))
}

/// Handler for GET /cache/stats
pub async fn cache_stats_handler(State(state): State<AppState>) -> ApiResult<Json<CacheStats>> {
    Ok(Json(state.service.get_cache_stats().await?))
}

// == Actions ==

/// Handler for POST /actions
///
/// Answers 200 when delivered immediately and 202 when queued.
pub async fn perform_action_handler(
    State(state): State<AppState>,
    Json(req): Json<ActionRequest>,
) -> ApiResult<(StatusCode, Json<PerformResponse>)> {
    if req.endpoint.trim().is_empty() {
        return Err(ApiError::InvalidRequest(
            "Endpoint cannot be empty".to_string(),
        ));
    }

    let outcome = state.service.perform_offline_action(req).await?;
    let status = match outcome {
        PerformOutcome::Executed => StatusCode::OK,
        PerformOutcome::Queued(_) => StatusCode::ACCEPTED,
    };

    Ok((status, Json(outcome.into())))
}

/// Handler for GET /actions
pub async fn list_actions_handler(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<QueuedAction>>> {
    Ok(Json(state.service.get_offline_actions().await?))
}

/// Handler for DELETE /actions/:id
pub async fn cancel_action_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    let id = ActionId::from(id);
    if !state.service.cancel_offline_action(&id).await? {
        return Err(ApiError::NotFound(format!("action {}", id)));
    }
    Ok(Json(MessageResponse::new(format!("Cancelled action {}", id))))
}

/// Handler for GET /actions/failed
pub async fn failed_actions_handler(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<DeadLetter>>> {
    Ok(Json(state.service.get_failed_actions().await?))
}

/// Handler for DELETE /actions/failed
pub async fn clear_failed_handler(State(state): State<AppState>) -> ApiResult<Json<ClearResponse>> {
    let removed = state.service.clear_failed_actions().await?;
    Ok(Json(ClearResponse { removed }))
}

/// Handler for POST /sync
pub async fn sync_handler(State(state): State<AppState>) -> Json<SyncReport> {
    Json(state.service.sync_offline_actions().await)
}

// == Connectivity ==

/// Handler for GET /connectivity
pub async fn connectivity_handler(State(state): State<AppState>) -> Json<ConnectivityResponse> {
    Json(ConnectivityResponse {
        state: state.service.connectivity().state(),
    })
}

/// Handler for PUT /connectivity
///
/// Entry point for platform network-change callbacks.
pub async fn set_connectivity_handler(
    State(state): State<AppState>,
    Json(req): Json<ConnectivityRequest>,
) -> Json<ConnectivityResponse> {
    let monitor = state.service.connectivity();
    monitor.update(req.online);
    Json(ConnectivityResponse {
        state: monitor.state(),
    })
}

// == Stats / Health ==

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> ApiResult<Json<OfflineStats>> {
    Ok(Json(state.service.stats().await?))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::connectivity::{ConnectivityMonitor, ConnectivityState};
    use crate::error::TransportError;
    use crate::ports::{MemoryStorage, SystemClock, Transport};
    use crate::queue::{ActionKind, HttpMethod};
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::Arc;

    struct AcceptAll;

    #[async_trait]
    impl Transport for AcceptAll {
        async fn execute(&self, _: HttpMethod, _: &str, _: &Value) -> Result<(), TransportError> {
            Ok(())
        }
    }

    fn test_state(initial: ConnectivityState) -> AppState {
        AppState::new(OfflineService::new(
            &Config::default(),
            Arc::new(MemoryStorage::new()),
            Arc::new(AcceptAll),
            Arc::new(ConnectivityMonitor::new(initial)),
            Arc::new(SystemClock),
        ))
    }

    fn like_request() -> ActionRequest {
        ActionRequest::new(ActionKind::Like, HttpMethod::Post, "/posts/7/like", json!({}))
    }

    #[tokio::test]
    async fn test_put_and_get_cache_handler() {
        let state = test_state(ConnectivityState::Online);

        let req = CacheRequest {
            key: "feed".to_string(),
            category: Category::Post,
            data: json!([{"id": 1}]),
            ttl_ms: None,
        };
        assert!(put_cache_handler(State(state.clone()), Json(req)).await.is_ok());

        let response = get_cache_handler(
            State(state),
            Path((Category::Post, "feed".to_string())),
        )
        .await
        .unwrap();
        assert_eq!(response.data, json!([{"id": 1}]));
    }

    #[tokio::test]
    async fn test_get_missing_entry() {
        let state = test_state(ConnectivityState::Online);

        let result = get_cache_handler(State(state), Path((Category::User, "nobody".to_string()))).await;
        assert!(matches!(result, Err(ApiError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_put_invalid_request() {
        let state = test_state(ConnectivityState::Online);

        let req = CacheRequest {
            key: String::new(),
            category: Category::Chat,
            data: json!("hi"),
            ttl_ms: None,
        };
        let result = put_cache_handler(State(state), Json(req)).await;
        assert!(matches!(result, Err(ApiError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_perform_action_status_follows_connectivity() {
        let online = test_state(ConnectivityState::Online);
        let (status, _) = perform_action_handler(State(online), Json(like_request()))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::OK);

        let offline = test_state(ConnectivityState::Offline);
        let (status, body) = perform_action_handler(State(offline.clone()), Json(like_request()))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(body.status, "queued");

        let listed = list_actions_handler(State(offline)).await.unwrap();
        assert_eq!(listed.len(), 1);
    }

    #[tokio::test]
    async fn test_cancel_unknown_action() {
        let state = test_state(ConnectivityState::Offline);

        let result = cancel_action_handler(State(state), Path("0-missing".to_string())).await;
        assert!(matches!(result, Err(ApiError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_set_connectivity_handler() {
        let state = test_state(ConnectivityState::Offline);

        let response =
            set_connectivity_handler(State(state.clone()), Json(ConnectivityRequest { online: true }))
                .await;
        assert_eq!(response.state, ConnectivityState::Online);
        assert!(state.service.connectivity().is_online());
    }

    #[tokio::test]
    async fn test_health_handler() {
        let response = health_handler().await;
        assert_eq!(response.status, "healthy");
    }
}
