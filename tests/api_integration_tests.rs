//! Integration Tests for API Endpoints
//!
//! Tests full request/response cycle for each facade endpoint.

mod support;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use offline_sync::{api::create_router, AppState, ConnectivityState};
use serde_json::Value;
use tower::ServiceExt;

use support::Harness;

// == Helper Functions ==

fn create_test_app(initial: ConnectivityState) -> (Router, Harness) {
    let harness = Harness::new(initial);
    let app = create_router(AppState::new(harness.service.clone()));
    (app, harness)
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn json_request(method: &str, uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

// == Cache Endpoint Tests ==

#[tokio::test]
async fn test_put_then_get_cache_entry() {
    let (app, _) = create_test_app(ConnectivityState::Online);

    let put_response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            "/cache",
            r#"{"key":"beetle-42","category":"insect","data":{"name":"Stag beetle","legs":6}}"#,
        ))
        .await
        .unwrap();
    assert_eq!(put_response.status(), StatusCode::OK);

    let get_response = app
        .oneshot(empty_request("GET", "/cache/insect/beetle-42"))
        .await
        .unwrap();

    assert_eq!(get_response.status(), StatusCode::OK);
    let json = body_to_json(get_response.into_body()).await;
    assert_eq!(json["key"], "beetle-42");
    assert_eq!(json["category"], "insect");
    assert_eq!(json["data"]["legs"], 6);
}

#[tokio::test]
async fn test_categories_are_separate_namespaces() {
    let (app, _) = create_test_app(ConnectivityState::Online);

    let _ = app
        .clone()
        .oneshot(json_request(
            "PUT",
            "/cache",
            r#"{"key":"42","category":"post","data":"a post"}"#,
        ))
        .await
        .unwrap();

    let response = app
        .oneshot(empty_request("GET", "/cache/user/42"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_ttl_expiration_via_api() {
    let (app, harness) = create_test_app(ConnectivityState::Online);

    let put_response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            "/cache",
            r#"{"key":"room-1","category":"chat","data":["hi"],"ttl_ms":1000}"#,
        ))
        .await
        .unwrap();
    assert_eq!(put_response.status(), StatusCode::OK);

    let get_response = app
        .clone()
        .oneshot(empty_request("GET", "/cache/chat/room-1"))
        .await
        .unwrap();
    assert_eq!(get_response.status(), StatusCode::OK);

    harness.clock.advance(1_000);

    let get_response = app
        .oneshot(empty_request("GET", "/cache/chat/room-1"))
        .await
        .unwrap();
    assert_eq!(get_response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_cache_entry() {
    let (app, _) = create_test_app(ConnectivityState::Online);

    let _ = app
        .clone()
        .oneshot(json_request(
            "PUT",
            "/cache",
            r#"{"key":"me","category":"user","data":{"id":1}}"#,
        ))
        .await
        .unwrap();

    let del_response = app
        .clone()
        .oneshot(empty_request("DELETE", "/cache/user/me"))
        .await
        .unwrap();
    assert_eq!(del_response.status(), StatusCode::OK);

    let get_response = app
        .oneshot(empty_request("GET", "/cache/user/me"))
        .await
        .unwrap();
    assert_eq!(get_response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_cleanup_and_clear_endpoints() {
    let (app, harness) = create_test_app(ConnectivityState::Online);

    for body in [
        r#"{"key":"a","category":"discovery","data":1,"ttl_ms":500}"#,
        r#"{"key":"b","category":"discovery","data":2,"ttl_ms":0}"#,
    ] {
        let response = app.clone().oneshot(json_request("PUT", "/cache", body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
    harness.clock.advance(600);

    let response = app
        .clone()
        .oneshot(empty_request("POST", "/cache/cleanup"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["removed"], 1);

    let response = app
        .oneshot(empty_request("DELETE", "/cache"))
        .await
        .unwrap();
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["removed"], 1);
}

#[tokio::test]
async fn test_cache_stats_endpoint() {
    let (app, _) = create_test_app(ConnectivityState::Online);

    let _ = app
        .clone()
        .oneshot(json_request(
            "PUT",
            "/cache",
            r#"{"key":"feed","category":"post","data":[1,2,3]}"#,
        ))
        .await
        .unwrap();

    // Hit
    let _ = app
        .clone()
        .oneshot(empty_request("GET", "/cache/post/feed"))
        .await
        .unwrap();

    // Miss
    let _ = app
        .clone()
        .oneshot(empty_request("GET", "/cache/post/missing"))
        .await
        .unwrap();

    let response = app
        .oneshot(empty_request("GET", "/cache/stats"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;

    assert_eq!(json["total_items"], 1);
    assert_eq!(json["hits"], 1);
    assert_eq!(json["misses"], 1);
    assert_eq!(json["expired_items"], 0);
    assert!(json["total_size"].as_u64().unwrap() > 0);
    assert!(json.get("human_readable_size").is_some());
}

// == Action Endpoint Tests ==

#[tokio::test]
async fn test_action_executes_immediately_when_online() {
    let (app, harness) = create_test_app(ConnectivityState::Online);

    let response = app
        .oneshot(json_request(
            "POST",
            "/actions",
            r#"{"kind":"like","method":"POST","endpoint":"/posts/9/like"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["status"], "executed");
    assert_eq!(harness.transport.endpoints(), vec!["/posts/9/like"]);
}

#[tokio::test]
async fn test_offline_action_queues_then_syncs() {
    let (app, harness) = create_test_app(ConnectivityState::Offline);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/actions",
            r#"{"kind":"create","method":"POST","endpoint":"/posts","payload":{"title":"Moth at dusk"}}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["status"], "queued");
    assert!(harness.transport.calls().is_empty());

    let response = app
        .clone()
        .oneshot(empty_request("GET", "/actions"))
        .await
        .unwrap();
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json.as_array().unwrap().len(), 1);
    assert_eq!(json[0]["retry_count"], 0);
    assert_eq!(json[0]["max_retries"], 3);

    let response = app
        .clone()
        .oneshot(json_request("PUT", "/connectivity", r#"{"online":true}"#))
        .await
        .unwrap();
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["state"], "online");

    let response = app
        .clone()
        .oneshot(empty_request("POST", "/sync"))
        .await
        .unwrap();
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["succeeded"], 1);
    assert_eq!(json["failed"], 0);

    let response = app.oneshot(empty_request("GET", "/actions")).await.unwrap();
    let json = body_to_json(response.into_body()).await;
    assert!(json.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_cancel_queued_action() {
    let (app, _) = create_test_app(ConnectivityState::Offline);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/actions",
            r#"{"kind":"delete","method":"DELETE","endpoint":"/posts/3"}"#,
        ))
        .await
        .unwrap();
    let json = body_to_json(response.into_body()).await;
    let id = json["id"].as_str().unwrap().to_string();

    let response = app
        .clone()
        .oneshot(empty_request("DELETE", &format!("/actions/{}", id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(empty_request("DELETE", &format!("/actions/{}", id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_failed_actions_endpoints() {
    let (app, _) = create_test_app(ConnectivityState::Online);

    let response = app
        .clone()
        .oneshot(empty_request("GET", "/actions/failed"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert!(json.as_array().unwrap().is_empty());

    let response = app
        .oneshot(empty_request("DELETE", "/actions/failed"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["removed"], 0);
}

// == Stats / Health Endpoint Tests ==

#[tokio::test]
async fn test_offline_stats_endpoint() {
    let (app, _) = create_test_app(ConnectivityState::Offline);

    let _ = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/actions",
            r#"{"kind":"comment","method":"POST","endpoint":"/posts/1/comments","payload":{"text":"nice"}}"#,
        ))
        .await
        .unwrap();

    let response = app.oneshot(empty_request("GET", "/stats")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["connectivity"], "offline");
    assert_eq!(json["queued_actions"], 1);
    assert_eq!(json["failed_actions"], 0);
    assert!(json.get("cache").is_some());
}

#[tokio::test]
async fn test_health_endpoint() {
    let (app, _) = create_test_app(ConnectivityState::Online);

    let response = app.oneshot(empty_request("GET", "/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["status"].as_str().unwrap(), "healthy");
    assert!(json.get("timestamp").is_some());
}

// == Error Response Tests ==

#[tokio::test]
async fn test_invalid_json_request() {
    let (app, _) = create_test_app(ConnectivityState::Online);

    let response = app
        .oneshot(json_request("PUT", "/cache", r#"{"invalid json"#))
        .await
        .unwrap();

    // Axum returns 422 for JSON parsing errors by default
    assert!(
        response.status() == StatusCode::BAD_REQUEST
            || response.status() == StatusCode::UNPROCESSABLE_ENTITY
    );
}

#[tokio::test]
async fn test_empty_key_request() {
    let (app, _) = create_test_app(ConnectivityState::Online);

    let response = app
        .oneshot(json_request(
            "PUT",
            "/cache",
            r#"{"key":"","category":"user","data":"x"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_to_json(response.into_body()).await;
    assert!(json.get("error").is_some());
}

