//! Tests for the admission middleware.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{Request, StatusCode};
use axum::middleware::from_fn_with_state;
use axum::routing::get;
use http_body_util::BodyExt;
use tower::ServiceExt;

use yearly_bingo::admission::RequestMeta;
use yearly_bingo::{
    AdmissionLayer, InMemoryCounterStore, RateLimitConfig, WindowedAdmissionController, enforce_admission,
};

fn app(limit: u64, layer: impl FnOnce(AdmissionLayer) -> AdmissionLayer) -> Router {
    let gate = WindowedAdmissionController::new(
        InMemoryCounterStore::new(),
        RateLimitConfig::new(limit, Duration::from_secs(60), "rl:test"),
    );
    let layer = layer(AdmissionLayer::new(Arc::new(gate)));
    Router::new()
        .route("/cards", get(|| async { "ok" }))
        .layer(from_fn_with_state(layer, enforce_admission))
}

fn request_from(ip: &str) -> Request<Body> {
    Request::builder()
        .uri("/cards")
        .header("x-forwarded-for", format!("{}, 10.0.0.1", ip))
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn test_admitted_response_carries_headers() {
    let app = app(2, |l| l);
    let response = app.oneshot(request_from("203.0.113.9")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-ratelimit-limit"], "2");
    assert_eq!(response.headers()["x-ratelimit-remaining"], "1");
    assert!(response.headers().contains_key("x-ratelimit-reset"));
    assert!(!response.headers().contains_key("retry-after"));
}

#[tokio::test]
async fn test_rejection_is_429_with_error_body() {
    let app = app(1, |l| l);
    let first = app.clone().oneshot(request_from("203.0.113.9")).await.unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    let second = app.clone().oneshot(request_from("203.0.113.9")).await.unwrap();
    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(second.headers()["x-ratelimit-remaining"], "0");
    assert!(second.headers().contains_key("retry-after"));
    let body = second.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json, serde_json::json!({ "error": "Rate limit exceeded" }));

    // The first forwarded address is the key; a different client passes.
    let other = app.oneshot(request_from("198.51.100.4")).await.unwrap();
    assert_eq!(other.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_remote_address_used_without_proxy_headers() {
    let app = app(1, |l| l);
    let addr: SocketAddr = "192.0.2.10:5000".parse().unwrap();
    let build = || {
        let mut req = Request::builder().uri("/cards").body(Body::empty()).unwrap();
        req.extensions_mut().insert(ConnectInfo(addr));
        req
    };
    assert_eq!(app.clone().oneshot(build()).await.unwrap().status(), StatusCode::OK);
    assert_eq!(
        app.oneshot(build()).await.unwrap().status(),
        StatusCode::TOO_MANY_REQUESTS
    );
}

fn by_user(request: &RequestMeta<'_>) -> String {
    request
        .headers()
        .get("x-user-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

#[tokio::test]
async fn test_custom_key_with_empty_fallback() {
    let app = app(1, |l| l.with_key(by_user));

    let as_user = |ip: &str| {
        let mut req = request_from(ip);
        req.headers_mut().insert("x-user-id", "u-1".parse().unwrap());
        req
    };
    // Same user from two addresses shares one budget.
    assert_eq!(app.clone().oneshot(as_user("203.0.113.1")).await.unwrap().status(), StatusCode::OK);
    assert_eq!(
        app.clone().oneshot(as_user("203.0.113.2")).await.unwrap().status(),
        StatusCode::TOO_MANY_REQUESTS
    );
    // No user id: keyed by address instead.
    assert_eq!(app.oneshot(request_from("203.0.113.1")).await.unwrap().status(), StatusCode::OK);
}
