#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use biolens_access::{RateLimiter, SessionManager};
use biolens_api::config::{RateLimitConfig, ServerConfig, SessionConfig};
use biolens_api::router::build_app_router;
use biolens_api::state::AppState;
use biolens_core::clock::{ManualClock, SharedClock};
use biolens_store::{Store, StoreConfig};

/// A valid UUID that no test ever creates.
pub const UNKNOWN_SESSION_ID: &str = "3f2b8c1e-9a4d-4e7f-8b21-0c5d6e7f8a9b";

/// Build a test `ServerConfig` with safe defaults.
///
/// Uses `http://localhost:3000` as CORS origin (matching the dev default),
/// debug mode, and the default rate-limit tiers.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:3000".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        debug: true,
        store: StoreConfig::default(),
        session: SessionConfig::default(),
        rate_limit: RateLimitConfig::default(),
    }
}

/// Application under test plus the handles tests steer it with.
pub struct TestApp {
    pub router: Router,
    pub clock: Arc<ManualClock>,
    pub store: Arc<Store>,
}

/// Build the full application router over an in-memory store and a manual
/// clock, using the exact middleware stack production uses.
pub fn build_test_app() -> TestApp {
    build_test_app_with(test_config())
}

pub fn build_test_app_with(config: ServerConfig) -> TestApp {
    let clock = Arc::new(ManualClock::starting_now());
    let shared: SharedClock = clock.clone();
    let store = Arc::new(Store::fallback_only(shared.clone()));

    let state = AppState {
        config: Arc::new(config.clone()),
        sessions: Arc::new(
            SessionManager::new(Arc::clone(&store), shared.clone())
                .with_default_retention(config.session.default_retention_hours),
        ),
        rate_limiter: Arc::new(RateLimiter::new(Arc::clone(&store), shared.clone())),
        clock: shared,
    };

    TestApp {
        router: build_app_router(state, &config),
        clock,
        store,
    }
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

/// Peer address attached to every request built by these helpers.
pub fn peer() -> ConnectInfo<SocketAddr> {
    ConnectInfo(SocketAddr::from(([203, 0, 113, 7], 40000)))
}

pub async fn send(app: &Router, mut request: Request<Body>) -> Response<Body> {
    if request.extensions().get::<ConnectInfo<SocketAddr>>().is_none() {
        request.extensions_mut().insert(peer());
    }
    app.clone().oneshot(request).await.unwrap()
}

pub async fn get(app: &Router, uri: &str) -> Response<Body> {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(app, request).await
}

pub async fn delete(app: &Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::DELETE)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn post_json(app: &Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Create a session with default settings and return its id.
pub async fn create_session(app: &Router) -> String {
    let response = post_json(app, "/api/v1/sessions", serde_json::json!({})).await;
    let json = body_json(response).await;
    json["data"]["session_id"].as_str().unwrap().to_string()
}
