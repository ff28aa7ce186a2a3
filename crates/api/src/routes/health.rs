use axum::extract::State;
use axum::{routing::get, Json, Router};
use biolens_core::types::Timestamp;
use biolens_store::StoreHealth;
use serde::Serialize;

use crate::state::AppState;

const SERVICE_NAME: &str = "biolens-backend";

/// Root service information.
#[derive(Serialize)]
pub struct ServiceInfo {
    pub message: &'static str,
    pub version: &'static str,
    pub timestamp: Timestamp,
}

/// Health check response payload.
#[derive(Serialize)]
pub struct HealthResponse {
    /// Overall service status.
    pub status: &'static str,
    pub service: &'static str,
    /// Crate version from Cargo.toml.
    pub version: &'static str,
}

/// Detailed health with the state of the shared store.
#[derive(Serialize)]
pub struct DetailedHealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
    pub timestamp: Timestamp,
    pub dependencies: Dependencies,
}

#[derive(Serialize)]
pub struct Dependencies {
    /// Session storage backend.
    pub session_store: StoreHealth,
    /// Rate-limit windows live in the same store.
    pub rate_limiter: StoreHealth,
}

/// GET / -- basic service information.
async fn root(State(state): State<AppState>) -> Json<ServiceInfo> {
    Json(ServiceInfo {
        message: "BioLens API is running",
        version: env!("CARGO_PKG_VERSION"),
        timestamp: state.clock.now(),
    })
}

/// GET /health -- liveness only, never touches the store.
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: SERVICE_NAME,
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// GET /health/detailed -- includes store backend status. Always 200;
/// a failing backend is reported in the body.
async fn detailed_health_check(State(state): State<AppState>) -> Json<DetailedHealthResponse> {
    let store = state.sessions.health().await;

    Json(DetailedHealthResponse {
        status: "healthy",
        service: SERVICE_NAME,
        version: env!("CARGO_PKG_VERSION"),
        timestamp: state.clock.now(),
        dependencies: Dependencies {
            session_store: store.clone(),
            rate_limiter: store,
        },
    })
}

/// Mount health check routes (intended for root-level, NOT under `/api/v1`).
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/health/detailed", get(detailed_health_check))
}
