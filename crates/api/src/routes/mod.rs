pub mod health;
pub mod sessions;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /sessions                        create (POST)
/// /sessions/cleanup                expired-session sweep (POST)
/// /sessions/{id}                   get, delete
/// /sessions/{id}/context           recent user context (GET)
/// /sessions/{id}/messages          append user message (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new().nest("/sessions", sessions::router())
}
