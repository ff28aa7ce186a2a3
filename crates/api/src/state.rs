use std::sync::Arc;

use biolens_access::{RateLimiter, SessionManager};
use biolens_core::clock::SharedClock;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Server configuration (accessed by middleware and handlers).
    pub config: Arc<ServerConfig>,
    /// Session lifecycle over the shared store.
    pub sessions: Arc<SessionManager>,
    /// Sliding-window request admission over the same store.
    pub rate_limiter: Arc<RateLimiter>,
    /// Time source shared with the managers.
    pub clock: SharedClock,
}
