use axum::routing::{get, post};
use axum::Router;

use crate::handlers::sessions;
use crate::state::AppState;

/// Session routes, mounted at `/api/v1/sessions`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(sessions::create_session))
        .route("/cleanup", post(sessions::cleanup_sessions))
        .route(
            "/{id}",
            get(sessions::get_session).delete(sessions::delete_session),
        )
        .route("/{id}/context", get(sessions::get_context))
        .route("/{id}/messages", post(sessions::append_message))
}
