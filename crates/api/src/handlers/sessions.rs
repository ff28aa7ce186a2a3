//! Handlers for the `/sessions` resource.
//!
//! Session ids in paths must be canonical UUIDs; anything else is rejected
//! with 400 before the store is touched. Expired sessions are
//! indistinguishable from unknown ones and produce 404.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use biolens_core::error::CoreError;
use biolens_core::hashing::hash_sensitive_data;
use biolens_core::privacy::{PrivacyOverrides, PrivacySettings};
use biolens_core::session::{Message, Session, SessionStatus};
use biolens_core::types::Timestamp;
use biolens_core::validation::{sanitize_input, validate_session_id};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Body of `POST /sessions`.
#[derive(Debug, Default, Deserialize)]
pub struct CreateSessionRequest {
    #[serde(default)]
    pub privacy_settings: Option<PrivacyOverrides>,
}

/// Body of `POST /sessions/{id}/messages`.
#[derive(Debug, Deserialize)]
pub struct AppendMessageRequest {
    pub content: String,
}

/// Query parameters of `GET /sessions/{id}/context`.
#[derive(Debug, Deserialize)]
pub struct ContextParams {
    pub max_messages: Option<usize>,
}

/// Public view of a session. Message bodies are only exposed through the
/// context endpoint.
#[derive(Debug, Serialize)]
pub struct SessionView {
    pub session_id: String,
    pub status: SessionStatus,
    pub created_at: Timestamp,
    pub last_activity_at: Timestamp,
    pub expires_at: Timestamp,
    pub message_count: usize,
    pub analysis_count: usize,
    pub privacy_settings: PrivacySettings,
}

impl SessionView {
    fn of(session: &Session, now: Timestamp) -> Self {
        Self {
            session_id: session.id().to_string(),
            status: session.status_at(now),
            created_at: session.created_at(),
            last_activity_at: session.last_activity_at(),
            expires_at: session.expires_at(),
            message_count: session.messages().len(),
            analysis_count: session.analysis_references().len(),
            privacy_settings: session.privacy_settings().clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AppendedMessage {
    pub session_id: String,
    pub message: Message,
    pub message_count: usize,
}

#[derive(Debug, Serialize)]
pub struct CleanupResult {
    pub cleaned_count: u64,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/sessions
///
/// Create a session. Omitted privacy settings fall back to server defaults.
pub async fn create_session(
    State(state): State<AppState>,
    Json(input): Json<CreateSessionRequest>,
) -> AppResult<impl IntoResponse> {
    let overrides = input.privacy_settings.unwrap_or_default();
    overrides.validate()?;

    let session = state.sessions.create(&overrides).await?;
    let view = SessionView::of(&session, state.clock.now());

    Ok((StatusCode::CREATED, Json(DataResponse { data: view })))
}

/// GET /api/v1/sessions/{id}
pub async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> AppResult<Json<DataResponse<SessionView>>> {
    let session = load_session(&state, &session_id).await?;
    Ok(Json(DataResponse {
        data: SessionView::of(&session, state.clock.now()),
    }))
}

/// DELETE /api/v1/sessions/{id}
pub async fn delete_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> AppResult<StatusCode> {
    validate_session_id(&session_id)?;

    if state.sessions.delete(&session_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(session_not_found(&session_id))
    }
}

/// GET /api/v1/sessions/{id}/context
///
/// Recent user-authored messages, oldest first.
pub async fn get_context(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Query(params): Query<ContextParams>,
) -> AppResult<impl IntoResponse> {
    validate_session_id(&session_id)?;
    let max_messages = params
        .max_messages
        .unwrap_or(state.config.session.default_context_messages);

    let context = state
        .sessions
        .context(&session_id, max_messages)
        .await?
        .ok_or_else(|| session_not_found(&session_id))?;

    Ok(Json(DataResponse { data: context }))
}

/// POST /api/v1/sessions/{id}/messages
///
/// Append a user message. Content is sanitized before it is stored.
pub async fn append_message(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(input): Json<AppendMessageRequest>,
) -> AppResult<impl IntoResponse> {
    let content = sanitize_input(&input.content);
    if content.is_empty() {
        return Err(AppError::BadRequest("content must not be empty".into()));
    }

    let mut session = load_session(&state, &session_id).await?;
    let message = Message::user(content, state.clock.now());

    if !state
        .sessions
        .append_message(&mut session, message.clone())
        .await?
    {
        return Err(session_not_found(&session_id));
    }

    tracing::debug!(
        session = %hash_sensitive_data(&session_id),
        message_count = session.messages().len(),
        "Message appended"
    );

    let response = AppendedMessage {
        session_id,
        message,
        message_count: session.messages().len(),
    };
    Ok((StatusCode::CREATED, Json(DataResponse { data: response })))
}

/// POST /api/v1/sessions/cleanup
///
/// Run an expired-session sweep now instead of waiting for the background job.
pub async fn cleanup_sessions(
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<CleanupResult>>> {
    let cleaned_count = state.sessions.cleanup_expired().await?;
    Ok(Json(DataResponse {
        data: CleanupResult { cleaned_count },
    }))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn load_session(state: &AppState, session_id: &str) -> AppResult<Session> {
    validate_session_id(session_id)?;
    state
        .sessions
        .get(session_id)
        .await?
        .ok_or_else(|| session_not_found(session_id))
}

fn session_not_found(session_id: &str) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "Session",
        id: session_id.to_string(),
    })
}
