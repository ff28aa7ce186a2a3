use axum::http::header::RETRY_AFTER;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use biolens_access::AccessError;
use biolens_core::error::CoreError;
use biolens_core::rate_limit::RateLimitQuota;
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] and [`AccessError`] for domain errors and adds
/// HTTP-specific variants. Implements [`IntoResponse`] to produce consistent
/// JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `biolens_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A session or rate-limit operation failed.
    #[error(transparent)]
    Access(#[from] AccessError),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// The client exhausted its request budget.
    #[error("Rate limit exceeded")]
    RateLimited(RateLimitQuota),

    /// A body-carrying request with a content type we do not accept.
    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            // --- Domain errors ---
            AppError::Core(core) | AppError::Access(AccessError::Core(core)) => classify_core(core),
            AppError::Access(other) => {
                tracing::error!(error = %other, "Access layer error");
                internal()
            }

            // --- HTTP-specific errors ---
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::RateLimited(quota) => {
                let body = json!({
                    "error": "Rate limit exceeded",
                    "code": "RATE_LIMITED",
                    "limit": quota.limit,
                    "remaining": quota.remaining,
                    "reset_time": quota.reset_time,
                    "window_seconds": quota.window_seconds,
                });
                let mut headers = rate_limit_headers(quota);
                headers.insert(RETRY_AFTER, HeaderValue::from(quota.window_seconds));
                return (StatusCode::TOO_MANY_REQUESTS, headers, axum::Json(body))
                    .into_response();
            }
            AppError::UnsupportedMediaType(msg) => (
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                "UNSUPPORTED_MEDIA_TYPE",
                msg.clone(),
            ),
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

/// `X-RateLimit-*` headers describing a quota.
pub fn rate_limit_headers(quota: &RateLimitQuota) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert("x-ratelimit-limit", HeaderValue::from(quota.limit));
    headers.insert("x-ratelimit-remaining", HeaderValue::from(quota.remaining));
    headers.insert("x-ratelimit-reset", HeaderValue::from(quota.reset_time));
    headers
}

fn classify_core(core: &CoreError) -> (StatusCode, &'static str, String) {
    match core {
        CoreError::NotFound { entity, id } => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("{entity} with id {id} not found"),
        ),
        CoreError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
        CoreError::Configuration(msg) => {
            tracing::error!(error = %msg, "Configuration error");
            internal()
        }
    }
}

fn internal() -> (StatusCode, &'static str, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "An internal error occurred".to_string(),
    )
}
