use axum::extract::{Request, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::Method;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use biolens_core::validation::is_allowed_content_type;

use crate::error::AppError;
use crate::state::AppState;

/// Headers commonly abused to confuse routing behind a proxy.
pub const SUSPICIOUS_HEADERS: &[&str] = &["x-forwarded-host", "x-original-url", "x-rewrite-url"];

/// Longest header value excerpt written to the security log.
const LOGGED_VALUE_LENGTH: usize = 100;

/// Reject body-carrying requests whose `Content-Type` we do not accept and
/// log suspicious headers. Exempt paths pass through untouched.
pub async fn validate(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let path = request.uri().path();
    if state.config.rate_limit.is_exempt(path) {
        return next.run(request).await;
    }

    if matches!(*request.method(), Method::POST | Method::PUT | Method::PATCH) {
        let content_type = request
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");

        if !is_allowed_content_type(content_type) {
            tracing::warn!(
                event = "security_violation",
                path,
                method = %request.method(),
                "Unsupported content type"
            );
            return AppError::UnsupportedMediaType("Unsupported content type".into())
                .into_response();
        }
    }

    for name in SUSPICIOUS_HEADERS {
        if let Some(value) = request.headers().get(*name) {
            let excerpt: String = String::from_utf8_lossy(value.as_bytes())
                .chars()
                .take(LOGGED_VALUE_LENGTH)
                .collect();
            tracing::warn!(
                event = "suspicious_header",
                header = *name,
                value = %excerpt,
                path,
                "Suspicious header on request"
            );
        }
    }

    next.run(request).await
}
