//! Input validation for values that arrive from clients.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::CoreError;

/// Maximum accepted length (in characters) of free-text user input.
pub const MAX_INPUT_LENGTH: usize = 10_000;

/// Content types accepted on requests that carry a body.
pub const ALLOWED_CONTENT_TYPES: &[&str] = &["application/json", "multipart/form-data"];

/// Canonical hyphenated UUID, any version, case-insensitive.
static SESSION_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}$")
        .expect("valid regex")
});

/// Check that a caller-supplied session id has the canonical UUID shape.
pub fn validate_session_id(session_id: &str) -> Result<(), CoreError> {
    if SESSION_ID_RE.is_match(session_id) {
        Ok(())
    } else {
        Err(CoreError::Validation("Invalid session id format".to_string()))
    }
}

/// Truncate to [`MAX_INPUT_LENGTH`] characters, drop control characters
/// other than newline and tab, then trim surrounding whitespace.
pub fn sanitize_input(text: &str) -> String {
    text.chars()
        .take(MAX_INPUT_LENGTH)
        .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
        .collect::<String>()
        .trim()
        .to_string()
}

/// Whether a `Content-Type` header value (parameters ignored) is accepted.
pub fn is_allowed_content_type(header_value: &str) -> bool {
    let media_type = header_value.split(';').next().unwrap_or("").trim();
    ALLOWED_CONTENT_TYPES
        .iter()
        .any(|allowed| allowed.eq_ignore_ascii_case(media_type))
}
