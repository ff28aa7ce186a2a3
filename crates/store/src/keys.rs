//! Key namespaces. Session and rate-limit keys never collide.

/// Prefix of every session record key.
pub const SESSION_PREFIX: &str = "session:";

/// Prefix of every rate-limit window key.
pub const RATE_LIMIT_PREFIX: &str = "rate_limit:";

pub fn session_key(session_id: &str) -> String {
    format!("{SESSION_PREFIX}{session_id}")
}

pub fn rate_limit_key(client_identity: &str, endpoint: &str) -> String {
    format!("{RATE_LIMIT_PREFIX}{client_identity}:{endpoint}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn namespaces_are_distinct() {
        assert_eq!(session_key("abc"), "session:abc");
        assert_eq!(rate_limit_key("10.0.0.1", "/api/v1/sessions"), "rate_limit:10.0.0.1:/api/v1/sessions");
        assert!(!rate_limit_key("session", "x").starts_with(SESSION_PREFIX));
    }
}
