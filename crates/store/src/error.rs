use std::time::Duration;

/// Errors raised by a [`KvStore`](crate::KvStore) backend.
///
/// Durable-backend errors never escape [`Store`](crate::Store); they trigger
/// fallback instead.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backend could not be reached (connect failure, dropped socket).
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// The operation did not complete within the configured bound.
    #[error("Store operation timed out after {0:?}")]
    Timeout(Duration),

    /// The backend rejected the command (wrong type, script error, ...).
    #[error("Store command failed: {0}")]
    Command(String),
}

impl From<redis::RedisError> for StoreError {
    fn from(err: redis::RedisError) -> Self {
        if err.is_io_error() || err.is_connection_refusal() || err.is_connection_dropped() {
            StoreError::Unavailable(err.to_string())
        } else if err.is_timeout() {
            StoreError::Unavailable(format!("timeout: {err}"))
        } else {
            StoreError::Command(err.to_string())
        }
    }
}
