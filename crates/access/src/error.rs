use biolens_core::error::CoreError;
use biolens_store::StoreError;

/// Errors the session manager and rate limiter surface to callers.
///
/// Durable-backend outages are absorbed by the store and never appear here.
/// "Not found" and "rate limited" are ordinary return values, not errors.
#[derive(Debug, thiserror::Error)]
pub enum AccessError {
    /// Configuration or validation failure from the domain layer.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A session could not be encoded for storage.
    #[error("Session serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The fallback store itself failed.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}
