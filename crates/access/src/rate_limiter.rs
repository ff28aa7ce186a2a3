//! Sliding-window request admission keyed by (client identity, endpoint).
//!
//! A denied request is not recorded, so a client sitting at the limit is
//! never wedged by its own rejected attempts.

use std::sync::Arc;

use biolens_core::clock::SharedClock;
use biolens_core::hashing::hash_sensitive_data;
use biolens_core::rate_limit::{RateLimitDecision, RateLimitPolicy};
use biolens_store::keys::{rate_limit_key, RATE_LIMIT_PREFIX};
use biolens_store::Store;

use crate::error::AccessError;

/// Owns every rate-limit window in the store.
pub struct RateLimiter {
    store: Arc<Store>,
    clock: SharedClock,
}

impl RateLimiter {
    pub fn new(store: Arc<Store>, clock: SharedClock) -> Self {
        Self { store, clock }
    }

    /// Check whether `client_identity` may call `endpoint` now, recording
    /// the request if it is admitted.
    ///
    /// Exceeding the limit is a normal outcome (`allowed == false`).
    pub async fn check(
        &self,
        client_identity: &str,
        endpoint: &str,
        policy: RateLimitPolicy,
    ) -> Result<RateLimitDecision, AccessError> {
        let now = self.clock.now();
        let key = rate_limit_key(client_identity, endpoint);

        let count_before = self
            .store
            .increment_window(&key, now, policy.window_secs, policy.max_requests)
            .await?;
        let decision = RateLimitDecision::from_count(count_before, policy, now);

        if !decision.allowed {
            tracing::warn!(
                client = %hash_sensitive_data(client_identity),
                endpoint,
                limit = policy.max_requests,
                window_secs = policy.window_secs,
                "Rate limit exceeded"
            );
        }

        Ok(decision)
    }

    /// Drop windows whose last request has left the window.
    ///
    /// Redis expires window keys itself; the in-memory fallback only evicts a
    /// window when its key is touched again.
    pub async fn purge_expired(&self) -> Result<u64, AccessError> {
        let removed = self.store.purge_expired(RATE_LIMIT_PREFIX).await?;
        if removed > 0 {
            tracing::info!(removed, "Expired rate-limit windows purged");
        } else {
            tracing::debug!("Rate-limit purge: nothing to remove");
        }
        Ok(removed)
    }
}
