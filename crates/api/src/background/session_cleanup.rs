//! Periodic sweep of expired sessions and spent rate-limit windows.
//!
//! Redis expires keys on its own; this job reconciles session records that
//! carry no expiry and drains expired entries of both namespaces from the
//! in-memory fallback.

use std::sync::Arc;
use std::time::Duration;

use biolens_access::{RateLimiter, SessionManager};
use tokio_util::sync::CancellationToken;

/// Run the cleanup loop until `cancel` is triggered.
///
/// The first sweep happens immediately. Failures are logged and retried on
/// the next tick.
pub async fn run(
    sessions: Arc<SessionManager>,
    rate_limiter: Arc<RateLimiter>,
    interval: Duration,
    cancel: CancellationToken,
) {
    tracing::info!(interval_secs = interval.as_secs(), "Session cleanup job started");

    let mut interval = tokio::time::interval(interval);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Session cleanup job stopping");
                break;
            }
            _ = interval.tick() => {
                if let Err(e) = sessions.cleanup_expired().await {
                    tracing::error!(error = %e, "Session cleanup: sweep failed");
                }
                if let Err(e) = rate_limiter.purge_expired().await {
                    tracing::error!(error = %e, "Session cleanup: rate-limit purge failed");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use biolens_core::clock::{ManualClock, SharedClock};
    use biolens_core::privacy::PrivacyOverrides;
    use biolens_core::rate_limit::RateLimitPolicy;
    use biolens_store::Store;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn sweeps_sessions_and_windows_then_stops_on_cancel() {
        let clock = Arc::new(ManualClock::starting_now());
        let shared: SharedClock = clock.clone();
        let store = Arc::new(Store::fallback_only(shared.clone()));
        let sessions = Arc::new(SessionManager::new(store.clone(), shared.clone()));
        let limiter = Arc::new(RateLimiter::new(store.clone(), shared));

        sessions
            .create(&PrivacyOverrides::with_retention_hours(1))
            .await
            .unwrap();
        for client in ["198.51.100.1", "198.51.100.2", "198.51.100.3"] {
            limiter
                .check(client, "/api/v1/sessions", RateLimitPolicy::new(5, 60))
                .await
                .unwrap();
        }
        assert_eq!(store.fallback().held().await, 4);
        clock.advance(chrono::Duration::hours(2));

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run(
            Arc::clone(&sessions),
            Arc::clone(&limiter),
            Duration::from_secs(60),
            cancel.clone(),
        ));

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(store.fallback().held().await, 0);

        cancel.cancel();
        handle.await.unwrap();
    }
}
