//! Health-aware dispatch between the durable and fallback backends.
//!
//! The durable backend is chosen once at startup by [`Store::connect`]. After
//! that, every call goes to the durable backend first, bounded by the
//! configured timeout; any error or timeout sends that one call to the
//! fallback store instead. Durable-backend failures are never returned to
//! callers.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use biolens_core::clock::SharedClock;
use biolens_core::types::Timestamp;
use serde::Serialize;

use crate::backend::{KvStore, TtlStatus};
use crate::config::StoreConfig;
use crate::error::StoreError;
use crate::memory::MemoryStore;
use crate::redis_store::RedisStore;

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendStatus {
    /// The durable backend answered a ping.
    Healthy,
    /// No durable backend was available at startup; fallback only.
    Degraded,
    /// A durable backend is configured but is not answering right now.
    Unhealthy,
}

/// Health report. Never carries raw backend error text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreHealth {
    pub status: BackendStatus,
    pub backend: &'static str,
    pub note: Option<&'static str>,
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// The single storage handle shared by the session manager and rate limiter.
pub struct Store {
    durable: Option<Arc<dyn KvStore>>,
    fallback: MemoryStore,
    timeout: Duration,
    /// Set while the durable backend is failing, so degradation is logged once.
    degraded: AtomicBool,
}

impl Store {
    /// Try Redis once and build a store around whatever is reachable.
    ///
    /// Never fails: an unreachable durable backend means fallback-only mode.
    pub async fn connect(config: &StoreConfig, clock: SharedClock) -> Self {
        let connect_and_ping = async {
            let redis = RedisStore::connect(config).await?;
            tokio::time::timeout(config.timeout, redis.ping())
                .await
                .map_err(|_| StoreError::Timeout(config.timeout))??;
            Ok::<_, StoreError>(redis)
        };

        match connect_and_ping.await {
            Ok(redis) => {
                tracing::info!(backend = "redis", "Durable store connected");
                Self::with_durable(Arc::new(redis), clock, config.timeout)
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    "Durable store unreachable at startup, using in-memory fallback"
                );
                Self::fallback_only(clock)
            }
        }
    }

    /// A store that always serves from the in-memory fallback.
    pub fn fallback_only(clock: SharedClock) -> Self {
        Self {
            durable: None,
            fallback: MemoryStore::new(clock),
            timeout: StoreConfig::default().timeout,
            degraded: AtomicBool::new(false),
        }
    }

    /// A store with an explicit durable backend in front of the fallback.
    pub fn with_durable(durable: Arc<dyn KvStore>, clock: SharedClock, timeout: Duration) -> Self {
        Self {
            durable: Some(durable),
            fallback: MemoryStore::new(clock),
            timeout,
            degraded: AtomicBool::new(false),
        }
    }

    /// Whether a durable backend was selected at startup.
    pub fn has_durable(&self) -> bool {
        self.durable.is_some()
    }

    /// Direct access to the fallback backend.
    pub fn fallback(&self) -> &MemoryStore {
        &self.fallback
    }

    // -- Operations --------------------------------------------------------

    pub async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        if let Some(durable) = &self.durable {
            if let Some(value) = self.bounded("get", durable.get(key)).await {
                return Ok(value);
            }
        }
        self.fallback.get(key).await
    }

    pub async fn set_with_ttl(
        &self,
        key: &str,
        value: &str,
        ttl_secs: u64,
    ) -> Result<(), StoreError> {
        if let Some(durable) = &self.durable {
            if self
                .bounded("set_with_ttl", durable.set_with_ttl(key, value, ttl_secs))
                .await
                .is_some()
            {
                return Ok(());
            }
        }
        self.fallback.set_with_ttl(key, value, ttl_secs).await
    }

    pub async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        if let Some(durable) = &self.durable {
            if let Some(existed) = self.bounded("delete", durable.delete(key)).await {
                return Ok(existed);
            }
        }
        self.fallback.delete(key).await
    }

    pub async fn increment_window(
        &self,
        key: &str,
        now: Timestamp,
        window_secs: u64,
        limit: u64,
    ) -> Result<u64, StoreError> {
        if let Some(durable) = &self.durable {
            if let Some(count) = self
                .bounded(
                    "increment_window",
                    durable.increment_window(key, now, window_secs, limit),
                )
                .await
            {
                return Ok(count);
            }
        }
        self.fallback
            .increment_window(key, now, window_secs, limit)
            .await
    }

    pub async fn keys(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        if let Some(durable) = &self.durable {
            if let Some(keys) = self.bounded("keys", durable.keys(prefix)).await {
                return Ok(keys);
            }
        }
        self.fallback.keys(prefix).await
    }

    pub async fn ttl(&self, key: &str) -> Result<TtlStatus, StoreError> {
        if let Some(durable) = &self.durable {
            if let Some(ttl) = self.bounded("ttl", durable.ttl(key)).await {
                return Ok(ttl);
            }
        }
        self.fallback.ttl(key).await
    }

    /// Sweep expired entries from the fallback store, and ask the durable
    /// backend to do the same. Returns how many were removed in total.
    pub async fn purge_expired(&self, prefix: &str) -> Result<u64, StoreError> {
        let mut removed = 0;
        if let Some(durable) = &self.durable {
            removed += self
                .bounded("purge_expired", durable.purge_expired(prefix))
                .await
                .unwrap_or(0);
        }
        removed += self.fallback.purge_expired(prefix).await?;
        Ok(removed)
    }

    /// Whether the active backend answers. Fallback-only mode is always
    /// reachable.
    pub async fn ping(&self) -> bool {
        match &self.durable {
            Some(durable) => self.bounded("ping", durable.ping()).await.is_some(),
            None => true,
        }
    }

    pub async fn health(&self) -> StoreHealth {
        match &self.durable {
            Some(durable) => {
                if self.ping().await {
                    StoreHealth {
                        status: BackendStatus::Healthy,
                        backend: durable.backend_name(),
                        note: None,
                    }
                } else {
                    StoreHealth {
                        status: BackendStatus::Unhealthy,
                        backend: durable.backend_name(),
                        note: Some("Durable store not responding; serving from fallback"),
                    }
                }
            }
            None => StoreHealth {
                status: BackendStatus::Degraded,
                backend: self.fallback.backend_name(),
                note: Some("Using fallback storage"),
            },
        }
    }

    // -- Internals ---------------------------------------------------------

    /// Run a durable-backend call under the timeout. `None` means the call
    /// failed and the caller should use the fallback.
    async fn bounded<T>(
        &self,
        operation: &'static str,
        call: impl Future<Output = Result<T, StoreError>>,
    ) -> Option<T> {
        let outcome = match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(StoreError::Timeout(self.timeout)),
        };

        match outcome {
            Ok(value) => {
                if self.degraded.swap(false, Ordering::AcqRel) {
                    tracing::info!(operation, "Durable store recovered");
                }
                Some(value)
            }
            Err(e) => {
                if self.degraded.swap(true, Ordering::AcqRel) {
                    tracing::debug!(operation, error = %e, "Durable store still unavailable");
                } else {
                    tracing::warn!(
                        operation,
                        error = %e,
                        "Durable store unavailable, falling back to in-memory store"
                    );
                }
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use async_trait::async_trait;
    use biolens_core::clock::{Clock, ManualClock};

    use super::*;

    /// Durable backend that refuses every call.
    struct DownStore {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl KvStore for DownStore {
        fn backend_name(&self) -> &'static str {
            "redis"
        }
        async fn get(&self, _: &str) -> Result<Option<String>, StoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(StoreError::Unavailable("connection refused".into()))
        }
        async fn set_with_ttl(&self, _: &str, _: &str, _: u64) -> Result<(), StoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(StoreError::Unavailable("connection refused".into()))
        }
        async fn delete(&self, _: &str) -> Result<bool, StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }
        async fn increment_window(
            &self,
            _: &str,
            _: Timestamp,
            _: u64,
            _: u64,
        ) -> Result<u64, StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }
        async fn keys(&self, _: &str) -> Result<Vec<String>, StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }
        async fn ttl(&self, _: &str) -> Result<TtlStatus, StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }
        async fn purge_expired(&self, _: &str) -> Result<u64, StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }
        async fn ping(&self) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }
    }

    /// Durable backend that never answers.
    struct HangingStore;

    #[async_trait]
    impl KvStore for HangingStore {
        fn backend_name(&self) -> &'static str {
            "redis"
        }
        async fn get(&self, _: &str) -> Result<Option<String>, StoreError> {
            std::future::pending().await
        }
        async fn set_with_ttl(&self, _: &str, _: &str, _: u64) -> Result<(), StoreError> {
            std::future::pending().await
        }
        async fn delete(&self, _: &str) -> Result<bool, StoreError> {
            std::future::pending().await
        }
        async fn increment_window(
            &self,
            _: &str,
            _: Timestamp,
            _: u64,
            _: u64,
        ) -> Result<u64, StoreError> {
            std::future::pending().await
        }
        async fn keys(&self, _: &str) -> Result<Vec<String>, StoreError> {
            std::future::pending().await
        }
        async fn ttl(&self, _: &str) -> Result<TtlStatus, StoreError> {
            std::future::pending().await
        }
        async fn purge_expired(&self, _: &str) -> Result<u64, StoreError> {
            std::future::pending().await
        }
        async fn ping(&self) -> Result<(), StoreError> {
            std::future::pending().await
        }
    }

    fn clock() -> Arc<ManualClock> {
        Arc::new(ManualClock::starting_now())
    }

    #[tokio::test]
    async fn failing_durable_falls_back_per_call() {
        let clock = clock();
        let down = Arc::new(DownStore {
            calls: AtomicUsize::new(0),
        });
        let store = Store::with_durable(down.clone(), clock.clone(), Duration::from_secs(1));

        store.set_with_ttl("session:x", "v", 60).await.unwrap();
        assert_eq!(store.get("session:x").await.unwrap().as_deref(), Some("v"));
        assert_eq!(down.calls.load(Ordering::SeqCst), 2);
        assert!(store.delete("session:x").await.unwrap());
        assert_eq!(
            store.increment_window("rate_limit:a:/", clock.now(), 60, 1).await.unwrap(),
            0
        );
    }

    #[tokio::test(start_paused = true)]
    async fn hanging_durable_is_bounded_by_timeout() {
        let store = Store::with_durable(Arc::new(HangingStore), clock(), Duration::from_secs(2));
        store.set_with_ttl("k", "v", 60).await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v"));
        assert!(!store.ping().await);
    }

    #[tokio::test]
    async fn health_reports_each_mode() {
        let fallback = Store::fallback_only(clock());
        let health = fallback.health().await;
        assert_eq!(health.status, BackendStatus::Degraded);
        assert_eq!(health.backend, "in-memory");
        assert!(fallback.ping().await);

        let down = Store::with_durable(
            Arc::new(DownStore {
                calls: AtomicUsize::new(0),
            }),
            clock(),
            Duration::from_secs(1),
        );
        let health = down.health().await;
        assert_eq!(health.status, BackendStatus::Unhealthy);
        assert_eq!(health.backend, "redis");
        assert!(!health.note.unwrap_or_default().contains("refused"));
    }

    #[tokio::test]
    async fn purge_ignores_durable_failure() {
        let clock = clock();
        let store = Store::with_durable(
            Arc::new(DownStore {
                calls: AtomicUsize::new(0),
            }),
            clock.clone(),
            Duration::from_secs(1),
        );
        store.set_with_ttl("session:a", "1", 1).await.unwrap();
        clock.advance(chrono::Duration::seconds(2));
        assert_eq!(store.purge_expired("session:").await.unwrap(), 1);
    }
}
