#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use biolens_access::{RateLimiter, SessionManager};
use biolens_core::clock::ManualClock;
use biolens_core::types::Timestamp;
use biolens_store::{KvStore, MemoryStore, Store, StoreError, TtlStatus};

/// Which backend arrangement a test runs against.
#[derive(Debug, Clone, Copy)]
pub enum Backend {
    /// No durable backend was reachable at startup.
    FallbackOnly,
    /// A healthy durable backend (an independent in-memory store stands in).
    Durable,
    /// A durable backend that fails every call.
    DurableDown,
}

pub struct Harness {
    pub clock: Arc<ManualClock>,
    pub store: Arc<Store>,
    pub sessions: SessionManager,
    pub limiter: RateLimiter,
}

pub fn harness(backend: Backend) -> Harness {
    let clock = Arc::new(ManualClock::starting_now());
    let store = Arc::new(match backend {
        Backend::FallbackOnly => Store::fallback_only(clock.clone()),
        Backend::Durable => Store::with_durable(
            Arc::new(MemoryStore::new(clock.clone())),
            clock.clone(),
            Duration::from_secs(1),
        ),
        Backend::DurableDown => {
            Store::with_durable(Arc::new(DownStore), clock.clone(), Duration::from_secs(1))
        }
    });

    Harness {
        sessions: SessionManager::new(store.clone(), clock.clone()),
        limiter: RateLimiter::new(store.clone(), clock.clone()),
        clock,
        store,
    }
}

/// Durable backend stand-in that is unreachable.
pub struct DownStore;

fn refused<T>() -> Result<T, StoreError> {
    Err(StoreError::Unavailable("connection refused".into()))
}

#[async_trait]
impl KvStore for DownStore {
    fn backend_name(&self) -> &'static str {
        "redis"
    }
    async fn get(&self, _: &str) -> Result<Option<String>, StoreError> {
        refused()
    }
    async fn set_with_ttl(&self, _: &str, _: &str, _: u64) -> Result<(), StoreError> {
        refused()
    }
    async fn delete(&self, _: &str) -> Result<bool, StoreError> {
        refused()
    }
    async fn increment_window(
        &self,
        _: &str,
        _: Timestamp,
        _: u64,
        _: u64,
    ) -> Result<u64, StoreError> {
        refused()
    }
    async fn keys(&self, _: &str) -> Result<Vec<String>, StoreError> {
        refused()
    }
    async fn ttl(&self, _: &str) -> Result<TtlStatus, StoreError> {
        refused()
    }
    async fn purge_expired(&self, _: &str) -> Result<u64, StoreError> {
        refused()
    }
    async fn ping(&self) -> Result<(), StoreError> {
        refused()
    }
}
