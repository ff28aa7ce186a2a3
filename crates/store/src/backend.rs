//! The operations both storage backends provide.

use async_trait::async_trait;
use biolens_core::types::Timestamp;

use crate::error::StoreError;

/// Remaining lifetime of a key, mirroring the Redis `TTL` reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TtlStatus {
    /// The key does not exist (`-2`).
    Missing,
    /// The key exists without an expiry (`-1`).
    Persistent,
    /// Seconds until the key expires.
    Expires(u64),
}

impl TtlStatus {
    pub fn from_redis_reply(reply: i64) -> Self {
        match reply {
            -2 => TtlStatus::Missing,
            r if r < 0 => TtlStatus::Persistent,
            r => TtlStatus::Expires(r as u64),
        }
    }
}

/// A key-value store with TTLs and an atomic sliding-window counter.
#[async_trait]
pub trait KvStore: Send + Sync + 'static {
    /// Short backend identifier used in logs and health reports.
    fn backend_name(&self) -> &'static str;

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Store `value` under `key`, expiring after `ttl_secs` (must be > 0).
    async fn set_with_ttl(&self, key: &str, value: &str, ttl_secs: u64)
        -> Result<(), StoreError>;

    /// Remove `key`. Returns whether a record existed.
    async fn delete(&self, key: &str) -> Result<bool, StoreError>;

    /// As one atomic unit: drop entries at or before `now - window_secs`,
    /// count what remains, and record `now` only if that count is below
    /// `limit` (refreshing the key's TTL to `window_secs` when recording).
    ///
    /// Returns the count before the current request was considered.
    async fn increment_window(
        &self,
        key: &str,
        now: Timestamp,
        window_secs: u64,
        limit: u64,
    ) -> Result<u64, StoreError>;

    /// Live keys starting with `prefix`.
    async fn keys(&self, prefix: &str) -> Result<Vec<String>, StoreError>;

    async fn ttl(&self, key: &str) -> Result<TtlStatus, StoreError>;

    /// Actively remove entries under `prefix` whose TTL has elapsed.
    ///
    /// Backends that evict on their own return `0`.
    async fn purge_expired(&self, prefix: &str) -> Result<u64, StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;
}
