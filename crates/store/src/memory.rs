//! Process-local fallback store.
//!
//! A single mutex guards the whole map, so every operation (including the
//! purge-count-add window update) is serialized. This backend is not shared
//! across service instances.

use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use biolens_core::clock::SharedClock;
use biolens_core::types::Timestamp;
use tokio::sync::Mutex;

use crate::backend::{KvStore, TtlStatus};
use crate::error::StoreError;

enum Value {
    Text(String),
    /// Request timestamps in epoch milliseconds, oldest first.
    Window(VecDeque<i64>),
}

struct Entry {
    value: Value,
    expires_at: Option<Timestamp>,
}

impl Entry {
    fn is_expired(&self, now: Timestamp) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// In-memory implementation of [`KvStore`] with lazy TTL eviction.
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Entry>>,
    clock: SharedClock,
}

impl MemoryStore {
    pub fn new(clock: SharedClock) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            clock,
        }
    }

    /// Number of live entries.
    pub async fn len(&self) -> usize {
        let now = self.clock.now();
        self.entries
            .lock()
            .await
            .values()
            .filter(|e| !e.is_expired(now))
            .count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Number of entries held, including expired ones not yet evicted.
    pub async fn held(&self) -> usize {
        self.entries.lock().await.len()
    }

    /// Insert a record with no expiry. Only reachable through tests and
    /// tooling; regular writes always carry a TTL.
    pub async fn set_persistent(&self, key: &str, value: &str) {
        self.entries.lock().await.insert(
            key.to_string(),
            Entry {
                value: Value::Text(value.to_string()),
                expires_at: None,
            },
        );
    }
}

fn expiry_after(now: Timestamp, secs: u64) -> Timestamp {
    now + chrono::Duration::seconds(secs as i64)
}

#[async_trait]
impl KvStore for MemoryStore {
    fn backend_name(&self) -> &'static str {
        "in-memory"
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let now = self.clock.now();
        let mut entries = self.entries.lock().await;

        if entries.get(key).is_some_and(|e| e.is_expired(now)) {
            entries.remove(key);
            return Ok(None);
        }

        match entries.get(key) {
            None => Ok(None),
            Some(Entry {
                value: Value::Text(text),
                ..
            }) => Ok(Some(text.clone())),
            Some(Entry {
                value: Value::Window(_),
                ..
            }) => Err(StoreError::Command(format!(
                "WRONGTYPE key '{key}' holds a window, not a string"
            ))),
        }
    }

    async fn set_with_ttl(
        &self,
        key: &str,
        value: &str,
        ttl_secs: u64,
    ) -> Result<(), StoreError> {
        if ttl_secs == 0 {
            return Err(StoreError::Command("invalid expire time".into()));
        }
        let expires_at = expiry_after(self.clock.now(), ttl_secs);
        self.entries.lock().await.insert(
            key.to_string(),
            Entry {
                value: Value::Text(value.to_string()),
                expires_at: Some(expires_at),
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        let now = self.clock.now();
        let removed = self.entries.lock().await.remove(key);
        Ok(removed.is_some_and(|e| !e.is_expired(now)))
    }

    async fn increment_window(
        &self,
        key: &str,
        now: Timestamp,
        window_secs: u64,
        limit: u64,
    ) -> Result<u64, StoreError> {
        let now_ms = now.timestamp_millis();
        let window_start_ms = now_ms - (window_secs as i64) * 1000;
        let wall_now = self.clock.now();

        let mut entries = self.entries.lock().await;

        if entries.get(key).is_some_and(|e| e.is_expired(wall_now)) {
            entries.remove(key);
        }

        let entry = entries.entry(key.to_string()).or_insert_with(|| Entry {
            value: Value::Window(VecDeque::new()),
            expires_at: None,
        });

        let Value::Window(stamps) = &mut entry.value else {
            return Err(StoreError::Command(format!(
                "WRONGTYPE key '{key}' holds a string, not a window"
            )));
        };

        while stamps.front().is_some_and(|&t| t <= window_start_ms) {
            stamps.pop_front();
        }

        let count_before = stamps.len() as u64;
        if count_before < limit {
            stamps.push_back(now_ms);
            entry.expires_at = Some(expiry_after(wall_now, window_secs));
        } else if stamps.is_empty() {
            // Nothing recorded and nothing admitted: don't keep an empty key.
            entries.remove(key);
        }

        Ok(count_before)
    }

    async fn keys(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let now = self.clock.now();
        Ok(self
            .entries
            .lock()
            .await
            .iter()
            .filter(|(k, e)| k.starts_with(prefix) && !e.is_expired(now))
            .map(|(k, _)| k.clone())
            .collect())
    }

    async fn ttl(&self, key: &str) -> Result<TtlStatus, StoreError> {
        let now = self.clock.now();
        let entries = self.entries.lock().await;
        Ok(match entries.get(key) {
            None => TtlStatus::Missing,
            Some(e) if e.is_expired(now) => TtlStatus::Missing,
            Some(Entry {
                expires_at: None, ..
            }) => TtlStatus::Persistent,
            Some(Entry {
                expires_at: Some(at),
                ..
            }) => TtlStatus::Expires((*at - now).num_seconds().max(0) as u64),
        })
    }

    async fn purge_expired(&self, prefix: &str) -> Result<u64, StoreError> {
        let now = self.clock.now();
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        entries.retain(|k, e| !(k.starts_with(prefix) && e.is_expired(now)));
        Ok((before - entries.len()) as u64)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
