//! Durable store backed by Redis.
//!
//! Rate-limit windows are sorted sets scored by epoch milliseconds; the
//! purge-count-add sequence runs as one Lua script so concurrent requests on
//! the same key never observe a stale count.

use std::sync::LazyLock;

use async_trait::async_trait;
use biolens_core::types::Timestamp;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, IntoConnectionInfo, Script};
use uuid::Uuid;

use crate::backend::{KvStore, TtlStatus};
use crate::config::StoreConfig;
use crate::error::StoreError;

/// Keys examined per `SCAN` round trip.
const SCAN_BATCH: usize = 200;

/// KEYS[1] = window key
/// ARGV[1] = window start (ms, inclusive bound to drop)
/// ARGV[2] = now (ms)
/// ARGV[3] = unique member for this request
/// ARGV[4] = limit
/// ARGV[5] = window length (secs), used as TTL
static WINDOW_SCRIPT: LazyLock<Script> = LazyLock::new(|| {
    Script::new(
        r"
redis.call('ZREMRANGEBYSCORE', KEYS[1], '-inf', ARGV[1])
local count = redis.call('ZCARD', KEYS[1])
if count < tonumber(ARGV[4]) then
    redis.call('ZADD', KEYS[1], ARGV[2], ARGV[3])
    redis.call('EXPIRE', KEYS[1], ARGV[5])
end
return count
",
    )
});

/// Redis implementation of [`KvStore`].
///
/// Cheap to clone; the underlying [`ConnectionManager`] multiplexes and
/// reconnects on its own.
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
}

impl RedisStore {
    /// Open a managed connection, bounded by `config.timeout`.
    pub async fn connect(config: &StoreConfig) -> Result<Self, StoreError> {
        let mut info = config.redis_url.as_str().into_connection_info()?;
        if let Some(password) = &config.redis_password {
            info.redis.password = Some(password.clone());
        }
        let client = redis::Client::open(info)?;

        let conn = tokio::time::timeout(config.timeout, client.get_connection_manager())
            .await
            .map_err(|_| StoreError::Timeout(config.timeout))??;

        Ok(Self { conn })
    }
}

#[async_trait]
impl KvStore for RedisStore {
    fn backend_name(&self) -> &'static str {
        "redis"
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn set_with_ttl(
        &self,
        key: &str,
        value: &str,
        ttl_secs: u64,
    ) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let _: () = conn.set_ex(key, value, ttl_secs).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        let mut conn = self.conn.clone();
        let removed: u64 = conn.del(key).await?;
        Ok(removed > 0)
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
        let member = format!("{now_ms}-{}", Uuid::new_v4());

        let mut conn = self.conn.clone();
        let count: u64 = WINDOW_SCRIPT
            .key(key)
            .arg(window_start_ms)
            .arg(now_ms)
            .arg(member)
            .arg(limit)
            .arg(window_secs)
            .invoke_async(&mut conn)
            .await?;
        Ok(count)
    }

    async fn keys(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let mut conn = self.conn.clone();
        let pattern = format!("{prefix}*");
        let mut cursor: u64 = 0;
        let mut keys = Vec::new();

        loop {
            let (next, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(&mut conn)
                .await?;
            keys.extend(batch);
            if next == 0 {
                break;
            }
            cursor = next;
        }

        keys.sort();
        keys.dedup();
        Ok(keys)
    }

    async fn ttl(&self, key: &str) -> Result<TtlStatus, StoreError> {
        let mut conn = self.conn.clone();
        let reply: i64 = conn.ttl(key).await?;
        Ok(TtlStatus::from_redis_reply(reply))
    }

    async fn purge_expired(&self, _prefix: &str) -> Result<u64, StoreError> {
        // Redis evicts expired keys itself.
        Ok(0)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let pong: String = redis::cmd("PING").query_async(&mut conn).await?;
        if pong == "PONG" {
            Ok(())
        } else {
            Err(StoreError::Command(format!("unexpected PING reply: {pong}")))
        }
    }
}
