//! Key-value storage for sessions and rate-limit windows.
//!
//! Two backends implement [`KvStore`]: [`RedisStore`] (durable, shared by
//! every instance) and [`MemoryStore`] (process-local fallback). [`Store`]
//! dispatches to the durable backend when one is configured and falls back
//! to memory for any call that fails or times out.

pub mod backend;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod keys;
pub mod memory;
pub mod redis_store;

pub use backend::{KvStore, TtlStatus};
pub use config::StoreConfig;
pub use dispatch::{BackendStatus, Store, StoreHealth};
pub use error::StoreError;
pub use memory::MemoryStore;
pub use redis_store::RedisStore;
