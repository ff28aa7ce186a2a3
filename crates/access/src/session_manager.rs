//! Session lifecycle: create, read, update, delete, cleanup.
//!
//! Sessions are stored as one JSON document per id under `session:{id}`,
//! with a store TTL equal to the seconds left until `expires_at`. Activity
//! never extends a session: every write recomputes the TTL from the
//! creation-time `expires_at`.

use std::sync::Arc;

use biolens_core::clock::SharedClock;
use biolens_core::error::CoreError;
use biolens_core::hashing::hash_sensitive_data;
use biolens_core::privacy::{PrivacyOverrides, PrivacySettings, DEFAULT_RETENTION_HOURS};
use biolens_core::session::{Message, Session, SessionContext};
use biolens_core::types::Timestamp;
use biolens_store::keys::{session_key, SESSION_PREFIX};
use biolens_store::{Store, StoreHealth, TtlStatus};

use crate::error::AccessError;

/// Owns every [`Session`] record in the store.
pub struct SessionManager {
    store: Arc<Store>,
    clock: SharedClock,
    default_retention_hours: u32,
}

impl SessionManager {
    pub fn new(store: Arc<Store>, clock: SharedClock) -> Self {
        Self {
            store,
            clock,
            default_retention_hours: DEFAULT_RETENTION_HOURS,
        }
    }

    /// Retention applied when the caller does not choose one.
    pub fn with_default_retention(mut self, hours: u32) -> Self {
        self.default_retention_hours = hours;
        self
    }

    /// Create and persist a new session.
    ///
    /// Fails with [`CoreError::Configuration`] if the retention lies outside
    /// the allowed bounds or the computed TTL is not positive.
    pub async fn create(&self, overrides: &PrivacyOverrides) -> Result<Session, AccessError> {
        let settings = PrivacySettings::resolve(overrides, self.default_retention_hours)?;
        let now = self.clock.now();
        let session = Session::new(settings, now);

        let ttl = ttl_secs(&session, now).ok_or_else(|| {
            CoreError::Configuration(format!(
                "session retention of {}h yields a non-positive TTL",
                session.privacy_settings().data_retention_hours
            ))
        })?;

        self.persist(&session, ttl).await?;

        tracing::info!(
            session = %hash_sensitive_data(session.id()),
            retention_hours = session.privacy_settings().data_retention_hours,
            "Session created"
        );
        Ok(session)
    }

    /// Load a live session.
    ///
    /// Expired and corrupt records are deleted and reported as absent.
    pub async fn get(&self, session_id: &str) -> Result<Option<Session>, AccessError> {
        let key = session_key(session_id);
        let Some(raw) = self.store.get(&key).await? else {
            return Ok(None);
        };

        let session: Session = match serde_json::from_str(&raw) {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!(
                    session = %hash_sensitive_data(session_id),
                    error = %e,
                    "Discarding corrupt session record"
                );
                self.store.delete(&key).await?;
                return Ok(None);
            }
        };

        if session.is_expired_at(self.clock.now()) {
            tracing::debug!(
                session = %hash_sensitive_data(session_id),
                "Removing expired session on read"
            );
            self.store.delete(&key).await?;
            return Ok(None);
        }

        Ok(Some(session))
    }

    /// Refresh the activity timestamp and re-persist.
    ///
    /// Returns `false` without writing when the session has already expired.
    pub async fn update(&self, session: &mut Session) -> Result<bool, AccessError> {
        let now = self.clock.now();
        session.touch(now);

        let Some(ttl) = ttl_secs(session, now) else {
            tracing::debug!(
                session = %hash_sensitive_data(session.id()),
                "Refusing to update expired session"
            );
            return Ok(false);
        };

        self.persist(session, ttl).await?;
        Ok(true)
    }

    /// Remove a session. Returns whether a record existed.
    pub async fn delete(&self, session_id: &str) -> Result<bool, AccessError> {
        let existed = self.store.delete(&session_key(session_id)).await?;
        if existed {
            tracing::info!(session = %hash_sensitive_data(session_id), "Session deleted");
        }
        Ok(existed)
    }

    /// Append a message to the in-hand session and persist it.
    pub async fn append_message(
        &self,
        session: &mut Session,
        message: Message,
    ) -> Result<bool, AccessError> {
        session.push_message(message, self.clock.now());
        self.update(session).await
    }

    /// Record a reference to an externally owned analysis and persist it.
    pub async fn append_analysis(
        &self,
        session: &mut Session,
        analysis_id: impl Into<String>,
    ) -> Result<bool, AccessError> {
        session.push_analysis(analysis_id, self.clock.now());
        self.update(session).await
    }

    /// Recent user-authored context of a live session.
    pub async fn context(
        &self,
        session_id: &str,
        max_messages: usize,
    ) -> Result<Option<SessionContext>, AccessError> {
        Ok(self
            .get(session_id)
            .await?
            .map(|session| SessionContext::of(&session, max_messages)))
    }

    /// Remove stale session records and return how many were removed.
    ///
    /// TTL-carrying records are left to the store's own expiry. Records that
    /// report no expiry are loaded and deleted if expired or unreadable, and
    /// keys that vanished mid-scan are counted as expired.
    pub async fn cleanup_expired(&self) -> Result<u64, AccessError> {
        let now = self.clock.now();
        let mut removed = self.store.purge_expired(SESSION_PREFIX).await?;

        for key in self.store.keys(SESSION_PREFIX).await? {
            match self.store.ttl(&key).await? {
                TtlStatus::Expires(_) => {}
                TtlStatus::Missing => removed += 1,
                TtlStatus::Persistent => {
                    if self.is_stale(&key, now).await? && self.store.delete(&key).await? {
                        removed += 1;
                    }
                }
            }
        }

        if removed > 0 {
            tracing::info!(removed, "Expired sessions cleaned up");
        } else {
            tracing::debug!("Session cleanup: nothing to remove");
        }
        Ok(removed)
    }

    pub async fn health(&self) -> StoreHealth {
        self.store.health().await
    }

    async fn is_stale(&self, key: &str, now: Timestamp) -> Result<bool, AccessError> {
        let Some(raw) = self.store.get(key).await? else {
            return Ok(false);
        };
        Ok(match serde_json::from_str::<Session>(&raw) {
            Ok(session) => session.is_expired_at(now),
            Err(_) => true,
        })
    }

    async fn persist(&self, session: &Session, ttl_secs: u64) -> Result<(), AccessError> {
        let document = serde_json::to_string(session)?;
        self.store
            .set_with_ttl(&session_key(session.id()), &document, ttl_secs)
            .await?;
        Ok(())
    }
}

/// Whole seconds left until expiry, or `None` if none remain.
///
/// Rounds down, so the store may drop the record up to a second before
/// `expires_at`. Reads treat the record as gone from that point on.
fn ttl_secs(session: &Session, now: Timestamp) -> Option<u64> {
    let secs = session.remaining_at(now).num_seconds();
    (secs > 0).then_some(secs as u64)
}
