//! Session and message entities.
//!
//! A [`Session`] is a time-bounded record of one client's conversation.
//! Its `expires_at` is always derived from the privacy retention window at
//! creation time and never taken from a caller.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::privacy::PrivacySettings;
use crate::types::{SessionId, Timestamp};

/// Default number of trailing messages considered by [`Session::context`].
pub const DEFAULT_CONTEXT_MESSAGES: usize = 10;

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// Who produced a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    User,
    System,
    #[serde(alias = "analysis")]
    AnalysisResult,
}

/// One turn of conversation. Owned by exactly one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub kind: MessageKind,
    pub content: String,
    pub created_at: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Map<String, serde_json::Value>>,
}

impl Message {
    pub fn new(kind: MessageKind, content: impl Into<String>, created_at: Timestamp) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            kind,
            content: content.into(),
            created_at,
            metadata: None,
        }
    }

    pub fn user(content: impl Into<String>, created_at: Timestamp) -> Self {
        Self::new(MessageKind::User, content, created_at)
    }

    pub fn system(content: impl Into<String>, created_at: Timestamp) -> Self {
        Self::new(MessageKind::System, content, created_at)
    }

    pub fn analysis_result(content: impl Into<String>, created_at: Timestamp) -> Self {
        Self::new(MessageKind::AnalysisResult, content, created_at)
    }

    pub fn with_metadata(mut self, metadata: serde_json::Map<String, serde_json::Value>) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// Lifecycle status reported to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Active,
    Expired,
}

/// A client's bounded interaction window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    id: SessionId,
    created_at: Timestamp,
    last_activity_at: Timestamp,
    expires_at: Timestamp,
    #[serde(default)]
    messages: Vec<Message>,
    #[serde(default)]
    analysis_references: Vec<String>,
    privacy_settings: PrivacySettings,
}

impl Session {
    /// Build a new session created at `now` with a fresh id.
    pub fn new(privacy_settings: PrivacySettings, now: Timestamp) -> Self {
        let expires_at = now + privacy_settings.retention();
        Self {
            id: Uuid::new_v4().to_string(),
            created_at: now,
            last_activity_at: now,
            expires_at,
            messages: Vec::new(),
            analysis_references: Vec::new(),
            privacy_settings,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    pub fn last_activity_at(&self) -> Timestamp {
        self.last_activity_at
    }

    pub fn expires_at(&self) -> Timestamp {
        self.expires_at
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn analysis_references(&self) -> &[String] {
        &self.analysis_references
    }

    pub fn privacy_settings(&self) -> &PrivacySettings {
        &self.privacy_settings
    }

    /// A session is expired from the instant `now` reaches `expires_at`.
    pub fn is_expired_at(&self, now: Timestamp) -> bool {
        now >= self.expires_at
    }

    pub fn status_at(&self, now: Timestamp) -> SessionStatus {
        if self.is_expired_at(now) {
            SessionStatus::Expired
        } else {
            SessionStatus::Active
        }
    }

    /// Time left before expiry; zero or negative once expired.
    pub fn remaining_at(&self, now: Timestamp) -> Duration {
        self.expires_at - now
    }

    pub fn touch(&mut self, now: Timestamp) {
        self.last_activity_at = now;
    }

    pub fn push_message(&mut self, message: Message, now: Timestamp) {
        self.messages.push(message);
        self.touch(now);
    }

    pub fn push_analysis(&mut self, analysis_id: impl Into<String>, now: Timestamp) {
        self.analysis_references.push(analysis_id.into());
        self.touch(now);
    }

    /// Contents of user messages among the last `max_messages` entries,
    /// oldest first. Read-only; safe on an expired session.
    pub fn context(&self, max_messages: usize) -> Vec<String> {
        let start = self.messages.len().saturating_sub(max_messages);
        self.messages[start..]
            .iter()
            .filter(|m| m.kind == MessageKind::User)
            .map(|m| m.content.clone())
            .collect()
    }
}

/// Read-only projection of a session's recent conversation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionContext {
    pub session_id: SessionId,
    pub context: Vec<String>,
    pub message_count: usize,
    pub analysis_count: usize,
}

impl SessionContext {
    pub fn of(session: &Session, max_messages: usize) -> Self {
        Self {
            session_id: session.id.clone(),
            context: session.context(max_messages),
            message_count: session.messages.len(),
            analysis_count: session.analysis_references.len(),
        }
    }
}
