/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Opaque session identifier (canonical hyphenated UUID string).
pub type SessionId = String;
