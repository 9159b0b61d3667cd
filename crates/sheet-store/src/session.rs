//! Session store: where per-operator workflow state lives between
//! interactions.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Result, SessionId, Version, WriteOptions};

/// Serialized workflow state of one session at a specific version.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    /// The session this record belongs to.
    pub session_id: SessionId,

    /// Version of the record; bumped on every save.
    pub version: Version,

    /// When the record was last saved.
    pub updated_at: DateTime<Utc>,

    /// The serialized session state.
    pub state: serde_json::Value,
}

impl SessionRecord {
    /// Creates a record from a serializable state.
    pub fn from_state<T: Serialize>(
        session_id: SessionId,
        version: Version,
        state: &T,
    ) -> std::result::Result<Self, serde_json::Error> {
        Ok(Self {
            session_id,
            version,
            updated_at: Utc::now(),
            state: serde_json::to_value(state)?,
        })
    }

    /// Deserializes the record state into a concrete type.
    pub fn into_state<T: for<'de> Deserialize<'de>>(self) -> std::result::Result<T, serde_json::Error> {
        serde_json::from_value(self.state)
    }
}

/// Keyed storage of session records.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Loads a session record, or None if the session was never saved.
    async fn load_session(&self, session_id: SessionId) -> Result<Option<SessionRecord>>;

    /// Saves a session record, replacing the previous one.
    ///
    /// Fails with `ConcurrencyConflict` if `options.expected_version` is set
    /// and does not match the stored version. Returns the new version.
    async fn save_session(&self, record: SessionRecord, options: WriteOptions) -> Result<Version>;

    /// Removes a session record. Removing an unknown session is not an error.
    async fn delete_session(&self, session_id: SessionId) -> Result<()>;
}
