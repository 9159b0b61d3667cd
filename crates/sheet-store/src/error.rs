use thiserror::Error;

use crate::{SessionId, Version};

/// The external resource an operation touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SheetKind {
    Inventory,
    OrderLog,
    Sessions,
}

impl SheetKind {
    /// Returns the storage name of the resource.
    pub fn as_str(&self) -> &'static str {
        match self {
            SheetKind::Inventory => "inventory",
            SheetKind::OrderLog => "order_log",
            SheetKind::Sessions => "sessions",
        }
    }
}

impl std::fmt::Display for SheetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur when reading or writing a sheet.
#[derive(Debug, Error)]
pub enum SheetStoreError {
    /// The writer's version token is stale: someone else wrote in between.
    #[error("Concurrency conflict on {sheet}: expected version {expected}, found {actual}")]
    ConcurrencyConflict {
        sheet: SheetKind,
        expected: Version,
        actual: Version,
    },

    /// The session was not found in the session store.
    #[error("Session not found: {0}")]
    SessionNotFound(SessionId),

    /// The backing store refused or failed the request.
    #[error("{sheet} store unavailable: {reason}")]
    Unavailable { sheet: SheetKind, reason: String },

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SheetStoreError {
    /// Returns true if retrying with a fresh read could succeed.
    pub fn is_conflict(&self) -> bool {
        matches!(self, SheetStoreError::ConcurrencyConflict { .. })
    }
}

/// Result type for sheet store operations.
pub type Result<T> = std::result::Result<T, SheetStoreError>;
