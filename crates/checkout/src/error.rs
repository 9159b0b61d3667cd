//! Checkout error types.

use common::SessionId;
use domain::DomainError;
use receipt::ReceiptError;
use sheet_store::SheetStoreError;
use thiserror::Error;

/// Errors that can occur while serving a session.
///
/// Workflow rejections are not errors here: they come back as notices on
/// the presentation.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The session id is unknown.
    #[error("Session not found: {0}")]
    SessionNotFound(SessionId),

    /// The session has no committed order to render.
    #[error("Session {0} has no committed order")]
    NoCommittedOrder(SessionId),

    /// Sheet or session store error.
    #[error("Store error: {0}")]
    Store(#[from] SheetStoreError),

    /// Domain error.
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    /// Receipt or export rendering failed.
    #[error("Receipt error: {0}")]
    Receipt(#[from] ReceiptError),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CheckoutError {
    /// Returns true if the session store rejected a stale write.
    pub fn is_conflict(&self) -> bool {
        matches!(self, CheckoutError::Store(e) if e.is_conflict())
    }
}

/// Result type for checkout operations.
pub type Result<T> = std::result::Result<T, CheckoutError>;
