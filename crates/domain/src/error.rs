//! Domain error types.

use sheet_store::SheetStoreError;
use thiserror::Error;

use crate::inventory::SnapshotError;

/// Errors raised while loading domain state from the stores.
#[derive(Debug, Error)]
pub enum DomainError {
    /// An error occurred in a sheet or session store.
    #[error("Store error: {0}")]
    Store(#[from] SheetStoreError),

    /// The inventory sheet holds invalid data.
    #[error("Inventory data error: {0}")]
    Snapshot(#[from] SnapshotError),
}
