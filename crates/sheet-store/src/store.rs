use async_trait::async_trait;

use crate::{OrderRecord, RawInventoryRow, Result, Sheet, Version};

/// Options for overwriting a sheet.
#[derive(Debug, Clone, Default)]
pub struct WriteOptions {
    /// Version the writer read before building its rows.
    /// If None, no version check is performed (use with caution).
    pub expected_version: Option<Version>,
}

impl WriteOptions {
    /// Creates options with no version check.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates options expecting the sheet to be at a specific version.
    pub fn expect_version(version: Version) -> Self {
        Self {
            expected_version: Some(version),
        }
    }

    /// Creates options expecting the sheet to have never been written.
    pub fn expect_new() -> Self {
        Self {
            expected_version: Some(Version::initial()),
        }
    }
}

/// The inventory sheet: read wholesale, overwritten wholesale.
#[async_trait]
pub trait InventorySheet: Send + Sync {
    /// Reads every inventory row in sheet order.
    async fn read_inventory(&self) -> Result<Sheet<RawInventoryRow>>;

    /// Replaces the whole row set.
    ///
    /// Fails with `ConcurrencyConflict` if `options.expected_version` is set
    /// and does not match the current version. Returns the new version.
    async fn overwrite_inventory(
        &self,
        rows: Vec<RawInventoryRow>,
        options: WriteOptions,
    ) -> Result<Version>;
}

/// The order log sheet. Absent logs read as empty at [`Version::initial`].
#[async_trait]
pub trait OrderLogSheet: Send + Sync {
    /// Reads the whole order log in append order.
    async fn read_order_log(&self) -> Result<Sheet<OrderRecord>>;

    /// Replaces the whole order log, creating it if absent.
    async fn overwrite_order_log(
        &self,
        rows: Vec<OrderRecord>,
        options: WriteOptions,
    ) -> Result<Version>;
}

/// Convenience operations on top of [`OrderLogSheet`].
#[async_trait]
pub trait OrderLogSheetExt: OrderLogSheet {
    /// Appends records with read-concat-overwrite.
    ///
    /// The overwrite expects the version that was read, so a concurrent
    /// append surfaces as `ConcurrencyConflict` rather than a lost row.
    async fn append_orders(&self, records: Vec<OrderRecord>) -> Result<Version> {
        let Sheet { mut rows, version } = self.read_order_log().await?;
        rows.extend(records);
        self.overwrite_order_log(rows, WriteOptions::expect_version(version))
            .await
    }

    /// Returns the number of rows currently in the log.
    async fn order_log_len(&self) -> Result<usize> {
        Ok(self.read_order_log().await?.len())
    }
}

impl<T: OrderLogSheet + ?Sized> OrderLogSheetExt for T {}

/// Checks a write's expected version against the current one.
pub(crate) fn check_version(
    sheet: crate::SheetKind,
    current: Version,
    options: &WriteOptions,
) -> Result<()> {
    match options.expected_version {
        Some(expected) if expected != current => {
            Err(crate::SheetStoreError::ConcurrencyConflict {
                sheet,
                expected,
                actual: current,
            })
        }
        _ => Ok(()),
    }
}
