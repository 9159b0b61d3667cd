use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::{
    OrderRecord, RawInventoryRow, Result, SessionId, SessionRecord, SessionStore, Sheet,
    SheetKind, SheetStoreError, Version,
    store::{InventorySheet, OrderLogSheet, WriteOptions, check_version},
};

#[derive(Debug, Default)]
struct Faults {
    inventory_read: AtomicBool,
    inventory_write: AtomicBool,
    order_log_write: AtomicBool,
}

/// In-memory inventory sheet and order log.
///
/// Clones share the same underlying sheets, so a clone behaves like a second
/// client of the same spreadsheet. Failures can be injected per operation.
#[derive(Clone, Default)]
pub struct InMemorySheetStore {
    inventory: Arc<RwLock<Sheet<RawInventoryRow>>>,
    order_log: Arc<RwLock<Option<Sheet<OrderRecord>>>>,
    faults: Arc<Faults>,
}

impl InMemorySheetStore {
    /// Creates a store with an empty inventory sheet and no order log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store whose inventory sheet already holds `rows`.
    pub fn with_inventory(rows: Vec<RawInventoryRow>) -> Self {
        Self {
            inventory: Arc::new(RwLock::new(Sheet::new(rows, Version::first()))),
            ..Self::default()
        }
    }

    /// Configures inventory reads to fail.
    pub fn set_fail_on_inventory_read(&self, fail: bool) {
        self.faults.inventory_read.store(fail, Ordering::SeqCst);
    }

    /// Configures inventory overwrites to fail.
    pub fn set_fail_on_inventory_write(&self, fail: bool) {
        self.faults.inventory_write.store(fail, Ordering::SeqCst);
    }

    /// Configures order log overwrites to fail.
    pub fn set_fail_on_order_log_write(&self, fail: bool) {
        self.faults.order_log_write.store(fail, Ordering::SeqCst);
    }

    /// Returns true once the order log has been written at least once.
    pub async fn order_log_exists(&self) -> bool {
        self.order_log.read().await.is_some()
    }
}

fn injected(sheet: SheetKind, flag: &AtomicBool) -> Result<()> {
    if flag.load(Ordering::SeqCst) {
        return Err(SheetStoreError::Unavailable {
            sheet,
            reason: "injected failure".to_string(),
        });
    }
    Ok(())
}

#[async_trait]
impl InventorySheet for InMemorySheetStore {
    async fn read_inventory(&self) -> Result<Sheet<RawInventoryRow>> {
        injected(SheetKind::Inventory, &self.faults.inventory_read)?;
        Ok(self.inventory.read().await.clone())
    }

    async fn overwrite_inventory(
        &self,
        rows: Vec<RawInventoryRow>,
        options: WriteOptions,
    ) -> Result<Version> {
        injected(SheetKind::Inventory, &self.faults.inventory_write)?;

        let mut sheet = self.inventory.write().await;
        check_version(SheetKind::Inventory, sheet.version, &options)?;

        let version = sheet.version.next();
        *sheet = Sheet::new(rows, version);
        Ok(version)
    }
}

#[async_trait]
impl OrderLogSheet for InMemorySheetStore {
    async fn read_order_log(&self) -> Result<Sheet<OrderRecord>> {
        Ok(self
            .order_log
            .read()
            .await
            .clone()
            .unwrap_or_else(Sheet::empty))
    }

    async fn overwrite_order_log(
        &self,
        rows: Vec<OrderRecord>,
        options: WriteOptions,
    ) -> Result<Version> {
        injected(SheetKind::OrderLog, &self.faults.order_log_write)?;

        let mut log = self.order_log.write().await;
        let current = log.as_ref().map_or(Version::initial(), |s| s.version);
        check_version(SheetKind::OrderLog, current, &options)?;

        let version = current.next();
        *log = Some(Sheet::new(rows, version));
        Ok(version)
    }
}

/// In-memory session store for tests and single-process deployments.
#[derive(Clone, Default)]
pub struct InMemorySessionStore {
    sessions: Arc<RwLock<HashMap<SessionId, SessionRecord>>>,
}

impl InMemorySessionStore {
    /// Creates an empty session store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored sessions.
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn load_session(&self, session_id: SessionId) -> Result<Option<SessionRecord>> {
        Ok(self.sessions.read().await.get(&session_id).cloned())
    }

    async fn save_session(
        &self,
        mut record: SessionRecord,
        options: WriteOptions,
    ) -> Result<Version> {
        let mut sessions = self.sessions.write().await;
        let current = sessions
            .get(&record.session_id)
            .map_or(Version::initial(), |r| r.version);
        check_version(SheetKind::Sessions, current, &options)?;

        let version = current.next();
        record.version = version;
        record.updated_at = Utc::now();
        sessions.insert(record.session_id, record);
        Ok(version)
    }

    async fn delete_session(&self, session_id: SessionId) -> Result<()> {
        self.sessions.write().await.remove(&session_id);
        Ok(())
    }
}
