//! Row stores backing the order desk.
//!
//! Three external resources live here:
//! - the inventory sheet, read wholesale and overwritten on commit
//! - the append-only order log
//! - the session store holding serialized workflow state
//!
//! Every write carries the [`Version`] the writer last observed. A store
//! rejects a stale write with [`SheetStoreError::ConcurrencyConflict`]
//! instead of silently overwriting a concurrent writer.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod rows;
pub mod session;
pub mod store;
pub mod version;

pub use common::SessionId;
pub use error::{Result, SheetKind, SheetStoreError};
pub use memory::{InMemorySessionStore, InMemorySheetStore};
pub use postgres::PostgresSheetStore;
pub use rows::{OrderRecord, RawInventoryRow, Sheet};
pub use session::{SessionRecord, SessionStore};
pub use store::{InventorySheet, OrderLogSheet, OrderLogSheetExt, WriteOptions};
pub use version::Version;
