//! Domain layer for the order desk.
//!
//! This crate provides:
//! - Inventory snapshots loaded from the inventory sheet
//! - Catalog search and pagination
//! - The cart, session and committed order types
//! - The workflow state machine driving each operator session

pub mod cart;
pub mod catalog;
pub mod credentials;
pub mod error;
pub mod inventory;
pub mod session;
pub mod value_objects;
pub mod workflow;

pub use cart::{Cart, CartInsert, CartLine};
pub use credentials::{CredentialParseError, CredentialSet};
pub use error::DomainError;
pub use inventory::{InventoryRow, InventorySnapshot, SnapshotError, coerce_quantity};
pub use session::{CommittedOrder, Session};
pub use value_objects::{CustomerId, Money};
pub use workflow::{
    CommitOutcome, CommitRequest, Effect, Interaction, Notice, NoticeLevel, Presentation,
    Transition, ValidationError, View, WorkflowContext, WorkflowError, WorkflowPhase,
    WorkflowSettings, advance, complete_commit, present,
};
