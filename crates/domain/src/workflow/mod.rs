//! The order workflow state machine.

mod interaction;
mod machine;
mod phase;
mod presentation;

pub use interaction::Interaction;
pub use machine::{
    CommitOutcome, CommitRequest, Effect, Transition, WorkflowContext, WorkflowSettings, advance,
    complete_commit, present,
};
pub use phase::WorkflowPhase;
pub use presentation::{
    CartLineView, CartView, CatalogRowView, CatalogView, CommittedView, Notice, NoticeLevel,
    Presentation, SummaryRow, View,
};

use thiserror::Error;

/// Input rejected by a phase. The session is left unchanged.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please enter a valid customer name to continue.")]
    BlankCustomerName,

    #[error("Quantity for {sku_label} cannot be negative (got {quantity})")]
    NegativeQuantity { sku_label: String, quantity: i64 },

    #[error("Unknown product: {sku_label}")]
    UnknownProduct { sku_label: String },

    #[error("{sku_label} is not in the cart")]
    NotInCart { sku_label: String },

    #[error("Invalid price {input:?}: expected a non-negative amount with at most two decimals")]
    InvalidPrice { input: String },

    #[error("Price for {sku_label} is too large for the quantity ordered")]
    PriceOutOfRange { sku_label: String },

    #[error("No items selected!")]
    EmptyCart,
}

/// Why an interaction did not take effect.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WorkflowError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Invalid login or password for {login_id:?}")]
    Authentication { login_id: String },

    #[error("{reason}")]
    ExternalStore { reason: String },

    #[error("{interaction} is not available while in {phase}")]
    UnexpectedInteraction {
        phase: WorkflowPhase,
        interaction: &'static str,
    },
}

impl WorkflowError {
    /// Short machine-readable kind, used as a metrics label.
    pub fn kind(&self) -> &'static str {
        match self {
            WorkflowError::Validation(_) => "validation",
            WorkflowError::Authentication { .. } => "authentication",
            WorkflowError::ExternalStore { .. } => "external_store",
            WorkflowError::UnexpectedInteraction { .. } => "unexpected_interaction",
        }
    }
}
