//! Order checkout: recording submitted carts and driving sessions.
//!
//! The commit sequence runs three steps, each of which can fail on its own:
//! 1. Append the order log
//! 2. Write the decremented inventory back
//! 3. Render the receipt and export
//!
//! Completed steps are never rolled back. [`OrderDesk`] feeds each operator
//! interaction through the workflow state machine, loading inventory and
//! running the commit sequence when the workflow asks for it.

pub mod desk;
pub mod error;
pub mod sequence;

pub use desk::{DeskResponse, OrderDesk};
pub use error::{CheckoutError, Result};
pub use sequence::{
    CommitReport, CommitSequence, STEP_APPEND_ORDER_LOG, STEP_DECREMENT_INVENTORY,
    STEP_RENDER_RECEIPT,
};
