//! Workflow phase state machine.

use serde::{Deserialize, Serialize};

/// The phase of one operator session.
///
/// State transitions:
/// ```text
/// Unauthenticated ──► IdentifyCustomer ──► Browsing ◄──► CartReview ──► Committed
///                                              ▲                            │
///                                              └──── start new order ───────┘
/// ```
/// Logout returns any phase to `Unauthenticated`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum WorkflowPhase {
    /// No credentials accepted yet.
    #[default]
    Unauthenticated,

    /// Logged in, waiting for the customer name.
    IdentifyCustomer,

    /// Searching and paging the catalog, adding cart lines.
    Browsing,

    /// Reviewing the cart: prices, remarks, submit.
    CartReview,

    /// Order recorded; only a new order can follow.
    Committed,
}

impl WorkflowPhase {
    /// Every phase, in workflow order.
    pub const ALL: [WorkflowPhase; 5] = [
        WorkflowPhase::Unauthenticated,
        WorkflowPhase::IdentifyCustomer,
        WorkflowPhase::Browsing,
        WorkflowPhase::CartReview,
        WorkflowPhase::Committed,
    ];

    /// Returns true if credentials can be presented in this phase.
    pub fn can_login(&self) -> bool {
        matches!(self, WorkflowPhase::Unauthenticated)
    }

    /// Returns true if a customer name can be entered in this phase.
    pub fn can_identify_customer(&self) -> bool {
        matches!(self, WorkflowPhase::IdentifyCustomer)
    }

    /// Returns true if catalog search, paging and quantity edits apply.
    pub fn can_browse(&self) -> bool {
        matches!(self, WorkflowPhase::Browsing)
    }

    /// Returns true if cart prices/remarks can be edited and submitted.
    pub fn can_review_cart(&self) -> bool {
        matches!(self, WorkflowPhase::CartReview)
    }

    /// Returns true if a new order can be started.
    pub fn can_start_new_order(&self) -> bool {
        matches!(self, WorkflowPhase::Committed)
    }

    /// Returns true if an inventory snapshot is needed to serve this phase
    /// or the phase it may move into.
    pub fn needs_inventory(&self) -> bool {
        !matches!(self, WorkflowPhase::Unauthenticated)
    }

    /// Returns true if `next` is reachable from `self` in one interaction.
    pub fn can_transition_to(&self, next: WorkflowPhase) -> bool {
        use WorkflowPhase::*;

        if *self == next || next == Unauthenticated {
            return true;
        }
        matches!(
            (self, next),
            (Unauthenticated, IdentifyCustomer)
                | (IdentifyCustomer, Browsing)
                | (Browsing, CartReview)
                | (CartReview, Browsing)
                | (CartReview, Committed)
                | (Committed, Browsing)
        )
    }

    /// Returns the phase name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowPhase::Unauthenticated => "Unauthenticated",
            WorkflowPhase::IdentifyCustomer => "IdentifyCustomer",
            WorkflowPhase::Browsing => "Browsing",
            WorkflowPhase::CartReview => "CartReview",
            WorkflowPhase::Committed => "Committed",
        }
    }
}

impl std::fmt::Display for WorkflowPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
