//! Per-operator session state and the committed order it retains.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sheet_store::OrderRecord;

use crate::cart::Cart;
use crate::value_objects::{CustomerId, Money};
use crate::workflow::WorkflowPhase;

/// Everything the workflow remembers between interactions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub authenticated: bool,
    pub login_id: Option<String>,
    pub customer_name: Option<String>,
    pub customer_id: Option<CustomerId>,
    pub phase: WorkflowPhase,
    pub cart: Cart,
    pub page_cursor: usize,
    pub search_term: String,
    /// Set once a submit has recorded the order; cleared by starting a new
    /// order.
    pub committed: Option<CommittedOrder>,
}

impl Session {
    /// Creates an empty, unauthenticated session.
    pub fn new() -> Self {
        Self::default()
    }
}

/// The finalized order kept for the receipt and export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommittedOrder {
    pub login_id: String,
    pub customer_name: String,
    pub customer_id: CustomerId,
    pub committed_at: DateTime<Utc>,
    /// The rows appended to the order log, in cart order.
    pub records: Vec<OrderRecord>,
    /// False when the order log was appended but the inventory write-back
    /// failed.
    pub inventory_synced: bool,
    /// Receipt rendered at commit time.
    #[serde(default)]
    pub receipt_html: Option<String>,
    /// Download name of the export rendered at commit time.
    #[serde(default)]
    pub export_file_name: Option<String>,
}

impl CommittedOrder {
    /// Sum of ordered units.
    pub fn total_units(&self) -> u64 {
        self.records.iter().map(|r| u64::from(r.order_qty)).sum()
    }

    /// Sum of priced line totals; unpriced lines are skipped.
    ///
    /// None when nothing is priced or the total does not fit in [`Money`].
    pub fn priced_total(&self) -> Option<Money> {
        let mut priced = self
            .records
            .iter()
            .filter_map(|r| {
                let price = Money::parse_price(r.unit_price.as_deref()?).ok()?;
                Some(price.checked_mul(r.order_qty))
            })
            .peekable();
        priced.peek()?;
        Money::checked_sum(priced.collect::<Option<Vec<_>>>()?)
    }

    /// File name stem derived from the customer name, spaces replaced by
    /// underscores.
    pub fn file_stem(&self) -> String {
        format!("order_{}", self.customer_name.replace(' ', "_"))
    }
}
