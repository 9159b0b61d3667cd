//! What to show the operator after an interaction.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog;
use crate::inventory::InventorySnapshot;
use crate::session::{CommittedOrder, Session};
use crate::workflow::{WorkflowError, WorkflowPhase};

/// Severity of a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// A one-off message shown alongside the view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Info, message)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Success, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Warning, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Error, message)
    }

    fn new(level: NoticeLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }
}

impl From<&WorkflowError> for Notice {
    fn from(error: &WorkflowError) -> Self {
        match error {
            WorkflowError::Validation(_) | WorkflowError::UnexpectedInteraction { .. } => {
                Notice::warning(error.to_string())
            }
            WorkflowError::Authentication { .. } | WorkflowError::ExternalStore { .. } => {
                Notice::error(error.to_string())
            }
        }
    }
}

/// Full re-render of one session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Presentation {
    pub phase: WorkflowPhase,
    pub login_id: Option<String>,
    pub customer_name: Option<String>,
    pub customer_id: Option<String>,
    pub notices: Vec<Notice>,
    pub view: View,
}

/// The phase-specific part of a presentation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum View {
    Login,
    IdentifyCustomer,
    Catalog(CatalogView),
    Cart(CartView),
    Committed(CommittedView),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogView {
    pub search_term: String,
    /// Zero-based page index.
    pub page: usize,
    pub page_count: usize,
    pub total_matches: usize,
    pub rows: Vec<CatalogRowView>,
    pub cart_lines: usize,
    /// False when the inventory sheet could not be read for this render.
    pub inventory_loaded: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogRowView {
    pub sku_label: String,
    /// `-` when the sheet has no SKU code.
    pub sku_code: String,
    pub available_qty: i64,
    pub max_orderable: u32,
    pub image_ref: Option<String>,
    /// Quantity already carted for this product.
    pub carted_qty: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartView {
    pub lines: Vec<CartLineView>,
    pub total_units: u64,
    pub priced_total: Option<String>,
    pub can_submit: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLineView {
    pub sku_label: String,
    pub available_qty: i64,
    pub order_qty: u32,
    pub unit_price: Option<String>,
    pub remark: Option<String>,
    pub line_total: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommittedView {
    pub committed_at: DateTime<Utc>,
    pub summary: Vec<SummaryRow>,
    pub total_units: u64,
    pub priced_total: Option<String>,
    pub inventory_synced: bool,
}

/// One row of the order summary table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryRow {
    pub customer_name: String,
    pub sku_label: String,
    pub available_qty: i64,
    pub order_qty: u32,
}

impl Presentation {
    pub(crate) fn build(
        session: &Session,
        snapshot: Option<&InventorySnapshot>,
        page_size: usize,
        mut notices: Vec<Notice>,
    ) -> Self {
        let view = match session.phase {
            WorkflowPhase::Unauthenticated => View::Login,
            WorkflowPhase::IdentifyCustomer => View::IdentifyCustomer,
            WorkflowPhase::Browsing => {
                let view = catalog_view(session, snapshot, page_size);
                if view.inventory_loaded && view.total_matches == 0 {
                    notices.push(Notice::info(if session.search_term.is_empty() {
                        "The catalog is empty.".to_string()
                    } else {
                        format!("No products match \"{}\".", session.search_term)
                    }));
                }
                View::Catalog(view)
            }
            WorkflowPhase::CartReview => View::Cart(cart_view(session)),
            WorkflowPhase::Committed => match &session.committed {
                Some(order) => View::Committed(committed_view(order)),
                None => View::Cart(cart_view(session)),
            },
        };

        Self {
            phase: session.phase,
            login_id: session.login_id.clone(),
            customer_name: session.customer_name.clone(),
            customer_id: session.customer_id.as_ref().map(|id| id.to_string()),
            notices,
            view,
        }
    }

    /// Returns true if any notice is at error level.
    pub fn has_errors(&self) -> bool {
        self.notices.iter().any(|n| n.level == NoticeLevel::Error)
    }
}

fn catalog_view(
    session: &Session,
    snapshot: Option<&InventorySnapshot>,
    page_size: usize,
) -> CatalogView {
    let Some(snapshot) = snapshot else {
        return CatalogView {
            search_term: session.search_term.clone(),
            page: session.page_cursor,
            page_count: 0,
            total_matches: 0,
            rows: Vec::new(),
            cart_lines: session.cart.len(),
            inventory_loaded: false,
        };
    };

    let matches = catalog::search(snapshot, &session.search_term);
    let pages = catalog::page_count(matches.len(), page_size);
    let cursor = catalog::move_cursor(session.page_cursor, 0, pages);
    let rows = catalog::page(&matches, cursor, page_size)
        .iter()
        .map(|row| CatalogRowView {
            sku_label: row.sku_label.clone(),
            sku_code: row.sku_code.clone().unwrap_or_else(|| "-".to_string()),
            available_qty: row.available_qty,
            max_orderable: row.max_orderable(),
            image_ref: row.image_ref.clone(),
            carted_qty: session.cart.get(&row.sku_label).map(|l| l.order_qty),
        })
        .collect();

    CatalogView {
        search_term: session.search_term.clone(),
        page: cursor,
        page_count: pages,
        total_matches: matches.len(),
        rows,
        cart_lines: session.cart.len(),
        inventory_loaded: true,
    }
}

fn cart_view(session: &Session) -> CartView {
    let lines = session
        .cart
        .lines()
        .iter()
        .map(|line| CartLineView {
            sku_label: line.sku_label.clone(),
            available_qty: line.available_qty_at_add_time,
            order_qty: line.order_qty,
            unit_price: line.unit_price.map(|p| p.to_decimal_string()),
            remark: line.remark.clone(),
            line_total: line.line_total().map(|t| t.to_decimal_string()),
        })
        .collect();

    let priced_total = session
        .cart
        .priced_total()
        .ok()
        .flatten()
        .map(|t| t.to_decimal_string());

    CartView {
        lines,
        total_units: session.cart.total_units(),
        priced_total,
        can_submit: !session.cart.is_empty(),
    }
}

fn committed_view(order: &CommittedOrder) -> CommittedView {
    CommittedView {
        committed_at: order.committed_at,
        summary: order
            .records
            .iter()
            .map(|r| SummaryRow {
                customer_name: r.customer_name.clone(),
                sku_label: r.sku_label.clone(),
                available_qty: r.available_qty,
                order_qty: r.order_qty,
            })
            .collect(),
        total_units: order.total_units(),
        priced_total: order.priced_total().map(|t| t.to_decimal_string()),
        inventory_synced: order.inventory_synced,
    }
}
