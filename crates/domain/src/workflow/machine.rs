//! The pure transition function.
//!
//! `advance` never performs I/O. Submitting a cart yields an [`Effect`] that
//! the caller carries out, reporting back through [`complete_commit`].

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::cart::{CartInsert, CartLine};
use crate::catalog::{self, DEFAULT_PAGE_SIZE};
use crate::credentials::CredentialSet;
use crate::inventory::InventorySnapshot;
use crate::session::{CommittedOrder, Session};
use crate::value_objects::{CustomerId, Money};
use crate::workflow::{
    Interaction, Notice, Presentation, ValidationError, WorkflowError, WorkflowPhase,
};

/// Tunables for the workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkflowSettings {
    pub page_size: usize,
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Everything an interaction may read besides the session itself.
#[derive(Debug, Clone, Copy)]
pub struct WorkflowContext<'a> {
    pub credentials: &'a CredentialSet,
    pub settings: WorkflowSettings,
    pub now: DateTime<Utc>,
    /// Present when the inventory sheet was read for this interaction.
    pub snapshot: Option<&'a InventorySnapshot>,
}

impl<'a> WorkflowContext<'a> {
    pub fn new(credentials: &'a CredentialSet, settings: WorkflowSettings, now: DateTime<Utc>) -> Self {
        Self {
            credentials,
            settings,
            now,
            snapshot: None,
        }
    }

    pub fn with_snapshot(mut self, snapshot: &'a InventorySnapshot) -> Self {
        self.snapshot = Some(snapshot);
        self
    }
}

/// A submitted cart, ready to be recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRequest {
    pub login_id: String,
    pub customer_name: String,
    pub customer_id: CustomerId,
    /// Non-empty, in cart order.
    pub lines: Vec<CartLine>,
}

/// Side effect requested by a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Commit(CommitRequest),
}

/// Result of carrying out a [`CommitRequest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    /// Nothing was recorded.
    Rejected { reason: String },

    /// The order log was appended. `warnings` name any later step that
    /// failed.
    Recorded {
        order: CommittedOrder,
        warnings: Vec<String>,
    },
}

/// Output of one interaction.
#[derive(Debug, Clone)]
pub struct Transition {
    pub session: Session,
    pub presentation: Presentation,
    pub effect: Option<Effect>,
    /// Why the interaction was refused; the session is then unchanged.
    pub rejection: Option<WorkflowError>,
}

/// Applies one interaction to a session.
///
/// On rejection the returned session equals the input and the presentation
/// carries a notice explaining why.
pub fn advance(session: &Session, interaction: Interaction, ctx: &WorkflowContext<'_>) -> Transition {
    let from = session.phase;
    let name = interaction.name();
    let mut next = session.clone();
    let mut notices = Vec::new();

    match apply(&mut next, interaction, ctx, &mut notices) {
        Ok(effect) => {
            debug_assert!(from.can_transition_to(next.phase));
            if from != next.phase {
                tracing::info!(%from, to = %next.phase, interaction = name, "phase transition");
            }
            let presentation = Presentation::build(&next, ctx.snapshot, ctx.settings.page_size, notices);
            Transition {
                session: next,
                presentation,
                effect,
                rejection: None,
            }
        }
        Err(error) => {
            tracing::warn!(phase = %from, interaction = name, %error, "interaction rejected");
            let presentation = Presentation::build(
                session,
                ctx.snapshot,
                ctx.settings.page_size,
                vec![Notice::from(&error)],
            );
            Transition {
                session: session.clone(),
                presentation,
                effect: None,
                rejection: Some(error),
            }
        }
    }
}

/// Folds the outcome of a commit back into the session that requested it.
pub fn complete_commit(session: &Session, outcome: CommitOutcome, ctx: &WorkflowContext<'_>) -> Transition {
    match outcome {
        CommitOutcome::Rejected { reason } => {
            let error = WorkflowError::ExternalStore { reason };
            tracing::error!(%error, "commit rejected");
            let presentation = Presentation::build(
                session,
                ctx.snapshot,
                ctx.settings.page_size,
                vec![Notice::from(&error)],
            );
            Transition {
                session: session.clone(),
                presentation,
                effect: None,
                rejection: Some(error),
            }
        }
        CommitOutcome::Recorded { order, warnings } => {
            let mut next = session.clone();
            debug_assert!(next.phase.can_transition_to(WorkflowPhase::Committed));

            let mut notices = vec![Notice::success(format!(
                "Order submitted: {} units for {}.",
                order.total_units(),
                order.customer_name
            ))];
            notices.extend(warnings.into_iter().map(Notice::error));

            tracing::info!(
                from = %next.phase,
                to = %WorkflowPhase::Committed,
                lines = order.records.len(),
                "phase transition"
            );
            next.phase = WorkflowPhase::Committed;
            next.committed = Some(order);

            let presentation = Presentation::build(&next, ctx.snapshot, ctx.settings.page_size, notices);
            Transition {
                session: next,
                presentation,
                effect: None,
                rejection: None,
            }
        }
    }
}

/// Re-renders a session without changing it.
pub fn present(session: &Session, ctx: &WorkflowContext<'_>) -> Presentation {
    Presentation::build(session, ctx.snapshot, ctx.settings.page_size, Vec::new())
}

fn apply(
    session: &mut Session,
    interaction: Interaction,
    ctx: &WorkflowContext<'_>,
    notices: &mut Vec<Notice>,
) -> Result<Option<Effect>, WorkflowError> {
    let phase = session.phase;
    let name = interaction.name();
    let require = |allowed: bool| {
        if allowed {
            Ok(())
        } else {
            Err(WorkflowError::UnexpectedInteraction {
                phase,
                interaction: name,
            })
        }
    };

    match interaction {
        Interaction::Refresh => {}

        Interaction::Logout => {
            *session = Session::new();
            notices.push(Notice::info("Logged out."));
        }

        Interaction::Login { login_id, secret } => {
            require(phase.can_login())?;
            let login_id = login_id.trim();
            if !ctx.credentials.verify(login_id, &secret) {
                return Err(WorkflowError::Authentication {
                    login_id: login_id.to_string(),
                });
            }
            session.authenticated = true;
            session.login_id = Some(login_id.to_string());
            session.phase = WorkflowPhase::IdentifyCustomer;
            notices.push(Notice::success(format!("Logged in as {login_id}.")));
        }

        Interaction::IdentifyCustomer { customer_name } => {
            require(phase.can_identify_customer())?;
            let name = customer_name.trim();
            if name.is_empty() {
                return Err(ValidationError::BlankCustomerName.into());
            }
            let customer_id = CustomerId::derive(name, ctx.now);
            notices.push(Notice::info(format!("Customer: {name} ({customer_id})")));
            session.customer_name = Some(name.to_string());
            session.customer_id = Some(customer_id);
            session.page_cursor = 0;
            session.search_term.clear();
            session.phase = WorkflowPhase::Browsing;
        }

        Interaction::Browse {
            search_term,
            page_delta,
            qty_edits,
        } => {
            require(phase.can_browse())?;
            let snapshot = ctx.snapshot.ok_or_else(inventory_unavailable)?;
            browse(session, snapshot, search_term, page_delta, qty_edits, ctx, notices)?;
        }

        Interaction::ViewCart => {
            require(phase.can_browse())?;
            session.phase = WorkflowPhase::CartReview;
        }

        Interaction::EditCart {
            price_edits,
            remark_edits,
        } => {
            require(phase.can_review_cart())?;
            edit_cart(session, price_edits, remark_edits)?;
        }

        Interaction::Submit { .. } if phase == WorkflowPhase::Committed => {
            notices.push(Notice::info("This order was already submitted."));
        }

        Interaction::Submit {
            price_edits,
            remark_edits,
        } => {
            require(phase.can_review_cart())?;
            edit_cart(session, price_edits, remark_edits)?;
            if session.cart.is_empty() {
                return Err(ValidationError::EmptyCart.into());
            }
            ctx.snapshot.ok_or_else(inventory_unavailable)?;

            let (Some(login_id), Some(customer_name), Some(customer_id)) = (
                session.login_id.clone(),
                session.customer_name.clone(),
                session.customer_id.clone(),
            ) else {
                return Err(WorkflowError::UnexpectedInteraction {
                    phase,
                    interaction: name,
                });
            };

            return Ok(Some(Effect::Commit(CommitRequest {
                login_id,
                customer_name,
                customer_id,
                lines: session.cart.lines().to_vec(),
            })));
        }

        Interaction::Back => {
            require(phase.can_review_cart())?;
            session.phase = WorkflowPhase::Browsing;
        }

        Interaction::StartNewOrder => {
            require(phase.can_start_new_order())?;
            session.cart.clear();
            session.committed = None;
            session.page_cursor = 0;
            session.search_term.clear();
            session.phase = WorkflowPhase::Browsing;
        }
    }

    Ok(None)
}

fn browse(
    session: &mut Session,
    snapshot: &InventorySnapshot,
    search_term: Option<String>,
    page_delta: i64,
    qty_edits: BTreeMap<String, i64>,
    ctx: &WorkflowContext<'_>,
    notices: &mut Vec<Notice>,
) -> Result<(), WorkflowError> {
    for (sku_label, &quantity) in &qty_edits {
        if quantity < 0 {
            return Err(ValidationError::NegativeQuantity {
                sku_label: sku_label.clone(),
                quantity,
            }
            .into());
        }
        if snapshot.get(sku_label).is_none() {
            return Err(ValidationError::UnknownProduct {
                sku_label: sku_label.clone(),
            }
            .into());
        }
    }

    if let Some(term) = search_term {
        let term = term.trim();
        if term != session.search_term {
            session.search_term = term.to_string();
            session.page_cursor = 0;
        }
    }
    let matches = catalog::search(snapshot, &session.search_term).len();
    let pages = catalog::page_count(matches, ctx.settings.page_size);
    session.page_cursor = catalog::move_cursor(session.page_cursor, page_delta, pages);

    for (sku_label, quantity) in qty_edits {
        if quantity == 0 {
            continue;
        }
        if let Some(existing) = session.cart.get(&sku_label) {
            if i64::from(existing.order_qty) != quantity {
                notices.push(Notice::info(format!(
                    "{sku_label} is already in the cart with quantity {}.",
                    existing.order_qty
                )));
            }
            continue;
        }
        let Some(row) = snapshot.get(&sku_label) else {
            continue;
        };
        let requested = u32::try_from(quantity).unwrap_or(u32::MAX);
        match CartLine::for_product(row, requested, ctx.now) {
            Some(line) => {
                if i64::from(line.order_qty) < quantity {
                    notices.push(Notice::warning(format!(
                        "Only {} of {sku_label} available; quantity reduced.",
                        line.order_qty
                    )));
                }
                if session.cart.insert_if_absent(line) == CartInsert::Inserted {
                    tracing::debug!(sku_label = %sku_label, "cart line added");
                }
            }
            None => notices.push(Notice::warning(format!("{sku_label} is out of stock."))),
        }
    }

    Ok(())
}

/// Applies price/remark edits all-or-nothing: every edit is validated
/// before any line changes.
fn edit_cart(
    session: &mut Session,
    price_edits: BTreeMap<String, String>,
    remark_edits: BTreeMap<String, String>,
) -> Result<(), WorkflowError> {
    let in_cart = |sku_label: &String| {
        if session.cart.contains(sku_label) {
            Ok(())
        } else {
            Err(ValidationError::NotInCart {
                sku_label: sku_label.clone(),
            })
        }
    };

    let mut prices = Vec::with_capacity(price_edits.len());
    for (sku_label, input) in price_edits {
        in_cart(&sku_label)?;
        let price = match input.trim() {
            "" => None,
            text => Some(Money::parse_price(text)?),
        };
        prices.push((sku_label, price));
    }
    for sku_label in remark_edits.keys() {
        in_cart(sku_label)?;
    }

    let mut cart = session.cart.clone();
    for (sku_label, price) in prices {
        if let Some(line) = cart.get_mut(&sku_label) {
            line.unit_price = price;
        }
    }
    cart.priced_total()?;
    session.cart = cart;
    for (sku_label, remark) in remark_edits {
        if let Some(line) = session.cart.get_mut(&sku_label) {
            let remark = remark.trim();
            line.remark = (!remark.is_empty()).then(|| remark.to_string());
        }
    }
    Ok(())
}

fn inventory_unavailable() -> WorkflowError {
    WorkflowError::ExternalStore {
        reason: "The inventory sheet is unavailable; please retry.".to_string(),
    }
}
