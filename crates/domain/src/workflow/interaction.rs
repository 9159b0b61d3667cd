//! Interactions: one per user action.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A user action carrying the payload of the phase it targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Interaction {
    /// Re-render without changing anything.
    Refresh,

    Login {
        login_id: String,
        secret: String,
    },

    /// Drops the whole session, from any phase.
    Logout,

    IdentifyCustomer {
        customer_name: String,
    },

    /// Catalog form: optional new search term, page move, quantity edits.
    Browse {
        #[serde(default)]
        search_term: Option<String>,
        #[serde(default)]
        page_delta: i64,
        #[serde(default)]
        qty_edits: BTreeMap<String, i64>,
    },

    ViewCart,

    /// Price/remark edits on carted lines.
    EditCart {
        #[serde(default)]
        price_edits: BTreeMap<String, String>,
        #[serde(default)]
        remark_edits: BTreeMap<String, String>,
    },

    /// Applies any edits, then submits the cart.
    Submit {
        #[serde(default)]
        price_edits: BTreeMap<String, String>,
        #[serde(default)]
        remark_edits: BTreeMap<String, String>,
    },

    /// Back from the cart to the catalog.
    Back,

    StartNewOrder,
}

impl Interaction {
    /// Shorthand for a page move with no search or edits.
    pub fn page(delta: i64) -> Self {
        Interaction::Browse {
            search_term: None,
            page_delta: delta,
            qty_edits: BTreeMap::new(),
        }
    }

    /// Shorthand for a search with no page move or edits.
    pub fn search(term: impl Into<String>) -> Self {
        Interaction::Browse {
            search_term: Some(term.into()),
            page_delta: 0,
            qty_edits: BTreeMap::new(),
        }
    }

    /// Shorthand for quantity edits only.
    pub fn set_quantities<I, S>(edits: I) -> Self
    where
        I: IntoIterator<Item = (S, i64)>,
        S: Into<String>,
    {
        Interaction::Browse {
            search_term: None,
            page_delta: 0,
            qty_edits: edits.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    /// Shorthand for a submit with no edits.
    pub fn submit() -> Self {
        Interaction::Submit {
            price_edits: BTreeMap::new(),
            remark_edits: BTreeMap::new(),
        }
    }

    /// Returns the interaction name.
    pub fn name(&self) -> &'static str {
        match self {
            Interaction::Refresh => "refresh",
            Interaction::Login { .. } => "login",
            Interaction::Logout => "logout",
            Interaction::IdentifyCustomer { .. } => "identify_customer",
            Interaction::Browse { .. } => "browse",
            Interaction::ViewCart => "view_cart",
            Interaction::EditCart { .. } => "edit_cart",
            Interaction::Submit { .. } => "submit",
            Interaction::Back => "back",
            Interaction::StartNewOrder => "start_new_order",
        }
    }
}
