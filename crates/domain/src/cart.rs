//! Cart lines and the insert-only cart.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::inventory::InventoryRow;
use crate::value_objects::Money;
use crate::workflow::ValidationError;

/// One product/quantity/price/remark entry pending submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub sku_label: String,
    pub available_qty_at_add_time: i64,
    /// Always at least 1 and at most `available_qty_at_add_time`.
    pub order_qty: u32,
    pub unit_price: Option<Money>,
    pub remark: Option<String>,
    pub added_at: DateTime<Utc>,
}

impl CartLine {
    /// Builds a line for `requested` units of `row`, clamped to what the row
    /// has available.
    ///
    /// Returns None when the clamped quantity is zero.
    pub fn for_product(row: &InventoryRow, requested: u32, at: DateTime<Utc>) -> Option<Self> {
        let order_qty = requested.min(row.max_orderable());
        (order_qty > 0).then(|| Self {
            sku_label: row.sku_label.clone(),
            available_qty_at_add_time: row.available_qty,
            order_qty,
            unit_price: None,
            remark: None,
            added_at: at,
        })
    }

    /// Price times quantity, when priced and representable.
    pub fn line_total(&self) -> Option<Money> {
        self.unit_price?.checked_mul(self.order_qty)
    }
}

/// Result of offering a line to the cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartInsert {
    Inserted,
    /// A line for the same label already exists and was left untouched.
    AlreadyPresent,
}

/// Ordered cart holding at most one line per product label.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    /// Creates an empty cart.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `line` unless its label is already carted. Existing lines are
    /// never overwritten.
    pub fn insert_if_absent(&mut self, line: CartLine) -> CartInsert {
        if self.contains(&line.sku_label) {
            return CartInsert::AlreadyPresent;
        }
        self.lines.push(line);
        CartInsert::Inserted
    }

    /// Returns true if a line for `sku_label` exists.
    pub fn contains(&self, sku_label: &str) -> bool {
        self.get(sku_label).is_some()
    }

    /// Returns the line for `sku_label`.
    pub fn get(&self, sku_label: &str) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.sku_label == sku_label)
    }

    /// Returns the line for `sku_label` for price/remark edits.
    pub fn get_mut(&mut self, sku_label: &str) -> Option<&mut CartLine> {
        self.lines.iter_mut().find(|l| l.sku_label == sku_label)
    }

    /// Returns the lines in insertion order.
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Sum of ordered units across all lines.
    pub fn total_units(&self) -> u64 {
        self.lines.iter().map(|l| u64::from(l.order_qty)).sum()
    }

    /// Sum of the priced line totals; `Ok(None)` when no line is priced.
    ///
    /// Fails with the first line whose total, or whose addition to the
    /// running sum, does not fit in [`Money`].
    pub fn priced_total(&self) -> Result<Option<Money>, ValidationError> {
        let mut total = None;
        for line in &self.lines {
            let Some(price) = line.unit_price else {
                continue;
            };
            let out_of_range = || ValidationError::PriceOutOfRange {
                sku_label: line.sku_label.clone(),
            };
            let line_total = price.checked_mul(line.order_qty).ok_or_else(out_of_range)?;
            total = Some(
                total
                    .unwrap_or_else(Money::zero)
                    .checked_add(line_total)
                    .ok_or_else(out_of_range)?,
            );
        }
        Ok(total)
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(label: &str, qty: u32) -> CartLine {
        CartLine::for_product(&InventoryRow::new(label, 10), qty, Utc::now()).unwrap()
    }

    #[test]
    fn for_product_clamps_to_available() {
        let row = InventoryRow::new("Widget", 4);
        let line = CartLine::for_product(&row, 9, Utc::now()).unwrap();
        assert_eq!(line.order_qty, 4);
        assert_eq!(line.available_qty_at_add_time, 4);
    }

    #[test]
    fn for_product_rejects_zero_after_clamp() {
        assert!(CartLine::for_product(&InventoryRow::new("Widget", 0), 3, Utc::now()).is_none());
        assert!(CartLine::for_product(&InventoryRow::new("Widget", -2), 3, Utc::now()).is_none());
        assert!(CartLine::for_product(&InventoryRow::new("Widget", 5), 0, Utc::now()).is_none());
    }

    #[test]
    fn insert_never_overwrites() {
        let mut cart = Cart::new();
        assert_eq!(cart.insert_if_absent(line("Widget", 3)), CartInsert::Inserted);
        assert_eq!(
            cart.insert_if_absent(line("Widget", 7)),
            CartInsert::AlreadyPresent
        );
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.get("Widget").unwrap().order_qty, 3);
    }

    #[test]
    fn lines_keep_insertion_order() {
        let mut cart = Cart::new();
        cart.insert_if_absent(line("B", 1));
        cart.insert_if_absent(line("A", 2));
        let labels: Vec<_> = cart.lines().iter().map(|l| l.sku_label.as_str()).collect();
        assert_eq!(labels, ["B", "A"]);
        assert_eq!(cart.total_units(), 3);
    }

    #[test]
    fn line_total_requires_price() {
        let mut l = line("Widget", 3);
        assert_eq!(l.line_total(), None);
        l.unit_price = Some(Money::from_cents(999));
        assert_eq!(l.line_total(), Some(Money::from_cents(2997)));
    }

    #[test]
    fn priced_total_skips_unpriced_lines() {
        let mut cart = Cart::new();
        cart.insert_if_absent(line("A", 2));
        cart.insert_if_absent(line("B", 1));
        assert_eq!(cart.priced_total(), Ok(None));

        cart.get_mut("A").unwrap().unit_price = Some(Money::from_cents(150));
        assert_eq!(cart.priced_total(), Ok(Some(Money::from_cents(300))));
    }

    #[test]
    fn priced_total_reports_overflowing_line() {
        let mut cart = Cart::new();
        cart.insert_if_absent(line("A", 1));
        cart.insert_if_absent(line("B", 3));
        cart.get_mut("A").unwrap().unit_price = Some(Money::from_cents(i64::MAX / 2));
        cart.get_mut("B").unwrap().unit_price = Some(Money::from_cents(i64::MAX / 2));

        assert_eq!(cart.get("B").unwrap().line_total(), None);
        assert_eq!(
            cart.priced_total(),
            Err(ValidationError::PriceOutOfRange {
                sku_label: "B".to_string()
            })
        );
    }
}
