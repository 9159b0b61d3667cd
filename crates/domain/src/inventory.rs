//! Inventory snapshots: the catalog as read from the inventory sheet.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sheet_store::{InventorySheet, RawInventoryRow, Sheet, Version};

use crate::error::DomainError;

/// Errors in the inventory sheet's data.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SnapshotError {
    #[error("duplicate product label {label:?} in inventory sheet")]
    DuplicateLabel { label: String },

    #[error("inventory sheet row {row} has no product label")]
    MissingLabel { row: usize },
}

/// One catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryRow {
    pub sku_label: String,
    /// May go negative after commits that outran the sheet.
    pub available_qty: i64,
    pub image_ref: Option<String>,
    pub sku_code: Option<String>,
}

impl InventoryRow {
    /// Creates a row with no image or SKU code.
    pub fn new(sku_label: impl Into<String>, available_qty: i64) -> Self {
        Self {
            sku_label: sku_label.into(),
            available_qty,
            image_ref: None,
            sku_code: None,
        }
    }

    /// Largest quantity an operator may order from this row.
    pub fn max_orderable(&self) -> u32 {
        u32::try_from(self.available_qty.max(0)).unwrap_or(u32::MAX)
    }

    fn to_raw(&self) -> RawInventoryRow {
        RawInventoryRow {
            label: self.sku_label.clone(),
            available: self.available_qty.to_string(),
            image_ref: self.image_ref.clone(),
            sku_code: self.sku_code.clone(),
        }
    }
}

/// Coerces an `Available Qty` cell to an integer; anything non-numeric is 0.
///
/// Fractional numbers are truncated toward zero (`"3.0"` and `"3.7"` are 3).
pub fn coerce_quantity(cell: &str) -> i64 {
    let cell = cell.trim();
    if let Ok(n) = cell.parse::<i64>() {
        return n;
    }
    match cell.parse::<f64>() {
        Ok(f) if f.is_finite() => f.trunc() as i64,
        _ => 0,
    }
}

/// Point-in-time copy of the inventory sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventorySnapshot {
    rows: Vec<InventoryRow>,
    version: Version,
    loaded_at: DateTime<Utc>,
}

impl InventorySnapshot {
    /// Loads and normalizes the inventory sheet.
    #[tracing::instrument(skip(sheet))]
    pub async fn load<S>(sheet: &S, loaded_at: DateTime<Utc>) -> Result<Self, DomainError>
    where
        S: InventorySheet + ?Sized,
    {
        let raw = sheet.read_inventory().await?;
        let snapshot = Self::from_sheet(raw, loaded_at)?;
        tracing::debug!(
            rows = snapshot.rows.len(),
            version = %snapshot.version,
            "inventory snapshot loaded"
        );
        Ok(snapshot)
    }

    /// Normalizes raw rows: drops blank rows, trims labels, coerces
    /// quantities, and rejects missing or duplicate labels.
    pub fn from_sheet(
        sheet: Sheet<RawInventoryRow>,
        loaded_at: DateTime<Utc>,
    ) -> Result<Self, SnapshotError> {
        let mut seen = HashSet::new();
        let mut rows = Vec::with_capacity(sheet.rows.len());

        for (index, raw) in sheet.rows.into_iter().enumerate() {
            if raw.is_blank() {
                continue;
            }
            let label = raw.label.trim().to_string();
            if label.is_empty() {
                return Err(SnapshotError::MissingLabel { row: index + 1 });
            }
            if !seen.insert(label.clone()) {
                return Err(SnapshotError::DuplicateLabel { label });
            }
            rows.push(InventoryRow {
                sku_label: label,
                available_qty: coerce_quantity(&raw.available),
                image_ref: non_empty(raw.image_ref),
                sku_code: non_empty(raw.sku_code),
            });
        }

        Ok(Self {
            rows,
            version: sheet.version,
            loaded_at,
        })
    }

    /// Builds a snapshot directly from normalized rows.
    pub fn from_rows(rows: Vec<InventoryRow>, version: Version, loaded_at: DateTime<Utc>) -> Self {
        Self {
            rows,
            version,
            loaded_at,
        }
    }

    /// Returns all rows in sheet order.
    pub fn rows(&self) -> &[InventoryRow] {
        &self.rows
    }

    /// Returns the row with the given label.
    pub fn get(&self, sku_label: &str) -> Option<&InventoryRow> {
        self.rows.iter().find(|r| r.sku_label == sku_label)
    }

    /// Version of the sheet this snapshot was read at.
    pub fn version(&self) -> Version {
        self.version
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Subtracts each `(label, qty)` from the matching row. No floor at zero.
    ///
    /// Returns the labels that matched no row.
    pub fn decrement<'a, I>(&mut self, lines: I) -> Vec<String>
    where
        I: IntoIterator<Item = (&'a str, u32)>,
    {
        let mut unmatched = Vec::new();
        for (label, qty) in lines {
            match self.rows.iter_mut().find(|r| r.sku_label == label) {
                Some(row) => row.available_qty -= i64::from(qty),
                None => unmatched.push(label.to_string()),
            }
        }
        unmatched
    }

    /// Converts back to sheet rows for write-back.
    pub fn to_raw_rows(&self) -> Vec<RawInventoryRow> {
        self.rows.iter().map(InventoryRow::to_raw).collect()
    }
}

fn non_empty(cell: Option<String>) -> Option<String> {
    cell.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use sheet_store::InMemorySheetStore;

    use super::*;

    fn sheet(rows: Vec<RawInventoryRow>) -> Sheet<RawInventoryRow> {
        Sheet::new(rows, Version::first())
    }

    #[test]
    fn coerce_quantity_handles_sheet_cells() {
        assert_eq!(coerce_quantity("12"), 12);
        assert_eq!(coerce_quantity(" 7 "), 7);
        assert_eq!(coerce_quantity("3.0"), 3);
        assert_eq!(coerce_quantity("3.9"), 3);
        assert_eq!(coerce_quantity("-2"), -2);
        assert_eq!(coerce_quantity("n/a"), 0);
        assert_eq!(coerce_quantity(""), 0);
        assert_eq!(coerce_quantity("NaN"), 0);
    }

    #[test]
    fn from_sheet_normalizes_rows() {
        let mut bolt = RawInventoryRow::new(" Bolt ", "oops");
        bolt.sku_code = Some("  ".to_string());
        bolt.image_ref = Some("bolt.png".to_string());

        let snapshot = InventorySnapshot::from_sheet(
            sheet(vec![
                RawInventoryRow::new("Widget", "10"),
                RawInventoryRow::new("", ""),
                bolt,
            ]),
            Utc::now(),
        )
        .unwrap();

        assert_eq!(snapshot.len(), 2);
        let bolt = snapshot.get("Bolt").unwrap();
        assert_eq!(bolt.available_qty, 0);
        assert_eq!(bolt.sku_code, None);
        assert_eq!(bolt.image_ref.as_deref(), Some("bolt.png"));
        assert_eq!(snapshot.version(), Version::first());
    }

    #[test]
    fn from_sheet_rejects_duplicates() {
        let result = InventorySnapshot::from_sheet(
            sheet(vec![
                RawInventoryRow::new("Widget", "1"),
                RawInventoryRow::new("Widget ", "2"),
            ]),
            Utc::now(),
        );
        assert_eq!(
            result,
            Err(SnapshotError::DuplicateLabel {
                label: "Widget".to_string()
            })
        );
    }

    #[test]
    fn from_sheet_rejects_missing_label() {
        let result = InventorySnapshot::from_sheet(
            sheet(vec![RawInventoryRow::new("  ", "5")]),
            Utc::now(),
        );
        assert_eq!(result, Err(SnapshotError::MissingLabel { row: 1 }));
    }

    #[test]
    fn decrement_has_no_floor() {
        let mut snapshot = InventorySnapshot::from_rows(
            vec![InventoryRow::new("Widget", 2), InventoryRow::new("Gadget", 5)],
            Version::first(),
            Utc::now(),
        );

        let unmatched = snapshot.decrement([("Widget", 3), ("Gizmo", 1)]);
        assert_eq!(unmatched, vec!["Gizmo".to_string()]);
        assert_eq!(snapshot.get("Widget").unwrap().available_qty, -1);
        assert_eq!(snapshot.get("Widget").unwrap().max_orderable(), 0);
        assert_eq!(snapshot.get("Gadget").unwrap().available_qty, 5);

        let raw = snapshot.to_raw_rows();
        assert_eq!(raw[0].available, "-1");
    }

    #[tokio::test]
    async fn load_reads_the_sheet() {
        let store = InMemorySheetStore::with_inventory(vec![RawInventoryRow::new("Widget", "4")]);
        let snapshot = InventorySnapshot::load(&store, Utc::now()).await.unwrap();
        assert_eq!(snapshot.get("Widget").unwrap().available_qty, 4);
    }

    #[tokio::test]
    async fn load_surfaces_store_failures() {
        let store = InMemorySheetStore::new();
        store.set_fail_on_inventory_read(true);
        let result = InventorySnapshot::load(&store, Utc::now()).await;
        assert!(matches!(result, Err(DomainError::Store(_))));
    }
}
