//! Row shapes exchanged with the external sheets.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Version;

/// One inventory row exactly as the source sheet holds it.
///
/// `available` is kept as cell text; coercion to an integer is the snapshot
/// loader's job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawInventoryRow {
    /// The `SkuShortName` column.
    #[serde(rename = "SkuShortName")]
    pub label: String,

    /// The `Available Qty` column.
    #[serde(rename = "Available Qty")]
    pub available: String,

    #[serde(rename = "Image", default, skip_serializing_if = "Option::is_none")]
    pub image_ref: Option<String>,

    #[serde(rename = "SKU", default, skip_serializing_if = "Option::is_none")]
    pub sku_code: Option<String>,
}

impl RawInventoryRow {
    /// Creates a row with only the required columns.
    pub fn new(label: impl Into<String>, available: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            available: available.into(),
            image_ref: None,
            sku_code: None,
        }
    }

    /// Returns true when every cell is empty.
    pub fn is_blank(&self) -> bool {
        self.label.trim().is_empty()
            && self.available.trim().is_empty()
            && self.image_ref.as_deref().is_none_or(|s| s.trim().is_empty())
            && self.sku_code.as_deref().is_none_or(|s| s.trim().is_empty())
    }
}

/// One durable order-log row. Written once per cart line, never updated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub timestamp: DateTime<Utc>,
    pub login_id: String,
    pub customer_name: String,
    pub customer_id: String,
    pub sku_label: String,
    /// Available quantity the operator saw when adding the line.
    pub available_qty: i64,
    pub order_qty: u32,
    /// Unit price as decimal text, e.g. `"9.99"`.
    pub unit_price: Option<String>,
    pub remark: Option<String>,
}

/// A sheet read wholesale, together with the version it was read at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sheet<T> {
    pub rows: Vec<T>,
    pub version: Version,
}

impl<T> Sheet<T> {
    /// Creates a sheet from rows read at `version`.
    pub fn new(rows: Vec<T>, version: Version) -> Self {
        Self { rows, version }
    }

    /// Returns a sheet that was never written.
    pub fn empty() -> Self {
        Self {
            rows: Vec::new(),
            version: Version::initial(),
        }
    }

    /// Returns the number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if the sheet has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl<T> Default for Sheet<T> {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_row_uses_sheet_column_names() {
        let row = RawInventoryRow::new("Blue Widget", "12");
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["SkuShortName"], "Blue Widget");
        assert_eq!(json["Available Qty"], "12");
        assert!(json.get("Image").is_none());
    }

    #[test]
    fn raw_row_reads_optional_columns() {
        let row: RawInventoryRow = serde_json::from_str(
            r#"{"SkuShortName":"Bolt","Available Qty":"4","SKU":"B-4","Image":"bolt.png"}"#,
        )
        .unwrap();
        assert_eq!(row.sku_code.as_deref(), Some("B-4"));
        assert_eq!(row.image_ref.as_deref(), Some("bolt.png"));
    }

    #[test]
    fn blank_rows_are_detected() {
        assert!(RawInventoryRow::new("", " ").is_blank());
        assert!(!RawInventoryRow::new("", "3").is_blank());

        let mut row = RawInventoryRow::new("", "");
        row.sku_code = Some("X".to_string());
        assert!(!row.is_blank());
    }

    #[test]
    fn empty_sheet_is_at_initial_version() {
        let sheet: Sheet<OrderRecord> = Sheet::empty();
        assert!(sheet.is_empty());
        assert_eq!(sheet.version, Version::initial());
    }
}
