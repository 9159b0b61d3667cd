//! XLSX export of a committed order.

use domain::CommittedOrder;
use rust_xlsxwriter::{Format, Workbook, Worksheet};
use sheet_store::OrderRecord;

use crate::error::ReceiptError;
use crate::renderer::{ExportArtifact, OrderExporter};
use crate::Result;

/// Name of the single worksheet in the export.
pub const EXPORT_SHEET_NAME: &str = "Order Summary";

/// MIME type of the export.
pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Header row, in column order. The operator who took the order comes last,
/// after the customer-facing columns.
pub const EXPORT_COLUMNS: [&str; 9] = [
    "Timestamp",
    "Customer Name",
    "Customer ID",
    "SkuShortName",
    "Available Qty",
    "Order Quantity",
    "Unit Price",
    "Remark",
    "Login ID",
];

/// Writes the order records to a one-sheet workbook.
#[derive(Debug, Clone, Default)]
pub struct XlsxOrderExporter;

impl XlsxOrderExporter {
    pub fn new() -> Self {
        Self
    }

    fn write_record(sheet: &mut Worksheet, row: u32, record: &OrderRecord) -> Result<()> {
        let timestamp = record.timestamp.format("%Y-%m-%d %H:%M:%S").to_string();
        sheet.write_string(row, 0, &timestamp)?;
        sheet.write_string(row, 1, &record.customer_name)?;
        sheet.write_string(row, 2, &record.customer_id)?;
        sheet.write_string(row, 3, &record.sku_label)?;
        sheet.write_number(row, 4, record.available_qty as f64)?;
        sheet.write_number(row, 5, f64::from(record.order_qty))?;
        if let Some(price) = record.unit_price.as_deref() {
            match price.parse::<f64>() {
                Ok(value) => sheet.write_number(row, 6, value)?,
                Err(_) => sheet.write_string(row, 6, price)?,
            };
        }
        if let Some(remark) = record.remark.as_deref() {
            sheet.write_string(row, 7, remark)?;
        }
        sheet.write_string(row, 8, &record.login_id)?;
        Ok(())
    }
}

impl OrderExporter for XlsxOrderExporter {
    #[tracing::instrument(skip_all, fields(customer_id = %order.customer_id))]
    fn export(&self, order: &CommittedOrder) -> Result<ExportArtifact> {
        if order.records.is_empty() {
            return Err(ReceiptError::EmptyOrder {
                customer_name: order.customer_name.clone(),
            });
        }

        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.set_name(EXPORT_SHEET_NAME)?;

        let header = Format::new().set_bold();
        for (col, title) in (0u16..).zip(EXPORT_COLUMNS) {
            sheet.write_string_with_format(0, col, title, &header)?;
        }
        for (row, record) in (1u32..).zip(&order.records) {
            Self::write_record(sheet, row, record)?;
        }

        let bytes = workbook.save_to_buffer()?;
        tracing::debug!(bytes = bytes.len(), lines = order.records.len(), "order exported");

        Ok(ExportArtifact {
            file_name: format!("{}.xlsx", order.file_stem()),
            content_type: XLSX_CONTENT_TYPE,
            bytes,
        })
    }
}
