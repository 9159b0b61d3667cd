//! Receipts and exports for committed orders.
//!
//! - [`ReceiptRenderer`] turns a committed order into a printable document
//! - [`OrderExporter`] turns it into a downloadable spreadsheet
//! - [`HtmlReceiptRenderer`] and [`XlsxOrderExporter`] are the shipped
//!   implementations

pub mod error;
pub mod export;
pub mod html;
pub mod renderer;

pub use error::{ReceiptError, Result};
pub use export::{EXPORT_COLUMNS, EXPORT_SHEET_NAME, XLSX_CONTENT_TYPE, XlsxOrderExporter};
pub use html::HtmlReceiptRenderer;
pub use renderer::{ExportArtifact, OrderExporter, ReceiptDocument, ReceiptRenderer};
