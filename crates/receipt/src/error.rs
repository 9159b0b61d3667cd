//! Receipt error types.

use thiserror::Error;

/// Errors that can occur while rendering a receipt or export.
#[derive(Debug, Error)]
pub enum ReceiptError {
    /// The spreadsheet writer failed.
    #[error("Spreadsheet export error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    /// The order has nothing to render.
    #[error("Order for {customer_name} has no lines")]
    EmptyOrder { customer_name: String },
}

/// Result type for receipt operations.
pub type Result<T> = std::result::Result<T, ReceiptError>;
