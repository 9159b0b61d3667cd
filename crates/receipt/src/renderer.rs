//! Renderer and exporter seams.

use domain::CommittedOrder;

use crate::Result;

/// A printable receipt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptDocument {
    pub html: String,
}

/// A downloadable file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    pub file_name: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

/// Turns a committed order into a printable document.
pub trait ReceiptRenderer: Send + Sync {
    fn render(&self, order: &CommittedOrder) -> Result<ReceiptDocument>;
}

/// Turns a committed order into a downloadable file.
pub trait OrderExporter: Send + Sync {
    fn export(&self, order: &CommittedOrder) -> Result<ExportArtifact>;
}
