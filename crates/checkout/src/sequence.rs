//! The commit sequence: order log, inventory, receipt.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use domain::{CommitOutcome, CommitRequest, CommittedOrder, InventorySnapshot};
use receipt::{
    ExportArtifact, HtmlReceiptRenderer, OrderExporter, ReceiptRenderer, XlsxOrderExporter,
};
use sheet_store::{InventorySheet, OrderLogSheet, OrderLogSheetExt, OrderRecord, WriteOptions};

/// Step 1: append one order-log row per cart line.
pub const STEP_APPEND_ORDER_LOG: &str = "append_order_log";

/// Step 2: write the decremented inventory back.
pub const STEP_DECREMENT_INVENTORY: &str = "decrement_inventory";

/// Step 3: render the receipt and the export.
pub const STEP_RENDER_RECEIPT: &str = "render_receipt";

/// What a commit run produced.
#[derive(Debug, Clone)]
pub struct CommitReport {
    pub outcome: CommitOutcome,
    /// The export rendered in step 3, when it succeeded.
    pub export: Option<ExportArtifact>,
}

/// Records submitted carts against the order log and inventory sheet.
///
/// A failing step stops nothing that already happened: a recorded order
/// stays recorded even if the inventory write-back or rendering fails.
pub struct CommitSequence<S> {
    sheets: S,
    renderer: Arc<dyn ReceiptRenderer>,
    exporter: Arc<dyn OrderExporter>,
}

impl<S> CommitSequence<S>
where
    S: InventorySheet + OrderLogSheet,
{
    /// Creates a sequence with the HTML receipt and XLSX export.
    pub fn new(sheets: S) -> Self {
        Self::with_renderers(
            sheets,
            Arc::new(HtmlReceiptRenderer::new()),
            Arc::new(XlsxOrderExporter::new()),
        )
    }

    pub fn with_renderers(
        sheets: S,
        renderer: Arc<dyn ReceiptRenderer>,
        exporter: Arc<dyn OrderExporter>,
    ) -> Self {
        Self {
            sheets,
            renderer,
            exporter,
        }
    }

    pub fn sheets(&self) -> &S {
        &self.sheets
    }

    pub fn renderer(&self) -> &dyn ReceiptRenderer {
        self.renderer.as_ref()
    }

    pub fn exporter(&self) -> &dyn OrderExporter {
        self.exporter.as_ref()
    }

    /// Runs the three steps for `request`.
    ///
    /// `snapshot` is the inventory read for this interaction; its version
    /// guards the write-back.
    #[tracing::instrument(
        skip(self, request, snapshot),
        fields(customer_id = %request.customer_id, lines = request.lines.len())
    )]
    pub async fn run(
        &self,
        request: &CommitRequest,
        snapshot: &InventorySnapshot,
        now: DateTime<Utc>,
    ) -> CommitReport {
        let started = Instant::now();
        let records = build_records(request, now);

        tracing::info!(step = STEP_APPEND_ORDER_LOG, "commit step started");
        if let Err(e) = self.sheets.append_orders(records.clone()).await {
            tracing::error!(step = STEP_APPEND_ORDER_LOG, error = %e, "commit step failed");
            record_commit("rejected", started);
            return CommitReport {
                outcome: CommitOutcome::Rejected {
                    reason: format!("The order could not be recorded: {e}"),
                },
                export: None,
            };
        }

        let mut warnings = Vec::new();

        tracing::info!(step = STEP_DECREMENT_INVENTORY, "commit step started");
        let inventory_synced = match self.decrement_inventory(request, snapshot).await {
            Ok(()) => true,
            Err(warning) => {
                tracing::error!(step = STEP_DECREMENT_INVENTORY, %warning, "commit step failed");
                warnings.push(warning);
                false
            }
        };

        let mut order = CommittedOrder {
            login_id: request.login_id.clone(),
            customer_name: request.customer_name.clone(),
            customer_id: request.customer_id.clone(),
            committed_at: now,
            records,
            inventory_synced,
            receipt_html: None,
            export_file_name: None,
        };

        tracing::info!(step = STEP_RENDER_RECEIPT, "commit step started");
        match self.renderer.render(&order) {
            Ok(doc) => order.receipt_html = Some(doc.html),
            Err(e) => {
                tracing::error!(step = STEP_RENDER_RECEIPT, error = %e, "receipt rendering failed");
                warnings.push(format!("The receipt could not be rendered: {e}"));
            }
        }
        let export = match self.exporter.export(&order) {
            Ok(artifact) => {
                order.export_file_name = Some(artifact.file_name.clone());
                Some(artifact)
            }
            Err(e) => {
                tracing::error!(step = STEP_RENDER_RECEIPT, error = %e, "export failed");
                warnings.push(format!("The export could not be produced: {e}"));
                None
            }
        };

        let outcome = if warnings.is_empty() { "recorded" } else { "partial" };
        record_commit(outcome, started);
        tracing::info!(outcome, units = order.total_units(), "commit finished");

        CommitReport {
            outcome: CommitOutcome::Recorded { order, warnings },
            export,
        }
    }

    /// Returns a user-facing warning when the inventory was not fully
    /// reconciled.
    async fn decrement_inventory(
        &self,
        request: &CommitRequest,
        snapshot: &InventorySnapshot,
    ) -> Result<(), String> {
        let mut updated = snapshot.clone();
        let unmatched = updated.decrement(
            request
                .lines
                .iter()
                .map(|line| (line.sku_label.as_str(), line.order_qty)),
        );

        if let Err(e) = self
            .sheets
            .overwrite_inventory(
                updated.to_raw_rows(),
                WriteOptions::expect_version(snapshot.version()),
            )
            .await
        {
            let labels: Vec<&str> = request.lines.iter().map(|l| l.sku_label.as_str()).collect();
            return Err(format!(
                "Order recorded, but inventory was not updated for {}: {e}",
                labels.join(", ")
            ));
        }

        if !unmatched.is_empty() {
            return Err(format!(
                "Order recorded, but these products are no longer in the inventory sheet: {}",
                unmatched.join(", ")
            ));
        }
        Ok(())
    }
}

fn build_records(request: &CommitRequest, now: DateTime<Utc>) -> Vec<OrderRecord> {
    request
        .lines
        .iter()
        .map(|line| OrderRecord {
            timestamp: now,
            login_id: request.login_id.clone(),
            customer_name: request.customer_name.clone(),
            customer_id: request.customer_id.to_string(),
            sku_label: line.sku_label.clone(),
            available_qty: line.available_qty_at_add_time,
            order_qty: line.order_qty,
            unit_price: line.unit_price.map(|p| p.to_decimal_string()),
            remark: line.remark.clone(),
        })
        .collect()
}

fn record_commit(outcome: &'static str, started: Instant) {
    metrics::counter!("order_desk_commits_total", "outcome" => outcome).increment(1);
    metrics::histogram!("order_desk_commit_duration_seconds")
        .record(started.elapsed().as_secs_f64());
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use domain::{CartLine, CustomerId, InventoryRow, Money};
    use sheet_store::{InMemorySheetStore, RawInventoryRow};

    use super::*;

    async fn setup() -> (InMemorySheetStore, InventorySnapshot) {
        let sheets = InMemorySheetStore::with_inventory(vec![
            RawInventoryRow::new("Blue Widget", "10"),
            RawInventoryRow::new("Gizmo", "1"),
        ]);
        let snapshot = InventorySnapshot::load(&sheets, Utc::now()).await.unwrap();
        (sheets, snapshot)
    }

    fn request(lines: &[(&str, i64, u32)]) -> CommitRequest {
        let now = Utc::now();
        CommitRequest {
            login_id: "clerk".to_string(),
            customer_name: "Jane Doe".to_string(),
            customer_id: CustomerId::derive("Jane Doe", now),
            lines: lines
                .iter()
                .map(|&(label, available, qty)| {
                    let mut line =
                        CartLine::for_product(&InventoryRow::new(label, available), qty, now)
                            .unwrap();
                    line.unit_price = Some(Money::from_cents(999));
                    line
                })
                .collect(),
        }
    }

    #[tokio::test]
    async fn records_decrements_and_renders() {
        let (sheets, snapshot) = setup().await;
        let sequence = CommitSequence::new(sheets.clone());

        let report = sequence
            .run(&request(&[("Blue Widget", 10, 3)]), &snapshot, Utc::now())
            .await;

        let CommitOutcome::Recorded { order, warnings } = report.outcome else {
            panic!("expected recorded outcome");
        };
        assert!(warnings.is_empty());
        assert!(order.inventory_synced);
        assert_eq!(order.records.len(), 1);
        assert_eq!(order.records[0].unit_price.as_deref(), Some("9.99"));
        assert!(order.receipt_html.is_some());
        assert_eq!(order.export_file_name.as_deref(), Some("order_Jane_Doe.xlsx"));
        assert!(report.export.is_some());

        assert_eq!(sheets.order_log_len().await.unwrap(), 1);
        let inventory = sheets.read_inventory().await.unwrap();
        assert_eq!(inventory.rows[0].available, "7");
        assert_eq!(inventory.rows[1].available, "1");
    }

    #[tokio::test]
    async fn order_log_failure_records_nothing() {
        let (sheets, snapshot) = setup().await;
        sheets.set_fail_on_order_log_write(true);
        let sequence = CommitSequence::new(sheets.clone());

        let report = sequence
            .run(&request(&[("Blue Widget", 10, 3)]), &snapshot, Utc::now())
            .await;

        assert!(matches!(report.outcome, CommitOutcome::Rejected { .. }));
        assert!(report.export.is_none());
        assert!(!sheets.order_log_exists().await);
        assert_eq!(sheets.read_inventory().await.unwrap().rows[0].available, "10");
    }

    #[tokio::test]
    async fn inventory_failure_is_a_partial_commit() {
        let (sheets, snapshot) = setup().await;
        sheets.set_fail_on_inventory_write(true);
        let sequence = CommitSequence::new(sheets.clone());

        let report = sequence
            .run(&request(&[("Blue Widget", 10, 3)]), &snapshot, Utc::now())
            .await;

        let CommitOutcome::Recorded { order, warnings } = report.outcome else {
            panic!("expected recorded outcome");
        };
        assert!(!order.inventory_synced);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("Blue Widget"));
        assert_eq!(sheets.order_log_len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn stale_snapshot_conflicts_on_write_back() {
        let (sheets, snapshot) = setup().await;
        let sequence = CommitSequence::new(sheets.clone());

        sequence
            .run(&request(&[("Gizmo", 1, 1)]), &snapshot, Utc::now())
            .await;
        let report = sequence
            .run(&request(&[("Blue Widget", 10, 2)]), &snapshot, Utc::now())
            .await;

        let CommitOutcome::Recorded { order, warnings } = report.outcome else {
            panic!("expected recorded outcome");
        };
        assert!(!order.inventory_synced);
        assert!(warnings[0].contains("Concurrency conflict"));
        assert_eq!(sheets.order_log_len().await.unwrap(), 2);

        let inventory = sheets.read_inventory().await.unwrap();
        assert_eq!(inventory.rows[0].available, "10");
        assert_eq!(inventory.rows[1].available, "0");
    }

    #[tokio::test]
    async fn removed_products_are_reported() {
        let (sheets, snapshot) = setup().await;
        let sequence = CommitSequence::new(sheets.clone());

        let report = sequence
            .run(&request(&[("Discontinued", 5, 1)]), &snapshot, Utc::now())
            .await;

        let CommitOutcome::Recorded { warnings, .. } = report.outcome else {
            panic!("expected recorded outcome");
        };
        assert!(warnings[0].contains("Discontinued"));
    }
}
