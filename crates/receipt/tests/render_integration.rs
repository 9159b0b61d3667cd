//! Renders committed orders and reads the exports back.

use std::io::Cursor;

use calamine::{Data, Reader, Xlsx, open_workbook_from_rs};
use chrono::{TimeZone, Utc};
use domain::{CommittedOrder, CustomerId};
use receipt::{
    EXPORT_COLUMNS, EXPORT_SHEET_NAME, HtmlReceiptRenderer, OrderExporter, ReceiptError,
    ReceiptRenderer, XLSX_CONTENT_TYPE, XlsxOrderExporter,
};
use sheet_store::OrderRecord;

fn order(customer_name: &str, lines: &[(&str, u32, Option<&str>, Option<&str>)]) -> CommittedOrder {
    let at = Utc.with_ymd_and_hms(2026, 10, 16, 9, 30, 0).unwrap();
    let customer_id = CustomerId::derive(customer_name, at);
    CommittedOrder {
        login_id: "clerk".to_string(),
        customer_name: customer_name.to_string(),
        customer_id: customer_id.clone(),
        committed_at: at,
        records: lines
            .iter()
            .map(|&(sku, qty, price, remark)| OrderRecord {
                timestamp: at,
                login_id: "clerk".to_string(),
                customer_name: customer_name.to_string(),
                customer_id: customer_id.to_string(),
                sku_label: sku.to_string(),
                available_qty: 10,
                order_qty: qty,
                unit_price: price.map(str::to_string),
                remark: remark.map(str::to_string),
            })
            .collect(),
        inventory_synced: true,
        receipt_html: None,
        export_file_name: None,
    }
}

fn read_back(bytes: Vec<u8>) -> Vec<Vec<Data>> {
    let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes)).unwrap();
    assert_eq!(workbook.sheet_names(), vec![EXPORT_SHEET_NAME.to_string()]);
    let range = workbook.worksheet_range(EXPORT_SHEET_NAME).unwrap();
    range.rows().map(|row| row.to_vec()).collect()
}

mod html_receipt {
    use super::*;

    #[test]
    fn lists_lines_and_total_units() {
        let doc = HtmlReceiptRenderer::new()
            .render(&order(
                "Jane Doe",
                &[("Blue Widget", 3, Some("9.99"), None), ("Gizmo", 2, None, Some("gift"))],
            ))
            .unwrap();

        assert_eq!(doc.html.matches("window.print()").count(), 1);
        assert!(doc.html.contains("Customer: Jane Doe"));
        assert!(doc.html.contains("Blue Widget"));
        assert!(doc.html.contains("gift"));
        assert!(doc.html.contains("Total units ordered: 5"));
        assert!(doc.html.contains("Total value: 29.97"));
    }

    #[test]
    fn escapes_interpolated_text() {
        let doc = HtmlReceiptRenderer::new()
            .render(&order(
                "<script>alert(1)</script>",
                &[("A & B", 1, None, Some("\"quoted\""))],
            ))
            .unwrap();

        assert!(!doc.html.contains("<script>alert(1)</script>"));
        assert!(doc.html.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
        assert!(doc.html.contains("A &amp; B"));
        assert!(doc.html.contains("&quot;quoted&quot;"));
    }

    #[test]
    fn empty_order_is_an_error() {
        let result = HtmlReceiptRenderer::new().render(&order("Jane Doe", &[]));
        assert!(matches!(result, Err(ReceiptError::EmptyOrder { .. })));
    }
}

mod xlsx_export {
    use super::*;

    #[test]
    fn names_the_file_after_the_customer() {
        let artifact = XlsxOrderExporter::new()
            .export(&order("Jane Q Doe", &[("Blue Widget", 3, None, None)]))
            .unwrap();
        assert_eq!(artifact.file_name, "order_Jane_Q_Doe.xlsx");
        assert_eq!(artifact.content_type, XLSX_CONTENT_TYPE);
    }

    #[test]
    fn writes_header_and_one_row_per_line() {
        let artifact = XlsxOrderExporter::new()
            .export(&order(
                "Jane Doe",
                &[("Blue Widget", 3, Some("9.99"), Some("rush")), ("Gizmo", 1, None, None)],
            ))
            .unwrap();

        let rows = read_back(artifact.bytes);
        assert_eq!(rows.len(), 3);

        let header: Vec<String> = rows[0]
            .iter()
            .map(|cell| match cell {
                Data::String(s) => s.clone(),
                other => panic!("unexpected header cell {other:?}"),
            })
            .collect();
        assert_eq!(header, EXPORT_COLUMNS);
        assert_eq!(
            header,
            [
                "Timestamp",
                "Customer Name",
                "Customer ID",
                "SkuShortName",
                "Available Qty",
                "Order Quantity",
                "Unit Price",
                "Remark",
                "Login ID",
            ]
        );

        let first = &rows[1];
        assert_eq!(first[0], Data::String("2026-10-16 09:30:00".to_string()));
        assert_eq!(first[1], Data::String("Jane Doe".to_string()));
        assert_eq!(first[3], Data::String("Blue Widget".to_string()));
        assert_eq!(first[4], Data::Float(10.0));
        assert_eq!(first[5], Data::Float(3.0));
        assert_eq!(first[6], Data::Float(9.99));
        assert_eq!(first[7], Data::String("rush".to_string()));
        assert_eq!(first[8], Data::String("clerk".to_string()));

        let second = &rows[2];
        assert_eq!(second[3], Data::String("Gizmo".to_string()));
        assert_eq!(second[6], Data::Empty);
    }

    #[test]
    fn empty_order_is_an_error() {
        let result = XlsxOrderExporter::new().export(&order("Jane Doe", &[]));
        assert!(matches!(result, Err(ReceiptError::EmptyOrder { .. })));
    }
}
