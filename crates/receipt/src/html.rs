//! Self-contained HTML receipt.

use std::fmt::Write;

use domain::CommittedOrder;

use crate::error::ReceiptError;
use crate::renderer::{ReceiptDocument, ReceiptRenderer};
use crate::Result;

/// Renders an HTML page that opens the print dialog when loaded.
#[derive(Debug, Clone, Default)]
pub struct HtmlReceiptRenderer;

impl HtmlReceiptRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl ReceiptRenderer for HtmlReceiptRenderer {
    #[tracing::instrument(skip_all, fields(customer_id = %order.customer_id))]
    fn render(&self, order: &CommittedOrder) -> Result<ReceiptDocument> {
        if order.records.is_empty() {
            return Err(ReceiptError::EmptyOrder {
                customer_name: order.customer_name.clone(),
            });
        }

        let mut rows = String::new();
        for record in &order.records {
            // Writing to a String cannot fail.
            let _ = write!(
                rows,
                "<tr><td>{}</td><td class=\"num\">{}</td><td class=\"num\">{}</td><td>{}</td></tr>",
                escape(&record.sku_label),
                record.order_qty,
                escape(record.unit_price.as_deref().unwrap_or("")),
                escape(record.remark.as_deref().unwrap_or("")),
            );
        }

        let priced_total = order
            .priced_total()
            .map(|total| format!("<p>Total value: {}</p>", escape(&total.to_decimal_string())))
            .unwrap_or_default();

        let html = format!(
            r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>Order receipt for {customer_name}</title>
<style>
body {{ font-family: sans-serif; margin: 2em; }}
table {{ border-collapse: collapse; width: 100%; }}
th, td {{ border: 1px solid #999; padding: 4px 8px; text-align: left; }}
td.num {{ text-align: right; }}
</style>
</head>
<body onload="window.print()">
<h1>Order receipt</h1>
<p>Customer: {customer_name}</p>
<p>Customer ID: {customer_id}</p>
<p>Taken by: {login_id}</p>
<p>Date: {committed_at}</p>
<table>
<thead><tr><th>Product</th><th>Quantity</th><th>Unit price</th><th>Remark</th></tr></thead>
<tbody>{rows}</tbody>
</table>
<p>Total units ordered: {total_units}</p>
{priced_total}
</body>
</html>
"#,
            customer_name = escape(&order.customer_name),
            customer_id = escape(order.customer_id.as_str()),
            login_id = escape(&order.login_id),
            committed_at = order.committed_at.format("%Y-%m-%d %H:%M:%S UTC"),
            total_units = order.total_units(),
        );

        tracing::debug!(lines = order.records.len(), "receipt rendered");
        Ok(ReceiptDocument { html })
    }
}

/// Escapes text for interpolation into HTML element content or attributes.
pub(crate) fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_replaces_markup() {
        assert_eq!(
            escape(r#"<b>"Tom" & 'Jerry'</b>"#),
            "&lt;b&gt;&quot;Tom&quot; &amp; &#39;Jerry&#39;&lt;/b&gt;"
        );
        assert_eq!(escape("plain"), "plain");
    }
}
