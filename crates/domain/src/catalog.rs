//! Catalog search and pagination over an inventory snapshot.

use crate::inventory::{InventoryRow, InventorySnapshot};

/// Default number of products per catalog page.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Rows whose label contains `term`, case-insensitively, in sheet order.
/// An empty or whitespace-only term matches everything.
pub fn search<'a>(snapshot: &'a InventorySnapshot, term: &str) -> Vec<&'a InventoryRow> {
    let needle = term.trim().to_lowercase();
    snapshot
        .rows()
        .iter()
        .filter(|row| needle.is_empty() || row.sku_label.to_lowercase().contains(&needle))
        .collect()
}

/// Number of pages needed for `matches` rows; zero when nothing matches.
pub fn page_count(matches: usize, page_size: usize) -> usize {
    matches.div_ceil(page_size.max(1))
}

/// Moves `cursor` by `delta` pages, staying within `[0, pages - 1]`.
///
/// Moving past either end leaves the cursor at that end; there is no
/// wraparound.
pub fn move_cursor(cursor: usize, delta: i64, pages: usize) -> usize {
    let last = pages.saturating_sub(1) as i64;
    (cursor as i64).saturating_add(delta).clamp(0, last) as usize
}

/// Slice of `matches` shown on page `cursor`.
pub fn page<'a, T>(matches: &'a [T], cursor: usize, page_size: usize) -> &'a [T] {
    let page_size = page_size.max(1);
    let start = cursor.saturating_mul(page_size).min(matches.len());
    let end = start.saturating_add(page_size).min(matches.len());
    &matches[start..end]
}
