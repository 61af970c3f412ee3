//! Page windows around seed hits.
//!
//! Windows are combined as a set of page numbers rather than merged intervals: the scan that
//! follows filters on membership, so overlapping windows collapse without interval arithmetic.

use std::{
	collections::{BTreeSet, HashSet},
	ops::RangeInclusive,
};

use folio_storage::models::{PagePayload, StoredPage};

pub use folio_config::MAX_WINDOW_RADIUS;

/// Pages `[max(0, page - k_before), page + k_after]`, or `None` when the range is empty.
///
/// Negative offsets are allowed and may empty the range.
pub fn window(page_no: u32, k_before: i64, k_after: i64) -> Option<RangeInclusive<u32>> {
	let page = i64::from(page_no);
	let start = page.saturating_sub(k_before).max(0);
	let end = page.saturating_add(k_after).min(i64::from(u32::MAX));

	if end < start {
		return None;
	}

	Some(start as u32..=end as u32)
}

pub fn target_pages(
	seed_pages: impl IntoIterator<Item = u32>,
	k_before: i64,
	k_after: i64,
) -> BTreeSet<u32> {
	let mut pages = BTreeSet::new();

	for seed in seed_pages {
		if let Some(range) = window(seed, k_before, k_after) {
			pages.extend(range);
		}
	}

	pages
}

/// Keeps the first row seen for each page number, preserving scroll order.
pub fn dedup_by_page(rows: impl IntoIterator<Item = StoredPage>) -> Vec<PagePayload> {
	let mut seen = HashSet::new();
	let mut out = Vec::new();

	for row in rows {
		if seen.insert(row.payload.page_no) {
			out.push(row.payload);
		}
	}

	out
}
