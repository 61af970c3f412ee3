use folio_service::{ContiguousQueryRequest, Error};

use super::{COLLECTION, Harness, contiguous, page_numbers};

fn sorted(mut pages: Vec<u32>) -> Vec<u32> {
	pages.sort_unstable();

	pages
}

#[tokio::test]
async fn returns_neighbours_of_the_best_page() {
	let harness = Harness::new();

	harness
		.store(
			"acme",
			&[
				(0, "cover"),
				(1, "contents"),
				(2, "letter to shareholders"),
				(3, "revenue grew 12% year over year"),
				(4, "segment detail"),
				(5, "appendix"),
			],
		)
		.await;

	let response = harness
		.service
		.query_contiguous(ContiguousQueryRequest {
			top_k: Some(1),
			..contiguous("acme", "revenue growth")
		})
		.await
		.expect("Contiguous query failed.");

	assert_eq!(sorted(page_numbers(&response.items)), vec![2, 3, 4]);

	for item in &response.items {
		assert_eq!(item.company_id, "acme");
		assert_eq!(item.table, format!("table-{}", item.page_no));
	}
}

#[tokio::test]
async fn window_includes_pages_that_fail_the_threshold() {
	let harness = Harness::new();
	let pages = (0..10)
		.map(|page_no| (page_no, if page_no == 5 { "revenue table" } else { "filler" }))
		.collect::<Vec<_>>();

	harness.store("acme", &pages).await;

	let response = harness
		.service
		.query_contiguous(ContiguousQueryRequest {
			k_before: Some(1),
			k_after: Some(2),
			..contiguous("acme", "revenue")
		})
		.await
		.expect("Contiguous query failed.");

	assert_eq!(sorted(page_numbers(&response.items)), vec![4, 5, 6, 7]);
}

#[tokio::test]
async fn window_is_clamped_at_page_zero() {
	let harness = Harness::new();

	harness.store("acme", &[(0, "revenue summary"), (1, "filler"), (2, "filler")]).await;

	let response = harness
		.service
		.query_contiguous(ContiguousQueryRequest {
			k_before: Some(3),
			k_after: Some(0),
			..contiguous("acme", "revenue")
		})
		.await
		.expect("Contiguous query failed.");

	assert_eq!(page_numbers(&response.items), vec![0]);
}

#[tokio::test]
async fn overlapping_windows_yield_each_page_once() {
	let harness = Harness::new();

	harness
		.store(
			"acme",
			&[
				(0, "filler"),
				(1, "filler"),
				(2, "revenue by region"),
				(3, "filler"),
				(4, "revenue by product"),
				(5, "filler"),
				(6, "filler"),
			],
		)
		.await;

	let response = harness
		.service
		.query_contiguous(contiguous("acme", "revenue"))
		.await
		.expect("Contiguous query failed.");

	assert_eq!(sorted(page_numbers(&response.items)), vec![1, 2, 3, 4, 5]);
}

#[tokio::test]
async fn duplicate_page_numbers_keep_the_first_scanned_row() {
	let harness = Harness::new();

	harness.store("acme", &[(2, "filler"), (3, "revenue draft")]).await;
	harness.store("acme", &[(3, "revenue final"), (4, "filler")]).await;

	assert_eq!(harness.index.point_count(COLLECTION), 4);

	let response = harness
		.service
		.query_contiguous(contiguous("acme", "revenue"))
		.await
		.expect("Contiguous query failed.");

	assert_eq!(page_numbers(&response.items), vec![2, 3, 4]);

	let page_three = response
		.items
		.iter()
		.find(|item| item.page_no == 3)
		.expect("Expected page 3 in the window.");

	assert_eq!(page_three.page_text, "revenue draft");
}

#[tokio::test]
async fn items_follow_scan_order_not_page_order() {
	let harness = Harness::new();

	harness.store("acme", &[(4, "filler"), (2, "filler"), (3, "revenue")]).await;

	let response = harness
		.service
		.query_contiguous(contiguous("acme", "revenue"))
		.await
		.expect("Contiguous query failed.");

	assert_eq!(page_numbers(&response.items), vec![4, 2, 3]);
}

#[tokio::test]
async fn scan_follows_every_scroll_page() {
	let harness = Harness::new();
	let pages = (0..10)
		.map(|page_no| (page_no, if page_no == 5 { "revenue" } else { "filler" }))
		.collect::<Vec<_>>();

	harness.store("acme", &pages).await;

	let response = harness
		.service
		.query_contiguous(ContiguousQueryRequest {
			k_before: Some(5),
			k_after: Some(5),
			..contiguous("acme", "revenue")
		})
		.await
		.expect("Contiguous query failed.");

	assert_eq!(sorted(page_numbers(&response.items)), (0..10).collect::<Vec<_>>());
	// Ten matching rows at two rows per scroll page.
	assert_eq!(harness.index.scroll_calls(), 5);
}

#[tokio::test]
async fn no_seed_hits_skips_the_scan() {
	let harness = Harness::new();

	harness.store("acme", &[(0, "revenue"), (1, "filler")]).await;

	let response = harness
		.service
		.query_contiguous(contiguous("acme", "staff turnover"))
		.await
		.expect("Contiguous query failed.");

	assert!(response.items.is_empty());
	assert_eq!(harness.index.search_calls(), 1);
	assert_eq!(harness.index.scroll_calls(), 0);
}

#[tokio::test]
async fn negative_offsets_can_empty_every_window() {
	let harness = Harness::new();

	harness.store("acme", &[(4, "filler"), (5, "revenue"), (6, "filler")]).await;

	let response = harness
		.service
		.query_contiguous(ContiguousQueryRequest {
			k_before: Some(-1),
			k_after: Some(-1),
			..contiguous("acme", "revenue")
		})
		.await
		.expect("Contiguous query failed.");

	assert!(response.items.is_empty());
	assert_eq!(harness.index.scroll_calls(), 0);
}

#[tokio::test]
async fn oversized_window_is_rejected_before_embedding() {
	let harness = Harness::new();
	let err = harness
		.service
		.query_contiguous(ContiguousQueryRequest {
			k_after: Some(1_000_000),
			..contiguous("acme", "revenue")
		})
		.await
		.expect_err("Expected oversized window to be rejected.");

	assert!(matches!(err, Error::InvalidRequest { .. }), "Unexpected error: {err:?}");
	assert_eq!(harness.embed_calls(), 0);
}

#[tokio::test]
async fn zero_top_k_returns_nothing_without_embedding() {
	let harness = Harness::new();

	harness.store("acme", &[(0, "revenue")]).await;

	let before = harness.embed_calls();
	let response = harness
		.service
		.query_contiguous(ContiguousQueryRequest { top_k: Some(0), ..contiguous("acme", "revenue") })
		.await
		.expect("Contiguous query failed.");

	assert!(response.items.is_empty());
	assert_eq!(harness.embed_calls(), before);
	assert_eq!(harness.index.search_calls(), 0);
}

#[tokio::test]
async fn explicit_metric_is_honoured() {
	let harness = Harness::new();

	harness.store("acme", &[(0, "filler"), (1, "revenue"), (2, "filler"), (3, "filler")]).await;

	// Euclidean scores are distances, so the threshold is an upper bound.
	let response = harness
		.service
		.query_contiguous(ContiguousQueryRequest {
			distance_type: Some("EUCLIDEAN".to_string()),
			score_threshold: Some(0.5),
			k_before: Some(0),
			k_after: Some(1),
			..contiguous("acme", "revenue")
		})
		.await
		.expect("Contiguous query failed.");

	assert_eq!(page_numbers(&response.items), vec![1, 2]);
}
