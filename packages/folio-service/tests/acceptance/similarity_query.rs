use std::sync::{Arc, Mutex};

use folio_config::EmbeddingProviderConfig;
use folio_service::{
	BoxFuture, EmbeddingProvider, Error, FolioService, Providers, QueryRequest, Result,
};
use folio_testkit::MemoryIndex;

use super::{COLLECTION, Harness, test_config, topic_vector};

/// Keeps every text it was asked to embed.
struct RecordingEmbedding {
	texts: Arc<Mutex<Vec<String>>>,
}
impl EmbeddingProvider for RecordingEmbedding {
	fn embed<'a>(
		&'a self,
		_cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, Result<Vec<Vec<f32>>>> {
		self.texts.lock().unwrap_or_else(|err| err.into_inner()).extend(texts.iter().cloned());

		let vectors = texts.iter().map(|text| topic_vector(text)).collect();

		Box::pin(async move { Ok(vectors) })
	}
}

fn query(company_id: &str, text: &str) -> QueryRequest {
	QueryRequest {
		company_id: company_id.to_string(),
		query: text.to_string(),
		distance_type: "cosine".to_string(),
		top_k: None,
		score_threshold: None,
	}
}

async fn seeded() -> Harness {
	let harness = Harness::new();

	harness
		.store(
			"acme",
			&[
				(0, "revenue"),
				(1, "revenue and risk"),
				(2, "revenue, risk and staff"),
				(3, "risk"),
				(4, "filler"),
				(5, "staff"),
			],
		)
		.await;

	harness
}

#[tokio::test]
async fn hits_are_ordered_best_first() {
	let harness = seeded().await;
	let response = harness
		.service
		.query(QueryRequest { score_threshold: Some(0.1), ..query("acme", "revenue") })
		.await
		.expect("Query failed.");
	let pages = response.items.iter().map(|item| item.page.page_no).collect::<Vec<_>>();

	assert_eq!(pages, vec![0, 1, 2]);
	assert!(response.items.windows(2).all(|pair| pair[0].score >= pair[1].score));
	assert!((response.items[0].score - 1.0).abs() < 1e-6);
}

#[tokio::test]
async fn top_k_bounds_the_hit_count() {
	let harness = seeded().await;

	for top_k in [1_u32, 2, 3, 10] {
		let response = harness
			.service
			.query(QueryRequest {
				top_k: Some(top_k),
				score_threshold: Some(0.0),
				..query("acme", "revenue")
			})
			.await
			.expect("Query failed.");

		assert!(response.items.len() <= top_k as usize);
	}
}

#[tokio::test]
async fn raising_the_threshold_never_adds_hits() {
	let harness = seeded().await;
	let mut previous = usize::MAX;

	for threshold in [-1.0_f32, 0.0, 0.3, 0.6, 0.9, 1.01] {
		let response = harness
			.service
			.query(QueryRequest {
				top_k: Some(10),
				score_threshold: Some(threshold),
				..query("acme", "revenue")
			})
			.await
			.expect("Query failed.");

		assert!(response.items.len() <= previous, "Threshold {threshold} added hits.");
		assert!(response.items.iter().all(|item| item.score >= threshold));

		previous = response.items.len();
	}

	assert_eq!(previous, 0);
}

#[tokio::test]
async fn unknown_metric_is_rejected_before_any_call() {
	let harness = seeded().await;
	let embedded = harness.embed_calls();
	let err = harness
		.service
		.query(QueryRequest { distance_type: "dot".to_string(), ..query("acme", "revenue") })
		.await
		.expect_err("Expected unknown metric to be rejected.");

	assert!(matches!(err, Error::InvalidRequest { .. }), "Unexpected error: {err:?}");
	assert_eq!(harness.embed_calls(), embedded);
	assert_eq!(harness.index.search_calls(), 0);
}

#[tokio::test]
async fn blank_query_and_tenant_are_rejected() {
	let harness = Harness::new();

	for req in [query("acme", "   "), query("  ", "revenue")] {
		let err = harness.service.query(req).await.expect_err("Expected rejection.");

		assert!(matches!(err, Error::InvalidRequest { .. }), "Unexpected error: {err:?}");
	}

	let err = harness
		.service
		.query(QueryRequest { score_threshold: Some(f32::NAN), ..query("acme", "revenue") })
		.await
		.expect_err("Expected NaN threshold to be rejected.");

	assert!(matches!(err, Error::InvalidRequest { .. }), "Unexpected error: {err:?}");
	assert_eq!(harness.embed_calls(), 0);
}

#[tokio::test]
async fn query_before_any_write_creates_the_collection() {
	let harness = Harness::new();
	let response = harness.service.query(query("acme", "revenue")).await.expect("Query failed.");

	assert!(response.items.is_empty());
	assert!(harness.index.collection_metrics(COLLECTION).is_some());
}

#[tokio::test]
async fn query_text_is_embedded_as_sent() {
	let texts = Arc::new(Mutex::new(Vec::new()));
	let service = FolioService::with_providers(
		test_config("http://127.0.0.1:1", COLLECTION),
		Arc::new(MemoryIndex::new()),
		Providers::new(Arc::new(RecordingEmbedding { texts: texts.clone() })),
	);

	service.query(query("acme", "  Revenue\n")).await.expect("Query failed.");

	let recorded = texts.lock().unwrap_or_else(|err| err.into_inner()).clone();

	assert_eq!(recorded, vec!["  Revenue\n".to_string()]);
}
