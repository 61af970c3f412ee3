use std::sync::Arc;

use folio_service::{Error, FolioService, Metric, Providers, StoreRequest};
use folio_storage::{
	BoxFuture, Result as StorageResult,
	filter::PageFilter,
	index::{ScrollArgs, SearchArgs, VectorIndex},
	models::{PagePoint, ScoredPage, ScrollPage},
};
use folio_testkit::MemoryIndex;

use super::{
	COLLECTION, FixedEmbedding, Harness, TopicEmbedding, VECTOR_DIM, page, test_config,
	topic_vector,
};

/// Never sees the collection, as a writer that lost the creation race would.
struct StaleExistsIndex {
	inner: MemoryIndex,
}
impl VectorIndex for StaleExistsIndex {
	fn collection_exists<'a>(&'a self, _collection: &'a str) -> BoxFuture<'a, StorageResult<bool>> {
		Box::pin(async move { Ok(false) })
	}

	fn create_collection<'a>(
		&'a self,
		collection: &'a str,
		vector_dim: u32,
		metrics: &'a [Metric],
	) -> BoxFuture<'a, StorageResult<()>> {
		self.inner.create_collection(collection, vector_dim, metrics)
	}

	fn upsert<'a>(
		&'a self,
		collection: &'a str,
		points: &'a [PagePoint],
	) -> BoxFuture<'a, StorageResult<()>> {
		self.inner.upsert(collection, points)
	}

	fn delete_by_filter<'a>(
		&'a self,
		collection: &'a str,
		filter: &'a PageFilter,
	) -> BoxFuture<'a, StorageResult<()>> {
		self.inner.delete_by_filter(collection, filter)
	}

	fn search<'a>(
		&'a self,
		collection: &'a str,
		args: SearchArgs<'a>,
	) -> BoxFuture<'a, StorageResult<Vec<ScoredPage>>> {
		self.inner.search(collection, args)
	}

	fn scroll<'a>(
		&'a self,
		collection: &'a str,
		args: ScrollArgs<'a>,
	) -> BoxFuture<'a, StorageResult<ScrollPage>> {
		self.inner.scroll(collection, args)
	}
}

#[tokio::test]
async fn ensure_collection_is_idempotent() {
	let harness = Harness::new();

	for _ in 0..3 {
		harness.service.tenant_store.ensure_collection().await.expect("Ensure failed.");
	}

	assert_eq!(harness.index.create_calls(), 1);

	let (vector_dim, metrics) =
		harness.index.collection_metrics(COLLECTION).expect("Expected the collection to exist.");

	assert_eq!(vector_dim, VECTOR_DIM);
	assert_eq!(metrics, Metric::ALL.to_vec());
}

#[tokio::test]
async fn losing_the_creation_race_counts_as_success() {
	let index = Arc::new(StaleExistsIndex { inner: MemoryIndex::new() });
	let service = FolioService::with_providers(
		test_config("http://127.0.0.1:1", COLLECTION),
		index.clone(),
		Providers::new(Arc::new(TopicEmbedding::new())),
	);

	service.tenant_store.ensure_collection().await.expect("First ensure failed.");
	service.tenant_store.ensure_collection().await.expect("Second ensure failed.");

	assert_eq!(index.inner.create_calls(), 2);

	service.store_page("acme", page(0, "revenue")).await.expect("Store after race failed.");

	assert_eq!(index.inner.point_count(COLLECTION), 1);
}

#[tokio::test]
async fn store_embeds_the_batch_once_and_keeps_payloads() {
	let harness = Harness::new();
	let response = harness
		.service
		.store(StoreRequest {
			company_id: "acme".to_string(),
			pages: vec![page(0, "cover"), page(1, "revenue"), page(2, "risk factors")],
		})
		.await
		.expect("Store failed.");

	assert_eq!(response.stored, 3);
	assert_eq!(harness.embed_calls(), 1);
	assert_eq!(harness.index.upsert_calls(), 1);

	let payloads = harness.index.payloads(COLLECTION);

	assert_eq!(payloads.len(), 3);
	assert_eq!(payloads[1].page_no, 1);
	assert_eq!(payloads[1].page_text, "revenue");
	assert_eq!(payloads[1].table, "table-1");
}

#[tokio::test]
async fn write_retries_once_after_the_collection_disappears() {
	let harness = Harness::new();

	harness.index.drop_collection_before_next_upsert();

	let response = harness
		.service
		.store(StoreRequest {
			company_id: "acme".to_string(),
			pages: vec![page(0, "cover"), page(1, "revenue"), page(2, "risk factors")],
		})
		.await
		.expect("Store after collection drop failed.");

	assert_eq!(response.stored, 3);
	assert_eq!(harness.embed_calls(), 1);
	assert_eq!(harness.index.upsert_calls(), 2);
	assert_eq!(harness.index.create_calls(), 2);
	assert_eq!(harness.index.point_count(COLLECTION), 3);

	let pages = harness.index.payloads(COLLECTION).iter().map(|p| p.page_no).collect::<Vec<_>>();

	assert_eq!(pages, vec![0, 1, 2]);
}

#[tokio::test]
async fn store_page_writes_a_single_row() {
	let harness = Harness::new();
	let response =
		harness.service.store_page("acme", page(7, "staff costs")).await.expect("Store failed.");

	assert_eq!(response.stored, 1);
	assert_eq!(harness.index.point_count(COLLECTION), 1);
}

#[tokio::test]
async fn empty_batches_are_rejected() {
	let harness = Harness::new();
	let err = harness
		.service
		.store(StoreRequest { company_id: "acme".to_string(), pages: Vec::new() })
		.await
		.expect_err("Expected empty batch to be rejected.");

	assert!(matches!(err, Error::InvalidRequest { .. }), "Unexpected error: {err:?}");
	assert_eq!(harness.embed_calls(), 0);
	assert_eq!(harness.index.create_calls(), 0);
}

#[tokio::test]
async fn embedding_count_mismatch_stores_nothing() {
	let index = Arc::new(MemoryIndex::new());
	let service = FolioService::with_providers(
		test_config("http://127.0.0.1:1", COLLECTION),
		index.clone(),
		Providers::new(Arc::new(FixedEmbedding { vectors: vec![topic_vector("revenue")] })),
	);
	let err = service
		.store(StoreRequest {
			company_id: "acme".to_string(),
			pages: vec![page(0, "revenue"), page(1, "risk")],
		})
		.await
		.expect_err("Expected count mismatch to fail.");

	let Error::EmbeddingUnavailable { message } = err else {
		panic!("Unexpected error: {err:?}");
	};

	assert_eq!(message, "Embedding provider test returned 1 vectors for 2 texts.");
	assert_eq!(index.point_count(COLLECTION), 0);
}

#[tokio::test]
async fn embedding_dimension_mismatch_is_rejected() {
	let index = Arc::new(MemoryIndex::new());
	let service = FolioService::with_providers(
		test_config("http://127.0.0.1:1", COLLECTION),
		index.clone(),
		Providers::new(Arc::new(FixedEmbedding { vectors: vec![vec![1.0, 0.0]] })),
	);
	let err = service
		.store_page("acme", page(0, "revenue"))
		.await
		.expect_err("Expected dimension mismatch to fail.");

	let Error::EmbeddingUnavailable { message } = err else {
		panic!("Unexpected error: {err:?}");
	};

	assert_eq!(message, "Embedding provider test returned dimension 2, expected 4.");
	assert_eq!(index.upsert_calls(), 0);
}
