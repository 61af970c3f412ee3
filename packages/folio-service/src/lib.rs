pub mod contiguous;
pub mod delete;
pub mod embedding;
pub mod query;
pub mod store;
pub mod tenant;
pub mod window;

mod error;

use std::sync::Arc;

pub use contiguous::{ContiguousQueryRequest, ContiguousQueryResponse};
pub use delete::{DeleteRequest, DeleteResponse};
pub use embedding::Embedder;
pub use error::{Error, Result};
pub use folio_storage::{
	BoxFuture,
	models::{Metric, PagePayload},
};
pub use query::{QueryItem, QueryRequest, QueryResponse};
pub use store::{PageInput, StoreRequest, StoreResponse};
pub use tenant::TenantStore;

use folio_config::{Config, EmbeddingProviderConfig};
use folio_storage::index::VectorIndex;

/// Turns text into vectors of the configured dimension.
///
/// Implementations backed by a local, compute-bound model should run inference on
/// `tokio::task::spawn_blocking` so embedding never stalls the I/O tasks sharing the runtime.
pub trait EmbeddingProvider
where
	Self: Send + Sync,
{
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, Result<Vec<Vec<f32>>>>;
}

#[derive(Clone)]
pub struct Providers {
	pub embedding: Arc<dyn EmbeddingProvider>,
}

pub struct FolioService {
	pub cfg: Config,
	pub tenant_store: TenantStore,
	pub embedder: Embedder,
}

struct DefaultProviders;

impl EmbeddingProvider for DefaultProviders {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, Result<Vec<Vec<f32>>>> {
		Box::pin(async move { Ok(folio_providers::embedding::embed(cfg, texts).await?) })
	}
}

impl Providers {
	pub fn new(embedding: Arc<dyn EmbeddingProvider>) -> Self {
		Self { embedding }
	}
}

impl Default for Providers {
	fn default() -> Self {
		Self { embedding: Arc::new(DefaultProviders) }
	}
}

impl FolioService {
	pub fn new(cfg: Config, index: Arc<dyn VectorIndex>) -> Self {
		Self::with_providers(cfg, index, Providers::default())
	}

	pub fn with_providers(cfg: Config, index: Arc<dyn VectorIndex>, providers: Providers) -> Self {
		let embedder = Embedder::new(
			providers.embedding,
			cfg.providers.embedding.clone(),
			cfg.storage.qdrant.vector_dim,
		);
		let tenant_store = TenantStore::new(index, embedder.clone(), &cfg.storage.qdrant);

		Self { cfg, tenant_store, embedder }
	}
}

pub(crate) fn require_company_id(company_id: &str) -> Result<&str> {
	let company_id = company_id.trim();

	if company_id.is_empty() {
		return Err(Error::InvalidRequest { message: "company_id is required.".to_string() });
	}

	Ok(company_id)
}

pub(crate) fn parse_metric(raw: &str) -> Result<Metric> {
	raw.parse::<Metric>().map_err(Error::from)
}
