use std::sync::Arc;

use folio_service::FolioService;
use folio_storage::qdrant::QdrantStore;

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<FolioService>,
}
impl AppState {
	/// Connects to Qdrant and makes sure the page collection exists before serving.
	pub async fn new(config: folio_config::Config) -> color_eyre::Result<Self> {
		let qdrant = QdrantStore::new(&config.storage.qdrant)?;
		let service = FolioService::new(config, Arc::new(qdrant));

		service.tenant_store.ensure_collection().await?;

		tracing::info!(collection = service.tenant_store.collection(), "Page collection ready.");

		Ok(Self::from_service(service))
	}

	pub fn from_service(service: FolioService) -> Self {
		Self { service: Arc::new(service) }
	}
}
