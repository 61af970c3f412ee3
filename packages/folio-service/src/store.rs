use serde::{Deserialize, Serialize};

use crate::{Error, FolioService, Result};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PageInput {
	pub page_no: u32,
	pub page_text: String,
	#[serde(default)]
	pub page_table: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StoreRequest {
	pub company_id: String,
	#[serde(alias = "pdf_data")]
	pub pages: Vec<PageInput>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StoreResponse {
	pub company_id: String,
	pub stored: usize,
}

impl FolioService {
	pub async fn store(&self, req: StoreRequest) -> Result<StoreResponse> {
		let company_id = crate::require_company_id(&req.company_id)?;

		if req.pages.is_empty() {
			return Err(Error::InvalidRequest {
				message: "pages must contain at least one page.".to_string(),
			});
		}

		let stored = self.tenant_store.write(company_id, &req.pages).await?;

		tracing::info!(company_id, page_count = stored, "Stored pages.");

		Ok(StoreResponse { company_id: company_id.to_string(), stored })
	}

	/// Stores a single page.
	pub async fn store_page(&self, company_id: &str, page: PageInput) -> Result<StoreResponse> {
		self.store(StoreRequest { company_id: company_id.to_string(), pages: vec![page] }).await
	}
}
