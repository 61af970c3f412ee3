use serde::{Deserialize, Serialize};

use crate::{FolioService, Result};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DeleteRequest {
	pub company_id: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DeleteResponse {
	pub company_id: String,
}

impl FolioService {
	/// Removes every page stored for the tenant.
	pub async fn delete(&self, req: DeleteRequest) -> Result<DeleteResponse> {
		let company_id = crate::require_company_id(&req.company_id)?;

		self.tenant_store.delete_tenant(company_id).await?;

		tracing::info!(company_id, "Deleted tenant pages.");

		Ok(DeleteResponse { company_id: company_id.to_string() })
	}
}
