use serde::{Deserialize, Serialize};

use folio_storage::models::PagePayload;

use crate::{
	Error, FolioService, Result,
	query::SeedQuery,
	window::{self, MAX_WINDOW_RADIUS},
};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ContiguousQueryRequest {
	pub company_id: String,
	pub query: String,
	pub distance_type: Option<String>,
	pub top_k: Option<u32>,
	pub score_threshold: Option<f32>,
	pub k_before: Option<i64>,
	pub k_after: Option<i64>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ContiguousQueryResponse {
	/// Pages in scroll order, one entry per page number.
	pub items: Vec<PagePayload>,
}

impl FolioService {
	/// Similarity search widened to the pages around each hit.
	///
	/// Every stored page of the tenant within `k_before`/`k_after` of a seed hit is returned,
	/// whatever its own score. Items keep the order the index scrolled them in; they are
	/// sorted neither by page number nor by score, so callers that need either must sort.
	pub async fn query_contiguous(
		&self,
		req: ContiguousQueryRequest,
	) -> Result<ContiguousQueryResponse> {
		let defaults = &self.cfg.retrieval;
		let metric = crate::parse_metric(
			req.distance_type.as_deref().unwrap_or(defaults.default_metric.as_str()),
		)?;
		let k_before = req.k_before.unwrap_or(defaults.default_k_before);
		let k_after = req.k_after.unwrap_or(defaults.default_k_after);

		if k_before > MAX_WINDOW_RADIUS || k_after > MAX_WINDOW_RADIUS {
			return Err(Error::InvalidRequest {
				message: format!("k_before and k_after must be at most {MAX_WINDOW_RADIUS}."),
			});
		}

		let seed = SeedQuery::validate(
			&req.company_id,
			&req.query,
			metric,
			req.top_k.unwrap_or(defaults.default_top_k),
			req.score_threshold.unwrap_or(defaults.default_score_threshold),
		)?;
		let hits = self.seed_hits(&seed).await?;

		if hits.is_empty() {
			tracing::info!(company_id = seed.company_id, "Contiguous query found no seed pages.");

			return Ok(ContiguousQueryResponse { items: Vec::new() });
		}

		let targets =
			window::target_pages(hits.iter().map(|hit| hit.payload.page_no), k_before, k_after);

		if targets.is_empty() {
			return Ok(ContiguousQueryResponse { items: Vec::new() });
		}

		let rows = self.tenant_store.scan_by_pages(seed.company_id, &targets).await?;
		let scanned = rows.len();
		let items = window::dedup_by_page(rows);

		tracing::info!(
			company_id = seed.company_id,
			metric = %seed.metric,
			seeds = hits.len(),
			target_pages = targets.len(),
			scanned,
			returned = items.len(),
			"Contiguous query completed."
		);

		Ok(ContiguousQueryResponse { items })
	}
}
