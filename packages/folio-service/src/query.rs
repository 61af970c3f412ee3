use serde::{Deserialize, Serialize};

use folio_storage::models::{Metric, PagePayload, ScoredPage};

use crate::{Error, FolioService, Result};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct QueryRequest {
	pub company_id: String,
	pub query: String,
	pub distance_type: String,
	pub top_k: Option<u32>,
	pub score_threshold: Option<f32>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QueryItem {
	#[serde(flatten)]
	pub page: PagePayload,
	pub score: f32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct QueryResponse {
	pub items: Vec<QueryItem>,
}

/// A validated similarity query.
pub(crate) struct SeedQuery<'a> {
	pub(crate) company_id: &'a str,
	pub(crate) query: &'a str,
	pub(crate) metric: Metric,
	pub(crate) top_k: u32,
	pub(crate) score_threshold: f32,
}
impl<'a> SeedQuery<'a> {
	pub(crate) fn validate(
		company_id: &'a str,
		query: &'a str,
		metric: Metric,
		top_k: u32,
		score_threshold: f32,
	) -> Result<Self> {
		let company_id = crate::require_company_id(company_id)?;

		// The text is embedded as sent; only whitespace-only queries are refused.
		if query.trim().is_empty() {
			return Err(Error::InvalidRequest { message: "query must be non-empty.".to_string() });
		}
		if !score_threshold.is_finite() {
			return Err(Error::InvalidRequest {
				message: "score_threshold must be a finite number.".to_string(),
			});
		}

		Ok(Self { company_id, query, metric, top_k, score_threshold })
	}
}

impl FolioService {
	/// Pages most similar to the query text, best match first, at most `top_k` of them.
	pub async fn query(&self, req: QueryRequest) -> Result<QueryResponse> {
		let metric = crate::parse_metric(&req.distance_type)?;
		let seed = SeedQuery::validate(
			&req.company_id,
			&req.query,
			metric,
			req.top_k.unwrap_or(self.cfg.retrieval.default_top_k),
			req.score_threshold.unwrap_or(self.cfg.retrieval.default_score_threshold),
		)?;
		let hits = self.seed_hits(&seed).await?;

		tracing::info!(
			company_id = seed.company_id,
			metric = %seed.metric,
			top_k = seed.top_k,
			hits = hits.len(),
			"Similarity query completed."
		);

		let items = hits
			.into_iter()
			.map(|hit| QueryItem { page: hit.payload, score: hit.score })
			.collect();

		Ok(QueryResponse { items })
	}

	pub(crate) async fn seed_hits(&self, seed: &SeedQuery<'_>) -> Result<Vec<ScoredPage>> {
		if seed.top_k == 0 {
			return Ok(Vec::new());
		}

		let vector = self.embedder.embed_one(seed.query).await?;

		self.tenant_store
			.search(&vector, seed.company_id, seed.metric, seed.top_k, seed.score_threshold)
			.await
	}
}
