use std::{collections::BTreeSet, future::Future, sync::Arc, time::Duration};

use tokio::time;
use uuid::Uuid;

use folio_storage::{
	filter::PageFilter,
	index::{ScrollArgs, SearchArgs, VectorIndex},
	models::{Metric, PagePayload, PagePoint, ScoredPage, StoredPage},
};

use crate::{Embedder, Error, PageInput, Result};

/// Collection access where every write, search and scan is pinned to one `company_id`.
pub struct TenantStore {
	index: Arc<dyn VectorIndex>,
	embedder: Embedder,
	collection: String,
	vector_dim: u32,
	request_timeout: Duration,
	scroll_page_size: u32,
	max_scroll_pages: u32,
}
impl TenantStore {
	pub fn new(index: Arc<dyn VectorIndex>, embedder: Embedder, cfg: &folio_config::Qdrant) -> Self {
		Self {
			index,
			embedder,
			collection: cfg.collection.clone(),
			vector_dim: cfg.vector_dim,
			request_timeout: Duration::from_millis(cfg.request_timeout_ms),
			scroll_page_size: cfg.scroll_page_size,
			max_scroll_pages: cfg.max_scroll_pages,
		}
	}

	pub fn collection(&self) -> &str {
		&self.collection
	}

	/// Creates the shared collection with one named vector per metric unless it already exists.
	///
	/// Losing a creation race to another writer counts as success.
	pub async fn ensure_collection(&self) -> Result<()> {
		let exists =
			self.bounded("collection_exists", self.index.collection_exists(&self.collection)).await?;

		if exists {
			return Ok(());
		}

		let created = self
			.bounded(
				"create_collection",
				self.index.create_collection(&self.collection, self.vector_dim, &Metric::ALL),
			)
			.await;

		match created {
			Ok(()) => {
				tracing::info!(
					collection = %self.collection,
					vector_dim = self.vector_dim,
					"Created page collection."
				);

				Ok(())
			},
			Err(folio_storage::Error::AlreadyExists(_)) => Ok(()),
			Err(err) => Err(err.into()),
		}
	}

	/// Embeds all pages in one batch and upserts them under fresh ids.
	///
	/// Page numbers are not checked for uniqueness; storing a page number twice keeps both rows.
	pub async fn write(&self, company_id: &str, pages: &[PageInput]) -> Result<usize> {
		if pages.is_empty() {
			return Ok(0);
		}

		self.ensure_collection().await?;

		let texts = pages.iter().map(|page| page.page_text.clone()).collect::<Vec<_>>();
		let vectors = self.embedder.embed_batch(&texts).await?;
		let points = pages
			.iter()
			.zip(vectors)
			.map(|(page, vector)| PagePoint {
				id: Uuid::new_v4(),
				vector,
				payload: PagePayload {
					company_id: company_id.to_string(),
					page_no: page.page_no,
					page_text: page.page_text.clone(),
					table: page.page_table.clone(),
				},
			})
			.collect::<Vec<_>>();
		let count = points.len();
		let upserted = self.bounded("upsert", self.index.upsert(&self.collection, &points)).await;

		match upserted {
			Err(folio_storage::Error::CollectionMissing(_)) => {
				self.ensure_collection().await?;
				self.bounded("upsert", self.index.upsert(&self.collection, &points)).await?;
			},
			other => other?,
		}

		Ok(count)
	}

	pub async fn delete_tenant(&self, company_id: &str) -> Result<()> {
		let filter = PageFilter::tenant(company_id);
		let deleted =
			self.bounded("delete", self.index.delete_by_filter(&self.collection, &filter)).await;

		match deleted {
			Err(folio_storage::Error::CollectionMissing(_)) => self.ensure_collection().await,
			other => Ok(other?),
		}
	}

	pub async fn search(
		&self,
		vector: &[f32],
		company_id: &str,
		metric: Metric,
		top_k: u32,
		score_threshold: f32,
	) -> Result<Vec<ScoredPage>> {
		let filter = PageFilter::tenant(company_id);
		let args = SearchArgs {
			metric,
			vector,
			filter: &filter,
			limit: u64::from(top_k),
			score_threshold,
		};
		let searched = self.bounded("search", self.index.search(&self.collection, args)).await;

		match searched {
			Err(folio_storage::Error::CollectionMissing(_)) => {
				self.ensure_collection().await?;

				Ok(Vec::new())
			},
			other => Ok(other?),
		}
	}

	/// Returns every stored row of the tenant whose page number is in `pages`.
	///
	/// Follows the scroll cursor until the index reports no further page. Rows come back in
	/// scroll order. Any failed or timed out page fails the whole scan.
	pub async fn scan_by_pages(
		&self,
		company_id: &str,
		pages: &BTreeSet<u32>,
	) -> Result<Vec<StoredPage>> {
		if pages.is_empty() {
			return Ok(Vec::new());
		}

		let filter = PageFilter::tenant_pages(company_id, pages);
		let mut rows = Vec::new();
		let mut cursor = None;

		for scroll_page in 1..=self.max_scroll_pages {
			let args = ScrollArgs { filter: &filter, limit: self.scroll_page_size, cursor };
			let scrolled = self.bounded("scroll", self.index.scroll(&self.collection, args)).await;
			let page = match scrolled {
				Err(folio_storage::Error::CollectionMissing(_)) => {
					self.ensure_collection().await?;

					return Ok(Vec::new());
				},
				other => other?,
			};

			tracing::debug!(
				company_id,
				scroll_page,
				rows = page.rows.len(),
				has_more = page.next_cursor.is_some(),
				"Scrolled page rows."
			);

			rows.extend(page.rows);

			match page.next_cursor {
				Some(next) => cursor = Some(next),
				None => {
					tracing::debug!(
						company_id,
						scroll_pages = scroll_page,
						rows = rows.len(),
						"Scan finished."
					);

					return Ok(rows);
				},
			}
		}

		Err(Error::StoreUnavailable {
			message: format!(
				"Scroll did not finish within {} pages; aborting scan.",
				self.max_scroll_pages
			),
		})
	}

	async fn bounded<T>(
		&self,
		op: &'static str,
		fut: impl Future<Output = folio_storage::Result<T>>,
	) -> folio_storage::Result<T> {
		time::timeout(self.request_timeout, fut).await.map_err(|_| {
			folio_storage::Error::Backend(format!(
				"Index {op} timed out after {} ms.",
				self.request_timeout.as_millis()
			))
		})?
	}
}
