use std::{
	cmp::Ordering as CmpOrdering,
	collections::HashMap,
	sync::{
		Mutex,
		atomic::{AtomicBool, AtomicUsize, Ordering},
	},
	time::Duration,
};

use uuid::Uuid;

use folio_storage::{
	BoxFuture, Error, Result,
	filter::PageFilter,
	index::{ScrollArgs, SearchArgs, VectorIndex},
	models::{Metric, PagePayload, PagePoint, ScoredPage, ScrollCursor, ScrollPage, StoredPage},
};

struct Collection {
	vector_dim: u32,
	metrics: Vec<Metric>,
	points: Vec<PagePoint>,
}

/// In-process [`VectorIndex`] following Qdrant's conventions.
///
/// Cosine scores are similarities (higher is better, the threshold is a minimum). Euclidean
/// and manhattan scores are distances (lower is better, the threshold is a maximum). Scroll
/// walks points in insertion order and hands out the id of the next point as the cursor.
#[derive(Default)]
pub struct MemoryIndex {
	collections: Mutex<HashMap<String, Collection>>,
	create_calls: AtomicUsize,
	search_calls: AtomicUsize,
	scroll_calls: AtomicUsize,
	upsert_calls: AtomicUsize,
	fail_scroll_after: Mutex<Option<usize>>,
	scroll_delay: Mutex<Option<Duration>>,
	endless_scroll: AtomicBool,
	unavailable: AtomicBool,
	drop_before_upsert: AtomicBool,
}
impl MemoryIndex {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn create_calls(&self) -> usize {
		self.create_calls.load(Ordering::SeqCst)
	}

	pub fn search_calls(&self) -> usize {
		self.search_calls.load(Ordering::SeqCst)
	}

	pub fn scroll_calls(&self) -> usize {
		self.scroll_calls.load(Ordering::SeqCst)
	}

	pub fn upsert_calls(&self) -> usize {
		self.upsert_calls.load(Ordering::SeqCst)
	}

	/// Scroll calls after the first `calls` fail with a backend error.
	pub fn fail_scroll_after(&self, calls: usize) {
		*self.fail_scroll_after.lock().unwrap_or_else(|err| err.into_inner()) = Some(calls);
	}

	pub fn set_scroll_delay(&self, delay: Duration) {
		*self.scroll_delay.lock().unwrap_or_else(|err| err.into_inner()) = Some(delay);
	}

	/// Every scroll reports a further cursor, as a misbehaving store would.
	pub fn set_endless_scroll(&self, endless: bool) {
		self.endless_scroll.store(endless, Ordering::SeqCst);
	}

	/// Every call fails as if the index were unreachable.
	pub fn set_unavailable(&self, unavailable: bool) {
		self.unavailable.store(unavailable, Ordering::SeqCst);
	}

	/// The next upsert finds its collection gone, as after an external drop.
	pub fn drop_collection_before_next_upsert(&self) {
		self.drop_before_upsert.store(true, Ordering::SeqCst);
	}

	pub fn point_count(&self, collection: &str) -> usize {
		self.collections
			.lock()
			.unwrap_or_else(|err| err.into_inner())
			.get(collection)
			.map(|c| c.points.len())
			.unwrap_or(0)
	}

	/// Named vectors of a collection, in creation order.
	pub fn collection_metrics(&self, collection: &str) -> Option<(u32, Vec<Metric>)> {
		self.collections
			.lock()
			.unwrap_or_else(|err| err.into_inner())
			.get(collection)
			.map(|c| (c.vector_dim, c.metrics.clone()))
	}

	pub fn payloads(&self, collection: &str) -> Vec<PagePayload> {
		self.collections
			.lock()
			.unwrap_or_else(|err| err.into_inner())
			.get(collection)
			.map(|c| c.points.iter().map(|point| point.payload.clone()).collect())
			.unwrap_or_default()
	}

	fn check_available(&self) -> Result<()> {
		if self.unavailable.load(Ordering::SeqCst) {
			return Err(Error::Backend("Index is unreachable.".to_string()));
		}

		Ok(())
	}

	async fn create_inner(&self, collection: &str, vector_dim: u32, metrics: &[Metric]) -> Result<()> {
		self.check_available()?;
		self.create_calls.fetch_add(1, Ordering::SeqCst);

		let mut collections = self.collections.lock().unwrap_or_else(|err| err.into_inner());

		if collections.contains_key(collection) {
			return Err(Error::AlreadyExists(collection.to_string()));
		}

		collections.insert(
			collection.to_string(),
			Collection { vector_dim, metrics: metrics.to_vec(), points: Vec::new() },
		);

		Ok(())
	}

	async fn upsert_inner(&self, collection: &str, points: &[PagePoint]) -> Result<()> {
		self.check_available()?;
		self.upsert_calls.fetch_add(1, Ordering::SeqCst);

		let mut collections = self.collections.lock().unwrap_or_else(|err| err.into_inner());

		if self.drop_before_upsert.swap(false, Ordering::SeqCst) {
			collections.remove(collection);
		}

		let Some(target) = collections.get_mut(collection) else {
			return Err(Error::CollectionMissing(collection.to_string()));
		};

		for point in points {
			if point.vector.len() != target.vector_dim as usize {
				return Err(Error::InvalidArgument(format!(
					"Vector dimension {} does not match collection dimension {}.",
					point.vector.len(),
					target.vector_dim
				)));
			}

			match target.points.iter_mut().find(|existing| existing.id == point.id) {
				Some(existing) => *existing = point.clone(),
				None => target.points.push(point.clone()),
			}
		}

		Ok(())
	}

	async fn delete_inner(&self, collection: &str, filter: &PageFilter) -> Result<()> {
		self.check_available()?;

		let mut collections = self.collections.lock().unwrap_or_else(|err| err.into_inner());
		let Some(target) = collections.get_mut(collection) else {
			return Err(Error::CollectionMissing(collection.to_string()));
		};

		target.points.retain(|point| !filter.matches(&point.payload));

		Ok(())
	}

	async fn search_inner(&self, collection: &str, args: SearchArgs<'_>) -> Result<Vec<ScoredPage>> {
		self.check_available()?;
		self.search_calls.fetch_add(1, Ordering::SeqCst);

		let collections = self.collections.lock().unwrap_or_else(|err| err.into_inner());
		let Some(target) = collections.get(collection) else {
			return Err(Error::CollectionMissing(collection.to_string()));
		};

		if !target.metrics.contains(&args.metric) {
			return Err(Error::InvalidArgument(format!(
				"Collection has no vector named {}.",
				args.metric
			)));
		}

		let mut hits = target
			.points
			.iter()
			.filter(|point| args.filter.matches(&point.payload))
			.map(|point| ScoredPage {
				id: point.id,
				score: score(args.metric, args.vector, &point.vector),
				payload: point.payload.clone(),
			})
			.filter(|hit| passes_threshold(args.metric, hit.score, args.score_threshold))
			.collect::<Vec<_>>();

		hits.sort_by(|a, b| compare_scores(args.metric, a.score, b.score));
		hits.truncate(args.limit as usize);

		Ok(hits)
	}

	async fn scroll_inner(&self, collection: &str, args: ScrollArgs<'_>) -> Result<ScrollPage> {
		self.check_available()?;

		let call = self.scroll_calls.fetch_add(1, Ordering::SeqCst);
		let fail_after = *self.fail_scroll_after.lock().unwrap_or_else(|err| err.into_inner());

		if fail_after.is_some_and(|limit| call >= limit) {
			return Err(Error::Backend(format!("Scroll call {} failed.", call + 1)));
		}

		let delay = *self.scroll_delay.lock().unwrap_or_else(|err| err.into_inner());

		if let Some(delay) = delay {
			tokio::time::sleep(delay).await;
		}

		let collections = self.collections.lock().unwrap_or_else(|err| err.into_inner());
		let Some(target) = collections.get(collection) else {
			return Err(Error::CollectionMissing(collection.to_string()));
		};
		let matching =
			target.points.iter().filter(|point| args.filter.matches(&point.payload)).collect::<Vec<_>>();
		let start = match &args.cursor {
			None => 0,
			Some(ScrollCursor::Uuid(id)) =>
				matching.iter().position(|point| point.id == *id).unwrap_or(matching.len()),
			Some(ScrollCursor::Num(_)) => matching.len(),
		};
		let limit = args.limit.max(1) as usize;
		let end = (start + limit).min(matching.len());
		let rows = matching[start..end]
			.iter()
			.map(|point| StoredPage { id: point.id, payload: point.payload.clone() })
			.collect::<Vec<_>>();
		let next_cursor = if self.endless_scroll.load(Ordering::SeqCst) {
			Some(ScrollCursor::Uuid(Uuid::new_v4()))
		} else {
			matching.get(end).map(|point| ScrollCursor::Uuid(point.id))
		};

		Ok(ScrollPage { rows, next_cursor })
	}
}

impl VectorIndex for MemoryIndex {
	fn collection_exists<'a>(&'a self, collection: &'a str) -> BoxFuture<'a, Result<bool>> {
		Box::pin(async move {
			self.check_available()?;

			Ok(self
				.collections
				.lock()
				.unwrap_or_else(|err| err.into_inner())
				.contains_key(collection))
		})
	}

	fn create_collection<'a>(
		&'a self,
		collection: &'a str,
		vector_dim: u32,
		metrics: &'a [Metric],
	) -> BoxFuture<'a, Result<()>> {
		Box::pin(self.create_inner(collection, vector_dim, metrics))
	}

	fn upsert<'a>(
		&'a self,
		collection: &'a str,
		points: &'a [PagePoint],
	) -> BoxFuture<'a, Result<()>> {
		Box::pin(self.upsert_inner(collection, points))
	}

	fn delete_by_filter<'a>(
		&'a self,
		collection: &'a str,
		filter: &'a PageFilter,
	) -> BoxFuture<'a, Result<()>> {
		Box::pin(self.delete_inner(collection, filter))
	}

	fn search<'a>(
		&'a self,
		collection: &'a str,
		args: SearchArgs<'a>,
	) -> BoxFuture<'a, Result<Vec<ScoredPage>>> {
		Box::pin(self.search_inner(collection, args))
	}

	fn scroll<'a>(
		&'a self,
		collection: &'a str,
		args: ScrollArgs<'a>,
	) -> BoxFuture<'a, Result<ScrollPage>> {
		Box::pin(self.scroll_inner(collection, args))
	}
}

fn score(metric: Metric, a: &[f32], b: &[f32]) -> f32 {
	match metric {
		Metric::Cosine => {
			let dot = a.iter().zip(b).map(|(x, y)| x * y).sum::<f32>();
			let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
			let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();

			if norm_a == 0.0 || norm_b == 0.0 { 0.0 } else { dot / (norm_a * norm_b) }
		},
		Metric::Euclidean => a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum::<f32>().sqrt(),
		Metric::Manhattan => a.iter().zip(b).map(|(x, y)| (x - y).abs()).sum::<f32>(),
	}
}

fn passes_threshold(metric: Metric, score: f32, threshold: f32) -> bool {
	match metric {
		Metric::Cosine => score >= threshold,
		Metric::Euclidean | Metric::Manhattan => score <= threshold,
	}
}

fn compare_scores(metric: Metric, a: f32, b: f32) -> CmpOrdering {
	match metric {
		Metric::Cosine => b.partial_cmp(&a).unwrap_or(CmpOrdering::Equal),
		Metric::Euclidean | Metric::Manhattan => a.partial_cmp(&b).unwrap_or(CmpOrdering::Equal),
	}
}
