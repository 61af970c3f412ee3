use crate::{
	BoxFuture, Result,
	filter::PageFilter,
	models::{Metric, PagePoint, ScoredPage, ScrollCursor, ScrollPage},
};

pub struct SearchArgs<'a> {
	pub metric: Metric,
	pub vector: &'a [f32],
	pub filter: &'a PageFilter,
	pub limit: u64,
	pub score_threshold: f32,
}

pub struct ScrollArgs<'a> {
	pub filter: &'a PageFilter,
	pub limit: u32,
	pub cursor: Option<ScrollCursor>,
}

/// Vector store operations the retrieval layer depends on.
///
/// Implementations report a create against an existing collection as
/// [`crate::Error::AlreadyExists`] and any use of an absent collection as
/// [`crate::Error::CollectionMissing`].
pub trait VectorIndex
where
	Self: Send + Sync,
{
	fn collection_exists<'a>(&'a self, collection: &'a str) -> BoxFuture<'a, Result<bool>>;

	fn create_collection<'a>(
		&'a self,
		collection: &'a str,
		vector_dim: u32,
		metrics: &'a [Metric],
	) -> BoxFuture<'a, Result<()>>;

	fn upsert<'a>(&'a self, collection: &'a str, points: &'a [PagePoint])
	-> BoxFuture<'a, Result<()>>;

	fn delete_by_filter<'a>(
		&'a self,
		collection: &'a str,
		filter: &'a PageFilter,
	) -> BoxFuture<'a, Result<()>>;

	/// Nearest neighbours, best match first, as ordered by the index.
	fn search<'a>(
		&'a self,
		collection: &'a str,
		args: SearchArgs<'a>,
	) -> BoxFuture<'a, Result<Vec<ScoredPage>>>;

	fn scroll<'a>(
		&'a self,
		collection: &'a str,
		args: ScrollArgs<'a>,
	) -> BoxFuture<'a, Result<ScrollPage>>;
}
