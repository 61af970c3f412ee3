use std::{collections::HashMap, time::Duration};

use qdrant_client::{
	Payload, Qdrant, QdrantError,
	qdrant::{
		Condition, CreateCollectionBuilder, DeletePointsBuilder, Distance, Filter, PointId,
		PointStruct, Query, QueryPointsBuilder, ScrollPointsBuilder, UpsertPointsBuilder, Value,
		Vector, VectorParamsBuilder, VectorsConfigBuilder, point_id::PointIdOptions,
		value::Kind,
	},
};
use uuid::Uuid;

use crate::{
	BoxFuture, Error, Result,
	filter::{Match, PageFilter},
	index::{ScrollArgs, SearchArgs, VectorIndex},
	models::{
		Metric, PAGE_NO_FIELD, PAGE_TEXT_FIELD, PagePayload, PagePoint, ScoredPage,
		ScrollCursor, ScrollPage, StoredPage, TABLE_FIELD, TENANT_FIELD,
	},
};

pub struct QdrantStore {
	pub client: Qdrant,
}
impl QdrantStore {
	pub fn new(cfg: &folio_config::Qdrant) -> Result<Self> {
		let client = Qdrant::from_url(&cfg.url)
			.timeout(Duration::from_millis(cfg.request_timeout_ms))
			.build()?;

		Ok(Self { client })
	}

	async fn collection_exists_inner(&self, collection: &str) -> Result<bool> {
		let response = self.client.list_collections().await?;

		Ok(response.collections.iter().any(|description| description.name == collection))
	}

	async fn create_collection_inner(
		&self,
		collection: &str,
		vector_dim: u32,
		metrics: &[Metric],
	) -> Result<()> {
		let mut vectors_config = VectorsConfigBuilder::default();

		for metric in metrics {
			vectors_config.add_named_vector_params(
				metric.as_str(),
				VectorParamsBuilder::new(u64::from(vector_dim), distance(*metric)),
			);
		}

		self.client
			.create_collection(
				CreateCollectionBuilder::new(collection.to_string()).vectors_config(vectors_config),
			)
			.await
			.map_err(|err| classify(err, collection))?;

		Ok(())
	}

	async fn upsert_inner(&self, collection: &str, points: &[PagePoint]) -> Result<()> {
		let points = points.iter().map(point_struct).collect::<Vec<_>>();
		let upsert = UpsertPointsBuilder::new(collection.to_string(), points).wait(true);

		self.client.upsert_points(upsert).await.map_err(|err| classify(err, collection))?;

		Ok(())
	}

	async fn delete_inner(&self, collection: &str, filter: &PageFilter) -> Result<()> {
		let delete = DeletePointsBuilder::new(collection.to_string())
			.points(to_qdrant_filter(filter))
			.wait(true);

		self.client.delete_points(delete).await.map_err(|err| classify(err, collection))?;

		Ok(())
	}

	async fn search_inner(&self, collection: &str, args: SearchArgs<'_>) -> Result<Vec<ScoredPage>> {
		let search = QueryPointsBuilder::new(collection.to_string())
			.query(Query::new_nearest(args.vector.to_vec()))
			.using(args.metric.as_str())
			.filter(to_qdrant_filter(args.filter))
			.limit(args.limit)
			.score_threshold(args.score_threshold)
			.with_payload(true);
		let response = self.client.query(search).await.map_err(|err| classify(err, collection))?;
		let mut out = Vec::with_capacity(response.result.len());

		for point in response.result {
			let Some(id) = point.id.as_ref().and_then(point_id_to_uuid) else {
				tracing::warn!("Search hit has a non-UUID point id; skipping.");

				continue;
			};
			let Some(payload) = parse_payload(&point.payload) else {
				tracing::warn!(point_id = %id, "Search hit has a malformed payload; skipping.");

				continue;
			};

			out.push(ScoredPage { id, score: point.score, payload });
		}

		Ok(out)
	}

	async fn scroll_inner(&self, collection: &str, args: ScrollArgs<'_>) -> Result<ScrollPage> {
		let mut scroll = ScrollPointsBuilder::new(collection.to_string())
			.filter(to_qdrant_filter(args.filter))
			.limit(args.limit)
			.with_payload(true)
			.with_vectors(false);

		if let Some(cursor) = args.cursor {
			scroll = scroll.offset(cursor_to_point_id(cursor));
		}

		let response = self.client.scroll(scroll).await.map_err(|err| classify(err, collection))?;
		let mut rows = Vec::with_capacity(response.result.len());

		for point in response.result {
			let Some(id) = point.id.as_ref().and_then(point_id_to_uuid) else {
				tracing::warn!("Scrolled point has a non-UUID point id; skipping.");

				continue;
			};
			let Some(payload) = parse_payload(&point.payload) else {
				tracing::warn!(point_id = %id, "Scrolled point has a malformed payload; skipping.");

				continue;
			};

			rows.push(StoredPage { id, payload });
		}

		let next_cursor = response.next_page_offset.as_ref().and_then(point_id_to_cursor);

		Ok(ScrollPage { rows, next_cursor })
	}
}

impl VectorIndex for QdrantStore {
	fn collection_exists<'a>(&'a self, collection: &'a str) -> BoxFuture<'a, Result<bool>> {
		Box::pin(self.collection_exists_inner(collection))
	}

	fn create_collection<'a>(
		&'a self,
		collection: &'a str,
		vector_dim: u32,
		metrics: &'a [Metric],
	) -> BoxFuture<'a, Result<()>> {
		Box::pin(self.create_collection_inner(collection, vector_dim, metrics))
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

pub fn distance(metric: Metric) -> Distance {
	match metric {
		Metric::Cosine => Distance::Cosine,
		Metric::Euclidean => Distance::Euclid,
		Metric::Manhattan => Distance::Manhattan,
	}
}

pub fn to_qdrant_filter(filter: &PageFilter) -> Filter {
	Filter::must(filter.must.iter().map(|condition| {
		let key = condition.key.clone();

		match &condition.matches {
			Match::Keyword(value) => Condition::matches(key, value.clone()),
			Match::Integer(value) => Condition::matches(key, *value),
			Match::AnyInteger(values) => Condition::matches(key, values.clone()),
		}
	}))
}

fn point_struct(point: &PagePoint) -> PointStruct {
	let mut vector_map = HashMap::new();

	for metric in Metric::ALL {
		vector_map.insert(metric.as_str().to_string(), Vector::from(point.vector.clone()));
	}

	PointStruct::new(
		point.id.to_string(),
		vector_map,
		Payload::from(payload_map(point.payload.clone())),
	)
}

fn payload_map(payload: PagePayload) -> HashMap<String, Value> {
	let mut payload_map = HashMap::new();

	payload_map.insert(TENANT_FIELD.to_string(), Value::from(payload.company_id));
	payload_map.insert(PAGE_NO_FIELD.to_string(), Value::from(i64::from(payload.page_no)));
	payload_map.insert(PAGE_TEXT_FIELD.to_string(), Value::from(payload.page_text));
	payload_map.insert(TABLE_FIELD.to_string(), Value::from(payload.table));

	payload_map
}

fn parse_payload(payload: &HashMap<String, Value>) -> Option<PagePayload> {
	Some(PagePayload {
		company_id: payload_string(payload, TENANT_FIELD)?,
		page_no: payload_page_no(payload)?,
		page_text: payload_string(payload, PAGE_TEXT_FIELD).unwrap_or_default(),
		table: payload_string(payload, TABLE_FIELD).unwrap_or_default(),
	})
}

fn payload_string(payload: &HashMap<String, Value>, key: &str) -> Option<String> {
	let value = payload.get(key)?;

	match &value.kind {
		Some(Kind::StringValue(text)) => Some(text.clone()),
		_ => None,
	}
}

fn payload_page_no(payload: &HashMap<String, Value>) -> Option<u32> {
	let value = payload.get(PAGE_NO_FIELD)?;

	match &value.kind {
		Some(Kind::IntegerValue(number)) => u32::try_from(*number).ok(),
		Some(Kind::DoubleValue(number)) if number.fract() == 0.0 && *number >= 0.0 =>
			u32::try_from(*number as i64).ok(),
		_ => None,
	}
}

fn point_id_to_uuid(point_id: &PointId) -> Option<Uuid> {
	match &point_id.point_id_options {
		Some(PointIdOptions::Uuid(id)) => Uuid::parse_str(id).ok(),
		_ => None,
	}
}

fn point_id_to_cursor(point_id: &PointId) -> Option<ScrollCursor> {
	match &point_id.point_id_options {
		Some(PointIdOptions::Uuid(id)) => Uuid::parse_str(id).ok().map(ScrollCursor::Uuid),
		Some(PointIdOptions::Num(num)) => Some(ScrollCursor::Num(*num)),
		None => None,
	}
}

fn cursor_to_point_id(cursor: ScrollCursor) -> PointId {
	match cursor {
		ScrollCursor::Uuid(id) => PointId::from(id.to_string()),
		ScrollCursor::Num(num) => PointId::from(num),
	}
}

fn classify(err: QdrantError, collection: &str) -> Error {
	let message = err.to_string().to_lowercase();

	if message.contains("already exists") {
		return Error::AlreadyExists(collection.to_string());
	}

	let collection_missing = message.contains("collection")
		&& (message.contains("doesn't exist") || message.contains("not found"));

	if collection_missing {
		return Error::CollectionMissing(collection.to_string());
	}

	Error::from(err)
}
