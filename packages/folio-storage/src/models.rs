use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Error;

pub const TENANT_FIELD: &str = "company_id";
pub const PAGE_NO_FIELD: &str = "page_no";
pub const PAGE_TEXT_FIELD: &str = "page_text";
pub const TABLE_FIELD: &str = "table";

/// Distance used to compare vectors. Each metric owns a named vector in the collection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
	Cosine,
	Euclidean,
	Manhattan,
}
impl Metric {
	pub const ALL: [Metric; 3] = [Metric::Cosine, Metric::Euclidean, Metric::Manhattan];

	pub fn as_str(self) -> &'static str {
		match self {
			Self::Cosine => "cosine",
			Self::Euclidean => "euclidean",
			Self::Manhattan => "manhattan",
		}
	}
}
impl FromStr for Metric {
	type Err = Error;

	fn from_str(raw: &str) -> Result<Self, Self::Err> {
		match raw.trim().to_ascii_lowercase().as_str() {
			"cosine" => Ok(Self::Cosine),
			"euclidean" => Ok(Self::Euclidean),
			"manhattan" => Ok(Self::Manhattan),
			other => Err(Error::InvalidArgument(format!(
				"Unsupported distance type {other:?}; expected cosine, euclidean, or manhattan."
			))),
		}
	}
}
impl fmt::Display for Metric {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Payload persisted with every point.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PagePayload {
	pub company_id: String,
	pub page_no: u32,
	pub page_text: String,
	pub table: String,
}

/// A point ready to upsert. The same vector is written under every metric name.
#[derive(Clone, Debug)]
pub struct PagePoint {
	pub id: Uuid,
	pub vector: Vec<f32>,
	pub payload: PagePayload,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ScoredPage {
	pub id: Uuid,
	pub score: f32,
	pub payload: PagePayload,
}

#[derive(Clone, Debug, PartialEq)]
pub struct StoredPage {
	pub id: Uuid,
	pub payload: PagePayload,
}

/// Opaque continuation token handed back by a scroll.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ScrollCursor {
	Uuid(Uuid),
	Num(u64),
}

#[derive(Clone, Debug, Default)]
pub struct ScrollPage {
	pub rows: Vec<StoredPage>,
	pub next_cursor: Option<ScrollCursor>,
}
