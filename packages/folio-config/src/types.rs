use serde::Deserialize;
use serde_json::{Map, Value};

pub const METRIC_NAMES: [&str; 3] = ["cosine", "euclidean", "manhattan"];
/// Largest `k_before`/`k_after` accepted from a caller or as a configured default.
pub const MAX_WINDOW_RADIUS: i64 = 10_000;

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub providers: Providers,
	#[serde(default)]
	pub retrieval: Retrieval,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	pub qdrant: Qdrant,
}

#[derive(Debug, Deserialize)]
pub struct Qdrant {
	pub url: String,
	pub collection: String,
	pub vector_dim: u32,
	/// Upper bound for every single call to the index, including each scroll page.
	#[serde(default = "default_request_timeout_ms")]
	pub request_timeout_ms: u64,
	#[serde(default = "default_scroll_page_size")]
	pub scroll_page_size: u32,
	/// Hard cap on scroll round trips for one scan. A store that keeps returning a cursor
	/// past this point is treated as failing.
	#[serde(default = "default_max_scroll_pages")]
	pub max_scroll_pages: u32,
}

#[derive(Debug, Deserialize)]
pub struct Providers {
	pub embedding: EmbeddingProviderConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub dimensions: u32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

/// Request defaults applied when the caller omits a field.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Retrieval {
	pub default_top_k: u32,
	pub default_score_threshold: f32,
	pub default_metric: String,
	pub default_k_before: i64,
	pub default_k_after: i64,
}
impl Default for Retrieval {
	fn default() -> Self {
		Self {
			default_top_k: 5,
			default_score_threshold: 0.5,
			default_metric: "cosine".to_string(),
			default_k_before: 1,
			default_k_after: 1,
		}
	}
}

fn default_request_timeout_ms() -> u64 {
	10_000
}

fn default_scroll_page_size() -> u32 {
	100
}

fn default_max_scroll_pages() -> u32 {
	10_000
}
