mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Config, EmbeddingProviderConfig, MAX_WINDOW_RADIUS, METRIC_NAMES, Providers, Qdrant,
	Retrieval, Service, Storage,
};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.http_bind.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.http_bind must be non-empty.".to_string(),
		});
	}

	let qdrant = &cfg.storage.qdrant;

	if qdrant.url.trim().is_empty() {
		return Err(Error::Validation {
			message: "storage.qdrant.url must be non-empty.".to_string(),
		});
	}
	if qdrant.collection.is_empty() {
		return Err(Error::Validation {
			message: "storage.qdrant.collection must be non-empty.".to_string(),
		});
	}
	if qdrant.vector_dim == 0 {
		return Err(Error::Validation {
			message: "storage.qdrant.vector_dim must be greater than zero.".to_string(),
		});
	}
	if qdrant.request_timeout_ms == 0 {
		return Err(Error::Validation {
			message: "storage.qdrant.request_timeout_ms must be greater than zero.".to_string(),
		});
	}
	if qdrant.scroll_page_size == 0 {
		return Err(Error::Validation {
			message: "storage.qdrant.scroll_page_size must be greater than zero.".to_string(),
		});
	}
	if qdrant.max_scroll_pages == 0 {
		return Err(Error::Validation {
			message: "storage.qdrant.max_scroll_pages must be greater than zero.".to_string(),
		});
	}

	let embedding = &cfg.providers.embedding;

	if embedding.dimensions == 0 {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must be greater than zero.".to_string(),
		});
	}
	if embedding.dimensions != qdrant.vector_dim {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must match storage.qdrant.vector_dim."
				.to_string(),
		});
	}
	if embedding.timeout_ms == 0 {
		return Err(Error::Validation {
			message: "providers.embedding.timeout_ms must be greater than zero.".to_string(),
		});
	}
	if embedding.api_key.trim().is_empty() {
		return Err(Error::Validation {
			message: "Provider embedding api_key must be non-empty.".to_string(),
		});
	}

	let retrieval = &cfg.retrieval;

	if !retrieval.default_score_threshold.is_finite() {
		return Err(Error::Validation {
			message: "retrieval.default_score_threshold must be a finite number.".to_string(),
		});
	}
	if !METRIC_NAMES.contains(&retrieval.default_metric.as_str()) {
		return Err(Error::Validation {
			message: "retrieval.default_metric must be one of cosine, euclidean, or manhattan."
				.to_string(),
		});
	}
	if retrieval.default_k_before > MAX_WINDOW_RADIUS
		|| retrieval.default_k_after > MAX_WINDOW_RADIUS
	{
		return Err(Error::Validation {
			message: format!(
				"retrieval.default_k_before and retrieval.default_k_after must be at most \
				 {MAX_WINDOW_RADIUS}."
			),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	let collection = cfg.storage.qdrant.collection.trim();

	if collection.len() != cfg.storage.qdrant.collection.len() {
		cfg.storage.qdrant.collection = collection.to_string();
	}

	let api_base = cfg.providers.embedding.api_base.trim_end_matches('/');

	if api_base.len() != cfg.providers.embedding.api_base.len() {
		cfg.providers.embedding.api_base = api_base.to_string();
	}

	cfg.retrieval.default_metric = cfg.retrieval.default_metric.trim().to_ascii_lowercase();
}
