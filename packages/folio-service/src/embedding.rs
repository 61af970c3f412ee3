use std::{sync::Arc, time::Duration};

use tokio::time;

use folio_config::EmbeddingProviderConfig;

use crate::{EmbeddingProvider, Error, Result};

/// Embedding provider bound to its configuration, with count, dimension and timeout checks.
#[derive(Clone)]
pub struct Embedder {
	provider: Arc<dyn EmbeddingProvider>,
	cfg: EmbeddingProviderConfig,
	vector_dim: u32,
}
impl Embedder {
	pub fn new(
		provider: Arc<dyn EmbeddingProvider>,
		cfg: EmbeddingProviderConfig,
		vector_dim: u32,
	) -> Self {
		Self { provider, cfg, vector_dim }
	}

	pub async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
		if texts.is_empty() {
			return Ok(Vec::new());
		}

		let provider_id = self.cfg.provider_id.as_str();
		let timeout = Duration::from_millis(self.cfg.timeout_ms);
		let vectors = time::timeout(timeout, self.provider.embed(&self.cfg, texts))
			.await
			.map_err(|_| Error::EmbeddingUnavailable {
				message: format!(
					"Embedding provider {provider_id} timed out after {} ms.",
					self.cfg.timeout_ms
				),
			})?
			.map_err(|err| match err {
				Error::EmbeddingUnavailable { message } => Error::EmbeddingUnavailable {
					message: format!("Embedding provider {provider_id}: {message}"),
				},
				other => Error::EmbeddingUnavailable {
					message: format!("Embedding provider {provider_id}: {other}"),
				},
			})?;

		if vectors.len() != texts.len() {
			return Err(Error::EmbeddingUnavailable {
				message: format!(
					"Embedding provider {provider_id} returned {} vectors for {} texts.",
					vectors.len(),
					texts.len()
				),
			});
		}
		if let Some(vector) = vectors.iter().find(|vector| vector.len() != self.vector_dim as usize) {
			return Err(Error::EmbeddingUnavailable {
				message: format!(
					"Embedding provider {provider_id} returned dimension {}, expected {}.",
					vector.len(),
					self.vector_dim
				),
			});
		}

		tracing::debug!(provider_id, texts = texts.len(), "Embedded batch.");

		Ok(vectors)
	}

	pub async fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
		let vectors = self.embed_batch(&[text.to_string()]).await?;

		vectors.into_iter().next().ok_or_else(|| Error::EmbeddingUnavailable {
			message: format!("Embedding provider {} returned no vectors.", self.cfg.provider_id),
		})
	}
}
