mod error;
mod memory;

pub use error::{Error, Result};
pub use memory::MemoryIndex;

use std::{env, time::Duration};

use qdrant_client::Qdrant;
use tokio::time;
use uuid::Uuid;

pub fn env_qdrant_url() -> Option<String> {
	env::var("FOLIO_QDRANT_URL").ok()
}

pub fn collection_name(prefix: &str) -> String {
	format!("{prefix}_{}", Uuid::new_v4().simple())
}

/// Drops a collection created by a live test, retrying with backoff while Qdrant still lists it.
pub async fn cleanup_qdrant_collection(qdrant_url: &str, collection: &str) -> Result<()> {
	let client = Qdrant::from_url(qdrant_url)
		.build()
		.map_err(|err| Error::Message(format!("Failed to build Qdrant client: {err}.")))?;
	let max_attempts = 6;
	let mut backoff = Duration::from_millis(100);

	for attempt in 1..=max_attempts {
		let existing = time::timeout(Duration::from_secs(10), client.list_collections())
			.await
			.map_err(|_| Error::Message("Qdrant list_collections timed out.".to_string()))?
			.map_err(|err| Error::Message(format!("Failed to list Qdrant collections: {err}.")))?;

		if !existing.collections.iter().any(|c| c.name == collection) {
			return Ok(());
		}

		let result = time::timeout(
			Duration::from_secs(10),
			client.delete_collection(collection.to_string()),
		)
		.await;

		match result {
			Ok(Ok(_)) => {},
			Ok(Err(err)) =>
				if attempt == max_attempts {
					return Err(Error::Message(format!(
						"Failed to delete Qdrant collection {collection:?} after {attempt} attempts: {err}."
					)));
				},
			Err(_) =>
				if attempt == max_attempts {
					return Err(Error::Message(format!(
						"Timed out deleting Qdrant collection {collection:?} after {attempt} attempts."
					)));
				},
		}

		time::sleep(backoff).await;

		backoff = backoff.saturating_mul(2).min(Duration::from_secs(2));
	}

	Ok(())
}
