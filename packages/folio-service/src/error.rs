pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Embedding unavailable: {message}")]
	EmbeddingUnavailable { message: String },
	#[error("Store unavailable: {message}")]
	StoreUnavailable { message: String },
}
impl From<folio_storage::Error> for Error {
	fn from(err: folio_storage::Error) -> Self {
		match err {
			folio_storage::Error::InvalidArgument(message) => Self::InvalidRequest { message },
			other => Self::StoreUnavailable { message: other.to_string() },
		}
	}
}

impl From<folio_providers::Error> for Error {
	fn from(err: folio_providers::Error) -> Self {
		Self::EmbeddingUnavailable { message: err.to_string() }
	}
}
