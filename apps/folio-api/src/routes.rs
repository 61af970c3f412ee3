use axum::{
	Json, Router,
	extract::{State, rejection::JsonRejection},
	http::StatusCode,
	response::{IntoResponse, Response},
	routing::{get, post},
};
use serde::Serialize;

use folio_service::{
	ContiguousQueryRequest, ContiguousQueryResponse, DeleteRequest, DeleteResponse, Error,
	QueryRequest, QueryResponse, StoreRequest, StoreResponse,
};

use crate::state::AppState;

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: String,
	message: String,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: String,
	message: String,
}
impl ApiError {
	fn new(status: StatusCode, error_code: impl Into<String>, message: impl Into<String>) -> Self {
		Self { status, error_code: error_code.into(), message: message.into() }
	}
}

impl From<Error> for ApiError {
	fn from(err: Error) -> Self {
		match err {
			Error::InvalidRequest { message } =>
				json_error(StatusCode::BAD_REQUEST, "INVALID_REQUEST", message),
			Error::EmbeddingUnavailable { message } => {
				tracing::error!(error = %message, "Embedding provider failed.");

				json_error(
					StatusCode::BAD_GATEWAY,
					"EMBEDDING_UNAVAILABLE",
					"Embedding provider is unavailable.",
				)
			},
			Error::StoreUnavailable { message } => {
				tracing::error!(error = %message, "Vector store failed.");

				json_error(
					StatusCode::SERVICE_UNAVAILABLE,
					"STORE_UNAVAILABLE",
					"Vector store is unavailable.",
				)
			},
		}
	}
}

impl From<JsonRejection> for ApiError {
	fn from(rejection: JsonRejection) -> Self {
		json_error(StatusCode::BAD_REQUEST, "INVALID_REQUEST", rejection.body_text())
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body = ErrorBody { error_code: self.error_code, message: self.message };

		(self.status, Json(body)).into_response()
	}
}

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/v1/pages/store", post(store))
		.route("/v1/pages/delete", post(delete))
		.route("/v1/pages/query", post(query))
		.route("/v1/pages/query_contiguous", post(query_contiguous))
		.with_state(state)
}

pub fn json_error(status: StatusCode, code: &str, message: impl Into<String>) -> ApiError {
	ApiError::new(status, code, message)
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn store(
	State(state): State<AppState>,
	payload: Result<Json<StoreRequest>, JsonRejection>,
) -> Result<Json<StoreResponse>, ApiError> {
	let Json(payload) = payload?;
	let response = state.service.store(payload).await?;

	Ok(Json(response))
}

async fn delete(
	State(state): State<AppState>,
	payload: Result<Json<DeleteRequest>, JsonRejection>,
) -> Result<Json<DeleteResponse>, ApiError> {
	let Json(payload) = payload?;
	let response = state.service.delete(payload).await?;

	Ok(Json(response))
}

async fn query(
	State(state): State<AppState>,
	payload: Result<Json<QueryRequest>, JsonRejection>,
) -> Result<Json<QueryResponse>, ApiError> {
	let Json(payload) = payload?;
	let response = state.service.query(payload).await?;

	Ok(Json(response))
}

async fn query_contiguous(
	State(state): State<AppState>,
	payload: Result<Json<ContiguousQueryRequest>, JsonRejection>,
) -> Result<Json<ContiguousQueryResponse>, ApiError> {
	let Json(payload) = payload?;
	let response = state.service.query_contiguous(payload).await?;

	Ok(Json(response))
}
