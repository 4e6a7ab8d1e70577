use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Embedding service error: {0}")]
    Embedding(String),

    #[error("LLM service error: {0}")]
    Llm(String),

    #[error("Vector store error: {0}")]
    VectorStore(String),

    #[error("Invalid request: {0}")]
    Validation(String),
}

impl ApiError {
    /// Returns the appropriate HTTP status code for this error
    pub fn http_status_code(&self) -> u16 {
        match self {
            ApiError::Embedding(_) => 500,
            ApiError::Llm(_) => 503,
            ApiError::VectorStore(_) => 500,
            ApiError::Validation(_) => 400,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.http_status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        log::error!("Request failed: {}", self);
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
