pub mod errors;
pub mod models;
pub mod prompt;
pub mod service;

use axum::{
    extract::{Json as ExtractJson, State},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use log::info;
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use errors::ApiError;
use models::{query_text, AskRequest, AskResponse, RetrieveRequest, RetrieveResponse, Source};
pub use service::RagService;

const NO_QUERY: &str = "No query provided";

async fn health() -> Json<Value> {
    Json(json!({"status": "ok"}))
}

fn no_query() -> Response {
    Json(json!({ "error": NO_QUERY })).into_response()
}

async fn retrieve(
    State(service): State<Arc<RagService>>,
    ExtractJson(request): ExtractJson<RetrieveRequest>,
) -> Result<Response, ApiError> {
    info!("Received retrieve request: {:?}", request);

    let Some(query) = query_text("query", request.query.as_ref())? else {
        return Ok(no_query());
    };

    let context = service.retrieve(query).await?;

    Ok(Json(RetrieveResponse {
        question: query.to_string(),
        context,
    })
    .into_response())
}

async fn ask(
    State(service): State<Arc<RagService>>,
    ExtractJson(request): ExtractJson<AskRequest>,
) -> Result<Response, ApiError> {
    info!("Received ask request: {:?}", request.question);

    let Some(question) = query_text("question", request.question.as_ref())? else {
        return Ok(no_query());
    };
    let context = request.context.unwrap_or_default();

    let answer = service.ask(question, &context).await?;
    let sources = context.iter().map(Source::from).collect();

    Ok(Json(AskResponse {
        answer,
        sources,
        context,
    })
    .into_response())
}

pub fn create_app(service: Arc<RagService>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/retrieve", post(retrieve))
        .route("/ask", post(ask))
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}
