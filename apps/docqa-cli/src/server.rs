//! HTTP API over the assistant.
//!
//! Ingestion and clearing take the write lock; queries and stats run
//! concurrently against the index.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::Mutex;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use docqa_core::error::Error;
use docqa_core::types::{Answer, IngestionSummary};
use docqa_core::APOLOGY_MESSAGE;
use docqa_rag::Assistant;

pub struct AppState {
    assistant: Assistant,
    writer: Mutex<()>,
}

impl AppState {
    pub fn new(assistant: Assistant) -> Arc<Self> {
        Arc::new(Self { assistant, writer: Mutex::new(()) })
    }

    /// Ingests the configured documents directory under the write lock.
    pub async fn ingest(&self) -> docqa_core::error::Result<IngestionSummary> {
        let _guard = self.writer.lock().await;
        self.assistant.ingestor.ingest_directory(self.assistant.documents_dir()).await
    }
}

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };
        (status, Json(json!({ "detail": message }))).into_response()
    }
}

/// Logs the real cause; callers only ever see `public`.
fn internal(context: &str, err: Error, public: &str) -> ApiError {
    tracing::error!(error = %err, "{} failed", context);
    ApiError::Internal(public.to_string())
}

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub query: String,
    pub top_k: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct IngestResponse {
    pub status: &'static str,
    pub message: String,
    #[serde(flatten)]
    pub summary: IngestionSummary,
}

pub fn router(state: Arc<AppState>, cors_origins: &[String]) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/ingest", post(ingest))
        .route("/query", post(query))
        .route("/stats", get(stats))
        .route("/debug/index", get(debug_index))
        .route("/clear_index", post(clear_index))
        .with_state(state)
        .layer(cors_layer(cors_origins))
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed = origins.iter().filter_map(|o| HeaderValue::from_str(o).ok()).collect::<Vec<_>>();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::ACCEPT, header::CONTENT_TYPE])
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "running",
        "message": "RAG API is operational",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn ingest(State(state): State<Arc<AppState>>) -> Result<Json<IngestResponse>, ApiError> {
    let summary = state.ingest().await.map_err(|e| internal("ingestion", e, "Ingestion failed"))?;
    let status = if summary.failures.is_empty() { "success" } else { "partial" };
    Ok(Json(IngestResponse {
        status,
        message: format!("Ingested {} document(s)", summary.documents_processed),
        summary,
    }))
}

async fn query(State(state): State<Arc<AppState>>, Json(req): Json<QueryRequest>) -> Result<Json<Answer>, ApiError> {
    if req.query.trim().is_empty() {
        return Err(ApiError::BadRequest("Query cannot be empty".into()));
    }
    match state.assistant.query.answer(&req.query, req.top_k).await {
        Ok(answer) => Ok(Json(answer)),
        Err(Error::InvalidQuery(msg)) => Err(ApiError::BadRequest(msg)),
        Err(e) => Err(internal("query", e, APOLOGY_MESSAGE)),
    }
}

async fn stats(State(state): State<Arc<AppState>>) -> Result<Json<serde_json::Value>, ApiError> {
    let stats = state.assistant.index.stats().await.map_err(|e| internal("stats", e, "Index unavailable"))?;
    Ok(Json(json!({
        "total_chunks": stats.total_chunks,
        "total_documents": stats.total_documents,
        "collection_name": state.assistant.index.table_name(),
    })))
}

async fn debug_index(State(state): State<Arc<AppState>>) -> Result<Json<serde_json::Value>, ApiError> {
    let index = &state.assistant.index;
    let count = index.stats().await.map_err(|e| internal("debug listing", e, "Index unavailable"))?.total_chunks;
    let documents = index.documents().await.map_err(|e| internal("debug listing", e, "Index unavailable"))?;
    Ok(Json(json!({
        "count": count,
        "num_documents": documents.len(),
        "documents": documents,
    })))
}

async fn clear_index(State(state): State<Arc<AppState>>) -> Result<Json<serde_json::Value>, ApiError> {
    let _guard = state.writer.lock().await;
    state.assistant.index.clear().await.map_err(|e| internal("clear", e, "Failed to clear index"))?;
    Ok(Json(json!({ "status": "success", "message": "Index cleared. Call /ingest to rebuild." })))
}
