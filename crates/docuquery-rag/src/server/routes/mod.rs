//! API routes for the query server

pub mod query;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use crate::server::state::AppState;

/// Build all API routes
pub fn api_routes(max_upload_size: usize) -> Router<AppState> {
    Router::new()
        // Query - with larger body limit for file uploads
        .route(
            "/query",
            post(query::query_documents).layer(DefaultBodyLimit::max(max_upload_size)),
        )
        // Info
        .route("/info", get(info))
}

/// API info endpoint
async fn info() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "name": "docuquery-rag",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Question answering over uploaded PDF, DOCX and TXT documents",
        "endpoints": {
            "POST /api/query": "Multipart upload: repeated `files` parts, one `question` field, optional `options` JSON",
            "GET /api/info": "This document",
            "GET /health": "Liveness",
            "GET /ready": "Embedding and generation backends reachable"
        },
        "supported_types": ["pdf", "docx", "txt"]
    }))
}
