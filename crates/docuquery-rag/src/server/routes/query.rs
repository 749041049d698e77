//! Query endpoint: upload documents and ask one question about them

use axum::{
    extract::{Multipart, State},
    Json,
};
use std::time::Instant;

use crate::error::{Error, Result};
use crate::server::state::AppState;
use crate::types::{QueryOptions, QueryResponse, UploadedFile};

/// Parsed multipart request
#[derive(Debug, Default)]
struct QueryForm {
    files: Vec<UploadedFile>,
    question: Option<String>,
    options: QueryOptions,
}

async fn read_form(mut multipart: Multipart) -> Result<QueryForm> {
    let mut form = QueryForm::default();

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        Error::bad_request(format!("Failed to read multipart field: {}", e))
    })? {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "question" => {
                let text = field.text().await.map_err(|e| {
                    Error::bad_request(format!("Failed to read question: {}", e))
                })?;
                form.question = Some(text);
            }
            "options" => {
                let data = field.bytes().await.map_err(|e| {
                    Error::bad_request(format!("Failed to read options: {}", e))
                })?;
                form.options = serde_json::from_slice(&data)
                    .map_err(|e| Error::bad_request(format!("Invalid options: {}", e)))?;
            }
            _ => {
                // Any other part carrying a filename is an uploaded document
                let Some(filename) = field.file_name().map(str::to_string) else {
                    tracing::debug!("Ignoring multipart field '{}'", name);
                    continue;
                };
                let data = field.bytes().await.map_err(|e| {
                    Error::bad_request(format!("Failed to read upload {}: {}", filename, e))
                })?;

                tracing::info!("Received file: {} ({} bytes)", filename, data.len());
                form.files.push(UploadedFile::new(filename, data));
            }
        }
    }

    Ok(form)
}

/// POST /api/query - answer a question from the uploaded files
pub async fn query_documents(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<QueryResponse>> {
    let start = Instant::now();
    let form = read_form(multipart).await?;

    // No files is answered with the canned reply even without a question
    let question = match form.question.as_deref().map(str::trim) {
        Some(q) if !q.is_empty() => q.to_string(),
        _ if form.files.is_empty() => String::new(),
        _ => return Err(Error::bad_request("Missing `question` field")),
    };

    tracing::info!("Query: \"{}\" over {} files", question, form.files.len());

    let report = {
        let _guard = state.collection_guard().await;
        state
            .pipeline()
            .run(&form.files, &question, &form.options)
            .await
            .map_err(|e| {
                if e.is_backend_failure() {
                    tracing::error!("Backend failure while answering: {}", e);
                } else {
                    tracing::warn!("Query failed: {}", e);
                }
                e
            })?
    };

    let processing_time_ms = start.elapsed().as_millis() as u64;
    tracing::info!(
        "Query completed in {}ms ({:?}, {} sources)",
        processing_time_ms,
        report.answer.outcome,
        report.answer.sources.len()
    );

    Ok(Json(QueryResponse::new(
        report.answer,
        report.unsupported,
        processing_time_ms,
    )))
}
