//! POST /ingest: indexes every Markdown file of the data directory.

use std::sync::Arc;

use axum::{Json, extract::State};
use tracing::{error, info};

use crate::{
    core::app_state::AppState, error_handler::AppResult,
    routes::ingest::ingest_response::IngestResponse,
};

/// Handler: POST /ingest
///
/// Runs the whole ingestion inside the request; the response is sent once
/// every record is written.
pub async fn ingest_route(State(state): State<Arc<AppState>>) -> AppResult<Json<IngestResponse>> {
    let report = state.rag.ingest().await.inspect_err(|e| {
        error!(error = %e, "ingestion failed");
    })?;

    let status = if report.documents == 0 {
        "no markdown documents found, nothing to ingest"
    } else {
        "ingestion completed successfully"
    };
    info!(records = report.records_written, "{status}");

    Ok(Json(IngestResponse {
        status: status.to_string(),
        documents: report.documents,
        chunks: report.chunks,
        records: report.records_written,
    }))
}
