//! POST /query: answers a question from the indexed documents.

use std::sync::Arc;

use axum::{Json, extract::State, extract::rejection::JsonRejection};
use rag_pipeline::QueryResult;
use tracing::error;

use crate::{
    core::app_state::AppState,
    error_handler::{AppError, AppResult},
    routes::query::query_request::QueryRequest,
};

/// Handler: POST /query
///
/// Body validation happens before any call to the store or the models.
///
/// # Example
/// ```bash
/// curl -X POST http://127.0.0.1:5001/query \
///   -H 'content-type: application/json' \
///   -d '{"query":"How are documents chunked?"}'
/// ```
pub async fn query_route(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<QueryRequest>, JsonRejection>,
) -> AppResult<Json<QueryResult>> {
    let Json(body) = payload?;
    let query = body.query.trim();
    if query.is_empty() {
        return Err(AppError::BadRequest("query must not be empty".into()));
    }

    let result = state.rag.query(query).await.inspect_err(|e| {
        error!(error = %e, "query failed");
    })?;
    Ok(Json(result))
}
