use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rag_pipeline::PipelineError;
use serde::Serialize;
use thiserror::Error;

/// Public application error type.
#[derive(Debug, Error)]
pub enum AppError {
    // --- Boot / config ---
    #[error("configuration error: {0}")]
    Config(String),

    // --- IO / network / server ---
    #[error("failed to bind listener: {0}")]
    Bind(#[source] std::io::Error),

    #[error("server error: {0}")]
    Server(#[source] std::io::Error),

    // --- Request ---
    #[error("bad request: {0}")]
    BadRequest(String),

    // --- Pipelines ---
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) | AppError::Pipeline(PipelineError::EmptyQuery) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Config(_)
            | AppError::Bind(_)
            | AppError::Server(_)
            | AppError::Pipeline(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            AppError::Config(_) => "CONFIG_ERROR",
            AppError::Bind(_) => "BIND_ERROR",
            AppError::Server(_) => "SERVER_ERROR",
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::Pipeline(e) => match e {
                PipelineError::EmptyQuery => "BAD_REQUEST",
                PipelineError::StoreUnavailable { .. } => "STORE_UNAVAILABLE",
                PipelineError::IndexNotFound(_) => "INDEX_NOT_FOUND",
                PipelineError::Store(_) => "STORE_ERROR",
                PipelineError::Llm(_) => "LLM_ERROR",
                PipelineError::Io { .. } => "IO_ERROR",
                PipelineError::Config(_) => "CONFIG_ERROR",
            },
        }
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: String,
    code: &'a str,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorBody {
            error: self.to_string(),
            code: self.error_code(),
        };
        (status, Json(body)).into_response()
    }
}

/// Handy result alias used across handlers.
pub type AppResult<T> = Result<T, AppError>;

impl From<JsonRejection> for AppError {
    fn from(err: JsonRejection) -> Self {
        AppError::BadRequest(err.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pipeline_errors_map_to_status_and_code() {
        let missing = AppError::from(PipelineError::IndexNotFound("docs".into()));
        assert_eq!(missing.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(missing.error_code(), "INDEX_NOT_FOUND");

        let empty = AppError::from(PipelineError::EmptyQuery);
        assert_eq!(empty.status_code(), StatusCode::BAD_REQUEST);

        let bad = AppError::BadRequest("x".into());
        assert_eq!(bad.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(bad.error_code(), "BAD_REQUEST");
    }
}
