//! Typed error for the pipeline crate.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// The vector store did not become healthy within the readiness window.
    #[error("vector store '{index}' is unreachable after {waited_secs}s")]
    StoreUnavailable { index: String, waited_secs: u64 },

    /// Blank question.
    #[error("query must not be empty")]
    EmptyQuery,

    /// The index has not been created yet; ingest documents first.
    #[error("index '{0}' does not exist, ingest documents first")]
    IndexNotFound(String),

    /// Errors from the vector-store client.
    #[error("vector store error: {0}")]
    Store(#[from] rag_store::StoreError),

    /// Errors from the embedding or chat provider.
    #[error("LLM error: {0}")]
    Llm(#[from] ai_llm_service::AiLlmError),

    /// Filesystem errors while loading documents.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Invalid pipeline configuration.
    #[error("config error: {0}")]
    Config(String),
}

impl PipelineError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
