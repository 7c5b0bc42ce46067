//! Ingestion and query pipelines of the Markdown RAG backend.
//!
//! - [`RagContext::ingest`]: load `*.md` → split → embed → bulk index.
//! - [`RagContext::query`]: embed question → top-k → stuff prompt → answer with sources.
//!
//! Both runs start by waiting for the vector store; neither retries anything
//! beyond that readiness poll.

mod cfg;
mod embed;
mod error;
mod ingest;
mod loader;
mod prompt;
mod query;
mod splitter;

#[cfg(any(test, feature = "test-util"))]
pub mod fakes;

pub use cfg::PipelineConfig;
pub use embed::{Embedder, Generator};
pub use error::PipelineError;
pub use ingest::{IngestReport, ingest_directory};
pub use loader::{Document, load_markdown_dir, markdown_to_text};
pub use prompt::build_stuff_prompt;
pub use query::{QueryResult, Source, answer_query};
pub use splitter::{Chunk, TextSplitter};

use std::sync::Arc;

use rag_store::{ReadinessPolicy, VectorStore, wait_ready};

/// Process-wide handles shared by both pipelines.
#[derive(Clone)]
pub struct RagContext {
    pub store: Arc<dyn VectorStore>,
    pub embedder: Arc<dyn Embedder>,
    pub generator: Arc<dyn Generator>,
    pub readiness: ReadinessPolicy,
    pub config: PipelineConfig,
}

impl RagContext {
    pub async fn ingest(&self) -> Result<IngestReport, PipelineError> {
        ingest_directory(self).await
    }

    pub async fn query(&self, question: &str) -> Result<QueryResult, PipelineError> {
        answer_query(self, question).await
    }

    /// Fails with `StoreUnavailable` if the store stays unhealthy for the whole window.
    pub(crate) async fn require_store(&self) -> Result<(), PipelineError> {
        if wait_ready(self.store.as_ref(), &self.readiness).await {
            Ok(())
        } else {
            Err(PipelineError::StoreUnavailable {
                index: self.store.index_name().to_string(),
                waited_secs: self.readiness.timeout.as_secs(),
            })
        }
    }
}
