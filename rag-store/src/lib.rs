//! Vector-store client for the RAG backend.
//!
//! This crate provides:
//! - a backend-neutral [`VectorStore`] trait (health, index lifecycle, bulk add, k-NN search)
//! - an OpenSearch backend speaking the k-NN plugin REST API
//! - a Qdrant backend over `qdrant-client`
//! - [`wait_ready`], the bounded readiness poll used before every pipeline run

mod config;
mod errors;
mod opensearch;
mod qdrant_facade;
mod readiness;
mod record;

#[cfg(any(test, feature = "test-util"))]
pub mod memory;

pub use config::{BackendKind, IndexSchema, ReadinessPolicy, StoreConfig};
pub use errors::StoreError;
pub use opensearch::OpenSearchStore;
pub use qdrant_facade::QdrantStore;
pub use readiness::wait_ready;
pub use record::{IndexRecord, IndexStatus, SearchHit, check_dimensions};

use std::{future::Future, pin::Pin, sync::Arc};

use tracing::info;

/// Boxed, `Send` future returned by [`VectorStore`] methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Operations the pipelines need from a vector-search engine.
///
/// Implementations keep only a connection handle; every call is a network
/// round trip.
pub trait VectorStore: Send + Sync {
    /// Name of the target index / collection.
    fn index_name(&self) -> &str;

    /// Single health probe. `Ok(false)` means the store answered but is not
    /// ready; `Err` is a transport failure.
    fn ping(&self) -> BoxFuture<'_, Result<bool, StoreError>>;

    /// Whether the target index exists.
    fn index_exists(&self) -> BoxFuture<'_, Result<bool, StoreError>>;

    /// Creates the index with the fixed k-NN schema unless it already exists.
    /// Losing a creation race counts as success.
    fn ensure_index(&self) -> BoxFuture<'_, Result<IndexStatus, StoreError>>;

    /// Appends records in bulk batches and returns how many were written.
    /// Every vector is checked against the index dimension before any write.
    fn bulk_add<'a>(
        &'a self,
        records: &'a [IndexRecord],
    ) -> BoxFuture<'a, Result<usize, StoreError>>;

    /// Approximate k nearest neighbours of `vector`, best first.
    fn knn_search<'a>(
        &'a self,
        vector: &'a [f32],
        k: usize,
    ) -> BoxFuture<'a, Result<Vec<SearchHit>, StoreError>>;
}

/// Builds the configured backend.
///
/// # Errors
/// Returns `StoreError::Config` if the config is invalid or the client cannot be built.
pub fn connect(cfg: &StoreConfig) -> Result<Arc<dyn VectorStore>, StoreError> {
    cfg.validate()?;
    info!(
        backend = ?cfg.backend,
        host = %cfg.host(),
        index = %cfg.index,
        dimension = cfg.schema.dimension,
        "connecting vector store"
    );
    Ok(match cfg.backend {
        BackendKind::OpenSearch => Arc::new(OpenSearchStore::new(cfg)?),
        BackendKind::Qdrant => Arc::new(QdrantStore::new(cfg)?),
    })
}
