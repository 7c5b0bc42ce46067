//! Ingestion pipeline: load → split → embed → bulk index.

use std::time::Instant;

use ai_llm_service::AiLlmError;
use rag_store::IndexRecord;
use serde::Serialize;
use tracing::{info, warn};

use crate::{
    RagContext, error::PipelineError, loader::load_markdown_dir, splitter::TextSplitter,
};

/// Counts of one ingestion run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub documents: usize,
    pub chunks: usize,
    pub records_written: usize,
}

/// Runs the ingestion pipeline over `ctx.config.data_path`.
///
/// The store must become ready first; nothing is written otherwise. An empty
/// directory is not an error and yields an all-zero report. Every run
/// appends: re-ingesting the same files duplicates their records.
///
/// # Errors
/// - `StoreUnavailable` if the readiness window elapses
/// - `Store` for index creation or bulk write failures
/// - `Io` if the directory or a file cannot be read
/// - `Llm` if embedding fails
pub async fn ingest_directory(ctx: &RagContext) -> Result<IngestReport, PipelineError> {
    let started = Instant::now();
    let dir = &ctx.config.data_path;
    info!(dir = %dir.display(), index = %ctx.store.index_name(), "ingestion started");

    ctx.require_store().await?;
    let status = ctx.store.ensure_index().await?;
    info!(?status, index = %ctx.store.index_name(), "index ready");

    let docs = load_markdown_dir(dir).await?;
    if docs.is_empty() {
        warn!(dir = %dir.display(), "no markdown documents found, nothing to ingest");
        return Ok(IngestReport::default());
    }

    let splitter = TextSplitter::new(ctx.config.chunk_size, ctx.config.chunk_overlap)?;
    let chunks = splitter.split_documents(&docs);
    info!(documents = docs.len(), chunks = chunks.len(), "documents split");

    let mut report = IngestReport {
        documents: docs.len(),
        chunks: chunks.len(),
        records_written: 0,
    };
    if chunks.is_empty() {
        return Ok(report);
    }

    let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
    let vectors = ctx.embedder.embed_documents(&texts).await?;
    if vectors.len() != chunks.len() {
        return Err(AiLlmError::EmbeddingCount {
            got: vectors.len(),
            want: chunks.len(),
        }
        .into());
    }

    let records: Vec<IndexRecord> = chunks
        .into_iter()
        .zip(vectors)
        .map(|(chunk, vector)| IndexRecord {
            text: chunk.text,
            metadata: chunk.metadata,
            vector,
        })
        .collect();

    report.records_written = ctx.store.bulk_add(&records).await?;
    info!(
        documents = report.documents,
        chunks = report.chunks,
        records = report.records_written,
        elapsed_ms = started.elapsed().as_millis(),
        "ingestion finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{DIM, harness, long_markdown};

    #[tokio::test]
    async fn non_markdown_directory_succeeds_with_zero_records() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("readme.txt"), "plain").unwrap();
        let h = harness(dir.path());

        let report = h.ctx.ingest().await.unwrap();
        assert_eq!(report, IngestReport::default());
        assert!(h.store.records().is_empty());
        assert_eq!(h.store.creation_count(), 1);
        assert_eq!(h.embedder.calls(), 0);
    }

    #[tokio::test]
    async fn long_document_becomes_several_records() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.md"), long_markdown()).unwrap();
        let h = harness(dir.path());

        let report = h.ctx.ingest().await.unwrap();
        assert_eq!(report.documents, 1);
        assert!(report.chunks >= 2);
        assert_eq!(report.records_written, report.chunks);

        let records = h.store.records();
        assert_eq!(records.len(), report.chunks);
        for r in &records {
            assert!(r.text.chars().count() <= 1000);
            assert_eq!(r.vector.len(), DIM);
            let source = r.metadata.get("source").and_then(|v| v.as_str()).unwrap();
            assert!(source.ends_with("a.md"));
        }
    }

    #[tokio::test]
    async fn reingestion_appends_without_recreating_index() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.md"), "# Title\n\nshort body").unwrap();
        let h = harness(dir.path());

        h.ctx.ingest().await.unwrap();
        h.ctx.ingest().await.unwrap();
        assert_eq!(h.store.records().len(), 2);
        assert_eq!(h.store.creation_count(), 1);
    }

    #[tokio::test]
    async fn unreachable_store_aborts_before_any_write() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.md"), "body").unwrap();
        let h = harness(dir.path());
        h.store.set_reachable(false);

        let err = h.ctx.ingest().await.unwrap_err();
        assert!(matches!(err, PipelineError::StoreUnavailable { .. }));
        h.store.set_reachable(true);
        assert!(!rag_store::VectorStore::index_exists(h.store.as_ref()).await.unwrap());
        assert_eq!(h.embedder.calls(), 0);
    }

    #[tokio::test]
    async fn embedding_failure_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.md"), "body").unwrap();
        let h = harness(dir.path());
        h.embedder.set_failing(true);

        let err = h.ctx.ingest().await.unwrap_err();
        assert!(matches!(err, PipelineError::Llm(_)));
        assert!(h.store.records().is_empty());
    }

    #[tokio::test]
    async fn missing_data_dir_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let h = harness(&dir.path().join("absent"));
        let err = h.ctx.ingest().await.unwrap_err();
        assert!(matches!(err, PipelineError::Io { .. }));
    }
}
