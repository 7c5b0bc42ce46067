//! Query pipeline: embed → k-NN → stuff prompt → chat completion.

use std::time::Instant;

use rag_store::StoreError;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{RagContext, error::PipelineError, prompt::build_stuff_prompt};

/// Answer plus the chunks it was grounded on, in retrieval order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub answer: String,
    pub sources: Vec<Source>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Source {
    pub content: String,
    /// Only set when the record carried a `source` metadata entry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

/// Answers `question` from the indexed documents.
///
/// The index is never created here; querying before any ingestion fails
/// with `IndexNotFound`.
///
/// # Errors
/// - `EmptyQuery` for blank input (checked before any network call)
/// - `StoreUnavailable` if the readiness window elapses
/// - `IndexNotFound` if the index does not exist
/// - `Llm` / `Store` for provider or search failures
pub async fn answer_query(ctx: &RagContext, question: &str) -> Result<QueryResult, PipelineError> {
    let question = question.trim();
    if question.is_empty() {
        return Err(PipelineError::EmptyQuery);
    }
    let started = Instant::now();
    info!(index = %ctx.store.index_name(), chars = question.chars().count(), "query started");

    ctx.require_store().await?;
    if !ctx.store.index_exists().await? {
        return Err(PipelineError::IndexNotFound(ctx.store.index_name().to_string()));
    }

    let vector = ctx.embedder.embed_query(question).await?;
    let hits = ctx
        .store
        .knn_search(&vector, ctx.config.top_k)
        .await
        .map_err(|e| match e {
            StoreError::IndexNotFound(index) => PipelineError::IndexNotFound(index),
            other => other.into(),
        })?;
    debug!(top_k = ctx.config.top_k, hits = hits.len(), "retrieved context");

    let prompt = build_stuff_prompt(question, &hits);
    let answer = ctx.generator.complete(&prompt).await?;

    let sources = hits
        .into_iter()
        .map(|h| Source {
            file: h.source().map(str::to_string),
            content: h.text,
        })
        .collect();

    info!(elapsed_ms = started.elapsed().as_millis(), "query answered");
    Ok(QueryResult { answer, sources })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{harness, long_markdown};
    use serde_json::json;

    #[tokio::test]
    async fn answers_with_sources_after_ingestion() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.md"), long_markdown()).unwrap();
        let h = harness(dir.path());
        h.ctx.ingest().await.unwrap();

        let res = h.ctx.query("How does HNSW link neighbours?").await.unwrap();
        assert_eq!(res.answer, "42");
        assert_eq!(res.sources.len(), 3);
        for s in &res.sources {
            assert!(s.file.as_deref().unwrap().ends_with("a.md"));
            assert!(!s.content.is_empty());
        }

        let prompt = h.generator.last_prompt().unwrap();
        assert!(prompt.contains(&res.sources[0].content));
        assert!(prompt.contains("Question: How does HNSW link neighbours?"));
    }

    #[tokio::test]
    async fn missing_index_is_reported_without_embedding() {
        let dir = tempfile::tempdir().unwrap();
        let h = harness(dir.path());

        let err = h.ctx.query("anything").await.unwrap_err();
        assert!(matches!(err, PipelineError::IndexNotFound(ref i) if i == "docs"));
        assert_eq!(h.embedder.calls(), 0);
        assert_eq!(h.store.creation_count(), 0);
    }

    #[tokio::test]
    async fn blank_query_is_rejected_before_touching_the_store() {
        let dir = tempfile::tempdir().unwrap();
        let h = harness(dir.path());

        let err = h.ctx.query("  \n ").await.unwrap_err();
        assert!(matches!(err, PipelineError::EmptyQuery));
        assert_eq!(h.store.ping_count(), 0);
    }

    #[tokio::test]
    async fn unreachable_store_fails_the_query() {
        let dir = tempfile::tempdir().unwrap();
        let h = harness(dir.path());
        h.store.set_reachable(false);

        let err = h.ctx.query("anything").await.unwrap_err();
        assert!(matches!(err, PipelineError::StoreUnavailable { .. }));
    }

    #[tokio::test]
    async fn generator_failure_propagates() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.md"), "some body").unwrap();
        let h = harness(dir.path());
        h.ctx.ingest().await.unwrap();
        h.generator.set_failing(true);

        let err = h.ctx.query("body?").await.unwrap_err();
        assert!(matches!(err, PipelineError::Llm(_)));
    }

    #[test]
    fn source_without_file_omits_the_field() {
        let s = Source {
            content: "c".into(),
            file: None,
        };
        assert_eq!(serde_json::to_value(&s).unwrap(), json!({ "content": "c" }));
    }
}
