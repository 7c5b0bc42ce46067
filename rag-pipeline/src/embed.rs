//! Seams between the pipelines and the model provider.
//!
//! The pipelines only need "text in, vectors out" and "prompt in, answer out";
//! production wires both to [`LlmServiceProfiles`], tests plug in fakes.

use ai_llm_service::{AiLlmError, LlmServiceProfiles};
use rag_store::BoxFuture;

/// Embedding model used for both documents and queries.
pub trait Embedder: Send + Sync {
    fn embed_query<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<Vec<f32>, AiLlmError>>;

    /// One vector per input, same order. Batching is up to the implementation.
    fn embed_documents<'a>(
        &'a self,
        texts: &'a [String],
    ) -> BoxFuture<'a, Result<Vec<Vec<f32>>, AiLlmError>>;
}

/// Chat model producing the final answer.
pub trait Generator: Send + Sync {
    fn complete<'a>(&'a self, prompt: &'a str) -> BoxFuture<'a, Result<String, AiLlmError>>;
}

impl Embedder for LlmServiceProfiles {
    fn embed_query<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<Vec<f32>, AiLlmError>> {
        Box::pin(self.embed(text))
    }

    fn embed_documents<'a>(
        &'a self,
        texts: &'a [String],
    ) -> BoxFuture<'a, Result<Vec<Vec<f32>>, AiLlmError>> {
        Box::pin(self.embed_many(texts))
    }
}

impl Generator for LlmServiceProfiles {
    fn complete<'a>(&'a self, prompt: &'a str) -> BoxFuture<'a, Result<String, AiLlmError>> {
        Box::pin(self.generate(prompt, None))
    }
}
