//! Deterministic, offline [`Embedder`] and [`Generator`] for tests.

use std::sync::{
    Mutex,
    atomic::{AtomicBool, AtomicUsize, Ordering},
};

use ai_llm_service::AiLlmError;
use rag_store::BoxFuture;

use crate::embed::{Embedder, Generator};

/// Hashes characters into a fixed number of buckets and L2-normalizes.
pub struct FakeEmbedder {
    dimension: usize,
    fail: AtomicBool,
    calls: AtomicUsize,
}

impl FakeEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            fail: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Number of embed calls (query or batch) received.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn vector_for(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0.0f32; self.dimension];
        for c in text.chars().filter(|c| c.is_alphanumeric()) {
            v[(c.to_ascii_lowercase() as usize) % self.dimension] += 1.0;
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            v.iter_mut().for_each(|x| *x /= norm);
        }
        v
    }

    fn begin(&self) -> Result<(), AiLlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(AiLlmError::Decode("fake embedder failure".into()));
        }
        Ok(())
    }
}

impl Embedder for FakeEmbedder {
    fn embed_query<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<Vec<f32>, AiLlmError>> {
        Box::pin(async move {
            self.begin()?;
            Ok(self.vector_for(text))
        })
    }

    fn embed_documents<'a>(
        &'a self,
        texts: &'a [String],
    ) -> BoxFuture<'a, Result<Vec<Vec<f32>>, AiLlmError>> {
        Box::pin(async move {
            self.begin()?;
            Ok(texts.iter().map(|t| self.vector_for(t)).collect())
        })
    }
}

/// Returns a fixed answer and remembers the last prompt.
pub struct FakeGenerator {
    answer: String,
    fail: AtomicBool,
    last_prompt: Mutex<Option<String>>,
}

impl FakeGenerator {
    pub fn new(answer: impl Into<String>) -> Self {
        Self {
            answer: answer.into(),
            fail: AtomicBool::new(false),
            last_prompt: Mutex::new(None),
        }
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.last_prompt
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .clone()
    }
}

impl Generator for FakeGenerator {
    fn complete<'a>(&'a self, prompt: &'a str) -> BoxFuture<'a, Result<String, AiLlmError>> {
        Box::pin(async move {
            *self.last_prompt.lock().unwrap_or_else(|p| p.into_inner()) = Some(prompt.to_string());
            if self.fail.load(Ordering::SeqCst) {
                return Err(AiLlmError::EmptyChoices);
            }
            Ok(self.answer.clone())
        })
    }
}
