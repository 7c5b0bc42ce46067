//! Shared LLM service with two profiles: `chat` and `embedding`.
//!
//! - Lives in the same Tokio runtime as the application.
//! - Construct once at startup, wrap in `Arc`, and pass clones to dependents.
//! - Each profile owns one preconfigured HTTP client.
//!
//! # Example
//! ```no_run
//! use std::sync::Arc;
//! use ai_llm_service::service_profiles::LlmServiceProfiles;
//! use ai_llm_service::config::default_config::{config_openai_chat, config_openai_embedding};
//!
//! # async fn run() -> Result<(), ai_llm_service::AiLlmError> {
//! let svc = Arc::new(LlmServiceProfiles::new(
//!     config_openai_chat()?,
//!     config_openai_embedding()?,
//!     Some(10),
//! )?);
//!
//! let answer = svc.generate("Hello world", None).await?;
//! let vectors = svc.embed_many(&["Ferris".to_string()]).await?;
//! println!("{answer} / dim = {}", vectors[0].len());
//! # Ok(())
//! # }
//! ```

use crate::{
    config::llm_model_config::LlmModelConfig,
    error_handler::AiLlmError,
    health_service::{HealthService, HealthStatus},
    services::open_ai_service::OpenAiService,
};

/// Process-wide handle over the chat and embedding clients.
pub struct LlmServiceProfiles {
    chat: OpenAiService,
    embedding: OpenAiService,
    health: HealthService,
}

impl LlmServiceProfiles {
    /// Creates the service, validating and building both clients eagerly.
    ///
    /// # Errors
    /// Returns [`AiLlmError`] if either config is invalid or a client cannot be built.
    pub fn new(
        chat: LlmModelConfig,
        embedding: LlmModelConfig,
        health_timeout_secs: Option<u64>,
    ) -> Result<Self, AiLlmError> {
        Ok(Self {
            chat: OpenAiService::new(chat)?,
            embedding: OpenAiService::new(embedding)?,
            health: HealthService::new(health_timeout_secs)?,
        })
    }

    /// Generates text with the chat profile.
    pub async fn generate(&self, prompt: &str, system: Option<&str>) -> Result<String, AiLlmError> {
        self.chat.generate(prompt, system).await
    }

    /// Embeds one input with the embedding profile.
    pub async fn embed(&self, input: &str) -> Result<Vec<f32>, AiLlmError> {
        self.embedding.embeddings(input).await
    }

    /// Embeds many inputs with the embedding profile (batched internally).
    pub async fn embed_many(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, AiLlmError> {
        self.embedding.embed_batch(inputs).await
    }

    /// Health snapshot for both profiles; identical configs are probed once.
    pub async fn health_all(&self) -> Vec<HealthStatus> {
        let mut list = vec![self.chat.config().clone()];
        if self.embedding.config() != self.chat.config() {
            list.push(self.embedding.config().clone());
        }
        self.health.check_many(&list).await
    }

    /// Returns references to the current profiles `(chat, embedding)`.
    pub fn profiles(&self) -> (&LlmModelConfig, &LlmModelConfig) {
        (self.chat.config(), self.embedding.config())
    }
}
