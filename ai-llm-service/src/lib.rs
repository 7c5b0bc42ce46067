//! Shared LLM service for the RAG backend.
//!
//! - [`services::open_ai_service::OpenAiService`]: chat completions and batched embeddings
//! - [`service_profiles::LlmServiceProfiles`]: chat + embedding profiles behind one handle
//! - [`health_service::HealthService`]: provider health probes
//! - [`config`]: env-driven model configs

pub mod config;
pub mod error_handler;
pub mod health_service;
pub mod service_profiles;
pub mod services;

pub use config::llm_model_config::LlmModelConfig;
pub use error_handler::{AiLlmError, ConfigError};
pub use health_service::HealthStatus;
pub use service_profiles::LlmServiceProfiles;
