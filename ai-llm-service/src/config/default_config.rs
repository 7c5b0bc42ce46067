//! Default model configs loaded from environment variables.
//!
//! Two roles are supported, both served by an OpenAI-compatible API:
//!
//! - **Chat**      → answer generation (deterministic, temperature 0)
//! - **Embedding** → document and query embeddings
//!
//! # Environment variables
//!
//! Common:
//! - `OPENAI_API_KEY`   = bearer token (mandatory)
//! - `OPENAI_BASE_URL`  = API base (default `https://api.openai.com`)
//! - `LLM_TIMEOUT_SECS` = per-request timeout (default 120)
//!
//! Chat:
//! - `CHAT_MODEL`     = chat model (default `gpt-4.1-2025-04-14`)
//! - `LLM_MAX_TOKENS` = optional completion cap (u32)
//!
//! Embedding:
//! - `EMBEDDING_MODEL`      = embedding model (default `text-embedding-3-large`)
//! - `EMBEDDING_BATCH_SIZE` = inputs per request (default 1000)

use crate::{
    config::llm_model_config::LlmModelConfig,
    error_handler::{
        AiLlmError, ConfigError, EnvLookup, env_opt_u32, env_or, env_positive_usize_or,
        env_u64_or, must_env, process_env, validate_http_endpoint,
    },
};

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com";
pub const DEFAULT_CHAT_MODEL: &str = "gpt-4.1-2025-04-14";
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-large";
pub const DEFAULT_EMBEDDING_BATCH_SIZE: usize = 1000;
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Resolves and validates the API base URL.
fn openai_endpoint(env: EnvLookup<'_>) -> Result<String, AiLlmError> {
    let url = env_or(env, "OPENAI_BASE_URL", DEFAULT_OPENAI_BASE_URL);
    validate_http_endpoint("OPENAI_BASE_URL", &url)?;
    Ok(url.trim_end_matches('/').to_string())
}

fn model_or(env: EnvLookup<'_>, var: &str, default: &str) -> Result<String, AiLlmError> {
    let model = env_or(env, var, default);
    if model.is_empty() {
        return Err(ConfigError::EmptyModel.into());
    }
    Ok(model)
}

/// Constructs the config for the **chat** model from the process environment.
///
/// # Defaults
/// - `temperature = Some(0.0)`
/// - `timeout_secs = Some(120)`
///
/// # Errors
/// - [`ConfigError::MissingVar`] if `OPENAI_API_KEY` is absent
/// - [`ConfigError::InvalidFormat`] if `OPENAI_BASE_URL` is not http(s)
/// - [`ConfigError::InvalidNumber`] for malformed numeric variables
pub fn config_openai_chat() -> Result<LlmModelConfig, AiLlmError> {
    config_openai_chat_with(&process_env)
}

/// [`config_openai_chat`] over an arbitrary variable source.
pub fn config_openai_chat_with(env: EnvLookup<'_>) -> Result<LlmModelConfig, AiLlmError> {
    Ok(LlmModelConfig {
        model: model_or(env, "CHAT_MODEL", DEFAULT_CHAT_MODEL)?,
        endpoint: openai_endpoint(env)?,
        api_key: must_env(env, "OPENAI_API_KEY")?,
        max_tokens: env_opt_u32(env, "LLM_MAX_TOKENS")?,
        temperature: Some(0.0),
        top_p: None,
        timeout_secs: Some(env_u64_or(env, "LLM_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?),
        batch_size: None,
    })
}

/// Constructs the config for the **embedding** model from the process environment.
///
/// # Errors
/// Same as [`config_openai_chat`], plus an invalid `EMBEDDING_BATCH_SIZE`.
pub fn config_openai_embedding() -> Result<LlmModelConfig, AiLlmError> {
    config_openai_embedding_with(&process_env)
}

/// [`config_openai_embedding`] over an arbitrary variable source.
pub fn config_openai_embedding_with(env: EnvLookup<'_>) -> Result<LlmModelConfig, AiLlmError> {
    Ok(LlmModelConfig {
        model: model_or(env, "EMBEDDING_MODEL", DEFAULT_EMBEDDING_MODEL)?,
        endpoint: openai_endpoint(env)?,
        api_key: must_env(env, "OPENAI_API_KEY")?,
        max_tokens: None,
        temperature: None,
        top_p: None,
        timeout_secs: Some(env_u64_or(env, "LLM_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?),
        batch_size: Some(env_positive_usize_or(
            env,
            "EMBEDDING_BATCH_SIZE",
            DEFAULT_EMBEDDING_BATCH_SIZE,
        )?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn chat(pairs: &[(&str, &str)]) -> Result<LlmModelConfig, AiLlmError> {
        let map = vars(pairs);
        config_openai_chat_with(&|k: &str| map.get(k).cloned())
    }

    fn embedding(pairs: &[(&str, &str)]) -> Result<LlmModelConfig, AiLlmError> {
        let map = vars(pairs);
        config_openai_embedding_with(&|k: &str| map.get(k).cloned())
    }

    #[test]
    fn defaults_apply_with_only_the_key() {
        let cfg = chat(&[("OPENAI_API_KEY", "sk-test")]).unwrap();
        assert_eq!(cfg.model, DEFAULT_CHAT_MODEL);
        assert_eq!(cfg.endpoint, DEFAULT_OPENAI_BASE_URL);
        assert_eq!(cfg.temperature, Some(0.0));
        assert_eq!(cfg.timeout_secs, Some(120));

        let cfg = embedding(&[("OPENAI_API_KEY", "sk-test")]).unwrap();
        assert_eq!(cfg.model, DEFAULT_EMBEDDING_MODEL);
        assert_eq!(cfg.batch_size, Some(DEFAULT_EMBEDDING_BATCH_SIZE));
    }

    #[test]
    fn missing_or_blank_api_key_fails() {
        for pairs in [&[][..], &[("OPENAI_API_KEY", "  ")][..]] {
            assert!(matches!(
                chat(pairs),
                Err(AiLlmError::Config(ConfigError::MissingVar("OPENAI_API_KEY")))
            ));
            assert!(matches!(
                embedding(pairs),
                Err(AiLlmError::Config(ConfigError::MissingVar("OPENAI_API_KEY")))
            ));
        }
    }

    #[test]
    fn malformed_values_fail() {
        let key = ("OPENAI_API_KEY", "sk-test");
        assert!(matches!(
            chat(&[key, ("LLM_TIMEOUT_SECS", "soon")]),
            Err(AiLlmError::Config(ConfigError::InvalidNumber { var: "LLM_TIMEOUT_SECS", .. }))
        ));
        assert!(matches!(
            chat(&[key, ("LLM_MAX_TOKENS", "-1")]),
            Err(AiLlmError::Config(ConfigError::InvalidNumber { var: "LLM_MAX_TOKENS", .. }))
        ));
        assert!(matches!(
            chat(&[key, ("OPENAI_BASE_URL", "api.openai.com")]),
            Err(AiLlmError::Config(ConfigError::InvalidFormat { var: "OPENAI_BASE_URL", .. }))
        ));
        for bad in ["0", "many"] {
            assert!(matches!(
                embedding(&[key, ("EMBEDDING_BATCH_SIZE", bad)]),
                Err(AiLlmError::Config(ConfigError::InvalidNumber {
                    var: "EMBEDDING_BATCH_SIZE",
                    ..
                }))
            ));
        }
    }

    #[test]
    fn base_url_is_normalized() {
        let cfg = chat(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("OPENAI_BASE_URL", " http://localhost:8080/ "),
        ])
        .unwrap();
        assert_eq!(cfg.endpoint, "http://localhost:8080");
    }
}
