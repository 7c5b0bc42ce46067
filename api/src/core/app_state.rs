use std::sync::Arc;

use ai_llm_service::{
    LlmServiceProfiles,
    config::default_config::{config_openai_chat_with, config_openai_embedding_with},
    error_handler::{EnvLookup, process_env},
};
use rag_pipeline::{PipelineConfig, RagContext};
use rag_store::{ReadinessPolicy, StoreConfig, VectorStore};
use tracing::info;

use crate::error_handler::AppError;

/// Timeout of one provider health probe, seconds.
const HEALTH_TIMEOUT_SECS: u64 = 10;

/// Shared state for all HTTP handlers. Built once at startup.
#[derive(Clone)]
pub struct AppState {
    /// Chat + embedding clients; also probed by `/health`.
    pub llm: Arc<LlmServiceProfiles>,
    /// Store, models and knobs used by both pipelines.
    pub rag: RagContext,
}

impl AppState {
    /// Wires the pipelines to the given clients; the LLM handle serves as
    /// both embedder and generator.
    pub fn new(
        llm: Arc<LlmServiceProfiles>,
        store: Arc<dyn VectorStore>,
        readiness: ReadinessPolicy,
        config: PipelineConfig,
    ) -> Self {
        let rag = RagContext {
            store,
            embedder: llm.clone(),
            generator: llm.clone(),
            readiness,
            config,
        };
        Self { llm, rag }
    }

    /// Load shared state from environment variables.
    ///
    /// Fails fast if `OPENAI_API_KEY`, the store URL or `INDEX_NAME` is
    /// missing, or if any optional value is malformed. No network calls are made.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(&process_env)
    }

    /// Same as [`AppState::from_env`] over an arbitrary variable source.
    pub fn from_lookup(env: EnvLookup<'_>) -> Result<Self, AppError> {
        let chat = config_openai_chat_with(env).map_err(config_error)?;
        let embedding = config_openai_embedding_with(env).map_err(config_error)?;
        let llm = LlmServiceProfiles::new(chat, embedding, Some(HEALTH_TIMEOUT_SECS))
            .map_err(config_error)?;

        let store_cfg = StoreConfig::from_lookup(env).map_err(config_error)?;
        let store = rag_store::connect(&store_cfg).map_err(config_error)?;
        let pipeline_cfg = PipelineConfig::from_lookup(env).map_err(config_error)?;

        let (chat, embedding) = llm.profiles();
        info!(
            chat_model = %chat.model,
            embedding_model = %embedding.model,
            index = %store_cfg.index,
            data_path = %pipeline_cfg.data_path.display(),
            top_k = pipeline_cfg.top_k,
            "application state ready"
        );

        Ok(Self::new(
            Arc::new(llm),
            store,
            store_cfg.readiness,
            pipeline_cfg,
        ))
    }
}

fn config_error(err: impl std::fmt::Display) -> AppError {
    AppError::Config(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const REQUIRED: [(&str, &str); 3] = [
        ("OPENAI_API_KEY", "sk-test"),
        ("OPENSEARCH_URL", "http://localhost:9200"),
        ("INDEX_NAME", "docs"),
    ];

    fn build(pairs: &[(&str, &str)]) -> Result<AppState, AppError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppState::from_lookup(&|k: &str| vars.get(k).cloned())
    }

    fn config_message(res: Result<AppState, AppError>) -> String {
        match res {
            Err(AppError::Config(msg)) => msg,
            Err(other) => panic!("expected config error, got {other}"),
            Ok(_) => panic!("expected config error, got a state"),
        }
    }

    #[test]
    fn required_variables_are_enough() {
        let state = build(&REQUIRED).unwrap();
        assert_eq!(state.rag.store.index_name(), "docs");
        assert_eq!(state.rag.config, PipelineConfig::default());
        assert_eq!(state.rag.readiness, ReadinessPolicy::default());
    }

    #[test]
    fn each_missing_required_variable_fails_startup() {
        for missing in REQUIRED.map(|(k, _)| k) {
            let pairs: Vec<(&str, &str)> =
                REQUIRED.into_iter().filter(|(k, _)| *k != missing).collect();
            let msg = config_message(build(&pairs));
            assert!(msg.contains(missing), "{missing}: {msg}");
        }
    }

    #[test]
    fn malformed_numbers_fail_startup() {
        for (key, value) in [
            ("EMBEDDING_DIM", "3072d"),
            ("BULK_SIZE", "lots"),
            ("CHUNK_SIZE", "1e3"),
            ("LLM_TIMEOUT_SECS", "-5"),
        ] {
            let mut pairs = REQUIRED.to_vec();
            pairs.push((key, value));
            let msg = config_message(build(&pairs));
            assert!(msg.contains(key), "{key}: {msg}");
        }
    }
}
