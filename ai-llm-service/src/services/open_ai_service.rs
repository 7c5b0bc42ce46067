//! OpenAI (or compatible) service for text generation and embeddings.
//!
//! Minimal, non-streaming client around the OpenAI REST API.
//! Endpoints are derived from `LlmModelConfig::endpoint`:
//! - POST {endpoint}/v1/chat/completions: chat completion (non-streaming)
//! - POST {endpoint}/v1/embeddings      : embeddings, batched
//!
//! Constructor validation:
//! - `cfg.api_key` must be non-empty
//! - `cfg.endpoint` must start with http:// or https://
//! - `cfg.model` must be non-empty
//!
//! Errors are normalized via unified error types in `error_handler`.

use std::time::{Duration, Instant};

use reqwest::header;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::{debug, error, info};

use crate::{
    config::{default_config::DEFAULT_EMBEDDING_BATCH_SIZE, llm_model_config::LlmModelConfig},
    error_handler::{
        AiLlmError, ConfigError, HttpError, make_snippet, validate_http_endpoint,
        validate_range_f32,
    },
};

/// Thin client for the OpenAI API.
///
/// Constructed from a complete [`LlmModelConfig`]. Internally keeps a
/// preconfigured `reqwest::Client` (with timeout and default headers).
///
/// High-level operations:
/// - [`OpenAiService::generate`]   : single, non-streaming chat completion
/// - [`OpenAiService::embeddings`] : one vector for one input
/// - [`OpenAiService::embed_batch`]: many vectors, batched per request
#[derive(Debug)]
pub struct OpenAiService {
    client: reqwest::Client,
    cfg: LlmModelConfig,
    url_chat: String,
    url_embeddings: String,
}

impl OpenAiService {
    /// Creates a new [`OpenAiService`] from the given config.
    ///
    /// # Errors
    /// - [`ConfigError::MissingVar`] if the API key is empty
    /// - [`ConfigError::InvalidFormat`] if the endpoint is not http(s)
    /// - [`ConfigError::EmptyModel`] if the model name is empty
    /// - [`AiLlmError::HttpTransport`] if the HTTP client cannot be built
    pub fn new(cfg: LlmModelConfig) -> Result<Self, AiLlmError> {
        if cfg.api_key.trim().is_empty() {
            return Err(ConfigError::MissingVar("OPENAI_API_KEY").into());
        }
        validate_http_endpoint("OPENAI_BASE_URL", &cfg.endpoint)?;
        if cfg.model.trim().is_empty() {
            return Err(ConfigError::EmptyModel.into());
        }
        if let Some(t) = cfg.temperature {
            validate_range_f32("temperature", t, 0.0, 2.0)?;
        }
        if let Some(p) = cfg.top_p {
            validate_range_f32("top_p", p, 0.0, 1.0)?;
        }

        let timeout = cfg
            .timeout_secs
            .map(Duration::from_secs)
            .unwrap_or_else(|| Duration::from_secs(60));

        let mut headers = header::HeaderMap::new();
        let mut auth = header::HeaderValue::from_str(&format!("Bearer {}", cfg.api_key.trim()))
            .map_err(|e| AiLlmError::Decode(format!("invalid API key header: {e}")))?;
        auth.set_sensitive(true);
        headers.insert(header::AUTHORIZATION, auth);
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()?;

        let base = cfg.endpoint.trim().trim_end_matches('/').to_string();
        let url_chat = format!("{base}/v1/chat/completions");
        let url_embeddings = format!("{base}/v1/embeddings");

        info!(
            model = %cfg.model,
            endpoint = %cfg.endpoint,
            timeout_secs = timeout.as_secs(),
            "OpenAiService initialized"
        );

        Ok(Self {
            client,
            cfg,
            url_chat,
            url_embeddings,
        })
    }

    /// The config this client was built from.
    pub fn config(&self) -> &LlmModelConfig {
        &self.cfg
    }

    /// Performs a **non-streaming** chat completion request.
    ///
    /// Messages: optional system message, then the user `prompt`.
    /// Mapped options from config: `model`, `temperature`, `top_p`, `max_tokens`.
    ///
    /// # Errors
    /// - [`AiLlmError::Http`] for non-2xx responses
    /// - [`AiLlmError::HttpTransport`] for client/network failures
    /// - [`AiLlmError::Decode`] if the JSON cannot be parsed
    /// - [`AiLlmError::EmptyChoices`] if no choice carries content
    pub async fn generate(&self, prompt: &str, system: Option<&str>) -> Result<String, AiLlmError> {
        let started = Instant::now();
        let body = ChatCompletionRequest::from_cfg(&self.cfg, prompt, system);

        debug!(
            model = %self.cfg.model,
            prompt_len = prompt.len(),
            has_system = system.is_some(),
            "POST {}", self.url_chat
        );

        let out: ChatCompletionResponse = self
            .post_json(&self.url_chat, &body, "`choices[0].message.content`")
            .await?;

        let content = out
            .choices
            .into_iter()
            .find_map(|c| c.message.content)
            .ok_or(AiLlmError::EmptyChoices)?;

        info!(
            model = %self.cfg.model,
            latency_ms = started.elapsed().as_millis(),
            answer_len = content.len(),
            "chat completion completed"
        );

        Ok(content)
    }

    /// Retrieves a single embeddings vector.
    pub async fn embeddings(&self, input: &str) -> Result<Vec<f32>, AiLlmError> {
        let mut out = self.embed_batch(&[input.to_string()]).await?;
        out.pop().ok_or(AiLlmError::EmbeddingCount { got: 0, want: 1 })
    }

    /// Embeds many inputs, splitting them into requests of at most
    /// `cfg.batch_size` inputs. Output order matches input order.
    ///
    /// Requests are sent one after another.
    ///
    /// # Errors
    /// - [`AiLlmError::Http`] / [`AiLlmError::HttpTransport`] on request failure
    /// - [`AiLlmError::EmbeddingCount`] if a response does not carry one vector per input
    pub async fn embed_batch(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, AiLlmError> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }

        let started = Instant::now();
        let batch_size = self
            .cfg
            .batch_size
            .unwrap_or(DEFAULT_EMBEDDING_BATCH_SIZE)
            .max(1);
        let mut vectors = Vec::with_capacity(inputs.len());

        for (batch_no, batch) in inputs.chunks(batch_size).enumerate() {
            debug!(
                model = %self.cfg.model,
                batch_no,
                batch_len = batch.len(),
                "POST {}", self.url_embeddings
            );

            let body = EmbeddingsRequest {
                model: &self.cfg.model,
                input: batch,
            };
            let out: EmbeddingsResponse = self
                .post_json(&self.url_embeddings, &body, "`data[].embedding`")
                .await?;

            if out.data.len() != batch.len() {
                error!(
                    got = out.data.len(),
                    want = batch.len(),
                    "embeddings response size does not match request"
                );
                return Err(AiLlmError::EmbeddingCount {
                    got: out.data.len(),
                    want: batch.len(),
                });
            }

            let mut items = out.data;
            items.sort_by_key(|item| item.index);
            vectors.extend(items.into_iter().map(|item| item.embedding));
        }

        info!(
            model = %self.cfg.model,
            inputs = inputs.len(),
            latency_ms = started.elapsed().as_millis(),
            "embeddings completed"
        );

        Ok(vectors)
    }

    /// POSTs a JSON body and decodes a JSON answer, mapping failures to
    /// [`AiLlmError`].
    async fn post_json<B, R>(&self, url: &str, body: &B, expected: &str) -> Result<R, AiLlmError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let started = Instant::now();
        let resp = self.client.post(url).json(body).send().await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            let snippet = make_snippet(&text);

            error!(
                %status,
                %url,
                %snippet,
                model = %self.cfg.model,
                latency_ms = started.elapsed().as_millis(),
                "OpenAI returned non-success status"
            );

            return Err(HttpError {
                status,
                url: url.to_string(),
                snippet,
            }
            .into());
        }

        resp.json::<R>().await.map_err(|e| {
            error!(
                error = %e,
                %url,
                model = %self.cfg.model,
                latency_ms = started.elapsed().as_millis(),
                "failed to decode OpenAI response"
            );
            AiLlmError::Decode(format!("serde error: {e}; expected {expected}"))
        })
    }
}

/* ===========================================================================
HTTP payloads
======================================================================== */

/// Minimal request body for `/v1/chat/completions` (non-streaming).
#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

impl<'a> ChatCompletionRequest<'a> {
    fn from_cfg(cfg: &'a LlmModelConfig, prompt: &'a str, system: Option<&'a str>) -> Self {
        let mut messages = Vec::with_capacity(2);
        if let Some(sys) = system {
            messages.push(ChatMessage {
                role: "system",
                content: sys,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: prompt,
        });

        Self {
            model: &cfg.model,
            messages,
            temperature: cfg.temperature,
            top_p: cfg.top_p,
            max_tokens: cfg.max_tokens,
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessageOut,
}

#[derive(Debug, Deserialize)]
struct ChatMessageOut {
    content: Option<String>,
}

#[derive(Debug, Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingItem>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingItem {
    #[serde(default)]
    index: usize,
    embedding: Vec<f32>,
}
