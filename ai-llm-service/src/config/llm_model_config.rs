/// Configuration for one OpenAI-compatible model profile.
///
/// The same struct describes both the chat profile and the embedding profile;
/// fields that do not apply to a profile are left as `None`.
///
/// # Examples
///
/// ```
/// use ai_llm_service::config::llm_model_config::LlmModelConfig;
///
/// let cfg = LlmModelConfig {
///     model: "gpt-4.1-2025-04-14".to_string(),
///     endpoint: "https://api.openai.com".to_string(),
///     api_key: "sk-...".to_string(),
///     max_tokens: None,
///     temperature: Some(0.0),
///     top_p: None,
///     timeout_secs: Some(120),
///     batch_size: None,
/// };
/// assert_eq!(cfg.temperature, Some(0.0));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct LlmModelConfig {
    /// Model identifier (e.g., `"text-embedding-3-large"`).
    pub model: String,

    /// API base URL without the `/v1/...` suffix.
    pub endpoint: String,

    /// Bearer token sent with every request.
    pub api_key: String,

    /// Maximum number of tokens to generate.
    pub max_tokens: Option<u32>,

    /// Sampling temperature (0.0 = deterministic).
    pub temperature: Option<f32>,

    /// Nucleus sampling parameter.
    pub top_p: Option<f32>,

    /// Request timeout (in seconds).
    pub timeout_secs: Option<u64>,

    /// Max inputs per `/v1/embeddings` request (embedding profile only).
    pub batch_size: Option<usize>,
}
