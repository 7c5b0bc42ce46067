use ai_llm_service::HealthStatus;
use serde::Serialize;

/// Response payload for /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// `true` only if every probe below is healthy.
    pub ok: bool,
    pub llm: Vec<HealthStatus>,
    pub store: StoreHealth,
}

#[derive(Debug, Serialize)]
pub struct StoreHealth {
    pub index: String,
    pub ok: bool,
    pub latency_ms: u128,
    pub message: String,
}
