//! GET /health: provider and vector-store probes.

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use axum::{Json, extract::State};
use tracing::debug;

use crate::{
    core::app_state::AppState,
    routes::health::health_response::{HealthResponse, StoreHealth},
};

const STORE_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Handler: GET /health
///
/// Always answers 200; the `ok` flags carry the result. The store is pinged
/// once, without the readiness retry loop.
pub async fn health_route(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let llm = state.llm.health_all().await;

    let store = &state.rag.store;
    let started = Instant::now();
    let (ok, message) = match tokio::time::timeout(STORE_PROBE_TIMEOUT, store.ping()).await {
        Ok(Ok(true)) => (true, "healthy".to_string()),
        Ok(Ok(false)) => (false, "store answered but is not healthy".to_string()),
        Ok(Err(e)) => (false, e.to_string()),
        Err(_) => (false, "store probe timed out".to_string()),
    };
    let store = StoreHealth {
        index: store.index_name().to_string(),
        ok,
        latency_ms: started.elapsed().as_millis(),
        message,
    };
    debug!(store_ok = store.ok, llm_probes = llm.len(), "health snapshot");

    Json(HealthResponse {
        ok: store.ok && llm.iter().all(|s| s.ok),
        llm,
        store,
    })
}
