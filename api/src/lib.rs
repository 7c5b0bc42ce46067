//! HTTP surface of the Markdown RAG backend.
//!
//! Routes:
//! - `POST /ingest`: index every `*.md` file of the data directory
//! - `POST /query` : answer a question with sources
//! - `GET  /health`: provider and store probes

use std::{env, sync::Arc};

mod core;
mod error_handler;
mod routes;

pub use crate::core::app_state::AppState;
pub use crate::error_handler::{AppError, AppResult};

use axum::{
    Router,
    routing::{get, post},
};
use tokio::{net::TcpListener, signal};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};

use crate::routes::{
    health::health_route::health_route, ingest::ingest_route::ingest_route,
    query::query_route::query_route,
};

const DEFAULT_ADDRESS: &str = "0.0.0.0:5001";

/// Builds the application router. CORS is fully permissive.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/query", post(query_route))
        .route("/ingest", post(ingest_route))
        .route("/health", get(health_route))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(Arc::new(state))
}

/// Binds `API_ADDRESS` (default `0.0.0.0:5001`) and serves until Ctrl+C.
pub async fn start(state: AppState) -> Result<(), AppError> {
    let host_url = env::var("API_ADDRESS").unwrap_or_else(|_| DEFAULT_ADDRESS.to_string());

    let listener = TcpListener::bind(&host_url).await.map_err(AppError::Bind)?;
    info!(address = %host_url, "HTTP server listening");

    // Start server with graceful shutdown on Ctrl+C
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(AppError::Server)?;

    info!("HTTP server stopped");
    Ok(())
}

/// Resolves when Ctrl+C is pressed.
async fn shutdown_signal() {
    match signal::ctrl_c().await {
        Ok(()) => info!("shutdown signal received"),
        Err(e) => {
            error!(error = %e, "failed to listen for shutdown signal");
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{path::Path, time::Duration};

    use ai_llm_service::{LlmModelConfig, LlmServiceProfiles};
    use rag_pipeline::{
        PipelineConfig, RagContext,
        fakes::{FakeEmbedder, FakeGenerator},
    };
    use rag_store::{IndexSchema, ReadinessPolicy, memory::InMemoryStore};
    use serde_json::{Value, json};

    const DIM: usize = 16;

    struct TestApp {
        base: String,
        store: Arc<InMemoryStore>,
        embedder: Arc<FakeEmbedder>,
        http: reqwest::Client,
    }

    fn unreachable_llm() -> Arc<LlmServiceProfiles> {
        let cfg = LlmModelConfig {
            model: "test-model".into(),
            endpoint: "http://127.0.0.1:1".into(),
            api_key: "test-key".into(),
            max_tokens: None,
            temperature: Some(0.0),
            top_p: None,
            timeout_secs: Some(1),
            batch_size: None,
        };
        Arc::new(LlmServiceProfiles::new(cfg.clone(), cfg, Some(1)).unwrap())
    }

    async fn spawn_app(data_path: &Path) -> TestApp {
        let store = Arc::new(InMemoryStore::new(
            "docs",
            IndexSchema {
                dimension: DIM,
                ..IndexSchema::default()
            },
        ));
        let embedder = Arc::new(FakeEmbedder::new(DIM));
        let state = AppState {
            llm: unreachable_llm(),
            rag: RagContext {
                store: store.clone(),
                embedder: embedder.clone(),
                generator: Arc::new(FakeGenerator::new("Chunks are 1000 characters.")),
                readiness: ReadinessPolicy {
                    timeout: Duration::from_millis(60),
                    poll_interval: Duration::from_millis(10),
                },
                config: PipelineConfig {
                    data_path: data_path.to_path_buf(),
                    ..PipelineConfig::default()
                },
            },
        };

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router(state)).await.unwrap();
        });

        TestApp {
            base: format!("http://{addr}"),
            store,
            embedder,
            http: reqwest::Client::new(),
        }
    }

    impl TestApp {
        async fn post_json(&self, path: &str, body: Value) -> (u16, Value) {
            let resp = self
                .http
                .post(format!("{}{path}", self.base))
                .json(&body)
                .send()
                .await
                .unwrap();
            let status = resp.status().as_u16();
            (status, resp.json().await.unwrap())
        }

        async fn post_empty(&self, path: &str) -> (u16, Value) {
            let resp = self
                .http
                .post(format!("{}{path}", self.base))
                .send()
                .await
                .unwrap();
            let status = resp.status().as_u16();
            (status, resp.json().await.unwrap())
        }
    }

    fn long_markdown() -> String {
        let mut md = String::from("# Chunking\n\n");
        for i in 0..40 {
            md.push_str(&format!(
                "Rule {i}: documents are split into chunks of at most one thousand characters with overlap.\n\n"
            ));
        }
        md
    }

    #[tokio::test]
    async fn invalid_query_bodies_are_rejected_before_any_call() {
        let dir = tempfile::tempdir().unwrap();
        let app = spawn_app(dir.path()).await;

        for body in [
            json!({ "query": "" }),
            json!({ "query": "   \n" }),
            json!({}),
            json!({ "query": 42 }),
            json!({ "query": null }),
        ] {
            let (status, resp) = app.post_json("/query", body.clone()).await;
            assert_eq!(status, 400, "body {body}");
            assert_eq!(resp["code"], "BAD_REQUEST");
            assert!(resp["error"].is_string());
        }

        let resp = app
            .http
            .post(format!("{}/query", app.base))
            .header("content-type", "application/json")
            .body("{not json")
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status().as_u16(), 400);

        assert_eq!(app.store.ping_count(), 0);
        assert_eq!(app.embedder.calls(), 0);
    }

    #[tokio::test]
    async fn ingest_then_query_returns_sourced_answer() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.md"), long_markdown()).unwrap();
        std::fs::write(dir.path().join("skip.txt"), "not markdown").unwrap();
        let app = spawn_app(dir.path()).await;

        let (status, body) = app.post_empty("/ingest").await;
        assert_eq!(status, 200);
        assert_eq!(body["documents"], 1);
        assert!(body["records"].as_u64().unwrap() >= 2);
        assert!(body["status"].is_string());

        let (status, body) = app
            .post_json("/query", json!({ "query": "How big are chunks?" }))
            .await;
        assert_eq!(status, 200);
        assert_eq!(body["answer"], "Chunks are 1000 characters.");
        let sources = body["sources"].as_array().unwrap();
        assert_eq!(sources.len(), 3);
        for s in sources {
            assert!(s["content"].is_string());
            assert!(s["file"].as_str().unwrap().ends_with("a.md"));
        }
    }

    #[tokio::test]
    async fn empty_data_dir_is_nothing_to_do() {
        let dir = tempfile::tempdir().unwrap();
        let app = spawn_app(dir.path()).await;

        let (status, body) = app.post_empty("/ingest").await;
        assert_eq!(status, 200);
        assert_eq!(body["records"], 0);
        assert_eq!(body["documents"], 0);
    }

    #[tokio::test]
    async fn query_before_ingest_reports_missing_index() {
        let dir = tempfile::tempdir().unwrap();
        let app = spawn_app(dir.path()).await;

        let (status, body) = app.post_json("/query", json!({ "query": "hello" })).await;
        assert_eq!(status, 500);
        assert_eq!(body["code"], "INDEX_NOT_FOUND");
        assert!(body["error"].as_str().unwrap().contains("docs"));
    }

    #[tokio::test]
    async fn unreachable_store_fails_both_pipelines_without_mutation() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.md"), long_markdown()).unwrap();
        let app = spawn_app(dir.path()).await;
        app.store.set_reachable(false);

        let (status, body) = app.post_empty("/ingest").await;
        assert_eq!(status, 500);
        assert_eq!(body["code"], "STORE_UNAVAILABLE");

        let (status, body) = app.post_json("/query", json!({ "query": "hello" })).await;
        assert_eq!(status, 500);
        assert_eq!(body["code"], "STORE_UNAVAILABLE");

        assert_eq!(app.store.creation_count(), 0);
        assert!(app.store.records().is_empty());
    }

    #[tokio::test]
    async fn health_reports_each_probe() {
        let dir = tempfile::tempdir().unwrap();
        let app = spawn_app(dir.path()).await;

        let resp = app
            .http
            .get(format!("{}/health", app.base))
            .header("origin", "http://frontend.local")
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status().as_u16(), 200);
        assert_eq!(
            resp.headers()
                .get("access-control-allow-origin")
                .and_then(|v| v.to_str().ok()),
            Some("*")
        );

        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["store"]["ok"], true);
        assert_eq!(body["store"]["index"], "docs");
        assert_eq!(body["llm"][0]["ok"], false);
        assert_eq!(body["ok"], false);
    }
}
