//! OpenSearch backend over the REST API (k-NN plugin).
//!
//! Endpoints used:
//! - `GET  /_cluster/health`      readiness
//! - `HEAD /{index}`              existence
//! - `PUT  /{index}`              creation with the k-NN mapping
//! - `POST /_bulk`                NDJSON bulk indexing
//! - `POST /{index}/_refresh`     make written records searchable
//! - `POST /{index}/_search`      approximate k-NN query

use std::time::Duration;

use reqwest::{Client, Response, StatusCode, header::CONTENT_TYPE};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    BoxFuture, VectorStore,
    config::{IndexSchema, StoreConfig},
    errors::{StoreError, redact_url, snippet},
    record::{IndexRecord, IndexStatus, METADATA_FIELD, SearchHit, TEXT_FIELD, VECTOR_FIELD, check_dimensions},
};

const PROBE_TIMEOUT: Duration = Duration::from_secs(10);
const ALREADY_EXISTS: &str = "resource_already_exists_exception";
const INDEX_NOT_FOUND: &str = "index_not_found_exception";

/// OpenSearch-backed [`VectorStore`].
pub struct OpenSearchStore {
    http: Client,
    base: String,
    index: String,
    schema: IndexSchema,
    bulk_size: usize,
    bulk_timeout: Duration,
}

impl OpenSearchStore {
    /// Builds the HTTP client. No network traffic happens here.
    pub fn new(cfg: &StoreConfig) -> Result<Self, StoreError> {
        let http = Client::builder()
            .danger_accept_invalid_certs(!cfg.verify_certs)
            .connect_timeout(PROBE_TIMEOUT)
            .build()
            .map_err(|e| StoreError::Config(format!("failed to build http client: {e}")))?;

        Ok(Self {
            http,
            base: cfg.url.trim().trim_end_matches('/').to_string(),
            index: cfg.index.clone(),
            schema: cfg.schema,
            bulk_size: cfg.bulk_size,
            bulk_timeout: cfg.bulk_timeout,
        })
    }

    fn index_url(&self, suffix: &str) -> String {
        format!("{}/{}{}", self.base, self.index, suffix)
    }

    /// Settings and mappings for the k-NN index.
    pub fn index_body(schema: &IndexSchema) -> Value {
        json!({
            "settings": {
                "index": {
                    "knn": true,
                    "knn.space_type": "cosinesimil"
                }
            },
            "mappings": {
                "properties": {
                    TEXT_FIELD: { "type": "text" },
                    METADATA_FIELD: { "type": "object", "enabled": false },
                    VECTOR_FIELD: {
                        "type": "knn_vector",
                        "dimension": schema.dimension,
                        "method": {
                            "name": "hnsw",
                            "space_type": "innerproduct",
                            "engine": "faiss",
                            "parameters": {
                                "ef_construction": schema.ef_construction,
                                "m": schema.m
                            }
                        }
                    }
                }
            }
        })
    }

    async fn ping_inner(&self) -> Result<bool, StoreError> {
        let url = format!("{}/_cluster/health", self.base);
        let resp = self.http.get(&url).timeout(PROBE_TIMEOUT).send().await?;
        if !resp.status().is_success() {
            debug!(status = %resp.status(), "cluster health returned non-success");
            return Ok(false);
        }
        let health: ClusterHealth = resp.json().await?;
        debug!(status = %health.status, "cluster health");
        Ok(matches!(health.status.as_str(), "green" | "yellow"))
    }

    async fn index_exists_inner(&self) -> Result<bool, StoreError> {
        let url = self.index_url("");
        let resp = self.http.head(&url).timeout(PROBE_TIMEOUT).send().await?;
        match resp.status() {
            s if s.is_success() => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            _ => Err(http_error(resp).await),
        }
    }

    async fn ensure_index_inner(&self) -> Result<IndexStatus, StoreError> {
        if self.index_exists_inner().await? {
            debug!(index = %self.index, "index already exists");
            return Ok(IndexStatus::AlreadyExists);
        }

        info!(
            index = %self.index,
            dimension = self.schema.dimension,
            m = self.schema.m,
            ef_construction = self.schema.ef_construction,
            "creating k-NN index"
        );
        let resp = self
            .http
            .put(self.index_url(""))
            .json(&Self::index_body(&self.schema))
            .send()
            .await?;

        let status = resp.status();
        if status.is_success() {
            info!(index = %self.index, "index created");
            return Ok(IndexStatus::Created);
        }

        let body = resp.text().await.unwrap_or_default();
        if body.contains(ALREADY_EXISTS) {
            info!(index = %self.index, "index was created concurrently");
            return Ok(IndexStatus::AlreadyExists);
        }
        Err(StoreError::IndexCreate {
            index: self.index.clone(),
            reason: format!("HTTP {status}: {}", snippet(&body)),
        })
    }

    async fn bulk_add_inner(&self, records: &[IndexRecord]) -> Result<usize, StoreError> {
        check_dimensions(records, self.schema.dimension)?;
        if records.is_empty() {
            debug!("no records to index");
            return Ok(0);
        }

        let url = format!("{}/_bulk", self.base);
        let mut written = 0usize;
        for (batch_no, batch) in records.chunks(self.bulk_size).enumerate() {
            let body = self.ndjson(batch)?;
            debug!(batch = batch_no, size = batch.len(), "sending bulk request");

            let resp = self
                .http
                .post(&url)
                .header(CONTENT_TYPE, "application/x-ndjson")
                .timeout(self.bulk_timeout)
                .body(body)
                .send()
                .await?;
            if !resp.status().is_success() {
                return Err(http_error(resp).await);
            }

            let report: BulkResponse = resp.json().await?;
            if report.errors {
                return Err(bulk_rejection(&report.items));
            }
            written += batch.len();
        }

        self.refresh().await;
        info!(index = %self.index, written, "bulk indexing done");
        Ok(written)
    }

    fn ndjson(&self, batch: &[IndexRecord]) -> Result<String, StoreError> {
        let mut body = String::new();
        for rec in batch {
            let action = json!({ "index": { "_index": self.index, "_id": Uuid::new_v4().to_string() } });
            body.push_str(&action.to_string());
            body.push('\n');
            let doc = serde_json::to_string(rec).map_err(|e| StoreError::Decode(e.to_string()))?;
            body.push_str(&doc);
            body.push('\n');
        }
        Ok(body)
    }

    async fn refresh(&self) {
        let res = self
            .http
            .post(self.index_url("/_refresh"))
            .timeout(self.bulk_timeout)
            .send()
            .await;
        match res {
            Ok(r) if r.status().is_success() => {}
            Ok(r) => warn!(status = %r.status(), "index refresh failed"),
            Err(e) => warn!(error = %e, "index refresh failed"),
        }
    }

    async fn knn_search_inner(&self, vector: &[f32], k: usize) -> Result<Vec<SearchHit>, StoreError> {
        if vector.len() != self.schema.dimension {
            return Err(StoreError::VectorSizeMismatch {
                got: vector.len(),
                want: self.schema.dimension,
            });
        }
        if k == 0 {
            return Ok(Vec::new());
        }

        let body = json!({
            "size": k,
            "query": { "knn": { VECTOR_FIELD: { "vector": vector, "k": k } } },
            "_source": { "excludes": [VECTOR_FIELD] }
        });
        let resp = self
            .http
            .post(self.index_url("/_search"))
            .json(&body)
            .send()
            .await?;

        if resp.status() == StatusCode::NOT_FOUND {
            let text = resp.text().await.unwrap_or_default();
            if text.contains(INDEX_NOT_FOUND) || text.is_empty() {
                return Err(StoreError::IndexNotFound(self.index.clone()));
            }
            return Err(StoreError::Http {
                status: StatusCode::NOT_FOUND,
                url: redact_url(&self.index_url("/_search")),
                snippet: snippet(&text),
            });
        }
        if !resp.status().is_success() {
            return Err(http_error(resp).await);
        }

        let parsed: SearchResponse = resp.json().await?;
        let hits: Vec<SearchHit> = parsed
            .hits
            .hits
            .into_iter()
            .map(|h| SearchHit {
                score: h.score.unwrap_or_default(),
                text: h.source.text,
                metadata: h.source.metadata,
            })
            .collect();
        debug!(k, returned = hits.len(), "k-NN search done");
        Ok(hits)
    }
}

impl VectorStore for OpenSearchStore {
    fn index_name(&self) -> &str {
        &self.index
    }

    fn ping(&self) -> BoxFuture<'_, Result<bool, StoreError>> {
        Box::pin(self.ping_inner())
    }

    fn index_exists(&self) -> BoxFuture<'_, Result<bool, StoreError>> {
        Box::pin(self.index_exists_inner())
    }

    fn ensure_index(&self) -> BoxFuture<'_, Result<IndexStatus, StoreError>> {
        Box::pin(self.ensure_index_inner())
    }

    fn bulk_add<'a>(
        &'a self,
        records: &'a [IndexRecord],
    ) -> BoxFuture<'a, Result<usize, StoreError>> {
        Box::pin(self.bulk_add_inner(records))
    }

    fn knn_search<'a>(
        &'a self,
        vector: &'a [f32],
        k: usize,
    ) -> BoxFuture<'a, Result<Vec<SearchHit>, StoreError>> {
        Box::pin(self.knn_search_inner(vector, k))
    }
}

#[derive(Deserialize)]
struct ClusterHealth {
    status: String,
}

#[derive(Deserialize)]
struct BulkResponse {
    #[serde(default)]
    errors: bool,
    #[serde(default)]
    items: Vec<Value>,
}

#[derive(Deserialize)]
struct SearchResponse {
    hits: HitsEnvelope,
}

#[derive(Deserialize)]
struct HitsEnvelope {
    #[serde(default)]
    hits: Vec<RawHit>,
}

#[derive(Deserialize)]
struct RawHit {
    #[serde(rename = "_score")]
    score: Option<f32>,
    #[serde(rename = "_source")]
    source: RawSource,
}

#[derive(Deserialize)]
struct RawSource {
    #[serde(default)]
    text: String,
    #[serde(default)]
    metadata: Map<String, Value>,
}

async fn http_error(resp: Response) -> StoreError {
    let status = resp.status();
    let url = redact_url(resp.url().as_str());
    let body = resp.text().await.unwrap_or_default();
    StoreError::Http {
        status,
        url,
        snippet: snippet(&body),
    }
}

/// Summarizes failed items of a bulk response; the first reason is kept.
fn bulk_rejection(items: &[Value]) -> StoreError {
    let failed: Vec<&Value> = items
        .iter()
        .filter_map(|item| item.as_object()?.values().next()?.get("error"))
        .collect();
    let reason = failed
        .first()
        .map(|err| {
            err.get("reason")
                .or_else(|| err.get("type"))
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| err.to_string())
        })
        .unwrap_or_else(|| "unknown bulk failure".to_string());
    StoreError::BulkRejected {
        failed: failed.len(),
        reason,
    }
}
