//! Thin adapter around `qdrant-client` implementing [`VectorStore`].
//!
//! The collection mirrors the OpenSearch index: dot-product distance over an
//! HNSW graph built with the same `m` / `ef_construction`, and a payload with
//! `text` plus an opaque `metadata` struct.

use std::collections::HashMap;

use qdrant_client::Qdrant;
use qdrant_client::qdrant::{
    CreateCollectionBuilder, Distance, HnswConfigDiffBuilder, ListValue, PointStruct,
    SearchPointsBuilder, Struct, UpsertPointsBuilder, Value as QValue, VectorParamsBuilder,
    value::Kind,
};
use serde_json::{Map, Value};
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    BoxFuture, VectorStore,
    config::{IndexSchema, StoreConfig},
    errors::StoreError,
    record::{IndexRecord, IndexStatus, METADATA_FIELD, SearchHit, TEXT_FIELD, check_dimensions},
};

/// Qdrant-backed [`VectorStore`].
pub struct QdrantStore {
    client: Qdrant,
    collection: String,
    schema: IndexSchema,
    bulk_size: usize,
}

impl QdrantStore {
    /// Builds the gRPC client. Connections are established lazily.
    pub fn new(cfg: &StoreConfig) -> Result<Self, StoreError> {
        let mut builder = Qdrant::from_url(cfg.url.trim()).timeout(cfg.bulk_timeout);
        if let Some(key) = &cfg.api_key {
            builder = builder.api_key(key.clone());
        }
        let client = builder
            .build()
            .map_err(|e| StoreError::Config(format!("failed to build qdrant client: {e}")))?;

        Ok(Self {
            client,
            collection: cfg.index.clone(),
            schema: cfg.schema,
            bulk_size: cfg.bulk_size,
        })
    }

    async fn ping_inner(&self) -> Result<bool, StoreError> {
        let reply = self.client.health_check().await.map_err(qdrant_err)?;
        debug!(version = %reply.version, "qdrant health");
        Ok(true)
    }

    async fn index_exists_inner(&self) -> Result<bool, StoreError> {
        self.client
            .collection_exists(self.collection.clone())
            .await
            .map_err(qdrant_err)
    }

    async fn ensure_index_inner(&self) -> Result<IndexStatus, StoreError> {
        if self.index_exists_inner().await? {
            debug!(collection = %self.collection, "collection already exists");
            return Ok(IndexStatus::AlreadyExists);
        }

        info!(
            collection = %self.collection,
            dimension = self.schema.dimension,
            m = self.schema.m,
            ef_construction = self.schema.ef_construction,
            "creating collection"
        );
        let request = CreateCollectionBuilder::new(self.collection.clone())
            .vectors_config(VectorParamsBuilder::new(
                self.schema.dimension as u64,
                Distance::Dot,
            ))
            .hnsw_config(
                HnswConfigDiffBuilder::default()
                    .m(u64::from(self.schema.m))
                    .ef_construct(u64::from(self.schema.ef_construction)),
            );

        match self.client.create_collection(request).await {
            Ok(_) => {
                info!(collection = %self.collection, "collection created");
                Ok(IndexStatus::Created)
            }
            Err(e) if e.to_string().contains("already exists") => {
                info!(collection = %self.collection, "collection was created concurrently");
                Ok(IndexStatus::AlreadyExists)
            }
            Err(e) => Err(StoreError::IndexCreate {
                index: self.collection.clone(),
                reason: e.to_string(),
            }),
        }
    }

    async fn bulk_add_inner(&self, records: &[IndexRecord]) -> Result<usize, StoreError> {
        check_dimensions(records, self.schema.dimension)?;
        if records.is_empty() {
            debug!("no records to upsert");
            return Ok(0);
        }

        let mut written = 0usize;
        for batch in records.chunks(self.bulk_size) {
            let points: Vec<PointStruct> = batch.iter().map(to_point).collect();
            self.client
                .upsert_points(UpsertPointsBuilder::new(self.collection.clone(), points).wait(true))
                .await
                .map_err(qdrant_err)?;
            written += batch.len();
            debug!(written, total = records.len(), "upserted batch");
        }

        info!(collection = %self.collection, written, "upsert done");
        Ok(written)
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

        let request =
            SearchPointsBuilder::new(self.collection.clone(), vector.to_vec(), k as u64)
                .with_payload(true);
        let res = self.client.search_points(request).await.map_err(|e| {
            let msg = e.to_string();
            if msg.contains("doesn't exist") || msg.contains("Not found") {
                StoreError::IndexNotFound(self.collection.clone())
            } else {
                StoreError::Qdrant(msg)
            }
        })?;

        let hits: Vec<SearchHit> = res
            .result
            .into_iter()
            .map(|p| from_payload(p.score, p.payload))
            .collect();
        debug!(k, returned = hits.len(), "search done");
        Ok(hits)
    }
}

impl VectorStore for QdrantStore {
    fn index_name(&self) -> &str {
        &self.collection
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

fn qdrant_err(e: qdrant_client::QdrantError) -> StoreError {
    StoreError::Qdrant(e.to_string())
}

fn to_point(rec: &IndexRecord) -> PointStruct {
    let mut payload: HashMap<String, QValue> = HashMap::with_capacity(2);
    payload.insert(TEXT_FIELD.into(), json_to_qvalue(Value::String(rec.text.clone())));
    payload.insert(
        METADATA_FIELD.into(),
        json_to_qvalue(Value::Object(rec.metadata.clone())),
    );
    PointStruct::new(Uuid::new_v4().to_string(), rec.vector.clone(), payload)
}

fn from_payload(score: f32, mut payload: HashMap<String, QValue>) -> SearchHit {
    let text = match payload.remove(TEXT_FIELD).map(qvalue_to_json) {
        Some(Value::String(s)) => s,
        _ => String::new(),
    };
    let metadata = match payload.remove(METADATA_FIELD).map(qvalue_to_json) {
        Some(Value::Object(m)) => m,
        _ => Map::new(),
    };
    SearchHit {
        score,
        text,
        metadata,
    }
}

/// Converts `serde_json::Value` into a Qdrant `Value` (arrays and objects included).
fn json_to_qvalue(v: Value) -> QValue {
    let kind = match v {
        Value::Null => None,
        Value::Bool(b) => Some(Kind::BoolValue(b)),
        Value::Number(n) => Some(match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => Kind::IntegerValue(i),
            (None, Some(f)) => Kind::DoubleValue(f),
            (None, None) => Kind::StringValue(n.to_string()),
        }),
        Value::String(s) => Some(Kind::StringValue(s)),
        Value::Array(arr) => Some(Kind::ListValue(ListValue {
            values: arr.into_iter().map(json_to_qvalue).collect(),
        })),
        Value::Object(map) => Some(Kind::StructValue(Struct {
            fields: map.into_iter().map(|(k, v)| (k, json_to_qvalue(v))).collect(),
        })),
    };
    QValue { kind }
}

/// Inverse of [`json_to_qvalue`].
fn qvalue_to_json(v: QValue) -> Value {
    match v.kind {
        None | Some(Kind::NullValue(_)) => Value::Null,
        Some(Kind::BoolValue(b)) => Value::Bool(b),
        Some(Kind::IntegerValue(i)) => Value::from(i),
        Some(Kind::DoubleValue(f)) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        Some(Kind::StringValue(s)) => Value::String(s),
        Some(Kind::ListValue(list)) => {
            Value::Array(list.values.into_iter().map(qvalue_to_json).collect())
        }
        Some(Kind::StructValue(st)) => Value::Object(
            st.fields
                .into_iter()
                .map(|(k, v)| (k, qvalue_to_json(v)))
                .collect(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn metadata_survives_payload_conversion() {
        let meta = json!({ "source": "./data/a.md", "page": 3, "tags": ["x", "y"], "extra": { "ok": true } });
        let back = qvalue_to_json(json_to_qvalue(meta.clone()));
        assert_eq!(back, meta);
    }

    #[test]
    fn point_payload_reads_back_as_hit() {
        let mut metadata = Map::new();
        metadata.insert("source".into(), json!("./data/a.md"));
        let rec = IndexRecord {
            text: "hello".into(),
            metadata,
            vector: vec![1.0, 0.0],
        };
        let point = to_point(&rec);
        let hit = from_payload(0.7, point.payload);
        assert_eq!(hit.text, "hello");
        assert_eq!(hit.source(), Some("./data/a.md"));
        assert_eq!(hit.score, 0.7);
    }

    #[test]
    fn missing_payload_fields_default_to_empty() {
        let hit = from_payload(0.1, HashMap::new());
        assert!(hit.text.is_empty());
        assert!(hit.metadata.is_empty());
    }
}
