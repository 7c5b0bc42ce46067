//! Core data models stored in and read from the index.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::StoreError;

/// Field names of the persisted record.
pub const TEXT_FIELD: &str = "text";
pub const METADATA_FIELD: &str = "metadata";
pub const VECTOR_FIELD: &str = "vector_field";

/// One persisted unit: chunk text, opaque metadata and its embedding.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IndexRecord {
    pub text: String,
    /// Not searchable; carried back verbatim on retrieval.
    #[serde(default)]
    pub metadata: Map<String, Value>,
    #[serde(rename = "vector_field")]
    pub vector: Vec<f32>,
}

/// A single k-NN hit, ordered by descending score.
#[derive(Clone, Debug, PartialEq)]
pub struct SearchHit {
    pub score: f32,
    pub text: String,
    pub metadata: Map<String, Value>,
}

impl SearchHit {
    /// The `source` metadata entry, if present and a string.
    pub fn source(&self) -> Option<&str> {
        self.metadata.get("source").and_then(Value::as_str)
    }
}

/// Outcome of an idempotent index creation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IndexStatus {
    Created,
    AlreadyExists,
}

/// Ensures every record carries a vector of exactly `want` elements.
pub fn check_dimensions(records: &[IndexRecord], want: usize) -> Result<(), StoreError> {
    match records.iter().find(|r| r.vector.len() != want) {
        Some(r) => Err(StoreError::VectorSizeMismatch {
            got: r.vector.len(),
            want,
        }),
        None => Ok(()),
    }
}
