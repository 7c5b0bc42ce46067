//! In-process [`VectorStore`] used by tests.
//!
//! Exact dot-product search over a `Vec`; the index "exists" once
//! `ensure_index` has run.

use std::sync::{
    Mutex, MutexGuard,
    atomic::{AtomicBool, AtomicUsize, Ordering},
};

use crate::{
    BoxFuture, VectorStore,
    config::IndexSchema,
    errors::StoreError,
    record::{IndexRecord, IndexStatus, SearchHit, check_dimensions},
};

pub struct InMemoryStore {
    index: String,
    schema: IndexSchema,
    records: Mutex<Option<Vec<IndexRecord>>>,
    reachable: AtomicBool,
    pings: AtomicUsize,
    creations: AtomicUsize,
}

impl InMemoryStore {
    pub fn new(index: impl Into<String>, schema: IndexSchema) -> Self {
        Self {
            index: index.into(),
            schema,
            records: Mutex::new(None),
            reachable: AtomicBool::new(true),
            pings: AtomicUsize::new(0),
            creations: AtomicUsize::new(0),
        }
    }

    /// Simulates the store going down (`false`) or coming back (`true`).
    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::SeqCst);
    }

    pub fn ping_count(&self) -> usize {
        self.pings.load(Ordering::SeqCst)
    }

    /// How many times the index was actually created.
    pub fn creation_count(&self) -> usize {
        self.creations.load(Ordering::SeqCst)
    }

    /// Snapshot of stored records (empty if the index does not exist).
    pub fn records(&self) -> Vec<IndexRecord> {
        self.lock().clone().unwrap_or_default()
    }

    fn lock(&self) -> MutexGuard<'_, Option<Vec<IndexRecord>>> {
        self.records.lock().unwrap_or_else(|p| p.into_inner())
    }

    fn check_reachable(&self) -> Result<(), StoreError> {
        if self.reachable.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::Config(format!(
                "in-memory store '{}' is unreachable",
                self.index
            )))
        }
    }
}

impl VectorStore for InMemoryStore {
    fn index_name(&self) -> &str {
        &self.index
    }

    fn ping(&self) -> BoxFuture<'_, Result<bool, StoreError>> {
        Box::pin(async move {
            self.pings.fetch_add(1, Ordering::SeqCst);
            self.check_reachable()?;
            Ok(true)
        })
    }

    fn index_exists(&self) -> BoxFuture<'_, Result<bool, StoreError>> {
        Box::pin(async move {
            self.check_reachable()?;
            Ok(self.lock().is_some())
        })
    }

    fn ensure_index(&self) -> BoxFuture<'_, Result<IndexStatus, StoreError>> {
        Box::pin(async move {
            self.check_reachable()?;
            let mut guard = self.lock();
            if guard.is_some() {
                return Ok(IndexStatus::AlreadyExists);
            }
            *guard = Some(Vec::new());
            self.creations.fetch_add(1, Ordering::SeqCst);
            Ok(IndexStatus::Created)
        })
    }

    fn bulk_add<'a>(
        &'a self,
        records: &'a [IndexRecord],
    ) -> BoxFuture<'a, Result<usize, StoreError>> {
        Box::pin(async move {
            self.check_reachable()?;
            check_dimensions(records, self.schema.dimension)?;
            let mut guard = self.lock();
            let stored = guard
                .as_mut()
                .ok_or_else(|| StoreError::IndexNotFound(self.index.clone()))?;
            stored.extend_from_slice(records);
            Ok(records.len())
        })
    }

    fn knn_search<'a>(
        &'a self,
        vector: &'a [f32],
        k: usize,
    ) -> BoxFuture<'a, Result<Vec<SearchHit>, StoreError>> {
        Box::pin(async move {
            self.check_reachable()?;
            if vector.len() != self.schema.dimension {
                return Err(StoreError::VectorSizeMismatch {
                    got: vector.len(),
                    want: self.schema.dimension,
                });
            }
            let guard = self.lock();
            let stored = guard
                .as_ref()
                .ok_or_else(|| StoreError::IndexNotFound(self.index.clone()))?;

            let mut hits: Vec<SearchHit> = stored
                .iter()
                .map(|r| SearchHit {
                    score: r.vector.iter().zip(vector).map(|(a, b)| a * b).sum(),
                    text: r.text.clone(),
                    metadata: r.metadata.clone(),
                })
                .collect();
            hits.sort_by(|a, b| b.score.total_cmp(&a.score));
            hits.truncate(k);
            Ok(hits)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;

    fn schema() -> IndexSchema {
        IndexSchema {
            dimension: 2,
            ..IndexSchema::default()
        }
    }

    fn rec(text: &str, v: [f32; 2]) -> IndexRecord {
        IndexRecord {
            text: text.into(),
            metadata: Map::new(),
            vector: v.to_vec(),
        }
    }

    #[tokio::test]
    async fn ensure_index_is_idempotent() {
        let store = InMemoryStore::new("docs", schema());
        assert!(!store.index_exists().await.unwrap());
        assert_eq!(store.ensure_index().await.unwrap(), IndexStatus::Created);
        assert_eq!(store.ensure_index().await.unwrap(), IndexStatus::AlreadyExists);
        assert_eq!(store.creation_count(), 1);
        assert!(store.index_exists().await.unwrap());
    }

    #[tokio::test]
    async fn search_ranks_by_inner_product() {
        let store = InMemoryStore::new("docs", schema());
        store.ensure_index().await.unwrap();
        store
            .bulk_add(&[rec("x", [1.0, 0.0]), rec("y", [0.0, 1.0]), rec("xy", [0.7, 0.7])])
            .await
            .unwrap();

        let hits = store.knn_search(&[1.0, 0.1], 2).await.unwrap();
        let texts: Vec<&str> = hits.iter().map(|h| h.text.as_str()).collect();
        assert_eq!(texts, ["x", "xy"]);
    }

    #[tokio::test]
    async fn search_without_index_fails() {
        let store = InMemoryStore::new("docs", schema());
        assert!(matches!(
            store.knn_search(&[1.0, 0.0], 3).await,
            Err(StoreError::IndexNotFound(_))
        ));
    }
}
