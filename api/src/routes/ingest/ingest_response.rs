use serde::Serialize;

/// Response payload for /ingest.
#[derive(Debug, Serialize)]
pub struct IngestResponse {
    pub status: String,
    pub documents: usize,
    pub chunks: usize,
    pub records: usize,
}
