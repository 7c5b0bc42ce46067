use serde::Deserialize;

/// Request payload for /query.
#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    /// Natural language question.
    pub query: String,
}
