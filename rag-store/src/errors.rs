//! Unified error types for the crate.

use reqwest::{StatusCode, Url};
use thiserror::Error;

/// Top-level error for vector-store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Invalid or unsupported configuration.
    #[error("config error: {0}")]
    Config(String),

    /// Transport-level failure talking to the store (connect, TLS, timeout).
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The store answered with an unexpected HTTP status.
    #[error("HTTP {status} from {url}: {snippet}")]
    Http {
        status: StatusCode,
        url: String,
        snippet: String,
    },

    /// Qdrant client errors (wrapped).
    #[error("qdrant error: {0}")]
    Qdrant(String),

    /// Response payload could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),

    /// Index creation failed for a reason other than "already exists".
    #[error("failed to create index '{index}': {reason}")]
    IndexCreate { index: String, reason: String },

    /// The target index does not exist.
    #[error("index '{0}' does not exist")]
    IndexNotFound(String),

    /// A vector does not match the index dimension.
    #[error("vector size mismatch: got {got}, want {want}")]
    VectorSizeMismatch { got: usize, want: usize },

    /// The store rejected items of a bulk request.
    #[error("bulk write rejected {failed} item(s): {reason}")]
    BulkRejected { failed: usize, reason: String },
}

/// Single-line, bounded excerpt of a response body.
pub(crate) fn snippet(text: &str) -> String {
    const MAX: usize = 256;
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= MAX {
        flat
    } else {
        flat.chars().take(MAX).collect::<String>() + "…"
    }
}

/// `raw` without its `user:password@` part.
pub(crate) fn redact_url(raw: &str) -> String {
    match Url::parse(raw) {
        Ok(mut url) => {
            let _ = url.set_username("");
            let _ = url.set_password(None);
            url.to_string()
        }
        Err(_) => raw.rsplit('@').next().unwrap_or(raw).to_string(),
    }
}
