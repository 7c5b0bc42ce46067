//! Runtime and index configuration.

use std::time::Duration;

use crate::errors::{StoreError, redact_url};

/// Which vector-search engine backs the index.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackendKind {
    /// OpenSearch k-NN plugin over REST.
    OpenSearch,
    /// Qdrant over gRPC (`qdrant-client`).
    Qdrant,
}

impl BackendKind {
    fn parse(raw: &str) -> Result<Self, StoreError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "" | "opensearch" => Ok(Self::OpenSearch),
            "qdrant" => Ok(Self::Qdrant),
            other => Err(StoreError::Config(format!(
                "unsupported VECTOR_BACKEND '{other}' (expected opensearch|qdrant)"
            ))),
        }
    }
}

/// Fixed schema of the k-NN index.
///
/// The similarity method is inner product over an HNSW graph for every
/// backend; only the construction parameters and dimension are data.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IndexSchema {
    /// Vector dimensionality (3072 for `text-embedding-3-large`).
    pub dimension: usize,
    /// HNSW `m` (max links per node).
    pub m: u32,
    /// HNSW `ef_construction`.
    pub ef_construction: u32,
}

impl Default for IndexSchema {
    fn default() -> Self {
        Self {
            dimension: 3072,
            m: 24,
            ef_construction: 128,
        }
    }
}

/// How long and how often to poll the store before giving up.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReadinessPolicy {
    pub timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for ReadinessPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(120),
            poll_interval: Duration::from_secs(5),
        }
    }
}

/// Configuration for the vector-store client.
#[derive(Clone, Debug)]
pub struct StoreConfig {
    pub backend: BackendKind,
    /// Base URL, e.g. `http://localhost:9200` or `http://localhost:6334`.
    pub url: String,
    /// Optional API key (Qdrant Cloud).
    pub api_key: Option<String>,
    /// Target index / collection name.
    pub index: String,
    pub schema: IndexSchema,
    /// Records per bulk request.
    pub bulk_size: usize,
    /// Timeout of a single bulk request.
    pub bulk_timeout: Duration,
    /// Verify TLS certificates (OpenSearch over https).
    pub verify_certs: bool,
    pub readiness: ReadinessPolicy,
}

impl StoreConfig {
    /// Creates a default config for a given backend, URL and index name.
    pub fn new_default(
        backend: BackendKind,
        url: impl Into<String>,
        index: impl Into<String>,
    ) -> Self {
        Self {
            backend,
            url: url.into(),
            api_key: None,
            index: index.into(),
            schema: IndexSchema::default(),
            bulk_size: 1000,
            bulk_timeout: Duration::from_secs(60),
            verify_certs: false,
            readiness: ReadinessPolicy::default(),
        }
    }

    /// Loads the config from environment variables.
    ///
    /// Required: `INDEX_NAME`, and `OPENSEARCH_URL` or (with
    /// `VECTOR_BACKEND=qdrant`) `QDRANT_URL`.
    ///
    /// # Errors
    /// Returns `StoreError::Config` for missing or malformed values.
    pub fn from_env() -> Result<Self, StoreError> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Same as [`StoreConfig::from_env`] over an arbitrary variable source.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, StoreError> {
        let get = |k: &str| get(k).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let must = |k: &str| {
            get(k).ok_or_else(|| {
                StoreError::Config(format!("missing required environment variable: {k}"))
            })
        };
        let parse_or = |k: &str, dflt: u64| -> Result<u64, StoreError> {
            get(k).map_or(Ok(dflt), |v| {
                v.parse()
                    .map_err(|_| StoreError::Config(format!("failed to parse {k} = '{v}'")))
            })
        };

        let backend = BackendKind::parse(&get("VECTOR_BACKEND").unwrap_or_default())?;
        let url = match backend {
            BackendKind::OpenSearch => must("OPENSEARCH_URL")?,
            BackendKind::Qdrant => must("QDRANT_URL")?,
        };
        let index = must("INDEX_NAME")?;

        let mut cfg = Self::new_default(backend, url, index);
        cfg.api_key = get("QDRANT_API_KEY");
        cfg.schema.dimension = parse_or("EMBEDDING_DIM", cfg.schema.dimension as u64)? as usize;
        cfg.bulk_size = parse_or("BULK_SIZE", cfg.bulk_size as u64)? as usize;
        cfg.bulk_timeout = Duration::from_secs(parse_or("BULK_TIMEOUT_SECS", 60)?);
        if let Some(raw) = get("OPENSEARCH_VERIFY_CERTS") {
            cfg.verify_certs = parse_flag("OPENSEARCH_VERIFY_CERTS", &raw)?;
        }
        cfg.readiness = ReadinessPolicy {
            timeout: Duration::from_secs(parse_or("STORE_READY_TIMEOUT_SECS", 120)?),
            poll_interval: Duration::from_secs(parse_or("STORE_POLL_INTERVAL_SECS", 5)?),
        };

        cfg.validate()?;
        Ok(cfg)
    }

    /// `host[:port]` of the store URL, without credentials or path.
    pub fn host(&self) -> String {
        match reqwest::Url::parse(self.url.trim()) {
            Ok(url) => match (url.host_str(), url.port()) {
                (Some(host), Some(port)) => format!("{host}:{port}"),
                (Some(host), None) => host.to_string(),
                (None, _) => String::from("<no host>"),
            },
            Err(_) => String::from("<invalid url>"),
        }
    }

    /// Validates config values.
    pub fn validate(&self) -> Result<(), StoreError> {
        let url = self.url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(StoreError::Config(format!(
                "store url must start with http:// or https:// (got '{}')",
                redact_url(url)
            )));
        }
        if self.index.trim().is_empty() {
            return Err(StoreError::Config("index name is empty".into()));
        }
        if self.schema.dimension == 0 {
            return Err(StoreError::Config("EMBEDDING_DIM must be > 0".into()));
        }
        if self.bulk_size == 0 {
            return Err(StoreError::Config("BULK_SIZE must be > 0".into()));
        }
        if self.readiness.poll_interval.is_zero() {
            return Err(StoreError::Config(
                "STORE_POLL_INTERVAL_SECS must be > 0".into(),
            ));
        }
        Ok(())
    }
}

/// Accepts `true/false`, `1/0`, `yes/no` and `on/off`, case-insensitively.
fn parse_flag(key: &str, raw: &str) -> Result<bool, StoreError> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(StoreError::Config(format!(
            "failed to parse {key} = '{raw}' (expected true/false, 1/0, yes/no or on/off)"
        ))),
    }
}
