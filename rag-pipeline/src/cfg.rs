//! Runtime configuration loaded from environment variables.

use std::path::PathBuf;

use crate::error::PipelineError;

/// Knobs shared by the ingestion and query pipelines.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Directory scanned for `*.md` files (non-recursive).
    pub data_path: PathBuf,
    /// Max chunk length in characters.
    pub chunk_size: usize,
    /// Characters shared between adjacent chunks.
    pub chunk_overlap: usize,
    /// Number of chunks retrieved per query.
    pub top_k: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("./data"),
            chunk_size: 1000,
            chunk_overlap: 200,
            top_k: 3,
        }
    }
}

impl PipelineConfig {
    /// Build from `DATA_PATH`, `CHUNK_SIZE`, `CHUNK_OVERLAP`, `RAG_TOP_K`.
    ///
    /// # Errors
    /// `PipelineError::Config` for unparsable numbers or inconsistent values.
    pub fn from_env() -> Result<Self, PipelineError> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Same as [`PipelineConfig::from_env`] over an arbitrary variable source.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, PipelineError> {
        let get = |k: &str| get(k).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let parse = |k: &str, dflt: usize| -> Result<usize, PipelineError> {
            get(k).map_or(Ok(dflt), |v| {
                v.parse()
                    .map_err(|_| PipelineError::Config(format!("failed to parse {k} = '{v}'")))
            })
        };

        let dflt = Self::default();
        let cfg = Self {
            data_path: get("DATA_PATH").map(PathBuf::from).unwrap_or(dflt.data_path),
            chunk_size: parse("CHUNK_SIZE", dflt.chunk_size)?,
            chunk_overlap: parse("CHUNK_OVERLAP", dflt.chunk_overlap)?,
            top_k: parse("RAG_TOP_K", dflt.top_k)?,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.chunk_size == 0 {
            return Err(PipelineError::Config("CHUNK_SIZE must be > 0".into()));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(PipelineError::Config(format!(
                "CHUNK_OVERLAP ({}) must be smaller than CHUNK_SIZE ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        if self.top_k == 0 {
            return Err(PipelineError::Config("RAG_TOP_K must be > 0".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = PipelineConfig::default();
        assert_eq!(cfg.chunk_size, 1000);
        assert_eq!(cfg.chunk_overlap, 200);
        assert_eq!(cfg.top_k, 3);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn overlap_must_be_smaller_than_chunk() {
        let cfg = PipelineConfig {
            chunk_overlap: 1000,
            ..PipelineConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(PipelineError::Config(_))));
    }

    fn load(pairs: &[(&str, &str)]) -> Result<PipelineConfig, PipelineError> {
        let vars: std::collections::HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        PipelineConfig::from_lookup(|k| vars.get(k).cloned())
    }

    #[test]
    fn unset_variables_fall_back_to_defaults() {
        assert_eq!(load(&[]).unwrap(), PipelineConfig::default());
        let cfg = load(&[("DATA_PATH", "/srv/docs"), ("RAG_TOP_K", " 5 ")]).unwrap();
        assert_eq!(cfg.data_path, PathBuf::from("/srv/docs"));
        assert_eq!(cfg.top_k, 5);
    }

    #[test]
    fn malformed_or_inconsistent_values_fail() {
        for pairs in [
            &[("CHUNK_SIZE", "big")][..],
            &[("CHUNK_OVERLAP", "-1")][..],
            &[("RAG_TOP_K", "0")][..],
            &[("CHUNK_SIZE", "100"), ("CHUNK_OVERLAP", "100")][..],
        ] {
            assert!(
                matches!(load(pairs), Err(PipelineError::Config(_))),
                "{pairs:?}"
            );
        }
    }
}
