//! Engine configuration.
//!
//! Loaded from JSON; every field has a default so an empty object is valid.
//! `NUTRITRACK_DB_PATH` and `NUTRITRACK_DATASET_PATH` override the file paths.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::scoring::ScoringConfig;

pub const ENV_DB_PATH: &str = "NUTRITRACK_DB_PATH";
pub const ENV_DATASET_PATH: &str = "NUTRITRACK_DATASET_PATH";

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    /// SQLite database file
    pub database_path: PathBuf,
    /// Patient dataset imported on first launch
    pub dataset_path: PathBuf,
    pub scoring: ScoringConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("nutritrack.db"),
            dataset_path: PathBuf::from("user_data.csv"),
            scoring: ScoringConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Parse from JSON text. No environment overrides are applied.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a config file and apply environment overrides.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json_str(&json)?.with_overrides(|key| std::env::var(key).ok());
        tracing::debug!(path = %path.display(), "Loaded engine config");
        Ok(config)
    }

    /// Defaults plus environment overrides.
    pub fn from_env() -> Self {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply path overrides from a variable lookup. Empty values are ignored.
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup(ENV_DB_PATH).filter(|v| !v.is_empty()) {
            self.database_path = PathBuf::from(path);
        }
        if let Some(path) = lookup(ENV_DATASET_PATH).filter(|v| !v.is_empty()) {
            self.dataset_path = PathBuf::from(path);
        }
        self
    }
}
