//! Search configuration

use crate::schema::Schema;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Engine and CLI settings. Every field has a default, so a partial file works.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Page size when the caller doesn't give one
    pub default_limit: usize,
    /// Largest page size accepted
    pub max_limit: usize,
    /// Selects the similarity backend at start-up
    pub fuzzy_enabled: bool,
    /// Characters of context around highlighted matches
    pub snippet_context: usize,
    pub search_timeout_secs: u64,
    /// JSON store file to load records from
    pub store_path: Option<PathBuf>,
    pub schema: Schema,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_limit: 20,
            max_limit: 200,
            fuzzy_enabled: true,
            snippet_context: 50,
            search_timeout_secs: 120,
            store_path: None,
            schema: Schema::default(),
        }
    }
}

impl SearchConfig {
    pub fn search_timeout(&self) -> Duration {
        Duration::from_secs(self.search_timeout_secs)
    }
}

/// Get the path to the default configuration file
pub fn config_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir().context("Cannot determine config directory")?;
    Ok(config_dir.join("casefile").join("config.json"))
}

/// Load configuration from `path`, or from the default location when `None`.
/// A missing file yields the defaults.
pub fn load_config(path: Option<&Path>) -> Result<SearchConfig> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => config_path()?,
    };

    if !path.exists() {
        tracing::debug!("No config at {}, using defaults", path.display());
        return Ok(SearchConfig::default());
    }

    let data = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;

    let config: SearchConfig = serde_json::from_str(&data)
        .with_context(|| format!("Failed to parse config file {}", path.display()))?;

    Ok(config)
}
