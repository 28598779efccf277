//! File-backed defaults loaded from `~/.config/retrier/config.toml`.
//!
//! The file only describes data: hooks are always the built-in no-ops and
//! have to be declared in code.

use crate::backoff::{BackoffKind, BackoffStrategy};
use crate::configuration::{Configuration, Override, Overrides, DEFAULT_BACKOFF_START, DEFAULT_RETRIES};
use crate::error::ConfigError;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    /// Maximum retries after the first attempt.
    pub retries: u32,
    /// Built-in failure kind names to retry on (e.g. "io", "http.retriable").
    pub retriable: Vec<String>,
    /// Strategy used to generate the backoff table.
    #[serde(default)]
    pub backoff: Option<BackoffStrategy>,
    /// Explicit table in milliseconds; takes precedence over `backoff`.
    #[serde(default)]
    pub backoff_intervals_ms: Option<Vec<u64>>,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            retries: DEFAULT_RETRIES,
            retriable: vec![
                "http.retriable".to_string(),
                "io.connection_reset".to_string(),
                "io".to_string(),
            ],
            backoff: Some(BackoffStrategy::new(BackoffKind::Constant, DEFAULT_BACKOFF_START)),
            backoff_intervals_ms: None,
        }
    }
}

impl FileConfig {
    /// Validate and convert through the same merge path as per-call overrides.
    pub fn to_configuration(&self) -> Result<Configuration, ConfigError> {
        let mut base = Configuration::default();
        if let Some(strategy) = self.backoff {
            base.declare_backoff_strategy_for(strategy, self.retries)?;
        }

        let mut overrides = Overrides::new()
            .retries(i64::from(self.retries))
            .retriable(crate::configuration::resolve_kinds(&self.retriable)?);
        if let Some(ms) = &self.backoff_intervals_ms {
            overrides.set(Override::BackoffIntervals(
                ms.iter().copied().map(Duration::from_millis).collect(),
            ));
        }
        base.merge(&overrides)
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("retrier")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

pub fn load_from_path(path: &Path) -> Result<FileConfig> {
    let data = fs::read_to_string(path)?;
    let cfg: FileConfig = toml::from_str(&data)?;
    Ok(cfg)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<FileConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = FileConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }
    load_from_path(&path)
}
