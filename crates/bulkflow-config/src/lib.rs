//! BulkFlow settings
//!
//! Pipeline defaults can be kept in a YAML settings file so that every run
//! of the tools does not need the same flags:
//!
//! ```yaml
//! workers: 8
//! policy: best-effort
//! rate_limit: 20
//! ```
//!
//! Command-line flags still take precedence over the file.

pub mod error;

pub use error::*;

use bulkflow_core::{FailurePolicy, PipelineConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable pointing directly at a settings file
pub const CONFIG_PATH_ENV: &str = "BULKFLOW_CONFIG_PATH";

/// Settings file names looked up in the current directory, in order
const CANDIDATES: [&str; 2] = ["bulkflow.yaml", ".bulkflow.yaml"];

/// Pipeline defaults read from a settings file
///
/// Every field is optional; unset fields fall back to the built-in
/// [`PipelineConfig`] defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    pub workers: Option<usize>,
    pub policy: Option<FailurePolicy>,
    pub rate_limit: Option<u32>,
    pub queue_capacity: Option<usize>,
}

impl Settings {
    /// Built-in defaults overlaid with the values set in this file
    pub fn pipeline_config(&self) -> PipelineConfig {
        let mut config = PipelineConfig::default();
        if let Some(workers) = self.workers {
            config.workers = workers;
        }
        if let Some(policy) = self.policy {
            config.policy = policy;
        }
        if let Some(capacity) = self.queue_capacity {
            config.queue_capacity = capacity;
        }
        if self.rate_limit.is_some() {
            config.rate_limit = self.rate_limit;
        }
        config
    }
}

/// Global settings directory (~/.config/bulkflow)
pub fn get_config_dir() -> Result<PathBuf> {
    Ok(dirs::config_dir()
        .ok_or(ConfigError::ConfigDirNotFound)?
        .join("bulkflow"))
}

/// Look for a settings file
///
/// Search order:
/// 1. `BULKFLOW_CONFIG_PATH` (direct path)
/// 2. current directory: bulkflow.yaml, .bulkflow.yaml
/// 3. ~/.config/bulkflow/config.yaml (global settings)
///
/// Returns `Ok(None)` when none of them exists.
pub fn find_config_file() -> Result<Option<PathBuf>> {
    if let Ok(config_path) = std::env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(config_path);
        if path.exists() {
            return Ok(Some(path));
        }
        debug!(path = %path.display(), "{} points at a missing file", CONFIG_PATH_ENV);
    }

    let current_dir = std::env::current_dir()?;
    for filename in &CANDIDATES {
        let path = current_dir.join(filename);
        if path.exists() {
            return Ok(Some(path));
        }
    }

    if let Ok(config_dir) = get_config_dir() {
        let global_config = config_dir.join("config.yaml");
        if global_config.exists() {
            return Ok(Some(global_config));
        }
    }

    Ok(None)
}

/// Parse a settings file
pub fn load_settings(path: &Path) -> Result<Settings> {
    let content = std::fs::read_to_string(path)?;
    if content.trim().is_empty() {
        return Ok(Settings::default());
    }
    serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Load settings from `explicit` if given, otherwise from the discovered file
///
/// An explicit path that does not exist is an error; finding no file at
/// all yields the defaults.
pub fn load(explicit: Option<&Path>) -> Result<Settings> {
    let path = match explicit {
        Some(path) if !path.exists() => {
            return Err(ConfigError::SettingsFileNotFound(path.to_path_buf()));
        }
        Some(path) => Some(path.to_path_buf()),
        None => find_config_file()?,
    };

    match path {
        Some(path) => {
            debug!(path = %path.display(), "Loading settings");
            load_settings(&path)
        }
        None => Ok(Settings::default()),
    }
}
