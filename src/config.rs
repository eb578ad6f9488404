//! Application configuration.
//!
//! The configuration is loaded from a JSON file, by default
//! `$XDG_CONFIG_HOME/viewgrid/config.json`, or from the path passed with
//! `--config <path>`.
//!
//! # Example
//!
//! ```json
//! {
//!   "grid": { "columns": 3, "rows": 2 },
//!   "listener": { "socket_path": "/run/user/1000/viewgrid.sock" }
//! }
//! ```

use crate::grid::GridConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration.
///
/// Every field is optional: a minimal `{}` file is valid and all sections
/// fall back to their compiled-in defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Shape of one tab page.  Defaults to 2×2.
    #[serde(default)]
    pub grid: GridConfig,

    /// Command listener settings.
    #[serde(default)]
    pub listener: ListenerConfig,
}

/// Where the command socket lives.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Socket path.  `None` means `$XDG_RUNTIME_DIR/viewgrid.sock`.
    pub socket_path: Option<PathBuf>,
}

impl ListenerConfig {
    /// The configured socket path, or the runtime-dir default.
    pub fn socket_path(&self) -> PathBuf {
        self.socket_path.clone().unwrap_or_else(|| {
            let runtime = std::env::var("XDG_RUNTIME_DIR").unwrap_or_else(|_| "/tmp".into());
            PathBuf::from(runtime).join("viewgrid.sock")
        })
    }
}

impl Config {
    /// Load configuration from a JSON file at `path`.
    ///
    /// A grid with a zero dimension is rejected here rather than when the
    /// workspace is built.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError(format!("failed to read {}: {}", path.display(), e)))?;
        Self::from_json(&contents)
            .map_err(|e| ConfigError(format!("{}: {}", path.display(), e.0)))
    }

    /// Parse and validate configuration from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| ConfigError(format!("failed to parse: {}", e)))?;
        config
            .grid
            .validate()
            .map_err(|e| ConfigError(format!("invalid grid: {}", e)))?;
        Ok(config)
    }

    /// Default config location (`$XDG_CONFIG_HOME/viewgrid/config.json`).
    pub fn default_path() -> PathBuf {
        let base = std::env::var("XDG_CONFIG_HOME").unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
            format!("{}/.config", home)
        });
        PathBuf::from(base).join("viewgrid").join("config.json")
    }
}

/// Error from loading or parsing a configuration file.
#[derive(Debug, thiserror::Error)]
#[error("config error: {0}")]
pub struct ConfigError(String);
