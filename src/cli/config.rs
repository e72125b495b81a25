//! Configuration file
//!
//! JSON, loaded once per command:
//!
//! ```json
//! {
//!   "data_dir": "/var/lib/shipforms",
//!   "upload_dir": "/var/lib/shipforms/uploads",
//!   "max_upload_bytes": 10485760,
//!   "log_level": "info",
//!   "http": { "host": "0.0.0.0", "port": 8080, "cors_origins": [] }
//! }
//! ```
//!
//! Only `data_dir` is required.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::errors::{CliError, CliResult};
use crate::http_server::HttpServerConfig;
use crate::observability::DEFAULT_LOG_LEVEL;

/// Upload directory name under `data_dir` when none is configured
const DEFAULT_UPLOAD_SUBDIR: &str = "uploads";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Data directory (required)
    pub data_dir: String,

    /// Where attachments are written (default: `<data_dir>/uploads`)
    #[serde(default)]
    pub upload_dir: Option<String>,

    /// Largest accepted attachment in bytes (default 10 MiB)
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: u64,

    /// Log filter used when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub http: HttpServerConfig,
}

fn default_max_upload_bytes() -> u64 {
    10 * 1024 * 1024
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| CliError::config_error(format!("Failed to read config: {}", e)))?;

        Self::from_json(&content)
    }

    /// Parse and validate configuration text
    pub fn from_json(content: &str) -> CliResult<Self> {
        let config: Config = serde_json::from_str(content)
            .map_err(|e| CliError::config_error(format!("Invalid config JSON: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    fn validate(&self) -> CliResult<()> {
        if self.data_dir.trim().is_empty() {
            return Err(CliError::config_error("data_dir must not be empty"));
        }

        if matches!(&self.upload_dir, Some(dir) if dir.trim().is_empty()) {
            return Err(CliError::config_error("upload_dir must not be empty"));
        }

        if self.max_upload_bytes == 0 {
            return Err(CliError::config_error("max_upload_bytes must be > 0"));
        }

        if self.http.port == 0 {
            return Err(CliError::config_error("http.port must be > 0"));
        }

        Ok(())
    }

    /// Get data directory as Path
    pub fn data_path(&self) -> &Path {
        Path::new(&self.data_dir)
    }

    /// Resolved upload directory
    pub fn upload_path(&self) -> PathBuf {
        match &self.upload_dir {
            Some(dir) => PathBuf::from(dir),
            None => self.data_path().join(DEFAULT_UPLOAD_SUBDIR),
        }
    }
}
