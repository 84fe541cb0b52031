//! Application configuration
//!
//! Loaded from `chisel.toml` in the working directory (or the path in
//! `CHISEL_CONFIG`), with every field defaulting to a sensible value so the
//! server runs with no config file at all.

use crate::error::{ChiselError, ChiselResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind; refactoring mutates source, so default to loopback only
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Maximum concurrent client connections; None means unlimited
    #[serde(default)]
    pub max_clients: Option<usize>,
    /// Per-operation timeout applied at the executor boundary
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// Grace period for draining in-flight requests on stop
    #[serde(default = "default_shutdown_grace")]
    pub shutdown_grace_secs: u64,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    7432
}

fn default_request_timeout() -> u64 {
    30
}

fn default_shutdown_grace() -> u64 {
    5
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_clients: None,
            request_timeout_secs: default_request_timeout(),
            shutdown_grace_secs: default_shutdown_grace(),
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Pretty,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: LogFormat,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> LogFormat {
    LogFormat::Pretty
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl AppConfig {
    /// Load configuration from disk, falling back to defaults
    ///
    /// Reads `CHISEL_CONFIG` if set, otherwise `./chisel.toml`. A missing
    /// file is not an error; a malformed file is.
    pub fn load() -> ChiselResult<Self> {
        let path = std::env::var("CHISEL_CONFIG").unwrap_or_else(|_| "chisel.toml".to_string());
        Self::load_from(Path::new(&path))
    }

    /// Load configuration from an explicit path
    pub fn load_from(path: &Path) -> ChiselResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path).map_err(|e| {
            ChiselError::config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        toml::from_str(&raw).map_err(|e| {
            ChiselError::config(format!("Failed to parse {}: {}", path.display(), e))
        })
    }
}
