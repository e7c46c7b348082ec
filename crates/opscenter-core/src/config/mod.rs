//! Gateway configuration.
//!
//! Configuration is layered:
//! 1. built-in defaults (every field has one),
//! 2. an optional TOML file,
//! 3. environment variables, which always win.
//!
//! # Environment variables
//!
//! | Variable | Field |
//! |----------|-------|
//! | `BIND_ADDR` | `server.bind` |
//! | `CORS_ALLOWED_ORIGINS` | `server.cors_allowed_origins` (comma separated) |
//! | `MAX_UPLOAD_BYTES` | `server.max_upload_bytes` |
//! | `DATABASE_URL` | `database.url` |
//! | `STORAGE_BACKEND` | `storage.backend` (`local` / `gcs`) |
//! | `UPLOADS_DIR` | `storage.uploads_dir` |
//! | `GCS_BUCKET_NAME` | `storage.gcs_bucket` |
//! | `GOOGLE_CLOUD_PROJECT` | `search.project_id` |
//! | `DISCOVERY_ENGINE_LOCATION` | `search.location` |
//! | `DATA_STORE_ID` | `search.data_store_id` |
//! | `VERTEX_ACCESS_TOKEN` | `search.access_token` |
//! | `MCP_BRIDGE_URL` | `bridge.url` |
//! | `AUDIT_STDOUT` | `audit.stdout` |

pub mod audit;
pub mod bridge;
pub mod database;
pub mod search;
pub mod server;
pub mod storage;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub use audit::AuditConfig;
pub use bridge::BridgeConfig;
pub use database::DatabaseConfig;
pub use search::SearchConfig;
pub use server::ServerConfig;
pub use storage::{StorageBackend, StorageConfig};

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value for {var}: '{value}'")]
    InvalidValue { var: &'static str, value: String },
}

/// Complete gateway configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub bridge: BridgeConfig,

    #[serde(default)]
    pub audit: AuditConfig,
}

impl GatewayConfig {
    /// Parse a TOML document. Missing sections fall back to defaults.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    /// Load from an optional file, then apply the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut cfg = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })?;
                Self::from_toml_str(&raw)?
            }
            None => Self::default(),
        };
        cfg.apply_env(|key| std::env::var(key).ok())?;
        Ok(cfg)
    }

    /// Override fields from environment-style lookups.
    ///
    /// Empty values are treated as unset.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("BIND_ADDR") {
            self.server.bind = v;
        }
        if let Some(v) = get("CORS_ALLOWED_ORIGINS") {
            self.server.cors_allowed_origins = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
        if let Some(v) = get("MAX_UPLOAD_BYTES") {
            self.server.max_upload_bytes = v.trim().parse().map_err(|_| {
                ConfigError::InvalidValue {
                    var: "MAX_UPLOAD_BYTES",
                    value: v.clone(),
                }
            })?;
        }
        if let Some(v) = get("DATABASE_URL") {
            self.database.url = v;
        }
        if let Some(v) = get("STORAGE_BACKEND") {
            self.storage.backend = v.parse().map_err(|_| ConfigError::InvalidValue {
                var: "STORAGE_BACKEND",
                value: v.clone(),
            })?;
        }
        if let Some(v) = get("UPLOADS_DIR") {
            self.storage.uploads_dir = PathBuf::from(v);
        }
        if let Some(v) = get("GCS_BUCKET_NAME") {
            self.storage.gcs_bucket = Some(v);
        }
        if let Some(v) = get("GOOGLE_CLOUD_PROJECT") {
            self.search.project_id = Some(v);
        }
        if let Some(v) = get("DISCOVERY_ENGINE_LOCATION") {
            self.search.location = v;
        }
        if let Some(v) = get("DATA_STORE_ID") {
            self.search.data_store_id = Some(v);
        }
        if let Some(v) = get("VERTEX_ACCESS_TOKEN") {
            self.search.access_token = Some(v);
        }
        if let Some(v) = get("MCP_BRIDGE_URL") {
            self.bridge.url = v;
        }
        if let Some(v) = get("AUDIT_STDOUT") {
            self.audit.stdout = parse_bool(&v).ok_or(ConfigError::InvalidValue {
                var: "AUDIT_STDOUT",
                value: v.clone(),
            })?;
        }
        Ok(())
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
