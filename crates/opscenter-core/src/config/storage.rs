//! Backing store for uploaded document bytes.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

/// Where uploaded files are written.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Local volume under `uploads_dir`.
    #[default]
    Local,
    /// Google Cloud Storage bucket `gcs_bucket`.
    Gcs,
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "gcs" => Ok(Self::Gcs),
            other => Err(format!("unknown storage backend '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,

    /// Directory for the local backend.
    #[serde(default = "default_uploads_dir")]
    pub uploads_dir: PathBuf,

    /// Bucket for the GCS backend and the smoke check.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gcs_bucket: Option<String>,
}

fn default_uploads_dir() -> PathBuf {
    PathBuf::from("/app/uploads")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            uploads_dir: default_uploads_dir(),
            gcs_bucket: None,
        }
    }
}
