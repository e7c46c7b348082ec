//! Error types for the search crate.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Vertex AI Search not configured (GOOGLE_CLOUD_PROJECT, DATA_STORE_ID required)")]
    NotConfigured,

    /// Only objects already in GCS can be imported.
    #[error("Storage URI must be gs:// (got {0}...)")]
    InvalidUri(String),

    #[error("failed to obtain access token: {0}")]
    Auth(String),

    #[error("request failed: {0}")]
    Transport(String),

    #[error("HTTP {status}: {body}")]
    Api { status: u16, body: String },

    /// The long-running import finished with an error.
    #[error("import failed: {0}")]
    Operation(String),

    #[error("import did not finish within {secs}s")]
    Timeout { secs: u64 },

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}
