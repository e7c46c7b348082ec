//! Managed search (Vertex AI Search / Discovery Engine) settings.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Google Cloud project hosting the data store.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,

    /// Discovery Engine location ("global", "us", "eu").
    #[serde(default = "default_location")]
    pub location: String,

    /// Data store that documents are imported into.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_store_id: Option<String>,

    /// Static OAuth access token. When unset, tokens come from the GCE
    /// metadata server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,

    /// Upper bound on waiting for one import operation.
    #[serde(default = "default_import_timeout_secs")]
    pub import_timeout_secs: u64,

    /// Delay between polls of a running import operation.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Upper bound on any single HTTP call (import, poll, token).
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_location() -> String {
    "global".to_string()
}

fn default_import_timeout_secs() -> u64 {
    300
}

fn default_poll_interval_secs() -> u64 {
    2
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            project_id: None,
            location: default_location(),
            data_store_id: None,
            access_token: None,
            import_timeout_secs: default_import_timeout_secs(),
            poll_interval_secs: default_poll_interval_secs(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl SearchConfig {
    /// Whether both the project and data store are known.
    pub fn is_configured(&self) -> bool {
        self.project_id.is_some() && self.data_store_id.is_some()
    }
}
