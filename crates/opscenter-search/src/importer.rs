//! Discovery Engine document import.
//!
//! One import per document: `documents:import` on the data store's
//! `default_branch` with a single `gs://` input URI and `INCREMENTAL`
//! reconciliation, then poll the returned operation until it is done.

use crate::error::SearchError;
use async_trait::async_trait;
use opscenter_core::SearchConfig;
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::{Duration, Instant};

/// GCE metadata server token endpoint.
pub const METADATA_TOKEN_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token";

/// Characters of a rejected URI echoed back in the error.
const URI_ECHO_LEN: usize = 50;

/// Imports stored documents into the managed search index.
#[async_trait]
pub trait DocumentImporter: Send + Sync {
    /// Import one document. Returns the data store reference on success.
    async fn import(&self, storage_uri: &str, request_id: &str) -> Result<String, SearchError>;
}

/// Where OAuth access tokens come from.
#[derive(Debug, Clone)]
pub enum TokenSource {
    /// A fixed token from configuration.
    Static(String),
    /// The GCE metadata server at the given URL.
    Metadata(String),
}

#[derive(Deserialize)]
struct MetadataToken {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct Operation {
    name: String,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    error: Option<OperationError>,
    #[serde(default)]
    response: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct OperationError {
    #[serde(default)]
    code: i32,
    #[serde(default)]
    message: String,
}

/// Discovery Engine REST importer.
pub struct VertexImporter {
    client: reqwest::Client,
    cfg: SearchConfig,
    base_url: String,
    token: TokenSource,
}

impl VertexImporter {
    /// Build an importer. Every HTTP call is bounded by `request_timeout_secs`.
    pub fn new(cfg: SearchConfig) -> Result<Self, SearchError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.request_timeout_secs))
            .build()
            .map_err(|e| SearchError::Transport(e.to_string()))?;
        let base_url = format!("https://{}/v1", api_host(&cfg.location));
        let token = match cfg.access_token.clone() {
            Some(t) => TokenSource::Static(t),
            None => TokenSource::Metadata(METADATA_TOKEN_URL.to_string()),
        };
        Ok(Self {
            client,
            cfg,
            base_url,
            token,
        })
    }

    /// Point API calls at another base URL (including the version segment).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_token_source(mut self, token: TokenSource) -> Self {
        self.token = token;
        self
    }

    /// Data store resource name, when configured.
    pub fn datastore_ref(&self) -> Option<String> {
        let project = self.cfg.project_id.as_deref()?;
        let data_store = self.cfg.data_store_id.as_deref()?;
        Some(format!(
            "projects/{}/locations/{}/collections/default_collection/dataStores/{}",
            project, self.cfg.location, data_store
        ))
    }

    async fn access_token(&self) -> Result<String, SearchError> {
        match &self.token {
            TokenSource::Static(t) => Ok(t.clone()),
            TokenSource::Metadata(url) => {
                let resp = self
                    .client
                    .get(url)
                    .header("Metadata-Flavor", "Google")
                    .send()
                    .await
                    .map_err(|e| SearchError::Auth(e.to_string()))?;
                if !resp.status().is_success() {
                    return Err(SearchError::Auth(format!(
                        "metadata server returned HTTP {}",
                        resp.status()
                    )));
                }
                let token: MetadataToken = resp
                    .json()
                    .await
                    .map_err(|e| SearchError::Auth(e.to_string()))?;
                Ok(token.access_token)
            }
        }
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<Operation, SearchError> {
        let resp = request
            .send()
            .await
            .map_err(|e| SearchError::Transport(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SearchError::Api {
                status: status.as_u16(),
                body,
            });
        }
        resp.json()
            .await
            .map_err(|e| SearchError::InvalidResponse(e.to_string()))
    }

    async fn wait(&self, mut op: Operation, token: &str) -> Result<Operation, SearchError> {
        let timeout = Duration::from_secs(self.cfg.import_timeout_secs);
        let interval = Duration::from_secs(self.cfg.poll_interval_secs);
        let started = Instant::now();

        while !op.done {
            if started.elapsed() >= timeout {
                return Err(SearchError::Timeout {
                    secs: self.cfg.import_timeout_secs,
                });
            }
            tokio::time::sleep(interval).await;
            let url = format!("{}/{}", self.base_url, op.name);
            op = self.send(self.client.get(&url).bearer_auth(token)).await?;
        }
        Ok(op)
    }
}

#[async_trait]
impl DocumentImporter for VertexImporter {
    async fn import(&self, storage_uri: &str, request_id: &str) -> Result<String, SearchError> {
        let datastore_ref = self.datastore_ref().ok_or(SearchError::NotConfigured)?;
        if !storage_uri.starts_with("gs://") {
            return Err(SearchError::InvalidUri(
                storage_uri.chars().take(URI_ECHO_LEN).collect(),
            ));
        }

        let token = self.access_token().await?;
        let url = format!(
            "{}/{}/branches/default_branch/documents:import",
            self.base_url, datastore_ref
        );
        let body = json!({
            "gcsSource": {
                "inputUris": [storage_uri],
                "dataSchema": "content",
            },
            "reconciliationMode": "INCREMENTAL",
        });

        let op = self
            .send(self.client.post(&url).bearer_auth(&token).json(&body))
            .await?;
        tracing::info!(request_id, storage_uri, operation = %op.name, "Vertex import started");

        let op = self.wait(op, &token).await?;
        if let Some(err) = op.error {
            tracing::error!(request_id, storage_uri, code = err.code, error = %err.message, "Vertex import failed");
            return Err(SearchError::Operation(err.message));
        }
        if let Some(sample) = first_error_sample(op.response.as_ref()) {
            tracing::error!(request_id, storage_uri, error = %sample, "Vertex import rejected document");
            return Err(SearchError::Operation(sample));
        }

        tracing::info!(request_id, storage_uri, "Vertex import completed");
        Ok(datastore_ref)
    }
}

/// `{location}-discoveryengine.googleapis.com`, or the global host.
fn api_host(location: &str) -> String {
    if location == "global" {
        "discoveryengine.googleapis.com".to_string()
    } else {
        format!("{location}-discoveryengine.googleapis.com")
    }
}

fn first_error_sample(response: Option<&Value>) -> Option<String> {
    let sample = response?.get("errorSamples")?.as_array()?.first()?;
    Some(
        sample
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| sample.to_string()),
    )
}
