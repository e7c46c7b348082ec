//! Request and response bodies for the gateway's JSON endpoints.
//!
//! Every response body carries the `request_id` of the audit event it was
//! recorded under.

use crate::model::{DocAsset, IndexedStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A source backing a document answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    pub doc_name: String,
    pub snippet: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_or_section: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri_or_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocQueryRequest {
    pub query: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocQueryResponse {
    pub request_id: String,
    pub answer: String,
    #[serde(default)]
    pub citations: Vec<Citation>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocUploadResponse {
    pub request_id: String,
    pub doc_id: i64,
    pub filename: String,
    pub message: String,
    /// Set when a non-deleted document with the same filename already exists.
    pub duplicate_warning: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocStatusResponse {
    pub request_id: String,
    pub documents: Vec<DocAsset>,
}

/// Trigger indexing. Without `doc_id`, every eligible pending document is imported.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocIndexRequest {
    #[serde(default)]
    pub doc_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexDetail {
    pub doc_id: i64,
    pub status: IndexedStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocIndexResponse {
    pub request_id: String,
    pub triggered: usize,
    pub succeeded: usize,
    pub failed: usize,
    #[serde(default)]
    pub details: Vec<IndexDetail>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocDeleteResponse {
    pub request_id: String,
    pub doc_id: i64,
    pub deleted_at: DateTime<Utc>,
}

/// Finance question routed to one read-only bridge tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinanceQueryRequest {
    pub query: String,
    pub tool: String,
    #[serde(default)]
    pub arguments: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinanceQueryResponse {
    pub request_id: String,
    pub tool: String,
    pub content: Vec<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub request_id: String,
    /// `ok` or `degraded`.
    pub status: String,
    pub service: String,
    /// `connected` or `disconnected`.
    pub database: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RootResponse {
    pub request_id: String,
    pub message: String,
    pub version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GcsSmokeResponse {
    pub ok: bool,
    pub bucket: String,
    pub object: String,
    pub request_id: String,
}

/// Body of every error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub request_id: String,
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}
