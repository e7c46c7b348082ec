//! Persisted entities.
//!
//! Two tables back the gateway: `doc_asset` (one row per uploaded file) and
//! `audit_event` (one row per inbound request). Enum columns are stored as
//! their lowercase string form.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Returned when a stored enum column holds an unknown value.
#[derive(Debug, Clone, Error)]
#[error("unknown {kind} value '{value}'")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

macro_rules! string_enum {
    ($name:ident, $kind:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            /// The stored string form.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    other => Err(ParseEnumError {
                        kind: $kind,
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}

/// Document indexing state: `pending → indexing → ready | failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum IndexedStatus {
    #[default]
    Pending,
    Indexing,
    Ready,
    Failed,
}

string_enum!(IndexedStatus, "indexed_status", {
    Pending => "pending",
    Indexing => "indexing",
    Ready => "ready",
    Failed => "failed",
});

/// Module tag recorded on each audit event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditModule {
    /// Document upload, status, query and indexing.
    Docs,
    /// Inbox triage (reserved, no endpoints yet).
    Inbox,
    /// Finance queries through the accounting bridge.
    Finance,
    /// Operator endpoints (smoke checks, audit lookups).
    Admin,
    /// Health and service metadata.
    System,
}

string_enum!(AuditModule, "module", {
    Docs => "docs",
    Inbox => "inbox",
    Finance => "finance",
    Admin => "admin",
    System => "system",
});

/// Outcome recorded on an audit event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AuditStatus {
    #[default]
    Pending,
    Success,
    Failure,
}

string_enum!(AuditStatus, "status", {
    Pending => "pending",
    Success => "success",
    Failure => "failure",
});

/// Metadata row for one uploaded file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocAsset {
    pub id: i64,
    pub filename: String,
    /// `uploads/<file>` for local storage, `gs://bucket/object` for GCS.
    pub storage_uri: String,
    pub uploaded_at: DateTime<Utc>,
    pub indexed_status: IndexedStatus,
    /// Search data store the document was imported into.
    pub datastore_ref: Option<String>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl DocAsset {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Whether the document lives in a GCS bucket (and so can be imported).
    pub fn is_in_gcs(&self) -> bool {
        self.storage_uri.starts_with("gs://")
    }
}

/// Fields supplied when inserting a document row.
#[derive(Debug, Clone)]
pub struct NewDocAsset {
    pub filename: String,
    pub storage_uri: String,
}
