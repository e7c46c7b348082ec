//! Error types for the audit crate.

use thiserror::Error;

/// Errors that can occur during audit operations.
#[derive(Debug, Error)]
pub enum AuditError {
    /// Failed to append an event.
    #[error("failed to record audit event: {0}")]
    WriteFailed(String),

    /// Failed to query audit events.
    #[error("failed to query audit events: {0}")]
    QueryFailed(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}
