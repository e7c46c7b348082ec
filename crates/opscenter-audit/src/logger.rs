//! Audit logger implementation.
//!
//! Provides the main `AuditLogger` type: start an event for a request,
//! record it once the outcome is known, and read the trail back.

use chrono::{DateTime, Utc};
use opscenter_core::{AuditModule, AuditStatus};
use std::sync::Arc;

use crate::error::AuditError;
use crate::event::{AuditEvent, AuditEventBuilder};
use crate::storage::AuditStorage;

/// Default page size for audit queries.
pub const DEFAULT_QUERY_LIMIT: usize = 100;

/// The main audit logger.
#[derive(Clone)]
pub struct AuditLogger {
    storage: Arc<dyn AuditStorage>,
}

impl AuditLogger {
    /// Create a logger over the given storage backend.
    pub fn new(storage: Arc<dyn AuditStorage>) -> Self {
        Self { storage }
    }

    /// Start an event for a request. Nothing is written until [`record`](Self::record).
    pub fn begin(&self, module: AuditModule, request_id: &str) -> AuditEventBuilder {
        AuditEvent::builder(module, request_id)
    }

    /// Append an event and return it with its storage id.
    pub async fn record(&self, event: AuditEvent) -> Result<AuditEvent, AuditError> {
        // Also log to tracing for structured logging integration
        match event.status {
            AuditStatus::Failure => tracing::warn!(
                request_id = %event.request_id,
                module = %event.module,
                status = %event.status,
                error = event.error.as_deref().unwrap_or(""),
                "Audit event"
            ),
            _ => tracing::info!(
                request_id = %event.request_id,
                module = %event.module,
                status = %event.status,
                "Audit event"
            ),
        }

        self.storage.append(event).await
    }

    /// Query audit events with filters, newest first.
    pub async fn query(&self, filter: AuditFilter) -> Result<Vec<AuditEvent>, AuditError> {
        self.storage.query(filter).await
    }

    /// Count audit events matching a filter (ignores limit/offset).
    pub async fn count(&self, filter: AuditFilter) -> Result<usize, AuditError> {
        self.storage.count(filter).await
    }

    /// All events recorded under a request id.
    pub async fn for_request(&self, request_id: &str) -> Result<Vec<AuditEvent>, AuditError> {
        self.query(AuditFilter {
            request_id: Some(request_id.to_string()),
            ..Default::default()
        })
        .await
    }
}

/// Filter for querying audit events.
#[derive(Debug, Clone, Default)]
pub struct AuditFilter {
    pub request_id: Option<String>,
    pub module: Option<AuditModule>,
    pub status: Option<AuditStatus>,
    pub user_id: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    /// Maximum number of results.
    pub limit: Option<usize>,
    /// Offset for pagination.
    pub offset: Option<usize>,
}

impl AuditFilter {
    /// Whether an event passes every set criterion (limit/offset excluded).
    pub fn matches(&self, event: &AuditEvent) -> bool {
        if let Some(ref request_id) = self.request_id {
            if &event.request_id != request_id {
                return false;
            }
        }
        if let Some(module) = self.module {
            if event.module != module {
                return false;
            }
        }
        if let Some(status) = self.status {
            if event.status != status {
                return false;
            }
        }
        if let Some(ref user) = self.user_id {
            if event.user_id.as_ref() != Some(user) {
                return false;
            }
        }
        if let Some(start) = self.start_time {
            if event.ts < start {
                return false;
            }
        }
        if let Some(end) = self.end_time {
            if event.ts > end {
                return false;
            }
        }
        true
    }
}
