//! Shared application state.

use crate::error::{ApiError, RequestFailure};
use opscenter_audit::{AuditEventBuilder, AuditLogger};
use opscenter_blob::BlobStore;
use opscenter_bridge::FinanceBridge;
use opscenter_policy::{CitationGate, ToolAllowList};
use opscenter_search::{DocumentImporter, SearchBackend};
use opscenter_store::DocRepository;
use std::sync::Arc;

/// Everything the handlers need, wired by the binary or by tests.
pub struct AppServices {
    pub docs: Arc<dyn DocRepository>,
    pub audit: AuditLogger,
    /// Store for uploaded document bytes.
    pub blobs: BlobStore,
    /// Bucket exercised by `GET /gcs/smoke`, when one is configured.
    pub smoke_bucket: Option<BlobStore>,
    pub importer: Arc<dyn DocumentImporter>,
    pub search: Arc<dyn SearchBackend>,
    pub bridge: Arc<dyn FinanceBridge>,
    pub allow_list: ToolAllowList,
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    services: AppServices,
    citation_gate: CitationGate,
}

impl AppState {
    pub fn new(services: AppServices) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                services,
                citation_gate: CitationGate,
            }),
        }
    }

    pub fn docs(&self) -> &dyn DocRepository {
        self.inner.services.docs.as_ref()
    }

    pub fn audit(&self) -> &AuditLogger {
        &self.inner.services.audit
    }

    pub fn blobs(&self) -> &BlobStore {
        &self.inner.services.blobs
    }

    pub fn smoke_bucket(&self) -> Option<&BlobStore> {
        self.inner.services.smoke_bucket.as_ref()
    }

    pub fn importer(&self) -> &dyn DocumentImporter {
        self.inner.services.importer.as_ref()
    }

    pub fn search(&self) -> &dyn SearchBackend {
        self.inner.services.search.as_ref()
    }

    pub fn bridge(&self) -> &dyn FinanceBridge {
        self.inner.services.bridge.as_ref()
    }

    pub fn allow_list(&self) -> &ToolAllowList {
        &self.inner.services.allow_list
    }

    pub fn citation_gate(&self) -> &CitationGate {
        &self.inner.citation_gate
    }

    /// Close out a request: write its single audit event from the outcome.
    ///
    /// A failed audit write turns an otherwise successful request into a 500.
    /// When the request already failed, its own error is returned and the
    /// audit failure is only logged.
    pub async fn finish<T>(
        &self,
        event: AuditEventBuilder,
        outcome: Result<T, ApiError>,
    ) -> Result<T, RequestFailure> {
        let request_id = event.request_id().to_string();
        let event = match &outcome {
            Ok(_) => event.success(),
            Err(err) => {
                if err.status().is_server_error() {
                    tracing::error!(request_id = %request_id, error = %err, "Request failed");
                } else {
                    tracing::warn!(request_id = %request_id, error = %err, "Request rejected");
                }
                event.failure(err.to_string())
            }
        };

        let recorded = self.audit().record(event.build()).await;
        match (recorded, outcome) {
            (Ok(_), Ok(value)) => Ok(value),
            (Ok(_), Err(err)) => Err(RequestFailure::new(request_id, err)),
            (Err(audit_err), Ok(_)) => {
                tracing::error!(request_id = %request_id, error = %audit_err, "Audit write failed");
                Err(RequestFailure::new(
                    request_id,
                    ApiError::internal("Failed to record audit event").with_detail(audit_err),
                ))
            }
            (Err(audit_err), Err(err)) => {
                tracing::error!(request_id = %request_id, error = %audit_err, "Audit write failed");
                Err(RequestFailure::new(request_id, err))
            }
        }
    }

    /// Write an audit event, logging instead of failing on error.
    ///
    /// Used by the health probe, which must answer while the database is down.
    pub async fn record_lenient(&self, event: AuditEventBuilder) {
        let event = event.success().build();
        if let Err(e) = self.audit().record(event).await {
            tracing::warn!(error = %e, "Audit write failed for health probe");
        }
    }
}
