//! Audit storage backends.
//!
//! Storage is append-only: there is no update or delete operation. The
//! Postgres backend lives in `opscenter-store`; this module carries the
//! in-process ones.

use crate::error::AuditError;
use crate::event::AuditEvent;
use crate::logger::AuditFilter;
use async_trait::async_trait;
use std::sync::{Arc, RwLock};

/// Trait for audit storage backends.
#[async_trait]
pub trait AuditStorage: Send + Sync {
    /// Append an event; returns it with its assigned id.
    async fn append(&self, event: AuditEvent) -> Result<AuditEvent, AuditError>;

    /// Query events matching a filter, newest first.
    async fn query(&self, filter: AuditFilter) -> Result<Vec<AuditEvent>, AuditError>;

    /// Count events matching a filter (ignores limit/offset).
    async fn count(&self, filter: AuditFilter) -> Result<usize, AuditError>;
}

/// In-memory storage.
#[derive(Default)]
pub struct MemoryStorage {
    events: RwLock<Vec<AuditEvent>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored events.
    pub fn len(&self) -> usize {
        self.events.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl AuditStorage for MemoryStorage {
    async fn append(&self, mut event: AuditEvent) -> Result<AuditEvent, AuditError> {
        let mut events = self
            .events
            .write()
            .map_err(|e| AuditError::WriteFailed(format!("Failed to acquire write lock: {}", e)))?;
        event.id = Some(events.len() as i64 + 1);
        events.push(event.clone());
        Ok(event)
    }

    async fn query(&self, filter: AuditFilter) -> Result<Vec<AuditEvent>, AuditError> {
        let events = self.events.read().map_err(|e| {
            AuditError::QueryFailed(format!("Failed to acquire read lock: {}", e))
        })?;

        let matching = events.iter().rev().filter(|e| filter.matches(e));
        let skipped = matching.skip(filter.offset.unwrap_or(0));
        let results = match filter.limit {
            Some(limit) => skipped.take(limit).cloned().collect(),
            None => skipped.cloned().collect(),
        };

        Ok(results)
    }

    async fn count(&self, filter: AuditFilter) -> Result<usize, AuditError> {
        let events = self.events.read().map_err(|e| {
            AuditError::QueryFailed(format!("Failed to acquire read lock: {}", e))
        })?;

        Ok(events.iter().filter(|e| filter.matches(e)).count())
    }
}

/// Console storage (JSON lines on stdout). Write-only.
pub struct ConsoleStorage;

#[async_trait]
impl AuditStorage for ConsoleStorage {
    async fn append(&self, event: AuditEvent) -> Result<AuditEvent, AuditError> {
        let json = serde_json::to_string(&event)?;
        println!("{}", json);
        Ok(event)
    }

    async fn query(&self, _filter: AuditFilter) -> Result<Vec<AuditEvent>, AuditError> {
        // Console storage doesn't support querying
        Ok(vec![])
    }

    async fn count(&self, _filter: AuditFilter) -> Result<usize, AuditError> {
        Ok(0)
    }
}

/// Writes to a primary backend and mirrors successful writes to a second one.
///
/// Reads come from the primary only. A failing mirror is logged, not raised.
pub struct TeeStorage {
    primary: Arc<dyn AuditStorage>,
    mirror: Arc<dyn AuditStorage>,
}

impl TeeStorage {
    pub fn new(primary: Arc<dyn AuditStorage>, mirror: Arc<dyn AuditStorage>) -> Self {
        Self { primary, mirror }
    }
}

#[async_trait]
impl AuditStorage for TeeStorage {
    async fn append(&self, event: AuditEvent) -> Result<AuditEvent, AuditError> {
        let stored = self.primary.append(event).await?;
        if let Err(e) = self.mirror.append(stored.clone()).await {
            tracing::warn!(error = %e, request_id = %stored.request_id, "Audit mirror write failed");
        }
        Ok(stored)
    }

    async fn query(&self, filter: AuditFilter) -> Result<Vec<AuditEvent>, AuditError> {
        self.primary.query(filter).await
    }

    async fn count(&self, filter: AuditFilter) -> Result<usize, AuditError> {
        self.primary.count(filter).await
    }
}
