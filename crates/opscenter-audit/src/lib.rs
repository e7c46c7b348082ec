//! # opscenter-audit
//!
//! Append-only audit trail for the Ops-Center gateway.
//!
//! Every inbound request produces exactly one [`AuditEvent`], correlated by
//! the request's generated `request_id`. Events are never updated or deleted;
//! the [`AuditStorage`] trait only exposes append and read operations.
//!
//! ## Event fields
//!
//! | Field | Meaning |
//! |-------|---------|
//! | `module` | which part of the gateway handled the request |
//! | `request_id` | correlation id returned to the caller |
//! | `user_id` / `session_id` | caller identity, when the UI supplies it |
//! | `prompt_hash` | truncated SHA-256 of a user prompt |
//! | `sources_json` | documents or citations the request touched |
//! | `tool_calls_json` | outbound tool calls |
//! | `decision_json` | trust-rule decisions (gate, allow-list) |
//! | `status` / `error` | outcome |
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use opscenter_audit::{AuditLogger, MemoryStorage};
//! use opscenter_core::{AuditModule, AuditStatus};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let logger = AuditLogger::new(Arc::new(MemoryStorage::new()));
//!
//! let event = logger
//!     .begin(AuditModule::Docs, "9b2c6f1e-0000-4000-8000-000000000000")
//!     .sources(serde_json::json!({"doc_count": 3}))
//!     .status(AuditStatus::Success)
//!     .build();
//! logger.record(event).await?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod event;
pub mod logger;
pub mod storage;

pub use error::AuditError;
pub use event::{AuditEvent, AuditEventBuilder, MAX_IDENTITY_LEN};
pub use logger::{AuditFilter, AuditLogger};
pub use storage::{AuditStorage, ConsoleStorage, MemoryStorage, TeeStorage};
