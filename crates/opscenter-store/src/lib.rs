//! Postgres persistence for the Ops-Center gateway.
//!
//! - [`pool`]: connecting (with the startup retry loop) and migrations
//! - [`docs`]: the `doc_asset` repository
//! - [`audit`]: the `audit_event` table as an [`opscenter_audit::AuditStorage`]
//!
//! [`MemoryDocRepository`] mirrors the Postgres repository in-process for
//! tests and local runs without a database.

pub mod audit;
pub mod docs;
pub mod error;
pub mod pool;

pub use audit::PgAuditStorage;
pub use docs::{DocRepository, MemoryDocRepository, PgDocRepository};
pub use error::StoreError;
pub use pool::{connect_with_retry, run_migrations};
