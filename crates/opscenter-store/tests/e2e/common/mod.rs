//! Shared infrastructure for the store end-to-end tests.
//!
//! - Docker container management for PostgreSQL
//! - Fixtures for documents and audit events

use opscenter_audit::{AuditEvent, AuditStorage};
use opscenter_core::{AuditModule, AuditStatus, DatabaseConfig, NewDocAsset};
use opscenter_store::{PgAuditStorage, PgDocRepository, connect_with_retry, run_migrations};
use sqlx::PgPool;
use std::process::Command;

// =============================================================================
// DOCKER CONTAINER CONFIGURATION
// =============================================================================

pub const CONTAINER_NAME: &str = "opscenter_test_postgres";
pub const POSTGRES_PORT: u16 = 5434;
pub const POSTGRES_PASSWORD: &str = "opscenter_test_password";
pub const DATABASE_NAME: &str = "smeops_test";

pub fn database_config() -> DatabaseConfig {
    DatabaseConfig {
        url: format!(
            "postgres://postgres:{}@localhost:{}/{}",
            POSTGRES_PASSWORD, POSTGRES_PORT, DATABASE_NAME
        ),
        max_connections: 2,
        connect_retries: 30,
        connect_retry_interval_secs: 1,
    }
}

// =============================================================================
// DOCKER CONTAINER MANAGEMENT
// =============================================================================

/// Start a PostgreSQL container for testing
pub fn start_postgres_container() -> Result<(), String> {
    stop_postgres_container();

    let status = Command::new("docker")
        .args([
            "run",
            "-d",
            "--name",
            CONTAINER_NAME,
            "-e",
            &format!("POSTGRES_PASSWORD={}", POSTGRES_PASSWORD),
            "-e",
            &format!("POSTGRES_DB={}", DATABASE_NAME),
            "-p",
            &format!("{}:5432", POSTGRES_PORT),
            "postgres:16-alpine",
        ])
        .status()
        .map_err(|e| format!("Failed to start container: {}", e))?;

    if !status.success() {
        return Err("Failed to start PostgreSQL container".to_string());
    }

    Ok(())
}

/// Stop and remove the PostgreSQL container
pub fn stop_postgres_container() {
    let _ = Command::new("docker")
        .args(["rm", "-f", CONTAINER_NAME])
        .output();
}

// =============================================================================
// TEST CONTEXT
// =============================================================================

pub struct TestContext {
    pub pool: PgPool,
}

impl TestContext {
    pub async fn setup() -> Result<Self, String> {
        start_postgres_container()?;
        let pool = connect_with_retry(&database_config())
            .await
            .map_err(|e| e.to_string())?;
        run_migrations(&pool).await.map_err(|e| e.to_string())?;
        println!("✅ Database migrated");
        Ok(Self { pool })
    }

    pub fn docs(&self) -> PgDocRepository {
        PgDocRepository::new(self.pool.clone())
    }

    pub fn audit(&self) -> PgAuditStorage {
        PgAuditStorage::new(self.pool.clone())
    }
}

impl Drop for TestContext {
    fn drop(&mut self) {
        stop_postgres_container();
        println!("🧹 Cleaned up PostgreSQL container");
    }
}

// =============================================================================
// FIXTURES
// =============================================================================

pub fn new_doc(filename: &str, storage_uri: &str) -> NewDocAsset {
    NewDocAsset {
        filename: filename.to_string(),
        storage_uri: storage_uri.to_string(),
    }
}

/// Append a successful event and return its stored form.
pub async fn append_event(
    storage: &PgAuditStorage,
    module: AuditModule,
    request_id: &str,
) -> AuditEvent {
    storage
        .append(
            AuditEvent::builder(module, request_id)
                .status(AuditStatus::Success)
                .build(),
        )
        .await
        .expect("audit append should succeed")
}
