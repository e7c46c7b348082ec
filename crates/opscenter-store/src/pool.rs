//! Connection pool setup.

use crate::error::StoreError;
use opscenter_core::DatabaseConfig;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::time::Duration;

/// Connect to Postgres, retrying a fixed number of times on a fixed interval.
///
/// Each attempt must both open the pool and answer `SELECT 1`. The last
/// error is returned once `connect_retries` attempts have failed.
pub async fn connect_with_retry(cfg: &DatabaseConfig) -> Result<PgPool, StoreError> {
    let attempts = cfg.connect_retries.max(1);
    let interval = Duration::from_secs(cfg.connect_retry_interval_secs);

    let mut attempt = 1;
    loop {
        match try_connect(cfg).await {
            Ok(pool) => {
                tracing::info!(attempt, "Database is ready");
                return Ok(pool);
            }
            Err(source) if attempt >= attempts => {
                tracing::error!(attempts, error = %source, "Database not ready, giving up");
                return Err(StoreError::Unavailable { attempts, source });
            }
            Err(e) => {
                tracing::warn!(
                    attempt,
                    max_attempts = attempts,
                    error = %e,
                    "Database not ready, retrying"
                );
                tokio::time::sleep(interval).await;
                attempt += 1;
            }
        }
    }
}

async fn try_connect(cfg: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(cfg.max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .connect(&cfg.url)
        .await?;
    sqlx::query("SELECT 1").execute(&pool).await?;
    Ok(pool)
}

/// Apply the embedded migrations (creates `doc_asset` and `audit_event`).
pub async fn run_migrations(pool: &PgPool) -> Result<(), StoreError> {
    tracing::info!("Running database migrations");
    sqlx::migrate!("./migrations").run(pool).await?;
    tracing::info!("Database migrations completed");
    Ok(())
}
