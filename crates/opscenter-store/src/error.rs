//! Error types for the store crate.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The database never became reachable during startup.
    #[error("database not ready after {attempts} attempts: {source}")]
    Unavailable {
        attempts: u32,
        #[source]
        source: sqlx::Error,
    },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A row held a value the model cannot represent.
    #[error("corrupt row: {0}")]
    Corrupt(String),

    /// In-memory repository lock was poisoned.
    #[error("repository lock poisoned")]
    Poisoned,
}
