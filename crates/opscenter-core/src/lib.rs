//! Shared types for the Ops-Center gateway.
//!
//! - [`config`]: gateway configuration (TOML file + environment overrides)
//! - [`model`]: persisted entities (`DocAsset`, audit enums)
//! - [`api`]: JSON request/response bodies exchanged with the UI shell

pub mod api;
pub mod config;
pub mod model;

use sha2::{Digest, Sha256};
use std::fmt::Write;

pub use config::{
    AuditConfig, BridgeConfig, ConfigError, DatabaseConfig, GatewayConfig, SearchConfig,
    ServerConfig, StorageBackend, StorageConfig,
};
pub use model::{AuditModule, AuditStatus, DocAsset, IndexedStatus, NewDocAsset, ParseEnumError};

/// Length of the hex prefix kept from a prompt's SHA-256 digest.
pub const PROMPT_HASH_LEN: usize = 16;

/// Generate a unique request ID for tracing.
pub fn generate_request_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Hash a prompt for the audit trail without storing the prompt itself.
pub fn hash_prompt(prompt: &str) -> String {
    let digest = Sha256::digest(prompt.as_bytes());
    let mut hex = String::with_capacity(digest.len() * 2);
    for byte in digest {
        let _ = write!(hex, "{:02x}", byte);
    }
    hex.truncate(PROMPT_HASH_LEN);
    hex
}
