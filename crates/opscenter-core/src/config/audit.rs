//! Audit trail settings.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Mirror every audit event to stdout as a JSON line.
    #[serde(default)]
    pub stdout: bool,
}
