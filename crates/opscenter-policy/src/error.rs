//! Policy violation type.

use thiserror::Error;

/// A request refused by a trust rule.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyViolation {
    /// The tool is not on the allow-list.
    #[error("Tool '{tool}' is not in the read-only allow-list")]
    ToolNotAllowed { tool: String },
}
