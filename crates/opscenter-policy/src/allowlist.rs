//! Read-only tool allow-list for the finance bridge.

use crate::error::PolicyViolation;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Operations the finance bridge may be asked to run. All of them only read.
pub const READ_ONLY_FINANCE_TOOLS: &[&str] = &[
    "list-accounts",
    "list-contacts",
    "list-invoices",
    "list-items",
    "list-payments",
    "list-bank-transactions",
    "list-credit-notes",
    "list-quotes",
    "list-tax-rates",
    "list-organisation-details",
    "list-profit-and-loss",
    "list-report-balance-sheet",
    "list-trial-balance",
    "list-aged-receivables-by-contact",
    "list-aged-payables-by-contact",
];

/// Outcome of an allow-list check, as recorded in the audit trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolDecision {
    pub allowed: bool,
    pub tool: String,
}

/// Fixed set of permitted tool names. Matching is exact.
#[derive(Debug, Clone)]
pub struct ToolAllowList {
    tools: BTreeSet<String>,
}

impl Default for ToolAllowList {
    fn default() -> Self {
        Self::read_only_finance()
    }
}

impl ToolAllowList {
    /// The read-only finance operations.
    pub fn read_only_finance() -> Self {
        Self::from_names(READ_ONLY_FINANCE_TOOLS.iter().copied())
    }

    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tools: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, tool: &str) -> bool {
        self.tools.contains(tool)
    }

    /// Decide on a tool name without raising.
    pub fn decide(&self, tool: &str) -> ToolDecision {
        ToolDecision {
            allowed: self.contains(tool),
            tool: tool.to_string(),
        }
    }

    /// Check a tool name, returning the decision or the violation.
    pub fn check(&self, tool: &str) -> Result<ToolDecision, PolicyViolation> {
        let decision = self.decide(tool);
        if decision.allowed {
            Ok(decision)
        } else {
            tracing::warn!(tool, "Rejected tool outside allow-list");
            Err(PolicyViolation::ToolNotAllowed {
                tool: tool.to_string(),
            })
        }
    }

    /// Allowed names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tools.iter().map(String::as_str)
    }
}
