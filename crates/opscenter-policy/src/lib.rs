//! Trust rules for the Ops-Center gateway.
//!
//! Two single-purpose checks guard the gateway's outbound paths:
//!
//! - [`ToolAllowList`]: only read-only finance operations may be forwarded to
//!   the accounting bridge. Anything else is rejected before a request leaves
//!   the process.
//! - [`CitationGate`]: "no source, no answer". A document answer without at
//!   least one citation is replaced by a fixed refusal.
//!
//! Both produce a serializable decision that the gateway records in the
//! request's audit event (`decision_json`).

pub mod allowlist;
pub mod citations;
pub mod error;

pub use allowlist::{READ_ONLY_FINANCE_TOOLS, ToolAllowList, ToolDecision};
pub use citations::{CitationGate, GateDecision, GatedAnswer, REFUSAL_ANSWER};
pub use error::PolicyViolation;
