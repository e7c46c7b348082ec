//! Citation gate: only answer when at least one source backs the answer.

use opscenter_core::api::Citation;
use serde::{Deserialize, Serialize};

/// Answer returned when no citation supports a response.
pub const REFUSAL_ANSWER: &str = "Information not found in internal records.";

/// Gate decision, as recorded in the audit trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateDecision {
    pub gate: String,
    pub answered: bool,
}

/// Answer after the gate has been applied.
#[derive(Debug, Clone, PartialEq)]
pub struct GatedAnswer {
    pub answer: String,
    pub citations: Vec<Citation>,
    pub decision: GateDecision,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CitationGate;

impl CitationGate {
    pub const NAME: &'static str = "citations";

    /// Pass a candidate answer through the gate.
    pub fn apply(&self, candidate: String, citations: Vec<Citation>) -> GatedAnswer {
        let answered = !citations.is_empty();
        GatedAnswer {
            answer: if answered {
                candidate
            } else {
                REFUSAL_ANSWER.to_string()
            },
            citations,
            decision: GateDecision {
                gate: Self::NAME.to_string(),
                answered,
            },
        }
    }
}
