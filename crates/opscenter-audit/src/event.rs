//! Audit event type.
//!
//! One event is written per inbound request. Events are immutable once
//! recorded.

use chrono::{DateTime, Utc};
use opscenter_core::{AuditModule, AuditStatus};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An audit event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Row id, assigned by storage on append.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,

    /// When the event occurred.
    pub ts: DateTime<Utc>,

    /// Gateway module that handled the request.
    pub module: AuditModule,

    /// Generated request identifier returned to the caller.
    pub request_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,

    /// Truncated SHA-256 of the user prompt, if the request carried one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_hash: Option<String>,

    /// Retrieved sources / touched documents.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources_json: Option<Value>,

    /// Outbound tool calls.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls_json: Option<Value>,

    /// Trust-rule decisions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decision_json: Option<Value>,

    pub status: AuditStatus,

    /// Error message (if status is failure).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AuditEvent {
    /// Create a pending event for a request.
    pub fn new(module: AuditModule, request_id: impl Into<String>) -> Self {
        Self {
            id: None,
            ts: Utc::now(),
            module,
            request_id: request_id.into(),
            user_id: None,
            session_id: None,
            prompt_hash: None,
            sources_json: None,
            tool_calls_json: None,
            decision_json: None,
            status: AuditStatus::Pending,
            error: None,
        }
    }

    /// Create a builder for an audit event.
    pub fn builder(module: AuditModule, request_id: impl Into<String>) -> AuditEventBuilder {
        AuditEventBuilder::new(module, request_id)
    }

    /// Format the event as a human-readable log line.
    ///
    /// Format: `[timestamp] STATUS module=... request_id=... [error=...]`
    pub fn to_log_line(&self) -> String {
        let mut line = format!(
            "[{}] {} module={} request_id={}",
            self.ts.format("%Y-%m-%dT%H:%M:%S%.3fZ"),
            self.status.as_str().to_ascii_uppercase(),
            self.module,
            self.request_id,
        );

        if let Some(ref user) = self.user_id {
            line.push_str(&format!(" user={}", user));
        }

        if let Some(ref hash) = self.prompt_hash {
            line.push_str(&format!(" prompt_hash={}", hash));
        }

        if let Some(ref error) = self.error {
            line.push_str(&format!(" error=\"{}\"", error.replace('"', "'")));
        }

        line
    }
}

/// Widest `user_id` / `session_id` the audit table stores, in characters.
pub const MAX_IDENTITY_LEN: usize = 128;

/// Builder for creating audit events.
#[derive(Debug, Clone)]
pub struct AuditEventBuilder {
    event: AuditEvent,
}

impl AuditEventBuilder {
    pub fn new(module: AuditModule, request_id: impl Into<String>) -> Self {
        Self {
            event: AuditEvent::new(module, request_id),
        }
    }

    pub fn request_id(&self) -> &str {
        &self.event.request_id
    }

    pub fn user_id(mut self, user_id: impl Into<String>) -> Self {
        self.event.user_id = Some(user_id.into());
        self
    }

    pub fn session_id(mut self, session_id: impl Into<String>) -> Self {
        self.event.session_id = Some(session_id.into());
        self
    }

    pub fn prompt_hash(mut self, hash: impl Into<String>) -> Self {
        self.event.prompt_hash = Some(hash.into());
        self
    }

    pub fn sources(mut self, sources: Value) -> Self {
        self.event.sources_json = Some(sources);
        self
    }

    pub fn tool_calls(mut self, calls: Value) -> Self {
        self.event.tool_calls_json = Some(calls);
        self
    }

    pub fn decision(mut self, decision: Value) -> Self {
        self.event.decision_json = Some(decision);
        self
    }

    pub fn status(mut self, status: AuditStatus) -> Self {
        self.event.status = status;
        self
    }

    /// Mark the event as failed with the given error.
    pub fn failure(mut self, error: impl Into<String>) -> Self {
        self.event.status = AuditStatus::Failure;
        self.event.error = Some(error.into());
        self
    }

    /// Mark the event successful unless a failure was already recorded.
    pub fn success(mut self) -> Self {
        if self.event.status != AuditStatus::Failure {
            self.event.status = AuditStatus::Success;
        }
        self
    }

    /// In-place setters, for handlers that fill the event as they go.
    pub fn set_failure(&mut self, error: impl Into<String>) {
        self.event.status = AuditStatus::Failure;
        self.event.error = Some(error.into());
    }

    pub fn set_prompt_hash(&mut self, hash: impl Into<String>) {
        self.event.prompt_hash = Some(hash.into());
    }

    pub fn set_sources(&mut self, sources: Value) {
        self.event.sources_json = Some(sources);
    }

    pub fn set_tool_calls(&mut self, calls: Value) {
        self.event.tool_calls_json = Some(calls);
    }

    pub fn set_decision(&mut self, decision: Value) {
        self.event.decision_json = Some(decision);
    }

    /// Build the audit event.
    pub fn build(self) -> AuditEvent {
        self.event
    }
}
