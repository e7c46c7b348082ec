//! Per-request context.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use opscenter_audit::{AuditEventBuilder, AuditLogger, MAX_IDENTITY_LEN};
use opscenter_core::{AuditModule, generate_request_id};
use std::convert::Infallible;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const SESSION_ID_HEADER: &str = "x-session-id";

/// Request identity: a fresh request id plus optional caller headers.
///
/// Extraction never fails, so every request gets an id and an audit event.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: String,
    pub user_id: Option<String>,
    pub session_id: Option<String>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self {
            request_id: generate_request_id(),
            user_id: None,
            session_id: None,
        }
    }

    /// Start this request's audit event.
    pub fn begin(&self, audit: &AuditLogger, module: AuditModule) -> AuditEventBuilder {
        let mut event = audit.begin(module, &self.request_id);
        if let Some(user) = &self.user_id {
            event = event.user_id(user.clone());
        }
        if let Some(session) = &self.session_id {
            event = event.session_id(session.clone());
        }
        event
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Trimmed header value, cut to the width the audit trail stores.
fn header(parts: &Parts, name: &str) -> Option<String> {
    parts
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(|v| v.chars().take(MAX_IDENTITY_LEN).collect())
}

impl<S: Send + Sync> FromRequestParts<S> for RequestContext {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self {
            request_id: generate_request_id(),
            user_id: header(parts, USER_ID_HEADER),
            session_id: header(parts, SESSION_ID_HEADER),
        })
    }
}
