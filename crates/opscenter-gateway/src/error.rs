//! HTTP error mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use opscenter_core::api::ErrorResponse;
use std::fmt;

/// Error category, which decides the response status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    BadRequest,
    Forbidden,
    NotFound,
    /// An outbound dependency (the finance bridge) failed.
    Upstream,
    Internal,
}

/// A handler failure: short message plus optional detail.
#[derive(Debug, Clone)]
pub struct ApiError {
    pub kind: ErrorKind,
    pub error: String,
    pub detail: Option<String>,
}

impl ApiError {
    fn new(kind: ErrorKind, error: impl Into<String>) -> Self {
        Self {
            kind,
            error: error.into(),
            detail: None,
        }
    }

    pub fn bad_request(error: impl Into<String>) -> Self {
        Self::new(ErrorKind::BadRequest, error)
    }

    pub fn forbidden(error: impl Into<String>) -> Self {
        Self::new(ErrorKind::Forbidden, error)
    }

    pub fn not_found(error: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, error)
    }

    pub fn upstream(error: impl Into<String>) -> Self {
        Self::new(ErrorKind::Upstream, error)
    }

    pub fn internal(error: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, error)
    }

    pub fn with_detail(mut self, detail: impl ToString) -> Self {
        self.detail = Some(detail.to_string());
        self
    }

    pub fn status(&self) -> StatusCode {
        match self.kind {
            ErrorKind::BadRequest => StatusCode::BAD_REQUEST,
            ErrorKind::Forbidden => StatusCode::FORBIDDEN,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Upstream => StatusCode::BAD_GATEWAY,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.detail {
            Some(detail) => write!(f, "{}: {}", self.error, detail),
            None => f.write_str(&self.error),
        }
    }
}

impl std::error::Error for ApiError {}

/// An [`ApiError`] bound to the request it failed, ready to render.
#[derive(Debug)]
pub struct RequestFailure {
    pub request_id: String,
    pub error: ApiError,
}

impl RequestFailure {
    pub fn new(request_id: impl Into<String>, error: ApiError) -> Self {
        Self {
            request_id: request_id.into(),
            error,
        }
    }
}

impl IntoResponse for RequestFailure {
    fn into_response(self) -> Response {
        let status = self.error.status();
        let body = ErrorResponse {
            request_id: self.request_id,
            error: self.error.error,
            detail: self.error.detail,
        };
        (status, Json(body)).into_response()
    }
}
