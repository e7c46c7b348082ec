//! `GET /audit/events`: read back the audit trail, newest first.

use crate::context::RequestContext;
use crate::error::{ApiError, RequestFailure};
use crate::state::AppState;
use axum::Json;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use opscenter_audit::logger::DEFAULT_QUERY_LIMIT;
use opscenter_audit::{AuditError, AuditEvent, AuditEventBuilder, AuditFilter};
use opscenter_core::{AuditModule, AuditStatus};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Largest page a single lookup may request.
pub const MAX_QUERY_LIMIT: usize = 1000;

#[derive(Debug, Default, Deserialize)]
pub struct AuditEventsQuery {
    pub request_id: Option<String>,
    pub module: Option<String>,
    pub status: Option<String>,
    pub user_id: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuditEventsResponse {
    pub request_id: String,
    /// Matching events before paging.
    pub total: usize,
    pub events: Vec<AuditEvent>,
}

pub async fn events(
    State(state): State<AppState>,
    ctx: RequestContext,
    query: Result<Query<AuditEventsQuery>, QueryRejection>,
) -> Result<Json<AuditEventsResponse>, RequestFailure> {
    let mut event = ctx.begin(state.audit(), AuditModule::Admin);
    let outcome = lookup(&state, &ctx, query, &mut event).await;
    state.finish(event, outcome).await.map(Json)
}

async fn lookup(
    state: &AppState,
    ctx: &RequestContext,
    query: Result<Query<AuditEventsQuery>, QueryRejection>,
    event: &mut AuditEventBuilder,
) -> Result<AuditEventsResponse, ApiError> {
    let Query(params) = query
        .map_err(|e| ApiError::bad_request("Invalid query parameters").with_detail(e.body_text()))?;
    let filter = to_filter(params)?;
    event.set_sources(json!({
        "request_id": filter.request_id,
        "module": filter.module.map(|m| m.as_str()),
        "status": filter.status.map(|s| s.as_str()),
        "limit": filter.limit,
        "offset": filter.offset,
    }));

    let failed = |e: AuditError| ApiError::internal("Failed to query audit events").with_detail(e);
    let total = state.audit().count(filter.clone()).await.map_err(failed)?;
    let events = state.audit().query(filter).await.map_err(failed)?;

    Ok(AuditEventsResponse {
        request_id: ctx.request_id.clone(),
        total,
        events,
    })
}

fn to_filter(params: AuditEventsQuery) -> Result<AuditFilter, ApiError> {
    let module = params
        .module
        .as_deref()
        .map(str::parse::<AuditModule>)
        .transpose()
        .map_err(|e| ApiError::bad_request("Invalid module").with_detail(e))?;
    let status = params
        .status
        .as_deref()
        .map(str::parse::<AuditStatus>)
        .transpose()
        .map_err(|e| ApiError::bad_request("Invalid status").with_detail(e))?;

    if let Some(offset) = params.offset {
        i64::try_from(offset).map_err(|_| {
            ApiError::bad_request("Invalid offset").with_detail(format!("offset {offset} is out of range"))
        })?;
    }

    Ok(AuditFilter {
        request_id: params.request_id,
        module,
        status,
        user_id: params.user_id,
        limit: Some(params.limit.unwrap_or(DEFAULT_QUERY_LIMIT).min(MAX_QUERY_LIMIT)),
        offset: params.offset,
        ..Default::default()
    })
}
