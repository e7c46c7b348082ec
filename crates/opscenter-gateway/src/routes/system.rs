//! Liveness and service info.

use crate::context::RequestContext;
use crate::error::RequestFailure;
use crate::state::AppState;
use axum::Json;
use axum::extract::State;
use opscenter_core::AuditModule;
use opscenter_core::api::{HealthResponse, RootResponse};
use serde_json::json;

pub const SERVICE_NAME: &str = "api-gateway";

/// `GET /health`
///
/// Always answers 200; a database outage only degrades the status.
pub async fn health(State(state): State<AppState>, ctx: RequestContext) -> Json<HealthResponse> {
    let mut event = ctx.begin(state.audit(), AuditModule::System);

    let database = match state.docs().ping().await {
        Ok(()) => "connected",
        Err(e) => {
            tracing::warn!(request_id = %ctx.request_id, error = %e, "Health check database ping failed");
            "disconnected"
        }
    };
    let status = if database == "connected" { "ok" } else { "degraded" };
    event.set_sources(json!({ "database": database }));
    state.record_lenient(event).await;

    Json(HealthResponse {
        request_id: ctx.request_id,
        status: status.to_string(),
        service: SERVICE_NAME.to_string(),
        database: database.to_string(),
    })
}

/// `GET /`
pub async fn root(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> Result<Json<RootResponse>, RequestFailure> {
    let event = ctx.begin(state.audit(), AuditModule::System);
    let outcome = Ok(RootResponse {
        request_id: ctx.request_id.clone(),
        message: "SME Ops-Center API Gateway".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    });
    state.finish(event, outcome).await.map(Json)
}
