//! `POST /finance/query`: allow-listed, read-only calls to the accounting bridge.

use crate::context::RequestContext;
use crate::error::{ApiError, RequestFailure};
use crate::state::AppState;
use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use opscenter_audit::AuditEventBuilder;
use opscenter_bridge::{BridgeError, CallToolParams};
use opscenter_core::api::{FinanceQueryRequest, FinanceQueryResponse};
use opscenter_core::{AuditModule, hash_prompt};
use serde_json::json;

pub async fn query(
    State(state): State<AppState>,
    ctx: RequestContext,
    body: Result<Json<FinanceQueryRequest>, JsonRejection>,
) -> Result<Json<FinanceQueryResponse>, RequestFailure> {
    let mut event = ctx.begin(state.audit(), AuditModule::Finance);
    let outcome = call_tool(&state, &ctx, body, &mut event).await;
    state.finish(event, outcome).await.map(Json)
}

async fn call_tool(
    state: &AppState,
    ctx: &RequestContext,
    body: Result<Json<FinanceQueryRequest>, JsonRejection>,
    event: &mut AuditEventBuilder,
) -> Result<FinanceQueryResponse, ApiError> {
    let Json(request) =
        body.map_err(|e| ApiError::bad_request("Invalid request body").with_detail(e.body_text()))?;
    event.set_prompt_hash(hash_prompt(&request.query));
    event.set_tool_calls(json!([]));

    // Nothing leaves the process for a tool outside the allow-list.
    event.set_decision(json!(state.allow_list().decide(&request.tool)));
    state
        .allow_list()
        .check(&request.tool)
        .map_err(|e| ApiError::forbidden("Tool not allowed").with_detail(e))?;

    let params = CallToolParams::with_query(&request.tool, request.arguments, &request.query)
        .map_err(|e| ApiError::bad_request("Invalid tool arguments").with_detail(e))?;
    event.set_tool_calls(json!([params]));

    let result = state.bridge().call_tool(params).await.map_err(|e| {
        let error = match e {
            BridgeError::InvalidArguments => ApiError::bad_request("Invalid tool arguments"),
            _ => ApiError::upstream("Finance bridge call failed"),
        };
        error.with_detail(e)
    })?;

    Ok(FinanceQueryResponse {
        request_id: ctx.request_id.clone(),
        tool: request.tool,
        content: result.content,
    })
}
