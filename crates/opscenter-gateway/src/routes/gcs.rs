//! `GET /gcs/smoke`: bucket write/verify/delete probe.

use crate::context::RequestContext;
use crate::error::{ApiError, RequestFailure};
use crate::state::AppState;
use axum::Json;
use axum::extract::State;
use opscenter_audit::AuditEventBuilder;
use opscenter_core::AuditModule;
use opscenter_core::api::GcsSmokeResponse;
use serde_json::json;

pub async fn smoke(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> Result<Json<GcsSmokeResponse>, RequestFailure> {
    let mut event = ctx.begin(state.audit(), AuditModule::Admin);
    let outcome = run_smoke(&state, &ctx, &mut event).await;
    state.finish(event, outcome).await.map(Json)
}

async fn run_smoke(
    state: &AppState,
    ctx: &RequestContext,
    event: &mut AuditEventBuilder,
) -> Result<GcsSmokeResponse, ApiError> {
    let (store, bucket) = state
        .smoke_bucket()
        .and_then(|store| store.bucket().map(|bucket| (store, bucket.to_string())))
        .ok_or_else(|| {
            ApiError::internal("GCS_BUCKET_NAME not configured")
                .with_detail("GCS_BUCKET_NAME environment variable is required")
        })?;
    event.set_sources(json!({ "bucket": bucket }));

    let object = store
        .smoke_check(&ctx.request_id)
        .await
        .map_err(|e| ApiError::internal("GCS smoke test failed").with_detail(e))?;
    event.set_sources(json!({ "bucket": bucket, "object": object }));

    Ok(GcsSmokeResponse {
        ok: true,
        bucket,
        object,
        request_id: ctx.request_id.clone(),
    })
}
