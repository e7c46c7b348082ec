//! Document endpoints: upload, status, query, indexing and soft delete.

use crate::context::RequestContext;
use crate::error::{ApiError, RequestFailure};
use crate::state::AppState;
use axum::Json;
use axum::extract::multipart::{Multipart, MultipartRejection};
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use bytes::Bytes;
use opscenter_audit::AuditEventBuilder;
use opscenter_core::api::{
    DocDeleteResponse, DocIndexRequest, DocIndexResponse, DocQueryRequest, DocQueryResponse,
    DocStatusResponse, DocUploadResponse, IndexDetail,
};
use opscenter_core::{AuditModule, IndexedStatus, NewDocAsset, hash_prompt};
use serde_json::json;

const UPLOAD_FIELD: &str = "file";
const UNNAMED_FILE: &str = "unnamed";

struct UploadedFile {
    filename: String,
    content_type: Option<String>,
    content: Bytes,
}

/// `POST /docs/upload`
pub async fn upload(
    State(state): State<AppState>,
    ctx: RequestContext,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<DocUploadResponse>, RequestFailure> {
    let mut event = ctx.begin(state.audit(), AuditModule::Docs);
    let outcome = store_upload(&state, &ctx, multipart, &mut event).await;
    state.finish(event, outcome).await.map(Json)
}

async fn store_upload(
    state: &AppState,
    ctx: &RequestContext,
    multipart: Result<Multipart, MultipartRejection>,
    event: &mut AuditEventBuilder,
) -> Result<DocUploadResponse, ApiError> {
    let multipart = multipart
        .map_err(|e| ApiError::bad_request("Invalid multipart body").with_detail(e.body_text()))?;
    let file = read_file_part(multipart)
        .await?
        .ok_or_else(|| ApiError::bad_request("No file provided"))?;
    event.set_sources(json!({ "filename": file.filename }));

    let existing = state
        .docs()
        .find_active_by_filename(&file.filename)
        .await
        .map_err(|e| ApiError::internal("Upload failed").with_detail(e))?;
    let duplicate_warning = existing.map(|doc| {
        tracing::warn!(
            request_id = %ctx.request_id,
            filename = %file.filename,
            existing_doc_id = doc.id,
            "Duplicate filename detected"
        );
        format!(
            "A document with filename '{}' already exists (ID: {}). This upload creates a new record.",
            file.filename, doc.id
        )
    });

    let storage_uri = state
        .blobs()
        .save_upload(
            &ctx.request_id,
            &file.filename,
            file.content_type.as_deref(),
            file.content,
        )
        .await
        .map_err(|e| ApiError::internal("Upload failed").with_detail(e))?;

    let doc = state
        .docs()
        .insert(NewDocAsset {
            filename: file.filename.clone(),
            storage_uri,
        })
        .await
        .map_err(|e| ApiError::internal("Upload failed").with_detail(e))?;
    event.set_sources(json!({ "filename": doc.filename, "doc_id": doc.id }));

    Ok(DocUploadResponse {
        request_id: ctx.request_id.clone(),
        doc_id: doc.id,
        filename: doc.filename,
        message: "Document uploaded successfully".to_string(),
        duplicate_warning,
    })
}

/// First part named `file`, if any.
async fn read_file_part(mut multipart: Multipart) -> Result<Option<UploadedFile>, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request("Invalid multipart body").with_detail(e.body_text()))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let filename = field
            .file_name()
            .filter(|name| !name.is_empty())
            .unwrap_or(UNNAMED_FILE)
            .to_string();
        let content_type = field.content_type().map(str::to_string);
        let content = field
            .bytes()
            .await
            .map_err(|e| ApiError::bad_request("Invalid multipart body").with_detail(e.body_text()))?;
        return Ok(Some(UploadedFile {
            filename,
            content_type,
            content,
        }));
    }
    Ok(None)
}

/// `GET /docs/status`
pub async fn status(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> Result<Json<DocStatusResponse>, RequestFailure> {
    let mut event = ctx.begin(state.audit(), AuditModule::Docs);
    let outcome = match state.docs().list_active().await {
        Ok(documents) => {
            event.set_sources(json!({ "doc_count": documents.len() }));
            Ok(DocStatusResponse {
                request_id: ctx.request_id.clone(),
                documents,
            })
        }
        Err(e) => Err(ApiError::internal("Failed to retrieve document status").with_detail(e)),
    };
    state.finish(event, outcome).await.map(Json)
}

/// `POST /docs/query`
pub async fn query(
    State(state): State<AppState>,
    ctx: RequestContext,
    body: Result<Json<DocQueryRequest>, JsonRejection>,
) -> Result<Json<DocQueryResponse>, RequestFailure> {
    let mut event = ctx.begin(state.audit(), AuditModule::Docs);
    let outcome = answer_query(&state, &ctx, body, &mut event).await;
    state.finish(event, outcome).await.map(Json)
}

async fn answer_query(
    state: &AppState,
    ctx: &RequestContext,
    body: Result<Json<DocQueryRequest>, JsonRejection>,
    event: &mut AuditEventBuilder,
) -> Result<DocQueryResponse, ApiError> {
    let Json(request) =
        body.map_err(|e| ApiError::bad_request("Invalid request body").with_detail(e.body_text()))?;
    event.set_prompt_hash(hash_prompt(&request.query));
    if request.query.trim().is_empty() {
        return Err(ApiError::bad_request("Query must not be empty"));
    }

    let candidate = state
        .search()
        .answer(&request.query)
        .await
        .map_err(|e| ApiError::internal("Query failed").with_detail(e))?;
    let gated = state
        .citation_gate()
        .apply(candidate.answer, candidate.citations);

    event.set_sources(json!({
        "query": request.query,
        "citations_count": gated.citations.len(),
    }));
    event.set_decision(json!(gated.decision));

    Ok(DocQueryResponse {
        request_id: ctx.request_id.clone(),
        answer: gated.answer,
        citations: gated.citations,
    })
}

/// `POST /docs/index`
///
/// The body is optional; an empty body indexes every eligible document.
pub async fn index(
    State(state): State<AppState>,
    ctx: RequestContext,
    body: Bytes,
) -> Result<Json<DocIndexResponse>, RequestFailure> {
    let mut event = ctx.begin(state.audit(), AuditModule::Docs);
    let outcome = run_index(&state, &ctx, &body, &mut event).await;
    state.finish(event, outcome).await.map(Json)
}

async fn run_index(
    state: &AppState,
    ctx: &RequestContext,
    body: &[u8],
    event: &mut AuditEventBuilder,
) -> Result<DocIndexResponse, ApiError> {
    let request: DocIndexRequest = if body.iter().all(u8::is_ascii_whitespace) {
        DocIndexRequest::default()
    } else {
        serde_json::from_slice(body)
            .map_err(|e| ApiError::bad_request("Invalid request body").with_detail(e))?
    };
    let internal = |e: opscenter_store::StoreError| {
        ApiError::internal("Indexing failed").with_detail(e)
    };

    if let Some(doc_id) = request.doc_id {
        if state.docs().find_active(doc_id).await.map_err(internal)?.is_none() {
            event.set_sources(json!({ "doc_id": doc_id, "triggered": 0 }));
            return Err(ApiError::not_found("Document not found")
                .with_detail(format!("No document with ID {}", doc_id)));
        }
    }

    let eligible = state
        .docs()
        .pending_in_gcs(request.doc_id)
        .await
        .map_err(internal)?;

    let mut details = Vec::with_capacity(eligible.len());
    for doc in &eligible {
        state
            .docs()
            .set_indexed_status(doc.id, IndexedStatus::Indexing, None)
            .await
            .map_err(internal)?;

        let detail = match state.importer().import(&doc.storage_uri, &ctx.request_id).await {
            Ok(datastore_ref) => {
                state
                    .docs()
                    .set_indexed_status(doc.id, IndexedStatus::Ready, Some(&datastore_ref))
                    .await
                    .map_err(internal)?;
                IndexDetail {
                    doc_id: doc.id,
                    status: IndexedStatus::Ready,
                    error: None,
                }
            }
            Err(e) => {
                tracing::warn!(request_id = %ctx.request_id, doc_id = doc.id, error = %e, "Document import failed");
                state
                    .docs()
                    .set_indexed_status(doc.id, IndexedStatus::Failed, None)
                    .await
                    .map_err(internal)?;
                IndexDetail {
                    doc_id: doc.id,
                    status: IndexedStatus::Failed,
                    error: Some(e.to_string()),
                }
            }
        };
        details.push(detail);
    }

    let triggered = details.len();
    let failed = details
        .iter()
        .filter(|d| d.status == IndexedStatus::Failed)
        .count();

    event.set_sources(json!({ "doc_id": request.doc_id, "triggered": triggered }));
    event.set_decision(json!({ "details": details }));
    if failed > 0 {
        event.set_failure(format!("{} of {} documents failed to index", failed, triggered));
    }

    Ok(DocIndexResponse {
        request_id: ctx.request_id.clone(),
        triggered,
        succeeded: triggered - failed,
        failed,
        details,
    })
}

/// `DELETE /docs/{doc_id}`
pub async fn delete(
    State(state): State<AppState>,
    ctx: RequestContext,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<DocDeleteResponse>, RequestFailure> {
    let mut event = ctx.begin(state.audit(), AuditModule::Docs);
    let outcome = soft_delete(&state, &ctx, path, &mut event).await;
    state.finish(event, outcome).await.map(Json)
}

async fn soft_delete(
    state: &AppState,
    ctx: &RequestContext,
    path: Result<Path<i64>, PathRejection>,
    event: &mut AuditEventBuilder,
) -> Result<DocDeleteResponse, ApiError> {
    let Path(doc_id) =
        path.map_err(|e| ApiError::bad_request("Invalid document ID").with_detail(e.body_text()))?;
    event.set_sources(json!({ "doc_id": doc_id }));

    let doc = state
        .docs()
        .soft_delete(doc_id)
        .await
        .map_err(|e| ApiError::internal("Delete failed").with_detail(e))?
        .ok_or_else(|| {
            ApiError::not_found("Document not found")
                .with_detail(format!("No document with ID {}", doc_id))
        })?;

    Ok(DocDeleteResponse {
        request_id: ctx.request_id.clone(),
        doc_id: doc.id,
        deleted_at: doc.deleted_at.unwrap_or_else(chrono::Utc::now),
    })
}
