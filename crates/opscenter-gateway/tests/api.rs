//! Router tests: drive the full application in-process against in-memory
//! stores and scripted outbound services.

use async_trait::async_trait;
use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use opscenter_audit::{
    AuditError, AuditEvent, AuditFilter, AuditLogger, AuditStorage, MemoryStorage,
};
use opscenter_blob::BlobStore;
use opscenter_bridge::{BridgeError, CallToolParams, CallToolResult, FinanceBridge};
use opscenter_core::{AuditModule, AuditStatus, IndexedStatus, NewDocAsset, ServerConfig};
use opscenter_gateway::{AppServices, AppState};
use opscenter_policy::{REFUSAL_ANSWER, ToolAllowList};
use opscenter_search::{DocumentImporter, SearchError, UnintegratedSearch};
use opscenter_store::{DocRepository, MemoryDocRepository};
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

const BOUNDARY: &str = "opscenter-test-boundary";
const DATASTORE_REF: &str =
    "projects/p/locations/global/collections/default_collection/dataStores/ds";

/// Records every call; fails when `fail` is set.
#[derive(Default)]
struct ScriptedBridge {
    calls: Mutex<Vec<CallToolParams>>,
    fail: bool,
}

impl ScriptedBridge {
    fn calls(&self) -> Vec<CallToolParams> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl FinanceBridge for ScriptedBridge {
    async fn call_tool(&self, params: CallToolParams) -> Result<CallToolResult, BridgeError> {
        self.calls.lock().unwrap().push(params.clone());
        if self.fail {
            return Err(BridgeError::Transport("connection refused".into()));
        }
        Ok(CallToolResult {
            content: vec![json!({ "type": "text", "text": format!("{} ok", params.name) })],
            is_error: None,
        })
    }
}

/// Imports succeed unless the URI contains `fail`.
#[derive(Default)]
struct ScriptedImporter {
    calls: Mutex<Vec<String>>,
}

#[async_trait]
impl DocumentImporter for ScriptedImporter {
    async fn import(&self, storage_uri: &str, _request_id: &str) -> Result<String, SearchError> {
        self.calls.lock().unwrap().push(storage_uri.to_string());
        if storage_uri.contains("fail") {
            Err(SearchError::Operation("unsupported file type".into()))
        } else {
            Ok(DATASTORE_REF.to_string())
        }
    }
}

/// Audit storage whose writes always fail.
struct BrokenAuditStorage;

#[async_trait]
impl AuditStorage for BrokenAuditStorage {
    async fn append(&self, _event: AuditEvent) -> Result<AuditEvent, AuditError> {
        Err(AuditError::WriteFailed("audit table unavailable".into()))
    }

    async fn query(&self, _filter: AuditFilter) -> Result<Vec<AuditEvent>, AuditError> {
        Ok(Vec::new())
    }

    async fn count(&self, _filter: AuditFilter) -> Result<usize, AuditError> {
        Ok(0)
    }
}

struct Harness {
    app: Router,
    docs: Arc<MemoryDocRepository>,
    audit: Arc<MemoryStorage>,
    bridge: Arc<ScriptedBridge>,
    importer: Arc<ScriptedImporter>,
}

struct Options {
    bridge_fails: bool,
    smoke_bucket: bool,
    audit_storage: Option<Arc<dyn AuditStorage>>,
    blobs: Option<BlobStore>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            bridge_fails: false,
            smoke_bucket: true,
            audit_storage: None,
            blobs: None,
        }
    }
}

impl Harness {
    fn new() -> Self {
        Self::with(Options::default())
    }

    fn with(options: Options) -> Self {
        let docs = Arc::new(MemoryDocRepository::new());
        let audit = Arc::new(MemoryStorage::new());
        let bridge = Arc::new(ScriptedBridge {
            fail: options.bridge_fails,
            ..Default::default()
        });
        let importer = Arc::new(ScriptedImporter::default());
        let audit_storage = options
            .audit_storage
            .unwrap_or_else(|| audit.clone() as Arc<dyn AuditStorage>);

        let services = AppServices {
            docs: docs.clone(),
            audit: AuditLogger::new(audit_storage),
            blobs: options.blobs.unwrap_or_else(BlobStore::in_memory),
            smoke_bucket: options
                .smoke_bucket
                .then(|| BlobStore::in_memory_bucket("ops-test-bucket")),
            importer: importer.clone(),
            search: Arc::new(UnintegratedSearch),
            bridge: bridge.clone(),
            allow_list: ToolAllowList::default(),
        };
        let app = opscenter_gateway::app(AppState::new(services), &ServerConfig::default());

        Self {
            app,
            docs,
            audit,
            bridge,
            importer,
        }
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    async fn events(&self) -> Vec<AuditEvent> {
        self.audit.query(AuditFilter::default()).await.unwrap()
    }

    /// The single audit event recorded for a response's request id.
    async fn event_for(&self, body: &Value) -> AuditEvent {
        let request_id = body["request_id"].as_str().expect("response carries request_id");
        let events: Vec<_> = self
            .events()
            .await
            .into_iter()
            .filter(|e| e.request_id == request_id)
            .collect();
        assert_eq!(events.len(), 1, "expected one audit event for {request_id}");
        events.into_iter().next().unwrap()
    }

    async fn seed(&self, filename: &str, storage_uri: &str) -> i64 {
        self.docs
            .insert(NewDocAsset {
                filename: filename.to_string(),
                storage_uri: storage_uri.to_string(),
            })
            .await
            .unwrap()
            .id
    }
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn post_empty(uri: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn delete(uri: &str) -> Request<Body> {
    Request::builder()
        .method("DELETE")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn multipart_part(name: &str, filename: &str, content: &str) -> String {
    format!(
        "--{BOUNDARY}\r\n\
         Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n\
         Content-Type: application/pdf\r\n\r\n\
         {content}\r\n"
    )
}

fn upload_request(parts: &[String]) -> Request<Body> {
    let mut body = parts.concat();
    body.push_str(&format!("--{BOUNDARY}--\r\n"));
    Request::builder()
        .method("POST")
        .uri("/docs/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .header("x-user-id", "owner@example.com")
        .body(Body::from(body))
        .unwrap()
}

fn upload(filename: &str) -> Request<Body> {
    upload_request(&[multipart_part("file", filename, "%PDF-1.4 test")])
}

// ---------------------------------------------------------------------------
// Documents
// ---------------------------------------------------------------------------

#[tokio::test]
async fn upload_creates_one_pending_row() {
    let h = Harness::new();

    let (status, body) = h.send(upload("invoice-2024.pdf")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["filename"], "invoice-2024.pdf");
    assert_eq!(body["message"], "Document uploaded successfully");
    assert!(body["duplicate_warning"].is_null());

    let rows = h.docs.all_rows();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id, body["doc_id"].as_i64().unwrap());
    assert_eq!(rows[0].indexed_status, IndexedStatus::Pending);
    let request_id = body["request_id"].as_str().unwrap();
    assert_eq!(rows[0].storage_uri, format!("uploads/{request_id}.pdf"));

    let event = h.event_for(&body).await;
    assert_eq!(event.module, AuditModule::Docs);
    assert_eq!(event.status, AuditStatus::Success);
    assert_eq!(event.user_id.as_deref(), Some("owner@example.com"));
    assert_eq!(
        event.sources_json,
        Some(json!({ "filename": "invoice-2024.pdf", "doc_id": rows[0].id }))
    );
}

#[tokio::test]
async fn duplicate_filename_warns_and_still_inserts() {
    let h = Harness::new();

    let (_, first) = h.send(upload("contract.pdf")).await;
    let (status, second) = h.send(upload("contract.pdf")).await;
    assert_eq!(status, StatusCode::OK);

    let first_id = first["doc_id"].as_i64().unwrap();
    assert_ne!(second["doc_id"].as_i64().unwrap(), first_id);
    assert_eq!(
        second["duplicate_warning"],
        format!(
            "A document with filename 'contract.pdf' already exists (ID: {first_id}). This upload creates a new record."
        )
    );
    assert_eq!(h.docs.all_rows().len(), 2);
}

#[tokio::test]
async fn upload_without_file_part_is_rejected() {
    let h = Harness::new();

    let (status, body) = h
        .send(upload_request(&[multipart_part("attachment", "a.pdf", "x")]))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No file provided");
    assert!(h.docs.all_rows().is_empty());

    let event = h.event_for(&body).await;
    assert_eq!(event.status, AuditStatus::Failure);
    assert!(event.error.unwrap().contains("No file provided"));
}

#[tokio::test]
async fn storage_failure_fails_upload_without_a_row() {
    // An uploads "directory" that is really a file rejects every write.
    let dir = tempfile::tempdir().unwrap();
    let uploads = dir.path().join("uploads");
    let blobs = BlobStore::local(&uploads).unwrap();
    std::fs::remove_dir(&uploads).unwrap();
    std::fs::write(&uploads, b"not a directory").unwrap();

    let h = Harness::with(Options {
        blobs: Some(blobs),
        ..Default::default()
    });

    let (status, body) = h.send(upload("ledger.pdf")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Upload failed");
    assert!(h.docs.all_rows().is_empty());

    let event = h.event_for(&body).await;
    assert_eq!(event.module, AuditModule::Docs);
    assert_eq!(event.status, AuditStatus::Failure);
    assert!(event.error.unwrap().starts_with("Upload failed: "));
    assert_eq!(event.sources_json, Some(json!({ "filename": "ledger.pdf" })));
    assert_eq!(h.events().await.len(), 1);
}

#[tokio::test]
async fn upload_without_filename_is_unnamed() {
    let h = Harness::new();

    let (status, body) = h.send(upload("")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["filename"], "unnamed");
}

#[tokio::test]
async fn status_lists_rows_in_id_order_without_soft_deleted() {
    let h = Harness::new();
    let a = h.seed("a.pdf", "uploads/a.pdf").await;
    let b = h.seed("b.pdf", "uploads/b.pdf").await;
    let c = h.seed("c.pdf", "uploads/c.pdf").await;

    let (status, deleted) = h.send(delete(&format!("/docs/{b}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deleted["doc_id"], b);
    assert!(deleted["deleted_at"].is_string());

    let (status, body) = h.send(get("/docs/status")).await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<i64> = body["documents"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![a, c]);
    assert_eq!(body["documents"][0]["indexed_status"], "pending");

    let event = h.event_for(&body).await;
    assert_eq!(event.sources_json, Some(json!({ "doc_count": 2 })));

    // The row itself survives.
    assert_eq!(h.docs.all_rows().len(), 3);
}

#[tokio::test]
async fn deleting_twice_is_not_found() {
    let h = Harness::new();
    let id = h.seed("a.pdf", "uploads/a.pdf").await;

    let (status, _) = h.send(delete(&format!("/docs/{id}"))).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = h.send(delete(&format!("/docs/{id}"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Document not found");

    let (status, body) = h.send(delete("/docs/not-a-number")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    h.event_for(&body).await;
}

#[tokio::test]
async fn query_refuses_without_citations() {
    let h = Harness::new();

    let (status, body) = h
        .send(post_json("/docs/query", json!({ "query": "What are our payment terms?" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["answer"], REFUSAL_ANSWER);
    assert_eq!(body["citations"], json!([]));

    let event = h.event_for(&body).await;
    assert_eq!(event.status, AuditStatus::Success);
    assert_eq!(
        event.prompt_hash.as_deref(),
        Some(opscenter_core::hash_prompt("What are our payment terms?").as_str())
    );
    assert_eq!(
        event.decision_json,
        Some(json!({ "gate": "citations", "answered": false }))
    );
    assert_eq!(
        event.sources_json,
        Some(json!({ "query": "What are our payment terms?", "citations_count": 0 }))
    );
}

#[tokio::test]
async fn blank_query_is_rejected() {
    let h = Harness::new();

    let (status, body) = h.send(post_json("/docs/query", json!({ "query": "   " }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(h.event_for(&body).await.status, AuditStatus::Failure);

    let (status, body) = h.send(post_json("/docs/query", json!({ "q": 1 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid request body");
    h.event_for(&body).await;
}

// ---------------------------------------------------------------------------
// Indexing
// ---------------------------------------------------------------------------

#[tokio::test]
async fn index_moves_gcs_rows_and_leaves_local_rows() {
    let h = Harness::new();
    let local = h.seed("local.pdf", "uploads/local.pdf").await;
    let good = h.seed("good.pdf", "gs://bucket/docs/r1/good.pdf").await;
    let bad = h.seed("bad.pdf", "gs://bucket/docs/r2/fail.pdf").await;

    let (status, body) = h.send(post_empty("/docs/index")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["triggered"], 2);
    assert_eq!(body["succeeded"], 1);
    assert_eq!(body["failed"], 1);
    assert_eq!(body["details"][0], json!({ "doc_id": good, "status": "ready" }));
    assert_eq!(body["details"][1]["doc_id"], bad);
    assert_eq!(body["details"][1]["status"], "failed");
    assert!(
        body["details"][1]["error"]
            .as_str()
            .unwrap()
            .contains("unsupported file type")
    );

    let rows = h.docs.all_rows();
    let row = |id: i64| rows.iter().find(|r| r.id == id).unwrap().clone();
    assert_eq!(row(local).indexed_status, IndexedStatus::Pending);
    assert_eq!(row(good).indexed_status, IndexedStatus::Ready);
    assert_eq!(row(good).datastore_ref.as_deref(), Some(DATASTORE_REF));
    assert_eq!(row(bad).indexed_status, IndexedStatus::Failed);

    let event = h.event_for(&body).await;
    assert_eq!(event.status, AuditStatus::Failure);
    assert_eq!(event.error.as_deref(), Some("1 of 2 documents failed to index"));
    assert_eq!(event.sources_json, Some(json!({ "doc_id": null, "triggered": 2 })));

    // Nothing left to pick up.
    let (_, again) = h.send(post_empty("/docs/index")).await;
    assert_eq!(again["triggered"], 0);
    assert_eq!(h.event_for(&again).await.status, AuditStatus::Success);
}

#[tokio::test]
async fn index_single_document() {
    let h = Harness::new();
    let first = h.seed("one.pdf", "gs://bucket/docs/r1/one.pdf").await;
    let second = h.seed("two.pdf", "gs://bucket/docs/r2/two.pdf").await;

    let (status, body) = h
        .send(post_json("/docs/index", json!({ "doc_id": second })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["triggered"], 1);
    assert_eq!(body["details"][0]["doc_id"], second);

    assert_eq!(
        h.importer.calls.lock().unwrap().clone(),
        vec!["gs://bucket/docs/r2/two.pdf".to_string()]
    );
    let rows = h.docs.all_rows();
    assert_eq!(rows[(first - 1) as usize].indexed_status, IndexedStatus::Pending);
}

#[tokio::test]
async fn index_unknown_document_is_not_found() {
    let h = Harness::new();

    let (status, body) = h.send(post_json("/docs/index", json!({ "doc_id": 999 }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Document not found");
    assert!(h.importer.calls.lock().unwrap().is_empty());
    assert_eq!(h.event_for(&body).await.status, AuditStatus::Failure);
}

// ---------------------------------------------------------------------------
// Finance
// ---------------------------------------------------------------------------

#[tokio::test]
async fn finance_rejects_tool_outside_allow_list_before_calling_out() {
    let h = Harness::new();

    let (status, body) = h
        .send(post_json(
            "/finance/query",
            json!({ "query": "void invoice 42", "tool": "delete-invoice" }),
        ))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(h.bridge.calls().is_empty());

    let event = h.event_for(&body).await;
    assert_eq!(event.module, AuditModule::Finance);
    assert_eq!(event.status, AuditStatus::Failure);
    assert_eq!(event.tool_calls_json, Some(json!([])));
    assert_eq!(
        event.decision_json,
        Some(json!({ "allowed": false, "tool": "delete-invoice" }))
    );
}

#[tokio::test]
async fn finance_forwards_allowed_tool_with_query() {
    let h = Harness::new();

    let (status, body) = h
        .send(post_json(
            "/finance/query",
            json!({
                "query": "unpaid invoices",
                "tool": "list-invoices",
                "arguments": { "status": "AUTHORISED" }
            }),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tool"], "list-invoices");
    assert_eq!(body["content"][0]["text"], "list-invoices ok");

    let calls = h.bridge.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(
        calls[0].arguments,
        json!({ "status": "AUTHORISED", "query": "unpaid invoices" })
    );

    let event = h.event_for(&body).await;
    assert_eq!(event.status, AuditStatus::Success);
    assert_eq!(
        event.tool_calls_json,
        Some(json!([{
            "name": "list-invoices",
            "arguments": { "status": "AUTHORISED", "query": "unpaid invoices" }
        }]))
    );
    assert_eq!(
        event.decision_json,
        Some(json!({ "allowed": true, "tool": "list-invoices" }))
    );
}

#[tokio::test]
async fn finance_bridge_failure_is_bad_gateway() {
    let h = Harness::with(Options {
        bridge_fails: true,
        ..Default::default()
    });

    let (status, body) = h
        .send(post_json(
            "/finance/query",
            json!({ "query": "accounts", "tool": "list-accounts" }),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body["detail"].as_str().unwrap().contains("connection refused"));
    assert_eq!(h.bridge.calls().len(), 1);
    assert_eq!(h.event_for(&body).await.status, AuditStatus::Failure);
}

#[tokio::test]
async fn finance_rejects_non_object_arguments() {
    let h = Harness::new();

    let (status, body) = h
        .send(post_json(
            "/finance/query",
            json!({ "query": "q", "tool": "list-accounts", "arguments": [1, 2] }),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(h.bridge.calls().is_empty());
    h.event_for(&body).await;
}

// ---------------------------------------------------------------------------
// System, smoke and audit lookups
// ---------------------------------------------------------------------------

#[tokio::test]
async fn root_and_health() {
    let h = Harness::new();

    let (status, body) = h.send(get("/")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "SME Ops-Center API Gateway");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    assert_eq!(h.event_for(&body).await.module, AuditModule::System);

    let (status, body) = h.send(get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "api-gateway");
    assert_eq!(body["database"], "connected");
    h.event_for(&body).await;
}

#[tokio::test]
async fn smoke_check_round_trips_an_object() {
    let h = Harness::new();

    let (status, body) = h.send(get("/gcs/smoke")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
    assert_eq!(body["bucket"], "ops-test-bucket");
    let object = body["object"].as_str().unwrap();
    assert!(object.starts_with("smoke/") && object.ends_with(".txt"));
    assert_eq!(h.event_for(&body).await.module, AuditModule::Admin);
}

#[tokio::test]
async fn smoke_check_without_bucket_fails() {
    let h = Harness::with(Options {
        smoke_bucket: false,
        ..Default::default()
    });

    let (status, body) = h.send(get("/gcs/smoke")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "GCS_BUCKET_NAME not configured");
    assert_eq!(body["detail"], "GCS_BUCKET_NAME environment variable is required");
    assert_eq!(h.event_for(&body).await.status, AuditStatus::Failure);
}

#[tokio::test]
async fn audit_events_filter_and_page() {
    let h = Harness::new();
    h.send(get("/")).await;
    h.send(get("/docs/status")).await;
    h.send(get("/docs/status")).await;

    let (status, body) = h.send(get("/audit/events?module=docs&limit=1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 2);
    let events = body["events"].as_array().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["module"], "docs");

    // The lookup is itself audited.
    let event = h.event_for(&body).await;
    assert_eq!(event.module, AuditModule::Admin);

    let (status, body) = h.send(get("/audit/events?status=maybe")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid status");

    let (status, body) = h
        .send(get("/audit/events?offset=9223372036854775808"))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid offset");
    h.event_for(&body).await;
}

#[tokio::test]
async fn oversized_identity_headers_are_still_audited() {
    let h = Harness::new();
    let request = Request::builder()
        .uri("/")
        .header("x-user-id", "u".repeat(300))
        .header("x-session-id", "s".repeat(300))
        .body(Body::empty())
        .unwrap();

    let (status, body) = h.send(request).await;
    assert_eq!(status, StatusCode::OK);
    let event = h.event_for(&body).await;
    assert_eq!(event.user_id.unwrap().len(), opscenter_audit::MAX_IDENTITY_LEN);
    assert_eq!(event.session_id.unwrap().len(), opscenter_audit::MAX_IDENTITY_LEN);
}

#[tokio::test]
async fn every_request_is_audited_once() {
    let h = Harness::new();
    let requests = vec![
        get("/"),
        get("/health"),
        upload("a.pdf"),
        get("/docs/status"),
        post_json("/docs/query", json!({ "query": "q" })),
        post_empty("/docs/index"),
        post_json("/finance/query", json!({ "query": "q", "tool": "nope" })),
        delete("/docs/42"),
        get("/gcs/smoke"),
    ];
    let count = requests.len();

    for request in requests {
        let (_, body) = h.send(request).await;
        h.event_for(&body).await;
    }
    assert_eq!(h.events().await.len(), count);
}

// ---------------------------------------------------------------------------
// Audit write failures
// ---------------------------------------------------------------------------

#[tokio::test]
async fn audit_write_failure_fails_the_request() {
    let h = Harness::with(Options {
        audit_storage: Some(Arc::new(BrokenAuditStorage)),
        ..Default::default()
    });

    let (status, body) = h.send(upload("a.pdf")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Failed to record audit event");
    assert!(body["request_id"].is_string());
}

#[tokio::test]
async fn audit_write_failure_keeps_original_error() {
    let h = Harness::with(Options {
        audit_storage: Some(Arc::new(BrokenAuditStorage)),
        ..Default::default()
    });

    let (status, body) = h
        .send(post_json("/finance/query", json!({ "query": "q", "tool": "nope" })))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Tool not allowed");
}

#[tokio::test]
async fn health_answers_when_audit_write_fails() {
    let h = Harness::with(Options {
        audit_storage: Some(Arc::new(BrokenAuditStorage)),
        ..Default::default()
    });

    let (status, body) = h.send(get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}
