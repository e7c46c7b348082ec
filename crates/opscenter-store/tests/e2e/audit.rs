//! Audit storage tests.

use super::common::*;
use opscenter_audit::{AuditEvent, AuditFilter, AuditStorage, MAX_IDENTITY_LEN};
use opscenter_core::{AuditModule, AuditStatus};
use serde_json::json;

pub async fn test_append_round_trips_json(ctx: &TestContext) {
    println!("  🧪 test_append_round_trips_json");
    let storage = ctx.audit();

    let event = AuditEvent::builder(AuditModule::Finance, "e2e-fin-1")
        .user_id("alice")
        .prompt_hash("ba7816bf8f01cfea")
        .tool_calls(json!([{"name": "list-invoices", "arguments": {}}]))
        .decision(json!({"allowed": true, "tool": "list-invoices"}))
        .status(AuditStatus::Success)
        .build();

    let stored = storage.append(event.clone()).await.unwrap();
    assert!(stored.id.is_some());
    assert_eq!(stored.tool_calls_json, event.tool_calls_json);
    assert_eq!(stored.decision_json, event.decision_json);
    assert_eq!(stored.user_id.as_deref(), Some("alice"));
}

pub async fn test_filters_and_paging(ctx: &TestContext) {
    println!("  🧪 test_filters_and_paging");
    let storage = ctx.audit();

    for i in 0..3 {
        append_event(&storage, AuditModule::Admin, &format!("e2e-adm-{i}")).await;
    }
    storage
        .append(
            AuditEvent::builder(AuditModule::Admin, "e2e-adm-fail")
                .failure("bucket missing")
                .build(),
        )
        .await
        .unwrap();

    let admin = AuditFilter {
        module: Some(AuditModule::Admin),
        ..Default::default()
    };
    assert_eq!(storage.count(admin.clone()).await.unwrap(), 4);

    let page = storage
        .query(AuditFilter {
            limit: Some(2),
            offset: Some(1),
            ..admin.clone()
        })
        .await
        .unwrap();
    let ids: Vec<_> = page.iter().map(|e| e.request_id.as_str()).collect();
    assert_eq!(ids, vec!["e2e-adm-2", "e2e-adm-1"]);

    let failures = storage
        .query(AuditFilter {
            status: Some(AuditStatus::Failure),
            ..admin
        })
        .await
        .unwrap();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].error.as_deref(), Some("bucket missing"));
}

pub async fn test_append_only(ctx: &TestContext) {
    println!("  🧪 test_append_only");
    let storage = ctx.audit();
    let stored = append_event(&storage, AuditModule::System, "e2e-sys-1").await;

    let update = sqlx::query("UPDATE audit_event SET status = 'failure' WHERE id = $1")
        .bind(stored.id)
        .execute(&ctx.pool)
        .await;
    assert!(update.is_err());

    let delete = sqlx::query("DELETE FROM audit_event WHERE id = $1")
        .bind(stored.id)
        .execute(&ctx.pool)
        .await;
    assert!(delete.is_err());
}

pub async fn test_identity_fits_column(ctx: &TestContext) {
    println!("  🧪 test_identity_fits_column");
    let storage = ctx.audit();

    // Characters, not bytes: a multi-byte identity of full width still fits.
    let user = "é".repeat(MAX_IDENTITY_LEN);
    let session = "s".repeat(MAX_IDENTITY_LEN);
    let event = AuditEvent::builder(AuditModule::System, "e2e-identity-1")
        .user_id(user.clone())
        .session_id(session.clone())
        .status(AuditStatus::Success)
        .build();

    let stored = storage.append(event).await.unwrap();
    assert_eq!(stored.user_id.as_deref(), Some(user.as_str()));
    assert_eq!(stored.session_id.as_deref(), Some(session.as_str()));

    let wider = AuditEvent::builder(AuditModule::System, "e2e-identity-2")
        .user_id("u".repeat(MAX_IDENTITY_LEN + 1))
        .build();
    assert!(storage.append(wider).await.is_err());
}

pub async fn run_all_tests(ctx: &TestContext) {
    println!("\n🧾 Audit storage");
    test_append_round_trips_json(ctx).await;
    test_filters_and_paging(ctx).await;
    test_append_only(ctx).await;
    test_identity_fits_column(ctx).await;
}
