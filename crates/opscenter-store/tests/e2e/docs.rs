//! Document repository tests.

use super::common::*;
use opscenter_core::IndexedStatus;
use opscenter_store::DocRepository;

pub async fn test_insert_and_list(ctx: &TestContext) {
    println!("  🧪 test_insert_and_list");
    let repo = ctx.docs();

    let doc = repo
        .insert(new_doc("handbook.pdf", "uploads/h1.pdf"))
        .await
        .unwrap();
    assert_eq!(doc.indexed_status, IndexedStatus::Pending);
    assert!(doc.deleted_at.is_none());

    let active = repo.list_active().await.unwrap();
    assert!(active.iter().any(|d| d.id == doc.id));
    repo.ping().await.unwrap();
}

pub async fn test_duplicate_filename_lookup(ctx: &TestContext) {
    println!("  🧪 test_duplicate_filename_lookup");
    let repo = ctx.docs();

    let first = repo
        .insert(new_doc("dup.pdf", "uploads/d1.pdf"))
        .await
        .unwrap();
    let second = repo
        .insert(new_doc("dup.pdf", "uploads/d2.pdf"))
        .await
        .unwrap();
    assert_ne!(first.id, second.id);

    let found = repo.find_active_by_filename("dup.pdf").await.unwrap().unwrap();
    assert_eq!(found.id, first.id);
}

pub async fn test_pending_in_gcs_and_status(ctx: &TestContext) {
    println!("  🧪 test_pending_in_gcs_and_status");
    let repo = ctx.docs();

    let local = repo
        .insert(new_doc("local.pdf", "uploads/l.pdf"))
        .await
        .unwrap();
    let gcs = repo
        .insert(new_doc("remote.pdf", "gs://bucket/docs/r/remote.pdf"))
        .await
        .unwrap();

    let pending = repo.pending_in_gcs(None).await.unwrap();
    assert!(pending.iter().any(|d| d.id == gcs.id));
    assert!(pending.iter().all(|d| d.id != local.id));
    assert!(repo.pending_in_gcs(Some(local.id)).await.unwrap().is_empty());

    repo.set_indexed_status(gcs.id, IndexedStatus::Ready, Some("projects/p/ds"))
        .await
        .unwrap();
    let row = repo.find_active(gcs.id).await.unwrap().unwrap();
    assert_eq!(row.indexed_status, IndexedStatus::Ready);
    assert_eq!(row.datastore_ref.as_deref(), Some("projects/p/ds"));
    assert!(repo.pending_in_gcs(Some(gcs.id)).await.unwrap().is_empty());
}

pub async fn test_soft_delete(ctx: &TestContext) {
    println!("  🧪 test_soft_delete");
    let repo = ctx.docs();

    let doc = repo
        .insert(new_doc("gone.pdf", "uploads/g.pdf"))
        .await
        .unwrap();
    let deleted = repo.soft_delete(doc.id).await.unwrap().unwrap();
    assert!(deleted.deleted_at.is_some());
    assert!(repo.soft_delete(doc.id).await.unwrap().is_none());
    assert!(repo.find_active(doc.id).await.unwrap().is_none());

    // Hard deletes are rejected by trigger.
    let hard = sqlx::query("DELETE FROM doc_asset WHERE id = $1")
        .bind(doc.id)
        .execute(&ctx.pool)
        .await;
    assert!(hard.is_err());
}

pub async fn run_all_tests(ctx: &TestContext) {
    println!("\n📂 Document repository");
    test_insert_and_list(ctx).await;
    test_duplicate_filename_lookup(ctx).await;
    test_pending_in_gcs_and_status(ctx).await;
    test_soft_delete(ctx).await;
}
