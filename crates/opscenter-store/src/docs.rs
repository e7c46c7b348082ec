//! Document asset repository.

use crate::error::StoreError;
use async_trait::async_trait;
use chrono::Utc;
use opscenter_core::{DocAsset, IndexedStatus, NewDocAsset};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use std::sync::Mutex;

/// Persistence operations on `doc_asset`.
///
/// "Active" means not soft-deleted. There is no hard delete.
#[async_trait]
pub trait DocRepository: Send + Sync {
    /// Insert a new row in `pending` state.
    async fn insert(&self, doc: NewDocAsset) -> Result<DocAsset, StoreError>;

    /// All active rows, in ascending id order.
    async fn list_active(&self) -> Result<Vec<DocAsset>, StoreError>;

    async fn find_active(&self, id: i64) -> Result<Option<DocAsset>, StoreError>;

    /// First active row with this exact filename.
    async fn find_active_by_filename(&self, filename: &str)
    -> Result<Option<DocAsset>, StoreError>;

    /// Active `pending` rows stored in GCS, optionally narrowed to one id.
    async fn pending_in_gcs(&self, doc_id: Option<i64>) -> Result<Vec<DocAsset>, StoreError>;

    /// Move a row to a new indexing state. `datastore_ref` is only written when given.
    async fn set_indexed_status(
        &self,
        id: i64,
        status: IndexedStatus,
        datastore_ref: Option<&str>,
    ) -> Result<(), StoreError>;

    /// Stamp `deleted_at`. Returns `None` when the row is missing or already deleted.
    async fn soft_delete(&self, id: i64) -> Result<Option<DocAsset>, StoreError>;

    /// Cheap connectivity check.
    async fn ping(&self) -> Result<(), StoreError>;
}

const DOC_COLUMNS: &str =
    "id, filename, storage_uri, uploaded_at, indexed_status, datastore_ref, deleted_at";

fn doc_from_row(row: &PgRow) -> Result<DocAsset, StoreError> {
    let status: String = row.try_get("indexed_status")?;
    Ok(DocAsset {
        id: row.try_get("id")?,
        filename: row.try_get("filename")?,
        storage_uri: row.try_get("storage_uri")?,
        uploaded_at: row.try_get("uploaded_at")?,
        indexed_status: status
            .parse()
            .map_err(|e: opscenter_core::ParseEnumError| StoreError::Corrupt(e.to_string()))?,
        datastore_ref: row.try_get("datastore_ref")?,
        deleted_at: row.try_get("deleted_at")?,
    })
}

/// Postgres-backed repository.
#[derive(Clone)]
pub struct PgDocRepository {
    pool: PgPool,
}

impl PgDocRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DocRepository for PgDocRepository {
    async fn insert(&self, doc: NewDocAsset) -> Result<DocAsset, StoreError> {
        let sql = format!(
            "INSERT INTO doc_asset (filename, storage_uri, indexed_status) \
             VALUES ($1, $2, $3) RETURNING {DOC_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(&doc.filename)
            .bind(&doc.storage_uri)
            .bind(IndexedStatus::Pending.as_str())
            .fetch_one(&self.pool)
            .await?;
        let asset = doc_from_row(&row)?;
        tracing::info!(doc_id = asset.id, filename = %asset.filename, "Created doc_asset");
        Ok(asset)
    }

    async fn list_active(&self) -> Result<Vec<DocAsset>, StoreError> {
        let sql = format!("SELECT {DOC_COLUMNS} FROM doc_asset WHERE deleted_at IS NULL ORDER BY id");
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        rows.iter().map(doc_from_row).collect()
    }

    async fn find_active(&self, id: i64) -> Result<Option<DocAsset>, StoreError> {
        let sql =
            format!("SELECT {DOC_COLUMNS} FROM doc_asset WHERE id = $1 AND deleted_at IS NULL");
        let row = sqlx::query(&sql).bind(id).fetch_optional(&self.pool).await?;
        row.as_ref().map(doc_from_row).transpose()
    }

    async fn find_active_by_filename(
        &self,
        filename: &str,
    ) -> Result<Option<DocAsset>, StoreError> {
        let sql = format!(
            "SELECT {DOC_COLUMNS} FROM doc_asset \
             WHERE filename = $1 AND deleted_at IS NULL ORDER BY id LIMIT 1"
        );
        let row = sqlx::query(&sql)
            .bind(filename)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(doc_from_row).transpose()
    }

    async fn pending_in_gcs(&self, doc_id: Option<i64>) -> Result<Vec<DocAsset>, StoreError> {
        let sql = format!(
            "SELECT {DOC_COLUMNS} FROM doc_asset \
             WHERE deleted_at IS NULL \
               AND indexed_status = $1 \
               AND storage_uri LIKE 'gs://%' \
               AND ($2::BIGINT IS NULL OR id = $2) \
             ORDER BY id"
        );
        let rows = sqlx::query(&sql)
            .bind(IndexedStatus::Pending.as_str())
            .bind(doc_id)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(doc_from_row).collect()
    }

    async fn set_indexed_status(
        &self,
        id: i64,
        status: IndexedStatus,
        datastore_ref: Option<&str>,
    ) -> Result<(), StoreError> {
        sqlx::query(
            "UPDATE doc_asset \
             SET indexed_status = $1, datastore_ref = COALESCE($2, datastore_ref) \
             WHERE id = $3",
        )
        .bind(status.as_str())
        .bind(datastore_ref)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn soft_delete(&self, id: i64) -> Result<Option<DocAsset>, StoreError> {
        let sql = format!(
            "UPDATE doc_asset SET deleted_at = now() \
             WHERE id = $1 AND deleted_at IS NULL RETURNING {DOC_COLUMNS}"
        );
        let row = sqlx::query(&sql).bind(id).fetch_optional(&self.pool).await?;
        row.as_ref().map(doc_from_row).transpose()
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// In-process repository with the same semantics as [`PgDocRepository`].
#[derive(Default)]
pub struct MemoryDocRepository {
    rows: Mutex<Vec<DocAsset>>,
}

impl MemoryDocRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every row, including soft-deleted ones.
    pub fn all_rows(&self) -> Vec<DocAsset> {
        self.rows.lock().map(|r| r.clone()).unwrap_or_default()
    }

    fn with_rows<T>(&self, f: impl FnOnce(&mut Vec<DocAsset>) -> T) -> Result<T, StoreError> {
        let mut rows = self.rows.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(f(&mut rows))
    }
}

#[async_trait]
impl DocRepository for MemoryDocRepository {
    async fn insert(&self, doc: NewDocAsset) -> Result<DocAsset, StoreError> {
        self.with_rows(|rows| {
            let asset = DocAsset {
                id: rows.len() as i64 + 1,
                filename: doc.filename,
                storage_uri: doc.storage_uri,
                uploaded_at: Utc::now(),
                indexed_status: IndexedStatus::Pending,
                datastore_ref: None,
                deleted_at: None,
            };
            rows.push(asset.clone());
            asset
        })
    }

    async fn list_active(&self) -> Result<Vec<DocAsset>, StoreError> {
        self.with_rows(|rows| rows.iter().filter(|d| !d.is_deleted()).cloned().collect())
    }

    async fn find_active(&self, id: i64) -> Result<Option<DocAsset>, StoreError> {
        self.with_rows(|rows| rows.iter().find(|d| d.id == id && !d.is_deleted()).cloned())
    }

    async fn find_active_by_filename(
        &self,
        filename: &str,
    ) -> Result<Option<DocAsset>, StoreError> {
        self.with_rows(|rows| {
            rows.iter()
                .find(|d| d.filename == filename && !d.is_deleted())
                .cloned()
        })
    }

    async fn pending_in_gcs(&self, doc_id: Option<i64>) -> Result<Vec<DocAsset>, StoreError> {
        self.with_rows(|rows| {
            rows.iter()
                .filter(|d| {
                    !d.is_deleted()
                        && d.indexed_status == IndexedStatus::Pending
                        && d.is_in_gcs()
                        && doc_id.is_none_or(|id| d.id == id)
                })
                .cloned()
                .collect()
        })
    }

    async fn set_indexed_status(
        &self,
        id: i64,
        status: IndexedStatus,
        datastore_ref: Option<&str>,
    ) -> Result<(), StoreError> {
        self.with_rows(|rows| {
            if let Some(doc) = rows.iter_mut().find(|d| d.id == id) {
                doc.indexed_status = status;
                if let Some(r) = datastore_ref {
                    doc.datastore_ref = Some(r.to_string());
                }
            }
        })
    }

    async fn soft_delete(&self, id: i64) -> Result<Option<DocAsset>, StoreError> {
        self.with_rows(|rows| {
            rows.iter_mut()
                .find(|d| d.id == id && !d.is_deleted())
                .map(|doc| {
                    doc.deleted_at = Some(Utc::now());
                    doc.clone()
                })
        })
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_doc(filename: &str, uri: &str) -> NewDocAsset {
        NewDocAsset {
            filename: filename.to_string(),
            storage_uri: uri.to_string(),
        }
    }

    #[tokio::test]
    async fn insert_starts_pending() {
        let repo = MemoryDocRepository::new();
        let doc = repo.insert(new_doc("a.pdf", "uploads/x.pdf")).await.unwrap();
        assert_eq!(doc.id, 1);
        assert_eq!(doc.indexed_status, IndexedStatus::Pending);
        assert!(doc.datastore_ref.is_none());
    }

    #[tokio::test]
    async fn soft_deleted_rows_are_hidden() {
        let repo = MemoryDocRepository::new();
        let a = repo.insert(new_doc("a.pdf", "uploads/a.pdf")).await.unwrap();
        repo.insert(new_doc("b.pdf", "uploads/b.pdf")).await.unwrap();

        assert!(repo.soft_delete(a.id).await.unwrap().is_some());
        assert!(repo.soft_delete(a.id).await.unwrap().is_none());

        let active = repo.list_active().await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].filename, "b.pdf");
        assert!(repo.find_active(a.id).await.unwrap().is_none());
        assert!(repo.find_active_by_filename("a.pdf").await.unwrap().is_none());
        assert_eq!(repo.all_rows().len(), 2);
    }

    #[tokio::test]
    async fn duplicate_lookup_returns_first_active() {
        let repo = MemoryDocRepository::new();
        let first = repo.insert(new_doc("q.pdf", "uploads/1.pdf")).await.unwrap();
        repo.insert(new_doc("q.pdf", "uploads/2.pdf")).await.unwrap();

        let found = repo.find_active_by_filename("q.pdf").await.unwrap().unwrap();
        assert_eq!(found.id, first.id);
    }

    #[tokio::test]
    async fn pending_in_gcs_filters_scheme_state_and_id() {
        let repo = MemoryDocRepository::new();
        let local = repo.insert(new_doc("l.pdf", "uploads/l.pdf")).await.unwrap();
        let gcs = repo.insert(new_doc("g.pdf", "gs://b/docs/1/g.pdf")).await.unwrap();
        let done = repo.insert(new_doc("d.pdf", "gs://b/docs/2/d.pdf")).await.unwrap();
        repo.set_indexed_status(done.id, IndexedStatus::Ready, Some("ds"))
            .await
            .unwrap();

        let all = repo.pending_in_gcs(None).await.unwrap();
        assert_eq!(all.iter().map(|d| d.id).collect::<Vec<_>>(), vec![gcs.id]);
        assert!(repo.pending_in_gcs(Some(local.id)).await.unwrap().is_empty());
        assert_eq!(repo.pending_in_gcs(Some(gcs.id)).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn set_status_keeps_existing_datastore_ref() {
        let repo = MemoryDocRepository::new();
        let doc = repo.insert(new_doc("g.pdf", "gs://b/g.pdf")).await.unwrap();
        repo.set_indexed_status(doc.id, IndexedStatus::Ready, Some("ds-1"))
            .await
            .unwrap();
        repo.set_indexed_status(doc.id, IndexedStatus::Failed, None)
            .await
            .unwrap();

        let row = repo.find_active(doc.id).await.unwrap().unwrap();
        assert_eq!(row.indexed_status, IndexedStatus::Failed);
        assert_eq!(row.datastore_ref.as_deref(), Some("ds-1"));
    }
}
