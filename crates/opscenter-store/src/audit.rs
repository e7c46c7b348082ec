//! `audit_event` table as an audit storage backend.

use async_trait::async_trait;
use opscenter_audit::{AuditError, AuditEvent, AuditFilter, AuditStorage};
use opscenter_core::ParseEnumError;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, QueryBuilder, Row};

const EVENT_COLUMNS: &str = "id, ts, module, user_id, session_id, request_id, prompt_hash, \
     sources_json, tool_calls_json, decision_json, status, error";

/// Append-only audit storage in Postgres.
///
/// The table also rejects UPDATE and DELETE through a trigger.
#[derive(Clone)]
pub struct PgAuditStorage {
    pool: PgPool,
}

impl PgAuditStorage {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn event_from_row(row: &PgRow) -> Result<AuditEvent, sqlx::Error> {
    let corrupt = |e: ParseEnumError| sqlx::Error::Decode(Box::new(e));
    let module: String = row.try_get("module")?;
    let status: String = row.try_get("status")?;
    Ok(AuditEvent {
        id: Some(row.try_get("id")?),
        ts: row.try_get("ts")?,
        module: module.parse().map_err(corrupt)?,
        request_id: row.try_get("request_id")?,
        user_id: row.try_get("user_id")?,
        session_id: row.try_get("session_id")?,
        prompt_hash: row.try_get("prompt_hash")?,
        sources_json: row.try_get("sources_json")?,
        tool_calls_json: row.try_get("tool_calls_json")?,
        decision_json: row.try_get("decision_json")?,
        status: status.parse().map_err(corrupt)?,
        error: row.try_get("error")?,
    })
}

fn push_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &AuditFilter) {
    qb.push(" WHERE TRUE");
    if let Some(ref request_id) = filter.request_id {
        qb.push(" AND request_id = ").push_bind(request_id.clone());
    }
    if let Some(module) = filter.module {
        qb.push(" AND module = ").push_bind(module.as_str());
    }
    if let Some(status) = filter.status {
        qb.push(" AND status = ").push_bind(status.as_str());
    }
    if let Some(ref user_id) = filter.user_id {
        qb.push(" AND user_id = ").push_bind(user_id.clone());
    }
    if let Some(start) = filter.start_time {
        qb.push(" AND ts >= ").push_bind(start);
    }
    if let Some(end) = filter.end_time {
        qb.push(" AND ts <= ").push_bind(end);
    }
}

fn page_bound(name: &str, value: usize) -> Result<i64, AuditError> {
    i64::try_from(value).map_err(|_| AuditError::QueryFailed(format!("{name} {value} is out of range")))
}

#[async_trait]
impl AuditStorage for PgAuditStorage {
    async fn append(&self, event: AuditEvent) -> Result<AuditEvent, AuditError> {
        let sql = format!(
            "INSERT INTO audit_event \
             (ts, module, user_id, session_id, request_id, prompt_hash, \
              sources_json, tool_calls_json, decision_json, status, error) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
             RETURNING {EVENT_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(event.ts)
            .bind(event.module.as_str())
            .bind(&event.user_id)
            .bind(&event.session_id)
            .bind(&event.request_id)
            .bind(&event.prompt_hash)
            .bind(&event.sources_json)
            .bind(&event.tool_calls_json)
            .bind(&event.decision_json)
            .bind(event.status.as_str())
            .bind(&event.error)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AuditError::WriteFailed(e.to_string()))?;

        event_from_row(&row).map_err(|e| AuditError::WriteFailed(e.to_string()))
    }

    async fn query(&self, filter: AuditFilter) -> Result<Vec<AuditEvent>, AuditError> {
        let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {EVENT_COLUMNS} FROM audit_event"));
        push_filter(&mut qb, &filter);
        qb.push(" ORDER BY id DESC");
        if let Some(limit) = filter.limit {
            qb.push(" LIMIT ").push_bind(page_bound("limit", limit)?);
        }
        if let Some(offset) = filter.offset {
            qb.push(" OFFSET ").push_bind(page_bound("offset", offset)?);
        }

        let rows = qb
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AuditError::QueryFailed(e.to_string()))?;

        rows.iter()
            .map(|row| event_from_row(row).map_err(|e| AuditError::QueryFailed(e.to_string())))
            .collect()
    }

    async fn count(&self, filter: AuditFilter) -> Result<usize, AuditError> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM audit_event");
        push_filter(&mut qb, &filter);

        let count: i64 = qb
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AuditError::QueryFailed(e.to_string()))?;

        Ok(count.max(0) as usize)
    }
}
