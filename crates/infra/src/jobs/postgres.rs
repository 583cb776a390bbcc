//! Postgres-backed job store.
//!
//! Jobs live in a single `jobs` table with the typed payload stored as JSONB.
//! Status changes run in a transaction that locks the row (`SELECT ... FOR
//! UPDATE`) and then applies the patch through [`Job::apply`], so the state
//! machine is enforced by the same code as the in-memory store and two
//! concurrent `Start` patches cannot both succeed.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | JobStoreError |
//! |------------|----------------------|---------------|
//! | Database (unique violation) | `23505` | `AlreadyExists` (on create) |
//! | Database (other) | Any other | `Storage` |
//! | PoolClosed / other | N/A | `Storage` |

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use tracing::instrument;

use shopreel_core::{TenantId, UserId};

use super::store::{JobStore, JobStoreError};
use super::types::{Job, JobId, JobKind, JobPatch, JobPayload, JobStatus};

/// Idempotent schema for the `jobs` table.
pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS jobs (
    id              UUID PRIMARY KEY,
    tenant_id       UUID NOT NULL,
    user_id         UUID NOT NULL,
    kind            TEXT NOT NULL,
    status          TEXT NOT NULL,
    total_items     INTEGER NOT NULL,
    completed_items INTEGER NOT NULL,
    failed_items    INTEGER NOT NULL,
    created_at      TIMESTAMPTZ NOT NULL,
    started_at      TIMESTAMPTZ,
    completed_at    TIMESTAMPTZ,
    payload         JSONB NOT NULL
);
CREATE INDEX IF NOT EXISTS jobs_tenant_recent_idx ON jobs (tenant_id, created_at DESC, id DESC);
"#;

const SELECT_COLUMNS: &str = "id, tenant_id, user_id, kind, status, total_items, completed_items, \
     failed_items, created_at, started_at, completed_at, payload";

#[derive(Debug, Clone)]
pub struct PostgresJobStore {
    pool: Arc<PgPool>,
}

impl PostgresJobStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Create the table and index if they do not exist yet.
    pub async fn ensure_schema(&self) -> Result<(), JobStoreError> {
        sqlx::raw_sql(SCHEMA)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("ensure_schema", e))?;
        Ok(())
    }
}

#[async_trait]
impl JobStore for PostgresJobStore {
    #[instrument(skip(self, job), fields(job_id = %job.id, tenant_id = %job.tenant_id), err)]
    async fn create(&self, job: Job) -> Result<Job, JobStoreError> {
        let payload = to_json(&job.payload)?;
        sqlx::query(
            r#"
            INSERT INTO jobs (
                id, tenant_id, user_id, kind, status,
                total_items, completed_items, failed_items,
                created_at, started_at, completed_at, payload
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(job.id.as_uuid())
        .bind(job.tenant_id.as_uuid())
        .bind(job.user_id.as_uuid())
        .bind(job.kind.as_str())
        .bind(job.status.as_str())
        .bind(job.total_items as i32)
        .bind(job.completed_items as i32)
        .bind(job.failed_items as i32)
        .bind(job.created_at)
        .bind(job.started_at)
        .bind(job.completed_at)
        .bind(payload)
        .execute(&*self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                JobStoreError::AlreadyExists(job.id)
            } else {
                map_sqlx_error("create", e)
            }
        })?;

        Ok(job)
    }

    #[instrument(skip(self, patch), fields(job_id = %job_id, to = %patch.target()), err)]
    async fn update(&self, job_id: JobId, patch: JobPatch) -> Result<Job, JobStoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("update", e))?;

        let row = sqlx::query(&format!("SELECT {SELECT_COLUMNS} FROM jobs WHERE id = $1 FOR UPDATE"))
            .bind(job_id.as_uuid())
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("update", e))?
            .ok_or(JobStoreError::NotFound(job_id))?;

        let mut job = JobRow::from_pg_row(&row)?.into_job()?;
        job.apply(patch)?;

        sqlx::query(
            r#"
            UPDATE jobs
            SET status = $2,
                completed_items = $3,
                failed_items = $4,
                started_at = $5,
                completed_at = $6,
                payload = $7
            WHERE id = $1
            "#,
        )
        .bind(job.id.as_uuid())
        .bind(job.status.as_str())
        .bind(job.completed_items as i32)
        .bind(job.failed_items as i32)
        .bind(job.started_at)
        .bind(job.completed_at)
        .bind(to_json(&job.payload)?)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("update", e))?;

        tx.commit().await.map_err(|e| map_sqlx_error("update", e))?;
        Ok(job)
    }

    #[instrument(skip(self), fields(tenant_id = %tenant_id, job_id = %job_id), err)]
    async fn find_by_id(
        &self,
        tenant_id: TenantId,
        job_id: JobId,
    ) -> Result<Option<Job>, JobStoreError> {
        let row = sqlx::query(&format!(
            "SELECT {SELECT_COLUMNS} FROM jobs WHERE tenant_id = $1 AND id = $2"
        ))
        .bind(tenant_id.as_uuid())
        .bind(job_id.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_by_id", e))?;

        row.map(|r| JobRow::from_pg_row(&r)?.into_job()).transpose()
    }

    #[instrument(skip(self), fields(tenant_id = %tenant_id), err)]
    async fn list_recent(
        &self,
        tenant_id: TenantId,
        limit: usize,
    ) -> Result<Vec<Job>, JobStoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {SELECT_COLUMNS} FROM jobs WHERE tenant_id = $1 \
             ORDER BY created_at DESC, id DESC LIMIT $2"
        ))
        .bind(tenant_id.as_uuid())
        .bind(limit.min(i64::MAX as usize) as i64)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_recent", e))?;

        rows.iter()
            .map(|r| JobRow::from_pg_row(r)?.into_job())
            .collect()
    }
}

fn to_json(payload: &JobPayload) -> Result<serde_json::Value, JobStoreError> {
    serde_json::to_value(payload)
        .map_err(|e| JobStoreError::Storage(format!("failed to serialize job payload: {e}")))
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> JobStoreError {
    match err {
        sqlx::Error::Database(db_err) => JobStoreError::Storage(format!(
            "database error in {}: {}",
            operation,
            db_err.message()
        )),
        sqlx::Error::PoolClosed => {
            JobStoreError::Storage(format!("connection pool closed in {operation}"))
        }
        _ => JobStoreError::Storage(format!("sqlx error in {operation}: {err}")),
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23505"))
}

// SQLx row type

#[derive(Debug)]
struct JobRow {
    id: uuid::Uuid,
    tenant_id: uuid::Uuid,
    user_id: uuid::Uuid,
    kind: String,
    status: String,
    total_items: i32,
    completed_items: i32,
    failed_items: i32,
    created_at: DateTime<Utc>,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    payload: serde_json::Value,
}

impl JobRow {
    fn from_pg_row(row: &sqlx::postgres::PgRow) -> Result<Self, JobStoreError> {
        let read = |e: sqlx::Error| JobStoreError::Storage(format!("failed to read job row: {e}"));
        Ok(JobRow {
            id: row.try_get("id").map_err(read)?,
            tenant_id: row.try_get("tenant_id").map_err(read)?,
            user_id: row.try_get("user_id").map_err(read)?,
            kind: row.try_get("kind").map_err(read)?,
            status: row.try_get("status").map_err(read)?,
            total_items: row.try_get("total_items").map_err(read)?,
            completed_items: row.try_get("completed_items").map_err(read)?,
            failed_items: row.try_get("failed_items").map_err(read)?,
            created_at: row.try_get("created_at").map_err(read)?,
            started_at: row.try_get("started_at").map_err(read)?,
            completed_at: row.try_get("completed_at").map_err(read)?,
            payload: row.try_get("payload").map_err(read)?,
        })
    }

    fn into_job(self) -> Result<Job, JobStoreError> {
        let corrupt = |what: &str, e: String| {
            JobStoreError::Storage(format!("corrupt job row {}: {what}: {e}", self.id))
        };
        let kind = JobKind::from_str(&self.kind).map_err(|e| corrupt("kind", e.to_string()))?;
        let status =
            JobStatus::from_str(&self.status).map_err(|e| corrupt("status", e.to_string()))?;
        let payload: JobPayload = serde_json::from_value(self.payload.clone())
            .map_err(|e| corrupt("payload", e.to_string()))?;

        Ok(Job {
            id: JobId::from_uuid(self.id),
            tenant_id: TenantId::from_uuid(self.tenant_id),
            user_id: UserId::from_uuid(self.user_id),
            kind,
            status,
            total_items: self.total_items.max(0) as u32,
            completed_items: self.completed_items.max(0) as u32,
            failed_items: self.failed_items.max(0) as u32,
            created_at: self.created_at,
            started_at: self.started_at,
            completed_at: self.completed_at,
            payload,
        })
    }
}
