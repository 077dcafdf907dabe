//! Sync job state machine: `pending → running → completed | failed`.
//!
//! Every transition is a conditional `UPDATE` on the expected prior status,
//! so a job can never move backwards or be completed twice.

use chrono::{DateTime, Duration, Utc};
use cryptoscope_core::RequestContext;
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

const SYNC_JOB_COLUMNS: &str = "id, public_id, account_id, job_type, trigger_source, status, \
     started_at, completed_at, error_message, created_at";

/// A row from the `sync_jobs` table.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct SyncJobRow {
    pub id: i64,
    pub public_id: Uuid,
    pub account_id: i64,
    pub job_type: String,
    /// `scheduler`, `api` or `cli`.
    pub trigger_source: String,
    pub status: String,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Creates a `pending` job for an account.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn create_sync_job(
    pool: &PgPool,
    account_id: i64,
    trigger_source: &str,
) -> Result<SyncJobRow, DbError> {
    let row = sqlx::query_as::<_, SyncJobRow>(&format!(
        "INSERT INTO sync_jobs (public_id, account_id, trigger_source, status) \
         VALUES ($1, $2, $3, 'pending') \
         RETURNING {SYNC_JOB_COLUMNS}"
    ))
    .bind(Uuid::new_v4())
    .bind(account_id)
    .bind(trigger_source)
    .fetch_one(pool)
    .await?;
    Ok(row)
}

/// `pending → running`, setting `started_at`.
///
/// # Errors
///
/// Returns [`DbError::InvalidSyncJobTransition`] if the job is not pending.
pub async fn start_sync_job(pool: &PgPool, id: i64) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE sync_jobs SET status = 'running', started_at = NOW() \
         WHERE id = $1 AND status = 'pending'",
    )
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidSyncJobTransition {
            id,
            expected_status: "pending",
        });
    }
    Ok(())
}

/// `running → completed`, setting `completed_at`.
///
/// # Errors
///
/// Returns [`DbError::InvalidSyncJobTransition`] if the job is not running.
pub async fn complete_sync_job(pool: &PgPool, id: i64) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE sync_jobs SET status = 'completed', completed_at = NOW() \
         WHERE id = $1 AND status = 'running'",
    )
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidSyncJobTransition {
            id,
            expected_status: "running",
        });
    }
    Ok(())
}

/// `running → failed`, recording the error text.
///
/// # Errors
///
/// Returns [`DbError::InvalidSyncJobTransition`] if the job is not running.
pub async fn fail_sync_job(pool: &PgPool, id: i64, error_message: &str) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE sync_jobs SET status = 'failed', completed_at = NOW(), error_message = $1 \
         WHERE id = $2 AND status = 'running'",
    )
    .bind(error_message)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidSyncJobTransition {
            id,
            expected_status: "running",
        });
    }
    Ok(())
}

/// Fails every job that has been `running`, or left `pending`, for longer
/// than `max_age`.
///
/// A `pending` job is aged by `created_at`, a `running` one by `started_at`.
/// Returns the number of jobs failed.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn fail_stale_sync_jobs(pool: &PgPool, max_age: Duration) -> Result<u64, DbError> {
    let cutoff = Utc::now() - max_age;
    let result = sqlx::query(
        "UPDATE sync_jobs \
         SET error_message = CASE status \
                 WHEN 'pending' THEN 'abandoned: never started' \
                 ELSE 'abandoned: still running after timeout' \
             END, \
             status = 'failed', completed_at = NOW() \
         WHERE (status = 'running' AND started_at < $1) \
            OR (status = 'pending' AND created_at < $1)",
    )
    .bind(cutoff)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

/// # Errors
///
/// Returns [`DbError::NotFound`] if no job has this id.
pub async fn get_sync_job(pool: &PgPool, id: i64) -> Result<SyncJobRow, DbError> {
    sqlx::query_as::<_, SyncJobRow>(&format!(
        "SELECT {SYNC_JOB_COLUMNS} FROM sync_jobs WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)
}

/// The caller's most recent jobs, optionally narrowed to one account.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_sync_jobs(
    pool: &PgPool,
    ctx: RequestContext,
    account_id: Option<i64>,
    limit: i64,
) -> Result<Vec<SyncJobRow>, DbError> {
    let rows = sqlx::query_as::<_, SyncJobRow>(
        "SELECT j.id, j.public_id, j.account_id, j.job_type, j.trigger_source, j.status, \
                j.started_at, j.completed_at, j.error_message, j.created_at \
         FROM sync_jobs j \
         JOIN accounts a ON a.id = j.account_id \
         WHERE a.user_id = $1 AND ($2::BIGINT IS NULL OR j.account_id = $2) \
         ORDER BY j.created_at DESC, j.id DESC \
         LIMIT $3",
    )
    .bind(ctx.user_id)
    .bind(account_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
