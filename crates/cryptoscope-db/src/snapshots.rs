//! Snapshot ingestion and reads.

use chrono::{DateTime, Utc};
use cryptoscope_core::{Observation, RequestContext, Snapshot};
use cryptoscope_insights::follower_delta;
use sqlx::PgPool;

use crate::DbError;

const SNAPSHOT_COLUMNS: &str = "id, account_id, captured_at, follower_count, following_count, \
     post_count, follower_delta, engagement_rate, avg_likes, avg_retweets, avg_replies, \
     avg_impressions";

#[derive(Debug, Clone, sqlx::FromRow)]
struct SnapshotRow {
    id: i64,
    account_id: i64,
    captured_at: DateTime<Utc>,
    follower_count: i64,
    following_count: i64,
    post_count: i64,
    follower_delta: i64,
    engagement_rate: f64,
    avg_likes: f64,
    avg_retweets: f64,
    avg_replies: f64,
    avg_impressions: f64,
}

impl From<SnapshotRow> for Snapshot {
    fn from(row: SnapshotRow) -> Self {
        Snapshot {
            id: row.id,
            account_id: row.account_id,
            captured_at: row.captured_at,
            follower_count: row.follower_count,
            following_count: row.following_count,
            post_count: row.post_count,
            follower_delta: row.follower_delta,
            engagement_rate: row.engagement_rate,
            avg_likes: row.avg_likes,
            avg_retweets: row.avg_retweets,
            avg_replies: row.avg_replies,
            avg_impressions: row.avg_impressions,
        }
    }
}

/// Persists one new snapshot for an account the caller owns.
///
/// Runs in a single transaction that first locks the account row, so
/// concurrent ingestions for the same account serialize: each computes its
/// delta against exactly one predecessor and sorts strictly after it. The
/// account's cached counts and `last_synced_at` are updated in the same
/// transaction.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] (and writes nothing) if the caller owns no
/// such account, or [`DbError::Sqlx`] if any statement fails.
pub async fn ingest_snapshot(
    pool: &PgPool,
    ctx: RequestContext,
    account_id: i64,
    observation: &Observation,
) -> Result<Snapshot, DbError> {
    let mut tx = pool.begin().await?;

    sqlx::query_scalar::<_, i64>(
        "SELECT id FROM accounts WHERE id = $1 AND user_id = $2 FOR UPDATE",
    )
    .bind(account_id)
    .bind(ctx.user_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or(DbError::NotFound)?;

    let prior: Option<(i64, DateTime<Utc>)> = sqlx::query_as(
        "SELECT follower_count, captured_at FROM snapshots \
         WHERE account_id = $1 \
         ORDER BY captured_at DESC, id DESC \
         LIMIT 1",
    )
    .bind(account_id)
    .fetch_optional(&mut *tx)
    .await?;

    let follower_delta = follower_delta(prior.map(|(count, _)| count), observation.follower_count);

    // clock_timestamp() is read after the lock; GREATEST keeps the order
    // total even if the database clock steps backwards.
    let row = sqlx::query_as::<_, SnapshotRow>(&format!(
        "INSERT INTO snapshots \
             (account_id, captured_at, follower_count, following_count, post_count, \
              follower_delta, engagement_rate, avg_likes, avg_retweets, avg_replies, \
              avg_impressions) \
         VALUES ($1, GREATEST(clock_timestamp(), $2), $3, $4, $5, $6, $7, $8, $9, $10, $11) \
         RETURNING {SNAPSHOT_COLUMNS}"
    ))
    .bind(account_id)
    .bind(prior.map(|(_, at)| at))
    .bind(observation.follower_count)
    .bind(observation.following_count)
    .bind(observation.post_count)
    .bind(follower_delta)
    .bind(observation.engagement_rate)
    .bind(observation.avg_likes)
    .bind(observation.avg_retweets)
    .bind(observation.avg_replies)
    .bind(observation.avg_impressions)
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query(
        "UPDATE accounts \
         SET follower_count = $1, following_count = $2, post_count = $3, \
             last_synced_at = $4, updated_at = NOW() \
         WHERE id = $5",
    )
    .bind(observation.follower_count)
    .bind(observation.following_count)
    .bind(observation.post_count)
    .bind(row.captured_at)
    .bind(account_id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    tracing::debug!(
        account_id,
        snapshot_id = row.id,
        follower_delta,
        "snapshot ingested"
    );
    Ok(row.into())
}

/// The most recent `limit` snapshots, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_recent_snapshots(
    pool: &PgPool,
    account_id: i64,
    limit: i64,
) -> Result<Vec<Snapshot>, DbError> {
    let rows = sqlx::query_as::<_, SnapshotRow>(&format!(
        "SELECT {SNAPSHOT_COLUMNS} FROM snapshots \
         WHERE account_id = $1 \
         ORDER BY captured_at DESC, id DESC \
         LIMIT $2"
    ))
    .bind(account_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(Snapshot::from).collect())
}

/// Snapshots captured at or after `since`, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_snapshots_since(
    pool: &PgPool,
    account_id: i64,
    since: DateTime<Utc>,
) -> Result<Vec<Snapshot>, DbError> {
    let rows = sqlx::query_as::<_, SnapshotRow>(&format!(
        "SELECT {SNAPSHOT_COLUMNS} FROM snapshots \
         WHERE account_id = $1 AND captured_at >= $2 \
         ORDER BY captured_at DESC, id DESC"
    ))
    .bind(account_id)
    .bind(since)
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(Snapshot::from).collect())
}
