//! Database operations for `competitors`.

use chrono::{DateTime, Utc};
use cryptoscope_core::{Competitor, RequestContext, COMPETITOR_QUOTA};
use sqlx::PgPool;

use crate::DbError;

const COMPETITOR_COLUMNS: &str = "id, user_id, handle, follower_count, previous_follower_count, \
     tweet_count, avg_engagement_rate, last_synced_at";

#[derive(Debug, Clone, sqlx::FromRow)]
struct CompetitorRow {
    id: i64,
    user_id: i64,
    handle: String,
    follower_count: i64,
    previous_follower_count: Option<i64>,
    tweet_count: i64,
    avg_engagement_rate: f64,
    last_synced_at: Option<DateTime<Utc>>,
}

impl From<CompetitorRow> for Competitor {
    fn from(row: CompetitorRow) -> Self {
        Competitor {
            id: row.id,
            user_id: row.user_id,
            handle: row.handle,
            follower_count: row.follower_count,
            previous_follower_count: row.previous_follower_count,
            tweet_count: row.tweet_count,
            avg_engagement_rate: row.avg_engagement_rate,
            last_synced_at: row.last_synced_at,
        }
    }
}

/// The caller's competitors, largest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_competitors(
    pool: &PgPool,
    ctx: RequestContext,
) -> Result<Vec<Competitor>, DbError> {
    let rows = sqlx::query_as::<_, CompetitorRow>(&format!(
        "SELECT {COMPETITOR_COLUMNS} FROM competitors \
         WHERE user_id = $1 \
         ORDER BY follower_count DESC, id"
    ))
    .bind(ctx.user_id)
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(Competitor::from).collect())
}

/// Every competitor across users, for the refresh job.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_all_competitors(pool: &PgPool) -> Result<Vec<Competitor>, DbError> {
    let rows = sqlx::query_as::<_, CompetitorRow>(&format!(
        "SELECT {COMPETITOR_COLUMNS} FROM competitors ORDER BY id"
    ))
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(Competitor::from).collect())
}

/// One of the caller's competitors.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the caller has no such competitor.
pub async fn get_competitor_for_user(
    pool: &PgPool,
    ctx: RequestContext,
    competitor_id: i64,
) -> Result<Competitor, DbError> {
    sqlx::query_as::<_, CompetitorRow>(&format!(
        "SELECT {COMPETITOR_COLUMNS} FROM competitors WHERE id = $1 AND user_id = $2"
    ))
    .bind(competitor_id)
    .bind(ctx.user_id)
    .fetch_optional(pool)
    .await?
    .map(Competitor::from)
    .ok_or(DbError::NotFound)
}

/// Starts tracking `handle` for the caller.
///
/// The quota check and insert run in one transaction holding a lock on the
/// user's row, so concurrent adds cannot overshoot [`COMPETITOR_QUOTA`].
/// Handles are stored lowercased without a leading `@`; adding a handle the
/// caller already tracks, in any case, returns the existing row and does not
/// count against the quota.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the user does not exist,
/// [`DbError::QuotaExceeded`] if the caller already tracks the maximum, or
/// [`DbError::Sqlx`] on query failure. Nothing is written on error.
pub async fn add_competitor(
    pool: &PgPool,
    ctx: RequestContext,
    handle: &str,
) -> Result<Competitor, DbError> {
    let handle = handle.trim().trim_start_matches('@').to_lowercase();
    let mut tx = pool.begin().await?;

    sqlx::query_scalar::<_, i64>("SELECT id FROM users WHERE id = $1 FOR UPDATE")
        .bind(ctx.user_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(DbError::NotFound)?;

    let existing = sqlx::query_as::<_, CompetitorRow>(&format!(
        "SELECT {COMPETITOR_COLUMNS} FROM competitors WHERE user_id = $1 AND lower(handle) = $2"
    ))
    .bind(ctx.user_id)
    .bind(&handle)
    .fetch_optional(&mut *tx)
    .await?;
    if let Some(row) = existing {
        tx.commit().await?;
        return Ok(row.into());
    }

    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM competitors WHERE user_id = $1")
        .bind(ctx.user_id)
        .fetch_one(&mut *tx)
        .await?;
    if count >= COMPETITOR_QUOTA {
        return Err(DbError::QuotaExceeded {
            limit: COMPETITOR_QUOTA,
        });
    }

    let row = sqlx::query_as::<_, CompetitorRow>(&format!(
        "INSERT INTO competitors (user_id, handle) VALUES ($1, $2) \
         RETURNING {COMPETITOR_COLUMNS}"
    ))
    .bind(ctx.user_id)
    .bind(&handle)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(row.into())
}

/// Stops tracking a competitor.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the caller has no such competitor.
pub async fn remove_competitor(
    pool: &PgPool,
    ctx: RequestContext,
    competitor_id: i64,
) -> Result<(), DbError> {
    let result = sqlx::query("DELETE FROM competitors WHERE id = $1 AND user_id = $2")
        .bind(competitor_id)
        .bind(ctx.user_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

/// Records freshly fetched public counts for a competitor.
///
/// The follower count being replaced becomes `previous_follower_count`; on
/// the first refresh there is nothing to compare against and it stays null.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the competitor no longer exists.
pub async fn refresh_competitor(
    pool: &PgPool,
    competitor_id: i64,
    follower_count: i64,
    tweet_count: i64,
    avg_engagement_rate: f64,
) -> Result<Competitor, DbError> {
    sqlx::query_as::<_, CompetitorRow>(&format!(
        "UPDATE competitors SET \
             previous_follower_count = CASE WHEN last_synced_at IS NULL THEN NULL \
                                            ELSE follower_count END, \
             follower_count = $1, \
             tweet_count = $2, \
             avg_engagement_rate = $3, \
             last_synced_at = NOW() \
         WHERE id = $4 \
         RETURNING {COMPETITOR_COLUMNS}"
    ))
    .bind(follower_count)
    .bind(tweet_count)
    .bind(avg_engagement_rate)
    .bind(competitor_id)
    .fetch_optional(pool)
    .await?
    .map(Competitor::from)
    .ok_or(DbError::NotFound)
}
