//! Reads (and fixture writes) for `hashtag_analytics`.

use cryptoscope_core::{HashtagAnalytic, HashtagPeriod};
use sqlx::PgPool;

use crate::DbError;

#[derive(Debug, Clone, sqlx::FromRow)]
struct HashtagRow {
    account_id: i64,
    hashtag: String,
    period: String,
    tweet_count: i64,
    avg_engagement: f64,
}

impl TryFrom<HashtagRow> for HashtagAnalytic {
    type Error = DbError;

    fn try_from(row: HashtagRow) -> Result<Self, Self::Error> {
        let period = row
            .period
            .parse::<HashtagPeriod>()
            .map_err(|_| DbError::InvalidColumn {
                column: "hashtag_analytics.period",
                value: row.period.clone(),
            })?;
        Ok(HashtagAnalytic {
            account_id: row.account_id,
            hashtag: row.hashtag,
            period,
            tweet_count: row.tweet_count,
            avg_engagement: row.avg_engagement,
        })
    }
}

/// Aggregated hashtag rows for one account and period.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_hashtag_analytics(
    pool: &PgPool,
    account_id: i64,
    period: HashtagPeriod,
) -> Result<Vec<HashtagAnalytic>, DbError> {
    let rows = sqlx::query_as::<_, HashtagRow>(
        "SELECT account_id, hashtag, period, tweet_count, avg_engagement \
         FROM hashtag_analytics \
         WHERE account_id = $1 AND period = $2 \
         ORDER BY hashtag",
    )
    .bind(account_id)
    .bind(period.as_str())
    .fetch_all(pool)
    .await?;
    rows.into_iter().map(HashtagAnalytic::try_from).collect()
}

/// Writes one aggregated row, replacing any previous value.
///
/// Production rows come from the external aggregation job; this exists for
/// seeding and tests.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_hashtag_analytic(pool: &PgPool, row: &HashtagAnalytic) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO hashtag_analytics (account_id, hashtag, period, tweet_count, avg_engagement) \
         VALUES ($1, $2, $3, $4, $5) \
         ON CONFLICT (account_id, hashtag, period) DO UPDATE SET \
             tweet_count = EXCLUDED.tweet_count, \
             avg_engagement = EXCLUDED.avg_engagement, \
             computed_at = NOW()",
    )
    .bind(row.account_id)
    .bind(&row.hashtag)
    .bind(row.period.as_str())
    .bind(row.tweet_count)
    .bind(row.avg_engagement)
    .execute(pool)
    .await?;
    Ok(())
}
