//! Database operations for `mentions`.

use chrono::{DateTime, Utc};
use cryptoscope_core::{Mention, Sentiment};
use sqlx::PgPool;

use crate::DbError;

const MENTION_COLUMNS: &str = "id, account_id, external_id, author_handle, \
     author_follower_count, text, published_at, sentiment, like_count";

#[derive(Debug, Clone)]
pub struct NewMention {
    pub external_id: String,
    pub author_handle: String,
    pub author_follower_count: i64,
    pub text: String,
    pub published_at: DateTime<Utc>,
    pub sentiment: Sentiment,
    pub like_count: i64,
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct MentionRow {
    id: i64,
    account_id: i64,
    external_id: String,
    author_handle: String,
    author_follower_count: i64,
    text: String,
    published_at: DateTime<Utc>,
    sentiment: String,
    like_count: i64,
}

impl TryFrom<MentionRow> for Mention {
    type Error = DbError;

    fn try_from(row: MentionRow) -> Result<Self, Self::Error> {
        let sentiment = row
            .sentiment
            .parse::<Sentiment>()
            .map_err(|_| DbError::InvalidColumn {
                column: "mentions.sentiment",
                value: row.sentiment.clone(),
            })?;
        Ok(Mention {
            id: row.id,
            account_id: row.account_id,
            external_id: row.external_id,
            author_handle: row.author_handle,
            author_follower_count: row.author_follower_count,
            text: row.text,
            published_at: row.published_at,
            sentiment,
            like_count: row.like_count,
        })
    }
}

/// Inserts a mention unless its external id is already stored for the account.
///
/// Returns `true` when a row was inserted.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn insert_mention_if_new(
    pool: &PgPool,
    account_id: i64,
    mention: &NewMention,
) -> Result<bool, DbError> {
    let result = sqlx::query(
        "INSERT INTO mentions \
             (account_id, external_id, author_handle, author_follower_count, text, \
              published_at, sentiment, like_count) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
         ON CONFLICT (account_id, external_id) DO NOTHING",
    )
    .bind(account_id)
    .bind(&mention.external_id)
    .bind(&mention.author_handle)
    .bind(mention.author_follower_count)
    .bind(&mention.text)
    .bind(mention.published_at)
    .bind(mention.sentiment.as_str())
    .bind(mention.like_count)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() == 1)
}

/// Mentions published at or after `since`, newest first.
///
/// # Errors
///
/// Returns [`DbError::InvalidColumn`] for an unknown stored sentiment, or
/// [`DbError::Sqlx`] if the query fails.
pub async fn list_mentions_since(
    pool: &PgPool,
    account_id: i64,
    since: DateTime<Utc>,
) -> Result<Vec<Mention>, DbError> {
    let rows = sqlx::query_as::<_, MentionRow>(&format!(
        "SELECT {MENTION_COLUMNS} FROM mentions \
         WHERE account_id = $1 AND published_at >= $2 \
         ORDER BY published_at DESC, id DESC"
    ))
    .bind(account_id)
    .bind(since)
    .fetch_all(pool)
    .await?;
    rows.into_iter().map(Mention::try_from).collect()
}
