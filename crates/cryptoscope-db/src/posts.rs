//! Database operations for `posts`.

use chrono::{DateTime, Utc};
use cryptoscope_core::Post;
use sqlx::PgPool;

use crate::DbError;

const POST_COLUMNS: &str = "id, account_id, external_id, published_at, like_count, \
     retweet_count, reply_count, impression_count";

/// A post as observed from the profile source, before it has a local id.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub external_id: String,
    pub text: String,
    pub published_at: DateTime<Utc>,
    pub like_count: i64,
    pub retweet_count: i64,
    pub reply_count: i64,
    pub impression_count: i64,
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct PostRow {
    id: i64,
    account_id: i64,
    external_id: String,
    published_at: DateTime<Utc>,
    like_count: i64,
    retweet_count: i64,
    reply_count: i64,
    impression_count: i64,
}

impl From<PostRow> for Post {
    fn from(row: PostRow) -> Self {
        Post {
            id: row.id,
            account_id: row.account_id,
            external_id: row.external_id,
            published_at: row.published_at,
            like_count: row.like_count,
            retweet_count: row.retweet_count,
            reply_count: row.reply_count,
            impression_count: row.impression_count,
        }
    }
}

/// Inserts a post or refreshes its counts if the external id is already known.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_post(pool: &PgPool, account_id: i64, post: &NewPost) -> Result<Post, DbError> {
    let row = sqlx::query_as::<_, PostRow>(&format!(
        "INSERT INTO posts \
             (account_id, external_id, text, published_at, like_count, retweet_count, \
              reply_count, impression_count) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
         ON CONFLICT (account_id, external_id) DO UPDATE SET \
             like_count = EXCLUDED.like_count, \
             retweet_count = EXCLUDED.retweet_count, \
             reply_count = EXCLUDED.reply_count, \
             impression_count = EXCLUDED.impression_count, \
             updated_at = NOW() \
         RETURNING {POST_COLUMNS}"
    ))
    .bind(account_id)
    .bind(&post.external_id)
    .bind(&post.text)
    .bind(post.published_at)
    .bind(post.like_count)
    .bind(post.retweet_count)
    .bind(post.reply_count)
    .bind(post.impression_count)
    .fetch_one(pool)
    .await?;
    Ok(row.into())
}

/// Posts published at or after `since`, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_posts_since(
    pool: &PgPool,
    account_id: i64,
    since: DateTime<Utc>,
) -> Result<Vec<Post>, DbError> {
    let rows = sqlx::query_as::<_, PostRow>(&format!(
        "SELECT {POST_COLUMNS} FROM posts \
         WHERE account_id = $1 AND published_at >= $2 \
         ORDER BY published_at DESC, id DESC"
    ))
    .bind(account_id)
    .bind(since)
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(Post::from).collect())
}
