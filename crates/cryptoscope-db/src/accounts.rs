//! Database operations for `accounts`.

use chrono::{DateTime, Utc};
use cryptoscope_core::{Account, RequestContext};
use sqlx::PgPool;

use crate::DbError;

pub(crate) const ACCOUNT_COLUMNS: &str = "id, user_id, handle, display_name, follower_count, \
     following_count, post_count, is_active, last_synced_at";

#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct AccountRow {
    id: i64,
    user_id: i64,
    handle: String,
    display_name: Option<String>,
    follower_count: i64,
    following_count: i64,
    post_count: i64,
    is_active: bool,
    last_synced_at: Option<DateTime<Utc>>,
}

impl From<AccountRow> for Account {
    fn from(row: AccountRow) -> Self {
        Account {
            id: row.id,
            user_id: row.user_id,
            handle: row.handle,
            display_name: row.display_name,
            follower_count: row.follower_count,
            following_count: row.following_count,
            post_count: row.post_count,
            is_active: row.is_active,
            last_synced_at: row.last_synced_at,
        }
    }
}

/// Connects a new account for the caller. A leading `@` on the handle is dropped.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails (e.g. the caller already
/// tracks this handle).
pub async fn create_account(
    pool: &PgPool,
    ctx: RequestContext,
    handle: &str,
    display_name: Option<&str>,
) -> Result<Account, DbError> {
    let row = sqlx::query_as::<_, AccountRow>(&format!(
        "INSERT INTO accounts (user_id, handle, display_name) VALUES ($1, $2, $3) \
         RETURNING {ACCOUNT_COLUMNS}"
    ))
    .bind(ctx.user_id)
    .bind(handle.trim().trim_start_matches('@'))
    .bind(display_name)
    .fetch_one(pool)
    .await?;
    Ok(row.into())
}

/// Fetches an account regardless of owner. For background jobs only.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no account has this id.
pub async fn get_account(pool: &PgPool, account_id: i64) -> Result<Account, DbError> {
    sqlx::query_as::<_, AccountRow>(&format!(
        "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = $1"
    ))
    .bind(account_id)
    .fetch_optional(pool)
    .await?
    .map(Account::from)
    .ok_or(DbError::NotFound)
}

/// Fetches an account owned by the caller.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the account does not exist or belongs to
/// another user; the two cases are indistinguishable to the caller.
pub async fn get_account_for_user(
    pool: &PgPool,
    ctx: RequestContext,
    account_id: i64,
) -> Result<Account, DbError> {
    sqlx::query_as::<_, AccountRow>(&format!(
        "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = $1 AND user_id = $2"
    ))
    .bind(account_id)
    .bind(ctx.user_id)
    .fetch_optional(pool)
    .await?
    .map(Account::from)
    .ok_or(DbError::NotFound)
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_accounts_for_user(
    pool: &PgPool,
    ctx: RequestContext,
) -> Result<Vec<Account>, DbError> {
    let rows = sqlx::query_as::<_, AccountRow>(&format!(
        "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE user_id = $1 ORDER BY id"
    ))
    .bind(ctx.user_id)
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(Account::from).collect())
}

/// All active accounts across users, for scheduled jobs.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_active_accounts(pool: &PgPool) -> Result<Vec<Account>, DbError> {
    let rows = sqlx::query_as::<_, AccountRow>(&format!(
        "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE is_active ORDER BY id"
    ))
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(Account::from).collect())
}

/// Disconnects an account. Snapshots, posts and mentions cascade.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the caller owns no such account.
pub async fn delete_account(
    pool: &PgPool,
    ctx: RequestContext,
    account_id: i64,
) -> Result<(), DbError> {
    let result = sqlx::query("DELETE FROM accounts WHERE id = $1 AND user_id = $2")
        .bind(account_id)
        .bind(ctx.user_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}
