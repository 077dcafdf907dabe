//! Database operations for `users`.

use sqlx::PgPool;

use crate::DbError;

/// Where and whether to send notifications for a user.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserContact {
    pub id: i64,
    pub email: String,
    pub name: Option<String>,
    pub email_notifications: bool,
}

/// Inserts a user and returns its id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails (e.g. duplicate email).
pub async fn create_user(pool: &PgPool, email: &str, name: Option<&str>) -> Result<i64, DbError> {
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO users (email, name) VALUES ($1, $2) RETURNING id",
    )
    .bind(email)
    .bind(name)
    .fetch_one(pool)
    .await?;
    Ok(id)
}

/// # Errors
///
/// Returns [`DbError::NotFound`] if the user does not exist.
pub async fn get_user_contact(pool: &PgPool, user_id: i64) -> Result<UserContact, DbError> {
    sqlx::query_as::<_, UserContact>(
        "SELECT id, email, name, email_notifications FROM users WHERE id = $1",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)
}

/// # Errors
///
/// Returns [`DbError::NotFound`] if the user does not exist.
pub async fn set_email_notifications(
    pool: &PgPool,
    user_id: i64,
    enabled: bool,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE users SET email_notifications = $1, updated_at = NOW() WHERE id = $2",
    )
    .bind(enabled)
    .bind(user_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}
