//! Ledger of alert conditions that have already been emailed.

use sqlx::PgPool;

use crate::DbError;

/// Claims `(account_id, dedup_key)` for sending.
///
/// Returns `true` if this call inserted the row, meaning the caller should
/// send; `false` if the condition was already notified.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn record_alert_notification(
    pool: &PgPool,
    account_id: i64,
    dedup_key: &str,
    alert_type: &str,
) -> Result<bool, DbError> {
    let result = sqlx::query(
        "INSERT INTO alert_notifications (account_id, dedup_key, alert_type) \
         VALUES ($1, $2, $3) \
         ON CONFLICT (account_id, dedup_key) DO NOTHING",
    )
    .bind(account_id)
    .bind(dedup_key)
    .bind(alert_type)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() == 1)
}

/// Drops a claim so the condition is retried on the next scan. Used when
/// sending failed after the claim was recorded.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the delete fails.
pub async fn release_alert_notification(
    pool: &PgPool,
    account_id: i64,
    dedup_key: &str,
) -> Result<(), DbError> {
    sqlx::query("DELETE FROM alert_notifications WHERE account_id = $1 AND dedup_key = $2")
        .bind(account_id)
        .bind(dedup_key)
        .execute(pool)
        .await?;
    Ok(())
}
