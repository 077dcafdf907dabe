//! Weekly per-account activity report.

use chrono::{DateTime, Duration, Utc};
use cryptoscope_core::Account;
use cryptoscope_insights::{weekly_report, WeeklyReport};
use cryptoscope_notify::{templates, NotificationSender};
use sqlx::PgPool;

use super::{JobError, Services};

const REPORT_DAYS: i64 = 7;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReportSummary {
    pub sent: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Aggregates the trailing week for one account.
///
/// # Errors
///
/// Returns [`JobError::Db`] if any read fails.
pub async fn build_weekly_report(
    pool: &PgPool,
    account: &Account,
    now: DateTime<Utc>,
) -> Result<WeeklyReport, JobError> {
    let since = now - Duration::days(REPORT_DAYS);
    let snapshots = cryptoscope_db::list_snapshots_since(pool, account.id, since).await?;
    let posts = cryptoscope_db::list_posts_since(pool, account.id, since).await?;
    let mentions = cryptoscope_db::list_mentions_since(pool, account.id, since).await?;
    Ok(weekly_report(now, account, &snapshots, &posts, &mentions))
}

/// Emails the weekly report for every active account whose owner has
/// notifications enabled.
///
/// # Errors
///
/// Returns [`JobError::Db`] only if the active accounts cannot be listed.
pub async fn send_weekly_reports(
    pool: &PgPool,
    services: &Services,
    now: DateTime<Utc>,
) -> Result<ReportSummary, JobError> {
    let mut summary = ReportSummary::default();
    let Some(mailer) = services.mailer.as_deref() else {
        tracing::warn!("no notification sender configured; skipping weekly reports");
        return Ok(summary);
    };

    for account in cryptoscope_db::list_active_accounts(pool).await? {
        let result = report_for_account(pool, services, mailer, &account, now).await;

        match result {
            Ok(true) => summary.sent += 1,
            Ok(false) => summary.skipped += 1,
            Err(e) => {
                summary.failed += 1;
                tracing::error!(account_id = account.id, error = %e, "weekly report failed");
            }
        }
    }

    tracing::info!(
        sent = summary.sent,
        skipped = summary.skipped,
        failed = summary.failed,
        "weekly reports complete"
    );
    Ok(summary)
}

/// Sends one account's report. Returns `false` when the owner opted out.
async fn report_for_account(
    pool: &PgPool,
    services: &Services,
    mailer: &dyn NotificationSender,
    account: &Account,
    now: DateTime<Utc>,
) -> Result<bool, JobError> {
    let owner = cryptoscope_db::get_user_contact(pool, account.user_id).await?;
    if !owner.email_notifications {
        return Ok(false);
    }
    let report = build_weekly_report(pool, account, now).await?;
    let email = templates::weekly_report(&services.app_url, &report);
    mailer.send(&owner.email, &email.subject, &email.html).await?;
    Ok(true)
}
