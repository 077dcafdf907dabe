//! Alert dispatcher: evaluates every active account and emails the owner
//! about milestone, viral-post and negative-sentiment alerts.
//!
//! Each `(account_id, dedup_key)` is claimed in the notification ledger
//! before sending, so a condition that persists across scans is emailed
//! once. A failed send releases the claim so the next scan retries it.

use chrono::{DateTime, Duration, Utc};
use cryptoscope_core::{Account, Alert, AlertData};
use cryptoscope_insights::{evaluate_account, AccountWindow};
use cryptoscope_notify::{templates, EmailMessage, NotificationSender};
use sqlx::PgPool;

use super::{JobError, Services};

const ALERT_WINDOW_HOURS: i64 = 24;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DispatchSummary {
    pub accounts_scanned: usize,
    pub emails_sent: usize,
    pub duplicates_skipped: usize,
    pub failures: usize,
}

/// The most recent two snapshots plus the last 24 hours of posts and
/// mentions: everything the detection rules look at for one account.
///
/// # Errors
///
/// Returns [`JobError::Db`] if any read fails.
pub async fn load_account_window(
    pool: &PgPool,
    account: &Account,
    now: DateTime<Utc>,
) -> Result<AccountWindow, JobError> {
    let since = now - Duration::hours(ALERT_WINDOW_HOURS);
    Ok(AccountWindow {
        account: account.clone(),
        snapshots: cryptoscope_db::list_recent_snapshots(pool, account.id, 2).await?,
        posts: cryptoscope_db::list_posts_since(pool, account.id, since).await?,
        mentions: cryptoscope_db::list_mentions_since(pool, account.id, since).await?,
    })
}

/// The email for an alert, if its kind is one owners are emailed about.
fn email_for(app_url: &str, account: &Account, alert: &Alert) -> Option<EmailMessage> {
    match &alert.data {
        AlertData::FollowerMilestone { milestone, .. } => Some(templates::follower_milestone(
            app_url,
            &account.handle,
            *milestone,
        )),
        AlertData::ViralPost {
            external_id,
            like_count,
            retweet_count,
            ..
        } => Some(templates::viral_post(
            app_url,
            &account.handle,
            external_id,
            *like_count,
            *retweet_count,
        )),
        AlertData::NegativeSentiment {
            count,
            window_hours,
            ..
        } => Some(templates::negative_sentiment(
            app_url,
            &account.handle,
            *count,
            *window_hours,
        )),
        _ => None,
    }
}

/// Scans all active accounts and sends any not-yet-sent alert emails.
///
/// Per-account errors are logged and counted; the scan continues.
///
/// # Errors
///
/// Returns [`JobError::Db`] only if the active accounts cannot be listed.
pub async fn dispatch_alerts(
    pool: &PgPool,
    services: &Services,
    now: DateTime<Utc>,
) -> Result<DispatchSummary, JobError> {
    let mut summary = DispatchSummary::default();
    let Some(mailer) = services.mailer.as_deref() else {
        tracing::warn!("no notification sender configured; skipping alert dispatch");
        return Ok(summary);
    };

    let accounts = cryptoscope_db::list_active_accounts(pool).await?;
    for account in &accounts {
        summary.accounts_scanned += 1;
        if let Err(e) = dispatch_for_account(pool, services, mailer, account, now, &mut summary).await
        {
            summary.failures += 1;
            tracing::error!(account_id = account.id, error = %e, "alert dispatch failed");
        }
    }

    tracing::info!(
        accounts = summary.accounts_scanned,
        sent = summary.emails_sent,
        duplicates = summary.duplicates_skipped,
        failures = summary.failures,
        "alert dispatch complete"
    );
    Ok(summary)
}

async fn dispatch_for_account(
    pool: &PgPool,
    services: &Services,
    mailer: &dyn NotificationSender,
    account: &Account,
    now: DateTime<Utc>,
    summary: &mut DispatchSummary,
) -> Result<(), JobError> {
    let owner = cryptoscope_db::get_user_contact(pool, account.user_id).await?;
    if !owner.email_notifications {
        tracing::debug!(account_id = account.id, "owner opted out of email notifications");
        return Ok(());
    }

    let window = load_account_window(pool, account, now).await?;
    let alerts = match evaluate_account(now, &window) {
        Ok(alerts) => alerts,
        Err(e) => {
            tracing::warn!(account_id = account.id, error = %e, "skipping account with malformed metrics");
            return Ok(());
        }
    };

    for alert in &alerts {
        let Some(email) = email_for(&services.app_url, account, alert) else {
            continue;
        };

        let dedup_key = alert.dedup_key();
        let claimed = cryptoscope_db::record_alert_notification(
            pool,
            account.id,
            &dedup_key,
            alert.kind().as_str(),
        )
        .await?;
        if !claimed {
            summary.duplicates_skipped += 1;
            continue;
        }

        match mailer.send(&owner.email, &email.subject, &email.html).await {
            Ok(()) => {
                summary.emails_sent += 1;
                tracing::info!(account_id = account.id, dedup_key = %dedup_key, "alert email sent");
            }
            Err(e) => {
                summary.failures += 1;
                tracing::error!(
                    account_id = account.id,
                    dedup_key = %dedup_key,
                    error = %e,
                    "alert email failed; releasing ledger claim"
                );
                cryptoscope_db::release_alert_notification(pool, account.id, &dedup_key).await?;
            }
        }
    }
    Ok(())
}
