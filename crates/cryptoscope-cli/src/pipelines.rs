//! Sync, alert and report pipeline handlers.
//!
//! These drive the same job functions the server's scheduler runs, so a
//! manual run behaves exactly like a scheduled one.

use chrono::Utc;
use clap::Subcommand;
use cryptoscope_core::AppConfig;
use cryptoscope_insights::{detect_alerts, rank_alerts};
use cryptoscope_server::jobs::{
    alerts::load_account_window, build_weekly_report, dispatch_alerts, run_sync_all,
    run_sync_job, send_weekly_reports, Services,
};

use crate::load_account;

/// Sub-commands available under `alerts`.
#[derive(Debug, Subcommand)]
pub enum AlertCommands {
    /// Evaluate every active account and email new alerts
    Scan,
    /// Print the current alerts for one account without notifying anyone
    Show {
        #[arg(long)]
        account: i64,
        #[arg(long, default_value = "20")]
        limit: usize,
    },
}

/// Sync a single account, or run the full scheduled sync.
///
/// # Errors
///
/// Returns an error if the sync job cannot be created or, for a single
/// account, if every attempt fails.
pub(crate) async fn run_sync(
    pool: &sqlx::PgPool,
    config: &AppConfig,
    account_filter: Option<i64>,
) -> anyhow::Result<()> {
    let services = Services::from_config(config)?;

    if let Some(account_id) = account_filter {
        let account = load_account(pool, account_id).await?;
        let job = cryptoscope_db::create_sync_job(pool, account.id, "cli").await?;
        let snapshot = run_sync_job(pool, &services, job.id, &account).await?;
        println!(
            "synced @{}: {} followers ({:+}), engagement {:.2}%",
            account.handle, snapshot.follower_count, snapshot.follower_delta, snapshot.engagement_rate
        );
        return Ok(());
    }

    let summary = run_sync_all(pool, &services, "cli").await?;
    println!(
        "sync complete: {} accounts synced, {} failed, {} competitors refreshed, {} stale jobs failed",
        summary.accounts_synced,
        summary.accounts_failed,
        summary.competitors_refreshed,
        summary.stale_jobs_failed
    );
    if summary.accounts_failed > 0 && summary.accounts_synced == 0 {
        anyhow::bail!("all {} accounts failed to sync", summary.accounts_failed);
    }
    Ok(())
}

/// # Errors
///
/// Returns an error if the alert dispatcher cannot read accounts.
pub(crate) async fn run_alert_scan(pool: &sqlx::PgPool, config: &AppConfig) -> anyhow::Result<()> {
    let services = Services::from_config(config)?;
    if services.mailer.is_none() {
        println!("RESEND_API_KEY is not set; nothing will be emailed");
    }

    let summary = dispatch_alerts(pool, &services, Utc::now()).await?;
    println!(
        "alert scan complete: {} accounts scanned, {} emails sent, {} already notified, {} failures",
        summary.accounts_scanned, summary.emails_sent, summary.duplicates_skipped, summary.failures
    );
    Ok(())
}

/// # Errors
///
/// Returns an error if the account is missing or its metrics cannot be read.
pub(crate) async fn run_alert_show(
    pool: &sqlx::PgPool,
    account_id: i64,
    limit: usize,
) -> anyhow::Result<()> {
    let account = load_account(pool, account_id).await?;
    let now = Utc::now();
    let window = load_account_window(pool, &account, now).await?;
    let alerts = rank_alerts(detect_alerts(now, &[window], &[]), limit);

    if alerts.is_empty() {
        println!("no alerts for @{}", account.handle);
        return Ok(());
    }

    println!("{:<10}{:<22}TITLE", "SEVERITY", "TYPE");
    for alert in &alerts {
        println!(
            "{:<10}{:<22}{}",
            format!("{:?}", alert.severity).to_lowercase(),
            alert.kind().as_str(),
            alert.title
        );
    }
    Ok(())
}

/// Print the trailing-week report for one account as markdown.
///
/// # Errors
///
/// Returns an error if the account is missing or the query fails.
pub(crate) async fn run_report_print(pool: &sqlx::PgPool, account_id: i64) -> anyhow::Result<()> {
    let account = load_account(pool, account_id).await?;
    let now = Utc::now();
    let report = build_weekly_report(pool, &account, now).await?;

    println!("# Weekly Report: @{}", report.handle);
    println!();
    println!("**Generated**: {}", now.format("%Y-%m-%d %H:%M UTC"));
    println!();
    println!("| Metric | Value |");
    println!("|--------|-------|");
    println!("| Follower change | {:+} |", report.follower_delta);
    println!("| Posts | {} |", report.post_count);
    println!("| Likes | {} |", report.total_likes);
    println!("| Retweets | {} |", report.total_retweets);
    println!("| Mentions | {} |", report.mention_count);
    if let Some(url) = &report.top_post_url {
        println!();
        println!("Top post: {url}");
    }
    Ok(())
}

/// # Errors
///
/// Returns an error if the mailer is not configured or accounts cannot be read.
pub(crate) async fn run_report_send(pool: &sqlx::PgPool, config: &AppConfig) -> anyhow::Result<()> {
    let services = Services::from_config(config)?;
    if services.mailer.is_none() {
        anyhow::bail!("RESEND_API_KEY must be set to send weekly reports");
    }

    let summary = send_weekly_reports(pool, &services, Utc::now()).await?;
    println!(
        "weekly reports: {} sent, {} skipped, {} failed",
        summary.sent, summary.skipped, summary.failed
    );
    Ok(())
}
