//! Background job scheduler.
//!
//! Initialises a [`JobScheduler`] at server startup and registers the
//! recurring sync, alert-scan and weekly-report jobs. Cron expressions come
//! from [`AppConfig`].

use std::sync::Arc;

use chrono::Utc;
use cryptoscope_core::AppConfig;
use sqlx::PgPool;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

use crate::jobs::{dispatch_alerts, run_sync_all, send_weekly_reports, Services};

/// Builds and starts the background job scheduler.
///
/// Returns the running [`JobScheduler`] handle, which must be kept alive
/// for the lifetime of the process; dropping it shuts down all jobs.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised,
/// a cron expression is invalid, or the scheduler fails to start.
pub async fn build_scheduler(
    pool: PgPool,
    config: Arc<AppConfig>,
    services: Arc<Services>,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;
    let pool = Arc::new(pool);

    register_sync_job(&scheduler, &config.sync_cron, Arc::clone(&pool), Arc::clone(&services))
        .await?;
    register_alert_scan_job(
        &scheduler,
        &config.alert_scan_cron,
        Arc::clone(&pool),
        Arc::clone(&services),
    )
    .await?;
    register_weekly_report_job(&scheduler, &config.weekly_report_cron, pool, services).await?;

    scheduler.start().await?;
    Ok(scheduler)
}

/// Sync every active account and refresh competitors.
///
/// Default cadence is every four hours (`0 0 */4 * * *`).
async fn register_sync_job(
    scheduler: &JobScheduler,
    cron: &str,
    pool: Arc<PgPool>,
    services: Arc<Services>,
) -> Result<(), JobSchedulerError> {
    let job = Job::new_async(cron, move |_uuid, _lock| {
        let pool = Arc::clone(&pool);
        let services = Arc::clone(&services);

        Box::pin(async move {
            tracing::info!("scheduler: starting account sync run");
            match run_sync_all(&pool, &services, "scheduler").await {
                Ok(summary) => tracing::info!(
                    synced = summary.accounts_synced,
                    failed = summary.accounts_failed,
                    stale = summary.stale_jobs_failed,
                    competitors = summary.competitors_refreshed,
                    "scheduler: account sync run complete"
                ),
                Err(e) => tracing::error!(error = %e, "scheduler: account sync run failed"),
            }
        })
    })?;

    scheduler.add(job).await?;
    tracing::info!(cron, "scheduler: registered sync job");
    Ok(())
}

/// Evaluate alerts and email new ones. Default every 30 minutes.
async fn register_alert_scan_job(
    scheduler: &JobScheduler,
    cron: &str,
    pool: Arc<PgPool>,
    services: Arc<Services>,
) -> Result<(), JobSchedulerError> {
    let job = Job::new_async(cron, move |_uuid, _lock| {
        let pool = Arc::clone(&pool);
        let services = Arc::clone(&services);

        Box::pin(async move {
            tracing::info!("scheduler: starting alert scan");
            if let Err(e) = dispatch_alerts(&pool, &services, Utc::now()).await {
                tracing::error!(error = %e, "scheduler: alert scan failed");
            }
            tracing::info!("scheduler: alert scan complete");
        })
    })?;

    scheduler.add(job).await?;
    tracing::info!(cron, "scheduler: registered alert scan job");
    Ok(())
}

/// Email weekly reports. Default Monday 09:00 UTC.
async fn register_weekly_report_job(
    scheduler: &JobScheduler,
    cron: &str,
    pool: Arc<PgPool>,
    services: Arc<Services>,
) -> Result<(), JobSchedulerError> {
    let job = Job::new_async(cron, move |_uuid, _lock| {
        let pool = Arc::clone(&pool);
        let services = Arc::clone(&services);

        Box::pin(async move {
            tracing::info!("scheduler: starting weekly report run");
            if let Err(e) = send_weekly_reports(&pool, &services, Utc::now()).await {
                tracing::error!(error = %e, "scheduler: weekly report run failed");
            }
            tracing::info!("scheduler: weekly report run complete");
        })
    })?;

    scheduler.add(job).await?;
    tracing::info!(cron, "scheduler: registered weekly report job");
    Ok(())
}
