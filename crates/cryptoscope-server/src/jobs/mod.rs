//! Sync, alert-dispatch and weekly-report pipelines.
//!
//! Shared by the cron scheduler, the on-demand sync endpoint and the CLI so
//! every trigger runs the same code path.

pub mod alerts;
pub mod report;
pub mod sync;

use std::sync::Arc;

use cryptoscope_core::AppConfig;
use cryptoscope_db::DbError;
use cryptoscope_notify::{AutomationClient, NotificationSender, NotifyError, ResendSender};
use cryptoscope_twitter::{ProfileSource, TwitterClient, TwitterError};
use thiserror::Error;

pub use alerts::{dispatch_alerts, DispatchSummary};
pub use report::{build_weekly_report, send_weekly_reports, ReportSummary};
pub use sync::{
    refresh_competitor_now, run_sync_all, run_sync_job, sync_account_once, SyncRunSummary,
};

#[derive(Debug, Error)]
pub enum JobError {
    #[error(transparent)]
    Db(#[from] DbError),

    #[error(transparent)]
    Source(#[from] TwitterError),

    #[error(transparent)]
    Notify(#[from] NotifyError),

    #[error("no profile source configured")]
    SourceUnavailable,
}

/// External collaborators used by the pipelines.
///
/// `profiles` and `mailer` are optional: without an X bearer token syncs
/// carry the account's cached counts forward, and without a Resend key no
/// email is sent.
#[derive(Clone)]
pub struct Services {
    pub profiles: Option<Arc<dyn ProfileSource>>,
    pub mailer: Option<Arc<dyn NotificationSender>>,
    pub automation: AutomationClient,
    pub app_url: String,
    pub sync_max_retries: u32,
    pub retry_backoff_base_ms: u64,
}

impl std::fmt::Debug for Services {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Services")
            .field("profiles", &self.profiles.is_some())
            .field("mailer", &self.mailer.is_some())
            .field("automation", &self.automation)
            .field("app_url", &self.app_url)
            .field("sync_max_retries", &self.sync_max_retries)
            .field("retry_backoff_base_ms", &self.retry_backoff_base_ms)
            .finish()
    }
}

impl Services {
    /// Builds the production collaborators from config.
    ///
    /// # Errors
    ///
    /// Returns [`JobError`] if an HTTP client cannot be built or a configured
    /// base URL does not parse.
    pub fn from_config(config: &AppConfig) -> Result<Self, JobError> {
        let profiles: Option<Arc<dyn ProfileSource>> = match &config.twitter_bearer_token {
            Some(token) => Some(Arc::new(TwitterClient::new(
                token,
                config.http_timeout_secs,
                config.sync_max_retries,
                config.retry_backoff_base_ms,
            )?)),
            None => {
                tracing::warn!("TWITTER_BEARER_TOKEN not set; syncs will reuse cached counts");
                None
            }
        };

        let mailer: Option<Arc<dyn NotificationSender>> = match &config.resend_api_key {
            Some(key) => Some(Arc::new(ResendSender::new(
                key,
                &config.email_from,
                config.http_timeout_secs,
            )?)),
            None => {
                tracing::warn!("RESEND_API_KEY not set; email notifications disabled");
                None
            }
        };

        let automation =
            AutomationClient::new(&config.automation_base_url, config.http_timeout_secs)?;

        Ok(Self {
            profiles,
            mailer,
            automation,
            app_url: config.app_url.clone(),
            sync_max_retries: config.sync_max_retries,
            retry_backoff_base_ms: config.retry_backoff_base_ms,
        })
    }
}
