//! Postgres metrics store for CryptoScope.

use std::time::Duration;

use cryptoscope_core::AppConfig;
use sqlx::{postgres::PgPoolOptions, PgPool};
use thiserror::Error;

pub mod accounts;
pub mod agents;
pub mod alert_ledger;
pub mod competitors;
pub mod hashtags;
pub mod mentions;
pub mod posts;
pub mod snapshots;
pub mod sync_jobs;
pub mod users;

pub use accounts::{
    create_account, delete_account, get_account, get_account_for_user, list_accounts_for_user,
    list_active_accounts,
};
pub use agents::{
    agent_stats, complete_agent_task, create_agent, create_agent_task, delete_agent,
    fail_agent_task, get_agent_for_user, get_agent_task, list_agent_tasks, list_agents,
    mark_agent_task_submitted, set_agent_status, AgentRow, AgentStats, AgentStatus, AgentTaskRow,
};
pub use alert_ledger::{record_alert_notification, release_alert_notification};
pub use competitors::{
    add_competitor, get_competitor_for_user, list_all_competitors, list_competitors,
    refresh_competitor, remove_competitor,
};
pub use hashtags::{list_hashtag_analytics, upsert_hashtag_analytic};
pub use mentions::{insert_mention_if_new, list_mentions_since, NewMention};
pub use posts::{list_posts_since, upsert_post, NewPost};
pub use snapshots::{ingest_snapshot, list_recent_snapshots, list_snapshots_since};
pub use sync_jobs::{
    complete_sync_job, create_sync_job, fail_stale_sync_jobs, fail_sync_job, get_sync_job,
    list_sync_jobs, start_sync_job, SyncJobRow,
};
pub use users::{create_user, get_user_contact, set_email_notifications, UserContact};

const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_MIN_CONNECTIONS: u32 = 1;
const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 10;

// Path relative to crates/cryptoscope-db/Cargo.toml; resolves to <workspace-root>/migrations/
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations");

#[derive(Debug, Clone, Copy)]
pub struct PoolConfig {
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: DEFAULT_MAX_CONNECTIONS,
            min_connections: DEFAULT_MIN_CONNECTIONS,
            acquire_timeout_secs: DEFAULT_ACQUIRE_TIMEOUT_SECS,
        }
    }
}

impl PoolConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            max_connections: config.db_max_connections,
            min_connections: config.db_min_connections,
            acquire_timeout_secs: config.db_acquire_timeout_secs,
        }
    }
}

#[derive(Debug, Error)]
pub enum DbError {
    #[error("record not found")]
    NotFound,

    #[error("quota exceeded: at most {limit} allowed")]
    QuotaExceeded { limit: i64 },

    #[error("sync job {id} is not in expected status '{expected_status}'")]
    InvalidSyncJobTransition {
        id: i64,
        expected_status: &'static str,
    },

    #[error("agent task {id} is not in expected status '{expected_status}'")]
    InvalidAgentTaskTransition {
        id: i64,
        expected_status: &'static str,
    },

    #[error("unexpected value in column {column}: {value}")]
    InvalidColumn { column: &'static str, value: String },

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error(transparent)]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Connect to a Postgres pool using explicit URL and config.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the connection cannot be established.
pub async fn connect_pool(database_url: &str, config: PoolConfig) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .connect(database_url)
        .await
}

/// Run all pending migrations against the pool.
///
/// Returns the number of migrations that were applied.
///
/// # Errors
///
/// Returns [`sqlx::migrate::MigrateError`] if any migration fails.
pub async fn run_migrations(pool: &PgPool) -> Result<usize, sqlx::migrate::MigrateError> {
    // _sqlx_migrations may not exist yet on a fresh database.
    let applied_before = applied_migrations(pool).await;
    MIGRATOR.run(pool).await?;
    let applied_after = applied_migrations(pool).await;

    let delta = (applied_after - applied_before).max(0);
    Ok(usize::try_from(delta).unwrap_or(0))
}

async fn applied_migrations(pool: &PgPool) -> i64 {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM _sqlx_migrations WHERE success = true")
        .fetch_one(pool)
        .await
        .unwrap_or(0)
}

/// Verify the pool has a live connection.
///
/// # Errors
///
/// Returns [`DbError`] if `SELECT 1` fails.
pub async fn health_check(pool: &PgPool) -> Result<(), DbError> {
    sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(pool)
        .await?;
    Ok(())
}
