//! Account and competitor sync.

use std::time::Duration as StdDuration;

use chrono::{Duration, Utc};
use cryptoscope_core::{Account, Competitor, Post, RequestContext, Snapshot};
use cryptoscope_db::{NewMention, NewPost};
use cryptoscope_insights::{classify_mention, summarize_posts};
use cryptoscope_twitter::ProfileData;
use sqlx::PgPool;

use super::{JobError, Services};

/// Posts and mentions older than this are not requested from the source,
/// and the engagement averages on each snapshot cover the same window.
const RECENT_WINDOW_DAYS: i64 = 7;

/// Jobs still `running`, or never started, after this long are assumed abandoned.
const STALE_JOB_HOURS: i64 = 1;

const MAX_BACKOFF_MS: u64 = 60_000;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SyncRunSummary {
    pub stale_jobs_failed: u64,
    pub accounts_synced: usize,
    pub accounts_failed: usize,
    pub competitors_refreshed: usize,
}

/// One full scheduled pass: reap stale jobs, sync every active account, then
/// refresh competitor counts.
///
/// Per-account and per-competitor failures are logged and recorded on the
/// job row; only a failure to list accounts aborts the pass.
///
/// # Errors
///
/// Returns [`JobError::Db`] if stale jobs cannot be reaped or the active
/// accounts cannot be listed.
pub async fn run_sync_all(
    pool: &PgPool,
    services: &Services,
    trigger_source: &str,
) -> Result<SyncRunSummary, JobError> {
    let mut summary = SyncRunSummary {
        stale_jobs_failed: cryptoscope_db::fail_stale_sync_jobs(
            pool,
            Duration::hours(STALE_JOB_HOURS),
        )
        .await?,
        ..SyncRunSummary::default()
    };
    if summary.stale_jobs_failed > 0 {
        tracing::warn!(
            count = summary.stale_jobs_failed,
            "marked stale sync jobs as failed"
        );
    }

    let accounts = cryptoscope_db::list_active_accounts(pool).await?;
    tracing::info!(count = accounts.len(), "syncing active accounts");

    for account in &accounts {
        let job = match cryptoscope_db::create_sync_job(pool, account.id, trigger_source).await {
            Ok(job) => job,
            Err(e) => {
                tracing::error!(account_id = account.id, error = %e, "failed to create sync job");
                summary.accounts_failed += 1;
                continue;
            }
        };

        match run_sync_job(pool, services, job.id, account).await {
            Ok(_) => summary.accounts_synced += 1,
            Err(_) => summary.accounts_failed += 1,
        }
    }

    summary.competitors_refreshed = refresh_competitors(pool, services).await;
    Ok(summary)
}

/// Drives one `pending` job through `running` to `completed` or `failed`.
///
/// The sync itself is attempted up to `1 + sync_max_retries` times with
/// exponential back-off. The last error is stored on the job row.
///
/// # Errors
///
/// Returns the final [`JobError`] when every attempt failed or the job
/// could not be transitioned.
pub async fn run_sync_job(
    pool: &PgPool,
    services: &Services,
    job_id: i64,
    account: &Account,
) -> Result<Snapshot, JobError> {
    cryptoscope_db::start_sync_job(pool, job_id).await?;

    let mut attempt: u32 = 0;
    let result = loop {
        match sync_account_once(pool, services, account).await {
            Ok(snapshot) => break Ok(snapshot),
            Err(e) if attempt < services.sync_max_retries => {
                let delay_ms = backoff_ms(services.retry_backoff_base_ms, attempt);
                tracing::warn!(
                    account_id = account.id,
                    job_id,
                    attempt = attempt + 1,
                    max_retries = services.sync_max_retries,
                    delay_ms,
                    error = %e,
                    "sync attempt failed; retrying"
                );
                tokio::time::sleep(StdDuration::from_millis(delay_ms)).await;
                attempt += 1;
            }
            Err(e) => break Err(e),
        }
    };

    match result {
        Ok(snapshot) => {
            cryptoscope_db::complete_sync_job(pool, job_id).await?;
            Ok(snapshot)
        }
        Err(e) => {
            tracing::error!(account_id = account.id, job_id, error = %e, "sync failed");
            if let Err(mark_err) = cryptoscope_db::fail_sync_job(pool, job_id, &e.to_string()).await
            {
                tracing::error!(job_id, error = %mark_err, "failed to mark sync job as failed");
            }
            Err(e)
        }
    }
}

fn backoff_ms(base_ms: u64, attempt: u32) -> u64 {
    base_ms
        .saturating_mul(2_u64.saturating_pow(attempt))
        .min(MAX_BACKOFF_MS)
}

/// Fetches one account from the source, stores its posts and new mentions,
/// and ingests a snapshot.
///
/// Without a configured source the account's cached counts are carried
/// forward, so the snapshot still advances with a zero delta.
///
/// # Errors
///
/// Returns [`JobError::Source`] if the fetch fails, or [`JobError::Db`] if
/// any write fails.
pub async fn sync_account_once(
    pool: &PgPool,
    services: &Services,
    account: &Account,
) -> Result<Snapshot, JobError> {
    let since = Utc::now() - Duration::days(RECENT_WINDOW_DAYS);

    let profile = match &services.profiles {
        Some(source) => source.fetch(&account.handle, since).await?,
        None => ProfileData::cached(
            account.follower_count,
            account.following_count,
            account.post_count,
        ),
    };

    for post in &profile.posts {
        let new_post = NewPost {
            external_id: post.external_id.clone(),
            text: post.text.clone(),
            published_at: post.published_at,
            like_count: post.like_count,
            retweet_count: post.retweet_count,
            reply_count: post.reply_count,
            impression_count: post.impression_count,
        };
        cryptoscope_db::upsert_post(pool, account.id, &new_post).await?;
    }

    let mut new_mentions = 0_usize;
    for mention in &profile.mentions {
        let new_mention = NewMention {
            external_id: mention.external_id.clone(),
            author_handle: mention.author_handle.clone(),
            author_follower_count: mention.author_follower_count,
            text: mention.text.clone(),
            published_at: mention.published_at,
            sentiment: classify_mention(&mention.text),
            like_count: mention.like_count,
        };
        if cryptoscope_db::insert_mention_if_new(pool, account.id, &new_mention).await? {
            new_mentions += 1;
        }
    }

    let recent_posts = cryptoscope_db::list_posts_since(pool, account.id, since).await?;
    let observation = summarize_posts(
        profile.follower_count,
        profile.following_count,
        profile.post_count,
        &recent_posts,
    );
    let snapshot = cryptoscope_db::ingest_snapshot(
        pool,
        RequestContext::new(account.user_id),
        account.id,
        &observation,
    )
    .await?;

    tracing::info!(
        account_id = account.id,
        handle = %account.handle,
        follower_count = snapshot.follower_count,
        follower_delta = snapshot.follower_delta,
        posts = profile.posts.len(),
        new_mentions,
        "account synced"
    );
    Ok(snapshot)
}

/// Refreshes every tracked competitor from the source. Returns how many
/// were updated; a missing source skips the refresh entirely.
pub async fn refresh_competitors(pool: &PgPool, services: &Services) -> usize {
    let Some(source) = &services.profiles else {
        tracing::debug!("no profile source configured; skipping competitor refresh");
        return 0;
    };

    let competitors = match cryptoscope_db::list_all_competitors(pool).await {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(error = %e, "failed to load competitors");
            return 0;
        }
    };

    let since = Utc::now() - Duration::days(RECENT_WINDOW_DAYS);
    let mut refreshed = 0;
    for competitor in &competitors {
        match refresh_one(pool, source.as_ref(), competitor, since).await {
            Ok(updated) => {
                refreshed += 1;
                tracing::debug!(
                    competitor_id = updated.id,
                    handle = %updated.handle,
                    follower_delta = ?updated.follower_delta(),
                    "competitor refreshed"
                );
            }
            Err(e) => {
                tracing::error!(
                    competitor_id = competitor.id,
                    handle = %competitor.handle,
                    error = %e,
                    "competitor refresh failed"
                );
            }
        }
    }
    refreshed
}

/// Refreshes a single competitor on demand.
///
/// # Errors
///
/// Returns [`JobError::SourceUnavailable`] without a configured source,
/// otherwise whatever the fetch or the write returned.
pub async fn refresh_competitor_now(
    pool: &PgPool,
    services: &Services,
    competitor: &Competitor,
) -> Result<Competitor, JobError> {
    let source = services
        .profiles
        .as_ref()
        .ok_or(JobError::SourceUnavailable)?;
    let since = Utc::now() - Duration::days(RECENT_WINDOW_DAYS);
    let updated = refresh_one(pool, source.as_ref(), competitor, since).await?;
    tracing::info!(
        competitor_id = updated.id,
        handle = %updated.handle,
        follower_count = updated.follower_count,
        "competitor refreshed on demand"
    );
    Ok(updated)
}

async fn refresh_one(
    pool: &PgPool,
    source: &dyn cryptoscope_twitter::ProfileSource,
    competitor: &Competitor,
    since: chrono::DateTime<Utc>,
) -> Result<Competitor, JobError> {
    let profile = source.fetch(&competitor.handle, since).await?;

    // Competitor posts are not stored; they only feed the engagement average.
    let posts: Vec<Post> = profile
        .posts
        .iter()
        .map(|p| Post {
            id: 0,
            account_id: 0,
            external_id: p.external_id.clone(),
            published_at: p.published_at,
            like_count: p.like_count,
            retweet_count: p.retweet_count,
            reply_count: p.reply_count,
            impression_count: p.impression_count,
        })
        .collect();
    let observation = summarize_posts(
        profile.follower_count,
        profile.following_count,
        profile.post_count,
        &posts,
    );

    Ok(cryptoscope_db::refresh_competitor(
        pool,
        competitor.id,
        profile.follower_count,
        profile.post_count,
        observation.engagement_rate,
    )
    .await?)
}
