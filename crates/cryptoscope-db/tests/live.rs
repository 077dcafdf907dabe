//! Live integration tests for cryptoscope-db using `#[sqlx::test]`.
//!
//! Each test gets a fresh, fully-migrated Postgres database spun up by the
//! sqlx test harness. The `migrations` path is relative to the crate root
//! (`crates/cryptoscope-db/`), so `"../../migrations"` resolves to the
//! workspace migration directory.

use chrono::{Duration, Utc};
use cryptoscope_core::{
    HashtagAnalytic, HashtagPeriod, Observation, RequestContext, Sentiment, TaskDescriptor,
    COMPETITOR_QUOTA,
};
use cryptoscope_db::{
    add_competitor, agent_stats, complete_agent_task, complete_sync_job, create_account,
    create_agent, create_agent_task, create_sync_job, create_user, delete_agent,
    fail_agent_task, fail_stale_sync_jobs, fail_sync_job, get_account, get_agent_for_user,
    get_competitor_for_user, get_sync_job, ingest_snapshot, insert_mention_if_new,
    list_agent_tasks, list_agents, list_competitors, list_hashtag_analytics,
    list_mentions_since, list_posts_since, list_recent_snapshots, list_sync_jobs,
    mark_agent_task_submitted, record_alert_notification, refresh_competitor,
    release_alert_notification, remove_competitor, set_agent_status, start_sync_job,
    upsert_hashtag_analytic, upsert_post, AgentStatus, DbError, NewMention, NewPost,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn user(pool: &sqlx::PgPool, email: &str) -> RequestContext {
    let id = create_user(pool, email, None)
        .await
        .unwrap_or_else(|e| panic!("create_user failed for '{email}': {e}"));
    RequestContext::new(id)
}

async fn account(pool: &sqlx::PgPool, ctx: RequestContext, handle: &str) -> i64 {
    create_account(pool, ctx, handle, None)
        .await
        .unwrap_or_else(|e| panic!("create_account failed for '{handle}': {e}"))
        .id
}

fn observation(followers: i64) -> Observation {
    Observation {
        follower_count: followers,
        following_count: 10,
        post_count: 100,
        ..Observation::default()
    }
}

// ---------------------------------------------------------------------------
// Snapshot ingestion
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn snapshot_deltas_chain_against_predecessor(pool: sqlx::PgPool) {
    let ctx = user(&pool, "a@example.com").await;
    let account_id = account(&pool, ctx, "creator").await;

    let counts = [100, 150, 120, 120, 900];
    for followers in counts {
        ingest_snapshot(&pool, ctx, account_id, &observation(followers))
            .await
            .expect("ingest_snapshot failed");
    }

    let mut snapshots = list_recent_snapshots(&pool, account_id, 10)
        .await
        .expect("list_recent_snapshots failed");
    snapshots.reverse();

    assert_eq!(snapshots.len(), counts.len());
    assert_eq!(snapshots[0].follower_delta, 0, "first snapshot has no predecessor");
    for pair in snapshots.windows(2) {
        assert_eq!(
            pair[1].follower_delta,
            pair[1].follower_count - pair[0].follower_count
        );
        assert!((pair[1].captured_at, pair[1].id) > (pair[0].captured_at, pair[0].id));
    }

    let cached = get_account(&pool, account_id).await.expect("get_account failed");
    assert_eq!(cached.follower_count, 900);
    assert!(cached.last_synced_at.is_some());
}

#[sqlx::test(migrations = "../../migrations")]
async fn concurrent_ingestion_serializes_per_account(pool: sqlx::PgPool) {
    let ctx = user(&pool, "a@example.com").await;
    let account_id = account(&pool, ctx, "creator").await;
    ingest_snapshot(&pool, ctx, account_id, &observation(1_000))
        .await
        .expect("seed snapshot");

    let first = observation(1_100);
    let second = observation(1_300);
    let (a, b) = tokio::join!(
        ingest_snapshot(&pool, ctx, account_id, &first),
        ingest_snapshot(&pool, ctx, account_id, &second),
    );
    a.expect("first concurrent ingest");
    b.expect("second concurrent ingest");

    let newest_first = list_recent_snapshots(&pool, account_id, 10)
        .await
        .expect("list_recent_snapshots failed");
    assert_eq!(newest_first.len(), 3);
    let total: i64 = newest_first.iter().map(|s| s.follower_delta).sum();
    assert_eq!(
        total,
        newest_first[0].follower_count - 1_000,
        "deltas must telescope with no gaps or double counting"
    );
}

#[sqlx::test(migrations = "../../migrations")]
async fn ingestion_for_foreign_account_writes_nothing(pool: sqlx::PgPool) {
    let owner = user(&pool, "owner@example.com").await;
    let intruder = user(&pool, "intruder@example.com").await;
    let account_id = account(&pool, owner, "creator").await;

    let err = ingest_snapshot(&pool, intruder, account_id, &observation(5))
        .await
        .expect_err("foreign ingest must fail");
    assert!(matches!(err, DbError::NotFound));

    let missing = ingest_snapshot(&pool, owner, 999_999, &observation(5)).await;
    assert!(matches!(missing, Err(DbError::NotFound)));

    let snapshots = list_recent_snapshots(&pool, account_id, 10).await.unwrap();
    assert!(snapshots.is_empty());
    let cached = get_account(&pool, account_id).await.unwrap();
    assert!(cached.last_synced_at.is_none());
}

// ---------------------------------------------------------------------------
// Posts, mentions, hashtags
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn post_upsert_refreshes_counts(pool: sqlx::PgPool) {
    let ctx = user(&pool, "a@example.com").await;
    let account_id = account(&pool, ctx, "creator").await;
    let mut post = NewPost {
        external_id: "1800".to_string(),
        text: "gm".to_string(),
        published_at: Utc::now() - Duration::hours(2),
        like_count: 5,
        retweet_count: 1,
        reply_count: 0,
        impression_count: 100,
    };

    let first = upsert_post(&pool, account_id, &post).await.unwrap();
    post.like_count = 50;
    post.retweet_count = 60;
    let second = upsert_post(&pool, account_id, &post).await.unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(second.retweet_count, 60);
    let recent = list_posts_since(&pool, account_id, Utc::now() - Duration::days(1))
        .await
        .unwrap();
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].like_count, 50);
}

#[sqlx::test(migrations = "../../migrations")]
async fn mention_inserted_once_per_external_id(pool: sqlx::PgPool) {
    let ctx = user(&pool, "a@example.com").await;
    let account_id = account(&pool, ctx, "creator").await;
    let mention = NewMention {
        external_id: "m-1".to_string(),
        author_handle: "whale".to_string(),
        author_follower_count: 50_000,
        text: "this is a rug".to_string(),
        published_at: Utc::now() - Duration::hours(1),
        sentiment: Sentiment::Negative,
        like_count: 3,
    };

    assert!(insert_mention_if_new(&pool, account_id, &mention).await.unwrap());
    assert!(!insert_mention_if_new(&pool, account_id, &mention).await.unwrap());

    let mentions = list_mentions_since(&pool, account_id, Utc::now() - Duration::days(1))
        .await
        .unwrap();
    assert_eq!(mentions.len(), 1);
    assert_eq!(mentions[0].sentiment, Sentiment::Negative);
    assert_eq!(mentions[0].author_follower_count, 50_000);
}

#[sqlx::test(migrations = "../../migrations")]
async fn hashtag_rows_filtered_by_period(pool: sqlx::PgPool) {
    let ctx = user(&pool, "a@example.com").await;
    let account_id = account(&pool, ctx, "creator").await;
    for (hashtag, period) in [
        ("btc", HashtagPeriod::Week),
        ("eth", HashtagPeriod::Week),
        ("sol", HashtagPeriod::Month),
    ] {
        upsert_hashtag_analytic(
            &pool,
            &HashtagAnalytic {
                account_id,
                hashtag: hashtag.to_string(),
                period,
                tweet_count: 3,
                avg_engagement: 12.5,
            },
        )
        .await
        .unwrap();
    }

    let week = list_hashtag_analytics(&pool, account_id, HashtagPeriod::Week)
        .await
        .unwrap();
    let tags: Vec<&str> = week.iter().map(|r| r.hashtag.as_str()).collect();
    assert_eq!(tags, vec!["btc", "eth"]);
}

// ---------------------------------------------------------------------------
// Competitors
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn competitor_quota_rejects_twenty_first(pool: sqlx::PgPool) {
    let ctx = user(&pool, "a@example.com").await;

    for i in 0..COMPETITOR_QUOTA {
        add_competitor(&pool, ctx, &format!("rival{i}"))
            .await
            .unwrap_or_else(|e| panic!("add_competitor {i} failed: {e}"));
    }

    let err = add_competitor(&pool, ctx, "one_too_many")
        .await
        .expect_err("21st competitor must be rejected");
    assert!(matches!(err, DbError::QuotaExceeded { limit } if limit == COMPETITOR_QUOTA));

    let existing = list_competitors(&pool, ctx).await.unwrap();
    assert_eq!(existing.len(), 20);
    assert!(existing.iter().all(|c| c.handle != "one_too_many"));

    // Re-adding a tracked handle is not a new competitor.
    let again = add_competitor(&pool, ctx, "@rival3").await.unwrap();
    assert_eq!(again.handle, "rival3");
}

#[sqlx::test(migrations = "../../migrations")]
async fn competitor_quota_is_per_user(pool: sqlx::PgPool) {
    let a = user(&pool, "a@example.com").await;
    let b = user(&pool, "b@example.com").await;
    for i in 0..COMPETITOR_QUOTA {
        add_competitor(&pool, a, &format!("rival{i}")).await.unwrap();
    }
    add_competitor(&pool, b, "rival0")
        .await
        .expect("other users keep their own quota");
}

#[sqlx::test(migrations = "../../migrations")]
async fn competitor_refresh_keeps_previous_count(pool: sqlx::PgPool) {
    let ctx = user(&pool, "a@example.com").await;
    let competitor = add_competitor(&pool, ctx, "rival").await.unwrap();

    let first = refresh_competitor(&pool, competitor.id, 10_000, 50, 1.5)
        .await
        .unwrap();
    assert_eq!(first.previous_follower_count, None);
    assert_eq!(first.follower_delta(), None);

    let second = refresh_competitor(&pool, competitor.id, 10_800, 52, 1.7)
        .await
        .unwrap();
    assert_eq!(second.previous_follower_count, Some(10_000));
    assert_eq!(second.follower_delta(), Some(800));
}

#[sqlx::test(migrations = "../../migrations")]
async fn competitor_removal_is_owner_scoped(pool: sqlx::PgPool) {
    let owner = user(&pool, "a@example.com").await;
    let other = user(&pool, "b@example.com").await;
    let competitor = add_competitor(&pool, owner, "rival").await.unwrap();

    assert!(matches!(
        remove_competitor(&pool, other, competitor.id).await,
        Err(DbError::NotFound)
    ));
    remove_competitor(&pool, owner, competitor.id).await.unwrap();
    assert!(list_competitors(&pool, owner).await.unwrap().is_empty());
}

#[sqlx::test(migrations = "../../migrations")]
async fn mixed_case_handles_are_one_competitor(pool: sqlx::PgPool) {
    let ctx = user(&pool, "a@example.com").await;

    let first = add_competitor(&pool, ctx, "@Rival").await.unwrap();
    let second = add_competitor(&pool, ctx, "rival").await.unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(first.handle, "rival");
    assert_eq!(list_competitors(&pool, ctx).await.unwrap().len(), 1);
}

#[sqlx::test(migrations = "../../migrations")]
async fn competitor_lookup_is_owner_scoped(pool: sqlx::PgPool) {
    let owner = user(&pool, "a@example.com").await;
    let other = user(&pool, "b@example.com").await;
    let competitor = add_competitor(&pool, owner, "rival").await.unwrap();

    let found = get_competitor_for_user(&pool, owner, competitor.id)
        .await
        .unwrap();
    assert_eq!(found.handle, "rival");
    assert!(matches!(
        get_competitor_for_user(&pool, other, competitor.id).await,
        Err(DbError::NotFound)
    ));
}

// ---------------------------------------------------------------------------
// Sync jobs
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn sync_job_lifecycle_pending_to_completed(pool: sqlx::PgPool) {
    let ctx = user(&pool, "a@example.com").await;
    let account_id = account(&pool, ctx, "creator").await;

    let job = create_sync_job(&pool, account_id, "api").await.unwrap();
    assert_eq!(job.status, "pending");

    assert!(matches!(
        complete_sync_job(&pool, job.id).await,
        Err(DbError::InvalidSyncJobTransition { expected_status: "running", .. })
    ));

    start_sync_job(&pool, job.id).await.unwrap();
    complete_sync_job(&pool, job.id).await.unwrap();

    let done = get_sync_job(&pool, job.id).await.unwrap();
    assert_eq!(done.status, "completed");
    assert!(done.started_at.is_some());
    assert!(done.completed_at.is_some());

    assert!(start_sync_job(&pool, job.id).await.is_err());
    assert!(fail_sync_job(&pool, job.id, "late").await.is_err());
}

#[sqlx::test(migrations = "../../migrations")]
async fn stale_running_jobs_are_failed(pool: sqlx::PgPool) {
    let ctx = user(&pool, "a@example.com").await;
    let account_id = account(&pool, ctx, "creator").await;

    let stale = create_sync_job(&pool, account_id, "scheduler").await.unwrap();
    start_sync_job(&pool, stale.id).await.unwrap();
    sqlx::query("UPDATE sync_jobs SET started_at = NOW() - INTERVAL '2 hours' WHERE id = $1")
        .bind(stale.id)
        .execute(&pool)
        .await
        .unwrap();
    let fresh = create_sync_job(&pool, account_id, "scheduler").await.unwrap();
    start_sync_job(&pool, fresh.id).await.unwrap();

    let failed = fail_stale_sync_jobs(&pool, Duration::hours(1)).await.unwrap();
    assert_eq!(failed, 1);
    assert_eq!(get_sync_job(&pool, stale.id).await.unwrap().status, "failed");
    assert_eq!(get_sync_job(&pool, fresh.id).await.unwrap().status, "running");
}

#[sqlx::test(migrations = "../../migrations")]
async fn never_started_jobs_are_failed_once_old(pool: sqlx::PgPool) {
    let ctx = user(&pool, "a@example.com").await;
    let account_id = account(&pool, ctx, "creator").await;

    let orphan = create_sync_job(&pool, account_id, "api").await.unwrap();
    sqlx::query("UPDATE sync_jobs SET created_at = NOW() - INTERVAL '3 days' WHERE id = $1")
        .bind(orphan.id)
        .execute(&pool)
        .await
        .unwrap();
    let queued = create_sync_job(&pool, account_id, "api").await.unwrap();

    let failed = fail_stale_sync_jobs(&pool, Duration::hours(1)).await.unwrap();
    assert_eq!(failed, 1);

    let orphan = get_sync_job(&pool, orphan.id).await.unwrap();
    assert_eq!(orphan.status, "failed");
    assert_eq!(orphan.error_message.as_deref(), Some("abandoned: never started"));
    assert_eq!(get_sync_job(&pool, queued.id).await.unwrap().status, "pending");
}

#[sqlx::test(migrations = "../../migrations")]
async fn sync_job_listing_is_owner_scoped(pool: sqlx::PgPool) {
    let a = user(&pool, "a@example.com").await;
    let b = user(&pool, "b@example.com").await;
    let a1 = account(&pool, a, "one").await;
    let a2 = account(&pool, a, "two").await;
    let b1 = account(&pool, b, "three").await;
    for id in [a1, a2, a2, b1] {
        create_sync_job(&pool, id, "api").await.unwrap();
    }

    assert_eq!(list_sync_jobs(&pool, a, None, 10).await.unwrap().len(), 3);
    assert_eq!(list_sync_jobs(&pool, a, Some(a2), 10).await.unwrap().len(), 2);
    assert!(list_sync_jobs(&pool, a, Some(b1), 10).await.unwrap().is_empty());
    assert_eq!(list_sync_jobs(&pool, a, None, 1).await.unwrap().len(), 1);
}

// ---------------------------------------------------------------------------
// Alert ledger and agent tasks
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn alert_ledger_claims_each_key_once(pool: sqlx::PgPool) {
    let ctx = user(&pool, "a@example.com").await;
    let account_id = account(&pool, ctx, "creator").await;

    let key = "follower_milestone:1000";
    assert!(record_alert_notification(&pool, account_id, key, "follower_milestone")
        .await
        .unwrap());
    assert!(!record_alert_notification(&pool, account_id, key, "follower_milestone")
        .await
        .unwrap());

    release_alert_notification(&pool, account_id, key).await.unwrap();
    assert!(record_alert_notification(&pool, account_id, key, "follower_milestone")
        .await
        .unwrap());
}

#[sqlx::test(migrations = "../../migrations")]
async fn agent_task_lifecycle_counts_completions(pool: sqlx::PgPool) {
    let ctx = user(&pool, "a@example.com").await;
    let agent = create_agent(&pool, ctx, "poster", "mk_live_123").await.unwrap();
    let descriptor = TaskDescriptor::FollowUser {
        handle: "vitalik".to_string(),
    };

    let task = create_agent_task(&pool, &agent, &descriptor).await.unwrap();
    assert_eq!(task.status, "queued");
    assert_eq!(task.task_type, "follow_user");
    assert_eq!(task.payload["type"], "follow_user");

    let running = mark_agent_task_submitted(&pool, task.id, Some("ext-9"))
        .await
        .unwrap();
    assert_eq!(running.external_task_id.as_deref(), Some("ext-9"));
    complete_agent_task(&pool, task.id).await.unwrap();

    let agent = get_agent_for_user(&pool, ctx, agent.id).await.unwrap();
    assert_eq!(agent.tasks_completed, 1);
    assert!(!format!("{agent:?}").contains("mk_live_123"));

    let other = user(&pool, "b@example.com").await;
    assert!(matches!(
        get_agent_for_user(&pool, other, agent.id).await,
        Err(DbError::NotFound)
    ));
}

#[sqlx::test(migrations = "../../migrations")]
async fn agents_pause_resume_and_delete_are_owner_scoped(pool: sqlx::PgPool) {
    let owner = user(&pool, "a@example.com").await;
    let other = user(&pool, "b@example.com").await;
    let first = create_agent(&pool, owner, "first", "k1").await.unwrap();
    let second = create_agent(&pool, owner, "second", "k2").await.unwrap();
    create_agent(&pool, other, "theirs", "k3").await.unwrap();

    let mine = list_agents(&pool, owner).await.unwrap();
    let ids: Vec<i64> = mine.iter().map(|a| a.id).collect();
    assert_eq!(ids, vec![second.id, first.id]);

    assert!(matches!(
        set_agent_status(&pool, other, first.id, AgentStatus::Paused).await,
        Err(DbError::NotFound)
    ));
    let paused = set_agent_status(&pool, owner, first.id, AgentStatus::Paused)
        .await
        .unwrap();
    assert_eq!(paused.status, "paused");
    let resumed = set_agent_status(&pool, owner, first.id, AgentStatus::Active)
        .await
        .unwrap();
    assert_eq!(resumed.status, "active");

    assert!(matches!(
        delete_agent(&pool, other, second.id).await,
        Err(DbError::NotFound)
    ));
    delete_agent(&pool, owner, second.id).await.unwrap();
    assert_eq!(list_agents(&pool, owner).await.unwrap().len(), 1);
}

#[sqlx::test(migrations = "../../migrations")]
async fn agent_stats_count_agents_and_recent_outcomes(pool: sqlx::PgPool) {
    let ctx = user(&pool, "a@example.com").await;
    let active = create_agent(&pool, ctx, "active", "k1").await.unwrap();
    let paused = create_agent(&pool, ctx, "paused", "k2").await.unwrap();
    set_agent_status(&pool, ctx, paused.id, AgentStatus::Paused)
        .await
        .unwrap();

    let descriptor = TaskDescriptor::FollowUser {
        handle: "vitalik".to_string(),
    };
    let done = create_agent_task(&pool, &active, &descriptor).await.unwrap();
    mark_agent_task_submitted(&pool, done.id, None).await.unwrap();
    complete_agent_task(&pool, done.id).await.unwrap();

    let failed = create_agent_task(&pool, &active, &descriptor).await.unwrap();
    fail_agent_task(&pool, failed.id, "agent offline").await.unwrap();

    let old = create_agent_task(&pool, &active, &descriptor).await.unwrap();
    fail_agent_task(&pool, old.id, "timeout").await.unwrap();
    sqlx::query("UPDATE agent_tasks SET created_at = NOW() - INTERVAL '10 days' WHERE id = $1")
        .bind(old.id)
        .execute(&pool)
        .await
        .unwrap();

    create_agent_task(&pool, &paused, &descriptor).await.unwrap();

    let stats = agent_stats(&pool, ctx, Utc::now() - Duration::days(7))
        .await
        .unwrap();
    assert_eq!(stats.total_agents, 2);
    assert_eq!(stats.active_agents, 1);
    assert_eq!(stats.paused_agents, 1);
    assert_eq!(stats.completed_tasks, 1);
    assert_eq!(stats.failed_tasks, 1);
    assert_eq!(stats.queued_tasks, 1);

    let recent = list_agent_tasks(&pool, ctx, Some(active.id), 2).await.unwrap();
    assert_eq!(recent.len(), 2);
    assert!(recent.iter().all(|t| t.agent_id == active.id));
    assert_eq!(list_agent_tasks(&pool, ctx, None, 50).await.unwrap().len(), 4);
}
