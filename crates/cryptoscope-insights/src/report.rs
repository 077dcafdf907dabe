use chrono::{DateTime, Duration, Utc};
use cryptoscope_core::{Account, Mention, Post, Snapshot};
use serde::Serialize;

const REPORT_WINDOW_DAYS: i64 = 7;

/// Seven-day activity summary sent to account owners every week.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeeklyReport {
    pub account_id: i64,
    pub handle: String,
    /// Sum of per-snapshot deltas captured in the window.
    pub follower_delta: i64,
    pub post_count: i64,
    pub total_likes: i64,
    pub total_retweets: i64,
    pub mention_count: i64,
    pub top_post_url: Option<String>,
}

/// Aggregate the trailing seven days for one account.
///
/// The top post is ranked by `likes + 2 × retweets`; the newest post wins ties.
#[must_use]
pub fn weekly_report(
    now: DateTime<Utc>,
    account: &Account,
    snapshots: &[Snapshot],
    posts: &[Post],
    mentions: &[Mention],
) -> WeeklyReport {
    let since = now - Duration::days(REPORT_WINDOW_DAYS);

    let follower_delta = snapshots
        .iter()
        .filter(|s| s.account_id == account.id && s.captured_at >= since)
        .map(|s| s.follower_delta)
        .sum();

    let week_posts: Vec<&Post> = posts
        .iter()
        .filter(|p| p.account_id == account.id && p.published_at >= since)
        .collect();

    let top_post_url = week_posts
        .iter()
        .max_by(|a, b| {
            (a.like_count + 2 * a.retweet_count)
                .cmp(&(b.like_count + 2 * b.retweet_count))
                .then(a.published_at.cmp(&b.published_at))
        })
        .map(|p| post_url(&account.handle, &p.external_id));

    let mention_count = mentions
        .iter()
        .filter(|m| m.account_id == account.id && m.published_at >= since)
        .count();

    WeeklyReport {
        account_id: account.id,
        handle: account.handle.clone(),
        follower_delta,
        post_count: i64::try_from(week_posts.len()).unwrap_or(i64::MAX),
        total_likes: week_posts.iter().map(|p| p.like_count).sum(),
        total_retweets: week_posts.iter().map(|p| p.retweet_count).sum(),
        mention_count: i64::try_from(mention_count).unwrap_or(i64::MAX),
        top_post_url,
    }
}

#[must_use]
pub fn post_url(handle: &str, external_id: &str) -> String {
    format!("https://twitter.com/{handle}/status/{external_id}")
}
