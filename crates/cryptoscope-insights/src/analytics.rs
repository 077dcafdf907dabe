//! Dashboard read models: growth series, top posts, headline stats,
//! competitor comparison and most frequent mentioners.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use cryptoscope_core::{Account, Competitor, Mention, Post, Sentiment, Snapshot};
use serde::Serialize;

use crate::report::post_url;

/// Window for the counts on [`DashboardStats`].
pub const DASHBOARD_WINDOW_DAYS: i64 = 7;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GrowthPoint {
    pub captured_at: DateTime<Utc>,
    pub follower_count: i64,
    pub follower_delta: i64,
    pub engagement_rate: f64,
}

/// Snapshot series for charting, oldest first.
#[must_use]
pub fn follower_growth(snapshots: &[Snapshot]) -> Vec<GrowthPoint> {
    let mut ordered: Vec<&Snapshot> = snapshots.iter().collect();
    ordered.sort_by(|a, b| a.captured_at.cmp(&b.captured_at).then(a.id.cmp(&b.id)));
    ordered
        .into_iter()
        .map(|s| GrowthPoint {
            captured_at: s.captured_at,
            follower_count: s.follower_count,
            follower_delta: s.follower_delta,
            engagement_rate: s.engagement_rate,
        })
        .collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct TopPost {
    #[serde(flatten)]
    pub post: Post,
    pub engagement_score: i64,
    pub url: String,
}

/// Highest engagement score first; the newer post wins ties.
#[must_use]
pub fn top_posts(handle: &str, posts: &[Post], limit: usize) -> Vec<TopPost> {
    let mut ranked: Vec<&Post> = posts.iter().collect();
    ranked.sort_by(|a, b| {
        b.engagement_score()
            .cmp(&a.engagement_score())
            .then(b.published_at.cmp(&a.published_at))
    });
    ranked
        .into_iter()
        .take(limit)
        .map(|p| TopPost {
            post: p.clone(),
            engagement_score: p.engagement_score(),
            url: post_url(handle, &p.external_id),
        })
        .collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardStats {
    pub account: Account,
    pub latest_snapshot: Option<Snapshot>,
    pub follower_delta_7d: i64,
    pub posts_7d: i64,
    pub mentions_7d: i64,
}

/// Headline numbers for one account over the trailing week.
///
/// Inputs may extend past the window; only rows for `account` captured or
/// published in the last [`DASHBOARD_WINDOW_DAYS`] are counted. The latest
/// snapshot is taken from the full slice.
#[must_use]
pub fn dashboard_stats(
    now: DateTime<Utc>,
    account: &Account,
    snapshots: &[Snapshot],
    posts: &[Post],
    mentions: &[Mention],
) -> DashboardStats {
    let since = now - Duration::days(DASHBOARD_WINDOW_DAYS);
    let own_snapshots = snapshots.iter().filter(|s| s.account_id == account.id);

    let latest_snapshot = own_snapshots
        .clone()
        .max_by(|a, b| a.captured_at.cmp(&b.captured_at).then(a.id.cmp(&b.id)))
        .cloned();
    let follower_delta_7d = own_snapshots
        .filter(|s| s.captured_at >= since)
        .map(|s| s.follower_delta)
        .sum();

    let posts_7d = posts
        .iter()
        .filter(|p| p.account_id == account.id && p.published_at >= since)
        .count();
    let mentions_7d = mentions
        .iter()
        .filter(|m| m.account_id == account.id && m.published_at >= since)
        .count();

    DashboardStats {
        account: account.clone(),
        latest_snapshot,
        follower_delta_7d,
        posts_7d: i64::try_from(posts_7d).unwrap_or(i64::MAX),
        mentions_7d: i64::try_from(mentions_7d).unwrap_or(i64::MAX),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonEntry {
    pub handle: String,
    pub follower_count: i64,
    /// Followers relative to the caller's account; negative means behind it.
    pub follower_gap: i64,
    pub engagement_rate: f64,
    pub is_own_account: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompetitorComparison {
    /// All entries, the caller's account included, by followers descending.
    pub entries: Vec<ComparisonEntry>,
    /// 1-based position of the caller's account in `entries`.
    pub rank: usize,
}

/// Lines the account up against every tracked competitor.
///
/// The account's engagement rate comes from its latest snapshot, zero
/// without one. On equal follower counts the caller's account ranks first.
#[must_use]
pub fn compare_with_competitors(
    account: &Account,
    latest: Option<&Snapshot>,
    competitors: &[Competitor],
) -> CompetitorComparison {
    let own = ComparisonEntry {
        handle: account.handle.clone(),
        follower_count: account.follower_count,
        follower_gap: 0,
        engagement_rate: latest.map_or(0.0, |s| s.engagement_rate),
        is_own_account: true,
    };

    let mut entries: Vec<ComparisonEntry> = std::iter::once(own)
        .chain(competitors.iter().map(|c| ComparisonEntry {
            handle: c.handle.clone(),
            follower_count: c.follower_count,
            follower_gap: c.follower_count - account.follower_count,
            engagement_rate: c.avg_engagement_rate,
            is_own_account: false,
        }))
        .collect();
    entries.sort_by(|a, b| {
        b.follower_count
            .cmp(&a.follower_count)
            .then(b.is_own_account.cmp(&a.is_own_account))
    });

    let rank = entries
        .iter()
        .position(|e| e.is_own_account)
        .map_or(1, |i| i + 1);
    CompetitorComparison { entries, rank }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Mentioner {
    pub handle: String,
    pub follower_count: i64,
    pub mention_count: i64,
    pub dominant_sentiment: Sentiment,
}

/// Authors who mention the account most, grouped case-insensitively.
///
/// Ordered by mention count, then author followers, then handle. The
/// dominant sentiment is the most frequent label; ties go to the
/// alphabetically first label.
#[must_use]
pub fn top_mentioners(mentions: &[Mention], limit: usize) -> Vec<Mentioner> {
    struct Tally {
        handle: String,
        follower_count: i64,
        mentions: i64,
        by_sentiment: [i64; 3],
    }

    // negative, neutral, positive
    fn slot(sentiment: Sentiment) -> usize {
        match sentiment {
            Sentiment::Negative => 0,
            Sentiment::Neutral => 1,
            Sentiment::Positive => 2,
        }
    }
    const LABELS: [Sentiment; 3] = [Sentiment::Negative, Sentiment::Neutral, Sentiment::Positive];

    let mut tallies: HashMap<String, Tally> = HashMap::new();
    for mention in mentions {
        let tally = tallies
            .entry(mention.author_handle.to_lowercase())
            .or_insert_with(|| Tally {
                handle: mention.author_handle.clone(),
                follower_count: 0,
                mentions: 0,
                by_sentiment: [0; 3],
            });
        tally.follower_count = tally.follower_count.max(mention.author_follower_count);
        tally.mentions += 1;
        tally.by_sentiment[slot(mention.sentiment)] += 1;
    }

    let mut ranked: Vec<Mentioner> = tallies
        .into_values()
        .map(|t| {
            let mut dominant = 0;
            for i in 1..LABELS.len() {
                if t.by_sentiment[i] > t.by_sentiment[dominant] {
                    dominant = i;
                }
            }
            Mentioner {
                handle: t.handle,
                follower_count: t.follower_count,
                mention_count: t.mentions,
                dominant_sentiment: LABELS[dominant],
            }
        })
        .collect();
    ranked.sort_by(|a, b| {
        b.mention_count
            .cmp(&a.mention_count)
            .then(b.follower_count.cmp(&a.follower_count))
            .then(a.handle.cmp(&b.handle))
    });
    ranked.truncate(limit);
    ranked
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::comparator::tests::snapshot;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 12, 9, 0, 0).unwrap()
    }

    fn account(followers: i64) -> Account {
        Account {
            id: 1,
            user_id: 1,
            handle: "hodl_daily".to_string(),
            display_name: None,
            follower_count: followers,
            following_count: 0,
            post_count: 0,
            is_active: true,
            last_synced_at: None,
        }
    }

    fn post(external_id: &str, hours_ago: i64, likes: i64, retweets: i64, replies: i64) -> Post {
        Post {
            id: 0,
            account_id: 1,
            external_id: external_id.to_string(),
            published_at: now() - Duration::hours(hours_ago),
            like_count: likes,
            retweet_count: retweets,
            reply_count: replies,
            impression_count: 0,
        }
    }

    fn mention(author: &str, followers: i64, sentiment: Sentiment, hours_ago: i64) -> Mention {
        Mention {
            id: 0,
            account_id: 1,
            external_id: format!("{author}-{hours_ago}"),
            author_handle: author.to_string(),
            author_follower_count: followers,
            text: String::new(),
            published_at: now() - Duration::hours(hours_ago),
            sentiment,
            like_count: 0,
        }
    }

    fn competitor(id: i64, handle: &str, followers: i64) -> Competitor {
        Competitor {
            id,
            user_id: 1,
            handle: handle.to_string(),
            follower_count: followers,
            previous_follower_count: None,
            tweet_count: 0,
            avg_engagement_rate: 2.5,
            last_synced_at: None,
        }
    }

    #[test]
    fn growth_is_oldest_first() {
        let mut later = snapshot(2, 1, 48, 1_100);
        later.follower_delta = 100;
        let earlier = snapshot(1, 1, 0, 1_000);

        let points = follower_growth(&[later, earlier]);
        let counts: Vec<i64> = points.iter().map(|p| p.follower_count).collect();
        assert_eq!(counts, vec![1_000, 1_100]);
        assert_eq!(points[1].follower_delta, 100);
    }

    #[test]
    fn top_posts_rank_by_weighted_score() {
        // Scores: a = 10 + 0 + 0, b = 2 + 2×5 + 1, c = 13 with a newer timestamp.
        let posts = vec![
            post("a", 5, 10, 0, 0),
            post("b", 3, 2, 5, 1),
            post("c", 1, 13, 0, 0),
        ];
        let top = top_posts("hodl_daily", &posts, 2);
        let ids: Vec<&str> = top.iter().map(|t| t.post.external_id.as_str()).collect();
        assert_eq!(ids, vec!["c", "b"]);
        assert_eq!(top[0].engagement_score, 13);
        assert_eq!(top[0].url, "https://twitter.com/hodl_daily/status/c");
    }

    #[test]
    fn dashboard_counts_only_the_trailing_week() {
        let account = account(5_000);
        let base = now() - Duration::days(10);
        let mut old = snapshot(1, 1, 0, 4_000);
        old.captured_at = base;
        old.follower_delta = 900;
        let mut recent = snapshot(2, 1, 0, 5_000);
        recent.captured_at = now() - Duration::days(1);
        recent.follower_delta = 1_000;

        let posts = vec![post("new", 2, 1, 0, 0), post("old", 24 * 9, 1, 0, 0)];
        let mentions = vec![
            mention("fan", 10, Sentiment::Positive, 3),
            mention("fan", 10, Sentiment::Positive, 24 * 8),
        ];

        let stats = dashboard_stats(now(), &account, &[old, recent], &posts, &mentions);
        assert_eq!(stats.follower_delta_7d, 1_000);
        assert_eq!(stats.posts_7d, 1);
        assert_eq!(stats.mentions_7d, 1);
        assert_eq!(stats.latest_snapshot.map(|s| s.id), Some(2));
    }

    #[test]
    fn dashboard_without_data_is_zeroed() {
        let stats = dashboard_stats(now(), &account(0), &[], &[], &[]);
        assert!(stats.latest_snapshot.is_none());
        assert_eq!(stats.follower_delta_7d, 0);
        assert_eq!(stats.posts_7d, 0);
    }

    #[test]
    fn comparison_ranks_own_account_among_competitors() {
        let mut latest = snapshot(1, 1, 0, 5_000);
        latest.engagement_rate = 4.0;
        let comparison = compare_with_competitors(
            &account(5_000),
            Some(&latest),
            &[competitor(1, "bigger", 9_000), competitor(2, "smaller", 1_000), competitor(3, "tied", 5_000)],
        );

        let handles: Vec<&str> = comparison.entries.iter().map(|e| e.handle.as_str()).collect();
        assert_eq!(handles, vec!["bigger", "hodl_daily", "tied", "smaller"]);
        assert_eq!(comparison.rank, 2);
        assert_eq!(comparison.entries[0].follower_gap, 4_000);
        assert_eq!(comparison.entries[3].follower_gap, -4_000);
        assert!((comparison.entries[1].engagement_rate - 4.0).abs() < f64::EPSILON);
    }

    #[test]
    fn comparison_without_competitors_ranks_first() {
        let comparison = compare_with_competitors(&account(10), None, &[]);
        assert_eq!(comparison.rank, 1);
        assert_eq!(comparison.entries.len(), 1);
        assert!(comparison.entries[0].engagement_rate.abs() < f64::EPSILON);
    }

    #[test]
    fn mentioners_group_case_insensitively() {
        let mentions = vec![
            mention("Whale", 50_000, Sentiment::Negative, 1),
            mention("whale", 51_000, Sentiment::Negative, 2),
            mention("whale", 51_000, Sentiment::Positive, 3),
            mention("shrimp", 10, Sentiment::Positive, 4),
            mention("crab", 300, Sentiment::Neutral, 5),
        ];

        let top = top_mentioners(&mentions, 2);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].mention_count, 3);
        assert_eq!(top[0].follower_count, 51_000);
        assert_eq!(top[0].dominant_sentiment, Sentiment::Negative);
        // One mention each: more followers first.
        assert_eq!(top[1].handle, "crab");
    }

    #[test]
    fn mentioner_sentiment_ties_pick_first_label() {
        let mentions = vec![
            mention("mixed", 1, Sentiment::Positive, 1),
            mention("mixed", 1, Sentiment::Neutral, 2),
        ];
        let top = top_mentioners(&mentions, 10);
        assert_eq!(top[0].dominant_sentiment, Sentiment::Neutral);
    }
}
