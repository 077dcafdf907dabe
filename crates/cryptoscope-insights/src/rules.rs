//! Alert detection rules.
//!
//! Each rule is evaluated independently per account. [`detect_alerts`] runs
//! every rule over every account window and the user's competitors; a
//! malformed window is logged and skipped so it cannot suppress alerts for
//! the remaining accounts.

use chrono::{DateTime, Duration, Utc};
use cryptoscope_core::{Account, Alert, AlertData, Competitor, Mention, Post, Sentiment, Severity, Snapshot};

use crate::comparator::SnapshotPair;
use crate::error::InsightError;
use crate::format::format_count;

pub const FOLLOWER_MILESTONES: [i64; 9] = [
    100, 500, 1_000, 5_000, 10_000, 50_000, 100_000, 500_000, 1_000_000,
];

const DROP_RATIO: f64 = 0.05;
const SPIKE_RATIO: f64 = 0.10;
const SPIKE_MIN_GAIN: i64 = 50;

const VIRAL_WINDOW_HOURS: i64 = 24;
const VIRAL_MIN_RETWEETS: i64 = 50;
const VIRAL_MAX_ALERTS: usize = 3;

const BIG_MENTION_WINDOW_HOURS: i64 = 24;
const BIG_MENTION_MIN_FOLLOWERS: i64 = 10_000;
const BIG_MENTION_MAX_ALERTS: usize = 3;

pub(crate) const NEGATIVE_WINDOW_HOURS: i64 = 6;
const NEGATIVE_SPIKE_THRESHOLD: i64 = 10;

const COMPETITOR_SPIKE_MIN_GAIN: i64 = 500;

/// Everything the rules need to know about one tracked account.
#[derive(Debug, Clone)]
pub struct AccountWindow {
    pub account: Account,
    /// Most recent snapshots, newest first. Only the first two are compared.
    pub snapshots: Vec<Snapshot>,
    /// Posts from at least the last 24 hours; older posts are ignored.
    pub posts: Vec<Post>,
    /// Mentions from at least the last 24 hours; older mentions are ignored.
    pub mentions: Vec<Mention>,
}

/// Evaluate all rules for every account and for the given competitors.
///
/// The result is unordered; see [`crate::rank_alerts`].
#[must_use]
pub fn detect_alerts(
    now: DateTime<Utc>,
    windows: &[AccountWindow],
    competitors: &[Competitor],
) -> Vec<Alert> {
    let mut alerts = Vec::new();

    for window in windows {
        match evaluate_account(now, window) {
            Ok(found) => alerts.extend(found),
            Err(e) => {
                tracing::warn!(
                    account_id = window.account.id,
                    handle = %window.account.handle,
                    error = %e,
                    "skipping account with malformed metrics"
                );
            }
        }
    }

    alerts.extend(competitors.iter().filter_map(|c| competitor_spike(now, c)));
    alerts
}

/// Evaluate all account-scoped rules for one account.
///
/// # Errors
///
/// Returns [`InsightError`] if the account's latest snapshots cannot be
/// compared. No partial result is returned for that account.
pub fn evaluate_account(
    now: DateTime<Utc>,
    window: &AccountWindow,
) -> Result<Vec<Alert>, InsightError> {
    let mut alerts = Vec::new();

    if let Some(pair) = SnapshotPair::latest(&window.snapshots)? {
        alerts.extend(milestones(&window.account, &pair));
        alerts.extend(follower_drop(&window.account, &pair));
        alerts.extend(follower_spike(&window.account, &pair));
    }

    alerts.extend(viral_posts(now, window.account.id, &window.posts));
    alerts.extend(high_value_mentions(now, window.account.id, &window.mentions));
    alerts.extend(negative_spike(now, window.account.id, &window.mentions));

    Ok(alerts)
}

fn milestones(account: &Account, pair: &SnapshotPair<'_>) -> Vec<Alert> {
    let current = pair.current();
    pair.crossed(&FOLLOWER_MILESTONES)
        .into_iter()
        .map(|milestone| Alert {
            id: format!("milestone-{}-{milestone}", account.id),
            severity: Severity::Success,
            title: format!("{} Followers!", format_count(milestone)),
            message: format!(
                "@{} just crossed {} followers. Keep the momentum going!",
                account.handle,
                format_count(milestone)
            ),
            created_at: current.captured_at,
            data: AlertData::FollowerMilestone {
                account_id: account.id,
                milestone,
                current: current.follower_count,
            },
        })
        .collect()
}

#[allow(clippy::cast_precision_loss)]
fn follower_drop(account: &Account, pair: &SnapshotPair<'_>) -> Option<Alert> {
    let prev = pair.previous().follower_count;
    let delta = pair.delta();
    if prev <= 0 || (delta as f64) >= -(prev as f64) * DROP_RATIO {
        return None;
    }

    let current = pair.current();
    Some(Alert {
        id: format!("drop-{}-{}", account.id, current.id),
        severity: Severity::Warning,
        title: "Significant Follower Drop".to_string(),
        message: format!(
            "@{} lost {} followers recently. Check for a shadow ban or controversial content.",
            account.handle,
            format_count(delta.abs())
        ),
        created_at: current.captured_at,
        data: AlertData::FollowerDrop {
            account_id: account.id,
            snapshot_id: current.id,
            delta,
            current: current.follower_count,
        },
    })
}

#[allow(clippy::cast_precision_loss)]
fn follower_spike(account: &Account, pair: &SnapshotPair<'_>) -> Option<Alert> {
    let prev = pair.previous().follower_count;
    let delta = pair.delta();
    if (delta as f64) <= (prev as f64) * SPIKE_RATIO || delta <= SPIKE_MIN_GAIN {
        return None;
    }

    let current = pair.current();
    Some(Alert {
        id: format!("spike-{}-{}", account.id, current.id),
        severity: Severity::Success,
        title: "Viral Growth Detected".to_string(),
        message: format!(
            "@{} gained {} followers since the last sync. Something went viral!",
            account.handle,
            format_count(delta)
        ),
        created_at: current.captured_at,
        data: AlertData::FollowerSpike {
            account_id: account.id,
            snapshot_id: current.id,
            delta,
            current: current.follower_count,
        },
    })
}

fn viral_posts(now: DateTime<Utc>, account_id: i64, posts: &[Post]) -> Vec<Alert> {
    let since = now - Duration::hours(VIRAL_WINDOW_HOURS);
    let mut viral: Vec<&Post> = posts
        .iter()
        .filter(|p| p.account_id == account_id)
        .filter(|p| p.published_at >= since && p.retweet_count > VIRAL_MIN_RETWEETS)
        .collect();
    viral.sort_by(|a, b| {
        b.retweet_count
            .cmp(&a.retweet_count)
            .then(b.published_at.cmp(&a.published_at))
    });

    viral
        .into_iter()
        .take(VIRAL_MAX_ALERTS)
        .map(|post| Alert {
            id: format!("viral-post-{}", post.id),
            severity: Severity::Success,
            title: "Post Going Viral".to_string(),
            message: format!(
                "Your post got {} reposts and {} likes in the last 24h!",
                format_count(post.retweet_count),
                format_count(post.like_count)
            ),
            created_at: post.published_at,
            data: AlertData::ViralPost {
                account_id,
                post_id: post.id,
                external_id: post.external_id.clone(),
                like_count: post.like_count,
                retweet_count: post.retweet_count,
                impression_count: post.impression_count,
            },
        })
        .collect()
}

fn high_value_mentions(now: DateTime<Utc>, account_id: i64, mentions: &[Mention]) -> Vec<Alert> {
    let since = now - Duration::hours(BIG_MENTION_WINDOW_HOURS);
    let mut big: Vec<&Mention> = mentions
        .iter()
        .filter(|m| m.account_id == account_id)
        .filter(|m| m.published_at >= since && m.author_follower_count > BIG_MENTION_MIN_FOLLOWERS)
        .collect();
    big.sort_by(|a, b| {
        b.author_follower_count
            .cmp(&a.author_follower_count)
            .then(b.published_at.cmp(&a.published_at))
    });

    big.into_iter()
        .take(BIG_MENTION_MAX_ALERTS)
        .map(|mention| Alert {
            id: format!("big-mention-{}", mention.id),
            severity: Severity::Info,
            title: "Big Account Mentioned You".to_string(),
            message: format!(
                "@{} ({} followers) mentioned you. Engage now!",
                mention.author_handle,
                format_count(mention.author_follower_count)
            ),
            created_at: mention.published_at,
            data: AlertData::HighValueMention {
                account_id,
                mention_id: mention.id,
                author_handle: mention.author_handle.clone(),
                author_follower_count: mention.author_follower_count,
                sentiment: mention.sentiment,
            },
        })
        .collect()
}

fn negative_spike(now: DateTime<Utc>, account_id: i64, mentions: &[Mention]) -> Option<Alert> {
    let since = now - Duration::hours(NEGATIVE_WINDOW_HOURS);
    let count = mentions
        .iter()
        .filter(|m| m.account_id == account_id)
        .filter(|m| m.published_at >= since && m.sentiment == Sentiment::Negative)
        .count();
    let count = i64::try_from(count).unwrap_or(i64::MAX);

    if count <= NEGATIVE_SPIKE_THRESHOLD {
        return None;
    }

    Some(Alert {
        id: format!("neg-sentiment-{account_id}"),
        severity: Severity::Critical,
        title: "Negative Sentiment Spike".to_string(),
        message: format!(
            "{count} negative mentions in the last {NEGATIVE_WINDOW_HOURS} hours. \
             You may want to respond or review your recent posts."
        ),
        created_at: now,
        data: AlertData::NegativeSentiment {
            account_id,
            count,
            window_hours: NEGATIVE_WINDOW_HOURS,
        },
    })
}

fn competitor_spike(now: DateTime<Utc>, competitor: &Competitor) -> Option<Alert> {
    let delta = competitor.follower_delta()?;
    if delta <= COMPETITOR_SPIKE_MIN_GAIN {
        return None;
    }

    Some(Alert {
        id: format!("comp-spike-{}", competitor.id),
        severity: Severity::Warning,
        title: "Competitor Growing Fast".to_string(),
        message: format!(
            "@{} gained {} followers recently. Check what content is working for them.",
            competitor.handle,
            format_count(delta)
        ),
        created_at: competitor.last_synced_at.unwrap_or(now),
        data: AlertData::CompetitorSpike {
            competitor_id: competitor.id,
            handle: competitor.handle.clone(),
            delta,
        },
    })
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use cryptoscope_core::AlertKind;

    use super::*;
    use crate::comparator::tests::snapshot;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 2, 0, 0, 0).unwrap()
    }

    fn account(id: i64) -> Account {
        Account {
            id,
            user_id: 1,
            handle: format!("creator{id}"),
            display_name: None,
            follower_count: 0,
            following_count: 0,
            post_count: 0,
            is_active: true,
            last_synced_at: None,
        }
    }

    fn window(id: i64, prev: i64, curr: i64) -> AccountWindow {
        AccountWindow {
            account: account(id),
            snapshots: vec![snapshot(id * 10 + 2, id, 20, curr), snapshot(id * 10 + 1, id, 16, prev)],
            posts: vec![],
            mentions: vec![],
        }
    }

    fn post(id: i64, account_id: i64, hours_ago: i64, retweets: i64) -> Post {
        Post {
            id,
            account_id,
            external_id: format!("ext-{id}"),
            published_at: now() - Duration::hours(hours_ago),
            like_count: retweets * 3,
            retweet_count: retweets,
            reply_count: 0,
            impression_count: 0,
        }
    }

    fn mention(id: i64, hours_ago: i64, followers: i64, sentiment: Sentiment) -> Mention {
        Mention {
            id,
            account_id: 1,
            external_id: format!("m-{id}"),
            author_handle: format!("author{id}"),
            author_follower_count: followers,
            text: String::new(),
            published_at: now() - Duration::hours(hours_ago),
            sentiment,
            like_count: 0,
        }
    }

    fn kinds(alerts: &[Alert]) -> Vec<AlertKind> {
        alerts.iter().map(Alert::kind).collect()
    }

    #[test]
    fn milestone_fires_for_crossed_threshold_only() {
        let alerts = evaluate_account(now(), &window(1, 950, 1_200)).unwrap();
        let milestones: Vec<i64> = alerts
            .iter()
            .filter_map(|a| match a.data {
                AlertData::FollowerMilestone { milestone, .. } => Some(milestone),
                _ => None,
            })
            .collect();
        assert_eq!(milestones, vec![1_000]);
    }

    #[test]
    fn milestone_refires_on_unchanged_inputs() {
        let w = window(1, 950, 1_200);
        let first = evaluate_account(now(), &w).unwrap();
        let second = evaluate_account(now(), &w).unwrap();
        assert_eq!(first, second);
        assert!(kinds(&second).contains(&AlertKind::FollowerMilestone));
    }

    #[test]
    fn milestone_crossing_several_rungs_fires_each() {
        let alerts = evaluate_account(now(), &window(1, 90, 1_100)).unwrap();
        let count = kinds(&alerts)
            .into_iter()
            .filter(|k| *k == AlertKind::FollowerMilestone)
            .count();
        assert_eq!(count, 3, "100, 500 and 1000 were all crossed");
    }

    #[test]
    fn drop_over_five_percent_warns() {
        let alerts = evaluate_account(now(), &window(1, 1_000, 940)).unwrap();
        assert_eq!(kinds(&alerts), vec![AlertKind::FollowerDrop]);
        assert_eq!(alerts[0].severity, Severity::Warning);
    }

    #[test]
    fn drop_under_five_percent_is_quiet() {
        let alerts = evaluate_account(now(), &window(1, 1_000, 960)).unwrap();
        assert!(alerts.is_empty());
    }

    #[test]
    fn drop_of_exactly_five_percent_is_quiet() {
        let alerts = evaluate_account(now(), &window(1, 1_000, 950)).unwrap();
        assert!(alerts.is_empty());
    }

    #[test]
    fn drop_ignores_zero_previous() {
        let alerts = evaluate_account(now(), &window(1, 0, 0)).unwrap();
        assert!(alerts.is_empty());
    }

    #[test]
    fn spike_needs_ratio_and_absolute_gain() {
        let alerts = evaluate_account(now(), &window(1, 2_000, 2_300)).unwrap();
        assert!(kinds(&alerts).contains(&AlertKind::FollowerSpike));

        // 40% growth but only 40 followers.
        let alerts = evaluate_account(now(), &window(1, 1_100, 1_140)).unwrap();
        assert!(!kinds(&alerts).contains(&AlertKind::FollowerSpike));

        // 60 followers but only 0.6% growth.
        let alerts = evaluate_account(now(), &window(1, 10_000, 10_060)).unwrap();
        assert!(!kinds(&alerts).contains(&AlertKind::FollowerSpike));
    }

    #[test]
    fn viral_posts_capped_at_three_by_retweets() {
        let mut w = window(1, 100, 100);
        w.posts = vec![
            post(1, 1, 1, 60),
            post(2, 1, 2, 300),
            post(3, 1, 3, 120),
            post(4, 1, 4, 90),
            post(5, 1, 30, 1_000),
            post(6, 1, 1, 50),
        ];
        let alerts = evaluate_account(now(), &w).unwrap();
        let ids: Vec<&str> = alerts.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["viral-post-2", "viral-post-3", "viral-post-4"]);
    }

    #[test]
    fn high_value_mentions_ranked_by_author_reach() {
        let mut w = window(1, 100, 100);
        w.mentions = vec![
            mention(1, 1, 20_000, Sentiment::Positive),
            mention(2, 1, 10_000, Sentiment::Positive),
            mention(3, 2, 90_000, Sentiment::Neutral),
            mention(4, 3, 15_000, Sentiment::Negative),
            mention(5, 4, 50_000, Sentiment::Neutral),
            mention(6, 25, 900_000, Sentiment::Neutral),
        ];
        let alerts = evaluate_account(now(), &w).unwrap();
        let ids: Vec<&str> = alerts.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["big-mention-3", "big-mention-5", "big-mention-1"]);
        assert!(alerts.iter().all(|a| a.severity == Severity::Info));
    }

    #[test]
    fn negative_spike_requires_more_than_ten_in_six_hours() {
        let mut w = window(1, 100, 100);
        w.mentions = (1..=10)
            .map(|i| mention(i, 1, 0, Sentiment::Negative))
            .chain(std::iter::once(mention(11, 7, 0, Sentiment::Negative)))
            .collect();
        assert!(evaluate_account(now(), &w).unwrap().is_empty());

        w.mentions.push(mention(12, 5, 0, Sentiment::Negative));
        let alerts = evaluate_account(now(), &w).unwrap();
        assert_eq!(kinds(&alerts), vec![AlertKind::NegativeSentiment]);
        assert_eq!(alerts[0].severity, Severity::Critical);
    }

    #[test]
    fn competitor_spike_over_five_hundred() {
        let competitor = |id, prev| Competitor {
            id,
            user_id: 1,
            handle: format!("rival{id}"),
            follower_count: 10_000,
            previous_follower_count: prev,
            tweet_count: 0,
            avg_engagement_rate: 0.0,
            last_synced_at: None,
        };
        let alerts = detect_alerts(
            now(),
            &[],
            &[competitor(1, Some(9_000)), competitor(2, Some(9_500)), competitor(3, None)],
        );
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].id, "comp-spike-1");
        assert_eq!(alerts[0].severity, Severity::Warning);
    }

    #[test]
    fn malformed_account_does_not_suppress_others() {
        let mut broken = window(1, 950, 1_200);
        broken.snapshots.reverse();
        let healthy = window(2, 950, 1_200);

        assert!(evaluate_account(now(), &broken).is_err());
        let alerts = detect_alerts(now(), &[broken, healthy], &[]);
        assert!(!alerts.is_empty());
        assert!(alerts.iter().all(|a| a.data.account_id() == Some(2)));
        assert!(kinds(&alerts).contains(&AlertKind::FollowerMilestone));
    }
}
