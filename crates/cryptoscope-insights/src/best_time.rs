//! Best posting hours from historical post engagement.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Timelike, Utc};
use cryptoscope_core::Post;
use serde::Serialize;

pub const BEST_TIME_LOOKBACK_DAYS: i64 = 90;

const TOP_HOURS: usize = 5;
const DEFAULT_HOURS: [u32; 4] = [9, 12, 17, 20];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BestHour {
    /// UTC hour of day, `0..=23`.
    pub hour: u32,
    pub avg_engagement: i64,
    pub tweet_count: i64,
    pub label: String,
    pub is_default: bool,
}

/// `0` → `"12 AM"`, `13` → `"1 PM"`.
#[must_use]
pub fn hour_label(hour: u32) -> String {
    match hour {
        0 => "12 AM".to_string(),
        1..=11 => format!("{hour} AM"),
        12 => "12 PM".to_string(),
        _ => format!("{} PM", hour - 12),
    }
}

/// Rank UTC publish hours by mean engagement score over the lookback window.
///
/// Returns at most five hours, best first (earlier hour wins ties). With no
/// posts in the window a fixed set of default hours is returned, flagged with
/// `is_default`.
#[must_use]
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
pub fn best_posting_hours(now: DateTime<Utc>, posts: &[Post]) -> Vec<BestHour> {
    let since = now - Duration::days(BEST_TIME_LOOKBACK_DAYS);

    let mut by_hour: BTreeMap<u32, (i64, i64)> = BTreeMap::new();
    for post in posts.iter().filter(|p| p.published_at >= since) {
        let entry = by_hour.entry(post.published_at.hour()).or_insert((0, 0));
        entry.0 += post.engagement_score();
        entry.1 += 1;
    }

    if by_hour.is_empty() {
        return DEFAULT_HOURS
            .iter()
            .map(|&hour| BestHour {
                hour,
                avg_engagement: 0,
                tweet_count: 0,
                label: hour_label(hour),
                is_default: true,
            })
            .collect();
    }

    let mut ranked: Vec<(u32, f64, i64)> = by_hour
        .into_iter()
        .map(|(hour, (sum, count))| (hour, sum as f64 / count as f64, count))
        .collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));

    ranked
        .into_iter()
        .take(TOP_HOURS)
        .map(|(hour, mean, count)| BestHour {
            hour,
            avg_engagement: mean.round() as i64,
            tweet_count: count,
            label: hour_label(hour),
            is_default: false,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 4, 1, 0, 0, 0).unwrap()
    }

    fn post_at(days_ago: i64, hour: u32, likes: i64) -> Post {
        let day = now() - Duration::days(days_ago);
        Post {
            id: 0,
            account_id: 1,
            external_id: String::new(),
            published_at: day.with_hour(hour).unwrap(),
            like_count: likes,
            retweet_count: 0,
            reply_count: 0,
            impression_count: 0,
        }
    }

    #[test]
    fn labels_twelve_hour_clock() {
        assert_eq!(hour_label(0), "12 AM");
        assert_eq!(hour_label(9), "9 AM");
        assert_eq!(hour_label(12), "12 PM");
        assert_eq!(hour_label(17), "5 PM");
        assert_eq!(hour_label(23), "11 PM");
    }

    #[test]
    fn no_posts_yields_defaults() {
        let hours = best_posting_hours(now(), &[]);
        let picked: Vec<u32> = hours.iter().map(|h| h.hour).collect();
        assert_eq!(picked, vec![9, 12, 17, 20]);
        assert!(hours.iter().all(|h| h.is_default && h.tweet_count == 0));
        assert_eq!(hours[2].label, "5 PM");
    }

    #[test]
    fn posts_outside_lookback_yield_defaults() {
        let hours = best_posting_hours(now(), &[post_at(120, 14, 500)]);
        assert!(hours.iter().all(|h| h.is_default));
    }

    #[test]
    fn ranks_by_mean_engagement() {
        let posts = vec![
            post_at(1, 14, 100),
            post_at(2, 14, 50),
            post_at(1, 9, 40),
            post_at(3, 20, 200),
        ];
        let hours = best_posting_hours(now(), &posts);
        let picked: Vec<(u32, i64, i64)> = hours
            .iter()
            .map(|h| (h.hour, h.avg_engagement, h.tweet_count))
            .collect();
        assert_eq!(picked, vec![(20, 200, 1), (14, 75, 2), (9, 40, 1)]);
        assert!(hours.iter().all(|h| !h.is_default));
    }

    #[test]
    fn keeps_top_five_earlier_hour_on_ties() {
        let posts: Vec<Post> = (0..8).map(|h| post_at(1, h, 10)).collect();
        let hours = best_posting_hours(now(), &posts);
        let picked: Vec<u32> = hours.iter().map(|h| h.hour).collect();
        assert_eq!(picked, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn engagement_weights_retweets_double() {
        let mut post = post_at(1, 10, 10);
        post.retweet_count = 5;
        post.reply_count = 3;
        let hours = best_posting_hours(now(), &[post]);
        assert_eq!(hours[0].avg_engagement, 23);
    }
}
