//! Community health scoring from mention sentiment.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use cryptoscope_core::{Mention, Sentiment, Snapshot};
use serde::Serialize;

/// Score assigned when there are no mentions to judge.
pub const DEFAULT_HEALTH_SCORE: i64 = 75;

/// `round(clamp(50 + 50·pos/total − 40·neg/total, 0, 100))`, or
/// [`DEFAULT_HEALTH_SCORE`] when `total` is zero.
#[must_use]
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
pub fn health_score(positive: i64, negative: i64, total: i64) -> i64 {
    if total <= 0 {
        return DEFAULT_HEALTH_SCORE;
    }
    let total = total as f64;
    let raw = 50.0 + 50.0 * (positive as f64 / total) - 40.0 * (negative as f64 / total);
    raw.clamp(0.0, 100.0).round() as i64
}

#[must_use]
pub fn health_label(score: i64) -> &'static str {
    if score >= 70 {
        "Great"
    } else if score >= 40 {
        "Good"
    } else {
        "Needs Attention"
    }
}

/// Mention counts per sentiment with rounded percentages of the total.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SentimentBreakdown {
    pub positive: i64,
    pub neutral: i64,
    pub negative: i64,
    pub total: i64,
    pub positive_pct: i64,
    pub neutral_pct: i64,
    pub negative_pct: i64,
}

impl SentimentBreakdown {
    #[must_use]
    pub fn from_counts(positive: i64, neutral: i64, negative: i64) -> Self {
        let total = positive + neutral + negative;
        Self {
            positive,
            neutral,
            negative,
            total,
            positive_pct: pct(positive, total),
            neutral_pct: pct(neutral, total),
            negative_pct: pct(negative, total),
        }
    }

    pub fn from_mentions<'a>(mentions: impl IntoIterator<Item = &'a Mention>) -> Self {
        let (mut positive, mut neutral, mut negative) = (0, 0, 0);
        for mention in mentions {
            match mention.sentiment {
                Sentiment::Positive => positive += 1,
                Sentiment::Neutral => neutral += 1,
                Sentiment::Negative => negative += 1,
            }
        }
        Self::from_counts(positive, neutral, negative)
    }

    #[must_use]
    pub fn health_score(&self) -> i64 {
        health_score(self.positive, self.negative, self.total)
    }
}

#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
fn pct(part: i64, total: i64) -> i64 {
    if total == 0 {
        0
    } else {
        (part as f64 / total as f64 * 100.0).round() as i64
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthReport {
    pub mention_count_7d: i64,
    pub mention_count_30d: i64,
    pub positive_count: i64,
    pub negative_count: i64,
    pub neutral_count: i64,
    pub health_score: i64,
    pub health_label: &'static str,
    pub avg_engagement_rate: f64,
    pub latest_follower_count: i64,
    pub latest_follower_delta: i64,
}

impl HealthReport {
    /// Build the report from the last 30 days of mentions and snapshots.
    ///
    /// Sentiment counts and the score use the trailing 7 days; the engagement
    /// average spans 30 days. `snapshots` is newest first.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn build(now: DateTime<Utc>, mentions: &[Mention], snapshots: &[Snapshot]) -> Self {
        let since_7d = now - Duration::days(7);
        let since_30d = now - Duration::days(30);

        let week = SentimentBreakdown::from_mentions(
            mentions.iter().filter(|m| m.published_at >= since_7d),
        );
        let mention_count_30d = mentions
            .iter()
            .filter(|m| m.published_at >= since_30d)
            .count();

        let rates: Vec<f64> = snapshots
            .iter()
            .filter(|s| s.captured_at >= since_30d)
            .map(|s| s.engagement_rate)
            .collect();
        let avg_engagement_rate = if rates.is_empty() {
            0.0
        } else {
            rates.iter().sum::<f64>() / rates.len() as f64
        };

        let score = week.health_score();
        let latest = snapshots.first();
        Self {
            mention_count_7d: week.total,
            mention_count_30d: i64::try_from(mention_count_30d).unwrap_or(i64::MAX),
            positive_count: week.positive,
            negative_count: week.negative,
            neutral_count: week.neutral,
            health_score: score,
            health_label: health_label(score),
            avg_engagement_rate,
            latest_follower_count: latest.map_or(0, |s| s.follower_count),
            latest_follower_delta: latest.map_or(0, |s| s.follower_delta),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimelineDay {
    pub date: NaiveDate,
    pub positive: i64,
    pub neutral: i64,
    pub negative: i64,
    pub total: i64,
}

/// Per-day sentiment counts over the trailing `days`, oldest day first.
///
/// Only days with at least one mention appear.
#[must_use]
pub fn mention_timeline(now: DateTime<Utc>, mentions: &[Mention], days: i64) -> Vec<TimelineDay> {
    let since = now - Duration::days(days);
    let mut by_day: BTreeMap<NaiveDate, TimelineDay> = BTreeMap::new();

    for mention in mentions.iter().filter(|m| m.published_at >= since) {
        let date = mention.published_at.date_naive();
        let day = by_day.entry(date).or_insert_with(|| TimelineDay {
            date,
            positive: 0,
            neutral: 0,
            negative: 0,
            total: 0,
        });
        match mention.sentiment {
            Sentiment::Positive => day.positive += 1,
            Sentiment::Neutral => day.neutral += 1,
            Sentiment::Negative => day.negative += 1,
        }
        day.total += 1;
    }

    by_day.into_values().collect()
}
