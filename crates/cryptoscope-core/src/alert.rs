//! Derived alert values.
//!
//! Alerts are recomputed from metrics on every evaluation and never stored.
//! The payload is a tagged union keyed by alert type, serialised as
//! `{"type": "...", "data": {...}}` alongside the common fields.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::metrics::Sentiment;

/// Alert severity. The declaration order is the display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    Warning,
    Success,
    Info,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    FollowerMilestone,
    FollowerDrop,
    FollowerSpike,
    ViralPost,
    HighValueMention,
    NegativeSentiment,
    CompetitorSpike,
}

impl AlertKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            AlertKind::FollowerMilestone => "follower_milestone",
            AlertKind::FollowerDrop => "follower_drop",
            AlertKind::FollowerSpike => "follower_spike",
            AlertKind::ViralPost => "viral_post",
            AlertKind::HighValueMention => "high_value_mention",
            AlertKind::NegativeSentiment => "negative_sentiment",
            AlertKind::CompetitorSpike => "competitor_spike",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum AlertData {
    FollowerMilestone {
        account_id: i64,
        milestone: i64,
        current: i64,
    },
    FollowerDrop {
        account_id: i64,
        snapshot_id: i64,
        delta: i64,
        current: i64,
    },
    FollowerSpike {
        account_id: i64,
        snapshot_id: i64,
        delta: i64,
        current: i64,
    },
    ViralPost {
        account_id: i64,
        post_id: i64,
        external_id: String,
        like_count: i64,
        retweet_count: i64,
        impression_count: i64,
    },
    HighValueMention {
        account_id: i64,
        mention_id: i64,
        author_handle: String,
        author_follower_count: i64,
        sentiment: Sentiment,
    },
    NegativeSentiment {
        account_id: i64,
        count: i64,
        window_hours: i64,
    },
    CompetitorSpike {
        competitor_id: i64,
        handle: String,
        delta: i64,
    },
}

impl AlertData {
    #[must_use]
    pub fn kind(&self) -> AlertKind {
        match self {
            AlertData::FollowerMilestone { .. } => AlertKind::FollowerMilestone,
            AlertData::FollowerDrop { .. } => AlertKind::FollowerDrop,
            AlertData::FollowerSpike { .. } => AlertKind::FollowerSpike,
            AlertData::ViralPost { .. } => AlertKind::ViralPost,
            AlertData::HighValueMention { .. } => AlertKind::HighValueMention,
            AlertData::NegativeSentiment { .. } => AlertKind::NegativeSentiment,
            AlertData::CompetitorSpike { .. } => AlertKind::CompetitorSpike,
        }
    }

    /// The tracked account this alert concerns. Competitor alerts have none.
    #[must_use]
    pub fn account_id(&self) -> Option<i64> {
        match self {
            AlertData::FollowerMilestone { account_id, .. }
            | AlertData::FollowerDrop { account_id, .. }
            | AlertData::FollowerSpike { account_id, .. }
            | AlertData::ViralPost { account_id, .. }
            | AlertData::HighValueMention { account_id, .. }
            | AlertData::NegativeSentiment { account_id, .. } => Some(*account_id),
            AlertData::CompetitorSpike { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    /// Stable identifier derived from the alert's subject, e.g. `milestone-7-1000`.
    pub id: String,
    pub severity: Severity,
    pub title: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub data: AlertData,
}

impl Alert {
    #[must_use]
    pub fn kind(&self) -> AlertKind {
        self.data.kind()
    }

    /// Key identifying "the same condition" across repeated evaluations.
    ///
    /// Milestones dedup per threshold, posts and mentions per item, follower
    /// swings per snapshot, and negative-sentiment spikes per UTC six-hour
    /// bucket of `created_at`.
    #[must_use]
    pub fn dedup_key(&self) -> String {
        let kind = self.kind().as_str();
        match &self.data {
            AlertData::FollowerMilestone { milestone, .. } => format!("{kind}:{milestone}"),
            AlertData::FollowerDrop { snapshot_id, .. }
            | AlertData::FollowerSpike { snapshot_id, .. } => format!("{kind}:{snapshot_id}"),
            AlertData::ViralPost { post_id, .. } => format!("{kind}:{post_id}"),
            AlertData::HighValueMention { mention_id, .. } => format!("{kind}:{mention_id}"),
            AlertData::NegativeSentiment { .. } => {
                let bucket = self.created_at.timestamp().div_euclid(6 * 3_600);
                format!("{kind}:{bucket}")
            }
            AlertData::CompetitorSpike { competitor_id, .. } => {
                let stamp = self.created_at.timestamp();
                format!("{kind}:{competitor_id}:{stamp}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn milestone_alert() -> Alert {
        Alert {
            id: "milestone-7-1000".to_string(),
            severity: Severity::Success,
            title: "1,000 Followers!".to_string(),
            message: "@creator just crossed 1,000 followers.".to_string(),
            created_at: Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap(),
            data: AlertData::FollowerMilestone {
                account_id: 7,
                milestone: 1_000,
                current: 1_200,
            },
        }
    }

    #[test]
    fn severity_orders_critical_first() {
        let mut severities = vec![
            Severity::Info,
            Severity::Success,
            Severity::Critical,
            Severity::Warning,
        ];
        severities.sort();
        assert_eq!(
            severities,
            vec![
                Severity::Critical,
                Severity::Warning,
                Severity::Success,
                Severity::Info
            ]
        );
    }

    #[test]
    fn alert_serializes_type_and_data_side_by_side() {
        let json = serde_json::to_value(milestone_alert()).expect("serialize alert");
        assert_eq!(json["type"], "follower_milestone");
        assert_eq!(json["severity"], "success");
        assert_eq!(json["data"]["milestone"], 1_000);
        assert_eq!(json["id"], "milestone-7-1000");
    }

    #[test]
    fn dedup_key_is_per_milestone() {
        assert_eq!(milestone_alert().dedup_key(), "follower_milestone:1000");
    }

    #[test]
    fn negative_sentiment_dedup_key_buckets_six_hours() {
        let at = |h| Utc.with_ymd_and_hms(2026, 3, 1, h, 30, 0).unwrap();
        let alert = |created_at| Alert {
            id: "neg-sentiment-7".to_string(),
            severity: Severity::Critical,
            title: String::new(),
            message: String::new(),
            created_at,
            data: AlertData::NegativeSentiment {
                account_id: 7,
                count: 12,
                window_hours: 6,
            },
        };
        assert_eq!(alert(at(1)).dedup_key(), alert(at(5)).dedup_key());
        assert_ne!(alert(at(5)).dedup_key(), alert(at(7)).dedup_key());
    }

    #[test]
    fn competitor_alert_has_no_account() {
        let data = AlertData::CompetitorSpike {
            competitor_id: 3,
            handle: "rival".to_string(),
            delta: 900,
        };
        assert_eq!(data.account_id(), None);
        assert_eq!(data.kind(), AlertKind::CompetitorSpike);
    }
}
