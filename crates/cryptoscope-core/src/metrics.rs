//! Tracked-account metrics: accounts, snapshots, posts, mentions, competitors.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::CoreError;

/// Maximum number of competitors a single user may track.
pub const COMPETITOR_QUOTA: i64 = 20;

/// A tracked social profile owned by a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: i64,
    pub user_id: i64,
    pub handle: String,
    pub display_name: Option<String>,
    pub follower_count: i64,
    pub following_count: i64,
    pub post_count: i64,
    pub is_active: bool,
    pub last_synced_at: Option<DateTime<Utc>>,
}

/// One time-stamped aggregate measurement of an [`Account`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Snapshot {
    pub id: i64,
    pub account_id: i64,
    pub captured_at: DateTime<Utc>,
    pub follower_count: i64,
    pub following_count: i64,
    pub post_count: i64,
    /// Followers gained since the immediately preceding snapshot; `0` for the first.
    pub follower_delta: i64,
    /// Mean per-post interaction rate as a percentage of followers.
    pub engagement_rate: f64,
    pub avg_likes: f64,
    pub avg_retweets: f64,
    pub avg_replies: f64,
    pub avg_impressions: f64,
}

/// Freshly observed counts for an account, produced by a sync.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Observation {
    pub follower_count: i64,
    pub following_count: i64,
    pub post_count: i64,
    pub engagement_rate: f64,
    pub avg_likes: f64,
    pub avg_retweets: f64,
    pub avg_replies: f64,
    pub avg_impressions: f64,
}

/// A single published item from a tracked account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub account_id: i64,
    pub external_id: String,
    pub published_at: DateTime<Utc>,
    pub like_count: i64,
    pub retweet_count: i64,
    pub reply_count: i64,
    pub impression_count: i64,
}

impl Post {
    /// `likes + 2 × retweets + replies`.
    #[must_use]
    pub fn engagement_score(&self) -> i64 {
        self.like_count + 2 * self.retweet_count + self.reply_count
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

impl Sentiment {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Neutral => "neutral",
            Sentiment::Negative => "negative",
        }
    }
}

impl std::fmt::Display for Sentiment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Sentiment {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "positive" => Ok(Sentiment::Positive),
            "neutral" => Ok(Sentiment::Neutral),
            "negative" => Ok(Sentiment::Negative),
            other => Err(CoreError::InvalidSentiment(other.to_string())),
        }
    }
}

/// A third-party post referencing a tracked account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mention {
    pub id: i64,
    pub account_id: i64,
    pub external_id: String,
    pub author_handle: String,
    pub author_follower_count: i64,
    pub text: String,
    pub published_at: DateTime<Utc>,
    pub sentiment: Sentiment,
    pub like_count: i64,
}

/// Another profile a user tracks for comparison.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Competitor {
    pub id: i64,
    pub user_id: i64,
    pub handle: String,
    pub follower_count: i64,
    /// Follower count as of the refresh before the latest one, if any.
    pub previous_follower_count: Option<i64>,
    pub tweet_count: i64,
    pub avg_engagement_rate: f64,
    pub last_synced_at: Option<DateTime<Utc>>,
}

impl Competitor {
    /// Followers gained between the two most recent refreshes.
    #[must_use]
    pub fn follower_delta(&self) -> Option<i64> {
        self.previous_follower_count
            .map(|previous| self.follower_count - previous)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HashtagPeriod {
    #[serde(rename = "7d")]
    Week,
    #[serde(rename = "30d")]
    Month,
    #[serde(rename = "90d")]
    Quarter,
}

impl HashtagPeriod {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            HashtagPeriod::Week => "7d",
            HashtagPeriod::Month => "30d",
            HashtagPeriod::Quarter => "90d",
        }
    }
}

impl FromStr for HashtagPeriod {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "7d" => Ok(HashtagPeriod::Week),
            "30d" => Ok(HashtagPeriod::Month),
            "90d" => Ok(HashtagPeriod::Quarter),
            other => Err(CoreError::InvalidPeriod(other.to_string())),
        }
    }
}

/// Pre-aggregated hashtag usage for one account over one period.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HashtagAnalytic {
    pub account_id: i64,
    pub hashtag: String,
    pub period: HashtagPeriod,
    pub tweet_count: i64,
    pub avg_engagement: f64,
}
