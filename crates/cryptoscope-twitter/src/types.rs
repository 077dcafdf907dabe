//! Fetched profile data and the X API v2 wire shapes it is decoded from.

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Everything one sync needs from the source for a single handle.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProfileData {
    pub follower_count: i64,
    pub following_count: i64,
    pub post_count: i64,
    pub posts: Vec<FetchedPost>,
    pub mentions: Vec<FetchedMention>,
}

impl ProfileData {
    /// Profile counts with no timeline activity, used when no live source is
    /// configured and the account's last known counts are carried forward.
    #[must_use]
    pub fn cached(follower_count: i64, following_count: i64, post_count: i64) -> Self {
        Self {
            follower_count,
            following_count,
            post_count,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FetchedPost {
    pub external_id: String,
    pub text: String,
    pub published_at: DateTime<Utc>,
    pub like_count: i64,
    pub retweet_count: i64,
    pub reply_count: i64,
    pub impression_count: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FetchedMention {
    pub external_id: String,
    pub author_handle: String,
    pub author_follower_count: i64,
    pub text: String,
    pub published_at: DateTime<Utc>,
    pub like_count: i64,
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(crate) struct UserResponse {
    pub data: Option<UserData>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UserData {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub public_metrics: UserMetrics,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct UserMetrics {
    #[serde(default)]
    pub followers_count: i64,
    #[serde(default)]
    pub following_count: i64,
    #[serde(default)]
    pub tweet_count: i64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TimelineResponse {
    #[serde(default)]
    pub data: Vec<Tweet>,
    #[serde(default)]
    pub includes: Includes,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct Includes {
    #[serde(default)]
    pub users: Vec<UserData>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Tweet {
    pub id: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub author_id: Option<String>,
    #[serde(default)]
    pub public_metrics: TweetMetrics,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct TweetMetrics {
    #[serde(default)]
    pub like_count: i64,
    #[serde(default)]
    pub retweet_count: i64,
    #[serde(default)]
    pub reply_count: i64,
    #[serde(default)]
    pub impression_count: i64,
}

impl From<Tweet> for FetchedPost {
    fn from(tweet: Tweet) -> Self {
        Self {
            external_id: tweet.id,
            text: tweet.text,
            published_at: tweet.created_at,
            like_count: tweet.public_metrics.like_count,
            retweet_count: tweet.public_metrics.retweet_count,
            reply_count: tweet.public_metrics.reply_count,
            impression_count: tweet.public_metrics.impression_count,
        }
    }
}

impl TimelineResponse {
    /// Joins each mention with its expanded author. Mentions whose author was
    /// not expanded keep an empty handle and zero followers.
    pub(crate) fn into_mentions(self) -> Vec<FetchedMention> {
        let users = self.includes.users;
        self.data
            .into_iter()
            .map(|tweet| {
                let author = tweet
                    .author_id
                    .as_deref()
                    .and_then(|id| users.iter().find(|u| u.id == id));
                FetchedMention {
                    external_id: tweet.id,
                    author_handle: author.map(|u| u.username.clone()).unwrap_or_default(),
                    author_follower_count: author.map_or(0, |u| u.public_metrics.followers_count),
                    text: tweet.text,
                    published_at: tweet.created_at,
                    like_count: tweet.public_metrics.like_count,
                }
            })
            .collect()
    }
}
