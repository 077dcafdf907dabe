//! HTTP client for the X API v2.
//!
//! Three reads per sync: the user lookup (profile counts), the user's recent
//! posts and the user's recent mentions with authors expanded. Every request
//! goes through [`retry_with_backoff`].

use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;

use crate::error::TwitterError;
use crate::retry::retry_with_backoff;
use crate::source::ProfileSource;
use crate::types::{FetchedMention, FetchedPost, ProfileData, TimelineResponse, UserResponse};

const DEFAULT_BASE_URL: &str = "https://api.twitter.com/";
const TIMELINE_PAGE_SIZE: &str = "100";

pub struct TwitterClient {
    client: Client,
    bearer_token: String,
    base_url: Url,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl std::fmt::Debug for TwitterClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TwitterClient")
            .field("base_url", &self.base_url.as_str())
            .field("bearer_token", &"[redacted]")
            .field("max_retries", &self.max_retries)
            .finish_non_exhaustive()
    }
}

impl TwitterClient {
    /// Creates a client pointed at the production X API.
    ///
    /// # Errors
    ///
    /// Returns [`TwitterError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        bearer_token: &str,
        timeout_secs: u64,
        max_retries: u32,
        backoff_base_ms: u64,
    ) -> Result<Self, TwitterError> {
        Self::with_base_url(
            bearer_token,
            timeout_secs,
            max_retries,
            backoff_base_ms,
            DEFAULT_BASE_URL,
        )
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`TwitterError::Http`] if the `reqwest::Client` cannot be built,
    /// or [`TwitterError::InvalidBaseUrl`] if `base_url` does not parse.
    pub fn with_base_url(
        bearer_token: &str,
        timeout_secs: u64,
        max_retries: u32,
        backoff_base_ms: u64,
        base_url: &str,
    ) -> Result<Self, TwitterError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("cryptoscope/0.1")
            .build()?;

        // Exactly one trailing slash so `Url::join` appends instead of replacing.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| TwitterError::InvalidBaseUrl {
            url: base_url.to_owned(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client,
            bearer_token: bearer_token.to_owned(),
            base_url,
            max_retries,
            backoff_base_ms,
        })
    }

    /// Looks up a user by handle. Returns `(user_id, follower, following, post)`.
    ///
    /// # Errors
    ///
    /// Returns [`TwitterError::UserNotFound`] when the API answers without a
    /// `data` object, or any transport/decoding error.
    pub async fn lookup_user(&self, handle: &str) -> Result<(String, i64, i64, i64), TwitterError> {
        let url = self.build_url(
            &format!("2/users/by/username/{handle}"),
            &[("user.fields", "public_metrics")],
        )?;
        let response: UserResponse = self.get_json(&url).await?;
        let user = response.data.ok_or_else(|| TwitterError::UserNotFound {
            handle: handle.to_owned(),
        })?;
        Ok((
            user.id,
            user.public_metrics.followers_count,
            user.public_metrics.following_count,
            user.public_metrics.tweet_count,
        ))
    }

    /// Posts authored by `user_id` published at or after `since`.
    ///
    /// # Errors
    ///
    /// Returns any transport or decoding error.
    pub async fn recent_posts(
        &self,
        user_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<FetchedPost>, TwitterError> {
        let start_time = since.to_rfc3339_opts(SecondsFormat::Secs, true);
        let url = self.build_url(
            &format!("2/users/{user_id}/tweets"),
            &[
                ("max_results", TIMELINE_PAGE_SIZE),
                ("tweet.fields", "created_at,public_metrics"),
                ("start_time", &start_time),
            ],
        )?;
        let timeline: TimelineResponse = self.get_json(&url).await?;
        Ok(timeline.data.into_iter().map(FetchedPost::from).collect())
    }

    /// Mentions of `user_id` published at or after `since`, with author handle
    /// and follower count.
    ///
    /// # Errors
    ///
    /// Returns any transport or decoding error.
    pub async fn recent_mentions(
        &self,
        user_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<FetchedMention>, TwitterError> {
        let start_time = since.to_rfc3339_opts(SecondsFormat::Secs, true);
        let url = self.build_url(
            &format!("2/users/{user_id}/mentions"),
            &[
                ("max_results", TIMELINE_PAGE_SIZE),
                ("tweet.fields", "created_at,public_metrics,author_id"),
                ("expansions", "author_id"),
                ("user.fields", "public_metrics"),
                ("start_time", &start_time),
            ],
        )?;
        let timeline: TimelineResponse = self.get_json(&url).await?;
        Ok(timeline.into_mentions())
    }

    fn build_url(&self, path: &str, params: &[(&str, &str)]) -> Result<Url, TwitterError> {
        let mut url = self
            .base_url
            .join(path)
            .map_err(|e| TwitterError::InvalidBaseUrl {
                url: format!("{}{path}", self.base_url),
                reason: e.to_string(),
            })?;
        url.query_pairs_mut().extend_pairs(params);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &Url) -> Result<T, TwitterError> {
        let body = retry_with_backoff(self.max_retries, self.backoff_base_ms, || async move {
            let response = self
                .client
                .get(url.clone())
                .bearer_auth(&self.bearer_token)
                .send()
                .await?;
            let status = response.status();
            let text = response.text().await?;
            if !status.is_success() {
                return Err(TwitterError::Api {
                    status: status.as_u16(),
                    body: text,
                });
            }
            Ok(text)
        })
        .await?;

        serde_json::from_str(&body).map_err(|e| TwitterError::Deserialize {
            context: url.path().to_owned(),
            source: e,
        })
    }
}

#[async_trait::async_trait]
impl ProfileSource for TwitterClient {
    async fn fetch(&self, handle: &str, since: DateTime<Utc>) -> Result<ProfileData, TwitterError> {
        let (user_id, follower_count, following_count, post_count) =
            self.lookup_user(handle).await?;
        let posts = self.recent_posts(&user_id, since).await?;
        let mentions = self.recent_mentions(&user_id, since).await?;

        tracing::debug!(
            handle,
            follower_count,
            posts = posts.len(),
            mentions = mentions.len(),
            "fetched X profile"
        );

        Ok(ProfileData {
            follower_count,
            following_count,
            post_count,
            posts,
            mentions,
        })
    }
}
