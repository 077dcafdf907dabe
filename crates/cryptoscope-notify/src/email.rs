//! Transactional email via the Resend HTTP API.

use std::time::Duration;

use reqwest::{Client, Url};
use serde::Serialize;

use crate::error::NotifyError;

const DEFAULT_RESEND_URL: &str = "https://api.resend.com/";

/// Delivers one HTML email. Implementations must not retry on their own;
/// the alert dispatcher decides what happens after a failure.
#[async_trait::async_trait]
pub trait NotificationSender: Send + Sync {
    async fn send(&self, recipient: &str, subject: &str, html: &str) -> Result<(), NotifyError>;
}

#[derive(Debug, Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
}

pub struct ResendSender {
    client: Client,
    api_key: String,
    from: String,
    endpoint: Url,
}

impl std::fmt::Debug for ResendSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResendSender")
            .field("from", &self.from)
            .field("endpoint", &self.endpoint.as_str())
            .field("api_key", &"[redacted]")
            .finish_non_exhaustive()
    }
}

impl ResendSender {
    /// # Errors
    ///
    /// Returns [`NotifyError::Http`] if the `reqwest::Client` cannot be built.
    pub fn new(api_key: &str, from: &str, timeout_secs: u64) -> Result<Self, NotifyError> {
        Self::with_base_url(api_key, from, timeout_secs, DEFAULT_RESEND_URL)
    }

    /// # Errors
    ///
    /// Returns [`NotifyError::Http`] if the `reqwest::Client` cannot be built,
    /// or [`NotifyError::InvalidBaseUrl`] if `base_url` does not parse.
    pub fn with_base_url(
        api_key: &str,
        from: &str,
        timeout_secs: u64,
        base_url: &str,
    ) -> Result<Self, NotifyError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        let endpoint = crate::join_base_url(base_url, "emails")?;
        Ok(Self {
            client,
            api_key: api_key.to_owned(),
            from: from.to_owned(),
            endpoint,
        })
    }
}

#[async_trait::async_trait]
impl NotificationSender for ResendSender {
    async fn send(&self, recipient: &str, subject: &str, html: &str) -> Result<(), NotifyError> {
        let body = SendEmailRequest {
            from: &self.from,
            to: [recipient],
            subject,
            html,
        };
        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::UpstreamFailure {
                status: status.as_u16(),
                body,
            });
        }

        tracing::debug!(recipient, subject, "email sent");
        Ok(())
    }
}
