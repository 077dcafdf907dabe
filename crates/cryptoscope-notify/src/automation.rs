//! Client for the third-party automation platform.
//!
//! Tasks are posted as `{type, payload}`, which is exactly the serde encoding
//! of [`TaskDescriptor`]. The call is synchronous from our side: a 2xx means
//! the platform accepted the task, anything else is an upstream failure whose
//! raw body is kept for the task row.

use std::time::Duration;

use cryptoscope_core::TaskDescriptor;
use reqwest::{Client, Url};
use serde::Deserialize;

use crate::error::NotifyError;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SubmitReceipt {
    /// Task id assigned by the platform, when it reports one.
    pub external_task_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    #[serde(default)]
    id: Option<serde_json::Value>,
}

#[derive(Debug, Clone)]
pub struct AutomationClient {
    client: Client,
    tasks_url: Url,
}

impl AutomationClient {
    /// # Errors
    ///
    /// Returns [`NotifyError::Http`] if the `reqwest::Client` cannot be built,
    /// or [`NotifyError::InvalidBaseUrl`] if `base_url` does not parse.
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self, NotifyError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        let tasks_url = crate::join_base_url(base_url, "api/v1/tasks")?;
        Ok(Self { client, tasks_url })
    }

    /// Submits one task using the agent's own platform key.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::UpstreamFailure`] with the verbatim body on any
    /// non-2xx status, or [`NotifyError::Http`] on transport failure.
    pub async fn submit(
        &self,
        api_key: &str,
        task: &TaskDescriptor,
    ) -> Result<SubmitReceipt, NotifyError> {
        let response = self
            .client
            .post(self.tasks_url.clone())
            .bearer_auth(api_key)
            .json(task)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            tracing::warn!(
                status = status.as_u16(),
                task_type = task.kind().as_str(),
                "automation platform rejected task"
            );
            return Err(NotifyError::UpstreamFailure {
                status: status.as_u16(),
                body,
            });
        }

        // The acknowledgement body is informational; an unparseable one still
        // means the task was accepted.
        let external_task_id = serde_json::from_str::<SubmitResponse>(&body)
            .ok()
            .and_then(|r| r.id)
            .and_then(|id| match id {
                serde_json::Value::String(s) => Some(s),
                serde_json::Value::Number(n) => Some(n.to_string()),
                _ => None,
            });

        Ok(SubmitReceipt { external_task_id })
    }
}
