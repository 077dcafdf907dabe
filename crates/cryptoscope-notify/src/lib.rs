//! Outbound notifications for CryptoScope: transactional email through
//! Resend and task submission to the automation platform.

pub mod automation;
pub mod email;
pub mod error;
pub mod templates;

pub use automation::{AutomationClient, SubmitReceipt};
pub use email::{NotificationSender, ResendSender};
pub use error::NotifyError;
pub use templates::EmailMessage;

use reqwest::Url;

fn join_base_url(base_url: &str, path: &str) -> Result<Url, NotifyError> {
    let normalised = format!("{}/", base_url.trim_end_matches('/'));
    Url::parse(&normalised)
        .and_then(|base| base.join(path))
        .map_err(|e| NotifyError::InvalidBaseUrl {
            url: base_url.to_owned(),
            reason: e.to_string(),
        })
}
