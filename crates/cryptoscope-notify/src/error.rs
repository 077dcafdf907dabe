use thiserror::Error;

/// Errors from the email provider and the automation platform.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// Network or TLS failure before any response arrived.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The upstream answered with a non-2xx status. `body` is the raw response text.
    #[error("upstream returned HTTP {status}: {body}")]
    UpstreamFailure { status: u16, body: String },

    #[error("invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}
