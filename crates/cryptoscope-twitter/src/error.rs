use thiserror::Error;

/// Errors returned by the X/Twitter API client.
#[derive(Debug, Error)]
pub enum TwitterError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-2xx status. `body` is the raw response text.
    #[error("X API returned HTTP {status}: {body}")]
    Api { status: u16, body: String },

    /// The handle does not resolve to a user.
    #[error("X user not found: @{handle}")]
    UserNotFound { handle: String },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}
