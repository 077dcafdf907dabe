//! Retry with exponential back-off and jitter for X API calls.
//!
//! Only transient failures are retried: connect/timeout errors, HTTP 429 and
//! HTTP 5xx. Everything else is returned on the first attempt.

use std::future::Future;
use std::time::Duration;

use crate::error::TwitterError;

const MAX_DELAY_MS: u64 = 60_000;

pub(crate) fn is_retriable(err: &TwitterError) -> bool {
    match err {
        TwitterError::Http(e) => {
            e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error())
        }
        TwitterError::Api { status, .. } => *status == 429 || *status >= 500,
        TwitterError::UserNotFound { .. }
        | TwitterError::Deserialize { .. }
        | TwitterError::InvalidBaseUrl { .. } => false,
    }
}

/// Runs `operation` with up to `max_retries` additional attempts on transient
/// errors. The delay before attempt `n` is `backoff_base_ms × 2ⁿ⁻¹` with ±25 %
/// jitter, capped at 60 s.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, TwitterError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, TwitterError>>,
{
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err) || attempt >= max_retries {
                    return Err(err);
                }
                attempt += 1;
                let computed = backoff_base_ms.saturating_mul(1u64 << (attempt - 1).min(10));
                let capped = computed.min(MAX_DELAY_MS);
                #[allow(
                    clippy::cast_possible_truncation,
                    clippy::cast_sign_loss,
                    clippy::cast_precision_loss
                )]
                let delay_ms = (capped as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64;
                tracing::warn!(
                    attempt,
                    max_retries,
                    delay_ms,
                    error = %err,
                    "X API transient error, retrying after back-off"
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn api_error(status: u16) -> TwitterError {
        TwitterError::Api {
            status,
            body: "boom".to_owned(),
        }
    }

    #[test]
    fn rate_limit_and_server_errors_are_retriable() {
        assert!(is_retriable(&api_error(429)));
        assert!(is_retriable(&api_error(503)));
    }

    #[test]
    fn client_errors_are_not_retriable() {
        assert!(!is_retriable(&api_error(401)));
        assert!(!is_retriable(&TwitterError::UserNotFound {
            handle: "ghost".to_owned()
        }));
    }

    #[tokio::test]
    async fn retries_transient_then_succeeds() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(3, 0, || {
            let c = Arc::clone(&c);
            async move {
                let attempt = c.fetch_add(1, Ordering::SeqCst) + 1;
                if attempt < 3 {
                    Err(api_error(503))
                } else {
                    Ok(7_u32)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_retries() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(2, 0, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<u32, _>(api_error(500))
            }
        })
        .await;
        assert!(matches!(result, Err(TwitterError::Api { status: 500, .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 3, "1 attempt + 2 retries");
    }

    #[tokio::test]
    async fn does_not_retry_unauthorized() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(3, 0, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<u32, _>(api_error(401))
            }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
