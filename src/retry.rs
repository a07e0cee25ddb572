//! Retry logic for page requests
//!
//! Failures fall into three groups:
//! - server-side timeouts (HTTP 408) are retried after the cooldown and never counted
//! - other transport and HTTP failures are retried after the cooldown while the
//!   consecutive-failure counter is below `max_attempts`
//! - everything else (malformed payloads, local errors) is returned immediately
//!
//! # Example
//!
//! ```no_run
//! use pdb_pfam_export::config::RetryConfig;
//! use pdb_pfam_export::error::Error;
//! use pdb_pfam_export::retry::fetch_with_retry;
//!
//! # async fn example() -> Result<(), Error> {
//! let config = RetryConfig::default();
//! let body = fetch_with_retry(&config, "https://example.org/page/1", || async {
//!     Ok::<_, Error>("payload".to_string())
//! })
//! .await?;
//! # Ok(())
//! # }
//! ```

use crate::config::RetryConfig;
use crate::error::{Error, Result};
use std::future::Future;

/// Trait for errors that can be classified as retryable or not
pub trait IsRetryable {
    /// Returns true if the operation should be attempted again
    fn is_retryable(&self) -> bool;

    /// Returns true if a retry for this error uses up part of the retry budget
    fn counts_against_budget(&self) -> bool {
        true
    }
}

impl IsRetryable for Error {
    fn is_retryable(&self) -> bool {
        match self {
            // Expected on large queries; the server asks us to come back later
            Error::RequestTimeout { .. } => true,
            // Any other status the upstream answered with
            Error::HttpStatus { .. } => true,
            // Connect, reset, client-side timeout, truncated body
            Error::Network(_) => true,
            // A broken payload will not fix itself on the next request
            Error::MalformedPage { .. } | Error::MalformedItem { .. } => false,
            Error::CursorRevisited { .. } => false,
            Error::RetriesExhausted { .. } => false,
            Error::Config { .. } => false,
            Error::Io(_) | Error::Csv(_) => false,
            Error::UnknownCategory { .. } | Error::ColumnMismatch { .. } => false,
        }
    }

    fn counts_against_budget(&self) -> bool {
        !matches!(self, Error::RequestTimeout { .. })
    }
}

/// Run a page request until it succeeds, the budget runs out, or a fatal error occurs
///
/// Every retry, counted or not, waits `config.cooldown` first and re-issues the
/// same request. When a counted failure arrives with the counter already at
/// `config.max_attempts`, the failure is returned wrapped in
/// [`Error::RetriesExhausted`]. Reporting the final error is left to the caller.
pub async fn fetch_with_retry<F, Fut, T>(
    config: &RetryConfig,
    url: &str,
    mut operation: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempts: u32 = 0;
    let mut timeouts: u32 = 0;

    loop {
        match operation().await {
            Ok(result) => {
                if attempts > 0 || timeouts > 0 {
                    tracing::info!(url, attempts, timeouts, "Page request succeeded after retry");
                }
                return Ok(result);
            }
            Err(e) if e.is_retryable() && !e.counts_against_budget() => {
                timeouts += 1;
                tracing::warn!(
                    error = %e,
                    url,
                    timeouts,
                    cooldown_secs = config.cooldown.as_secs_f64(),
                    "Upstream timed out, waiting before asking again"
                );
                tokio::time::sleep(config.cooldown).await;
            }
            Err(e) if e.is_retryable() && attempts < config.max_attempts => {
                attempts += 1;
                tracing::warn!(
                    error = %e,
                    url,
                    attempt = attempts,
                    max_attempts = config.max_attempts,
                    cooldown_secs = config.cooldown.as_secs_f64(),
                    "Page request failed, retrying"
                );
                tokio::time::sleep(config.cooldown).await;
            }
            Err(e) if e.is_retryable() => {
                tracing::debug!(
                    error = %e,
                    url,
                    attempts,
                    "Page request failed after all retry attempts exhausted"
                );
                return Err(Error::RetriesExhausted {
                    url: url.to_string(),
                    attempts,
                    source: Box::new(e),
                });
            }
            Err(e) => {
                tracing::debug!(error = %e, url, "Page request failed with non-retryable error");
                return Err(e);
            }
        }
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::{Duration, Instant};

    const URL: &str = "http://upstream.test/api?page_size=200";

    fn fast_config() -> RetryConfig {
        RetryConfig {
            max_attempts: 3,
            cooldown: Duration::from_millis(10),
        }
    }

    fn server_error() -> Error {
        Error::HttpStatus {
            url: URL.to_string(),
            status: 500,
        }
    }

    fn timeout() -> Error {
        Error::RequestTimeout {
            url: URL.to_string(),
        }
    }

    #[tokio::test]
    async fn test_success_no_retry() {
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result = fetch_with_retry(&fast_config(), URL, || {
            let counter = counter_clone.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(42)
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(counter.load(Ordering::SeqCst), 1, "should only call once");
    }

    #[tokio::test]
    async fn three_counted_failures_then_success() {
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result = fetch_with_retry(&fast_config(), URL, || {
            let counter = counter_clone.clone();
            async move {
                let count = counter.fetch_add(1, Ordering::SeqCst);
                if count < 3 { Err(server_error()) } else { Ok("page") }
            }
        })
        .await;

        assert_eq!(result.unwrap(), "page");
        assert_eq!(counter.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn fourth_consecutive_failure_is_fatal() {
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result = fetch_with_retry(&fast_config(), URL, || {
            let counter = counter_clone.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(server_error())
            }
        })
        .await;

        match result {
            Err(Error::RetriesExhausted {
                url,
                attempts,
                source,
            }) => {
                assert_eq!(url, URL);
                assert_eq!(attempts, 3);
                assert!(matches!(*source, Error::HttpStatus { status: 500, .. }));
            }
            other => panic!("expected RetriesExhausted, got {other:?}"),
        }
        assert_eq!(
            counter.load(Ordering::SeqCst),
            4,
            "should try initial + 3 retries"
        );
    }

    #[tokio::test]
    async fn timeouts_never_exhaust_the_budget() {
        let config = RetryConfig {
            max_attempts: 0,
            cooldown: Duration::from_millis(1),
        };
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result = fetch_with_retry(&config, URL, || {
            let counter = counter_clone.clone();
            async move {
                let count = counter.fetch_add(1, Ordering::SeqCst);
                if count < 25 { Err(timeout()) } else { Ok(count) }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 25);
        assert_eq!(counter.load(Ordering::SeqCst), 26);
    }

    #[tokio::test]
    async fn timeouts_do_not_reset_or_consume_counted_attempts() {
        // error, timeout, error, timeout, error, timeout, error -> fatal on the fourth error
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result = fetch_with_retry(&fast_config(), URL, || {
            let counter = counter_clone.clone();
            async move {
                let count = counter.fetch_add(1, Ordering::SeqCst);
                if count % 2 == 1 {
                    Err::<(), _>(timeout())
                } else {
                    Err(server_error())
                }
            }
        })
        .await;

        assert!(matches!(
            result,
            Err(Error::RetriesExhausted { attempts: 3, .. })
        ));
        assert_eq!(counter.load(Ordering::SeqCst), 7);
    }

    #[tokio::test]
    async fn malformed_page_is_not_retried() {
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result = fetch_with_retry(&fast_config(), URL, || {
            let counter = counter_clone.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(Error::MalformedPage {
                    url: URL.to_string(),
                    reason: "missing field `results`".to_string(),
                })
            }
        })
        .await;

        assert!(matches!(result, Err(Error::MalformedPage { .. })));
        assert_eq!(
            counter.load(Ordering::SeqCst),
            1,
            "should not retry malformed payloads"
        );
    }

    #[tokio::test]
    async fn each_retry_waits_the_full_cooldown() {
        let config = RetryConfig {
            max_attempts: 3,
            cooldown: Duration::from_millis(40),
        };

        let timestamps = Arc::new(tokio::sync::Mutex::new(Vec::new()));
        let ts_clone = timestamps.clone();

        let _result = fetch_with_retry(&config, URL, || {
            let ts = ts_clone.clone();
            async move {
                let mut ts = ts.lock().await;
                ts.push(Instant::now());
                if ts.len() == 2 {
                    Err::<(), _>(timeout())
                } else {
                    Err(server_error())
                }
            }
        })
        .await;

        let ts = timestamps.lock().await;
        assert_eq!(ts.len(), 5, "initial + 1 timeout + 3 counted retries");
        for i in 1..ts.len() {
            let gap = ts[i].duration_since(ts[i - 1]);
            assert!(
                gap >= Duration::from_millis(35),
                "gap before call {} was {:?}, expected the fixed cooldown",
                i + 1,
                gap
            );
        }
    }

    #[test]
    fn classification_of_error_variants() {
        assert!(timeout().is_retryable());
        assert!(!timeout().counts_against_budget());

        assert!(server_error().is_retryable());
        assert!(server_error().counts_against_budget());

        assert!(
            !Error::MalformedItem {
                accession: Some("1abc".to_string()),
                reason: "missing entry_subset".to_string(),
            }
            .is_retryable()
        );
        assert!(
            !Error::CursorRevisited {
                url: URL.to_string()
            }
            .is_retryable()
        );
        assert!(
            !Error::Config {
                message: "bad".to_string(),
                key: None
            }
            .is_retryable()
        );
        assert!(
            !Error::UnknownCategory {
                value: "x".to_string(),
                line: 2
            }
            .is_retryable()
        );
    }
}
