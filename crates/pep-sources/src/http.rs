//! Shared HTTP response helpers for provider clients.
//!
//! Centralizes status-code checks (429 rate limiting with `Retry-After`
//! parsing, non-success → [`SourceError::Api`]) and the retry loop so the
//! provider modules stay focused on request construction and mapping.

use std::future::Future;

use pep_core::retry::RetryConfig;

use crate::error::SourceError;

/// Check an HTTP response for common error conditions.
///
/// - **429 Too Many Requests** → [`SourceError::RateLimited`] with
///   `Retry-After` parsing (falls back to 60 s if absent or unparseable).
/// - **Non-success status** → [`SourceError::Api`] with status and body.
pub async fn check_response(resp: reqwest::Response) -> Result<reqwest::Response, SourceError> {
    if resp.status() == 429 {
        return Err(SourceError::RateLimited {
            retry_after_secs: parse_retry_after(&resp),
        });
    }
    if !resp.status().is_success() {
        return Err(SourceError::Api {
            status: resp.status().as_u16(),
            message: resp.text().await.unwrap_or_default(),
        });
    }
    Ok(resp)
}

/// Parse the `Retry-After` header as seconds, falling back to 60 s.
fn parse_retry_after(resp: &reqwest::Response) -> u64 {
    resp.headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(60)
}

/// Run `op` until it succeeds, fails permanently, or attempts run out.
///
/// Transient failures back off per `retry`, honoring `Retry-After`.
pub async fn with_retry<T, F, Fut>(
    retry: &RetryConfig,
    source: &'static str,
    mut op: F,
) -> Result<T, SourceError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, SourceError>>,
{
    let mut attempt = 0;
    loop {
        attempt += 1;
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() && retry.should_retry(attempt) => {
                let delay = retry.delay_for(attempt, e.retry_after());
                tracing::warn!(source, attempt, ?delay, %e, "transient source error, retrying");
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    use super::*;

    fn mock_response(status: u16) -> reqwest::Response {
        reqwest::Response::from(::http::Response::builder().status(status).body("").unwrap())
    }

    fn mock_response_with_retry_after(status: u16, value: &str) -> reqwest::Response {
        reqwest::Response::from(
            ::http::Response::builder()
                .status(status)
                .header("Retry-After", value)
                .body("")
                .unwrap(),
        )
    }

    fn fast_retry(max_attempts: u32) -> RetryConfig {
        RetryConfig {
            max_attempts,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
        }
    }

    #[test]
    fn parse_retry_after_header_or_default() {
        assert_eq!(parse_retry_after(&mock_response_with_retry_after(429, "120")), 120);
        assert_eq!(parse_retry_after(&mock_response(429)), 60);
        assert_eq!(
            parse_retry_after(&mock_response_with_retry_after(429, "soon")),
            60
        );
    }

    #[tokio::test]
    async fn check_response_maps_statuses() {
        let err = check_response(mock_response_with_retry_after(429, "30"))
            .await
            .unwrap_err();
        assert!(matches!(err, SourceError::RateLimited { retry_after_secs: 30 }));

        let err = check_response(mock_response(502)).await.unwrap_err();
        assert!(matches!(err, SourceError::Api { status: 502, .. }));

        assert!(check_response(mock_response(200)).await.is_ok());
    }

    #[tokio::test]
    async fn retries_transient_errors_until_success() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result = with_retry(&fast_retry(4), "test", || async move {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            if n < 3 {
                Err(SourceError::Api {
                    status: 503,
                    message: "busy".into(),
                })
            } else {
                Ok(n)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn permanent_errors_are_not_retried() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: Result<(), _> = with_retry(&fast_retry(4), "test", || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(SourceError::Parse("bad json".into()))
        })
        .await;
        assert!(matches!(result, Err(SourceError::Parse(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: Result<(), _> = with_retry(&fast_retry(2), "test", || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(SourceError::RateLimited { retry_after_secs: 0 })
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
