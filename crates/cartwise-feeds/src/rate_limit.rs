//! Backoff for transient feed failures.
//!
//! 429, 5xx and transport errors are retried; a portal's `Retry-After` hint
//! stretches the wait when it exceeds the exponential step. Anything else
//! propagates on the first attempt.

use std::future::Future;
use std::time::Duration;

use crate::error::AcquisitionError;

/// Seconds to wait before another attempt, or `None` if `err` is final.
fn retry_delay(err: &AcquisitionError, attempt: u32, backoff_base_secs: u64) -> Option<u64> {
    let step = backoff_base_secs.saturating_mul(1u64 << attempt.min(62));
    match err {
        AcquisitionError::RateLimited {
            retry_after_secs, ..
        } => Some(step.max(*retry_after_secs)),
        AcquisitionError::Http(_) => Some(step),
        AcquisitionError::UnexpectedStatus { status, .. } if *status >= 500 => Some(step),
        _ => None,
    }
}

/// Runs `request` until it succeeds, fails permanently, or `max_retries`
/// extra attempts have been spent.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_secs: u64,
    mut request: F,
) -> Result<T, AcquisitionError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AcquisitionError>>,
{
    let mut attempt = 0u32;
    loop {
        let err = match request().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };
        let Some(wait_secs) = retry_delay(&err, attempt, backoff_base_secs)
            .filter(|_| attempt < max_retries)
        else {
            return Err(err);
        };

        attempt += 1;
        tracing::warn!(
            attempt,
            max_retries,
            wait_secs,
            error = %err,
            "feed request failed, backing off"
        );
        tokio::time::sleep(Duration::from_secs(wait_secs)).await;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    fn status(code: u16) -> AcquisitionError {
        AcquisitionError::UnexpectedStatus {
            status: code,
            url: "https://prices.example.com/file".to_owned(),
        }
    }

    /// Fails with `make_err()` for the first `failures` calls, then yields 7.
    async fn run(
        max_retries: u32,
        failures: u32,
        make_err: fn() -> AcquisitionError,
    ) -> (Result<u32, AcquisitionError>, u32) {
        let calls = AtomicU32::new(0);
        let result = retry_with_backoff(max_retries, 0, || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < failures {
                    Err(make_err())
                } else {
                    Ok(7)
                }
            }
        })
        .await;
        (result, calls.load(Ordering::SeqCst))
    }

    #[tokio::test]
    async fn first_success_is_returned_without_retry() {
        let (result, calls) = run(3, 0, || status(503)).await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls, 1);
    }

    #[tokio::test]
    async fn server_errors_are_retried_until_success() {
        let (result, calls) = run(3, 2, || status(503)).await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls, 3);
    }

    #[tokio::test]
    async fn exhausted_retries_return_the_last_error() {
        let (result, calls) = run(2, u32::MAX, || AcquisitionError::RateLimited {
            url: "https://prices.example.com".to_owned(),
            retry_after_secs: 0,
        })
        .await;
        assert_eq!(calls, 3);
        assert!(matches!(result, Err(AcquisitionError::RateLimited { .. })));
    }

    #[tokio::test]
    async fn auth_and_client_errors_are_final() {
        let (auth, auth_calls) = run(3, u32::MAX, || AcquisitionError::Auth {
            context: "login".to_owned(),
            reason: "HTTP 403".to_owned(),
        })
        .await;
        assert!(matches!(auth, Err(AcquisitionError::Auth { .. })));
        assert_eq!(auth_calls, 1);

        let (_, bad_request_calls) = run(3, u32::MAX, || status(400)).await;
        assert_eq!(bad_request_calls, 1);
    }

    #[test]
    fn retry_after_hint_extends_the_wait() {
        let limited = AcquisitionError::RateLimited {
            url: "https://prices.example.com".to_owned(),
            retry_after_secs: 30,
        };
        assert_eq!(retry_delay(&limited, 0, 2), Some(30));
        assert_eq!(retry_delay(&limited, 5, 2), Some(64));
        assert_eq!(retry_delay(&status(502), 1, 2), Some(4));
        assert_eq!(retry_delay(&status(404), 0, 2), None);
    }
}
