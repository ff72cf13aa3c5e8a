//! Retry helper for transient collector failures.
//!
//! Backoff is linear (`base × attempt_number`) rather than exponential:
//! answer engines throttle on burst rate, and the overall per-collect
//! deadline bounds total wait anyway. Non-retriable failures (client
//! errors, malformed payloads) propagate immediately.

use std::future::Future;
use std::time::Duration;

use crate::error::CollectorErrorKind;

/// Returns `true` if `err` represents a transient condition worth another
/// attempt.
///
/// Retriable:
/// - [`CollectorErrorKind::Http`] — network-level failure.
/// - [`CollectorErrorKind::UnexpectedStatus`] for 429 and any 5xx.
/// - [`CollectorErrorKind::EmptyExtraction`] — engines intermittently
///   render empty shells; a fresh session usually recovers.
///
/// Non-retriable:
/// - [`CollectorErrorKind::UnexpectedStatus`] for other client errors.
/// - [`CollectorErrorKind::Malformed`] — retrying cannot fix the shape.
/// - [`CollectorErrorKind::Timeout`] — produced only by the overall
///   deadline, outside this loop.
pub(crate) fn is_retriable(err: &CollectorErrorKind) -> bool {
    match err {
        CollectorErrorKind::Http(_) | CollectorErrorKind::EmptyExtraction => true,
        CollectorErrorKind::UnexpectedStatus { status } => {
            *status == 429 || (500..600).contains(&u32::from(*status))
        }
        CollectorErrorKind::Malformed(_) | CollectorErrorKind::Timeout { .. } => false,
    }
}

/// Executes `operation` with linear-backoff retries on transient errors.
///
/// On a retriable error the function sleeps `backoff_base_secs × n` seconds
/// before the n-th retry, up to `max_retries` additional attempts after the
/// first try. Returns the last error with the number of retries actually
/// performed.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_secs: u64,
    mut operation: F,
) -> Result<T, (CollectorErrorKind, u32)>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, CollectorErrorKind>>,
{
    let mut retries = 0u32;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err) || retries >= max_retries {
                    return Err((err, retries));
                }
                let delay_secs = backoff_base_secs.saturating_mul(u64::from(retries) + 1);
                tracing::warn!(
                    retries,
                    max_retries,
                    delay_secs,
                    error = %err,
                    "transient collector error — retrying after backoff"
                );
                tokio::time::sleep(Duration::from_secs(delay_secs)).await;
                retries += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn succeeds_immediately_on_first_try() {
        let call_count = Arc::new(AtomicU32::new(0));
        let cc = Arc::clone(&call_count);
        let result = retry_with_backoff(3, 0, || {
            let cc = Arc::clone(&cc);
            async move {
                cc.fetch_add(1, Ordering::SeqCst);
                Ok::<u32, CollectorErrorKind>(42)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(call_count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_on_server_error_then_succeeds() {
        let call_count = Arc::new(AtomicU32::new(0));
        let cc = Arc::clone(&call_count);
        let result = retry_with_backoff(3, 0, || {
            let cc = Arc::clone(&cc);
            async move {
                let n = cc.fetch_add(1, Ordering::SeqCst);
                if n < 2 {
                    Err(CollectorErrorKind::UnexpectedStatus { status: 502 })
                } else {
                    Ok::<u32, CollectorErrorKind>(99)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 99);
        assert_eq!(call_count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn reports_retry_count_after_exhaustion() {
        let call_count = Arc::new(AtomicU32::new(0));
        let cc = Arc::clone(&call_count);
        let result: Result<u32, _> = retry_with_backoff(2, 0, || {
            let cc = Arc::clone(&cc);
            async move {
                cc.fetch_add(1, Ordering::SeqCst);
                Err(CollectorErrorKind::EmptyExtraction)
            }
        })
        .await;
        // max_retries=2 → 3 total attempts, 2 retries reported
        assert_eq!(call_count.load(Ordering::SeqCst), 3);
        let (err, retries) = result.unwrap_err();
        assert!(matches!(err, CollectorErrorKind::EmptyExtraction));
        assert_eq!(retries, 2);
    }

    #[tokio::test]
    async fn does_not_retry_client_error() {
        let call_count = Arc::new(AtomicU32::new(0));
        let cc = Arc::clone(&call_count);
        let result: Result<u32, _> = retry_with_backoff(3, 0, || {
            let cc = Arc::clone(&cc);
            async move {
                cc.fetch_add(1, Ordering::SeqCst);
                Err(CollectorErrorKind::UnexpectedStatus { status: 404 })
            }
        })
        .await;
        assert_eq!(call_count.load(Ordering::SeqCst), 1);
        let (err, retries) = result.unwrap_err();
        assert!(matches!(
            err,
            CollectorErrorKind::UnexpectedStatus { status: 404 }
        ));
        assert_eq!(retries, 0);
    }

    #[tokio::test]
    async fn does_not_retry_malformed_payload() {
        let parse_err = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let shared = Arc::new(std::sync::Mutex::new(Some(parse_err)));
        let call_count = Arc::new(AtomicU32::new(0));
        let cc = Arc::clone(&call_count);
        let result: Result<u32, _> = retry_with_backoff(3, 0, || {
            let cc = Arc::clone(&cc);
            let shared = Arc::clone(&shared);
            async move {
                cc.fetch_add(1, Ordering::SeqCst);
                let e = shared
                    .lock()
                    .unwrap()
                    .take()
                    .unwrap_or_else(|| serde_json::from_str::<serde_json::Value>("x").unwrap_err());
                Err(CollectorErrorKind::Malformed(e))
            }
        })
        .await;
        assert_eq!(call_count.load(Ordering::SeqCst), 1);
        assert!(matches!(result.unwrap_err().0, CollectorErrorKind::Malformed(_)));
    }

    #[test]
    fn rate_limit_status_is_retriable() {
        assert!(is_retriable(&CollectorErrorKind::UnexpectedStatus {
            status: 429
        }));
        assert!(is_retriable(&CollectorErrorKind::UnexpectedStatus {
            status: 503
        }));
        assert!(!is_retriable(&CollectorErrorKind::UnexpectedStatus {
            status: 403
        }));
    }
}
