//! Async utilities and patterns
//!
//! Timeouts, retry with backoff, and bounded fan-out over independent network calls

use crate::error::{ErrorContext, ProbeError, ProbeResult};
use futures::future::BoxFuture;
use futures::stream::{self, StreamExt};
use std::future::Future;
use tokio::time::{sleep, timeout, Duration};
use tracing::{debug, error, warn};

/// Retry configuration
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts
    pub max_attempts: usize,
    /// Initial delay between retries in milliseconds
    pub initial_delay_ms: u64,
    /// Maximum delay between retries in milliseconds
    pub max_delay_ms: u64,
    /// Backoff multiplier (exponential backoff)
    pub backoff_multiplier: f64,
    /// Whether to add jitter to delays
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay_ms: 1000,
            max_delay_ms: 30000,
            backoff_multiplier: 2.0,
            jitter: true,
        }
    }
}

impl RetryConfig {
    /// A config that runs the operation exactly once
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Default::default()
        }
    }
}

/// Retry an async operation with exponential backoff.
///
/// Only errors for which [`ProbeError::is_recoverable`] holds are retried;
/// anything else is returned on the first failure.
pub async fn retry_async<'a, F, T>(
    operation: F,
    config: &RetryConfig,
    operation_name: &str,
) -> ProbeResult<T>
where
    F: Fn() -> BoxFuture<'a, ProbeResult<T>>,
{
    let mut attempt = 0;
    let mut delay = config.initial_delay_ms;

    loop {
        attempt += 1;

        debug!(
            operation = operation_name,
            attempt = attempt,
            max_attempts = config.max_attempts,
            "Attempting operation"
        );

        match operation().await {
            Ok(result) => {
                if attempt > 1 {
                    debug!(
                        operation = operation_name,
                        attempt = attempt,
                        "Operation succeeded after retry"
                    );
                }
                return Ok(result);
            }
            Err(err) => {
                if !err.is_recoverable() {
                    return Err(err);
                }
                if attempt >= config.max_attempts {
                    error!(
                        operation = operation_name,
                        attempt = attempt,
                        error = %err,
                        "Operation failed after all retry attempts"
                    );
                    return Err(err);
                }

                let base_delay = err.retry_delay_ms().unwrap_or(delay).max(delay);
                warn!(
                    operation = operation_name,
                    attempt = attempt,
                    error = %err,
                    delay_ms = base_delay,
                    "Operation failed, retrying"
                );

                let actual_delay = if config.jitter {
                    let jitter_factor = 0.1;
                    let jitter = (fastrand::f64() - 0.5) * 2.0 * jitter_factor;
                    ((base_delay as f64) * (1.0 + jitter)) as u64
                } else {
                    base_delay
                };

                sleep(Duration::from_millis(actual_delay)).await;

                delay = ((delay as f64) * config.backoff_multiplier) as u64;
                delay = delay.min(config.max_delay_ms);
            }
        }
    }
}

/// Timeout wrapper for async operations
pub async fn with_timeout<F, T>(future: F, timeout_ms: u64, operation_name: &str) -> ProbeResult<T>
where
    F: Future<Output = T>,
{
    match timeout(Duration::from_millis(timeout_ms), future).await {
        Ok(result) => Ok(result),
        Err(_) => Err(ProbeError::Timeout {
            operation: operation_name.to_string(),
            duration_ms: timeout_ms,
            context: ErrorContext::new("async_utils")
                .with_operation("timeout")
                .with_metadata("timeout_ms", &timeout_ms.to_string())
                .with_suggestion("Increase timeout duration")
                .with_suggestion("Check network connectivity"),
        }),
    }
}

/// Like [`with_timeout`] for operations that already return a `ProbeResult`
pub async fn try_with_timeout<F, T>(
    future: F,
    timeout_ms: u64,
    operation_name: &str,
) -> ProbeResult<T>
where
    F: Future<Output = ProbeResult<T>>,
{
    with_timeout(future, timeout_ms, operation_name).await?
}

/// Run `processor` over `items` with at most `max_concurrent` in flight.
///
/// Results come back in input order regardless of completion order.
pub async fn process_in_order<T, R, F, Fut>(
    items: Vec<T>,
    max_concurrent: usize,
    processor: F,
) -> Vec<R>
where
    F: FnMut(T) -> Fut,
    Fut: Future<Output = R>,
{
    stream::iter(items)
        .map(processor)
        .buffered(max_concurrent.max(1))
        .collect()
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn network_error() -> ProbeError {
        ProbeError::Network {
            message: "connection reset".to_string(),
            source: None,
            context: ErrorContext::new("test"),
        }
    }

    #[tokio::test]
    async fn test_retry_recovers_from_transient_failures() {
        let attempts = AtomicUsize::new(0);
        let config = RetryConfig {
            max_attempts: 3,
            initial_delay_ms: 1,
            max_delay_ms: 2,
            backoff_multiplier: 1.0,
            jitter: false,
        };

        let result = retry_async(
            || {
                let count = attempts.fetch_add(1, Ordering::SeqCst) + 1;
                async move {
                    if count < 2 {
                        Err(ProbeError::RateLimit {
                            message: "slow down".to_string(),
                            retry_after_ms: Some(1),
                            context: ErrorContext::new("test"),
                        })
                    } else {
                        Ok(count)
                    }
                }
                .boxed()
            },
            &config,
            "test_retry",
        )
        .await;

        assert_eq!(result.unwrap(), 2);
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_retry_does_not_retry_permanent_errors() {
        let attempts = AtomicUsize::new(0);

        let result: ProbeResult<()> = retry_async(
            || {
                attempts.fetch_add(1, Ordering::SeqCst);
                async {
                    Err(ProbeError::NotFound {
                        resource: "repos/a/b".to_string(),
                        context: ErrorContext::new("test"),
                    })
                }
                .boxed()
            },
            &RetryConfig::default(),
            "test_permanent",
        )
        .await;

        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_with_timeout_expires() {
        let result = with_timeout(sleep(Duration::from_millis(200)), 10, "slow_op").await;
        match result {
            Err(ProbeError::Timeout {
                operation,
                duration_ms,
                ..
            }) => {
                assert_eq!(operation, "slow_op");
                assert_eq!(duration_ms, 10);
            }
            other => panic!("Expected timeout, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_try_with_timeout_passes_inner_error_through() {
        let result: ProbeResult<()> =
            try_with_timeout(async { Err(network_error()) }, 1000, "inner").await;
        assert!(matches!(result, Err(ProbeError::Network { .. })));
    }

    #[tokio::test]
    async fn test_process_in_order_keeps_input_order() {
        let items = vec![30u64, 1, 15, 5];
        let results = process_in_order(items, 4, |delay| async move {
            sleep(Duration::from_millis(delay)).await;
            delay
        })
        .await;

        assert_eq!(results, vec![30, 1, 15, 5]);
    }
}
