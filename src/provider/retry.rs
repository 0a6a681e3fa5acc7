//! Retry with exponential backoff for upstream calls
//!
//! Transient upstream failures (connection errors, timeouts, 5xx) are
//! retried with exponential backoff and jitter. Everything else fails fast.

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Configuration for retry behavior
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts (not including the initial attempt)
    pub max_retries: u32,

    /// Initial backoff duration
    pub initial_backoff: Duration,

    /// Maximum backoff duration
    pub max_backoff: Duration,

    /// Backoff multiplier (typically 2.0 for exponential backoff)
    pub multiplier: f64,

    /// Add random jitter to prevent thundering herd
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_backoff: Duration::from_millis(250),
            max_backoff: Duration::from_secs(5),
            multiplier: 2.0,
            jitter: true,
        }
    }
}

impl RetryConfig {
    /// Default backoff with `attempts` total tries (at least one)
    pub fn with_attempts(attempts: u32) -> Self {
        Self {
            max_retries: attempts.saturating_sub(1),
            ..Default::default()
        }
    }

    /// No retries at all
    pub fn none() -> Self {
        Self::with_attempts(1)
    }

    /// Calculate backoff duration for a given attempt
    pub fn backoff_duration(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let base = self.initial_backoff.as_secs_f64() * self.multiplier.powi(exponent);
        let capped = base.min(self.max_backoff.as_secs_f64());

        let final_duration = if self.jitter {
            // Add 0-25% jitter
            capped * (1.0 + rand_jitter() * 0.25)
        } else {
            capped
        };

        Duration::from_secs_f64(final_duration)
    }
}

/// Pseudo-random value in 0.0..1.0 from the clock's sub-second nanos
fn rand_jitter() -> f64 {
    use std::time::SystemTime;
    let nanos = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or(0);
    (nanos % 1000) as f64 / 1000.0
}

/// Retry classification for errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry the operation
    Retry,
    /// Don't retry, the error is permanent
    NoRetry,
}

/// Trait for errors that can indicate whether to retry
pub trait RetryableError {
    fn retry_decision(&self) -> RetryDecision;
}

impl RetryableError for gifhost::Error {
    fn retry_decision(&self) -> RetryDecision {
        // Rate limits go back to the caller with their Retry-After intact
        if self.is_transient() {
            RetryDecision::Retry
        } else {
            RetryDecision::NoRetry
        }
    }
}

/// Execute an async operation with retry logic
///
/// Returns the first success, or the last error once retries are exhausted
/// or a permanent error is seen.
pub async fn with_retry<F, Fut, T, E>(
    config: &RetryConfig,
    operation_name: &str,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: RetryableError + std::fmt::Display,
{
    let mut attempt = 0;

    loop {
        let e = match operation().await {
            Ok(result) => return Ok(result),
            Err(e) => e,
        };

        let decision = e.retry_decision();
        if decision == RetryDecision::NoRetry {
            debug!(
                operation = operation_name,
                attempt = attempt,
                error = %e,
                "Upstream call failed with non-retryable error"
            );
            return Err(e);
        }

        if attempt >= config.max_retries {
            warn!(
                operation = operation_name,
                attempts = attempt + 1,
                error = %e,
                "Upstream call failed after all attempts"
            );
            return Err(e);
        }

        let backoff = config.backoff_duration(attempt);

        warn!(
            operation = operation_name,
            attempt = attempt + 1,
            max_attempts = config.max_retries + 1,
            backoff_ms = backoff.as_millis() as u64,
            error = %e,
            "Retrying upstream call"
        );

        sleep(backoff).await;
        attempt += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_duration() {
        let config = RetryConfig {
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(60),
            multiplier: 2.0,
            jitter: false,
            ..Default::default()
        };

        assert_eq!(config.backoff_duration(0), Duration::from_secs(1));
        assert_eq!(config.backoff_duration(1), Duration::from_secs(2));
        assert_eq!(config.backoff_duration(3), Duration::from_secs(8));
        assert_eq!(config.backoff_duration(6), Duration::from_secs(60)); // Capped
    }

    #[test]
    fn test_backoff_with_jitter() {
        let config = RetryConfig {
            initial_backoff: Duration::from_secs(1),
            jitter: true,
            ..Default::default()
        };

        let backoff = config.backoff_duration(0);
        assert!(backoff >= Duration::from_secs(1));
        assert!(backoff <= Duration::from_millis(1250));
    }

    #[test]
    fn test_attempt_counts() {
        assert_eq!(RetryConfig::with_attempts(3).max_retries, 2);
        assert_eq!(RetryConfig::none().max_retries, 0);
        assert_eq!(RetryConfig::with_attempts(0).max_retries, 0);
    }

    #[test]
    fn test_gifhost_error_classification() {
        let unavailable = gifhost::Error::Status {
            status: 503,
            message: "down".to_string(),
        };
        assert_eq!(unavailable.retry_decision(), RetryDecision::Retry);

        let missing = gifhost::Error::NotFound("user ghost".to_string());
        assert_eq!(missing.retry_decision(), RetryDecision::NoRetry);

        let limited = gifhost::Error::RateLimited { retry_after: 30 };
        assert_eq!(limited.retry_decision(), RetryDecision::NoRetry);
    }

    #[derive(Debug)]
    struct TestError {
        retryable: bool,
    }

    impl std::fmt::Display for TestError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "TestError(retryable={})", self.retryable)
        }
    }

    impl RetryableError for TestError {
        fn retry_decision(&self) -> RetryDecision {
            if self.retryable {
                RetryDecision::Retry
            } else {
                RetryDecision::NoRetry
            }
        }
    }

    fn fast() -> RetryConfig {
        RetryConfig {
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(5),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_retry_succeeds_eventually() {
        let mut attempts = 0;

        let result: Result<&str, TestError> = with_retry(&fast(), "test", || {
            attempts += 1;
            async move {
                if attempts < 3 {
                    Err(TestError { retryable: true })
                } else {
                    Ok("success")
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), "success");
        assert_eq!(attempts, 3);
    }

    #[tokio::test]
    async fn test_retry_gives_up() {
        let mut attempts = 0;

        let result: Result<&str, TestError> = with_retry(&fast(), "test", || {
            attempts += 1;
            async move { Err(TestError { retryable: true }) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(attempts, 3); // Initial + 2 retries
    }

    #[tokio::test]
    async fn test_no_retry_on_permanent_error() {
        let mut attempts = 0;

        let result: Result<&str, TestError> = with_retry(&fast(), "test", || {
            attempts += 1;
            async move { Err(TestError { retryable: false }) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(attempts, 1);
    }
}
