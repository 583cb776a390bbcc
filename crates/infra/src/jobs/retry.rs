//! Retry of a single external call on transient provider errors.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use shopreel_generation::GenerationError;

/// Retry policy configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Extra attempts after the first one (0 = no retries)
    pub max_retries: u32,
    /// Fixed delay before each retry
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::single_retry(Duration::from_secs(2))
    }
}

impl RetryPolicy {
    /// Create a policy with no retries.
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            backoff: Duration::ZERO,
        }
    }

    /// Exactly one retry after `backoff`.
    pub fn single_retry(backoff: Duration) -> Self {
        Self {
            max_retries: 1,
            backoff,
        }
    }

    /// Whether another attempt follows a failed `attempt` (1-indexed).
    pub fn should_retry(&self, attempt: u32, error: &GenerationError) -> bool {
        attempt <= self.max_retries && error.is_retryable()
    }
}

/// Run `operation`, retrying retryable failures per `policy`.
///
/// The last error is returned as-is once retries are exhausted or the error
/// is permanent.
pub async fn with_retry<F, Fut, T>(
    policy: &RetryPolicy,
    operation_name: &str,
    mut operation: F,
) -> Result<T, GenerationError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, GenerationError>>,
{
    let mut attempt = 1;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(error) if policy.should_retry(attempt, &error) => {
                warn!(
                    operation = operation_name,
                    attempt,
                    backoff_ms = policy.backoff.as_millis() as u64,
                    error = %error,
                    "transient provider error; retrying"
                );
                tokio::time::sleep(policy.backoff).await;
                attempt += 1;
            }
            Err(error) => return Err(error),
        }
    }
}
