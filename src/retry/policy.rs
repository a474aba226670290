//! Counted-attempt retries with exponential delay and jitter.

use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

use crate::error::LlmError;

/// Retry policy: how many attempts, how long to wait between them, and
/// which errors qualify.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub backoff_multiplier: f64,
    pub use_jitter: bool,
    /// Jitter as a fraction of the delay, in `0.0..=1.0`.
    pub jitter_factor: f64,
    /// Overrides `LlmError::is_retryable` when set.
    pub retry_condition: Option<fn(&LlmError) -> bool>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(1000),
            max_delay: Duration::from_secs(60),
            backoff_multiplier: 2.0,
            use_jitter: true,
            jitter_factor: 0.1,
            retry_condition: None,
        }
    }
}

impl RetryPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub const fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub const fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    pub const fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    pub const fn with_backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    pub const fn with_jitter(mut self, use_jitter: bool) -> Self {
        self.use_jitter = use_jitter;
        self
    }

    pub const fn with_jitter_factor(mut self, factor: f64) -> Self {
        self.jitter_factor = factor.clamp(0.0, 1.0);
        self
    }

    pub fn with_retry_condition(mut self, condition: fn(&LlmError) -> bool) -> Self {
        self.retry_condition = Some(condition);
        self
    }

    pub fn should_retry(&self, error: &LlmError) -> bool {
        match self.retry_condition {
            Some(condition) => condition(error),
            None => error.is_retryable(),
        }
    }

    /// Delay before retry number `attempt` (zero based).
    pub fn calculate_delay(&self, attempt: u32) -> Duration {
        let base_ms =
            self.initial_delay.as_millis() as f64 * self.backoff_multiplier.powi(attempt as i32);
        let delay = Duration::from_millis(base_ms as u64).min(self.max_delay);

        if !self.use_jitter || delay.is_zero() {
            return delay;
        }
        let range = delay.as_millis() as f64 * self.jitter_factor;
        let jitter = rand::thread_rng().gen_range(-range..=range);
        Duration::from_millis((delay.as_millis() as f64 + jitter).max(0.0) as u64)
    }
}

/// Runs an operation under a [`RetryPolicy`].
#[derive(Debug, Clone, Default)]
pub struct RetryExecutor {
    policy: RetryPolicy,
}

impl RetryExecutor {
    pub const fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Execute `operation`, retrying qualifying errors until the attempts run out.
    /// The last error is returned when every attempt failed.
    pub async fn execute<F, Fut, T>(&self, mut operation: F) -> Result<T, LlmError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, LlmError>>,
    {
        let attempts = self.policy.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            let error = match operation().await {
                Ok(value) => return Ok(value),
                Err(error) => error,
            };

            if !self.policy.should_retry(&error) || attempt + 1 >= attempts {
                return Err(error);
            }

            let delay = self.policy.calculate_delay(attempt);
            tracing::debug!(
                attempt = attempt + 1,
                max_attempts = attempts,
                delay_ms = delay.as_millis() as u64,
                "retrying after error: {error}"
            );
            sleep(delay).await;
            attempt += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_policy(attempts: u32) -> RetryPolicy {
        RetryPolicy::new()
            .with_max_attempts(attempts)
            .with_initial_delay(Duration::ZERO)
            .with_jitter(false)
    }

    #[tokio::test]
    async fn succeeds_on_second_attempt() {
        let counter = Arc::new(AtomicU32::new(0));
        let executor = RetryExecutor::new(fast_policy(3));

        let result = executor
            .execute(|| {
                let counter = counter.clone();
                async move {
                    if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                        Err(LlmError::api_error(500, "server error"))
                    } else {
                        Ok("success")
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), "success");
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let counter = Arc::new(AtomicU32::new(0));
        let executor = RetryExecutor::new(fast_policy(2));

        let result: Result<(), LlmError> = executor
            .execute(|| {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(LlmError::TimeoutError("slow".into()))
                }
            })
            .await;

        assert!(matches!(result, Err(LlmError::TimeoutError(_))));
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn does_not_retry_function_errors() {
        let counter = Arc::new(AtomicU32::new(0));
        let executor = RetryExecutor::new(fast_policy(5));

        let result: Result<(), LlmError> = executor
            .execute(|| {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(LlmError::UnknownFunction("calc".into()))
                }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn delay_grows_exponentially_and_caps() {
        let policy = RetryPolicy::new()
            .with_initial_delay(Duration::from_millis(100))
            .with_max_delay(Duration::from_millis(300))
            .with_backoff_multiplier(2.0)
            .with_jitter(false);

        assert_eq!(policy.calculate_delay(0), Duration::from_millis(100));
        assert_eq!(policy.calculate_delay(1), Duration::from_millis(200));
        assert_eq!(policy.calculate_delay(2), Duration::from_millis(300));
    }
}
