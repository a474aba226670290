//! Exponential backoff retries on top of the `backoff` crate.

use std::future::Future;
use std::time::Duration;

use backoff::ExponentialBackoff;
use backoff::ExponentialBackoffBuilder;

use crate::defaults;
use crate::error::LlmError;

/// Backoff-based executor. Only retryable errors are retried; everything
/// else is returned immediately as a permanent failure.
#[derive(Debug, Clone)]
pub struct BackoffRetryExecutor {
    pub initial_interval: Duration,
    pub max_interval: Duration,
    pub multiplier: f64,
    pub randomization_factor: f64,
    /// Stop retrying once this much time has passed. `None` retries forever.
    pub max_elapsed_time: Option<Duration>,
}

impl Default for BackoffRetryExecutor {
    fn default() -> Self {
        Self {
            initial_interval: defaults::retry::INITIAL_INTERVAL,
            max_interval: defaults::retry::MAX_INTERVAL,
            multiplier: defaults::retry::MULTIPLIER,
            randomization_factor: defaults::retry::RANDOMIZATION_FACTOR,
            max_elapsed_time: Some(defaults::retry::MAX_ELAPSED_TIME),
        }
    }
}

impl BackoffRetryExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_initial_interval(mut self, interval: Duration) -> Self {
        self.initial_interval = interval;
        self
    }

    pub fn with_max_interval(mut self, interval: Duration) -> Self {
        self.max_interval = interval;
        self
    }

    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    pub fn with_randomization_factor(mut self, factor: f64) -> Self {
        self.randomization_factor = factor.clamp(0.0, 1.0);
        self
    }

    pub fn with_max_elapsed_time(mut self, max_elapsed_time: Option<Duration>) -> Self {
        self.max_elapsed_time = max_elapsed_time;
        self
    }

    fn backoff(&self) -> ExponentialBackoff {
        ExponentialBackoffBuilder::new()
            .with_initial_interval(self.initial_interval)
            .with_max_interval(self.max_interval)
            .with_multiplier(self.multiplier)
            .with_randomization_factor(self.randomization_factor)
            .with_max_elapsed_time(self.max_elapsed_time)
            .build()
    }

    pub async fn execute<F, Fut, T>(&self, operation: F) -> Result<T, LlmError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, LlmError>>,
    {
        let operation = &operation;
        backoff::future::retry_notify(
            self.backoff(),
            || async move {
                operation().await.map_err(|error| {
                    if error.is_retryable() {
                        backoff::Error::transient(error)
                    } else {
                        backoff::Error::permanent(error)
                    }
                })
            },
            |error: LlmError, delay: Duration| {
                tracing::debug!(delay_ms = delay.as_millis() as u64, "retrying after error: {error}");
            },
        )
        .await
    }
}

/// Retry `operation` with the default backoff settings.
pub async fn retry_with_backoff<F, Fut, T>(operation: F) -> Result<T, LlmError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, LlmError>>,
{
    BackoffRetryExecutor::default().execute(operation).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn instant() -> BackoffRetryExecutor {
        BackoffRetryExecutor::new()
            .with_initial_interval(Duration::from_millis(1))
            .with_max_interval(Duration::from_millis(1))
            .with_randomization_factor(0.0)
            .with_max_elapsed_time(Some(Duration::from_secs(5)))
    }

    #[tokio::test]
    async fn retries_transient_errors() {
        let counter = Arc::new(AtomicU32::new(0));
        let result = instant()
            .execute(|| {
                let counter = counter.clone();
                async move {
                    if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err(LlmError::ConnectionError("reset".into()))
                    } else {
                        Ok(42)
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn permanent_errors_return_immediately() {
        let counter = Arc::new(AtomicU32::new(0));
        let result: Result<(), LlmError> = instant()
            .execute(|| {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(LlmError::AuthenticationError("bad key".into()))
                }
            })
            .await;

        assert!(matches!(result, Err(LlmError::AuthenticationError(_))));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
