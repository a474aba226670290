//! Public retry facade.
//!
//! - `retry` runs an operation under the default backoff executor
//! - `RetryOptions` selects the backend and its configuration
//! - `maybe_retry` keeps call sites uniform when retry is optional
//! - `classify_http_error` turns a failed HTTP exchange into a typed error

use std::future::Future;

use reqwest::header::HeaderMap;

use crate::error::LlmError;

pub use crate::retry::{BackoffRetryExecutor, RetryPolicy};

/// Retry backend selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RetryBackend {
    /// `backoff` crate exponential backoff
    #[default]
    Backoff,
    /// Counted attempts, see [`RetryPolicy`]
    Policy,
}

/// Retry configuration attached to an adapter.
#[derive(Debug, Clone, Default)]
pub struct RetryOptions {
    pub backend: RetryBackend,
    /// Backoff executor override (Backoff backend only).
    pub backoff_executor: Option<BackoffRetryExecutor>,
    /// Policy used by the Policy backend.
    pub policy: Option<RetryPolicy>,
}

impl RetryOptions {
    /// Backoff backend with default settings.
    pub fn backoff() -> Self {
        Self::default()
    }

    pub fn with_backoff_executor(mut self, executor: BackoffRetryExecutor) -> Self {
        self.backend = RetryBackend::Backoff;
        self.backoff_executor = Some(executor);
        self
    }

    /// Policy backend with the default policy.
    pub fn policy_default() -> Self {
        Self::with_policy(RetryPolicy::default())
    }

    pub fn with_policy(policy: RetryPolicy) -> Self {
        Self {
            backend: RetryBackend::Policy,
            backoff_executor: None,
            policy: Some(policy),
        }
    }

    /// Cap the number of attempts.
    ///
    /// Attempts are only counted by the policy backend, so options on the
    /// backoff backend switch to it, starting from the default policy.
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        let policy = self.policy.take().unwrap_or_default();
        self.backend = RetryBackend::Policy;
        self.backoff_executor = None;
        self.policy = Some(policy.with_max_attempts(attempts));
        self
    }
}

/// Retry with the default backoff executor.
pub async fn retry<F, Fut, T>(operation: F) -> Result<T, LlmError>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<T, LlmError>> + Send,
    T: Send,
{
    crate::retry::retry_with_backoff(operation).await
}

/// Retry with explicit options.
pub async fn retry_with<F, Fut, T>(operation: F, options: RetryOptions) -> Result<T, LlmError>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<T, LlmError>> + Send,
    T: Send,
{
    match options.backend {
        RetryBackend::Backoff => match options.backoff_executor.as_ref() {
            Some(executor) => executor.execute(operation).await,
            None => crate::retry::retry_with_backoff(operation).await,
        },
        RetryBackend::Policy => {
            let executor = crate::retry::RetryExecutor::new(options.policy.unwrap_or_default());
            executor.execute(operation).await
        }
    }
}

/// Retry only when options are provided; otherwise run the operation once.
pub async fn maybe_retry<F, Fut, T>(
    options: Option<RetryOptions>,
    operation: F,
) -> Result<T, LlmError>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<T, LlmError>> + Send,
    T: Send,
{
    match options {
        Some(opts) => retry_with(operation, opts).await,
        None => operation().await,
    }
}

/// Classify a non-success HTTP response into a typed error.
///
/// `fallback_message` (usually the provider's own error message) is preferred
/// over the raw body when building `ApiError`s.
pub fn classify_http_error(
    status: u16,
    body_text: &str,
    headers: &HeaderMap,
    fallback_message: Option<&str>,
) -> LlmError {
    let lower = body_text.to_lowercase();

    fn header_val(headers: &HeaderMap, name: &str) -> Option<String> {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string())
    }
    let request_ids: Vec<String> = ["x-request-id", "openai-request-id", "x-trace-id", "traceparent"]
        .iter()
        .filter_map(|k| header_val(headers, k).map(|v| format!("{k}={v}")))
        .collect();
    let ids_suffix = if request_ids.is_empty() {
        String::new()
    } else {
        format!(" ids=[{}]", request_ids.join(","))
    };
    let body_sample = body_text.chars().take(200).collect::<String>();

    match status {
        429 => {
            if lower.contains("insufficient_quota") {
                return LlmError::QuotaExceededError(format!(
                    "http=429{ids_suffix} body_sample={body_sample}"
                ));
            }
            let retry_after = header_val(headers, "retry-after").unwrap_or_default();
            return LlmError::RateLimitError(format!(
                "http=429 retry_after={retry_after}{ids_suffix} body_sample={body_sample}"
            ));
        }
        401 => {
            return LlmError::AuthenticationError(format!(
                "unauthorized{ids_suffix} body_sample={body_sample}"
            ));
        }
        403 => {
            return LlmError::AuthenticationError(format!(
                "forbidden{ids_suffix} body_sample={body_sample}"
            ));
        }
        404 => {
            return LlmError::NotFound(format!("http=404{ids_suffix} body_sample={body_sample}"));
        }
        400 | 413 | 422 => {
            return LlmError::InvalidInput(format!(
                "http={status}{ids_suffix} body_sample={body_sample}"
            ));
        }
        _ => {}
    }

    let message = match fallback_message {
        Some(fallback) => fallback.to_string(),
        None if body_text.trim().is_empty() => "api error".to_string(),
        None => body_sample,
    };
    let details = match serde_json::from_str::<serde_json::Value>(body_text) {
        Ok(json) => serde_json::json!({
            "status": status,
            "response": json,
            "request_ids": request_ids,
        }),
        Err(_) => serde_json::json!({
            "status": status,
            "raw": body_text,
            "request_ids": request_ids,
        }),
    };
    LlmError::api_error_with_details(status, message, details)
}
