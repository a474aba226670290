//! Retry executors
//! - policy.rs: counted attempts with exponential delay and jitter
//! - backoff.rs: `backoff` crate exponential backoff

pub mod backoff;
pub mod policy;

pub use self::backoff::{BackoffRetryExecutor, retry_with_backoff};
pub use self::policy::{RetryExecutor, RetryPolicy};
