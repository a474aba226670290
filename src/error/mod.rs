//! Error Handling Module
//!
//! Every failure surfaced by the adapter is an [`LlmError`]. The enum is `Clone`
//! so retry executors can keep the last observed error around.
//!
//! # Example
//!
//! ```rust,ignore
//! use chat_adapter::error::{ErrorCategory, LlmError};
//!
//! let error = LlmError::api_error(404, "Not found");
//! assert_eq!(error.category(), ErrorCategory::Client);
//! assert!(!error.is_retryable());
//! ```

mod conversions;
pub mod types;

pub use types::*;
