//! # chat-adapter
//!
//! Provider-agnostic chat client over OpenAI-style chat-completion endpoints.
//!
//! - Generic prompts (messages plus options) are translated into provider
//!   requests, merging per-call options over adapter defaults
//! - Locally registered functions are executed when the model asks for them,
//!   and their results fed back until the model answers
//! - Responses come back as [`types::ChatResult`]s, either in one piece or as
//!   a stream of partial results
//!
//! ```rust,no_run
//! use chat_adapter::prelude::*;
//!
//! # async fn example() -> Result<(), LlmError> {
//! let adapter = ChatAdapter::builder().api_key("sk-...").build()?;
//! let answer = adapter.ask("Say hello").await?;
//! println!("{answer}");
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]

pub mod api;
pub mod client;
pub mod defaults;
pub mod error;
pub mod functions;
pub mod retry;
pub mod retry_api;
pub mod streaming;
pub mod traits;
pub mod types;
pub mod utils;

pub use client::{ChatAdapter, ChatAdapterBuilder};
pub use error::{ErrorCategory, LlmError};

/// Common imports.
pub mod prelude {
    pub use crate::api::{ChatCompletionOptions, ChatCompletionTransport, HttpChatTransport};
    pub use crate::client::{ChatAdapter, ChatAdapterBuilder};
    pub use crate::error::LlmError;
    pub use crate::functions::{FunctionCallback, FunctionCallbackWrapper};
    pub use crate::retry_api::RetryOptions;
    pub use crate::streaming::{ChatResultStream, ChatResultStreamHandle};
    pub use crate::traits::{ChatModel, ChatModelExt, StreamingChatModel};
    pub use crate::types::{ChatOptions, ChatResult, Message, MessageRole, Prompt};
}
