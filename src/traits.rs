//! Chat model traits.

use async_trait::async_trait;

use crate::error::LlmError;
use crate::streaming::{ChatResultStream, ChatResultStreamHandle};
use crate::types::{ChatResult, Prompt};
use crate::utils::cancel::make_cancellable_stream;

/// Synchronous (request/response) chat.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn call(&self, prompt: Prompt) -> Result<ChatResult, LlmError>;
}

/// Incremental chat.
#[async_trait]
pub trait StreamingChatModel: Send + Sync {
    /// Open a stream of partial results. Errors that happen before the first
    /// chunk (request building, opening the connection) are returned here.
    async fn stream(&self, prompt: Prompt) -> Result<ChatResultStream, LlmError>;

    async fn stream_with_cancel(&self, prompt: Prompt) -> Result<ChatResultStreamHandle, LlmError> {
        let stream = self.stream(prompt).await?;
        let (stream, cancel) = make_cancellable_stream(stream);
        Ok(ChatResultStreamHandle { stream, cancel })
    }
}

/// Conveniences over [`ChatModel`].
#[async_trait]
pub trait ChatModelExt: ChatModel {
    /// Send a single user message and return the text of the first generation.
    async fn ask(&self, text: &str) -> Result<String, LlmError> {
        let result = self.call(Prompt::from(text)).await?;
        Ok(result.text().to_string())
    }
}

impl<T: ChatModel + ?Sized> ChatModelExt for T {}
