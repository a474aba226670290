//! Transport seam between the adapter and the chat-completion endpoint.

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;
use reqwest::header::HeaderMap;

use super::types::{ChatCompletion, ChatCompletionChunk, ChatCompletionRequest};
use crate::error::LlmError;

/// Stream of decoded chunks. An `Err` item ends the stream.
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<ChatCompletionChunk, LlmError>> + Send>>;

/// A full response: the decoded body, if any, plus the response headers.
#[derive(Debug, Clone, Default)]
pub struct CompletionResponse {
    /// `None` when the endpoint answered with an empty body.
    pub body: Option<ChatCompletion>,
    pub headers: HeaderMap,
}

impl CompletionResponse {
    pub fn new(body: Option<ChatCompletion>, headers: HeaderMap) -> Self {
        Self { body, headers }
    }
}

impl From<ChatCompletion> for CompletionResponse {
    fn from(body: ChatCompletion) -> Self {
        Self::new(Some(body), HeaderMap::new())
    }
}

/// Executes chat-completion requests.
#[async_trait]
pub trait ChatCompletionTransport: Send + Sync {
    /// Execute a non-streaming request.
    async fn completion(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<CompletionResponse, LlmError>;

    /// Open a streaming request.
    async fn completion_stream(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<ChunkStream, LlmError>;
}
