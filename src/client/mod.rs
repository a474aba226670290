//! The chat adapter.
//!
//! `ChatAdapter` turns generic prompts into chat-completion requests, runs them
//! through a [`ChatCompletionTransport`], executes the functions the model asks
//! for and maps the final response back into a [`ChatResult`].

mod builder;
mod request;
mod streaming;
mod tool_loop;

pub use builder::ChatAdapterBuilder;
pub use tool_loop::is_tool_function_call;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::Instrument;

use crate::api::{
    ChatCompletionOptions, ChatCompletionTransport, CompletionResponse, HeaderRateLimitExtractor,
    RateLimitExtractor,
};
use crate::defaults;
use crate::error::LlmError;
use crate::functions::{FunctionCallback, FunctionCallbackRegistry};
use crate::retry_api::RetryOptions;
use crate::streaming::ChatResultStream;
use crate::traits::{ChatModel, StreamingChatModel};
use crate::types::{ChatResult, ChatResultMetadata, Generation, GenerationMetadata, Prompt};

/// Provider-agnostic chat client over a chat-completion endpoint.
///
/// Cloning is cheap; clones share the transport and the function registry.
#[derive(Clone)]
pub struct ChatAdapter {
    transport: Arc<dyn ChatCompletionTransport>,
    default_options: Arc<ChatCompletionOptions>,
    registry: Arc<FunctionCallbackRegistry>,
    retry_options: Option<RetryOptions>,
    rate_limit_extractor: Arc<dyn RateLimitExtractor>,
    max_tool_rounds: usize,
}

impl fmt::Debug for ChatAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatAdapter")
            .field("default_options", &self.default_options)
            .field("registry", &self.registry)
            .field("retry_options", &self.retry_options)
            .field("max_tool_rounds", &self.max_tool_rounds)
            .finish_non_exhaustive()
    }
}

/// Default options: the default model at temperature 0.7.
pub fn default_chat_options() -> ChatCompletionOptions {
    ChatCompletionOptions::builder()
        .model(defaults::chat::DEFAULT_MODEL)
        .temperature(defaults::chat::DEFAULT_TEMPERATURE)
        .build()
}

impl ChatAdapter {
    /// Adapter with default options, an empty registry and default retries.
    pub fn new(transport: impl ChatCompletionTransport + 'static) -> Self {
        Self::from_parts(
            Arc::new(transport),
            default_chat_options(),
            Arc::new(FunctionCallbackRegistry::new()),
        )
    }

    /// Adapter over a shared transport and registry, with default retries.
    pub fn from_parts(
        transport: Arc<dyn ChatCompletionTransport>,
        default_options: ChatCompletionOptions,
        registry: Arc<FunctionCallbackRegistry>,
    ) -> Self {
        Self {
            transport,
            default_options: Arc::new(default_options),
            registry,
            retry_options: Some(RetryOptions::default()),
            rate_limit_extractor: Arc::new(HeaderRateLimitExtractor),
            max_tool_rounds: defaults::chat::MAX_TOOL_ROUNDS,
        }
    }

    pub fn builder() -> ChatAdapterBuilder {
        ChatAdapterBuilder::new()
    }

    pub fn with_retry_options(mut self, retry_options: Option<RetryOptions>) -> Self {
        self.retry_options = retry_options;
        self
    }

    pub fn with_max_tool_rounds(mut self, max_tool_rounds: usize) -> Self {
        self.max_tool_rounds = max_tool_rounds;
        self
    }

    pub fn with_rate_limit_extractor(mut self, extractor: Arc<dyn RateLimitExtractor>) -> Self {
        self.rate_limit_extractor = extractor;
        self
    }

    /// Register a callback in the shared registry, replacing one with the same name.
    pub fn register_function(&self, callback: Arc<dyn FunctionCallback>) {
        self.registry.register(callback);
    }

    pub fn default_options(&self) -> &ChatCompletionOptions {
        &self.default_options
    }

    pub fn registry(&self) -> &Arc<FunctionCallbackRegistry> {
        &self.registry
    }

    pub fn retry_options(&self) -> Option<&RetryOptions> {
        self.retry_options.as_ref()
    }

    pub fn max_tool_rounds(&self) -> usize {
        self.max_tool_rounds
    }

    /// Map a final response to a result. Every choice becomes a generation.
    fn to_chat_result(&self, response: CompletionResponse) -> ChatResult {
        let CompletionResponse { body, headers } = response;
        let Some(completion) = body else {
            tracing::warn!("no chat completion returned");
            return ChatResult::empty();
        };

        let generations = completion
            .choices
            .iter()
            .map(|choice| Generation {
                text: choice.message.content.clone(),
                metadata: GenerationMetadata {
                    id: completion.id.clone(),
                    role: choice.message.role.map(|role| role.as_str().to_string()),
                    finish_reason: choice
                        .finish_reason
                        .as_ref()
                        .map(|reason| reason.as_str().to_string()),
                },
            })
            .collect();

        ChatResult {
            generations,
            metadata: ChatResultMetadata {
                id: Some(completion.id),
                model: Some(completion.model).filter(|model| !model.is_empty()),
                created: created_at(completion.created),
                usage: completion.usage,
                rate_limit: self.rate_limit_extractor.extract(&headers),
            },
        }
    }
}

/// Unix seconds to a timestamp; zero means the provider did not say.
fn created_at(created: i64) -> Option<DateTime<Utc>> {
    (created > 0)
        .then(|| DateTime::<Utc>::from_timestamp(created, 0))
        .flatten()
}

#[async_trait]
impl ChatModel for ChatAdapter {
    async fn call(&self, prompt: Prompt) -> Result<ChatResult, LlmError> {
        let span = tracing::info_span!(
            "chat_adapter.call",
            call_id = %uuid::Uuid::new_v4(),
            model = tracing::field::Empty,
        );

        async move {
            let request = self.create_request(&prompt, false)?;
            if let Some(model) = request.model.as_deref() {
                tracing::Span::current().record("model", model);
            }

            let response = self.execute_completion(&request).await?;
            let response = self
                .handle_function_call_or_return(&request, response)
                .await?;
            Ok(self.to_chat_result(response))
        }
        .instrument(span)
        .await
    }
}

#[async_trait]
impl StreamingChatModel for ChatAdapter {
    async fn stream(&self, prompt: Prompt) -> Result<ChatResultStream, LlmError> {
        self.open_stream(prompt).await
    }
}
