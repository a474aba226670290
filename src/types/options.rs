//! Provider-agnostic chat options.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use crate::api::ChatCompletionOptions;
use crate::functions::FunctionCallback;

/// Options object attached to a [`crate::types::Prompt`].
///
/// Anything can travel as prompt options; the adapter only accepts types
/// that can be viewed as chat-completion options and rejects the rest with
/// `LlmError::InvalidOptionsType`.
pub trait ModelOptions: fmt::Debug + Send + Sync {
    /// Name used in error messages.
    fn options_type(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// View these options as chat-completion options, if they are chat options.
    fn to_completion_options(&self) -> Option<ChatCompletionOptions> {
        None
    }
}

/// Portable chat options understood by every chat model.
#[derive(Clone, Default)]
pub struct ChatOptions {
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
    pub top_k: Option<u32>,
    pub max_tokens: Option<u32>,
    pub stop_sequences: Option<Vec<String>>,
    /// Names of registered functions to enable for the call.
    pub functions: BTreeSet<String>,
    /// Callbacks registered (and, at runtime, enabled) when the options are used.
    pub function_callbacks: Vec<Arc<dyn FunctionCallback>>,
}

impl ChatOptions {
    pub fn builder() -> ChatOptionsBuilder {
        ChatOptionsBuilder::default()
    }
}

impl fmt::Debug for ChatOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatOptions")
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("top_p", &self.top_p)
            .field("top_k", &self.top_k)
            .field("max_tokens", &self.max_tokens)
            .field("stop_sequences", &self.stop_sequences)
            .field("functions", &self.functions)
            .field(
                "function_callbacks",
                &self
                    .function_callbacks
                    .iter()
                    .map(|cb| cb.name())
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl ModelOptions for ChatOptions {
    fn to_completion_options(&self) -> Option<ChatCompletionOptions> {
        Some(ChatCompletionOptions::from(self))
    }
}

/// Builder for [`ChatOptions`].
#[derive(Default)]
pub struct ChatOptionsBuilder {
    options: ChatOptions,
}

impl ChatOptionsBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.options.model = Some(model.into());
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.options.temperature = Some(temperature);
        self
    }

    pub fn top_p(mut self, top_p: f32) -> Self {
        self.options.top_p = Some(top_p);
        self
    }

    pub fn top_k(mut self, top_k: u32) -> Self {
        self.options.top_k = Some(top_k);
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.options.max_tokens = Some(max_tokens);
        self
    }

    pub fn stop_sequences<I, S>(mut self, stop: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options.stop_sequences = Some(stop.into_iter().map(Into::into).collect());
        self
    }

    pub fn function(mut self, name: impl Into<String>) -> Self {
        self.options.functions.insert(name.into());
        self
    }

    pub fn function_callback(mut self, callback: Arc<dyn FunctionCallback>) -> Self {
        self.options.function_callbacks.push(callback);
        self
    }

    pub fn build(self) -> ChatOptions {
        self.options
    }
}
