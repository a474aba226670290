//! Chat-completion options and their merge rules.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use super::types::FunctionTool;
use crate::functions::FunctionCallback;
use crate::types::{ChatOptions, ModelOptions};

/// Provider-level options: the portable chat options plus the settings only
/// the chat-completion endpoint understands.
#[derive(Clone, Default)]
pub struct ChatCompletionOptions {
    pub model: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
    pub top_k: Option<u32>,
    pub stop: Option<Vec<String>>,
    /// Explicit tool definitions. Enabled functions replace these on the request.
    pub tools: Option<Vec<FunctionTool>>,
    pub tool_choice: Option<serde_json::Value>,
    pub user: Option<String>,
    pub functions: BTreeSet<String>,
    pub function_callbacks: Vec<Arc<dyn FunctionCallback>>,
}

impl ChatCompletionOptions {
    pub fn builder() -> ChatCompletionOptionsBuilder {
        ChatCompletionOptionsBuilder::default()
    }

    /// Merge two option sets.
    ///
    /// Scalar fields come from `self` unless unset there, in which case the
    /// `fallback` value is used. Function names accumulate from both sides.
    /// Callbacks accumulate too; on a name clash the one from `self` is kept.
    pub fn merge(&self, fallback: &ChatCompletionOptions) -> ChatCompletionOptions {
        let mut function_callbacks = self.function_callbacks.clone();
        for callback in &fallback.function_callbacks {
            if !function_callbacks
                .iter()
                .any(|existing| existing.name() == callback.name())
            {
                function_callbacks.push(callback.clone());
            }
        }

        ChatCompletionOptions {
            model: self.model.clone().or_else(|| fallback.model.clone()),
            max_tokens: self.max_tokens.or(fallback.max_tokens),
            temperature: self.temperature.or(fallback.temperature),
            top_p: self.top_p.or(fallback.top_p),
            top_k: self.top_k.or(fallback.top_k),
            stop: self.stop.clone().or_else(|| fallback.stop.clone()),
            tools: self.tools.clone().or_else(|| fallback.tools.clone()),
            tool_choice: self
                .tool_choice
                .clone()
                .or_else(|| fallback.tool_choice.clone()),
            user: self.user.clone().or_else(|| fallback.user.clone()),
            functions: self.functions.union(&fallback.functions).cloned().collect(),
            function_callbacks,
        }
    }
}

impl From<&ChatOptions> for ChatCompletionOptions {
    fn from(options: &ChatOptions) -> Self {
        Self {
            model: options.model.clone(),
            max_tokens: options.max_tokens,
            temperature: options.temperature,
            top_p: options.top_p,
            top_k: options.top_k,
            stop: options.stop_sequences.clone(),
            tools: None,
            tool_choice: None,
            user: None,
            functions: options.functions.clone(),
            function_callbacks: options.function_callbacks.clone(),
        }
    }
}

impl ModelOptions for ChatCompletionOptions {
    fn to_completion_options(&self) -> Option<ChatCompletionOptions> {
        Some(self.clone())
    }
}

impl fmt::Debug for ChatCompletionOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatCompletionOptions")
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("top_p", &self.top_p)
            .field("top_k", &self.top_k)
            .field("stop", &self.stop)
            .field("tools", &self.tools)
            .field("tool_choice", &self.tool_choice)
            .field("user", &self.user)
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

/// Builder for [`ChatCompletionOptions`].
#[derive(Default)]
pub struct ChatCompletionOptionsBuilder {
    options: ChatCompletionOptions,
}

impl ChatCompletionOptionsBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.options.model = Some(model.into());
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.options.max_tokens = Some(max_tokens);
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

    pub fn stop<I, S>(mut self, stop: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options.stop = Some(stop.into_iter().map(Into::into).collect());
        self
    }

    pub fn tools(mut self, tools: Vec<FunctionTool>) -> Self {
        self.options.tools = Some(tools);
        self
    }

    pub fn tool_choice(mut self, tool_choice: serde_json::Value) -> Self {
        self.options.tool_choice = Some(tool_choice);
        self
    }

    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.options.user = Some(user.into());
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

    pub fn build(self) -> ChatCompletionOptions {
        self.options
    }
}
