//! Builder for [`ChatAdapter`].

use std::sync::Arc;

use secrecy::SecretString;

use super::{ChatAdapter, default_chat_options};
use crate::api::{
    ChatCompletionOptions, ChatCompletionTransport, HeaderRateLimitExtractor, HttpChatTransport,
    RateLimitExtractor,
};
use crate::defaults;
use crate::error::LlmError;
use crate::functions::{FunctionCallback, FunctionCallbackRegistry, FunctionCallbackResolver};
use crate::retry_api::RetryOptions;
use crate::types::HttpConfig;

/// Configures a [`ChatAdapter`].
///
/// Without an explicit transport the adapter talks HTTP: the API key comes
/// from `api_key(..)`, then `CHAT_ADAPTER_API_KEY`, then `OPENAI_API_KEY`;
/// the base URL from `base_url(..)`, then `CHAT_ADAPTER_BASE_URL`.
pub struct ChatAdapterBuilder {
    transport: Option<Arc<dyn ChatCompletionTransport>>,
    base_url: Option<String>,
    api_key: Option<SecretString>,
    http_config: HttpConfig,
    http_client: Option<reqwest::Client>,
    default_options: ChatCompletionOptions,
    callbacks: Vec<Arc<dyn FunctionCallback>>,
    resolver: Option<Arc<dyn FunctionCallbackResolver>>,
    retry_options: Option<RetryOptions>,
    rate_limit_extractor: Arc<dyn RateLimitExtractor>,
    max_tool_rounds: usize,
}

impl Default for ChatAdapterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatAdapterBuilder {
    pub fn new() -> Self {
        Self {
            transport: None,
            base_url: None,
            api_key: None,
            http_config: HttpConfig::default(),
            http_client: None,
            default_options: default_chat_options(),
            callbacks: Vec::new(),
            resolver: None,
            retry_options: Some(RetryOptions::default()),
            rate_limit_extractor: Arc::new(HeaderRateLimitExtractor),
            max_tool_rounds: defaults::chat::MAX_TOOL_ROUNDS,
        }
    }

    /// Use a custom transport. HTTP settings are ignored when one is set.
    pub fn transport(mut self, transport: impl ChatCompletionTransport + 'static) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    pub fn shared_transport(mut self, transport: Arc<dyn ChatCompletionTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(SecretString::from(api_key.into()));
        self
    }

    pub fn http_config(mut self, http_config: HttpConfig) -> Self {
        self.http_config = http_config;
        self
    }

    /// Reuse an existing client instead of building one from the HTTP config.
    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Replace the default options.
    pub fn default_options(mut self, options: ChatCompletionOptions) -> Self {
        self.default_options = options;
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.default_options.model = Some(model.into());
        self
    }

    /// Register a callback. It is available to every call but only advertised
    /// when enabled by name.
    pub fn function_callback(mut self, callback: Arc<dyn FunctionCallback>) -> Self {
        self.callbacks.push(callback);
        self
    }

    /// Fallback lookup for function names that are not registered.
    pub fn function_resolver(mut self, resolver: Arc<dyn FunctionCallbackResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn retry_options(mut self, retry_options: RetryOptions) -> Self {
        self.retry_options = Some(retry_options);
        self
    }

    pub fn without_retry(mut self) -> Self {
        self.retry_options = None;
        self
    }

    pub fn rate_limit_extractor(mut self, extractor: Arc<dyn RateLimitExtractor>) -> Self {
        self.rate_limit_extractor = extractor;
        self
    }

    pub fn max_tool_rounds(mut self, max_tool_rounds: usize) -> Self {
        self.max_tool_rounds = max_tool_rounds;
        self
    }

    pub fn build(self) -> Result<ChatAdapter, LlmError> {
        let env = |name: &str| std::env::var(name).ok();

        let transport = match self.transport {
            Some(transport) => transport,
            None => {
                let api_key = resolve_api_key(self.api_key, env)?;
                let base_url = self
                    .base_url
                    .or_else(|| env(defaults::http::BASE_URL_ENV_VAR))
                    .unwrap_or_else(|| defaults::http::BASE_URL.to_string());
                let transport = match self.http_client {
                    Some(client) => {
                        HttpChatTransport::with_client(client, base_url, api_key, self.http_config)
                    }
                    None => HttpChatTransport::new(base_url, api_key, self.http_config)?,
                };
                Arc::new(transport)
            }
        };

        let registry = match self.resolver {
            Some(resolver) => FunctionCallbackRegistry::with_resolver(resolver),
            None => FunctionCallbackRegistry::new(),
        };
        for callback in self.callbacks {
            registry.register(callback);
        }

        Ok(
            ChatAdapter::from_parts(transport, self.default_options, Arc::new(registry))
                .with_retry_options(self.retry_options)
                .with_rate_limit_extractor(self.rate_limit_extractor)
                .with_max_tool_rounds(self.max_tool_rounds),
        )
    }
}

/// Explicit key first, then the environment variables in order.
fn resolve_api_key(
    explicit: Option<SecretString>,
    env: impl Fn(&str) -> Option<String>,
) -> Result<SecretString, LlmError> {
    if let Some(key) = explicit {
        return Ok(key);
    }
    defaults::http::API_KEY_ENV_VARS
        .iter()
        .find_map(|name| env(name).filter(|value| !value.trim().is_empty()))
        .map(SecretString::from)
        .ok_or_else(|| {
            LlmError::MissingApiKey(format!(
                "set one of {} or call api_key()",
                defaults::http::API_KEY_ENV_VARS.join(", ")
            ))
        })
}
