//! reqwest-backed transport for OpenAI-style chat-completion endpoints.

use async_trait::async_trait;
use eventsource_stream::Eventsource;
use futures::StreamExt;
use reqwest::header::{ACCEPT, ACCEPT_ENCODING, AUTHORIZATION, HeaderMap, HeaderName, HeaderValue};
use secrecy::{ExposeSecret, SecretString};

use super::transport::{ChatCompletionTransport, ChunkStream, CompletionResponse};
use super::types::{ChatCompletion, ChatCompletionChunk, ChatCompletionRequest};
use crate::defaults;
use crate::error::LlmError;
use crate::retry_api::classify_http_error;
use crate::types::HttpConfig;

/// Data payload that terminates an SSE response.
const DONE_SENTINEL: &str = "[DONE]";

/// Build a reqwest client from an [`HttpConfig`].
pub fn build_http_client(config: &HttpConfig) -> Result<reqwest::Client, LlmError> {
    let mut builder = reqwest::Client::builder();

    if let Some(timeout) = config.timeout {
        builder = builder.timeout(timeout);
    }
    if let Some(connect_timeout) = config.connect_timeout {
        builder = builder.connect_timeout(connect_timeout);
    }
    if let Some(proxy_url) = &config.proxy {
        let proxy = reqwest::Proxy::all(proxy_url)
            .map_err(|e| LlmError::ConfigurationError(format!("Invalid proxy URL: {e}")))?;
        builder = builder.proxy(proxy);
    }
    if let Some(user_agent) = &config.user_agent {
        builder = builder.user_agent(user_agent);
    }
    if !config.headers.is_empty() {
        let mut headers = HeaderMap::new();
        for (k, v) in &config.headers {
            let name = HeaderName::from_bytes(k.as_bytes()).map_err(|e| {
                LlmError::ConfigurationError(format!("Invalid header name '{k}': {e}"))
            })?;
            let value = HeaderValue::from_str(v).map_err(|e| {
                LlmError::ConfigurationError(format!("Invalid header value for '{k}': {e}"))
            })?;
            headers.insert(name, value);
        }
        builder = builder.default_headers(headers);
    }

    builder
        .build()
        .map_err(|e| LlmError::ConfigurationError(format!("Failed to build HTTP client: {e}")))
}

/// Default [`ChatCompletionTransport`]: JSON POSTs to `{base_url}/chat/completions`
/// with bearer authentication, SSE for streaming.
#[derive(Debug)]
pub struct HttpChatTransport {
    client: reqwest::Client,
    base_url: String,
    api_key: SecretString,
    http_config: HttpConfig,
}

impl HttpChatTransport {
    /// Create a transport with a client built from `http_config`.
    pub fn new(
        base_url: impl Into<String>,
        api_key: SecretString,
        http_config: HttpConfig,
    ) -> Result<Self, LlmError> {
        let client = build_http_client(&http_config)?;
        Ok(Self::with_client(client, base_url, api_key, http_config))
    }

    /// Create a transport over an existing client.
    pub fn with_client(
        client: reqwest::Client,
        base_url: impl Into<String>,
        api_key: SecretString,
        http_config: HttpConfig,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            http_config,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self) -> String {
        format!("{}{}", self.base_url, defaults::http::COMPLETIONS_PATH)
    }

    fn headers(&self, stream: bool) -> Result<HeaderMap, LlmError> {
        let mut headers = HeaderMap::new();
        let bearer = format!("Bearer {}", self.api_key.expose_secret());
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&bearer).map_err(|e| {
                LlmError::ConfigurationError(format!("Invalid API key format: {e}"))
            })?,
        );
        if stream {
            headers.insert(ACCEPT, HeaderValue::from_static("text/event-stream"));
            if self.http_config.stream_disable_compression {
                headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("identity"));
            }
        } else {
            headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        }
        Ok(headers)
    }

    /// POST the request and turn non-success statuses into typed errors.
    async fn send(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<reqwest::Response, LlmError> {
        let url = self.endpoint();
        tracing::debug!(%url, stream = request.stream, "sending chat completion request");

        let response = self
            .client
            .post(&url)
            .headers(self.headers(request.stream)?)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let headers = response.headers().clone();
        let body = response.text().await.unwrap_or_default();
        let provider_message = provider_error_message(&body);
        tracing::debug!(status = status.as_u16(), "chat completion request failed");
        Err(classify_http_error(
            status.as_u16(),
            &body,
            &headers,
            provider_message.as_deref(),
        ))
    }
}

/// `error.message` of an OpenAI-style error envelope.
fn provider_error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get("error")?
        .get("message")?
        .as_str()
        .map(str::to_string)
}

#[async_trait]
impl ChatCompletionTransport for HttpChatTransport {
    async fn completion(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<CompletionResponse, LlmError> {
        let response = self.send(request).await?;
        let headers = response.headers().clone();
        let bytes = response.bytes().await?;

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(CompletionResponse::new(None, headers));
        }
        // A JSON `null` body is as absent as an empty one.
        let body: Option<ChatCompletion> = serde_json::from_slice(&bytes)
            .map_err(|e| LlmError::ParseError(format!("invalid chat completion body: {e}")))?;
        Ok(CompletionResponse::new(body, headers))
    }

    async fn completion_stream(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<ChunkStream, LlmError> {
        let response = self.send(request).await?;

        let chunks = async_stream::stream! {
            let mut events = response.bytes_stream().eventsource();
            while let Some(event) = events.next().await {
                let event = match event {
                    Ok(event) => event,
                    Err(e) => {
                        yield Err(LlmError::StreamError(e.to_string()));
                        break;
                    }
                };

                let data = event.data.trim();
                if data.is_empty() {
                    continue;
                }
                if data == DONE_SENTINEL {
                    break;
                }
                match serde_json::from_str::<ChatCompletionChunk>(data) {
                    Ok(chunk) => yield Ok(chunk),
                    Err(e) => {
                        yield Err(LlmError::ParseError(format!("invalid stream chunk: {e}")));
                        break;
                    }
                }
            }
        };

        Ok(Box::pin(chunks))
    }
}
