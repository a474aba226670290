//! Core error types.

use thiserror::Error;

/// Coarse grouping of errors, useful for logging and metrics labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Transport-level failures (connect, timeout, broken stream)
    Network,
    /// Credentials rejected or missing
    Authentication,
    /// Provider throttling or quota exhaustion
    RateLimit,
    /// 4xx responses other than auth/rate limiting
    Client,
    /// 5xx responses
    Server,
    /// Malformed payloads
    Parsing,
    /// Invalid prompt, options or configuration
    Validation,
    /// Function calling failures
    Function,
    /// Anything else
    Internal,
}

/// Unified error type for the chat adapter.
#[derive(Debug, Clone, Error)]
pub enum LlmError {
    /// HTTP transport error without a more specific classification
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    JsonError(String),

    /// Non-success response returned by the provider
    #[error("API error {code}: {message}")]
    ApiError {
        code: u16,
        message: String,
        details: Option<serde_json::Value>,
    },

    /// Provider throttled the request (HTTP 429 and friends)
    #[error("Rate limit exceeded: {0}")]
    RateLimitError(String),

    /// Provider quota exhausted
    #[error("Quota exceeded: {0}")]
    QuotaExceededError(String),

    /// Credentials rejected
    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    /// Resource (usually the model) not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Request rejected as malformed
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Request timed out
    #[error("Timeout: {0}")]
    TimeoutError(String),

    /// Could not reach the provider
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Streaming transport failure
    #[error("Stream error: {0}")]
    StreamError(String),

    /// Response payload could not be interpreted
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Invalid client configuration
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// No API key was configured or found in the environment
    #[error("Missing API key: {0}")]
    MissingApiKey(String),

    /// A prompt message role has no provider counterpart
    #[error("Unsupported message role: {0}")]
    UnsupportedRole(String),

    /// Prompt options cannot be interpreted as chat options
    #[error("Prompt options are not chat options: {0}")]
    InvalidOptionsType(String),

    /// The model (or the options) referenced a function nobody registered
    #[error("No function callback found for function name: {0}")]
    UnknownFunction(String),

    /// A registered function callback failed
    #[error("Function '{name}' failed: {message}")]
    FunctionExecutionError { name: String, message: String },

    /// The model kept asking for tools beyond the configured bound
    #[error("Function calling did not terminate within {max_rounds} tool rounds")]
    ToolLoopExceeded { max_rounds: usize },

    /// Invariant violations inside the adapter
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl LlmError {
    /// Build an `ApiError` without structured details.
    pub fn api_error(code: u16, message: impl Into<String>) -> Self {
        Self::ApiError {
            code,
            message: message.into(),
            details: None,
        }
    }

    /// Build an `ApiError` carrying a structured payload (raw body, request ids).
    pub fn api_error_with_details(
        code: u16,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self::ApiError {
            code,
            message: message.into(),
            details: Some(details),
        }
    }

    /// Build a `FunctionExecutionError`.
    pub fn function_error(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::FunctionExecutionError {
            name: name.into(),
            message: message.into(),
        }
    }

    /// HTTP status code, when the error came from a provider response.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::ApiError { code, .. } => Some(*code),
            Self::RateLimitError(_) => Some(429),
            Self::AuthenticationError(_) => Some(401),
            Self::NotFound(_) => Some(404),
            _ => None,
        }
    }

    /// Whether retrying the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::ApiError { code, .. } => *code == 429 || (500..=599).contains(code),
            Self::RateLimitError(_)
            | Self::TimeoutError(_)
            | Self::ConnectionError(_)
            | Self::HttpError(_) => true,
            _ => false,
        }
    }

    /// Coarse category of this error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::HttpError(_)
            | Self::TimeoutError(_)
            | Self::ConnectionError(_)
            | Self::StreamError(_) => ErrorCategory::Network,
            Self::AuthenticationError(_) | Self::MissingApiKey(_) => ErrorCategory::Authentication,
            Self::RateLimitError(_) | Self::QuotaExceededError(_) => ErrorCategory::RateLimit,
            Self::ApiError { code, .. } if *code == 429 => ErrorCategory::RateLimit,
            Self::ApiError { code, .. } if *code >= 500 => ErrorCategory::Server,
            Self::ApiError { .. } | Self::NotFound(_) | Self::InvalidInput(_) => {
                ErrorCategory::Client
            }
            Self::JsonError(_) | Self::ParseError(_) => ErrorCategory::Parsing,
            Self::ConfigurationError(_)
            | Self::UnsupportedRole(_)
            | Self::InvalidOptionsType(_) => ErrorCategory::Validation,
            Self::UnknownFunction(_)
            | Self::FunctionExecutionError { .. }
            | Self::ToolLoopExceeded { .. } => ErrorCategory::Function,
            Self::InternalError(_) => ErrorCategory::Internal,
        }
    }
}
