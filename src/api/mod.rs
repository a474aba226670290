//! Chat-completion API: wire types, options, transports and rate limits.

pub mod http;
pub mod options;
pub mod rate_limit;
pub mod transport;
pub mod types;

pub use http::{HttpChatTransport, build_http_client};
pub use options::{ChatCompletionOptions, ChatCompletionOptionsBuilder};
pub use rate_limit::{HeaderRateLimitExtractor, RateLimitExtractor, parse_duration};
pub use transport::{ChatCompletionTransport, ChunkStream, CompletionResponse};
pub use types::{
    ChatCompletion, ChatCompletionChunk, ChatCompletionFunction, ChatCompletionMessage,
    ChatCompletionRequest, Choice, ChunkChoice, FinishReason, FunctionDefinition, FunctionTool,
    MergePrecedence, Role, ToolCall, Usage,
};
