//! Provider-agnostic types.

pub mod http;
pub mod message;
pub mod options;
pub mod prompt;
pub mod result;

pub use http::{HttpConfig, HttpConfigBuilder};
pub use message::{Message, MessageRole};
pub use options::{ChatOptions, ChatOptionsBuilder, ModelOptions};
pub use prompt::Prompt;
pub use result::{ChatResult, ChatResultMetadata, Generation, GenerationMetadata, RateLimit};
