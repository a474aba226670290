//! Default values shared across the crate.

/// Chat defaults applied by [`crate::client::ChatAdapter::new`].
pub mod chat {
    /// Model used when neither the prompt nor the adapter names one.
    pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
    /// Sampling temperature of the default options.
    pub const DEFAULT_TEMPERATURE: f32 = 0.7;
    /// Upper bound on function-calling rounds per call.
    pub const MAX_TOOL_ROUNDS: usize = 8;
}

/// HTTP defaults.
pub mod http {
    use std::time::Duration;

    pub const BASE_URL: &str = "https://api.openai.com/v1";
    pub const COMPLETIONS_PATH: &str = "/chat/completions";
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
    pub const USER_AGENT: &str = concat!("chat-adapter/", env!("CARGO_PKG_VERSION"));

    /// Environment variables consulted by the builder, in order.
    pub const API_KEY_ENV_VARS: &[&str] = &["CHAT_ADAPTER_API_KEY", "OPENAI_API_KEY"];
    pub const BASE_URL_ENV_VAR: &str = "CHAT_ADAPTER_BASE_URL";
    pub const STREAM_DISABLE_COMPRESSION_ENV_VAR: &str = "CHAT_ADAPTER_STREAM_DISABLE_COMPRESSION";
}

/// Retry defaults.
pub mod retry {
    use std::time::Duration;

    pub const INITIAL_INTERVAL: Duration = Duration::from_millis(500);
    pub const MAX_INTERVAL: Duration = Duration::from_secs(30);
    pub const MULTIPLIER: f64 = 2.0;
    pub const RANDOMIZATION_FACTOR: f64 = 0.1;
    pub const MAX_ELAPSED_TIME: Duration = Duration::from_secs(120);
}
