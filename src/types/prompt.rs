//! Prompts: ordered messages plus optional options.

use std::sync::Arc;

use super::message::Message;
use super::options::ModelOptions;

/// Input of a chat call.
#[derive(Debug, Clone, Default)]
pub struct Prompt {
    pub messages: Vec<Message>,
    pub options: Option<Arc<dyn ModelOptions>>,
}

impl Prompt {
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            messages,
            options: None,
        }
    }

    /// Attach per-call options. They take precedence over the adapter defaults.
    pub fn with_options(mut self, options: impl ModelOptions + 'static) -> Self {
        self.options = Some(Arc::new(options));
        self
    }

    pub fn with_shared_options(mut self, options: Arc<dyn ModelOptions>) -> Self {
        self.options = Some(options);
        self
    }
}

impl From<&str> for Prompt {
    fn from(text: &str) -> Self {
        Self::new(vec![Message::user(text)])
    }
}

impl From<String> for Prompt {
    fn from(text: String) -> Self {
        Self::new(vec![Message::user(text)])
    }
}

impl From<Vec<Message>> for Prompt {
    fn from(messages: Vec<Message>) -> Self {
        Self::new(messages)
    }
}
