//! Chat-completion wire types.
//!
//! These mirror the JSON accepted and returned by the remote chat-completion
//! endpoint. Optional fields are skipped when unset so merged requests only
//! carry what the caller (or the defaults) actually configured.

use serde::{Deserialize, Serialize};

use super::options::ChatCompletionOptions;

/// Message role in the provider vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::Tool => "tool",
        }
    }
}

/// Function invocation requested by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatCompletionFunction {
    pub name: String,
    /// JSON-encoded arguments, passed verbatim to the callback.
    pub arguments: String,
}

/// Tool call attached to an assistant message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    #[serde(rename = "type", default = "function_type")]
    pub kind: String,
    pub function: ChatCompletionFunction,
}

fn function_type() -> String {
    "function".to_string()
}

impl ToolCall {
    pub fn function(
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            kind: function_type(),
            function: ChatCompletionFunction {
                name: name.into(),
                arguments: arguments.into(),
            },
        }
    }
}

/// A single conversation message.
///
/// The role is optional because streamed deltas only carry it on the first
/// chunk of a response.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ChatCompletionMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
}

impl ChatCompletionMessage {
    pub fn new(content: impl Into<String>, role: Role) -> Self {
        Self {
            content: Some(content.into()),
            role: Some(role),
            ..Default::default()
        }
    }

    /// Tool-role message answering the call identified by `tool_call_id`.
    pub fn tool_response(
        content: impl Into<String>,
        name: impl Into<String>,
        tool_call_id: impl Into<String>,
    ) -> Self {
        Self {
            content: Some(content.into()),
            role: Some(Role::Tool),
            name: Some(name.into()),
            tool_call_id: Some(tool_call_id.into()),
            tool_calls: None,
        }
    }

    pub fn with_tool_calls(mut self, tool_calls: Vec<ToolCall>) -> Self {
        self.tool_calls = Some(tool_calls);
        self
    }

    pub fn tool_calls(&self) -> &[ToolCall] {
        self.tool_calls.as_deref().unwrap_or_default()
    }
}

/// Why the model stopped generating.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    Stop,
    Length,
    ContentFilter,
    ToolCalls,
    FunctionCall,
    #[serde(other)]
    Other,
}

impl FinishReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stop => "stop",
            Self::Length => "length",
            Self::ContentFilter => "content_filter",
            Self::ToolCalls => "tool_calls",
            Self::FunctionCall => "function_call",
            Self::Other => "other",
        }
    }
}

/// Function description advertised to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDefinition {
    pub description: String,
    pub name: String,
    pub parameters: serde_json::Value,
}

/// Tool entry of a request's `tools` array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionTool {
    #[serde(rename = "type", default = "function_type")]
    pub kind: String,
    pub function: FunctionDefinition,
}

impl FunctionTool {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: serde_json::Value,
    ) -> Self {
        Self {
            kind: function_type(),
            function: FunctionDefinition {
                description: description.into(),
                name: name.into(),
                parameters,
            },
        }
    }
}

/// Token accounting for a non-streamed response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub prompt_tokens: u32,
    #[serde(default)]
    pub completion_tokens: u32,
    #[serde(default)]
    pub total_tokens: u32,
}

/// Which merge side wins when a request absorbs an options object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergePrecedence {
    /// Values set on the options override the request.
    Options,
    /// The request keeps its values; options only fill unset fields.
    Request,
}

/// Request body of the chat-completion endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatCompletionRequest {
    pub messages: Vec<ChatCompletionMessage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop: Option<Vec<String>>,
    #[serde(default)]
    pub stream: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<FunctionTool>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
}

fn pick<T: Clone>(current: Option<T>, incoming: &Option<T>, precedence: MergePrecedence) -> Option<T> {
    match precedence {
        MergePrecedence::Options => incoming.clone().or(current),
        MergePrecedence::Request => current.or_else(|| incoming.clone()),
    }
}

impl ChatCompletionRequest {
    /// Bare request: messages and stream flag, every option unset.
    pub fn new(messages: Vec<ChatCompletionMessage>, stream: bool) -> Self {
        Self {
            messages,
            model: None,
            max_tokens: None,
            temperature: None,
            top_p: None,
            top_k: None,
            stop: None,
            stream,
            tools: None,
            tool_choice: None,
            user: None,
        }
    }

    /// Merge an options object into this request.
    ///
    /// Messages and the stream flag are never touched.
    pub fn merge_options(
        mut self,
        options: &ChatCompletionOptions,
        precedence: MergePrecedence,
    ) -> Self {
        self.model = pick(self.model, &options.model, precedence);
        self.max_tokens = pick(self.max_tokens, &options.max_tokens, precedence);
        self.temperature = pick(self.temperature, &options.temperature, precedence);
        self.top_p = pick(self.top_p, &options.top_p, precedence);
        self.top_k = pick(self.top_k, &options.top_k, precedence);
        self.stop = pick(self.stop, &options.stop, precedence);
        self.tools = pick(self.tools, &options.tools, precedence);
        self.tool_choice = pick(self.tool_choice, &options.tool_choice, precedence);
        self.user = pick(self.user, &options.user, precedence);
        self
    }

    /// Fill every unset setting from `previous`, keeping this request's
    /// messages and stream flag.
    pub fn inherit_settings(mut self, previous: &ChatCompletionRequest) -> Self {
        let keep = MergePrecedence::Request;
        self.model = pick(self.model, &previous.model, keep);
        self.max_tokens = pick(self.max_tokens, &previous.max_tokens, keep);
        self.temperature = pick(self.temperature, &previous.temperature, keep);
        self.top_p = pick(self.top_p, &previous.top_p, keep);
        self.top_k = pick(self.top_k, &previous.top_k, keep);
        self.stop = pick(self.stop, &previous.stop, keep);
        self.tools = pick(self.tools, &previous.tools, keep);
        self.tool_choice = pick(self.tool_choice, &previous.tool_choice, keep);
        self.user = pick(self.user, &previous.user, keep);
        self
    }

    /// Names of the functions advertised in `tools`.
    pub fn tool_names(&self) -> Vec<&str> {
        self.tools
            .iter()
            .flatten()
            .map(|tool| tool.function.name.as_str())
            .collect()
    }
}

/// One choice of a full response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    #[serde(default)]
    pub finish_reason: Option<FinishReason>,
    #[serde(default)]
    pub index: u32,
    pub message: ChatCompletionMessage,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logprobs: Option<serde_json::Value>,
}

/// Full (non-streamed) response body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatCompletion {
    pub id: String,
    #[serde(default)]
    pub choices: Vec<Choice>,
    #[serde(default)]
    pub created: i64,
    #[serde(default)]
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_fingerprint: Option<String>,
    #[serde(default = "completion_object")]
    pub object: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

fn completion_object() -> String {
    "chat.completion".to_string()
}

impl ChatCompletion {
    /// The first choice, which is the only one inspected for tool calls.
    pub fn first_choice(&self) -> Option<&Choice> {
        self.choices.first()
    }
}

/// One choice of a streamed chunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkChoice {
    #[serde(default)]
    pub finish_reason: Option<FinishReason>,
    #[serde(default)]
    pub index: u32,
    #[serde(default)]
    pub delta: ChatCompletionMessage,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logprobs: Option<serde_json::Value>,
}

/// Streamed response chunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatCompletionChunk {
    pub id: String,
    #[serde(default)]
    pub choices: Vec<ChunkChoice>,
    #[serde(default)]
    pub created: i64,
    #[serde(default)]
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_fingerprint: Option<String>,
}

impl ChatCompletionChunk {
    /// Reshape the chunk as a full response so it can go through the same
    /// function-calling path. Streamed chunks carry no usage.
    pub fn into_completion(self) -> ChatCompletion {
        let choices = self
            .choices
            .into_iter()
            .map(|choice| Choice {
                finish_reason: choice.finish_reason,
                index: choice.index,
                message: choice.delta,
                logprobs: choice.logprobs,
            })
            .collect();

        ChatCompletion {
            id: self.id,
            choices,
            created: self.created,
            model: self.model,
            system_fingerprint: self.system_fingerprint,
            object: completion_object(),
            usage: None,
        }
    }
}
