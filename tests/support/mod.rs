//! Shared test fixtures: a scripted transport, recording callbacks and
//! response builders.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chat_adapter::api::{
    ChatCompletion, ChatCompletionChunk, ChatCompletionMessage, ChatCompletionRequest,
    ChatCompletionTransport, Choice, ChunkChoice, ChunkStream, CompletionResponse, FinishReason,
    Role, ToolCall,
};
use chat_adapter::functions::{FunctionCallback, FunctionCallbackRegistry};
use chat_adapter::{ChatAdapter, LlmError};
use serde_json::{Value, json};

/// Transport that replays scripted responses and records every request.
#[derive(Default)]
pub struct MockTransport {
    responses: Mutex<VecDeque<Result<CompletionResponse, LlmError>>>,
    streams: Mutex<VecDeque<Result<Vec<Result<ChatCompletionChunk, LlmError>>, LlmError>>>,
    requests: Mutex<Vec<ChatCompletionRequest>>,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push_completion(&self, completion: ChatCompletion) {
        self.push_response(Ok(CompletionResponse::from(completion)));
    }

    pub fn push_response(&self, response: Result<CompletionResponse, LlmError>) {
        self.responses.lock().unwrap().push_back(response);
    }

    pub fn push_stream(&self, chunks: Vec<Result<ChatCompletionChunk, LlmError>>) {
        self.streams.lock().unwrap().push_back(Ok(chunks));
    }

    pub fn push_stream_error(&self, error: LlmError) {
        self.streams.lock().unwrap().push_back(Err(error));
    }

    pub fn requests(&self) -> Vec<ChatCompletionRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl ChatCompletionTransport for MockTransport {
    async fn completion(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<CompletionResponse, LlmError> {
        self.requests.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::InternalError("no scripted response".into())))
    }

    async fn completion_stream(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<ChunkStream, LlmError> {
        self.requests.lock().unwrap().push(request.clone());
        let chunks = self
            .streams
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::InternalError("no scripted stream".into())))?;
        Ok(Box::pin(futures_util::stream::iter(chunks)))
    }
}

/// Adapter over `transport` with default options and no retries.
pub fn adapter(transport: &Arc<MockTransport>) -> ChatAdapter {
    ChatAdapter::from_parts(
        transport.clone(),
        chat_adapter::client::default_chat_options(),
        Arc::new(FunctionCallbackRegistry::new()),
    )
    .with_retry_options(None)
}

/// Callback that records its arguments and answers through `reply`.
pub struct RecordingCallback {
    name: String,
    schema: Value,
    reply: fn(&str) -> Result<String, String>,
    calls: Mutex<Vec<String>>,
}

impl RecordingCallback {
    pub fn new(name: &str, reply: fn(&str) -> Result<String, String>) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            schema: json!({"type": "object", "properties": {"expression": {"type": "string"}}}),
            reply,
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl FunctionCallback for RecordingCallback {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "test function"
    }

    fn input_type_schema(&self) -> &Value {
        &self.schema
    }

    async fn call(&self, arguments: &str) -> Result<String, LlmError> {
        self.calls.lock().unwrap().push(arguments.to_string());
        (self.reply)(arguments).map_err(|message| LlmError::function_error(&self.name, message))
    }
}

/// Calculator that only knows `2+2`.
pub fn calc() -> Arc<RecordingCallback> {
    RecordingCallback::new("calc", |args| match args {
        "2+2" => Ok("4".to_string()),
        other => Err(format!("cannot evaluate {other}")),
    })
}

pub fn completion(id: &str, content: &str, finish_reason: FinishReason) -> ChatCompletion {
    ChatCompletion {
        id: id.to_string(),
        choices: vec![Choice {
            finish_reason: Some(finish_reason),
            index: 0,
            message: ChatCompletionMessage::new(content, Role::Assistant),
            logprobs: None,
        }],
        created: 1_700_000_000,
        model: "gpt-test".to_string(),
        system_fingerprint: None,
        object: "chat.completion".to_string(),
        usage: None,
    }
}

pub fn tool_call_completion(id: &str, tool_calls: Vec<ToolCall>) -> ChatCompletion {
    let mut completion = completion(id, "", FinishReason::ToolCalls);
    completion.choices[0].message.content = None;
    completion.choices[0].message.tool_calls = Some(tool_calls);
    completion
}

pub fn chunk(id: &str, role: Option<Role>, content: &str) -> ChatCompletionChunk {
    ChatCompletionChunk {
        id: id.to_string(),
        choices: vec![ChunkChoice {
            finish_reason: None,
            index: 0,
            delta: ChatCompletionMessage {
                content: Some(content.to_string()),
                role,
                ..Default::default()
            },
            logprobs: None,
        }],
        created: 1_700_000_000,
        model: "gpt-test".to_string(),
        system_fingerprint: None,
    }
}

pub fn tool_call_chunk(id: &str, tool_calls: Vec<ToolCall>) -> ChatCompletionChunk {
    let mut chunk = chunk(id, Some(Role::Assistant), "");
    chunk.choices[0].delta.content = None;
    chunk.choices[0].delta.tool_calls = Some(tool_calls);
    chunk.choices[0].finish_reason = Some(FinishReason::ToolCalls);
    chunk
}

/// Read a fixture from `tests/fixtures`.
pub fn fixture(name: &str) -> String {
    let path = format!("{}/tests/fixtures/{name}", env!("CARGO_MANIFEST_DIR"));
    std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("fixture {path}: {e}"))
}
