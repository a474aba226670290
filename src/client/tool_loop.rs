//! Function-call loop.
//!
//! A response asking for tools is answered by running the named callbacks,
//! appending their results to the conversation and resubmitting, until the
//! model produces a final answer or the round limit is hit.

use std::borrow::Cow;

use super::ChatAdapter;
use crate::api::{
    ChatCompletion, ChatCompletionMessage, ChatCompletionRequest, CompletionResponse,
    FinishReason, Role,
};
use crate::error::LlmError;
use crate::retry_api::maybe_retry;

/// Body of `response` if it is a tool-call response.
fn tool_call_completion(response: &CompletionResponse) -> Option<&ChatCompletion> {
    let completion = response.body.as_ref()?;
    let choice = completion.first_choice()?;
    let asks_for_tools = !choice.message.tool_calls().is_empty()
        && choice.finish_reason == Some(FinishReason::ToolCalls);
    asks_for_tools.then_some(completion)
}

/// Whether the model is asking for function calls: the first choice carries
/// tool calls and finished with `tool_calls`. Other choices are ignored.
pub fn is_tool_function_call(response: &CompletionResponse) -> bool {
    tool_call_completion(response).is_some()
}

impl ChatAdapter {
    /// One network round under the configured retry options.
    pub(crate) async fn execute_completion(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<CompletionResponse, LlmError> {
        let transport = &self.transport;
        maybe_retry(self.retry_options.clone(), || async move {
            transport.completion(request).await
        })
        .await
    }

    /// Return `response` unchanged unless it asks for tools; otherwise answer
    /// tool calls until a final response arrives.
    pub(crate) async fn handle_function_call_or_return(
        &self,
        request: &ChatCompletionRequest,
        response: CompletionResponse,
    ) -> Result<CompletionResponse, LlmError> {
        let mut current = Cow::Borrowed(request);
        let mut response = response;
        let mut rounds = 0;

        loop {
            let Some(completion) = tool_call_completion(&response) else {
                return Ok(response);
            };
            if rounds >= self.max_tool_rounds {
                tracing::warn!(max_rounds = self.max_tool_rounds, "tool round limit reached");
                return Err(LlmError::ToolLoopExceeded {
                    max_rounds: self.max_tool_rounds,
                });
            }
            rounds += 1;

            let next = self.create_tool_response_request(&current, completion).await?;
            tracing::debug!(round = rounds, messages = next.messages.len(), "resubmitting with tool results");
            response = self.execute_completion(&next).await?;
            current = Cow::Owned(next);
        }
    }

    /// Follow-up request: the previous conversation, the assistant message
    /// with its tool calls, then one tool message per call in call order.
    async fn create_tool_response_request(
        &self,
        previous: &ChatCompletionRequest,
        completion: &ChatCompletion,
    ) -> Result<ChatCompletionRequest, LlmError> {
        let choice = completion
            .first_choice()
            .ok_or_else(|| LlmError::InternalError("tool call response without choices".into()))?;

        let mut assistant = choice.message.clone();
        assistant.role.get_or_insert(Role::Assistant);

        let mut conversation = previous.messages.clone();
        conversation.push(assistant.clone());

        for tool_call in assistant.tool_calls() {
            let name = tool_call.function.name.as_str();
            let callback = self.registry.lookup(name)?;
            tracing::debug!(function = name, tool_call_id = %tool_call.id, "invoking function callback");
            let content = callback.call(&tool_call.function.arguments).await?;
            conversation.push(ChatCompletionMessage::tool_response(
                content,
                name,
                tool_call.id.as_str(),
            ));
        }

        Ok(ChatCompletionRequest::new(conversation, false).inherit_settings(previous))
    }
}
