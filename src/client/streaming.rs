//! Streaming path.
//!
//! Each chunk is handled on its own: it is reshaped as a full response and
//! run through the function-call loop. Tool calls split across several
//! chunks are therefore not assembled.

use std::collections::HashMap;

use futures::StreamExt;
use tracing::Instrument;

use super::ChatAdapter;
use crate::api::{ChatCompletionChunk, ChatCompletionRequest, CompletionResponse, Role};
use crate::error::LlmError;
use crate::retry_api::maybe_retry;
use crate::streaming::ChatResultStream;
use crate::types::{ChatResult, Prompt};

impl ChatAdapter {
    pub(crate) async fn open_stream(&self, prompt: Prompt) -> Result<ChatResultStream, LlmError> {
        let span = tracing::info_span!(
            "chat_adapter.stream",
            call_id = %uuid::Uuid::new_v4(),
            model = tracing::field::Empty,
        );

        let request = span.in_scope(|| self.create_request(&prompt, true))?;
        if let Some(model) = request.model.as_deref() {
            span.record("model", model);
        }

        let transport = &self.transport;
        let request_ref = &request;
        let mut chunks = maybe_retry(self.retry_options.clone(), || async move {
            transport.completion_stream(request_ref).await
        })
        .instrument(span.clone())
        .await?;

        let adapter = self.clone();
        let stream = async_stream::stream! {
            // Role announced by the first chunk of each response id.
            let mut roles: HashMap<String, Role> = HashMap::new();

            while let Some(item) = chunks.next().await {
                let chunk = match item {
                    Ok(chunk) => chunk,
                    Err(error) => {
                        yield Err(error);
                        break;
                    }
                };

                let result = adapter
                    .process_chunk(&request, chunk, &mut roles)
                    .instrument(span.clone())
                    .await;
                match result {
                    Ok(result) => yield Ok(result),
                    Err(error) => {
                        span.in_scope(|| tracing::error!("error processing chat completion chunk: {error}"));
                        yield Ok(ChatResult::empty());
                    }
                }
            }
        };

        Ok(Box::pin(stream))
    }

    async fn process_chunk(
        &self,
        request: &ChatCompletionRequest,
        chunk: ChatCompletionChunk,
        roles: &mut HashMap<String, Role>,
    ) -> Result<ChatResult, LlmError> {
        let completion = chunk.into_completion();
        for role in completion.choices.iter().filter_map(|c| c.message.role) {
            roles.entry(completion.id.clone()).or_insert(role);
        }

        let response = self
            .handle_function_call_or_return(request, CompletionResponse::from(completion))
            .await?;

        let mut result = self.to_chat_result(response);
        for generation in &mut result.generations {
            if let Some(role) = roles.get(&generation.metadata.id) {
                generation.metadata.role = Some(role.as_str().to_string());
            }
        }
        Ok(result)
    }
}
