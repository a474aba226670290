use std::collections::BTreeSet;

use super::ChatAdapter;
use crate::api::{
    ChatCompletionMessage, ChatCompletionOptions, ChatCompletionRequest, MergePrecedence, Role,
};
use crate::error::LlmError;
use crate::functions::ResolutionMode;
use crate::types::{Message, MessageRole, ModelOptions, Prompt};

impl ChatAdapter {
    /// Build the provider request for `prompt`.
    ///
    /// Prompt options win over the adapter defaults; defaults only fill what
    /// is still unset. Functions enabled by either side are advertised as
    /// tools, ordered by name.
    pub fn create_request(
        &self,
        prompt: &Prompt,
        stream: bool,
    ) -> Result<ChatCompletionRequest, LlmError> {
        let messages = prompt
            .messages
            .iter()
            .map(to_provider_message)
            .collect::<Result<Vec<_>, _>>()?;

        let runtime_options = prompt
            .options
            .as_deref()
            .map(completion_options)
            .transpose()?;

        let mut enabled_functions = BTreeSet::new();
        let mut request = ChatCompletionRequest::new(messages, stream);

        if let Some(runtime) = &runtime_options {
            enabled_functions.extend(
                self.registry
                    .enabled_functions(runtime, ResolutionMode::Runtime),
            );
        }
        enabled_functions.extend(
            self.registry
                .enabled_functions(&self.default_options, ResolutionMode::Default),
        );

        let merged = match &runtime_options {
            Some(runtime) => runtime.merge(&self.default_options),
            None => ChatCompletionOptions::clone(&self.default_options),
        };
        request = request.merge_options(&merged, MergePrecedence::Options);

        if !enabled_functions.is_empty() {
            let tools = self
                .registry
                .resolve(&enabled_functions)?
                .iter()
                .map(|callback| callback.to_function_tool())
                .collect();
            request.tools = Some(tools);
        }

        tracing::debug!(
            messages = request.messages.len(),
            stream,
            tools = ?request.tool_names(),
            "built chat completion request"
        );
        Ok(request)
    }
}

fn completion_options(options: &dyn ModelOptions) -> Result<ChatCompletionOptions, LlmError> {
    options
        .to_completion_options()
        .ok_or_else(|| LlmError::InvalidOptionsType(options.options_type().to_string()))
}

fn to_provider_role(role: MessageRole) -> Result<Role, LlmError> {
    match role {
        MessageRole::User => Ok(Role::User),
        MessageRole::Assistant => Ok(Role::Assistant),
        MessageRole::System => Ok(Role::System),
        MessageRole::Tool => Ok(Role::Tool),
        MessageRole::Function => Err(LlmError::UnsupportedRole(role.to_string())),
    }
}

fn to_provider_message(message: &Message) -> Result<ChatCompletionMessage, LlmError> {
    let role = to_provider_role(message.role)?;
    let mut converted = ChatCompletionMessage::new(message.content.clone(), role);
    if role == Role::Tool {
        converted.name = message.name.clone();
        converted.tool_call_id = message.tool_call_id.clone();
    }
    Ok(converted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_messages_keep_call_id_and_name() {
        let converted = to_provider_message(&Message::tool("4", "calc", "t1")).unwrap();
        assert_eq!(converted.role, Some(Role::Tool));
        assert_eq!(converted.name.as_deref(), Some("calc"));
        assert_eq!(converted.tool_call_id.as_deref(), Some("t1"));
    }

    #[test]
    fn function_role_has_no_provider_mapping() {
        let err = to_provider_role(MessageRole::Function).unwrap_err();
        assert!(matches!(err, LlmError::UnsupportedRole(role) if role == "function"));
    }
}
