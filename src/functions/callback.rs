//! Function callbacks invoked when the model asks for a tool.

use std::fmt;
use std::marker::PhantomData;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::api::FunctionTool;
use crate::error::LlmError;

/// A named, locally executed capability the model may call.
///
/// Arguments arrive exactly as the model produced them (usually a JSON
/// document); the returned text is fed back to the model verbatim.
#[async_trait]
pub trait FunctionCallback: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// JSON schema of the arguments.
    fn input_type_schema(&self) -> &Value;

    async fn call(&self, arguments: &str) -> Result<String, LlmError>;

    /// Tool definition advertised to the model.
    fn to_function_tool(&self) -> FunctionTool {
        FunctionTool::new(
            self.name(),
            self.description(),
            self.input_type_schema().clone(),
        )
    }
}

impl fmt::Debug for dyn FunctionCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionCallback")
            .field("name", &self.name())
            .finish_non_exhaustive()
    }
}

/// Typed callback over a plain closure.
///
/// Arguments are validated against the input schema (when it is an object),
/// deserialized into `I`, and the closure's output is serialized back to text.
/// String outputs are returned without JSON quoting.
pub struct FunctionCallbackWrapper<I, O, F> {
    name: String,
    description: String,
    input_type_schema: Value,
    validator: Option<jsonschema::Validator>,
    function: F,
    _marker: PhantomData<fn(I) -> O>,
}

impl<I, O, F> FunctionCallbackWrapper<I, O, F>
where
    I: DeserializeOwned + 'static,
    O: Serialize + 'static,
    F: Fn(I) -> O + Send + Sync + 'static,
{
    pub fn builder(function: F) -> FunctionCallbackWrapperBuilder<I, O, F> {
        FunctionCallbackWrapperBuilder {
            name: None,
            description: None,
            input_type_schema: None,
            function,
            _marker: PhantomData,
        }
    }

    fn validate(&self, instance: &Value) -> Result<(), LlmError> {
        let Some(validator) = &self.validator else {
            return Ok(());
        };
        let messages: Vec<String> = validator
            .iter_errors(instance)
            .take(3)
            .map(|err| err.to_string())
            .collect();
        if messages.is_empty() {
            Ok(())
        } else {
            Err(LlmError::function_error(
                &self.name,
                format!("arguments failed schema validation: {}", messages.join("; ")),
            ))
        }
    }
}

#[async_trait]
impl<I, O, F> FunctionCallback for FunctionCallbackWrapper<I, O, F>
where
    I: DeserializeOwned + 'static,
    O: Serialize + 'static,
    F: Fn(I) -> O + Send + Sync + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn input_type_schema(&self) -> &Value {
        &self.input_type_schema
    }

    async fn call(&self, arguments: &str) -> Result<String, LlmError> {
        let raw: Value = serde_json::from_str(arguments).map_err(|e| {
            LlmError::function_error(&self.name, format!("arguments are not valid JSON: {e}"))
        })?;
        self.validate(&raw)?;
        let input: I = serde_json::from_value(raw).map_err(|e| {
            LlmError::function_error(&self.name, format!("unexpected arguments: {e}"))
        })?;

        match serde_json::to_value((self.function)(input))? {
            Value::String(text) => Ok(text),
            other => Ok(other.to_string()),
        }
    }
}

/// Builder for [`FunctionCallbackWrapper`].
pub struct FunctionCallbackWrapperBuilder<I, O, F> {
    name: Option<String>,
    description: Option<String>,
    input_type_schema: Option<Value>,
    function: F,
    _marker: PhantomData<fn(I) -> O>,
}

impl<I, O, F> FunctionCallbackWrapperBuilder<I, O, F>
where
    I: DeserializeOwned + 'static,
    O: Serialize + 'static,
    F: Fn(I) -> O + Send + Sync + 'static,
{
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn input_type_schema(mut self, schema: Value) -> Self {
        self.input_type_schema = Some(schema);
        self
    }

    pub fn build(self) -> Result<FunctionCallbackWrapper<I, O, F>, LlmError> {
        let name = self
            .name
            .filter(|n| !n.trim().is_empty())
            .ok_or_else(|| LlmError::ConfigurationError("function name must be set".into()))?;
        let description = self.description.filter(|d| !d.trim().is_empty()).ok_or_else(|| {
            LlmError::ConfigurationError(format!("function '{name}' needs a description"))
        })?;
        let input_type_schema = self
            .input_type_schema
            .unwrap_or_else(|| serde_json::json!({"type": "object"}));

        let validator = if input_type_schema.is_object() {
            match jsonschema::validator_for(&input_type_schema) {
                Ok(validator) => Some(validator),
                Err(e) => {
                    tracing::warn!(function = %name, "invalid input schema, skipping validation: {e}");
                    None
                }
            }
        } else {
            None
        };

        Ok(FunctionCallbackWrapper {
            name,
            description,
            input_type_schema,
            validator,
            function: self.function,
            _marker: PhantomData,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Deserialize)]
    struct WeatherRequest {
        location: String,
    }

    #[derive(Serialize)]
    struct WeatherResponse {
        temperature: f32,
        unit: &'static str,
    }

    fn weather_callback() -> impl FunctionCallback {
        FunctionCallbackWrapper::builder(|req: WeatherRequest| WeatherResponse {
            temperature: if req.location == "Paris" { 15.0 } else { 30.0 },
            unit: "C",
        })
        .name("get_weather")
        .description("Current weather for a location")
        .input_type_schema(json!({
            "type": "object",
            "properties": {"location": {"type": "string"}},
            "required": ["location"]
        }))
        .build()
        .unwrap()
    }

    #[tokio::test]
    async fn typed_callback_serializes_output() {
        let callback = weather_callback();
        let out = callback.call(r#"{"location":"Paris"}"#).await.unwrap();
        let value: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value, json!({"temperature": 15.0, "unit": "C"}));
    }

    #[tokio::test]
    async fn schema_violation_is_a_function_error() {
        let callback = weather_callback();
        let err = callback.call(r#"{"city":"Paris"}"#).await.unwrap_err();
        match err {
            LlmError::FunctionExecutionError { name, message } => {
                assert_eq!(name, "get_weather");
                assert!(message.contains("schema validation"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn string_output_is_not_quoted() {
        let callback = FunctionCallbackWrapper::builder(|v: Value| format!("echo {v}"))
            .name("echo")
            .description("Echo the arguments")
            .build()
            .unwrap();
        let out = callback.call(r#"{"n":1}"#).await.unwrap();
        assert_eq!(out, r#"echo {"n":1}"#);
    }

    #[test]
    fn builder_requires_a_description() {
        let result = FunctionCallbackWrapper::builder(|v: Value| v)
            .name("noop")
            .build();
        assert!(matches!(result, Err(LlmError::ConfigurationError(_))));
    }

    #[test]
    fn tool_definition_uses_callback_metadata() {
        let tool = weather_callback().to_function_tool();
        assert_eq!(tool.kind, "function");
        assert_eq!(tool.function.name, "get_weather");
        assert_eq!(tool.function.parameters["required"], json!(["location"]));
    }
}
