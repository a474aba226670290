mod support;

use std::sync::Arc;

use chat_adapter::api::{ChatCompletionMessage, CompletionResponse, FinishReason, Role, ToolCall};
use chat_adapter::prelude::*;
use support::{MockTransport, adapter, calc, completion, tool_call_completion};
use tracing_test::traced_test;

fn calc_prompt(calc: Arc<support::RecordingCallback>) -> Prompt {
    Prompt::new(vec![Message::user("What's 2+2 using calc tool?")])
        .with_options(ChatOptions::builder().function_callback(calc).build())
}

#[tokio::test]
async fn tool_round_trip_returns_the_final_answer() {
    let transport = MockTransport::new();
    transport.push_completion(tool_call_completion(
        "round-1",
        vec![ToolCall::function("t1", "calc", "2+2")],
    ));
    transport.push_completion(completion("round-2", "4", FinishReason::Stop));

    let calc = calc();
    let result = adapter(&transport)
        .call(calc_prompt(calc.clone()))
        .await
        .unwrap();

    assert_eq!(result.generations.len(), 1);
    assert_eq!(result.text(), "4");
    assert_eq!(result.metadata.id.as_deref(), Some("round-2"));
    assert_eq!(calc.calls(), vec!["2+2"]);

    let requests = transport.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].tool_names(), vec!["calc"]);

    let follow_up = &requests[1];
    assert!(!follow_up.stream);
    assert_eq!(follow_up.model, requests[0].model);
    assert_eq!(follow_up.temperature, Some(0.7));
    assert_eq!(follow_up.tool_names(), vec!["calc"]);
    assert_eq!(
        follow_up.messages,
        vec![
            ChatCompletionMessage::new("What's 2+2 using calc tool?", Role::User),
            ChatCompletionMessage {
                role: Some(Role::Assistant),
                ..Default::default()
            }
            .with_tool_calls(vec![ToolCall::function("t1", "calc", "2+2")]),
            ChatCompletionMessage::tool_response("4", "calc", "t1"),
        ]
    );
}

#[tokio::test]
async fn missing_assistant_role_defaults_to_assistant() {
    let transport = MockTransport::new();
    let mut first = tool_call_completion("round-1", vec![ToolCall::function("t1", "calc", "2+2")]);
    first.choices[0].message.role = None;
    transport.push_completion(first);
    transport.push_completion(completion("round-2", "4", FinishReason::Stop));

    adapter(&transport).call(calc_prompt(calc())).await.unwrap();

    let history = &transport.requests()[1].messages;
    assert_eq!(history[1].role, Some(Role::Assistant));
}

#[tokio::test]
async fn tool_results_follow_call_order() {
    let transport = MockTransport::new();
    transport.push_completion(tool_call_completion(
        "round-1",
        vec![
            ToolCall::function("a", "calc", "2+2"),
            ToolCall::function("b", "calc", "1+1"),
        ],
    ));
    transport.push_completion(completion("round-2", "done", FinishReason::Stop));

    let echo = support::RecordingCallback::new("calc", |args| Ok(format!("={args}")));
    let prompt = Prompt::from("calc twice")
        .with_options(ChatOptions::builder().function_callback(echo.clone()).build());
    adapter(&transport).call(prompt).await.unwrap();

    let history = &transport.requests()[1].messages;
    assert_eq!(history.len(), 4);
    assert_eq!(history[2], ChatCompletionMessage::tool_response("=2+2", "calc", "a"));
    assert_eq!(history[3], ChatCompletionMessage::tool_response("=1+1", "calc", "b"));
    assert_eq!(echo.calls(), vec!["2+2", "1+1"]);
}

#[tokio::test]
async fn multi_round_history_accumulates() {
    let transport = MockTransport::new();
    transport.push_completion(tool_call_completion("r1", vec![ToolCall::function("t1", "calc", "2+2")]));
    transport.push_completion(tool_call_completion("r2", vec![ToolCall::function("t2", "calc", "2+2")]));
    transport.push_completion(completion("r3", "4 and 4", FinishReason::Stop));

    let result = adapter(&transport).call(calc_prompt(calc())).await.unwrap();

    assert_eq!(result.text(), "4 and 4");
    let requests = transport.requests();
    assert_eq!(requests.len(), 3);
    assert_eq!(requests[1].messages.len(), 3);
    assert_eq!(requests[2].messages.len(), 5);
    assert_eq!(requests[2].messages[..3], requests[1].messages[..]);
    assert_eq!(requests[2].messages[4].tool_call_id.as_deref(), Some("t2"));
}

#[tokio::test]
async fn tool_calls_without_tool_finish_reason_are_final() {
    let transport = MockTransport::new();
    let mut response = tool_call_completion("r1", vec![ToolCall::function("t1", "calc", "2+2")]);
    response.choices[0].finish_reason = Some(FinishReason::Stop);
    transport.push_completion(response);

    let calc = calc();
    let result = adapter(&transport).call(calc_prompt(calc.clone())).await.unwrap();

    assert_eq!(transport.request_count(), 1);
    assert!(calc.calls().is_empty());
    assert_eq!(result.generations[0].metadata.finish_reason.as_deref(), Some("stop"));
}

#[tokio::test]
async fn unknown_function_fails_without_another_request() {
    let transport = MockTransport::new();
    transport.push_completion(tool_call_completion(
        "r1",
        vec![ToolCall::function("t1", "weather", "{}")],
    ));

    let err = adapter(&transport).call(calc_prompt(calc())).await.unwrap_err();

    assert!(matches!(err, LlmError::UnknownFunction(ref name) if name == "weather"));
    assert_eq!(transport.request_count(), 1);
}

#[tokio::test]
async fn runtime_callbacks_stay_registered_for_later_calls() {
    let transport = MockTransport::new();
    transport.push_completion(completion("r1", "ready", FinishReason::Stop));
    transport.push_completion(tool_call_completion("r2", vec![ToolCall::function("t1", "calc", "2+2")]));
    transport.push_completion(completion("r3", "4", FinishReason::Stop));

    let calc = calc();
    let adapter = adapter(&transport);
    adapter.call(calc_prompt(calc.clone())).await.unwrap();
    let result = adapter.call(Prompt::from("again")).await.unwrap();

    assert_eq!(result.text(), "4");
    assert_eq!(calc.calls(), vec!["2+2"]);
    let requests = transport.requests();
    assert_eq!(requests[0].tool_names(), vec!["calc"]);
    assert!(requests[1].tools.is_none());
}

#[tokio::test]
async fn callback_failure_propagates() {
    let transport = MockTransport::new();
    transport.push_completion(tool_call_completion("r1", vec![ToolCall::function("t1", "calc", "7/0")]));

    let err = adapter(&transport).call(calc_prompt(calc())).await.unwrap_err();

    match err {
        LlmError::FunctionExecutionError { name, message } => {
            assert_eq!(name, "calc");
            assert!(message.contains("7/0"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(transport.request_count(), 1);
}

#[tokio::test]
async fn endless_tool_calls_hit_the_round_limit() {
    let transport = MockTransport::new();
    for round in 0..5 {
        transport.push_completion(tool_call_completion(
            &format!("r{round}"),
            vec![ToolCall::function("t", "calc", "2+2")],
        ));
    }

    let err = adapter(&transport)
        .with_max_tool_rounds(2)
        .call(calc_prompt(calc()))
        .await
        .unwrap_err();

    assert!(matches!(err, LlmError::ToolLoopExceeded { max_rounds: 2 }));
    assert_eq!(transport.request_count(), 3);
}

#[tokio::test]
#[traced_test]
async fn empty_body_yields_empty_result() {
    let transport = MockTransport::new();
    transport.push_response(Ok(CompletionResponse::default()));

    let result = adapter(&transport).call(Prompt::from("hello")).await.unwrap();

    assert!(result.is_empty());
    assert_eq!(result.text(), "");
    assert!(logs_contain("no chat completion returned"));
}

#[tokio::test]
async fn ask_returns_first_generation_text() {
    let transport = MockTransport::new();
    transport.push_completion(completion("r1", "hello there", FinishReason::Stop));

    let answer = adapter(&transport).ask("hi").await.unwrap();

    assert_eq!(answer, "hello there");
    assert_eq!(
        transport.requests()[0].messages,
        vec![ChatCompletionMessage::new("hi", Role::User)]
    );
}
