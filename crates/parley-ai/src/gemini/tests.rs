use serde_json::{json, Map};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::*;
use crate::{
    ChatProvider, FinishReason, ParamType, ParameterSpec, ProviderError, ToolCallRequest, ToolSpec,
    Transcript, Turn,
};

fn client(base_url: &str) -> GeminiClient {
    GeminiClient::new(GeminiConfig::new("g-key").with_base_url(base_url)).unwrap()
}

fn admin_args() -> Map<String, serde_json::Value> {
    let mut args = Map::new();
    args.insert("role".into(), json!("admin"));
    args
}

#[test]
fn system_prompt_moves_to_system_instruction() {
    let c = client("http://unused");
    let mut transcript = Transcript::with_system("You are a directory assistant");
    transcript.push_user("hello");
    transcript.push_assistant("hi");

    let body = c.build_request_body(&transcript, &[]);
    assert_eq!(
        body["systemInstruction"]["parts"][0]["text"],
        "You are a directory assistant"
    );
    let contents = body["contents"].as_array().unwrap();
    assert_eq!(contents.len(), 2);
    assert_eq!(contents[1]["role"], "model");
    assert!(body.get("tools").is_none());
}

#[test]
fn tools_are_declared_as_function_declarations() {
    let c = client("http://unused");
    let spec = ToolSpec::new("search_users", "Search").with_parameter(
        ParameterSpec::new("limit", ParamType::Integer, "Page size").with_default(10),
    );
    let body = c.build_request_body(&Transcript::from(vec![Turn::user("x")]), &[spec]);
    let decl = &body["tools"][0]["functionDeclarations"][0];
    assert_eq!(decl["name"], "search_users");
    assert_eq!(decl["parameters"]["properties"]["limit"]["type"], "INTEGER");
}

#[test]
fn consecutive_tool_turns_merge_into_one_user_content() {
    let c = client("http://unused");
    let transcript = Transcript::from(vec![
        Turn::user("Find admins and editors"),
        Turn::assistant_tool_calls(
            None,
            vec![
                ToolCallRequest::new("call_1", "search_users", admin_args()),
                ToolCallRequest::new("call_2", "search_users", Map::new()),
            ],
        ),
        Turn::tool_result("call_1", "search_users", r#"{"total":2}"#),
        Turn::tool_result("call_2", "search_users", "plain text"),
    ]);

    let body = c.build_request_body(&transcript, &[]);
    let contents = body["contents"].as_array().unwrap();
    assert_eq!(contents.len(), 3);

    let model = &contents[1];
    assert_eq!(model["role"], "model");
    assert_eq!(model["parts"].as_array().unwrap().len(), 2);
    assert_eq!(model["parts"][0]["functionCall"]["args"]["role"], "admin");

    let responses = &contents[2];
    assert_eq!(responses["role"], "user");
    assert_eq!(
        responses["parts"][0]["functionResponse"]["response"]["result"]["total"],
        2
    );
    assert_eq!(
        responses["parts"][1]["functionResponse"]["response"]["result"],
        "plain text"
    );
}

#[test]
fn function_calls_get_synthesized_unique_ids() {
    let c = client("http://unused");
    let response = c
        .parse_response(json!({
            "candidates": [{
                "content": {"role": "model", "parts": [
                    {"functionCall": {"name": "search_users", "args": {"role": "admin"}}},
                    {"functionCall": {"name": "search_users"}}
                ]},
                "finishReason": "STOP"
            }],
            "usageMetadata": {"promptTokenCount": 20, "candidatesTokenCount": 5}
        }))
        .unwrap();

    assert!(response.content.is_none());
    assert_eq!(response.tool_calls.len(), 2);
    assert!(response.tool_calls[0].id.starts_with("call_"));
    assert_ne!(response.tool_calls[0].id, response.tool_calls[1].id);
    assert_eq!(response.tool_calls[0].arguments["role"], "admin");
    assert!(response.tool_calls[1].arguments.is_empty());
    assert_eq!(response.usage.input_tokens, 20);
}

#[test]
fn finish_reasons_and_blocked_prompts() {
    let c = client("http://unused");
    let reason = |r: &str| {
        c.parse_response(json!({
            "candidates": [{"content": {"parts": [{"text": "x"}]}, "finishReason": r}]
        }))
        .unwrap()
        .finish_reason
    };
    assert_eq!(reason("STOP"), FinishReason::Stop);
    assert_eq!(reason("MAX_TOKENS"), FinishReason::Length);
    assert_eq!(reason("SAFETY"), FinishReason::Error);

    let err = c
        .parse_response(json!({"promptFeedback": {"blockReason": "SAFETY"}}))
        .unwrap_err();
    match err {
        ProviderError::Parse(msg) => assert!(msg.contains("SAFETY")),
        other => panic!("expected parse error, got {other:?}"),
    }
}

#[tokio::test]
async fn complete_uses_model_hint_in_path() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/models/gemini-2.5-pro:generateContent"))
        .and(header("x-goog-api-key", "g-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{
                "content": {"parts": [{"text": "Hello "}, {"text": "there"}]},
                "finishReason": "STOP"
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let c = client(&server.uri());
    let transcript = Transcript::from(vec![Turn::user("hi")]);
    let response = c
        .complete(&transcript, &[], Some("gemini-2.5-pro"))
        .await
        .unwrap();
    assert_eq!(response.content.as_deref(), Some("Hello there"));
}

#[tokio::test]
async fn server_errors_propagate() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("x".repeat(500)))
        .mount(&server)
        .await;

    let c = client(&server.uri());
    let err = c
        .complete(&Transcript::from(vec![Turn::user("hi")]), &[], None)
        .await
        .unwrap_err();
    match err {
        ProviderError::Api { status, body } => {
            assert_eq!(status, 503);
            assert_eq!(body.len(), 200);
        }
        other => panic!("expected API error, got {other:?}"),
    }
}
