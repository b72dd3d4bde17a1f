use serde_json::{json, Map};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::*;
use crate::{ChatProvider, FinishReason, ToolCallRequest, ToolSpec, Transcript, Turn};

fn client(base_url: &str) -> AnthropicClient {
    AnthropicClient::new(AnthropicConfig::new("ak-test").with_base_url(base_url)).unwrap()
}

fn tool_transcript() -> Transcript {
    let mut args = Map::new();
    args.insert("role".into(), json!("admin"));
    Transcript::from(vec![
        Turn::system("You help with user lookups"),
        Turn::user("Find all admin users"),
        Turn::assistant_tool_calls(
            Some("Let me look.".into()),
            vec![
                ToolCallRequest::new("toolu_1", "search_users", args),
                ToolCallRequest::new("toolu_2", "search_users", Map::new()),
            ],
        ),
        Turn::tool_result("toolu_1", "search_users", r#"{"total":2}"#),
        Turn::tool_error("toolu_2", "search_users", r#"{"error":"Execution failed: offline"}"#),
    ])
}

#[test]
fn native_mode_uses_tool_blocks() {
    let c = client("http://unused");
    let body = c.build_request_body(
        &tool_transcript(),
        &[ToolSpec::new("search_users", "Search")],
        "claude-test",
    );

    assert_eq!(body["system"], "You help with user lookups");
    let msgs = body["messages"].as_array().unwrap();
    assert_eq!(msgs.len(), 3);
    assert_eq!(msgs[1]["content"][0]["type"], "text");
    assert_eq!(msgs[1]["content"][1]["type"], "tool_use");
    assert_eq!(msgs[1]["content"][1]["input"]["role"], "admin");

    let results = msgs[2]["content"].as_array().unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["type"], "tool_result");
    assert!(results[0].get("is_error").is_none());
    assert_eq!(results[1]["tool_use_id"], "toolu_2");
    assert_eq!(results[1]["is_error"], true);
    assert_eq!(body["tools"][0]["input_schema"]["type"], "object");
}

#[test]
fn follow_up_without_tools_renders_traffic_as_text() {
    let c = client("http://unused");
    let body = c.build_request_body(&tool_transcript(), &[], "claude-test");

    assert!(body.get("tools").is_none());
    let msgs = body["messages"].as_array().unwrap();
    assert_eq!(msgs.len(), 3);
    let call_text = msgs[1]["content"].as_str().unwrap();
    assert!(call_text.starts_with("Let me look."));
    assert!(call_text.contains(r#"[Tool Call: search_users] {"role":"admin"}"#));

    let result_text = msgs[2]["content"].as_str().unwrap();
    assert_eq!(
        result_text,
        "[Tool Result: search_users]\n{\"total\":2}\n\n\
         [Tool Result: search_users]\n{\"error\":\"Execution failed: offline\"}"
    );
}

#[test]
fn every_system_turn_reaches_the_system_field() {
    let c = client("http://unused");
    let transcript = Transcript::from(vec![
        Turn::system("You help with user lookups"),
        Turn::user("hi"),
        Turn::system("Keep answers short."),
    ]);
    let body = c.build_request_body(&transcript, &[], "claude-test");

    assert_eq!(
        body["system"],
        "You help with user lookups\n\nKeep answers short."
    );
    assert_eq!(body["messages"].as_array().unwrap().len(), 1);
}

#[test]
fn parses_text_and_tool_use_blocks() {
    let c = client("http://unused");
    let response = c
        .parse_response(json!({
            "content": [
                {"type": "text", "text": "Searching."},
                {
                    "type": "tool_use",
                    "id": "toolu_9",
                    "name": "search_users",
                    "input": {"query": "alice"}
                }
            ],
            "stop_reason": "tool_use",
            "usage": {"input_tokens": 30, "output_tokens": 12}
        }))
        .unwrap();

    assert_eq!(response.content.as_deref(), Some("Searching."));
    assert_eq!(response.tool_calls[0].id, "toolu_9");
    assert_eq!(response.tool_calls[0].arguments["query"], "alice");
    assert_eq!(response.finish_reason, FinishReason::Stop);
    assert_eq!(response.usage.output_tokens, 12);

    let truncated = c
        .parse_response(json!({
            "content": [{"type": "text", "text": "partial"}],
            "stop_reason": "max_tokens"
        }))
        .unwrap();
    assert_eq!(truncated.finish_reason, FinishReason::Length);
}

#[tokio::test]
async fn complete_sends_version_and_key_headers() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/messages"))
        .and(header("x-api-key", "ak-test"))
        .and(header("anthropic-version", "2023-06-01"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": [{"type": "text", "text": "Hi!"}],
            "stop_reason": "end_turn"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let c = client(&server.uri());
    let response = c
        .complete(&Transcript::from(vec![Turn::user("hello")]), &[], None)
        .await
        .unwrap();
    assert_eq!(response.content.as_deref(), Some("Hi!"));
    assert_eq!(c.default_model(), "claude-sonnet-4-20250514");
}
