//! OpenAI client struct, request building, and response parsing.

use parley_common::new_tool_call_id;
use serde_json::{json, Value};

use crate::http::{build_http_client, join_url};
use crate::tools::to_openai_tool;
use crate::transcript::normalize_arguments;
use crate::{
    FinishReason, ProviderError, ProviderResponse, Role, TokenUsage, ToolCallRequest, ToolSpec,
    Transcript, Turn,
};

use super::config::OpenAiConfig;

pub struct OpenAiClient {
    pub(crate) config: OpenAiConfig,
    pub(crate) http: reqwest::Client,
}

impl OpenAiClient {
    pub fn new(config: OpenAiConfig) -> Result<Self, ProviderError> {
        let http = build_http_client(config.connect_timeout, config.request_timeout)?;
        Ok(Self { config, http })
    }

    pub fn config(&self) -> &OpenAiConfig {
        &self.config
    }

    pub(crate) fn api_url(&self) -> String {
        join_url(&self.config.base_url, "chat/completions")
    }

    pub(crate) fn build_request_body(
        &self,
        transcript: &Transcript,
        tools: &[ToolSpec],
        model: &str,
    ) -> Value {
        let messages: Vec<Value> = transcript.turns().iter().map(encode_turn).collect();

        let mut body = json!({
            "model": model,
            "messages": messages,
            "max_tokens": self.config.max_tokens,
            "temperature": self.config.temperature,
        });

        if !tools.is_empty() {
            let defs: Vec<Value> = tools.iter().map(to_openai_tool).collect();
            body["tools"] = json!(defs);
            body["tool_choice"] = json!("auto");
        }

        body
    }

    pub(crate) fn parse_response(&self, json: Value) -> Result<ProviderResponse, ProviderError> {
        let choice = json["choices"]
            .as_array()
            .and_then(|choices| choices.first())
            .ok_or_else(|| ProviderError::Parse("no choices in response".to_string()))?;
        let message = &choice["message"];

        let content = message["content"]
            .as_str()
            .filter(|s| !s.is_empty())
            .map(String::from);

        let tool_calls = message["tool_calls"]
            .as_array()
            .map(|calls| calls.iter().filter_map(decode_tool_call).collect())
            .unwrap_or_default();

        let finish_reason = match choice["finish_reason"].as_str() {
            Some("length") => FinishReason::Length,
            Some("content_filter") => FinishReason::Error,
            _ => FinishReason::Stop,
        };

        let usage = TokenUsage {
            input_tokens: json["usage"]["prompt_tokens"].as_u64().unwrap_or(0),
            output_tokens: json["usage"]["completion_tokens"].as_u64().unwrap_or(0),
        };

        Ok(ProviderResponse {
            content,
            tool_calls,
            finish_reason,
            usage,
        })
    }
}

fn encode_turn(turn: &Turn) -> Value {
    match turn.role {
        Role::System => json!({ "role": "system", "content": turn.text() }),
        Role::User => json!({ "role": "user", "content": turn.text() }),
        Role::Assistant if turn.tool_calls.is_empty() => {
            json!({ "role": "assistant", "content": turn.text() })
        }
        Role::Assistant => {
            let calls: Vec<Value> = turn
                .tool_calls
                .iter()
                .map(|call| {
                    json!({
                        "id": call.id,
                        "type": "function",
                        "function": {
                            "name": call.tool_name,
                            // Arguments travel as a JSON-encoded string.
                            "arguments": Value::Object(call.arguments.clone()).to_string(),
                        }
                    })
                })
                .collect();
            json!({
                "role": "assistant",
                "content": turn.content,
                "tool_calls": calls,
            })
        }
        Role::Tool => json!({
            "role": "tool",
            "tool_call_id": turn.tool_call_id,
            "content": turn.text(),
        }),
    }
}

fn decode_tool_call(call: &Value) -> Option<ToolCallRequest> {
    let function = call.get("function")?;
    let name = function["name"].as_str().filter(|n| !n.is_empty())?;
    let id = call["id"]
        .as_str()
        .filter(|id| !id.is_empty())
        .map(String::from)
        .unwrap_or_else(new_tool_call_id);
    let arguments = normalize_arguments(name, function["arguments"].clone());
    Some(ToolCallRequest::new(id, name, arguments))
}
