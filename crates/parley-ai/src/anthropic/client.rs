//! Anthropic client struct, request building, and response parsing.

use parley_common::new_tool_call_id;
use serde_json::{json, Value};

use crate::http::{build_http_client, join_url};
use crate::tools::to_anthropic_tool;
use crate::transcript::normalize_arguments;
use crate::{
    FinishReason, ProviderError, ProviderResponse, Role, TokenUsage, ToolCallRequest, ToolSpec,
    Transcript, Turn,
};

use super::config::AnthropicConfig;

pub(crate) const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Anthropic Messages API client.
pub struct AnthropicClient {
    pub(crate) config: AnthropicConfig,
    pub(crate) http: reqwest::Client,
}

impl AnthropicClient {
    pub fn new(config: AnthropicConfig) -> Result<Self, ProviderError> {
        let http = build_http_client(config.connect_timeout, config.request_timeout)?;
        Ok(Self { config, http })
    }

    pub fn config(&self) -> &AnthropicConfig {
        &self.config
    }

    pub(crate) fn api_url(&self) -> String {
        join_url(&self.config.base_url, "messages")
    }

    /// Build the JSON request body for the Messages API.
    ///
    /// Tool blocks are only legal when tools are declared, so a request
    /// without tools renders earlier tool traffic as plain text.
    pub(crate) fn build_request_body(
        &self,
        transcript: &Transcript,
        tools: &[ToolSpec],
        model: &str,
    ) -> Value {
        let native_tools = !tools.is_empty();
        let mut msgs: Vec<Value> = Vec::new();
        // Results of consecutive tool turns go out as one user message.
        let mut results: Vec<Value> = Vec::new();

        for turn in transcript {
            if turn.role == Role::Tool {
                results.push(tool_result_block(transcript, turn, native_tools));
                continue;
            }
            flush_results(&mut msgs, &mut results);
            match turn.role {
                // System is a top-level field in the Messages API.
                Role::System | Role::Tool => {}
                Role::User => msgs.push(json!({ "role": "user", "content": turn.text() })),
                Role::Assistant if turn.tool_calls.is_empty() => {
                    msgs.push(json!({ "role": "assistant", "content": turn.text() }))
                }
                Role::Assistant if native_tools => msgs.push(json!({
                    "role": "assistant",
                    "content": tool_use_blocks(turn),
                })),
                Role::Assistant => msgs.push(json!({
                    "role": "assistant",
                    "content": tool_calls_as_text(turn),
                })),
            }
        }
        flush_results(&mut msgs, &mut results);

        let mut body = json!({
            "model": model,
            "max_tokens": self.config.max_tokens,
            "temperature": self.config.temperature,
            "messages": msgs,
        });

        if let Some(system) = transcript.system_prompt() {
            body["system"] = json!(system);
        }

        if native_tools {
            let tool_defs: Vec<Value> = tools.iter().map(to_anthropic_tool).collect();
            body["tools"] = json!(tool_defs);
        }

        body
    }

    pub(crate) fn parse_response(&self, json: Value) -> Result<ProviderResponse, ProviderError> {
        let blocks = json["content"]
            .as_array()
            .ok_or_else(|| ProviderError::Parse("no content blocks in response".to_string()))?;

        let text: String = blocks
            .iter()
            .filter(|b| b["type"] == "text")
            .filter_map(|b| b["text"].as_str())
            .collect();

        let tool_calls = blocks
            .iter()
            .filter(|b| b["type"] == "tool_use")
            .filter_map(|b| {
                let name = b["name"].as_str().filter(|n| !n.is_empty())?;
                let id = b["id"]
                    .as_str()
                    .filter(|id| !id.is_empty())
                    .map(String::from)
                    .unwrap_or_else(new_tool_call_id);
                Some(ToolCallRequest::new(
                    id,
                    name,
                    normalize_arguments(name, b["input"].clone()),
                ))
            })
            .collect();

        let finish_reason = match json["stop_reason"].as_str() {
            Some("max_tokens") => FinishReason::Length,
            Some("refusal") => FinishReason::Error,
            _ => FinishReason::Stop,
        };

        let usage = TokenUsage {
            input_tokens: json["usage"]["input_tokens"].as_u64().unwrap_or(0),
            output_tokens: json["usage"]["output_tokens"].as_u64().unwrap_or(0),
        };

        Ok(ProviderResponse {
            content: (!text.is_empty()).then_some(text),
            tool_calls,
            finish_reason,
            usage,
        })
    }
}

fn flush_results(msgs: &mut Vec<Value>, results: &mut Vec<Value>) {
    if results.is_empty() {
        return;
    }
    let blocks = std::mem::take(results);
    if blocks.iter().all(Value::is_string) {
        let text: Vec<&str> = blocks.iter().filter_map(Value::as_str).collect();
        msgs.push(json!({ "role": "user", "content": text.join("\n\n") }));
    } else {
        msgs.push(json!({ "role": "user", "content": blocks }));
    }
}

fn tool_use_blocks(turn: &Turn) -> Vec<Value> {
    let mut blocks = Vec::new();
    if !turn.text().is_empty() {
        blocks.push(json!({ "type": "text", "text": turn.text() }));
    }
    for call in &turn.tool_calls {
        blocks.push(json!({
            "type": "tool_use",
            "id": call.id,
            "name": call.tool_name,
            "input": call.arguments,
        }));
    }
    blocks
}

fn tool_calls_as_text(turn: &Turn) -> String {
    let mut lines = Vec::new();
    if !turn.text().is_empty() {
        lines.push(turn.text().to_string());
    }
    for call in &turn.tool_calls {
        lines.push(format!(
            "[Tool Call: {}] {}",
            call.tool_name,
            Value::Object(call.arguments.clone())
        ));
    }
    lines.join("\n")
}

/// A `tool_result` block, or a plain string in text mode.
fn tool_result_block(transcript: &Transcript, turn: &Turn, native: bool) -> Value {
    let id = turn.tool_call_id.as_deref().unwrap_or_default();
    if native {
        let mut block = json!({
            "type": "tool_result",
            "tool_use_id": id,
            "content": turn.text(),
        });
        if turn.is_error {
            block["is_error"] = json!(true);
        }
        return block;
    }
    let name = turn
        .name
        .as_deref()
        .or_else(|| transcript.tool_name_for(id))
        .unwrap_or("unknown");
    Value::String(format!("[Tool Result: {name}]\n{}", turn.text()))
}
