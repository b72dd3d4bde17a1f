//! Gemini API client struct, request building, and response parsing.

use parley_common::new_tool_call_id;
use serde_json::{json, Value};

use crate::http::{build_http_client, join_url};
use crate::tools::to_gemini_tool;
use crate::transcript::normalize_arguments;
use crate::{
    FinishReason, ProviderError, ProviderResponse, Role, TokenUsage, ToolCallRequest, ToolSpec,
    Transcript, Turn,
};

use super::config::GeminiConfig;

/// Gemini API client.
pub struct GeminiClient {
    pub(crate) config: GeminiConfig,
    pub(crate) http: reqwest::Client,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Result<Self, ProviderError> {
        let http = build_http_client(config.connect_timeout, config.request_timeout)?;
        Ok(Self { config, http })
    }

    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }

    pub(crate) fn api_url(&self, model: &str) -> String {
        join_url(
            &self.config.base_url,
            &format!("models/{model}:generateContent"),
        )
    }

    /// Build the JSON request body for `generateContent`.
    pub(crate) fn build_request_body(&self, transcript: &Transcript, tools: &[ToolSpec]) -> Value {
        let mut contents: Vec<Value> = Vec::new();
        // functionResponse parts of consecutive tool turns, flushed as one user content.
        let mut responses: Vec<Value> = Vec::new();

        for turn in transcript {
            if turn.role == Role::Tool {
                responses.push(function_response_part(transcript, turn));
                continue;
            }
            if !responses.is_empty() {
                contents.push(json!({ "role": "user", "parts": std::mem::take(&mut responses) }));
            }
            match turn.role {
                Role::System | Role::Tool => {}
                Role::User => contents.push(json!({
                    "role": "user",
                    "parts": [{ "text": turn.text() }]
                })),
                Role::Assistant => contents.push(json!({
                    "role": "model",
                    "parts": model_parts(turn),
                })),
            }
        }
        if !responses.is_empty() {
            contents.push(json!({ "role": "user", "parts": responses }));
        }

        let mut body = json!({
            "contents": contents,
            "generationConfig": {
                "maxOutputTokens": self.config.max_tokens,
                "temperature": self.config.temperature,
            }
        });

        if let Some(system) = transcript.system_prompt() {
            body["systemInstruction"] = json!({ "parts": [{ "text": system }] });
        }

        if !tools.is_empty() {
            let tool_defs: Vec<Value> = tools.iter().map(to_gemini_tool).collect();
            body["tools"] = json!([{ "functionDeclarations": tool_defs }]);
        }

        body
    }

    /// Parse a Gemini response.
    pub(crate) fn parse_response(&self, json: Value) -> Result<ProviderResponse, ProviderError> {
        let first = json["candidates"]
            .as_array()
            .and_then(|c| c.first())
            .ok_or_else(|| match json["promptFeedback"]["blockReason"].as_str() {
                Some(reason) => ProviderError::Parse(format!("prompt blocked: {reason}")),
                None => ProviderError::Parse("no candidates in response".to_string()),
            })?;

        let mut text = String::new();
        let mut tool_calls = Vec::new();

        for part in first["content"]["parts"].as_array().into_iter().flatten() {
            if let Some(t) = part["text"].as_str() {
                text.push_str(t);
            }
            if let Some(fc) = part.get("functionCall") {
                let Some(name) = fc["name"].as_str().filter(|n| !n.is_empty()) else {
                    continue;
                };
                // Gemini function calls carry no id.
                tool_calls.push(ToolCallRequest::new(
                    new_tool_call_id(),
                    name,
                    normalize_arguments(name, fc["args"].clone()),
                ));
            }
        }

        let finish_reason = match first["finishReason"].as_str() {
            Some("MAX_TOKENS") => FinishReason::Length,
            Some(
                "SAFETY" | "RECITATION" | "BLOCKLIST" | "PROHIBITED_CONTENT" | "SPII"
                | "MALFORMED_FUNCTION_CALL",
            ) => FinishReason::Error,
            _ => FinishReason::Stop,
        };

        let usage = TokenUsage {
            input_tokens: json["usageMetadata"]["promptTokenCount"]
                .as_u64()
                .unwrap_or(0),
            output_tokens: json["usageMetadata"]["candidatesTokenCount"]
                .as_u64()
                .unwrap_or(0),
        };

        Ok(ProviderResponse {
            content: (!text.is_empty()).then_some(text),
            tool_calls,
            finish_reason,
            usage,
        })
    }
}

fn model_parts(turn: &Turn) -> Vec<Value> {
    let mut parts = Vec::new();
    if !turn.text().is_empty() || turn.tool_calls.is_empty() {
        parts.push(json!({ "text": turn.text() }));
    }
    for call in &turn.tool_calls {
        parts.push(json!({
            "functionCall": { "name": call.tool_name, "args": call.arguments }
        }));
    }
    parts
}

fn function_response_part(transcript: &Transcript, turn: &Turn) -> Value {
    let name = turn
        .name
        .as_deref()
        .or_else(|| {
            turn.tool_call_id
                .as_deref()
                .and_then(|id| transcript.tool_name_for(id))
        })
        .unwrap_or("unknown");
    let payload = serde_json::from_str::<Value>(turn.text())
        .unwrap_or_else(|_| Value::String(turn.text().to_string()));
    json!({
        "functionResponse": {
            "name": name,
            "response": { "result": payload }
        }
    })
}
