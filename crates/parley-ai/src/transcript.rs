//! Conversation transcript: an ordered, append-only list of turns.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// A tool invocation requested by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRequest {
    pub id: String,
    pub tool_name: String,
    #[serde(default)]
    pub arguments: Map<String, Value>,
}

impl ToolCallRequest {
    pub fn new(
        id: impl Into<String>,
        tool_name: impl Into<String>,
        arguments: Map<String, Value>,
    ) -> Self {
        Self {
            id: id.into(),
            tool_name: tool_name.into(),
            arguments,
        }
    }
}

/// Normalize wire-level tool arguments into a key/value record.
///
/// Backends send either an object or a JSON-encoded string of one. Anything
/// that does not end up as an object becomes an empty record.
pub fn normalize_arguments(tool_name: &str, raw: Value) -> Map<String, Value> {
    let value = match raw {
        Value::String(s) if s.trim().is_empty() => return Map::new(),
        Value::String(s) => match serde_json::from_str::<Value>(&s) {
            Ok(v) => v,
            Err(e) => {
                warn!(tool = %tool_name, error = %e, "Unparseable tool arguments, using empty set");
                return Map::new();
            }
        },
        other => other,
    };
    match value {
        Value::Object(map) => map,
        Value::Null => Map::new(),
        other => {
            warn!(
                tool = %tool_name,
                kind = %json_kind(&other),
                "Tool arguments are not an object, using empty set"
            );
            Map::new()
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// One message in the conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCallRequest>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    /// Tool name on `tool` turns.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Set on `tool` turns whose execution failed.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_error: bool,
}

impl Turn {
    fn plain(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: Some(content.into()),
            tool_calls: Vec::new(),
            tool_call_id: None,
            name: None,
            is_error: false,
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::plain(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::plain(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::plain(Role::Assistant, content)
    }

    /// Assistant turn carrying tool-call requests, in the order the model issued them.
    pub fn assistant_tool_calls(content: Option<String>, tool_calls: Vec<ToolCallRequest>) -> Self {
        Self {
            role: Role::Assistant,
            content,
            tool_calls,
            tool_call_id: None,
            name: None,
            is_error: false,
        }
    }

    pub fn tool_result(
        tool_call_id: impl Into<String>,
        name: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            role: Role::Tool,
            content: Some(content.into()),
            tool_calls: Vec::new(),
            tool_call_id: Some(tool_call_id.into()),
            name: Some(name.into()),
            is_error: false,
        }
    }

    /// Tool turn reporting a failed execution.
    pub fn tool_error(
        tool_call_id: impl Into<String>,
        name: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            is_error: true,
            ..Self::tool_result(tool_call_id, name, content)
        }
    }

    /// Content as a string slice, empty when absent.
    pub fn text(&self) -> &str {
        self.content.as_deref().unwrap_or("")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TranscriptError {
    #[error("turn {index}: tool turn has no tool_call_id")]
    MissingToolCallId { index: usize },
    #[error("turn {index}: tool_call_id '{id}' does not match a pending request")]
    UnmatchedToolCallId { index: usize, id: String },
    #[error("turn {index}: {role:?} turn must not carry tool calls")]
    UnexpectedToolCalls { index: usize, role: Role },
    #[error("turn {index}: duplicate tool call id '{id}'")]
    DuplicateToolCallId { index: usize, id: String },
}

/// Ordered conversation history.
///
/// Only appends are exposed; a caller may keep the transcript after an
/// orchestration and use it as the seed for the next one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_system(prompt: impl Into<String>) -> Self {
        let mut transcript = Self::new();
        transcript.push(Turn::system(prompt));
        transcript
    }

    pub fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.push(Turn::user(content));
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.push(Turn::assistant(content));
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    /// Every system turn, joined by blank lines, for backends that carry
    /// the system prompt out of band.
    pub fn system_prompt(&self) -> Option<String> {
        let parts: Vec<&str> = self
            .turns
            .iter()
            .filter(|t| t.role == Role::System)
            .map(Turn::text)
            .filter(|text| !text.trim().is_empty())
            .collect();
        (!parts.is_empty()).then(|| parts.join("\n\n"))
    }

    /// Whether any assistant turn requested tools.
    pub fn has_tool_traffic(&self) -> bool {
        self.turns
            .iter()
            .any(|t| !t.tool_calls.is_empty() || t.role == Role::Tool)
    }

    /// Tool name of the request a `tool_call_id` answers.
    pub fn tool_name_for(&self, tool_call_id: &str) -> Option<&str> {
        self.turns
            .iter()
            .flat_map(|t| t.tool_calls.iter())
            .find(|c| c.id == tool_call_id)
            .map(|c| c.tool_name.as_str())
    }

    /// Check that every tool turn answers exactly one request of the
    /// assistant turn before it, and that request ids are unique.
    pub fn validate(&self) -> Result<(), TranscriptError> {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut pending: HashSet<&str> = HashSet::new();

        for (index, turn) in self.turns.iter().enumerate() {
            match turn.role {
                Role::Assistant => {
                    // A new assistant turn closes the previous request set.
                    pending.clear();
                    for call in &turn.tool_calls {
                        if !seen.insert(call.id.as_str()) {
                            return Err(TranscriptError::DuplicateToolCallId {
                                index,
                                id: call.id.clone(),
                            });
                        }
                        pending.insert(call.id.as_str());
                    }
                }
                Role::Tool => {
                    let id = turn
                        .tool_call_id
                        .as_deref()
                        .ok_or(TranscriptError::MissingToolCallId { index })?;
                    if !pending.remove(id) {
                        return Err(TranscriptError::UnmatchedToolCallId {
                            index,
                            id: id.to_string(),
                        });
                    }
                }
                role @ (Role::System | Role::User) => {
                    if !turn.tool_calls.is_empty() {
                        return Err(TranscriptError::UnexpectedToolCalls { index, role });
                    }
                }
            }
        }
        Ok(())
    }
}

impl From<Vec<Turn>> for Transcript {
    fn from(turns: Vec<Turn>) -> Self {
        Self { turns }
    }
}

impl<'a> IntoIterator for &'a Transcript {
    type Item = &'a Turn;
    type IntoIter = std::slice::Iter<'a, Turn>;

    fn into_iter(self) -> Self::IntoIter {
        self.turns.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn call(id: &str) -> ToolCallRequest {
        ToolCallRequest::new(id, "search_users", Map::new())
    }

    #[test]
    fn deserializes_plain_role_content_pairs() {
        let transcript: Transcript = serde_json::from_value(json!([
            {"role": "system", "content": "be brief"},
            {"role": "user", "content": "Find all admin users"}
        ]))
        .unwrap();
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript.turns()[1].role, Role::User);
        assert_eq!(transcript.system_prompt().as_deref(), Some("be brief"));
        assert!(transcript.validate().is_ok());
    }

    #[test]
    fn later_system_turns_join_the_prompt() {
        let mut transcript = Transcript::with_system("You search users.");
        transcript.push_user("hi");
        transcript.push(Turn::system("Answer in French."));
        transcript.push(Turn::system("  "));
        assert_eq!(
            transcript.system_prompt().as_deref(),
            Some("You search users.\n\nAnswer in French.")
        );
        assert!(Transcript::new().system_prompt().is_none());
    }

    #[test]
    fn tool_turns_must_answer_pending_requests() {
        let mut transcript = Transcript::new();
        transcript.push_user("hi");
        transcript.push(Turn::assistant_tool_calls(None, vec![call("a"), call("b")]));
        transcript.push(Turn::tool_result("a", "search_users", "{}"));
        transcript.push(Turn::tool_result("b", "search_users", "{}"));
        assert!(transcript.validate().is_ok());
        assert_eq!(transcript.tool_name_for("b"), Some("search_users"));

        transcript.push(Turn::tool_result("a", "search_users", "{}"));
        assert_eq!(
            transcript.validate(),
            Err(TranscriptError::UnmatchedToolCallId {
                index: 4,
                id: "a".into()
            })
        );
    }

    #[test]
    fn tool_turn_after_next_assistant_turn_is_rejected() {
        let transcript = Transcript::from(vec![
            Turn::assistant_tool_calls(None, vec![call("a")]),
            Turn::assistant("done"),
            Turn::tool_result("a", "search_users", "{}"),
        ]);
        assert!(matches!(
            transcript.validate(),
            Err(TranscriptError::UnmatchedToolCallId { index: 2, .. })
        ));
    }

    #[test]
    fn missing_and_duplicate_ids_are_rejected() {
        let mut orphan = Turn::tool_result("x", "search_users", "{}");
        orphan.tool_call_id = None;
        let transcript = Transcript::from(vec![orphan]);
        assert_eq!(
            transcript.validate(),
            Err(TranscriptError::MissingToolCallId { index: 0 })
        );

        let transcript = Transcript::from(vec![
            Turn::assistant_tool_calls(None, vec![call("a")]),
            Turn::tool_result("a", "search_users", "{}"),
            Turn::assistant_tool_calls(None, vec![call("a")]),
        ]);
        assert!(matches!(
            transcript.validate(),
            Err(TranscriptError::DuplicateToolCallId { index: 2, .. })
        ));
    }

    #[test]
    fn user_turn_with_tool_calls_is_rejected() {
        let mut turn = Turn::user("hi");
        turn.tool_calls.push(call("a"));
        let transcript = Transcript::from(vec![turn]);
        assert!(matches!(
            transcript.validate(),
            Err(TranscriptError::UnexpectedToolCalls {
                role: Role::User,
                ..
            })
        ));
    }

    #[test]
    fn arguments_normalize_from_strings_and_objects() {
        let parsed = normalize_arguments("t", json!(r#"{"role":"admin","limit":5}"#));
        assert_eq!(parsed["role"], "admin");
        assert_eq!(parsed["limit"], 5);

        let object = normalize_arguments("t", json!({"query": "alice"}));
        assert_eq!(object["query"], "alice");

        assert!(normalize_arguments("t", json!("not json")).is_empty());
        assert!(normalize_arguments("t", json!("")).is_empty());
        assert!(normalize_arguments("t", json!([1, 2])).is_empty());
        assert!(normalize_arguments("t", Value::Null).is_empty());
    }

    #[test]
    fn tool_traffic_detection() {
        let mut transcript = Transcript::with_system("sys");
        transcript.push_user("hello");
        transcript.push_assistant("hi there");
        assert!(!transcript.has_tool_traffic());

        transcript.push(Turn::assistant_tool_calls(None, vec![call("a")]));
        assert!(transcript.has_tool_traffic());
    }
}
