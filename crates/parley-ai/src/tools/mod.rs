//! Tools the model can call.
//!
//! A tool is a `ToolSpec` (name, description, typed parameters) plus a
//! `ToolHandler`. Specs are rendered into each backend's declaration shape
//! by the `to_*_tool` converters.

mod definitions;
mod registry;

pub use definitions::{
    to_anthropic_tool, to_gemini_tool, to_openai_tool, ParamType, ParameterSpec, ToolSpec,
};
pub use registry::{fn_tool, FnTool, Tool, ToolHandler, ToolRegistry};

use std::time::Duration;

use serde_json::{json, Value};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    Unknown(String),
    #[error("Tool already registered: {0}")]
    Duplicate(String),
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),
    #[error("Execution failed: {0}")]
    Execution(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Tool timed out after {0:?}")]
    Timeout(Duration),
}

/// Outcome of one tool call, as recorded in the transcript.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCallResult {
    pub tool_call_id: String,
    pub payload: Value,
    /// Present iff execution failed.
    pub error: Option<String>,
}

impl ToolCallResult {
    pub fn ok(tool_call_id: impl Into<String>, payload: Value) -> Self {
        Self {
            tool_call_id: tool_call_id.into(),
            payload,
            error: None,
        }
    }

    pub fn failed(tool_call_id: impl Into<String>, error: &ToolError) -> Self {
        let message = error.to_string();
        Self {
            tool_call_id: tool_call_id.into(),
            payload: json!({ "error": message }),
            error: Some(message),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Text stored as the `tool` turn content.
    pub fn transcript_content(&self) -> String {
        self.payload.to_string()
    }
}
