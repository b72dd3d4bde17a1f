//! Orchestrator result, options and error types.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{FinishReason, Role, TokenUsage, TranscriptError};

pub const DEFAULT_FALLBACK_TEXT: &str = "I apologize, but I couldn't generate a proper response.";

/// Errors that end an orchestration before any completion is attempted.
/// Everything else is reported through `ChatResult::finish_reason`.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("No LLM provider configured. Set GEMINI_API_KEY, OPENAI_API_KEY or ANTHROPIC_API_KEY.")]
    NoProviderConfigured,
    #[error("Invalid transcript: {0}")]
    InvalidTranscript(#[from] TranscriptError),
}

/// What the caller gets back from one orchestration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResult {
    pub content: String,
    pub role: Role,
    /// True iff at least one tool was invoked.
    pub tool_called: bool,
    pub finish_reason: FinishReason,
    /// Summed over every completion of this orchestration.
    #[serde(default)]
    pub usage: TokenUsage,
}

#[derive(Debug, Clone)]
pub struct OrchestratorOptions {
    /// Replaces a missing or blank final reply.
    pub fallback_text: String,
    /// Per-tool deadline; `None` waits indefinitely.
    pub tool_timeout: Option<Duration>,
    /// Run the tool calls of one model turn concurrently.
    pub parallel_tool_calls: bool,
}

impl Default for OrchestratorOptions {
    fn default() -> Self {
        Self {
            fallback_text: DEFAULT_FALLBACK_TEXT.to_string(),
            tool_timeout: Some(Duration::from_secs(30)),
            parallel_tool_calls: false,
        }
    }
}

/// Orchestration state, traced on every transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Init,
    AwaitingFirstCompletion,
    ToolsRequested,
    ExecutingTools,
    AwaitingFollowupCompletion,
    Done,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Phase::Init => "init",
            Phase::AwaitingFirstCompletion => "awaiting_first_completion",
            Phase::ToolsRequested => "tools_requested",
            Phase::ExecutingTools => "executing_tools",
            Phase::AwaitingFollowupCompletion => "awaiting_followup_completion",
            Phase::Done => "done",
        };
        f.write_str(s)
    }
}
