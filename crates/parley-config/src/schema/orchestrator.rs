//! Orchestration behavior.

use serde::{Deserialize, Serialize};

/// `[orchestrator]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Reply used when the backend returns neither text nor tool calls.
    pub fallback_text: String,
    /// Per-tool deadline in seconds; 0 disables it (valid range: 0-3600).
    pub tool_timeout_secs: u32,
    pub parallel_tool_calls: bool,
    /// Seeds every new transcript. Empty means no system turn.
    pub system_prompt: String,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            fallback_text: "I apologize, but I couldn't generate a proper response.".into(),
            tool_timeout_secs: 30,
            parallel_tool_calls: false,
            system_prompt: "You are a helpful assistant that can search for users.".into(),
        }
    }
}
