//! Tool-calling chat orchestration for Parley.
//!
//! Provides OpenAI, Gemini and Anthropic adapters behind one
//! `ChatProvider` contract, plus:
//! - A conversation `Transcript` shared by the orchestrator and adapters
//! - A `ToolRegistry` of externally registered tools
//! - The two-phase `Orchestrator` (completion → tools → follow-up)
//! - Bounded retries and preference-ordered provider selection

pub mod anthropic;
pub mod gemini;
pub(crate) mod http;
pub mod openai;
pub mod orchestrator;
pub mod retry;
pub mod router;
pub mod tools;
pub mod transcript;

use async_trait::async_trait;

pub use anthropic::{AnthropicClient, AnthropicConfig};
pub use gemini::{GeminiClient, GeminiConfig};
pub use openai::{OpenAiClient, OpenAiConfig};
pub use orchestrator::{
    ChatError, ChatResult, Orchestrator, OrchestratorOptions, Phase, DEFAULT_FALLBACK_TEXT,
};
pub use retry::{RetryPolicy, RetryingProvider};
pub use router::{Provider, ProviderRouter, UnknownProvider};
pub use tokio_util::sync::CancellationToken;
pub use tools::{
    fn_tool, FnTool, ParamType, ParameterSpec, Tool, ToolCallResult, ToolError, ToolHandler,
    ToolRegistry, ToolSpec,
};
pub use transcript::{Role, ToolCallRequest, Transcript, TranscriptError, Turn};

/// One LLM backend.
///
/// Implementations translate the transcript and tool specs into their wire
/// format, perform a single completion call and decode the reply. They never
/// mutate the transcript and never turn a failure into a made-up reply.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Short backend name used in logs (`openai`, `gemini`, `anthropic`).
    fn name(&self) -> &str;

    /// Model used when the caller does not pass a hint.
    fn default_model(&self) -> &str;

    async fn complete(
        &self,
        transcript: &Transcript,
        tools: &[ToolSpec],
        model: Option<&str>,
    ) -> Result<ProviderResponse, ProviderError>;
}

/// Why a completion (or a whole orchestration) ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    Stop,
    Length,
    Error,
    ToolError,
}

impl std::fmt::Display for FinishReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FinishReason::Stop => "stop",
            FinishReason::Length => "length",
            FinishReason::Error => "error",
            FinishReason::ToolError => "tool_error",
        };
        f.write_str(s)
    }
}

/// Normalized reply of one `ChatProvider::complete` call.
#[derive(Debug, Clone)]
pub struct ProviderResponse {
    pub content: Option<String>,
    pub tool_calls: Vec<ToolCallRequest>,
    pub finish_reason: FinishReason,
    pub usage: TokenUsage,
}

impl ProviderResponse {
    /// Plain-text reply with no tool calls.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            tool_calls: Vec::new(),
            finish_reason: FinishReason::Stop,
            usage: TokenUsage::default(),
        }
    }

    /// Reply that only requests tool calls.
    pub fn tool_calls(tool_calls: Vec<ToolCallRequest>) -> Self {
        Self {
            content: None,
            tool_calls,
            finish_reason: FinishReason::Stop,
            usage: TokenUsage::default(),
        }
    }

    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl TokenUsage {
    pub fn total_tokens(&self) -> u64 {
        self.input_tokens.saturating_add(self.output_tokens)
    }

    pub fn add(&mut self, other: &TokenUsage) {
        self.input_tokens = self.input_tokens.saturating_add(other.input_tokens);
        self.output_tokens = self.output_tokens.saturating_add(other.output_tokens);
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("API error: HTTP {status}: {body}")]
    Api { status: u16, body: String },
    #[error("Rate limited")]
    RateLimited,
    #[error("Network error: {0}")]
    Network(String),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Timeout")]
    Timeout,
}

impl ProviderError {
    /// Whether a bounded retry may help.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ProviderError::RateLimited | ProviderError::Network(_) | ProviderError::Timeout
        )
    }
}
