//! The `handle_chat` state machine.

use std::collections::HashSet;
use std::sync::Arc;

use parley_common::new_tool_call_id;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::tools::{ToolCallResult, ToolError};
use crate::{
    ChatProvider, FinishReason, ProviderError, ProviderResponse, Role, TokenUsage,
    ToolCallRequest, ToolSpec, Transcript, Turn,
};

use super::manager::Orchestrator;
use super::types::{ChatError, ChatResult, Phase};

/// Why a provider call produced no response.
enum Interrupted {
    Provider(ProviderError),
    Cancelled,
}

impl Orchestrator {
    /// Run one orchestration over `transcript`, appending the assistant
    /// tool-call turn and the tool turns when the model requests tools.
    ///
    /// Provider failures come back as a `ChatResult` with
    /// `finish_reason = error`; tool failures are written into the
    /// transcript and the model gets to answer them.
    pub async fn handle_chat(
        &self,
        transcript: &mut Transcript,
        model: Option<&str>,
    ) -> Result<ChatResult, ChatError> {
        self.handle_chat_with_cancel(transcript, model, &CancellationToken::new())
            .await
    }

    /// `handle_chat` that stops at the next suspension point once `cancel`
    /// fires. A cancelled orchestration never attempts the follow-up.
    #[tracing::instrument(skip(self, transcript, cancel), fields(turns = transcript.len()))]
    pub async fn handle_chat_with_cancel(
        &self,
        transcript: &mut Transcript,
        model: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<ChatResult, ChatError> {
        let mut phase = Phase::Init;
        let provider = self
            .provider
            .clone()
            .ok_or(ChatError::NoProviderConfigured)?;
        transcript.validate()?;

        let mut usage = TokenUsage::default();
        let specs = self.registry.list_specs();

        advance(&mut phase, Phase::AwaitingFirstCompletion);
        let first = match complete(&provider, transcript, specs, model, cancel).await {
            Ok(response) => response,
            Err(interrupted) => return Ok(self.interrupted(&provider, interrupted, false, usage)),
        };
        usage.add(&first.usage);

        if !first.has_tool_calls() {
            advance(&mut phase, Phase::Done);
            return Ok(self.finish(first.content, first.finish_reason, false, usage));
        }

        advance(&mut phase, Phase::ToolsRequested);
        info!(
            provider = provider.name(),
            count = first.tool_calls.len(),
            "Model requested tools"
        );
        let calls = with_unique_ids(transcript, first.tool_calls);
        transcript.push(Turn::assistant_tool_calls(first.content, calls.clone()));

        advance(&mut phase, Phase::ExecutingTools);
        let (results, cancelled) = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                let err = ToolError::Execution("cancelled".to_string());
                let results: Vec<ToolCallResult> =
                    calls.iter().map(|c| ToolCallResult::failed(&c.id, &err)).collect();
                (results, true)
            }
            results = self.execute_tools(&calls) => (results, false),
        };

        let any_failed = results.iter().any(ToolCallResult::is_error);
        // Answer every request so the transcript stays reusable.
        for (call, result) in calls.iter().zip(&results) {
            let content = result.transcript_content();
            transcript.push(if result.is_error() {
                Turn::tool_error(&result.tool_call_id, &call.tool_name, content)
            } else {
                Turn::tool_result(&result.tool_call_id, &call.tool_name, content)
            });
        }
        if cancelled {
            return Ok(self.interrupted(&provider, Interrupted::Cancelled, true, usage));
        }

        advance(&mut phase, Phase::AwaitingFollowupCompletion);
        let follow_up = match complete(&provider, transcript, &[], model, cancel).await {
            Ok(response) => response,
            Err(interrupted) => return Ok(self.interrupted(&provider, interrupted, true, usage)),
        };
        usage.add(&follow_up.usage);

        let finish_reason = match follow_up.finish_reason {
            FinishReason::Stop if any_failed => FinishReason::ToolError,
            other => other,
        };
        advance(&mut phase, Phase::Done);
        Ok(self.finish(follow_up.content, finish_reason, true, usage))
    }

    fn finish(
        &self,
        content: Option<String>,
        finish_reason: FinishReason,
        tool_called: bool,
        usage: TokenUsage,
    ) -> ChatResult {
        let (content, finish_reason) = match content.filter(|c| !c.trim().is_empty()) {
            Some(text) => (text, finish_reason),
            None => {
                warn!("Provider returned no text, using fallback reply");
                // Keep tool_error so tool failures stay visible.
                let reason = match finish_reason {
                    FinishReason::ToolError => FinishReason::ToolError,
                    _ => FinishReason::Stop,
                };
                (self.options.fallback_text.clone(), reason)
            }
        };
        ChatResult {
            content,
            role: Role::Assistant,
            tool_called,
            finish_reason,
            usage,
        }
    }

    fn interrupted(
        &self,
        provider: &Arc<dyn ChatProvider>,
        interrupted: Interrupted,
        tool_called: bool,
        usage: TokenUsage,
    ) -> ChatResult {
        let content = match interrupted {
            Interrupted::Provider(e) => {
                warn!(provider = provider.name(), error = %e, "Provider call failed");
                format!(
                    "I encountered an error while processing your request: {e}. \
                     Please try rephrasing your question."
                )
            }
            Interrupted::Cancelled => {
                info!(provider = provider.name(), "Orchestration cancelled");
                "The request was cancelled before it completed.".to_string()
            }
        };
        ChatResult {
            content,
            role: Role::Assistant,
            tool_called,
            finish_reason: FinishReason::Error,
            usage,
        }
    }
}

async fn complete(
    provider: &Arc<dyn ChatProvider>,
    transcript: &Transcript,
    tools: &[ToolSpec],
    model: Option<&str>,
    cancel: &CancellationToken,
) -> Result<ProviderResponse, Interrupted> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Interrupted::Cancelled),
        result = provider.complete(transcript, tools, model) => {
            result.map_err(Interrupted::Provider)
        }
    }
}

/// Re-key any request whose id is blank or already used in the transcript
/// or earlier in the same batch.
fn with_unique_ids(
    transcript: &Transcript,
    mut calls: Vec<ToolCallRequest>,
) -> Vec<ToolCallRequest> {
    let mut used: HashSet<String> = transcript
        .turns()
        .iter()
        .flat_map(|t| t.tool_calls.iter())
        .map(|c| c.id.clone())
        .collect();
    for call in &mut calls {
        if call.id.is_empty() || !used.insert(call.id.clone()) {
            let fresh = new_tool_call_id();
            warn!(
                tool = %call.tool_name,
                from = %call.id,
                to = %fresh,
                "Replacing reused tool call id"
            );
            call.id = fresh;
            used.insert(call.id.clone());
        }
    }
    calls
}

fn advance(phase: &mut Phase, next: Phase) {
    debug!(from = %phase, to = %next, "Orchestrator phase");
    *phase = next;
}
