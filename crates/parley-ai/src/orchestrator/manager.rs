//! Orchestrator struct and tool execution.

use std::sync::Arc;

use futures_util::future::join_all;
use tracing::{debug, info, warn};

use crate::router::ProviderRouter;
use crate::tools::{ToolCallResult, ToolError, ToolRegistry};
use crate::{ChatProvider, ToolCallRequest};

use super::types::OrchestratorOptions;

/// Drives one tool-calling exchange per `handle_chat` call.
///
/// Holds no conversation state: the transcript belongs to the caller, so a
/// single orchestrator can serve any number of concurrent conversations.
pub struct Orchestrator {
    pub(super) provider: Option<Arc<dyn ChatProvider>>,
    pub(super) registry: Arc<ToolRegistry>,
    pub(super) options: OrchestratorOptions,
}

impl Orchestrator {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self {
            provider: None,
            registry,
            options: OrchestratorOptions::default(),
        }
    }

    /// Orchestrator bound to the router's preferred provider, if any.
    pub fn from_router(router: &ProviderRouter, registry: Arc<ToolRegistry>) -> Self {
        let mut orchestrator = Self::new(registry);
        orchestrator.provider = router.select().map(|(_, client)| client);
        orchestrator
    }

    pub fn with_provider(mut self, provider: Arc<dyn ChatProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn with_options(mut self, options: OrchestratorOptions) -> Self {
        self.options = options;
        self
    }

    pub fn provider(&self) -> Option<&Arc<dyn ChatProvider>> {
        self.provider.as_ref()
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn options(&self) -> &OrchestratorOptions {
        &self.options
    }

    /// Execute every request, returning results in request order.
    pub(super) async fn execute_tools(&self, calls: &[ToolCallRequest]) -> Vec<ToolCallResult> {
        if self.options.parallel_tool_calls && calls.len() > 1 {
            return join_all(calls.iter().map(|call| self.execute_tool(call))).await;
        }
        let mut results = Vec::with_capacity(calls.len());
        for call in calls {
            results.push(self.execute_tool(call).await);
        }
        results
    }

    /// Execute one request. Every failure becomes an error result.
    pub(super) async fn execute_tool(&self, call: &ToolCallRequest) -> ToolCallResult {
        debug!(tool = %call.tool_name, id = %call.id, "Executing tool");

        let outcome = match self.registry.resolve(&call.tool_name) {
            Ok(handler) => {
                let run = handler.call(call.arguments.clone());
                match self.options.tool_timeout {
                    Some(limit) => tokio::time::timeout(limit, run)
                        .await
                        .unwrap_or(Err(ToolError::Timeout(limit))),
                    None => run.await,
                }
            }
            Err(e) => Err(e),
        };

        match outcome {
            Ok(payload) => {
                info!(tool = %call.tool_name, "Tool succeeded");
                ToolCallResult::ok(&call.id, payload)
            }
            Err(e) => {
                warn!(tool = %call.tool_name, error = %e, "Tool failed");
                ToolCallResult::failed(&call.id, &e)
            }
        }
    }
}
