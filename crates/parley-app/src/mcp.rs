//! MCP server exposing the tool registry over stdio.

use std::sync::Arc;
use std::time::Duration;

use parley_ai::{ToolError, ToolRegistry, ToolSpec};
use rmcp::model::{
    CallToolRequestParam, CallToolResult, Content, Implementation, JsonObject, ListToolsResult,
    PaginatedRequestParam, ProtocolVersion, ServerCapabilities, ServerInfo, Tool,
};
use rmcp::service::RequestContext;
use rmcp::{ErrorData as McpError, RoleServer, ServerHandler, ServiceExt};
use serde_json::{json, Value};
use tracing::{info, warn};

pub const SERVER_NAME: &str = "parley-tools";

/// Serves `tools/list` and `tools/call` from a [`ToolRegistry`].
#[derive(Clone)]
pub struct ToolServer {
    registry: Arc<ToolRegistry>,
    tool_timeout: Option<Duration>,
}

impl ToolServer {
    pub fn new(registry: Arc<ToolRegistry>, tool_timeout: Option<Duration>) -> Self {
        Self {
            registry,
            tool_timeout,
        }
    }

    pub fn tools(&self) -> Vec<Tool> {
        self.registry.list_specs().iter().map(to_mcp_tool).collect()
    }

    /// Run one tool. Unknown names are a protocol error; failures inside a
    /// known tool come back as an error result the client can show.
    pub async fn call(
        &self,
        name: &str,
        arguments: JsonObject,
    ) -> Result<CallToolResult, McpError> {
        let handler = self
            .registry
            .resolve(name)
            .map_err(|e| McpError::invalid_params(e.to_string(), None))?;

        let run = handler.call(arguments);
        let outcome = match self.tool_timeout {
            Some(limit) => tokio::time::timeout(limit, run)
                .await
                .unwrap_or(Err(ToolError::Timeout(limit))),
            None => run.await,
        };

        match outcome {
            Ok(payload) => {
                info!(tool = name, "MCP tool call succeeded");
                Ok(CallToolResult::success(vec![Content::text(payload.to_string())]))
            }
            Err(e) => {
                warn!(tool = name, error = %e, "MCP tool call failed");
                let body = json!({ "error": e.to_string() });
                Ok(CallToolResult::error(vec![Content::text(body.to_string())]))
            }
        }
    }
}

fn to_mcp_tool(spec: &ToolSpec) -> Tool {
    let schema = match spec.json_schema() {
        Value::Object(map) => map,
        _ => JsonObject::new(),
    };
    Tool::new(spec.name.clone(), spec.description.clone(), Arc::new(schema))
}

impl ServerHandler for ToolServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: SERVER_NAME.to_string(),
                title: None,
                version: env!("CARGO_PKG_VERSION").to_string(),
                icons: None,
                website_url: None,
            },
            instructions: Some("Search the user directory with search_users.".to_string()),
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        Ok(ListToolsResult::with_all_items(self.tools()))
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        self.call(&request.name, request.arguments.unwrap_or_default())
            .await
    }
}

/// Serve until the client closes stdin.
pub async fn serve_stdio(server: ToolServer) -> anyhow::Result<()> {
    info!(tools = server.registry.len(), "Serving MCP tools on stdio");
    let service = server.serve(rmcp::transport::stdio()).await?;
    let reason = service.waiting().await?;
    info!(?reason, "MCP client disconnected");
    Ok(())
}
