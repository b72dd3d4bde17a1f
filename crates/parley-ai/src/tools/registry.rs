//! Name → handler registry.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::info;

use super::definitions::ToolSpec;
use super::ToolError;

/// Type-erased tool entry point used by the orchestrator.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn call(&self, arguments: Map<String, Value>) -> Result<Value, ToolError>;
}

/// A tool with typed input and output.
///
/// Arguments that do not decode into `Input` become
/// `ToolError::InvalidArguments`; an `Output` that fails to encode becomes
/// `ToolError::Serialization`.
#[async_trait]
pub trait Tool: Send + Sync + 'static {
    type Input: DeserializeOwned + Send;
    type Output: Serialize + Send;

    fn spec(&self) -> ToolSpec;

    async fn run(&self, input: Self::Input) -> Result<Self::Output, ToolError>;
}

struct TypedTool<T>(T);

#[async_trait]
impl<T: Tool> ToolHandler for TypedTool<T> {
    async fn call(&self, arguments: Map<String, Value>) -> Result<Value, ToolError> {
        let input: T::Input = serde_json::from_value(Value::Object(arguments))
            .map_err(|e| ToolError::InvalidArguments(e.to_string()))?;
        let output = self.0.run(input).await?;
        serde_json::to_value(output).map_err(|e| ToolError::Serialization(e.to_string()))
    }
}

/// Handler backed by an async closure.
pub struct FnTool<F>(F);

/// Wrap an async closure as a `ToolHandler`.
pub fn fn_tool<F, Fut>(f: F) -> FnTool<F>
where
    F: Fn(Map<String, Value>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value, ToolError>> + Send + 'static,
{
    FnTool(f)
}

#[async_trait]
impl<F, Fut> ToolHandler for FnTool<F>
where
    F: Fn(Map<String, Value>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value, ToolError>> + Send + 'static,
{
    async fn call(&self, arguments: Map<String, Value>) -> Result<Value, ToolError> {
        (self.0)(arguments).await
    }
}

/// Registry of tools offered to the model.
///
/// Populated at startup through `&mut self`, then shared read-only
/// (usually as `Arc<ToolRegistry>`), so lookups take no locks.
#[derive(Default)]
pub struct ToolRegistry {
    specs: Vec<ToolSpec>,
    handlers: HashMap<String, Arc<dyn ToolHandler>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        spec: ToolSpec,
        handler: Arc<dyn ToolHandler>,
    ) -> Result<(), ToolError> {
        if self.handlers.contains_key(&spec.name) {
            return Err(ToolError::Duplicate(spec.name));
        }
        info!(tool = %spec.name, params = spec.parameters.len(), "Registering tool");
        self.handlers.insert(spec.name.clone(), handler);
        self.specs.push(spec);
        Ok(())
    }

    /// Register a typed tool under the name from its own spec.
    pub fn register_tool<T: Tool>(&mut self, tool: T) -> Result<(), ToolError> {
        let spec = tool.spec();
        self.register(spec, Arc::new(TypedTool(tool)))
    }

    pub fn resolve(&self, name: &str) -> Result<Arc<dyn ToolHandler>, ToolError> {
        self.handlers
            .get(name)
            .cloned()
            .ok_or_else(|| ToolError::Unknown(name.to_string()))
    }

    /// Specs in registration order.
    pub fn list_specs(&self) -> &[ToolSpec] {
        &self.specs
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.specs.iter().map(|s| s.name.as_str()).collect();
        f.debug_struct("ToolRegistry").field("tools", &names).finish()
    }
}
