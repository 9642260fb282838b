//! Tool abstractions
//!
//! Tools are the actions an agent can take in the world. The contract is
//! deliberately forgiving: a tool returns text for the model to read, and
//! failures are rendered as error text visible to the agent for
//! self-correction rather than thrown through the executor.
//!
//! A tool may instead return a [`Command`] ([`ToolOutput::Command`]); that
//! is the mechanism behind handoff tools, which redirect the executor to
//! another agent node while patching state. The tool node propagates the
//! command; ordinary text results become tool messages.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::command::Command;
use crate::error::{GraphError, Result};
use crate::llm::ToolSchema;
use crate::state::StateRecord;

/// Extra context injected into a tool invocation
///
/// Handoff tools need the current state to build their carry-over patch;
/// plain tools can ignore everything here.
#[derive(Debug, Clone)]
pub struct ToolRuntime {
    /// Snapshot of the state record at invocation time
    pub state: StateRecord,

    /// Id of the tool call being answered
    pub tool_call_id: Option<String>,
}

impl ToolRuntime {
    /// Runtime for the given state snapshot
    pub fn new(state: StateRecord) -> Self {
        Self {
            state,
            tool_call_id: None,
        }
    }

    /// Attach the originating tool call id
    pub fn with_tool_call_id(mut self, id: impl Into<String>) -> Self {
        self.tool_call_id = Some(id.into());
        self
    }
}

/// What a tool invocation produces
#[derive(Debug, Clone)]
pub enum ToolOutput {
    /// Text for the model, wrapped into a tool message by the caller
    Text(String),

    /// Control directive, propagated to the executor (handoff tools)
    Command(Command),
}

/// An invocable tool
#[async_trait]
pub trait Tool: Send + Sync {
    /// Name the model refers to this tool by
    fn name(&self) -> &str;

    /// Description advertised to the model
    fn description(&self) -> &str;

    /// JSON schema of the arguments object
    fn parameters(&self) -> Value {
        serde_json::json!({"type": "object", "properties": {}})
    }

    /// Invoke the tool
    async fn execute(&self, args: Value, runtime: ToolRuntime) -> Result<ToolOutput>;
}

/// Registry of available tools
#[derive(Default, Clone)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool under its own name
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    /// Build a registry from a list of tools
    pub fn from_tools<I: IntoIterator<Item = Arc<dyn Tool>>>(tools: I) -> Self {
        let mut registry = Self::new();
        for tool in tools {
            registry.register(tool);
        }
        registry
    }

    /// Look up a tool by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// True if a tool with this name is registered
    pub fn has_tool(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Registered tool names
    pub fn tool_names(&self) -> Vec<String> {
        self.tools.keys().cloned().collect()
    }

    /// Schemas of every registered tool, for the model request
    pub fn schemas(&self) -> Vec<ToolSchema> {
        self.tools
            .values()
            .map(|tool| ToolSchema {
                name: tool.name().to_string(),
                description: tool.description().to_string(),
                parameters: tool.parameters(),
            })
            .collect()
    }

    /// Execute a named tool
    ///
    /// An unknown name is an error here; callers that talk to the model
    /// (the tool node) convert it into error text instead of failing the
    /// run.
    pub async fn execute(
        &self,
        name: &str,
        args: Value,
        runtime: ToolRuntime,
    ) -> Result<ToolOutput> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| GraphError::Execution(format!("Tool '{name}' not available")))?;
        tool.execute(args, runtime).await
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.tool_names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct UpperTool;

    #[async_trait]
    impl Tool for UpperTool {
        fn name(&self) -> &str {
            "upper"
        }

        fn description(&self) -> &str {
            "Uppercase the given text"
        }

        async fn execute(&self, args: Value, _runtime: ToolRuntime) -> Result<ToolOutput> {
            let text = args["text"].as_str().unwrap_or_default();
            Ok(ToolOutput::Text(text.to_uppercase()))
        }
    }

    #[tokio::test]
    async fn test_register_and_execute() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(UpperTool));
        assert!(registry.has_tool("upper"));

        let runtime = ToolRuntime::new(StateRecord::new());
        let output = registry
            .execute("upper", json!({"text": "hola"}), runtime)
            .await
            .unwrap();
        match output {
            ToolOutput::Text(text) => assert_eq!(text, "HOLA"),
            other => panic!("expected text, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unknown_tool_is_an_error() {
        let registry = ToolRegistry::new();
        let result = registry
            .execute("ghost", json!({}), ToolRuntime::new(StateRecord::new()))
            .await;
        assert!(result.is_err());
    }

    #[test]
    fn test_schemas_advertise_registered_tools() {
        let registry = ToolRegistry::from_tools([Arc::new(UpperTool) as Arc<dyn Tool>]);
        let schemas = registry.schemas();
        assert_eq!(schemas.len(), 1);
        assert_eq!(schemas[0].name, "upper");
        assert_eq!(schemas[0].parameters["type"], json!("object"));
    }
}
