//! LLM-backed agent node
//!
//! [`AgentNode`] sends the conversation history plus a system directive to
//! the [`ChatModel`] collaborator and appends whatever comes back. The
//! model decides on its own whether to answer directly or request tool
//! calls; [`route_after_agent`] inspects the result and routes to the tool
//! node only when calls are present.
//!
//! The model request carries a bounded window of recent messages (the
//! stored history is never trimmed here; truncation is the summarize
//! node's job under its documented policy).

use std::sync::Arc;

use charla_core::{
    last_assistant, ChatModel, Message, NodeResult, Result, RouterFn, StatePatch, StateRecord,
    ToolRegistry,
};
use tracing::debug;

/// How many recent messages accompany each model request
const DEFAULT_HISTORY_WINDOW: usize = 7;

/// Agent node: history in, assistant message (maybe with tool calls) out
pub struct AgentNode {
    model: Arc<dyn ChatModel>,
    system_prompt: String,
    registry: ToolRegistry,
    history_window: usize,
    greeting: Option<String>,
}

impl AgentNode {
    /// Agent with the given model and system directive
    pub fn new(model: Arc<dyn ChatModel>, system_prompt: impl Into<String>) -> Self {
        Self {
            model,
            system_prompt: system_prompt.into(),
            registry: ToolRegistry::new(),
            history_window: DEFAULT_HISTORY_WINDOW,
            greeting: None,
        }
    }

    /// Advertise these tools to the model
    pub fn with_tools(mut self, registry: ToolRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Change the recent-history window for model requests
    pub fn with_history_window(mut self, window: usize) -> Self {
        self.history_window = window.max(1);
        self
    }

    /// Canned reply when invoked with an empty history
    pub fn with_greeting(mut self, greeting: impl Into<String>) -> Self {
        self.greeting = Some(greeting.into());
        self
    }

    /// Run one agent turn against the current state
    pub async fn execute(&self, state: StateRecord) -> Result<NodeResult> {
        if state.messages.is_empty() {
            if let Some(greeting) = &self.greeting {
                return Ok(NodeResult::Patch(
                    StatePatch::new().with_message(Message::assistant(greeting)),
                ));
            }
        }

        let window_start = state.messages.len().saturating_sub(self.history_window);
        let window = &state.messages[window_start..];

        let mut system_prompt = self.system_prompt.clone();
        if let Some(summary) = &state.summary {
            system_prompt.push_str("\n\nResumen de la conversación hasta ahora:\n");
            system_prompt.push_str(summary);
        }

        debug!(
            window = window.len(),
            tools = self.registry.tool_names().len(),
            "sending model request"
        );
        let reply = self
            .model
            .complete(&system_prompt, window, &self.registry.schemas())
            .await?;

        Ok(NodeResult::Patch(StatePatch::new().with_message(reply)))
    }
}

/// Router for the edge leaving an agent node
///
/// Tool calls on the last assistant message route to `tools_node`;
/// everything else routes to `otherwise` (typically the feedback node or
/// `END`).
pub fn route_after_agent(tools_node: &str, otherwise: &str) -> RouterFn {
    let tools_node = tools_node.to_string();
    let otherwise = otherwise.to_string();
    Arc::new(move |state: &StateRecord| {
        match last_assistant(&state.messages) {
            Some(message) if message.has_tool_calls() => tools_node.clone(),
            _ => otherwise.clone(),
        }
    })
}
