//! Tool execution node
//!
//! [`ToolNode`] bridges tool-call requests and actual tool execution. It
//! finds the tool calls on the last assistant message, invokes each named
//! tool, and emits one tool-result message per call id. Calls are
//! dispatched concurrently and joined before the node returns; each call is
//! addressed by a distinct call id with no shared mutable state between
//! them, and results are emitted in call order regardless of completion
//! order.
//!
//! Failures become `"Error: ..."` text content visible to the agent for
//! self-correction, not run failures. A tool that returns a command (a
//! handoff tool) redirects the executor instead; its patch and goto are
//! propagated along with the other calls' result messages.
//!
//! The graph wires an unconditional edge from the tool node back to the
//! agent node, closing the ReAct loop under the executor's recursion
//! ceiling.

use futures::future::join_all;
use tracing::{debug, warn};

use charla_core::{
    last_assistant, Command, Message, NodeResult, Result, StatePatch, StateRecord, ToolCall,
    ToolOutput, ToolRegistry, ToolRuntime,
};

/// Node that executes tool calls from the last assistant message
#[derive(Clone)]
pub struct ToolNode {
    registry: ToolRegistry,
    handle_tool_errors: bool,
}

impl ToolNode {
    /// Tool node over the given registry
    pub fn new(registry: ToolRegistry) -> Self {
        Self {
            registry,
            handle_tool_errors: true,
        }
    }

    /// Propagate tool errors instead of converting them to text
    pub fn with_error_handling(mut self, handle_errors: bool) -> Self {
        self.handle_tool_errors = handle_errors;
        self
    }

    /// Execute every pending tool call against the current state
    pub async fn execute(&self, state: StateRecord) -> Result<NodeResult> {
        let calls: Vec<ToolCall> = last_assistant(&state.messages)
            .map(|message| message.tool_calls.clone())
            .unwrap_or_default();

        if calls.is_empty() {
            return Ok(NodeResult::Patch(StatePatch::new()));
        }
        debug!(calls = calls.len(), "executing tool calls");

        let invocations = calls.into_iter().map(|call| {
            let registry = self.registry.clone();
            let state = state.clone();
            async move {
                let runtime = ToolRuntime::new(state).with_tool_call_id(call.id.clone());
                let output = registry
                    .execute(&call.name, call.args.clone(), runtime)
                    .await;
                (call, output)
            }
        });
        let results = join_all(invocations).await;

        let mut patch = StatePatch::new();
        let mut goto: Option<String> = None;
        for (call, output) in results {
            match output {
                Ok(ToolOutput::Text(text)) => {
                    patch
                        .messages
                        .push(Message::tool(text, &call.id).with_name(&call.name));
                }
                Ok(ToolOutput::Command(command)) => {
                    let Command { update, goto: target } = command;
                    patch.absorb(update);
                    if let Some(target) = target {
                        if let Some(existing) = &goto {
                            warn!(
                                kept = %existing,
                                dropped = %target,
                                "multiple tools returned a goto; keeping the first"
                            );
                        } else {
                            goto = Some(target);
                        }
                    }
                }
                Err(err) if self.handle_tool_errors => {
                    patch
                        .messages
                        .push(Message::tool(format!("Error: {err}"), &call.id).with_name(&call.name));
                }
                Err(err) => return Err(err),
            }
        }

        match goto {
            Some(target) => Ok(NodeResult::Command(
                Command::new().with_update(patch).with_goto(target),
            )),
            None => Ok(NodeResult::Patch(patch)),
        }
    }
}
