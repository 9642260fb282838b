//! Handoff tools
//!
//! Tools an agent can call to transfer control to another agent node.
//! Both flavors return a [`Command`], so from the executor's point of view
//! a handoff is ordinary node-computed routing plus a patch:
//!
//! - [`handoff_tool`] transfers with the **whole state**: the target agent
//!   sees the full conversation history, plus a tool message recording the
//!   transfer.
//! - [`task_handoff_tool`] transfers a **narrow task**: the patch replaces
//!   the history with one synthetic user message carrying the task
//!   description and the structured business context, so a worker agent is
//!   not distracted by irrelevant history.
//!
//! Tool names follow the `transfer_to_<agent>` / `assign_task_to_<agent>`
//! convention so the model can discover them by name.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::info;

use charla_core::{
    Command, Message, NodeId, Result, StatePatch, Tool, ToolOutput, ToolRuntime,
};

struct HandoffTool {
    name: String,
    description: String,
    target: NodeId,
}

#[async_trait]
impl Tool for HandoffTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    async fn execute(&self, _args: Value, runtime: ToolRuntime) -> Result<ToolOutput> {
        let call_id = runtime.tool_call_id.unwrap_or_default();
        info!(target = %self.target, "handoff requested");
        Ok(ToolOutput::Command(
            Command::new()
                .with_update(StatePatch::new().with_message(
                    Message::tool(format!("Transferido exitosamente a {}", self.target), call_id)
                        .with_name(&self.name),
                ))
                .with_goto(self.target.clone()),
        ))
    }
}

/// Whole-state handoff tool for the given agent
pub fn handoff_tool(agent_name: &str, description: Option<&str>) -> Arc<dyn Tool> {
    Arc::new(HandoffTool {
        name: format!("transfer_to_{agent_name}"),
        description: description
            .map(str::to_string)
            .unwrap_or_else(|| format!("Transferir control a {agent_name}")),
        target: agent_name.to_string(),
    })
}

struct TaskHandoffTool {
    name: String,
    description: String,
    target: NodeId,
}

#[async_trait]
impl Tool for TaskHandoffTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "task": {
                    "type": "string",
                    "description": "Descripción detallada de la tarea, incluyendo todo el \
                                    contexto relevante para el agente asignado"
                }
            },
            "required": ["task"]
        })
    }

    async fn execute(&self, args: Value, runtime: ToolRuntime) -> Result<ToolOutput> {
        let task = args["task"].as_str().unwrap_or_default().to_string();
        info!(target = %self.target, task = %task, "task handoff requested");

        let mut brief = format!("Tarea asignada: {task}");
        if !runtime.state.context.is_empty() {
            let context = serde_json::to_string_pretty(&runtime.state.context)
                .unwrap_or_else(|_| "{}".to_string());
            brief.push_str("\n\nContexto del negocio:\n");
            brief.push_str(&context);
        }

        // Flavor (b): the target sees a single synthetic message, not the
        // accumulated history.
        Ok(ToolOutput::Command(
            Command::new()
                .with_update(
                    StatePatch::new()
                        .with_truncate_to(0)
                        .with_message(Message::user(brief))
                        .with_context("assigned_task", json!(task)),
                )
                .with_goto(self.target.clone()),
        ))
    }
}

/// Task handoff tool for the given agent
pub fn task_handoff_tool(agent_name: &str, description: Option<&str>) -> Arc<dyn Tool> {
    Arc::new(TaskHandoffTool {
        name: format!("assign_task_to_{agent_name}"),
        description: description
            .map(str::to_string)
            .unwrap_or_else(|| format!("Asignar una tarea específica a {agent_name}")),
        target: agent_name.to_string(),
    })
}
