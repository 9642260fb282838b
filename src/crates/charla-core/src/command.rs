//! Node-computed routing and handoff
//!
//! A [`Command`] is what a node returns when it wants to decide its own
//! successor instead of relying on the graph's edges: a state patch plus an
//! optional `goto` target. From the executor's point of view a handoff is
//! indistinguishable from ordinary routing; it is simply a node-computed
//! next-node id plus a patch, which keeps the executor's core loop
//! single-pathed.
//!
//! Both handoff flavors are expressed with the same shape:
//!
//! - **Whole-state handoff**: patch appends a transfer note, `goto` names
//!   the target agent. The target sees the full record.
//! - **Task handoff**: the patch additionally truncates `messages` to one
//!   synthetic task message, so the target works from a narrow brief rather
//!   than the full history.
//!
//! # Examples
//!
//! ```rust
//! use charla_core::{Command, StatePatch, Message, Stage};
//!
//! // Route to the research agent, recording why.
//! let cmd = Command::new()
//!     .with_update(
//!         StatePatch::new()
//!             .with_stage(Stage::Research)
//!             .with_message(Message::system("Transferido a researcher")),
//!     )
//!     .with_goto("researcher");
//!
//! assert_eq!(cmd.goto.as_deref(), Some("researcher"));
//! ```

use serde::{Deserialize, Serialize};

use crate::graph::NodeId;
use crate::state::StatePatch;

/// Control directive returned by a node
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Command {
    /// State patch to merge before control moves
    #[serde(default)]
    pub update: StatePatch,

    /// Node to execute next; `None` defers to the graph's edges
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goto: Option<NodeId>,
}

impl Command {
    /// Create an empty command
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the state patch
    pub fn with_update(mut self, update: StatePatch) -> Self {
        self.update = update;
        self
    }

    /// Set the next node
    pub fn with_goto(mut self, goto: impl Into<NodeId>) -> Self {
        self.goto = Some(goto.into());
        self
    }

    /// True if the command neither patches state nor redirects control
    pub fn is_empty(&self) -> bool {
        self.update.is_empty() && self.goto.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::Message;
    use crate::state::StateRecord;
    use serde_json::json;

    #[test]
    fn test_empty_command() {
        let cmd = Command::new();
        assert!(cmd.is_empty());
        assert!(cmd.goto.is_none());
    }

    #[test]
    fn test_command_carries_patch_and_goto() {
        let cmd = Command::new()
            .with_update(StatePatch::new().with_context("task", json!("analizar mercado")))
            .with_goto("researcher");

        assert!(!cmd.is_empty());
        let mut record = StateRecord::new();
        cmd.update.merge_into(&mut record);
        assert_eq!(record.context_str("task"), Some("analizar mercado"));
    }

    #[test]
    fn test_task_handoff_shape_narrows_history() {
        // Flavor (b): a synthetic single-message brief for the target.
        let mut record = StateRecord::new();
        record.messages.push(Message::user("mucho"));
        record.messages.push(Message::assistant("historial"));

        let cmd = Command::new()
            .with_update(
                StatePatch::new()
                    .with_truncate_to(0)
                    .with_message(Message::user("Tarea: investigar competencia en Lima")),
            )
            .with_goto("researcher");

        cmd.update.merge_into(&mut record);
        assert_eq!(record.messages.len(), 1);
        assert!(record.messages[0].content.starts_with("Tarea:"));
    }

    #[test]
    fn test_command_serialization() {
        let cmd = Command::new()
            .with_update(StatePatch::new().with_context("listo", json!(true)))
            .with_goto("farewell");

        let encoded = serde_json::to_string(&cmd).unwrap();
        let decoded: Command = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, cmd);
    }
}
