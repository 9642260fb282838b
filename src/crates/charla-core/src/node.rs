//! Node execution result types
//!
//! A node returns either a plain state patch (the graph's edges pick the
//! successor) or a [`Command`] (the node picks its own successor). The
//! executor normalizes both through [`NodeResult::into_command`].

use crate::command::Command;
use crate::state::StatePatch;

/// Result a node returns from execution
#[derive(Debug, Clone, PartialEq)]
pub enum NodeResult {
    /// State patch; the successor comes from the graph's edges
    Patch(StatePatch),

    /// Patch plus node-computed successor (dynamic routing / handoff)
    Command(Command),
}

impl NodeResult {
    /// Normalize into a command, wrapping a bare patch without a goto
    pub fn into_command(self) -> Command {
        match self {
            NodeResult::Patch(patch) => Command::new().with_update(patch),
            NodeResult::Command(cmd) => cmd,
        }
    }

    /// True if this result redirects control itself
    pub fn has_goto(&self) -> bool {
        matches!(self, NodeResult::Command(cmd) if cmd.goto.is_some())
    }
}

impl From<StatePatch> for NodeResult {
    fn from(patch: StatePatch) -> Self {
        NodeResult::Patch(patch)
    }
}

impl From<Command> for NodeResult {
    fn from(cmd: Command) -> Self {
        NodeResult::Command(cmd)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::Message;

    #[test]
    fn test_patch_normalizes_to_goto_free_command() {
        let result: NodeResult = StatePatch::new()
            .with_message(Message::assistant("hola"))
            .into();
        assert!(!result.has_goto());

        let cmd = result.into_command();
        assert!(cmd.goto.is_none());
        assert_eq!(cmd.update.messages.len(), 1);
    }

    #[test]
    fn test_command_passes_through() {
        let result: NodeResult = Command::new().with_goto("next").into();
        assert!(result.has_goto());
        assert_eq!(result.into_command().goto.as_deref(), Some("next"));
    }
}
