//! Error type for graph construction and execution
//!
//! One enum covers the whole engine. Two variants deserve a note:
//!
//! - [`GraphError::Interrupted`] is control flow, not failure. It is how a
//!   suspension request travels from a node to the executor, which converts
//!   it into a persisted pending interrupt and a `Suspended` run result.
//! - [`GraphError::Validation`] is raised at graph construction time only;
//!   a well-formed compiled graph never produces it during a run.

use serde_json::Value;
use thiserror::Error;

/// Result type for graph operations
pub type Result<T> = std::result::Result<T, GraphError>;

/// Errors raised by graph construction and execution
#[derive(Error, Debug)]
pub enum GraphError {
    /// Graph structure validation failed at construction time
    #[error("Graph validation failed: {0}")]
    Validation(String),

    /// A node's executor function returned an error
    #[error("Node '{node}' execution failed: {error}")]
    NodeExecution {
        /// Name of the node that failed
        node: String,
        /// Error message from node execution
        error: String,
    },

    /// Generic execution error without node context
    #[error("Execution failed: {0}")]
    Execution(String),

    /// A node requested suspension pending external input
    ///
    /// Raised by [`NodeContext::interrupt`](crate::NodeContext::interrupt)
    /// when no resume value has been injected. The executor catches this
    /// variant; node code should propagate it with `?` and never swallow it.
    #[error("Execution suspended at node '{node}'")]
    Interrupted {
        /// Node that requested the suspension
        node: String,
        /// Payload exposed to the caller while suspended
        payload: Value,
    },

    /// The per-run step ceiling was exceeded (runaway loop guard)
    #[error("Recursion limit of {limit} steps exceeded")]
    RecursionLimit {
        /// The configured ceiling
        limit: u32,
    },

    /// A node invocation exceeded the configured timeout
    #[error("Node '{node}' timed out after {duration_ms}ms")]
    Timeout {
        /// Node that timed out
        node: String,
        /// Timeout duration in milliseconds
        duration_ms: u64,
    },

    /// Checkpoint persistence failed after retries
    #[error("Checkpoint error: {0}")]
    Checkpoint(#[from] charla_checkpoint::CheckpointError),

    /// State could not be serialized or deserialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl GraphError {
    /// Node execution error with context
    pub fn node_execution(node: impl Into<String>, error: impl Into<String>) -> Self {
        GraphError::NodeExecution {
            node: node.into(),
            error: error.into(),
        }
    }

    /// True for the suspension control-flow variant
    pub fn is_interrupt(&self) -> bool {
        matches!(self, GraphError::Interrupted { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_display() {
        let err = GraphError::node_execution("llm", "connection refused");
        assert_eq!(
            err.to_string(),
            "Node 'llm' execution failed: connection refused"
        );

        let err = GraphError::RecursionLimit { limit: 5 };
        assert_eq!(err.to_string(), "Recursion limit of 5 steps exceeded");
    }

    #[test]
    fn test_interrupt_is_not_a_failure_marker() {
        let err = GraphError::Interrupted {
            node: "feedback".into(),
            payload: json!({"message": "¿algo más?"}),
        };
        assert!(err.is_interrupt());
        assert!(!GraphError::Execution("boom".into()).is_interrupt());
    }
}
