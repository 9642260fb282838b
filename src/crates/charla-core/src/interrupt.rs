//! Suspend/resume protocol
//!
//! A node pauses the whole graph by calling [`NodeContext::interrupt`] with
//! a payload (typically "message to show the user, plus a prompt for
//! input"). This is a control-flow primitive, not an error: the executor
//! persists a [`PendingInterrupt`] atomically with the rest of the state
//! record and returns a `Suspended` result carrying the payload.
//!
//! On the next run for the same thread, the caller-supplied resume value is
//! injected into the suspending node's context and the node is re-invoked
//! from its start. The `interrupt` call then returns the resume value
//! instead of suspending, so from the node's perspective resume is
//! referentially transparent: it looks exactly as if `interrupt()` had
//! simply returned the value.
//!
//! Two consequences for node authors:
//!
//! - Statements before the `interrupt` call run again on resume, so they
//!   must be idempotent reads, not writes.
//! - The injected value is consumed by the first `interrupt` call. A second
//!   call in the same invocation suspends again, which is how a node asks a
//!   clarifying question when the resume value is ambiguous.
//!
//! The pending interrupt is persisted continuation data, not a language
//! level stack suspension: it survives process restarts, which a coroutine
//! frame cannot.
//!
//! # Examples
//!
//! ```rust,ignore
//! async fn feedback_node(state: StateRecord, mut ctx: NodeContext) -> Result<NodeResult> {
//!     let answer = state.last_assistant_text().unwrap_or_default().to_string();
//!     let reply = ctx.interrupt(json!({
//!         "answer": answer,
//!         "message": "Proporcione su respuesta:",
//!     }))?;
//!     // Only reached on the resumed invocation.
//!     let text = reply.as_str().unwrap_or_default();
//!     Ok(Command::new()
//!         .with_update(StatePatch::new().with_message(Message::user(text)))
//!         .with_goto("supervisor")
//!         .into())
//! }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{GraphError, Result};
use crate::graph::NodeId;

/// Persisted continuation data for a suspended thread
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PendingInterrupt {
    /// Node that raised the interrupt; execution resumes here
    pub node: NodeId,

    /// Payload exposed to the caller while suspended
    pub payload: Value,
}

/// Per-invocation context handed to every node
///
/// Carries the node's own id and, on a resumed invocation, the externally
/// supplied resume value. Contexts are built by the executor; nodes receive
/// them by value and may consume the resume value exactly once.
#[derive(Debug)]
pub struct NodeContext {
    node: NodeId,
    thread: String,
    resume: Option<Value>,
}

impl NodeContext {
    /// Context for a fresh (non-resumed) invocation
    pub fn new(node: impl Into<NodeId>) -> Self {
        Self {
            node: node.into(),
            thread: String::new(),
            resume: None,
        }
    }

    /// Context for a resumed invocation with an injected value
    pub fn with_resume(node: impl Into<NodeId>, value: Value) -> Self {
        Self {
            node: node.into(),
            thread: String::new(),
            resume: Some(value),
        }
    }

    /// Attach the owning thread id
    pub fn for_thread(mut self, thread_id: impl Into<String>) -> Self {
        self.thread = thread_id.into();
        self
    }

    /// Id of the node this context belongs to
    pub fn node(&self) -> &str {
        &self.node
    }

    /// Id of the conversation thread being executed
    pub fn thread(&self) -> &str {
        &self.thread
    }

    /// True if a resume value is waiting to be consumed
    pub fn is_resuming(&self) -> bool {
        self.resume.is_some()
    }

    /// Suspend execution, or return the injected resume value
    ///
    /// Consumes the resume value: the first call on a resumed invocation
    /// returns it, any later call suspends again with the new payload.
    pub fn interrupt(&mut self, payload: Value) -> Result<Value> {
        match self.resume.take() {
            Some(value) => Ok(value),
            None => Err(GraphError::Interrupted {
                node: self.node.clone(),
                payload,
            }),
        }
    }
}
