//! # charla-prebuilt - Ready-made Agent Patterns
//!
//! Higher-level building blocks assembled from `charla-core` primitives:
//!
//! - [`AgentNode`] - an LLM-backed node implementing the "agent" half of
//!   the ReAct pattern: full history plus a system directive go to the
//!   model, the assistant message (possibly carrying tool calls) comes
//!   back as a state patch.
//! - [`ToolNode`] - the "act" half: executes every tool call from the last
//!   assistant message, one tool-result message per call id, then routes
//!   back to the agent.
//! - [`route_after_agent`] - the router between them: tool calls present
//!   means go to the tool node, otherwise the turn ends.
//! - [`handoff_tool`] / [`task_handoff_tool`] - tools an agent can call to
//!   transfer control to another agent, with the full record or a narrow
//!   task brief.
//!
//! The agent-tools cycle is bounded by the executor's recursion ceiling;
//! nothing in this crate loops on its own.
//!
//! ## Wiring the ReAct loop
//!
//! ```rust,ignore
//! use charla_prebuilt::{AgentNode, ToolNode, route_after_agent};
//! use charla_core::{GraphBuilder, START, END};
//! use std::sync::Arc;
//!
//! let agent = Arc::new(AgentNode::new(model, "Eres un asesor de PYMES.").with_tools(registry.clone()));
//! let tools = Arc::new(ToolNode::new(registry));
//!
//! let mut builder = GraphBuilder::new();
//! builder.add_node("agent", {
//!     let agent = agent.clone();
//!     move |state, _ctx| { let agent = agent.clone(); async move { agent.execute(state).await } }
//! });
//! builder.add_node("tools", {
//!     let tools = tools.clone();
//!     move |state, _ctx| { let tools = tools.clone(); async move { tools.execute(state).await } }
//! });
//! builder.add_edge(START, "agent");
//! builder.add_conditional_edge("agent", route_after_agent("tools", END), ["tools", END]);
//! builder.add_edge("tools", "agent");
//! ```

pub mod agent;
pub mod handoff;
pub mod tool_node;

pub use agent::{route_after_agent, AgentNode};
pub use handoff::{handoff_tool, task_handoff_tool};
pub use tool_node::ToolNode;
