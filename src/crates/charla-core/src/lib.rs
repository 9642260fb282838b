//! # charla-core - Conversation Graph Execution Engine
//!
//! The execution core of charla: a persistent, resumable state machine that
//! drives multi-turn dialogs through a graph of nodes, supports long-running
//! human-in-the-loop suspension, and routes control based on accumulated
//! structured knowledge about the conversation.
//!
//! ## Overview
//!
//! A conversation is a **thread** (opaque string id) owning one
//! [`StateRecord`]. A [`Graph`] is a named set of nodes, each an async
//! function from state to a [`NodeResult`]: a state patch plus a control
//! decision. The [`Executor`] runs the graph for one thread per turn,
//! merging each node's patch, checkpointing after every step, and halting on
//! suspension or termination.
//!
//! - **Exactly-once-per-turn**: one `run` call advances a thread by one
//!   turn; a checkpoint is written after every step, so a crash loses at
//!   most one unpersisted step and never a torn record.
//! - **Suspend/resume**: a node calls [`NodeContext::interrupt`] to pause
//!   the whole graph and expose a payload to the caller. The next run
//!   injects the caller-supplied value as the return value of that call.
//! - **Bounded recursion**: cyclic routing (agent loops, supervisor cycles)
//!   is cut off by a configurable step ceiling instead of spinning forever.
//! - **Handoff**: any node can return a [`Command`] with a `goto`, moving
//!   control to another node while carrying a context patch. The executor
//!   treats it exactly like ordinary routing.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use charla_core::{Executor, GraphBuilder, NodeResult, StatePatch, Message, END};
//! use charla_checkpoint::InMemoryCheckpointStore;
//! use std::sync::Arc;
//!
//! let mut builder = GraphBuilder::new();
//! builder.add_node("greet", |_state, _ctx| async move {
//!     let patch = StatePatch::new().with_message(Message::assistant("¡Hola!"));
//!     Ok(NodeResult::Patch(patch))
//! });
//! builder.set_entry("greet");
//! builder.add_edge("greet", END);
//!
//! let graph = builder.compile()?;
//! let executor = Executor::new(graph, Arc::new(InMemoryCheckpointStore::new()));
//! let result = executor.run("thread-1", RunInput::message("buenos días")).await?;
//! ```
//!
//! ## Module Organization
//!
//! - [`state`] - [`StateRecord`], [`StatePatch`], merge semantics
//! - [`messages`] - [`Message`], [`MessageRole`], [`ToolCall`]
//! - [`graph`] - node/edge model, [`PriorityRouter`], validation
//! - [`builder`] - [`GraphBuilder`] construction API
//! - [`command`] - [`Command`]: node-computed routing and handoff
//! - [`node`] - [`NodeResult`] returned by node functions
//! - [`interrupt`] - suspend/resume protocol, [`NodeContext`]
//! - [`executor`] - the per-thread run loop
//! - [`retry`] - [`RetryPolicy`] for checkpoint writes
//! - [`llm`] - [`ChatModel`] collaborator contract
//! - [`tool`] - [`Tool`], [`ToolRegistry`], [`ToolOutput`]
//! - [`error`] - [`GraphError`]
//!
//! ## Concurrency model
//!
//! Execution is single-threaded and cooperative **per thread**: the engine
//! requires at most one active run per thread id as a precondition for its
//! persistence correctness, and leaves enforcement to the caller. Runs for
//! different threads are fully independent and may execute in parallel; the
//! checkpoint store is the only shared resource and is keyed by thread id.

pub mod builder;
pub mod command;
pub mod error;
pub mod executor;
pub mod graph;
pub mod interrupt;
pub mod llm;
pub mod messages;
pub mod node;
pub mod retry;
pub mod state;
pub mod tool;

pub use builder::GraphBuilder;
pub use command::Command;
pub use error::{GraphError, Result};
pub use executor::{Executor, ExecutorConfig, RunInput, RunResult, RunStatus};
pub use graph::{Edge, Graph, NodeFn, NodeId, NodeSpec, PriorityRouter, RouterFn, END, START};
pub use interrupt::{NodeContext, PendingInterrupt};
pub use llm::{ChatModel, ToolSchema};
pub use messages::{last_assistant, Message, MessageRole, ToolCall};
pub use node::NodeResult;
pub use retry::{RetryPolicy, RetryState};
pub use state::{Stage, StatePatch, StateRecord};
pub use tool::{Tool, ToolOutput, ToolRegistry, ToolRuntime};
