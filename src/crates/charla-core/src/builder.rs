//! Graph construction API
//!
//! [`GraphBuilder`] assembles nodes and edges, then [`compile`] validates
//! the structure and produces the immutable [`Graph`] the executor runs.
//! All wiring errors (unknown entry, edge to a node that was never added,
//! conditional branch naming a missing target) surface here as
//! [`GraphError::Validation`], never during a conversation.
//!
//! [`compile`]: GraphBuilder::compile
//!
//! # Examples
//!
//! ```rust
//! use charla_core::{GraphBuilder, NodeResult, StatePatch, Message, END, START};
//!
//! let mut builder = GraphBuilder::new();
//! builder.add_node("welcome", |_state, _ctx| async move {
//!     Ok(NodeResult::Patch(
//!         StatePatch::new().with_message(Message::assistant("¡Hola!")),
//!     ))
//! });
//! builder.add_edge(START, "welcome");
//! builder.add_edge("welcome", END);
//!
//! let graph = builder.compile().unwrap();
//! assert_eq!(graph.entry(), "welcome");
//! ```

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use crate::error::{GraphError, Result};
use crate::graph::{Edge, Graph, NodeFn, NodeId, NodeSpec, RouterFn, START};
use crate::interrupt::NodeContext;
use crate::node::NodeResult;
use crate::state::StateRecord;

/// Builder for [`Graph`]
#[derive(Default)]
pub struct GraphBuilder {
    nodes: HashMap<NodeId, NodeSpec>,
    edges: HashMap<NodeId, Edge>,
    entry: Option<NodeId>,
}

impl GraphBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a node
    ///
    /// The function receives the current state record by value and the
    /// per-invocation [`NodeContext`]; it returns a [`NodeResult`].
    /// Registering the same id twice replaces the earlier node.
    pub fn add_node<F, Fut>(&mut self, id: impl Into<NodeId>, node: F) -> &mut Self
    where
        F: Fn(StateRecord, NodeContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<NodeResult>> + Send + 'static,
    {
        let id = id.into();
        let executor: NodeFn = Arc::new(move |state, ctx| Box::pin(node(state, ctx)));
        self.nodes.insert(
            id.clone(),
            NodeSpec {
                name: id,
                executor,
            },
        );
        self
    }

    /// Add an unconditional edge
    ///
    /// `add_edge(START, n)` declares the entry node; a node may have at
    /// most one outgoing edge, direct or conditional.
    pub fn add_edge(&mut self, from: impl Into<NodeId>, to: impl Into<NodeId>) -> &mut Self {
        let from = from.into();
        let to = to.into();
        if from == START {
            self.entry = Some(to);
        } else {
            self.edges.insert(from, Edge::Direct(to));
        }
        self
    }

    /// Add a conditional edge with a routing function
    ///
    /// `branches` must list every id the router can return; they are
    /// validated at compile time.
    pub fn add_conditional_edge<I, S>(
        &mut self,
        from: impl Into<NodeId>,
        router: RouterFn,
        branches: I,
    ) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<NodeId>,
    {
        self.edges.insert(
            from.into(),
            Edge::Conditional {
                router,
                branches: branches.into_iter().map(Into::into).collect(),
            },
        );
        self
    }

    /// Declare the entry node directly
    pub fn set_entry(&mut self, node: impl Into<NodeId>) -> &mut Self {
        self.entry = Some(node.into());
        self
    }

    /// Validate and produce the compiled graph
    pub fn compile(self) -> Result<Graph> {
        let entry = self
            .entry
            .ok_or_else(|| GraphError::Validation("No entry node declared".into()))?;

        let graph = Graph {
            nodes: self.nodes,
            edges: self.edges,
            entry,
        };
        graph.validate().map_err(GraphError::Validation)?;
        Ok(graph)
    }
}
