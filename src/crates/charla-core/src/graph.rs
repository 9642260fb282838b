//! Core graph data structures
//!
//! A [`Graph`] is a static registry of nodes plus, per node, either a direct
//! successor or a routing function. Cyclic topologies (agent to tools and
//! back, supervisor to many agents and back through feedback) are expressed
//! as an explicit adjacency table rather than nested control flow, which is
//! what makes the recursion-limit guard and replay testing straightforward.
//!
//! Routing functions must be pure and total: deterministic given identical
//! state (no randomness, no wall clock) and always returning a registered
//! node id declared in the edge's branch list. Branch targets are validated
//! when the graph is compiled, so an unregistered id is a configuration
//! error at construction time, not a surprise at run time.
//!
//! Graphs are built through [`GraphBuilder`](crate::GraphBuilder); this
//! module holds the compiled representation the executor walks.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::error::Result;
use crate::interrupt::NodeContext;
use crate::node::NodeResult;
use crate::state::StateRecord;

/// Node identifier, unique within a graph
pub type NodeId = String;

/// Virtual entry marker; `add_edge(START, n)` declares the entry node
pub const START: &str = "__start__";

/// Virtual exit marker; routing to `END` terminates the run
pub const END: &str = "__end__";

/// Async node function: state in, patch plus control decision out
pub type NodeFn = Arc<
    dyn Fn(StateRecord, NodeContext) -> Pin<Box<dyn Future<Output = Result<NodeResult>> + Send>>
        + Send
        + Sync,
>;

/// Routing function for conditional edges
pub type RouterFn = Arc<dyn Fn(&StateRecord) -> NodeId + Send + Sync>;

/// A registered node
#[derive(Clone)]
pub struct NodeSpec {
    /// Node name, used in logs and interrupt bookkeeping
    pub name: String,

    /// The node's executor function
    pub executor: NodeFn,
}

impl std::fmt::Debug for NodeSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeSpec")
            .field("name", &self.name)
            .field("executor", &"<function>")
            .finish()
    }
}

/// Outgoing edge of a node
#[derive(Clone)]
pub enum Edge {
    /// Unconditional successor
    Direct(NodeId),

    /// Successor chosen at run time by a routing function
    Conditional {
        /// Pure, total router over the current state
        router: RouterFn,
        /// Every id the router may return, for construction-time validation
        branches: Vec<NodeId>,
    },
}

impl std::fmt::Debug for Edge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Edge::Direct(to) => f.debug_tuple("Direct").field(to).finish(),
            Edge::Conditional { branches, .. } => f
                .debug_struct("Conditional")
                .field("router", &"<function>")
                .field("branches", branches)
                .finish(),
        }
    }
}

/// Compiled graph the executor walks
#[derive(Debug, Clone)]
pub struct Graph {
    pub(crate) nodes: HashMap<NodeId, NodeSpec>,
    pub(crate) edges: HashMap<NodeId, Edge>,
    pub(crate) entry: NodeId,
}

impl Graph {
    /// Look up a node by id
    pub fn node(&self, id: &str) -> Option<&NodeSpec> {
        self.nodes.get(id)
    }

    /// True if the id names a registered node
    pub fn has_node(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// The node where fresh runs begin
    pub fn entry(&self) -> &str {
        &self.entry
    }

    /// Successor of `node` given the current state
    ///
    /// `None` means the node has no outgoing edge, which the executor
    /// treats the same as an edge to [`END`].
    pub fn successor(&self, node: &str, state: &StateRecord) -> Option<NodeId> {
        match self.edges.get(node)? {
            Edge::Direct(to) => Some(to.clone()),
            Edge::Conditional { router, .. } => Some(router(state)),
        }
    }

    /// Validate structural invariants
    ///
    /// Called by [`GraphBuilder::compile`](crate::GraphBuilder::compile);
    /// checks that the entry and every edge endpoint (including every
    /// conditional branch target) names a registered node or `END`.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if !self.nodes.contains_key(&self.entry) {
            return Err(format!("Entry node '{}' is not registered", self.entry));
        }

        for (from, edge) in &self.edges {
            if !self.nodes.contains_key(from) && from != START {
                return Err(format!("Edge source '{from}' is not registered"));
            }
            match edge {
                Edge::Direct(to) => {
                    if !self.nodes.contains_key(to) && to != END {
                        return Err(format!("Edge target '{to}' is not registered"));
                    }
                }
                Edge::Conditional { branches, .. } => {
                    if branches.is_empty() {
                        return Err(format!("Conditional edge from '{from}' declares no branches"));
                    }
                    for to in branches {
                        if !self.nodes.contains_key(to) && to != END {
                            return Err(format!("Branch target '{to}' is not registered"));
                        }
                    }
                }
            }
        }

        Ok(())
    }
}

/// Priority-ordered predicate routing
///
/// The canonical policy shape for supervisor-style routing: an ordered list
/// of `(predicate, target)` rules evaluated top to bottom, falling back to a
/// default target. Deterministic by construction as long as the predicates
/// only read the state they are given.
///
/// # Examples
///
/// ```rust
/// use charla_core::{PriorityRouter, StateRecord, Stage};
///
/// let router = PriorityRouter::new("conversational")
///     .rule(|s: &StateRecord| s.context_str("nombre_empresa").is_none(), "gather")
///     .rule(|s: &StateRecord| s.stage == Stage::Research, "researcher");
///
/// let mut state = StateRecord::new();
/// assert_eq!(router.route(&state), "gather");
///
/// state.context.insert("nombre_empresa".into(), "Panes SAC".into());
/// state.stage = Stage::Research;
/// assert_eq!(router.route(&state), "researcher");
/// ```
pub struct PriorityRouter {
    rules: Vec<(Arc<dyn Fn(&StateRecord) -> bool + Send + Sync>, NodeId)>,
    default: NodeId,
}

impl PriorityRouter {
    /// Create a router with the given fallback target
    pub fn new(default: impl Into<NodeId>) -> Self {
        Self {
            rules: Vec::new(),
            default: default.into(),
        }
    }

    /// Append a rule; earlier rules win
    pub fn rule<P>(mut self, predicate: P, target: impl Into<NodeId>) -> Self
    where
        P: Fn(&StateRecord) -> bool + Send + Sync + 'static,
    {
        self.rules.push((Arc::new(predicate), target.into()));
        self
    }

    /// First matching target, or the default
    pub fn route(&self, state: &StateRecord) -> NodeId {
        for (predicate, target) in &self.rules {
            if predicate(state) {
                return target.clone();
            }
        }
        self.default.clone()
    }

    /// Every id this router can return, for edge declaration
    pub fn branches(&self) -> Vec<NodeId> {
        let mut branches: Vec<NodeId> = self.rules.iter().map(|(_, t)| t.clone()).collect();
        branches.push(self.default.clone());
        branches.dedup();
        branches
    }

    /// Convert into a [`RouterFn`] for `add_conditional_edge`
    pub fn into_router_fn(self) -> RouterFn {
        Arc::new(move |state| self.route(state))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Stage;

    #[test]
    fn test_priority_order_wins() {
        let router = PriorityRouter::new("default")
            .rule(|_| true, "first")
            .rule(|_| true, "second");

        let state = StateRecord::new();
        assert_eq!(router.route(&state), "first");
    }

    #[test]
    fn test_falls_back_to_default() {
        let router = PriorityRouter::new("default").rule(|_| false, "never");
        assert_eq!(router.route(&StateRecord::new()), "default");
    }

    #[test]
    fn test_routing_is_deterministic_for_equal_state() {
        let router = PriorityRouter::new("chat")
            .rule(|s: &StateRecord| s.stage == Stage::Gathering, "gather")
            .rule(|s: &StateRecord| s.messages.len() > 3, "summarize");

        let a = StateRecord::new();
        let b = a.clone();
        assert_eq!(router.route(&a), router.route(&b));
    }

    #[test]
    fn test_branches_cover_rules_and_default() {
        let router = PriorityRouter::new("chat")
            .rule(|_| false, "gather")
            .rule(|_| false, "researcher");
        assert_eq!(router.branches(), vec!["gather", "researcher", "chat"]);
    }
}
