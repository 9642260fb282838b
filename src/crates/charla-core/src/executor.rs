//! The per-thread execution loop
//!
//! [`Executor::run`] advances one conversation thread by one turn: load the
//! latest state record from the checkpoint store (or create one), inject
//! the input, then walk the graph node by node until something suspends or
//! terminates. After every step the merged record is persisted, strictly
//! after the node's patch is merged and strictly before the next node
//! starts; a crash between two checkpoints loses at most one unpersisted
//! step and never produces a torn record.
//!
//! ## Input handling
//!
//! While a thread is suspended, *any* input is the resume value for the
//! pending interrupt; execution continues at the node that raised it, not
//! at the graph's entry. Otherwise the input is appended as a user message
//! and execution starts from the entry node (or `active_node` when a crash
//! left a run mid-flow). If the resume value matches a termination token
//! (case-insensitive), routing short-circuits to the configured terminal
//! node regardless of which node raised the interrupt.
//!
//! ## Failure policy
//!
//! Conversational continuity beats strict error propagation. A node that
//! fails or times out produces an apologetic assistant message and a normal
//! `Completed` result; the thread stays resumable. Only two things yield an
//! `Error` result: the recursion ceiling (runaway-loop guard) and a
//! checkpoint write that keeps failing after retries, because advancing
//! without durability would be worse than not advancing.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use tracing::{debug, error, info, warn};

use charla_checkpoint::{Checkpoint, CheckpointStore, ThreadId};

use crate::error::{GraphError, Result};
use crate::graph::{Graph, NodeId, END};
use crate::interrupt::{NodeContext, PendingInterrupt};
use crate::messages::Message;
use crate::retry::{RetryPolicy, RetryState};
use crate::state::{Stage, StateRecord};

/// Fallback answer when a completed run produced no assistant message
const NO_ANSWER: &str = "No se pudo generar una respuesta.";

/// Input for one executor run
#[derive(Debug, Clone)]
pub enum RunInput {
    /// A new user message
    Message(String),

    /// Resume value for a suspended thread
    Resume(Value),

    /// Discard the thread's record and start fresh with this message
    Reset(String),
}

impl RunInput {
    /// New user message input
    pub fn message(text: impl Into<String>) -> Self {
        RunInput::Message(text.into())
    }

    /// Resume value input
    pub fn resume(value: Value) -> Self {
        RunInput::Resume(value)
    }

    /// Reset-and-restart input
    pub fn reset(text: impl Into<String>) -> Self {
        RunInput::Reset(text.into())
    }
}

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// The graph reached a terminal node
    Completed,

    /// A node suspended awaiting external input
    Suspended,

    /// Recursion ceiling or persistence failure
    Error,
}

/// Outcome of one executor run
#[derive(Debug, Clone)]
pub struct RunResult {
    /// Thread the run belonged to
    pub thread_id: ThreadId,

    /// How the run ended
    pub status: RunStatus,

    /// Interrupt payload when suspended, latest assistant text when
    /// completed, error description otherwise
    pub payload: Value,
}

/// Executor tuning knobs
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Step ceiling per run (runaway-loop guard)
    pub recursion_limit: u32,

    /// Case-insensitive resume values that end the conversation
    pub termination_tokens: Vec<String>,

    /// Node to route to on a termination token; `None` ends the run directly
    pub termination_node: Option<NodeId>,

    /// Wall-clock budget for a single node invocation
    pub node_timeout: Duration,

    /// Backoff policy for checkpoint writes
    pub checkpoint_retry: RetryPolicy,

    /// Assistant message synthesized when a node fails or times out
    pub fallback_message: String,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            recursion_limit: 25,
            termination_tokens: [
                "done", "gracias", "adiós", "adios", "bye", "chau", "exit", "fin", "thanks",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            termination_node: None,
            node_timeout: Duration::from_secs(60),
            checkpoint_retry: RetryPolicy::default(),
            fallback_message:
                "Disculpa, encontré un problema técnico al procesar tu mensaje. \
                 ¿Podemos intentarlo de nuevo?"
                    .to_string(),
        }
    }
}

impl ExecutorConfig {
    /// Set the step ceiling
    pub fn with_recursion_limit(mut self, limit: u32) -> Self {
        self.recursion_limit = limit;
        self
    }

    /// Set the terminal node for termination tokens
    pub fn with_termination_node(mut self, node: impl Into<NodeId>) -> Self {
        self.termination_node = Some(node.into());
        self
    }

    /// Replace the termination token set
    pub fn with_termination_tokens<I, S>(mut self, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.termination_tokens = tokens.into_iter().map(Into::into).collect();
        self
    }

    /// Set the per-node timeout
    pub fn with_node_timeout(mut self, timeout: Duration) -> Self {
        self.node_timeout = timeout;
        self
    }

    /// Set the checkpoint retry policy
    pub fn with_checkpoint_retry(mut self, policy: RetryPolicy) -> Self {
        self.checkpoint_retry = policy;
        self
    }
}

/// Runs a compiled [`Graph`] against per-thread state records
///
/// Collaborators are injected at construction; nothing in the executor is
/// global, so tests can substitute fakes per run. The executor requires at
/// most one active run per thread id (callers serialize or reject
/// concurrent runs); runs for distinct threads are independent.
pub struct Executor {
    graph: Graph,
    store: Arc<dyn CheckpointStore>,
    config: ExecutorConfig,
}

impl Executor {
    /// Executor with default configuration
    pub fn new(graph: Graph, store: Arc<dyn CheckpointStore>) -> Self {
        Self {
            graph,
            store,
            config: ExecutorConfig::default(),
        }
    }

    /// Replace the configuration
    pub fn with_config(mut self, config: ExecutorConfig) -> Self {
        self.config = config;
        self
    }

    /// The active configuration
    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Load the current state record for a thread, if any
    pub async fn state(&self, thread_id: &str) -> Result<Option<StateRecord>> {
        match self.store.get(thread_id).await? {
            Some(checkpoint) => Ok(Some(serde_json::from_value(checkpoint.record)?)),
            None => Ok(None),
        }
    }

    /// Advance the thread by one turn
    pub async fn run(&self, thread_id: &str, input: RunInput) -> RunResult {
        match self.run_inner(thread_id, input).await {
            Ok(result) => result,
            Err(err) => {
                error!(thread_id = %thread_id, error = %err, "run failed");
                RunResult {
                    thread_id: thread_id.to_string(),
                    status: RunStatus::Error,
                    payload: json!({ "error": err.to_string() }),
                }
            }
        }
    }

    async fn run_inner(&self, thread_id: &str, input: RunInput) -> Result<RunResult> {
        let mut record = match &input {
            RunInput::Reset(_) => StateRecord::new(),
            _ => self.load(thread_id).await?,
        };
        record.recursion_count = 0;

        let mut step: u32 = 0;
        let mut resume: Option<Value> = None;
        let mut current: NodeId;

        if let Some(pending) = record.pending_interrupt.take() {
            // Any input while suspended is the resume value for the
            // interrupt, whatever variant the caller used.
            let value = match input {
                RunInput::Resume(value) => value,
                RunInput::Message(text) | RunInput::Reset(text) => Value::String(text),
            };
            if let Some(text) = value.as_str() {
                record.messages.push(Message::user(text));
            }

            if self.is_termination_token(&value) {
                info!(thread_id = %thread_id, "termination token received");
                match self.config.termination_node.clone() {
                    Some(node) => current = node,
                    None => {
                        record.stage = Stage::Done;
                        return self.finish(thread_id, record, step).await;
                    }
                }
            } else {
                debug!(thread_id = %thread_id, node = %pending.node, "resuming suspended node");
                resume = Some(value);
                current = pending.node;
            }
        } else {
            let text = match input {
                RunInput::Message(text) | RunInput::Reset(text) => text,
                RunInput::Resume(value) => value
                    .as_str()
                    .map(str::to_string)
                    .unwrap_or_else(|| value.to_string()),
            };
            record.messages.push(Message::user(text));
            current = record
                .active_node
                .clone()
                .filter(|node| self.graph.has_node(node))
                .unwrap_or_else(|| self.graph.entry().to_string());
        }

        loop {
            record.recursion_count += 1;
            if record.recursion_count > self.config.recursion_limit {
                warn!(
                    thread_id = %thread_id,
                    limit = self.config.recursion_limit,
                    "recursion limit exceeded, forcing termination"
                );
                record.active_node = None;
                record.next_node = None;
                self.persist(thread_id, &record, step).await?;
                return Ok(RunResult {
                    thread_id: thread_id.to_string(),
                    status: RunStatus::Error,
                    payload: json!({
                        "error": GraphError::RecursionLimit {
                            limit: self.config.recursion_limit,
                        }
                        .to_string(),
                    }),
                });
            }

            let spec = self
                .graph
                .node(&current)
                .ok_or_else(|| {
                    GraphError::Validation(format!("Node '{current}' is not registered"))
                })?
                .clone();
            record.active_node = Some(current.clone());

            let ctx = match resume.take() {
                Some(value) => NodeContext::with_resume(current.clone(), value),
                None => NodeContext::new(current.clone()),
            }
            .for_thread(thread_id);

            debug!(thread_id = %thread_id, node = %current, step, "invoking node");
            let invocation = (spec.executor)(record.clone(), ctx);
            let result = match tokio::time::timeout(self.config.node_timeout, invocation).await {
                Ok(result) => result,
                Err(_) => Err(GraphError::Timeout {
                    node: current.clone(),
                    duration_ms: self.config.node_timeout.as_millis() as u64,
                }),
            };

            match result {
                Ok(node_result) => {
                    let command = node_result.into_command();
                    command.update.merge_into(&mut record);
                    step += 1;

                    let next = command
                        .goto
                        .or_else(|| self.graph.successor(&current, &record));
                    match next {
                        Some(next) if next != END => {
                            if !self.graph.has_node(&next) {
                                return Err(GraphError::Validation(format!(
                                    "Router after '{current}' returned unregistered node '{next}'"
                                )));
                            }
                            record.next_node = Some(next.clone());
                            self.persist(thread_id, &record, step).await?;
                            current = next;
                        }
                        _ => return self.finish(thread_id, record, step).await,
                    }
                }
                Err(GraphError::Interrupted { node, payload }) => {
                    record.pending_interrupt = Some(PendingInterrupt {
                        node,
                        payload: payload.clone(),
                    });
                    record.next_node = None;
                    step += 1;
                    self.persist(thread_id, &record, step).await?;
                    info!(thread_id = %thread_id, node = %current, "run suspended");
                    return Ok(RunResult {
                        thread_id: thread_id.to_string(),
                        status: RunStatus::Suspended,
                        payload,
                    });
                }
                Err(err) => {
                    warn!(
                        thread_id = %thread_id,
                        node = %current,
                        error = %err,
                        "node failed, recovering with fallback message"
                    );
                    record
                        .messages
                        .push(Message::assistant(&self.config.fallback_message));
                    record.active_node = None;
                    record.next_node = None;
                    step += 1;
                    self.persist(thread_id, &record, step).await?;
                    return Ok(RunResult {
                        thread_id: thread_id.to_string(),
                        status: RunStatus::Completed,
                        payload: Value::String(self.config.fallback_message.clone()),
                    });
                }
            }
        }
    }

    async fn finish(
        &self,
        thread_id: &str,
        mut record: StateRecord,
        step: u32,
    ) -> Result<RunResult> {
        record.active_node = None;
        record.next_node = None;
        self.persist(thread_id, &record, step).await?;
        let payload = Value::String(
            record
                .last_assistant_text()
                .unwrap_or(NO_ANSWER)
                .to_string(),
        );
        info!(thread_id = %thread_id, "run completed");
        Ok(RunResult {
            thread_id: thread_id.to_string(),
            status: RunStatus::Completed,
            payload,
        })
    }

    async fn load(&self, thread_id: &str) -> Result<StateRecord> {
        match self.store.get(thread_id).await? {
            Some(checkpoint) => Ok(serde_json::from_value(checkpoint.record)?),
            None => {
                debug!(thread_id = %thread_id, "no checkpoint, creating fresh record");
                Ok(StateRecord::new())
            }
        }
    }

    async fn persist(&self, thread_id: &str, record: &StateRecord, step: u32) -> Result<()> {
        let value = serde_json::to_value(record)?;
        let mut retry = RetryState::new();
        loop {
            match self
                .store
                .put(thread_id, Checkpoint::new(value.clone(), step))
                .await
            {
                Ok(()) => return Ok(()),
                Err(err) => {
                    retry.record_attempt(Some(err.to_string()));
                    if !self.config.checkpoint_retry.should_retry(retry.attempts) {
                        error!(
                            thread_id = %thread_id,
                            attempts = retry.attempts,
                            "checkpoint write failed permanently"
                        );
                        return Err(GraphError::Checkpoint(err));
                    }
                    let delay = self
                        .config
                        .checkpoint_retry
                        .calculate_delay(retry.attempts - 1);
                    warn!(
                        thread_id = %thread_id,
                        attempts = retry.attempts,
                        delay_ms = delay.as_millis() as u64,
                        "checkpoint write failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    fn is_termination_token(&self, value: &Value) -> bool {
        let Some(text) = value.as_str() else {
            return false;
        };
        let normalized = text.trim().to_lowercase();
        self.config
            .termination_tokens
            .iter()
            .any(|token| token.to_lowercase() == normalized)
    }
}
