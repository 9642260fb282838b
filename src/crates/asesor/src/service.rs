//! Chat service: the channel-facing entry point
//!
//! One inbound message in, one [`ChatReply`] out. The service builds the
//! run input, lets the engine decide whether the thread is resuming a
//! suspension, and maps the run result into what a messaging channel needs:
//! the answer text, whether the assistant expects a reply, and a friendly
//! error when something went irrecoverably wrong.
//!
//! Long answers are truncated to the message-channel limit; history can be
//! read back for a conversation view.

use std::sync::Arc;

use serde_json::Value;
use tracing::info;

use charla_checkpoint::CheckpointStore;
use charla_core::{Executor, MessageRole, Result, RunInput, RunStatus};

use crate::graph::{assistant_executor_config, build_assistant_graph, AssistantDeps};

/// Messaging channels cap outbound messages around this length
const CHANNEL_MESSAGE_LIMIT: usize = 4000;

/// Suffix appended when an answer had to be cut
const TRUNCATION_NOTE: &str = "...\n\nMensaje truncado";

/// Fallback text for an error-status run
const ERROR_ANSWER: &str =
    "Disculpa, encontré un problema técnico. Por favor intenta nuevamente.";

/// How a reply should be handled by the channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyStatus {
    /// The turn finished; the next message starts a fresh turn
    Completed,

    /// The assistant asked something; the next message is its answer
    AwaitingReply,

    /// The run failed; the conversation is still usable next turn
    Error,
}

/// What goes back to the user for one inbound message
#[derive(Debug, Clone)]
pub struct ChatReply {
    /// Conversation thread id
    pub thread_id: String,

    /// Text to deliver to the user
    pub answer: String,

    /// Whether the assistant awaits a reply
    pub status: ReplyStatus,

    /// The input prompt shown alongside the answer while suspended
    pub interrupt_prompt: Option<String>,
}

/// One history entry for conversation views
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    /// "human" or "ai"
    pub role: String,

    /// Message text
    pub content: String,
}

/// Channel-facing service around the assistant executor
pub struct ChatService {
    executor: Executor,
}

impl ChatService {
    /// Service over a pre-built executor
    pub fn new(executor: Executor) -> Self {
        Self { executor }
    }

    /// Build the assistant graph and executor from collaborators
    pub fn from_deps(deps: AssistantDeps, store: Arc<dyn CheckpointStore>) -> Result<Self> {
        let graph = build_assistant_graph(deps)?;
        let executor = Executor::new(graph, store).with_config(assistant_executor_config());
        Ok(Self::new(executor))
    }

    /// Process one inbound message for a thread
    ///
    /// `reset` discards the thread's state and starts a fresh conversation
    /// with this message.
    pub async fn process_message(&self, thread_id: &str, text: &str, reset: bool) -> ChatReply {
        info!(thread_id = %thread_id, reset, "processing inbound message");

        let input = if reset {
            RunInput::reset(text)
        } else {
            RunInput::message(text)
        };
        let result = self.executor.run(thread_id, input).await;

        let (answer, status, interrupt_prompt) = match result.status {
            RunStatus::Completed => (
                result
                    .payload
                    .as_str()
                    .unwrap_or(ERROR_ANSWER)
                    .to_string(),
                ReplyStatus::Completed,
                None,
            ),
            RunStatus::Suspended => {
                let answer = result.payload["answer"]
                    .as_str()
                    .or_else(|| result.payload["message"].as_str())
                    .unwrap_or_default()
                    .to_string();
                let prompt = result.payload["message"].as_str().map(str::to_string);
                (answer, ReplyStatus::AwaitingReply, prompt)
            }
            RunStatus::Error => (ERROR_ANSWER.to_string(), ReplyStatus::Error, None),
        };

        ChatReply {
            thread_id: thread_id.to_string(),
            answer: truncate_for_channel(answer),
            status,
            interrupt_prompt,
        }
    }

    /// The underlying executor, for state inspection and administration
    pub fn executor(&self) -> &Executor {
        &self.executor
    }

    /// Conversation history as user/assistant entries
    pub async fn history(&self, thread_id: &str) -> Result<Vec<HistoryEntry>> {
        let Some(record) = self.executor.state(thread_id).await? else {
            return Ok(Vec::new());
        };

        Ok(record
            .messages
            .iter()
            .filter_map(|message| match message.role {
                MessageRole::User => Some(HistoryEntry {
                    role: "human".into(),
                    content: message.content.clone(),
                }),
                MessageRole::Assistant => Some(HistoryEntry {
                    role: "ai".into(),
                    content: message.content.clone(),
                }),
                MessageRole::System | MessageRole::Tool => None,
            })
            .collect())
    }
}

fn truncate_for_channel(answer: String) -> String {
    if answer.chars().count() <= CHANNEL_MESSAGE_LIMIT {
        return answer;
    }
    let keep = CHANNEL_MESSAGE_LIMIT - TRUNCATION_NOTE.chars().count();
    let mut truncated: String = answer.chars().take(keep).collect();
    truncated.push_str(TRUNCATION_NOTE);
    truncated
}
