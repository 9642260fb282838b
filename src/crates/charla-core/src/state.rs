//! State record and merge semantics
//!
//! A [`StateRecord`] is the authoritative, serializable snapshot of one
//! conversation thread. Known fields are statically typed; free-form
//! structured knowledge (business attributes, routing hints) lives in the
//! open `context` map, where absent, `null`, and `""` are three distinct
//! facts: not yet asked, asked and unknown, asked and empty.
//!
//! Nodes never mutate the record directly. They return a [`StatePatch`] and
//! the executor merges it:
//!
//! - `messages` are **concatenated**, never replaced. The only way to shrink
//!   history is the explicit `truncate_to` field, reserved for a
//!   summarization node with a documented policy.
//! - `context` entries are shallow-merged key by key; a patch key overwrites
//!   the previous value for that key and leaves the rest untouched.
//! - `stage` and `summary` overwrite when present.
//!
//! This makes merging deterministic: applying the same patch to the same
//! record always yields the same record, which is what lets a resumed run
//! replay identically to an uninterrupted one.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::graph::NodeId;
use crate::interrupt::PendingInterrupt;
use crate::messages::{last_assistant, Message};

/// Coarse position of a thread in the overall flow
///
/// Used by routing functions to decide where to go next; the executor itself
/// never reads it.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Collecting the structured context needed to do useful work
    #[default]
    Gathering,
    /// Confirming gathered context with the user
    Validation,
    /// Running research on behalf of the user
    Research,
    /// Free-form conversation with complete context
    Conversation,
    /// Thread finished
    Done,
    /// A node flagged an unrecoverable business condition
    Error,
}

/// The persisted state of one conversation thread
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StateRecord {
    /// Ordered, append-only conversation history
    pub messages: Vec<Message>,

    /// Open map of structured context accumulated across turns
    #[serde(default)]
    pub context: Map<String, Value>,

    /// Flow position tag, read by routing functions only
    #[serde(default)]
    pub stage: Stage,

    /// Rolling conversation summary maintained by the summarize node
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    /// Present iff the last run ended via suspension
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending_interrupt: Option<PendingInterrupt>,

    /// Node currently (or last) executing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_node: Option<NodeId>,

    /// Successor computed after the last completed step
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_node: Option<NodeId>,

    /// Steps taken within the current run; reset when a run starts
    #[serde(default)]
    pub recursion_count: u32,
}

impl StateRecord {
    /// Create the record for a brand-new thread
    pub fn new() -> Self {
        Self {
            messages: Vec::new(),
            context: Map::new(),
            stage: Stage::Gathering,
            summary: None,
            pending_interrupt: None,
            active_node: None,
            next_node: None,
            recursion_count: 0,
        }
    }

    /// Text of the most recent assistant message, if any
    pub fn last_assistant_text(&self) -> Option<&str> {
        last_assistant(&self.messages).map(|m| m.content.as_str())
    }

    /// Text of the most recent user message, if any
    pub fn last_user_text(&self) -> Option<&str> {
        crate::messages::last_user(&self.messages).map(|m| m.content.as_str())
    }

    /// Read a context value by key
    pub fn context_value(&self, key: &str) -> Option<&Value> {
        self.context.get(key)
    }

    /// Read a context value as a string slice, if it is one
    pub fn context_str(&self, key: &str) -> Option<&str> {
        self.context.get(key).and_then(Value::as_str)
    }

    /// True if the thread is currently suspended awaiting input
    pub fn is_suspended(&self) -> bool {
        self.pending_interrupt.is_some()
    }
}

impl Default for StateRecord {
    fn default() -> Self {
        Self::new()
    }
}

/// The delta a node returns for merging into the state record
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StatePatch {
    /// Messages to append to the history
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub messages: Vec<Message>,

    /// Keep only the last N existing messages before appending
    ///
    /// Explicit truncation for the summarization policy. Applied before the
    /// patch's own messages are appended, so a summarize node can shrink
    /// history and add its summary note in one patch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub truncate_to: Option<usize>,

    /// Context entries to shallow-merge (per-key overwrite)
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub context: Map<String, Value>,

    /// New stage tag, if the node moves the flow along
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<Stage>,

    /// New conversation summary
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

impl StatePatch {
    /// Create an empty patch
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one message
    pub fn with_message(mut self, message: Message) -> Self {
        self.messages.push(message);
        self
    }

    /// Append several messages
    pub fn with_messages<I: IntoIterator<Item = Message>>(mut self, messages: I) -> Self {
        self.messages.extend(messages);
        self
    }

    /// Set one context entry
    pub fn with_context(mut self, key: impl Into<String>, value: Value) -> Self {
        self.context.insert(key.into(), value);
        self
    }

    /// Set the stage tag
    pub fn with_stage(mut self, stage: Stage) -> Self {
        self.stage = Some(stage);
        self
    }

    /// Set the summary
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    /// Request explicit history truncation (summarization only)
    pub fn with_truncate_to(mut self, keep_last: usize) -> Self {
        self.truncate_to = Some(keep_last);
        self
    }

    /// Fold another patch into this one, in order
    ///
    /// Used when one step produces several partial updates (e.g. a tool
    /// node collecting per-call results). Messages concatenate; scalar
    /// fields take the later value when present.
    pub fn absorb(&mut self, other: StatePatch) {
        if other.truncate_to.is_some() {
            self.truncate_to = other.truncate_to;
        }
        self.messages.extend(other.messages);
        for (key, value) in other.context {
            self.context.insert(key, value);
        }
        if other.stage.is_some() {
            self.stage = other.stage;
        }
        if other.summary.is_some() {
            self.summary = other.summary;
        }
    }

    /// True if the patch changes nothing
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
            && self.truncate_to.is_none()
            && self.context.is_empty()
            && self.stage.is_none()
            && self.summary.is_none()
    }

    /// Merge this patch into a record per the engine's merge semantics
    pub fn merge_into(&self, record: &mut StateRecord) {
        if let Some(keep) = self.truncate_to {
            let len = record.messages.len();
            if len > keep {
                record.messages.drain(..len - keep);
            }
        }
        record.messages.extend(self.messages.iter().cloned());
        for (key, value) in &self.context {
            record.context.insert(key.clone(), value.clone());
        }
        if let Some(stage) = self.stage {
            record.stage = stage;
        }
        if let Some(summary) = &self.summary {
            record.summary = Some(summary.clone());
        }
    }
}
