//! # asesor - Conversational PYME Business Assistant
//!
//! A multi-agent business assistant for small and medium companies (PYMEs),
//! built on the charla engine. The assistant gathers structured information
//! about the user's business across turns, routes each message to the right
//! specialist, and pauses between turns with the engine's suspend/resume
//! protocol so a conversation can span days and process restarts.
//!
//! ## Conversation flow
//!
//! ```text
//! START -> welcome -> supervisor --(priority routing)--> gather ------\
//!                        ^                |                           |
//!                        |                +--> researcher <-> tools   |
//!                        |                |                     |     |
//!                        |                +--> conversational <-+     |
//!                        |                        |                   |
//!                        +---- feedback  <--------+-------------------/
//!                        |    (suspend)
//!                        +---- summarize (history over threshold)
//!
//! termination token -> farewell -> END
//! ```
//!
//! The supervisor extracts business facts from the latest message, detects
//! intent, and the routing policy picks the next agent by priority:
//! correction requests first, then missing critical fields, then research
//! requests, then general conversation.
//!
//! ## Collaborators
//!
//! All external services are injected traits with fakes for tests:
//! [`Extractor`] (structured-field extraction), [`MemoryStore`] (long-term
//! profile persistence, fire-and-forget), [`SearchProvider`] and
//! [`DocumentIndex`] (the research agent's tools), plus the engine's
//! `ChatModel` and `CheckpointStore`.
//!
//! ## Entry point
//!
//! [`ChatService`] is what a channel adapter calls: one inbound message in,
//! one [`ChatReply`] out. The service does not care whether the thread was
//! suspended; the engine treats the next inbound message as the resume
//! value automatically.

pub mod channel;
pub mod extract;
pub mod graph;
pub mod intent;
pub mod memory;
pub mod nodes;
pub mod profile;
pub mod service;
pub mod tools;

pub use channel::{ChannelAdapter, ChannelError, InboundMessage};
pub use extract::{Extractor, KeywordExtractor};
pub use graph::{assistant_executor_config, build_assistant_graph, AssistantDeps};
pub use intent::{detect_intent, UserIntent};
pub use memory::{InMemoryMemoryStore, MemoryError, MemoryStore};
pub use profile::{BusinessProfile, CRITICAL_FIELDS};
pub use service::{ChatReply, ChatService, HistoryEntry, ReplyStatus};
pub use tools::{DocumentIndex, DocumentSearchTool, SearchProvider, SearchResult, SearchTool};
