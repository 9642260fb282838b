//! Messaging-channel adapter contract
//!
//! The assistant is channel-agnostic; a concrete adapter (WhatsApp webhook,
//! web chat, CLI) implements [`ChannelAdapter`] and owns transport details:
//! webhook verification, media handling, delivery receipts. This crate only
//! defines the boundary.
//!
//! Two rules the adapter must honor:
//!
//! - **At most one active run per thread.** The engine's persistence
//!   correctness depends on it; an adapter receiving a burst of messages
//!   for one thread queues or drops the extras instead of calling the
//!   service concurrently.
//! - **After an awaiting-reply result, the next inbound message for that
//!   thread is a resume.** No special call is needed; the service handles
//!   it as long as the message reaches the same thread id.

use async_trait::async_trait;
use thiserror::Error;

/// Channel delivery failure
#[derive(Error, Debug)]
pub enum ChannelError {
    /// The message could not be delivered
    #[error("Delivery failed: {0}")]
    Delivery(String),
}

/// One inbound user message, normalized by the adapter
#[derive(Debug, Clone, PartialEq)]
pub struct InboundMessage {
    /// Conversation thread id, stable per user (e.g. "whatsapp_51999...")
    pub thread_id: String,

    /// Plain message text
    pub text: String,
}

impl InboundMessage {
    /// Inbound message for the given thread
    pub fn new(thread_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            thread_id: thread_id.into(),
            text: text.into(),
        }
    }
}

/// Outbound side of a messaging channel
#[async_trait]
pub trait ChannelAdapter: Send + Sync {
    /// Deliver an answer to the user behind a thread
    async fn deliver(&self, thread_id: &str, answer: &str) -> Result<(), ChannelError>;
}
