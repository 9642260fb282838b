//! Language model collaborator contract
//!
//! The engine treats the LLM as a black box: full message history plus a
//! system directive in, one assistant [`Message`] out, possibly carrying
//! tool-call requests. Implementations live outside this crate (HTTP
//! clients, local models); tests substitute scripted fakes. Failures map to
//! the executor's recoverable-error path, never to a crash.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::messages::Message;

/// Tool advertised to the model
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolSchema {
    /// Tool name the model uses in tool calls
    pub name: String,

    /// What the tool does, for the model's benefit
    pub description: String,

    /// JSON schema of the arguments object
    pub parameters: Value,
}

/// Chat completion collaborator
///
/// # Examples
///
/// A scripted fake for tests:
///
/// ```rust
/// use charla_core::{ChatModel, Message, ToolSchema, Result};
/// use async_trait::async_trait;
///
/// struct EchoModel;
///
/// #[async_trait]
/// impl ChatModel for EchoModel {
///     async fn complete(
///         &self,
///         _system: &str,
///         messages: &[Message],
///         _tools: &[ToolSchema],
///     ) -> Result<Message> {
///         let last = messages.last().map(|m| m.content.clone()).unwrap_or_default();
///         Ok(Message::assistant(last))
///     }
/// }
/// ```
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Produce the next assistant message
    async fn complete(
        &self,
        system_prompt: &str,
        messages: &[Message],
        tools: &[ToolSchema],
    ) -> Result<Message>;
}
