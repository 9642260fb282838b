//! Message types for conversation history
//!
//! The engine stores history as an ordered, append-only sequence of
//! [`Message`] values. Append order is conversation order; the engine never
//! reorders or deduplicates. An assistant message may carry tool-call
//! requests; each tool result is its own message addressed by the matching
//! call id.
//!
//! # Examples
//!
//! ```rust
//! use charla_core::{Message, ToolCall};
//! use serde_json::json;
//!
//! let user = Message::user("Tengo una panadería en Lima");
//! assert!(user.is_user());
//!
//! let assistant = Message::assistant("Voy a buscar datos del sector")
//!     .with_tool_calls(vec![ToolCall::new("call-1", "search", json!({"query": "panaderías Lima"}))]);
//! assert!(assistant.has_tool_calls());
//!
//! let result = Message::tool("3 resultados encontrados", "call-1");
//! assert_eq!(result.tool_call_id.as_deref(), Some("call-1"));
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// A tool invocation requested by the assistant
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolCall {
    /// Unique id correlating the request with its result message
    pub id: String,

    /// Name of the tool to invoke
    pub name: String,

    /// Arguments as a JSON object
    pub args: Value,
}

impl ToolCall {
    /// Create a new tool call
    pub fn new(id: impl Into<String>, name: impl Into<String>, args: Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            args,
        }
    }
}

/// Who produced a message
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    /// System directive, never shown to the user
    System,
    /// Inbound user text
    User,
    /// Assistant output (may carry tool calls)
    Assistant,
    /// Result of a tool invocation
    Tool,
}

/// One entry in a thread's conversation history
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    /// Unique message id
    pub id: String,

    /// Role of the producer
    pub role: MessageRole,

    /// Text content
    pub content: String,

    /// Tool calls requested by this message (assistant messages only)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,

    /// Id of the tool call this message answers (tool messages only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,

    /// Optional display name (e.g. the tool that produced a result)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Message {
    fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
            name: None,
        }
    }

    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    /// Create an assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }

    /// Create a system message
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageRole::System, content)
    }

    /// Create a tool result message answering the given call id
    pub fn tool(content: impl Into<String>, tool_call_id: impl Into<String>) -> Self {
        let mut message = Self::new(MessageRole::Tool, content);
        message.tool_call_id = Some(tool_call_id.into());
        message
    }

    /// Attach tool calls to this message
    pub fn with_tool_calls(mut self, tool_calls: Vec<ToolCall>) -> Self {
        self.tool_calls = tool_calls;
        self
    }

    /// Attach a display name to this message
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// True if this is a user message
    pub fn is_user(&self) -> bool {
        self.role == MessageRole::User
    }

    /// True if this is an assistant message
    pub fn is_assistant(&self) -> bool {
        self.role == MessageRole::Assistant
    }

    /// True if this is a tool result message
    pub fn is_tool(&self) -> bool {
        self.role == MessageRole::Tool
    }

    /// True if this message requests at least one tool call
    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

/// Find the most recent assistant message in a history slice
pub fn last_assistant(messages: &[Message]) -> Option<&Message> {
    messages.iter().rev().find(|m| m.is_assistant())
}

/// Find the most recent user message in a history slice
pub fn last_user(messages: &[Message]) -> Option<&Message> {
    messages.iter().rev().find(|m| m.is_user())
}
