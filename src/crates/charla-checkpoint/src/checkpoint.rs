//! Checkpoint envelope types
//!
//! A [`Checkpoint`] wraps the serialized state record of one conversation
//! thread together with the bookkeeping the store needs: a unique id, a
//! creation timestamp, and the step counter at which it was taken. The
//! engine writes one after every execution step, so the latest checkpoint
//! for a thread is always a consistent, resumable snapshot.
//!
//! The record itself is carried as an opaque `serde_json::Value`. The store
//! does not interpret it; the engine owns the schema. This keeps the
//! persistence layer decoupled from state-record evolution.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Opaque conversation thread identifier
pub type ThreadId = String;

/// Unique identifier of a single checkpoint
pub type CheckpointId = String;

/// A durable snapshot of one thread's state record
///
/// # Examples
///
/// ```rust
/// use charla_checkpoint::Checkpoint;
/// use serde_json::json;
///
/// let ckpt = Checkpoint::new(json!({"messages": [], "stage": "gathering"}), 0);
/// assert_eq!(ckpt.step, 0);
/// assert!(!ckpt.id.is_empty());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Checkpoint {
    /// Unique id of this checkpoint
    pub id: CheckpointId,

    /// Creation timestamp, RFC 3339
    pub ts: String,

    /// Step counter within the run that produced this checkpoint
    pub step: u32,

    /// The serialized state record
    pub record: Value,
}

impl Checkpoint {
    /// Create a checkpoint for the given record at the given step
    pub fn new(record: Value, step: u32) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            ts: Utc::now().to_rfc3339(),
            step,
            record,
        }
    }
}
