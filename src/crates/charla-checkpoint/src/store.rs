//! The `CheckpointStore` trait
//!
//! Storage backends implement this trait to persist thread state. The store
//! holds exactly one checkpoint per thread: `put` replaces whatever was
//! there before (last-writer-wins at thread granularity). The engine calls
//! `put` after every execution step and `get` once at the start of each run,
//! so backends should optimize for point reads and writes by thread id.
//!
//! Backends must guarantee that a `put` is atomic per thread: a concurrent
//! `get` sees either the old checkpoint or the new one, never a torn record.
//! Cross-thread coordination is not required; every key is a distinct
//! thread id.
//!
//! Failures are returned as [`CheckpointError`](crate::CheckpointError); the
//! engine retries `put` with exponential backoff before giving up, so a
//! transient backend error should be reported rather than swallowed.

use async_trait::async_trait;

use crate::checkpoint::{Checkpoint, ThreadId};
use crate::error::Result;

/// Durable key-value storage for thread checkpoints
///
/// # Examples
///
/// ```rust
/// use charla_checkpoint::{Checkpoint, CheckpointStore, InMemoryCheckpointStore};
/// use serde_json::json;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let store = InMemoryCheckpointStore::new();
/// store.put("thread-1", Checkpoint::new(json!({"stage": "gathering"}), 0))
///     .await
///     .unwrap();
///
/// let loaded = store.get("thread-1").await.unwrap().unwrap();
/// assert_eq!(loaded.record["stage"], json!("gathering"));
/// # }
/// ```
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    /// Load the current checkpoint for a thread, if one exists
    async fn get(&self, thread_id: &str) -> Result<Option<Checkpoint>>;

    /// Store the checkpoint for a thread, replacing any previous one
    async fn put(&self, thread_id: &str, checkpoint: Checkpoint) -> Result<()>;

    /// Remove all persisted state for a thread
    async fn delete_thread(&self, thread_id: &str) -> Result<()>;

    /// List all threads that currently have a checkpoint
    async fn list_threads(&self) -> Result<Vec<ThreadId>>;
}
