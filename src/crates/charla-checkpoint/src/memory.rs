//! In-memory checkpoint store
//!
//! Reference implementation of [`CheckpointStore`] backed by a
//! `tokio::sync::RwLock<HashMap>`. State lives only as long as the process,
//! which makes this backend suitable for development, unit tests, and
//! single-run tools, and unsuitable for anything that must survive a
//! restart.
//!
//! The write lock is held only for the duration of a map insert or remove,
//! so reads from other threads' checkpoints are never blocked for long.
//!
//! # Examples
//!
//! ```rust
//! use charla_checkpoint::{Checkpoint, CheckpointStore, InMemoryCheckpointStore};
//! use serde_json::json;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let store = InMemoryCheckpointStore::new();
//!
//! store.put("user-42", Checkpoint::new(json!({"stage": "gathering"}), 0))
//!     .await
//!     .unwrap();
//! assert_eq!(store.thread_count().await, 1);
//!
//! store.delete_thread("user-42").await.unwrap();
//! assert_eq!(store.thread_count().await, 0);
//! # }
//! ```

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::checkpoint::{Checkpoint, ThreadId};
use crate::error::Result;
use crate::store::CheckpointStore;

/// In-memory reference implementation of [`CheckpointStore`]
#[derive(Default)]
pub struct InMemoryCheckpointStore {
    threads: RwLock<HashMap<ThreadId, Checkpoint>>,
}

impl InMemoryCheckpointStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            threads: RwLock::new(HashMap::new()),
        }
    }

    /// Number of threads with a stored checkpoint (test helper)
    pub async fn thread_count(&self) -> usize {
        self.threads.read().await.len()
    }

    /// Drop all stored checkpoints (test helper)
    pub async fn clear(&self) {
        self.threads.write().await.clear();
    }
}

#[async_trait]
impl CheckpointStore for InMemoryCheckpointStore {
    async fn get(&self, thread_id: &str) -> Result<Option<Checkpoint>> {
        Ok(self.threads.read().await.get(thread_id).cloned())
    }

    async fn put(&self, thread_id: &str, checkpoint: Checkpoint) -> Result<()> {
        self.threads
            .write()
            .await
            .insert(thread_id.to_string(), checkpoint);
        Ok(())
    }

    async fn delete_thread(&self, thread_id: &str) -> Result<()> {
        self.threads.write().await.remove(thread_id);
        Ok(())
    }

    async fn list_threads(&self) -> Result<Vec<ThreadId>> {
        Ok(self.threads.read().await.keys().cloned().collect())
    }
}
