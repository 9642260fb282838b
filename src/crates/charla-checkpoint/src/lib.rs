//! # charla-checkpoint - Durable State for Conversation Threads
//!
//! Checkpoint contract and reference implementation for persisting the state
//! of conversation threads between turns and across process restarts.
//!
//! ## Overview
//!
//! The conversation engine persists a [`Checkpoint`] after every execution
//! step. A checkpoint is the complete, serialized state record of one thread
//! wrapped in a small envelope (id, timestamp, step counter). The store keeps
//! exactly one checkpoint per thread: each `put` replaces the previous one.
//! That single-record contract is what makes suspension survivable; when a
//! thread is paused waiting for user input, the pending interrupt travels
//! inside the record, so a process restart loses nothing.
//!
//! ## Core pieces
//!
//! - [`CheckpointStore`] - async trait implemented by storage backends:
//!   `get`, `put`, `delete_thread`, `list_threads`, all keyed by thread id.
//! - [`Checkpoint`] - versioned envelope around the serialized state record.
//! - [`InMemoryCheckpointStore`] - reference backend for development and
//!   tests, backed by a `tokio::sync::RwLock<HashMap>`.
//! - [`SerializerProtocol`] - byte-level encoding for backends that store
//!   blobs ([`JsonSerializer`] for debuggability, [`BincodeSerializer`] for
//!   compactness).
//!
//! ## Durability contract
//!
//! Writes are at-least-once: the engine retries failed `put` calls with
//! bounded exponential backoff and surfaces a terminal error only after
//! retries exhaust. A `put` must be atomic at thread granularity; a reader
//! never observes a torn record. Concurrent writers to the *same* thread are
//! a caller-side error (the engine requires at most one active run per
//! thread); writers to different threads never contend on anything but the
//! map itself.
//!
//! ## Implementing a backend
//!
//! ```rust,ignore
//! use charla_checkpoint::{Checkpoint, CheckpointStore, Result, ThreadId};
//! use async_trait::async_trait;
//!
//! struct PostgresCheckpointStore { pool: sqlx::PgPool }
//!
//! #[async_trait]
//! impl CheckpointStore for PostgresCheckpointStore {
//!     async fn get(&self, thread_id: &str) -> Result<Option<Checkpoint>> {
//!         // SELECT data FROM checkpoints WHERE thread_id = $1
//!         # unimplemented!()
//!     }
//!
//!     async fn put(&self, thread_id: &str, checkpoint: Checkpoint) -> Result<()> {
//!         // INSERT ... ON CONFLICT (thread_id) DO UPDATE SET data = $2
//!         # unimplemented!()
//!     }
//!
//!     async fn delete_thread(&self, thread_id: &str) -> Result<()> {
//!         # unimplemented!()
//!     }
//!
//!     async fn list_threads(&self) -> Result<Vec<ThreadId>> {
//!         # unimplemented!()
//!     }
//! }
//! ```

pub mod checkpoint;
pub mod error;
pub mod memory;
pub mod serializer;
pub mod store;

pub use checkpoint::{Checkpoint, CheckpointId, ThreadId};
pub use error::{CheckpointError, Result};
pub use memory::InMemoryCheckpointStore;
pub use serializer::{BincodeSerializer, JsonSerializer, SerializerProtocol};
pub use store::CheckpointStore;
