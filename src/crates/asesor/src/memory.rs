//! Long-term profile memory
//!
//! The [`MemoryStore`] collaborator persists the business profile outside
//! the conversation state so it survives a thread reset and can seed future
//! conversations. Persistence is fire-and-forget from the engine's
//! perspective: the supervisor logs failures and moves on, a memory outage
//! never breaks a conversation.
//!
//! Similarity search over past conversations lives behind the same kind of
//! boundary in the production deployment; this crate only defines the
//! contract and an in-memory stand-in.

use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::profile::BusinessProfile;

/// Memory backend failure
#[derive(Error, Debug)]
pub enum MemoryError {
    /// The backing store failed
    #[error("Memory backend error: {0}")]
    Backend(String),
}

/// Long-term storage for business profiles, keyed by thread
#[async_trait]
pub trait MemoryStore: Send + Sync {
    /// Persist the profile for a thread (fire-and-forget for callers)
    async fn persist(
        &self,
        thread_id: &str,
        profile: &BusinessProfile,
    ) -> Result<(), MemoryError>;

    /// Recall a previously persisted profile
    async fn recall(&self, thread_id: &str) -> Result<Option<BusinessProfile>, MemoryError>;
}

/// In-memory reference implementation
#[derive(Default)]
pub struct InMemoryMemoryStore {
    profiles: RwLock<HashMap<String, BusinessProfile>>,
}

impl InMemoryMemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MemoryStore for InMemoryMemoryStore {
    async fn persist(
        &self,
        thread_id: &str,
        profile: &BusinessProfile,
    ) -> Result<(), MemoryError> {
        self.profiles
            .write()
            .await
            .insert(thread_id.to_string(), profile.clone());
        Ok(())
    }

    async fn recall(&self, thread_id: &str) -> Result<Option<BusinessProfile>, MemoryError> {
        Ok(self.profiles.read().await.get(thread_id).cloned())
    }
}
