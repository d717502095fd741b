//! Thread persistence contract and the in-memory implementation.
//!
//! Every operation is scoped by `(owner_id, thread_id)`: no call can observe
//! or mutate another owner's thread. `append_messages` is atomic with the
//! `updated_at` refresh, so the stored timestamp always reflects the latest
//! committed append.

use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

use shared::models::{Message, Thread, Timestamp};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("thread not found")]
    NotFound,
    #[error("thread id already exists: {0}")]
    DuplicateId(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Owner-scoped thread collection.
#[async_trait]
pub trait ThreadStore: Send + Sync {
    /// Persists a new thread. Fails with [`StoreError::DuplicateId`] when the
    /// identifier is already taken.
    async fn create_thread(&self, thread: Thread) -> StoreResult<Thread>;

    async fn find_thread(&self, owner_id: Uuid, thread_id: &str) -> StoreResult<Option<Thread>>;

    /// Appends `messages` to an existing thread and refreshes `updated_at` in
    /// the same committed write. Returns the updated thread.
    async fn append_messages(
        &self,
        owner_id: Uuid,
        thread_id: &str,
        messages: &[Message],
    ) -> StoreResult<Thread>;

    /// Replaces the title and refreshes `updated_at`. `None` when the thread
    /// is absent or owned by someone else.
    async fn rename_thread(
        &self,
        owner_id: Uuid,
        thread_id: &str,
        title: &str,
    ) -> StoreResult<Option<Thread>>;

    /// All threads for `owner_id`, most recently updated first.
    async fn list_threads(&self, owner_id: Uuid) -> StoreResult<Vec<Thread>>;

    /// Deletes a thread; `false` when nothing matched.
    async fn delete_thread(&self, owner_id: Uuid, thread_id: &str) -> StoreResult<bool>;
}

/// In-memory store used by tests and database-less dev mode.
#[derive(Debug, Default)]
pub struct MemoryThreadStore {
    threads: RwLock<HashMap<String, Thread>>,
}

impl MemoryThreadStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ThreadStore for MemoryThreadStore {
    async fn create_thread(&self, thread: Thread) -> StoreResult<Thread> {
        let mut threads = self.threads.write().await;
        if threads.contains_key(&thread.thread_id) {
            return Err(StoreError::DuplicateId(thread.thread_id));
        }
        threads.insert(thread.thread_id.clone(), thread.clone());
        Ok(thread)
    }

    async fn find_thread(&self, owner_id: Uuid, thread_id: &str) -> StoreResult<Option<Thread>> {
        let threads = self.threads.read().await;
        Ok(threads
            .get(thread_id)
            .filter(|thread| thread.owner_id == owner_id)
            .cloned())
    }

    async fn append_messages(
        &self,
        owner_id: Uuid,
        thread_id: &str,
        messages: &[Message],
    ) -> StoreResult<Thread> {
        let mut threads = self.threads.write().await;
        let thread = threads
            .get_mut(thread_id)
            .filter(|thread| thread.owner_id == owner_id)
            .ok_or(StoreError::NotFound)?;

        thread.messages.extend_from_slice(messages);
        thread.updated_at = Timestamp::now();
        Ok(thread.clone())
    }

    async fn rename_thread(
        &self,
        owner_id: Uuid,
        thread_id: &str,
        title: &str,
    ) -> StoreResult<Option<Thread>> {
        let mut threads = self.threads.write().await;
        let Some(thread) = threads
            .get_mut(thread_id)
            .filter(|thread| thread.owner_id == owner_id)
        else {
            return Ok(None);
        };

        thread.title = title.to_string();
        thread.updated_at = Timestamp::now();
        Ok(Some(thread.clone()))
    }

    async fn list_threads(&self, owner_id: Uuid) -> StoreResult<Vec<Thread>> {
        let threads = self.threads.read().await;
        let mut owned: Vec<Thread> = threads
            .values()
            .filter(|thread| thread.owner_id == owner_id)
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(owned)
    }

    async fn delete_thread(&self, owner_id: Uuid, thread_id: &str) -> StoreResult<bool> {
        let mut threads = self.threads.write().await;
        match threads.get(thread_id) {
            Some(thread) if thread.owner_id == owner_id => {
                threads.remove(thread_id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
