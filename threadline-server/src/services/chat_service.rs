//! Chat submission flow: message sanitation, thread reconciliation, the
//! completion round trip, and title upkeep.
//!
//! Submissions are serialized per `(owner_id, thread_id)` so two concurrent
//! sends into the same thread commit whole user/assistant pairs in order.
//! Different threads never contend.

use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use shared::models::{Message, Thread};
use shared::thread_ref::ThreadRef;
use shared::title::{derive_title, needs_title_refresh, sanitize};

use crate::services::completion::CompletionClient;
use crate::services::thread_store::{StoreError, ThreadStore};

#[derive(Debug, Error)]
pub enum ChatServiceError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("completion upstream failed: {0}")]
    Upstream(String),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Result of one chat submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatOutcome {
    /// The assistant's reply.
    pub reply: String,
    /// Canonical id of the thread the exchange landed in. Differs from the
    /// submitted id when a local thread was promoted or no id was given.
    pub thread_id: String,
}

/// How an incoming thread reference resolved against the store.
enum Resolved {
    Existing(Thread),
    Created(Thread),
}

pub struct ChatService {
    store: Arc<dyn ThreadStore>,
    completion: Arc<dyn CompletionClient>,
    submission_locks: Mutex<HashMap<(Uuid, String), Arc<Mutex<()>>>>,
}

impl ChatService {
    #[must_use]
    pub fn new(store: Arc<dyn ThreadStore>, completion: Arc<dyn CompletionClient>) -> Self {
        Self {
            store,
            completion,
            submission_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Handles one chat submission end to end.
    ///
    /// The user message is committed before the completion call, so a failing
    /// upstream never loses what the user typed.
    ///
    /// # Errors
    /// Returns [`ChatServiceError::Validation`] when the message sanitizes to
    /// nothing, [`ChatServiceError::Upstream`] when the completion call fails,
    /// and store errors otherwise.
    #[instrument(skip(self, message), fields(owner_id = %owner_id))]
    pub async fn handle_chat(
        &self,
        owner_id: Uuid,
        thread_ref: Option<ThreadRef>,
        message: &str,
    ) -> Result<ChatOutcome, ChatServiceError> {
        let message = sanitize(message);
        if message.is_empty() {
            return Err(ChatServiceError::Validation(
                "Message is required".to_string(),
            ));
        }

        let canonical_id = match &thread_ref {
            // Local ids never reach storage: promotion mints a fresh
            // canonical id.
            Some(ThreadRef::Canonical(id)) => id.clone(),
            Some(ThreadRef::Local(_)) | None => Uuid::new_v4().to_string(),
        };

        let lock = self.lock_for(owner_id, &canonical_id).await;
        let result = {
            let _guard = lock.lock().await;
            self.submit(owner_id, &canonical_id, &message).await
        };
        self.evict_lock(owner_id, &canonical_id, &lock).await;
        result
    }

    async fn submit(
        &self,
        owner_id: Uuid,
        canonical_id: &str,
        message: &str,
    ) -> Result<ChatOutcome, ChatServiceError> {
        let resolved = self.resolve(owner_id, canonical_id, message).await?;
        let thread = match resolved {
            Resolved::Existing(thread) => {
                let thread = self
                    .store
                    .append_messages(owner_id, &thread.thread_id, &[Message::user(message)])
                    .await?;
                self.refresh_title_if_needed(&thread, message).await?
            }
            Resolved::Created(thread) => {
                info!(thread_id = %thread.thread_id, "thread created");
                self.store
                    .append_messages(owner_id, &thread.thread_id, &[Message::user(message)])
                    .await?
            }
        };

        let reply = match self.completion.complete(&thread.messages).await {
            Ok(reply) => reply,
            Err(err) => {
                // The user message stays committed.
                warn!(thread_id = %thread.thread_id, error = %err, "completion failed");
                return Err(ChatServiceError::Upstream(err.to_string()));
            }
        };

        self.store
            .append_messages(owner_id, &thread.thread_id, &[Message::assistant(&reply)])
            .await?;

        Ok(ChatOutcome {
            reply,
            thread_id: thread.thread_id,
        })
    }

    async fn resolve(
        &self,
        owner_id: Uuid,
        canonical_id: &str,
        message: &str,
    ) -> Result<Resolved, ChatServiceError> {
        if let Some(existing) = self.store.find_thread(owner_id, canonical_id).await? {
            return Ok(Resolved::Existing(existing));
        }

        let title = derive_title(None, Some(message));
        let thread = Thread::new(owner_id, canonical_id, title);
        match self.store.create_thread(thread).await {
            Ok(created) => Ok(Resolved::Created(created)),
            // Lost a race with another owner's identical id; surface as a
            // plain store failure.
            Err(err) => Err(err.into()),
        }
    }

    /// Replaces a blank or artifact-ridden title with one derived from the
    /// message just submitted.
    async fn refresh_title_if_needed(
        &self,
        thread: &Thread,
        message: &str,
    ) -> Result<Thread, ChatServiceError> {
        if !needs_title_refresh(&thread.title) {
            return Ok(thread.clone());
        }

        let title = derive_title(None, Some(message));
        match self
            .store
            .rename_thread(thread.owner_id, &thread.thread_id, &title)
            .await?
        {
            Some(renamed) => Ok(renamed),
            None => Err(ChatServiceError::NotFound("Thread not found".to_string())),
        }
    }

    async fn lock_for(&self, owner_id: Uuid, thread_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.submission_locks.lock().await;
        locks
            .entry((owner_id, thread_id.to_string()))
            .or_default()
            .clone()
    }

    /// Drops a lock map entry once no submission holds it, so the map stays
    /// bounded by in-flight submissions rather than growing per thread ever
    /// touched.
    async fn evict_lock(&self, owner_id: Uuid, thread_id: &str, lock: &Arc<Mutex<()>>) {
        let mut locks = self.submission_locks.lock().await;
        // Two strong references means only the map entry and this caller
        // still hold the lock; `lock_for` also takes the map mutex, so no
        // waiter can appear mid-check.
        if Arc::strong_count(lock) == 2 {
            locks.remove(&(owner_id, thread_id.to_string()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use shared::models::MessageRole;

    use crate::services::completion::{CompletionError, CompletionClient};
    use crate::services::thread_store::MemoryThreadStore;

    struct ScriptedCompletion {
        reply: String,
        calls: AtomicUsize,
        delay_first_call: bool,
    }

    impl ScriptedCompletion {
        fn replying(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: reply.to_string(),
                calls: AtomicUsize::new(0),
                delay_first_call: false,
            })
        }

        fn slow_first(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: reply.to_string(),
                calls: AtomicUsize::new(0),
                delay_first_call: true,
            })
        }
    }

    #[async_trait]
    impl CompletionClient for ScriptedCompletion {
        async fn complete(&self, _messages: &[Message]) -> Result<String, CompletionError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if self.delay_first_call && call == 0 {
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
            Ok(self.reply.clone())
        }
    }

    struct FailingCompletion;

    #[async_trait]
    impl CompletionClient for FailingCompletion {
        async fn complete(&self, _messages: &[Message]) -> Result<String, CompletionError> {
            Err(CompletionError::Status {
                status: 502,
                body: "bad gateway".to_string(),
            })
        }
    }

    fn service(completion: Arc<dyn CompletionClient>) -> (ChatService, Arc<MemoryThreadStore>) {
        let store = Arc::new(MemoryThreadStore::new());
        (ChatService::new(store.clone(), completion), store)
    }

    #[tokio::test]
    async fn blank_message_fails_validation() {
        let (svc, _) = service(ScriptedCompletion::replying("hi"));
        let result = svc.handle_chat(Uuid::new_v4(), None, "   ").await;
        assert!(matches!(result, Err(ChatServiceError::Validation(_))));
    }

    #[tokio::test]
    async fn artifact_only_message_fails_validation() {
        let (svc, _) = service(ScriptedCompletion::replying("hi"));
        let result = svc.handle_chat(Uuid::new_v4(), None, "undefined").await;
        assert!(matches!(result, Err(ChatServiceError::Validation(_))));
    }

    #[tokio::test]
    async fn first_message_creates_a_titled_thread() {
        let (svc, store) = service(ScriptedCompletion::replying("hello back"));
        let owner = Uuid::new_v4();

        let outcome = svc
            .handle_chat(owner, None, "Tell me about rust lifetimes")
            .await
            .unwrap();
        assert_eq!(outcome.reply, "hello back");

        let thread = store
            .find_thread(owner, &outcome.thread_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(thread.title, "Tell me about rust lifetimes");
        assert_eq!(thread.messages.len(), 2);
        assert_eq!(thread.messages[0].role, MessageRole::User);
        assert_eq!(thread.messages[1].role, MessageRole::Assistant);
    }

    #[tokio::test]
    async fn local_reference_is_promoted_to_a_fresh_canonical_id() {
        let (svc, store) = service(ScriptedCompletion::replying("ok"));
        let owner = Uuid::new_v4();

        let local = ThreadRef::new_local();
        let outcome = svc
            .handle_chat(owner, Some(local.clone()), "hello")
            .await
            .unwrap();

        assert_ne!(outcome.thread_id, local.to_string());
        assert!(!outcome.thread_id.starts_with("local-"));
        assert!(
            store
                .find_thread(owner, &outcome.thread_id)
                .await
                .unwrap()
                .is_some()
        );
    }

    #[tokio::test]
    async fn existing_thread_accumulates_messages_and_keeps_its_title() {
        let (svc, store) = service(ScriptedCompletion::replying("ok"));
        let owner = Uuid::new_v4();

        let first = svc.handle_chat(owner, None, "first question").await.unwrap();
        let reference = ThreadRef::Canonical(first.thread_id.clone());
        svc.handle_chat(owner, Some(reference), "second question")
            .await
            .unwrap();

        let thread = store
            .find_thread(owner, &first.thread_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(thread.title, "first question");
        assert_eq!(thread.messages.len(), 4);
    }

    #[tokio::test]
    async fn unknown_canonical_id_is_upserted() {
        let (svc, store) = service(ScriptedCompletion::replying("ok"));
        let owner = Uuid::new_v4();

        let reference = ThreadRef::Canonical("caller-chosen-id".to_string());
        let outcome = svc
            .handle_chat(owner, Some(reference), "hello")
            .await
            .unwrap();

        assert_eq!(outcome.thread_id, "caller-chosen-id");
        assert!(
            store
                .find_thread(owner, "caller-chosen-id")
                .await
                .unwrap()
                .is_some()
        );
    }

    #[tokio::test]
    async fn upstream_failure_keeps_the_user_message() {
        let (svc, store) = service(Arc::new(FailingCompletion));
        let owner = Uuid::new_v4();

        let reference = ThreadRef::Canonical("t-1".to_string());
        let result = svc.handle_chat(owner, Some(reference), "hello").await;
        assert!(matches!(result, Err(ChatServiceError::Upstream(_))));

        let thread = store.find_thread(owner, "t-1").await.unwrap().unwrap();
        assert_eq!(thread.messages.len(), 1);
        assert_eq!(thread.messages[0].content, "hello");
    }

    #[tokio::test]
    async fn stale_title_is_refreshed_from_the_new_message() {
        let (svc, store) = service(ScriptedCompletion::replying("ok"));
        let owner = Uuid::new_v4();

        let mut thread = Thread::new(owner, "t-1", "undefined");
        thread.messages.push(Message::user("old first question"));
        store.create_thread(thread).await.unwrap();

        let reference = ThreadRef::Canonical("t-1".to_string());
        svc.handle_chat(owner, Some(reference), "brand new question")
            .await
            .unwrap();

        let refreshed = store.find_thread(owner, "t-1").await.unwrap().unwrap();
        assert_eq!(refreshed.title, "brand new question");
    }

    #[tokio::test]
    async fn healthy_titles_are_left_alone() {
        let (svc, store) = service(ScriptedCompletion::replying("ok"));
        let owner = Uuid::new_v4();

        let mut thread = Thread::new(owner, "t-1", "Borrow checker basics");
        thread.messages.push(Message::user("first question"));
        store.create_thread(thread).await.unwrap();

        let reference = ThreadRef::Canonical("t-1".to_string());
        svc.handle_chat(owner, Some(reference), "second question")
            .await
            .unwrap();

        let thread = store.find_thread(owner, "t-1").await.unwrap().unwrap();
        assert_eq!(thread.title, "Borrow checker basics");
    }

    #[tokio::test]
    async fn submission_locks_are_released_after_each_send() {
        let (svc, _) = service(ScriptedCompletion::replying("ok"));
        let owner = Uuid::new_v4();

        svc.handle_chat(owner, None, "hello").await.unwrap();
        assert!(svc.submission_locks.lock().await.is_empty());

        // Failed submissions release their lock too.
        let (failing, _) = service(Arc::new(FailingCompletion));
        let reference = ThreadRef::Canonical("t-1".to_string());
        let _ = failing.handle_chat(owner, Some(reference), "hello").await;
        assert!(failing.submission_locks.lock().await.is_empty());
    }

    #[tokio::test]
    async fn derived_titles_are_capped_at_fifty_characters() {
        let (svc, store) = service(ScriptedCompletion::replying("ok"));
        let owner = Uuid::new_v4();

        let long = "x".repeat(80);
        let outcome = svc.handle_chat(owner, None, &long).await.unwrap();

        let thread = store
            .find_thread(owner, &outcome.thread_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(thread.title.chars().count(), 50);
    }

    #[tokio::test]
    async fn concurrent_submissions_commit_whole_pairs_in_order() {
        let (svc, store) = service(ScriptedCompletion::slow_first("ok"));
        let owner = Uuid::new_v4();
        let svc = Arc::new(svc);

        let reference = ThreadRef::Canonical("t-1".to_string());
        let (a, b) = tokio::join!(
            svc.handle_chat(owner, Some(reference.clone()), "first"),
            svc.handle_chat(owner, Some(reference), "second"),
        );
        a.unwrap();
        b.unwrap();

        let thread = store.find_thread(owner, "t-1").await.unwrap().unwrap();
        let roles: Vec<MessageRole> = thread.messages.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![
                MessageRole::User,
                MessageRole::Assistant,
                MessageRole::User,
                MessageRole::Assistant,
            ]
        );
        assert!(svc.submission_locks.lock().await.is_empty());
    }
}
