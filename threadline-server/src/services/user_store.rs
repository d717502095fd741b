//! User account persistence contract and the in-memory implementation.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::thread_store::{StoreError, StoreResult};

/// A persisted account. The password is stored only as an argon2 hash.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Persists a new account. Fails with [`StoreError::DuplicateId`] when the
    /// email is already registered.
    async fn create_user(&self, user: UserRecord) -> StoreResult<UserRecord>;

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<UserRecord>>;

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<UserRecord>>;

    /// Replaces the stored password hash for `id`.
    async fn update_password(&self, id: Uuid, password_hash: &str) -> StoreResult<()>;
}

/// In-memory store used by tests and database-less dev mode.
#[derive(Debug, Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<Uuid, UserRecord>>,
}

impl MemoryUserStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn create_user(&self, user: UserRecord) -> StoreResult<UserRecord> {
        let mut users = self.users.write().await;
        if users.values().any(|existing| existing.email == user.email) {
            return Err(StoreError::DuplicateId(user.email));
        }
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<UserRecord>> {
        let users = self.users.read().await;
        Ok(users.values().find(|user| user.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<UserRecord>> {
        let users = self.users.read().await;
        Ok(users.get(&id).cloned())
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> StoreResult<()> {
        let mut users = self.users.write().await;
        let user = users.get_mut(&id).ok_or(StoreError::NotFound)?;
        user.password_hash = password_hash.to_string();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(email: &str) -> UserRecord {
        UserRecord {
            id: Uuid::new_v4(),
            username: "tester".into(),
            email: email.into(),
            password_hash: "hash".into(),
        }
    }

    #[tokio::test]
    async fn create_and_lookup_by_email() {
        let store = MemoryUserStore::new();
        let created = store.create_user(record("a@example.com")).await.unwrap();

        let found = store.find_by_email("a@example.com").await.unwrap();
        assert_eq!(found.map(|user| user.id), Some(created.id));
        assert!(store.find_by_email("b@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let store = MemoryUserStore::new();
        store.create_user(record("a@example.com")).await.unwrap();
        let result = store.create_user(record("a@example.com")).await;
        assert!(matches!(result, Err(StoreError::DuplicateId(_))));
    }

    #[tokio::test]
    async fn update_password_replaces_hash() {
        let store = MemoryUserStore::new();
        let created = store.create_user(record("a@example.com")).await.unwrap();

        store.update_password(created.id, "new-hash").await.unwrap();
        let found = store.find_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(found.password_hash, "new-hash");
    }

    #[tokio::test]
    async fn update_password_for_unknown_user_is_not_found() {
        let store = MemoryUserStore::new();
        let result = store.update_password(Uuid::new_v4(), "new-hash").await;
        assert!(matches!(result, Err(StoreError::NotFound)));
    }
}
