//! Postgres-backed stores. Threads are stored as one row each with the
//! message list in a `jsonb` column; appends concatenate into that column and
//! refresh `updated_at` in the same statement.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, types::Json};
use uuid::Uuid;

use shared::models::{Message, Thread, Timestamp};

use super::thread_store::{StoreError, StoreResult, ThreadStore};
use super::user_store::{UserRecord, UserStore};

#[derive(Debug, FromRow)]
struct ThreadRow {
    thread_id: String,
    owner_id: Uuid,
    title: String,
    messages: Json<Vec<Message>>,
    updated_at: DateTime<Utc>,
}

impl From<ThreadRow> for Thread {
    fn from(row: ThreadRow) -> Self {
        Self {
            thread_id: row.thread_id,
            owner_id: row.owner_id,
            title: row.title,
            messages: row.messages.0,
            updated_at: Timestamp(row.updated_at),
        }
    }
}

const THREAD_COLUMNS: &str = "thread_id, owner_id, title, messages, updated_at";

#[derive(Clone)]
pub struct PgThreadStore {
    pool: PgPool,
}

impl PgThreadStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_insert_error(err: sqlx::Error, id: String) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::DuplicateId(id),
        _ => StoreError::Database(err),
    }
}

#[async_trait]
impl ThreadStore for PgThreadStore {
    async fn create_thread(&self, thread: Thread) -> StoreResult<Thread> {
        let query = format!(
            "INSERT INTO threads ({THREAD_COLUMNS}) VALUES ($1, $2, $3, $4, $5) \
             RETURNING {THREAD_COLUMNS}"
        );
        let row: ThreadRow = sqlx::query_as(&query)
            .bind(&thread.thread_id)
            .bind(thread.owner_id)
            .bind(&thread.title)
            .bind(Json(&thread.messages))
            .bind(thread.updated_at.0)
            .fetch_one(&self.pool)
            .await
            .map_err(|err| map_insert_error(err, thread.thread_id.clone()))?;
        Ok(row.into())
    }

    async fn find_thread(&self, owner_id: Uuid, thread_id: &str) -> StoreResult<Option<Thread>> {
        let query = format!(
            "SELECT {THREAD_COLUMNS} FROM threads WHERE thread_id = $1 AND owner_id = $2"
        );
        let row: Option<ThreadRow> = sqlx::query_as(&query)
            .bind(thread_id)
            .bind(owner_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Into::into))
    }

    async fn append_messages(
        &self,
        owner_id: Uuid,
        thread_id: &str,
        messages: &[Message],
    ) -> StoreResult<Thread> {
        let query = format!(
            "UPDATE threads SET messages = messages || $3::jsonb, updated_at = now() \
             WHERE thread_id = $1 AND owner_id = $2 RETURNING {THREAD_COLUMNS}"
        );
        let row: Option<ThreadRow> = sqlx::query_as(&query)
            .bind(thread_id)
            .bind(owner_id)
            .bind(Json(messages))
            .fetch_optional(&self.pool)
            .await?;
        row.map(Into::into).ok_or(StoreError::NotFound)
    }

    async fn rename_thread(
        &self,
        owner_id: Uuid,
        thread_id: &str,
        title: &str,
    ) -> StoreResult<Option<Thread>> {
        let query = format!(
            "UPDATE threads SET title = $3, updated_at = now() \
             WHERE thread_id = $1 AND owner_id = $2 RETURNING {THREAD_COLUMNS}"
        );
        let row: Option<ThreadRow> = sqlx::query_as(&query)
            .bind(thread_id)
            .bind(owner_id)
            .bind(title)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Into::into))
    }

    async fn list_threads(&self, owner_id: Uuid) -> StoreResult<Vec<Thread>> {
        let query = format!(
            "SELECT {THREAD_COLUMNS} FROM threads WHERE owner_id = $1 ORDER BY updated_at DESC"
        );
        let rows: Vec<ThreadRow> = sqlx::query_as(&query)
            .bind(owner_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn delete_thread(&self, owner_id: Uuid, thread_id: &str) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM threads WHERE thread_id = $1 AND owner_id = $2")
            .bind(thread_id)
            .bind(owner_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[derive(Debug, FromRow)]
struct UserRow {
    id: Uuid,
    username: String,
    email: String,
    password_hash: String,
}

impl From<UserRow> for UserRecord {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            username: row.username,
            email: row.email,
            password_hash: row.password_hash,
        }
    }
}

#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn create_user(&self, user: UserRecord) -> StoreResult<UserRecord> {
        let row: UserRow = sqlx::query_as(
            "INSERT INTO users (id, username, email, password_hash) VALUES ($1, $2, $3, $4) \
             RETURNING id, username, email, password_hash",
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|err| map_insert_error(err, user.email.clone()))?;
        Ok(row.into())
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<UserRecord>> {
        let row: Option<UserRow> = sqlx::query_as(
            "SELECT id, username, email, password_hash FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Into::into))
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<UserRecord>> {
        let row: Option<UserRow> = sqlx::query_as(
            "SELECT id, username, email, password_hash FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Into::into))
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> StoreResult<()> {
        let result = sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}
