//! Schema bootstrap and liveness probes for the Postgres pool.

use sqlx::PgPool;
use tracing::info;

/// Creates the tables the server needs if they do not exist yet.
///
/// # Errors
/// Returns the underlying database error when a statement fails.
pub async fn ensure_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS users (
            id UUID PRIMARY KEY,
            username TEXT NOT NULL,
            email TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL
        )",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS threads (
            thread_id TEXT PRIMARY KEY,
            owner_id UUID NOT NULL,
            title TEXT NOT NULL,
            messages JSONB NOT NULL DEFAULT '[]'::jsonb,
            updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
        )",
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS threads_owner_updated ON threads (owner_id, updated_at DESC)")
        .execute(pool)
        .await?;

    info!("database schema ready");
    Ok(())
}

/// Round-trips a trivial query; used by the readiness probe.
///
/// # Errors
/// Returns the underlying database error when the pool is unreachable.
pub async fn ping(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}
