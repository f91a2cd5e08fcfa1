//! Schema bootstrap for the Postgres backend.
//!
//! Statements are idempotent (`IF NOT EXISTS`) and run on startup, so
//! a fresh database needs no separate migration step.

use sqlx::PgPool;

use crate::errors::Result;

const STATEMENTS: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS users (
        id              TEXT PRIMARY KEY,
        email           TEXT NOT NULL,
        display_name    TEXT,
        timezone        TEXT NOT NULL DEFAULT 'UTC',
        created_at      TIMESTAMPTZ NOT NULL,
        updated_at      TIMESTAMPTZ NOT NULL,
        total_sessions  BIGINT NOT NULL DEFAULT 0,
        total_messages  BIGINT NOT NULL DEFAULT 0
    )",
    "CREATE TABLE IF NOT EXISTS sessions (
        id               TEXT PRIMARY KEY,
        user_id          TEXT REFERENCES users(id) ON DELETE CASCADE,
        title            TEXT NOT NULL,
        kind             TEXT NOT NULL DEFAULT 'general',
        is_active        BOOLEAN NOT NULL DEFAULT TRUE,
        created_at       TIMESTAMPTZ NOT NULL,
        updated_at       TIMESTAMPTZ NOT NULL,
        last_activity_at TIMESTAMPTZ NOT NULL,
        message_count    BIGINT NOT NULL DEFAULT 0,
        context_summary  TEXT
    )",
    "CREATE INDEX IF NOT EXISTS idx_sessions_user_activity
        ON sessions (user_id, last_activity_at DESC)",
    "CREATE INDEX IF NOT EXISTS idx_sessions_anonymous
        ON sessions (last_activity_at) WHERE user_id IS NULL",
    "CREATE TABLE IF NOT EXISTS messages (
        id               TEXT PRIMARY KEY,
        session_id       TEXT NOT NULL REFERENCES sessions(id) ON DELETE CASCADE,
        role             TEXT NOT NULL,
        content          TEXT NOT NULL,
        created_at       TIMESTAMPTZ NOT NULL,
        model            TEXT,
        input_tokens     BIGINT,
        output_tokens    BIGINT,
        cost_usd         DOUBLE PRECISION,
        sources          TEXT,
        response_time_ms BIGINT
    )",
    "CREATE INDEX IF NOT EXISTS idx_messages_session_created
        ON messages (session_id, created_at)",
];

/// Create tables and indexes if they do not exist.
pub async fn ensure_schema(pool: &PgPool) -> Result<()> {
    for stmt in STATEMENTS {
        let _ = sqlx::query(stmt).execute(pool).await?;
    }
    Ok(())
}
