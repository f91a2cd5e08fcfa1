//! Postgres store backend.
//!
//! Counters on sessions and users are denormalized and updated in the
//! same transaction as the write that changes them, so list views never
//! need aggregate queries.

mod rows;
mod schema;

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use folio_core::chat::{Message, Session, SessionSummary, User};
use folio_core::ids::new_session_id;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::{debug, instrument, warn};

use crate::errors::{Result, StoreError};
use crate::store::{
    CreateSessionOptions, DEFAULT_SESSION_TITLE, SessionStore, SessionUpdate, check_access,
};
use rows::{MessageRow, SessionRow, UserRow};

const SESSION_COLUMNS: &str = "id, user_id, title, kind, is_active, created_at, updated_at, \
     last_activity_at, message_count, context_summary";

const MESSAGE_COLUMNS: &str = "id, session_id, role, content, created_at, model, input_tokens, \
     output_tokens, cost_usd, sources, response_time_ms";

/// Postgres-backed [`SessionStore`].
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connect to Postgres and ensure the schema exists.
    #[instrument(skip(url))]
    pub async fn connect(
        url: &str,
        max_connections: u32,
        connect_timeout_ms: u64,
    ) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_millis(connect_timeout_ms))
            .connect(url)
            .await?;
        schema::ensure_schema(&pool).await?;
        debug!("postgres store ready");
        Ok(Self { pool })
    }

    /// Wrap an existing pool (tests).
    pub async fn from_pool(pool: PgPool) -> Result<Self> {
        schema::ensure_schema(&pool).await?;
        Ok(Self { pool })
    }

    async fn fetch_session(&self, session_id: &str) -> Result<Session> {
        let sql = format!("SELECT {SESSION_COLUMNS} FROM sessions WHERE id = $1");
        let row: Option<SessionRow> = sqlx::query_as(&sql)
            .bind(session_id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Session::from)
            .ok_or_else(|| StoreError::SessionNotFound(session_id.to_string()))
    }
}

#[async_trait]
impl SessionStore for PgStore {
    async fn create_session(&self, opts: CreateSessionOptions) -> Result<Session> {
        let id = new_session_id();
        let now = Utc::now();
        let title = if opts.title.is_empty() {
            DEFAULT_SESSION_TITLE.to_string()
        } else {
            opts.title
        };

        let sql = format!(
            "INSERT INTO sessions (id, user_id, title, kind, is_active, created_at, updated_at, \
             last_activity_at, message_count)
             VALUES ($1, $2, $3, $4, TRUE, $5, $5, $5, 0)
             RETURNING {SESSION_COLUMNS}"
        );
        let row: SessionRow = sqlx::query_as(&sql)
            .bind(&id)
            .bind(&opts.user_id)
            .bind(&title)
            .bind(opts.kind.as_str())
            .bind(now)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.into())
    }

    async fn get_session(&self, session_id: &str, requester: Option<&str>) -> Result<Session> {
        let session = self.fetch_session(session_id).await?;
        check_access(&session, requester)?;
        Ok(session)
    }

    async fn update_session(
        &self,
        session_id: &str,
        requester: Option<&str>,
        update: SessionUpdate,
    ) -> Result<Session> {
        let session = self.fetch_session(session_id).await?;
        check_access(&session, requester)?;
        if update.is_empty() {
            return Ok(session);
        }

        let sql = format!(
            "UPDATE sessions SET
                title = COALESCE($2, title),
                kind = COALESCE($3, kind),
                is_active = COALESCE($4, is_active),
                context_summary = COALESCE($5, context_summary),
                updated_at = $6
             WHERE id = $1
             RETURNING {SESSION_COLUMNS}"
        );
        let row: SessionRow = sqlx::query_as(&sql)
            .bind(session_id)
            .bind(update.title)
            .bind(update.kind.map(|k| k.as_str().to_string()))
            .bind(update.is_active)
            .bind(update.context_summary)
            .bind(Utc::now())
            .fetch_one(&self.pool)
            .await?;
        Ok(row.into())
    }

    async fn delete_session(&self, session_id: &str, requester: Option<&str>) -> Result<()> {
        let session = self.fetch_session(session_id).await?;
        check_access(&session, requester)?;
        // Messages go via ON DELETE CASCADE.
        let _ = sqlx::query("DELETE FROM sessions WHERE id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list_sessions(
        &self,
        user_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<SessionSummary>> {
        let sql = format!(
            "SELECT {SESSION_COLUMNS} FROM sessions WHERE user_id = $1
             ORDER BY last_activity_at DESC LIMIT $2 OFFSET $3"
        );
        let sessions: Vec<SessionRow> = sqlx::query_as(&sql)
            .bind(user_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;
        Ok(sessions
            .into_iter()
            .map(|row| SessionSummary::from(&Session::from(row)))
            .collect())
    }

    async fn claim_session(&self, session_id: &str, user_id: &str) -> Result<Session> {
        let session = self.fetch_session(session_id).await?;
        match session.user_id.as_deref() {
            Some(owner) if owner == user_id => Ok(session),
            Some(_) => Err(StoreError::Forbidden(session_id.to_string())),
            None => {
                // Guard against a concurrent claim landing between the
                // fetch and this update.
                let sql = format!(
                    "UPDATE sessions SET user_id = $2, updated_at = $3
                     WHERE id = $1 AND user_id IS NULL
                     RETURNING {SESSION_COLUMNS}"
                );
                let row: Option<SessionRow> = sqlx::query_as(&sql)
                    .bind(session_id)
                    .bind(user_id)
                    .bind(Utc::now())
                    .fetch_optional(&self.pool)
                    .await?;
                match row {
                    Some(row) => Ok(row.into()),
                    None => Err(StoreError::Forbidden(session_id.to_string())),
                }
            }
        }
    }

    async fn append_message(&self, message: &Message) -> Result<()> {
        let session = self.fetch_session(&message.session_id).await?;
        if !session.is_active {
            return Err(StoreError::SessionInactive(message.session_id.clone()));
        }

        let sources_json = message
            .sources
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        let mut tx = self.pool.begin().await?;
        let _ = sqlx::query(
            "INSERT INTO messages (id, session_id, role, content, created_at, model, \
             input_tokens, output_tokens, cost_usd, sources, response_time_ms)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
        )
        .bind(&message.id)
        .bind(&message.session_id)
        .bind(message.role.as_str())
        .bind(&message.content)
        .bind(message.created_at)
        .bind(&message.model)
        .bind(message.input_tokens)
        .bind(message.output_tokens)
        .bind(message.cost_usd)
        .bind(sources_json)
        .bind(message.response_time_ms)
        .execute(&mut *tx)
        .await?;
        let _ = sqlx::query(
            "UPDATE sessions SET message_count = message_count + 1,
             last_activity_at = $2, updated_at = $2 WHERE id = $1",
        )
        .bind(&message.session_id)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(())
    }

    async fn list_messages(
        &self,
        session_id: &str,
        requester: Option<&str>,
        limit: Option<i64>,
    ) -> Result<Vec<Message>> {
        let session = self.fetch_session(session_id).await?;
        check_access(&session, requester)?;

        let sql = format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages WHERE session_id = $1
             ORDER BY created_at ASC LIMIT $2"
        );
        let rows: Vec<MessageRow> = sqlx::query_as(&sql)
            .bind(session_id)
            .bind(limit.unwrap_or(i64::MAX))
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(MessageRow::into_message).collect()
    }

    async fn recent_messages(&self, session_id: &str, limit: usize) -> Result<Vec<Message>> {
        let sql = format!(
            "SELECT {MESSAGE_COLUMNS} FROM (
                 SELECT {MESSAGE_COLUMNS} FROM messages WHERE session_id = $1
                 ORDER BY created_at DESC LIMIT $2
             ) tail ORDER BY created_at ASC"
        );
        let rows: Vec<MessageRow> = sqlx::query_as(&sql)
            .bind(session_id)
            .bind(i64::try_from(limit).unwrap_or(i64::MAX))
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(MessageRow::into_message).collect()
    }

    async fn cleanup_anonymous(&self, ttl_hours: u32) -> Result<u64> {
        let cutoff = Utc::now() - chrono::Duration::hours(i64::from(ttl_hours));
        let result =
            sqlx::query("DELETE FROM sessions WHERE user_id IS NULL AND last_activity_at < $1")
                .bind(cutoff)
                .execute(&self.pool)
                .await?;
        let removed = result.rows_affected();
        if removed > 0 {
            debug!(removed, "cleaned up stale anonymous sessions");
        }
        Ok(removed)
    }

    async fn upsert_user(&self, user: &User) -> Result<()> {
        let _ = sqlx::query(
            "INSERT INTO users (id, email, display_name, timezone, created_at, updated_at, \
             total_sessions, total_messages)
             VALUES ($1, $2, $3, $4, $5, $5, 0, 0)
             ON CONFLICT (id) DO UPDATE SET
                email = EXCLUDED.email,
                display_name = EXCLUDED.display_name,
                updated_at = EXCLUDED.updated_at",
        )
        .bind(&user.id)
        .bind(&user.email)
        .bind(&user.display_name)
        .bind(&user.timezone)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_user(&self, user_id: &str) -> Result<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as(
            "SELECT id, email, display_name, timezone, created_at, updated_at, \
             total_sessions, total_messages FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(User::from))
    }

    async fn bump_user_stats(&self, user_id: &str, sessions: i64, messages: i64) -> Result<()> {
        let result = sqlx::query(
            "UPDATE users SET total_sessions = total_sessions + $2,
             total_messages = total_messages + $3, updated_at = $4 WHERE id = $1",
        )
        .bind(user_id)
        .bind(sessions)
        .bind(messages)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::UserNotFound(user_id.to_string()));
        }
        Ok(())
    }

    async fn healthy(&self) -> bool {
        match sqlx::query("SELECT 1").execute(&self.pool).await {
            Ok(_) => true,
            Err(e) => {
                warn!(error = %e, "postgres health check failed");
                false
            }
        }
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}
