//! Row types for the Postgres backend.
//!
//! Rows carry the raw column representation (enum-ish columns as TEXT,
//! cited sources as a JSON string) and convert into the shared domain
//! types. Unknown enum values fall back to defaults rather than failing
//! the whole query.

use chrono::{DateTime, Utc};
use folio_core::chat::{Message, MessageRole, SessionKind, SourceChunk, User};
use sqlx::FromRow;

use crate::errors::Result;

/// Raw `sessions` row.
#[derive(Debug, FromRow)]
pub struct SessionRow {
    pub id: String,
    pub user_id: Option<String>,
    pub title: String,
    pub kind: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
    pub message_count: i64,
    pub context_summary: Option<String>,
}

impl From<SessionRow> for folio_core::chat::Session {
    fn from(row: SessionRow) -> Self {
        Self {
            is_anonymous: row.user_id.is_none(),
            kind: SessionKind::parse(&row.kind).unwrap_or_default(),
            id: row.id,
            user_id: row.user_id,
            title: row.title,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
            last_activity_at: row.last_activity_at,
            message_count: row.message_count,
            context_summary: row.context_summary,
        }
    }
}

/// Raw `messages` row.
#[derive(Debug, FromRow)]
pub struct MessageRow {
    pub id: String,
    pub session_id: String,
    pub role: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub model: Option<String>,
    pub input_tokens: Option<i64>,
    pub output_tokens: Option<i64>,
    pub cost_usd: Option<f64>,
    pub sources: Option<String>,
    pub response_time_ms: Option<i64>,
}

impl MessageRow {
    /// Convert into the domain type, decoding the cited-sources JSON.
    pub fn into_message(self) -> Result<Message> {
        let sources: Option<Vec<SourceChunk>> = self
            .sources
            .as_deref()
            .map(serde_json::from_str)
            .transpose()?;
        Ok(Message {
            role: MessageRole::parse(&self.role).unwrap_or(MessageRole::User),
            id: self.id,
            session_id: self.session_id,
            content: self.content,
            created_at: self.created_at,
            model: self.model,
            input_tokens: self.input_tokens,
            output_tokens: self.output_tokens,
            cost_usd: self.cost_usd,
            sources,
            response_time_ms: self.response_time_ms,
        })
    }
}

/// Raw `users` row.
#[derive(Debug, FromRow)]
pub struct UserRow {
    pub id: String,
    pub email: String,
    pub display_name: Option<String>,
    pub timezone: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub total_sessions: i64,
    pub total_messages: i64,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            email: row.email,
            display_name: row.display_name,
            timezone: row.timezone,
            created_at: row.created_at,
            updated_at: row.updated_at,
            total_sessions: row.total_sessions,
            total_messages: row.total_messages,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
