//! Chat domain types: users, sessions, messages, and citation sources.
//!
//! All wire-facing types use `#[serde(rename_all = "camelCase")]` to match
//! the JSON format the web client consumes. Timestamps are UTC.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Role of a chat message author.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// End-user message.
    User,
    /// Model-generated message.
    Assistant,
    /// System prompt (never persisted by the pipeline, but valid on the wire).
    System,
}

impl MessageRole {
    /// Stable lowercase string form, matching the database representation.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::System => "system",
        }
    }

    /// Parse from the database representation.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "user" => Some(Self::User),
            "assistant" => Some(Self::Assistant),
            "system" => Some(Self::System),
            _ => None,
        }
    }
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Broad category of a conversation session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionKind {
    /// Open-ended conversation.
    #[default]
    General,
    /// Conversation focused on a recurring theme.
    Thematic,
    /// Close reading of specific corpus sources.
    SourceStudy,
}

impl SessionKind {
    /// Stable snake_case string form, matching the database representation.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Thematic => "thematic",
            Self::SourceStudy => "source_study",
        }
    }

    /// Parse from the database representation.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "general" => Some(Self::General),
            "thematic" => Some(Self::Thematic),
            "source_study" => Some(Self::SourceStudy),
            _ => None,
        }
    }
}

/// A registered user, mirrored from the auth provider.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Auth-provider user ID.
    pub id: String,
    /// Email address.
    pub email: String,
    /// Optional display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// IANA timezone name.
    pub timezone: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
    /// Lifetime session count.
    pub total_sessions: i64,
    /// Lifetime message count.
    pub total_messages: i64,
}

/// A conversation thread, optionally owned by an authenticated user.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Session ID (`sess_<uuidv7>`).
    pub id: String,
    /// Owning user, `None` for anonymous sessions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// Display title.
    pub title: String,
    /// Session category.
    pub kind: SessionKind,
    /// Whether the session has no owner.
    pub is_anonymous: bool,
    /// Whether the session is open for new messages.
    pub is_active: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
    /// Last chat activity timestamp (drives anonymous cleanup).
    pub last_activity_at: DateTime<Utc>,
    /// Number of persisted messages.
    pub message_count: i64,
    /// Optional rolling summary of the conversation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_summary: Option<String>,
}

/// Lightweight session projection for list views.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    /// Session ID.
    pub id: String,
    /// Display title.
    pub title: String,
    /// Session category.
    pub kind: SessionKind,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last chat activity timestamp.
    pub last_activity_at: DateTime<Utc>,
    /// Number of persisted messages.
    pub message_count: i64,
    /// Whether the session has no owner.
    pub is_anonymous: bool,
}

impl From<&Session> for SessionSummary {
    fn from(s: &Session) -> Self {
        Self {
            id: s.id.clone(),
            title: s.title.clone(),
            kind: s.kind,
            created_at: s.created_at,
            last_activity_at: s.last_activity_at,
            message_count: s.message_count,
            is_anonymous: s.is_anonymous,
        }
    }
}

/// A retrieved corpus passage with citation metadata.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceChunk {
    /// Vector-index chunk ID.
    pub chunk_id: String,
    /// Passage text.
    pub text: String,
    /// Work title the passage comes from.
    pub source: String,
    /// Volume within the work, when the corpus has one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<String>,
    /// Page number, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<i64>,
    /// Similarity score in `[0, 1]`.
    pub score: f32,
}

/// A persisted chat message.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Message ID (`msg_<uuidv7>`).
    pub id: String,
    /// Parent session ID.
    pub session_id: String,
    /// Author role.
    pub role: MessageRole,
    /// Message text.
    pub content: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Model that produced an assistant message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Prompt tokens consumed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_tokens: Option<i64>,
    /// Completion tokens produced.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_tokens: Option<i64>,
    /// Cost of producing an assistant message, in USD.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost_usd: Option<f64>,
    /// Corpus passages cited by an assistant message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<SourceChunk>>,
    /// Wall-clock generation time in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_time_ms: Option<i64>,
}

/// Token usage reported by the LLM API for one request.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenUsage {
    /// Prompt tokens.
    pub input_tokens: u64,
    /// Completion tokens.
    pub output_tokens: u64,
}

impl TokenUsage {
    /// Total tokens for the request.
    #[must_use]
    pub fn total(self) -> u64 {
        self.input_tokens + self.output_tokens
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
