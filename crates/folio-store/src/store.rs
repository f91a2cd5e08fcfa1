//! The [`SessionStore`] trait — the persistence seam for the service.
//!
//! Two backends implement it: [`PgStore`](crate::postgres::PgStore) for
//! production and [`MemoryStore`](crate::memory::MemoryStore) for demo mode
//! and tests.
//!
//! # Access control
//!
//! Read and write operations take a `requester` (the authenticated user ID,
//! or `None` for anonymous callers). Anonymous sessions are reachable by
//! anyone holding the session ID; owned sessions only by their owner.
//! Accessing a session owned by someone else yields
//! [`StoreError::Forbidden`](crate::errors::StoreError::Forbidden), never a
//! leak of the session's existence beyond that.

use async_trait::async_trait;
use folio_core::chat::{Message, Session, SessionKind, SessionSummary, User};

use crate::errors::Result;

/// Options for creating a new session.
#[derive(Clone, Debug, Default)]
pub struct CreateSessionOptions {
    /// Owning user, `None` for anonymous sessions.
    pub user_id: Option<String>,
    /// Display title. Empty gets a default title.
    pub title: String,
    /// Session category.
    pub kind: SessionKind,
}

/// Partial update to a session. `None` fields are left unchanged.
#[derive(Clone, Debug, Default)]
pub struct SessionUpdate {
    /// New display title.
    pub title: Option<String>,
    /// New session category.
    pub kind: Option<SessionKind>,
    /// Open or close the session for new messages.
    pub is_active: Option<bool>,
    /// New rolling summary.
    pub context_summary: Option<String>,
}

impl SessionUpdate {
    /// Whether the update changes anything.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.kind.is_none()
            && self.is_active.is_none()
            && self.context_summary.is_none()
    }
}

/// Session and message persistence.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Create a session, anonymous or owned.
    async fn create_session(&self, opts: CreateSessionOptions) -> Result<Session>;

    /// Fetch a session, enforcing access control for `requester`.
    async fn get_session(&self, session_id: &str, requester: Option<&str>) -> Result<Session>;

    /// Apply a partial update to a session the requester can access.
    async fn update_session(
        &self,
        session_id: &str,
        requester: Option<&str>,
        update: SessionUpdate,
    ) -> Result<Session>;

    /// Delete a session and its messages.
    async fn delete_session(&self, session_id: &str, requester: Option<&str>) -> Result<()>;

    /// List a user's sessions, most recently active first.
    async fn list_sessions(
        &self,
        user_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<SessionSummary>>;

    /// Attach an anonymous session to a user.
    ///
    /// Claiming a session already owned by another user is `Forbidden`.
    /// Claiming one's own session is a no-op.
    async fn claim_session(&self, session_id: &str, user_id: &str) -> Result<Session>;

    /// Persist a message and bump the parent session's counters.
    async fn append_message(&self, message: &Message) -> Result<()>;

    /// List a session's messages in chronological order.
    async fn list_messages(
        &self,
        session_id: &str,
        requester: Option<&str>,
        limit: Option<i64>,
    ) -> Result<Vec<Message>>;

    /// The most recent `limit` messages in chronological order.
    ///
    /// Used to build conversation history for a chat turn; skips the
    /// access check since the caller has already fetched the session.
    async fn recent_messages(&self, session_id: &str, limit: usize) -> Result<Vec<Message>>;

    /// Delete anonymous sessions idle for longer than `ttl_hours`.
    ///
    /// Returns the number of sessions removed.
    async fn cleanup_anonymous(&self, ttl_hours: u32) -> Result<u64>;

    /// Insert a user row, or refresh email and display name if it exists.
    async fn upsert_user(&self, user: &User) -> Result<()>;

    /// Fetch a user by ID.
    async fn get_user(&self, user_id: &str) -> Result<Option<User>>;

    /// Add to a user's lifetime session and message counters.
    async fn bump_user_stats(&self, user_id: &str, sessions: i64, messages: i64) -> Result<()>;

    /// Whether the backend can currently serve requests.
    async fn healthy(&self) -> bool;

    /// Short backend name for health reporting.
    fn backend_name(&self) -> &'static str;
}

/// Title assigned to sessions created without one.
pub const DEFAULT_SESSION_TITLE: &str = "New conversation";

/// Shared access-control rule for both backends.
///
/// Anonymous sessions are open to any requester; owned sessions only to
/// their owner.
pub(crate) fn check_access(
    session: &Session,
    requester: Option<&str>,
) -> std::result::Result<(), crate::errors::StoreError> {
    match (&session.user_id, requester) {
        (None, _) => Ok(()),
        (Some(owner), Some(user)) if owner == user => Ok(()),
        (Some(_), _) => Err(crate::errors::StoreError::Forbidden(session.id.clone())),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
