//! In-memory store backend.
//!
//! Used in demo mode (no database configured) and throughout the test
//! suite. Data lives for the lifetime of the process; anonymous cleanup
//! and counters behave identically to the Postgres backend.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use folio_core::chat::{Message, Session, SessionSummary, User};
use folio_core::ids::new_session_id;
use parking_lot::RwLock;
use tracing::debug;

use crate::errors::{Result, StoreError};
use crate::store::{
    CreateSessionOptions, DEFAULT_SESSION_TITLE, SessionStore, SessionUpdate, check_access,
};

#[derive(Default)]
struct Inner {
    sessions: HashMap<String, Session>,
    /// Messages per session, in append order.
    messages: HashMap<String, Vec<Message>>,
    users: HashMap<String, User>,
}

/// Process-local [`SessionStore`] backend.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn get_checked(inner: &Inner, session_id: &str, requester: Option<&str>) -> Result<Session> {
        let session = inner
            .sessions
            .get(session_id)
            .ok_or_else(|| StoreError::SessionNotFound(session_id.to_string()))?;
        check_access(session, requester)?;
        Ok(session.clone())
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn create_session(&self, opts: CreateSessionOptions) -> Result<Session> {
        let now = Utc::now();
        let title = if opts.title.is_empty() {
            DEFAULT_SESSION_TITLE.to_string()
        } else {
            opts.title
        };
        let session = Session {
            id: new_session_id(),
            is_anonymous: opts.user_id.is_none(),
            user_id: opts.user_id,
            title,
            kind: opts.kind,
            is_active: true,
            created_at: now,
            updated_at: now,
            last_activity_at: now,
            message_count: 0,
            context_summary: None,
        };
        let mut inner = self.inner.write();
        let _ = inner.sessions.insert(session.id.clone(), session.clone());
        let _ = inner.messages.insert(session.id.clone(), Vec::new());
        Ok(session)
    }

    async fn get_session(&self, session_id: &str, requester: Option<&str>) -> Result<Session> {
        let inner = self.inner.read();
        Self::get_checked(&inner, session_id, requester)
    }

    async fn update_session(
        &self,
        session_id: &str,
        requester: Option<&str>,
        update: SessionUpdate,
    ) -> Result<Session> {
        let mut inner = self.inner.write();
        let _ = Self::get_checked(&inner, session_id, requester)?;
        let session = inner
            .sessions
            .get_mut(session_id)
            .ok_or_else(|| StoreError::SessionNotFound(session_id.to_string()))?;
        if let Some(title) = update.title {
            session.title = title;
        }
        if let Some(kind) = update.kind {
            session.kind = kind;
        }
        if let Some(active) = update.is_active {
            session.is_active = active;
        }
        if let Some(summary) = update.context_summary {
            session.context_summary = Some(summary);
        }
        session.updated_at = Utc::now();
        Ok(session.clone())
    }

    async fn delete_session(&self, session_id: &str, requester: Option<&str>) -> Result<()> {
        let mut inner = self.inner.write();
        let _ = Self::get_checked(&inner, session_id, requester)?;
        let _ = inner.sessions.remove(session_id);
        let _ = inner.messages.remove(session_id);
        Ok(())
    }

    async fn list_sessions(
        &self,
        user_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<SessionSummary>> {
        let inner = self.inner.read();
        let mut sessions: Vec<&Session> = inner
            .sessions
            .values()
            .filter(|s| s.user_id.as_deref() == Some(user_id))
            .collect();
        sessions.sort_by(|a, b| b.last_activity_at.cmp(&a.last_activity_at));
        Ok(sessions
            .into_iter()
            .skip(usize::try_from(offset).unwrap_or(0))
            .take(usize::try_from(limit).unwrap_or(0))
            .map(SessionSummary::from)
            .collect())
    }

    async fn claim_session(&self, session_id: &str, user_id: &str) -> Result<Session> {
        let mut inner = self.inner.write();
        let session = inner
            .sessions
            .get_mut(session_id)
            .ok_or_else(|| StoreError::SessionNotFound(session_id.to_string()))?;
        match session.user_id.as_deref() {
            Some(owner) if owner == user_id => {}
            Some(_) => return Err(StoreError::Forbidden(session_id.to_string())),
            None => {
                session.user_id = Some(user_id.to_string());
                session.is_anonymous = false;
                session.updated_at = Utc::now();
            }
        }
        Ok(session.clone())
    }

    async fn append_message(&self, message: &Message) -> Result<()> {
        let mut inner = self.inner.write();
        let session = inner
            .sessions
            .get_mut(&message.session_id)
            .ok_or_else(|| StoreError::SessionNotFound(message.session_id.clone()))?;
        if !session.is_active {
            return Err(StoreError::SessionInactive(message.session_id.clone()));
        }
        session.message_count += 1;
        session.last_activity_at = Utc::now();
        session.updated_at = session.last_activity_at;
        inner
            .messages
            .entry(message.session_id.clone())
            .or_default()
            .push(message.clone());
        Ok(())
    }

    async fn list_messages(
        &self,
        session_id: &str,
        requester: Option<&str>,
        limit: Option<i64>,
    ) -> Result<Vec<Message>> {
        let inner = self.inner.read();
        let _ = Self::get_checked(&inner, session_id, requester)?;
        let messages = inner.messages.get(session_id).cloned().unwrap_or_default();
        match limit {
            Some(n) => Ok(messages
                .into_iter()
                .take(usize::try_from(n).unwrap_or(0))
                .collect()),
            None => Ok(messages),
        }
    }

    async fn recent_messages(&self, session_id: &str, limit: usize) -> Result<Vec<Message>> {
        let inner = self.inner.read();
        let messages = inner
            .messages
            .get(session_id)
            .ok_or_else(|| StoreError::SessionNotFound(session_id.to_string()))?;
        let start = messages.len().saturating_sub(limit);
        Ok(messages[start..].to_vec())
    }

    async fn cleanup_anonymous(&self, ttl_hours: u32) -> Result<u64> {
        let cutoff = Utc::now() - Duration::hours(i64::from(ttl_hours));
        let mut inner = self.inner.write();
        let stale: Vec<String> = inner
            .sessions
            .values()
            .filter(|s| s.is_anonymous && s.last_activity_at < cutoff)
            .map(|s| s.id.clone())
            .collect();
        for id in &stale {
            let _ = inner.sessions.remove(id);
            let _ = inner.messages.remove(id);
        }
        if !stale.is_empty() {
            debug!(removed = stale.len(), "cleaned up stale anonymous sessions");
        }
        Ok(stale.len() as u64)
    }

    async fn upsert_user(&self, user: &User) -> Result<()> {
        let mut inner = self.inner.write();
        match inner.users.get_mut(&user.id) {
            Some(existing) => {
                existing.email.clone_from(&user.email);
                existing.display_name.clone_from(&user.display_name);
                existing.updated_at = Utc::now();
            }
            None => {
                let _ = inner.users.insert(user.id.clone(), user.clone());
            }
        }
        Ok(())
    }

    async fn get_user(&self, user_id: &str) -> Result<Option<User>> {
        let inner = self.inner.read();
        Ok(inner.users.get(user_id).cloned())
    }

    async fn bump_user_stats(&self, user_id: &str, sessions: i64, messages: i64) -> Result<()> {
        let mut inner = self.inner.write();
        let user = inner
            .users
            .get_mut(user_id)
            .ok_or_else(|| StoreError::UserNotFound(user_id.to_string()))?;
        user.total_sessions += sessions;
        user.total_messages += messages;
        user.updated_at = Utc::now();
        Ok(())
    }

    async fn healthy(&self) -> bool {
        true
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
