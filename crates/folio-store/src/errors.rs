//! Store error types.

use thiserror::Error;

/// Errors that can occur in session and message persistence.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The session does not exist.
    #[error("session not found: {0}")]
    SessionNotFound(String),
    /// The requester does not own the session.
    #[error("access denied to session: {0}")]
    Forbidden(String),
    /// The session is closed for new messages.
    #[error("session is inactive: {0}")]
    SessionInactive(String),
    /// The user does not exist.
    #[error("user not found: {0}")]
    UserNotFound(String),
    /// Database failure.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    /// Stored JSON could not be decoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
