//! Caller identity from bearer tokens.
//!
//! Tokens are verified locally against the provider JWT secret. The first
//! time a verified token arrives for a user with no row in the store, the
//! row is created; OAuth accounts register out of band and only show up
//! here.

use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use chrono::Utc;
use folio_auth::{AuthenticatedUser, verify_token};
use folio_core::chat::User;
use tracing::debug;

use crate::error::ApiError;
use crate::state::AppState;

/// Resolve the caller when a bearer token is present.
///
/// No `Authorization` header means an anonymous caller; a header that
/// fails verification is a 401, never silent anonymity.
pub async fn optional_identity(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<Option<AuthenticatedUser>, ApiError> {
    let Some(token) = bearer_token(headers) else {
        return Ok(None);
    };
    let user = verify_token(token, state.auth.jwt_secret())?;
    ensure_user_row(state, &user).await?;
    Ok(Some(user))
}

/// Resolve the caller, requiring a valid bearer token.
pub async fn require_identity(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<AuthenticatedUser, ApiError> {
    optional_identity(state, headers)
        .await?
        .ok_or_else(|| ApiError::unauthorized("authentication required"))
}

/// The raw bearer token from a request, if any.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

async fn ensure_user_row(state: &AppState, user: &AuthenticatedUser) -> Result<(), ApiError> {
    if state.store.get_user(&user.id).await?.is_some() {
        return Ok(());
    }
    debug!(user_id = %user.id, "creating user row on first sight");
    let now = Utc::now();
    let row = User {
        id: user.id.clone(),
        email: user.email.clone().unwrap_or_default(),
        display_name: None,
        timezone: "UTC".to_string(),
        created_at: now,
        updated_at: now,
        total_sessions: 0,
        total_messages: 0,
    };
    state.store.upsert_user(&row).await?;
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_token_parsing() {
        let mut headers = HeaderMap::new();
        assert!(bearer_token(&headers).is_none());

        let _ = headers.insert(AUTHORIZATION, "Bearer abc123".parse().unwrap());
        assert_eq!(bearer_token(&headers), Some("abc123"));

        let _ = headers.insert(AUTHORIZATION, "Basic abc123".parse().unwrap());
        assert!(bearer_token(&headers).is_none());

        let _ = headers.insert(AUTHORIZATION, "Bearer ".parse().unwrap());
        assert!(bearer_token(&headers).is_none());
    }
}
