//! Session lifecycle routes.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use folio_core::chat::{Message, Session, SessionKind, SessionSummary};
use folio_store::{CreateSessionOptions, SessionUpdate};
use serde::Deserialize;
use tracing::warn;

use crate::error::ApiError;
use crate::handlers::enforce_rate_limit;
use crate::identity::{optional_identity, require_identity};
use crate::rate_limit::RateScope;
use crate::state::AppState;

/// Body for creating a session.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateSessionRequest {
    /// Display title. Empty gets the default title.
    pub title: Option<String>,
    /// Session category.
    pub kind: Option<SessionKind>,
}

/// Body for updating a session. Absent fields are left unchanged.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateSessionRequest {
    /// New display title.
    pub title: Option<String>,
    /// New session category.
    pub kind: Option<SessionKind>,
    /// Open or close the session for new messages.
    pub is_active: Option<bool>,
    /// New rolling summary.
    pub context_summary: Option<String>,
}

/// Paging parameters for session listings.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PageQuery {
    /// Page size. Defaults to the configured list page size.
    pub limit: Option<usize>,
    /// Number of sessions to skip.
    pub offset: Option<usize>,
}

/// Message listing parameters.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MessagesQuery {
    /// Maximum messages to return, oldest first.
    pub limit: Option<usize>,
}

/// POST /sessions
pub async fn create(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateSessionRequest>,
) -> Result<Json<Session>, ApiError> {
    enforce_rate_limit(&state, &headers, RateScope::Write)?;
    let caller = optional_identity(&state, &headers).await?;
    let kind = req.kind.unwrap_or_default();

    let session = state
        .store
        .create_session(CreateSessionOptions {
            user_id: caller.as_ref().map(|u| u.id.clone()),
            title: req.title.unwrap_or_default(),
            kind,
        })
        .await?;

    if let Some(user) = &caller {
        if let Err(e) = state.store.bump_user_stats(&user.id, 1, 0).await {
            warn!(error = %e, "failed to bump user session count");
        }
    }
    metrics::counter!(crate::metrics::SESSIONS_CREATED_TOTAL, "kind" => kind.as_str())
        .increment(1);
    Ok(Json(session))
}

/// GET /sessions
pub async fn list(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(page): Query<PageQuery>,
) -> Result<Json<Vec<SessionSummary>>, ApiError> {
    enforce_rate_limit(&state, &headers, RateScope::Read)?;
    let caller = require_identity(&state, &headers).await?;
    let limit = page
        .limit
        .unwrap_or(state.settings.session.list_page_size)
        .min(100);
    let sessions = state
        .store
        .list_sessions(&caller.id, limit as i64, page.offset.unwrap_or(0) as i64)
        .await?;
    Ok(Json(sessions))
}

/// GET /sessions/{id}
pub async fn get(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(session_id): Path<String>,
) -> Result<Json<Session>, ApiError> {
    enforce_rate_limit(&state, &headers, RateScope::Read)?;
    let caller = optional_identity(&state, &headers).await?;
    let session = state
        .store
        .get_session(&session_id, caller.as_ref().map(|u| u.id.as_str()))
        .await?;
    Ok(Json(session))
}

/// PUT /sessions/{id}
pub async fn update(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(session_id): Path<String>,
    Json(req): Json<UpdateSessionRequest>,
) -> Result<Json<Session>, ApiError> {
    enforce_rate_limit(&state, &headers, RateScope::Write)?;
    let caller = optional_identity(&state, &headers).await?;
    let update = SessionUpdate {
        title: req.title,
        kind: req.kind,
        is_active: req.is_active,
        context_summary: req.context_summary,
    };
    if update.is_empty() {
        return Err(ApiError::bad_request("no fields to update"));
    }
    let session = state
        .store
        .update_session(
            &session_id,
            caller.as_ref().map(|u| u.id.as_str()),
            update,
        )
        .await?;
    Ok(Json(session))
}

/// DELETE /sessions/{id}
pub async fn delete(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(session_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    enforce_rate_limit(&state, &headers, RateScope::Write)?;
    let caller = optional_identity(&state, &headers).await?;
    state
        .store
        .delete_session(&session_id, caller.as_ref().map(|u| u.id.as_str()))
        .await?;
    Ok(Json(serde_json::json!({"deleted": true})))
}

/// POST /sessions/{id}/claim
pub async fn claim(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(session_id): Path<String>,
) -> Result<Json<Session>, ApiError> {
    enforce_rate_limit(&state, &headers, RateScope::Write)?;
    let caller = require_identity(&state, &headers).await?;
    let session = state.store.claim_session(&session_id, &caller.id).await?;
    Ok(Json(session))
}

/// GET /sessions/{id}/messages
pub async fn messages(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(session_id): Path<String>,
    Query(query): Query<MessagesQuery>,
) -> Result<Json<Vec<Message>>, ApiError> {
    enforce_rate_limit(&state, &headers, RateScope::Read)?;
    let caller = optional_identity(&state, &headers).await?;
    let limit = query.limit.unwrap_or(200).min(500);
    let messages = state
        .store
        .list_messages(
            &session_id,
            caller.as_ref().map(|u| u.id.as_str()),
            Some(limit as i64),
        )
        .await?;
    Ok(Json(messages))
}
