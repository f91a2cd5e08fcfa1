//! Account routes, delegating to the managed auth provider.

use axum::Json;
use axum::extract::State;
use axum::http::HeaderMap;
use chrono::Utc;
use folio_auth::TokenGrant;
use folio_core::chat::User;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ApiError;
use crate::handlers::enforce_rate_limit;
use crate::identity::bearer_token;
use crate::rate_limit::RateScope;
use crate::state::AppState;

/// Email and password credentials.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialsRequest {
    /// Account email.
    pub email: String,
    /// Account password.
    pub password: String,
}

/// Refresh-token exchange request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    /// The refresh token from the previous grant.
    pub refresh_token: String,
}

/// A token grant in the service wire format.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    /// Bearer token for subsequent requests.
    pub access_token: String,
    /// Token for the next refresh.
    pub refresh_token: String,
    /// Access-token lifetime in seconds.
    pub expires_in: i64,
    /// The authenticated account.
    pub user: AuthUserBody,
}

/// The account inside an auth response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthUserBody {
    /// Provider user ID.
    pub id: String,
    /// Account email.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl From<TokenGrant> for AuthResponse {
    fn from(grant: TokenGrant) -> Self {
        Self {
            access_token: grant.access_token,
            refresh_token: grant.refresh_token,
            expires_in: grant.expires_in,
            user: AuthUserBody {
                id: grant.user.id,
                email: grant.user.email,
            },
        }
    }
}

fn validate_credentials(req: &CredentialsRequest) -> Result<(), ApiError> {
    if !req.email.contains('@') {
        return Err(ApiError::bad_request("invalid email address"));
    }
    if req.password.len() < 8 {
        return Err(ApiError::bad_request(
            "password must be at least 8 characters",
        ));
    }
    Ok(())
}

/// Mirror the provider account into the local user table.
///
/// Failure here must not fail the grant; the row is recreated on the
/// next authenticated request anyway.
async fn mirror_user(state: &AppState, grant: &TokenGrant) {
    let now = Utc::now();
    let row = User {
        id: grant.user.id.clone(),
        email: grant.user.email.clone().unwrap_or_default(),
        display_name: None,
        timezone: "UTC".to_string(),
        created_at: now,
        updated_at: now,
        total_sessions: 0,
        total_messages: 0,
    };
    if let Err(e) = state.store.upsert_user(&row).await {
        warn!(error = %e, user_id = %row.id, "failed to mirror user row");
    }
}

/// POST /auth/register
pub async fn register(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CredentialsRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    enforce_rate_limit(&state, &headers, RateScope::Auth)?;
    validate_credentials(&req)?;
    let grant = state.auth.sign_up(&req.email, &req.password).await?;
    mirror_user(&state, &grant).await;
    Ok(Json(grant.into()))
}

/// POST /auth/login
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CredentialsRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    enforce_rate_limit(&state, &headers, RateScope::Auth)?;
    let grant = state.auth.sign_in(&req.email, &req.password).await?;
    mirror_user(&state, &grant).await;
    Ok(Json(grant.into()))
}

/// POST /auth/refresh
pub async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<RefreshRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    enforce_rate_limit(&state, &headers, RateScope::Auth)?;
    let grant = state.auth.refresh(&req.refresh_token).await?;
    Ok(Json(grant.into()))
}

/// POST /auth/logout
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, ApiError> {
    enforce_rate_limit(&state, &headers, RateScope::Auth)?;
    let token =
        bearer_token(&headers).ok_or_else(|| ApiError::unauthorized("bearer token required"))?;
    state.auth.sign_out(token).await?;
    Ok(Json(serde_json::json!({"signedOut": true})))
}
