//! Managed auth provider client.
//!
//! Speaks the GoTrue-style REST surface: `POST /auth/v1/signup`,
//! `POST /auth/v1/token?grant_type=...`, and `POST /auth/v1/logout`,
//! authenticated with the project `apikey` header.

use folio_settings::AuthSettings;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::{AuthError, Result};

/// The provider user embedded in a token grant.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ProviderUser {
    /// Provider user ID.
    pub id: String,
    /// Account email.
    #[serde(default)]
    pub email: Option<String>,
}

/// A token grant returned by signup, sign-in, or refresh.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct TokenGrant {
    /// Bearer token for subsequent requests.
    pub access_token: String,
    /// Token used to obtain the next grant.
    pub refresh_token: String,
    /// Access-token lifetime in seconds.
    #[serde(default)]
    pub expires_in: i64,
    /// The account the grant belongs to.
    pub user: ProviderUser,
}

#[derive(Serialize)]
struct CredentialsBody<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct RefreshBody<'a> {
    refresh_token: &'a str,
}

/// Provider error bodies vary by endpoint; collect the usual suspects.
#[derive(Deserialize)]
struct ProviderErrorBody {
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Client for the managed auth provider.
pub struct AuthClient {
    http: reqwest::Client,
    cfg: AuthSettings,
}

impl AuthClient {
    /// Build a client from settings.
    pub fn new(cfg: AuthSettings) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_millis(cfg.timeout_ms))
            .build()?;
        Ok(Self { http, cfg })
    }

    /// Whether a provider is configured.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.cfg.enabled()
    }

    /// The HS256 secret used for local token verification.
    #[must_use]
    pub fn jwt_secret(&self) -> &str {
        &self.cfg.jwt_secret
    }

    /// Register a new account and return its first grant.
    #[instrument(skip(self, password))]
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<TokenGrant> {
        let body = CredentialsBody { email, password };
        self.grant_request("signup", &[], &body).await
    }

    /// Exchange credentials for a grant.
    #[instrument(skip(self, password))]
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<TokenGrant> {
        let body = CredentialsBody { email, password };
        self.grant_request("token", &[("grant_type", "password")], &body)
            .await
    }

    /// Exchange a refresh token for a fresh grant.
    #[instrument(skip(self, refresh_token))]
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenGrant> {
        let body = RefreshBody { refresh_token };
        self.grant_request("token", &[("grant_type", "refresh_token")], &body)
            .await
    }

    /// Revoke the session behind `access_token`.
    #[instrument(skip(self, access_token))]
    pub async fn sign_out(&self, access_token: &str) -> Result<()> {
        if !self.is_enabled() {
            return Err(AuthError::Disabled);
        }

        let response = self
            .http
            .post(self.endpoint("logout"))
            .header("apikey", &self.cfg.api_key)
            .bearer_auth(access_token)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(provider_error(status.as_u16(), response.text().await.ok()))
        }
    }

    async fn grant_request<B: Serialize>(
        &self,
        endpoint: &str,
        query: &[(&str, &str)],
        body: &B,
    ) -> Result<TokenGrant> {
        if !self.is_enabled() {
            return Err(AuthError::Disabled);
        }

        let response = self
            .http
            .post(self.endpoint(endpoint))
            .query(query)
            .header("apikey", &self.cfg.api_key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            Ok(response.json().await?)
        } else {
            Err(provider_error(status.as_u16(), response.text().await.ok()))
        }
    }

    fn endpoint(&self, name: &str) -> String {
        format!("{}/auth/v1/{name}", self.cfg.base_url.trim_end_matches('/'))
    }
}

/// Map a provider failure to an auth error.
///
/// 400, 401, and 422 are credential problems worth relaying to the caller;
/// anything else is the provider misbehaving.
fn provider_error(status: u16, body: Option<String>) -> AuthError {
    let message = body
        .as_deref()
        .and_then(|b| serde_json::from_str::<ProviderErrorBody>(b).ok())
        .and_then(|b| b.error_description.or(b.msg).or(b.message))
        .or(body)
        .unwrap_or_default();

    match status {
        400 | 401 | 422 => AuthError::InvalidCredentials(message),
        _ => AuthError::Provider { status, message },
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
