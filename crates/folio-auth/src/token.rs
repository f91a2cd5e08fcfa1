//! Local access-token verification.
//!
//! Access tokens issued by the provider are HS256 JWTs signed with the
//! project secret. Verifying them locally keeps the hot path free of a
//! network round trip per request.

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};

use crate::error::{AuthError, Result};

/// Claims we care about from a provider-issued access token.
#[derive(Debug, Deserialize, Serialize)]
pub struct Claims {
    /// Subject, the provider user ID.
    pub sub: String,
    /// Email the account was registered with.
    #[serde(default)]
    pub email: Option<String>,
    /// Expiry as a unix timestamp.
    pub exp: i64,
}

/// The identity carried by a verified token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthenticatedUser {
    /// Provider user ID.
    pub id: String,
    /// Account email, when the token carries one.
    pub email: Option<String>,
}

/// Verify an HS256 access token against the project secret.
pub fn verify_token(token: &str, secret: &str) -> Result<AuthenticatedUser> {
    if secret.is_empty() {
        return Err(AuthError::Disabled);
    }

    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_aud = false;

    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| AuthError::InvalidToken(e.to_string()))?;

    Ok(AuthenticatedUser {
        id: data.claims.sub,
        email: data.claims.email,
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
