//! Auth error types.

use thiserror::Error;

/// Errors from the auth provider or local token verification.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Sign-in or refresh was rejected by the provider.
    #[error("invalid credentials: {0}")]
    InvalidCredentials(String),

    /// The provider returned a non-auth failure.
    #[error("auth provider error ({status}): {message}")]
    Provider {
        /// HTTP status returned by the provider.
        status: u16,
        /// Provider error message, possibly truncated.
        message: String,
    },

    /// A bearer token failed local verification.
    #[error("invalid token: {0}")]
    InvalidToken(String),

    /// No auth provider is configured.
    #[error("auth provider not configured")]
    Disabled,

    /// Transport-level failure talking to the provider.
    #[error("auth request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider responded with a body we could not decode.
    #[error("failed to decode auth response: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias for auth results.
pub type Result<T> = std::result::Result<T, AuthError>;
