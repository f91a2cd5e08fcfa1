//! HTTP error mapping.
//!
//! Every failure leaves the server as `{"error": {"code", "message"}}`
//! with a status that tells the caller whose fault it was: 4xx for the
//! request, 500 for us, 502 for an upstream provider.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use folio_auth::AuthError;
use folio_chat::ChatError;
use folio_llm::LlmError;
use folio_store::StoreError;
use serde::Serialize;
use tracing::error;

/// A client-facing API error.
#[derive(Debug)]
pub struct ApiError {
    /// HTTP status to respond with.
    pub status: StatusCode,
    /// Stable machine-readable code.
    pub code: &'static str,
    /// Human-readable detail.
    pub message: String,
    /// Seconds to wait before retrying, for 429s.
    pub retry_after: Option<u64>,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: ErrorDetail<'a>,
}

#[derive(Serialize)]
struct ErrorDetail<'a> {
    code: &'a str,
    message: &'a str,
}

impl ApiError {
    /// Build an error with an explicit status and code.
    #[must_use]
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
            retry_after: None,
        }
    }

    /// 429 with code `rate_limited` and a `Retry-After` hint.
    #[must_use]
    pub fn rate_limited(retry_after_secs: u64) -> Self {
        Self {
            retry_after: Some(retry_after_secs),
            ..Self::new(
                StatusCode::TOO_MANY_REQUESTS,
                "rate_limited",
                "too many requests, slow down",
            )
        }
    }

    /// 400 with code `invalid_request`.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "invalid_request", message)
    }

    /// 401 with code `unauthorized`.
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "unauthorized", message)
    }

    /// 404 with code `not_found`.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "not_found", message)
    }

    fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal", message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!(code = self.code, message = %self.message, "request failed");
        }
        let body = Json(ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: &self.message,
            },
        });
        let mut response = (self.status, body).into_response();
        if let Some(secs) = self.retry_after {
            if let Ok(value) = secs.to_string().parse() {
                let _ = response.headers_mut().insert("retry-after", value);
            }
        }
        response
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::SessionNotFound(_) | StoreError::UserNotFound(_) => {
                Self::not_found(e.to_string())
            }
            StoreError::Forbidden(_) => {
                Self::new(StatusCode::FORBIDDEN, "forbidden", e.to_string())
            }
            StoreError::SessionInactive(_) => Self::bad_request(e.to_string()),
            StoreError::Database(_) | StoreError::Serialization(_) => {
                Self::internal("storage failure")
            }
        }
    }
}

impl From<LlmError> for ApiError {
    fn from(e: LlmError) -> Self {
        match e {
            LlmError::BudgetExhausted { .. } => Self::new(
                StatusCode::TOO_MANY_REQUESTS,
                "budget_exhausted",
                e.to_string(),
            ),
            _ => Self::new(StatusCode::BAD_GATEWAY, "upstream_error", e.to_string()),
        }
    }
}

impl From<ChatError> for ApiError {
    fn from(e: ChatError) -> Self {
        match e {
            ChatError::InvalidMessage(message) => Self::bad_request(message),
            ChatError::Store(inner) => inner.into(),
            ChatError::Llm(inner) => inner.into(),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::InvalidCredentials(_) | AuthError::InvalidToken(_) => {
                Self::unauthorized(e.to_string())
            }
            AuthError::Disabled => Self::new(
                StatusCode::BAD_GATEWAY,
                "upstream_error",
                "auth provider not configured",
            ),
            AuthError::Provider { .. } | AuthError::Http(_) | AuthError::Json(_) => {
                Self::new(StatusCode::BAD_GATEWAY, "upstream_error", e.to_string())
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use folio_llm::BudgetScope;

    #[test]
    fn store_errors_map_to_statuses() {
        let e: ApiError = StoreError::SessionNotFound("sess_x".to_string()).into();
        assert_eq!(e.status, StatusCode::NOT_FOUND);
        let e: ApiError = StoreError::Forbidden("sess_x".to_string()).into();
        assert_eq!(e.status, StatusCode::FORBIDDEN);
    }

    #[test]
    fn budget_exhaustion_maps_to_429() {
        let e: ApiError = LlmError::BudgetExhausted {
            scope: BudgetScope::Daily,
            spent: 5.0,
            limit: 5.0,
        }
        .into();
        assert_eq!(e.status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(e.code, "budget_exhausted");
    }

    #[test]
    fn provider_failures_map_to_502() {
        let e: ApiError = LlmError::EmptyCompletion.into();
        assert_eq!(e.status, StatusCode::BAD_GATEWAY);
        let e: ApiError = AuthError::Provider {
            status: 500,
            message: "boom".to_string(),
        }
        .into();
        assert_eq!(e.status, StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn rate_limited_carries_retry_after() {
        let e = ApiError::rate_limited(17);
        assert_eq!(e.status, StatusCode::TOO_MANY_REQUESTS);
        let response = e.into_response();
        assert_eq!(response.headers()["retry-after"], "17");
    }

    #[test]
    fn bad_credentials_map_to_401() {
        let e: ApiError = AuthError::InvalidCredentials("nope".to_string()).into();
        assert_eq!(e.status, StatusCode::UNAUTHORIZED);
    }
}
