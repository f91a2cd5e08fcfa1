//! HTTP request handlers, grouped by route family.

pub mod analytics;
pub mod auth;
pub mod chat;
pub mod health;
pub mod sessions;

use axum::http::HeaderMap;

use crate::error::ApiError;
use crate::rate_limit::{RateScope, client_key};
use crate::state::AppState;

/// Enforce the per-minute allowance for a route group.
pub(crate) fn enforce_rate_limit(
    state: &AppState,
    headers: &HeaderMap,
    scope: RateScope,
) -> Result<(), ApiError> {
    let limits = &state.settings.rate_limits;
    let limit = match scope {
        RateScope::Auth => limits.auth_per_minute,
        RateScope::Chat => limits.chat_per_minute,
        RateScope::Write => limits.write_per_minute,
        RateScope::Read => limits.read_per_minute,
    };
    state
        .limiter
        .check(scope, &client_key(headers), limit)
        .map_err(|retry_after| {
            metrics::counter!(crate::metrics::RATE_LIMITED_TOTAL, "scope" => scope.as_str())
                .increment(1);
            ApiError::rate_limited(retry_after)
        })
}
