//! Fixed-window per-client rate limiting.
//!
//! Each route group gets its own per-minute allowance. Clients are keyed
//! by the `X-Forwarded-For` address when present (the service runs behind
//! a proxy in production) and fall back to a shared local key otherwise.

use std::time::{Duration, Instant};

use axum::http::HeaderMap;
use dashmap::DashMap;

/// Length of one rate-limit window.
const WINDOW: Duration = Duration::from_secs(60);

/// Route groups with separate allowances.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RateScope {
    /// Credential endpoints.
    Auth,
    /// Chat turns.
    Chat,
    /// Session mutations.
    Write,
    /// Read-only routes.
    Read,
}

impl RateScope {
    /// Stable label for logs and metrics.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Auth => "auth",
            Self::Chat => "chat",
            Self::Write => "write",
            Self::Read => "read",
        }
    }
}

#[derive(Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

/// Fixed-window counters per (scope, client) pair.
pub struct RateLimiter {
    windows: DashMap<(RateScope, String), Window>,
}

impl RateLimiter {
    /// Create an empty limiter.
    #[must_use]
    pub fn new() -> Self {
        Self {
            windows: DashMap::new(),
        }
    }

    /// Record a hit and decide whether it is allowed.
    ///
    /// Returns `Err(retry_after_secs)` when the client is over the limit
    /// for the current window.
    pub fn check(&self, scope: RateScope, client: &str, limit_per_minute: u32) -> Result<(), u64> {
        if limit_per_minute == 0 {
            return Ok(());
        }

        let now = Instant::now();
        let mut entry = self
            .windows
            .entry((scope, client.to_string()))
            .or_insert(Window {
                started: now,
                count: 0,
            });

        if now.duration_since(entry.started) >= WINDOW {
            entry.started = now;
            entry.count = 0;
        }

        if entry.count >= limit_per_minute {
            let elapsed = now.duration_since(entry.started);
            let retry_after = WINDOW.saturating_sub(elapsed).as_secs().max(1);
            return Err(retry_after);
        }

        entry.count += 1;
        Ok(())
    }

    /// Drop windows that ended more than one period ago.
    pub fn prune(&self) {
        let now = Instant::now();
        self.windows
            .retain(|_, w| now.duration_since(w.started) < WINDOW * 2);
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

/// Best-effort client key for a request.
#[must_use]
pub fn client_key(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map_or_else(|| "local".to_string(), |ip| ip.trim().to_string())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
