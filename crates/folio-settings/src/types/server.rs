//! Server, database, session, and rate-limit settings.

use serde::{Deserialize, Serialize};

/// HTTP server network settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerSettings {
    /// Bind address.
    pub host: String,
    /// HTTP port.
    pub port: u16,
    /// Maximum accepted request body, in bytes.
    pub request_body_limit_bytes: usize,
    /// Per-request timeout in milliseconds.
    pub request_timeout_ms: u64,
    /// Allowed CORS origins. Empty means same-origin only.
    pub cors_origins: Vec<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            request_body_limit_bytes: 64 * 1024,
            request_timeout_ms: 120_000,
            cors_origins: vec!["http://localhost:3000".to_string()],
        }
    }
}

/// Postgres connection settings.
///
/// When `url` is `None` the service runs in demo mode with an in-memory
/// store instead of Postgres.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DatabaseSettings {
    /// Postgres connection URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Connection pool size.
    pub max_connections: u32,
    /// Connection acquire timeout in milliseconds.
    pub connect_timeout_ms: u64,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: 10,
            connect_timeout_ms: 5_000,
        }
    }
}

impl DatabaseSettings {
    /// Whether the service should run against the in-memory store.
    #[must_use]
    pub fn demo_mode(&self) -> bool {
        self.url.as_deref().is_none_or(str::is_empty)
    }
}

/// Session behavior settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionSettings {
    /// Recent messages included as conversation history per chat turn.
    pub history_limit: usize,
    /// Hours of inactivity before an anonymous session is deleted.
    pub anonymous_ttl_hours: u32,
    /// Minutes between anonymous-session cleanup sweeps.
    pub cleanup_interval_minutes: u64,
    /// Default page size for session listings.
    pub list_page_size: usize,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            history_limit: 10,
            anonymous_ttl_hours: 24,
            cleanup_interval_minutes: 60,
            list_page_size: 20,
        }
    }
}

/// Per-route-group fixed-window rate limits, in requests per minute.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RateLimitSettings {
    /// Auth endpoints (register, login).
    pub auth_per_minute: u32,
    /// Chat message endpoint.
    pub chat_per_minute: u32,
    /// Session create/update/delete endpoints.
    pub write_per_minute: u32,
    /// Session/message read endpoints.
    pub read_per_minute: u32,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            auth_per_minute: 5,
            chat_per_minute: 10,
            write_per_minute: 10,
            read_per_minute: 30,
        }
    }
}

/// Logging configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    /// Minimum log level when `RUST_LOG` is unset.
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_defaults() {
        let s = ServerSettings::default();
        assert_eq!(s.port, 8000);
        assert_eq!(s.request_body_limit_bytes, 65_536);
        assert_eq!(s.cors_origins, vec!["http://localhost:3000"]);
    }

    #[test]
    fn demo_mode_when_url_unset_or_empty() {
        let mut db = DatabaseSettings::default();
        assert!(db.demo_mode());
        db.url = Some(String::new());
        assert!(db.demo_mode());
        db.url = Some("postgres://localhost/folio".to_string());
        assert!(!db.demo_mode());
    }

    #[test]
    fn rate_limit_defaults() {
        let rl = RateLimitSettings::default();
        assert_eq!(rl.auth_per_minute, 5);
        assert_eq!(rl.chat_per_minute, 10);
        assert_eq!(rl.read_per_minute, 30);
    }

    #[test]
    fn session_settings_partial_json() {
        let s: SessionSettings = serde_json::from_str(r#"{"historyLimit": 4}"#).unwrap();
        assert_eq!(s.history_limit, 4);
        assert_eq!(s.anonymous_ttl_hours, 24);
    }
}
