//! Settings loading with deep merge and environment variable overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`FolioSettings::default()`]
//! 2. If the settings file exists, deep-merge its values over defaults
//! 3. Apply environment variable overrides (highest priority)
//! 4. Clamp out-of-range values via [`FolioSettings::validate`]
//!
//! Deep merge rules:
//! - Objects are merged recursively (source overrides target per-key)
//! - Arrays and primitives are replaced entirely by source
//! - Null values in source are skipped (preserving target)

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::errors::Result;
use crate::types::FolioSettings;

/// Resolve the path to the settings file.
///
/// `FOLIO_CONFIG` overrides; the default is `folio.json` in the working
/// directory.
pub fn settings_path() -> PathBuf {
    std::env::var("FOLIO_CONFIG")
        .ok()
        .filter(|v| !v.is_empty())
        .map_or_else(|| PathBuf::from("folio.json"), PathBuf::from)
}

/// Load settings from the default path with env var overrides.
pub fn load_settings() -> Result<FolioSettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific path with env var overrides.
///
/// If the file does not exist, returns defaults. If the file contains
/// invalid JSON, returns an error.
pub fn load_settings_from_path(path: &Path) -> Result<FolioSettings> {
    let defaults = serde_json::to_value(FolioSettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    let mut settings: FolioSettings = serde_json::from_value(merged)?;
    apply_env_overrides(&mut settings);
    settings.validate();
    Ok(settings)
}

/// Recursive deep merge of two JSON values.
///
/// - Objects are merged recursively (source overrides target per-key)
/// - Arrays and primitives are replaced entirely by source
/// - Null values in source are skipped (preserving target)
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply environment variable overrides to loaded settings.
///
/// Each env var has strict parsing rules:
/// - Integers must be valid and within the specified range
/// - Invalid values are silently ignored (fall back to file/default)
pub fn apply_env_overrides(settings: &mut FolioSettings) {
    // ── Server ──────────────────────────────────────────────────────
    if let Some(v) = read_env_string("FOLIO_HOST") {
        settings.server.host = v;
    }
    if let Some(v) = read_env_u16("FOLIO_PORT", 1, 65535) {
        settings.server.port = v;
    }

    // ── Database ────────────────────────────────────────────────────
    if let Some(v) = read_env_string("FOLIO_DATABASE_URL") {
        settings.database.url = Some(v);
    }

    // ── Auth provider ───────────────────────────────────────────────
    if let Some(v) = read_env_string("FOLIO_AUTH_URL") {
        settings.auth.base_url = v;
    }
    if let Some(v) = read_env_string("FOLIO_AUTH_API_KEY") {
        settings.auth.api_key = v;
    }
    if let Some(v) = read_env_string("FOLIO_JWT_SECRET") {
        settings.auth.jwt_secret = v;
    }

    // ── LLM API ─────────────────────────────────────────────────────
    if let Some(v) = read_env_string("FOLIO_LLM_BASE_URL") {
        settings.llm.base_url = v;
    }
    if let Some(v) = read_env_string("FOLIO_LLM_API_KEY") {
        settings.llm.api_key = v;
    }
    if let Some(v) = read_env_string("FOLIO_DEFAULT_MODEL") {
        settings.llm.default_model = v;
    }
    if let Some(v) = read_env_string("FOLIO_COMPLEX_MODEL") {
        settings.llm.complex_model = v;
    }
    if let Some(v) = read_env_string("FOLIO_EMBEDDING_MODEL") {
        settings.llm.embedding_model = v;
    }
    if let Some(v) = read_env_f64("FOLIO_DAILY_BUDGET_USD", 0.0, 10_000.0) {
        settings.llm.daily_budget_usd = v;
    }
    if let Some(v) = read_env_f64("FOLIO_MONTHLY_BUDGET_USD", 0.0, 100_000.0) {
        settings.llm.monthly_budget_usd = v;
    }

    // ── Vector index ────────────────────────────────────────────────
    if let Some(v) = read_env_string("FOLIO_VECTOR_URL") {
        settings.vector_index.base_url = v;
    }
    if let Some(v) = read_env_string("FOLIO_VECTOR_API_KEY") {
        settings.vector_index.api_key = v;
    }
    if let Some(v) = read_env_string("FOLIO_VECTOR_NAMESPACE") {
        settings.vector_index.namespace = v;
    }

    // ── Logging ─────────────────────────────────────────────────────
    if let Some(v) = read_env_string("FOLIO_LOG_LEVEL") {
        settings.logging.level = v;
    }
}

// ── Pure parsing functions (testable without env vars) ──────────────────────

/// Parse a string as a `u16` within a range.
pub fn parse_u16_range(val: &str, min: u16, max: u16) -> Option<u16> {
    let n: u16 = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

/// Parse a string as an `f64` within a range.
pub fn parse_f64_range(val: &str, min: f64, max: f64) -> Option<f64> {
    let n: f64 = val.parse().ok()?;
    (n.is_finite() && n >= min && n <= max).then_some(n)
}

// ── Env var readers (thin wrappers) ─────────────────────────────────────────

fn read_env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn read_env_u16(name: &str, min: u16, max: u16) -> Option<u16> {
    let val = std::env::var(name).ok()?;
    let result = parse_u16_range(&val, min, max);
    if result.is_none() {
        tracing::warn!(key = name, value = %val, "invalid u16 env var, ignoring");
    }
    result
}

fn read_env_f64(name: &str, min: f64, max: f64) -> Option<f64> {
    let val = std::env::var(name).ok()?;
    let result = parse_f64_range(&val, min, max);
    if result.is_none() {
        tracing::warn!(key = name, value = %val, "invalid f64 env var, ignoring");
    }
    result
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::SettingsError;

    // ── deep_merge ──────────────────────────────────────────────────

    #[test]
    fn merge_simple_override() {
        let target = serde_json::json!({"a": 1, "b": 2});
        let source = serde_json::json!({"a": 10});
        let merged = deep_merge(target, source);
        assert_eq!(merged["a"], 10);
        assert_eq!(merged["b"], 2);
    }

    #[test]
    fn merge_nested_override() {
        let target = serde_json::json!({
            "server": {"port": 8000, "host": "localhost"}
        });
        let source = serde_json::json!({
            "server": {"port": 9090}
        });
        let merged = deep_merge(target, source);
        assert_eq!(merged["server"]["port"], 9090);
        assert_eq!(merged["server"]["host"], "localhost");
    }

    #[test]
    fn merge_array_replace() {
        let target = serde_json::json!({"origins": ["a", "b"]});
        let source = serde_json::json!({"origins": ["c"]});
        let merged = deep_merge(target, source);
        assert_eq!(merged["origins"], serde_json::json!(["c"]));
    }

    #[test]
    fn merge_null_preserves_target() {
        let target = serde_json::json!({"a": 1, "b": 2});
        let source = serde_json::json!({"a": null});
        let merged = deep_merge(target, source);
        assert_eq!(merged["a"], 1);
        assert_eq!(merged["b"], 2);
    }

    #[test]
    fn merge_new_keys_added() {
        let target = serde_json::json!({"a": 1});
        let source = serde_json::json!({"b": 2});
        let merged = deep_merge(target, source);
        assert_eq!(merged["a"], 1);
        assert_eq!(merged["b"], 2);
    }

    // ── load_settings_from_path ─────────────────────────────────────

    #[test]
    fn load_missing_file_returns_defaults() {
        let path = Path::new("/nonexistent/folio.json");
        let settings = load_settings_from_path(path).unwrap();
        let defaults = FolioSettings::default();
        assert_eq!(settings.version, defaults.version);
        assert_eq!(settings.server.port, defaults.server.port);
    }

    #[test]
    fn load_partial_json_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("folio.json");
        std::fs::write(
            &path,
            r#"{"server": {"port": 9090}, "retry": {"maxRetries": 5}}"#,
        )
        .unwrap();

        let settings = load_settings_from_path(&path).unwrap();
        assert_eq!(settings.server.port, 9090);
        assert_eq!(settings.retry.max_retries, 5);
        assert_eq!(settings.retry.base_delay_ms, 500);
        assert_eq!(settings.session.history_limit, 10);
    }

    #[test]
    fn load_deeply_nested_override() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("folio.json");
        std::fs::write(&path, r#"{"vectorIndex": {"topK": 8}}"#).unwrap();

        let settings = load_settings_from_path(&path).unwrap();
        assert_eq!(settings.vector_index.top_k, 8);
        assert_eq!(settings.vector_index.namespace, "corpus");
    }

    #[test]
    fn load_invalid_json_returns_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("folio.json");
        std::fs::write(&path, "not valid json").unwrap();

        let result = load_settings_from_path(&path);
        assert!(result.is_err());
        assert!(matches!(result.unwrap_err(), SettingsError::Json(_)));
    }

    #[test]
    fn load_clamps_out_of_range_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("folio.json");
        std::fs::write(&path, r#"{"retry": {"jitterFactor": 3.0}}"#).unwrap();

        let settings = load_settings_from_path(&path).unwrap();
        assert!((settings.retry.jitter_factor - 1.0).abs() < f64::EPSILON);
    }

    // ── parsers ─────────────────────────────────────────────────────

    #[test]
    fn parse_u16_valid() {
        assert_eq!(parse_u16_range("9090", 1, 65535), Some(9090));
        assert_eq!(parse_u16_range("1", 1, 65535), Some(1));
        assert_eq!(parse_u16_range("65535", 1, 65535), Some(65535));
    }

    #[test]
    fn parse_u16_invalid() {
        assert_eq!(parse_u16_range("0", 1, 65535), None);
        assert_eq!(parse_u16_range("not_a_number", 1, 65535), None);
        assert_eq!(parse_u16_range("99999", 1, 65535), None);
    }

    #[test]
    fn parse_f64_valid() {
        assert_eq!(parse_f64_range("2.5", 0.0, 100.0), Some(2.5));
        assert_eq!(parse_f64_range("0", 0.0, 100.0), Some(0.0));
    }

    #[test]
    fn parse_f64_invalid() {
        assert_eq!(parse_f64_range("-1", 0.0, 100.0), None);
        assert_eq!(parse_f64_range("NaN", 0.0, 100.0), None);
        assert_eq!(parse_f64_range("abc", 0.0, 100.0), None);
    }
}
