//! Settings type definitions.
//!
//! All types use `#[serde(rename_all = "camelCase")]` to match the JSON wire
//! format. Each type implements [`Default`] with production default values.
//! Types marked with `#[serde(default)]` allow partial JSON — missing fields
//! get their default value during deserialization.

mod server;
mod upstream;

pub use server::*;
pub use upstream::*;

use serde::{Deserialize, Serialize};

/// Root settings type for the folio service.
///
/// Loaded from `folio.json` with defaults applied for missing fields.
/// Environment variables can override specific values.
///
/// # JSON Format
///
/// All field names are camelCase. Example:
///
/// ```json
/// {
///   "version": "0.1.0",
///   "server": { "port": 9000 },
///   "llm": { "dailyBudgetUsd": 2.0 }
/// }
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FolioSettings {
    /// Settings schema version.
    pub version: String,
    /// Application name.
    pub name: String,
    /// HTTP server network settings.
    pub server: ServerSettings,
    /// Postgres connection settings.
    pub database: DatabaseSettings,
    /// Managed auth provider settings.
    pub auth: AuthSettings,
    /// LLM API settings.
    pub llm: LlmSettings,
    /// Vector index settings.
    pub vector_index: VectorIndexSettings,
    /// Retry configuration for upstream API calls.
    pub retry: RetrySettings,
    /// Per-route-group rate limits.
    pub rate_limits: RateLimitSettings,
    /// Session behavior settings.
    pub session: SessionSettings,
    /// Logging configuration.
    pub logging: LoggingSettings,
}

impl Default for FolioSettings {
    fn default() -> Self {
        Self {
            version: "0.1.0".to_string(),
            name: "folio".to_string(),
            server: ServerSettings::default(),
            database: DatabaseSettings::default(),
            auth: AuthSettings::default(),
            llm: LlmSettings::default(),
            vector_index: VectorIndexSettings::default(),
            retry: RetrySettings::default(),
            rate_limits: RateLimitSettings::default(),
            session: SessionSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

impl FolioSettings {
    /// Clamp ratio fields to [0.0, 1.0] and correct invalid invariants.
    ///
    /// Called automatically during loading. Out-of-range values are clamped
    /// with a warning rather than rejected, so users get corrected behavior
    /// instead of a confusing error.
    pub fn validate(&mut self) {
        fn clamp_ratio(val: &mut f64, name: &str) {
            if *val < 0.0 || *val > 1.0 {
                let clamped = val.clamp(0.0, 1.0);
                tracing::warn!("{name} out of range ({val}), clamped to {clamped}");
                *val = clamped;
            }
        }

        clamp_ratio(&mut self.retry.jitter_factor, "jitter_factor");
        clamp_ratio(
            &mut self.llm.budget_downshift_ratio,
            "budget_downshift_ratio",
        );

        let floor = &mut self.vector_index.score_floor;
        if *floor < 0.0 || *floor > 1.0 {
            let clamped = floor.clamp(0.0, 1.0);
            tracing::warn!("score_floor out of range ({floor}), clamped to {clamped}");
            *floor = clamped;
        }

        if self.llm.monthly_budget_usd < self.llm.daily_budget_usd {
            tracing::warn!(
                "monthly budget ({}) < daily budget ({}), correcting",
                self.llm.monthly_budget_usd,
                self.llm.daily_budget_usd
            );
            self.llm.monthly_budget_usd = self.llm.daily_budget_usd;
        }
    }
}

/// Retry configuration for upstream API calls.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RetrySettings {
    /// Maximum number of retry attempts.
    pub max_retries: u32,
    /// Base delay between retries in milliseconds.
    pub base_delay_ms: u64,
    /// Maximum delay between retries in milliseconds.
    pub max_delay_ms: u64,
    /// Jitter factor (0.0–1.0) applied to retry delays.
    pub jitter_factor: f64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay_ms: 500,
            max_delay_ms: 8_000,
            jitter_factor: 0.2,
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
    fn default_settings_identity() {
        let s = FolioSettings::default();
        assert_eq!(s.version, "0.1.0");
        assert_eq!(s.name, "folio");
    }

    #[test]
    fn default_settings_serde_roundtrip() {
        let defaults = FolioSettings::default();
        let json = serde_json::to_string(&defaults).unwrap();
        let back: FolioSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(back.version, defaults.version);
        assert_eq!(back.server.port, defaults.server.port);
        assert_eq!(back.llm.default_model, defaults.llm.default_model);
        assert_eq!(back.session.history_limit, defaults.session.history_limit);
    }

    #[test]
    fn default_settings_json_field_names() {
        let json = serde_json::to_value(FolioSettings::default()).unwrap();
        assert!(json.get("vectorIndex").is_some());
        assert!(json.get("rateLimits").is_some());
        assert!(json["llm"].get("dailyBudgetUsd").is_some());
        assert!(json["server"].get("requestBodyLimitBytes").is_some());
    }

    #[test]
    fn validate_clamps_ratios() {
        let mut s = FolioSettings::default();
        s.retry.jitter_factor = 1.5;
        s.llm.budget_downshift_ratio = -0.1;
        s.vector_index.score_floor = 2.0;
        s.validate();
        assert!((s.retry.jitter_factor - 1.0).abs() < f64::EPSILON);
        assert!(s.llm.budget_downshift_ratio.abs() < f64::EPSILON);
        assert!((s.vector_index.score_floor - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn validate_corrects_budget_inversion() {
        let mut s = FolioSettings::default();
        s.llm.daily_budget_usd = 10.0;
        s.llm.monthly_budget_usd = 3.0;
        s.validate();
        assert!((s.llm.monthly_budget_usd - 10.0).abs() < f64::EPSILON);
    }
}
