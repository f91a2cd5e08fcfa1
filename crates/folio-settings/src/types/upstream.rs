//! Upstream service settings: LLM API, vector index, and auth provider.

use serde::{Deserialize, Serialize};

/// LLM API settings: endpoints, model selection, budgets, and caches.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LlmSettings {
    /// API base URL (OpenAI-compatible).
    pub base_url: String,
    /// API key. Empty disables the client (demo replies only).
    pub api_key: String,
    /// Model for routine queries.
    pub default_model: String,
    /// Model for complex queries.
    pub complex_model: String,
    /// Embedding model for retrieval queries.
    pub embedding_model: String,
    /// Completion token ceiling per response.
    pub max_output_tokens: u32,
    /// Sampling temperature.
    pub temperature: f64,
    /// Request timeout in milliseconds.
    pub timeout_ms: u64,
    /// Daily spend ceiling in USD.
    pub daily_budget_usd: f64,
    /// Monthly spend ceiling in USD.
    pub monthly_budget_usd: f64,
    /// Fraction of the daily budget past which only the cheap model is used.
    pub budget_downshift_ratio: f64,
    /// Response cache entry lifetime in seconds.
    pub response_cache_ttl_secs: u64,
    /// Response cache capacity.
    pub response_cache_max_entries: usize,
    /// Embedding cache entry lifetime in seconds.
    pub embedding_cache_ttl_secs: u64,
    /// Embedding cache capacity.
    pub embedding_cache_max_entries: usize,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: String::new(),
            default_model: "gpt-4o-mini".to_string(),
            complex_model: "gpt-4o".to_string(),
            embedding_model: "text-embedding-3-small".to_string(),
            max_output_tokens: 1_000,
            temperature: 0.7,
            timeout_ms: 60_000,
            daily_budget_usd: 5.0,
            monthly_budget_usd: 100.0,
            budget_downshift_ratio: 0.8,
            response_cache_ttl_secs: 3_600,
            response_cache_max_entries: 1_000,
            embedding_cache_ttl_secs: 86_400,
            embedding_cache_max_entries: 5_000,
        }
    }
}

/// Vector index settings (Pinecone-style query API).
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VectorIndexSettings {
    /// Index query base URL.
    pub base_url: String,
    /// Index API key. Empty disables retrieval.
    pub api_key: String,
    /// Namespace to query within the index.
    pub namespace: String,
    /// Matches requested per query.
    pub top_k: usize,
    /// Minimum similarity score for a match to be cited.
    pub score_floor: f32,
    /// Request timeout in milliseconds.
    pub timeout_ms: u64,
}

impl Default for VectorIndexSettings {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            api_key: String::new(),
            namespace: "corpus".to_string(),
            top_k: 5,
            score_floor: 0.25,
            timeout_ms: 10_000,
        }
    }
}

/// Managed auth provider settings (GoTrue-style REST API).
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AuthSettings {
    /// Provider base URL (e.g., `https://<project>.supabase.co`).
    pub base_url: String,
    /// Project API key, sent as the `apikey` header.
    pub api_key: String,
    /// HS256 secret for local access-token verification.
    pub jwt_secret: String,
    /// Request timeout in milliseconds.
    pub timeout_ms: u64,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            api_key: String::new(),
            jwt_secret: String::new(),
            timeout_ms: 10_000,
        }
    }
}

impl AuthSettings {
    /// Whether the provider is configured at all.
    #[must_use]
    pub fn enabled(&self) -> bool {
        !self.base_url.is_empty() && !self.api_key.is_empty()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn llm_defaults() {
        let llm = LlmSettings::default();
        assert_eq!(llm.default_model, "gpt-4o-mini");
        assert_eq!(llm.complex_model, "gpt-4o");
        assert!((llm.daily_budget_usd - 5.0).abs() < f64::EPSILON);
        assert!((llm.budget_downshift_ratio - 0.8).abs() < f64::EPSILON);
    }

    #[test]
    fn vector_defaults() {
        let v = VectorIndexSettings::default();
        assert_eq!(v.top_k, 5);
        assert!((v.score_floor - 0.25).abs() < f32::EPSILON);
    }

    #[test]
    fn auth_enabled_requires_url_and_key() {
        let mut auth = AuthSettings::default();
        assert!(!auth.enabled());
        auth.base_url = "https://proj.supabase.co".to_string();
        assert!(!auth.enabled());
        auth.api_key = "anon-key".to_string();
        assert!(auth.enabled());
    }

    #[test]
    fn llm_partial_json_keeps_defaults() {
        let llm: LlmSettings =
            serde_json::from_str(r#"{"dailyBudgetUsd": 2.5, "defaultModel": "gpt-4.1-mini"}"#)
                .unwrap();
        assert!((llm.daily_budget_usd - 2.5).abs() < f64::EPSILON);
        assert_eq!(llm.default_model, "gpt-4.1-mini");
        assert_eq!(llm.embedding_model, "text-embedding-3-small");
    }
}
