//! Shared state accessible from handlers.

use std::sync::Arc;
use std::time::Instant;

use folio_auth::AuthClient;
use folio_chat::ChatPipeline;
use folio_llm::{ChatClient, CostLedger};
use folio_settings::FolioSettings;
use folio_store::SessionStore;
use metrics_exporter_prometheus::PrometheusHandle;

use crate::rate_limit::RateLimiter;

/// Everything a handler can reach.
#[derive(Clone)]
pub struct AppState {
    /// Session and message persistence.
    pub store: Arc<dyn SessionStore>,
    /// The chat turn pipeline.
    pub pipeline: Arc<ChatPipeline>,
    /// Managed auth provider client.
    pub auth: Arc<AuthClient>,
    /// LLM client, for health and cache stats.
    pub llm: Arc<ChatClient>,
    /// Spend ledger.
    pub ledger: Arc<CostLedger>,
    /// Whether a vector index is configured.
    pub index_configured: bool,
    /// Loaded settings.
    pub settings: Arc<FolioSettings>,
    /// Per-client rate limiter.
    pub limiter: Arc<RateLimiter>,
    /// Renders the `/metrics` endpoint.
    pub metrics: PrometheusHandle,
    /// When the server started.
    pub started_at: Instant,
}
