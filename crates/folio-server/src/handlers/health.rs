//! Health and banner routes.

use axum::Json;
use axum::extract::State;
use serde::Serialize;

use crate::state::AppState;

/// Component health report.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// `ok` when every required component is up, `degraded` otherwise.
    pub status: &'static str,
    /// Seconds since startup.
    pub uptime_secs: u64,
    /// Per-component state.
    pub components: Components,
}

/// Per-component health.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Components {
    /// Persistence backend name and reachability.
    pub store: StoreHealth,
    /// Whether the LLM client has credentials.
    pub llm_configured: bool,
    /// Whether a vector index is configured.
    pub index_configured: bool,
    /// Whether a managed auth provider is configured.
    pub auth_configured: bool,
}

/// Persistence health.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreHealth {
    /// `postgres` or `memory`.
    pub backend: &'static str,
    /// Whether a probe query succeeded.
    pub healthy: bool,
}

/// GET /health
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let store_healthy = state.store.healthy().await;
    let status = if store_healthy { "ok" } else { "degraded" };
    Json(HealthResponse {
        status,
        uptime_secs: state.started_at.elapsed().as_secs(),
        components: Components {
            store: StoreHealth {
                backend: state.store.backend_name(),
                healthy: store_healthy,
            },
            llm_configured: state.llm.is_enabled(),
            index_configured: state.index_configured,
            auth_configured: state.auth.is_enabled(),
        },
    })
}

/// Service banner.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Banner {
    /// Application name.
    pub name: String,
    /// Settings schema version.
    pub version: String,
}

/// GET /
pub async fn banner(State(state): State<AppState>) -> Json<Banner> {
    Json(Banner {
        name: state.settings.name.clone(),
        version: state.settings.version.clone(),
    })
}

/// GET /metrics
pub async fn metrics(State(state): State<AppState>) -> String {
    state.metrics.render()
}
