//! Cost and cache analytics.

use axum::Json;
use axum::extract::State;
use axum::http::HeaderMap;
use folio_llm::{CacheStats, CostSnapshot};
use serde::Serialize;

use crate::error::ApiError;
use crate::handlers::enforce_rate_limit;
use crate::identity::require_identity;
use crate::rate_limit::RateScope;
use crate::state::AppState;

/// Spend and cache state for the analytics route.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CostsResponse {
    /// Current spend against the configured budgets.
    pub cost: CostSnapshot,
    /// Completion and embedding cache statistics.
    pub caches: CachesBody,
}

/// Cache statistics by cache.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CachesBody {
    /// Chat completion cache.
    pub responses: CacheStats,
    /// Embedding cache.
    pub embeddings: CacheStats,
}

/// GET /analytics/costs
pub async fn costs(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<CostsResponse>, ApiError> {
    enforce_rate_limit(&state, &headers, RateScope::Read)?;
    let _caller = require_identity(&state, &headers).await?;
    let (responses, embeddings) = state.llm.cache_stats();
    Ok(Json(CostsResponse {
        cost: state.ledger.snapshot(),
        caches: CachesBody {
            responses,
            embeddings,
        },
    }))
}
