//! The chat turn route.

use std::time::Instant;

use axum::Json;
use axum::extract::State;
use axum::http::HeaderMap;
use folio_chat::ChatTurn;
use serde::Deserialize;

use crate::error::ApiError;
use crate::handlers::enforce_rate_limit;
use crate::identity::optional_identity;
use crate::rate_limit::RateScope;
use crate::state::AppState;

/// Body for a chat turn.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    /// Session to converse in.
    pub session_id: String,
    /// The user's message.
    pub message: String,
    /// Force a specific model instead of complexity-based selection.
    #[serde(default)]
    pub model: Option<String>,
}

/// POST /chat/message
pub async fn message(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatTurn>, ApiError> {
    enforce_rate_limit(&state, &headers, RateScope::Chat)?;
    let caller = optional_identity(&state, &headers).await?;

    let started = Instant::now();
    let turn = state
        .pipeline
        .run(
            &req.session_id,
            &req.message,
            caller.as_ref().map(|u| u.id.as_str()),
            req.model.as_deref(),
        )
        .await?;

    let model = turn
        .assistant_message
        .model
        .clone()
        .unwrap_or_else(|| "unknown".to_string());
    metrics::counter!(crate::metrics::CHAT_TURNS_TOTAL, "model" => model).increment(1);
    metrics::histogram!(crate::metrics::CHAT_TURN_DURATION_SECONDS)
        .record(started.elapsed().as_secs_f64());
    if let Some(cost) = turn.assistant_message.cost_usd {
        metrics::histogram!(crate::metrics::CHAT_TURN_COST_USD).record(cost);
    }
    Ok(Json(turn))
}
