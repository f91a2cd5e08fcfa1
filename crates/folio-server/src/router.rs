//! Router assembly and state construction.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::Router;
use axum::http::HeaderValue;
use axum::routing::{get, post};
use folio_auth::AuthClient;
use folio_chat::ChatPipeline;
use folio_llm::{ChatClient, CostLedger};
use folio_retrieval::{Retriever, VectorIndexClient};
use folio_settings::FolioSettings;
use folio_store::SessionStore;
use metrics_exporter_prometheus::PrometheusHandle;
use thiserror::Error;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::handlers;
use crate::rate_limit::RateLimiter;
use crate::state::AppState;

/// Failure while wiring up server state.
#[derive(Debug, Error)]
pub enum BuildError {
    /// LLM client construction failed.
    #[error(transparent)]
    Llm(#[from] folio_llm::LlmError),
    /// Vector index client construction failed.
    #[error(transparent)]
    Retrieval(#[from] folio_retrieval::RetrievalError),
    /// Auth client construction failed.
    #[error(transparent)]
    Auth(#[from] folio_auth::AuthError),
}

/// Wire settings and a store into shared handler state.
pub fn build_state(
    settings: Arc<FolioSettings>,
    store: Arc<dyn SessionStore>,
    metrics: PrometheusHandle,
) -> Result<AppState, BuildError> {
    let llm = Arc::new(ChatClient::new(settings.llm.clone(), &settings.retry)?);
    let index = VectorIndexClient::new(settings.vector_index.clone())?;
    let index_configured = index.is_enabled();
    let ledger = Arc::new(CostLedger::from_settings(&settings.llm));
    let retriever = Retriever::new(
        Arc::clone(&llm),
        index,
        Arc::clone(&ledger),
        settings.vector_index.score_floor,
    );
    let pipeline = Arc::new(ChatPipeline::new(
        Arc::clone(&store),
        Arc::clone(&llm),
        retriever,
        Arc::clone(&ledger),
        settings.llm.clone(),
        settings.session.history_limit,
    ));
    let auth = Arc::new(AuthClient::new(settings.auth.clone())?);

    Ok(AppState {
        store,
        pipeline,
        auth,
        llm,
        ledger,
        index_configured,
        settings,
        limiter: Arc::new(RateLimiter::new()),
        metrics,
        started_at: Instant::now(),
    })
}

/// Build the full application router.
pub fn router(state: AppState) -> Router {
    let server = &state.settings.server;
    let body_limit = RequestBodyLimitLayer::new(server.request_body_limit_bytes);
    let timeout = TimeoutLayer::new(Duration::from_millis(server.request_timeout_ms));
    let cors = cors_layer(&server.cors_origins);

    Router::new()
        .route("/", get(handlers::health::banner))
        .route("/health", get(handlers::health::health))
        .route("/metrics", get(handlers::health::metrics))
        .route("/auth/register", post(handlers::auth::register))
        .route("/auth/login", post(handlers::auth::login))
        .route("/auth/refresh", post(handlers::auth::refresh))
        .route("/auth/logout", post(handlers::auth::logout))
        .route(
            "/sessions",
            post(handlers::sessions::create).get(handlers::sessions::list),
        )
        .route(
            "/sessions/{id}",
            get(handlers::sessions::get)
                .put(handlers::sessions::update)
                .delete(handlers::sessions::delete),
        )
        .route("/sessions/{id}/claim", post(handlers::sessions::claim))
        .route("/sessions/{id}/messages", get(handlers::sessions::messages))
        .route("/chat/message", post(handlers::chat::message))
        .route("/analytics/costs", get(handlers::analytics::costs))
        .layer(axum::middleware::from_fn(crate::metrics::track_http))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(timeout)
        .layer(body_limit)
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin, "ignoring unparseable CORS origin");
                None
            }
        })
        .collect();
    CorsLayer::new()
        .allow_origin(parsed)
        .allow_methods(tower_http::cors::AllowMethods::mirror_request())
        .allow_headers(tower_http::cors::AllowHeaders::mirror_request())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
