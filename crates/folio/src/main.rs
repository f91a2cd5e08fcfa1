//! # folio
//!
//! Service binary — loads settings, picks a store backend, and starts the
//! HTTP server.

#![deny(unsafe_code)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use folio_server::{AppState, build_state, router};
use folio_settings::FolioSettings;
use folio_store::{MemoryStore, PgStore, SessionStore};

/// Folio chat service.
#[derive(Parser, Debug)]
#[command(name = "folio", about = "Corpus chat API server")]
struct Cli {
    /// Host to bind (overrides settings).
    #[arg(long)]
    host: Option<String>,

    /// Port to bind (overrides settings).
    #[arg(long)]
    port: Option<u16>,

    /// Path to the settings file.
    #[arg(long)]
    config: Option<PathBuf>,
}

/// Pick the store backend from settings.
///
/// No database URL means demo mode: everything lives in memory and is
/// gone on restart.
async fn open_store(settings: &FolioSettings) -> Result<Arc<dyn SessionStore>> {
    if settings.database.demo_mode() {
        tracing::warn!("no database configured, running in demo mode with in-memory store");
        return Ok(Arc::new(MemoryStore::new()));
    }
    let url = settings
        .database
        .url
        .as_deref()
        .context("database URL missing")?;
    let store = PgStore::connect(
        url,
        settings.database.max_connections,
        settings.database.connect_timeout_ms,
    )
    .await
    .context("failed to connect to postgres")?;
    Ok(Arc::new(store))
}

/// Periodically delete expired anonymous sessions and prune limiter state.
fn spawn_cleanup_task(state: AppState) -> tokio::task::JoinHandle<()> {
    let interval_minutes = state.settings.session.cleanup_interval_minutes.max(1);
    let ttl_hours = state.settings.session.anonymous_ttl_hours;
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(interval_minutes * 60));
        // The first tick fires immediately; skip it so startup stays quiet.
        let _ = ticker.tick().await;
        loop {
            let _ = ticker.tick().await;
            state.limiter.prune();
            match state.store.cleanup_anonymous(ttl_hours).await {
                Ok(0) => {}
                Ok(removed) => {
                    metrics::counter!(folio_server::metrics::SESSIONS_CLEANED_TOTAL)
                        .increment(removed);
                    tracing::info!(removed, "cleaned up expired anonymous sessions");
                }
                Err(e) => tracing::warn!(error = %e, "anonymous session cleanup failed"),
            }
        }
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    let settings_path = args
        .config
        .unwrap_or_else(folio_settings::loader::settings_path);
    let (mut settings, settings_error) =
        match folio_settings::loader::load_settings_from_path(&settings_path) {
            Ok(settings) => (settings, None),
            Err(e) => (FolioSettings::default(), Some(e)),
        };
    if let Some(host) = args.host {
        settings.server.host = host;
    }
    if let Some(port) = args.port {
        settings.server.port = port;
    }

    folio_core::logging::init_subscriber(&settings.logging.level);
    if let Some(e) = settings_error {
        tracing::warn!(
            error = %e,
            path = %settings_path.display(),
            "failed to load settings, falling back to defaults"
        );
    }
    folio_settings::init_settings(settings.clone());
    let settings = Arc::new(settings);

    let metrics_handle = folio_server::metrics::install_recorder();
    let store = open_store(&settings).await?;
    tracing::info!(backend = store.backend_name(), "store ready");

    let state = build_state(Arc::clone(&settings), store, metrics_handle)
        .context("failed to build server state")?;
    let cleanup = spawn_cleanup_task(state.clone());
    let app = router(state);

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(addr = %listener.local_addr()?, "folio listening");

    axum_serve(listener, app).await?;

    tracing::info!("shutting down");
    cleanup.abort();
    Ok(())
}

async fn axum_serve(listener: tokio::net::TcpListener, app: axum::Router) -> Result<()> {
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .context("server error")
}
