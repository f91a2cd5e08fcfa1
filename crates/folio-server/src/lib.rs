//! HTTP surface of the service.
//!
//! Assembles the axum router over the store, chat pipeline, auth provider,
//! and spend ledger, with per-client rate limiting and Prometheus metrics.

pub mod error;
pub mod handlers;
pub mod identity;
pub mod metrics;
pub mod rate_limit;
pub mod router;
pub mod state;

pub use error::ApiError;
pub use router::{BuildError, build_state, router};
pub use state::AppState;
