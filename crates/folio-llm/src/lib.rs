//! # folio-llm
//!
//! OpenAI-compatible chat and embedding client with cost accounting.
//!
//! - [`client::ChatClient`] — completions and embeddings with retries
//!   and TTL caches
//! - [`ledger::CostLedger`] — daily/monthly spend budgets with UTC
//!   rollover and the cheap-model downshift signal
//! - [`select`] — query complexity classification and model choice
//! - [`pricing`] — per-million-token pricing tables

#![deny(unsafe_code)]

pub mod cache;
pub mod client;
pub mod error;
pub mod ledger;
pub mod pricing;
pub mod select;
pub mod types;

pub use cache::{CacheStats, TtlCache};
pub use client::{ChatClient, ChatOutcome};
pub use error::{BudgetScope, LlmError, Result};
pub use ledger::{CostLedger, CostSnapshot};
pub use select::{Complexity, classify, select_model};
pub use types::WireMessage;
