//! Chat turn orchestration.
//!
//! Ties the store, retriever, and LLM client together into a single
//! [`ChatPipeline`] that handles a user message end to end and returns
//! the stored conversation turn.

pub mod error;
pub mod pipeline;
pub mod prompt;

pub use error::{ChatError, Result};
pub use pipeline::{ChatPipeline, ChatTurn};
