//! Chat pipeline errors.

use thiserror::Error;

/// Errors from running a chat turn.
#[derive(Debug, Error)]
pub enum ChatError {
    /// The message text failed validation.
    #[error("invalid message: {0}")]
    InvalidMessage(String),

    /// Session lookup or persistence failed.
    #[error(transparent)]
    Store(#[from] folio_store::StoreError),

    /// Generation failed or the budget is exhausted.
    #[error(transparent)]
    Llm(#[from] folio_llm::LlmError),
}

/// Convenience alias for chat results.
pub type Result<T> = std::result::Result<T, ChatError>;
