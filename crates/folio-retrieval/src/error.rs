//! Retrieval error types.

use thiserror::Error;

/// Result type alias for retrieval operations.
pub type Result<T> = std::result::Result<T, RetrievalError>;

/// Errors that can occur while querying the vector index.
#[derive(Debug, Error)]
pub enum RetrievalError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The index returned an error response.
    #[error("index error ({status}): {message}")]
    Index {
        /// HTTP status code.
        status: u16,
        /// Error description.
        message: String,
    },

    /// Embedding the query failed.
    #[error("embedding failed: {0}")]
    Embedding(#[from] folio_llm::LlmError),

    /// No index is configured.
    #[error("vector index is not configured")]
    Disabled,
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_error_display() {
        let err = RetrievalError::Index {
            status: 503,
            message: "index unavailable".into(),
        };
        assert_eq!(err.to_string(), "index error (503): index unavailable");
    }

    #[test]
    fn embedding_error_wraps_llm_error() {
        let err: RetrievalError = folio_llm::LlmError::Disabled.into();
        assert!(matches!(err, RetrievalError::Embedding(_)));
    }
}
