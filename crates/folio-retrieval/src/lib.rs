//! Corpus retrieval for grounded answers.
//!
//! Turns a user query into a ranked set of [`folio_core::chat::SourceChunk`]s
//! by embedding the query and searching a hosted vector index. The chat
//! pipeline treats retrieval as best-effort; this crate reports failures
//! honestly and lets the caller decide how to degrade.

pub mod error;
pub mod index;
pub mod retriever;

pub use error::{Result, RetrievalError};
pub use index::{IndexMatch, VectorIndexClient};
pub use retriever::Retriever;
