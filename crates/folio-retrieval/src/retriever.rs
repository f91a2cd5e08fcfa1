//! Query-to-passages retrieval.
//!
//! Embeds the user query, asks the vector index for the nearest chunks,
//! and maps matches into [`SourceChunk`]s. Matches below the score floor
//! or without passage text are dropped rather than cited.

use std::sync::Arc;

use folio_core::chat::SourceChunk;
use folio_llm::{ChatClient, CostLedger, pricing};
use tracing::{debug, instrument, warn};

use crate::error::Result;
use crate::index::{IndexMatch, VectorIndexClient};

/// Retrieval requests counter (labels: outcome).
const RETRIEVAL_REQUESTS_TOTAL: &str = "retrieval_requests_total";

/// Retrieves corpus passages relevant to a user query.
pub struct Retriever {
    llm: Arc<ChatClient>,
    index: VectorIndexClient,
    ledger: Arc<CostLedger>,
    score_floor: f32,
}

impl Retriever {
    /// Build a retriever over an embedding client and index client.
    ///
    /// Embedding spend is recorded against `ledger`.
    #[must_use]
    pub fn new(
        llm: Arc<ChatClient>,
        index: VectorIndexClient,
        ledger: Arc<CostLedger>,
        score_floor: f32,
    ) -> Self {
        Self {
            llm,
            index,
            ledger,
            score_floor,
        }
    }

    /// Whether both the embedding client and the index are configured.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.llm.is_enabled() && self.index.is_enabled()
    }

    /// Retrieve passages for `query`, best matches first.
    #[instrument(skip(self, query))]
    pub async fn retrieve(&self, query: &str) -> Result<Vec<SourceChunk>> {
        let outcome = self.run_query(query).await;
        let label = if outcome.is_ok() { "ok" } else { "error" };
        metrics::counter!(RETRIEVAL_REQUESTS_TOTAL, "outcome" => label).increment(1);
        outcome
    }

    async fn run_query(&self, query: &str) -> Result<Vec<SourceChunk>> {
        let (vector, tokens) = self.llm.embed(query).await?;
        if tokens > 0 {
            self.ledger
                .record(pricing::embedding_cost(self.llm.embedding_model(), tokens));
        }
        let matches = self.index.query(&vector).await?;

        let total = matches.len();
        let chunks: Vec<SourceChunk> = matches
            .into_iter()
            .filter(|m| m.score >= self.score_floor)
            .filter_map(into_chunk)
            .collect();
        debug!(
            retrieved = total,
            cited = chunks.len(),
            "retrieval complete"
        );
        Ok(chunks)
    }
}

/// Map an index match into a citable chunk.
///
/// Returns `None` when the match has no passage text; a citation the
/// model cannot quote from is worse than none.
fn into_chunk(m: IndexMatch) -> Option<SourceChunk> {
    let text = m
        .metadata
        .get("text")
        .and_then(|v| v.as_str())
        .filter(|t| !t.is_empty())?
        .to_string();
    let source = m
        .metadata
        .get("source")
        .and_then(|v| v.as_str())
        .unwrap_or("Unknown source")
        .to_string();
    let volume = m
        .metadata
        .get("volume")
        .and_then(|v| v.as_str())
        .map(String::from);
    let page = m.metadata.get("page").and_then(serde_json::Value::as_i64);
    if m.metadata.get("source").is_none() {
        warn!(chunk_id = %m.id, "index chunk has no source metadata");
    }

    Some(SourceChunk {
        chunk_id: m.id,
        text,
        source,
        volume,
        page,
        score: m.score,
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use folio_settings::{LlmSettings, RetrySettings, VectorIndexSettings};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn index_match(id: &str, score: f32, metadata: serde_json::Value) -> IndexMatch {
        IndexMatch {
            id: id.to_string(),
            score,
            metadata: metadata.as_object().cloned().unwrap_or_default(),
        }
    }

    // ── match mapping ───────────────────────────────────────────────

    #[test]
    fn chunk_mapping_full_metadata() {
        let m = index_match(
            "c1",
            0.9,
            serde_json::json!({"text": "passage", "source": "Letters", "volume": "II", "page": 114}),
        );
        let chunk = into_chunk(m).unwrap();
        assert_eq!(chunk.chunk_id, "c1");
        assert_eq!(chunk.source, "Letters");
        assert_eq!(chunk.volume.as_deref(), Some("II"));
        assert_eq!(chunk.page, Some(114));
    }

    #[test]
    fn chunk_without_text_is_dropped() {
        let m = index_match("c1", 0.9, serde_json::json!({"source": "Letters"}));
        assert!(into_chunk(m).is_none());
        let m = index_match("c2", 0.9, serde_json::json!({"text": ""}));
        assert!(into_chunk(m).is_none());
    }

    #[test]
    fn chunk_without_source_gets_placeholder() {
        let m = index_match("c1", 0.9, serde_json::json!({"text": "passage"}));
        let chunk = into_chunk(m).unwrap();
        assert_eq!(chunk.source, "Unknown source");
    }

    // ── end to end against mock servers ─────────────────────────────

    async fn mock_embedding_server() -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [{"embedding": [0.1, 0.2, 0.3]}],
                "usage": {"prompt_tokens": 3, "completion_tokens": 0}
            })))
            .mount(&server)
            .await;
        server
    }

    fn retriever(llm_url: &str, index_url: &str, score_floor: f32) -> (Retriever, Arc<CostLedger>) {
        let llm = Arc::new(
            folio_llm::ChatClient::new(
                LlmSettings {
                    base_url: llm_url.to_string(),
                    api_key: "k".to_string(),
                    ..LlmSettings::default()
                },
                &RetrySettings::default(),
            )
            .unwrap(),
        );
        let index = VectorIndexClient::new(VectorIndexSettings {
            base_url: index_url.to_string(),
            api_key: "ik".to_string(),
            ..VectorIndexSettings::default()
        })
        .unwrap();
        let ledger = Arc::new(CostLedger::new(5.0, 100.0, 0.8));
        (
            Retriever::new(llm, index, Arc::clone(&ledger), score_floor),
            ledger,
        )
    }

    #[tokio::test]
    async fn retrieve_filters_by_score_floor() {
        let llm_server = mock_embedding_server().await;
        let index_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/query"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "matches": [
                    {"id": "hi", "score": 0.9, "metadata": {"text": "kept", "source": "A"}},
                    {"id": "lo", "score": 0.1, "metadata": {"text": "dropped", "source": "B"}},
                    {"id": "no-text", "score": 0.8, "metadata": {"source": "C"}}
                ]
            })))
            .mount(&index_server)
            .await;

        let (retriever, _) = retriever(&llm_server.uri(), &index_server.uri(), 0.25);
        let chunks = retriever.retrieve("what is the shadow").await.unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].chunk_id, "hi");
        assert_eq!(chunks[0].text, "kept");
    }

    #[tokio::test]
    async fn retrieve_records_embedding_spend() {
        let llm_server = mock_embedding_server().await;
        let index_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/query"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"matches": []})),
            )
            .mount(&index_server)
            .await;

        let (retriever, ledger) = retriever(&llm_server.uri(), &index_server.uri(), 0.25);
        let _ = retriever.retrieve("what is the shadow").await.unwrap();
        assert!(ledger.snapshot().daily_spent_usd > 0.0);

        // A cache hit bills zero tokens and adds no spend.
        let spent = ledger.snapshot().daily_spent_usd;
        let _ = retriever.retrieve("what is the shadow").await.unwrap();
        assert_eq!(ledger.snapshot().daily_spent_usd, spent);
    }

    #[tokio::test]
    async fn retrieve_propagates_index_failure() {
        let llm_server = mock_embedding_server().await;
        let index_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/query"))
            .respond_with(ResponseTemplate::new(500).set_body_string("down"))
            .mount(&index_server)
            .await;

        let (retriever, _) = retriever(&llm_server.uri(), &index_server.uri(), 0.25);
        let err = retriever.retrieve("query").await.unwrap_err();
        assert!(matches!(
            err,
            crate::error::RetrievalError::Index { status: 500, .. }
        ));
    }
}
