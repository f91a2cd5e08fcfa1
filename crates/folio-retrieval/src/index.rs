//! Vector index query client.
//!
//! Speaks the Pinecone-style REST query API: `POST {base}/query` with an
//! `Api-Key` header, camelCase body fields, and scored matches carrying a
//! metadata map.

use folio_settings::VectorIndexSettings;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::error::{Result, RetrievalError};

/// `POST /query` request body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    vector: &'a [f32],
    top_k: usize,
    include_metadata: bool,
    namespace: &'a str,
}

/// A scored match returned by the index.
#[derive(Clone, Debug, Deserialize)]
pub struct IndexMatch {
    /// Chunk ID.
    pub id: String,
    /// Similarity score.
    pub score: f32,
    /// Chunk metadata (text, source, volume, page).
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<IndexMatch>,
}

/// Client for the vector index query endpoint.
pub struct VectorIndexClient {
    http: reqwest::Client,
    cfg: VectorIndexSettings,
}

impl VectorIndexClient {
    /// Build a client from settings.
    pub fn new(cfg: VectorIndexSettings) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_millis(cfg.timeout_ms))
            .build()?;
        Ok(Self { http, cfg })
    }

    /// Whether an index is configured.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        !self.cfg.base_url.is_empty() && !self.cfg.api_key.is_empty()
    }

    /// Query the index for the nearest chunks to `vector`.
    #[instrument(skip(self, vector))]
    pub async fn query(&self, vector: &[f32]) -> Result<Vec<IndexMatch>> {
        if !self.is_enabled() {
            return Err(RetrievalError::Disabled);
        }

        let url = format!("{}/query", self.cfg.base_url.trim_end_matches('/'));
        let request = QueryRequest {
            vector,
            top_k: self.cfg.top_k,
            include_metadata: true,
            namespace: &self.cfg.namespace,
        };
        let response = self
            .http
            .post(&url)
            .header("Api-Key", &self.cfg.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(RetrievalError::Index {
                status: status.as_u16(),
                message,
            });
        }

        let body: QueryResponse = response.json().await?;
        debug!(matches = body.matches.len(), "vector index query complete");
        Ok(body.matches)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn settings(base_url: &str) -> VectorIndexSettings {
        VectorIndexSettings {
            base_url: base_url.to_string(),
            api_key: "index-key".to_string(),
            namespace: "corpus".to_string(),
            top_k: 3,
            ..VectorIndexSettings::default()
        }
    }

    #[tokio::test]
    async fn query_sends_camel_case_body_and_api_key() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/query"))
            .and(header("Api-Key", "index-key"))
            .and(body_partial_json(serde_json::json!({
                "topK": 3,
                "includeMetadata": true,
                "namespace": "corpus"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "matches": [
                    {"id": "c1", "score": 0.92, "metadata": {"text": "passage", "source": "Letters"}}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = VectorIndexClient::new(settings(&server.uri())).unwrap();
        let matches = client.query(&[0.1, 0.2]).await.unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].id, "c1");
        assert!((matches[0].score - 0.92).abs() < f32::EPSILON);
        assert_eq!(matches[0].metadata["text"], "passage");
    }

    #[tokio::test]
    async fn query_error_status_is_surfaced() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/query"))
            .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
            .mount(&server)
            .await;

        let client = VectorIndexClient::new(settings(&server.uri())).unwrap();
        let err = client.query(&[0.1]).await.unwrap_err();
        assert!(matches!(err, RetrievalError::Index { status: 503, .. }));
    }

    #[tokio::test]
    async fn unconfigured_index_is_disabled() {
        let client = VectorIndexClient::new(VectorIndexSettings::default()).unwrap();
        assert!(!client.is_enabled());
        let err = client.query(&[0.1]).await.unwrap_err();
        assert!(matches!(err, RetrievalError::Disabled));
    }

    #[tokio::test]
    async fn empty_matches_tolerated() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/query"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;

        let client = VectorIndexClient::new(settings(&server.uri())).unwrap();
        let matches = client.query(&[0.1]).await.unwrap();
        assert!(matches.is_empty());
    }
}
