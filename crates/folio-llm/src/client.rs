//! OpenAI-compatible chat and embedding client.
//!
//! One `reqwest` client is reused across requests. Retryable failures
//! (timeouts, 429, 5xx) are retried with exponential backoff; a
//! `Retry-After` hint from the API takes precedence over the computed
//! delay. Successful completions and embeddings land in TTL caches keyed
//! by content digest.

use std::time::Duration;

use folio_core::chat::TokenUsage;
use folio_core::retry::RetryConfig;
use folio_settings::{LlmSettings, RetrySettings};
use reqwest::StatusCode;
use reqwest::header::RETRY_AFTER;
use tracing::{debug, instrument, warn};

use crate::cache::{CacheStats, TtlCache, cache_key};
use crate::error::{LlmError, Result};
use crate::pricing::calculate_cost;
use crate::types::{
    ApiErrorBody, ChatCompletionRequest, ChatCompletionResponse, EmbeddingRequest,
    EmbeddingResponse, WireMessage,
};

/// Fallback retry delay when a 429 carries no `Retry-After` header.
const DEFAULT_RATE_LIMIT_DELAY_MS: u64 = 1_000;

/// Result of a chat completion.
#[derive(Clone, Debug)]
pub struct ChatOutcome {
    /// Generated text.
    pub content: String,
    /// Token usage for the request (zero when served from cache).
    pub usage: TokenUsage,
    /// Model that served the request.
    pub model: String,
    /// Whether the response came from the cache.
    pub cached: bool,
}

impl ChatOutcome {
    /// USD cost of this completion. Cached responses cost nothing.
    #[must_use]
    pub fn cost_usd(&self) -> f64 {
        if self.cached {
            0.0
        } else {
            calculate_cost(&self.model, self.usage)
        }
    }
}

#[derive(Clone)]
struct CachedCompletion {
    content: String,
    model: String,
}

/// Client for the chat completions and embeddings endpoints.
pub struct ChatClient {
    http: reqwest::Client,
    cfg: LlmSettings,
    retry: RetryConfig,
    response_cache: TtlCache<CachedCompletion>,
    embedding_cache: TtlCache<Vec<f32>>,
}

impl ChatClient {
    /// Build a client from settings.
    pub fn new(cfg: LlmSettings, retry: &RetrySettings) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(cfg.timeout_ms))
            .build()?;
        Ok(Self {
            http,
            retry: RetryConfig {
                max_retries: retry.max_retries,
                base_delay_ms: retry.base_delay_ms,
                max_delay_ms: retry.max_delay_ms,
                jitter_factor: retry.jitter_factor,
            },
            response_cache: TtlCache::new(
                Duration::from_secs(cfg.response_cache_ttl_secs),
                cfg.response_cache_max_entries,
            ),
            embedding_cache: TtlCache::new(
                Duration::from_secs(cfg.embedding_cache_ttl_secs),
                cfg.embedding_cache_max_entries,
            ),
            cfg,
        })
    }

    /// Whether an API key is configured.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        !self.cfg.api_key.is_empty()
    }

    /// The configured embedding model.
    #[must_use]
    pub fn embedding_model(&self) -> &str {
        &self.cfg.embedding_model
    }

    /// Run a chat completion against `model`.
    ///
    /// Identical prompts within the cache TTL are served from memory
    /// without touching the API.
    #[instrument(skip(self, messages))]
    pub async fn complete(&self, model: &str, messages: &[WireMessage]) -> Result<ChatOutcome> {
        if !self.is_enabled() {
            return Err(LlmError::Disabled);
        }

        let serialized = serde_json::to_string(messages)?;
        let key = cache_key(&[model, &serialized]);
        if let Some(hit) = self.response_cache.get(&key) {
            debug!("chat completion served from cache");
            return Ok(ChatOutcome {
                content: hit.content,
                usage: TokenUsage::default(),
                model: hit.model,
                cached: true,
            });
        }

        let request = ChatCompletionRequest {
            model: model.to_string(),
            messages: messages.to_vec(),
            max_tokens: self.cfg.max_output_tokens,
            temperature: self.cfg.temperature,
        };
        let response = self
            .with_retries("chat completion", || self.send_completion(&request))
            .await?;

        let content = response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .filter(|c| !c.is_empty())
            .ok_or(LlmError::EmptyCompletion)?;
        let usage = TokenUsage {
            input_tokens: response.usage.prompt_tokens,
            output_tokens: response.usage.completion_tokens,
        };

        self.response_cache.insert(
            key,
            CachedCompletion {
                content: content.clone(),
                model: response.model.clone(),
            },
        );

        Ok(ChatOutcome {
            content,
            usage,
            model: response.model,
            cached: false,
        })
    }

    /// Embed a query string.
    ///
    /// Returns the embedding vector and the number of input tokens billed
    /// (zero on cache hit).
    #[instrument(skip(self, text))]
    pub async fn embed(&self, text: &str) -> Result<(Vec<f32>, u64)> {
        if !self.is_enabled() {
            return Err(LlmError::Disabled);
        }

        let key = cache_key(&[&self.cfg.embedding_model, text]);
        if let Some(hit) = self.embedding_cache.get(&key) {
            debug!("embedding served from cache");
            return Ok((hit, 0));
        }

        let request = EmbeddingRequest {
            model: self.cfg.embedding_model.clone(),
            input: text.to_string(),
        };
        let response = self
            .with_retries("embedding", || self.send_embedding(&request))
            .await?;

        let vector = response
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .filter(|v| !v.is_empty())
            .ok_or(LlmError::EmptyCompletion)?;
        self.embedding_cache.insert(key, vector.clone());
        Ok((vector, response.usage.prompt_tokens))
    }

    /// Cache counters for health and analytics reporting.
    #[must_use]
    pub fn cache_stats(&self) -> (CacheStats, CacheStats) {
        (self.response_cache.stats(), self.embedding_cache.stats())
    }

    async fn with_retries<T, F, Fut>(&self, what: &str, mut call: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt: u32 = 0;
        loop {
            match call().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt < self.retry.max_retries => {
                    let delay = e
                        .retry_after_ms()
                        .map_or_else(|| self.retry.delay_for_attempt(attempt), Duration::from_millis);
                    warn!(
                        error = %e,
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        "{what} failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn send_completion(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse> {
        let url = format!(
            "{}/chat/completions",
            self.cfg.base_url.trim_end_matches('/')
        );
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.cfg.api_key)
            .json(request)
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn send_embedding(&self, request: &EmbeddingRequest) -> Result<EmbeddingResponse> {
        let url = format!("{}/embeddings", self.cfg.base_url.trim_end_matches('/'));
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.cfg.api_key)
            .json(request)
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn decode<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }

        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(folio_core::retry::parse_retry_after);
        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ApiErrorBody>(&text)
            .map_or_else(|_| truncate(&text), |body| body.error.message);

        Err(match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => LlmError::Auth { message },
            StatusCode::TOO_MANY_REQUESTS => LlmError::RateLimited {
                retry_after_ms: retry_after
                    .map_or(DEFAULT_RATE_LIMIT_DELAY_MS, |d| d.as_millis() as u64),
                message,
            },
            _ => LlmError::Api {
                status: status.as_u16(),
                message,
                retryable: status.is_server_error(),
            },
        })
    }
}

/// Trim an error body for logging; upstream errors can be pages long.
fn truncate(text: &str) -> String {
    const MAX: usize = 300;
    if text.len() <= MAX {
        text.to_string()
    } else {
        let mut end = MAX;
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &text[..end])
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
