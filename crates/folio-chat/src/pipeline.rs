//! The chat turn pipeline.
//!
//! One `run` call takes a user message through access check, history load,
//! corpus retrieval, model selection, generation, and persistence, and
//! returns both stored messages with a cost snapshot.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use folio_core::chat::{Message, MessageRole, SourceChunk};
use folio_core::ids;
use folio_llm::{ChatClient, CostLedger, CostSnapshot, classify, pricing, select_model};
use folio_retrieval::Retriever;
use folio_settings::LlmSettings;
use folio_store::SessionStore;
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::error::{ChatError, Result};
use crate::prompt;

/// Upper bound on a single user message, in characters.
const MAX_MESSAGE_CHARS: usize = 4_000;

/// The result of one chat turn.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatTurn {
    /// The stored user message.
    pub user_message: Message,
    /// The stored assistant reply.
    pub assistant_message: Message,
    /// Passages the reply could cite.
    pub sources: Vec<SourceChunk>,
    /// Spend state after this turn.
    pub cost: CostSnapshot,
}

/// Runs chat turns against a store, retriever, and LLM client.
pub struct ChatPipeline {
    store: Arc<dyn SessionStore>,
    llm: Arc<ChatClient>,
    retriever: Retriever,
    ledger: Arc<CostLedger>,
    llm_cfg: LlmSettings,
    history_limit: usize,
}

impl ChatPipeline {
    /// Assemble a pipeline from its parts.
    pub fn new(
        store: Arc<dyn SessionStore>,
        llm: Arc<ChatClient>,
        retriever: Retriever,
        ledger: Arc<CostLedger>,
        llm_cfg: LlmSettings,
        history_limit: usize,
    ) -> Self {
        Self {
            store,
            llm,
            retriever,
            ledger,
            llm_cfg,
            history_limit,
        }
    }

    /// Run one chat turn for `caller` against `session_id`.
    ///
    /// `forced_model` bypasses complexity-based selection but not the
    /// budget check.
    #[instrument(skip(self, message, forced_model))]
    pub async fn run(
        &self,
        session_id: &str,
        message: &str,
        caller: Option<&str>,
        forced_model: Option<&str>,
    ) -> Result<ChatTurn> {
        let content = message.trim();
        if content.is_empty() {
            return Err(ChatError::InvalidMessage("message is empty".to_string()));
        }
        if content.chars().count() > MAX_MESSAGE_CHARS {
            return Err(ChatError::InvalidMessage(format!(
                "message exceeds {MAX_MESSAGE_CHARS} characters"
            )));
        }

        let session = self.store.get_session(session_id, caller).await?;
        let history = self
            .store
            .recent_messages(&session.id, self.history_limit)
            .await?;
        let sources = self.retrieve(content).await;

        let assistant_turns = history
            .iter()
            .filter(|m| m.role == MessageRole::Assistant)
            .count();
        let complexity = classify(content, assistant_turns);
        let downshifted = self.ledger.should_downshift();
        let model = match forced_model {
            Some(m) => m,
            None => select_model(
                &self.llm_cfg,
                complexity,
                downshifted,
                self.ledger.daily_headroom(),
            ),
        }
        .to_string();
        info!(
            complexity = complexity.as_str(),
            downshifted, model, "model selected"
        );

        let wire = prompt::build_messages(&sources, &history, content);
        let prompt_chars: usize = wire.iter().map(|m| m.content.len()).sum();
        self.ledger.check_budget(pricing::estimate_cost(
            &model,
            prompt_chars,
            self.llm_cfg.max_output_tokens,
        ))?;
        let started = Instant::now();
        let outcome = self.llm.complete(&model, &wire).await?;
        let elapsed_ms = i64::try_from(started.elapsed().as_millis()).unwrap_or(i64::MAX);

        let cost = outcome.cost_usd();
        self.ledger.record(cost);
        info!(
            cost = %pricing::format_cost(cost),
            cached = outcome.cached,
            "completion finished"
        );

        let user_message = Self::user_message(&session.id, content);
        let assistant_message = Message {
            id: ids::new_message_id(),
            session_id: session.id.clone(),
            role: MessageRole::Assistant,
            content: outcome.content,
            created_at: Utc::now(),
            model: Some(outcome.model),
            input_tokens: Some(as_i64(outcome.usage.input_tokens)),
            output_tokens: Some(as_i64(outcome.usage.output_tokens)),
            cost_usd: Some(cost),
            sources: (!sources.is_empty()).then(|| sources.clone()),
            response_time_ms: Some(elapsed_ms),
        };

        self.persist(&user_message, &assistant_message, caller).await;

        Ok(ChatTurn {
            user_message,
            assistant_message,
            sources,
            cost: self.ledger.snapshot(),
        })
    }

    /// Retrieval is best-effort: an index outage degrades to an
    /// uncited answer instead of failing the turn.
    async fn retrieve(&self, query: &str) -> Vec<SourceChunk> {
        if !self.retriever.is_enabled() {
            return Vec::new();
        }
        match self.retriever.retrieve(query).await {
            Ok(sources) => sources,
            Err(e) => {
                warn!(error = %e, "retrieval failed, answering without sources");
                Vec::new()
            }
        }
    }

    /// Persistence failure after generation must not lose the reply.
    async fn persist(&self, user_message: &Message, assistant_message: &Message, caller: Option<&str>) {
        for message in [user_message, assistant_message] {
            if let Err(e) = self.store.append_message(message).await {
                warn!(error = %e, message_id = %message.id, "failed to persist message");
                return;
            }
        }
        if let Some(user_id) = caller {
            if let Err(e) = self.store.bump_user_stats(user_id, 0, 2).await {
                warn!(error = %e, "failed to bump user message stats");
            }
        }
    }

    fn user_message(session_id: &str, content: &str) -> Message {
        Message {
            id: ids::new_message_id(),
            session_id: session_id.to_string(),
            role: MessageRole::User,
            content: content.to_string(),
            created_at: Utc::now(),
            model: None,
            input_tokens: None,
            output_tokens: None,
            cost_usd: None,
            sources: None,
            response_time_ms: None,
        }
    }
}

fn as_i64(tokens: u64) -> i64 {
    i64::try_from(tokens).unwrap_or(i64::MAX)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use folio_core::chat::SessionKind;
    use folio_retrieval::VectorIndexClient;
    use folio_settings::{RetrySettings, VectorIndexSettings};
    use folio_store::{CreateSessionOptions, MemoryStore, SessionStore, SessionUpdate, StoreError};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn completion_body(content: &str) -> serde_json::Value {
        serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": content}}],
            "usage": {"prompt_tokens": 40, "completion_tokens": 12},
            "model": "gpt-4o-mini"
        })
    }

    async fn mock_llm(content: &str) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion_body(content)))
            .mount(&server)
            .await;
        server
    }

    fn pipeline_with(
        store: Arc<MemoryStore>,
        llm_url: &str,
        ledger: CostLedger,
    ) -> ChatPipeline {
        let cfg = LlmSettings {
            base_url: llm_url.to_string(),
            api_key: "k".to_string(),
            ..LlmSettings::default()
        };
        let llm = Arc::new(ChatClient::new(cfg.clone(), &RetrySettings::default()).unwrap());
        let ledger = Arc::new(ledger);
        let retriever = Retriever::new(
            Arc::clone(&llm),
            VectorIndexClient::new(VectorIndexSettings::default()).unwrap(),
            Arc::clone(&ledger),
            0.25,
        );
        ChatPipeline::new(store, llm, retriever, ledger, cfg, 10)
    }

    async fn open_session(store: &MemoryStore) -> String {
        store
            .create_session(CreateSessionOptions {
                user_id: None,
                title: "test".to_string(),
                kind: SessionKind::General,
            })
            .await
            .unwrap()
            .id
    }

    // ── full turns ──────────────────────────────────────────────────

    #[tokio::test]
    async fn turn_persists_both_messages() {
        let server = mock_llm("the answer").await;
        let store = Arc::new(MemoryStore::new());
        let pipeline =
            pipeline_with(Arc::clone(&store), &server.uri(), CostLedger::new(5.0, 100.0, 0.8));
        let session_id = open_session(&store).await;

        let turn = pipeline.run(&session_id, "a question", None, None).await.unwrap();
        assert_eq!(turn.user_message.content, "a question");
        assert_eq!(turn.assistant_message.content, "the answer");
        assert_eq!(turn.assistant_message.model.as_deref(), Some("gpt-4o-mini"));
        assert!(turn.assistant_message.cost_usd.unwrap() > 0.0);
        assert!(turn.sources.is_empty());

        let stored = store.list_messages(&session_id, None, Some(100)).await.unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].role, MessageRole::User);
        assert_eq!(stored[1].role, MessageRole::Assistant);
    }

    #[tokio::test]
    async fn turn_records_spend_in_ledger() {
        let server = mock_llm("reply").await;
        let store = Arc::new(MemoryStore::new());
        let pipeline =
            pipeline_with(Arc::clone(&store), &server.uri(), CostLedger::new(5.0, 100.0, 0.8));
        let session_id = open_session(&store).await;

        let turn = pipeline.run(&session_id, "question", None, None).await.unwrap();
        assert!(turn.cost.daily_spent_usd > 0.0);
    }

    // ── failure paths ───────────────────────────────────────────────

    #[tokio::test]
    async fn unknown_session_is_not_found() {
        let server = mock_llm("reply").await;
        let store = Arc::new(MemoryStore::new());
        let pipeline = pipeline_with(store, &server.uri(), CostLedger::new(5.0, 100.0, 0.8));

        let err = pipeline.run("sess_missing", "question", None, None).await.unwrap_err();
        assert!(matches!(
            err,
            ChatError::Store(StoreError::SessionNotFound(_))
        ));
    }

    #[tokio::test]
    async fn foreign_session_is_forbidden() {
        let server = mock_llm("reply").await;
        let store = Arc::new(MemoryStore::new());
        let pipeline =
            pipeline_with(Arc::clone(&store), &server.uri(), CostLedger::new(5.0, 100.0, 0.8));
        let session = store
            .create_session(CreateSessionOptions {
                user_id: Some("owner".to_string()),
                title: "private".to_string(),
                kind: SessionKind::General,
            })
            .await
            .unwrap();

        let err = pipeline
            .run(&session.id, "question", Some("intruder"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::Store(StoreError::Forbidden(_))));
    }

    #[tokio::test]
    async fn exhausted_budget_refuses_turn() {
        let server = mock_llm("reply").await;
        let store = Arc::new(MemoryStore::new());
        let pipeline =
            pipeline_with(Arc::clone(&store), &server.uri(), CostLedger::new(0.0, 0.0, 0.8));
        let session_id = open_session(&store).await;

        let err = pipeline.run(&session_id, "question", None, None).await.unwrap_err();
        assert!(matches!(
            err,
            ChatError::Llm(folio_llm::LlmError::BudgetExhausted { .. })
        ));
    }

    #[tokio::test]
    async fn estimated_cost_is_refused_before_provider_call() {
        // No mounted routes: any provider call would 404, not BudgetExhausted.
        let server = MockServer::start().await;
        let store = Arc::new(MemoryStore::new());
        let pipeline = pipeline_with(
            Arc::clone(&store),
            &server.uri(),
            CostLedger::new(0.0001, 100.0, 0.8),
        );
        let session_id = open_session(&store).await;

        let err = pipeline.run(&session_id, "question", None, None).await.unwrap_err();
        assert!(matches!(
            err,
            ChatError::Llm(folio_llm::LlmError::BudgetExhausted { .. })
        ));
    }

    #[tokio::test]
    async fn empty_message_is_rejected() {
        let server = mock_llm("reply").await;
        let store = Arc::new(MemoryStore::new());
        let pipeline =
            pipeline_with(Arc::clone(&store), &server.uri(), CostLedger::new(5.0, 100.0, 0.8));
        let session_id = open_session(&store).await;

        let err = pipeline.run(&session_id, "   ", None, None).await.unwrap_err();
        assert!(matches!(err, ChatError::InvalidMessage(_)));
    }

    #[tokio::test]
    async fn persistence_failure_still_returns_reply() {
        let server = mock_llm("still here").await;
        let store = Arc::new(MemoryStore::new());
        let pipeline =
            pipeline_with(Arc::clone(&store), &server.uri(), CostLedger::new(5.0, 100.0, 0.8));
        let session_id = open_session(&store).await;
        store
            .update_session(
                &session_id,
                None,
                SessionUpdate {
                    is_active: Some(false),
                    ..SessionUpdate::default()
                },
            )
            .await
            .unwrap();

        let turn = pipeline.run(&session_id, "question", None, None).await.unwrap();
        assert_eq!(turn.assistant_message.content, "still here");
        let stored = store.list_messages(&session_id, None, Some(100)).await.unwrap();
        assert!(stored.is_empty());
    }
}
