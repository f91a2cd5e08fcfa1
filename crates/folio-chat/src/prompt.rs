//! Prompt assembly for grounded chat turns.
//!
//! The system message carries the archivist persona, the citation rules,
//! and the retrieved passages numbered for reference. Conversation history
//! follows in order, then the new user message.

use std::fmt::Write as _;

use folio_core::chat::{Message, MessageRole, SourceChunk};
use folio_llm::WireMessage;

/// Persona and ground rules for every turn.
const PERSONA: &str = "You are a knowledgeable archivist assisting readers with a curated \
document corpus. Answer from the supplied passages and the conversation so far. \
Be precise and faithful to the texts; when the passages do not cover the \
question, say so plainly rather than speculating.";

/// Citation rules appended when passages are supplied.
const CITATION_RULES: &str = "Cite only the passages supplied below, never outside knowledge. \
When you draw on a passage, cite it inline as (Source: \"<source>\", p. <page>), \
omitting the page when the passage has none.";

/// Build the system message for a turn.
#[must_use]
pub fn system_prompt(sources: &[SourceChunk]) -> String {
    let mut prompt = String::from(PERSONA);

    if sources.is_empty() {
        prompt.push_str(
            "\n\nNo corpus passages were retrieved for this question. \
             Say that the corpus does not cover it if you cannot answer \
             from the conversation alone.",
        );
        return prompt;
    }

    prompt.push_str("\n\n");
    prompt.push_str(CITATION_RULES);
    prompt.push_str("\n\nRetrieved passages:\n");
    for (i, chunk) in sources.iter().enumerate() {
        let _ = write!(prompt, "\n[{}] Source: \"{}\"", i + 1, chunk.source);
        if let Some(volume) = &chunk.volume {
            let _ = write!(prompt, ", vol. {volume}");
        }
        if let Some(page) = chunk.page {
            let _ = write!(prompt, ", p. {page}");
        }
        let _ = write!(prompt, "\n{}\n", chunk.text);
    }
    prompt
}

/// Assemble the full message list for a turn.
#[must_use]
pub fn build_messages(
    sources: &[SourceChunk],
    history: &[Message],
    user_message: &str,
) -> Vec<WireMessage> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(WireMessage::system(system_prompt(sources)));
    for entry in history {
        match entry.role {
            MessageRole::User => messages.push(WireMessage::user(entry.content.clone())),
            MessageRole::Assistant => {
                messages.push(WireMessage::assistant(entry.content.clone()));
            }
            // Stored system messages are operational notes, not prompt material.
            MessageRole::System => {}
        }
    }
    messages.push(WireMessage::user(user_message));
    messages
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use folio_core::ids;

    fn chunk(source: &str, page: Option<i64>) -> SourceChunk {
        SourceChunk {
            chunk_id: "c1".to_string(),
            text: "the passage text".to_string(),
            source: source.to_string(),
            volume: None,
            page,
            score: 0.9,
        }
    }

    fn history_message(role: MessageRole, content: &str) -> Message {
        Message {
            id: ids::new_message_id(),
            session_id: ids::new_session_id(),
            role,
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

    #[test]
    fn system_prompt_numbers_passages() {
        let prompt = system_prompt(&[chunk("Letters", Some(12)), chunk("Diaries", None)]);
        assert!(prompt.contains("[1] Source: \"Letters\", p. 12"));
        assert!(prompt.contains("[2] Source: \"Diaries\"\n"));
        assert!(prompt.contains("the passage text"));
        assert!(prompt.contains("(Source: \"<source>\", p. <page>)"));
    }

    #[test]
    fn empty_retrieval_notes_missing_coverage() {
        let prompt = system_prompt(&[]);
        assert!(prompt.contains("No corpus passages were retrieved"));
        assert!(!prompt.contains("Retrieved passages"));
    }

    #[test]
    fn messages_are_system_history_then_user() {
        let history = vec![
            history_message(MessageRole::User, "earlier question"),
            history_message(MessageRole::Assistant, "earlier answer"),
        ];
        let messages = build_messages(&[], &history, "new question");
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0].role, "system");
        assert_eq!(messages[1].content, "earlier question");
        assert_eq!(messages[2].role, "assistant");
        assert_eq!(messages[3].content, "new question");
    }

    #[test]
    fn stored_system_messages_are_skipped() {
        let history = vec![history_message(MessageRole::System, "session renamed")];
        let messages = build_messages(&[], &history, "question");
        assert_eq!(messages.len(), 2);
    }
}
