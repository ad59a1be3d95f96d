//! Retrieval-augmented chat.
//!
//! A chat turn searches the stored chunks, renders the best ones into a
//! context block, asks the configured LLM, scores the answer and records the
//! turn in the session history.

pub mod modes;

pub use modes::ChatMode;

use crate::db::TursoClient;
use crate::documents::{preview, DocumentService};
use crate::llm::LLMClientFactoryTrait;
use crate::types::{
    ChatResponse, ChatSource, ConversationRecord, Result, SearchHit, SourceRef,
};
use chrono::Utc;
use kassist_retrieval::confidence_score;
use std::collections::HashSet;
use std::fmt::Write;
use std::sync::Arc;

pub const LLM_FAILURE_RESPONSE: &str =
    "I apologize, but I'm having trouble generating a response right now. Please try again.";
pub const LLM_FAILURE_REASONING: &str = "Error in AI response generation";

const SOURCE_PREVIEW_CHARS: usize = 200;

const ANSWER_INSTRUCTIONS: &str = "\
Please provide:
1. A thorough answer to the question
2. The reasoning behind your answer
3. References to the specific source documents you used
4. How confident you are in each part of the answer

Keep the tone natural and conversational while staying well sourced.";

/// Retrieved context rendered for the prompt.
#[derive(Debug, Clone, PartialEq)]
pub struct ContextInfo {
    pub text: String,
    pub summary: String,
    pub total_sources: usize,
}

impl ContextInfo {
    pub fn from_hits(hits: &[SearchHit]) -> Self {
        if hits.is_empty() {
            return Self {
                text: "No relevant documents found.".to_string(),
                summary: "No context available".to_string(),
                total_sources: 0,
            };
        }

        let mut text = String::new();
        for hit in hits {
            let _ = write!(
                text,
                "Source: {} (Chunk {})\nRelevance: {:.2}\nContent: {}\n---\n",
                hit.document_name,
                hit.chunk_index + 1,
                hit.similarity_score,
                hit.chunk_content
            );
        }

        let documents: HashSet<&str> = hits.iter().map(|h| h.document_id.as_str()).collect();
        Self {
            text,
            summary: format!(
                "Found {} relevant text segments from {} documents.",
                hits.len(),
                documents.len()
            ),
            total_sources: hits.len(),
        }
    }

    fn reasoning(&self) -> String {
        [
            format!("Based on {} relevant text segments", self.total_sources),
            format!("Context summary: {}", self.summary),
            "Response generated using document context and AI analysis".to_string(),
        ]
        .join(" | ")
    }
}

/// User prompt sent alongside the mode's system prompt.
pub fn build_prompt(context: &ContextInfo, question: &str) -> String {
    format!(
        "CONTEXT FROM DOCUMENTS:\n{}\n\nUSER QUESTION: {}\n\n{}",
        context.text, question, ANSWER_INSTRUCTIONS
    )
}

pub fn format_sources(hits: &[SearchHit]) -> Vec<ChatSource> {
    hits.iter()
        .enumerate()
        .map(|(i, hit)| ChatSource {
            id: i + 1,
            document_name: hit.document_name.clone(),
            document_id: hit.document_id.clone(),
            relevance_score: hit.similarity_score,
            chunk_index: hit.chunk_index,
            content_preview: preview(&hit.chunk_content, SOURCE_PREVIEW_CHARS),
            page_number: hit.page_number,
            is_public: hit.is_public,
        })
        .collect()
}

pub struct ChatService {
    db: Arc<TursoClient>,
    documents: Arc<DocumentService>,
    llm: Arc<dyn LLMClientFactoryTrait>,
}

impl ChatService {
    pub fn new(
        db: Arc<TursoClient>,
        documents: Arc<DocumentService>,
        llm: Arc<dyn LLMClientFactoryTrait>,
    ) -> Self {
        Self { db, documents, llm }
    }

    /// Answer `message` from the documents. A missing `session_id` starts a
    /// new session.
    pub async fn chat(
        &self,
        message: &str,
        session_id: Option<String>,
        mode: ChatMode,
        max_sources: usize,
    ) -> Result<ChatResponse> {
        let session_id = session_id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        let hits = self.documents.search(message, max_sources, true).await?;
        let context = ContextInfo::from_hits(&hits);

        let (response, reasoning) = match self.generate(mode, &context, message).await {
            Ok(text) => (text, context.reasoning()),
            Err(e) => {
                tracing::error!(session_id = %session_id, mode = %mode, error = %e, "LLM generation failed");
                (
                    LLM_FAILURE_RESPONSE.to_string(),
                    LLM_FAILURE_REASONING.to_string(),
                )
            }
        };

        let similarities: Vec<f32> = hits.iter().map(|h| h.similarity_score).collect();
        let confidence = confidence_score(&similarities);
        let timestamp = Utc::now();

        let record = ConversationRecord {
            id: uuid::Uuid::new_v4().to_string(),
            session_id: session_id.clone(),
            user_message: message.to_string(),
            ai_response: response.clone(),
            mode: mode.to_string(),
            sources_used: hits.iter().map(SourceRef::from).collect(),
            confidence_score: confidence,
            created_at: timestamp,
        };
        if let Err(e) = self.db.save_conversation(&record).await {
            tracing::warn!(session_id = %session_id, error = %e, "Failed to save conversation");
        }

        tracing::info!(
            session_id = %session_id,
            mode = %mode,
            sources = hits.len(),
            confidence,
            "Chat answered"
        );

        Ok(ChatResponse {
            conversation_id: record.id,
            response,
            reasoning,
            sources: format_sources(&hits),
            confidence_score: confidence,
            context_summary: context.summary,
            mode: mode.to_string(),
            timestamp,
            session_id,
        })
    }

    async fn generate(&self, mode: ChatMode, context: &ContextInfo, message: &str) -> Result<String> {
        let client = self.llm.create_default().await?;
        client
            .generate_with_system(mode.system_prompt(), &build_prompt(context, message))
            .await
    }

    /// Newest first.
    pub async fn history(&self, session_id: &str, limit: u32) -> Result<Vec<ConversationRecord>> {
        self.db.conversation_history(session_id, limit).await
    }

    /// Returns the number of deleted turns.
    pub async fn clear_history(&self, session_id: &str) -> Result<u64> {
        let deleted = self.db.delete_conversation_history(session_id).await?;
        tracing::info!(session_id = %session_id, deleted, "Chat history cleared");
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(doc: &str, name: &str, index: usize, score: f32, content: &str) -> SearchHit {
        SearchHit {
            document_id: doc.to_string(),
            document_name: name.to_string(),
            chunk_content: content.to_string(),
            similarity_score: score,
            chunk_index: index,
            start_char: 0,
            end_char: content.chars().count(),
            page_number: None,
            is_public: false,
        }
    }

    #[test]
    fn test_empty_context() {
        let context = ContextInfo::from_hits(&[]);
        assert_eq!(context.text, "No relevant documents found.");
        assert_eq!(context.summary, "No context available");
        assert_eq!(context.total_sources, 0);
    }

    #[test]
    fn test_context_format_and_summary() {
        let hits = vec![
            hit("d1", "a.txt", 0, 0.912, "alpha"),
            hit("d1", "a.txt", 3, 0.5, "beta"),
            hit("d2", "b.pdf", 1, 0.25, "gamma"),
        ];
        let context = ContextInfo::from_hits(&hits);

        assert!(context
            .text
            .starts_with("Source: a.txt (Chunk 1)\nRelevance: 0.91\nContent: alpha\n---\n"));
        assert!(context.text.contains("Source: a.txt (Chunk 4)"));
        assert_eq!(
            context.summary,
            "Found 3 relevant text segments from 2 documents."
        );
        assert_eq!(
            context.reasoning(),
            "Based on 3 relevant text segments | Context summary: Found 3 relevant text segments from 2 documents. | Response generated using document context and AI analysis"
        );
    }

    #[test]
    fn test_prompt_contains_context_and_question() {
        let context = ContextInfo::from_hits(&[hit("d", "n", 0, 0.8, "the sky is blue")]);
        let prompt = build_prompt(&context, "What colour is the sky?");

        assert!(prompt.starts_with("CONTEXT FROM DOCUMENTS:\n"));
        assert!(prompt.contains("the sky is blue"));
        assert!(prompt.contains("USER QUESTION: What colour is the sky?"));
    }

    #[test]
    fn test_format_sources_numbers_from_one_and_previews() {
        let long = "x".repeat(250);
        let sources = format_sources(&[hit("d", "n", 2, 0.7, &long), hit("e", "m", 0, 0.6, "short")]);

        assert_eq!(sources[0].id, 1);
        assert_eq!(sources[1].id, 2);
        assert_eq!(sources[0].content_preview.chars().count(), 203);
        assert!(sources[0].content_preview.ends_with("..."));
        assert_eq!(sources[1].content_preview, "short");
    }
}
