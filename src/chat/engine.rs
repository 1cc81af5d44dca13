// file: src/chat/engine.rs
// description: condense-question retrieval-augmented chat engine shared by all sessions
// reference: internal module structure

use crate::error::{ChatError, Result};
use crate::index::{EmbeddingBackend, VectorIndex};
use crate::llm::{ChatMessage, LanguageModel, PromptTemplates};
use crate::models::{RetrievedChunk, Turn};
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct ChatResponse {
    pub answer: String,
    pub standalone_question: String,
    pub sources: Vec<RetrievedChunk>,
}

/// Stateless per turn: the conversation history is passed in by the session.
pub struct ChatEngine {
    index: Arc<VectorIndex>,
    embedder: Arc<dyn EmbeddingBackend>,
    llm: Arc<dyn LanguageModel>,
    prompts: PromptTemplates,
    top_k: usize,
}

impl ChatEngine {
    pub fn new(
        index: Arc<VectorIndex>,
        embedder: Arc<dyn EmbeddingBackend>,
        llm: Arc<dyn LanguageModel>,
        prompts: PromptTemplates,
        top_k: usize,
    ) -> Result<Self> {
        if index.embedding_model() != embedder.model_name() {
            return Err(ChatError::Config(format!(
                "Index was built with {} but queries would use {}",
                index.embedding_model(),
                embedder.model_name()
            )));
        }

        if top_k == 0 {
            return Err(ChatError::Config(
                "top_k must be greater than 0".to_string(),
            ));
        }

        Ok(Self {
            index,
            embedder,
            llm,
            prompts,
            top_k,
        })
    }

    pub fn index(&self) -> &Arc<VectorIndex> {
        &self.index
    }

    pub fn model_name(&self) -> &str {
        self.llm.model_name()
    }

    /// Rewrites a follow-up into a standalone question. Without history the
    /// question is returned unchanged and the model is not called.
    pub async fn condense_question(
        &self,
        history: &[(&Turn, &Turn)],
        question: &str,
    ) -> Result<String> {
        if history.is_empty() {
            return Ok(question.to_string());
        }

        let prompt = self.prompts.condense_prompt(history, question);
        let condensed = self.llm.complete(&[ChatMessage::user(prompt)]).await?;
        let condensed = condensed.trim();

        if condensed.is_empty() {
            warn!("Model returned an empty standalone question; using the original");
            return Ok(question.to_string());
        }

        info!("Condensed question: {}", condensed);
        Ok(condensed.to_string())
    }

    pub async fn retrieve(&self, question: &str) -> Result<Vec<RetrievedChunk>> {
        if self.index.is_empty() {
            return Ok(Vec::new());
        }

        let query = self.embedder.embed_query(question).await?;
        let hits = self.index.search(&query, self.top_k)?;
        debug!(
            "Retrieved {} chunks: {:?}",
            hits.len(),
            hits.iter().map(|h| h.chunk.id.as_str()).collect::<Vec<_>>()
        );
        Ok(hits)
    }

    /// One turn: condense, retrieve, compose, generate. Every failure is
    /// reported as a generation error so the session can carry on.
    pub async fn chat(&self, history: &[(&Turn, &Turn)], question: &str) -> Result<ChatResponse> {
        let standalone_question = self
            .condense_question(history, question)
            .await
            .map_err(into_generation)?;

        let sources = self
            .retrieve(&standalone_question)
            .await
            .map_err(into_generation)?;

        let prompt = self.prompts.context_prompt(&sources, &standalone_question);
        let answer = self
            .llm
            .complete(&[ChatMessage::user(prompt)])
            .await
            .map_err(into_generation)?;

        Ok(ChatResponse {
            answer,
            standalone_question,
            sources,
        })
    }
}

fn into_generation(err: ChatError) -> ChatError {
    match err {
        ChatError::Generation(_) => err,
        other => ChatError::Generation(other.to_string()),
    }
}
