// file: src/chat/session.rs
// description: per-user chat session: transcript ownership and the idle/awaiting state machine
// reference: internal module structure

use crate::chat::engine::{ChatEngine, ChatResponse};
use crate::error::Result;
use crate::models::{RetrievedChunk, Role, Transcript};
use crate::utils::OperationTimer;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    AwaitingResponse,
}

#[derive(Debug, Clone)]
pub enum SubmitOutcome {
    /// Empty input: nothing appended, no model call.
    Ignored,
    Answered(ChatResponse),
}

pub struct ChatSession {
    id: Uuid,
    engine: Arc<ChatEngine>,
    transcript: Transcript,
    state: SessionState,
    last_sources: Vec<RetrievedChunk>,
}

impl ChatSession {
    /// The greeting becomes the first assistant turn without calling the model.
    pub fn new(engine: Arc<ChatEngine>, greeting: &str) -> Self {
        let id = Uuid::new_v4();
        debug!("Created chat session {}", id);
        Self {
            id,
            engine,
            transcript: Transcript::with_greeting(greeting),
            state: SessionState::Idle,
            last_sources: Vec::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn last_sources(&self) -> &[RetrievedChunk] {
        &self.last_sources
    }

    /// Processes one user message to completion.
    ///
    /// On error the user turn stays in the transcript without an answer and
    /// the session is back to idle, ready for the next message.
    pub async fn submit(&mut self, input: &str) -> Result<SubmitOutcome> {
        let question = input.trim();
        if question.is_empty() {
            debug!("Ignoring empty input in session {}", self.id);
            return Ok(SubmitOutcome::Ignored);
        }

        self.transcript.append(Role::User, question);
        self.state = SessionState::AwaitingResponse;

        let timer = OperationTimer::new("chat_turn");
        let result = {
            let history = self.transcript.exchanges();
            self.engine.chat(&history, question).await
        };
        timer.warn_if_slow(Duration::from_secs(30), "chat turn");
        self.state = SessionState::Idle;

        match result {
            Ok(response) => {
                timer.finish();
                self.transcript
                    .append(Role::Assistant, response.answer.clone());
                self.last_sources = response.sources.clone();
                Ok(SubmitOutcome::Answered(response))
            }
            Err(err) => {
                warn!("Turn failed in session {}: {}", self.id, err);
                self.last_sources.clear();
                Err(err)
            }
        }
    }
}
