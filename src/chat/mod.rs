// file: src/chat/mod.rs
// description: chat engine and session module exports
// reference: internal module structure

pub mod engine;
pub mod session;

pub use engine::{ChatEngine, ChatResponse};
pub use session::{ChatSession, SessionState, SubmitOutcome};
