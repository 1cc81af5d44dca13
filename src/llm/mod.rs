// file: src/llm/mod.rs
// description: remote language model module exports
// reference: internal module structure

pub mod client;
pub mod prompt;

pub use client::{ChatMessage, LanguageModel, MessageRole, OpenAiLikeClient};
pub use prompt::{DEFAULT_CONDENSE_TEMPLATE, DEFAULT_CONTEXT_TEMPLATE, PromptTemplates};
