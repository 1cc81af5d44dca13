// file: src/lib.rs
// description: library entry point and public api exports
// reference: rust library patterns
#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/readme.md"))]

pub mod app;
pub mod chat;
pub mod config;
pub mod error;
pub mod index;
pub mod llm;
pub mod loader;
pub mod models;
pub mod network;
pub mod parser;
pub mod ui;
pub mod utils;

pub use app::{SharedIndex, StartupOptions, bootstrap, build_engine, load_index};
pub use chat::{ChatEngine, ChatResponse, ChatSession, SessionState, SubmitOutcome};
pub use config::{
    ApiMode, ChatConfig, Config, DocumentsConfig, EmbeddingConfig, EmbeddingProvider, LlmConfig,
    NetworkConfig, RetrievalConfig,
};
pub use error::{ChatError, Result};
pub use index::{
    EmbeddingBackend, HashingEmbedder, IndexBuilder, IndexStats, OpenAiEmbeddingClient,
    TextChunker, VectorIndex,
};
pub use llm::{ChatMessage, LanguageModel, MessageRole, OpenAiLikeClient, PromptTemplates};
pub use loader::{DocumentLoader, FileScanner, ScannedFile};
pub use models::{Chunk, Document, RetrievedChunk, Role, Transcript, Turn};
pub use parser::{MarkdownParser, ParsedMarkdown, TextNormalizer};
pub use ui::TerminalUi;
pub use utils::{OperationTimer, PerformanceMetrics, Validator};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        let config = Config::default_config();
        let _chunker = TextChunker::new(config.retrieval.chunk_size, config.retrieval.chunk_overlap);
        let _transcript = Transcript::with_greeting(&config.chat.greeting);
    }
}
