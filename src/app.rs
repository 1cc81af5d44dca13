// file: src/app.rs
// description: startup wiring: load documents, build the shared index, assemble the chat engine
// reference: application bootstrap and orchestration

use crate::chat::ChatEngine;
use crate::config::Config;
use crate::error::Result;
use crate::index::{EmbeddingBackend, IndexBuilder, VectorIndex, embedding_backend_from_config};
use crate::llm::{LanguageModel, OpenAiLikeClient, PromptTemplates};
use crate::loader::DocumentLoader;
use indicatif::MultiProgress;
use std::sync::Arc;
use tracing::{info, warn};

/// Process-wide, read-only retrieval state created once at startup.
pub struct SharedIndex {
    pub index: Arc<VectorIndex>,
    pub embedder: Arc<dyn EmbeddingBackend>,
}

#[derive(Debug, Clone, Default)]
pub struct StartupOptions {
    pub show_progress: bool,
    pub colored: bool,
    /// Shared with any front-end spinner so bars do not overwrite each other.
    pub multi_progress: Option<MultiProgress>,
}

pub async fn load_index(config: &Config, options: StartupOptions) -> Result<SharedIndex> {
    let loader = DocumentLoader::new(config.documents.clone());
    let documents = loader.load(&config.documents.input_dir)?;
    if documents.is_empty() {
        warn!(
            "No documents found in {}; answers will not be grounded in any source",
            config.documents.input_dir.display()
        );
    }

    let embedder = embedding_backend_from_config(config)?;
    let builder = IndexBuilder::from_config(config, Arc::clone(&embedder))
        .with_progress(options.show_progress, options.colored, options.multi_progress);
    let index = builder.build(documents).await?;
    info!("Index ready: {}", index.stats());

    Ok(SharedIndex { index, embedder })
}

pub fn build_engine(
    config: &Config,
    shared: &SharedIndex,
    llm: Arc<dyn LanguageModel>,
) -> Result<ChatEngine> {
    ChatEngine::new(
        Arc::clone(&shared.index),
        Arc::clone(&shared.embedder),
        llm,
        PromptTemplates::from_config(&config.chat)?,
        config.retrieval.top_k,
    )
}

/// Fails on configuration problems before any document is read.
pub async fn bootstrap(config: &Config, options: StartupOptions) -> Result<Arc<ChatEngine>> {
    config.validate_for_generation()?;
    PromptTemplates::from_config(&config.chat)?;
    let llm: Arc<dyn LanguageModel> = Arc::new(OpenAiLikeClient::from_config(config)?);

    let shared = load_index(config, options).await?;
    Ok(Arc::new(build_engine(config, &shared, llm)?))
}
