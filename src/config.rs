// file: src/config.rs
// description: application configuration management with toml support
// reference: https://docs.rs/config

use crate::error::{ChatError, Result};
use crate::utils::Validator;
use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";
pub const ENV_PREFIX: &str = "DOC_CHAT";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub documents: DocumentsConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub network: NetworkConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DocumentsConfig {
    pub input_dir: PathBuf,
    pub recursive: bool,
    pub skip_patterns: Vec<String>,
    pub max_file_size_mb: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiMode {
    /// `POST {api_base}/chat/completions` with role-tagged messages
    Chat,
    /// `POST {api_base}/completions` with a single prompt string
    Completion,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LlmConfig {
    pub api_base: String,
    pub api_key: Option<String>,
    pub model: String,
    pub api_mode: ApiMode,
    pub max_tokens: u32,
    pub temperature: f32,
    pub system_prompt: String,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    Remote,
    Hashing,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub provider: EmbeddingProvider,
    /// Falls back to `llm.api_base` when unset.
    pub api_base: Option<String>,
    /// Falls back to `llm.api_key` when unset.
    pub api_key: Option<String>,
    pub model: String,
    pub batch_size: usize,
    pub concurrency: usize,
    pub hashing_dimension: usize,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub top_k: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ChatConfig {
    pub greeting: String,
    pub title: String,
    pub input_prompt: String,
    pub loading_message: String,
    pub thinking_message: String,
    pub condense_template: Option<String>,
    pub context_template: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub http_proxy: Option<String>,
    pub https_proxy: Option<String>,
    pub no_proxy: Option<String>,
}

impl Default for DocumentsConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("./chatdata"),
            recursive: true,
            skip_patterns: vec![
                ".git/".to_string(),
                "*.zip".to_string(),
                "*.png".to_string(),
                "*.jpg".to_string(),
            ],
            max_file_size_mb: 10,
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.openai.com/v1".to_string(),
            api_key: None,
            model: "gpt-4o-mini".to_string(),
            api_mode: ApiMode::Chat,
            max_tokens: 256,
            temperature: 0.8,
            system_prompt: "You are an expert on the documents in this collection. Keep the \
                            conversation focused on their subject. Your answers must match the \
                            facts in the available documents - do not hallucinate facts."
                .to_string(),
            request_timeout_secs: 120,
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingProvider::Remote,
            api_base: None,
            api_key: None,
            model: "BAAI/bge-small-en-v1.5".to_string(),
            batch_size: 32,
            concurrency: 4,
            hashing_dimension: 384,
            request_timeout_secs: 60,
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1024,
            chunk_overlap: 200,
            top_k: 2,
        }
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            greeting: "I answer questions about the documents in this collection. What would you \
                       like to know?"
                .to_string(),
            title: "Questions about your documents".to_string(),
            input_prompt: "Your question: ".to_string(),
            loading_message: "Reading the documents. One moment...".to_string(),
            thinking_message: "Thinking...".to_string(),
            condense_template: None,
            context_template: None,
        }
    }
}

impl EmbeddingConfig {
    pub fn resolved_api_base<'a>(&'a self, llm: &'a LlmConfig) -> &'a str {
        self.api_base.as_deref().unwrap_or(llm.api_base.as_str())
    }

    pub fn resolved_api_key<'a>(&'a self, llm: &'a LlmConfig) -> Option<&'a str> {
        self.api_key.as_deref().or(llm.api_key.as_deref())
    }
}

impl Config {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenv().ok();

        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        } else {
            builder = builder
                .add_source(config::File::from(Path::new(DEFAULT_CONFIG_PATH)).required(false));
        }

        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .map_err(|e| ChatError::Config(e.to_string()))?;

        let config: Config = settings
            .try_deserialize()
            .map_err(|e| ChatError::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    pub fn default_config() -> Self {
        Self::default()
    }

    pub fn validate(&self) -> Result<()> {
        if self.retrieval.top_k == 0 {
            return Err(ChatError::Config(
                "retrieval.top_k must be greater than 0".to_string(),
            ));
        }

        if self.retrieval.chunk_size == 0 {
            return Err(ChatError::Config(
                "retrieval.chunk_size must be greater than 0".to_string(),
            ));
        }

        if self.retrieval.chunk_overlap >= self.retrieval.chunk_size {
            return Err(ChatError::Config(
                "retrieval.chunk_overlap must be smaller than retrieval.chunk_size".to_string(),
            ));
        }

        if self.embedding.concurrency == 0 {
            return Err(ChatError::Config(
                "embedding.concurrency must be greater than 0".to_string(),
            ));
        }

        if self.embedding.provider == EmbeddingProvider::Hashing
            && self.embedding.hashing_dimension == 0
        {
            return Err(ChatError::Config(
                "embedding.hashing_dimension must be greater than 0".to_string(),
            ));
        }

        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(ChatError::Config(format!(
                "llm.temperature must be within [0, 2], got {}",
                self.llm.temperature
            )));
        }

        if self.llm.max_tokens == 0 {
            return Err(ChatError::Config(
                "llm.max_tokens must be greater than 0".to_string(),
            ));
        }

        if self.llm.request_timeout_secs == 0 || self.embedding.request_timeout_secs == 0 {
            return Err(ChatError::Config(
                "request_timeout_secs must be greater than 0".to_string(),
            ));
        }

        Validator::validate_batch_size(self.embedding.batch_size)?;
        Validator::validate_url(&self.llm.api_base)?;

        if let Some(base) = &self.embedding.api_base {
            Validator::validate_url(base)?;
        }

        for proxy in [&self.network.http_proxy, &self.network.https_proxy]
            .into_iter()
            .flatten()
        {
            Validator::validate_url(proxy)?;
        }

        Ok(())
    }

    /// Checks the settings only needed once the remote model is actually called.
    pub fn validate_for_generation(&self) -> Result<()> {
        match self.llm.api_key.as_deref() {
            Some(key) if !key.trim().is_empty() => Ok(()),
            _ => Err(ChatError::Config(format!(
                "llm.api_key is required (set {}__LLM__API_KEY or add it to the config file)",
                ENV_PREFIX
            ))),
        }
    }
}
