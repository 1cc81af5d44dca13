// file: src/index/embeddings.rs
// description: embedding backends: OpenAI-compatible HTTP endpoint and an offline hashing embedder
// reference: https://platform.openai.com/docs/api-reference/embeddings

use crate::config::{Config, EmbeddingProvider};
use crate::error::{ChatError, Result};
use crate::network::build_http_client;
use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

lazy_static! {
    static ref TOKEN: Regex = Regex::new(r"[\p{L}\p{N}]+").expect("TOKEN regex is valid");
}

/// Text to vector. Identical input and model must give identical vectors.
#[async_trait]
pub trait EmbeddingBackend: Send + Sync {
    fn model_name(&self) -> &str;

    /// One vector per input text, in input order.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        self.embed(&[text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ChatError::Embedding("No embedding returned for query".to_string()))
    }
}

pub fn embedding_backend_from_config(config: &Config) -> Result<Arc<dyn EmbeddingBackend>> {
    match config.embedding.provider {
        EmbeddingProvider::Remote => {
            let client = build_http_client(
                &config.network,
                Duration::from_secs(config.embedding.request_timeout_secs),
            )?;
            Ok(Arc::new(OpenAiEmbeddingClient::new(
                client,
                config.embedding.resolved_api_base(&config.llm).to_string(),
                config
                    .embedding
                    .resolved_api_key(&config.llm)
                    .map(str::to_string),
                config.embedding.model.clone(),
            )))
        }
        EmbeddingProvider::Hashing => Ok(Arc::new(HashingEmbedder::new(
            config.embedding.hashing_dimension,
        ))),
    }
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    input: &'a [String],
    model: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    #[serde(default)]
    index: usize,
    embedding: Vec<f32>,
}

pub struct OpenAiEmbeddingClient {
    client: Client,
    api_base: String,
    api_key: Option<String>,
    model: String,
}

impl OpenAiEmbeddingClient {
    pub fn new(client: Client, api_base: String, api_key: Option<String>, model: String) -> Self {
        Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            api_key,
            model,
        }
    }

    pub fn endpoint(&self) -> String {
        format!("{}/embeddings", self.api_base)
    }
}

#[async_trait]
impl EmbeddingBackend for OpenAiEmbeddingClient {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let request = EmbeddingRequest {
            input: texts,
            model: &self.model,
        };

        debug!(
            "Requesting {} embeddings from {} ({})",
            texts.len(),
            self.api_base,
            self.model
        );

        let mut builder = self
            .client
            .post(self.endpoint())
            .header("Content-Type", "application/json")
            .json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                ChatError::Embedding(format!(
                    "Embedding endpoint did not answer in time: {}",
                    e
                ))
            } else {
                ChatError::Embedding(format!("Failed to reach embedding endpoint: {}", e))
            }
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ChatError::Embedding(format!(
                "Embedding request failed with status {}: {}",
                status, error_text
            )));
        }

        let parsed: EmbeddingResponse = response.json().await.map_err(|e| {
            ChatError::Embedding(format!("Failed to parse embedding response: {}", e))
        })?;

        order_embeddings(parsed.data, texts.len())
    }
}

fn order_embeddings(mut data: Vec<EmbeddingData>, expected: usize) -> Result<Vec<Vec<f32>>> {
    if data.len() != expected {
        return Err(ChatError::Embedding(format!(
            "Expected {} embeddings, received {}",
            expected,
            data.len()
        )));
    }

    data.sort_by_key(|d| d.index);
    Ok(data.into_iter().map(|d| d.embedding).collect())
}

/// Offline embedder: signed feature hashing of lowercase word tokens,
/// L2-normalized. Shared vocabulary gives high cosine similarity.
pub struct HashingEmbedder {
    dimension: usize,
    model: String,
}

impl HashingEmbedder {
    pub fn new(dimension: usize) -> Self {
        let dimension = dimension.max(1);
        Self {
            dimension,
            model: format!("hashing-{}", dimension),
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimension];

        for token in TOKEN.find_iter(&text.to_lowercase()) {
            let digest = Sha256::digest(token.as_str().as_bytes());
            let mut bucket_bytes = [0u8; 8];
            bucket_bytes.copy_from_slice(&digest[..8]);
            let bucket = (u64::from_le_bytes(bucket_bytes) % self.dimension as u64) as usize;
            let sign = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|v| *v /= norm);
        }
        vector
    }
}

#[async_trait]
impl EmbeddingBackend for HashingEmbedder {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_text(t)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::vector_index::cosine_similarity;

    #[test]
    fn test_hashing_embedding_deterministic() {
        let embedder = HashingEmbedder::new(128);
        let emb1 = embedder.embed_text("same text");
        let emb2 = embedder.embed_text("same text");
        assert_eq!(emb1.len(), 128);
        assert_eq!(emb1, emb2);
    }

    #[test]
    fn test_hashing_embedding_is_normalized() {
        let embedder = HashingEmbedder::new(64);
        let norm: f32 = embedder
            .embed_text("Tuition is free.")
            .iter()
            .map(|v| v * v)
            .sum::<f32>()
            .sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
        assert!(embedder.embed_text("   ").iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_hashing_embedding_similarity() {
        let embedder = HashingEmbedder::new(384);
        let question = embedder.embed_text("Is tuition free?");
        let relevant = embedder.embed_text("Tuition is free.");
        let unrelated = embedder.embed_text("The library opens at nine on weekdays.");

        assert!(
            cosine_similarity(&question, &relevant) > cosine_similarity(&question, &unrelated)
        );
    }

    #[tokio::test]
    async fn test_embed_query_uses_backend() {
        let embedder = HashingEmbedder::new(32);
        let vector = embedder.embed_query("hello world").await.unwrap();
        assert_eq!(vector, embedder.embed_text("hello world"));
        assert_eq!(embedder.model_name(), "hashing-32");
    }

    #[test]
    fn test_hashing_embed_batch_keeps_order() {
        let embedder = HashingEmbedder::new(16);
        let texts = vec!["first".to_string(), "second".to_string()];
        let vectors = tokio_test::block_on(embedder.embed(&texts)).unwrap();
        assert_eq!(vectors.len(), 2);
        assert_eq!(vectors[1], embedder.embed_text("second"));
    }

    #[test]
    fn test_order_embeddings_sorts_by_index() {
        let data = vec![
            EmbeddingData {
                index: 1,
                embedding: vec![2.0],
            },
            EmbeddingData {
                index: 0,
                embedding: vec![1.0],
            },
        ];
        assert_eq!(order_embeddings(data, 2).unwrap(), vec![vec![1.0], vec![2.0]]);
    }

    #[test]
    fn test_order_embeddings_count_mismatch() {
        let result = order_embeddings(vec![], 3);
        assert!(matches!(result, Err(ChatError::Embedding(_))));
    }

    #[test]
    fn test_response_parsing() {
        let json = r#"{"object":"list","data":[{"object":"embedding","index":0,"embedding":[0.1,0.2]}],"model":"bge"}"#;
        let parsed: EmbeddingResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.data[0].embedding, vec![0.1, 0.2]);
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_embedding_error() {
        let client = OpenAiEmbeddingClient::new(
            Client::builder()
                .timeout(Duration::from_millis(500))
                .build()
                .unwrap(),
            "http://127.0.0.1:9/v1/".to_string(),
            None,
            "bge".to_string(),
        );
        assert_eq!(client.endpoint(), "http://127.0.0.1:9/v1/embeddings");

        let result = client.embed(&["text".to_string()]).await;
        assert!(matches!(result, Err(ChatError::Embedding(_))));
    }

    #[tokio::test]
    async fn test_silent_endpoint_times_out_as_embedding_error() {
        let base = crate::network::silent_endpoint().await;
        let client = OpenAiEmbeddingClient::new(
            Client::builder()
                .timeout(Duration::from_millis(200))
                .build()
                .unwrap(),
            base,
            None,
            "bge".to_string(),
        );

        match client.embed(&["text".to_string()]).await {
            Err(ChatError::Embedding(message)) => {
                assert!(message.contains("did not answer in time"), "{}", message)
            }
            other => panic!("expected an embedding timeout, got {:?}", other),
        }
    }
}
