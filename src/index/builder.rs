// file: src/index/builder.rs
// description: builds the vector index once per document set and memoizes it for the process
// reference: internal module structure

use crate::config::Config;
use crate::error::{ChatError, Result};
use crate::index::chunker::TextChunker;
use crate::index::embeddings::EmbeddingBackend;
use crate::index::progress::IndexProgress;
use crate::index::vector_index::{IndexEntry, VectorIndex};
use crate::models::{Chunk, Document};
use crate::utils::OperationTimer;
use futures::stream::{self, StreamExt, TryStreamExt};
use indicatif::MultiProgress;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

pub struct IndexBuilder {
    embedder: Arc<dyn EmbeddingBackend>,
    chunker: TextChunker,
    batch_size: usize,
    concurrency: usize,
    show_progress: bool,
    colored: bool,
    multi_progress: Option<MultiProgress>,
    cache: Mutex<Option<Arc<VectorIndex>>>,
}

impl IndexBuilder {
    pub fn new(embedder: Arc<dyn EmbeddingBackend>, chunker: TextChunker) -> Self {
        Self {
            embedder,
            chunker,
            batch_size: 32,
            concurrency: 1,
            show_progress: false,
            colored: false,
            multi_progress: None,
            cache: Mutex::new(None),
        }
    }

    pub fn from_config(config: &Config, embedder: Arc<dyn EmbeddingBackend>) -> Self {
        Self::new(
            embedder,
            TextChunker::new(config.retrieval.chunk_size, config.retrieval.chunk_overlap),
        )
        .with_batching(config.embedding.batch_size, config.embedding.concurrency)
    }

    pub fn with_batching(mut self, batch_size: usize, concurrency: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_progress(
        mut self,
        show_progress: bool,
        colored: bool,
        multi_progress: Option<MultiProgress>,
    ) -> Self {
        self.show_progress = show_progress;
        self.colored = colored;
        self.multi_progress = multi_progress;
        self
    }

    /// Returns the cached index when the document set and embedding model are
    /// unchanged; the embedding backend is only called on a cache miss.
    pub async fn build(&self, documents: Vec<Document>) -> Result<Arc<VectorIndex>> {
        let fingerprint = Self::fingerprint(self.embedder.model_name(), &documents);
        let mut cache = self.cache.lock().await;

        if let Some(index) = cache.as_ref()
            && index.fingerprint() == fingerprint
        {
            info!("Reusing cached index ({} chunks)", index.len());
            return Ok(Arc::clone(index));
        }

        let index = Arc::new(self.build_uncached(documents, fingerprint).await?);
        *cache = Some(Arc::clone(&index));
        Ok(index)
    }

    pub async fn cached(&self) -> Option<Arc<VectorIndex>> {
        self.cache.lock().await.clone()
    }

    async fn build_uncached(
        &self,
        documents: Vec<Document>,
        fingerprint: String,
    ) -> Result<VectorIndex> {
        let timer = OperationTimer::new("build_index");
        let document_count = documents.len();

        let chunks: Vec<Chunk> = documents
            .iter()
            .flat_map(|doc| self.chunker.chunk_document(doc))
            .collect();
        drop(documents);

        if chunks.is_empty() {
            warn!(
                "No text to index ({} documents); retrieval will return nothing",
                document_count
            );
            timer.finish();
            return Ok(VectorIndex::empty(
                self.embedder.model_name(),
                fingerprint,
                document_count,
            ));
        }

        info!(
            "Embedding {} chunks from {} documents with {}",
            chunks.len(),
            document_count,
            self.embedder.model_name()
        );

        let vectors = self.embed_chunks(&chunks).await?;
        timer.checkpoint("embeddings received");

        let entries: Vec<IndexEntry> = chunks
            .into_iter()
            .zip(vectors)
            .map(|(chunk, vector)| IndexEntry { chunk, vector })
            .collect();

        let index = VectorIndex::from_entries(
            entries,
            self.embedder.model_name(),
            fingerprint,
            document_count,
        )?;
        timer.finish_with_count(index.len());
        Ok(index)
    }

    async fn embed_chunks(&self, chunks: &[Chunk]) -> Result<Vec<Vec<f32>>> {
        let progress = IndexProgress::new(
            chunks.len(),
            self.show_progress,
            self.colored,
            self.multi_progress.as_ref(),
        );
        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let embedder = &self.embedder;
        let progress_ref = &progress;

        let batches: Vec<Vec<Vec<f32>>> = stream::iter(texts.chunks(self.batch_size))
            .map(|batch| async move {
                let vectors = embedder.embed(batch).await?;
                if vectors.len() != batch.len() {
                    return Err(ChatError::Embedding(format!(
                        "Embedding backend returned {} vectors for {} inputs",
                        vectors.len(),
                        batch.len()
                    )));
                }
                debug!("Embedded batch of {} chunks", batch.len());
                progress_ref.inc_batch(batch.len());
                Ok(vectors)
            })
            .buffered(self.concurrency)
            .try_collect()
            .await?;

        progress.finish();
        debug!(
            "Embedded {} chunks in {} batches",
            progress.chunks_embedded(),
            progress.batches_completed()
        );
        Ok(batches.into_iter().flatten().collect())
    }

    /// Identity of a document set for a given embedding model.
    pub fn fingerprint(model: &str, documents: &[Document]) -> String {
        let mut keys: Vec<(&str, &str)> = documents
            .iter()
            .map(|d| (d.relative_path.as_str(), d.content_hash.as_str()))
            .collect();
        keys.sort_unstable();

        let mut hasher = Sha256::new();
        hasher.update(model.as_bytes());
        for (path, hash) in keys {
            hasher.update([0u8]);
            hasher.update(path.as_bytes());
            hasher.update([0u8]);
            hasher.update(hash.as_bytes());
        }
        format!("{:x}", hasher.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::embeddings::HashingEmbedder;
    use async_trait::async_trait;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingEmbedder {
        inner: HashingEmbedder,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl EmbeddingBackend for CountingEmbedder {
        fn model_name(&self) -> &str {
            self.inner.model_name()
        }

        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.embed(texts).await
        }
    }

    struct ShortEmbedder;

    #[async_trait]
    impl EmbeddingBackend for ShortEmbedder {
        fn model_name(&self) -> &str {
            "short"
        }

        async fn embed(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(vec![vec![1.0]])
        }
    }

    fn doc(path: &str, content: &str) -> Document {
        Document::new(PathBuf::from(path), path.to_string(), content.to_string(), None)
    }

    fn counting() -> Arc<CountingEmbedder> {
        Arc::new(CountingEmbedder {
            inner: HashingEmbedder::new(64),
            calls: AtomicUsize::new(0),
        })
    }

    #[tokio::test]
    async fn test_second_build_hits_cache() {
        let embedder = counting();
        let builder = IndexBuilder::new(embedder.clone(), TextChunker::new(100, 10));

        let first = builder
            .build(vec![doc("faq.txt", "Tuition is free.")])
            .await
            .unwrap();
        let calls_after_first = embedder.calls.load(Ordering::SeqCst);
        assert!(calls_after_first > 0);

        let second = builder
            .build(vec![doc("faq.txt", "Tuition is free.")])
            .await
            .unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(embedder.calls.load(Ordering::SeqCst), calls_after_first);
    }

    #[tokio::test]
    async fn test_changed_documents_rebuild() {
        let embedder = counting();
        let builder = IndexBuilder::new(embedder.clone(), TextChunker::new(100, 10));

        builder.build(vec![doc("faq.txt", "v1")]).await.unwrap();
        let rebuilt = builder.build(vec![doc("faq.txt", "v2")]).await.unwrap();

        assert_eq!(embedder.calls.load(Ordering::SeqCst), 2);
        assert_eq!(rebuilt.chunks().next().unwrap().text, "v2");
    }

    #[tokio::test]
    async fn test_empty_document_set_gives_empty_index() {
        let embedder = counting();
        let builder = IndexBuilder::new(embedder.clone(), TextChunker::new(100, 10));

        let index = builder.build(Vec::new()).await.unwrap();

        assert!(index.is_empty());
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_batches_preserve_order() {
        let embedder = counting();
        let builder = IndexBuilder::new(embedder.clone(), TextChunker::new(100, 10))
            .with_batching(2, 3);

        let docs: Vec<Document> = (0..5)
            .map(|i| doc(&format!("doc{}.txt", i), &format!("content number {}", i)))
            .collect();
        let index = builder.build(docs).await.unwrap();

        assert_eq!(embedder.calls.load(Ordering::SeqCst), 3);
        let sources: Vec<&str> = index.chunks().map(|c| c.source.as_str()).collect();
        assert_eq!(
            sources,
            vec!["doc0.txt", "doc1.txt", "doc2.txt", "doc3.txt", "doc4.txt"]
        );

        let query = HashingEmbedder::new(64).embed_text("content number 3");
        let hits = index.search(&query, 1).unwrap();
        assert_eq!(hits[0].chunk.source, "doc3.txt");
    }

    #[tokio::test]
    async fn test_vector_count_mismatch_is_embedding_error() {
        let builder = IndexBuilder::new(Arc::new(ShortEmbedder), TextChunker::new(100, 10));
        let result = builder
            .build(vec![doc("a.txt", "one"), doc("b.txt", "two")])
            .await;
        assert!(matches!(result, Err(ChatError::Embedding(_))));
        assert!(builder.cached().await.is_none());
    }

    #[test]
    fn test_fingerprint_ignores_order_but_not_model() {
        let a = vec![doc("a.txt", "one"), doc("b.txt", "two")];
        let b = vec![doc("b.txt", "two"), doc("a.txt", "one")];

        assert_eq!(
            IndexBuilder::fingerprint("m", &a),
            IndexBuilder::fingerprint("m", &b)
        );
        assert_ne!(
            IndexBuilder::fingerprint("m", &a),
            IndexBuilder::fingerprint("other", &a)
        );
    }
}
