// file: src/index/vector_index.rs
// description: immutable in-memory vector index with cosine similarity search
// reference: internal module structure

use crate::error::{ChatError, Result};
use crate::models::{Chunk, RetrievedChunk};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

#[derive(Debug, Clone)]
pub struct IndexEntry {
    pub chunk: Chunk,
    pub vector: Vec<f32>,
}

/// Read-only after construction; shared between turns and sessions via `Arc`.
#[derive(Debug)]
pub struct VectorIndex {
    entries: Vec<IndexEntry>,
    dimension: usize,
    document_count: usize,
    embedding_model: String,
    fingerprint: String,
    built_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct IndexStats {
    pub documents: usize,
    pub chunks: usize,
    pub dimension: usize,
    pub embedding_model: String,
    pub built_at: DateTime<Utc>,
}

impl fmt::Display for IndexStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} documents, {} chunks, dimension {} ({})",
            self.documents, self.chunks, self.dimension, self.embedding_model
        )
    }
}

impl VectorIndex {
    pub fn empty(embedding_model: &str, fingerprint: String, document_count: usize) -> Self {
        Self {
            entries: Vec::new(),
            dimension: 0,
            document_count,
            embedding_model: embedding_model.to_string(),
            fingerprint,
            built_at: Utc::now(),
        }
    }

    /// All vectors must share one non-zero dimension.
    pub fn from_entries(
        entries: Vec<IndexEntry>,
        embedding_model: &str,
        fingerprint: String,
        document_count: usize,
    ) -> Result<Self> {
        let Some(first) = entries.first() else {
            return Ok(Self::empty(embedding_model, fingerprint, document_count));
        };

        let dimension = first.vector.len();
        if dimension == 0 {
            return Err(ChatError::Embedding(
                "Embedding backend returned empty vectors".to_string(),
            ));
        }

        if let Some(bad) = entries.iter().find(|e| e.vector.len() != dimension) {
            return Err(ChatError::Embedding(format!(
                "Inconsistent embedding dimension for {}: expected {}, got {}",
                bad.chunk.id,
                dimension,
                bad.vector.len()
            )));
        }

        Ok(Self {
            entries,
            dimension,
            document_count,
            embedding_model: embedding_model.to_string(),
            fingerprint,
            built_at: Utc::now(),
        })
    }

    /// Top `top_k` chunks by cosine similarity, best first; ties keep index order.
    pub fn search(&self, query: &[f32], top_k: usize) -> Result<Vec<RetrievedChunk>> {
        if self.entries.is_empty() || top_k == 0 {
            return Ok(Vec::new());
        }

        if query.len() != self.dimension {
            return Err(ChatError::Embedding(format!(
                "Query embedding has dimension {}, index has {}",
                query.len(),
                self.dimension
            )));
        }

        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, entry)| (i, cosine_similarity(query, &entry.vector)))
            .collect();

        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(top_k);

        Ok(scored
            .into_iter()
            .map(|(i, score)| RetrievedChunk::new(self.entries[i].chunk.clone(), score))
            .collect())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn embedding_model(&self) -> &str {
        &self.embedding_model
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn chunks(&self) -> impl Iterator<Item = &Chunk> {
        self.entries.iter().map(|e| &e.chunk)
    }

    pub fn sources(&self) -> BTreeSet<&str> {
        self.entries.iter().map(|e| e.chunk.source.as_str()).collect()
    }

    pub fn stats(&self) -> IndexStats {
        IndexStats {
            documents: self.document_count,
            chunks: self.entries.len(),
            dimension: self.dimension,
            embedding_model: self.embedding_model.clone(),
            built_at: self.built_at,
        }
    }
}

/// Zero-norm vectors score 0.0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let (mut dot, mut norm_a, mut norm_b) = (0.0f32, 0.0f32, 0.0f32);
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}
