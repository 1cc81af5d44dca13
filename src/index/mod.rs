// file: src/index/mod.rs
// description: chunking, embedding and vector index module exports
// reference: internal module structure

pub mod builder;
pub mod chunker;
pub mod embeddings;
pub mod progress;
pub mod vector_index;

pub use builder::IndexBuilder;
pub use chunker::TextChunker;
pub use embeddings::{
    EmbeddingBackend, HashingEmbedder, OpenAiEmbeddingClient, embedding_backend_from_config,
};
pub use progress::IndexProgress;
pub use vector_index::{IndexEntry, IndexStats, VectorIndex, cosine_similarity};
