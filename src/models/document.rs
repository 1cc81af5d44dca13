// file: src/models/document.rs
// description: loaded source document with path metadata and content hash
// reference: internal data structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub file_path: PathBuf,
    pub relative_path: String,
    pub title: Option<String>,
    pub content: String,
    pub content_hash: String,
    pub file_size: u64,
    pub last_modified: Option<DateTime<Utc>>,
}

impl Document {
    pub fn new(
        file_path: PathBuf,
        relative_path: String,
        content: String,
        last_modified: Option<DateTime<Utc>>,
    ) -> Self {
        let content_hash = Self::compute_hash(&content);
        let file_size = content.len() as u64;

        Self {
            file_path,
            relative_path,
            title: None,
            content,
            content_hash,
            file_size,
            last_modified,
        }
    }

    /// Size of the file on disk; defaults to the length of the loaded text.
    pub fn with_file_size(mut self, file_size: u64) -> Self {
        self.file_size = file_size;
        self
    }

    pub fn with_title(mut self, title: Option<String>) -> Self {
        self.title = title.filter(|t| !t.trim().is_empty());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.content.trim().is_empty()
    }

    pub(crate) fn compute_hash(content: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(content.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}
