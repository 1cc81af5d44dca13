// file: src/models/chunk.rs
// description: retrievable text window cut from a document
// reference: internal data structures

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// `<relative_path>#<ordinal>`
    pub id: String,
    pub source: String,
    pub title: Option<String>,
    pub ordinal: usize,
    /// Byte offset of the chunk inside the normalized document text
    pub offset: usize,
    pub text: String,
}

impl Chunk {
    pub fn new(
        source: &str,
        title: Option<String>,
        ordinal: usize,
        offset: usize,
        text: String,
    ) -> Self {
        Self {
            id: format!("{}#{}", source, ordinal),
            source: source.to_string(),
            title,
            ordinal,
            offset,
            text,
        }
    }

    /// Label shown in front of the chunk text inside the composed prompt.
    pub fn source_label(&self) -> String {
        match &self.title {
            Some(title) => format!("{} ({})", self.source, title),
            None => self.source.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_id_and_label() {
        let chunk = Chunk::new("docs/faq.md", Some("FAQ".to_string()), 3, 120, "text".into());
        assert_eq!(chunk.id, "docs/faq.md#3");
        assert_eq!(chunk.source_label(), "docs/faq.md (FAQ)");

        let untitled = Chunk::new("faq.txt", None, 0, 0, "text".into());
        assert_eq!(untitled.source_label(), "faq.txt");
    }
}
