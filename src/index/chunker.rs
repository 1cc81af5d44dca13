// file: src/index/chunker.rs
// description: splits document text into overlapping windows on natural boundaries
// reference: internal module structure

use crate::models::{Chunk, Document};

#[derive(Debug, Clone)]
pub struct TextChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl TextChunker {
    /// Sizes are in characters; `chunk_overlap` must be smaller than `chunk_size`.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            chunk_size,
            chunk_overlap: chunk_overlap.min(chunk_size - 1),
        }
    }

    pub fn chunk_document(&self, document: &Document) -> Vec<Chunk> {
        self.split(&document.content)
            .into_iter()
            .enumerate()
            .map(|(ordinal, (offset, text))| {
                Chunk::new(
                    &document.relative_path,
                    document.title.clone(),
                    ordinal,
                    offset,
                    text,
                )
            })
            .collect()
    }

    /// Returns `(byte_offset, text)` pairs; blank windows are dropped.
    pub fn split(&self, text: &str) -> Vec<(usize, String)> {
        let offsets: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
        let chars: Vec<char> = text.chars().collect();
        let n = chars.len();
        let byte_at = |i: usize| if i < n { offsets[i] } else { text.len() };

        let mut pieces = Vec::new();
        let mut start = 0;

        while start < n {
            let hard_end = (start + self.chunk_size).min(n);
            let end = if hard_end == n {
                n
            } else {
                self.find_break(&chars, start, hard_end)
            };

            let slice = &text[byte_at(start)..byte_at(end)];
            let trimmed = slice.trim();
            if !trimmed.is_empty() {
                let leading = slice.len() - slice.trim_start().len();
                pieces.push((byte_at(start) + leading, trimmed.to_string()));
            }

            if end == n {
                break;
            }

            let mut next = end.saturating_sub(self.chunk_overlap);
            while next > start && next < end && !chars[next - 1].is_whitespace() {
                next += 1;
            }
            start = if next > start && next < end { next } else { end };
        }

        pieces
    }

    /// Latest paragraph break, then sentence end, then whitespace in the second
    /// half of the window; falls back to the hard limit.
    fn find_break(&self, chars: &[char], start: usize, hard_end: usize) -> usize {
        let min_end = start + self.chunk_size / 2;
        let window = (min_end + 1..=hard_end).rev();

        let paragraph = window
            .clone()
            .find(|&i| i >= 2 && chars[i - 1] == '\n' && chars[i - 2] == '\n');
        if let Some(i) = paragraph {
            return i;
        }

        let sentence = window.clone().find(|&i| {
            matches!(chars[i - 1], '.' | '?' | '!' | ';')
                && chars.get(i).is_some_and(|c| c.is_whitespace())
        });
        if let Some(i) = sentence {
            return i;
        }

        window
            .clone()
            .find(|&i| chars[i - 1].is_whitespace())
            .unwrap_or(hard_end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_short_text_single_chunk() {
        let chunker = TextChunker::new(1024, 200);
        let pieces = chunker.split("Tuition is free.");
        assert_eq!(pieces, vec![(0, "Tuition is free.".to_string())]);
    }

    #[test]
    fn test_blank_text_has_no_chunks() {
        let chunker = TextChunker::new(100, 10);
        assert!(chunker.split("").is_empty());
        assert!(chunker.split("  \n\n ").is_empty());
    }

    #[test]
    fn test_chunks_respect_size_and_cover_text() {
        let sentence = "The semester fee covers the student union and the transit pass. ";
        let text = sentence.repeat(40);
        let chunker = TextChunker::new(200, 40);
        let pieces = chunker.split(&text);

        assert!(pieces.len() > 1);
        for (_, piece) in &pieces {
            assert!(piece.chars().count() <= 200);
        }
        let last = &pieces.last().unwrap().1;
        assert!(text.trim_end().ends_with(last.as_str()));
    }

    #[test]
    fn test_prefers_paragraph_breaks() {
        let text = format!("{}\n\n{}", "a ".repeat(40).trim(), "b ".repeat(40).trim());
        let chunker = TextChunker::new(100, 10);
        let pieces = chunker.split(&text);

        assert!(pieces[0].1.chars().all(|c| c == 'a' || c == ' '));
    }

    #[test]
    fn test_offsets_point_into_text() {
        let text = "Erste Zeile über Prüfungen.\n\nZweite Zeile über Module.";
        let chunker = TextChunker::new(30, 5);
        for (offset, piece) in chunker.split(text) {
            assert!(text[offset..].starts_with(piece.as_str()));
        }
    }

    #[test]
    fn test_chunk_document_ids() {
        let doc = Document::new(
            PathBuf::from("/tmp/faq.txt"),
            "faq.txt".to_string(),
            "Tuition is free.".to_string(),
            None,
        );
        let chunks = TextChunker::new(1024, 200).chunk_document(&doc);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].id, "faq.txt#0");
        assert_eq!(chunks[0].source, "faq.txt");
    }
}
