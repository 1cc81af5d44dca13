// file: src/loader/reader.rs
// description: turns scanned files into normalized text documents
// reference: internal module structure

use crate::config::DocumentsConfig;
use crate::error::Result;
use crate::loader::scanner::{FileScanner, ScannedFile};
use crate::models::Document;
use crate::parser::{MarkdownParser, TextNormalizer};
use crate::utils::OperationTimer;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

pub struct DocumentLoader {
    scanner: FileScanner,
    markdown: MarkdownParser,
    normalizer: TextNormalizer,
}

impl DocumentLoader {
    pub fn new(config: DocumentsConfig) -> Self {
        Self {
            scanner: FileScanner::new(config),
            markdown: MarkdownParser::new(),
            normalizer: TextNormalizer::new(),
        }
    }

    /// Loads one document per readable text file under `root`, ordered by
    /// relative path. Binary and unreadable files are logged and skipped.
    pub fn load(&self, root: &Path) -> Result<Vec<Document>> {
        let timer = OperationTimer::new("load_documents");
        let files = self.scanner.scan_directory(root)?;

        let mut documents: Vec<Document> = files
            .iter()
            .filter_map(|file| self.read_document(file))
            .collect();
        documents.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));

        info!(
            "Loaded {} documents from {} ({} skipped)",
            documents.len(),
            root.display(),
            files.len() - documents.len()
        );
        timer.finish_with_count(documents.len());
        Ok(documents)
    }

    fn read_document(&self, file: &ScannedFile) -> Option<Document> {
        let bytes = match fs::read(&file.path) {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!("Skipping unreadable file {}: {}", file.path.display(), err);
                return None;
            }
        };

        let raw = match decode_text(&bytes) {
            Decoded::Text(raw) => raw,
            Decoded::Lossy(raw) => {
                warn!(
                    "{} is not valid UTF-8; undecodable bytes were replaced",
                    file.path.display()
                );
                raw
            }
            Decoded::Binary => {
                warn!("Skipping binary file {}", file.path.display());
                return None;
            }
        };

        let (text, title) = if MarkdownParser::is_markdown_path(&file.path) {
            let parsed = self.markdown.parse(&raw);
            let title = parsed.title();
            (parsed.plain_text, title)
        } else {
            (raw, None)
        };

        let content = self.normalizer.normalize(&text);
        debug!(
            "Read {} ({} bytes -> {} chars)",
            file.relative_path,
            file.size,
            content.chars().count()
        );

        Some(
            Document::new(
                file.path.clone(),
                file.relative_path.clone(),
                content,
                file.modified,
            )
            .with_file_size(file.size)
            .with_title(title),
        )
    }
}

#[derive(Debug, PartialEq)]
enum Decoded {
    Text(String),
    Lossy(String),
    Binary,
}

/// NUL bytes mark a file as binary. Anything else is text; invalid UTF-8
/// sequences are replaced rather than dropping the whole file.
fn decode_text(bytes: &[u8]) -> Decoded {
    if bytes.contains(&0) {
        return Decoded::Binary;
    }
    match std::str::from_utf8(bytes) {
        Ok(text) => Decoded::Text(text.to_string()),
        Err(_) => Decoded::Lossy(String::from_utf8_lossy(bytes).into_owned()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ChatError;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn loader() -> DocumentLoader {
        DocumentLoader::new(DocumentsConfig {
            input_dir: PathBuf::from("."),
            recursive: true,
            skip_patterns: vec![],
            max_file_size_mb: 10,
        })
    }

    #[test]
    fn test_one_document_per_file() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("nested")).unwrap();
        fs::write(temp.path().join("faq.txt"), "Tuition is free.").unwrap();
        fs::write(temp.path().join("nested/rules.md"), "# Rules\n\nBe kind.").unwrap();
        fs::write(temp.path().join("empty.txt"), "").unwrap();

        let docs = loader().load(temp.path()).unwrap();

        assert_eq!(docs.len(), 3);
        assert_eq!(docs[0].relative_path, "empty.txt");
        assert!(docs[0].is_empty());
        assert_eq!(docs[1].content, "Tuition is free.");
        assert_eq!(docs[2].title.as_deref(), Some("Rules"));
        assert!(docs[2].content.contains("Be kind."));
    }

    #[test]
    fn test_empty_directory_yields_no_documents() {
        let temp = TempDir::new().unwrap();
        let docs = loader().load(temp.path()).unwrap();
        assert!(docs.is_empty());
    }

    #[test]
    fn test_binary_file_skipped() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("image.bin"), [0u8, 159, 146, 150]).unwrap();
        fs::write(temp.path().join("notes.txt"), "plain").unwrap();

        let docs = loader().load(temp.path()).unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].relative_path, "notes.txt");
    }

    #[test]
    fn test_missing_directory_fails() {
        let result = loader().load(Path::new("/no/such/chatdata"));
        assert!(matches!(result, Err(ChatError::Io { .. })));
    }

    #[test]
    fn test_decode_text() {
        assert_eq!(decode_text(b"abc"), Decoded::Text("abc".to_string()));
        assert_eq!(decode_text(&[b'a', 0, b'b']), Decoded::Binary);
        assert_eq!(
            decode_text(&[b'a', 0xff, b'b']),
            Decoded::Lossy("a\u{fffd}b".to_string())
        );
    }

    #[test]
    fn test_latin1_text_file_is_loaded() {
        let temp = TempDir::new().unwrap();
        let bytes = b"Pr\xfcfungsordnung: Tuition is free.";
        fs::write(temp.path().join("ordnung.txt"), bytes).unwrap();

        let docs = loader().load(temp.path()).unwrap();

        assert_eq!(docs.len(), 1);
        assert!(docs[0].content.starts_with("Pr\u{fffd}fungsordnung"));
        assert!(docs[0].content.contains("Tuition is free."));
    }

    #[test]
    fn test_file_size_is_size_on_disk() {
        let temp = TempDir::new().unwrap();
        let raw = "line one   \r\n\r\n\r\n\r\nline two\r\n";
        fs::write(temp.path().join("notes.txt"), raw).unwrap();

        let docs = loader().load(temp.path()).unwrap();

        assert_eq!(docs[0].file_size, raw.len() as u64);
        assert!(docs[0].content.len() < raw.len());
    }
}
