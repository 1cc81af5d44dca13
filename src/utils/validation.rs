// file: src/utils/validation.rs
// description: input and configuration validation helpers
// reference: input validation patterns

use crate::error::{ChatError, Result};
use std::path::Path;

pub struct Validator;

impl Validator {
    pub fn validate_directory(path: &Path) -> Result<()> {
        if !path.exists() {
            return Err(ChatError::io(
                path,
                std::io::Error::new(std::io::ErrorKind::NotFound, "directory does not exist"),
            ));
        }

        if !path.is_dir() {
            return Err(ChatError::io(
                path,
                std::io::Error::new(std::io::ErrorKind::InvalidInput, "path is not a directory"),
            ));
        }

        Ok(())
    }

    pub fn validate_content_not_empty(content: &str) -> Result<()> {
        if content.trim().is_empty() {
            return Err(ChatError::Validation("Content is empty".to_string()));
        }
        Ok(())
    }

    pub fn validate_url(url: &str) -> Result<()> {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ChatError::Validation(format!(
                "Invalid URL format: {}",
                url
            )));
        }
        Ok(())
    }

    pub fn validate_batch_size(size: usize) -> Result<()> {
        if size == 0 {
            return Err(ChatError::Validation(
                "Batch size must be greater than 0".to_string(),
            ));
        }

        if size > 2048 {
            return Err(ChatError::Validation(
                "Batch size too large (max 2048)".to_string(),
            ));
        }

        Ok(())
    }

    pub fn sanitize_file_path(path: &str) -> String {
        path.replace('\\', "/").replace("//", "/").trim().to_string()
    }

    /// Truncates on a char boundary so multi-byte text never panics.
    pub fn truncate_text(text: &str, max_chars: usize) -> String {
        match text.char_indices().nth(max_chars) {
            None => text.to_string(),
            Some((byte_idx, _)) => format!("{}...", &text[..byte_idx]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_validate_directory() {
        let temp = TempDir::new().unwrap();
        assert!(Validator::validate_directory(temp.path()).is_ok());

        let missing = Validator::validate_directory(Path::new("/nonexistent/chatdata"));
        assert!(matches!(missing, Err(ChatError::Io { .. })));

        let file = temp.path().join("file.txt");
        fs::write(&file, "text").unwrap();
        assert!(matches!(
            Validator::validate_directory(&file),
            Err(ChatError::Io { .. })
        ));
    }

    #[test]
    fn test_validate_content_not_empty() {
        assert!(Validator::validate_content_not_empty("content").is_ok());
        assert!(Validator::validate_content_not_empty("").is_err());
        assert!(Validator::validate_content_not_empty("   ").is_err());
    }

    #[test]
    fn test_validate_url() {
        assert!(Validator::validate_url("https://example.com/v1").is_ok());
        assert!(Validator::validate_url("http://localhost:8080").is_ok());
        assert!(Validator::validate_url("example.com").is_err());
        assert!(Validator::validate_url("ftp://example.com").is_err());
    }

    #[test]
    fn test_validate_batch_size() {
        assert!(Validator::validate_batch_size(32).is_ok());
        assert!(Validator::validate_batch_size(0).is_err());
        assert!(Validator::validate_batch_size(4096).is_err());
    }

    #[test]
    fn test_sanitize_file_path() {
        assert_eq!(
            Validator::sanitize_file_path("docs\\faq\\a.txt"),
            "docs/faq/a.txt"
        );
        assert_eq!(Validator::sanitize_file_path("  docs//a.txt  "), "docs/a.txt");
    }

    #[test]
    fn test_truncate_text() {
        assert_eq!(Validator::truncate_text("short", 10), "short");
        assert_eq!(
            Validator::truncate_text("this is a very long text", 10),
            "this is a ..."
        );
        assert_eq!(Validator::truncate_text("Prüfungsordnung", 3), "Prü...");
    }
}
