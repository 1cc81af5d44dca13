// file: src/loader/scanner.rs
// description: Directory walking and file discovery with filtering
// reference: https://docs.rs/walkdir

use crate::config::DocumentsConfig;
use crate::error::{ChatError, Result};
use crate::utils::Validator;
use chrono::{DateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

pub struct FileScanner {
    config: DocumentsConfig,
}

#[derive(Debug, Clone)]
pub struct ScannedFile {
    pub path: PathBuf,
    pub relative_path: String,
    pub size: u64,
    pub modified: Option<DateTime<Utc>>,
}

impl FileScanner {
    pub fn new(config: DocumentsConfig) -> Self {
        Self { config }
    }

    /// Lists candidate files under `root`, sorted by path.
    ///
    /// Fails if `root` is missing, not a directory or cannot be listed. Entries
    /// below the root that cannot be read are logged and skipped.
    pub fn scan_directory(&self, root: &Path) -> Result<Vec<ScannedFile>> {
        info!("Scanning directory: {}", root.display());
        Validator::validate_directory(root)?;
        fs::read_dir(root).map_err(|e| ChatError::io(root, e))?;

        let max_depth = if self.config.recursive { usize::MAX } else { 1 };
        let max_size = (self.config.max_file_size_mb * 1024 * 1024) as u64;
        let mut files = Vec::new();

        let walker = WalkDir::new(root)
            .follow_links(true)
            .max_depth(max_depth)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    warn!("Skipping unreadable entry under {}: {}", root.display(), err);
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            let relative_path = Validator::sanitize_file_path(
                &path.strip_prefix(root).unwrap_or(path).to_string_lossy(),
            );

            if self.should_skip(&relative_path) {
                debug!("Skipping file: {}", path.display());
                continue;
            }

            let metadata = match entry.metadata() {
                Ok(metadata) => metadata,
                Err(err) => {
                    warn!("Skipping {}: cannot read metadata: {}", path.display(), err);
                    continue;
                }
            };

            let size = metadata.len();
            if size > max_size {
                warn!(
                    "Skipping large file ({} MB): {}",
                    size / 1024 / 1024,
                    path.display()
                );
                continue;
            }

            let modified = metadata.modified().ok().map(DateTime::<Utc>::from);

            files.push(ScannedFile {
                path: path.to_path_buf(),
                relative_path,
                size,
                modified,
            });
        }

        info!("Found {} candidate files", files.len());
        Ok(files)
    }

    fn should_skip(&self, relative_path: &str) -> bool {
        for pattern in &self.config.skip_patterns {
            if let Some(suffix) = pattern.strip_prefix('*') {
                if relative_path.ends_with(suffix) {
                    return true;
                }
            } else if relative_path.contains(pattern.as_str()) {
                return true;
            }
        }

        false
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .is_some_and(|name| name.starts_with('.'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn test_config() -> DocumentsConfig {
        DocumentsConfig {
            input_dir: PathBuf::from("."),
            recursive: true,
            skip_patterns: vec!["*.zip".to_string(), "archive/".to_string()],
            max_file_size_mb: 10,
        }
    }

    #[test]
    fn test_scan_directory_recursive() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("sub/deeper")).unwrap();
        fs::write(temp.path().join("b.txt"), "b").unwrap();
        fs::write(temp.path().join("sub/a.md"), "# A").unwrap();
        fs::write(temp.path().join("sub/deeper/c.txt"), "c").unwrap();

        let scanner = FileScanner::new(test_config());
        let files = scanner.scan_directory(temp.path()).unwrap();

        let names: Vec<&str> = files.iter().map(|f| f.relative_path.as_str()).collect();
        assert_eq!(names, vec!["b.txt", "sub/a.md", "sub/deeper/c.txt"]);
    }

    #[test]
    fn test_non_recursive_scan() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("sub")).unwrap();
        fs::write(temp.path().join("top.txt"), "top").unwrap();
        fs::write(temp.path().join("sub/nested.txt"), "nested").unwrap();

        let mut config = test_config();
        config.recursive = false;
        let files = FileScanner::new(config).scan_directory(temp.path()).unwrap();

        assert_eq!(files.len(), 1);
        assert_eq!(files[0].relative_path, "top.txt");
    }

    #[test]
    fn test_hidden_entries_skipped() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join(".git")).unwrap();
        fs::write(temp.path().join(".git/config"), "x").unwrap();
        fs::write(temp.path().join(".env"), "KEY=1").unwrap();
        fs::write(temp.path().join("visible.txt"), "x").unwrap();

        let files = FileScanner::new(test_config())
            .scan_directory(temp.path())
            .unwrap();
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn test_skip_patterns() {
        let scanner = FileScanner::new(test_config());

        assert!(scanner.should_skip("bundle.zip"));
        assert!(scanner.should_skip("archive/old.txt"));
        assert!(!scanner.should_skip("faq.txt"));
    }

    #[test]
    fn test_missing_directory_is_io_error() {
        let scanner = FileScanner::new(test_config());
        let result = scanner.scan_directory(Path::new("/definitely/not/here"));
        assert!(matches!(result, Err(ChatError::Io { .. })));
    }
}
