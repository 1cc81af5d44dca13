// file: src/parser/normalizer.rs
// description: whitespace normalization applied to every loaded document
// reference: https://docs.rs/regex

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref TRAILING_WHITESPACE: Regex =
        Regex::new(r"(?m)[ \t]+$").expect("TRAILING_WHITESPACE regex is valid");
    static ref EXCESS_BLANK_LINES: Regex =
        Regex::new(r"\n{3,}").expect("EXCESS_BLANK_LINES regex is valid");
}

pub struct TextNormalizer;

impl TextNormalizer {
    pub fn new() -> Self {
        Self
    }

    pub fn normalize(&self, content: &str) -> String {
        let normalized = self.normalize_line_endings(content);
        let normalized = TRAILING_WHITESPACE.replace_all(&normalized, "");
        let normalized = EXCESS_BLANK_LINES.replace_all(&normalized, "\n\n");
        normalized.trim().to_string()
    }

    fn normalize_line_endings(&self, content: &str) -> String {
        content
            .trim_start_matches('\u{feff}')
            .replace("\r\n", "\n")
            .replace('\r', "\n")
    }
}

impl Default for TextNormalizer {
    fn default() -> Self {
        Self::new()
    }
}
