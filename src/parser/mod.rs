// file: src/parser/mod.rs
// description: document text extraction module exports
// reference: internal module structure

pub mod markdown;
pub mod normalizer;

pub use markdown::{Heading, MarkdownParser, ParsedMarkdown};
pub use normalizer::TextNormalizer;
