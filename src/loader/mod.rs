// file: src/loader/mod.rs
// description: document loading module exports
// reference: internal module structure

pub mod reader;
pub mod scanner;

pub use reader::DocumentLoader;
pub use scanner::{FileScanner, ScannedFile};
