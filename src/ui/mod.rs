// file: src/ui/mod.rs
// description: user-facing conversational interface module exports
// reference: internal module structure

pub mod terminal;

pub use terminal::{TerminalUi, UserInput};
