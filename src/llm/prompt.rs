// file: src/llm/prompt.rs
// description: condense-question and context prompt templates
// reference: internal module structure

use crate::config::ChatConfig;
use crate::error::{ChatError, Result};
use crate::models::{RetrievedChunk, Turn};

pub const DEFAULT_CONDENSE_TEMPLATE: &str = "\
Given a conversation (between Human and Assistant) and a follow up message from Human, \
rewrite the message to be a standalone question that captures all relevant context \
from the conversation.

<Chat History>
{chat_history}

<Follow Up Message>
{question}

<Standalone question>
";

pub const DEFAULT_CONTEXT_TEMPLATE: &str = "\
Context information is below.
---------------------
{context}
---------------------
Given the context information and not prior knowledge, answer the query.
Query: {question}
Answer: ";

const NO_CONTEXT: &str = "(no matching passages were found in the documents)";

#[derive(Debug, Clone)]
pub struct PromptTemplates {
    condense: String,
    context: String,
}

impl Default for PromptTemplates {
    fn default() -> Self {
        Self {
            condense: DEFAULT_CONDENSE_TEMPLATE.to_string(),
            context: DEFAULT_CONTEXT_TEMPLATE.to_string(),
        }
    }
}

impl PromptTemplates {
    pub fn new(condense: String, context: String) -> Result<Self> {
        for (name, template, keys) in [
            ("condense_template", &condense, &["{chat_history}", "{question}"][..]),
            ("context_template", &context, &["{context}", "{question}"][..]),
        ] {
            if let Some(missing) = keys.iter().find(|k| !template.contains(**k)) {
                return Err(ChatError::Config(format!(
                    "chat.{} must contain the placeholder {}",
                    name, missing
                )));
            }
        }

        Ok(Self { condense, context })
    }

    pub fn from_config(config: &ChatConfig) -> Result<Self> {
        Self::new(
            config
                .condense_template
                .clone()
                .unwrap_or_else(|| DEFAULT_CONDENSE_TEMPLATE.to_string()),
            config
                .context_template
                .clone()
                .unwrap_or_else(|| DEFAULT_CONTEXT_TEMPLATE.to_string()),
        )
    }

    pub fn condense_prompt(&self, history: &[(&Turn, &Turn)], question: &str) -> String {
        let chat_history = history
            .iter()
            .map(|(user, assistant)| {
                format!("Human: {}\nAssistant: {}", user.content, assistant.content)
            })
            .collect::<Vec<_>>()
            .join("\n");

        render(
            &self.condense,
            &[("chat_history", &chat_history), ("question", question)],
        )
    }

    pub fn context_prompt(&self, chunks: &[RetrievedChunk], question: &str) -> String {
        let context = if chunks.is_empty() {
            NO_CONTEXT.to_string()
        } else {
            chunks
                .iter()
                .map(|r| format!("[source: {}]\n{}", r.chunk.source_label(), r.chunk.text))
                .collect::<Vec<_>>()
                .join("\n\n")
        };

        render(&self.context, &[("context", &context), ("question", question)])
    }
}

/// Single pass substitution, so placeholder-like text inside values stays as is.
fn render(template: &str, values: &[(&str, &str)]) -> String {
    let mut output = String::with_capacity(template.len());
    let mut rest = template;

    'outer: while let Some(pos) = rest.find('{') {
        output.push_str(&rest[..pos]);
        let candidate = &rest[pos + 1..];

        for (key, value) in values {
            if let Some(after) = candidate.strip_prefix(*key)
                && let Some(after) = after.strip_prefix('}')
            {
                output.push_str(value);
                rest = after;
                continue 'outer;
            }
        }

        output.push('{');
        rest = candidate;
    }

    output.push_str(rest);
    output
}
