// file: src/parser/markdown.rs
// description: markdown to plain text conversion with pulldown-cmark
// reference: https://docs.rs/pulldown-cmark

use pulldown_cmark::{Event, Parser, Tag, TagEnd};

pub struct MarkdownParser;

#[derive(Debug, Clone)]
pub struct ParsedMarkdown {
    pub plain_text: String,
    pub headings: Vec<Heading>,
}

#[derive(Debug, Clone)]
pub struct Heading {
    pub level: u32,
    pub text: String,
    pub position: usize,
}

impl ParsedMarkdown {
    /// First heading in the document, whatever its level.
    pub fn title(&self) -> Option<String> {
        self.headings.first().map(|h| h.text.clone())
    }
}

impl MarkdownParser {
    pub fn new() -> Self {
        Self
    }

    pub fn parse(&self, content: &str) -> ParsedMarkdown {
        let parser = Parser::new(content);

        let mut plain_text = String::new();
        let mut headings = Vec::new();
        let mut current_heading: Option<(u32, String)> = None;

        for event in parser {
            match event {
                Event::Start(Tag::Heading { level, .. }) => {
                    current_heading = Some((level as u32, String::new()));
                }
                Event::End(TagEnd::Heading(_)) => {
                    if let Some((level, text)) = current_heading.take() {
                        headings.push(Heading {
                            level,
                            text: text.trim().to_string(),
                            position: plain_text.len(),
                        });
                    }
                    plain_text.push_str("\n\n");
                }
                Event::End(TagEnd::Paragraph) | Event::End(TagEnd::CodeBlock) => {
                    plain_text.push_str("\n\n");
                }
                Event::End(TagEnd::Item) | Event::End(TagEnd::TableRow) => {
                    plain_text.push('\n');
                }
                Event::End(TagEnd::TableCell) => {
                    plain_text.push(' ');
                }
                Event::Text(text) | Event::Code(text) => {
                    if let Some((_, ref mut heading_text)) = current_heading {
                        heading_text.push_str(&text);
                    }
                    plain_text.push_str(&text);
                }
                Event::SoftBreak | Event::HardBreak => {
                    plain_text.push('\n');
                }
                _ => {}
            }
        }

        ParsedMarkdown {
            plain_text: plain_text.trim().to_string(),
            headings,
        }
    }

    pub fn is_markdown_path(path: &std::path::Path) -> bool {
        matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("md") | Some("markdown")
        )
    }
}

impl Default for MarkdownParser {
    fn default() -> Self {
        Self::new()
    }
}
