// file: src/ui/terminal.rs
// description: interactive terminal front-end rendering the role-tagged transcript
// reference: https://docs.rs/indicatif, https://docs.rs/colored

use crate::chat::{ChatResponse, ChatSession, SubmitOutcome};
use crate::config::ChatConfig;
use crate::error::{ChatError, Result};
use crate::models::{RetrievedChunk, Role, Transcript};
use crate::utils::logging::{format_error, format_info};
use colored::Colorize;
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::io::Write;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};

const HELP: &str = "Type a question and press Enter. Commands: /sources, /help, /quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserInput {
    Quit,
    Help,
    Sources,
    Message(String),
}

impl UserInput {
    pub fn parse(line: &str) -> Self {
        match line.trim() {
            "/quit" | "/exit" => UserInput::Quit,
            "/help" | "/?" => UserInput::Help,
            "/sources" => UserInput::Sources,
            _ => UserInput::Message(line.to_string()),
        }
    }
}

pub struct TerminalUi {
    config: ChatConfig,
    colored: bool,
}

impl TerminalUi {
    pub fn new(config: ChatConfig, colored: bool) -> Self {
        Self { config, colored }
    }

    pub fn render_transcript(&self, transcript: &Transcript) -> String {
        let mut output = String::new();
        let title = format!("== {} ==", self.config.title);
        output.push_str(&self.paint_title(&title));
        output.push('\n');

        for turn in transcript {
            output.push_str(&self.role_tag(turn.role));
            output.push(' ');
            output.push_str(&turn.content);
            output.push('\n');
        }

        output
    }

    pub fn render_sources(&self, sources: &[RetrievedChunk]) -> String {
        if sources.is_empty() {
            return "No sources for the last answer.\n".to_string();
        }

        sources
            .iter()
            .enumerate()
            .map(|(i, source)| format!("{}. {}", i + 1, source.format_summary(160)))
            .collect()
    }

    /// Output of a one-shot question: the answer, then the sources when asked for.
    pub fn render_answer(&self, response: &ChatResponse, show_sources: bool) -> String {
        let mut output = format!("{}\n", response.answer);
        if show_sources {
            output.push('\n');
            output.push_str(&self.render_sources(&response.sources));
        }
        output
    }

    /// Transient loading indicator on stderr; hidden when stderr is not a terminal.
    pub fn spinner(&self, message: &str) -> ProgressBar {
        let spinner = self.spinner_bar(message);
        spinner.set_draw_target(ProgressDrawTarget::stderr());
        spinner.enable_steady_tick(Duration::from_millis(100));
        spinner
    }

    /// Same as [`TerminalUi::spinner`], drawn through `multi` so that progress
    /// bars added to it later stack below the spinner.
    pub fn spinner_in(&self, multi: &MultiProgress, message: &str) -> ProgressBar {
        let spinner = multi.add(self.spinner_bar(message));
        spinner.enable_steady_tick(Duration::from_millis(100));
        spinner
    }

    fn spinner_bar(&self, message: &str) -> ProgressBar {
        let spinner = ProgressBar::with_draw_target(None, ProgressDrawTarget::hidden());
        let template = if self.colored {
            "{spinner:.green} {msg}"
        } else {
            "{spinner} {msg}"
        };
        spinner.set_style(
            ProgressStyle::default_spinner()
                .template(template)
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.set_message(message.to_string());
        spinner
    }

    /// Reads stdin line by line until `/quit` or end of input. Turn failures
    /// are shown in place of the answer; only non-recoverable errors end the loop.
    pub async fn run(&self, session: &mut ChatSession) -> Result<()> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        self.print(&self.render_transcript(session.transcript()));
        self.print(&format!("{}\n", format_info(HELP)));

        loop {
            self.prompt()?;
            let Some(line) = lines
                .next_line()
                .await
                .map_err(|e| ChatError::io("<stdin>", e))?
            else {
                break;
            };

            match UserInput::parse(&line) {
                UserInput::Quit => break,
                UserInput::Help => self.print(&format!("{}\n", HELP)),
                UserInput::Sources => self.print(&self.render_sources(session.last_sources())),
                UserInput::Message(text) => {
                    let spinner = self.spinner(&self.config.thinking_message);
                    let outcome = session.submit(&text).await;
                    spinner.finish_and_clear();

                    match outcome {
                        Ok(SubmitOutcome::Ignored) => continue,
                        Ok(SubmitOutcome::Answered(_)) => {
                            self.print(&self.render_transcript(session.transcript()));
                        }
                        Err(err) if err.is_recoverable() => {
                            self.print(&self.render_transcript(session.transcript()));
                            self.print(&format!(
                                "{} {}\n",
                                self.role_tag(Role::Assistant),
                                format_error(&err.to_string())
                            ));
                        }
                        Err(err) => return Err(err),
                    }
                }
            }
        }

        Ok(())
    }

    fn prompt(&self) -> Result<()> {
        let mut stdout = std::io::stdout();
        write!(stdout, "{}", self.config.input_prompt)
            .and_then(|_| stdout.flush())
            .map_err(|e| ChatError::io("<stdout>", e))
    }

    fn print(&self, text: &str) {
        print!("{}", text);
    }

    fn paint_title(&self, title: &str) -> String {
        if self.colored {
            title.bold().to_string()
        } else {
            title.to_string()
        }
    }

    fn role_tag(&self, role: Role) -> String {
        let label = format!("[{}]", role);
        if !self.colored {
            return label;
        }
        match role {
            Role::User => label.cyan().bold().to_string(),
            Role::Assistant => label.green().bold().to_string(),
        }
    }
}
