// file: src/main.rs
// description: commandline application entry point with command handling
// reference: application bootstrap and orchestration

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use indicatif::MultiProgress;
use doc_chat::utils::logging::{format_info, format_step, format_success, format_warning};
use doc_chat::{
    ChatSession, Config, OperationTimer, PerformanceMetrics, StartupOptions, SubmitOutcome,
    TerminalUi, Validator, bootstrap, load_index,
};
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "doc_chat")]
#[command(author = "cipher")]
#[command(version = "0.1.0")]
#[command(about = "Chat with a directory of documents through an OpenAI-compatible model", long_about = None)]
struct Cli {
    #[arg(
        short,
        long,
        value_name = "FILE",
        default_value = "config/default.toml"
    )]
    config: PathBuf,

    /// Overrides documents.input_dir from the configuration
    #[arg(short, long, value_name = "DIR", env = "DOC_CHAT_INPUT_DIR")]
    input_dir: Option<PathBuf>,

    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    color: bool,

    #[arg(short, long, action = ArgAction::SetTrue)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the interactive chat (default)
    Chat,

    /// Ask a single question and print the answer
    Ask {
        question: String,

        /// Also print the retrieved passages
        #[arg(long)]
        sources: bool,
    },

    /// Build the index and print statistics
    Index,

    /// Show the passages retrieved for a query without calling the model
    Search {
        query: String,

        #[arg(short, long, default_value_t = 5)]
        limit: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    doc_chat::utils::logging::init_logger(cli.color, cli.verbose);
    colored::control::set_override(cli.color);

    info!("Loading configuration from: {}", cli.config.display());

    let mut config = if cli.config.exists() {
        Config::load(Some(cli.config.as_path())).context("Failed to load configuration")?
    } else {
        warn!(
            "Config file {} not found, using defaults and environment",
            cli.config.display()
        );
        Config::load(None).context("Failed to load configuration")?
    };

    if let Some(dir) = cli.input_dir {
        config.documents.input_dir = dir;
    }

    let options = StartupOptions {
        show_progress: true,
        colored: cli.color,
        multi_progress: None,
    };

    match cli.command.unwrap_or(Commands::Chat) {
        Commands::Chat => cmd_chat(&config, options, cli.color).await?,
        Commands::Ask { question, sources } => {
            cmd_ask(&config, options, &question, sources).await?
        }
        Commands::Index => cmd_index(&config, options).await?,
        Commands::Search { query, limit } => cmd_search(&config, options, &query, limit).await?,
    }

    Ok(())
}

async fn cmd_chat(config: &Config, options: StartupOptions, colored: bool) -> Result<()> {
    let ui = TerminalUi::new(config.chat.clone(), colored);

    let multi = MultiProgress::new();
    let spinner = ui.spinner_in(&multi, &config.chat.loading_message);
    let options = StartupOptions {
        multi_progress: Some(multi),
        ..options
    };
    let engine = bootstrap(config, options).await;
    spinner.finish_and_clear();
    let engine = engine.context("Failed to start chat")?;

    let mut session = ChatSession::new(engine, &config.chat.greeting);
    info!("Session {} started", session.id());

    ui.run(&mut session).await.context("Chat loop failed")?;
    Ok(())
}

async fn cmd_ask(
    config: &Config,
    options: StartupOptions,
    question: &str,
    show_sources: bool,
) -> Result<()> {
    Validator::validate_content_not_empty(question).context("Question is empty")?;

    let ui = TerminalUi::new(config.chat.clone(), options.colored);
    let engine = bootstrap(config, options)
        .await
        .context("Failed to start chat")?;
    let mut session = ChatSession::new(engine, &config.chat.greeting);

    let outcome = session
        .submit(question)
        .await
        .context("Question could not be answered")?;
    if let SubmitOutcome::Answered(response) = outcome {
        print!("{}", ui.render_answer(&response, show_sources));
    }
    Ok(())
}

async fn cmd_index(config: &Config, options: StartupOptions) -> Result<()> {
    eprintln!(
        "{}",
        format_step(
            1,
            2,
            &format!("Loading {}", config.documents.input_dir.display())
        )
    );
    let timer = OperationTimer::new("index");
    let shared = load_index(config, options)
        .await
        .context("Failed to build index")?;
    let elapsed = timer.finish();

    let stats = shared.index.stats();
    eprintln!("{}", format_step(2, 2, "Index built"));
    println!("{}", format_success(&stats.to_string()));
    println!(
        "{}",
        format_info(&PerformanceMetrics::new("chunks", stats.chunks, elapsed).format())
    );

    if shared.index.is_empty() {
        println!(
            "{}",
            format_warning(&format!(
                "Nothing to index in {}; chat answers will have no sources",
                config.documents.input_dir.display()
            ))
        );
    }

    for source in shared.index.sources() {
        println!("  - {}", source);
    }

    Ok(())
}

async fn cmd_search(
    config: &Config,
    options: StartupOptions,
    query: &str,
    limit: usize,
) -> Result<()> {
    Validator::validate_content_not_empty(query).context("Query is empty")?;

    let shared = load_index(config, options)
        .await
        .context("Failed to build index")?;

    let query_embedding = shared
        .embedder
        .embed_query(query)
        .await
        .context("Failed to embed query")?;
    let results = shared
        .index
        .search(&query_embedding, limit)
        .context("Vector search failed")?;

    if results.is_empty() {
        println!("\nNo results found for query: \"{}\"\n", query);
        println!("Try:");
        println!("  - Using different search terms");
        println!("  - Checking that the input directory contains text documents");
        return Ok(());
    }

    println!("\nSearch Results for: \"{}\"\n", query);
    println!("Found {} result(s)\n", results.len());
    println!("{}", "=".repeat(80));

    for (idx, result) in results.iter().enumerate() {
        println!(
            "\n{}. {} (Score: {:.4})",
            idx + 1,
            result.chunk.source_label(),
            result.score
        );
        println!("   Chunk: {} @ byte {}", result.chunk.id, result.chunk.offset);
        println!("   Preview:");
        for line in Validator::truncate_text(&result.chunk.text, 300).lines().take(5) {
            println!("     {}", line);
        }
    }

    println!("\n{}", "=".repeat(80));
    Ok(())
}
