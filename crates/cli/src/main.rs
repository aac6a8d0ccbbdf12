//! Nexus CLI
//!
//! Main entry point for the nexus command-line tool.
//! Asks questions of a RAG backend and shows the sources behind each answer.

mod commands;
mod render;

use clap::{Parser, Subcommand};
use commands::{AskCommand, ChatCommand, IngestCommand};
use nexus_core::{config::AppConfig, logging, AppResult};
use std::path::PathBuf;

/// Nexus - ask questions about your network, with sources
#[derive(Parser, Debug)]
#[command(name = "nexus")]
#[command(about = "Conversational client for the neXus RAG backend", long_about = None)]
#[command(version)]
struct Cli {
    /// Backend base URL (default: http://localhost:8000)
    #[arg(short, long, global = true, env = "NEXUS_ENDPOINT")]
    endpoint: Option<String>,

    /// Path to config file
    #[arg(short, long, global = true, env = "NEXUS_CONFIG")]
    config: Option<PathBuf>,

    /// Per-request deadline in seconds
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Ask a single question
    Ask(AskCommand),

    /// Interactive conversation with background knowledge base sync
    Chat(ChatCommand),

    /// Re-ingest the knowledge base
    Ingest(IngestCommand),
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> AppResult<()> {
    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    // Load base configuration from file and environment
    let config = AppConfig::load(cli.config)?;

    // Apply CLI overrides
    let config = config.with_overrides(
        cli.endpoint,
        cli.timeout,
        cli.log_level,
        cli.verbose,
        cli.no_color,
    );

    // Initialize logging with final configuration
    logging::init_logging(config.log_level.as_deref(), config.no_color, config.log_json)?;

    tracing::info!("Nexus CLI starting");
    tracing::debug!("Endpoint: {}", config.endpoint);
    tracing::debug!("Timeout: {:?}", config.request_timeout());

    config.validate()?;

    let command_name = match &cli.command {
        Commands::Ask(_) => "ask",
        Commands::Chat(_) => "chat",
        Commands::Ingest(_) => "ingest",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    // Route to command handlers
    let result = match cli.command {
        Commands::Ask(cmd) => cmd.execute(&config).await,
        Commands::Chat(cmd) => cmd.execute(&config).await,
        Commands::Ingest(cmd) => cmd.execute(&config).await,
    };

    // Log completion
    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}
