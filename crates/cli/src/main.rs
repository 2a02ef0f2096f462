//! Dot CLI
//!
//! Main entry point for the `dot` command-line tool: manage dots, analyze
//! their websites, chat with them and serve the HTTP API.

mod commands;

use clap::{Parser, Subcommand};
use commands::{
    AnalyzeCommand, ChatCommand, PromptsCommand, ServeCommand, StatsCommand, TenantCommand,
};
use dot_core::{config::AppConfig, logging, AppResult};
use std::path::PathBuf;

/// Dot - website chatbots grounded in a per-site knowledge base
#[derive(Parser, Debug)]
#[command(name = "dot")]
#[command(about = "Website chatbots grounded in a per-site knowledge base", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "DOT_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true, env = "DOT_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    /// Generation provider (openai, ollama)
    #[arg(short, long, global = true, env = "DOT_PROVIDER")]
    provider: Option<String>,

    /// Default chat model
    #[arg(short, long, global = true, env = "DOT_MODEL")]
    model: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Register, list and delete dots
    Tenant(TenantCommand),

    /// Analyze a website into a dot's knowledge base
    Analyze(AnalyzeCommand),

    /// Send one chat message to a dot
    Chat(ChatCommand),

    /// Serve the analyze and chat HTTP API
    Serve(ServeCommand),

    /// Show knowledge base statistics for a dot
    Stats(StatsCommand),

    /// List prompt templates and workspace overrides
    Prompts(PromptsCommand),
}

#[tokio::main]
async fn main() -> AppResult<()> {
    let cli = Cli::parse();

    let config = AppConfig::load_from(cli.workspace.clone(), cli.config.clone())?;
    let config = config.with_overrides(
        cli.workspace,
        cli.config,
        cli.provider,
        cli.model,
        cli.log_level,
        cli.verbose,
        cli.no_color,
    );

    logging::init_logging(config.log_level.as_deref(), config.no_color)?;
    config.validate()?;

    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!("Provider: {} ({})", config.llm.provider, config.llm.model);

    let command_name = match &cli.command {
        Commands::Tenant(_) => "tenant",
        Commands::Analyze(_) => "analyze",
        Commands::Chat(_) => "chat",
        Commands::Serve(_) => "serve",
        Commands::Stats(_) => "stats",
        Commands::Prompts(_) => "prompts",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    let result = match cli.command {
        Commands::Tenant(cmd) => cmd.execute(&config).await,
        Commands::Analyze(cmd) => cmd.execute(&config).await,
        Commands::Chat(cmd) => cmd.execute(&config).await,
        Commands::Serve(cmd) => cmd.execute(&config).await,
        Commands::Stats(cmd) => cmd.execute(&config).await,
        Commands::Prompts(cmd) => cmd.execute(&config).await,
    };

    match &result {
        Ok(_) => tracing::debug!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}
