use anyhow::Context;
use clap::{Parser, Subcommand};
use docsmith_core::ConfigManager;
use docsmith_shared::{LogFormat, LoggingConfig};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::config::ConfigCommand;

#[derive(Parser)]
#[command(name = "docsmith")]
#[command(version, about = "Docsmith - documentation generation and quality scoring")]
struct Cli {
    /// Configuration file; discovered automatically when omitted
    #[arg(long, global = true, env = "DOCSMITH_CONFIG")]
    config: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG is set
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze JavaScript and TypeScript sources
    Analyze(commands::analyze::AnalyzeArgs),

    /// Score a markdown document
    Score(commands::score::ScoreArgs),

    /// Generate documentation for a source file with the configured LLM
    Generate(commands::generate::GenerateArgs),

    /// Inspect or create the configuration file
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let loaded = ConfigManager::load(cli.config.as_deref());
    let logging = match &loaded {
        Ok(manager) => manager.get_config().await.logging,
        Err(_) => LoggingConfig::default(),
    };
    init_logging(&logging, cli.verbose)?;

    if let Commands::Config(ConfigCommand::Init { path, force }) = cli.command {
        return commands::config::init(path, force);
    }

    let manager = loaded.context("failed to load configuration")?;
    let config = manager.get_config().await;

    match cli.command {
        Commands::Analyze(args) => commands::analyze::run(args, &config).await,
        Commands::Score(args) => commands::score::run(args, &config).await,
        Commands::Generate(args) => commands::generate::run(args, &config).await,
        Commands::Config(command) => commands::config::run(command, &manager).await,
    }
}

/// Install the global subscriber. Logs go to stderr so stdout stays parseable.
fn init_logging(logging: &LoggingConfig, verbose: bool) -> anyhow::Result<()> {
    let fallback = if verbose { "debug" } else { logging.level.as_str() };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(fallback))
        .context("invalid log filter")?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    let installed = match logging.format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Pretty => builder.try_init(),
    };
    installed.map_err(|e| anyhow::anyhow!("failed to initialize logging: {e}"))
}
