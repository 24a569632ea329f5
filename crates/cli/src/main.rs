//! Baton CLI entry point.
//!
//! Commands:
//! - `run`    - Execute a task with model turns replayed from a script
//! - `tools`  - List the registered tool definitions
//! - `config` - Show, validate, or locate the TOML configuration

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;
mod replay;

#[derive(Parser)]
#[command(
    name = "baton",
    about = "Baton — agent task runtime",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a task against the built-in tool registry
    Run {
        /// The task prompt
        prompt: String,

        /// Completion script: a JSON array of model turns
        #[arg(short, long)]
        script: PathBuf,

        /// Stream filtered events as JSON lines instead of just the answer
        #[arg(long)]
        watch: bool,
    },

    /// List the registered tool definitions
    Tools,

    /// Inspect or validate the configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the merged configuration as TOML
    Show,

    /// Check the config file for errors
    Validate,

    /// Print the config file path
    Path,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Run {
            prompt,
            script,
            watch,
        } => commands::run::run(&prompt, &script, watch).await?,
        Commands::Tools => commands::tools::run().await?,
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config_cmd::show().await?,
            ConfigAction::Validate => commands::config_cmd::validate().await?,
            ConfigAction::Path => commands::config_cmd::path().await?,
        },
    }

    Ok(())
}
