//! medwing CLI — the main entry point.
//!
//! Commands:
//! - `chat`  — Interactive research session with smart mode detection
//! - `ask`   — Answer a single query and exit
//! - `modes` — List the configured routing modes

use clap::{Parser, Subcommand};

mod commands;
mod export;
mod personas;

#[derive(Parser)]
#[command(
    name = "medwing",
    about = "medwing — Aeromedical Evidence Review Assistant",
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
    /// Start an interactive research session
    Chat,

    /// Answer a single query and exit
    Ask {
        /// The question to answer
        query: String,

        /// Force a specific mode instead of detecting one
        #[arg(short, long)]
        mode: Option<String>,
    },

    /// List the configured routing modes
    Modes,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Chat => commands::chat::run().await?,
        Commands::Ask { query, mode } => commands::ask::run(&query, mode.as_deref()).await?,
        Commands::Modes => commands::modes::run()?,
    }

    Ok(())
}
