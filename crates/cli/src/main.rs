//! KubeSentinel CLI — the main entry point.
//!
//! Commands:
//! - `serve`    — Start the HTTP API gateway
//! - `check`    — Verify config and Ollama connectivity
//! - `analyze`  — Analyze a log file from the command line

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "kubesentinel",
    about = "KubeSentinel — AI-assisted Kubernetes incident analysis",
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
    /// Start the HTTP gateway server
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Verify configuration and Ollama connectivity
    Check,

    /// Analyze a JSON log file and print the proposed action
    Analyze {
        /// Path to a JSON file containing an array of log entries
        #[arg(short, long)]
        file: std::path::PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
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
        Commands::Serve { port } => commands::serve::run(port).await?,
        Commands::Check => commands::check::run().await?,
        Commands::Analyze { file } => commands::analyze::run(&file).await?,
    }

    Ok(())
}
