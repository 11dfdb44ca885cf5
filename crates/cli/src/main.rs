//! Amparo CLI entry point.
//!
//! Commands:
//! - `serve`  — Start the HTTP gateway
//! - `doctor` — Diagnose configuration, corpus, and backing services
//! - `ask`    — One-shot query from the terminal

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "amparo",
    about = "Amparo - asistente de consultas de la Defensa Pública de Mendoza",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the configuration file (defaults to ./amparo.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP gateway server
    Serve {
        /// Override the bind host
        #[arg(long)]
        host: Option<String>,

        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Diagnose configuration, knowledge corpus, and backing services
    Doctor,

    /// Send one query and print the structured response as JSON
    Ask {
        /// The question, as a citizen would type it
        message: String,

        /// Pin a fuero instead of letting the classifier choose
        #[arg(short, long)]
        domain: Option<String>,
    },
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
        Commands::Serve { host, port } => {
            commands::serve::run(cli.config.as_deref(), host, port).await?
        }
        Commands::Doctor => commands::doctor::run(cli.config.as_deref()).await?,
        Commands::Ask { message, domain } => {
            commands::ask::run(cli.config.as_deref(), &message, domain).await?
        }
    }

    Ok(())
}
