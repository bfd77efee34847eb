//! PocketLLM CLI — the main entry point.
//!
//! Commands:
//! - `serve`   — Load the model and start the HTTP server
//! - `ask`     — Run one message through the reply pipeline
//! - `init`    — Write a default config file
//! - `config`  — Show and validate the effective configuration

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "pocketllm",
    about = "PocketLLM — local-LLM chat backend for a mobile assistant",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file to use instead of ~/.pocketllm/config.toml
    #[arg(short, long, global = true, env = "POCKETLLM_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Load the model and start the HTTP server
    Serve {
        /// Override the bind host
        #[arg(long)]
        host: Option<String>,

        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Send a single message through the reply pipeline
    Ask {
        /// The message to send
        #[arg(short, long)]
        message: String,

        /// Earlier messages, oldest first (repeatable)
        #[arg(long = "history")]
        history: Vec<String>,
    },

    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Show and validate the effective configuration
    Config,
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

    let config_path = cli.config.clone();

    match cli.command {
        Commands::Serve { host, port } => commands::serve::run(config_path, host, port).await?,
        Commands::Ask { message, history } => {
            commands::ask::run(config_path, message, history).await?
        }
        Commands::Init { force } => commands::init::run(config_path, force).await?,
        Commands::Config => commands::config_cmd::run(config_path).await?,
    }

    Ok(())
}
