//! RelayDesk CLI, the main entry point.
//!
//! Commands:
//! - `onboard`: Write the default config and starter knowledge documents
//! - `serve`: Start the chat gateway
//! - `chat`: Chat with a running gateway from the terminal
//! - `ingest`: Build the knowledge document from a CSV export

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

use commands::ingest::MergeMode;

#[derive(Parser)]
#[command(
    name = "relaydesk",
    about = "RelayDesk: knowledge-grounded streaming support chat",
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
    /// Write the default configuration and starter documents
    Onboard,

    /// Start the HTTP gateway
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Chat with a running gateway
    Chat {
        /// Gateway base URL (defaults to the configured host and port)
        #[arg(short, long)]
        url: Option<String>,

        /// Send a single message instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,

        /// Print answers as escaped, linkified HTML
        #[arg(long)]
        html: bool,
    },

    /// Import FAQ entries from a CSV file into the knowledge document
    Ingest {
        /// CSV file with question and answer columns
        csv: PathBuf,

        /// Keep existing entries (append) or discard them first (replace)
        #[arg(short, long, value_enum, default_value_t = MergeMode::Append)]
        mode: MergeMode,

        /// Knowledge document to write
        #[arg(short, long, default_value = "public/kb.json")]
        out: PathBuf,
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
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Onboard => commands::onboard::run().await?,
        Commands::Serve { port } => commands::serve::run(port).await?,
        Commands::Chat { url, message, html } => commands::chat::run(url, message, html).await?,
        Commands::Ingest { csv, mode, out } => commands::ingest::run(&csv, mode, &out).await?,
    }

    Ok(())
}
