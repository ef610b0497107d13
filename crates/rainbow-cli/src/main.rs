//! Rainbow operator CLI.
//!
//! # Commands
//!
//! - `ingest`: load a label set file into the store
//! - `serve`: open the store for queries and run the HTTP transport
//! - `status`: print store metadata for operator inspection
//!
//! Configuration priority: CLI flags > environment (`RAINBOW_...`) >
//! config file > defaults.

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

mod commands;
mod http;

/// Rainbow - labelhash healing service
#[derive(Parser)]
#[command(name = "rainbow")]
#[command(version)]
#[command(about = "Content-addressed reverse lookup for name labels")]
#[command(propagate_version = true)]
struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest a label set file into the store
    Ingest(commands::ingest::IngestArgs),
    /// Serve healing queries over HTTP
    Serve(commands::serve::ServeArgs),
    /// Print store metadata
    Status(commands::status::StatusArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Ingest(args) => commands::ingest::run(args),
        Commands::Serve(args) => commands::serve::run(args).await,
        Commands::Status(args) => commands::status::run(args),
    }
}
