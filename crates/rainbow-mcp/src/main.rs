//! Rainbow MCP server.
//!
//! JSON-RPC 2.0 server exposing labelhash healing as MCP tools.
//!
//! # Usage
//!
//! ```bash
//! # stdio transport (default)
//! rainbow-mcp --data-dir ./data/db
//!
//! # TCP transport
//! rainbow-mcp --data-dir ./data/db --transport tcp --port 3224
//! ```
//!
//! Priority: CLI arguments > environment (`RAINBOW_...`) > config file >
//! defaults. Arguments are parsed by hand to keep the binary small; logging
//! goes to stderr only, because stdout belongs to the protocol.

mod handlers;
mod protocol;
mod server;
mod tools;

use std::env;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use rainbow_core::Config;
use rainbow_service::QueryService;
use rainbow_storage::RainbowDb;

use handlers::Handlers;
use server::{McpServer, TransportMode};

struct CliArgs {
    config_path: Option<PathBuf>,
    data_dir: Option<String>,
    transport: Option<String>,
    port: Option<u16>,
    bind: Option<String>,
    help: bool,
}

impl CliArgs {
    fn parse() -> Self {
        let args: Vec<String> = env::args().collect();
        let mut cli = CliArgs {
            config_path: None,
            data_dir: None,
            transport: None,
            port: None,
            bind: None,
            help: false,
        };

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--help" | "-h" => cli.help = true,
                "--config" => {
                    i += 1;
                    if i < args.len() {
                        cli.config_path = Some(PathBuf::from(&args[i]));
                    }
                }
                "--data-dir" => {
                    i += 1;
                    if i < args.len() {
                        cli.data_dir = Some(args[i].clone());
                    }
                }
                "--transport" => {
                    i += 1;
                    if i < args.len() {
                        cli.transport = Some(args[i].clone());
                    }
                }
                "--port" => {
                    i += 1;
                    if i < args.len() {
                        if let Ok(port) = args[i].parse::<u16>() {
                            cli.port = Some(port);
                        }
                    }
                }
                "--bind" => {
                    i += 1;
                    if i < args.len() {
                        cli.bind = Some(args[i].clone());
                    }
                }
                _ => {} // ignore unknown arguments
            }
            i += 1;
        }

        cli
    }
}

fn print_help() {
    eprintln!(
        r#"Rainbow MCP Server

USAGE:
    rainbow-mcp [OPTIONS]

OPTIONS:
    --config <PATH>      Path to a TOML configuration file
    --data-dir <PATH>    Store directory (must hold a completed ingestion)
    --transport <MODE>   Transport mode: stdio (default) or tcp
    --port <PORT>        TCP port (only used with --transport tcp)
    --bind <ADDRESS>     TCP bind address (default: 127.0.0.1)
    --help, -h           Show this help message

ENVIRONMENT:
    RAINBOW_STORAGE__DATA_DIR   Store directory
    RAINBOW_MCP__TRANSPORT      Transport mode (stdio|tcp)
    RUST_LOG                    Log level (error, warn, info, debug, trace)

TOOLS:
    heal      Heal a labelhash to its original label text
    count     Total count of healable labels
    version   Server and database schema version info
"#
    );
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = CliArgs::parse();
    if cli.help {
        print_help();
        return Ok(());
    }

    // stdout is reserved for JSON-RPC frames; log to stderr, quiet by default.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("error"));
    fmt()
        .with_writer(io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let mut config = match &cli.config_path {
        Some(path) => Config::from_file(path)?,
        None => Config::load()?,
    };
    if let Some(data_dir) = cli.data_dir {
        config.storage.data_dir = data_dir;
    }
    if let Some(transport) = cli.transport {
        config.mcp.transport = transport;
    }
    if let Some(port) = cli.port {
        config.mcp.tcp_port = port;
    }
    if let Some(bind) = cli.bind {
        config.mcp.bind_address = bind;
    }
    config.validate()?;

    let transport = match config.mcp.transport.as_str() {
        "tcp" => TransportMode::Tcp,
        _ => TransportMode::Stdio,
    };

    // Startup gates run here, before any transport accepts a request: an
    // incompatible schema or an incomplete ingestion is fatal.
    let db = RainbowDb::open_for_queries(&config.storage.data_dir, &config.storage)?;
    let service = Arc::new(QueryService::new(Arc::new(db)));
    let server = McpServer::new(Arc::new(Handlers::new(service)), config.mcp.clone());

    info!(?transport, "rainbow MCP server starting");
    match transport {
        TransportMode::Stdio => server.run_stdio().await?,
        TransportMode::Tcp => server.run_tcp().await?,
    }

    info!("MCP server shutdown complete");
    Ok(())
}
