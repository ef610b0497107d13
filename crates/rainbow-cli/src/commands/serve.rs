//! `rainbow serve`: run the HTTP transport.
//!
//! Opens the store for queries first: a schema mismatch or an incomplete
//! ingestion is fatal here, before the listener binds. Once serving, every
//! request is a read over the shared handle.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use tracing::info;

use rainbow_service::QueryService;
use rainbow_storage::RainbowDb;

use crate::http;

#[derive(Args)]
pub struct ServeArgs {
    /// Store directory (overrides config)
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// HTTP port (overrides config)
    #[arg(long)]
    pub port: Option<u16>,

    /// Bind address (overrides config)
    #[arg(long)]
    pub bind: Option<String>,

    /// Path to a TOML config file
    #[arg(long)]
    pub config: Option<PathBuf>,
}

pub async fn run(args: ServeArgs) -> anyhow::Result<()> {
    let mut config = super::load_config(args.config.as_deref(), args.data_dir.as_ref())?;
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(bind) = args.bind {
        config.server.bind_address = bind;
    }

    let db = RainbowDb::open_for_queries(&config.storage.data_dir, &config.storage)?;
    let service = Arc::new(QueryService::new(Arc::new(db)));

    let addr: SocketAddr =
        format!("{}:{}", config.server.bind_address, config.server.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("rainbow server listening on http://{addr}");

    axum::serve(listener, http::router(service))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutdown signal received");
}
