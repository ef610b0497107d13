//! MCP server transports.
//!
//! - stdio: newline-delimited JSON-RPC on stdin/stdout (default). stdout
//!   carries protocol frames exclusively; all logging goes to stderr.
//! - tcp: newline-delimited JSON-RPC over a socket, concurrent clients
//!   bounded by a connection semaphore, line length bounded per config.

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use rainbow_core::McpConfig;

use crate::handlers::Handlers;
use crate::protocol::{error_codes, JsonRpcRequest, JsonRpcResponse};

/// Transport mode for the MCP server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportMode {
    /// Standard input/output, for process-based MCP clients.
    #[default]
    Stdio,
    /// TCP socket, for networked deployments.
    Tcp,
}

pub struct McpServer {
    handlers: Arc<Handlers>,
    config: McpConfig,
}

impl McpServer {
    pub fn new(handlers: Arc<Handlers>, config: McpConfig) -> Self {
        Self { handlers, config }
    }

    /// Run on stdio until stdin closes.
    pub async fn run_stdio(&self) -> anyhow::Result<()> {
        info!("MCP server listening on stdio");
        let mut reader = BufReader::new(tokio::io::stdin());
        let mut stdout = tokio::io::stdout();
        let mut line = String::new();

        loop {
            line.clear();
            let n = reader.read_line(&mut line).await?;
            if n == 0 {
                break;
            }
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            if let Some(response) = process_line(&self.handlers, trimmed) {
                let json = serde_json::to_string(&response)?;
                stdout.write_all(json.as_bytes()).await?;
                stdout.write_all(b"\n").await?;
                stdout.flush().await?;
            }
        }
        info!("stdin closed, shutting down");
        Ok(())
    }

    /// Run on TCP until the process is terminated.
    pub async fn run_tcp(&self) -> anyhow::Result<()> {
        let addr = format!("{}:{}", self.config.bind_address, self.config.tcp_port);
        let listener = TcpListener::bind(&addr).await?;
        info!("MCP server listening on tcp://{addr}");

        let semaphore = Arc::new(Semaphore::new(self.config.max_connections));
        loop {
            let (stream, peer) = listener.accept().await?;
            let Ok(permit) = semaphore.clone().try_acquire_owned() else {
                warn!(%peer, "connection limit reached, refusing client");
                continue;
            };
            debug!(%peer, "client connected");

            let handlers = self.handlers.clone();
            let max_line_bytes = self.config.max_line_bytes;
            tokio::spawn(async move {
                let _permit = permit;
                if let Err(e) = handle_client(handlers, stream, max_line_bytes).await {
                    debug!(%peer, error = %e, "client connection ended with error");
                }
                debug!(%peer, "client disconnected");
            });
        }
    }
}

/// Parse one frame and dispatch it. A parse failure is answered with a
/// JSON-RPC parse error; notifications produce no response.
fn process_line(handlers: &Handlers, line: &str) -> Option<JsonRpcResponse> {
    match serde_json::from_str::<JsonRpcRequest>(line) {
        Ok(request) => handlers.handle(request),
        Err(e) => Some(JsonRpcResponse::error(
            None,
            error_codes::PARSE_ERROR,
            format!("parse error: {e}"),
        )),
    }
}

async fn handle_client(
    handlers: Arc<Handlers>,
    stream: TcpStream,
    max_line_bytes: usize,
) -> anyhow::Result<()> {
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);
    let mut line = String::new();

    loop {
        line.clear();
        // Bound the read so a client cannot grow one frame without limit.
        let n = (&mut reader)
            .take(max_line_bytes as u64 + 1)
            .read_line(&mut line)
            .await?;
        if n == 0 {
            break;
        }
        if line.len() > max_line_bytes {
            let response = JsonRpcResponse::error(
                None,
                error_codes::INVALID_REQUEST,
                format!("request exceeds {max_line_bytes} byte limit"),
            );
            write_response(&mut write_half, &response).await?;
            // The remainder of the oversized frame cannot be resynced.
            break;
        }
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Some(response) = process_line(&handlers, trimmed) {
            write_response(&mut write_half, &response).await?;
        }
    }
    Ok(())
}

async fn write_response(
    writer: &mut (impl AsyncWrite + Unpin),
    response: &JsonRpcResponse,
) -> anyhow::Result<()> {
    let json = serde_json::to_string(response)?;
    writer.write_all(json.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await?;
    Ok(())
}
