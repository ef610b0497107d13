//! Process configuration.
//!
//! Configuration is built once at startup and passed into the components that
//! need it; there is no process-wide mutable singleton. Sources are layered:
//! TOML file (optional) then environment variables with a `RAINBOW` prefix
//! (`RAINBOW_STORAGE__DATA_DIR=...`), then CLI flag overrides applied by the
//! binaries before `validate()`.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{RainbowError, RainbowResult};

/// Main configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub mcp: McpConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// RocksDB store settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Directory holding the on-disk store.
    pub data_dir: String,
    /// Shared LRU block cache size in megabytes.
    pub block_cache_mb: usize,
    /// Maximum open files handed to RocksDB.
    pub max_open_files: i32,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: "./data/db".to_string(),
            block_cache_mb: 64,
            max_open_files: 1000,
        }
    }
}

/// HTTP transport settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1".to_string(),
            port: 3223,
        }
    }
}

/// MCP transport settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct McpConfig {
    /// Transport mode: "stdio" or "tcp".
    pub transport: String,
    pub bind_address: String,
    pub tcp_port: u16,
    /// Maximum concurrent TCP clients.
    pub max_connections: usize,
    /// Maximum accepted length of one JSON-RPC line in bytes.
    pub max_line_bytes: usize,
}

impl Default for McpConfig {
    fn default() -> Self {
        Self {
            transport: "stdio".to_string(),
            bind_address: "127.0.0.1".to_string(),
            tcp_port: 3224,
            max_connections: 32,
            max_line_bytes: 1024 * 1024,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Default tracing filter when `RUST_LOG` is unset.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from layered sources: `config/default.toml` if
    /// present, then environment variables with the `RAINBOW` prefix
    /// (`RAINBOW_STORAGE__DATA_DIR=...`).
    pub fn load() -> RainbowResult<Self> {
        let builder = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::Environment::with_prefix("RAINBOW").separator("__"));

        let config: Config = builder
            .build()
            .map_err(|e| RainbowError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| RainbowError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> RainbowResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            RainbowError::Config(format!("failed to read config file {}: {}", path.display(), e))
        })?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| RainbowError::Config(format!("failed to parse config file: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values. Called after every load and after CLI
    /// overrides are applied, so invalid values fail fast at startup.
    pub fn validate(&self) -> RainbowResult<()> {
        if self.storage.data_dir.is_empty() {
            return Err(RainbowError::Config(
                "storage.data_dir must not be empty".into(),
            ));
        }
        if self.storage.block_cache_mb == 0 {
            return Err(RainbowError::Config(
                "storage.block_cache_mb must be greater than 0".into(),
            ));
        }
        if self.mcp.transport != "stdio" && self.mcp.transport != "tcp" {
            return Err(RainbowError::Config(format!(
                "mcp.transport must be 'stdio' or 'tcp', got '{}'",
                self.mcp.transport
            )));
        }
        if self.mcp.max_connections == 0 {
            return Err(RainbowError::Config(
                "mcp.max_connections must be greater than 0".into(),
            ));
        }
        if self.mcp.max_line_bytes == 0 {
            return Err(RainbowError::Config(
                "mcp.max_line_bytes must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}
