//! CLI subcommands.

pub mod ingest;
pub mod serve;
pub mod status;

use std::path::{Path, PathBuf};

use rainbow_core::Config;

/// Load configuration from an optional file, then apply the shared
/// `--data-dir` override. Validation runs after overrides so bad flag
/// values fail fast.
pub fn load_config(
    config_path: Option<&Path>,
    data_dir: Option<&PathBuf>,
) -> anyhow::Result<Config> {
    let mut config = match config_path {
        Some(path) => Config::from_file(path)?,
        None => Config::load()?,
    };
    if let Some(dir) = data_dir {
        config.storage.data_dir = dir.to_string_lossy().to_string();
    }
    config.validate()?;
    Ok(config)
}
