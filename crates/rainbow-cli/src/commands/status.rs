//! `rainbow status`: print store metadata.
//!
//! Works on incomplete stores too (it opens without the serving gate), so an
//! operator can inspect the aftermath of a crashed ingestion.

use std::path::PathBuf;

use clap::Args;

use rainbow_storage::RainbowDb;

#[derive(Args)]
pub struct StatusArgs {
    /// Store directory (overrides config)
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Path to a TOML config file
    #[arg(long)]
    pub config: Option<PathBuf>,
}

pub fn run(args: StatusArgs) -> anyhow::Result<()> {
    let config = super::load_config(args.config.as_deref(), args.data_dir.as_ref())?;
    let db = RainbowDb::open(&config.storage.data_dir, &config.storage)?;

    println!("store:              {}", db.path());
    println!("schema version:     {}", db.schema_version()?);
    println!("ingestion complete: {}", db.is_ingestion_complete()?);
    println!("label count:        {}", db.label_count()?);

    let sets = db.list_label_sets()?;
    if sets.is_empty() {
        println!("label sets:         (none)");
    } else {
        println!("label sets:");
        for (id, version) in sets {
            println!("  {id} (highest version {version})");
        }
    }
    Ok(())
}
