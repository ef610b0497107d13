//! `rainbow ingest`: load a label set file into the store.
//!
//! The importer reads plaintext labels, one per line, and computes each
//! label's keccak256 digest itself; the file never carries hashes. Empty
//! lines are skipped. This is the external-importer adapter in front of the
//! ingestion pipeline; the pipeline itself is format-agnostic.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;

use clap::Args;
use tracing::info;

use rainbow_core::{LabelHash, LabelSetId};
use rainbow_storage::{ingest_label_set, RainbowDb};

#[derive(Args)]
pub struct IngestArgs {
    /// Label file: one plaintext label per line
    pub file: PathBuf,

    /// Label set identifier (lowercase letters, digits, hyphens)
    #[arg(long)]
    pub label_set_id: String,

    /// Label set version to record for this batch
    #[arg(long)]
    pub label_set_version: u32,

    /// Store directory (overrides config)
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Path to a TOML config file
    #[arg(long)]
    pub config: Option<PathBuf>,
}

pub fn run(args: IngestArgs) -> anyhow::Result<()> {
    let config = super::load_config(args.config.as_deref(), args.data_dir.as_ref())?;
    let label_set_id = LabelSetId::new(args.label_set_id)?;

    let pairs = read_label_file(&args.file)?;
    info!(
        file = %args.file.display(),
        labels = pairs.len(),
        "label file loaded"
    );

    let db = RainbowDb::open(&config.storage.data_dir, &config.storage)?;
    let stats = ingest_label_set(&db, &label_set_id, args.label_set_version, pairs)?;

    info!(
        healed = stats.healed,
        duplicates = stats.duplicates,
        conflicts = stats.conflicts,
        "ingestion finished"
    );
    Ok(())
}

/// Read (labelhash, label) pairs from a plaintext label file.
fn read_label_file(path: &PathBuf) -> anyhow::Result<Vec<(LabelHash, String)>> {
    let reader = BufReader::new(File::open(path)?);
    let mut pairs = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let label = line.trim_end_matches('\r');
        if label.is_empty() {
            continue;
        }
        pairs.push((LabelHash::from_label(label), label.to_string()));
    }
    Ok(pairs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn label_file_skips_empty_lines_and_crlf() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("labels.txt");
        let mut file = File::create(&path).expect("create");
        write!(file, "alice\r\n\nbob\n").expect("write");

        let pairs = read_label_file(&path).expect("read");
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].1, "alice");
        assert_eq!(pairs[0].0, LabelHash::from_label("alice"));
        assert_eq!(pairs[1].1, "bob");
    }
}
