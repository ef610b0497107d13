//! Batch ingestion pipeline.
//!
//! Consumes an ordered stream of (labelhash, label) pairs tagged with a label
//! set id and target version, and populates the hash index, registry, and
//! metadata store. The pipeline is the only writer the store ever sees.
//!
//! # Crash atomicity
//!
//! The ingestion-complete marker is cleared before the first write and set
//! again only in the final commit batch, after the hash index has been
//! flushed. A crash at any point in between leaves the marker unset, and
//! [`RainbowDb::open_for_queries`] refuses to serve until ingestion is re-run
//! to completion. No query path can ever observe a half-applied batch.
//!
//! # Conflict policy
//!
//! First writer wins. A pair whose hash is already healed with the same label
//! is an idempotent duplicate; with a different label it is a conflicting
//! preimage, logged and counted for operator visibility, skipped, and never
//! surfaced to query-time callers.

use std::collections::HashMap;

use rocksdb::WriteBatch;
use tracing::{info, warn};

use rainbow_core::{LabelHash, LabelRecord, LabelSetId, LabelSetRecord, RainbowError, RainbowResult};

use crate::column_families::cf_names;
use crate::db::RainbowDb;
use crate::schema::{
    encode_label_record, encode_label_set_record, encode_u64, INGESTION_COMPLETE_KEY,
    LABEL_COUNT_KEY,
};

/// Pairs per write batch. Bounds memory while keeping batches large enough
/// to amortize write overhead on multi-million-label corpora.
const CHUNK_SIZE: usize = 10_000;

/// Outcome summary of one ingestion batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestStats {
    /// Hashes newly healed by this batch.
    pub healed: u64,
    /// Pairs whose hash was already healed with the same label.
    pub duplicates: u64,
    /// Pairs whose hash was already healed with a different label (skipped).
    pub conflicts: u64,
}

impl IngestStats {
    /// Total pairs processed.
    pub fn total(&self) -> u64 {
        self.healed + self.duplicates + self.conflicts
    }
}

/// Ingest one label set batch into the store.
///
/// The version is validated against the registry up front: a version below
/// the recorded highest fails fast with [`RainbowError::NonMonotonicVersion`];
/// re-ingesting the recorded highest version is an idempotent no-op that
/// leaves the store untouched.
///
/// # Errors
///
/// - [`RainbowError::NonMonotonicVersion`] on a version regression
/// - [`RainbowError::Storage`] on any RocksDB failure; the completion marker
///   is left unset in that case, exactly as after a crash
pub fn ingest_label_set(
    db: &RainbowDb,
    label_set_id: &LabelSetId,
    version: u32,
    pairs: impl IntoIterator<Item = (LabelHash, String)>,
) -> RainbowResult<IngestStats> {
    match db.highest_version(label_set_id)? {
        Some(current) if version < current => {
            return Err(RainbowError::NonMonotonicVersion {
                label_set_id: label_set_id.as_str().to_string(),
                requested: version,
                current,
            });
        }
        Some(current) if version == current => {
            info!(
                label_set = %label_set_id,
                version,
                "label set version already ingested; nothing to do"
            );
            return Ok(IngestStats::default());
        }
        _ => {}
    }

    info!(label_set = %label_set_id, version, "ingestion started");

    // From here until the final commit the store must not be servable.
    db.clear_ingestion_complete()?;

    let mut stats = IngestStats::default();
    // Pairs accepted but not yet committed. Checked before the index so the
    // first occurrence wins within a chunk as well as across chunks.
    let mut pending: HashMap<LabelHash, String> = HashMap::with_capacity(CHUNK_SIZE);

    for (hash, label) in pairs {
        let existing = match pending.get(&hash) {
            Some(pending_label) => Some(pending_label.as_str().to_string()),
            None => db.get_label(&hash)?.map(|record| record.label),
        };

        match existing {
            None => {
                pending.insert(hash, label);
                stats.healed += 1;
            }
            Some(existing_label) if existing_label == label => {
                stats.duplicates += 1;
            }
            Some(existing_label) => {
                warn!(
                    labelhash = %hash,
                    label_set = %label_set_id,
                    existing = %existing_label,
                    rejected = %label,
                    "conflicting preimage; keeping first-accepted label"
                );
                stats.conflicts += 1;
            }
        }

        if pending.len() >= CHUNK_SIZE {
            commit_chunk(db, label_set_id, version, &mut pending)?;
        }
    }
    commit_chunk(db, label_set_id, version, &mut pending)?;

    // Make the hash index durable before the marker can flip.
    db.flush_all()?;

    // The counter is recomputed from the index rather than incremented, so a
    // batch retried after a crash still commits an exact total.
    let count = db.count_labels_exact()?;

    // Final atomic commit: registry record, counter, completion marker.
    let mut batch = WriteBatch::default();
    let label_sets_cf = db.get_cf(cf_names::LABEL_SETS)?;
    let meta_cf = db.get_cf(cf_names::META)?;
    batch.put_cf(
        label_sets_cf,
        label_set_id.as_str().as_bytes(),
        encode_label_set_record(&LabelSetRecord {
            highest_version: version,
        })?,
    );
    batch.put_cf(meta_cf, LABEL_COUNT_KEY, encode_u64(count));
    batch.put_cf(meta_cf, INGESTION_COMPLETE_KEY, [1u8]);
    db.write_batch(batch)?;
    db.flush_all()?;

    info!(
        label_set = %label_set_id,
        version,
        healed = stats.healed,
        duplicates = stats.duplicates,
        conflicts = stats.conflicts,
        total_labels = count,
        "ingestion complete"
    );
    Ok(stats)
}

/// Write all pending pairs as one batch and clear the buffer.
fn commit_chunk(
    db: &RainbowDb,
    label_set_id: &LabelSetId,
    version: u32,
    pending: &mut HashMap<LabelHash, String>,
) -> RainbowResult<()> {
    if pending.is_empty() {
        return Ok(());
    }
    let labels_cf = db.get_cf(cf_names::LABELS)?;
    let mut batch = WriteBatch::default();
    for (hash, label) in pending.drain() {
        let record = LabelRecord {
            label,
            label_set_id: label_set_id.as_str().to_string(),
            label_set_version: version,
        };
        batch.put_cf(labels_cf, hash.as_bytes(), encode_label_record(&record)?);
    }
    db.write_batch(batch)?;
    Ok(())
}
