//! The reverse-lookup store: hash index, metadata store, and label-set
//! registry behind a single RocksDB handle.
//!
//! # Thread safety
//!
//! RocksDB's `DB` is internally thread-safe; after ingestion the store is
//! read-only and a single `Arc<RainbowDb>` is shared across all reader tasks
//! with no additional locking.
//!
//! # Startup gates
//!
//! [`RainbowDb::open`] validates the persisted schema version against
//! [`DB_SCHEMA_VERSION`](crate::schema::DB_SCHEMA_VERSION) before anything
//! else. [`RainbowDb::open_for_queries`] additionally requires the
//! ingestion-complete marker, so a crashed ingestion can never be served.

use std::path::Path;

use rocksdb::{Cache, ColumnFamily, IteratorMode, Options, WriteBatch, DB};
use thiserror::Error;
use tracing::{debug, info};

use rainbow_core::{
    LabelHash, LabelRecord, LabelSetId, LabelSetRecord, RainbowError, RainbowResult, StorageConfig,
};

use crate::column_families::{cf_names, descriptors};
use crate::schema::{
    decode_label_record, decode_label_set_record, decode_u32, decode_u64, encode_label_set_record,
    encode_u32, encode_u64, DB_SCHEMA_VERSION, INGESTION_COMPLETE_KEY, LABEL_COUNT_KEY,
    SCHEMA_VERSION_KEY,
};

/// Storage-internal errors. Callers outside this crate see these folded into
/// the opaque [`RainbowError::Storage`] variant.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Database failed to open.
    #[error("failed to open database at '{path}': {message}")]
    OpenFailed { path: String, message: String },

    /// Column family missing from an opened database.
    #[error("column family '{name}' not found")]
    ColumnFamilyNotFound { name: String },

    /// Read operation failed.
    #[error("read failed: {0}")]
    ReadFailed(String),

    /// Write operation failed.
    #[error("write failed: {0}")]
    WriteFailed(String),

    /// Flush operation failed.
    #[error("flush failed: {0}")]
    FlushFailed(String),

    /// Stored bytes violate the schema's fixed layouts.
    #[error("corrupt store: {what}")]
    Corruption { what: String },

    /// Record encoding or decoding failed.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<StorageError> for RainbowError {
    fn from(e: StorageError) -> Self {
        RainbowError::Storage(e.to_string())
    }
}

/// RocksDB-backed reverse-lookup store.
pub struct RainbowDb {
    db: DB,
    /// Shared block cache, kept alive for the DB lifetime.
    #[allow(dead_code)]
    cache: Cache,
    path: String,
}

impl RainbowDb {
    /// Open (or create) the store and validate its schema version.
    ///
    /// On a freshly created database the running code's schema version is
    /// persisted along with an unset ingestion marker and a zero label count.
    /// On an existing database the persisted version must match exactly.
    ///
    /// # Errors
    ///
    /// - [`RainbowError::SchemaVersionMismatch`] on an incompatible store
    /// - [`RainbowError::Storage`] if RocksDB fails to open
    pub fn open<P: AsRef<Path>>(path: P, config: &StorageConfig) -> RainbowResult<Self> {
        let path_str = path.as_ref().to_string_lossy().to_string();

        let cache = Cache::new_lru_cache(config.block_cache_mb * 1024 * 1024);

        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);
        db_opts.set_max_open_files(config.max_open_files);

        let db = DB::open_cf_descriptors(&db_opts, &path_str, descriptors(&cache)).map_err(
            |e| StorageError::OpenFailed {
                path: path_str.clone(),
                message: e.to_string(),
            },
        )?;

        let store = Self {
            db,
            cache,
            path: path_str,
        };
        store.validate_or_init_schema()?;
        Ok(store)
    }

    /// Open the store for query serving.
    ///
    /// # Errors
    ///
    /// Everything [`RainbowDb::open`] returns, plus
    /// [`RainbowError::IncompleteIngestion`] if the ingestion-complete marker
    /// is unset. A server must not accept a single query in that state.
    pub fn open_for_queries<P: AsRef<Path>>(
        path: P,
        config: &StorageConfig,
    ) -> RainbowResult<Self> {
        let store = Self::open(path, config)?;
        if !store.is_ingestion_complete()? {
            return Err(RainbowError::IncompleteIngestion);
        }
        info!(
            path = %store.path,
            labels = store.label_count()?,
            "store opened for queries"
        );
        Ok(store)
    }

    /// Schema gate: compare the persisted version, or persist ours on a
    /// fresh database. The schema record is the first thing validated on
    /// open; nothing else is read before this passes.
    fn validate_or_init_schema(&self) -> RainbowResult<()> {
        let meta = self.get_cf(cf_names::META)?;
        let stored = self
            .db
            .get_cf(meta, SCHEMA_VERSION_KEY)
            .map_err(|e| StorageError::ReadFailed(e.to_string()))?;

        match stored {
            Some(bytes) => {
                let found = decode_u32(&bytes)?;
                if found != DB_SCHEMA_VERSION {
                    return Err(RainbowError::SchemaVersionMismatch {
                        expected: DB_SCHEMA_VERSION,
                        found,
                    });
                }
                debug!(version = found, "schema version validated");
                Ok(())
            }
            None => {
                // Fresh database: persist schema version, unset marker, zero count
                // in one atomic batch.
                let mut batch = WriteBatch::default();
                batch.put_cf(meta, SCHEMA_VERSION_KEY, encode_u32(DB_SCHEMA_VERSION));
                batch.put_cf(meta, INGESTION_COMPLETE_KEY, [0u8]);
                batch.put_cf(meta, LABEL_COUNT_KEY, encode_u64(0));
                self.db
                    .write(batch)
                    .map_err(|e| StorageError::WriteFailed(e.to_string()))?;
                info!(version = DB_SCHEMA_VERSION, path = %self.path, "created new store");
                Ok(())
            }
        }
    }

    /// Look up a column family handle by name.
    pub(crate) fn get_cf(&self, name: &str) -> Result<&ColumnFamily, StorageError> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StorageError::ColumnFamilyNotFound {
                name: name.to_string(),
            })
    }

    /// The filesystem path of the store.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Verify all column families are accessible.
    pub fn health_check(&self) -> RainbowResult<()> {
        for cf_name in cf_names::ALL {
            self.get_cf(cf_name)?;
        }
        Ok(())
    }

    // =========================================================================
    // Hash index
    // =========================================================================

    /// Point lookup: digest -> label record. `None` means the hash was never
    /// healed. Read path only; the hash index is immutable outside ingestion.
    pub fn get_label(&self, hash: &LabelHash) -> RainbowResult<Option<LabelRecord>> {
        let cf = self.get_cf(cf_names::LABELS)?;
        let bytes = self
            .db
            .get_cf(cf, hash.as_bytes())
            .map_err(|e| StorageError::ReadFailed(e.to_string()))?;
        match bytes {
            Some(bytes) => Ok(Some(decode_label_record(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Number of distinct healed hashes.
    ///
    /// Reads the counter persisted with each ingestion batch commit; each
    /// hash counts exactly once no matter how many label sets contributed it.
    pub fn label_count(&self) -> RainbowResult<u64> {
        let meta = self.get_cf(cf_names::META)?;
        let bytes = self
            .db
            .get_cf(meta, LABEL_COUNT_KEY)
            .map_err(|e| StorageError::ReadFailed(e.to_string()))?;
        match bytes {
            Some(bytes) => Ok(decode_u64(&bytes)?),
            None => Ok(0),
        }
    }

    /// Exact count of the hash index by full scan. Used by the ingestion
    /// pipeline when persisting the counter, so a batch retried after a crash
    /// still commits a correct total.
    pub(crate) fn count_labels_exact(&self) -> Result<u64, StorageError> {
        let cf = self.get_cf(cf_names::LABELS)?;
        let mut count = 0u64;
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            item.map_err(|e| StorageError::ReadFailed(e.to_string()))?;
            count += 1;
        }
        Ok(count)
    }

    // =========================================================================
    // Metadata store
    // =========================================================================

    /// The persisted schema version.
    pub fn schema_version(&self) -> RainbowResult<u32> {
        let meta = self.get_cf(cf_names::META)?;
        let bytes = self
            .db
            .get_cf(meta, SCHEMA_VERSION_KEY)
            .map_err(|e| StorageError::ReadFailed(e.to_string()))?
            .ok_or_else(|| StorageError::Corruption {
                what: "schema version record missing".to_string(),
            })?;
        Ok(decode_u32(&bytes)?)
    }

    /// Whether the last ingestion ran to completion.
    pub fn is_ingestion_complete(&self) -> RainbowResult<bool> {
        let meta = self.get_cf(cf_names::META)?;
        let bytes = self
            .db
            .get_cf(meta, INGESTION_COMPLETE_KEY)
            .map_err(|e| StorageError::ReadFailed(e.to_string()))?;
        Ok(matches!(bytes.as_deref(), Some([1])))
    }

    /// Clear the ingestion-complete marker. Called at the start of every
    /// ingestion batch so a crash mid-batch leaves the store unservable.
    pub(crate) fn clear_ingestion_complete(&self) -> Result<(), StorageError> {
        let meta = self.get_cf(cf_names::META)?;
        self.db
            .put_cf(meta, INGESTION_COMPLETE_KEY, [0u8])
            .map_err(|e| StorageError::WriteFailed(e.to_string()))
    }

    // =========================================================================
    // Label-set registry
    // =========================================================================

    /// Highest version recorded for a label set, if any.
    pub fn highest_version(&self, id: &LabelSetId) -> RainbowResult<Option<u32>> {
        let cf = self.get_cf(cf_names::LABEL_SETS)?;
        let bytes = self
            .db
            .get_cf(cf, id.as_str().as_bytes())
            .map_err(|e| StorageError::ReadFailed(e.to_string()))?;
        match bytes {
            Some(bytes) => Ok(Some(decode_label_set_record(&bytes)?.highest_version)),
            None => Ok(None),
        }
    }

    /// Record a label set version.
    ///
    /// Versions are append-only: recording below the current highest fails
    /// with [`RainbowError::NonMonotonicVersion`]; re-recording the current
    /// highest is an idempotent no-op.
    pub fn record_version(&self, id: &LabelSetId, version: u32) -> RainbowResult<()> {
        match self.highest_version(id)? {
            Some(current) if version < current => Err(RainbowError::NonMonotonicVersion {
                label_set_id: id.as_str().to_string(),
                requested: version,
                current,
            }),
            Some(current) if version == current => {
                debug!(label_set = %id, version, "version already recorded; no-op");
                Ok(())
            }
            _ => {
                let cf = self.get_cf(cf_names::LABEL_SETS)?;
                let record = LabelSetRecord {
                    highest_version: version,
                };
                self.db
                    .put_cf(cf, id.as_str().as_bytes(), encode_label_set_record(&record)?)
                    .map_err(|e| StorageError::WriteFailed(e.to_string()))?;
                Ok(())
            }
        }
    }

    /// All known label sets with their highest recorded versions, sorted by
    /// set id (RocksDB iterates keys in order).
    pub fn list_label_sets(&self) -> RainbowResult<Vec<(String, u32)>> {
        let cf = self.get_cf(cf_names::LABEL_SETS)?;
        let mut sets = Vec::new();
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (key, value) = item.map_err(|e| StorageError::ReadFailed(e.to_string()))?;
            let id = String::from_utf8(key.to_vec()).map_err(|_| StorageError::Corruption {
                what: "label set id is not valid utf-8".to_string(),
            })?;
            let record = decode_label_set_record(&value)?;
            sets.push((id, record.highest_version));
        }
        Ok(sets)
    }

    // =========================================================================
    // Write plumbing for the ingestion pipeline
    // =========================================================================

    /// Commit a prepared write batch.
    pub(crate) fn write_batch(&self, batch: WriteBatch) -> Result<(), StorageError> {
        self.db
            .write(batch)
            .map_err(|e| StorageError::WriteFailed(e.to_string()))
    }

    /// Flush all column families to disk.
    pub(crate) fn flush_all(&self) -> Result<(), StorageError> {
        for cf_name in cf_names::ALL {
            let cf = self.get_cf(cf_name)?;
            self.db
                .flush_cf(cf)
                .map_err(|e| StorageError::FlushFailed(e.to_string()))?;
        }
        Ok(())
    }
}
