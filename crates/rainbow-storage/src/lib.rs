//! RocksDB-backed storage for the rainbow label-healing service.
//!
//! # Architecture
//! - `column_families`: column family definitions and per-CF RocksDB options
//! - `schema`: schema version, metadata keys, and stored-record encoding
//! - `db`: [`RainbowDb`]: hash index, metadata store, and label-set registry
//!   behind one database handle
//! - `ingest`: the batch ingestion pipeline that populates the store
//!
//! # Lifecycle
//! Writes happen only during ingestion; everything after startup is read-only
//! point lookups, safe to share across any number of reader tasks via
//! `Arc<RainbowDb>`. A server must open the store with
//! [`RainbowDb::open_for_queries`], which enforces the schema-version and
//! ingestion-complete gates before any query is accepted.

pub mod column_families;
pub mod db;
pub mod ingest;
pub mod schema;

pub use column_families::cf_names;
pub use db::{RainbowDb, StorageError};
pub use ingest::{ingest_label_set, IngestStats};
pub use schema::DB_SCHEMA_VERSION;
