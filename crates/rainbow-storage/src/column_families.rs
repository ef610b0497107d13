//! RocksDB column family definitions.
//!
//! | Name | Purpose | Key format | Optimization |
//! |------|---------|------------|--------------|
//! | labels | Hash index: digest -> label record | labelhash (32 bytes) | Bloom filter, point lookups |
//! | label_sets | Registry: set id -> highest version | set id (utf-8) | Small, cached |
//! | meta | Schema version, ingestion marker, count | string key | No compression |
//!
//! All column families share a single LRU block cache.

use rocksdb::{BlockBasedOptions, Cache, ColumnFamilyDescriptor, Options};

/// Column family name constants.
pub mod cf_names {
    /// Hash index: raw labelhash bytes -> encoded label record.
    pub const LABELS: &str = "labels";

    /// Label-set registry: set id -> encoded registry record.
    pub const LABEL_SETS: &str = "label_sets";

    /// Store metadata: schema version, ingestion marker, label count.
    pub const META: &str = "meta";

    /// All column family names. Opened together; a missing CF on an existing
    /// database is a corruption signal.
    pub const ALL: &[&str] = &[LABELS, LABEL_SETS, META];
}

/// Options for the hash index: pure point lookups on fixed 32-byte keys.
///
/// Bloom filters cut disk reads for the common miss case (a digest that was
/// never healed); the shared cache keeps hot blocks resident.
pub fn labels_options(cache: &Cache) -> Options {
    let mut block_opts = BlockBasedOptions::default();
    block_opts.set_block_cache(cache);
    block_opts.set_bloom_filter(10.0, false);
    block_opts.set_cache_index_and_filter_blocks(true);

    let mut opts = Options::default();
    opts.set_block_based_table_factory(&block_opts);
    opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
    opts.create_if_missing(true);

    opts
}

/// Options for the label-set registry: a handful of small records.
pub fn label_sets_options(cache: &Cache) -> Options {
    let mut block_opts = BlockBasedOptions::default();
    block_opts.set_block_cache(cache);
    block_opts.set_cache_index_and_filter_blocks(true);

    let mut opts = Options::default();
    opts.set_block_based_table_factory(&block_opts);
    opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
    opts.create_if_missing(true);

    opts
}

/// Options for store metadata: a few scalar records, rarely read after open.
/// Compression overhead is not worth it at this size.
pub fn meta_options() -> Options {
    let mut opts = Options::default();
    opts.set_compression_type(rocksdb::DBCompressionType::None);
    opts.create_if_missing(true);

    opts
}

/// Column family descriptors for opening the database.
pub fn descriptors(cache: &Cache) -> Vec<ColumnFamilyDescriptor> {
    vec![
        ColumnFamilyDescriptor::new(cf_names::LABELS, labels_options(cache)),
        ColumnFamilyDescriptor::new(cf_names::LABEL_SETS, label_sets_options(cache)),
        ColumnFamilyDescriptor::new(cf_names::META, meta_options()),
    ]
}
