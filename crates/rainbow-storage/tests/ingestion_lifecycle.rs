//! Integration tests for the ingestion lifecycle against real RocksDB
//! instances: startup gates, batch atomicity, idempotence, version
//! monotonicity, and the first-writer-wins conflict policy.

use rainbow_core::{LabelHash, LabelSetId, RainbowError, StorageConfig};
use rainbow_storage::{ingest_label_set, RainbowDb, DB_SCHEMA_VERSION};
use tempfile::TempDir;

fn test_config() -> StorageConfig {
    StorageConfig {
        data_dir: String::new(), // unused; paths are passed explicitly
        block_cache_mb: 8,
        max_open_files: 128,
    }
}

fn pair(label: &str) -> (LabelHash, String) {
    (LabelHash::from_label(label), label.to_string())
}

#[test]
fn fresh_store_has_schema_and_unset_marker() {
    let tmp = TempDir::new().expect("tempdir");
    let db = RainbowDb::open(tmp.path(), &test_config()).expect("open failed");

    assert_eq!(db.schema_version().unwrap(), DB_SCHEMA_VERSION);
    assert!(!db.is_ingestion_complete().unwrap());
    assert_eq!(db.label_count().unwrap(), 0);
    db.health_check().expect("all column families accessible");
}

#[test]
fn serving_refuses_fresh_store() {
    let tmp = TempDir::new().expect("tempdir");
    // Create the store but never ingest.
    drop(RainbowDb::open(tmp.path(), &test_config()).expect("open failed"));

    let err = RainbowDb::open_for_queries(tmp.path(), &test_config()).unwrap_err();
    assert!(matches!(err, RainbowError::IncompleteIngestion));
}

#[test]
fn ingest_then_serve_roundtrip() {
    let tmp = TempDir::new().expect("tempdir");
    let set = LabelSetId::new("demo").unwrap();
    {
        let db = RainbowDb::open(tmp.path(), &test_config()).expect("open failed");
        let stats = ingest_label_set(
            &db,
            &set,
            1,
            vec![pair("vitalik"), pair("alice"), pair("bob")],
        )
        .expect("ingest failed");
        assert_eq!(stats.healed, 3);
        assert_eq!(stats.duplicates, 0);
        assert_eq!(stats.conflicts, 0);
    }

    // Reopen for serving: gates pass, data survived the close.
    let db = RainbowDb::open_for_queries(tmp.path(), &test_config()).expect("serve open failed");
    assert_eq!(db.label_count().unwrap(), 3);
    assert_eq!(db.highest_version(&set).unwrap(), Some(1));

    let record = db
        .get_label(&LabelHash::from_label("vitalik"))
        .unwrap()
        .expect("hash should be healed");
    assert_eq!(record.label, "vitalik");
    assert_eq!(record.label_set_id, "demo");
    assert_eq!(record.label_set_version, 1);

    assert!(db
        .get_label(&LabelHash::from_label("never-ingested"))
        .unwrap()
        .is_none());
}

#[test]
fn double_ingest_is_idempotent() {
    let tmp = TempDir::new().expect("tempdir");
    let db = RainbowDb::open(tmp.path(), &test_config()).expect("open failed");
    let set = LabelSetId::new("demo").unwrap();
    let batch = || vec![pair("one"), pair("two")];

    let first = ingest_label_set(&db, &set, 1, batch()).unwrap();
    assert_eq!(first.healed, 2);

    // Same (set, version, pairs) again: no-op, same contents, same version.
    let second = ingest_label_set(&db, &set, 1, batch()).unwrap();
    assert_eq!(second.healed, 0);
    assert_eq!(second.total(), 0);
    assert_eq!(db.label_count().unwrap(), 2);
    assert_eq!(db.highest_version(&set).unwrap(), Some(1));
    assert!(db.is_ingestion_complete().unwrap());
}

#[test]
fn version_regression_is_rejected() {
    let tmp = TempDir::new().expect("tempdir");
    let db = RainbowDb::open(tmp.path(), &test_config()).expect("open failed");
    let set = LabelSetId::new("demo").unwrap();

    db.record_version(&set, 4).unwrap();
    let err = db.record_version(&set, 3).unwrap_err();
    assert!(matches!(
        err,
        RainbowError::NonMonotonicVersion {
            requested: 3,
            current: 4,
            ..
        }
    ));
    // Registry is unchanged after the rejected write.
    assert_eq!(db.highest_version(&set).unwrap(), Some(4));

    // Equal version: idempotent no-op, not an error.
    db.record_version(&set, 4).unwrap();
    assert_eq!(db.highest_version(&set).unwrap(), Some(4));

    // Strictly greater advances.
    db.record_version(&set, 5).unwrap();
    assert_eq!(db.highest_version(&set).unwrap(), Some(5));
}

#[test]
fn ingest_version_regression_fails_fast() {
    let tmp = TempDir::new().expect("tempdir");
    let db = RainbowDb::open(tmp.path(), &test_config()).expect("open failed");
    let set = LabelSetId::new("demo").unwrap();

    ingest_label_set(&db, &set, 2, vec![pair("one")]).unwrap();
    let err = ingest_label_set(&db, &set, 1, vec![pair("two")]).unwrap_err();
    assert!(matches!(err, RainbowError::NonMonotonicVersion { .. }));

    // The rejected batch wrote nothing and the store is still servable.
    assert!(db.get_label(&LabelHash::from_label("two")).unwrap().is_none());
    assert!(db.is_ingestion_complete().unwrap());
}

#[test]
fn conflicting_preimage_keeps_first_writer() {
    let tmp = TempDir::new().expect("tempdir");
    let db = RainbowDb::open(tmp.path(), &test_config()).expect("open failed");
    let set_a = LabelSetId::new("set-a").unwrap();
    let set_b = LabelSetId::new("set-b").unwrap();
    let hash = LabelHash::from_label("alpha");

    ingest_label_set(&db, &set_a, 1, vec![(hash, "alpha".to_string())]).unwrap();

    // A second source claims a different preimage for the same hash.
    let stats = ingest_label_set(&db, &set_b, 1, vec![(hash, "not-alpha".to_string())]).unwrap();
    assert_eq!(stats.conflicts, 1);
    assert_eq!(stats.healed, 0);

    let record = db.get_label(&hash).unwrap().expect("hash stays healed");
    assert_eq!(record.label, "alpha");
    assert_eq!(record.label_set_id, "set-a");
    assert_eq!(db.label_count().unwrap(), 1);
}

#[test]
fn conflicts_within_one_batch_keep_first_occurrence() {
    let tmp = TempDir::new().expect("tempdir");
    let db = RainbowDb::open(tmp.path(), &test_config()).expect("open failed");
    let set = LabelSetId::new("demo").unwrap();
    let hash = LabelHash::from_label("first");

    let stats = ingest_label_set(
        &db,
        &set,
        1,
        vec![
            (hash, "first".to_string()),
            (hash, "first".to_string()),  // duplicate
            (hash, "second".to_string()), // conflicting preimage
        ],
    )
    .unwrap();
    assert_eq!(stats.healed, 1);
    assert_eq!(stats.duplicates, 1);
    assert_eq!(stats.conflicts, 1);
    assert_eq!(db.get_label(&hash).unwrap().unwrap().label, "first");
}

#[test]
fn count_is_per_hash_not_per_set() {
    let tmp = TempDir::new().expect("tempdir");
    let db = RainbowDb::open(tmp.path(), &test_config()).expect("open failed");
    let set_a = LabelSetId::new("set-a").unwrap();
    let set_b = LabelSetId::new("set-b").unwrap();

    ingest_label_set(&db, &set_a, 1, vec![pair("one"), pair("shared")]).unwrap();
    // Second set re-contributes "shared" with the identical label.
    let stats = ingest_label_set(&db, &set_b, 1, vec![pair("shared"), pair("three")]).unwrap();
    assert_eq!(stats.duplicates, 1);
    assert_eq!(stats.healed, 1);

    // "shared" counts once even though two sets contributed it.
    assert_eq!(db.label_count().unwrap(), 3);

    let mut sets = db.list_label_sets().unwrap();
    sets.sort();
    assert_eq!(
        sets,
        vec![("set-a".to_string(), 1), ("set-b".to_string(), 1)]
    );
}

#[test]
fn large_batch_spans_multiple_chunks() {
    let tmp = TempDir::new().expect("tempdir");
    let db = RainbowDb::open(tmp.path(), &test_config()).expect("open failed");
    let set = LabelSetId::new("bulk").unwrap();

    // Larger than one 10k chunk, so the chunked write path is exercised.
    let pairs: Vec<_> = (0..25_000).map(|i| pair(&format!("label-{i}"))).collect();
    let stats = ingest_label_set(&db, &set, 1, pairs).unwrap();
    assert_eq!(stats.healed, 25_000);
    assert_eq!(db.label_count().unwrap(), 25_000);

    let record = db
        .get_label(&LabelHash::from_label("label-24999"))
        .unwrap()
        .expect("last label healed");
    assert_eq!(record.label, "label-24999");
}

#[test]
fn crashed_ingestion_blocks_serving_until_rerun() {
    let tmp = TempDir::new().expect("tempdir");
    let set = LabelSetId::new("demo").unwrap();
    {
        let db = RainbowDb::open(tmp.path(), &test_config()).expect("open failed");
        ingest_label_set(&db, &set, 1, vec![pair("one")]).unwrap();
    }

    // Simulate a crash mid-batch: the marker was cleared but the final
    // commit never happened.
    clear_marker_raw(tmp.path());

    let err = RainbowDb::open_for_queries(tmp.path(), &test_config()).unwrap_err();
    assert!(matches!(err, RainbowError::IncompleteIngestion));

    // Re-running ingestion to completion restores servability, with the
    // already-present pairs folding in as duplicates.
    let db = RainbowDb::open(tmp.path(), &test_config()).expect("open failed");
    let stats = ingest_label_set(&db, &set, 2, vec![pair("one"), pair("two")]).unwrap();
    assert_eq!(stats.duplicates, 1);
    assert_eq!(stats.healed, 1);
    drop(db);

    let db = RainbowDb::open_for_queries(tmp.path(), &test_config()).expect("serve open failed");
    assert_eq!(db.label_count().unwrap(), 2);
}

#[test]
fn schema_mismatch_fails_before_any_query() {
    let tmp = TempDir::new().expect("tempdir");
    drop(RainbowDb::open(tmp.path(), &test_config()).expect("open failed"));

    // Rewrite the persisted schema version to something this build does not
    // understand.
    overwrite_schema_version_raw(tmp.path(), DB_SCHEMA_VERSION + 1);

    let err = RainbowDb::open(tmp.path(), &test_config()).unwrap_err();
    match err {
        RainbowError::SchemaVersionMismatch { expected, found } => {
            assert_eq!(expected, DB_SCHEMA_VERSION);
            assert_eq!(found, DB_SCHEMA_VERSION + 1);
        }
        other => panic!("expected SchemaVersionMismatch, got {other:?}"),
    }
}

// Raw RocksDB manipulation to simulate crash states and foreign schemas.

fn open_raw(path: &std::path::Path) -> rocksdb::DB {
    let mut opts = rocksdb::Options::default();
    opts.create_if_missing(false);
    rocksdb::DB::open_cf(&opts, path, ["labels", "label_sets", "meta"]).expect("raw open failed")
}

fn clear_marker_raw(path: &std::path::Path) {
    let db = open_raw(path);
    let meta = db.cf_handle("meta").expect("meta cf");
    db.put_cf(meta, b"ingestion_complete", [0u8]).expect("raw put");
}

fn overwrite_schema_version_raw(path: &std::path::Path, version: u32) {
    let db = open_raw(path);
    let meta = db.cf_handle("meta").expect("meta cf");
    db.put_cf(meta, b"schema_version", version.to_be_bytes())
        .expect("raw put");
}
