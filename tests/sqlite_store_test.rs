//! SQLite read store behaviour across connections
mod common;

use amplicluster::bio::{Read, ReadKey};
use amplicluster::core::config::Config;
use amplicluster::core::Pipeline;
use amplicluster::storage::{columns, AnnotationFilter, ColumnValue, Columns, ReadStore};
use amplicluster::AmpliclusterError;
use common::*;
use pretty_assertions::assert_eq;

fn config() -> Config {
    let mut config = Config::default();
    config.marker.pattern = Some(MARKER.to_string());
    config.batch.batch_size = 2;
    config.batch.silent = true;
    config
}

#[test]
fn test_annotations_persist_across_reopen() {
    let env = TestEnvironment::new();
    {
        let mut store = env.open();
        store.insert_reads(three_read_sample("s1")).unwrap();
        Pipeline::from_config(&config()).unwrap().run(&mut store, None).unwrap();
    }

    let store = env.open();
    let names: Vec<&str> = store.column_names().collect();
    assert_eq!(names, vec!["cluster", "marker_count", "trim_end", "trim_start"]);

    let listed = store.list_columns("s1", &AnnotationFilter::qualifying(100)).unwrap();
    let ids: Vec<&str> = listed.iter().map(|a| a.read.id()).collect();
    assert_eq!(ids, vec!["A", "B", "C"]);
    assert_eq!(listed[0].trimmed(), BODY);
    assert_eq!(
        store.column(&ReadKey::new("s1", "C"), columns::CLUSTER).unwrap(),
        ColumnValue::Integer(2)
    );
}

#[test]
fn test_probabilities_round_trip() {
    let env = TestEnvironment::new();
    let read = Read::from_phred(ReadKey::new("s1", "q"), b"ACGT".to_vec(), b"I?+!");
    {
        let mut store = env.open();
        store.insert_read(read.clone()).unwrap();
    }
    let fetched = env.open().fetch_batch(None, 0, 10).unwrap();
    assert_eq!(fetched, vec![read]);
}

#[test]
fn test_batch_with_unknown_read_writes_nothing() {
    let env = TestEnvironment::new();
    let mut store = env.open();
    store.insert_reads(three_read_sample("s1")).unwrap();

    let mut cells = Columns::new();
    cells.insert(columns::MARKER_COUNT.to_string(), ColumnValue::Integer(7));
    let err = store
        .append_batch(&[
            (ReadKey::new("s1", "A"), cells.clone()),
            (ReadKey::new("s9", "A"), cells),
        ])
        .unwrap_err();

    assert!(matches!(err, AmpliclusterError::NotFound(_)));
    drop(store);
    let store = env.open();
    assert_eq!(store.column_names().count(), 0);
    assert!(store
        .column(&ReadKey::new("s1", "A"), columns::MARKER_COUNT)
        .unwrap()
        .is_null());
}

#[test]
fn test_reserved_and_malformed_column_names() {
    let env = TestEnvironment::new();
    let mut store = env.open();
    store.insert_reads(three_read_sample("s1")).unwrap();

    for name in ["sequence", "read_id", "bad name", "x;y"] {
        let mut cells = Columns::new();
        cells.insert(name.to_string(), ColumnValue::Integer(1));
        let result = store.append_columns(&ReadKey::new("s1", "A"), &cells);
        assert!(matches!(result, Err(AmpliclusterError::InvalidInput(_))), "{}", name);
    }
}

#[test]
fn test_duplicate_reads_are_rejected() {
    let env = TestEnvironment::new();
    let mut store = env.open();
    store.insert_read(marker_read("s1", "A", BODY)).unwrap();
    assert!(store.insert_read(marker_read("s1", "A", BODY)).is_err());
    assert_eq!(store.count(None).unwrap(), 1);
}
