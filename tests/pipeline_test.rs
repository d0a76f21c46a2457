//! End-to-end runs of the annotation and clustering pipeline
mod common;

use amplicluster::bio::{MarkerScanner, MatchParams, QualityTrimmer, ReadKey};
use amplicluster::core::{BatchOrchestrator, IdentityClusterer, Pipeline};
use amplicluster::storage::{columns, ColumnValue, InMemoryReadStore, ReadStore};
use common::*;
use pretty_assertions::assert_eq;
use std::collections::BTreeMap;

fn pipeline(batch_size: usize) -> Pipeline {
    let scanner = MarkerScanner::new(MARKER, MatchParams::default()).unwrap();
    let orchestrator = BatchOrchestrator::new(QualityTrimmer::default(), scanner).with_silent(true);
    Pipeline::new(orchestrator, IdentityClusterer::default(), batch_size)
}

#[test]
fn test_substitution_distances_decide_clusters() {
    let mut store = InMemoryReadStore::from_reads(three_read_sample("s1")).unwrap();
    let report = pipeline(2).run(&mut store, None).unwrap();

    assert_eq!(report.annotation.processed, 3);
    assert_eq!(report.annotation.marker_positive, 3);
    assert_eq!(report.clusters.len(), 1);
    assert_eq!(report.clusters[0].clusters, 2);

    let cluster = |id: &str| store.column(&ReadKey::new("s1", id), columns::CLUSTER).unwrap();
    assert_eq!(cluster("A"), ColumnValue::Integer(1));
    assert_eq!(cluster("B"), ColumnValue::Integer(1));
    assert_eq!(cluster("C"), ColumnValue::Integer(2));

    let key = ReadKey::new("s1", "A");
    assert_eq!(store.column(&key, columns::TRIM_START).unwrap(), ColumnValue::Integer(38));
    assert_eq!(store.column(&key, columns::TRIM_END).unwrap(), ColumnValue::Integer(137));
}

#[test]
fn test_looser_cutoff_merges_clusters() {
    let mut store = InMemoryReadStore::from_reads(three_read_sample("s1")).unwrap();
    pipeline(10).run(&mut store, None).unwrap();

    let loose = IdentityClusterer::new(100, 0.15).unwrap();
    let assignments = loose.cluster(&mut store, "s1").unwrap();
    let expected: BTreeMap<String, u32> =
        [("A", 1), ("B", 1), ("C", 1)].into_iter().map(|(k, v)| (k.to_string(), v)).collect();
    assert_eq!(assignments, expected);
}

#[test]
fn test_fifty_malformed_reads_do_not_abort() {
    let mut reads = three_read_sample("s1");
    reads.extend((0..50).map(|i| malformed_read("s2", &format!("bad{:02}", i))));
    let mut store = InMemoryReadStore::from_reads(reads).unwrap();

    let report = pipeline(50).run(&mut store, None).unwrap();
    assert_eq!(report.annotation.processed, 53);
    assert_eq!(report.annotation.malformed, 50);

    for read in store.fetch_batch(Some("s2"), 0, 100).unwrap() {
        assert_eq!(store.column(&read.key, columns::MARKER_COUNT).unwrap(), ColumnValue::Integer(0));
        assert!(store.column(&read.key, columns::TRIM_START).unwrap().is_null());
        assert!(store.column(&read.key, columns::CLUSTER).unwrap().is_null());
    }
    let s2 = report.clusters.iter().find(|c| c.sample == "s2").unwrap();
    assert_eq!(s2.qualifying, 0);
    assert_eq!(s2.clusters, 0);
}

#[test]
fn test_cluster_ids_are_per_sample() {
    let mut reads = three_read_sample("s1");
    reads.extend(three_read_sample("s2"));
    let mut store = InMemoryReadStore::from_reads(reads).unwrap();

    pipeline(4).run(&mut store, None).unwrap();
    for sample in ["s1", "s2"] {
        assert_eq!(
            store.column(&ReadKey::new(sample, "A"), columns::CLUSTER).unwrap(),
            ColumnValue::Integer(1)
        );
    }
}

#[test]
fn test_reads_without_marker_are_not_clustered() {
    let mut reads = three_read_sample("s1");
    let mut plain = marker_read("s1", "D", BODY);
    plain.sequence[18..37].copy_from_slice(b"AAAAAAAAAAAAAAAAAAA");
    reads.push(plain);
    let mut store = InMemoryReadStore::from_reads(reads).unwrap();

    let report = pipeline(10).run(&mut store, Some("s1")).unwrap();
    assert_eq!(report.clusters[0].qualifying, 3);
    assert!(store
        .column(&ReadKey::new("s1", "D"), columns::CLUSTER)
        .unwrap()
        .is_null());
}
