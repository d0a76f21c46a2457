//! Common test utilities for amplicluster integration tests
//!
//! Reads built here have a 37-base prefix (filler plus the marker) in front
//! of a 100-base body, so with the default primer offset of 38 the trimmed
//! region of a clean read is exactly its body.
#![allow(dead_code)]

use amplicluster::bio::{Read, ReadKey};
use amplicluster::storage::SqliteReadStore;
use std::path::PathBuf;
use tempfile::TempDir;

pub const MARKER: &str = "GGTGTGAAAGTCCATCGCT";

const FILLER: &[u8] = b"TTCAGCATCAGGATCCAT";

pub const BODY: &[u8] = b"ACGTTGCAAGGCTTAACCGGTATCGATCGGCTAAGCTTGCAGTCAGTACGGATCCTAGGCATGCAATTCGGACTGATCGTAGCTAGGCTTACGATCGATC";

/// Temporary directory holding a SQLite read store
pub struct TestEnvironment {
    _temp_dir: TempDir,
    pub db_path: PathBuf,
}

impl TestEnvironment {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("reads.db");
        TestEnvironment {
            _temp_dir: temp_dir,
            db_path,
        }
    }

    pub fn open(&self) -> SqliteReadStore {
        SqliteReadStore::open(&self.db_path).expect("Failed to open read store")
    }
}

/// Body with the bases at `positions` swapped for a different base.
pub fn mutated_body(positions: &[usize]) -> Vec<u8> {
    let mut body = BODY.to_vec();
    for &p in positions {
        body[p] = if body[p] == b'A' { b'C' } else { b'A' };
    }
    body
}

/// A clean read carrying the marker in its primer region.
pub fn marker_read(sample: &str, id: &str, body: &[u8]) -> Read {
    let mut sequence = FILLER.to_vec();
    sequence.extend_from_slice(MARKER.as_bytes());
    sequence.extend_from_slice(body);
    let probs = vec![1e-5; sequence.len()];
    Read::new(ReadKey::new(sample, id), sequence, probs)
}

/// A read whose probability sequence is shorter than its sequence.
pub fn malformed_read(sample: &str, id: &str) -> Read {
    let read = marker_read(sample, id, BODY);
    let probs = vec![1e-5; read.sequence.len() - 1];
    Read::new(read.key, read.sequence, probs)
}

/// Reads A and B one substitution apart, C ten substitutions from A.
pub fn three_read_sample(sample: &str) -> Vec<Read> {
    vec![
        marker_read(sample, "A", BODY),
        marker_read(sample, "B", &mutated_body(&[50])),
        marker_read(sample, "C", &mutated_body(&[5, 15, 25, 35, 45, 55, 65, 75, 85, 95])),
    ]
}
