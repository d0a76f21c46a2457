//! Batched quality trimming, marker screening and per-sample identity
//! clustering for amplicon read collections.
//!
//! Reads live in a [`storage::ReadStore`]. The [`core::BatchOrchestrator`]
//! walks the store in fixed-size batches and writes trim bounds and marker
//! counts for every read; the [`core::IdentityClusterer`] then groups the
//! qualifying reads of one sample with a greedy first-fit strategy.

pub mod bio;
pub mod cli;
pub mod core;
pub mod storage;
pub mod utils;

pub use crate::core::{BatchOrchestrator, IdentityClusterer, Pipeline};
pub use crate::storage::{InMemoryReadStore, ReadStore, SqliteReadStore};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AmpliclusterError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Malformed probability sequence for read {read}: {reason}")]
    MalformedProbabilities { read: String, reason: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Approximate matcher failed: {0}")]
    Matcher(String),

    #[error("Pairwise distance failed: {0}")]
    Distance(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

pub type Result<T> = std::result::Result<T, AmpliclusterError>;

impl From<rusqlite::Error> for AmpliclusterError {
    fn from(err: rusqlite::Error) -> Self {
        AmpliclusterError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for AmpliclusterError {
    fn from(err: serde_json::Error) -> Self {
        AmpliclusterError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_error_display() {
        let malformed = AmpliclusterError::MalformedProbabilities {
            read: "s1/r7".to_string(),
            reason: "length 3 does not match sequence length 4".to_string(),
        };
        assert_eq!(
            format!("{}", malformed),
            "Malformed probability sequence for read s1/r7: length 3 does not match sequence length 4"
        );

        let config = AmpliclusterError::Config("batch_size must be positive".to_string());
        assert_eq!(format!("{}", config), "Invalid configuration: batch_size must be positive");

        let matcher = AmpliclusterError::Matcher("unavailable".to_string());
        assert_eq!(format!("{}", matcher), "Approximate matcher failed: unavailable");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "access denied");
        let err: AmpliclusterError = io_err.into();

        match err {
            AmpliclusterError::Io(e) => assert_eq!(e.kind(), io::ErrorKind::PermissionDenied),
            _ => panic!("Expected Io error variant"),
        }
    }

    #[test]
    fn test_sqlite_error_conversion() {
        let err: AmpliclusterError = rusqlite::Error::QueryReturnedNoRows.into();
        assert!(matches!(err, AmpliclusterError::Storage(_)));
    }
}
