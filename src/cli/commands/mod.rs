pub mod annotate;
pub mod cluster;
pub mod config;
pub mod run;
pub mod samples;

use crate::storage::SqliteReadStore;
use crate::{AmpliclusterError, Result};
use std::path::Path;

/// Opens an existing SQLite read store.
pub fn open_store(path: &Path) -> Result<SqliteReadStore> {
    if !path.is_file() {
        return Err(AmpliclusterError::NotFound(format!(
            "read store {}",
            path.display()
        )));
    }
    SqliteReadStore::open(path)
}
