/// In-memory read store
use crate::bio::{Read, ReadKey, TrimBounds};
use crate::storage::traits::{
    column_key, columns, AnnotatedRead, AnnotationFilter, ColumnValue, Columns, ReadStore,
};
use crate::{AmpliclusterError, Result};
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
struct StoredRead {
    read: Read,
    columns: Columns,
}

impl StoredRead {
    fn integer(&self, name: &str) -> Option<i64> {
        self.columns.get(name).and_then(ColumnValue::as_integer)
    }

    fn annotated(&self) -> AnnotatedRead {
        let bounds = TrimBounds::from_columns(
            self.integer(columns::TRIM_START),
            self.integer(columns::TRIM_END),
        );
        let marker_count = self.integer(columns::MARKER_COUNT).unwrap_or(0).max(0) as u64;
        AnnotatedRead {
            read: self.read.clone(),
            bounds,
            marker_count,
        }
    }
}

/// Ordered in-memory table of reads and their annotation columns.
#[derive(Debug, Clone, Default)]
pub struct InMemoryReadStore {
    rows: BTreeMap<ReadKey, StoredRead>,
}

impl InMemoryReadStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_reads(reads: Vec<Read>) -> Result<Self> {
        let mut store = Self::new();
        store.insert_reads(reads)?;
        Ok(store)
    }

    /// All columns currently stored for a read.
    pub fn columns_of(&self, key: &ReadKey) -> Option<&Columns> {
        self.rows.get(key).map(|row| &row.columns)
    }

    fn rows_of<'a>(&'a self, sample: Option<&'a str>) -> impl Iterator<Item = &'a StoredRead> + 'a {
        self.rows
            .values()
            .filter(move |row| sample.map_or(true, |s| row.read.sample() == s))
    }
}

impl ReadStore for InMemoryReadStore {
    fn count(&self, sample: Option<&str>) -> Result<usize> {
        Ok(self.rows_of(sample).count())
    }

    fn fetch_batch(&self, sample: Option<&str>, offset: usize, limit: usize) -> Result<Vec<Read>> {
        Ok(self
            .rows_of(sample)
            .skip(offset)
            .take(limit)
            .map(|row| row.read.clone())
            .collect())
    }

    fn append_batch(&mut self, updates: &[(ReadKey, Columns)]) -> Result<()> {
        // Validate everything first so a rejected batch leaves no partial writes.
        for (key, cells) in updates {
            if !self.rows.contains_key(key) {
                return Err(AmpliclusterError::NotFound(format!("read {}", key)));
            }
            for name in cells.keys() {
                column_key(name)?;
            }
        }

        for (key, cells) in updates {
            if let Some(row) = self.rows.get_mut(key) {
                for (name, value) in cells {
                    row.columns.insert(name.to_ascii_lowercase(), value.clone());
                }
            }
        }
        Ok(())
    }

    fn list_columns(&self, sample: &str, filter: &AnnotationFilter) -> Result<Vec<AnnotatedRead>> {
        Ok(self
            .rows_of(Some(sample))
            .map(StoredRead::annotated)
            .filter(|annotated| filter.accepts(&annotated.bounds, annotated.marker_count))
            .collect())
    }

    fn samples(&self) -> Result<Vec<String>> {
        let mut samples: Vec<String> = self.rows.keys().map(|k| k.sample.clone()).collect();
        samples.dedup();
        Ok(samples)
    }

    fn column(&self, key: &ReadKey, name: &str) -> Result<ColumnValue> {
        let row = self
            .rows
            .get(key)
            .ok_or_else(|| AmpliclusterError::NotFound(format!("read {}", key)))?;
        Ok(row
            .columns
            .get(&column_key(name)?)
            .cloned()
            .unwrap_or(ColumnValue::Null))
    }

    fn insert_read(&mut self, read: Read) -> Result<()> {
        if self.rows.contains_key(&read.key) {
            return Err(AmpliclusterError::InvalidInput(format!(
                "duplicate read {}",
                read.key
            )));
        }
        self.rows.insert(
            read.key.clone(),
            StoredRead {
                read,
                columns: Columns::new(),
            },
        );
        Ok(())
    }
}
