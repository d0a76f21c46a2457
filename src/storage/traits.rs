/// Read store abstraction
///
/// The store owns the reads and a growing set of annotation columns. Reads
/// are fetched in bounded, offset-addressed batches ordered by
/// (sample, read id); annotations are written per read, or atomically for a
/// whole batch.
use crate::bio::{Read, ReadKey, TrimBounds};
use crate::{AmpliclusterError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Column names written by the pipeline.
pub mod columns {
    pub const TRIM_START: &str = "trim_start";
    pub const TRIM_END: &str = "trim_end";
    pub const MARKER_COUNT: &str = "marker_count";
    pub const CLUSTER: &str = "cluster";
}

/// Names reserved for the read payload itself.
pub const RESERVED_COLUMNS: [&str; 4] = ["sample", "read_id", "sequence", "error_probs"];

/// A single annotation cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColumnValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl ColumnValue {
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            ColumnValue::Integer(v) => Some(*v),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, ColumnValue::Null)
    }
}

impl From<i64> for ColumnValue {
    fn from(value: i64) -> Self {
        ColumnValue::Integer(value)
    }
}

impl From<Option<i64>> for ColumnValue {
    fn from(value: Option<i64>) -> Self {
        value.map_or(ColumnValue::Null, ColumnValue::Integer)
    }
}

impl From<f64> for ColumnValue {
    fn from(value: f64) -> Self {
        ColumnValue::Real(value)
    }
}

impl From<&str> for ColumnValue {
    fn from(value: &str) -> Self {
        ColumnValue::Text(value.to_string())
    }
}

/// Column name to value, ordered by name.
pub type Columns = BTreeMap<String, ColumnValue>;

/// Selects annotated reads for clustering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnnotationFilter {
    pub min_marker_count: u64,
    pub min_trimmed_len: usize,
}

impl AnnotationFilter {
    /// Reads with at least one marker hit and a trimmed region of `min_len` bases.
    pub fn qualifying(min_len: usize) -> Self {
        Self {
            min_marker_count: 1,
            min_trimmed_len: min_len,
        }
    }

    pub fn accepts(&self, bounds: &TrimBounds, marker_count: u64) -> bool {
        marker_count >= self.min_marker_count
            && bounds
                .trimmed_len()
                .is_some_and(|len| len >= self.min_trimmed_len)
    }
}

/// A read together with the annotations the clusterer needs.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotatedRead {
    pub read: Read,
    pub bounds: TrimBounds,
    pub marker_count: u64,
}

impl AnnotatedRead {
    /// The read restricted to its trim region.
    pub fn trimmed(&self) -> &[u8] {
        match self.bounds {
            TrimBounds::Region { start, end } => self.read.subsequence(start, end),
            TrimBounds::Undefined => &[],
        }
    }
}

pub trait ReadStore {
    /// Number of reads, optionally restricted to one sample.
    fn count(&self, sample: Option<&str>) -> Result<usize>;

    /// Up to `limit` reads starting at `offset`, ordered by (sample, read id).
    fn fetch_batch(&self, sample: Option<&str>, offset: usize, limit: usize) -> Result<Vec<Read>>;

    /// Writes columns of one read. Last write wins.
    fn append_columns(&mut self, key: &ReadKey, columns: &Columns) -> Result<()> {
        self.append_batch(&[(key.clone(), columns.clone())])
    }

    /// Writes columns of many reads. Either every update is applied or none is.
    fn append_batch(&mut self, updates: &[(ReadKey, Columns)]) -> Result<()>;

    /// Annotated reads of a sample accepted by `filter`, ordered by read id.
    fn list_columns(&self, sample: &str, filter: &AnnotationFilter) -> Result<Vec<AnnotatedRead>>;

    /// Distinct sample names in ascending order.
    fn samples(&self) -> Result<Vec<String>>;

    /// Value of one column. Unset columns read as `Null`.
    fn column(&self, key: &ReadKey, name: &str) -> Result<ColumnValue>;

    fn insert_read(&mut self, read: Read) -> Result<()>;

    fn insert_reads(&mut self, reads: Vec<Read>) -> Result<()> {
        for read in reads {
            self.insert_read(read)?;
        }
        Ok(())
    }
}

/// Column names must be plain identifiers and not shadow the read payload.
pub fn validate_column_name(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };
    if !valid {
        return Err(AmpliclusterError::InvalidInput(format!(
            "invalid column name '{}'",
            name
        )));
    }
    if RESERVED_COLUMNS.iter().any(|r| r.eq_ignore_ascii_case(name)) {
        return Err(AmpliclusterError::InvalidInput(format!(
            "column '{}' is reserved",
            name
        )));
    }
    Ok(())
}

/// The validated name in the lowercase form stores keep it in.
///
/// Column names are case-insensitive, as in SQLite.
pub fn column_key(name: &str) -> Result<String> {
    validate_column_name(name)?;
    Ok(name.to_ascii_lowercase())
}
