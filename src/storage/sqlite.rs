//! SQLite-backed read store.
//!
//! Reads live in table `Reads`, keyed by `(sample, read_id)`:
//!
//! ```text
//! sample TEXT, read_id TEXT, sequence BLOB, error_probs BLOB, <annotation columns>...
//! ```
//!
//! Error probabilities are stored as little-endian `f64` values. Annotation
//! columns are added on first write and hold any SQLite value. A batch write
//! runs in a single transaction.

use crate::bio::{Read, ReadKey, TrimBounds};
use crate::storage::traits::{
    column_key, columns, AnnotatedRead, AnnotationFilter, ColumnValue, Columns, ReadStore,
};
use crate::{AmpliclusterError, Result};

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, Value, ValueRef};
use rusqlite::{params, Connection, OptionalExtension, Row, ToSql};

//-----------------------------------------------------------------------------

impl ToSql for ColumnValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            ColumnValue::Null => ToSqlOutput::Owned(Value::Null),
            ColumnValue::Integer(v) => ToSqlOutput::Owned(Value::Integer(*v)),
            ColumnValue::Real(v) => ToSqlOutput::Owned(Value::Real(*v)),
            ColumnValue::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
        })
    }
}

impl FromSql for ColumnValue {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value {
            ValueRef::Null => Ok(ColumnValue::Null),
            ValueRef::Integer(v) => Ok(ColumnValue::Integer(v)),
            ValueRef::Real(v) => Ok(ColumnValue::Real(v)),
            ValueRef::Text(bytes) => std::str::from_utf8(bytes)
                .map(|s| ColumnValue::Text(s.to_string()))
                .map_err(|e| FromSqlError::Other(Box::new(e))),
            ValueRef::Blob(_) => Err(FromSqlError::InvalidType),
        }
    }
}

fn encode_probs(probs: &[f64]) -> Vec<u8> {
    probs.iter().flat_map(|p| p.to_le_bytes()).collect()
}

fn decode_probs(bytes: &[u8]) -> Result<Vec<f64>> {
    if bytes.len() % 8 != 0 {
        return Err(AmpliclusterError::Storage(format!(
            "error probability blob of {} bytes is not a sequence of f64 values",
            bytes.len()
        )));
    }
    Ok(bytes
        .chunks_exact(8)
        .map(|chunk| {
            let mut buf = [0u8; 8];
            buf.copy_from_slice(chunk);
            f64::from_le_bytes(buf)
        })
        .collect())
}

fn quote(name: &str) -> String {
    format!("\"{}\"", name)
}

//-----------------------------------------------------------------------------

/// A read store in a SQLite database.
#[derive(Debug)]
pub struct SqliteReadStore {
    connection: Connection,
    columns: BTreeSet<String>,
}

impl SqliteReadStore {
    const SCHEMA: &'static str = "CREATE TABLE IF NOT EXISTS Reads (
        sample TEXT NOT NULL,
        read_id TEXT NOT NULL,
        sequence BLOB NOT NULL,
        error_probs BLOB NOT NULL,
        PRIMARY KEY (sample, read_id)
    ) WITHOUT ROWID";

    /// Opens the database in the given file, creating the table if needed.
    pub fn open<P: AsRef<Path>>(filename: P) -> Result<Self> {
        let connection = Connection::open(filename)?;
        Self::with_connection(connection)
    }

    /// A private database that disappears with the store.
    pub fn in_memory() -> Result<Self> {
        let connection = Connection::open_in_memory()?;
        Self::with_connection(connection)
    }

    fn with_connection(connection: Connection) -> Result<Self> {
        connection.execute_batch(Self::SCHEMA)?;
        let columns = Self::annotation_columns(&connection)?;
        tracing::debug!(
            "Opened read store {:?} with annotation columns {:?}",
            connection.path(),
            columns
        );
        Ok(Self {
            connection,
            columns,
        })
    }

    /// Returns the filename of the database, if it has one.
    pub fn filename(&self) -> Option<&str> {
        self.connection.path()
    }

    /// Annotation columns currently present in the table.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(String::as_str)
    }

    fn annotation_columns(connection: &Connection) -> Result<BTreeSet<String>> {
        let mut stmt = connection.prepare("PRAGMA table_info(Reads)")?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(1))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(names
            .into_iter()
            .map(|name| name.to_ascii_lowercase())
            .filter(|name| !crate::storage::traits::RESERVED_COLUMNS.contains(&name.as_str()))
            .collect())
    }

    fn has_columns(&self, names: &[&str]) -> bool {
        names.iter().all(|name| self.columns.contains(*name))
    }

    fn read_from_row(row: &Row<'_>) -> rusqlite::Result<(String, String, Vec<u8>, Vec<u8>)> {
        Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
    }

    fn build_read(raw: (String, String, Vec<u8>, Vec<u8>)) -> Result<Read> {
        let (sample, id, sequence, probs) = raw;
        let error_probs = decode_probs(&probs)?;
        Ok(Read::new(ReadKey::new(sample, id), sequence, error_probs))
    }

    fn read_exists(&self, key: &ReadKey) -> Result<bool> {
        let found = self
            .connection
            .query_row(
                "SELECT 1 FROM Reads WHERE sample = ?1 AND read_id = ?2",
                params![key.sample, key.id],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }
}

impl ReadStore for SqliteReadStore {
    fn count(&self, sample: Option<&str>) -> Result<usize> {
        let count: i64 = match sample {
            Some(sample) => self.connection.query_row(
                "SELECT COUNT(*) FROM Reads WHERE sample = ?1",
                params![sample],
                |row| row.get(0),
            )?,
            None => self
                .connection
                .query_row("SELECT COUNT(*) FROM Reads", [], |row| row.get(0))?,
        };
        Ok(count as usize)
    }

    fn fetch_batch(&self, sample: Option<&str>, offset: usize, limit: usize) -> Result<Vec<Read>> {
        let (limit, offset) = (limit as i64, offset as i64);
        let raw = match sample {
            Some(sample) => {
                let mut stmt = self.connection.prepare_cached(
                    "SELECT sample, read_id, sequence, error_probs FROM Reads
                     WHERE sample = ?1 ORDER BY sample, read_id LIMIT ?2 OFFSET ?3",
                )?;
                let rows = stmt
                    .query_map(params![sample, limit, offset], Self::read_from_row)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                rows
            }
            None => {
                let mut stmt = self.connection.prepare_cached(
                    "SELECT sample, read_id, sequence, error_probs FROM Reads
                     ORDER BY sample, read_id LIMIT ?1 OFFSET ?2",
                )?;
                let rows = stmt
                    .query_map(params![limit, offset], Self::read_from_row)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                rows
            }
        };
        raw.into_iter().map(Self::build_read).collect()
    }

    fn append_batch(&mut self, updates: &[(ReadKey, Columns)]) -> Result<()> {
        let mut normalized: Vec<(&ReadKey, BTreeMap<String, &ColumnValue>)> =
            Vec::with_capacity(updates.len());
        for (key, cells) in updates {
            let mut named = BTreeMap::new();
            for (name, value) in cells {
                named.insert(column_key(name)?, value);
            }
            normalized.push((key, named));
        }

        let mut added = BTreeSet::new();
        let tx = self.connection.transaction()?;
        for (key, cells) in &normalized {
            if cells.is_empty() {
                continue;
            }
            for name in cells.keys() {
                if !self.columns.contains(name) && !added.contains(name) {
                    tx.execute(&format!("ALTER TABLE Reads ADD COLUMN {}", quote(name)), [])?;
                    added.insert(name.clone());
                }
            }

            let assignments: Vec<String> = cells
                .keys()
                .enumerate()
                .map(|(i, name)| format!("{} = ?{}", quote(name), i + 1))
                .collect();
            let n = cells.len();
            let sql = format!(
                "UPDATE Reads SET {} WHERE sample = ?{} AND read_id = ?{}",
                assignments.join(", "),
                n + 1,
                n + 2
            );
            let mut values: Vec<&dyn ToSql> = cells.values().map(|&v| v as &dyn ToSql).collect();
            values.push(&key.sample);
            values.push(&key.id);

            let changed = tx.execute(&sql, values.as_slice())?;
            if changed == 0 {
                // Dropping the transaction rolls back every update of the batch.
                return Err(AmpliclusterError::NotFound(format!("read {}", key)));
            }
        }
        tx.commit()?;

        self.columns.extend(added);
        Ok(())
    }

    fn list_columns(&self, sample: &str, filter: &AnnotationFilter) -> Result<Vec<AnnotatedRead>> {
        if !self.has_columns(&[columns::TRIM_START, columns::TRIM_END, columns::MARKER_COUNT]) {
            return Ok(Vec::new());
        }

        let mut stmt = self.connection.prepare_cached(
            "SELECT sample, read_id, sequence, error_probs, trim_start, trim_end, marker_count
             FROM Reads
             WHERE sample = ?1
               AND marker_count >= ?2
               AND trim_start IS NOT NULL AND trim_end IS NOT NULL
               AND trim_end - trim_start + 1 >= ?3
             ORDER BY read_id",
        )?;
        let rows = stmt
            .query_map(
                params![sample, filter.min_marker_count as i64, filter.min_trimmed_len as i64],
                |row| {
                    Ok((
                        Self::read_from_row(row)?,
                        row.get::<_, Option<i64>>(4)?,
                        row.get::<_, Option<i64>>(5)?,
                        row.get::<_, Option<i64>>(6)?,
                    ))
                },
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut result = Vec::with_capacity(rows.len());
        for (raw, start, end, markers) in rows {
            let annotated = AnnotatedRead {
                read: Self::build_read(raw)?,
                bounds: TrimBounds::from_columns(start, end),
                marker_count: markers.unwrap_or(0).max(0) as u64,
            };
            if filter.accepts(&annotated.bounds, annotated.marker_count) {
                result.push(annotated);
            }
        }
        Ok(result)
    }

    fn samples(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .connection
            .prepare_cached("SELECT DISTINCT sample FROM Reads ORDER BY sample")?;
        let samples = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(samples)
    }

    fn column(&self, key: &ReadKey, name: &str) -> Result<ColumnValue> {
        let name = column_key(name)?;
        if !self.columns.contains(&name) {
            return if self.read_exists(key)? {
                Ok(ColumnValue::Null)
            } else {
                Err(AmpliclusterError::NotFound(format!("read {}", key)))
            };
        }

        let sql = format!(
            "SELECT {} FROM Reads WHERE sample = ?1 AND read_id = ?2",
            quote(&name)
        );
        self.connection
            .query_row(&sql, params![key.sample, key.id], |row| row.get(0))
            .optional()?
            .ok_or_else(|| AmpliclusterError::NotFound(format!("read {}", key)))
    }

    fn insert_read(&mut self, read: Read) -> Result<()> {
        if self.read_exists(&read.key)? {
            return Err(AmpliclusterError::InvalidInput(format!(
                "duplicate read {}",
                read.key
            )));
        }
        self.connection.execute(
            "INSERT INTO Reads (sample, read_id, sequence, error_probs) VALUES (?1, ?2, ?3, ?4)",
            params![read.key.sample, read.key.id, read.sequence, encode_probs(&read.error_probs)],
        )?;
        Ok(())
    }

    fn insert_reads(&mut self, reads: Vec<Read>) -> Result<()> {
        let tx = self.connection.transaction()?;
        {
            let mut insert = tx.prepare(
                "INSERT INTO Reads (sample, read_id, sequence, error_probs) VALUES (?1, ?2, ?3, ?4)",
            )?;
            for read in &reads {
                insert
                    .execute(params![
                        read.key.sample,
                        read.key.id,
                        read.sequence,
                        encode_probs(&read.error_probs)
                    ])
                    .map_err(|e| {
                        AmpliclusterError::Storage(format!("inserting read {}: {}", read.key, e))
                    })?;
            }
        }
        tx.commit()?;
        Ok(())
    }
}

//-----------------------------------------------------------------------------
