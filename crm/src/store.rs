//! Durable mapping between in-memory tables and delimited text files.
//!
//! A [`Table`] is an owned, ordered sequence of uniformly-shaped records; a
//! [`TableStore`] ties one record type to one CSV file and funnels every
//! mutation through a load-modify-save cycle guarded by a per-resource lock.
//! Saves go through a temp-file-then-rename swap, so a reader that opens the
//! file after a save returns never observes a partial write.

use std::io::Write;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{Error, Result};

/// A record type that maps onto one row of a persisted table.
///
/// `COLUMNS` is the canonical header row; it must match the record's serde
/// field names exactly, in declaration order.
pub trait Record: Serialize + DeserializeOwned + Clone {
    const COLUMNS: &'static [&'static str];
}

/// An owned, ordered table of records. All transforming methods consume the
/// table and return the transformed value, so callers can never retain a
/// stale copy across a persistence cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct Table<R> {
    rows: Vec<R>,
}

impl<R> Default for Table<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> Table<R> {
    pub fn new() -> Self {
        Self { rows: Vec::new() }
    }

    pub fn from_rows(rows: Vec<R>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[R] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<R> {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, R> {
        self.rows.iter()
    }

    /// Appends `row`; its index is the table length before the append.
    pub fn append(mut self, row: R) -> Self {
        self.rows.push(row);
        self
    }

    /// Removes the row at `index`, shifting subsequent rows down by one.
    pub fn remove_at(mut self, index: usize) -> Result<Self> {
        if index >= self.rows.len() {
            return Err(Error::IndexOutOfRange {
                index,
                len: self.rows.len(),
            });
        }
        self.rows.remove(index);
        Ok(self)
    }

    /// Returns an empty table of the same shape.
    pub fn clear(self) -> Self {
        Self::new()
    }
}

/// Sole owner of one table's durable state.
pub struct TableStore<R: Record> {
    path: PathBuf,
    lock: Mutex<()>,
    _marker: PhantomData<R>,
}

impl<R: Record> TableStore<R> {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
            _marker: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the persisted table. A missing file yields an empty table and
    /// immediately persists the canonical header row, so later process starts
    /// see a stable file.
    pub fn load(&self) -> Result<Table<R>> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.load_locked()
    }

    /// Serializes the full table and atomically replaces the file.
    pub fn save(&self, table: &Table<R>) -> Result<()> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.save_locked(table)
    }

    /// Runs one load-modify-save cycle under the resource lock. If `op`
    /// fails, nothing is written and the stored table is unchanged.
    pub fn update<F>(&self, op: F) -> Result<Table<R>>
    where
        F: FnOnce(Table<R>) -> Result<Table<R>>,
    {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let table = op(self.load_locked()?)?;
        self.save_locked(&table)?;
        Ok(table)
    }

    fn load_locked(&self) -> Result<Table<R>> {
        if !self.path.exists() {
            let empty = Table::new();
            self.save_locked(&empty)?;
            return Ok(empty);
        }

        let mut reader = csv::ReaderBuilder::new()
            .from_path(&self.path)
            .map_err(|e| self.persistence(e.to_string()))?;

        let headers = reader
            .headers()
            .map_err(|e| self.persistence(e.to_string()))?;
        let found: Vec<String> = headers.iter().map(str::to_owned).collect();
        if found.len() != R::COLUMNS.len()
            || found.iter().zip(R::COLUMNS).any(|(have, want)| have != want)
        {
            return Err(Error::StoreCorrupt {
                path: self.path.clone(),
                detail: format!("found columns {found:?}, expected {:?}", R::COLUMNS),
            });
        }

        let mut rows = Vec::new();
        for row in reader.deserialize() {
            rows.push(row.map_err(|e| Error::StoreCorrupt {
                path: self.path.clone(),
                detail: e.to_string(),
            })?);
        }
        tracing::debug!(path = %self.path.display(), rows = rows.len(), "loaded table");
        Ok(Table::from_rows(rows))
    }

    fn save_locked(&self, table: &Table<R>) -> Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = tempfile::NamedTempFile::new_in(dir)
            .map_err(|e| self.persistence(e.to_string()))?;

        {
            let mut writer = csv::WriterBuilder::new()
                .has_headers(false)
                .from_writer(&mut tmp);
            writer
                .write_record(R::COLUMNS)
                .map_err(|e| self.persistence(e.to_string()))?;
            for row in table.iter() {
                writer
                    .serialize(row)
                    .map_err(|e| self.persistence(e.to_string()))?;
            }
            writer
                .flush()
                .map_err(|e| self.persistence(e.to_string()))?;
        }

        tmp.flush().map_err(|e| self.persistence(e.to_string()))?;
        tmp.as_file()
            .sync_all()
            .map_err(|e| self.persistence(e.to_string()))?;
        tmp.persist(&self.path)
            .map_err(|e| self.persistence(e.to_string()))?;
        tracing::debug!(path = %self.path.display(), rows = table.len(), "saved table");
        Ok(())
    }

    fn persistence(&self, message: String) -> Error {
        Error::Persistence {
            path: self.path.clone(),
            message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Sample {
        #[serde(rename = "Name")]
        name: String,
        #[serde(rename = "Count")]
        count: u32,
    }

    impl Record for Sample {
        const COLUMNS: &'static [&'static str] = &["Name", "Count"];
    }

    fn sample(name: &str, count: u32) -> Sample {
        Sample {
            name: name.to_string(),
            count,
        }
    }

    #[test]
    fn load_of_missing_file_creates_header_only_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("samples.csv");
        let store: TableStore<Sample> = TableStore::open(&path);

        let table = store.load().unwrap();

        assert!(table.is_empty());
        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.trim_end(), "Name,Count");
    }

    #[test]
    fn append_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store: TableStore<Sample> = TableStore::open(dir.path().join("samples.csv"));

        store
            .update(|table| Ok(table.append(sample("alpha", 3)).append(sample("beta", 7))))
            .unwrap();

        let reloaded = store.load().unwrap();
        assert_eq!(
            reloaded.rows(),
            &[sample("alpha", 3), sample("beta", 7)]
        );
    }

    #[test]
    fn remove_at_shifts_later_rows_down() {
        let table = Table::new()
            .append(sample("a", 0))
            .append(sample("b", 1))
            .append(sample("c", 2));

        let table = table.remove_at(0).unwrap();

        assert_eq!(table.rows(), &[sample("b", 1), sample("c", 2)]);
    }

    #[test]
    fn remove_at_rejects_out_of_range_index() {
        let table = Table::new().append(sample("a", 0)).append(sample("b", 1));
        let table = table.remove_at(1).unwrap();

        let err = table.remove_at(1).unwrap_err();

        assert!(matches!(
            err,
            Error::IndexOutOfRange { index: 1, len: 1 }
        ));
    }

    #[test]
    fn schema_mismatch_is_store_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("samples.csv");
        std::fs::write(&path, "Name,Total\nalpha,3\n").unwrap();
        let store: TableStore<Sample> = TableStore::open(&path);

        let err = store.load().unwrap_err();

        assert!(matches!(err, Error::StoreCorrupt { .. }));
    }

    #[test]
    fn failed_update_leaves_stored_table_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let store: TableStore<Sample> = TableStore::open(dir.path().join("samples.csv"));
        store
            .update(|table| Ok(table.append(sample("alpha", 3))))
            .unwrap();

        let result = store.update(|table| table.remove_at(5));

        assert!(result.is_err());
        assert_eq!(store.load().unwrap().rows(), &[sample("alpha", 3)]);
    }

    #[test]
    fn clear_yields_empty_table() {
        let table = Table::new().append(sample("a", 0)).clear();
        assert!(table.is_empty());
    }
}
