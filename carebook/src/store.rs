//! File-backed record stores.
//!
//! This module provides [`RecordStore`], the durable collection of rows for
//! one entity type, and [`Table`], a typed view over a shared store.
//!
//! # Design
//!
//! A `RecordStore` holds no rows in memory. Every [`RecordStore::read`]
//! re-reads the backing file, and every write is a full-file rewrite:
//!
//! 1. Read the existing file (a missing file reads as empty)
//! 2. Lay existing rows out in schema order, keeping their stored text, and
//!    encode incoming rows
//! 3. Merge, dropping rows that are identical in every field (structured
//!    values compare by their JSON value, not their spelling)
//! 4. Write header + merged rows to a staging file, then rename it over the
//!    backing file
//!
//! Rows already in the file are written back exactly as they were read.
//!
//! The store is designed for single-threaded use by one process. Nothing
//! guards against a second process rewriting the same file.
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use carebook::record::Row;
//! use carebook::store::RecordStore;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = RecordStore::open("./data/measurements.csv");
//!
//! let row = Row::new()
//!     .with("user_id", "1")
//!     .with("constant", "heart_rate")
//!     .with_number("value", 75.0);
//!
//! // Writing the same row twice leaves a single copy
//! store.write(&["user_id", "constant", "value"], &[row.clone()])?;
//! store.write(&["user_id", "constant", "value"], &[row])?;
//! assert_eq!(store.read()?.len(), 1);
//! # Ok(())
//! # }
//! ```

use std::borrow::Cow;
use std::collections::HashSet;
use std::fs;
use std::io::ErrorKind;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::codec;
use crate::error::{Result, StoreError};
use crate::record::{Field, Record, Row};

/// Suffix appended to the backing file name for the staging file.
const STAGING_SUFFIX: &str = ".tmp";

/// Outcome of a merge-on-write.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteSummary {
    /// Rows read back from the existing file.
    pub existing: usize,
    /// Incoming rows that were not already stored.
    pub added: usize,
    /// Stored rows replaced by an incoming row with the same key.
    pub replaced: usize,
    /// Rows in the file after the rewrite.
    pub total: usize,
}

/// Durable storage for one entity type's rows.
#[derive(Debug)]
pub struct RecordStore {
    /// Path to the backing file.
    path: PathBuf,
}

impl RecordStore {
    /// Creates a store handle for the given backing file.
    ///
    /// No I/O happens here; the file is created on first write.
    pub fn open<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Returns the path to the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns `true` if the backing file exists.
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Reads the header line, or `None` if the file is missing or empty.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Read`] or [`StoreError::Malformed`].
    pub fn header(&self) -> Result<Option<Vec<String>>> {
        Ok(self.load()?.map(|(header, _)| header))
    }

    /// Loads all rows from the backing file.
    ///
    /// A missing file is not an error; it reads as an empty store. Values
    /// that look like a nested list or mapping are decoded back into
    /// [`Field::Structured`]; malformed ones are kept as text.
    ///
    /// # Errors
    ///
    /// - [`StoreError::Read`] if the file exists but cannot be read
    /// - [`StoreError::Malformed`] if the text cannot be split into values
    pub fn read(&self) -> Result<Vec<Row>> {
        let span = tracing::debug_span!("read", path = %self.path.display());
        let _enter = span.enter();

        let Some((header, lines)) = self.load()? else {
            return Ok(Vec::new());
        };

        let rows = lines
            .into_iter()
            .map(|values| {
                if values.len() > header.len() {
                    tracing::warn!(
                        expected = header.len(),
                        found = values.len(),
                        "ignoring values beyond the header"
                    );
                }
                let mut row = Row::new();
                for (name, raw) in header.iter().zip(values) {
                    let field = Field::decode(name, raw);
                    row.set(name, field);
                }
                row
            })
            .collect();

        Ok(rows)
    }

    /// Merges `rows` into the file, dropping exact duplicates.
    ///
    /// Existing and incoming rows are laid out in `schema` order and
    /// compared field by field. A row identical to one
    /// already stored is not duplicated; a row that differs in any field is
    /// kept as a separate entry, even if it shares an identifier. The file
    /// is then rewritten with `schema` as its header.
    ///
    /// # Errors
    ///
    /// - [`StoreError::InvalidSchema`] if `schema` is empty or repeats a field
    /// - [`StoreError::Read`] / [`StoreError::Malformed`] reading the current file
    /// - [`StoreError::Write`] if the rewrite fails
    pub fn write(&self, schema: &[&str], rows: &[Row]) -> Result<WriteSummary> {
        validate_schema(schema)?;

        let existing = self.stored(schema)?;
        let existing_count = existing.len();

        // Duplicates already in the file are not counted as added rows.
        let mut merged = dedupe(existing);
        let unique_count = merged.len();
        merged.extend(rows.iter().map(|row| row.flatten(schema)));
        let merged = dedupe(merged);

        self.rewrite(schema, &merged)?;

        let summary = WriteSummary {
            existing: existing_count,
            added: merged.len() - unique_count,
            replaced: 0,
            total: merged.len(),
        };
        tracing::debug!(path = %self.path.display(), ?summary, "merged rows");
        Ok(summary)
    }

    /// Merges `rows` into the file, replacing stored rows by key.
    ///
    /// An incoming row whose `key` value matches a stored row takes the
    /// position of the first match, and any later rows with that key are
    /// removed. Incoming rows with a new key are appended. Exact duplicates
    /// are then dropped as in [`RecordStore::write`].
    ///
    /// # Errors
    ///
    /// Same as [`RecordStore::write`], plus [`StoreError::UnknownKeyField`]
    /// if `key` is not in `schema`.
    pub fn upsert(&self, schema: &[&str], key: &str, rows: &[Row]) -> Result<WriteSummary> {
        validate_schema(schema)?;
        let key_index = schema
            .iter()
            .position(|field| *field == key)
            .ok_or_else(|| StoreError::UnknownKeyField {
                field: key.to_string(),
                fields: schema.iter().map(ToString::to_string).collect(),
            })?;

        let mut merged = self.stored(schema)?;
        let existing_count = merged.len();
        let mut replaced = 0;
        let mut added = 0;

        for row in rows {
            let values = row.flatten(schema);
            match merged.iter().position(|r| r[key_index] == values[key_index]) {
                Some(pos) => {
                    let key_value = values[key_index].clone();
                    merged[pos] = values;
                    let mut index = 0;
                    merged.retain(|r| {
                        let keep = index <= pos || r[key_index] != key_value;
                        index += 1;
                        keep
                    });
                    replaced += 1;
                }
                None => {
                    merged.push(values);
                    added += 1;
                }
            }
        }

        let merged = dedupe(merged);
        self.rewrite(schema, &merged)?;

        let summary = WriteSummary {
            existing: existing_count,
            added,
            replaced,
            total: merged.len(),
        };
        tracing::debug!(path = %self.path.display(), key, ?summary, "upserted rows");
        Ok(summary)
    }

    /// Reads the file into header + raw values, or `None` if absent/empty.
    fn load(&self) -> Result<Option<(Vec<String>, Vec<Vec<String>>)>> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(StoreError::Read {
                    path: self.path.clone(),
                    source: e,
                }
                .into());
            }
        };

        let mut rows = codec::parse_rows(&text).map_err(|failure| StoreError::Malformed {
            path: self.path.clone(),
            line: failure.line,
            reason: failure.reason,
        })?;

        if rows.is_empty() {
            return Ok(None);
        }

        let header = rows.remove(0);
        Ok(Some((header, rows)))
    }

    /// Reads existing rows as stored text in `schema` order.
    ///
    /// Values are not decoded, so legacy spellings survive a rewrite.
    /// Fields outside `schema` are dropped; missing ones become empty.
    fn stored(&self, schema: &[&str]) -> Result<Vec<Vec<String>>> {
        let Some((header, lines)) = self.load()? else {
            return Ok(Vec::new());
        };

        let columns: Vec<Option<usize>> = schema
            .iter()
            .map(|field| header.iter().position(|name| name == field))
            .collect();

        Ok(lines
            .into_iter()
            .map(|values| {
                columns
                    .iter()
                    .map(|column| {
                        column
                            .and_then(|index| values.get(index))
                            .cloned()
                            .unwrap_or_default()
                    })
                    .collect()
            })
            .collect())
    }

    /// Writes header + rows to a staging file and renames it into place.
    fn rewrite(&self, schema: &[&str], rows: &[Vec<String>]) -> Result<()> {
        let write_error = |path: &Path, source| StoreError::Write {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| write_error(parent, e))?;
        }

        let mut text = codec::encode_row(schema.iter().copied());
        text.push('\n');
        for row in rows {
            text.push_str(&codec::encode_row(row.iter().map(String::as_str)));
            text.push('\n');
        }

        let staging = self.staging_path();
        fs::write(&staging, text).map_err(|e| write_error(&staging, e))?;
        fs::rename(&staging, &self.path).map_err(|e| write_error(&self.path, e))?;
        Ok(())
    }

    /// Returns the staging path next to the backing file.
    fn staging_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_default();
        name.push(STAGING_SUFFIX);
        self.path.with_file_name(name)
    }
}

/// Rejects empty schemas and repeated field names.
fn validate_schema(schema: &[&str]) -> Result<()> {
    let invalid = |reason: &str| StoreError::InvalidSchema {
        fields: schema.iter().map(ToString::to_string).collect(),
        reason: reason.to_string(),
    };

    if schema.is_empty() {
        return Err(invalid("at least one field is required").into());
    }

    let mut seen = HashSet::with_capacity(schema.len());
    for field in schema {
        if field.is_empty() {
            return Err(invalid("field names must be non-empty").into());
        }
        if !seen.insert(*field) {
            return Err(invalid("field names must be unique").into());
        }
    }

    Ok(())
}

/// Drops rows identical to an earlier row, keeping first positions and
/// the first row's text.
fn dedupe(rows: Vec<Vec<String>>) -> Vec<Vec<String>> {
    let mut seen = HashSet::with_capacity(rows.len());
    rows.into_iter()
        .filter(|row| {
            let key: Vec<String> = row.iter().map(|value| canonical(value).into_owned()).collect();
            seen.insert(key)
        })
        .collect()
}

/// Comparison form of a stored value: structured values are reduced to
/// compact JSON, everything else is compared as written.
fn canonical(value: &str) -> Cow<'_, str> {
    if Field::looks_structured(value)
        && let Ok(parsed) = serde_json::from_str::<serde_json::Value>(value)
    {
        return Cow::Owned(parsed.to_string());
    }
    Cow::Borrowed(value)
}

/// Typed view over a shared [`RecordStore`].
///
/// Many tables may share one store through the
/// [`StoreRegistry`](crate::registry::StoreRegistry); the table adds no
/// state of its own.
#[derive(Debug)]
pub struct Table<R> {
    store: Rc<RecordStore>,
    _record: PhantomData<fn() -> R>,
}

impl<R> Clone for Table<R> {
    fn clone(&self) -> Self {
        Self {
            store: Rc::clone(&self.store),
            _record: PhantomData,
        }
    }
}

impl<R: Record> Table<R> {
    /// Wraps a shared store.
    pub fn new(store: Rc<RecordStore>) -> Self {
        Self {
            store,
            _record: PhantomData,
        }
    }

    /// Returns the underlying store.
    pub fn store(&self) -> &Rc<RecordStore> {
        &self.store
    }

    /// Reads and decodes every record, skipping rows that cannot be
    /// decoded.
    ///
    /// Each skipped row is logged at `warn` with its position and error.
    /// Use [`Table::all_strict`] to fail on such rows instead.
    ///
    /// # Errors
    ///
    /// Returns a store error if the file cannot be read.
    pub fn all(&self) -> Result<Vec<R>> {
        let rows = self.store.read()?;
        let mut records = Vec::with_capacity(rows.len());
        for (index, row) in rows.iter().enumerate() {
            match R::from_row(row) {
                Ok(record) => records.push(record),
                Err(e) => tracing::warn!(
                    path = %self.store.path().display(),
                    row = index + 1,
                    error = %e,
                    "skipping undecodable row"
                ),
            }
        }
        Ok(records)
    }

    /// Reads and decodes every record, failing on the first bad row.
    ///
    /// # Errors
    ///
    /// Returns a store error, or [`RecordError`](crate::error::RecordError)
    /// if any row cannot be decoded.
    pub fn all_strict(&self) -> Result<Vec<R>> {
        self.store
            .read()?
            .iter()
            .map(|row| R::from_row(row).map_err(Into::into))
            .collect()
    }

    /// Returns the number of stored rows without decoding them.
    ///
    /// # Errors
    ///
    /// Returns a store error if the file cannot be read.
    pub fn count(&self) -> Result<usize> {
        Ok(self.store.read()?.len())
    }

    /// Returns the first record matching `predicate`, in file order.
    ///
    /// Undecodable rows are skipped as in [`Table::all`].
    ///
    /// # Errors
    ///
    /// Same as [`Table::all`].
    pub fn find<F>(&self, predicate: F) -> Result<Option<R>>
    where
        F: Fn(&R) -> bool,
    {
        Ok(self.all()?.into_iter().find(|record| predicate(record)))
    }

    /// Returns every record matching `predicate`, in file order.
    ///
    /// # Errors
    ///
    /// Same as [`Table::all`].
    pub fn filter<F>(&self, predicate: F) -> Result<Vec<R>>
    where
        F: Fn(&R) -> bool,
    {
        Ok(self
            .all()?
            .into_iter()
            .filter(|record| predicate(record))
            .collect())
    }

    /// Appends records with merge-on-write semantics.
    ///
    /// # Errors
    ///
    /// Returns an error if a record cannot be encoded or the write fails.
    pub fn append(&self, records: &[R]) -> Result<WriteSummary> {
        let rows = to_rows(records)?;
        self.store.write(R::SCHEMA, &rows)
    }

    /// Stores `record`, replacing the stored row with the same key.
    ///
    /// Records without a [`Record::KEY`] fall back to [`Table::append`].
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be encoded or the write fails.
    pub fn update(&self, record: &R) -> Result<WriteSummary> {
        let rows = to_rows(std::slice::from_ref(record))?;
        match R::KEY {
            Some(key) => self.store.upsert(R::SCHEMA, key, &rows),
            None => self.store.write(R::SCHEMA, &rows),
        }
    }
}

fn to_rows<R: Record>(records: &[R]) -> Result<Vec<Row>> {
    records
        .iter()
        .map(|record| record.to_row().map_err(Into::into))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CarebookError, RecordError};
    use crate::model::Measurement;
    use serde_json::json;
    use tempfile::tempdir;

    const SCHEMA: &[&str] = &["id", "name", "tags"];

    fn row(id: &str, name: &str) -> Row {
        Row::new().with("id", id).with("name", name)
    }

    #[test]
    fn test_read_missing_file_is_empty() {
        let temp_dir = tempdir().unwrap();
        let store = RecordStore::open(temp_dir.path().join("missing.csv"));

        assert!(!store.exists());
        assert!(store.read().unwrap().is_empty());
        assert_eq!(store.header().unwrap(), None);
    }

    #[test]
    fn test_write_creates_file_with_header() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("nested/dir/people.csv");
        let store = RecordStore::open(&path);

        store.write(SCHEMA, &[row("1", "Ana")]).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text, "id,name,tags\n1,Ana,\n");
        assert_eq!(
            store.header().unwrap(),
            Some(vec!["id".to_string(), "name".to_string(), "tags".to_string()])
        );
        assert!(!path.with_file_name("people.csv.tmp").exists());
    }

    #[test]
    fn test_identical_rows_are_not_duplicated() {
        let temp_dir = tempdir().unwrap();
        let store = RecordStore::open(temp_dir.path().join("people.csv"));

        store.write(SCHEMA, &[row("1", "Ana")]).unwrap();
        let summary = store.write(SCHEMA, &[row("1", "Ana")]).unwrap();

        assert_eq!(summary.added, 0);
        assert_eq!(summary.total, 1);
        assert_eq!(store.read().unwrap().len(), 1);
    }

    #[test]
    fn test_changed_row_with_same_id_is_kept_separately() {
        let temp_dir = tempdir().unwrap();
        let store = RecordStore::open(temp_dir.path().join("people.csv"));

        store.write(SCHEMA, &[row("1", "Ana")]).unwrap();
        store.write(SCHEMA, &[row("1", "Anna")]).unwrap();

        let rows = store.read().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].text("name"), "Ana");
        assert_eq!(rows[1].text("name"), "Anna");
    }

    #[test]
    fn test_read_back_and_write_all_keeps_order() {
        let temp_dir = tempdir().unwrap();
        let store = RecordStore::open(temp_dir.path().join("people.csv"));

        store.write(SCHEMA, &[row("1", "Ana"), row("2", "Pere")]).unwrap();

        // Common caller pattern: read everything, append one, write everything.
        let mut rows = store.read().unwrap();
        rows.push(row("3", "Joan"));
        let summary = store.write(SCHEMA, &rows).unwrap();

        assert_eq!(summary.existing, 2);
        assert_eq!(summary.added, 1);
        let ids: Vec<_> = store
            .read()
            .unwrap()
            .iter()
            .map(|r| r.text("id").into_owned())
            .collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
    }

    #[test]
    fn test_structured_field_round_trips() {
        let temp_dir = tempdir().unwrap();
        let store = RecordStore::open(temp_dir.path().join("people.csv"));

        let tags = json!([{"name": "aspirin", "duration": "2 years"}, "x,y"]);
        let original = row("1", "Ana").with("tags", Field::Structured(tags.clone()));
        store.write(SCHEMA, &[original.clone()]).unwrap();
        store.write(SCHEMA, &[original]).unwrap();

        let rows = store.read().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("tags"), Some(&Field::Structured(tags)));
    }

    #[test]
    fn test_malformed_structure_is_read_as_text() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("people.csv");
        fs::write(&path, "id,name,tags\n1,Ana,{broken\n").unwrap();

        let rows = RecordStore::open(&path).read().unwrap();
        assert_eq!(rows[0].get("tags"), Some(&Field::Text("{broken".to_string())));
    }

    #[test]
    fn test_short_rows_read_missing_fields_as_empty() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("people.csv");
        fs::write(&path, "id,name,tags\n1\n").unwrap();

        let rows = RecordStore::open(&path).read().unwrap();
        assert_eq!(rows[0].text("id"), "1");
        assert_eq!(rows[0].text("name"), "");
        assert_eq!(rows[0].get("tags"), None);
    }

    #[test]
    fn test_unterminated_quote_is_malformed() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("people.csv");
        fs::write(&path, "id,name\n1,\"Ana\n").unwrap();

        match RecordStore::open(&path).read().unwrap_err() {
            CarebookError::Store(StoreError::Malformed { line, .. }) => assert_eq!(line, 2),
            other => panic!("Expected Malformed error, got: {:?}", other),
        }
    }

    #[test]
    fn test_read_directory_is_an_io_error() {
        let temp_dir = tempdir().unwrap();
        let store = RecordStore::open(temp_dir.path());

        match store.read().unwrap_err() {
            CarebookError::Store(StoreError::Read { .. }) => {}
            other => panic!("Expected Read error, got: {:?}", other),
        }
    }

    #[test]
    fn test_invalid_schema_rejection() {
        let temp_dir = tempdir().unwrap();
        let store = RecordStore::open(temp_dir.path().join("people.csv"));

        assert!(store.write(&[], &[row("1", "Ana")]).is_err());
        assert!(store.write(&["id", "id"], &[row("1", "Ana")]).is_err());
        assert!(!store.exists());
    }

    #[test]
    fn test_upsert_replaces_by_key() {
        let temp_dir = tempdir().unwrap();
        let store = RecordStore::open(temp_dir.path().join("people.csv"));

        store
            .write(SCHEMA, &[row("1", "Ana"), row("2", "Pere"), row("1", "Ana (old)")])
            .unwrap();
        let summary = store.upsert(SCHEMA, "id", &[row("1", "Ana Maria"), row("3", "Joan")]).unwrap();

        assert_eq!(summary.replaced, 1);
        assert_eq!(summary.added, 1);
        let names: Vec<_> = store
            .read()
            .unwrap()
            .iter()
            .map(|r| r.text("name").into_owned())
            .collect();
        assert_eq!(names, vec!["Ana Maria", "Pere", "Joan"]);
    }

    #[test]
    fn test_upsert_unknown_key_field() {
        let temp_dir = tempdir().unwrap();
        let store = RecordStore::open(temp_dir.path().join("people.csv"));

        match store.upsert(SCHEMA, "email", &[row("1", "Ana")]).unwrap_err() {
            CarebookError::Store(StoreError::UnknownKeyField { field, .. }) => {
                assert_eq!(field, "email");
            }
            other => panic!("Expected UnknownKeyField error, got: {:?}", other),
        }
    }

    #[test]
    fn test_rewrite_keeps_stored_spelling() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("people.csv");
        fs::write(
            &path,
            "id,name,tags\n1,Ana,\"{\"\"b\"\": 2, \"\"a\"\": 1}\"\n2,\"[1, 2]\",\n",
        )
        .unwrap();
        let store = RecordStore::open(&path);

        store.write(SCHEMA, &[row("3", "Joan")]).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"{\"\"b\"\": 2, \"\"a\"\": 1}\""));
        assert!(text.contains("2,\"[1, 2]\","));
    }

    #[test]
    fn test_structured_duplicates_compare_by_value() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("people.csv");
        fs::write(&path, "id,name,tags\n1,Ana,\"{\"\"a\"\": 1}\"\n").unwrap();
        let store = RecordStore::open(&path);

        let summary = store
            .write(SCHEMA, &[row("1", "Ana").with("tags", Field::Structured(json!({"a": 1})))])
            .unwrap();

        assert_eq!(summary.added, 0);
        assert_eq!(summary.total, 1);
    }

    #[test]
    fn test_added_ignores_duplicates_already_stored() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("people.csv");
        fs::write(&path, "id,name,tags\n1,Ana,\n1,Ana,\n").unwrap();
        let store = RecordStore::open(&path);

        let summary = store.write(SCHEMA, &[row("2", "Pere")]).unwrap();

        assert_eq!(summary.existing, 2);
        assert_eq!(summary.added, 1);
        assert_eq!(summary.total, 2);
    }

    #[test]
    fn test_table_skips_undecodable_rows() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("measurements.csv");
        fs::write(
            &path,
            "user_id,constant,value,timestamp\n\
             2,heart_rate,high,T0\n\
             1,heart_rate,72,T1\n",
        )
        .unwrap();
        let table: Table<Measurement> = Table::new(Rc::new(RecordStore::open(&path)));

        let records = table.all().unwrap();
        assert_eq!(records, vec![Measurement::new("1", "heart_rate", 72.0, "T1")]);
        assert_eq!(table.find(|m| m.user_id == "1").unwrap(), Some(records[0].clone()));
        assert_eq!(table.count().unwrap(), 2);

        match table.all_strict().unwrap_err() {
            CarebookError::Record(RecordError::NotANumber { field, .. }) => {
                assert_eq!(field, "value");
            }
            other => panic!("Expected NotANumber error, got: {:?}", other),
        }
    }

    #[test]
    fn test_header_follows_latest_schema() {
        let temp_dir = tempdir().unwrap();
        let store = RecordStore::open(temp_dir.path().join("people.csv"));

        store.write(&["id", "name"], &[row("1", "Ana")]).unwrap();
        store
            .write(&["id", "name", "email"], &[row("2", "Pere").with("email", "p@x.cat")])
            .unwrap();

        let rows = store.read().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].text("email"), "");
        assert_eq!(rows[1].text("email"), "p@x.cat");
    }
}
