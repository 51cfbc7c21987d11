//! Persisted tables
//!
//! Every table is one JSON document. File-backed storage replaces documents
//! atomically (temp file, fsync, rename) so a crash never leaves a torn file;
//! a document that fails to parse on load is treated as an empty table.
use anyhow::Context;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::convert::Infallible;
use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use thiserror::Error;

/// The tables an engine instance persists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Table {
    Learned,
    Owned,
    ObservedForms,
    Navigator,
}

impl Table {
    pub const ALL: [Self; 4] = [Self::Learned, Self::Owned, Self::ObservedForms, Self::Navigator];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Learned => "learned",
            Self::Owned => "owned",
            Self::ObservedForms => "observed_forms",
            Self::Navigator => "navigator",
        }
    }

    #[must_use]
    pub const fn file_name(self) -> &'static str {
        match self {
            Self::Learned => "learned.json",
            Self::Owned => "owned.json",
            Self::ObservedForms => "observed_forms.json",
            Self::Navigator => "navigator.json",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw document storage for the engine's tables.
pub trait TableStorage {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load a table document, `None` if it was never saved.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be read.
    fn load_table(&self, table: Table) -> Result<Option<String>, Self::Error>;

    /// Replace a table document.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be written.
    fn save_table(&self, table: Table, json: &str) -> Result<(), Self::Error>;
}

/// Errors raised by file-backed storage.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read {}: {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to write {}: {source}", .path.display())]
    Write { path: PathBuf, source: io::Error },
}

/// Tables stored as files under one profile directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    /// Use `root` as the storage directory, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|source| StoreError::Write {
            path: root.clone(),
            source,
        })?;
        Ok(Self { root })
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn path_for(&self, table: Table) -> PathBuf {
        self.root.join(table.file_name())
    }

    fn write_atomic(path: &Path, json: &str) -> io::Result<()> {
        let tmp = path.with_extension("json.tmp");
        {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(json.as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&tmp, path)
    }
}

impl TableStorage for FileStorage {
    type Error = StoreError;

    fn load_table(&self, table: Table) -> Result<Option<String>, Self::Error> {
        let path = self.path_for(table);
        match fs::read_to_string(&path) {
            Ok(json) => Ok(Some(json)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::Read { path, source }),
        }
    }

    fn save_table(&self, table: Table, json: &str) -> Result<(), Self::Error> {
        let path = self.path_for(table);
        Self::write_atomic(&path, json).map_err(|source| StoreError::Write { path, source })
    }
}

/// In-process storage; clones share the same tables.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    tables: Rc<RefCell<BTreeMap<Table, String>>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn raw(&self, table: Table) -> Option<String> {
        self.tables.borrow().get(&table).cloned()
    }
}

impl TableStorage for MemoryStorage {
    type Error = Infallible;

    fn load_table(&self, table: Table) -> Result<Option<String>, Self::Error> {
        Ok(self.raw(table))
    }

    fn save_table(&self, table: Table, json: &str) -> Result<(), Self::Error> {
        self.tables.borrow_mut().insert(table, json.to_string());
        Ok(())
    }
}

/// Load a table, falling back to its default when missing, unreadable, or
/// corrupt. Corruption is logged and never propagated.
pub fn load_or_default<T, S>(storage: &S, table: Table) -> T
where
    T: DeserializeOwned + Default,
    S: TableStorage,
{
    let json = match storage.load_table(table) {
        Ok(Some(json)) => json,
        Ok(None) => return T::default(),
        Err(err) => {
            log::error!("{table} table unreadable, starting empty: {err}");
            return T::default();
        }
    };
    serde_json::from_str(&json).unwrap_or_else(|err| {
        log::error!("{table} table corrupt, starting empty: {err}");
        T::default()
    })
}

/// Serialize and save a table.
///
/// # Errors
///
/// Returns an error if serialization or the write fails.
pub fn persist<T, S>(storage: &S, table: Table, value: &T) -> anyhow::Result<()>
where
    T: Serialize,
    S: TableStorage,
{
    let json = serde_json::to_string_pretty(value)
        .with_context(|| format!("Failed to encode {table} table"))?;
    storage
        .save_table(table, &json)
        .with_context(|| format!("Failed to persist {table} table"))
}
