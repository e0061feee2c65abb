//! Shared store handles keyed by backing-file path.
//!
//! The [`StoreRegistry`] guarantees that every component asking for the same
//! file gets the same [`RecordStore`] instance. It is an ordinary value: the
//! application creates one at startup and passes it by reference to whatever
//! needs a store.
//!
//! # Example
//!
//! ```rust
//! use std::rc::Rc;
//! use carebook::registry::StoreRegistry;
//!
//! let registry = StoreRegistry::new();
//! let a = registry.get_or_create("data/alerts.csv");
//! let b = registry.get_or_create("data/./alerts.csv");
//! assert!(Rc::ptr_eq(&a, &b));
//! ```

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::record::Record;
use crate::store::{RecordStore, Table};

/// Registry of shared [`RecordStore`] handles.
///
/// Stores live as long as the registry; there is no eviction.
///
/// # Thread Safety
///
/// Handles are `Rc`-based and the registry uses a `RefCell`, so neither is
/// `Send`. The registry is meant for the single thread that owns the data
/// directory.
#[derive(Debug, Default)]
pub struct StoreRegistry {
    stores: RefCell<HashMap<PathBuf, Rc<RecordStore>>>,
}

impl StoreRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the shared store for `path`, creating it on first use.
    ///
    /// Paths are compared after lexical normalization (`a/./b` and `a//b`
    /// are both `a/b`). No symlink resolution happens.
    pub fn get_or_create<P: AsRef<Path>>(&self, path: P) -> Rc<RecordStore> {
        let key = normalize(path.as_ref());
        let mut stores = self.stores.borrow_mut();
        if let Some(store) = stores.get(&key) {
            return Rc::clone(store);
        }

        tracing::debug!(path = %key.display(), "opening record store");
        let store = Rc::new(RecordStore::open(&key));
        stores.insert(key, Rc::clone(&store));
        store
    }

    /// Returns a typed table over the shared store for `path`.
    pub fn table<R: Record, P: AsRef<Path>>(&self, path: P) -> Table<R> {
        Table::new(self.get_or_create(path))
    }

    /// Returns the number of distinct stores opened so far.
    pub fn len(&self) -> usize {
        self.stores.borrow().len()
    }

    /// Returns `true` if no store has been opened.
    pub fn is_empty(&self) -> bool {
        self.stores.borrow().is_empty()
    }

    /// Returns the paths of all opened stores, sorted.
    pub fn paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<_> = self.stores.borrow().keys().cloned().collect();
        paths.sort();
        paths
    }
}

fn normalize(path: &Path) -> PathBuf {
    path.components().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Row;
    use tempfile::tempdir;

    #[test]
    fn test_same_path_returns_same_instance() {
        let registry = StoreRegistry::new();
        let a = registry.get_or_create("data/users.csv");
        let b = registry.get_or_create("data/users.csv");

        assert!(Rc::ptr_eq(&a, &b));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_equivalent_spellings_share_an_instance() {
        let registry = StoreRegistry::new();
        let a = registry.get_or_create("data/users.csv");
        let b = registry.get_or_create("data/./users.csv");
        let c = registry.get_or_create("data//users.csv");

        assert!(Rc::ptr_eq(&a, &b));
        assert!(Rc::ptr_eq(&a, &c));
    }

    #[test]
    fn test_different_paths_get_different_instances() {
        let registry = StoreRegistry::new();
        let a = registry.get_or_create("data/users.csv");
        let b = registry.get_or_create("data/alerts.csv");

        assert!(!Rc::ptr_eq(&a, &b));
        assert_eq!(
            registry.paths(),
            vec![PathBuf::from("data/alerts.csv"), PathBuf::from("data/users.csv")]
        );
    }

    #[test]
    fn test_write_through_one_handle_is_visible_through_another() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("users.csv");
        let registry = StoreRegistry::new();

        let writer = registry.get_or_create(&path);
        let reader = registry.get_or_create(&path);
        writer
            .write(&["id", "name"], &[Row::new().with("id", "1").with("name", "Ana")])
            .unwrap();

        let rows = reader.read().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].text("name"), "Ana");
    }
}
