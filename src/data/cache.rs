use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::error::DataLoadError;
use super::loader::load_file;
use super::model::Table;

// ---------------------------------------------------------------------------
// Dataset cache: path → loaded table
// ---------------------------------------------------------------------------

/// Explicit load cache, created at startup and owned by the application.
///
/// Tables are immutable after load and handed out as `Arc<Table>`, so every
/// caller of [`DatasetCache::load`] with the same path shares one allocation.
/// Entries live until [`DatasetCache::reload`] replaces them; a failed load
/// never inserts anything.
#[derive(Debug, Default)]
pub struct DatasetCache {
    entries: HashMap<PathBuf, Arc<Table>>,
}

impl DatasetCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached table for `path`, reading the file on first use.
    pub fn load(&mut self, path: &Path) -> Result<Arc<Table>, DataLoadError> {
        if let Some(table) = self.entries.get(path) {
            log::debug!("Dataset cache hit for {}", path.display());
            return Ok(Arc::clone(table));
        }
        self.read_into_cache(path)
    }

    /// Re-read `path` from disk, replacing any cached entry.
    ///
    /// On failure the previous entry (if any) is dropped as well, so a stale
    /// table is never served after a reload was requested.
    pub fn reload(&mut self, path: &Path) -> Result<Arc<Table>, DataLoadError> {
        if self.entries.remove(path).is_some() {
            log::info!("Reloading {}", path.display());
        }
        self.read_into_cache(path)
    }

    /// Whether `path` has a cached table.
    pub fn contains(&self, path: &Path) -> bool {
        self.entries.contains_key(path)
    }

    /// Number of cached tables.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn read_into_cache(&mut self, path: &Path) -> Result<Arc<Table>, DataLoadError> {
        let table = Arc::new(load_file(path)?);
        self.entries.insert(path.to_path_buf(), Arc::clone(&table));
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::*;

    const CSV: &str = "Date,City,Product line,Unit price,Quantity,Total,gross income,Rating\n\
                       2024-01-01,A,X,50,2,100,5,8\n";

    #[test]
    fn second_load_returns_same_table_without_reading() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.csv");
        fs::write(&path, CSV).unwrap();

        let mut cache = DatasetCache::new();
        let first = cache.load(&path).unwrap();

        // The file is gone; a cache hit must not touch the filesystem.
        fs::remove_file(&path).unwrap();
        let second = cache.load(&path).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn reload_reads_the_file_again() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.csv");
        fs::write(&path, CSV).unwrap();

        let mut cache = DatasetCache::new();
        let first = cache.load(&path).unwrap();
        fs::write(&path, format!("{CSV}2024-01-02,B,Y,25,2,50,2.5,6\n")).unwrap();

        assert_eq!(cache.load(&path).unwrap().len(), 1);
        let reloaded = cache.reload(&path).unwrap();
        assert_eq!(reloaded.len(), 2);
        assert!(!Arc::ptr_eq(&first, &reloaded));
        assert!(Arc::ptr_eq(&reloaded, &cache.load(&path).unwrap()));
    }

    #[test]
    fn failed_load_is_not_cached() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing.csv");

        let mut cache = DatasetCache::new();
        assert!(cache.load(&path).is_err());
        assert!(!cache.contains(&path));
        assert!(cache.is_empty());
    }
}
