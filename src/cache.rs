/// Per-path cache of normalized tables
///
/// Loading and normalizing a source is the expensive step of a dashboard
/// session; every filter change afterwards works off the same immutable
/// table. `TableCache` keeps one `Arc<NormalizedTable>` per source path and
/// rebuilds it only when asked to and the file contents actually changed.
///
/// Sources that fail to load are cached as empty tables (the load report
/// carries the error), so a broken file is reported once rather than on every
/// query. `reload` retries.

use crate::error::DataLoadError;
use crate::loader::{load_bytes_or_empty, Loaded, SourceFormat};
use crate::table::{LoadReport, NormalizeOptions, NormalizedTable};
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::fs;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

/// 64-bit content hash of a source file.
pub fn fingerprint(bytes: &[u8]) -> u64 {
    let mut hasher = DefaultHasher::new();
    bytes.hash(&mut hasher);
    hasher.finish()
}

/// A cached table and the report from building it.
#[derive(Debug, Clone)]
pub struct CachedTable {
    pub table: Arc<NormalizedTable>,
    pub report: Arc<LoadReport>,
    /// None when the file could not be read.
    pub fingerprint: Option<u64>,
}

impl CachedTable {
    fn new(loaded: Loaded, fingerprint: Option<u64>) -> Self {
        CachedTable {
            table: Arc::new(loaded.table),
            report: Arc::new(loaded.report),
            fingerprint,
        }
    }
}

#[derive(Debug, Default)]
pub struct TableCache {
    options: NormalizeOptions,
    entries: RwLock<HashMap<PathBuf, CachedTable>>,
}

impl TableCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: NormalizeOptions) -> Self {
        TableCache {
            options,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Cached table for `path`, loading it on first use. A cached entry is
    /// returned without touching the file.
    pub fn get_or_load(&self, path: impl AsRef<Path>) -> CachedTable {
        let path = path.as_ref();
        if let Some(entry) = self.get(path) {
            return entry;
        }

        let built = self.build(path);
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        // Another caller may have loaded the same path meanwhile; keep theirs.
        entries.entry(path.to_path_buf()).or_insert(built).clone()
    }

    /// Re-read `path` and rebuild its table if the contents changed.
    ///
    /// Returns the current entry and whether it was rebuilt.
    pub fn reload(&self, path: impl AsRef<Path>) -> (CachedTable, bool) {
        let path = path.as_ref();
        let built = self.build(path);

        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(current) = entries.get(path) {
            if current.fingerprint.is_some() && current.fingerprint == built.fingerprint {
                log::debug!("{} unchanged, keeping cached table", path.display());
                return (current.clone(), false);
            }
        }

        log::info!(
            "rebuilt table for {} ({} rows)",
            path.display(),
            built.table.len()
        );
        entries.insert(path.to_path_buf(), built.clone());
        (built, true)
    }

    /// Cached entry for `path`, if any.
    pub fn get(&self, path: impl AsRef<Path>) -> Option<CachedTable> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(path.as_ref())
            .cloned()
    }

    /// Drop the entry for `path`. Returns true if there was one.
    pub fn invalidate(&self, path: impl AsRef<Path>) -> bool {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(path.as_ref())
            .is_some()
    }

    pub fn clear(&self) {
        self.entries.write().unwrap_or_else(PoisonError::into_inner).clear();
    }

    pub fn contains(&self, path: impl AsRef<Path>) -> bool {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(path.as_ref())
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn build(&self, path: &Path) -> CachedTable {
        match fs::read(path) {
            Ok(bytes) => {
                log::info!("loading {} ({} bytes)", path.display(), bytes.len());
                let loaded = load_bytes_or_empty(&bytes, SourceFormat::from_path(path), &self.options);
                CachedTable::new(loaded, Some(fingerprint(&bytes)))
            }
            Err(e) => CachedTable::new(Loaded::failed(&DataLoadError::Io(e)), None),
        }
    }
}
