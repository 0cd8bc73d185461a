//! One persisted cache namespace.
//!
//! Entries live in a moka cache for the session and are written to a single
//! versioned JSON file on [`DiskNamespace::flush`]. Writes go through a
//! uniquely named temp file and a rename, so readers never observe a
//! half-written file.
//!
//! Flushing merges with whatever is currently on disk: keys written by
//! another scraper instance survive, and for keys both instances hold the
//! last flush wins. The load-merge-save cycle runs under an exclusive
//! advisory lock on a sibling `.lock` file, so concurrent flushes of the
//! same namespace (from any process) are serialized.

use std::collections::{BTreeMap, HashSet};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use moka::sync::Cache;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{CacheKey, Namespace};
use crate::telemetry;
use crate::{Result, ScrapeError};

/// Maximum supported cache file format version.
const FORMAT_VERSION: u32 = 1;

#[derive(Deserialize)]
struct CacheFile<T> {
    version: u32,
    entries: BTreeMap<String, T>,
}

#[derive(Serialize)]
struct CacheFileRef<'a, T> {
    version: u32,
    entries: &'a BTreeMap<String, T>,
}

/// Pending changes not yet flushed.
#[derive(Default)]
struct Pending {
    dirty: bool,
    /// Keys invalidated this session; not resurrected from disk on merge.
    removed: HashSet<String>,
    /// Whole namespace cleared this session; on-disk entries are dropped.
    cleared: bool,
}

/// A single cache namespace persisted as one JSON file.
pub struct DiskNamespace<T> {
    namespace: Namespace,
    path: Option<PathBuf>,
    entries: Cache<String, T>,
    pending: Mutex<Pending>,
    poison_warned: AtomicBool,
}

impl<T> DiskNamespace<T>
where
    T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    /// Open the namespace stored at `path`, loading existing entries.
    ///
    /// A missing file starts an empty namespace. A corrupt or unsupported
    /// file is logged and ignored; it is overwritten by the next flush.
    pub fn open(namespace: Namespace, path: PathBuf) -> Self {
        let entries = Cache::builder().build();
        if let Some(loaded) = load_file::<T>(&path) {
            debug!(
                namespace = %namespace,
                path = %path.display(),
                count = loaded.len(),
                "loaded cache namespace"
            );
            for (key, value) in loaded {
                entries.insert(key, value);
            }
        }
        Self {
            namespace,
            path: Some(path),
            entries,
            pending: Mutex::new(Pending::default()),
            poison_warned: AtomicBool::new(false),
        }
    }

    /// Namespace that lives only for this session.
    pub fn ephemeral(namespace: Namespace) -> Self {
        Self {
            namespace,
            path: None,
            entries: Cache::builder().build(),
            pending: Mutex::new(Pending::default()),
            poison_warned: AtomicBool::new(false),
        }
    }

    pub fn namespace(&self) -> Namespace {
        self.namespace
    }

    /// Location of the backing file, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn has(&self, key: &CacheKey) -> bool {
        self.entries.contains_key(key.as_str())
    }

    /// Fetch an entry that is known to exist.
    ///
    /// Returns [`ScrapeError::CacheMiss`] when `has(key)` is false.
    pub fn get(&self, key: &CacheKey) -> Result<T> {
        self.entries
            .get(key.as_str())
            .ok_or_else(|| ScrapeError::CacheMiss {
                namespace: self.namespace.as_str(),
                key: key.to_string(),
            })
    }

    /// Read-through lookup. Records cache hit/miss metrics.
    pub fn lookup(&self, key: &CacheKey) -> Option<T> {
        let found = self.entries.get(key.as_str());
        let counter = if found.is_some() {
            telemetry::CACHE_HITS_TOTAL
        } else {
            telemetry::CACHE_MISSES_TOTAL
        };
        metrics::counter!(counter, "namespace" => self.namespace.as_str()).increment(1);
        found
    }

    /// Insert or replace an entry.
    pub fn put(&self, key: &CacheKey, value: T) {
        self.entries.insert(key.as_str().to_string(), value);
        self.with_pending(|p| {
            p.dirty = true;
            p.removed.remove(key.as_str());
        });
    }

    /// Drop one entry, forcing the next request to refetch.
    pub fn invalidate(&self, key: &CacheKey) {
        self.entries.invalidate(key.as_str());
        self.with_pending(|p| {
            p.dirty = true;
            p.removed.insert(key.as_str().to_string());
        });
    }

    /// Drop every entry of this namespace.
    pub fn clear(&self) {
        self.entries.invalidate_all();
        self.entries.run_pending_tasks();
        self.with_pending(|p| {
            p.dirty = true;
            p.cleared = true;
            p.removed.clear();
        });
    }

    pub fn len(&self) -> usize {
        self.entries.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Durably persist pending entries. No-op when nothing changed or the
    /// namespace is ephemeral.
    pub fn flush(&self) -> Result<()> {
        let Some(path) = self.path.as_deref() else {
            return Ok(());
        };
        let mut pending = self
            .pending
            .lock()
            .map_err(|_| ScrapeError::Cache("cache flush lock poisoned".to_string()))?;
        if !pending.dirty {
            return Ok(());
        }

        // Held until the end of the flush; released when dropped.
        let _lock = lock_file(path)?;
        let mut merged = if pending.cleared {
            BTreeMap::new()
        } else {
            load_file::<T>(path).unwrap_or_default()
        };
        for key in &pending.removed {
            merged.remove(key);
        }
        for (key, value) in &self.entries {
            merged.insert(key.as_ref().clone(), value);
        }

        save_file(path, &merged)?;
        debug!(
            namespace = %self.namespace,
            path = %path.display(),
            count = merged.len(),
            "flushed cache namespace"
        );
        *pending = Pending::default();
        Ok(())
    }

    fn with_pending(&self, f: impl FnOnce(&mut Pending)) {
        match self.pending.lock() {
            Ok(mut pending) => f(&mut pending),
            Err(poisoned) => {
                if !self.poison_warned.swap(true, Ordering::Relaxed) {
                    warn!(namespace = %self.namespace, "cache bookkeeping lock poisoned");
                }
                f(&mut poisoned.into_inner());
            }
        }
    }
}

/// Load a namespace file.
///
/// Returns `None` on a missing or corrupt file (logs a warning on corrupt).
fn load_file<T: DeserializeOwned>(path: &Path) -> Option<BTreeMap<String, T>> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to read cache file");
            return None;
        }
    };
    match serde_json::from_str::<CacheFile<T>>(&content) {
        Ok(file) if file.version <= FORMAT_VERSION => Some(file.entries),
        Ok(file) => {
            warn!(
                path = %path.display(),
                version = file.version,
                "unsupported cache file version"
            );
            None
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "corrupt cache file");
            None
        }
    }
}

/// Take the exclusive advisory lock guarding `path`, creating its directory.
fn lock_file(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            ScrapeError::Cache(format!(
                "failed to create cache dir {}: {e}",
                parent.display()
            ))
        })?;
    }
    let lock_path = path.with_extension("json.lock");
    let file = OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(&lock_path)
        .map_err(|e| {
            ScrapeError::Cache(format!(
                "failed to open cache lock {}: {e}",
                lock_path.display()
            ))
        })?;
    file.lock().map_err(|e| {
        ScrapeError::Cache(format!(
            "failed to lock cache file {}: {e}",
            lock_path.display()
        ))
    })?;
    Ok(file)
}

/// Save a namespace file (atomic write via a unique temp file + rename).
fn save_file<T: Serialize>(path: &Path, entries: &BTreeMap<String, T>) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let file = CacheFileRef {
        version: FORMAT_VERSION,
        entries,
    };
    let json = serde_json::to_vec(&file)
        .map_err(|e| ScrapeError::Cache(format!("failed to serialize cache: {e}")))?;

    let mut tmp = tempfile::Builder::new()
        .prefix(".gridscrape-")
        .suffix(".tmp")
        .tempfile_in(dir)
        .map_err(|e| {
            ScrapeError::Cache(format!(
                "failed to create temp file in {}: {e}",
                dir.display()
            ))
        })?;
    tmp.write_all(&json).map_err(|e| {
        ScrapeError::Cache(format!(
            "failed to write cache file {}: {e}",
            tmp.path().display()
        ))
    })?;
    tmp.persist(path).map_err(|e| {
        ScrapeError::Cache(format!(
            "failed to rename cache file {} → {}: {}",
            e.file.path().display(),
            path.display(),
            e.error
        ))
    })?;

    Ok(())
}
