//! Compilation cache keyed by absolute source path.
//!
//! An entry stays live only while the source mtime, the resolved dependency
//! list, and every dependency's mtime still match what was recorded at
//! build time. Eviction is FIFO under a fixed capacity. Per-key build locks
//! give the at-most-one-build-in-flight guarantee; a second requester for
//! the same path waits and then observes the first build's result.

use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashMap;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

/// Maximum number of live entries.
pub const DEFAULT_CACHE_CAPACITY: usize = 1000;

/// One cached compilation.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// Raw compiler output, before import rewriting
    pub compiled: String,
    /// Final rewritten script served to browsers
    pub rewritten: String,
    /// Source file mtime at build time
    pub mtime: SystemTime,
    /// Resolved dependency paths, in import order
    pub deps: Vec<PathBuf>,
    /// Wall-clock instant the entry was created
    pub created: SystemTime,
}

#[derive(Default)]
struct CacheInner {
    entries: FxHashMap<PathBuf, CacheEntry>,
    /// Insertion order; each live key appears exactly once
    order: VecDeque<PathBuf>,
}

/// Dependency-aware compilation cache with FIFO eviction.
pub struct CompilationCache {
    inner: RwLock<CacheInner>,
    builds: Mutex<FxHashMap<PathBuf, Arc<tokio::sync::Mutex<()>>>>,
    capacity: usize,
}

impl CompilationCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: RwLock::new(CacheInner::default()),
            builds: Mutex::new(FxHashMap::default()),
            capacity,
        }
    }

    pub fn with_default_capacity() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }

    /// Rewritten script for `path`, if the entry is still live.
    ///
    /// `deps_of` recomputes the resolved dependency list from the recorded
    /// compiler output; callers supply a closure backed by the resolver.
    pub fn get(
        &self,
        path: &Path,
        deps_of: impl FnOnce(&str) -> Vec<PathBuf>,
    ) -> Option<String> {
        let entry = self.inner.read().entries.get(path).cloned()?;

        let current_mtime = std::fs::metadata(path).and_then(|m| m.modified()).ok();
        if current_mtime != Some(entry.mtime) {
            tracing::debug!(path = %path.display(), "cache invalidated: file modified");
            self.invalidate(path);
            return None;
        }

        let current_deps = deps_of(&entry.compiled);
        if current_deps != entry.deps {
            tracing::debug!(path = %path.display(), "cache invalidated: dependency set changed");
            self.invalidate(path);
            return None;
        }

        for dep in &entry.deps {
            let dep_mtime = std::fs::metadata(dep).and_then(|m| m.modified()).ok();
            let fresh = dep_mtime.is_some_and(|m| m <= entry.created);
            if !fresh {
                tracing::debug!(
                    path = %path.display(),
                    dep = %dep.display(),
                    "cache invalidated: dependency modified"
                );
                self.invalidate(path);
                return None;
            }
        }

        tracing::debug!(path = %path.display(), "cache hit");
        Some(entry.rewritten)
    }

    /// Record a fresh build, evicting the oldest entry at capacity.
    pub fn set(&self, path: &Path, compiled: String, rewritten: String, deps: Vec<PathBuf>) {
        let mtime = std::fs::metadata(path)
            .and_then(|m| m.modified())
            .unwrap_or(SystemTime::UNIX_EPOCH);

        let entry = CacheEntry {
            compiled,
            rewritten,
            mtime,
            deps,
            created: SystemTime::now(),
        };

        let mut inner = self.inner.write();
        if inner.entries.insert(path.to_path_buf(), entry).is_none() {
            inner.order.push_back(path.to_path_buf());
        }
        while inner.entries.len() > self.capacity {
            let Some(oldest) = inner.order.pop_front() else {
                break;
            };
            inner.entries.remove(&oldest);
            tracing::debug!(path = %oldest.display(), "cache evicted (capacity)");
        }
    }

    /// Drop the entry for `path`. Returns true if one existed.
    pub fn invalidate(&self, path: &Path) -> bool {
        let mut inner = self.inner.write();
        let existed = inner.entries.remove(path).is_some();
        if existed {
            inner.order.retain(|p| p != path);
        }
        existed
    }

    /// Drop the entry for a changed file and every entry depending on it.
    /// Returns the number of entries removed.
    pub fn invalidate_affected(&self, changed: &Path) -> usize {
        let mut inner = self.inner.write();
        let affected: Vec<PathBuf> = inner
            .entries
            .iter()
            .filter(|(key, entry)| *key == changed || entry.deps.iter().any(|d| d == changed))
            .map(|(key, _)| key.clone())
            .collect();
        for key in &affected {
            inner.entries.remove(key);
            inner.order.retain(|p| p != key);
        }
        affected.len()
    }

    pub fn clear(&self) {
        let mut inner = self.inner.write();
        inner.entries.clear();
        inner.order.clear();
    }

    pub fn len(&self) -> usize {
        self.inner.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.inner.read().entries.contains_key(path)
    }

    /// Per-key build lock. Holding the lock across compile+set serializes
    /// concurrent builds of the same path.
    pub fn build_lock(&self, path: &Path) -> Arc<tokio::sync::Mutex<()>> {
        let mut builds = self.builds.lock();
        if builds.len() > self.capacity {
            builds.retain(|_, lock| Arc::strong_count(lock) > 1);
        }
        builds
            .entry(path.to_path_buf())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }
}
