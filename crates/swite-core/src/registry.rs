//! Package registry: a name to directory index over one or more roots.
//!
//! A single recursive scan runs at startup; `rescan` replays the same roots
//! when a lookup misses. Readers get owned snapshots so the lock is never
//! held across resolution work.

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::path::{Path, PathBuf};

use crate::manifest::PackageManifest;

/// Maximum directory depth examined below each scan root.
const MAX_SCAN_DEPTH: usize = 15;

/// Directory names never descended into.
const SKIP_DIRS: &[&str] = &["node_modules", "dist", ".git", ".swite"];

#[derive(Default)]
struct RegistryInner {
    packages: FxHashMap<String, PathBuf>,
    roots: Vec<PathBuf>,
    scanned: bool,
}

/// Name to package-directory index.
///
/// The index is a partial injection: the first directory discovered for a
/// name wins, later occurrences are logged and dropped.
pub struct PackageRegistry {
    inner: RwLock<RegistryInner>,
}

impl PackageRegistry {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(RegistryInner::default()),
        }
    }

    /// Scan `primary_root` and `extra_roots`, building the index.
    ///
    /// Idempotent on the same instance: repeating a scan over the same roots
    /// leaves the index unchanged.
    pub fn scan(&self, primary_root: &Path, extra_roots: &[PathBuf]) {
        let mut roots = vec![primary_root.to_path_buf()];
        roots.extend(extra_roots.iter().cloned());

        {
            let inner = self.inner.read();
            if inner.scanned && inner.roots == roots {
                return;
            }
        }

        let mut packages = FxHashMap::default();
        for root in &roots {
            scan_dir(root, 0, &mut packages);
        }
        tracing::info!(count = packages.len(), "package registry scan complete");

        let mut inner = self.inner.write();
        inner.packages = packages;
        inner.roots = roots;
        inner.scanned = true;
    }

    /// Replay the last scan over the same roots.
    pub fn rescan(&self) {
        let roots = self.inner.read().roots.clone();
        if roots.is_empty() {
            return;
        }

        let mut packages = FxHashMap::default();
        for root in &roots {
            scan_dir(root, 0, &mut packages);
        }
        tracing::info!(count = packages.len(), "package registry rescan complete");

        self.inner.write().packages = packages;
    }

    /// Directory of the first package discovered under `name`.
    pub fn find(&self, name: &str) -> Option<PathBuf> {
        let inner = self.inner.read();
        debug_assert!(inner.scanned, "registry queried before scan");
        inner.packages.get(name).cloned()
    }

    /// Snapshot of every (name, directory) pair, sorted by name.
    pub fn all(&self) -> Vec<(String, PathBuf)> {
        let inner = self.inner.read();
        let mut entries: Vec<_> = inner
            .packages
            .iter()
            .map(|(name, dir)| (name.clone(), dir.clone()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }

    /// True once `scan` has run.
    pub fn is_scanned(&self) -> bool {
        self.inner.read().scanned
    }

    /// True if `path` lies under any indexed package directory.
    pub fn contains_path(&self, path: &Path) -> bool {
        let inner = self.inner.read();
        inner.packages.values().any(|dir| path.starts_with(dir))
    }
}

impl Default for PackageRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn scan_dir(dir: &Path, depth: usize, packages: &mut FxHashMap<String, PathBuf>) {
    if depth > MAX_SCAN_DEPTH {
        return;
    }

    if let Some(manifest) = PackageManifest::load_dir(dir) {
        if let Some(name) = manifest.name {
            if let Some(existing) = packages.get(&name) {
                if existing != dir {
                    tracing::warn!(
                        package = %name,
                        kept = %existing.display(),
                        ignored = %dir.display(),
                        "duplicate package name, keeping first discovered"
                    );
                }
            } else {
                packages.insert(name, dir.to_path_buf());
            }
        }
    }

    let Ok(read_dir) = std::fs::read_dir(dir) else {
        return;
    };

    // Deterministic traversal order so first-wins is stable across runs.
    let mut children: Vec<PathBuf> = read_dir
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    children.sort();

    for child in children {
        let Some(name) = child.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if name.starts_with('.') || SKIP_DIRS.contains(&name) {
            continue;
        }
        scan_dir(&child, depth + 1, packages);
    }
}
