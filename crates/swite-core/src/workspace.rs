//! Workspace and framework monorepo discovery.
//!
//! Walks upward from a starting directory looking for the nearest workspace
//! root and the framework monorepo. Both walks are bounded and memoized; a
//! miss is an `Option::None`, never an error.

use parking_lot::RwLock;
use std::path::{Path, PathBuf};

use crate::manifest::PackageManifest;

/// Maximum number of parent directories examined by either walk.
const MAX_UPWARD_WALK: usize = 10;

/// Directory names that mark a workspace as holding packages.
pub const PACKAGE_DIRS: &[&str] = &["lib", "packages", "libraries", "modules"];

/// On-disk directory name of the framework monorepo.
pub const FRAMEWORK_DIR_NAME: &str = "swiss-lib";

#[derive(Default)]
struct LocatorCache {
    workspace_root: Option<Option<PathBuf>>,
    framework_root: Option<Option<PathBuf>>,
}

/// Locates workspace and framework roots, caching results for the life of
/// the instance.
///
/// Lookups are pure with respect to the filesystem at the moment of the
/// first call; nothing is ever created or modified.
pub struct WorkspaceLocator {
    cache: RwLock<LocatorCache>,
}

impl WorkspaceLocator {
    pub fn new() -> Self {
        Self {
            cache: RwLock::new(LocatorCache::default()),
        }
    }

    /// Find the nearest ancestor of `start` that is a workspace root.
    ///
    /// A workspace root holds a workspace marker (`pnpm-workspace.yaml` or a
    /// manifest with a `workspaces` field) and at least one of the
    /// recognized package-holding directories.
    pub fn find_workspace_root(&self, start: &Path) -> Option<PathBuf> {
        if let Some(cached) = &self.cache.read().workspace_root {
            return cached.clone();
        }

        let found = walk_up(start, is_workspace_root);
        self.cache.write().workspace_root = Some(found.clone());
        if let Some(root) = &found {
            tracing::debug!(root = %root.display(), "workspace root located");
        }
        found
    }

    /// Find the framework monorepo reachable from `start`.
    ///
    /// The monorepo is a directory named like the framework root containing
    /// a `packages` subdirectory, found either as an ancestor or as a direct
    /// child of an ancestor.
    pub fn find_framework_monorepo(&self, start: &Path) -> Option<PathBuf> {
        if let Some(cached) = &self.cache.read().framework_root {
            return cached.clone();
        }

        let found = walk_up(start, |dir| {
            if is_framework_root(dir) {
                return Some(dir.to_path_buf());
            }
            let child = dir.join(FRAMEWORK_DIR_NAME);
            if is_framework_root(&child) {
                return Some(child);
            }
            None
        });
        self.cache.write().framework_root = Some(found.clone());
        if let Some(root) = &found {
            tracing::debug!(root = %root.display(), "framework monorepo located");
        }
        found
    }
}

impl Default for WorkspaceLocator {
    fn default() -> Self {
        Self::new()
    }
}

fn walk_up(start: &Path, check: impl Fn(&Path) -> Option<PathBuf>) -> Option<PathBuf> {
    let mut current = Some(start);
    for _ in 0..MAX_UPWARD_WALK {
        let dir = current?;
        if let Some(hit) = check(dir) {
            return Some(hit);
        }
        current = dir.parent();
    }
    None
}

fn is_workspace_root(dir: &Path) -> Option<PathBuf> {
    let has_marker = dir.join("pnpm-workspace.yaml").is_file()
        || PackageManifest::load_dir(dir).is_some_and(|m| m.is_workspace_root());
    if !has_marker {
        return None;
    }
    let has_package_dir = PACKAGE_DIRS.iter().any(|d| dir.join(d).is_dir());
    has_package_dir.then(|| dir.to_path_buf())
}

fn is_framework_root(dir: &Path) -> bool {
    dir.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.eq_ignore_ascii_case(FRAMEWORK_DIR_NAME))
        && dir.join("packages").is_dir()
}
