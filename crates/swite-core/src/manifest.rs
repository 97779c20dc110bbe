//! Package manifest (`package.json`) parsing and export-map resolution.
//!
//! Focuses on the fields the resolver needs: `name`, the entry fields
//! (`main`, `module`), the `exports` map, and `workspaces`. Everything else
//! in a manifest is ignored.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{CoreError, Result};

/// Maximum allowed size for manifest files (10MB)
const MAX_MANIFEST_SIZE: u64 = 10 * 1024 * 1024;

/// A single export target: either a relative file or a condition map
/// (`import`, `default`, ...) whose values are targets in turn.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ExportTarget {
    /// Direct relative path, e.g. `"./dist/index.js"`
    Path(String),
    /// Conditional object, e.g. `{ "import": "./dist/index.mjs" }`
    Conditions(BTreeMap<String, ExportTarget>),
}

impl ExportTarget {
    /// Flatten a target to a relative file path, preferring the `import`
    /// condition, then `default`, then `browser`.
    pub fn file(&self) -> Option<&str> {
        match self {
            ExportTarget::Path(p) => Some(p),
            ExportTarget::Conditions(map) => ["import", "default", "browser"]
                .iter()
                .find_map(|cond| map.get(*cond))
                .and_then(|t| t.file()),
        }
    }
}

/// The `exports` field: either a single target for the bare name or a
/// subpath map keyed by `"."`, `"./client"`, `"./client/*"`, ...
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ExportsField {
    Single(ExportTarget),
    Map(BTreeMap<String, ExportTarget>),
}

/// Parsed package manifest.
#[derive(Debug, Clone, Deserialize)]
pub struct PackageManifest {
    /// Package name, possibly scoped (`@scope/name`)
    pub name: Option<String>,
    /// Package version
    pub version: Option<String>,
    /// CommonJS entry point
    pub main: Option<String>,
    /// ESM entry point
    pub module: Option<String>,
    /// Export map from subpath to relative file
    pub exports: Option<ExportsField>,
    /// Workspace member globs (top-level workspace manifests only)
    #[serde(default)]
    pub workspaces: Vec<String>,
    /// Directory this manifest was loaded from
    #[serde(skip)]
    pub dir: PathBuf,
}

impl PackageManifest {
    /// Load and parse a `package.json` file.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Manifest` for unreadable, oversized, or
    /// syntactically invalid manifests.
    pub fn load(path: &Path) -> Result<Self> {
        let metadata = std::fs::metadata(path).map_err(|e| CoreError::Manifest {
            path: path.to_path_buf(),
            message: format!("cannot stat manifest: {e}"),
        })?;
        if metadata.len() > MAX_MANIFEST_SIZE {
            return Err(CoreError::Manifest {
                path: path.to_path_buf(),
                message: format!(
                    "manifest exceeds maximum size of {}MB",
                    MAX_MANIFEST_SIZE / 1024 / 1024
                ),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| CoreError::Manifest {
            path: path.to_path_buf(),
            message: format!("cannot read manifest: {e}"),
        })?;

        let mut manifest: PackageManifest =
            serde_json::from_str(&content).map_err(|e| CoreError::Manifest {
                path: path.to_path_buf(),
                message: format!("invalid JSON: {e}"),
            })?;

        manifest.dir = path.parent().unwrap_or(Path::new("")).to_path_buf();
        Ok(manifest)
    }

    /// Load the manifest of a package directory, if one is present and valid.
    pub fn load_dir(dir: &Path) -> Option<Self> {
        let manifest_path = dir.join("package.json");
        if !manifest_path.is_file() {
            return None;
        }
        Self::load(&manifest_path).ok()
    }

    /// True if this manifest marks a workspace root (a `workspaces` field).
    pub fn is_workspace_root(&self) -> bool {
        !self.workspaces.is_empty()
    }

    /// Resolve a subpath through the export map.
    ///
    /// Lookup order: exact key, wildcard/trailing-directory key, then a key
    /// matching the subpath's first segment. The empty subpath resolves the
    /// `"."` entry (or the single top-level target).
    ///
    /// Returns the target file path relative to the package directory.
    pub fn resolve_export(&self, subpath: &str) -> Option<String> {
        let exports = self.exports.as_ref()?;

        let map = match exports {
            ExportsField::Single(target) => {
                return if subpath.is_empty() {
                    target.file().map(str::to_string)
                } else {
                    None
                };
            }
            ExportsField::Map(map) => map,
        };

        let key = if subpath.is_empty() {
            ".".to_string()
        } else {
            format!("./{subpath}")
        };

        // Exact key
        if let Some(target) = map.get(&key) {
            return target.file().map(str::to_string);
        }
        if subpath.is_empty() {
            return None;
        }

        // Wildcard keys: "./client/*" matches "client/foo"
        for (map_key, target) in map {
            if let Some(prefix) = map_key.strip_suffix("/*") {
                if let Some(rest) = key.strip_prefix(prefix).and_then(|r| r.strip_prefix('/')) {
                    let file = target.file()?;
                    return Some(file.replace('*', rest));
                }
            }
        }

        // Trailing-directory match: key "./client" for subpath "dist/client"
        let last_segment = subpath.rsplit('/').next().unwrap_or(subpath);
        let trailing_key = format!("./{last_segment}");
        if let Some(target) = map.get(&trailing_key) {
            return target.file().map(str::to_string);
        }

        // First-segment match: key "./client" for subpath "client/extra"
        let first_segment = subpath.split('/').next().unwrap_or(subpath);
        let first_key = format!("./{first_segment}");
        if let Some(target) = map.get(&first_key) {
            return target.file().map(str::to_string);
        }

        None
    }

    /// Preferred bare entry file relative to the package directory.
    ///
    /// Consults the export map first, then `module`, then `main`.
    pub fn entry_file(&self) -> Option<String> {
        self.resolve_export("")
            .or_else(|| self.module.clone())
            .or_else(|| self.main.clone())
    }
}

/// Split an import specifier into package name and subpath.
///
/// Handles scoped packages:
/// - `@swissjs/core` -> (`@swissjs/core`, ``)
/// - `@swissjs/core/jsx-runtime` -> (`@swissjs/core`, `jsx-runtime`)
/// - `lodash/fp` -> (`lodash`, `fp`)
pub fn split_specifier(specifier: &str) -> (&str, &str) {
    if specifier.is_empty() {
        return (specifier, "");
    }

    if let Some(rest) = specifier.strip_prefix('@') {
        if let Some(first_slash) = rest.find('/') {
            let after_scope = &rest[first_slash + 1..];
            if let Some(second_slash) = after_scope.find('/') {
                let name_len = 1 + first_slash + 1 + second_slash;
                return (&specifier[..name_len], &specifier[name_len + 1..]);
            }
        }
        return (specifier, "");
    }

    match specifier.find('/') {
        Some(idx) => (&specifier[..idx], &specifier[idx + 1..]),
        None => (specifier, ""),
    }
}
