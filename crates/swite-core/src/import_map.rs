//! Pre-computed import map: bare specifier to canonical URL.
//!
//! The generator runs at build time (or via `swite import-map`) and writes a
//! JSON document under the application's scratch directory. The pipeline
//! loads the document once at startup and consults it before any dynamic
//! resolution; an absent file simply disables the fast path.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::Result;
use crate::manifest::PackageManifest;
use crate::registry::PackageRegistry;
use crate::resolver::SOURCE_EXTENSIONS;
use crate::urls::{prefer_source, UrlContext};

/// Document format version.
pub const IMPORT_MAP_VERSION: &str = "1.0";

/// Scratch directory under the application root.
pub const SCRATCH_DIR: &str = ".swite";

/// File name of the serialized map.
pub const IMPORT_MAP_FILE: &str = "import-map.json";

/// Subpaths pre-resolved for every package in addition to its main entry.
pub const WELL_KNOWN_SUBPATHS: &[&str] = &["jsx-runtime", "client", "server", "utils"];

/// On-disk shape of the import map.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportMapDocument {
    pub version: String,
    /// Generation instant, epoch milliseconds
    pub generated: u64,
    pub imports: BTreeMap<String, String>,
}

/// Loaded import map consulted by the resolver's fast path.
#[derive(Debug, Default, Clone)]
pub struct ImportMap {
    imports: FxHashMap<String, String>,
}

impl ImportMap {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load the map from `{app_root}/.swite/import-map.json`.
    ///
    /// An absent or unreadable file yields an empty map; the pipeline falls
    /// back to dynamic resolution.
    pub fn load(app_root: &Path) -> Self {
        let path = app_root.join(SCRATCH_DIR).join(IMPORT_MAP_FILE);
        let Ok(content) = std::fs::read_to_string(&path) else {
            tracing::debug!(path = %path.display(), "no import map, using dynamic resolution");
            return Self::empty();
        };
        match serde_json::from_str::<ImportMapDocument>(&content) {
            Ok(doc) => {
                tracing::info!(
                    entries = doc.imports.len(),
                    path = %path.display(),
                    "import map loaded"
                );
                Self::from_document(doc)
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "invalid import map, ignoring");
                Self::empty()
            }
        }
    }

    pub fn from_document(doc: ImportMapDocument) -> Self {
        Self {
            imports: doc.imports.into_iter().collect(),
        }
    }

    /// Mapped URL for a bare specifier, if pre-resolved.
    pub fn lookup(&self, specifier: &str) -> Option<&str> {
        self.imports.get(specifier).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.imports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.imports.is_empty()
    }
}

/// Build-time generator pre-resolving every registry package.
pub struct ImportMapGenerator<'a> {
    registry: &'a PackageRegistry,
    ctx: &'a UrlContext,
}

impl<'a> ImportMapGenerator<'a> {
    pub fn new(registry: &'a PackageRegistry, ctx: &'a UrlContext) -> Self {
        Self { registry, ctx }
    }

    /// Resolve every package's main entry and well-known subpaths.
    pub fn generate(&self) -> ImportMapDocument {
        let mut imports = BTreeMap::new();

        for (name, dir) in self.registry.all() {
            let manifest = PackageManifest::load_dir(&dir);

            if let Some(entry) = self.package_entry(&dir, manifest.as_ref()) {
                imports.insert(name.clone(), self.ctx.to_url(&entry.to_string_lossy()));
            }

            for subpath in WELL_KNOWN_SUBPATHS {
                if let Some(target) = self.subpath_entry(&dir, manifest.as_ref(), subpath) {
                    imports.insert(
                        format!("{name}/{subpath}"),
                        self.ctx.to_url(&target.to_string_lossy()),
                    );
                }
            }
        }

        ImportMapDocument {
            version: IMPORT_MAP_VERSION.to_string(),
            generated: epoch_millis(),
            imports,
        }
    }

    /// Serialize the generated map under the application scratch directory.
    pub fn write(&self, app_root: &Path) -> Result<PathBuf> {
        let doc = self.generate();
        let dir = app_root.join(SCRATCH_DIR);
        std::fs::create_dir_all(&dir)?;
        let path = dir.join(IMPORT_MAP_FILE);
        let json = serde_json::to_string_pretty(&doc)?;
        std::fs::write(&path, json)?;
        tracing::info!(entries = doc.imports.len(), path = %path.display(), "import map written");
        Ok(path)
    }

    fn package_entry(&self, dir: &Path, manifest: Option<&PackageManifest>) -> Option<PathBuf> {
        if let Some(rel) = manifest.and_then(|m| m.entry_file()) {
            let abs = prefer_source(&dir.join(rel.trim_start_matches("./")));
            if abs.is_file() {
                return Some(abs);
            }
        }
        // No usable manifest entry: probe conventional index files.
        for base in ["src/index", "index"] {
            for ext in SOURCE_EXTENSIONS {
                let candidate = dir.join(format!("{base}.{ext}"));
                if candidate.is_file() {
                    return Some(candidate);
                }
            }
        }
        None
    }

    fn subpath_entry(
        &self,
        dir: &Path,
        manifest: Option<&PackageManifest>,
        subpath: &str,
    ) -> Option<PathBuf> {
        if let Some(rel) = manifest.and_then(|m| m.resolve_export(subpath)) {
            let abs = prefer_source(&dir.join(rel.trim_start_matches("./")));
            if abs.is_file() {
                return Some(abs);
            }
        }
        for base in ["src", "."] {
            for ext in SOURCE_EXTENSIONS {
                let candidate = dir.join(base).join(format!("{subpath}.{ext}"));
                if candidate.is_file() {
                    return Some(candidate);
                }
            }
        }
        None
    }
}

fn epoch_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn fixture() -> (TempDir, PathBuf, UrlContext, PackageRegistry) {
        let temp = TempDir::new().unwrap();
        let root = temp.path().to_path_buf();
        let app_root = root.join("app");
        fs::create_dir_all(&app_root).unwrap();

        let framework = root.join("swiss-lib");
        let core = framework.join("packages/core");
        fs::create_dir_all(core.join("src")).unwrap();
        fs::write(
            core.join("package.json"),
            r#"{
                "name": "@swissjs/core",
                "exports": {
                    ".": "./src/index.ts",
                    "./jsx-runtime": "./src/jsx-runtime.ts"
                }
            }"#,
        )
        .unwrap();
        fs::write(core.join("src/index.ts"), "export {}").unwrap();
        fs::write(core.join("src/jsx-runtime.ts"), "export {}").unwrap();

        let ctx = UrlContext::new(app_root, Some(root.clone()), Some(framework.clone()));
        let registry = PackageRegistry::new();
        registry.scan(&framework, &[]);
        (temp, root, ctx, registry)
    }

    #[test]
    fn generates_main_entry_and_well_known_subpaths() {
        let (_temp, _root, ctx, registry) = fixture();
        let doc = ImportMapGenerator::new(&registry, &ctx).generate();

        assert_eq!(doc.version, IMPORT_MAP_VERSION);
        assert_eq!(
            doc.imports.get("@swissjs/core").map(String::as_str),
            Some("/swiss-packages/core/src/index.ts")
        );
        assert_eq!(
            doc.imports.get("@swissjs/core/jsx-runtime").map(String::as_str),
            Some("/swiss-packages/core/src/jsx-runtime.ts")
        );
        assert!(!doc.imports.contains_key("@swissjs/core/client"));
    }

    #[test]
    fn write_then_load_round_trip() {
        let (_temp, _root, ctx, registry) = fixture();
        let generator = ImportMapGenerator::new(&registry, &ctx);
        generator.write(&ctx.app_root).unwrap();

        let map = ImportMap::load(&ctx.app_root);
        assert!(!map.is_empty());
        assert_eq!(
            map.lookup("@swissjs/core"),
            Some("/swiss-packages/core/src/index.ts")
        );
        assert_eq!(map.lookup("@swissjs/missing"), None);
    }

    #[test]
    fn absent_file_loads_empty() {
        let temp = TempDir::new().unwrap();
        let map = ImportMap::load(temp.path());
        assert!(map.is_empty());
    }
}
