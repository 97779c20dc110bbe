//! Module specifier resolution.
//!
//! Turns any import string into a URL the browser can fetch. Bare and
//! scoped specifiers go through the import-map fast path, then node_modules
//! probing across the application, workspace and framework roots, then the
//! package registry (with a single rescan on miss), and finally fall back
//! to a CDN URL. Resolution never fails; the CDN is the floor.

use path_clean::PathClean;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::import_map::ImportMap;
use crate::lexer::scan_imports;
use crate::manifest::{split_specifier, PackageManifest};
use crate::registry::PackageRegistry;
use crate::specifier::{classify, Specifier};
use crate::urls::{normalize_framework_prefix, prefer_source, UrlContext};

/// Extension probe order. Earlier entries win when several files share a
/// basename.
pub const SOURCE_EXTENSIONS: &[&str] = &["ui", "uix", "ts", "tsx", "js", "jsx", "mjs"];

/// Base URL of the fallback CDN.
pub const CDN_BASE: &str = "https://cdn.jsdelivr.net/npm/";

/// CDN URL serving `specifier` as an ES module.
pub fn cdn_url(specifier: &str) -> String {
    format!("{CDN_BASE}{specifier}/+esm")
}

/// Resolves module specifiers against a set of roots and a package index.
pub struct ModuleResolver {
    ctx: UrlContext,
    registry: Arc<PackageRegistry>,
    import_map: ImportMap,
}

impl ModuleResolver {
    pub fn new(ctx: UrlContext, registry: Arc<PackageRegistry>, import_map: ImportMap) -> Self {
        Self {
            ctx,
            registry,
            import_map,
        }
    }

    pub fn ctx(&self) -> &UrlContext {
        &self.ctx
    }

    pub fn registry(&self) -> &PackageRegistry {
        &self.registry
    }

    /// Resolve `specifier` as imported from `importer` to a browser URL.
    ///
    /// Invalid specifiers (variable references, malformed identifiers) are
    /// returned unchanged.
    pub fn resolve(&self, specifier: &str, importer: &Path) -> String {
        match classify(specifier) {
            Specifier::Bare(s) | Specifier::Scoped(s) => {
                if let Some(url) = self.import_map.lookup(s) {
                    return url.to_string();
                }
                self.resolve_bare(s)
            }
            Specifier::Invalid(s) => s.to_string(),
            Specifier::FrameworkPrefixed(s) => normalize_framework_prefix(s).into_owned(),
            Specifier::AbsoluteUrl(s) => s.to_string(),
            Specifier::Relative(s) => self.resolve_relative(s, importer),
        }
    }

    /// Resolve `specifier` to a filesystem path, when it maps to one.
    ///
    /// CDN fallbacks and unresolvable specifiers yield `None`.
    pub fn resolve_to_path(&self, specifier: &str, importer: &Path) -> Option<PathBuf> {
        let url = self.resolve(specifier, importer);
        if url.starts_with("http://") || url.starts_with("https://") {
            return None;
        }
        let path = self.ctx.resolve_file_path(&url);
        path.is_file().then_some(path)
    }

    /// Filesystem paths of every absolute or package-shaped specifier in
    /// `script`. The ordered result is the dependency identity list the
    /// compilation cache validates against.
    pub fn dependency_paths(&self, script: &str, importer: &Path) -> Vec<PathBuf> {
        let mut deps = Vec::new();
        for span in scan_imports(script) {
            let spec = span.text(script);
            let relevant = matches!(
                classify(spec),
                Specifier::AbsoluteUrl(_)
                    | Specifier::FrameworkPrefixed(_)
                    | Specifier::Scoped(_)
                    | Specifier::Bare(_)
            );
            if !relevant {
                continue;
            }
            if let Some(path) = self.resolve_to_path(spec, importer) {
                if !deps.contains(&path) {
                    deps.push(path);
                }
            }
        }
        deps
    }

    fn resolve_relative(&self, spec: &str, importer: &Path) -> String {
        let dir = importer.parent().unwrap_or_else(|| Path::new("."));
        let joined = dir.join(spec).clean();

        if joined.is_file() {
            return self.ctx.to_url(&joined.to_string_lossy());
        }
        if let Some(hit) = try_extensions(&joined) {
            return self.ctx.to_url(&hit.to_string_lossy());
        }
        if let Some(hit) = try_index(&joined) {
            return self.ctx.to_url(&hit.to_string_lossy());
        }

        self.ctx.to_url(&joined.to_string_lossy())
    }

    fn resolve_bare(&self, spec: &str) -> String {
        let (name, subpath) = split_specifier(spec);

        let mut node_modules_dirs = vec![self.ctx.app_root.join("node_modules")];
        if let Some(workspace_root) = &self.ctx.workspace_root {
            node_modules_dirs.push(workspace_root.join("node_modules"));
        }
        if let Some(framework_root) = &self.ctx.framework_root {
            node_modules_dirs.push(framework_root.join("node_modules"));
        }

        for node_modules in &node_modules_dirs {
            let pkg_dir = node_modules.join(name);
            if !pkg_dir.is_dir() {
                continue;
            }
            // Linked workspace packages resolve through their real location
            // so the source tree is served, not the installed copy.
            if let Some(real_dir) = self.workspace_symlink_target(&pkg_dir) {
                if let Some(path) = self.resolve_in_package(&real_dir, subpath) {
                    return self.ctx.to_url(&path.to_string_lossy());
                }
            }
            if let Some(path) = self.resolve_in_package(&pkg_dir, subpath) {
                return self.ctx.to_url(&path.to_string_lossy());
            }
        }

        if let Some(pkg_dir) = self.find_package_with_rescan(name) {
            if let Some(path) = self.resolve_in_package(&pkg_dir, subpath) {
                return self.ctx.to_url(&path.to_string_lossy());
            }
        }

        tracing::warn!(specifier = spec, "unresolved bare specifier, using CDN fallback");
        cdn_url(spec)
    }

    /// One registry rescan is allowed per lookup miss before giving up.
    fn find_package_with_rescan(&self, name: &str) -> Option<PathBuf> {
        if !self.registry.is_scanned() {
            return None;
        }
        if let Some(dir) = self.registry.find(name) {
            return Some(dir);
        }
        tracing::debug!(package = name, "registry miss, rescanning");
        self.registry.rescan();
        self.registry.find(name)
    }

    fn workspace_symlink_target(&self, pkg_dir: &Path) -> Option<PathBuf> {
        std::fs::read_link(pkg_dir).ok()?;
        let real = std::fs::canonicalize(pkg_dir).ok()?;
        self.registry.contains_path(&real).then_some(real)
    }

    /// Resolve a subpath inside a package directory to a concrete file.
    fn resolve_in_package(&self, pkg_dir: &Path, subpath: &str) -> Option<PathBuf> {
        let manifest = PackageManifest::load_dir(pkg_dir);

        let export_target = manifest.as_ref().and_then(|m| m.resolve_export(subpath));
        let candidate = match export_target {
            Some(rel) => pkg_dir.join(rel.trim_start_matches("./")),
            None if subpath.is_empty() => {
                match manifest.as_ref().and_then(|m| m.entry_file()) {
                    Some(rel) => pkg_dir.join(rel.trim_start_matches("./")),
                    None => pkg_dir.join("index.js"),
                }
            }
            None => pkg_dir.join(subpath),
        };

        let candidate = prefer_source(&candidate);

        if candidate.is_file() {
            return Some(candidate);
        }
        if let Some(hit) = try_extensions(&candidate) {
            return Some(hit);
        }
        if let Some(hit) = try_index(&candidate) {
            return Some(hit);
        }
        case_insensitive_scan(&candidate)
    }
}

/// Probe `path.<ext>` for each source extension in priority order.
fn try_extensions(path: &Path) -> Option<PathBuf> {
    let base = path.to_string_lossy();
    for ext in SOURCE_EXTENSIONS {
        let candidate = PathBuf::from(format!("{base}.{ext}"));
        if candidate.is_file() {
            return Some(candidate);
        }
    }
    None
}

/// Probe `path/index.<ext>` for each source extension in priority order.
fn try_index(path: &Path) -> Option<PathBuf> {
    if !path.is_dir() {
        return None;
    }
    for ext in SOURCE_EXTENSIONS {
        let candidate = path.join(format!("index.{ext}"));
        if candidate.is_file() {
            return Some(candidate);
        }
    }
    None
}

/// Scan the parent directory for an entry matching the basename without
/// regard to case.
pub fn case_insensitive_scan(path: &Path) -> Option<PathBuf> {
    let parent = path.parent()?;
    let wanted = path.file_name()?.to_str()?;
    let entries = std::fs::read_dir(parent).ok()?;
    for entry in entries.filter_map(|e| e.ok()) {
        let name = entry.file_name();
        if name
            .to_str()
            .is_some_and(|n| n.eq_ignore_ascii_case(wanted))
        {
            return Some(parent.join(name));
        }
    }
    None
}
