//! Bidirectional mapping between filesystem paths and browser URLs.
//!
//! Three rules govern every mapping:
//!
//! 1. Source over built tree: a path under `dist` whose `src` twin exists
//!    (with the extension remapped back to its source form) maps to the twin.
//! 2. The internal framework prefix never reaches a browser: every return
//!    point converts `/swiss-lib/` to `/swiss-packages/`, matching the
//!    prefix token case-insensitively.
//! 3. Segments below `node_modules` keep their exact on-disk case.

use std::borrow::Cow;
use std::path::{Component, Path, PathBuf};

/// Internal on-disk prefix of the framework monorepo. Must never appear in
/// any URL or rewritten script.
pub const INTERNAL_PREFIX: &str = "/swiss-lib/";

/// Public URL prefix under which framework packages are served.
pub const PUBLIC_PREFIX: &str = "/swiss-packages/";

/// URL prefixes that resolve directly under the application root.
const APP_PREFIXES: &[&str] = &["/src/", "/public/", "/assets/"];

/// URL prefixes that resolve against the workspace root.
const WORKSPACE_PREFIXES: &[&str] = &["/lib/", "/libraries/", "/packages/", "/modules/"];

/// Replace every occurrence of the internal framework prefix with the
/// public one, matching the prefix case-insensitively.
///
/// The public prefix addresses the monorepo's `packages` directory, so
/// `/swiss-lib/packages/core/` collapses to `/swiss-packages/core/`.
pub fn normalize_framework_prefix(text: &str) -> Cow<'_, str> {
    let lower = text.to_ascii_lowercase();
    if !lower.contains(INTERNAL_PREFIX) {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    for (idx, _) in lower.match_indices(INTERNAL_PREFIX) {
        if idx < cursor {
            continue;
        }
        out.push_str(&text[cursor..idx]);
        out.push_str(PUBLIC_PREFIX);
        cursor = idx + INTERNAL_PREFIX.len();
        if lower[cursor..].starts_with("packages/") {
            cursor += "packages/".len();
        }
    }
    out.push_str(&text[cursor..]);
    Cow::Owned(out)
}

/// Map a built-tree path to its source twin when the twin exists.
///
/// `dist/foo.js` becomes `src/foo.ts` (or `.tsx`); non-script files keep
/// their extension. Paths outside a `dist` directory are returned unchanged.
pub fn prefer_source(path: &Path) -> PathBuf {
    let components: Vec<Component> = path.components().collect();
    let Some(dist_idx) = components
        .iter()
        .rposition(|c| c.as_os_str() == "dist")
    else {
        return path.to_path_buf();
    };

    let mut src_base = PathBuf::new();
    for (idx, component) in components.iter().enumerate() {
        if idx == dist_idx {
            src_base.push("src");
        } else {
            src_base.push(component);
        }
    }

    let source_exts: &[&str] = match path.extension().and_then(|e| e.to_str()) {
        Some("js") => &["ts", "tsx"],
        Some("mjs") | Some("cjs") => &["ts"],
        Some("jsx") => &["tsx"],
        _ => &[],
    };

    for ext in source_exts {
        let candidate = src_base.with_extension(ext);
        if candidate.is_file() {
            return candidate;
        }
    }
    if src_base.is_file() {
        return src_base;
    }
    path.to_path_buf()
}

/// Rebuild `base/rel` segment by segment, adopting the on-disk case of any
/// segment that only matches case-insensitively.
fn preserve_case(base: &Path, rel: &Path) -> PathBuf {
    let mut current = base.to_path_buf();
    for component in rel.components() {
        let segment = component.as_os_str();
        let exact = current.join(segment);
        if exact.exists() {
            current = exact;
            continue;
        }
        let matched = std::fs::read_dir(&current).ok().and_then(|entries| {
            entries.filter_map(|e| e.ok()).map(|e| e.file_name()).find(|name| {
                name.to_str()
                    .zip(segment.to_str())
                    .is_some_and(|(a, b)| a.eq_ignore_ascii_case(b))
            })
        });
        current = match matched {
            Some(actual) => current.join(actual),
            None => exact,
        };
    }
    current
}

/// Roots against which paths and URLs are mapped.
#[derive(Debug, Clone)]
pub struct UrlContext {
    /// Application root (the directory `swite dev` serves)
    pub app_root: PathBuf,
    /// Enclosing workspace root, when the app lives inside one
    pub workspace_root: Option<PathBuf>,
    /// Framework monorepo directory (the internal tree)
    pub framework_root: Option<PathBuf>,
}

impl UrlContext {
    pub fn new(
        app_root: PathBuf,
        workspace_root: Option<PathBuf>,
        framework_root: Option<PathBuf>,
    ) -> Self {
        Self {
            app_root,
            workspace_root,
            framework_root,
        }
    }

    fn framework_packages_root(&self) -> Option<PathBuf> {
        self.framework_root.as_ref().map(|root| root.join("packages"))
    }

    /// Canonical browser URL for `path`.
    ///
    /// Accepts either an absolute filesystem path or a string that is
    /// already a URL; the latter only has the prefix rule applied.
    pub fn to_url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return normalize_framework_prefix(path).into_owned();
        }
        if path.starts_with(PUBLIC_PREFIX) {
            return normalize_framework_prefix(path).into_owned();
        }
        let lower = path.to_ascii_lowercase();
        if lower.starts_with(INTERNAL_PREFIX) && !Path::new(path).exists() {
            return normalize_framework_prefix(path).into_owned();
        }

        let fs_path = Path::new(path);
        let url = self.fs_path_to_url(fs_path);
        normalize_framework_prefix(&url).into_owned()
    }

    fn fs_path_to_url(&self, path: &Path) -> String {
        if let Some(packages_root) = self.framework_packages_root() {
            if path.starts_with(&packages_root) {
                let preferred = prefer_source(path);
                let rel = preferred
                    .strip_prefix(&packages_root)
                    .unwrap_or(&preferred);
                return format!("{}{}", PUBLIC_PREFIX, to_url_segments(rel));
            }
        }

        let path_str = path.to_string_lossy();
        if let Some(idx) = path_str.rfind("/node_modules/") {
            let base = Path::new(&path_str[..idx + "/node_modules".len()]);
            let rel = Path::new(&path_str[idx + "/node_modules/".len()..]);
            let cased = preserve_case(base, rel);
            let cased_rel = cased.strip_prefix(base).unwrap_or(rel).to_path_buf();
            return format!("/node_modules/{}", to_url_segments(&cased_rel));
        }

        if path.starts_with(&self.app_root) {
            let rel = path.strip_prefix(&self.app_root).unwrap_or(path);
            return format!("/{}", to_url_segments(rel));
        }

        if let Some(workspace_root) = &self.workspace_root {
            if path.starts_with(workspace_root) {
                let preferred = if path.exists() {
                    path.to_path_buf()
                } else {
                    prefer_source(path)
                };
                let rel = preferred
                    .strip_prefix(workspace_root)
                    .unwrap_or(&preferred);
                return format!("/{}", to_url_segments(rel));
            }
        }

        let base = self.workspace_root.as_ref().unwrap_or(&self.app_root);
        tracing::warn!(
            path = %path.display(),
            base = %base.display(),
            "path outside all known roots, emitting workspace-relative URL"
        );
        format!("/{}", to_url_segments(&relative_to(path, base)))
    }

    /// Inverse mapping: filesystem path a URL refers to.
    ///
    /// The returned path is the preferred candidate; it may not exist, in
    /// which case handlers run their sibling-extension fallbacks.
    pub fn resolve_file_path(&self, url: &str) -> PathBuf {
        let path = url.split(['?', '#']).next().unwrap_or(url);
        let rel = path.trim_start_matches('/');

        for prefix in APP_PREFIXES {
            if path.starts_with(prefix) {
                return self.app_root.join(rel);
            }
        }

        if path.starts_with("/node_modules/") {
            let app_candidate = self.app_root.join(rel);
            if app_candidate.exists() {
                return app_candidate;
            }
            if let Some(workspace_root) = &self.workspace_root {
                let ws_candidate = workspace_root.join(rel);
                if ws_candidate.exists() {
                    return ws_candidate;
                }
            }
            return app_candidate;
        }

        if let Some(rest) = path.strip_prefix(PUBLIC_PREFIX) {
            if let Some(packages_root) = self.framework_packages_root() {
                return packages_root.join(rest);
            }
            return self.app_root.join(rel);
        }

        for prefix in WORKSPACE_PREFIXES {
            if path.starts_with(prefix) {
                let base = self.workspace_root.as_ref().unwrap_or(&self.app_root);
                return base.join(rel);
            }
        }

        if let Some(workspace_root) = &self.workspace_root {
            let candidate = workspace_root.join(rel);
            if candidate.exists() {
                return candidate;
            }
        }
        self.app_root.join(rel)
    }
}

fn to_url_segments(rel: &Path) -> String {
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

fn relative_to(path: &Path, base: &Path) -> PathBuf {
    let path_components: Vec<Component> = path.components().collect();
    let base_components: Vec<Component> = base.components().collect();

    let common = path_components
        .iter()
        .zip(base_components.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut rel = PathBuf::new();
    for _ in common..base_components.len() {
        rel.push("..");
    }
    for component in &path_components[common..] {
        rel.push(component);
    }
    rel
}
