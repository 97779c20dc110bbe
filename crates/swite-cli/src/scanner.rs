//! File-convention route scanner.
//!
//! Scans `src/pages` for `.ui`/`.uix` files and derives route paths from
//! their location: `pages/index.ui` is `/`, `pages/about.ui` is `/about`,
//! and a `[param]` segment becomes `:param`.

use std::path::{Path, PathBuf};

use swite_server::{RouteEntry, RouteScanner};

/// Maximum directory depth below the pages root.
const MAX_PAGES_DEPTH: usize = 8;

/// Route scanner over a `pages` directory.
pub struct PagesRouteScanner {
    pages_root: PathBuf,
}

impl PagesRouteScanner {
    pub fn new(pages_root: PathBuf) -> Self {
        Self { pages_root }
    }

    /// True when `path` affects the route table.
    pub fn covers(&self, path: &Path) -> bool {
        path.starts_with(&self.pages_root)
    }
}

impl RouteScanner for PagesRouteScanner {
    fn routes(&self) -> Vec<RouteEntry> {
        let mut routes = Vec::new();
        collect_routes(&self.pages_root, &self.pages_root, 0, &mut routes);
        routes.sort_by(|a, b| a.path.cmp(&b.path));
        routes
    }
}

fn collect_routes(pages_root: &Path, dir: &Path, depth: usize, routes: &mut Vec<RouteEntry>) {
    if depth > MAX_PAGES_DEPTH {
        return;
    }
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };

    for entry in entries.filter_map(|e| e.ok()) {
        let path = entry.path();
        if path.is_dir() {
            collect_routes(pages_root, &path, depth + 1, routes);
            continue;
        }
        let is_page = matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("ui") | Some("uix")
        );
        if !is_page {
            continue;
        }
        if let Some(route_path) = route_path_for(pages_root, &path) {
            routes.push(RouteEntry {
                path: route_path,
                file: path,
            });
        }
    }
}

/// Derive the route path of a page file relative to the pages root.
fn route_path_for(pages_root: &Path, file: &Path) -> Option<String> {
    let rel = file.strip_prefix(pages_root).ok()?;
    let mut segments = Vec::new();

    for component in rel.components() {
        let segment = component.as_os_str().to_str()?;
        segments.push(segment.to_string());
    }

    let last = segments.pop()?;
    let stem = last.rsplit_once('.').map(|(stem, _)| stem).unwrap_or(&last);
    if stem != "index" {
        segments.push(stem.to_string());
    }

    let path = segments
        .into_iter()
        .map(|segment| {
            // `[id]` directories and files are dynamic parameters.
            if let Some(name) = segment
                .strip_prefix('[')
                .and_then(|s| s.strip_suffix(']'))
            {
                format!(":{name}")
            } else {
                segment
            }
        })
        .collect::<Vec<_>>()
        .join("/");

    Some(if path.is_empty() {
        "/".to_string()
    } else {
        format!("/{path}")
    })
}
