//! End-to-end resolution and rewriting over a realistic workspace layout:
//! an application root inside a pnpm workspace, a framework monorepo
//! sibling, workspace packages, and installed node_modules.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::TempDir;

use swite_core::{
    ImportMap, ImportMapGenerator, ImportRewriter, ModuleResolver, PackageRegistry, UrlContext,
    WorkspaceLocator,
};

struct Workspace {
    _temp: TempDir,
    root: PathBuf,
    app_root: PathBuf,
    framework_root: PathBuf,
}

impl Workspace {
    fn new() -> Self {
        let temp = TempDir::new().unwrap();
        // Canonicalized so symlink targets compare against the same form.
        let root = temp.path().canonicalize().unwrap();

        fs::write(root.join("pnpm-workspace.yaml"), "packages:\n  - packages/*\n").unwrap();
        fs::create_dir_all(root.join("packages")).unwrap();

        let app_root = root.join("app");
        fs::create_dir_all(app_root.join("src/components")).unwrap();
        fs::write(
            app_root.join("package.json"),
            r#"{ "name": "demo-app", "version": "0.1.0" }"#,
        )
        .unwrap();

        let framework_root = root.join("swiss-lib");
        let core = framework_root.join("packages/core");
        fs::create_dir_all(core.join("src")).unwrap();
        fs::create_dir_all(core.join("dist")).unwrap();
        fs::write(
            core.join("package.json"),
            r#"{
                "name": "@swissjs/core",
                "exports": {
                    ".": "./dist/index.js",
                    "./jsx-runtime": "./dist/jsx-runtime.js"
                }
            }"#,
        )
        .unwrap();
        fs::write(core.join("src/index.ts"), "export class SwissApp {}").unwrap();
        fs::write(core.join("src/jsx-runtime.ts"), "export const jsx = 1;").unwrap();
        fs::write(core.join("dist/index.js"), "export class SwissApp {}").unwrap();
        fs::write(core.join("dist/jsx-runtime.js"), "export const jsx = 1;").unwrap();

        let ui_pkg = root.join("packages/ui");
        fs::create_dir_all(ui_pkg.join("src")).unwrap();
        fs::write(
            ui_pkg.join("package.json"),
            r#"{ "name": "@demo/ui", "exports": { ".": "./src/index.ts" } }"#,
        )
        .unwrap();
        fs::write(ui_pkg.join("src/index.ts"), "export const Button = 1;").unwrap();

        let reflect = app_root.join("node_modules/reflect-metadata");
        fs::create_dir_all(&reflect).unwrap();
        fs::write(
            reflect.join("package.json"),
            r#"{ "name": "reflect-metadata", "main": "Reflect.js" }"#,
        )
        .unwrap();
        fs::write(reflect.join("Reflect.js"), "// reflect").unwrap();

        Self {
            _temp: temp,
            root,
            app_root,
            framework_root,
        }
    }

    fn resolver(&self, import_map: ImportMap) -> ModuleResolver {
        let ctx = UrlContext::new(
            self.app_root.clone(),
            Some(self.root.clone()),
            Some(self.framework_root.clone()),
        );
        let registry = Arc::new(PackageRegistry::new());
        registry.scan(&self.root, &[self.framework_root.clone()]);
        ModuleResolver::new(ctx, registry, import_map)
    }
}

#[test]
fn locator_finds_both_roots_from_app_source() {
    let ws = Workspace::new();
    let locator = WorkspaceLocator::new();
    let start = ws.app_root.join("src/components");

    assert_eq!(locator.find_workspace_root(&start), Some(ws.root.clone()));
    assert_eq!(
        locator.find_framework_monorepo(&start),
        Some(ws.framework_root.clone())
    );
}

#[test]
fn framework_package_resolves_to_source_tree() {
    let ws = Workspace::new();
    let resolver = ws.resolver(ImportMap::empty());
    let importer = ws.app_root.join("src/index.ui");

    // The manifest points at dist; development resolution prefers src.
    assert_eq!(
        resolver.resolve("@swissjs/core", &importer),
        "/swiss-packages/core/src/index.ts"
    );
    assert_eq!(
        resolver.resolve("@swissjs/core/jsx-runtime", &importer),
        "/swiss-packages/core/src/jsx-runtime.ts"
    );
}

#[test]
fn workspace_package_resolves_root_relative() {
    let ws = Workspace::new();
    let resolver = ws.resolver(ImportMap::empty());
    let importer = ws.app_root.join("src/index.ui");

    assert_eq!(
        resolver.resolve("@demo/ui", &importer),
        "/packages/ui/src/index.ts"
    );
}

#[test]
fn generated_import_map_short_circuits_resolution() {
    let ws = Workspace::new();
    let resolver = ws.resolver(ImportMap::empty());

    let generator = ImportMapGenerator::new(resolver.registry(), resolver.ctx());
    generator.write(&ws.app_root).unwrap();

    let map = ImportMap::load(&ws.app_root);
    assert_eq!(
        map.lookup("@swissjs/core"),
        Some("/swiss-packages/core/src/index.ts")
    );
    assert_eq!(
        map.lookup("@swissjs/core/jsx-runtime"),
        Some("/swiss-packages/core/src/jsx-runtime.ts")
    );

    let resolver = ws.resolver(map);
    let importer = ws.app_root.join("src/index.ui");
    assert_eq!(
        resolver.resolve("@swissjs/core", &importer),
        "/swiss-packages/core/src/index.ts"
    );
}

#[test]
fn full_rewrite_produces_browser_ready_script() {
    let ws = Workspace::new();
    fs::write(ws.app_root.join("src/App.uix"), "export const App = 1;").unwrap();
    let resolver = ws.resolver(ImportMap::empty());
    let rewriter = ImportRewriter::new(&resolver);
    let importer = ws.app_root.join("src/index.ui");

    let source = r#"
import { SwissApp } from '@swissjs/core';
import { App } from './App.uix';
import { Button } from '@demo/ui';
"#;
    let out = rewriter.rewrite(source, &importer);

    assert!(out.contains("from '/swiss-packages/core/src/index.ts'"));
    assert!(out.contains("from '/src/App.uix'"));
    assert!(out.contains("from '/packages/ui/src/index.ts'"));
    assert!(!out.contains("@swissjs/core"));
    assert!(!out.to_ascii_lowercase().contains("/swiss-lib/"));
}

#[test]
fn rewrite_twice_is_stable() {
    let ws = Workspace::new();
    fs::write(ws.app_root.join("src/App.uix"), "export const App = 1;").unwrap();
    let resolver = ws.resolver(ImportMap::empty());
    let rewriter = ImportRewriter::new(&resolver);
    let importer = ws.app_root.join("src/index.ui");

    let source = r#"
import { SwissApp } from '@swissjs/core';
import { App } from './App.uix';
import ghost from '@missing/package';
"#;
    let once = rewriter.rewrite(source, &importer);
    assert_eq!(rewriter.rewrite(&once, &importer), once);
}

#[test]
fn node_modules_urls_keep_on_disk_case() {
    let ws = Workspace::new();
    let resolver = ws.resolver(ImportMap::empty());
    let importer = ws.app_root.join("src/index.ui");

    let url = resolver.resolve("reflect-metadata", &importer);
    assert_eq!(url, "/node_modules/reflect-metadata/Reflect.js");
}

#[cfg(unix)]
#[test]
fn symlinked_workspace_package_serves_real_source() {
    let ws = Workspace::new();

    // Install @demo/ui into the app's node_modules as a symlink, the way a
    // workspace-aware package manager does.
    let scope_dir = ws.app_root.join("node_modules/@demo");
    fs::create_dir_all(&scope_dir).unwrap();
    std::os::unix::fs::symlink(ws.root.join("packages/ui"), scope_dir.join("ui")).unwrap();

    let resolver = ws.resolver(ImportMap::empty());
    let importer = ws.app_root.join("src/index.ui");

    assert_eq!(
        resolver.resolve("@demo/ui", &importer),
        "/packages/ui/src/index.ts"
    );
}

#[test]
fn unknown_package_uses_cdn_and_dependency_paths_skip_it() {
    let ws = Workspace::new();
    let resolver = ws.resolver(ImportMap::empty());
    let importer = ws.app_root.join("src/index.ui");

    let url = resolver.resolve("@unknown/thing/sub", &importer);
    assert_eq!(url, "https://cdn.jsdelivr.net/npm/@unknown/thing/sub/+esm");

    let deps = resolver.dependency_paths(
        "import a from '@unknown/thing/sub';\nimport b from '@swissjs/core';",
        &importer,
    );
    assert_eq!(
        deps,
        vec![ws
            .framework_root
            .join("packages/core/src/index.ts")]
    );
}

fn exists_case_sensitive(path: &Path) -> bool {
    let Some(parent) = path.parent() else {
        return false;
    };
    let Some(name) = path.file_name() else {
        return false;
    };
    fs::read_dir(parent)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .any(|e| e.file_name() == name)
        })
        .unwrap_or(false)
}

#[test]
fn resolved_framework_urls_map_back_to_real_files() {
    let ws = Workspace::new();
    let resolver = ws.resolver(ImportMap::empty());
    let importer = ws.app_root.join("src/index.ui");

    let url = resolver.resolve("@swissjs/core", &importer);
    let path = resolver.ctx().resolve_file_path(&url);
    assert!(exists_case_sensitive(&path));
}
