//! `swite import-map` command: pre-resolve every discovered package so the
//! dev server can answer bare imports without probing the filesystem.

use std::sync::Arc;

use swite_core::{ImportMapGenerator, PackageRegistry, UrlContext, WorkspaceLocator};

use crate::cli::ImportMapArgs;
use crate::error::{CliError, Result};
use crate::ui;

pub async fn execute(args: ImportMapArgs) -> Result<()> {
    let root = match args.root {
        Some(root) => root,
        None => std::env::current_dir()?,
    };
    let app_root = root
        .canonicalize()
        .map_err(|_| CliError::InvalidArgument(format!("no such directory: {}", root.display())))?;

    let locator = WorkspaceLocator::new();
    let workspace_root = locator.find_workspace_root(&app_root);
    let framework_root = locator.find_framework_monorepo(&app_root);

    let registry = Arc::new(PackageRegistry::new());
    let primary = workspace_root.clone().unwrap_or_else(|| app_root.clone());
    let extra: Vec<_> = framework_root.clone().into_iter().collect();
    registry.scan(&primary, &extra);
    ui::info(&format!("Indexed {} packages", registry.all().len()));

    let ctx = UrlContext::new(app_root.clone(), workspace_root, framework_root);
    let generator = ImportMapGenerator::new(&registry, &ctx);
    let path = generator.write(&app_root)?;
    ui::success(&format!("Import map written to {}", path.display()));
    Ok(())
}
