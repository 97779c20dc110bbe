//! `swite dev` command.
//!
//! # Process Flow
//!
//! 1. Load and validate configuration
//! 2. Build shared state (discovery, registry scan, import map load)
//! 3. Start the file watcher
//! 4. Start the HTTP server in the background
//! 5. Event loop: invalidate and broadcast on changes, Ctrl+C to stop

use std::sync::Arc;
use tokio::signal;

use swite_server::{
    classify_change, CodeTransformer, CommandCompiler, DevConfig, DevServer, DevState,
    FileChange, FileWatcher, PassthroughTransformer, SharedState, UiCompiler,
    UnconfiguredCompiler, UpdatePayload,
};

use swite_server::routes::install_routes;

use crate::cli::DevArgs;
use crate::error::{CliError, Result};
use crate::scanner::PagesRouteScanner;
use crate::ui;

/// Execute the dev command.
///
/// # Errors
///
/// Returns errors for invalid configuration, watcher failures, and server
/// startup failures.
pub async fn execute(args: DevArgs) -> Result<()> {
    ui::info("Starting development server...");

    let root = match args.root {
        Some(root) => root,
        None => std::env::current_dir()?,
    };
    let config = DevConfig::load(root, args.port)?;
    ui::info(&format!("Application root: {}", config.app_root.display()));

    let compiler = build_compiler(&config)?;
    let transformer = build_transformer(&config)?;
    let state: SharedState = Arc::new(DevState::new(config, compiler, transformer));

    let route_scanner = PagesRouteScanner::new(state.config.app_root.join("src/pages"));
    install_routes(&state, &route_scanner);

    let watch_root = state
        .resolver
        .ctx()
        .workspace_root
        .clone()
        .unwrap_or_else(|| state.config.app_root.clone());
    let (watcher, mut change_rx) = FileWatcher::new(
        watch_root,
        state.config.watch_ignore.clone(),
        state.config.debounce_ms,
    )?;
    ui::info(&format!(
        "Watching for changes in: {}",
        watcher.root().display()
    ));

    let server_url = state.config.server_url();
    let server = DevServer::new(state.clone());
    let mut server_handle = tokio::spawn(async move {
        if let Err(e) = server.start().await {
            ui::error(&format!("Server error: {e}"));
        }
    });
    ui::success(&format!("Development server running at {server_url}"));

    if args.open {
        open_browser(&server_url);
    }

    ui::info("Press Ctrl+C to stop");
    loop {
        tokio::select! {
            Some(change) = change_rx.recv() => {
                handle_file_change(change, &state, &route_scanner).await;
            }
            _ = signal::ctrl_c() => {
                ui::info("Shutting down development server...");
                break;
            }
            _ = &mut server_handle => {
                ui::warning("Server task completed unexpectedly");
                break;
            }
        }
    }

    ui::success("Development server stopped");
    Ok(())
}

fn build_compiler(config: &DevConfig) -> Result<Arc<dyn UiCompiler>> {
    match &config.compiler_command {
        Some(command) => {
            let compiler = CommandCompiler::new(command).ok_or_else(|| {
                CliError::InvalidArgument(format!("empty compiler command: '{command}'"))
            })?;
            Ok(Arc::new(compiler))
        }
        None => {
            ui::warning("No compiler configured; .ui/.uix requests will fail until one is set");
            Ok(Arc::new(UnconfiguredCompiler))
        }
    }
}

fn build_transformer(config: &DevConfig) -> Result<Arc<dyn CodeTransformer>> {
    match &config.transformer_command {
        Some(command) => {
            let transformer = CommandCompiler::new(command).ok_or_else(|| {
                CliError::InvalidArgument(format!("empty transformer command: '{command}'"))
            })?;
            Ok(Arc::new(transformer))
        }
        None => Ok(Arc::new(PassthroughTransformer)),
    }
}

/// Invalidate affected cache entries, refresh the route table when a page
/// changed, and notify subscribers.
async fn handle_file_change(
    change: FileChange,
    state: &SharedState,
    route_scanner: &PagesRouteScanner,
) {
    let path = change.path();
    tracing::info!(path = %path.display(), "file changed");

    let dropped = state.cache.invalidate_affected(path);
    if dropped > 0 {
        tracing::debug!(dropped, "cache entries invalidated by change");
    }

    if route_scanner.covers(path) {
        install_routes(state, route_scanner);
    }

    let payload = UpdatePayload::new(path, classify_change(path));
    state.broadcast(&payload).await;
}

/// Open the server URL in the default browser.
fn open_browser(url: &str) {
    use std::process::Command;

    let result = if cfg!(target_os = "macos") {
        Command::new("open").arg(url).spawn()
    } else if cfg!(target_os = "windows") {
        Command::new("cmd").args(["/C", "start", url]).spawn()
    } else {
        Command::new("xdg-open").arg(url).spawn()
    };

    match result {
        Ok(_) => ui::info(&format!("Opened browser at {url}")),
        Err(e) => ui::warning(&format!("Failed to open browser: {e}")),
    }
}
