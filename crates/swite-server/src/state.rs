//! Shared state for the development server.
//!
//! One `DevState` is constructed at startup in a fixed order: locator,
//! registry scan, import map load, resolver, cache. Handlers and the
//! watcher share it behind an `Arc`; the registry and cache serialize
//! their own writes internally.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;

use swite_core::{
    CompilationCache, ImportMap, ModuleResolver, PackageRegistry, UrlContext, WorkspaceLocator,
};

use crate::compiler::{CodeTransformer, RouteEntry, UiCompiler};
use crate::config::DevConfig;
use crate::hmr::UpdatePayload;

/// Shared development server state.
pub struct DevState {
    /// Resolved configuration
    pub config: DevConfig,
    /// Workspace and framework roots (memoized)
    pub locator: WorkspaceLocator,
    /// Package name index
    pub registry: Arc<PackageRegistry>,
    /// Specifier resolution
    pub resolver: ModuleResolver,
    /// Compilation cache
    pub cache: CompilationCache,
    /// External `.ui`/`.uix` compiler
    pub compiler: Arc<dyn UiCompiler>,
    /// External TypeScript transformer
    pub transformer: Arc<dyn CodeTransformer>,
    /// Route table supplied by the route scanner
    pub routes: RwLock<Vec<RouteEntry>>,

    /// Connected push-channel subscribers
    clients: RwLock<HashMap<usize, mpsc::Sender<String>>>,
    next_client_id: RwLock<usize>,
}

/// Shared state handle for passing around the application.
pub type SharedState = Arc<DevState>;

impl DevState {
    /// Build state for `config`, running discovery and the registry scan.
    pub fn new(
        config: DevConfig,
        compiler: Arc<dyn UiCompiler>,
        transformer: Arc<dyn CodeTransformer>,
    ) -> Self {
        let locator = WorkspaceLocator::new();
        let workspace_root = locator.find_workspace_root(&config.app_root);
        let framework_root = locator.find_framework_monorepo(&config.app_root);

        let registry = Arc::new(PackageRegistry::new());
        let primary = workspace_root.clone().unwrap_or_else(|| config.app_root.clone());
        let mut extra = Vec::new();
        if let Some(framework) = &framework_root {
            extra.push(framework.clone());
        }
        extra.extend(config.extra_roots.iter().cloned());
        registry.scan(&primary, &extra);

        let ctx = UrlContext::new(config.app_root.clone(), workspace_root, framework_root);
        let import_map = ImportMap::load(&config.app_root);
        let resolver = ModuleResolver::new(ctx, registry.clone(), import_map);
        let cache = CompilationCache::new(config.cache_capacity);

        Self {
            config,
            locator,
            registry,
            resolver,
            cache,
            compiler,
            transformer,
            routes: RwLock::new(Vec::new()),
            clients: RwLock::new(HashMap::new()),
            next_client_id: RwLock::new(0),
        }
    }

    /// Dependency list extractor used for cache validity checks.
    pub fn resolved_deps(&self, compiled: &str, importer: &Path) -> Vec<PathBuf> {
        self.resolver.dependency_paths(compiled, importer)
    }

    /// Register a new push-channel subscriber.
    ///
    /// # Returns
    ///
    /// Client ID and the receiver its connection drains.
    pub fn register_client(&self) -> (usize, mpsc::Receiver<String>) {
        let id = {
            let mut next_id = self.next_client_id.write();
            let id = *next_id;
            *next_id += 1;
            id
        };

        let (tx, rx) = mpsc::channel(100);
        self.clients.write().insert(id, tx);
        (id, rx)
    }

    /// Drop a subscriber.
    pub fn unregister_client(&self, id: usize) {
        self.clients.write().remove(&id);
    }

    /// Number of connected subscribers.
    pub fn client_count(&self) -> usize {
        self.clients.read().len()
    }

    /// Broadcast a change payload to every subscriber.
    ///
    /// Fire and forget: a subscriber whose queue is full misses the event
    /// and recovers with a full reload on reconnect. Disconnected
    /// subscribers are pruned.
    pub async fn broadcast(&self, payload: &UpdatePayload) {
        let json = match serde_json::to_string(payload) {
            Ok(json) => json,
            Err(e) => {
                tracing::error!(error = %e, "failed to serialize update payload");
                return;
            }
        };

        let clients: Vec<(usize, mpsc::Sender<String>)> = self
            .clients
            .read()
            .iter()
            .map(|(id, tx)| (*id, tx.clone()))
            .collect();

        let mut dead = Vec::new();
        for (id, tx) in clients {
            match tx.try_send(json.clone()) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    tracing::warn!(client = id, "subscriber queue full, event dropped");
                }
                Err(mpsc::error::TrySendError::Closed(_)) => dead.push(id),
            }
        }
        for id in dead {
            self.unregister_client(id);
        }
    }
}
