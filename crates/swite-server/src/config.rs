//! Development server configuration.
//!
//! Layers CLI arguments over an optional `swite.config.json` at the
//! application root. Port selection tries the configured port first and
//! falls back to an OS-assigned ephemeral port.

use serde::Deserialize;
use std::net::{SocketAddr, TcpListener};
use std::path::{Path, PathBuf};

use swite_core::DEFAULT_CACHE_CAPACITY;

use crate::error::{ConfigError, Result};

/// Optional configuration file name at the application root.
pub const CONFIG_FILE: &str = "swite.config.json";

/// Default watch debounce, milliseconds.
pub const DEFAULT_DEBOUNCE_MS: u64 = 100;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    port: Option<u16>,
    #[serde(default)]
    extra_roots: Vec<PathBuf>,
    #[serde(default)]
    watch_ignore: Vec<String>,
    debounce_ms: Option<u64>,
    cache_capacity: Option<usize>,
    compiler: Option<String>,
    transformer: Option<String>,
}

/// Resolved development server configuration.
#[derive(Debug, Clone)]
pub struct DevConfig {
    /// Application root served by the dev server
    pub app_root: PathBuf,
    /// Bound socket address; the port may differ from the requested one
    pub addr: SocketAddr,
    /// Additional registry scan roots beyond workspace and framework
    pub extra_roots: Vec<PathBuf>,
    /// Patterns ignored by the file watcher
    pub watch_ignore: Vec<String>,
    /// Write-stable debounce for watcher events, milliseconds
    pub debounce_ms: u64,
    /// Compilation cache capacity
    pub cache_capacity: usize,
    /// Command line of the external `.ui`/`.uix` compiler
    pub compiler_command: Option<String>,
    /// Command line of the external TypeScript transformer
    pub transformer_command: Option<String>,
}

impl DevConfig {
    /// Load configuration for `app_root`, merging `swite.config.json` with
    /// the values passed on the command line.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` for a missing root, malformed config file, or
    /// when no port can be bound.
    pub fn load(app_root: PathBuf, requested_port: Option<u16>) -> Result<Self> {
        if !app_root.is_dir() {
            return Err(ConfigError::RootNotFound(app_root).into());
        }
        let app_root = app_root
            .canonicalize()
            .map_err(|_| ConfigError::RootNotFound(app_root.clone()))?;

        let file = Self::load_file(&app_root)?;
        let port = requested_port.or(file.port).unwrap_or(3000);
        let addr = find_available_port(port)?;

        let mut watch_ignore = vec![
            "node_modules".to_string(),
            ".git".to_string(),
            "dist".to_string(),
            ".swite".to_string(),
        ];
        watch_ignore.extend(file.watch_ignore);

        Ok(Self {
            app_root,
            addr,
            extra_roots: file.extra_roots,
            watch_ignore,
            debounce_ms: file.debounce_ms.unwrap_or(DEFAULT_DEBOUNCE_MS),
            cache_capacity: file.cache_capacity.unwrap_or(DEFAULT_CACHE_CAPACITY),
            compiler_command: file.compiler,
            transformer_command: file.transformer,
        })
    }

    fn load_file(app_root: &Path) -> Result<ConfigFile> {
        let path = app_root.join(CONFIG_FILE);
        if !path.is_file() {
            return Ok(ConfigFile::default());
        }
        let content = std::fs::read_to_string(&path)?;
        serde_json::from_str(&content)
            .map_err(|error| ConfigError::InvalidJson { path, error }.into())
    }

    /// Server URL clients connect to.
    pub fn server_url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

/// Bind the requested port, or ask the operating system for a free
/// ephemeral port when it is busy. The final port is reported so clients
/// know where to connect.
fn find_available_port(requested: u16) -> Result<SocketAddr, ConfigError> {
    let addr = SocketAddr::from(([127, 0, 0, 1], requested));
    if TcpListener::bind(addr).is_ok() {
        return Ok(addr);
    }

    let ephemeral = TcpListener::bind(("127.0.0.1", 0))
        .map_err(|e| ConfigError::NoPortAvailable(e.to_string()))?;
    let addr = ephemeral
        .local_addr()
        .map_err(|e| ConfigError::NoPortAvailable(e.to_string()))?;
    tracing::warn!(
        requested,
        using = addr.port(),
        "requested port busy, using ephemeral port"
    );
    Ok(addr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn defaults_without_config_file() {
        let temp = TempDir::new().unwrap();
        let config = DevConfig::load(temp.path().to_path_buf(), Some(0)).unwrap();

        assert_eq!(config.debounce_ms, DEFAULT_DEBOUNCE_MS);
        assert_eq!(config.cache_capacity, DEFAULT_CACHE_CAPACITY);
        assert!(config.watch_ignore.contains(&"node_modules".to_string()));
        assert!(config.compiler_command.is_none());
    }

    #[test]
    fn config_file_values_are_merged() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join(CONFIG_FILE),
            r#"{
                "debounceMs": 250,
                "cacheCapacity": 64,
                "compiler": "swissc --dev",
                "watchIgnore": ["coverage"]
            }"#,
        )
        .unwrap();

        let config = DevConfig::load(temp.path().to_path_buf(), Some(0)).unwrap();
        assert_eq!(config.debounce_ms, 250);
        assert_eq!(config.cache_capacity, 64);
        assert_eq!(config.compiler_command.as_deref(), Some("swissc --dev"));
        assert!(config.watch_ignore.contains(&"coverage".to_string()));
    }

    #[test]
    fn invalid_config_file_is_an_error() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(CONFIG_FILE), "{ not json").unwrap();

        let err = DevConfig::load(temp.path().to_path_buf(), Some(0)).unwrap_err();
        assert!(err.to_string().contains("Invalid JSON"));
    }

    #[test]
    fn missing_root_is_an_error() {
        let err = DevConfig::load(PathBuf::from("/definitely/not/here"), Some(0)).unwrap_err();
        assert!(err.to_string().contains("Application root not found"));
    }

    #[test]
    fn busy_port_falls_back_to_ephemeral() {
        let holder = TcpListener::bind(("127.0.0.1", 0)).unwrap();
        let busy_port = holder.local_addr().unwrap().port();

        let addr = find_available_port(busy_port).unwrap();
        assert_ne!(addr.port(), busy_port);
        assert!(addr.port() > 0);
    }
}
