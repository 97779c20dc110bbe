//! Server error hierarchy.
//!
//! Inside the per-request pipeline every error is captured and translated
//! to a `text/plain` HTTP response at the handler boundary; nothing here
//! propagates to an outer router where an HTML fallback could poison
//! browser caches under script URLs.

use std::path::PathBuf;
use thiserror::Error;

use crate::compiler::CompileError;

/// Top-level server error type.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Resolution/rewrite engine failures
    #[error(transparent)]
    Core(#[from] swite_core::CoreError),

    /// The external compiler refused the input
    #[error(transparent)]
    Compile(#[from] CompileError),

    /// Configuration loading or validation failures
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// File watcher failures
    #[error("File watcher error: {0}")]
    Watch(#[from] notify::Error),

    /// I/O errors from file system operations
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Transport-level failures (bind, serve)
    #[error("Server error: {0}")]
    Server(String),
}

/// Configuration-specific errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Application root does not exist
    #[error("Application root not found: {}\n\nHint: pass an existing directory to `swite dev`", .0.display())]
    RootNotFound(PathBuf),

    /// Config file has invalid JSON syntax
    #[error("Invalid JSON in {}: {error}\n\nHint: validate swite.config.json syntax", .path.display())]
    InvalidJson {
        path: PathBuf,
        error: serde_json::Error,
    },

    /// Invalid value for a configuration option
    #[error("Invalid value for '{field}': {value}\n\nHint: {hint}")]
    InvalidValue {
        field: String,
        value: String,
        hint: String,
    },

    /// Neither the requested port nor an ephemeral one could be bound
    #[error("No port available: {0}\n\nHint: check firewall rules or pass --port")]
    NoPortAvailable(String),
}

/// Result type alias using `ServerError` as the default error type.
pub type Result<T, E = ServerError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_errors_carry_hints() {
        let err = ConfigError::InvalidValue {
            field: "port".to_string(),
            value: "99999".to_string(),
            hint: "ports are 16-bit".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("Invalid value for 'port'"));
        assert!(msg.contains("Hint:"));
    }

    #[test]
    fn server_error_wraps_config_error() {
        let err: ServerError = ConfigError::RootNotFound(PathBuf::from("/missing")).into();
        assert!(matches!(err, ServerError::Config(_)));
    }
}
