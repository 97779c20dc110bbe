//! Error types for the resolution and rewrite pipeline.
//!
//! Absence is not an error anywhere in discovery or resolution: lookups that
//! find nothing return `Option`/fallback values. The variants here cover the
//! unexpected failures (I/O, malformed manifests, bad configuration) that do
//! propagate upward.

use std::path::PathBuf;
use thiserror::Error;

/// Errors produced by the core resolution pipeline.
#[derive(Debug, Error)]
pub enum CoreError {
    /// User configuration failed to parse or validate
    #[error("Configuration error: {message}")]
    Config {
        /// What went wrong
        message: String,
        /// Optional guidance for fixing it
        hint: Option<String>,
    },

    /// A package manifest could not be read or parsed
    #[error("Invalid package manifest {}: {message}", .path.display())]
    Manifest {
        /// Manifest file path
        path: PathBuf,
        /// Parse or validation failure
        message: String,
    },

    /// File or directory not found
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// I/O errors from file system operations
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors with custom messages
    #[error("{0}")]
    Custom(String),
}

impl CoreError {
    /// Build a configuration error with a hint.
    pub fn config(message: impl Into<String>, hint: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            hint: Some(hint.into()),
        }
    }
}

/// Result type alias using `CoreError` as the default error type.
pub type Result<T, E = CoreError> = std::result::Result<T, E>;

/// Extension trait for enriching `Result` values with context.
pub trait ResultExt<T> {
    /// Attach a file path to the error; `NotFound` I/O errors become
    /// `CoreError::FileNotFound` carrying that path.
    fn with_path(self, path: impl AsRef<std::path::Path>) -> Result<T>;

    /// Prefix the error with a short description of the failed operation.
    fn context(self, msg: impl std::fmt::Display) -> Result<T>;
}

impl<T, E: Into<CoreError>> ResultExt<T> for std::result::Result<T, E> {
    fn with_path(self, path: impl AsRef<std::path::Path>) -> Result<T> {
        self.map_err(|e| {
            let err: CoreError = e.into();
            match err {
                CoreError::Io(io_err) if io_err.kind() == std::io::ErrorKind::NotFound => {
                    CoreError::FileNotFound(path.as_ref().to_path_buf())
                }
                other => other,
            }
        })
    }

    fn context(self, msg: impl std::fmt::Display) -> Result<T> {
        self.map_err(|e| {
            let err: CoreError = e.into();
            CoreError::Custom(format!("{}: {}", msg, err))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_carries_hint() {
        let err = CoreError::config("bad port", "use a value between 1024 and 65535");
        assert!(err.to_string().contains("bad port"));
    }

    #[test]
    fn with_path_maps_not_found() {
        let result: std::io::Result<()> = Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "file not found",
        ));
        let err = result.with_path("/tmp/missing.json").unwrap_err();
        assert!(matches!(err, CoreError::FileNotFound(_)));
    }

    #[test]
    fn context_prefixes_message() {
        let result: std::result::Result<(), CoreError> =
            Err(CoreError::Custom("inner".to_string()));
        let err = result.context("loading import map").unwrap_err();
        assert!(err.to_string().contains("loading import map"));
        assert!(err.to_string().contains("inner"));
    }
}
