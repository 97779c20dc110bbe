//! External collaborator interfaces.
//!
//! The `.ui`/`.uix` compiler, the TypeScript transformer and the route
//! scanner live outside this crate. The pipeline consumes them through the
//! narrow traits below; process-spawning implementations are provided for
//! wiring real toolchains, and tests inject fakes.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use thiserror::Error;
use tokio::io::AsyncWriteExt;

/// The compiler or transformer refused the input.
#[derive(Debug, Error)]
#[error("Compile error in {}: {message}", .path.display())]
pub struct CompileError {
    /// Source file that failed
    pub path: PathBuf,
    /// Underlying tool message
    pub message: String,
}

impl CompileError {
    pub fn new(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Compiles `.ui`/`.uix` source into browser script. Stateless between
/// calls.
#[async_trait]
pub trait UiCompiler: Send + Sync {
    async fn compile(&self, source: &str, path: &Path) -> Result<String, CompileError>;
}

/// Loader selection for the code transformer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Loader {
    Ts,
    Tsx,
}

impl Loader {
    pub fn for_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("tsx") => Loader::Tsx,
            _ => Loader::Ts,
        }
    }
}

/// Transforms TypeScript source into browser script.
#[async_trait]
pub trait CodeTransformer: Send + Sync {
    async fn transform(
        &self,
        source: &str,
        path: &Path,
        loader: Loader,
    ) -> Result<String, CompileError>;
}

/// One routable page definition, as discovered by the route scanner.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RouteEntry {
    /// Route path, e.g. `/users/:id`
    pub path: String,
    /// Source file implementing the route
    pub file: PathBuf,
}

/// Enumerates route-file definitions for `/__swite_routes`.
pub trait RouteScanner: Send + Sync {
    fn routes(&self) -> Vec<RouteEntry>;
}

/// Route scanner used when no scanner is wired in.
pub struct EmptyRouteScanner;

impl RouteScanner for EmptyRouteScanner {
    fn routes(&self) -> Vec<RouteEntry> {
        Vec::new()
    }
}

/// Runs an external program per compile call.
///
/// The program receives the source path as its final argument and the
/// source text on stdin; compiled script is read from stdout. A non-zero
/// exit is a compile failure carrying stderr.
pub struct CommandCompiler {
    program: String,
    args: Vec<String>,
}

impl CommandCompiler {
    /// Split a command line on whitespace into program and fixed arguments.
    pub fn new(command_line: &str) -> Option<Self> {
        let mut parts = command_line.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self {
            program,
            args: parts.collect(),
        })
    }

    async fn run(&self, source: &str, path: &Path) -> Result<String, CompileError> {
        let mut child = tokio::process::Command::new(&self.program)
            .args(&self.args)
            .arg(path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                CompileError::new(path, format!("failed to spawn '{}': {e}", self.program))
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            // Tools that read from the path argument may close stdin
            // without draining it; a broken pipe here is not a failure.
            let _ = stdin.write_all(source.as_bytes()).await;
            let _ = stdin.shutdown().await;
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| CompileError::new(path, format!("compiler did not finish: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(CompileError::new(path, stderr.trim().to_string()));
        }

        String::from_utf8(output.stdout)
            .map_err(|e| CompileError::new(path, format!("compiler emitted invalid UTF-8: {e}")))
    }
}

#[async_trait]
impl UiCompiler for CommandCompiler {
    async fn compile(&self, source: &str, path: &Path) -> Result<String, CompileError> {
        self.run(source, path).await
    }
}

#[async_trait]
impl CodeTransformer for CommandCompiler {
    async fn transform(
        &self,
        source: &str,
        path: &Path,
        _loader: Loader,
    ) -> Result<String, CompileError> {
        self.run(source, path).await
    }
}

/// Compiler used when no compiler command is configured. Every `.ui`/`.uix`
/// request fails with an actionable message instead of serving raw source
/// the browser cannot execute.
pub struct UnconfiguredCompiler;

#[async_trait]
impl UiCompiler for UnconfiguredCompiler {
    async fn compile(&self, _source: &str, path: &Path) -> Result<String, CompileError> {
        Err(CompileError::new(
            path,
            "no compiler configured; set \"compiler\" in swite.config.json",
        ))
    }
}

/// Transformer that serves TypeScript source unchanged.
///
/// Modern browsers cannot execute annotated TypeScript; this exists so the
/// server stays usable for plain-JS projects when no transformer is
/// configured. Configure one for real TypeScript sources.
pub struct PassthroughTransformer;

#[async_trait]
impl CodeTransformer for PassthroughTransformer {
    async fn transform(
        &self,
        source: &str,
        path: &Path,
        _loader: Loader,
    ) -> Result<String, CompileError> {
        tracing::debug!(path = %path.display(), "no transformer configured, passing through");
        Ok(source.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_compiler_parses_command_line() {
        let compiler = CommandCompiler::new("swissc --dev --target browser").unwrap();
        assert_eq!(compiler.program, "swissc");
        assert_eq!(compiler.args, vec!["--dev", "--target", "browser"]);
        assert!(CommandCompiler::new("   ").is_none());
    }

    #[test]
    fn loader_follows_extension() {
        assert_eq!(Loader::for_path(Path::new("/a/b.tsx")), Loader::Tsx);
        assert_eq!(Loader::for_path(Path::new("/a/b.ts")), Loader::Ts);
    }

    #[tokio::test]
    async fn passthrough_returns_source() {
        let out = PassthroughTransformer
            .transform("const x: number = 1;", Path::new("/x.ts"), Loader::Ts)
            .await
            .unwrap();
        assert_eq!(out, "const x: number = 1;");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn command_compiler_round_trips_through_cat() {
        let compiler = CommandCompiler::new("cat").unwrap();
        // `cat <path>` would read the file; use `cat -` semantics by
        // spawning plain cat with the path of /dev/stdin unavailable, so
        // feed a real file instead.
        let temp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(temp.path(), "compiled output").unwrap();
        let out = compiler.compile("ignored stdin", temp.path()).await.unwrap();
        assert_eq!(out, "compiled output");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn command_compiler_surfaces_failure() {
        let compiler = CommandCompiler::new("false").unwrap();
        let err = compiler
            .compile("source", Path::new("/tmp/x.ui"))
            .await
            .unwrap_err();
        assert_eq!(err.path, PathBuf::from("/tmp/x.ui"));
    }
}
