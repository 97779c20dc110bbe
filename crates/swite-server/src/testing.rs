//! Test doubles for the external collaborators.
//!
//! Used by this crate's tests and by downstream consumers that need a
//! server without a real compiler toolchain.

use async_trait::async_trait;
use std::path::Path;

use crate::compiler::{CompileError, UiCompiler};

/// Compiler that returns the source unchanged.
pub struct EchoCompiler;

#[async_trait]
impl UiCompiler for EchoCompiler {
    async fn compile(&self, source: &str, _path: &Path) -> Result<String, CompileError> {
        Ok(source.to_string())
    }
}

/// Compiler that fails every call with a fixed message.
pub struct FailingCompiler(pub String);

#[async_trait]
impl UiCompiler for FailingCompiler {
    async fn compile(&self, _source: &str, path: &Path) -> Result<String, CompileError> {
        Err(CompileError::new(path, self.0.clone()))
    }
}
