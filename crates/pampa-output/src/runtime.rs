/*
 * runtime.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Defines the SystemRuntime trait through which every file read made while
 * resolving output settings (and every read a writer makes) is routed.
 *
 * - NativeRuntime: full filesystem access using std
 * - SandboxedRuntime: read access limited to an allow-list (see sandbox.rs)
 */

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for runtime operations
pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// Errors that can occur during runtime operations
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// Standard I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Permission denied (with detailed reason)
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Operation not supported on this runtime (e.g. remote fetch)
    #[error("Operation not supported: {0}")]
    NotSupported(String),
}

/// Abstraction over the filesystem operations output resolution needs.
pub trait SystemRuntime {
    /// Read an entire file as bytes.
    fn file_read(&self, path: &Path) -> RuntimeResult<Vec<u8>>;

    /// Read file as string with UTF-8 encoding.
    ///
    /// Default implementation reads bytes and converts to string.
    fn file_read_string(&self, path: &Path) -> RuntimeResult<String> {
        let bytes = self.file_read(path)?;
        String::from_utf8(bytes).map_err(|e| {
            RuntimeError::Io(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Invalid UTF-8 in {}: {}", path.display(), e),
            ))
        })
    }

    /// Whether a regular file exists at `path`.
    fn file_exists(&self, path: &Path) -> bool;

    /// Current working directory.
    fn cwd(&self) -> RuntimeResult<PathBuf>;
}

impl<R: SystemRuntime + ?Sized> SystemRuntime for &R {
    fn file_read(&self, path: &Path) -> RuntimeResult<Vec<u8>> {
        (**self).file_read(path)
    }

    fn file_read_string(&self, path: &Path) -> RuntimeResult<String> {
        (**self).file_read_string(path)
    }

    fn file_exists(&self, path: &Path) -> bool {
        (**self).file_exists(path)
    }

    fn cwd(&self) -> RuntimeResult<PathBuf> {
        (**self).cwd()
    }
}

/// Whether a source names a remote resource rather than a local path.
pub fn is_remote(path: &Path) -> bool {
    let s = path.to_string_lossy();
    s.starts_with("http://") || s.starts_with("https://")
}

/// Native runtime with full filesystem access.
///
/// Remote sources are rejected with [`RuntimeError::NotSupported`]; fetching
/// them is left to the host.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeRuntime;

impl NativeRuntime {
    pub fn new() -> Self {
        Self
    }
}

impl SystemRuntime for NativeRuntime {
    fn file_read(&self, path: &Path) -> RuntimeResult<Vec<u8>> {
        if is_remote(path) {
            return Err(RuntimeError::NotSupported(format!(
                "fetching remote resource {}",
                path.display()
            )));
        }
        Ok(std::fs::read(path)?)
    }

    fn file_exists(&self, path: &Path) -> bool {
        !is_remote(path) && path.is_file()
    }

    fn cwd(&self) -> RuntimeResult<PathBuf> {
        Ok(std::env::current_dir()?)
    }
}
