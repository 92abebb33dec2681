/*
 * sandbox.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * SandboxedRuntime: a decorator over any SystemRuntime that only lets reads
 * through for paths on an explicit allow-list.
 */

use std::path::{Component, Path, PathBuf};

use tracing::debug;

use crate::options::Options;
use crate::runtime::{RuntimeError, RuntimeResult, SystemRuntime};

/// A path pattern that can match files.
///
/// Supports:
/// - Exact paths: "/home/user/file.txt"
/// - Directory prefixes: "/home/user/fonts/" (matches everything under)
/// - Wildcards: "fonts/*.otf" (`*` and `?` never cross a `/`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern(String);

impl PathPattern {
    /// Create a new PathPattern from a string.
    pub fn new(pattern: impl Into<String>) -> Self {
        Self(normalize(&pattern.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check if a path matches this pattern.
    pub fn matches(&self, path: &Path) -> bool {
        let path = normalize(&path.to_string_lossy());
        let pattern = self.0.as_str();

        if pattern.contains(['*', '?']) {
            wildcard_match(pattern.as_bytes(), path.as_bytes())
        } else if let Some(dir) = pattern.strip_suffix('/') {
            path.strip_prefix(dir)
                .is_some_and(|rest| rest.starts_with('/'))
        } else {
            path == pattern
        }
    }
}

/// Lexically normalize a path string: drop `.` components and use `/`.
fn normalize(raw: &str) -> String {
    let trailing_slash = raw.ends_with('/') || raw.ends_with('\\');
    let path = Path::new(raw);
    let mut parts: Vec<String> = Vec::new();
    let mut absolute = false;
    for component in path.components() {
        match component {
            Component::RootDir => absolute = true,
            Component::CurDir => {}
            Component::Prefix(p) => parts.push(p.as_os_str().to_string_lossy().into_owned()),
            Component::ParentDir => parts.push("..".to_string()),
            Component::Normal(s) => parts.push(s.to_string_lossy().into_owned()),
        }
    }
    let mut out = parts.join("/");
    if absolute {
        out.insert(0, '/');
    }
    if trailing_slash && !out.ends_with('/') {
        out.push('/');
    }
    out
}

fn wildcard_match(pattern: &[u8], text: &[u8]) -> bool {
    match (pattern.split_first(), text.split_first()) {
        (None, None) => true,
        (Some((b'*', rest)), _) => {
            wildcard_match(rest, text)
                || text
                    .split_first()
                    .is_some_and(|(c, tail)| *c != b'/' && wildcard_match(pattern, tail))
        }
        (Some((b'?', rest)), Some((c, tail))) => *c != b'/' && wildcard_match(rest, tail),
        (Some((p, rest)), Some((c, tail))) => p == c && wildcard_match(rest, tail),
        _ => false,
    }
}

/// The set of paths a sandboxed writer may read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadAllowList {
    patterns: Vec<PathPattern>,
}

impl ReadAllowList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a pattern to the list.
    pub fn allow(mut self, pattern: impl Into<String>) -> Self {
        self.patterns.push(PathPattern::new(pattern));
        self
    }

    /// Collect every resource a writer legitimately needs from the options:
    /// reference doc, epub metadata, epub cover image, CSL style, citation
    /// abbreviations, epub fonts and bibliography files.
    pub fn from_options(options: &Options) -> Self {
        let singles = [
            &options.reference_doc,
            &options.epub_metadata,
            &options.epub_cover_image,
            &options.csl,
            &options.citation_abbreviations,
        ];
        let patterns = singles
            .into_iter()
            .flatten()
            .chain(options.epub_fonts.iter())
            .chain(options.bibliography.iter())
            .map(PathPattern::new)
            .collect();
        Self { patterns }
    }

    pub fn patterns(&self) -> &[PathPattern] {
        &self.patterns
    }

    pub fn is_allowed(&self, path: &Path) -> bool {
        self.patterns.iter().any(|p| p.matches(path))
    }
}

/// Sandboxed runtime that enforces a read allow-list.
///
/// This is a decorator that wraps any SystemRuntime. Reads of paths that
/// are not on the list fail with [`RuntimeError::PermissionDenied`].
pub struct SandboxedRuntime<R: SystemRuntime> {
    inner: R,
    allow_read: ReadAllowList,
}

impl<R: SystemRuntime> SandboxedRuntime<R> {
    /// Create a new SandboxedRuntime wrapping the given runtime.
    pub fn new(inner: R, allow_read: ReadAllowList) -> Self {
        Self { inner, allow_read }
    }

    pub fn allow_list(&self) -> &ReadAllowList {
        &self.allow_read
    }

    fn check_read(&self, path: &Path) -> RuntimeResult<()> {
        if self.allow_read.is_allowed(path) {
            Ok(())
        } else {
            debug!(path = %path.display(), "sandbox denied read");
            Err(RuntimeError::PermissionDenied(format!(
                "sandbox does not allow reading {}",
                path.display()
            )))
        }
    }
}

impl<R: SystemRuntime> SystemRuntime for SandboxedRuntime<R> {
    fn file_read(&self, path: &Path) -> RuntimeResult<Vec<u8>> {
        self.check_read(path)?;
        self.inner.file_read(path)
    }

    fn file_read_string(&self, path: &Path) -> RuntimeResult<String> {
        self.check_read(path)?;
        self.inner.file_read_string(path)
    }

    fn file_exists(&self, path: &Path) -> bool {
        self.allow_read.is_allowed(path) && self.inner.file_exists(path)
    }

    fn cwd(&self) -> RuntimeResult<PathBuf> {
        self.inner.cwd()
    }
}
