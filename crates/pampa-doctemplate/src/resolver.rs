/*
 * resolver.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Partial template resolution.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Trait for loading partial templates.
///
/// Implementations find and load partial template content given a partial
/// name and the path of the template that references it.
pub trait PartialResolver {
    /// Load a partial template by name, or `None` if it cannot be found.
    fn get_partial(&self, name: &str, base_path: &Path) -> Option<String>;
}

impl<R: PartialResolver + ?Sized> PartialResolver for &R {
    fn get_partial(&self, name: &str, base_path: &Path) -> Option<String> {
        (**self).get_partial(name, base_path)
    }
}

/// Resolver that loads partials from the filesystem.
///
/// Partials live next to the base template; a partial name without an
/// extension inherits the base template's extension.
#[derive(Debug, Clone, Default)]
pub struct FileSystemResolver;

impl PartialResolver for FileSystemResolver {
    fn get_partial(&self, name: &str, base_path: &Path) -> Option<String> {
        let partial_path = resolve_partial_path(name, base_path);
        std::fs::read_to_string(&partial_path).ok()
    }
}

/// Resolver that never finds anything.
#[derive(Debug, Clone, Default)]
pub struct NullResolver;

impl PartialResolver for NullResolver {
    fn get_partial(&self, _name: &str, _base_path: &Path) -> Option<String> {
        None
    }
}

/// Resolver that loads partials from an in-memory map.
///
/// Used for templates bundled into the binary.
#[derive(Debug, Clone, Default)]
pub struct MemoryResolver {
    partials: HashMap<String, String>,
}

impl MemoryResolver {
    /// Create a new empty memory resolver.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a partial to the resolver.
    pub fn add(&mut self, name: impl Into<String>, content: impl Into<String>) -> &mut Self {
        self.partials.insert(name.into(), content.into());
        self
    }

    /// Create a resolver with the given partials.
    pub fn with_partials(
        partials: impl IntoIterator<Item = (impl Into<String>, impl Into<String>)>,
    ) -> Self {
        let mut resolver = Self::new();
        for (name, content) in partials {
            resolver.add(name, content);
        }
        resolver
    }
}

impl PartialResolver for MemoryResolver {
    fn get_partial(&self, name: &str, base_path: &Path) -> Option<String> {
        if let Some(content) = self.partials.get(name) {
            return Some(content.clone());
        }
        // Bundled partials are usually keyed with their extension.
        let with_ext = resolve_partial_path(name, base_path);
        let file_name = with_ext.file_name()?.to_str()?;
        self.partials.get(file_name).cloned()
    }
}

/// Resolve the path to a partial file.
///
/// 1. If the partial name has no extension, use the base template's extension.
/// 2. If the partial name has an extension, use it as-is.
/// 3. The directory is always the base template's directory.
pub fn resolve_partial_path(partial_name: &str, base_path: &Path) -> PathBuf {
    let partial_path = Path::new(partial_name);
    let base_dir = base_path.parent().unwrap_or(Path::new("."));

    if partial_path.extension().is_some() {
        return base_dir.join(partial_name);
    }
    match base_path.extension().and_then(|e| e.to_str()) {
        Some(ext) if !ext.is_empty() => base_dir.join(partial_name).with_extension(ext),
        _ => base_dir.join(partial_name),
    }
}

/// Remove the final newline from partial content.
pub fn remove_final_newline(content: &str) -> &str {
    content.strip_suffix('\n').unwrap_or(content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_partial_path_no_extension() {
        let base = Path::new("/templates/doc.html");
        assert_eq!(
            resolve_partial_path("header", base),
            PathBuf::from("/templates/header.html")
        );
    }

    #[test]
    fn test_resolve_partial_path_with_extension() {
        let base = Path::new("/templates/doc.html");
        assert_eq!(
            resolve_partial_path("header.tex", base),
            PathBuf::from("/templates/header.tex")
        );
    }

    #[test]
    fn test_resolve_partial_path_no_base_extension() {
        let base = Path::new("/templates/doc");
        assert_eq!(
            resolve_partial_path("header", base),
            PathBuf::from("/templates/header")
        );
    }

    #[test]
    fn test_remove_final_newline() {
        assert_eq!(remove_final_newline("hello\n"), "hello");
        assert_eq!(remove_final_newline("hello"), "hello");
        assert_eq!(remove_final_newline("hello\n\n"), "hello\n");
        assert_eq!(remove_final_newline(""), "");
    }

    #[test]
    fn test_memory_resolver_falls_back_to_extension() {
        let resolver = MemoryResolver::with_partials([("styles.html", "<style/>")]);
        assert_eq!(
            resolver.get_partial("styles", Path::new("default.html")),
            Some("<style/>".to_string())
        );
        assert_eq!(
            resolver.get_partial("styles.html", Path::new("default.html")),
            Some("<style/>".to_string())
        );
        assert!(resolver.get_partial("missing", Path::new("default.html")).is_none());
    }

    #[test]
    fn test_null_resolver() {
        assert!(
            NullResolver
                .get_partial("anything", Path::new("/foo/bar.html"))
                .is_none()
        );
    }
}
