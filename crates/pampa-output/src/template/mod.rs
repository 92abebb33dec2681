/*
 * template/mod.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Template resolution: which compiled template, if any, a writer gets.

pub mod builtin;
pub mod bundle;

use std::fmt;
use std::path::{Path, PathBuf};

use pampa_doctemplate::resolver::resolve_partial_path;
use pampa_doctemplate::{PartialResolver, Template, TemplateError};
use tracing::debug;

use crate::error::{OutputSettingsError, Result};
use crate::runtime::SystemRuntime;

pub use builtin::{DZSLIDES_TEMPLATE, get_builtin_template, is_builtin_template};
pub use bundle::{BundleError, TemplateBundle};

/// Loads partials through a [`SystemRuntime`], relative to the template
/// that references them.
pub struct RuntimePartialResolver<'a> {
    runtime: &'a dyn SystemRuntime,
}

impl<'a> RuntimePartialResolver<'a> {
    pub fn new(runtime: &'a dyn SystemRuntime) -> Self {
        Self { runtime }
    }
}

impl PartialResolver for RuntimePartialResolver<'_> {
    fn get_partial(&self, name: &str, base_path: &Path) -> Option<String> {
        let path = resolve_partial_path(name, base_path);
        match self.runtime.file_read_string(&path) {
            Ok(source) => Some(source),
            Err(e) => {
                debug!("partial {} not loaded: {}", path.display(), e);
                None
            }
        }
    }
}

/// What the template resolver needs to know about the request.
#[derive(Debug, Clone, Copy)]
pub struct TemplateRequest<'a> {
    pub standalone: bool,
    /// The user's `--template` argument.
    pub explicit: Option<&'a Path>,
    /// Base name of the output format.
    pub format: &'a str,
    pub data_dir: Option<&'a Path>,
}

/// Where a resolved template came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateOrigin {
    /// Embedded default for the named format.
    Builtin(String),
    /// `default.<format>` in the user data directory.
    DataDir(PathBuf),
    /// The user's `--template` file.
    File(PathBuf),
    /// Default template shipped by a custom writer script.
    CustomWriter(PathBuf),
}

impl fmt::Display for TemplateOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateOrigin::Builtin(format) => write!(f, "built-in {format}"),
            TemplateOrigin::DataDir(path) => write!(f, "data directory {}", path.display()),
            TemplateOrigin::File(path) => write!(f, "file {}", path.display()),
            TemplateOrigin::CustomWriter(path) => write!(f, "custom writer {}", path.display()),
        }
    }
}

/// A compiled template and its origin.
#[derive(Debug, Clone)]
pub struct ResolvedTemplate {
    pub template: Template,
    pub origin: TemplateOrigin,
}

impl ResolvedTemplate {
    pub fn new(template: Template, origin: TemplateOrigin) -> Self {
        Self { template, origin }
    }
}

fn compile_error(e: TemplateError) -> OutputSettingsError {
    OutputSettingsError::TemplateCompilation(e.to_string())
}

/// Append `.<format>` to a template path that has no extension.
pub fn template_path_with_extension(path: &Path, format: &str) -> PathBuf {
    if path.extension().is_some() {
        path.to_path_buf()
    } else {
        let mut name = path.as_os_str().to_owned();
        name.push(".");
        name.push(format);
        PathBuf::from(name)
    }
}

/// Compile template source read from `path`, loading its partials through
/// the runtime.
pub fn compile_template_source(
    source: &str,
    path: &Path,
    runtime: &dyn SystemRuntime,
) -> Result<Template> {
    Template::compile_with_resolver(source, path, &RuntimePartialResolver::new(runtime))
        .map_err(compile_error)
}

/// Read and compile a user template file.
///
/// A relative path that does not exist is also looked up under
/// `<data_dir>/templates/`.
pub fn load_template_file(
    path: &Path,
    data_dir: Option<&Path>,
    runtime: &dyn SystemRuntime,
) -> Result<Template> {
    let path = locate_template_file(path, data_dir, runtime);
    debug!("loading template {}", path.display());
    let source = runtime.file_read_string(&path)?;
    compile_template_source(&source, &path, runtime)
}

fn locate_template_file(
    path: &Path,
    data_dir: Option<&Path>,
    runtime: &dyn SystemRuntime,
) -> PathBuf {
    match data_dir {
        Some(dir) if path.is_relative() && !runtime.file_exists(path) => {
            let candidate = dir.join("templates").join(path);
            if runtime.file_exists(&candidate) {
                candidate
            } else {
                path.to_path_buf()
            }
        }
        _ => path.to_path_buf(),
    }
}

/// The default template for a format.
///
/// `<data_dir>/templates/default.<format>` takes precedence over the
/// built-in. Formats with neither fail with
/// [`OutputSettingsError::NoDefaultTemplate`].
pub fn default_template(
    format: &str,
    data_dir: Option<&Path>,
    runtime: &dyn SystemRuntime,
) -> Result<ResolvedTemplate> {
    if let Some(dir) = data_dir {
        let user_default = dir.join("templates").join(format!("default.{format}"));
        if runtime.file_exists(&user_default) {
            debug!("using user default template {}", user_default.display());
            let source = runtime.file_read_string(&user_default)?;
            let template = compile_template_source(&source, &user_default, runtime)?;
            return Ok(ResolvedTemplate::new(template, TemplateOrigin::DataDir(user_default)));
        }
    }

    let bundle = get_builtin_template(format)
        .ok_or_else(|| OutputSettingsError::NoDefaultTemplate(format.to_string()))?;
    let template = bundle
        .compile(&format!("default.{format}"))
        .map_err(|e| match e {
            BundleError::TemplateCompile(inner) => compile_error(inner),
            other => OutputSettingsError::TemplateCompilation(other.to_string()),
        })?;
    Ok(ResolvedTemplate::new(template, TemplateOrigin::Builtin(format.to_string())))
}

/// Resolve the template for a request.
///
/// Non-standalone output gets no template. Without an explicit path the
/// `default_provider` decides; it may itself return `None`.
pub fn resolve_template(
    request: TemplateRequest<'_>,
    runtime: &dyn SystemRuntime,
    default_provider: impl FnOnce() -> Result<Option<ResolvedTemplate>>,
) -> Result<Option<ResolvedTemplate>> {
    if !request.standalone {
        return Ok(None);
    }
    match request.explicit {
        None => default_provider(),
        Some(path) => {
            let path = template_path_with_extension(path, request.format);
            let path = locate_template_file(&path, request.data_dir, runtime);
            debug!("loading template {}", path.display());
            let source = runtime.file_read_string(&path)?;
            let template = compile_template_source(&source, &path, runtime)?;
            Ok(Some(ResolvedTemplate::new(template, TemplateOrigin::File(path))))
        }
    }
}
