/*
 * scripting.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Custom writers implemented in a scripting language.
//!
//! The crate does not embed an interpreter. A host that supports custom
//! writers implements [`ScriptingEngine`] and passes it to resolution.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::format::{Extensions, base_format_name};
use crate::runtime::SystemRuntime;
use crate::writers::Writer;

/// File suffix that marks a format as a custom writer script.
pub const CUSTOM_WRITER_SUFFIX: &str = ".lua";

/// Whether a format spec names a custom writer script.
pub fn is_custom_writer(format: &str) -> bool {
    base_format_name(format).ends_with(CUSTOM_WRITER_SUFFIX)
}

#[derive(Debug, Error)]
pub enum ScriptingError {
    #[error("custom writers are not supported here: {0}")]
    Unsupported(String),

    #[error("could not load custom writer {}: {message}", path.display())]
    Load { path: PathBuf, message: String },
}

/// What a custom writer script provides.
#[derive(Debug, Clone)]
pub struct CustomComponents {
    pub writer: Writer,
    /// Extensions the script enables by default.
    pub extensions: Extensions,
    /// Source of the script's default template, if it has one.
    pub default_template: Option<String>,
}

/// Loads custom writer scripts.
pub trait ScriptingEngine {
    fn load_custom(
        &self,
        path: &Path,
        runtime: &dyn SystemRuntime,
    ) -> Result<CustomComponents, ScriptingError>;
}

/// Engine used when the host has no interpreter: every load fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoScriptingEngine;

impl ScriptingEngine for NoScriptingEngine {
    fn load_custom(
        &self,
        path: &Path,
        _runtime: &dyn SystemRuntime,
    ) -> Result<CustomComponents, ScriptingError> {
        Err(ScriptingError::Unsupported(path.display().to_string()))
    }
}

/// Locate a custom writer script: the path itself, or failing that the
/// same name under `<data_dir>/custom/`.
pub fn find_custom_writer(
    script: &str,
    data_dir: Option<&Path>,
    runtime: &dyn SystemRuntime,
) -> PathBuf {
    let direct = PathBuf::from(script);
    if runtime.file_exists(&direct) {
        return direct;
    }
    data_dir
        .map(|dir| dir.join("custom").join(script))
        .filter(|p| runtime.file_exists(p))
        .unwrap_or(direct)
}
