/*
 * error.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Error types for output settings resolution

use thiserror::Error;

use crate::runtime::RuntimeError;

/// A fatal condition that aborts resolution.
///
/// No variant is ever partially applied: resolution either yields complete
/// settings or one of these.
#[derive(Error, Debug)]
pub enum OutputSettingsError {
    #[error("{0}")]
    IncompatiblePdfEngine(String),

    #[error("Error compiling template: {0}")]
    TemplateCompilation(String),

    #[error("No default template for {0}")]
    NoDefaultTemplate(String),

    #[error("Error loading syntax definitions: {0}")]
    SyntaxMap(String),

    #[error("Unknown output format {0}")]
    UnknownWriter(String),

    #[error("Unknown highlight style {0}")]
    UnknownHighlightStyle(String),

    #[error("Custom writer error: {0}")]
    Scripting(String),

    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

pub type Result<T> = std::result::Result<T, OutputSettingsError>;
