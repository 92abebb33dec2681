/*
 * error.rs
 * Copyright (c) 2025 Posit, PBC
 */

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TemplateError {
    /// Malformed template text, located by file, line and column.
    #[error("{filename}:{line}:{column}: {message}")]
    ParseError {
        filename: String,
        line: usize,
        column: usize,
        message: String,
    },

    /// No resolver could supply a partial.
    #[error("cannot find partial template {name}")]
    PartialNotFound { name: String },

    /// Partials nested deeper than the limit, usually a cycle.
    #[error("partial {name} nested more than {max_depth} levels deep")]
    RecursivePartial { name: String, max_depth: usize },

    #[error("no such template pipe: {name}")]
    UnknownPipe { name: String },

    /// Reading a template or partial file failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type TemplateResult<T> = Result<T, TemplateError>;
