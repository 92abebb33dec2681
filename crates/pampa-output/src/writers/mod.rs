/*
 * mod.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Writers and the registry that hands them out.
//!
//! A [`Writer`] is either text- or binary-producing. Each variant wraps a
//! function of the writer options, the document, and the runtime the writer
//! must use for any file it reads.

pub mod json;
pub mod native;
mod registry;

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::runtime::{RuntimeError, SystemRuntime};
use crate::sandbox::{ReadAllowList, SandboxedRuntime};
use crate::settings::WriterOptions;

pub use registry::{WriterKind, WriterRegistry};

/// The document handed to a writer: a pandoc JSON AST value.
pub type Document = serde_json::Value;

pub type WriterResult<T> = Result<T, WriterError>;

/// Errors raised while a writer runs.
#[derive(Debug, Error)]
pub enum WriterError {
    /// The format is known but no implementation has been registered.
    #[error("no writer implementation registered for {0}")]
    Unavailable(String),

    #[error("invalid document: {0}")]
    InvalidDocument(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

pub type TextWriterFn =
    Arc<dyn Fn(&WriterOptions, &Document, &dyn SystemRuntime) -> WriterResult<String> + Send + Sync>;

pub type BinaryWriterFn = Arc<
    dyn Fn(&WriterOptions, &Document, &dyn SystemRuntime) -> WriterResult<Vec<u8>> + Send + Sync,
>;

/// A writer for one output format.
#[derive(Clone)]
pub enum Writer {
    Text(TextWriterFn),
    Binary(BinaryWriterFn),
}

/// What a writer produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriterOutput {
    Text(String),
    Binary(Vec<u8>),
}

impl Writer {
    pub fn text(
        f: impl Fn(&WriterOptions, &Document, &dyn SystemRuntime) -> WriterResult<String>
        + Send
        + Sync
        + 'static,
    ) -> Self {
        Writer::Text(Arc::new(f))
    }

    pub fn binary(
        f: impl Fn(&WriterOptions, &Document, &dyn SystemRuntime) -> WriterResult<Vec<u8>>
        + Send
        + Sync
        + 'static,
    ) -> Self {
        Writer::Binary(Arc::new(f))
    }

    /// A writer that always fails with [`WriterError::Unavailable`].
    pub fn unavailable(kind: WriterKind, format: &str) -> Self {
        let format = format.to_string();
        match kind {
            WriterKind::Text => {
                Writer::text(move |_, _, _| Err(WriterError::Unavailable(format.clone())))
            }
            WriterKind::Binary => {
                Writer::binary(move |_, _, _| Err(WriterError::Unavailable(format.clone())))
            }
        }
    }

    pub fn kind(&self) -> WriterKind {
        match self {
            Writer::Text(_) => WriterKind::Text,
            Writer::Binary(_) => WriterKind::Binary,
        }
    }

    /// Wrap the writer so every runtime it is given only permits reads on
    /// `allow_read`.
    pub fn sandboxed(self, allow_read: ReadAllowList) -> Self {
        match self {
            Writer::Text(f) => Writer::text(move |opts, doc, runtime| {
                let sandbox = SandboxedRuntime::new(runtime, allow_read.clone());
                f(opts, doc, &sandbox)
            }),
            Writer::Binary(f) => Writer::binary(move |opts, doc, runtime| {
                let sandbox = SandboxedRuntime::new(runtime, allow_read.clone());
                f(opts, doc, &sandbox)
            }),
        }
    }

    /// Invoke the writer.
    pub fn run(
        &self,
        options: &WriterOptions,
        document: &Document,
        runtime: &dyn SystemRuntime,
    ) -> WriterResult<WriterOutput> {
        match self {
            Writer::Text(f) => f(options, document, runtime).map(WriterOutput::Text),
            Writer::Binary(f) => f(options, document, runtime).map(WriterOutput::Binary),
        }
    }
}

impl fmt::Debug for Writer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Writer::Text(_) => f.write_str("Writer::Text(..)"),
            Writer::Binary(_) => f.write_str("Writer::Binary(..)"),
        }
    }
}
