/*
 * lib.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Resolve pandoc-style conversion options into ready-to-run output
//! settings: format, writer, template, variables, syntax map, highlight
//! style and, for PDF output, the engine.
//!
//! ```no_run
//! use pampa_output::{
//!     NativeRuntime, NoScriptingEngine, Options, Resolution, WriterRegistry,
//!     resolve_output_settings,
//! };
//!
//! let options = Options {
//!     output_file: Some("report.pdf".into()),
//!     ..Options::default()
//! };
//! match resolve_output_settings(
//!     &options,
//!     &WriterRegistry::with_defaults(),
//!     &NoScriptingEngine,
//!     &NativeRuntime,
//! )? {
//!     Resolution::Settings(settings) => println!("{:?}", settings.pdf_engine),
//!     Resolution::DumpArgs(args) => args.lines().for_each(|l| println!("{l}")),
//! }
//! # Ok::<(), pampa_output::OutputSettingsError>(())
//! ```

pub mod error;
pub mod format;
pub mod highlight;
pub mod options;
pub mod pdf_engine;
pub mod runtime;
pub mod sandbox;
pub mod scripting;
pub mod settings;
pub mod syntax_map;
pub mod template;
pub mod variables;
pub mod version;
pub mod writers;

pub use error::{OutputSettingsError, Result};
pub use format::{
    Extensions, ExtensionsDiff, FlavoredFormat, FormatResolution, ResolutionWarning,
    resolve_format,
};
pub use highlight::{HighlightStyle, resolve_highlight_style};
pub use options::Options;
pub use pdf_engine::{locate_pdf_engine, resolve_pdf_engine};
pub use runtime::{NativeRuntime, RuntimeError, SystemRuntime};
pub use sandbox::{ReadAllowList, SandboxedRuntime};
pub use scripting::{CustomComponents, NoScriptingEngine, ScriptingEngine, ScriptingError};
pub use settings::{
    AcquiredWriter, DumpedArgs, OutputSettings, Resolution, WriterOptions, acquire_writer,
    resolve_output_settings,
};
pub use syntax_map::{SyntaxDefinition, SyntaxMap, default_syntax_map, load_syntax_map};
pub use template::{
    ResolvedTemplate, TemplateOrigin, TemplateRequest, default_template, resolve_template,
};
pub use variables::{Value, VariableContext, build_variables};
pub use writers::{Document, Writer, WriterError, WriterKind, WriterOutput, WriterRegistry};
