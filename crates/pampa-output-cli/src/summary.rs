/*
 * summary.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! JSON description of resolved output settings.

use pampa_output::pdf_engine::locate_pdf_engine;
use pampa_output::{OutputSettings, WriterRegistry};
use serde_json::{Value, json};

pub fn summarize(settings: &OutputSettings, registry: &WriterRegistry) -> Value {
    let options = &settings.writer_options;
    let engine_path = settings
        .pdf_engine
        .as_deref()
        .and_then(locate_pdf_engine)
        .map(|p| p.to_string_lossy().into_owned());

    json!({
        "format": settings.format,
        "writer-name": settings.writer_name,
        "writer-kind": settings.writer.kind(),
        "writer-implemented": registry.is_implemented(&settings.format),
        "pdf-output": settings.pdf_output,
        "pdf-engine": settings.pdf_engine,
        "pdf-engine-path": engine_path,
        "pdf-engine-opts": settings.pdf_engine_opts,
        "standalone": options.standalone,
        "template": options.template_origin.as_ref().map(ToString::to_string),
        "extensions": options.extensions.iter().collect::<Vec<_>>(),
        "highlight-style": options.highlight_style,
        "syntax-languages": options.syntax_map.names().collect::<Vec<_>>(),
        "variables": options.variables.to_json(),
        "warnings": settings.warnings.iter().map(ToString::to_string).collect::<Vec<_>>(),
    })
}
