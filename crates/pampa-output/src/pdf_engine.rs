/*
 * pdf_engine.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Pairing of intermediate writers with PDF engines.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{OutputSettingsError, Result};
use crate::format::base_format_name;
use crate::scripting::is_custom_writer;

/// Known `(writer, engine)` pairs. Lookups take the first match, so order
/// decides the default engine for each writer and the default writer for
/// each engine.
pub const PDF_ENGINES: &[(&str, &str)] = &[
    ("html", "wkhtmltopdf"),
    ("html", "weasyprint"),
    ("html", "pagedjs-cli"),
    ("html", "prince"),
    ("html5", "wkhtmltopdf"),
    ("html5", "weasyprint"),
    ("html5", "pagedjs-cli"),
    ("html5", "prince"),
    ("latex", "pdflatex"),
    ("latex", "lualatex"),
    ("latex", "xelatex"),
    ("latex", "latexmk"),
    ("latex", "tectonic"),
    ("beamer", "pdflatex"),
    ("beamer", "lualatex"),
    ("beamer", "xelatex"),
    ("beamer", "latexmk"),
    ("beamer", "tectonic"),
    ("ms", "pdfroff"),
    ("typst", "typst"),
    ("context", "context"),
];

/// Writer and engine used when neither is given.
pub const DEFAULT_PDF_PAIR: (&str, &str) = ("latex", "pdflatex");

/// Program name of an engine given as a path, e.g. `/usr/bin/xelatex.exe`
/// becomes `xelatex`.
pub fn engine_base_name(engine: &str) -> &str {
    Path::new(engine)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(engine)
}

/// Choose the writer and engine that together produce PDF.
///
/// The writer is returned as given (extensions included) and the engine as
/// given (path included); only the comparison uses base names.
pub fn resolve_pdf_engine(
    writer: Option<&str>,
    engine: Option<&str>,
) -> Result<(String, String)> {
    let (writer, engine) = match (writer, engine) {
        (None, None) => (DEFAULT_PDF_PAIR.0.to_string(), DEFAULT_PDF_PAIR.1.to_string()),
        (Some(writer), None) => {
            let base = base_format_name(writer);
            let engine = PDF_ENGINES
                .iter()
                .find(|(w, _)| *w == base)
                .map(|(_, e)| *e)
                .ok_or_else(|| {
                    OutputSettingsError::IncompatiblePdfEngine(format!(
                        "cannot produce pdf output from {writer}"
                    ))
                })?;
            (writer.to_string(), engine.to_string())
        }
        (None, Some(engine)) => {
            let base = engine_base_name(engine);
            let writer = PDF_ENGINES
                .iter()
                .find(|(_, e)| *e == base)
                .map(|(w, _)| *w)
                .ok_or_else(|| {
                    OutputSettingsError::IncompatiblePdfEngine(format!(
                        "pdf-engine {engine} not known"
                    ))
                })?;
            (writer.to_string(), engine.to_string())
        }
        (Some(writer), Some(engine)) if is_custom_writer(writer) => {
            (writer.to_string(), engine.to_string())
        }
        (Some(writer), Some(engine)) => {
            let pair = (base_format_name(writer), engine_base_name(engine));
            if !PDF_ENGINES.iter().any(|&(w, e)| (w, e) == pair) {
                return Err(OutputSettingsError::IncompatiblePdfEngine(format!(
                    "pdf-engine {engine} is not compatible with output format {writer}"
                )));
            }
            (writer.to_string(), engine.to_string())
        }
    };
    debug!(%writer, %engine, "resolved pdf writer and engine");
    Ok((writer, engine))
}

/// Find an engine program on `PATH`.
///
/// An engine given as a path is returned when that file exists.
pub fn locate_pdf_engine(engine: &str) -> Option<PathBuf> {
    which::which(engine).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve(w: Option<&str>, e: Option<&str>) -> Result<(String, String)> {
        resolve_pdf_engine(w, e)
    }

    fn pair(w: &str, e: &str) -> (String, String) {
        (w.to_string(), e.to_string())
    }

    #[test]
    fn test_neither_given_is_latex_pdflatex() {
        assert_eq!(resolve(None, None).unwrap(), pair("latex", "pdflatex"));
    }

    #[test]
    fn test_writer_only_picks_first_engine() {
        assert_eq!(resolve(Some("latex"), None).unwrap(), pair("latex", "pdflatex"));
        assert_eq!(resolve(Some("html"), None).unwrap(), pair("html", "wkhtmltopdf"));
        assert_eq!(resolve(Some("ms"), None).unwrap(), pair("ms", "pdfroff"));
        assert_eq!(
            resolve(Some("beamer+smart"), None).unwrap(),
            pair("beamer+smart", "pdflatex")
        );
    }

    #[test]
    fn test_writer_without_engine_errors() {
        let err = resolve(Some("docx"), None).unwrap_err();
        assert_eq!(err.to_string(), "cannot produce pdf output from docx");
        assert!(resolve(Some("pdf"), None).is_err());
    }

    #[test]
    fn test_engine_only_picks_first_writer() {
        assert_eq!(resolve(None, Some("xelatex")).unwrap(), pair("latex", "xelatex"));
        assert_eq!(
            resolve(None, Some("/opt/bin/weasyprint")).unwrap(),
            pair("html", "/opt/bin/weasyprint")
        );
        assert_eq!(resolve(None, Some("typst")).unwrap(), pair("typst", "typst"));
    }

    #[test]
    fn test_unknown_engine_errors() {
        let err = resolve(None, Some("frobtex")).unwrap_err();
        assert!(matches!(err, OutputSettingsError::IncompatiblePdfEngine(_)));
        assert_eq!(err.to_string(), "pdf-engine frobtex not known");
    }

    #[test]
    fn test_custom_writer_accepts_any_engine() {
        for engine in ["frobtex", "/usr/bin/mtxrun", "pdflatex"] {
            assert_eq!(
                resolve(Some("my-writer.lua"), Some(engine)).unwrap(),
                pair("my-writer.lua", engine)
            );
        }
    }

    #[test]
    fn test_both_given_must_be_in_table() {
        assert_eq!(
            resolve(Some("html5"), Some("/usr/local/bin/prince")).unwrap(),
            pair("html5", "/usr/local/bin/prince")
        );
        let err = resolve(Some("context"), Some("/usr/bin/mtxrun")).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("/usr/bin/mtxrun"), "{msg}");
        assert!(msg.contains("context"), "{msg}");
        assert!(resolve(Some("latex"), Some("weasyprint")).is_err());
    }

    #[test]
    fn test_engine_base_name() {
        assert_eq!(engine_base_name("/usr/bin/xelatex"), "xelatex");
        assert_eq!(engine_base_name("pagedjs-cli"), "pagedjs-cli");
        assert_eq!(engine_base_name("tectonic.exe"), "tectonic");
    }
}
