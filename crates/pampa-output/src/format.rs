/*
 * format.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Output format names, extensions, and the format resolver.

use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;

use serde::Serialize;
use tracing::warn;

use crate::error::Result;
use crate::pdf_engine::resolve_pdf_engine;

/// Extensions enabled or disabled relative to a format's defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtensionsDiff {
    pub enable: Vec<String>,
    pub disable: Vec<String>,
}

/// A base format name plus its extension modifiers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlavoredFormat {
    pub base: String,
    pub extensions: ExtensionsDiff,
}

/// Length of the base name in a format spec.
///
/// The base ends at the first `+` or `-`, except that a custom writer path
/// (`my-writer.lua+smart`) keeps everything through `.lua`.
fn base_end(spec: &str) -> usize {
    if let Some(idx) = spec.find(".lua") {
        let end = idx + ".lua".len();
        if spec[end..].is_empty() || spec[end..].starts_with(['+', '-']) {
            return end;
        }
    }
    spec.find(['+', '-']).unwrap_or(spec.len())
}

/// The format name with any extension modifiers stripped.
pub fn base_format_name(spec: &str) -> &str {
    &spec[..base_end(spec)]
}

impl FlavoredFormat {
    /// Parse a format specification string like "markdown+smart-citations".
    ///
    /// Grammar:
    /// ```text
    /// format_spec := base_format extension_mod*
    /// extension_mod := ('+' | '-') extension_name
    /// ```
    pub fn parse(spec: &str) -> Self {
        let end = base_end(spec);
        let mut extensions = ExtensionsDiff::default();

        let mut remaining = &spec[end..];
        while let Some(sign) = remaining.chars().next() {
            remaining = &remaining[1..];
            let ext_end = remaining.find(['+', '-']).unwrap_or(remaining.len());
            let name = &remaining[..ext_end];
            if !name.is_empty() {
                match sign {
                    '+' => extensions.enable.push(name.to_string()),
                    _ => extensions.disable.push(name.to_string()),
                }
            }
            remaining = &remaining[ext_end..];
        }

        FlavoredFormat {
            base: spec[..end].to_string(),
            extensions,
        }
    }
}

impl fmt::Display for FlavoredFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.base)?;
        for ext in &self.extensions.enable {
            write!(f, "+{ext}")?;
        }
        for ext in &self.extensions.disable {
            write!(f, "-{ext}")?;
        }
        Ok(())
    }
}

/// A set of enabled extensions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Extensions(BTreeSet<String>);

impl Extensions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Apply a diff: enabled names are added, then disabled ones removed.
    pub fn apply(mut self, diff: &ExtensionsDiff) -> Self {
        self.0.extend(diff.enable.iter().cloned());
        for name in &diff.disable {
            self.0.remove(name);
        }
        self
    }
}

impl<S: Into<String>> FromIterator<S> for Extensions {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// Formats whose output is not plain text. These are always standalone.
const NON_TEXT_FORMATS: &[&str] = &["odt", "docx", "epub", "epub2", "epub3", "pptx", "pdf"];

pub fn is_text_format(format: &str) -> bool {
    !NON_TEXT_FORMATS.contains(&format)
}

/// Guess an output format from a file name's extension.
pub fn format_from_path(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    let format = match ext.as_str() {
        "adoc" | "asciidoc" => "asciidoc",
        "context" | "ctx" => "context",
        "db" => "docbook",
        "docx" => "docx",
        "dokuwiki" => "dokuwiki",
        "epub" => "epub",
        "fb2" => "fb2",
        "htm" | "html" | "xhtml" => "html",
        "icml" => "icml",
        "json" => "json",
        "latex" | "tex" | "ltx" => "latex",
        "markdown" | "md" | "mkd" | "mkdn" | "mdwn" | "mdown" | "mdtxt" | "mdtext" | "text" => {
            "markdown"
        }
        "muse" => "muse",
        "native" => "native",
        "odt" => "odt",
        "opml" => "opml",
        "org" => "org",
        "pdf" => "pdf",
        "pptx" => "pptx",
        "roff" | "ms" => "ms",
        "rst" => "rst",
        "rtf" => "rtf",
        "s5" => "s5",
        "t2t" => "t2t",
        "tei" => "tei",
        "textile" => "textile",
        "txt" => "plain",
        "typ" => "typst",
        "wiki" => "mediawiki",
        "ipynb" => "ipynb",
        "csv" => "csv",
        "bib" => "biblatex",
        d if d.len() == 1 && d.chars().all(|c| c.is_ascii_digit()) => "man",
        _ => return None,
    };
    Some(format)
}

/// First format any of `paths` maps to.
pub fn format_from_paths<P: AsRef<Path>>(paths: &[P]) -> Option<&'static str> {
    paths.iter().find_map(|p| format_from_path(p.as_ref()))
}

/// Whether the output goes to a `.pdf` file or the format is `pdf`.
pub fn is_pdf_output(format: Option<&str>, output_path: &str) -> bool {
    let by_ext = Path::new(output_path)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"));
    by_ext || format == Some("pdf")
}

/// A recoverable problem noticed while resolving the format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ResolutionWarning {
    /// No format could be inferred from the output path; html was used.
    CouldNotDeduceFormat { output_path: String },
}

impl fmt::Display for ResolutionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolutionWarning::CouldNotDeduceFormat { output_path } => write!(
                f,
                "Could not deduce format from file extension {}; defaulting to html",
                output_path
            ),
        }
    }
}

/// Outcome of the format & engine resolver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormatResolution {
    /// Writer name as it will be looked up, extensions included.
    pub writer_name: String,
    pub pdf_engine: Option<String>,
    pub pdf_output: bool,
    pub warnings: Vec<ResolutionWarning>,
}

impl FormatResolution {
    pub fn flavored(&self) -> FlavoredFormat {
        FlavoredFormat::parse(&self.writer_name)
    }
}

/// Decide the writer name and, for PDF output, the engine.
pub fn resolve_format(
    format: Option<&str>,
    pdf_engine: Option<&str>,
    output_path: &str,
) -> Result<FormatResolution> {
    let pdf_output = is_pdf_output(format, output_path);
    let mut warnings = Vec::new();

    let (writer_name, pdf_engine) = if pdf_output {
        let writer = format.filter(|f| *f != "pdf");
        let (writer, engine) = resolve_pdf_engine(writer, pdf_engine)?;
        (writer, Some(engine))
    } else if let Some(format) = format {
        (format.to_string(), None)
    } else if output_path == "-" {
        ("html".to_string(), None)
    } else {
        let writer = match format_from_path(Path::new(output_path)) {
            Some(f) => f.to_string(),
            None => {
                let warning = ResolutionWarning::CouldNotDeduceFormat {
                    output_path: output_path.to_string(),
                };
                warn!("{}", warning);
                warnings.push(warning);
                "html".to_string()
            }
        };
        (writer, None)
    };

    Ok(FormatResolution {
        writer_name,
        pdf_engine,
        pdf_output,
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_format() {
        let f = FlavoredFormat::parse("html");
        assert_eq!(f.base, "html");
        assert_eq!(f.extensions, ExtensionsDiff::default());
    }

    #[test]
    fn test_parse_extensions() {
        let f = FlavoredFormat::parse("markdown+pipe_tables-smart+emoji");
        assert_eq!(f.base, "markdown");
        assert_eq!(f.extensions.enable, vec!["pipe_tables", "emoji"]);
        assert_eq!(f.extensions.disable, vec!["smart"]);
        assert_eq!(f.to_string(), "markdown+pipe_tables+emoji-smart");
    }

    #[test]
    fn test_parse_custom_writer_keeps_dashes() {
        let f = FlavoredFormat::parse("writers/my-writer.lua+smart");
        assert_eq!(f.base, "writers/my-writer.lua");
        assert_eq!(f.extensions.enable, vec!["smart"]);
        assert_eq!(base_format_name("gfm-raw_html"), "gfm");
    }

    #[test]
    fn test_extensions_apply_diff() {
        let defaults: Extensions = ["smart", "auto_identifiers"].into_iter().collect();
        let diff = FlavoredFormat::parse("html+emoji-smart").extensions;
        let effective = defaults.apply(&diff);
        assert!(effective.contains("emoji"));
        assert!(effective.contains("auto_identifiers"));
        assert!(!effective.contains("smart"));
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(format_from_path(Path::new("report.docx")), Some("docx"));
        assert_eq!(format_from_path(Path::new("NOTES.MD")), Some("markdown"));
        assert_eq!(format_from_path(Path::new("page.xhtml")), Some("html"));
        assert_eq!(format_from_path(Path::new("tool.1")), Some("man"));
        assert_eq!(format_from_path(Path::new("main.typ")), Some("typst"));
        assert_eq!(format_from_path(Path::new("archive.zip")), None);
        assert_eq!(format_from_path(Path::new("noext")), None);
        assert_eq!(
            format_from_paths(&["a.zip", "b.rst", "c.org"]),
            Some("rst")
        );
    }

    #[test]
    fn test_pdf_output_detection() {
        assert!(is_pdf_output(None, "out.PDF"));
        assert!(is_pdf_output(Some("pdf"), "-"));
        assert!(!is_pdf_output(Some("latex"), "out.tex"));
        assert!(!is_pdf_output(None, "pdf"));
    }

    #[test]
    fn test_is_text_format() {
        assert!(is_text_format("html"));
        assert!(!is_text_format("docx"));
        assert!(!is_text_format("epub3"));
    }

    #[test]
    fn test_resolve_from_extension() {
        let r = resolve_format(None, None, "report.docx").unwrap();
        assert_eq!(r.writer_name, "docx");
        assert!(!r.pdf_output);
        assert_eq!(r.pdf_engine, None);
        assert!(r.warnings.is_empty());
    }

    #[test]
    fn test_resolve_stdout_is_html() {
        let r = resolve_format(None, None, "-").unwrap();
        assert_eq!(r.writer_name, "html");
        assert!(r.warnings.is_empty());
    }

    #[test]
    fn test_resolve_unknown_extension_warns_and_uses_html() {
        let r = resolve_format(None, None, "out.xyz").unwrap();
        assert_eq!(r.writer_name, "html");
        assert_eq!(
            r.warnings,
            vec![ResolutionWarning::CouldNotDeduceFormat {
                output_path: "out.xyz".to_string()
            }]
        );
    }

    #[test]
    fn test_explicit_format_used_verbatim() {
        let r = resolve_format(Some("markdown+smart"), Some("xelatex"), "out.txt").unwrap();
        assert_eq!(r.writer_name, "markdown+smart");
        assert_eq!(r.pdf_engine, None);
        assert_eq!(r.flavored().base, "markdown");
    }

    #[test]
    fn test_pdf_format_defaults_to_latex() {
        let r = resolve_format(Some("pdf"), None, "-").unwrap();
        assert!(r.pdf_output);
        assert_eq!(r.writer_name, "latex");
        assert_eq!(r.pdf_engine.as_deref(), Some("pdflatex"));
    }

    #[test]
    fn test_pdf_extension_uses_explicit_engine() {
        let r = resolve_format(None, Some("weasyprint"), "out.pdf").unwrap();
        assert_eq!(r.writer_name, "html");
        assert_eq!(r.pdf_engine.as_deref(), Some("weasyprint"));
    }

    #[test]
    fn test_pdf_with_incompatible_pair_fails() {
        assert!(resolve_format(Some("context"), Some("/usr/bin/mtxrun"), "out.pdf").is_err());
    }
}
