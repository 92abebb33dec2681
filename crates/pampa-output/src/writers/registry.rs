/*
 * registry.rs
 * Copyright (c) 2025 Posit, PBC
 */

use indexmap::IndexMap;
use serde::Serialize;

use super::Writer;
use crate::format::Extensions;

/// Whether a format produces text or binary output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WriterKind {
    Text,
    Binary,
}

const AUTO_IDENTIFIERS: &[&str] = &["auto_identifiers"];

const HTML_EXTENSIONS: &[&str] = &[
    "auto_identifiers",
    "line_blocks",
    "native_divs",
    "native_spans",
];

const LATEX_EXTENSIONS: &[&str] = &["auto_identifiers", "latex_macros", "smart"];

const PANDOC_MARKDOWN_EXTENSIONS: &[&str] = &[
    "all_symbols_escapable",
    "auto_identifiers",
    "backtick_code_blocks",
    "blank_before_blockquote",
    "blank_before_header",
    "bracketed_spans",
    "citations",
    "definition_lists",
    "escaped_line_breaks",
    "example_lists",
    "fancy_lists",
    "fenced_code_attributes",
    "fenced_code_blocks",
    "fenced_divs",
    "footnotes",
    "grid_tables",
    "header_attributes",
    "implicit_figures",
    "implicit_header_references",
    "inline_code_attributes",
    "inline_notes",
    "intraword_underscores",
    "latex_macros",
    "line_blocks",
    "link_attributes",
    "multiline_tables",
    "native_divs",
    "native_spans",
    "pandoc_title_block",
    "pipe_tables",
    "raw_attribute",
    "raw_html",
    "raw_tex",
    "shortcut_reference_links",
    "simple_tables",
    "smart",
    "space_in_atx_header",
    "startnum",
    "strikeout",
    "subscript",
    "superscript",
    "task_lists",
    "tex_math_dollars",
    "yaml_metadata_block",
];

const GFM_EXTENSIONS: &[&str] = &[
    "alerts",
    "autolink_bare_uris",
    "emoji",
    "footnotes",
    "gfm_auto_identifiers",
    "pipe_tables",
    "raw_html",
    "strikeout",
    "task_lists",
    "tex_math_dollars",
    "yaml_metadata_block",
];

const PLAIN_EXTENSIONS: &[&str] = &[
    "all_symbols_escapable",
    "definition_lists",
    "escaped_line_breaks",
    "example_lists",
    "fancy_lists",
    "footnotes",
    "grid_tables",
    "intraword_underscores",
    "multiline_tables",
    "pipe_tables",
    "simple_tables",
    "startnum",
    "strikeout",
];

const NONE: &[&str] = &[];

/// Output formats this registry knows about, with their kind and default
/// extensions.
const CATALOG: &[(&str, WriterKind, &[&str])] = &[
    ("asciidoc", WriterKind::Text, AUTO_IDENTIFIERS),
    ("asciidoctor", WriterKind::Text, AUTO_IDENTIFIERS),
    ("beamer", WriterKind::Text, LATEX_EXTENSIONS),
    ("biblatex", WriterKind::Text, NONE),
    ("bibtex", WriterKind::Text, NONE),
    ("chunkedhtml", WriterKind::Binary, HTML_EXTENSIONS),
    ("commonmark", WriterKind::Text, NONE),
    ("commonmark_x", WriterKind::Text, GFM_EXTENSIONS),
    ("context", WriterKind::Text, &["auto_identifiers", "smart"]),
    ("csljson", WriterKind::Text, NONE),
    ("docbook", WriterKind::Text, AUTO_IDENTIFIERS),
    ("docbook4", WriterKind::Text, AUTO_IDENTIFIERS),
    ("docbook5", WriterKind::Text, AUTO_IDENTIFIERS),
    ("docx", WriterKind::Binary, AUTO_IDENTIFIERS),
    ("dokuwiki", WriterKind::Text, NONE),
    ("dzslides", WriterKind::Text, HTML_EXTENSIONS),
    ("epub", WriterKind::Binary, HTML_EXTENSIONS),
    ("epub2", WriterKind::Binary, HTML_EXTENSIONS),
    ("epub3", WriterKind::Binary, HTML_EXTENSIONS),
    ("fb2", WriterKind::Text, NONE),
    ("gfm", WriterKind::Text, GFM_EXTENSIONS),
    ("haddock", WriterKind::Text, NONE),
    ("html", WriterKind::Text, HTML_EXTENSIONS),
    ("html4", WriterKind::Text, HTML_EXTENSIONS),
    ("html5", WriterKind::Text, HTML_EXTENSIONS),
    ("icml", WriterKind::Text, NONE),
    ("ipynb", WriterKind::Text, NONE),
    ("jats", WriterKind::Text, AUTO_IDENTIFIERS),
    ("jira", WriterKind::Text, NONE),
    ("json", WriterKind::Text, NONE),
    ("latex", WriterKind::Text, LATEX_EXTENSIONS),
    ("man", WriterKind::Text, NONE),
    ("markdown", WriterKind::Text, PANDOC_MARKDOWN_EXTENSIONS),
    ("markdown_mmd", WriterKind::Text, NONE),
    ("markdown_phpextra", WriterKind::Text, NONE),
    ("markdown_strict", WriterKind::Text, NONE),
    ("markua", WriterKind::Text, NONE),
    ("mediawiki", WriterKind::Text, NONE),
    ("ms", WriterKind::Text, AUTO_IDENTIFIERS),
    ("muse", WriterKind::Text, AUTO_IDENTIFIERS),
    ("native", WriterKind::Text, NONE),
    ("odt", WriterKind::Binary, AUTO_IDENTIFIERS),
    ("opendocument", WriterKind::Text, AUTO_IDENTIFIERS),
    ("opml", WriterKind::Text, NONE),
    ("org", WriterKind::Text, AUTO_IDENTIFIERS),
    ("plain", WriterKind::Text, PLAIN_EXTENSIONS),
    ("pptx", WriterKind::Binary, NONE),
    ("revealjs", WriterKind::Text, HTML_EXTENSIONS),
    ("rst", WriterKind::Text, AUTO_IDENTIFIERS),
    ("rtf", WriterKind::Text, NONE),
    ("s5", WriterKind::Text, HTML_EXTENSIONS),
    ("slideous", WriterKind::Text, HTML_EXTENSIONS),
    ("slidy", WriterKind::Text, HTML_EXTENSIONS),
    ("tei", WriterKind::Text, AUTO_IDENTIFIERS),
    ("texinfo", WriterKind::Text, AUTO_IDENTIFIERS),
    ("textile", WriterKind::Text, NONE),
    ("typst", WriterKind::Text, AUTO_IDENTIFIERS),
    ("xwiki", WriterKind::Text, NONE),
    ("zimwiki", WriterKind::Text, NONE),
];

#[derive(Debug, Clone)]
struct WriterEntry {
    kind: WriterKind,
    default_extensions: Extensions,
    writer: Option<Writer>,
}

/// Maps output format names to writers and their default extensions.
#[derive(Debug, Clone, Default)]
pub struct WriterRegistry {
    entries: IndexMap<String, WriterEntry>,
}

impl WriterRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The full format catalog, with the json and native writers
    /// implemented.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for &(name, kind, extensions) in CATALOG {
            registry.entries.insert(
                name.to_string(),
                WriterEntry {
                    kind,
                    default_extensions: extensions.iter().copied().collect(),
                    writer: None,
                },
            );
        }
        registry.register("json", super::json::writer(), Extensions::new());
        registry.register("native", super::native::writer(), Extensions::new());
        registry
    }

    /// Register (or replace) the implementation of a format.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        writer: Writer,
        default_extensions: Extensions,
    ) -> &mut Self {
        self.entries.insert(
            name.into(),
            WriterEntry {
                kind: writer.kind(),
                default_extensions,
                writer: Some(writer),
            },
        );
        self
    }

    /// Writer and default extensions for a base format name.
    ///
    /// Catalogued formats without an implementation yield a writer that
    /// reports [`super::WriterError::Unavailable`] when run.
    pub fn get(&self, name: &str) -> Option<(Writer, Extensions)> {
        let entry = self.entries.get(name)?;
        let writer = entry
            .writer
            .clone()
            .unwrap_or_else(|| Writer::unavailable(entry.kind, name));
        Some((writer, entry.default_extensions.clone()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Whether a real implementation is registered for `name`.
    pub fn is_implemented(&self, name: &str) -> bool {
        self.entries.get(name).is_some_and(|e| e.writer.is_some())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::NativeRuntime;
    use crate::settings::WriterOptions;
    use crate::writers::{Document, WriterError, WriterOutput};

    #[test]
    fn test_catalog_lists_common_formats() {
        let registry = WriterRegistry::with_defaults();
        for name in ["html", "latex", "docx", "context", "typst", "ms", "dzslides"] {
            assert!(registry.contains(name), "{name}");
        }
        assert!(!registry.contains("pdf"));
        assert!(registry.get("nonesuch").is_none());
    }

    #[test]
    fn test_binary_formats_are_binary() {
        let registry = WriterRegistry::with_defaults();
        let (docx, _) = registry.get("docx").unwrap();
        assert_eq!(docx.kind(), WriterKind::Binary);
        let (html, exts) = registry.get("html").unwrap();
        assert_eq!(html.kind(), WriterKind::Text);
        assert!(exts.contains("native_divs"));
    }

    #[test]
    fn test_json_is_implemented_html_is_not() {
        let registry = WriterRegistry::with_defaults();
        assert!(registry.is_implemented("json"));
        assert!(registry.is_implemented("native"));
        assert!(!registry.is_implemented("html"));

        let (html, _) = registry.get("html").unwrap();
        let err = html
            .run(&WriterOptions::default(), &Document::Null, &NativeRuntime)
            .unwrap_err();
        assert!(matches!(err, WriterError::Unavailable(_)));
    }

    #[test]
    fn test_register_replaces_catalog_entry() {
        let mut registry = WriterRegistry::with_defaults();
        registry.register(
            "html",
            Writer::text(|_, _, _| Ok("<p/>".to_string())),
            ["smart"].into_iter().collect(),
        );
        let (html, exts) = registry.get("html").unwrap();
        assert!(exts.contains("smart"));
        assert!(!exts.contains("native_divs"));
        assert_eq!(
            html.run(&WriterOptions::default(), &Document::Null, &NativeRuntime)
                .unwrap(),
            WriterOutput::Text("<p/>".to_string())
        );
    }
}
