/*
 * template/builtin.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Default templates embedded in the binary.

use super::bundle::TemplateBundle;

/// Formats with a non-empty built-in template.
pub const BUILTIN_TEMPLATE_NAMES: &[&str] = &[
    "asciidoc",
    "asciidoctor",
    "beamer",
    "chunkedhtml",
    "commonmark",
    "commonmark_x",
    "context",
    "docbook",
    "docbook4",
    "docbook5",
    "dokuwiki",
    "dzslides",
    "epub",
    "epub2",
    "epub3",
    "gfm",
    "haddock",
    "html",
    "html4",
    "html5",
    "icml",
    "jats",
    "jira",
    "latex",
    "man",
    "markdown",
    "markdown_mmd",
    "markdown_phpextra",
    "markdown_strict",
    "markua",
    "mediawiki",
    "ms",
    "muse",
    "opendocument",
    "opml",
    "org",
    "plain",
    "revealjs",
    "rst",
    "rtf",
    "s5",
    "slideous",
    "slidy",
    "tei",
    "texinfo",
    "textile",
    "typst",
    "xwiki",
    "zimwiki",
];

/// Formats whose default template is empty: their output is not driven by
/// a text template.
pub const EMPTY_TEMPLATE_NAMES: &[&str] = &[
    "biblatex",
    "bibtex",
    "csljson",
    "docx",
    "fb2",
    "ipynb",
    "json",
    "native",
    "odt",
    "pptx",
];

/// The full text of the dzslides template, including its core section.
pub const DZSLIDES_TEMPLATE: &str = include_str!("../../resources/templates/dzslides.html");

const HTML_TEMPLATE: &str = include_str!("../../resources/templates/html/main.html");
const HTML_STYLES: &str = include_str!("../../resources/templates/html/styles.html");
const EPUB_TEMPLATE: &str = include_str!("../../resources/templates/epub.xhtml");
const HTML4_TEMPLATE: &str = include_str!("../../resources/templates/html4.html");
const LATEX_TEMPLATE: &str = include_str!("../../resources/templates/latex/main.tex");
const LATEX_COMMON: &str = include_str!("../../resources/templates/latex/common.tex");
const CONTEXT_TEMPLATE: &str = include_str!("../../resources/templates/context.tex");
const PLAIN_TEMPLATE: &str = include_str!("../../resources/templates/plain.txt");
const MARKDOWN_TEMPLATE: &str = include_str!("../../resources/templates/markdown.md");
const MS_TEMPLATE: &str = include_str!("../../resources/templates/ms.ms");
const TYPST_TEMPLATE: &str = include_str!("../../resources/templates/typst/main.typ");
const TYPST_DEFINITIONS: &str = include_str!("../../resources/templates/typst/definitions.typ");
const RST_TEMPLATE: &str = include_str!("../../resources/templates/rst.rst");
const ORG_TEMPLATE: &str = include_str!("../../resources/templates/org.org");
const ASCIIDOC_TEMPLATE: &str = include_str!("../../resources/templates/asciidoc.adoc");
const DOCBOOK4_TEMPLATE: &str = include_str!("../../resources/templates/docbook/docbook4.xml");
const DOCBOOK5_TEMPLATE: &str = include_str!("../../resources/templates/docbook/docbook5.xml");
const JATS_TEMPLATE: &str = include_str!("../../resources/templates/jats.xml");
const TEI_TEMPLATE: &str = include_str!("../../resources/templates/tei.xml");
const OPML_TEMPLATE: &str = include_str!("../../resources/templates/opml.opml");
const ICML_TEMPLATE: &str = include_str!("../../resources/templates/icml.icml");
const OPENDOCUMENT_TEMPLATE: &str = include_str!("../../resources/templates/opendocument.xml");
const MAN_TEMPLATE: &str = include_str!("../../resources/templates/man.man");
const RTF_TEMPLATE: &str = include_str!("../../resources/templates/rtf.rtf");
const TEXINFO_TEMPLATE: &str = include_str!("../../resources/templates/texinfo.texi");
const MUSE_TEMPLATE: &str = include_str!("../../resources/templates/muse.muse");
const WIKI_TEMPLATE: &str = include_str!("../../resources/templates/wiki/body.txt");
const MEDIAWIKI_TEMPLATE: &str = include_str!("../../resources/templates/wiki/mediawiki.wiki");
const REVEALJS_TEMPLATE: &str = include_str!("../../resources/templates/slides/revealjs.html");
const SLIDY_TEMPLATE: &str = include_str!("../../resources/templates/slides/slidy.html");
const S5_TEMPLATE: &str = include_str!("../../resources/templates/slides/s5.html");

/// The built-in template bundle for a base format name.
pub fn get_builtin_template(format: &str) -> Option<TemplateBundle> {
    let bundle = match format {
        "html" | "html5" | "chunkedhtml" => {
            TemplateBundle::new(HTML_TEMPLATE).with_partial("styles.html", HTML_STYLES)
        }
        "html4" => TemplateBundle::new(HTML4_TEMPLATE),
        "epub" | "epub2" | "epub3" => TemplateBundle::new(EPUB_TEMPLATE),
        "latex" | "beamer" => {
            TemplateBundle::new(LATEX_TEMPLATE).with_partial("common.tex", LATEX_COMMON)
        }
        "context" => TemplateBundle::new(CONTEXT_TEMPLATE),
        "dzslides" => TemplateBundle::new(DZSLIDES_TEMPLATE),
        "plain" => TemplateBundle::new(PLAIN_TEMPLATE),
        "markdown" | "markdown_mmd" | "markdown_phpextra" | "markdown_strict" | "gfm"
        | "commonmark" | "commonmark_x" => TemplateBundle::new(MARKDOWN_TEMPLATE),
        "ms" => TemplateBundle::new(MS_TEMPLATE),
        "typst" => {
            TemplateBundle::new(TYPST_TEMPLATE).with_partial("definitions.typ", TYPST_DEFINITIONS)
        }
        "rst" => TemplateBundle::new(RST_TEMPLATE),
        "org" => TemplateBundle::new(ORG_TEMPLATE),
        "asciidoc" | "asciidoctor" => TemplateBundle::new(ASCIIDOC_TEMPLATE),
        "docbook" | "docbook4" => TemplateBundle::new(DOCBOOK4_TEMPLATE),
        "docbook5" => TemplateBundle::new(DOCBOOK5_TEMPLATE),
        "jats" => TemplateBundle::new(JATS_TEMPLATE),
        "tei" => TemplateBundle::new(TEI_TEMPLATE),
        "opml" => TemplateBundle::new(OPML_TEMPLATE),
        "icml" => TemplateBundle::new(ICML_TEMPLATE),
        "opendocument" => TemplateBundle::new(OPENDOCUMENT_TEMPLATE),
        "man" => TemplateBundle::new(MAN_TEMPLATE),
        "rtf" => TemplateBundle::new(RTF_TEMPLATE),
        "texinfo" => TemplateBundle::new(TEXINFO_TEMPLATE),
        "muse" => TemplateBundle::new(MUSE_TEMPLATE),
        "mediawiki" => TemplateBundle::new(MEDIAWIKI_TEMPLATE),
        "dokuwiki" | "haddock" | "jira" | "markua" | "textile" | "xwiki" | "zimwiki" => {
            TemplateBundle::new(WIKI_TEMPLATE)
        }
        "revealjs" => TemplateBundle::new(REVEALJS_TEMPLATE),
        "slidy" => TemplateBundle::new(SLIDY_TEMPLATE),
        "s5" | "slideous" => TemplateBundle::new(S5_TEMPLATE),
        f if EMPTY_TEMPLATE_NAMES.contains(&f) => TemplateBundle::new(""),
        _ => return None,
    };
    Some(bundle)
}

pub fn is_builtin_template(format: &str) -> bool {
    BUILTIN_TEMPLATE_NAMES.contains(&format) || EMPTY_TEMPLATE_NAMES.contains(&format)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variables::DZSLIDES_CORE_MARKER;

    #[test]
    fn test_every_builtin_compiles() {
        for name in BUILTIN_TEMPLATE_NAMES.iter().chain(EMPTY_TEMPLATE_NAMES) {
            let bundle = get_builtin_template(name).unwrap();
            bundle
                .compile(&format!("default.{name}"))
                .unwrap_or_else(|e| panic!("{name}: {e}"));
        }
    }

    #[test]
    fn test_aliases_share_templates() {
        assert_eq!(get_builtin_template("html5"), get_builtin_template("html"));
        assert_eq!(get_builtin_template("beamer"), get_builtin_template("latex"));
        assert_eq!(get_builtin_template("gfm"), get_builtin_template("markdown"));
    }

    #[test]
    fn test_empty_and_missing() {
        assert_eq!(get_builtin_template("docx").unwrap().main, "");
        assert_eq!(get_builtin_template("fb2").unwrap().main, "");
        assert!(get_builtin_template("docbook").unwrap().main.contains("<article>"));
        assert!(get_builtin_template("nonesuch").is_none());
        assert!(!is_builtin_template("nonesuch"));
        assert!(is_builtin_template("pptx"));
    }

    #[test]
    fn test_every_catalogued_writer_has_a_template() {
        let registry = crate::writers::WriterRegistry::with_defaults();
        let missing: Vec<&str> = registry
            .names()
            .filter(|name| get_builtin_template(name).is_none())
            .collect();
        assert!(missing.is_empty(), "no built-in template for {missing:?}");
        for name in registry.names() {
            assert!(is_builtin_template(name), "{name} not listed");
        }
    }

    #[test]
    fn test_dzslides_template_has_core_marker() {
        assert!(
            DZSLIDES_TEMPLATE
                .lines()
                .any(|l| l.starts_with(DZSLIDES_CORE_MARKER))
        );
    }
}
