/*
 * options.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * The user-facing options record consumed by output resolution.
 *
 * Field names follow pandoc's defaults-file keys (kebab-case), so a pandoc
 * defaults YAML file deserializes straight into `Options`.
 */

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::variables::{Value, VariableContext};

/// Errors loading a defaults file.
#[derive(Debug, Error)]
pub enum DefaultsError {
    #[error("could not read defaults file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid defaults file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// How text is wrapped in the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WrapOption {
    #[default]
    Auto,
    None,
    Preserve,
}

/// How math is rendered in HTML output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HtmlMathMethod {
    #[default]
    Plain,
    Webtex,
    Gladtex,
    Mathml,
    Mathjax,
    Katex,
}

/// How citations are processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CiteMethod {
    #[default]
    Citeproc,
    Natbib,
    Biblatex,
}

/// Where footnotes and reference links are placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReferenceLocation {
    EndOfBlock,
    EndOfSection,
    #[default]
    EndOfDocument,
}

/// The division type used for top-level headings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TopLevelDivision {
    #[default]
    Default,
    Part,
    Chapter,
    Section,
}

/// How email addresses are obfuscated in HTML.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EmailObfuscation {
    #[default]
    None,
    Javascript,
    References,
}

/// Every user-specified knob relevant to output resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Options {
    // Inputs and outputs
    pub input_files: Vec<String>,
    /// Output path; `-` or absent means standard output.
    pub output_file: Option<String>,
    /// Explicit output format, possibly with extensions (`markdown+smart`).
    #[serde(alias = "writer")]
    pub to: Option<String>,
    pub pdf_engine: Option<String>,
    pub pdf_engine_opts: Vec<String>,
    pub template: Option<String>,
    pub standalone: bool,
    pub sandbox: bool,
    pub data_dir: Option<PathBuf>,
    /// Print output and input paths and stop.
    pub dump_args: bool,

    // Template variables and their sources
    pub variables: VariableContext,
    pub include_before_body: Vec<String>,
    pub include_after_body: Vec<String>,
    pub include_in_header: Vec<String>,
    pub css: Vec<String>,
    pub title_prefix: Option<String>,

    // Resources a writer reads
    pub reference_doc: Option<String>,
    pub epub_metadata: Option<String>,
    pub epub_cover_image: Option<String>,
    pub epub_fonts: Vec<String>,
    pub csl: Option<String>,
    pub citation_abbreviations: Option<String>,
    pub bibliography: Vec<String>,

    // Highlighting
    pub syntax_definitions: Vec<String>,
    pub highlight_style: Option<String>,
    pub no_highlight: bool,

    // Per-format toggles copied through to the writer
    pub tab_stop: usize,
    #[serde(alias = "toc")]
    pub table_of_contents: bool,
    pub toc_depth: u32,
    pub html_math_method: HtmlMathMethod,
    pub math_url: Option<String>,
    pub cite_method: CiteMethod,
    pub number_sections: bool,
    pub number_offset: Vec<u32>,
    pub section_divs: bool,
    pub incremental: bool,
    pub slide_level: Option<u32>,
    pub wrap: WrapOption,
    pub columns: usize,
    pub identifier_prefix: String,
    pub html_q_tags: bool,
    pub ascii: bool,
    pub reference_links: bool,
    pub reference_location: ReferenceLocation,
    pub top_level_division: TopLevelDivision,
    pub email_obfuscation: EmailObfuscation,
    pub listings: bool,
    pub setext_headers: bool,
    pub dpi: u32,
    pub epub_chapter_level: u32,
    pub epub_subdirectory: String,
    pub epub_title_page: bool,
    pub link_images: bool,
    pub split_level: u32,
    pub chunk_template: String,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            input_files: Vec::new(),
            output_file: None,
            to: None,
            pdf_engine: None,
            pdf_engine_opts: Vec::new(),
            template: None,
            standalone: false,
            sandbox: false,
            data_dir: None,
            dump_args: false,
            variables: VariableContext::new(),
            include_before_body: Vec::new(),
            include_after_body: Vec::new(),
            include_in_header: Vec::new(),
            css: Vec::new(),
            title_prefix: None,
            reference_doc: None,
            epub_metadata: None,
            epub_cover_image: None,
            epub_fonts: Vec::new(),
            csl: None,
            citation_abbreviations: None,
            bibliography: Vec::new(),
            syntax_definitions: Vec::new(),
            highlight_style: None,
            no_highlight: false,
            tab_stop: 4,
            table_of_contents: false,
            toc_depth: 3,
            html_math_method: HtmlMathMethod::default(),
            math_url: None,
            cite_method: CiteMethod::default(),
            number_sections: false,
            number_offset: vec![0; 6],
            section_divs: false,
            incremental: false,
            slide_level: None,
            wrap: WrapOption::default(),
            columns: 72,
            identifier_prefix: String::new(),
            html_q_tags: false,
            ascii: false,
            reference_links: false,
            reference_location: ReferenceLocation::default(),
            top_level_division: TopLevelDivision::default(),
            email_obfuscation: EmailObfuscation::default(),
            listings: false,
            setext_headers: false,
            dpi: 96,
            epub_chapter_level: 1,
            epub_subdirectory: "EPUB".to_string(),
            epub_title_page: true,
            link_images: false,
            split_level: 1,
            chunk_template: "%s-%i.html".to_string(),
        }
    }
}

impl Options {
    /// Parse options from defaults-file YAML text.
    pub fn from_yaml(text: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(text)
    }

    /// Load a pandoc-style defaults file.
    pub fn from_defaults_file(path: &Path) -> Result<Self, DefaultsError> {
        let text = std::fs::read_to_string(path).map_err(|source| DefaultsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&text).map_err(|source| DefaultsError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// The output path, with standard output spelled `-`.
    pub fn output_path(&self) -> &str {
        self.output_file.as_deref().unwrap_or("-")
    }

    /// Layer explicitly given command-line options over these (file) options.
    ///
    /// Optional fields set on `cli` win, list fields are appended, and
    /// boolean flags are or-ed. Scalar toggles only override when they differ
    /// from their default.
    pub fn merge_cli(mut self, cli: Options) -> Self {
        let defaults = Options::default();

        macro_rules! take_some {
            ($($field:ident),* $(,)?) => {
                $(if cli.$field.is_some() { self.$field = cli.$field; })*
            };
        }
        macro_rules! append {
            ($($field:ident),* $(,)?) => {
                $(self.$field.extend(cli.$field);)*
            };
        }
        macro_rules! or_flag {
            ($($field:ident),* $(,)?) => {
                $(self.$field |= cli.$field;)*
            };
        }
        macro_rules! non_default {
            ($($field:ident),* $(,)?) => {
                $(if cli.$field != defaults.$field { self.$field = cli.$field; })*
            };
        }

        take_some!(
            output_file,
            to,
            pdf_engine,
            template,
            data_dir,
            title_prefix,
            reference_doc,
            epub_metadata,
            epub_cover_image,
            csl,
            citation_abbreviations,
            highlight_style,
            math_url,
            slide_level,
        );
        append!(
            input_files,
            pdf_engine_opts,
            include_before_body,
            include_after_body,
            include_in_header,
            css,
            epub_fonts,
            bibliography,
            syntax_definitions,
        );
        or_flag!(
            standalone,
            sandbox,
            dump_args,
            no_highlight,
            table_of_contents,
            number_sections,
            section_divs,
            incremental,
            html_q_tags,
            ascii,
            reference_links,
            listings,
            setext_headers,
            link_images,
        );
        non_default!(
            tab_stop,
            toc_depth,
            html_math_method,
            cite_method,
            number_offset,
            wrap,
            columns,
            identifier_prefix,
            reference_location,
            top_level_division,
            email_obfuscation,
            dpi,
            epub_chapter_level,
            epub_subdirectory,
            epub_title_page,
            split_level,
            chunk_template,
        );

        for (key, value) in cli.variables {
            match value {
                Value::List(items) => self.variables.append(key, items),
                scalar => self.variables.append(key, [scalar]),
            }
        }
        self
    }
}
