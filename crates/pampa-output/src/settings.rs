/*
 * settings.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Turning [`Options`] into ready-to-run [`OutputSettings`].
//!
//! Resolution is one `Result` chain:
//!
//! 1. dump-args short-circuit (no I/O happens before it)
//! 2. format and PDF engine
//! 3. epub metadata
//! 4. writer acquisition, including the template
//! 5. syntax map
//! 6. highlight style
//! 7. variables
//! 8. assembly
//!
//! The first failing stage aborts resolution.

use std::path::Path;

use pampa_doctemplate::Template;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{OutputSettingsError, Result};
use crate::format::{Extensions, FlavoredFormat, ResolutionWarning, is_text_format, resolve_format};
use crate::highlight::{HighlightStyle, resolve_highlight_style};
use crate::options::{
    CiteMethod, EmailObfuscation, HtmlMathMethod, Options, ReferenceLocation, TopLevelDivision,
    WrapOption,
};
use crate::runtime::SystemRuntime;
use crate::sandbox::ReadAllowList;
use crate::scripting::{ScriptingEngine, find_custom_writer, is_custom_writer};
use crate::syntax_map::{SyntaxMap, load_syntax_map};
use crate::template::{
    DZSLIDES_TEMPLATE, ResolvedTemplate, TemplateOrigin, TemplateRequest, compile_template_source,
    default_template, resolve_template,
};
use crate::variables::{VariableContext, VariableInputs, build_variables};
use crate::writers::{Document, Writer, WriterOutput, WriterRegistry, WriterResult};

/// Style used when the user names none.
pub const DEFAULT_HIGHLIGHT_STYLE: &str = "pygments";

/// Everything a writer is configured with.
#[derive(Debug, Clone)]
pub struct WriterOptions {
    pub template: Option<Template>,
    pub template_origin: Option<TemplateOrigin>,
    pub variables: VariableContext,
    pub extensions: Extensions,
    pub standalone: bool,
    pub syntax_map: SyntaxMap,
    /// `None` disables highlighting.
    pub highlight_style: Option<HighlightStyle>,
    /// Contents of the epub metadata file.
    pub epub_metadata: Option<String>,

    pub tab_stop: usize,
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
    pub prefer_ascii: bool,
    pub reference_links: bool,
    pub reference_location: ReferenceLocation,
    pub top_level_division: TopLevelDivision,
    pub email_obfuscation: EmailObfuscation,
    pub listings: bool,
    pub setext_headers: bool,
    pub dpi: u32,
    pub reference_doc: Option<String>,
    pub epub_subdirectory: String,
    pub epub_fonts: Vec<String>,
    pub epub_chapter_level: u32,
    pub epub_title_page: bool,
    pub link_images: bool,
    pub split_level: u32,
    pub chunk_template: String,
}

impl WriterOptions {
    /// Per-format toggles copied from the options. Resolved parts
    /// (template, variables, syntax map, ...) start empty.
    pub fn from_options(options: &Options) -> Self {
        Self {
            template: None,
            template_origin: None,
            variables: VariableContext::new(),
            extensions: Extensions::new(),
            standalone: options.standalone,
            syntax_map: SyntaxMap::default(),
            highlight_style: None,
            epub_metadata: None,
            tab_stop: options.tab_stop,
            table_of_contents: options.table_of_contents,
            toc_depth: options.toc_depth,
            html_math_method: options.html_math_method,
            math_url: options.math_url.clone(),
            cite_method: options.cite_method,
            number_sections: options.number_sections,
            number_offset: options.number_offset.clone(),
            section_divs: options.section_divs,
            incremental: options.incremental,
            slide_level: options.slide_level,
            wrap: options.wrap,
            columns: options.columns,
            identifier_prefix: options.identifier_prefix.clone(),
            html_q_tags: options.html_q_tags,
            prefer_ascii: options.ascii,
            reference_links: options.reference_links,
            reference_location: options.reference_location,
            top_level_division: options.top_level_division,
            email_obfuscation: options.email_obfuscation,
            listings: options.listings,
            setext_headers: options.setext_headers,
            dpi: options.dpi,
            reference_doc: options.reference_doc.clone(),
            epub_subdirectory: options.epub_subdirectory.clone(),
            epub_fonts: options.epub_fonts.clone(),
            epub_chapter_level: options.epub_chapter_level,
            epub_title_page: options.epub_title_page,
            link_images: options.link_images,
            split_level: options.split_level,
            chunk_template: options.chunk_template.clone(),
        }
    }
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self::from_options(&Options::default())
    }
}

/// The resolved, ready-to-run output configuration.
#[derive(Debug, Clone)]
pub struct OutputSettings {
    /// Base name of the output format, e.g. `markdown`.
    pub format: String,
    pub writer: Writer,
    /// The format as requested, extensions included.
    pub writer_name: String,
    pub writer_options: WriterOptions,
    /// The PDF engine program, for PDF output.
    pub pdf_engine: Option<String>,
    /// Extra arguments for the PDF engine, in the order given.
    pub pdf_engine_opts: Vec<String>,
    pub pdf_output: bool,
    pub warnings: Vec<ResolutionWarning>,
}

impl OutputSettings {
    /// Run the resolved writer on a document.
    pub fn write(&self, document: &Document, runtime: &dyn SystemRuntime) -> WriterResult<WriterOutput> {
        self.writer.run(&self.writer_options, document, runtime)
    }
}

/// What `--dump-args` reports: the output path, then the input paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DumpedArgs {
    pub output_file: String,
    pub input_files: Vec<String>,
}

impl DumpedArgs {
    fn from_options(options: &Options) -> Self {
        let input_files = if options.input_files.is_empty() {
            vec!["-".to_string()]
        } else {
            options.input_files.clone()
        };
        Self {
            output_file: options.output_path().to_string(),
            input_files,
        }
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.output_file.as_str()).chain(self.input_files.iter().map(String::as_str))
    }
}

/// Outcome of resolution.
#[derive(Debug, Clone)]
pub enum Resolution {
    /// The caller asked for its arguments to be dumped; nothing was resolved.
    DumpArgs(DumpedArgs),
    Settings(Box<OutputSettings>),
}

/// A writer together with what it was acquired with.
#[derive(Debug, Clone)]
pub struct AcquiredWriter {
    pub writer: Writer,
    /// Default extensions with the requested diff applied.
    pub extensions: Extensions,
    pub template: Option<ResolvedTemplate>,
}

/// Find the writer for a format, resolve its template, and sandbox it when
/// asked to.
pub fn acquire_writer(
    flavored: &FlavoredFormat,
    standalone: bool,
    options: &Options,
    registry: &WriterRegistry,
    scripting: &dyn ScriptingEngine,
    runtime: &dyn SystemRuntime,
) -> Result<AcquiredWriter> {
    let format = flavored.base.as_str();
    let data_dir = options.data_dir.as_deref();
    let request = TemplateRequest {
        standalone,
        explicit: options.template.as_deref().map(Path::new),
        format,
        data_dir,
    };

    let (writer, defaults, template) = if is_custom_writer(format) {
        let script = find_custom_writer(format, data_dir, runtime);
        debug!("loading custom writer {}", script.display());
        let custom = scripting
            .load_custom(&script, runtime)
            .map_err(|e| OutputSettingsError::Scripting(e.to_string()))?;
        let template = resolve_template(request, runtime, || {
            custom
                .default_template
                .as_deref()
                .map(|source| {
                    compile_template_source(source, &script, runtime).map(|template| {
                        ResolvedTemplate::new(template, TemplateOrigin::CustomWriter(script.clone()))
                    })
                })
                .transpose()
        })?;
        (custom.writer, custom.extensions, template)
    } else {
        let template = resolve_template(request, runtime, || {
            default_template(format, data_dir, runtime).map(Some)
        })?;
        let (writer, defaults) = registry
            .get(format)
            .ok_or_else(|| OutputSettingsError::UnknownWriter(format.to_string()))?;
        (writer, defaults, template)
    };

    let writer = if options.sandbox {
        let allow = ReadAllowList::from_options(options);
        debug!(patterns = allow.patterns().len(), "sandboxing writer");
        writer.sandboxed(allow)
    } else {
        writer
    };

    Ok(AcquiredWriter {
        writer,
        extensions: defaults.apply(&flavored.extensions),
        template,
    })
}

/// Resolve options into output settings.
pub fn resolve_output_settings(
    options: &Options,
    registry: &WriterRegistry,
    scripting: &dyn ScriptingEngine,
    runtime: &dyn SystemRuntime,
) -> Result<Resolution> {
    if options.dump_args {
        return Ok(Resolution::DumpArgs(DumpedArgs::from_options(options)));
    }

    let output_path = options.output_path();
    let resolved = resolve_format(
        options.to.as_deref(),
        options.pdf_engine.as_deref(),
        output_path,
    )?;
    let flavored = resolved.flavored();
    let format = flavored.base.clone();
    info!(format = %format, pdf_engine = ?resolved.pdf_engine, "resolved output format");

    let epub_metadata = options
        .epub_metadata
        .as_deref()
        .map(|path| runtime.file_read_string(Path::new(path)))
        .transpose()?;

    let standalone = options.standalone || !is_text_format(&format) || resolved.pdf_output;

    let acquired = acquire_writer(&flavored, standalone, options, registry, scripting, runtime)?;

    let syntax_map = load_syntax_map(&options.syntax_definitions, runtime)?;

    let highlight_style = if options.no_highlight {
        None
    } else {
        let name = options
            .highlight_style
            .as_deref()
            .unwrap_or(DEFAULT_HIGHLIGHT_STYLE);
        Some(resolve_highlight_style(name, runtime)?)
    };

    let variables = build_variables(&VariableInputs {
        options,
        format: &format,
        runtime,
        dzslides_template: DZSLIDES_TEMPLATE,
    })?;

    let (template, template_origin) = match acquired.template {
        Some(resolved) => (Some(resolved.template), Some(resolved.origin)),
        None => (None, None),
    };

    let writer_options = WriterOptions {
        template,
        template_origin,
        variables,
        extensions: acquired.extensions,
        standalone,
        syntax_map,
        highlight_style,
        epub_metadata,
        ..WriterOptions::from_options(options)
    };

    Ok(Resolution::Settings(Box::new(OutputSettings {
        format,
        writer: acquired.writer,
        writer_name: resolved.writer_name,
        writer_options,
        pdf_engine: resolved.pdf_engine,
        pdf_engine_opts: options.pdf_engine_opts.clone(),
        pdf_output: resolved.pdf_output,
        warnings: resolved.warnings,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::NativeRuntime;
    use crate::scripting::{CustomComponents, NoScriptingEngine, ScriptingError};
    use crate::writers::WriterKind;

    fn resolve(options: &Options) -> Result<Resolution> {
        resolve_output_settings(
            options,
            &WriterRegistry::with_defaults(),
            &NoScriptingEngine,
            &NativeRuntime,
        )
    }

    fn settings(options: &Options) -> OutputSettings {
        match resolve(options).unwrap() {
            Resolution::Settings(s) => *s,
            Resolution::DumpArgs(_) => panic!("unexpected dump-args"),
        }
    }

    struct FakeScripting {
        template: Option<&'static str>,
    }

    impl ScriptingEngine for FakeScripting {
        fn load_custom(
            &self,
            path: &Path,
            _runtime: &dyn SystemRuntime,
        ) -> std::result::Result<CustomComponents, ScriptingError> {
            let name = path.display().to_string();
            Ok(CustomComponents {
                writer: Writer::text(move |_, _, _| Ok(name.clone())),
                extensions: ["smart"].into_iter().collect(),
                default_template: self.template.map(String::from),
            })
        }
    }

    #[test]
    fn test_dump_args_short_circuits() {
        // The bad format would fail if resolution went any further.
        let options = Options {
            dump_args: true,
            to: Some("nonesuch".into()),
            output_file: Some("out.html".into()),
            ..Options::default()
        };
        let Resolution::DumpArgs(dumped) = resolve(&options).unwrap() else {
            panic!("expected dump-args");
        };
        assert_eq!(dumped.lines().collect::<Vec<_>>(), vec!["out.html", "-"]);
    }

    #[test]
    fn test_non_text_formats_are_standalone() {
        let s = settings(&Options {
            output_file: Some("out.docx".into()),
            ..Options::default()
        });
        assert!(s.writer_options.standalone);
        assert_eq!(s.writer.kind(), WriterKind::Binary);
        assert_eq!(s.writer_options.template.as_ref().unwrap().source(), "");
        assert_eq!(
            s.writer_options.template_origin,
            Some(TemplateOrigin::Builtin("docx".into()))
        );

        let html = settings(&Options::default());
        assert!(!html.writer_options.standalone);
        assert!(html.writer_options.template.is_none());
    }

    #[test]
    fn test_extension_diff_applied() {
        let s = settings(&Options {
            to: Some("html+smart-native_divs".into()),
            ..Options::default()
        });
        assert_eq!(s.format, "html");
        assert_eq!(s.writer_name, "html+smart-native_divs");
        let exts = &s.writer_options.extensions;
        assert!(exts.contains("smart"));
        assert!(!exts.contains("native_divs"));
        assert!(exts.contains("native_spans"));
    }

    #[test]
    fn test_unknown_writer() {
        let err = resolve(&Options {
            to: Some("nonesuch".into()),
            ..Options::default()
        })
        .unwrap_err();
        assert!(matches!(err, OutputSettingsError::UnknownWriter(f) if f == "nonesuch"));
    }

    #[test]
    fn test_custom_writer_without_engine_support() {
        let err = resolve(&Options {
            to: Some("mine.lua".into()),
            ..Options::default()
        })
        .unwrap_err();
        assert!(matches!(err, OutputSettingsError::Scripting(_)));
    }

    #[test]
    fn test_custom_writer_components() {
        let options = Options {
            to: Some("mine.lua+raw_html".into()),
            standalone: true,
            ..Options::default()
        };
        let registry = WriterRegistry::with_defaults();
        let scripting = FakeScripting {
            template: Some("<<$body$>>"),
        };
        let Resolution::Settings(s) =
            resolve_output_settings(&options, &registry, &scripting, &NativeRuntime).unwrap()
        else {
            panic!("expected settings");
        };
        assert_eq!(s.format, "mine.lua");
        assert!(s.writer_options.extensions.contains("smart"));
        assert!(s.writer_options.extensions.contains("raw_html"));
        assert_eq!(
            s.writer_options.template.as_ref().unwrap().source(),
            "<<$body$>>"
        );
        assert_eq!(
            s.writer_options.template_origin,
            Some(TemplateOrigin::CustomWriter("mine.lua".into()))
        );
        assert_eq!(
            s.write(&Document::Null, &NativeRuntime).unwrap(),
            WriterOutput::Text("mine.lua".to_string())
        );

        let no_template = FakeScripting { template: None };
        let Resolution::Settings(s) =
            resolve_output_settings(&options, &registry, &no_template, &NativeRuntime).unwrap()
        else {
            panic!("expected settings");
        };
        assert!(s.writer_options.template.is_none());
        assert!(s.writer_options.template_origin.is_none());
    }

    #[test]
    fn test_highlighting() {
        let s = settings(&Options::default());
        assert_eq!(
            s.writer_options.highlight_style,
            crate::highlight::builtin_style(DEFAULT_HIGHLIGHT_STYLE)
        );

        let off = settings(&Options {
            no_highlight: true,
            highlight_style: Some("not-a-style".into()),
            ..Options::default()
        });
        assert!(off.writer_options.highlight_style.is_none());

        let err = resolve(&Options {
            highlight_style: Some("not-a-style".into()),
            ..Options::default()
        })
        .unwrap_err();
        assert!(matches!(err, OutputSettingsError::UnknownHighlightStyle(_)));
    }

    #[test]
    fn test_epub_metadata_read() {
        let dir = tempfile::tempdir().unwrap();
        let meta = dir.path().join("meta.xml");
        std::fs::write(&meta, "<dc:rights>CC</dc:rights>").unwrap();

        let s = settings(&Options {
            output_file: Some("book.epub".into()),
            epub_metadata: Some(meta.to_string_lossy().into_owned()),
            ..Options::default()
        });
        assert_eq!(
            s.writer_options.epub_metadata.as_deref(),
            Some("<dc:rights>CC</dc:rights>")
        );

        let err = resolve(&Options {
            epub_metadata: Some(dir.path().join("missing.xml").to_string_lossy().into_owned()),
            ..Options::default()
        })
        .unwrap_err();
        assert!(matches!(err, OutputSettingsError::Runtime(_)));
    }

    #[test]
    fn test_toggles_copied() {
        let s = settings(&Options {
            columns: 100,
            ascii: true,
            toc_depth: 2,
            ..Options::default()
        });
        let w = &s.writer_options;
        assert_eq!(w.columns, 100);
        assert!(w.prefer_ascii);
        assert_eq!(w.toc_depth, 2);
        assert_eq!(w.dpi, 96);
        assert_eq!(w.variables.get("outputfile"), Some(&"-".into()));
    }

    #[test]
    fn test_dzslides_gets_core() {
        let s = settings(&Options {
            to: Some("dzslides".into()),
            ..Options::default()
        });
        let Some(crate::variables::Value::String(core)) =
            s.writer_options.variables.get("dzslides-core")
        else {
            panic!("dzslides-core not set");
        };
        assert!(core.starts_with(crate::variables::DZSLIDES_CORE_MARKER));
        assert!(core.contains("Dz.init"));
    }

    #[test]
    fn test_writer_options_default() {
        let w = WriterOptions::default();
        assert!(!w.standalone);
        assert_eq!(w.tab_stop, 4);
        assert_eq!(w.epub_subdirectory, "EPUB");
        assert!(w.template.is_none());
    }
}
