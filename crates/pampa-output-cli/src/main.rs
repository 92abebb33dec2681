/*
 * main.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! pampa-resolve: resolve pandoc-style options and print the output plan.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use pampa_output::options::{TopLevelDivision, WrapOption};
use pampa_output::{
    NativeRuntime, NoScriptingEngine, Options, Resolution, Value, VariableContext,
    WriterRegistry, resolve_output_settings,
};
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod summary;

#[derive(Parser, Debug)]
#[command(name = "pampa-resolve")]
#[command(version = pampa_output::version::cargo_version())]
#[command(about = "Resolve conversion options into output settings", long_about = None)]
#[command(disable_version_flag = true)]
struct Cli {
    /// Print version
    #[arg(long, action = clap::ArgAction::Version)]
    version: Option<bool>,

    /// Input files
    inputs: Vec<String>,

    /// Write output to FILE ('-' for stdout)
    #[arg(short = 'o', long)]
    output: Option<String>,

    /// Output format, with optional extensions (e.g. markdown+smart)
    #[arg(short = 't', long, visible_alias = "write")]
    to: Option<String>,

    /// Program used to produce PDF output
    #[arg(long)]
    pdf_engine: Option<String>,

    /// Option passed to the PDF engine
    #[arg(long = "pdf-engine-opt")]
    pdf_engine_opts: Vec<String>,

    /// Template file
    #[arg(long)]
    template: Option<String>,

    /// Produce a standalone document
    #[arg(short = 's', long)]
    standalone: bool,

    /// Only let the writer read the resources named on the command line
    #[arg(long)]
    sandbox: bool,

    /// User data directory
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Print the output path and input paths, then exit
    #[arg(long)]
    dump_args: bool,

    /// Pandoc-style defaults file (YAML)
    #[arg(short = 'd', long)]
    defaults: Option<PathBuf>,

    /// Template variable (KEY[=VALUE] or KEY[:VALUE])
    #[arg(short = 'V', long = "variable", value_name = "KEY[=VALUE]")]
    variables: Vec<String>,

    #[arg(short = 'B', long)]
    include_before_body: Vec<String>,

    #[arg(short = 'A', long)]
    include_after_body: Vec<String>,

    #[arg(short = 'H', long)]
    include_in_header: Vec<String>,

    /// Stylesheet URL
    #[arg(short = 'c', long)]
    css: Vec<String>,

    #[arg(long)]
    title_prefix: Option<String>,

    #[arg(long)]
    reference_doc: Option<String>,

    #[arg(long)]
    epub_metadata: Option<String>,

    #[arg(long)]
    epub_cover_image: Option<String>,

    #[arg(long = "epub-embed-font")]
    epub_fonts: Vec<String>,

    #[arg(long)]
    csl: Option<String>,

    #[arg(long)]
    citation_abbreviations: Option<String>,

    #[arg(long)]
    bibliography: Vec<String>,

    /// KDE XML syntax definition
    #[arg(long = "syntax-definition")]
    syntax_definitions: Vec<String>,

    /// Highlight style name or .theme file
    #[arg(long)]
    highlight_style: Option<String>,

    #[arg(long)]
    no_highlight: bool,

    #[arg(long, visible_alias = "table-of-contents")]
    toc: bool,

    #[arg(long)]
    toc_depth: Option<u32>,

    #[arg(short = 'N', long)]
    number_sections: bool,

    #[arg(long)]
    columns: Option<usize>,

    #[arg(long, value_enum)]
    wrap: Option<WrapArg>,

    #[arg(long, value_enum)]
    top_level_division: Option<DivisionArg>,

    #[arg(long)]
    tab_stop: Option<usize>,

    #[arg(long)]
    dpi: Option<u32>,

    #[arg(long = "id-prefix")]
    identifier_prefix: Option<String>,

    #[arg(long)]
    section_divs: bool,

    #[arg(short = 'i', long)]
    incremental: bool,

    #[arg(long)]
    slide_level: Option<u32>,

    #[arg(long)]
    reference_links: bool,

    #[arg(long)]
    listings: bool,

    #[arg(long)]
    ascii: bool,
}

/// `--wrap` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum WrapArg {
    Auto,
    None,
    Preserve,
}

impl From<WrapArg> for WrapOption {
    fn from(arg: WrapArg) -> Self {
        match arg {
            WrapArg::Auto => WrapOption::Auto,
            WrapArg::None => WrapOption::None,
            WrapArg::Preserve => WrapOption::Preserve,
        }
    }
}

/// `--top-level-division` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum DivisionArg {
    Default,
    Part,
    Chapter,
    Section,
}

impl From<DivisionArg> for TopLevelDivision {
    fn from(arg: DivisionArg) -> Self {
        match arg {
            DivisionArg::Default => TopLevelDivision::Default,
            DivisionArg::Part => TopLevelDivision::Part,
            DivisionArg::Chapter => TopLevelDivision::Chapter,
            DivisionArg::Section => TopLevelDivision::Section,
        }
    }
}

/// Split `KEY=VALUE` or `KEY:VALUE`; a bare key is `true`.
fn parse_variable(arg: &str) -> (String, Value) {
    match arg.split_once(['=', ':']) {
        Some((key, value)) => (key.to_string(), Value::from(value)),
        None => (arg.to_string(), Value::Bool(true)),
    }
}

/// Repeating a key turns its value into a list.
fn collect_variables(args: &[String]) -> VariableContext {
    args.iter()
        .map(|arg| parse_variable(arg))
        .fold(VariableContext::new(), |ctx, (key, value)| {
            if ctx.get(&key).is_some() {
                ctx.with_appended(key, [value])
            } else {
                ctx.with_set(key, value)
            }
        })
}

impl Cli {
    fn into_options(self) -> Options {
        let defaults = Options::default();
        Options {
            input_files: self.inputs,
            output_file: self.output,
            to: self.to,
            pdf_engine: self.pdf_engine,
            pdf_engine_opts: self.pdf_engine_opts,
            template: self.template,
            standalone: self.standalone,
            sandbox: self.sandbox,
            data_dir: self.data_dir,
            dump_args: self.dump_args,
            variables: collect_variables(&self.variables),
            include_before_body: self.include_before_body,
            include_after_body: self.include_after_body,
            include_in_header: self.include_in_header,
            css: self.css,
            title_prefix: self.title_prefix,
            reference_doc: self.reference_doc,
            epub_metadata: self.epub_metadata,
            epub_cover_image: self.epub_cover_image,
            epub_fonts: self.epub_fonts,
            csl: self.csl,
            citation_abbreviations: self.citation_abbreviations,
            bibliography: self.bibliography,
            syntax_definitions: self.syntax_definitions,
            highlight_style: self.highlight_style,
            no_highlight: self.no_highlight,
            table_of_contents: self.toc,
            toc_depth: self.toc_depth.unwrap_or(defaults.toc_depth),
            number_sections: self.number_sections,
            columns: self.columns.unwrap_or(defaults.columns),
            wrap: self.wrap.map_or(defaults.wrap, WrapOption::from),
            top_level_division: self
                .top_level_division
                .map_or(defaults.top_level_division, TopLevelDivision::from),
            tab_stop: self.tab_stop.unwrap_or(defaults.tab_stop),
            dpi: self.dpi.unwrap_or(defaults.dpi),
            identifier_prefix: self.identifier_prefix.unwrap_or_default(),
            section_divs: self.section_divs,
            incremental: self.incremental,
            slide_level: self.slide_level,
            reference_links: self.reference_links,
            listings: self.listings,
            ascii: self.ascii,
            ..defaults
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pampa_output=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let defaults_file = cli.defaults.clone();
    let from_cli = cli.into_options();

    let options = match defaults_file {
        Some(path) => {
            debug!("reading defaults from {}", path.display());
            Options::from_defaults_file(&path)?.merge_cli(from_cli)
        }
        None => from_cli,
    };

    let registry = WriterRegistry::with_defaults();
    let resolution = resolve_output_settings(&options, &registry, &NoScriptingEngine, &NativeRuntime)
        .context("could not resolve output settings")?;

    match resolution {
        Resolution::DumpArgs(args) => {
            for line in args.lines() {
                println!("{line}");
            }
        }
        Resolution::Settings(settings) => {
            let summary = summary::summarize(&settings, &registry);
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variables_from_flags() {
        let ctx = collect_variables(&[
            "lang=en".to_string(),
            "draft".to_string(),
            "author:Ada".to_string(),
            "author:Grace".to_string(),
        ]);
        assert_eq!(ctx.get("lang"), Some(&Value::from("en")));
        assert_eq!(ctx.get("draft"), Some(&Value::Bool(true)));
        assert_eq!(
            ctx.get("author"),
            Some(&Value::List(vec![Value::from("Ada"), Value::from("Grace")]))
        );
    }

    #[test]
    fn test_cli_into_options() {
        let cli = Cli::parse_from([
            "pampa-resolve",
            "a.md",
            "b.md",
            "-o",
            "out.pdf",
            "--pdf-engine",
            "xelatex",
            "--wrap",
            "preserve",
            "--columns",
            "80",
            "--top-level-division",
            "chapter",
            "-c",
            "x.css",
        ]);
        let options = cli.into_options();
        assert_eq!(options.input_files, vec!["a.md", "b.md"]);
        assert_eq!(options.output_file.as_deref(), Some("out.pdf"));
        assert_eq!(options.pdf_engine.as_deref(), Some("xelatex"));
        assert_eq!(options.wrap, WrapOption::Preserve);
        assert_eq!(options.columns, 80);
        assert_eq!(options.top_level_division, TopLevelDivision::Chapter);
        assert_eq!(options.toc_depth, 3);
        assert_eq!(options.css, vec!["x.css"]);
    }

    #[test]
    fn test_bad_wrap_is_rejected() {
        assert!(Cli::try_parse_from(["pampa-resolve", "--wrap", "sometimes"]).is_err());
        assert!(Cli::try_parse_from(["pampa-resolve", "--top-level-division", "book"]).is_err());
    }

    #[test]
    fn test_enum_flags_accept_every_value() {
        for (arg, expected) in [
            ("auto", WrapOption::Auto),
            ("none", WrapOption::None),
            ("preserve", WrapOption::Preserve),
        ] {
            let cli = Cli::parse_from(["pampa-resolve", "--wrap", arg]);
            assert_eq!(cli.into_options().wrap, expected);
        }
        let names: Vec<_> = DivisionArg::value_variants()
            .iter()
            .filter_map(|v| v.to_possible_value())
            .map(|v| v.get_name().to_string())
            .collect();
        assert_eq!(names, ["default", "part", "chapter", "section"]);
    }
}
