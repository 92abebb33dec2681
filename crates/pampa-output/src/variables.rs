/*
 * variables.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Template variable context and the ordered steps that enrich it.
//!
//! Values set through [`VariableContext::append`] accumulate: a scalar
//! already present becomes the first element of a list, a list is extended,
//! and a new key starts a list. [`VariableContext::set`] replaces.

use std::collections::HashMap;
use std::path::Path;

use indexmap::IndexMap;
use pampa_doctemplate::{TemplateContext, TemplateValue};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::options::Options;
use crate::runtime::SystemRuntime;
use crate::version::pandoc_version;

/// A template variable value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "serde_json::Value", into = "serde_json::Value")]
pub enum Value {
    String(String),
    Bool(bool),
    List(Vec<Value>),
    Map(IndexMap<String, Value>),
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::String(String::new()),
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::String(n.to_string()),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => {
                Value::Map(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl From<Value> for serde_json::Value {
    fn from(value: Value) -> Self {
        match value {
            Value::String(s) => serde_json::Value::String(s),
            Value::Bool(b) => serde_json::Value::Bool(b),
            Value::List(items) => {
                serde_json::Value::Array(items.into_iter().map(Into::into).collect())
            }
            Value::Map(map) => {
                serde_json::Value::Object(map.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
        }
    }
}

impl From<&Value> for TemplateValue {
    fn from(value: &Value) -> Self {
        match value {
            Value::String(s) => TemplateValue::String(s.clone()),
            Value::Bool(b) => TemplateValue::Bool(*b),
            Value::List(items) => TemplateValue::List(items.iter().map(Into::into).collect()),
            Value::Map(map) => TemplateValue::Map(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.into()))
                    .collect::<HashMap<_, _>>(),
            ),
        }
    }
}

/// Ordered mapping from variable name to value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VariableContext(IndexMap<String, Value>);

impl VariableContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Replace the value under `key`.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    /// Append `values` under `key` with list-append semantics.
    ///
    /// Appending nothing leaves the context untouched.
    pub fn append(&mut self, key: impl Into<String>, values: impl IntoIterator<Item = Value>) {
        let mut values = values.into_iter().peekable();
        if values.peek().is_none() {
            return;
        }
        let key = key.into();
        match self.0.get_mut(key.as_str()) {
            Some(Value::List(items)) => items.extend(values),
            Some(slot) => {
                let scalar = std::mem::replace(slot, Value::List(Vec::new()));
                let mut items = vec![scalar];
                items.extend(values);
                *slot = Value::List(items);
            }
            None => {
                self.0.insert(key, Value::List(values.collect()));
            }
        }
    }

    /// Builder form of [`VariableContext::set`].
    pub fn with_set(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    /// Builder form of [`VariableContext::append`].
    pub fn with_appended(
        mut self,
        key: impl Into<String>,
        values: impl IntoIterator<Item = Value>,
    ) -> Self {
        self.append(key, values);
        self
    }

    /// Convert to the template engine's context type.
    pub fn to_template_context(&self) -> TemplateContext {
        self.0
            .iter()
            .map(|(k, v)| (k.clone(), TemplateValue::from(v)))
            .collect()
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.0
                .iter()
                .map(|(k, v)| (k.clone(), v.clone().into()))
                .collect(),
        )
    }
}

impl FromIterator<(String, Value)> for VariableContext {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for VariableContext {
    type Item = (String, Value);
    type IntoIter = indexmap::map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Marker opening the core script block of the dzslides template.
pub const DZSLIDES_CORE_MARKER: &str = "<!-- {{{{ dzslides core";

/// The dzslides template from the marker line to the end, lines preserved.
///
/// Empty when the marker is absent.
pub fn dzslides_core(template: &str) -> String {
    template
        .lines()
        .skip_while(|line| !line.starts_with(DZSLIDES_CORE_MARKER))
        .flat_map(|line| [line, "\n"])
        .collect()
}

/// Everything the enrichment steps draw on.
pub struct VariableInputs<'a> {
    pub options: &'a Options,
    /// Base name of the resolved output format.
    pub format: &'a str,
    pub runtime: &'a dyn SystemRuntime,
    /// Source of the built-in dzslides template.
    pub dzslides_template: &'a str,
}

type Step<'a> = Box<dyn Fn(VariableContext) -> Result<VariableContext> + 'a>;

fn step<'a>(f: impl Fn(VariableContext) -> Result<VariableContext> + 'a) -> Step<'a> {
    Box::new(f)
}

fn read_all(runtime: &dyn SystemRuntime, paths: &[String]) -> Result<Vec<Value>> {
    paths
        .iter()
        .map(|p| -> Result<Value> { Ok(Value::String(runtime.file_read_string(Path::new(p))?)) })
        .collect()
}

fn strings(items: &[String]) -> impl Iterator<Item = Value> + '_ {
    items.iter().map(|s| Value::from(s.as_str()))
}

/// The enrichment steps, in the order they must run.
fn steps<'a>(inputs: &'a VariableInputs<'a>) -> Vec<(&'static str, Step<'a>)> {
    let VariableInputs {
        options,
        format,
        runtime,
        dzslides_template,
    } = *inputs;

    vec![
        (
            "sourcefile",
            step(move |ctx| {
                Ok(if options.input_files.is_empty() {
                    ctx.with_appended("sourcefile", [Value::from("-")])
                } else {
                    ctx.with_appended("sourcefile", strings(&options.input_files))
                })
            }),
        ),
        (
            "outputfile",
            step(move |ctx| Ok(ctx.with_set("outputfile", options.output_path()))),
        ),
        (
            "pandoc-version",
            step(|ctx| Ok(ctx.with_set("pandoc-version", pandoc_version()))),
        ),
        (
            "includes",
            step(move |ctx| {
                let includes = [
                    ("include-before", &options.include_before_body),
                    ("include-after", &options.include_after_body),
                    ("header-includes", &options.include_in_header),
                ];
                includes.into_iter().try_fold(ctx, |ctx, (key, paths)| -> Result<_> {
                    Ok(ctx.with_appended(key, read_all(runtime, paths)?))
                })
            }),
        ),
        (
            "css",
            step(move |ctx| Ok(ctx.with_appended("css", strings(&options.css)))),
        ),
        (
            "title-prefix",
            step(move |ctx| {
                Ok(match &options.title_prefix {
                    Some(prefix) => ctx.with_set("title-prefix", prefix.as_str()),
                    None => ctx,
                })
            }),
        ),
        (
            "epub-cover-image",
            step(move |ctx| {
                Ok(match &options.epub_cover_image {
                    Some(image) => ctx.with_set("epub-cover-image", image.as_str()),
                    None => ctx,
                })
            }),
        ),
        (
            "curdir",
            step(move |ctx| {
                let cwd = runtime.cwd()?;
                Ok(ctx.with_set("curdir", cwd.to_string_lossy().into_owned()))
            }),
        ),
        (
            "dzslides-core",
            step(move |ctx| {
                Ok(if format == "dzslides" {
                    ctx.with_set("dzslides-core", dzslides_core(dzslides_template))
                } else {
                    ctx
                })
            }),
        ),
    ]
}

/// Build the final variable context from the user's variables.
pub fn build_variables(inputs: &VariableInputs<'_>) -> Result<VariableContext> {
    steps(inputs)
        .into_iter()
        .try_fold(inputs.options.variables.clone(), |ctx, (name, step)| {
            debug!(step = name, "applying variable step");
            step(ctx)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::NativeRuntime;
    use pretty_assertions::assert_eq;

    fn list(items: &[&str]) -> Value {
        Value::List(items.iter().map(|s| Value::from(*s)).collect())
    }

    #[test]
    fn test_append_to_new_key_creates_list() {
        let mut ctx = VariableContext::new();
        ctx.append("css", [Value::from("a.css")]);
        assert_eq!(ctx.get("css"), Some(&list(&["a.css"])));
    }

    #[test]
    fn test_append_to_scalar_puts_scalar_first() {
        let mut ctx = VariableContext::new();
        ctx.set("author", "Ann");
        ctx.append("author", [Value::from("Bo"), Value::from("Cy")]);
        assert_eq!(ctx.get("author"), Some(&list(&["Ann", "Bo", "Cy"])));
    }

    #[test]
    fn test_append_twice_keeps_duplicates_in_order() {
        let files = ["a.md", "b.md"];
        let ctx = VariableContext::new()
            .with_appended("sourcefile", files.map(Value::from))
            .with_appended("sourcefile", files.map(Value::from));
        assert_eq!(
            ctx.get("sourcefile"),
            Some(&list(&["a.md", "b.md", "a.md", "b.md"]))
        );
    }

    #[test]
    fn test_append_nothing_is_noop() {
        let ctx = VariableContext::new().with_appended("css", Vec::new());
        assert!(ctx.get("css").is_none());
        let ctx = ctx.with_set("x", "1").with_appended("x", Vec::new());
        assert_eq!(ctx.get("x"), Some(&Value::from("1")));
    }

    #[test]
    fn test_append_preserves_key_position() {
        let ctx = VariableContext::new()
            .with_set("a", "1")
            .with_set("b", "2")
            .with_appended("a", [Value::from("3")]);
        let keys: Vec<_> = ctx.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["a", "b"]);
    }

    #[test]
    fn test_dzslides_core_extracts_from_marker() {
        let template = "<html>\n<!-- {{{{ dzslides core\nscript\n-->\n</html>";
        assert_eq!(
            dzslides_core(template),
            "<!-- {{{{ dzslides core\nscript\n-->\n</html>\n"
        );
        assert_eq!(dzslides_core("<html>no marker</html>"), "");
    }

    #[test]
    fn test_value_json_conversion() {
        let json = serde_json::json!({"n": 3, "flag": false, "xs": ["a", null]});
        let value = Value::from(json);
        let Value::Map(map) = &value else {
            panic!("expected map");
        };
        assert_eq!(map["n"], Value::from("3"));
        assert_eq!(map["flag"], Value::Bool(false));
        assert_eq!(map["xs"], list(&["a", ""]));
    }

    #[test]
    fn test_build_variables_runs_steps_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let header = dir.path().join("header.html");
        std::fs::write(&header, "<meta name=x>").unwrap();

        let options = Options {
            input_files: vec!["in.md".into()],
            output_file: Some("out.html".into()),
            include_in_header: vec![header.to_string_lossy().into_owned()],
            css: vec!["site.css".into()],
            title_prefix: Some("Docs".into()),
            variables: [("css".to_string(), Value::from("user.css"))]
                .into_iter()
                .collect(),
            ..Options::default()
        };
        let inputs = VariableInputs {
            options: &options,
            format: "html",
            runtime: &NativeRuntime,
            dzslides_template: "",
        };
        let ctx = build_variables(&inputs).unwrap();

        assert_eq!(ctx.get("sourcefile"), Some(&list(&["in.md"])));
        assert_eq!(ctx.get("outputfile"), Some(&Value::from("out.html")));
        assert_eq!(ctx.get("header-includes"), Some(&list(&["<meta name=x>"])));
        assert_eq!(ctx.get("css"), Some(&list(&["user.css", "site.css"])));
        assert_eq!(ctx.get("title-prefix"), Some(&Value::from("Docs")));
        assert!(ctx.get("pandoc-version").is_some());
        assert!(ctx.get("curdir").is_some());
        assert!(ctx.get("include-before").is_none());
        assert!(ctx.get("dzslides-core").is_none());
    }

    #[test]
    fn test_build_variables_defaults_sourcefile_to_stdin() {
        let options = Options::default();
        let inputs = VariableInputs {
            options: &options,
            format: "dzslides",
            runtime: &NativeRuntime,
            dzslides_template: "<!-- {{{{ dzslides core\nx\n",
        };
        let ctx = build_variables(&inputs).unwrap();
        assert_eq!(ctx.get("sourcefile"), Some(&list(&["-"])));
        assert_eq!(ctx.get("outputfile"), Some(&Value::from("-")));
        assert_eq!(
            ctx.get("dzslides-core"),
            Some(&Value::from("<!-- {{{{ dzslides core\nx\n"))
        );
    }

    #[test]
    fn test_missing_include_file_fails() {
        let options = Options {
            include_before_body: vec!["/no/such/include.html".into()],
            ..Options::default()
        };
        let inputs = VariableInputs {
            options: &options,
            format: "html",
            runtime: &NativeRuntime,
            dzslides_template: "",
        };
        assert!(build_variables(&inputs).is_err());
    }
}
