/*
 * template/bundle.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! A main template together with the partials it references.
//!
//! Built-in defaults are shipped as bundles so they compile without any
//! filesystem access. A bundle also round-trips through JSON:
//!
//! ```json
//! {
//!   "version": "1.0.0",
//!   "main": "<html>$styles.html()$$body$</html>",
//!   "partials": { "styles.html": "body { margin: 0 }" }
//! }
//! ```

use std::collections::HashMap;
use std::path::Path;

use pampa_doctemplate::{MemoryResolver, Template, TemplateError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Schema versions this crate understands.
const SUPPORTED_VERSIONS: &[&str] = &["1.0.0"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateBundle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    pub main: String,

    /// Partial sources keyed by file name, e.g. `styles.html`.
    #[serde(default)]
    pub partials: HashMap<String, String>,
}

#[derive(Debug, Error)]
pub enum BundleError {
    #[error("failed to parse bundle JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("failed to compile template: {0}")]
    TemplateCompile(#[from] TemplateError),

    #[error("unsupported bundle version: {0}")]
    UnsupportedVersion(String),
}

impl TemplateBundle {
    pub fn new(main: impl Into<String>) -> Self {
        Self {
            version: None,
            main: main.into(),
            partials: HashMap::new(),
        }
    }

    pub fn with_partial(mut self, name: impl Into<String>, content: impl Into<String>) -> Self {
        self.partials.insert(name.into(), content.into());
        self
    }

    pub fn from_json(json: &str) -> Result<Self, BundleError> {
        let bundle: TemplateBundle = serde_json::from_str(json)?;
        if let Some(version) = &bundle.version
            && !SUPPORTED_VERSIONS.contains(&version.as_str())
        {
            return Err(BundleError::UnsupportedVersion(version.clone()));
        }
        Ok(bundle)
    }

    pub fn to_json(&self) -> Result<String, BundleError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn to_resolver(&self) -> MemoryResolver {
        MemoryResolver::with_partials(self.partials.iter().map(|(k, v)| (k.as_str(), v.as_str())))
    }

    /// Compile the main template. `template_name` is used in error messages
    /// and gives partials without an extension their extension.
    pub fn compile(&self, template_name: &str) -> Result<Template, BundleError> {
        let resolver = self.to_resolver();
        Ok(Template::compile_with_resolver(
            &self.main,
            Path::new(template_name),
            &resolver,
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pampa_doctemplate::{TemplateContext, TemplateValue};

    #[test]
    fn test_compile_uses_bundled_partials() {
        let bundle = TemplateBundle::new("<h1>$header()$</h1>$body$")
            .with_partial("header.html", "$title$");
        let template = bundle.compile("default.html").unwrap();

        let mut ctx = TemplateContext::new();
        ctx.insert("title", TemplateValue::from("T"));
        ctx.insert("body", TemplateValue::from("b"));
        assert_eq!(template.render(&ctx).unwrap(), "<h1>T</h1>b");
    }

    #[test]
    fn test_from_json_checks_version() {
        let ok = TemplateBundle::from_json(r#"{"version": "1.0.0", "main": "$body$"}"#).unwrap();
        assert!(ok.partials.is_empty());

        let err = TemplateBundle::from_json(r#"{"version": "9.0.0", "main": ""}"#).unwrap_err();
        assert!(matches!(err, BundleError::UnsupportedVersion(v) if v == "9.0.0"));

        assert!(matches!(
            TemplateBundle::from_json("{").unwrap_err(),
            BundleError::JsonParse(_)
        ));
    }

    #[test]
    fn test_json_keeps_partials() {
        let bundle = TemplateBundle::new("$x()$").with_partial("x.txt", "X");
        let back = TemplateBundle::from_json(&bundle.to_json().unwrap()).unwrap();
        assert_eq!(back, bundle);
    }
}
