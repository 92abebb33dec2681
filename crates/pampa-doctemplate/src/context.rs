/*
 * context.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Values a template is rendered against.
//!
//! Callers build a [`TemplateContext`] from their own variable store; the
//! output resolver converts its merged writer variables into one.

use std::collections::HashMap;

/// A template variable's value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum TemplateValue {
    String(String),
    Bool(bool),
    List(Vec<TemplateValue>),
    /// Fields reachable with dotted names such as `$author.name$`.
    Map(HashMap<String, TemplateValue>),
    /// Unset; renders as nothing.
    #[default]
    Null,
}

impl TemplateValue {
    /// Whether `$if(...)$` takes its branch.
    ///
    /// A string counts when it is non-empty, so `"false"` is set. A list
    /// counts when any element does; a map when it has any field.
    pub fn is_truthy(&self) -> bool {
        match self {
            TemplateValue::Null => false,
            TemplateValue::Bool(set) => *set,
            TemplateValue::String(text) => !text.is_empty(),
            TemplateValue::Map(fields) => !fields.is_empty(),
            TemplateValue::List(items) => items.iter().any(TemplateValue::is_truthy),
        }
    }

    /// Follow `fields` through nested maps. An empty path is the value itself.
    pub fn get_path(&self, fields: &[&str]) -> Option<&TemplateValue> {
        match (fields.split_first(), self) {
            (None, _) => Some(self),
            (Some((field, rest)), TemplateValue::Map(map)) => map.get(*field)?.get_path(rest),
            (Some(_), _) => None,
        }
    }

    /// Text substituted for `$var$`.
    ///
    /// `false` and null render empty, `true` and maps render as `true`,
    /// and lists render their elements back to back.
    pub fn render(&self) -> String {
        match self {
            TemplateValue::String(text) => text.clone(),
            TemplateValue::Bool(true) | TemplateValue::Map(_) => "true".to_string(),
            TemplateValue::Bool(false) | TemplateValue::Null => String::new(),
            TemplateValue::List(items) => items.iter().map(TemplateValue::render).collect(),
        }
    }
}

impl From<&str> for TemplateValue {
    fn from(text: &str) -> Self {
        TemplateValue::String(text.to_string())
    }
}

impl From<String> for TemplateValue {
    fn from(text: String) -> Self {
        TemplateValue::String(text)
    }
}

impl From<bool> for TemplateValue {
    fn from(set: bool) -> Self {
        TemplateValue::Bool(set)
    }
}

/// Top-level variables for one render.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemplateContext {
    variables: HashMap<String, TemplateValue>,
}

impl TemplateContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `key`, replacing any earlier value.
    pub fn insert(&mut self, key: impl Into<String>, value: TemplateValue) {
        self.variables.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&TemplateValue> {
        self.variables.get(key)
    }

    /// Look up a dotted name split into its parts.
    pub fn get_path(&self, path: &[&str]) -> Option<&TemplateValue> {
        let (key, fields) = path.split_first()?;
        self.get(key)?.get_path(fields)
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }
}

impl FromIterator<(String, TemplateValue)> for TemplateContext {
    fn from_iter<I: IntoIterator<Item = (String, TemplateValue)>>(iter: I) -> Self {
        Self {
            variables: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn author(name: &str) -> TemplateValue {
        TemplateValue::Map(HashMap::from([("name".to_string(), TemplateValue::from(name))]))
    }

    #[test]
    fn test_conditions_follow_template_truthiness() {
        assert!(TemplateValue::from("false").is_truthy());
        assert!(!TemplateValue::from("").is_truthy());
        assert!(!TemplateValue::Bool(false).is_truthy());
        assert!(!TemplateValue::Null.is_truthy());

        // `-V toc=false` style lists: only set when some element is.
        assert!(!TemplateValue::List(vec![TemplateValue::Bool(false)]).is_truthy());
        assert!(TemplateValue::List(vec![TemplateValue::Null, TemplateValue::from("x")]).is_truthy());

        assert!(author("Ada").is_truthy());
        assert!(!TemplateValue::Map(HashMap::new()).is_truthy());
    }

    #[test]
    fn test_dotted_lookup_into_metadata() {
        let ctx: TemplateContext = [
            ("author".to_string(), author("Ada")),
            ("title".to_string(), TemplateValue::from("Notes")),
        ]
        .into_iter()
        .collect();

        assert_eq!(ctx.len(), 2);
        assert_eq!(ctx.get_path(&["author", "name"]), Some(&TemplateValue::from("Ada")));
        assert_eq!(ctx.get_path(&["title", "name"]), None);
        assert_eq!(ctx.get_path(&["date"]), None);
        assert_eq!(ctx.get_path(&[]), None);
    }

    #[test]
    fn test_insert_replaces() {
        let mut ctx = TemplateContext::new();
        assert!(ctx.is_empty());
        ctx.insert("lang", TemplateValue::from("en"));
        ctx.insert("lang", TemplateValue::from("de"));
        assert_eq!(ctx.get("lang"), Some(&TemplateValue::from("de")));
    }

    #[test]
    fn test_render_of_each_shape() {
        let css = TemplateValue::List(vec![
            TemplateValue::from("a.css"),
            TemplateValue::Bool(false),
            TemplateValue::from("b.css"),
        ]);
        assert_eq!(css.render(), "a.cssb.css");
        assert_eq!(TemplateValue::Bool(true).render(), "true");
        assert_eq!(author("Ada").render(), "true");
        assert_eq!(TemplateValue::Null.render(), "");
    }
}
