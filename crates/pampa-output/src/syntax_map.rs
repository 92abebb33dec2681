/*
 * syntax_map.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Syntax definitions for code highlighting.
//!
//! Definitions use the KDE syntax-highlighting XML format:
//!
//! ```xml
//! <language name="Foo" section="Sources" extensions="*.foo;*.fo">
//!   <highlighting>
//!     <list name="keywords"><item>let</item></list>
//!     <contexts>
//!       <context name="Normal" attribute="Normal Text" lineEndContext="#stay"/>
//!     </contexts>
//!   </highlighting>
//! </language>
//! ```
//!
//! Only the parts used to pick and describe a language are kept; the
//! highlighting rules themselves belong to the highlighter.

use std::path::Path;
use std::sync::LazyLock;

use indexmap::IndexMap;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::error::{OutputSettingsError, Result};
use crate::runtime::SystemRuntime;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("{message} (at byte {position})")]
pub struct SyntaxParseError {
    pub message: String,
    pub position: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyntaxContext {
    pub name: String,
    pub attribute: Option<String>,
    pub line_end_context: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyntaxDefinition {
    pub name: String,
    pub section: Option<String>,
    /// File name globs such as `*.rs`.
    pub extensions: Vec<String>,
    pub mime_types: Vec<String>,
    pub case_sensitive: bool,
    pub keyword_lists: IndexMap<String, Vec<String>>,
    pub contexts: Vec<SyntaxContext>,
}

type Attributes = IndexMap<String, String>;

fn read_attributes(e: &BytesStart<'_>) -> std::result::Result<Attributes, String> {
    let mut out = Attributes::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|err| err.to_string())?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|err| format!("invalid attribute value: {err}"))?;
        out.insert(key, value.into_owned());
    }
    Ok(out)
}

fn split_list(value: Option<&String>) -> Vec<String> {
    value
        .map(|v| {
            v.split(';')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}

/// Accumulates a definition while the XML is walked.
#[derive(Default)]
struct Builder {
    definition: Option<SyntaxDefinition>,
    list: Option<(String, Vec<String>)>,
    in_item: bool,
}

impl Builder {
    fn open(&mut self, name: &[u8], attrs: Attributes, empty: bool) -> std::result::Result<(), String> {
        match name {
            b"language" => {
                let name = attrs
                    .get("name")
                    .filter(|n| !n.trim().is_empty())
                    .ok_or("<language> has no name attribute")?;
                self.definition = Some(SyntaxDefinition {
                    name: name.clone(),
                    section: attrs.get("section").cloned(),
                    extensions: split_list(attrs.get("extensions")),
                    mime_types: split_list(attrs.get("mimetype")),
                    case_sensitive: attrs
                        .get("casesensitive")
                        .is_none_or(|v| v != "0" && v != "false"),
                    keyword_lists: IndexMap::new(),
                    contexts: Vec::new(),
                });
            }
            b"list" => {
                let list_name = attrs.get("name").cloned().unwrap_or_default();
                if empty {
                    self.language()?.keyword_lists.insert(list_name, Vec::new());
                } else {
                    self.list = Some((list_name, Vec::new()));
                }
            }
            b"item" => self.in_item = !empty,
            b"context" => {
                let context = SyntaxContext {
                    name: attrs.get("name").cloned().unwrap_or_default(),
                    attribute: attrs.get("attribute").cloned(),
                    line_end_context: attrs.get("lineEndContext").cloned(),
                };
                self.language()?.contexts.push(context);
            }
            _ => {}
        }
        Ok(())
    }

    fn close(&mut self, name: &[u8]) -> std::result::Result<(), String> {
        match name {
            b"item" => self.in_item = false,
            b"list" => {
                if let Some((list_name, items)) = self.list.take() {
                    self.language()?.keyword_lists.insert(list_name, items);
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn text(&mut self, text: &str) {
        if self.in_item
            && let Some((_, items)) = &mut self.list
        {
            let word = text.trim();
            if !word.is_empty() {
                items.push(word.to_string());
            }
        }
    }

    fn language(&mut self) -> std::result::Result<&mut SyntaxDefinition, String> {
        self.definition
            .as_mut()
            .ok_or_else(|| "element outside <language>".to_string())
    }
}

impl SyntaxDefinition {
    /// Parse a KDE XML syntax definition.
    pub fn parse(source: &str) -> std::result::Result<Self, SyntaxParseError> {
        let mut reader = Reader::from_str(source);
        reader.config_mut().trim_text_start = true;
        reader.config_mut().trim_text_end = true;

        let mut builder = Builder::default();
        let mut depth = 0usize;
        loop {
            let position = reader.buffer_position();
            let fail = |message: String| SyntaxParseError { message, position };
            match reader.read_event() {
                Ok(Event::Start(e)) => {
                    depth += 1;
                    let attrs = read_attributes(&e).map_err(fail)?;
                    builder.open(e.name().as_ref(), attrs, false).map_err(fail)?;
                }
                Ok(Event::Empty(e)) => {
                    let attrs = read_attributes(&e).map_err(fail)?;
                    builder.open(e.name().as_ref(), attrs, true).map_err(fail)?;
                }
                Ok(Event::End(e)) => {
                    depth = depth.saturating_sub(1);
                    builder.close(e.name().as_ref()).map_err(fail)?;
                }
                Ok(Event::Text(e)) => {
                    let text = e.unescape().map_err(|err| fail(err.to_string()))?;
                    builder.text(&text);
                }
                Ok(Event::CData(e)) => {
                    builder.text(&String::from_utf8_lossy(&e.into_inner()));
                }
                Ok(Event::Comment(_) | Event::PI(_) | Event::Decl(_) | Event::DocType(_)) => {}
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(SyntaxParseError {
                        message: e.to_string(),
                        position: reader.error_position(),
                    });
                }
            }
        }

        let position = reader.buffer_position();
        if depth != 0 {
            return Err(SyntaxParseError {
                message: "unexpected end of document".to_string(),
                position,
            });
        }
        builder.definition.ok_or(SyntaxParseError {
            message: "no <language> element".to_string(),
            position,
        })
    }

    /// Whether a file name matches one of the definition's globs.
    pub fn matches_file_name(&self, file_name: &str) -> bool {
        self.extensions.iter().any(|glob| match glob.strip_prefix('*') {
            Some(suffix) => file_name.ends_with(suffix),
            None => file_name == glob,
        })
    }

    pub fn keywords(&self, list: &str) -> Option<&[String]> {
        self.keyword_lists.get(list).map(Vec::as_slice)
    }
}

/// Language name (lowercased) to definition, in load order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SyntaxMap(IndexMap<String, SyntaxDefinition>);

const BUILTIN_DEFINITIONS: &[(&str, &str)] = &[
    ("bash.xml", include_str!("../resources/syntax/bash.xml")),
    ("json.xml", include_str!("../resources/syntax/json.xml")),
    ("python.xml", include_str!("../resources/syntax/python.xml")),
    ("rust.xml", include_str!("../resources/syntax/rust.xml")),
];

static DEFAULT_SYNTAX_MAP: LazyLock<SyntaxMap> = LazyLock::new(|| {
    BUILTIN_DEFINITIONS
        .iter()
        .filter_map(|(file, source)| match SyntaxDefinition::parse(source) {
            Ok(definition) => Some(definition),
            Err(e) => {
                warn!("built-in syntax definition {} is invalid: {}", file, e);
                None
            }
        })
        .fold(SyntaxMap::default(), SyntaxMap::with_definition)
});

/// The syntax map shipped with the crate.
pub fn default_syntax_map() -> &'static SyntaxMap {
    &DEFAULT_SYNTAX_MAP
}

impl SyntaxMap {
    /// A new map with `definition` added. A definition already present
    /// under the same name is replaced in place.
    #[must_use]
    pub fn with_definition(mut self, definition: SyntaxDefinition) -> Self {
        self.0.insert(definition.name.to_lowercase(), definition);
        self
    }

    /// Look up a language, ignoring case.
    pub fn get(&self, language: &str) -> Option<&SyntaxDefinition> {
        self.0.get(&language.to_lowercase())
    }

    /// The first language whose extension globs match `file_name`.
    pub fn for_file_name(&self, file_name: &str) -> Option<&SyntaxDefinition> {
        self.0.values().find(|d| d.matches_file_name(file_name))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Extend the default map with the definitions in `paths`, in order.
///
/// Read failures propagate as runtime errors; parse failures become
/// [`OutputSettingsError::SyntaxMap`].
pub fn load_syntax_map<P: AsRef<Path>>(
    paths: &[P],
    runtime: &dyn SystemRuntime,
) -> Result<SyntaxMap> {
    paths
        .iter()
        .try_fold(default_syntax_map().clone(), |map, path| {
            let path = path.as_ref();
            let source = runtime.file_read_string(path)?;
            let definition = SyntaxDefinition::parse(&source).map_err(|e| {
                OutputSettingsError::SyntaxMap(format!("{}: {}", path.display(), e))
            })?;
            debug!(
                "loaded syntax definition {} from {}",
                definition.name,
                path.display()
            );
            Ok(map.with_definition(definition))
        })
}
