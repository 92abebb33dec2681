/*
 * highlight.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Highlight styles: the built-in set and JSON `.theme` files.

use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{OutputSettingsError, Result};
use crate::runtime::SystemRuntime;

/// Names accepted by `--highlight-style` without a theme file.
pub const BUILTIN_STYLES: &[&str] = &[
    "pygments",
    "tango",
    "espresso",
    "zenburn",
    "kate",
    "monochrome",
    "breezedark",
    "haddock",
];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TokenStyle {
    #[serde(default)]
    pub text_color: Option<String>,
    #[serde(default)]
    pub background_color: Option<String>,
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub italic: bool,
    #[serde(default)]
    pub underline: bool,
}

/// A highlighting theme in the KDE/pandoc JSON layout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct HighlightStyle {
    #[serde(default)]
    pub text_color: Option<String>,
    #[serde(default)]
    pub background_color: Option<String>,
    #[serde(default)]
    pub line_number_color: Option<String>,
    #[serde(default)]
    pub line_number_background_color: Option<String>,
    /// Token type (e.g. `Keyword`) to its style.
    #[serde(default)]
    pub text_styles: IndexMap<String, TokenStyle>,
}

// (token, color, bold, italic)
type TokenRow = (&'static str, Option<&'static str>, bool, bool);

struct Palette {
    text: Option<&'static str>,
    background: Option<&'static str>,
    line_number: Option<&'static str>,
    tokens: &'static [TokenRow],
}

const PYGMENTS: Palette = Palette {
    text: None,
    background: None,
    line_number: Some("#aaaaaa"),
    tokens: &[
        ("Keyword", Some("#007020"), true, false),
        ("DataType", Some("#902000"), false, false),
        ("DecVal", Some("#40a070"), false, false),
        ("String", Some("#4070a0"), false, false),
        ("Comment", Some("#60a0b0"), false, true),
        ("Function", Some("#06287e"), false, false),
        ("Error", Some("#ff0000"), true, false),
    ],
};

const TANGO: Palette = Palette {
    text: None,
    background: Some("#f8f8f8"),
    line_number: Some("#aaaaaa"),
    tokens: &[
        ("Keyword", Some("#204a87"), true, false),
        ("DataType", Some("#204a87"), false, false),
        ("DecVal", Some("#0000cf"), false, false),
        ("String", Some("#4e9a06"), false, false),
        ("Comment", Some("#8f5902"), false, true),
        ("Function", Some("#204a87"), true, false),
        ("Error", Some("#a40000"), true, false),
    ],
};

const ESPRESSO: Palette = Palette {
    text: Some("#bdae9d"),
    background: Some("#2a211c"),
    line_number: Some("#bdae9d"),
    tokens: &[
        ("Keyword", Some("#43a8ed"), true, false),
        ("DataType", Some("#d19a66"), false, false),
        ("DecVal", Some("#44aa43"), false, false),
        ("String", Some("#049b0a"), false, false),
        ("Comment", Some("#0066ff"), false, true),
        ("Function", Some("#ff9358"), true, false),
        ("Error", Some("#ffff00"), true, false),
    ],
};

const ZENBURN: Palette = Palette {
    text: Some("#cccccc"),
    background: Some("#303030"),
    line_number: None,
    tokens: &[
        ("Keyword", Some("#f0dfaf"), false, false),
        ("DataType", Some("#dfdfbf"), false, false),
        ("DecVal", Some("#dcdccc"), false, false),
        ("String", Some("#cc9393"), false, false),
        ("Comment", Some("#7f9f7f"), false, false),
        ("Function", Some("#efef8f"), false, false),
        ("Error", Some("#c3bf9f"), false, false),
    ],
};

const KATE: Palette = Palette {
    text: Some("#1f1c1b"),
    background: Some("#ffffff"),
    line_number: Some("#a0a0a0"),
    tokens: &[
        ("Keyword", Some("#1f1c1b"), true, false),
        ("DataType", Some("#0057ae"), false, false),
        ("DecVal", Some("#b08000"), false, false),
        ("String", Some("#bf0303"), false, false),
        ("Comment", Some("#898887"), false, false),
        ("Function", Some("#644a9b"), false, false),
        ("Error", Some("#bf0303"), false, false),
    ],
};

const MONOCHROME: Palette = Palette {
    text: Some("#000000"),
    background: Some("#ffffff"),
    line_number: None,
    tokens: &[
        ("Keyword", None, true, false),
        ("DataType", None, false, false),
        ("DecVal", None, false, false),
        ("String", None, false, false),
        ("Comment", None, false, true),
        ("Function", None, false, false),
        ("Error", None, true, false),
    ],
};

const BREEZEDARK: Palette = Palette {
    text: Some("#cfcfc2"),
    background: Some("#232629"),
    line_number: Some("#7a7c7d"),
    tokens: &[
        ("Keyword", Some("#cfcfc2"), true, false),
        ("DataType", Some("#2980b9"), false, false),
        ("DecVal", Some("#f67400"), false, false),
        ("String", Some("#f44f4f"), false, false),
        ("Comment", Some("#7a7c7d"), false, false),
        ("Function", Some("#8e44ad"), false, false),
        ("Error", Some("#da4453"), false, false),
    ],
};

const HADDOCK: Palette = Palette {
    text: None,
    background: None,
    line_number: None,
    tokens: &[
        ("Keyword", Some("#0000ff"), false, false),
        ("DataType", None, false, false),
        ("DecVal", None, false, false),
        ("String", Some("#008000"), false, false),
        ("Comment", Some("#008000"), false, false),
        ("Function", None, false, false),
        ("Error", Some("#ff0000"), false, false),
    ],
};

impl From<&Palette> for HighlightStyle {
    fn from(palette: &Palette) -> Self {
        HighlightStyle {
            text_color: palette.text.map(String::from),
            background_color: palette.background.map(String::from),
            line_number_color: palette.line_number.map(String::from),
            line_number_background_color: None,
            text_styles: palette
                .tokens
                .iter()
                .map(|&(token, color, bold, italic)| {
                    let style = TokenStyle {
                        text_color: color.map(String::from),
                        bold,
                        italic,
                        ..TokenStyle::default()
                    };
                    (token.to_string(), style)
                })
                .collect(),
        }
    }
}

/// A built-in style by name, ignoring case.
pub fn builtin_style(name: &str) -> Option<HighlightStyle> {
    let palette = match name.to_lowercase().as_str() {
        "pygments" => &PYGMENTS,
        "tango" => &TANGO,
        "espresso" => &ESPRESSO,
        "zenburn" => &ZENBURN,
        "kate" => &KATE,
        "monochrome" => &MONOCHROME,
        "breezedark" => &BREEZEDARK,
        "haddock" => &HADDOCK,
        _ => return None,
    };
    Some(palette.into())
}

impl HighlightStyle {
    pub fn from_theme_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

/// Resolve a `--highlight-style` value: a built-in name or a path to a
/// `.theme` file.
pub fn resolve_highlight_style(name: &str, runtime: &dyn SystemRuntime) -> Result<HighlightStyle> {
    if let Some(style) = builtin_style(name) {
        return Ok(style);
    }
    let path = Path::new(name);
    if path.extension().is_some_and(|ext| ext == "theme") {
        debug!("reading highlight theme {}", path.display());
        let json = runtime.file_read_string(path)?;
        return HighlightStyle::from_theme_json(&json)
            .map_err(|e| OutputSettingsError::UnknownHighlightStyle(format!("{name}: {e}")));
    }
    Err(OutputSettingsError::UnknownHighlightStyle(name.to_string()))
}
