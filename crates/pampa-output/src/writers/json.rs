/*
 * json.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Pandoc JSON AST writer.

use super::{Document, Writer, WriterError, WriterResult};

/// The pandoc API version stamped on documents that lack one.
pub const PANDOC_API_VERSION: [u32; 3] = [1, 23, 1];

/// Serialize a document as compact pandoc JSON.
///
/// The document must be a JSON object with a `blocks` array. A missing
/// `pandoc-api-version` is filled in.
pub fn write_json(document: &Document) -> WriterResult<String> {
    let Some(object) = document.as_object() else {
        return Err(WriterError::InvalidDocument(
            "expected a JSON object at the top level".to_string(),
        ));
    };
    if !object.get("blocks").is_some_and(|b| b.is_array()) {
        return Err(WriterError::InvalidDocument(
            "missing \"blocks\" array".to_string(),
        ));
    }

    if object.contains_key("pandoc-api-version") {
        return Ok(serde_json::to_string(document)?);
    }
    let mut object = object.clone();
    object.insert(
        "pandoc-api-version".to_string(),
        serde_json::to_value(PANDOC_API_VERSION)?,
    );
    object
        .entry("meta")
        .or_insert_with(|| serde_json::Value::Object(serde_json::Map::new()));
    Ok(serde_json::to_string(&object)?)
}

pub fn writer() -> Writer {
    Writer::text(|_, document, _| write_json(document))
}
