/*
 * native.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Pandoc "native" writer: the AST printed as constructor expressions.
//!
//! The input is the JSON AST, so argument shapes that JSON flattens
//! (attributes, targets, list attributes, raw formats) are recovered from
//! the constructor name.

use serde_json::Value;
use std::fmt::Write;

use super::{Document, Writer, WriterError, WriterResult};

#[derive(Clone, Copy)]
enum Shape {
    Any,
    /// `(id, [classes], [(key, value)])`
    Attr,
    /// A plain tuple, e.g. a link target.
    Tuple,
    /// `Format "html"`
    Format,
    /// A list of tuples.
    Pairs,
    /// A string-keyed map.
    Map,
}

fn constructor_args(name: &str) -> &'static [Shape] {
    use Shape::*;
    match name {
        "CodeBlock" | "Code" | "Div" | "Span" => &[Attr, Any],
        "RawBlock" | "RawInline" => &[Format, Any],
        "OrderedList" => &[Tuple, Any],
        "Header" => &[Any, Attr, Any],
        "Figure" => &[Attr, Any, Any],
        "Table" => &[Attr, Any, Any, Any, Any, Any],
        "Link" | "Image" => &[Attr, Any, Tuple],
        "Math" | "Quoted" | "Cite" => &[Any, Any],
        "DefinitionList" => &[Pairs],
        "MetaMap" => &[Map],
        _ => &[Any],
    }
}

fn write_string(s: &str, out: &mut String) {
    out.push('"');
    for ch in s.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) > 0x7f => {
                let _ = write!(out, "\\{}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
}

fn write_seq<'a>(
    items: impl IntoIterator<Item = &'a Value>,
    open: &str,
    close: &str,
    shape: Shape,
    out: &mut String,
) {
    let mut items = items.into_iter().peekable();
    if items.peek().is_none() {
        out.push_str(open);
        out.push_str(close);
        return;
    }
    out.push_str(open);
    out.push(' ');
    let mut first = true;
    for item in items {
        if !first {
            out.push_str(" , ");
        }
        first = false;
        write_shaped(item, shape, false, out);
    }
    out.push(' ');
    out.push_str(close);
}

fn write_map(map: &serde_json::Map<String, Value>, out: &mut String) {
    out.push_str("fromList [");
    let mut first = true;
    for (key, value) in map {
        out.push_str(if first { " ( " } else { " , ( " });
        first = false;
        write_string(key, out);
        out.push_str(" , ");
        write_value(value, false, out);
        out.push_str(" )");
    }
    out.push_str(if first { "]" } else { " ]" });
}

fn write_shaped(value: &Value, shape: Shape, nested: bool, out: &mut String) {
    match (shape, value) {
        (Shape::Attr, Value::Array(parts)) => {
            let [id, classes, attrs] = parts.as_slice() else {
                return write_value(value, true, out);
            };
            out.push_str("( ");
            write_value(id, true, out);
            out.push_str(" , ");
            write_value(classes, true, out);
            out.push_str(" , ");
            match attrs {
                Value::Array(pairs) => write_seq(pairs, "[", "]", Shape::Tuple, out),
                other => write_value(other, true, out),
            }
            out.push_str(" )");
        }
        (Shape::Tuple, Value::Array(parts)) => write_seq(parts, "(", ")", Shape::Any, out),
        (Shape::Pairs, Value::Array(items)) => write_seq(items, "[", "]", Shape::Tuple, out),
        (Shape::Format, Value::String(s)) => {
            out.push_str("(Format ");
            write_string(s, out);
            out.push(')');
        }
        (Shape::Map, Value::Object(map)) => {
            out.push('(');
            write_map(map, out);
            out.push(')');
        }
        _ => write_value(value, nested, out),
    }
}

/// Write one value. Constructor applications are parenthesized when
/// `nested`, i.e. when they appear as an argument of another constructor.
fn write_value(value: &Value, nested: bool, out: &mut String) {
    match value {
        Value::Null => out.push_str("()"),
        Value::Bool(b) => out.push_str(if *b { "True" } else { "False" }),
        Value::Number(n) => {
            let _ = write!(out, "{n}");
        }
        Value::String(s) => write_string(s, out),
        Value::Array(items) => write_seq(items, "[", "]", Shape::Any, out),
        Value::Object(map) => match map.get("t").and_then(Value::as_str) {
            Some(name) => {
                let Some(contents) = map.get("c") else {
                    out.push_str(name);
                    return;
                };
                if nested {
                    out.push('(');
                }
                out.push_str(name);
                let shapes = constructor_args(name);
                match (shapes, contents) {
                    ([shape], arg) => {
                        out.push(' ');
                        write_shaped(arg, *shape, true, out);
                    }
                    (shapes, Value::Array(args)) => {
                        for (i, arg) in args.iter().enumerate() {
                            out.push(' ');
                            write_shaped(
                                arg,
                                shapes.get(i).copied().unwrap_or(Shape::Any),
                                true,
                                out,
                            );
                        }
                    }
                    (_, arg) => {
                        out.push(' ');
                        write_value(arg, true, out);
                    }
                }
                if nested {
                    out.push(')');
                }
            }
            None => write_map(map, out),
        },
    }
}

/// Render a document in native syntax.
///
/// With `standalone`, the whole `Pandoc` value including metadata is
/// written; otherwise just the block list.
pub fn write_native(document: &Document, standalone: bool) -> WriterResult<String> {
    let blocks = document
        .get("blocks")
        .and_then(Value::as_array)
        .ok_or_else(|| WriterError::InvalidDocument("missing \"blocks\" array".to_string()))?;

    let mut out = String::new();
    if standalone {
        out.push_str("Pandoc Meta { unMeta = ");
        match document.get("meta").and_then(Value::as_object) {
            Some(meta) => write_map(meta, &mut out),
            None => out.push_str("fromList []"),
        }
        out.push_str(" } ");
    }
    write_seq(blocks, "[", "]", Shape::Any, &mut out);
    out.push('\n');
    Ok(out)
}

pub fn writer() -> Writer {
    Writer::text(|options, document, _| write_native(document, options.standalone))
}
