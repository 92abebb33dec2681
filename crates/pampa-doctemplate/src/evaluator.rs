/*
 * evaluator.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Template evaluation.
//!
//! Loop and partial bindings live in a [`Scope`] stacked over the caller's
//! [`TemplateContext`], so evaluation never copies the context itself.

use crate::ast::{Conditional, ForLoop, Partial, Pipe, PipeArg, TemplateNode, VariableRef};
use crate::context::{TemplateContext, TemplateValue};
use crate::error::{TemplateError, TemplateResult};
use crate::parser::Template;
use std::collections::HashMap;

impl Template {
    /// Render this template with the given context.
    pub fn render(&self, context: &TemplateContext) -> TemplateResult<String> {
        let mut scope = Scope {
            context,
            bindings: Vec::new(),
        };
        let mut out = String::new();
        evaluate(&self.nodes, &mut scope, &mut out)?;
        Ok(out)
    }
}

struct Scope<'a> {
    context: &'a TemplateContext,
    /// Innermost binding last. `it` always names the innermost value.
    bindings: Vec<(Vec<String>, TemplateValue)>,
}

impl Scope<'_> {
    fn lookup(&self, path: &[String]) -> Option<&TemplateValue> {
        let (first, rest) = path.split_first()?;
        let rest: Vec<&str> = rest.iter().map(String::as_str).collect();

        if first == "it" {
            if let Some((_, value)) = self.bindings.last() {
                return value.get_path(&rest);
            }
        }
        for (bound, value) in self.bindings.iter().rev() {
            if path.starts_with(bound) {
                let tail: Vec<&str> = path[bound.len()..].iter().map(String::as_str).collect();
                return value.get_path(&tail);
            }
        }
        let full: Vec<&str> = path.iter().map(String::as_str).collect();
        self.context.get_path(&full)
    }

    fn with_binding<T>(
        &mut self,
        path: Vec<String>,
        value: TemplateValue,
        f: impl FnOnce(&mut Self) -> T,
    ) -> T {
        self.bindings.push((path, value));
        let result = f(self);
        self.bindings.pop();
        result
    }
}

fn evaluate(nodes: &[TemplateNode], scope: &mut Scope<'_>, out: &mut String) -> TemplateResult<()> {
    for node in nodes {
        match node {
            TemplateNode::Literal(text) => out.push_str(text),
            TemplateNode::Variable(var) => out.push_str(&render_variable(var, scope)?),
            TemplateNode::Conditional(conditional) => evaluate_conditional(conditional, scope, out)?,
            TemplateNode::ForLoop(for_loop) => evaluate_for_loop(for_loop, scope, out)?,
            TemplateNode::Partial(partial) => evaluate_partial(partial, scope, out)?,
        }
    }
    Ok(())
}

fn render_variable(var: &VariableRef, scope: &Scope<'_>) -> TemplateResult<String> {
    let Some(value) = scope.lookup(&var.path) else {
        return Ok(String::new());
    };
    let value = apply_pipes(value.clone(), &var.pipes)?;
    Ok(match (&var.separator, &value) {
        (Some(sep), TemplateValue::List(items)) => items
            .iter()
            .map(TemplateValue::render)
            .collect::<Vec<_>>()
            .join(sep),
        _ => value.render(),
    })
}

fn evaluate_conditional(
    conditional: &Conditional,
    scope: &mut Scope<'_>,
    out: &mut String,
) -> TemplateResult<()> {
    for (condition, body) in &conditional.branches {
        if scope.lookup(&condition.path).is_some_and(TemplateValue::is_truthy) {
            return evaluate(body, scope, out);
        }
    }
    if let Some(body) = &conditional.else_branch {
        evaluate(body, scope, out)?;
    }
    Ok(())
}

/// Values a loop or applied partial iterates over.
fn iteration_items(value: Option<&TemplateValue>) -> Vec<TemplateValue> {
    match value {
        Some(TemplateValue::List(items)) => items.clone(),
        Some(value) if value.is_truthy() => vec![value.clone()],
        _ => Vec::new(),
    }
}

fn evaluate_for_loop(
    for_loop: &ForLoop,
    scope: &mut Scope<'_>,
    out: &mut String,
) -> TemplateResult<()> {
    let items = iteration_items(scope.lookup(&for_loop.var.path));
    for (i, item) in items.into_iter().enumerate() {
        if i > 0 {
            if let Some(sep) = &for_loop.separator {
                evaluate(sep, scope, out)?;
            }
        }
        scope.with_binding(for_loop.var.path.clone(), item, |scope| {
            evaluate(&for_loop.body, scope, out)
        })?;
    }
    Ok(())
}

fn evaluate_partial(
    partial: &Partial,
    scope: &mut Scope<'_>,
    out: &mut String,
) -> TemplateResult<()> {
    let nodes = partial
        .resolved
        .as_ref()
        .ok_or_else(|| TemplateError::PartialNotFound {
            name: partial.name.clone(),
        })?;

    let rendered = match &partial.var {
        None => {
            let mut buf = String::new();
            evaluate(nodes, scope, &mut buf)?;
            buf
        }
        Some(var) => {
            let items = iteration_items(scope.lookup(&var.path));
            let mut parts = Vec::with_capacity(items.len());
            for item in items {
                let mut buf = String::new();
                scope.with_binding(vec!["it".to_string()], item, |scope| {
                    evaluate(nodes, scope, &mut buf)
                })?;
                parts.push(buf);
            }
            parts.join(partial.separator.as_deref().unwrap_or(""))
        }
    };

    let piped = apply_pipes(TemplateValue::String(rendered), &partial.pipes)?;
    out.push_str(&piped.render());
    Ok(())
}

fn apply_pipes(value: TemplateValue, pipes: &[Pipe]) -> TemplateResult<TemplateValue> {
    pipes.iter().try_fold(value, apply_pipe)
}

fn map_strings(value: TemplateValue, f: &impl Fn(&str) -> String) -> TemplateValue {
    match value {
        TemplateValue::String(s) => TemplateValue::String(f(&s)),
        TemplateValue::List(items) => {
            TemplateValue::List(items.into_iter().map(|v| map_strings(v, f)).collect())
        }
        TemplateValue::Map(m) => {
            TemplateValue::Map(m.into_iter().map(|(k, v)| (k, map_strings(v, f))).collect())
        }
        other => other,
    }
}

fn apply_pipe(value: TemplateValue, pipe: &Pipe) -> TemplateResult<TemplateValue> {
    let result = match pipe.name.as_str() {
        "uppercase" => map_strings(value, &|s| s.to_uppercase()),
        "lowercase" => map_strings(value, &|s| s.to_lowercase()),
        "chomp" => map_strings(value, &|s| s.trim_end_matches('\n').to_string()),
        "nowrap" => value,
        "length" => {
            let n = match &value {
                TemplateValue::String(s) => s.chars().count(),
                TemplateValue::List(items) => items.len(),
                TemplateValue::Map(m) => m.len(),
                TemplateValue::Bool(_) => 1,
                TemplateValue::Null => 0,
            };
            TemplateValue::String(n.to_string())
        }
        "reverse" => match value {
            TemplateValue::List(mut items) => {
                items.reverse();
                TemplateValue::List(items)
            }
            TemplateValue::String(s) => TemplateValue::String(s.chars().rev().collect()),
            other => other,
        },
        "first" => match value {
            TemplateValue::List(items) => items.into_iter().next().unwrap_or_default(),
            other => other,
        },
        "last" => match value {
            TemplateValue::List(items) => items.into_iter().last().unwrap_or_default(),
            other => other,
        },
        "rest" => match value {
            TemplateValue::List(items) => TemplateValue::List(items.into_iter().skip(1).collect()),
            _ => TemplateValue::List(Vec::new()),
        },
        "allbutlast" => match value {
            TemplateValue::List(mut items) => {
                items.pop();
                TemplateValue::List(items)
            }
            _ => TemplateValue::List(Vec::new()),
        },
        "pairs" => pairs(value),
        "alpha" => map_strings(value, &|s| match s.trim().parse::<u32>() {
            Ok(n @ 1..=26) => char::from(b'a' + (n - 1) as u8).to_string(),
            _ => s.to_string(),
        }),
        "roman" => map_strings(value, &|s| match s.trim().parse::<u32>() {
            Ok(n @ 1..=3999) => to_roman(n),
            _ => s.to_string(),
        }),
        "left" | "right" | "center" => {
            let width = match pipe.args.first() {
                Some(PipeArg::Integer(n)) => usize::try_from(*n).unwrap_or(0),
                _ => 0,
            };
            let border = |i: usize| match pipe.args.get(i) {
                Some(PipeArg::String(s)) => s.clone(),
                _ => String::new(),
            };
            let (left_border, right_border) = (border(1), border(2));
            let text = value.render();
            let pad = width.saturating_sub(text.chars().count());
            let (before, after) = match pipe.name.as_str() {
                "left" => (0, pad),
                "right" => (pad, 0),
                _ => (pad / 2, pad - pad / 2),
            };
            TemplateValue::String(format!(
                "{}{}{}{}{}",
                left_border,
                " ".repeat(before),
                text,
                " ".repeat(after),
                right_border
            ))
        }
        other => {
            return Err(TemplateError::UnknownPipe {
                name: other.to_string(),
            });
        }
    };
    Ok(result)
}

fn pairs(value: TemplateValue) -> TemplateValue {
    let pair = |key: String, value: TemplateValue| {
        let mut m = HashMap::new();
        m.insert("key".to_string(), TemplateValue::String(key));
        m.insert("value".to_string(), value);
        TemplateValue::Map(m)
    };
    match value {
        TemplateValue::Map(m) => {
            let mut entries: Vec<_> = m.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            TemplateValue::List(entries.into_iter().map(|(k, v)| pair(k, v)).collect())
        }
        TemplateValue::List(items) => TemplateValue::List(
            items
                .into_iter()
                .enumerate()
                .map(|(i, v)| pair((i + 1).to_string(), v))
                .collect(),
        ),
        other => other,
    }
}

fn to_roman(mut n: u32) -> String {
    const NUMERALS: &[(u32, &str)] = &[
        (1000, "m"),
        (900, "cm"),
        (500, "d"),
        (400, "cd"),
        (100, "c"),
        (90, "xc"),
        (50, "l"),
        (40, "xl"),
        (10, "x"),
        (9, "ix"),
        (5, "v"),
        (4, "iv"),
        (1, "i"),
    ];
    let mut out = String::new();
    for &(value, numeral) in NUMERALS {
        while n >= value {
            out.push_str(numeral);
            n -= value;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::MemoryResolver;
    use pretty_assertions::assert_eq;
    use std::path::Path;

    fn ctx(pairs: &[(&str, TemplateValue)]) -> TemplateContext {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn list(items: &[&str]) -> TemplateValue {
        TemplateValue::List(items.iter().map(|s| TemplateValue::from(*s)).collect())
    }

    #[test]
    fn test_missing_variable_renders_empty() {
        let t = Template::compile("[$nope$]").unwrap();
        assert_eq!(t.render(&TemplateContext::new()).unwrap(), "[]");
    }

    #[test]
    fn test_elseif_picks_first_truthy_branch() {
        let t = Template::compile("$if(a)$A$elseif(b)$B$else$C$endif$").unwrap();
        assert_eq!(t.render(&ctx(&[("b", TemplateValue::Bool(true))])).unwrap(), "B");
        assert_eq!(t.render(&TemplateContext::new()).unwrap(), "C");
    }

    #[test]
    fn test_for_loop_binds_loop_variable_and_it() {
        let t = Template::compile("$for(css)$<$css$|$it$>$sep$,$endfor$").unwrap();
        let out = t.render(&ctx(&[("css", list(&["a.css", "b.css"]))])).unwrap();
        assert_eq!(out, "<a.css|a.css>,<b.css|b.css>");
    }

    #[test]
    fn test_for_loop_over_scalar_iterates_once() {
        let t = Template::compile("$for(x)$[$x$]$endfor$").unwrap();
        assert_eq!(t.render(&ctx(&[("x", TemplateValue::from("one"))])).unwrap(), "[one]");
        assert_eq!(t.render(&TemplateContext::new()).unwrap(), "");
    }

    #[test]
    fn test_variable_separator_joins_list() {
        let t = Template::compile("$xs[; ]$").unwrap();
        assert_eq!(t.render(&ctx(&[("xs", list(&["a", "b", "c"]))])).unwrap(), "a; b; c");
    }

    #[test]
    fn test_pipes() {
        let t = Template::compile("$x/uppercase$ $xs/length$ $xs/last$ $n/roman$ $n/alpha$").unwrap();
        let out = t
            .render(&ctx(&[
                ("x", TemplateValue::from("hi")),
                ("xs", list(&["a", "b", "c"])),
                ("n", TemplateValue::from("4")),
            ]))
            .unwrap();
        assert_eq!(out, "HI 3 c iv d");
    }

    #[test]
    fn test_left_pipe_pads_with_borders() {
        let t = Template::compile(r#"$x/left 5 "|" "|"$"#).unwrap();
        assert_eq!(t.render(&ctx(&[("x", TemplateValue::from("ab"))])).unwrap(), "|ab   |");
    }

    #[test]
    fn test_applied_partial_with_separator() {
        let resolver = MemoryResolver::with_partials([("item.html", "<$it$>")]);
        let t = Template::compile_with_resolver(
            "$xs:item()[, ]$",
            Path::new("main.html"),
            &resolver,
        )
        .unwrap();
        assert_eq!(t.render(&ctx(&[("xs", list(&["a", "b"]))])).unwrap(), "<a>, <b>");
    }

    #[test]
    fn test_unresolved_partial_fails_at_render() {
        let t = Template::compile("$header()$").unwrap();
        assert!(matches!(
            t.render(&TemplateContext::new()),
            Err(TemplateError::PartialNotFound { .. })
        ));
    }
}
