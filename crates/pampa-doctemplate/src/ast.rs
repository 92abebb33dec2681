/*
 * ast.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Parsed form of a template.

/// One piece of a parsed template.
#[derive(Debug, Clone, PartialEq)]
pub enum TemplateNode {
    /// Text copied to the output unchanged.
    Literal(String),
    /// `$title$`, `$author.name/uppercase$`, `$css[, ]$`
    Variable(VariableRef),
    /// `$if(toc)$ ... $elseif(x)$ ... $else$ ... $endif$`
    Conditional(Conditional),
    /// `$for(css)$ ... $sep$ ... $endfor$`
    ForLoop(ForLoop),
    /// `$styles.html()$` or `$author:byline()$`
    Partial(Partial),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Conditional {
    /// The `if` branch followed by each `elseif`, in source order.
    pub branches: Vec<(VariableRef, Vec<TemplateNode>)>,
    pub else_branch: Option<Vec<TemplateNode>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForLoop {
    pub var: VariableRef,
    pub body: Vec<TemplateNode>,
    /// Content between `$sep$` and `$endfor$`, emitted between items.
    pub separator: Option<Vec<TemplateNode>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Partial {
    /// File name as written, e.g. `common.tex`.
    pub name: String,
    /// `author` in `$author:byline()$`.
    pub var: Option<VariableRef>,
    /// `[sep]` placed between applications over a list.
    pub separator: Option<String>,
    pub pipes: Vec<Pipe>,
    /// Filled in at compile time from the partial resolver.
    pub resolved: Option<Vec<TemplateNode>>,
}

/// A variable name with its pipes and list separator.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableRef {
    /// `author.name` is `["author", "name"]`.
    pub path: Vec<String>,
    pub pipes: Vec<Pipe>,
    pub separator: Option<String>,
}

impl VariableRef {
    pub fn from_dotted(name: &str) -> Self {
        Self {
            path: name.split('.').map(str::to_string).collect(),
            pipes: Vec::new(),
            separator: None,
        }
    }

    pub fn dotted(&self) -> String {
        self.path.join(".")
    }
}

/// `/uppercase`, `/left 20 "| "` and the like.
#[derive(Debug, Clone, PartialEq)]
pub struct Pipe {
    pub name: String,
    pub args: Vec<PipeArg>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PipeArg {
    /// A column width.
    Integer(i64),
    /// A quoted border string.
    String(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dotted_name_round_trips() {
        let var = VariableRef::from_dotted("author.affiliation");
        assert_eq!(var.path, ["author", "affiliation"]);
        assert_eq!(var.dotted(), "author.affiliation");
        assert!(var.pipes.is_empty() && var.separator.is_none());
    }

    #[test]
    fn test_width_and_border_args_differ() {
        assert_ne!(PipeArg::Integer(20), PipeArg::String("20".to_string()));
    }
}
