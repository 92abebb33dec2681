/*
 * parser.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Template parser.
//!
//! Parsing happens in two passes. The lexer splits the source into literal
//! text and classified directives, applying the doctemplates rule that a block
//! keyword alone on its line swallows that line. The builder then folds the
//! flat token stream into nested [`TemplateNode`]s.

use crate::ast::{Conditional, ForLoop, Partial, Pipe, PipeArg, TemplateNode, VariableRef};
use crate::error::{TemplateError, TemplateResult};
use crate::resolver::{
    FileSystemResolver, PartialResolver, remove_final_newline, resolve_partial_path,
};
use std::iter::Peekable;
use std::path::Path;
use std::vec::IntoIter;

/// Maximum partial nesting depth before we assume recursion.
const MAX_PARTIAL_DEPTH: usize = 50;

/// Pipes understood by the evaluator.
pub(crate) const KNOWN_PIPES: &[&str] = &[
    "pairs",
    "uppercase",
    "lowercase",
    "length",
    "reverse",
    "first",
    "last",
    "rest",
    "allbutlast",
    "chomp",
    "nowrap",
    "alpha",
    "roman",
    "left",
    "right",
    "center",
];

/// A compiled template ready for evaluation.
#[derive(Debug, Clone)]
pub struct Template {
    /// The parsed template AST.
    pub(crate) nodes: Vec<TemplateNode>,

    /// Original source.
    pub(crate) source: String,
}

impl Template {
    /// Compile a template from source text.
    ///
    /// Partials are left unresolved; use [`Template::compile_with_resolver`]
    /// for templates that reference them.
    pub fn compile(source: &str) -> TemplateResult<Self> {
        Self::compile_with_filename(source, "<template>")
    }

    /// Compile a template from source text with a filename for error reporting.
    pub fn compile_with_filename(source: &str, filename: &str) -> TemplateResult<Self> {
        let nodes = parse_nodes(source, filename)?;
        Ok(Template {
            nodes,
            source: source.to_string(),
        })
    }

    /// Compile a template from a file, resolving partials from the filesystem.
    ///
    /// Partials are loaded from the same directory as the template file.
    pub fn compile_from_file(path: &Path) -> TemplateResult<Self> {
        let source = std::fs::read_to_string(path)?;
        Self::compile_with_resolver(&source, path, &FileSystemResolver)
    }

    /// Compile a template, loading every partial it references through
    /// `resolver`. `template_path` anchors relative partial names.
    pub fn compile_with_resolver(
        source: &str,
        template_path: &Path,
        resolver: &impl PartialResolver,
    ) -> TemplateResult<Self> {
        let mut template = Self::compile_with_filename(source, &template_path.to_string_lossy())?;
        resolve_partials(&mut template.nodes, template_path, resolver, 0)?;
        Ok(template)
    }

    /// Get the AST nodes of this template.
    pub fn nodes(&self) -> &[TemplateNode] {
        &self.nodes
    }

    /// The source text this template was compiled from.
    pub fn source(&self) -> &str {
        &self.source
    }
}

/// Recursively resolve partial references in a list of template nodes.
fn resolve_partials(
    nodes: &mut [TemplateNode],
    template_path: &Path,
    resolver: &impl PartialResolver,
    depth: usize,
) -> TemplateResult<()> {
    for node in nodes {
        match node {
            TemplateNode::Partial(partial) => {
                if depth >= MAX_PARTIAL_DEPTH {
                    return Err(TemplateError::RecursivePartial {
                        name: partial.name.clone(),
                        max_depth: MAX_PARTIAL_DEPTH,
                    });
                }
                let source = resolver
                    .get_partial(&partial.name, template_path)
                    .ok_or_else(|| TemplateError::PartialNotFound {
                        name: partial.name.clone(),
                    })?;
                let partial_path = resolve_partial_path(&partial.name, template_path);
                let mut parsed = parse_nodes(
                    remove_final_newline(&source),
                    &partial_path.to_string_lossy(),
                )?;
                resolve_partials(&mut parsed, &partial_path, resolver, depth + 1)?;
                partial.resolved = Some(parsed);
            }
            TemplateNode::Conditional(conditional) => {
                for (_, body) in &mut conditional.branches {
                    resolve_partials(body, template_path, resolver, depth)?;
                }
                if let Some(body) = &mut conditional.else_branch {
                    resolve_partials(body, template_path, resolver, depth)?;
                }
            }
            TemplateNode::ForLoop(for_loop) => {
                resolve_partials(&mut for_loop.body, template_path, resolver, depth)?;
                if let Some(sep) = &mut for_loop.separator {
                    resolve_partials(sep, template_path, resolver, depth)?;
                }
            }
            TemplateNode::Literal(_) | TemplateNode::Variable(_) => {}
        }
    }
    Ok(())
}

fn parse_nodes(source: &str, filename: &str) -> TemplateResult<Vec<TemplateNode>> {
    let lexer = Lexer { source, filename };
    let tokens = lexer.tokenize()?;
    let mut iter = tokens.into_iter().peekable();
    let (nodes, terminator) = lexer.parse_block(&mut iter)?;
    match terminator {
        None => Ok(nodes),
        Some((directive, offset)) => Err(lexer.error_at(
            offset,
            format!("unexpected ${}$", directive.keyword()),
        )),
    }
}

#[derive(Debug)]
enum Directive {
    /// `$var$` or `$partial()$`
    Interpolate(TemplateNode),
    If(VariableRef),
    ElseIf(VariableRef),
    Else,
    EndIf,
    For(VariableRef),
    Sep,
    EndFor,
    /// `$^$` and `$~$`
    Ignored,
}

impl Directive {
    fn is_block_keyword(&self) -> bool {
        !matches!(self, Directive::Interpolate(_) | Directive::Ignored)
    }

    fn keyword(&self) -> &'static str {
        match self {
            Directive::Interpolate(_) => "variable",
            Directive::If(_) => "if",
            Directive::ElseIf(_) => "elseif",
            Directive::Else => "else",
            Directive::EndIf => "endif",
            Directive::For(_) => "for",
            Directive::Sep => "sep",
            Directive::EndFor => "endfor",
            Directive::Ignored => "marker",
        }
    }
}

#[derive(Debug)]
enum Token {
    Text(String),
    Directive(Directive, usize),
}

type Tokens = Peekable<IntoIter<Token>>;

struct Lexer<'a> {
    source: &'a str,
    filename: &'a str,
}

impl Lexer<'_> {
    fn error_at(&self, offset: usize, message: impl Into<String>) -> TemplateError {
        let before = &self.source[..offset];
        let line = before.matches('\n').count() + 1;
        let line_start = before.rfind('\n').map_or(0, |i| i + 1);
        TemplateError::ParseError {
            filename: self.filename.to_string(),
            line,
            column: offset - line_start + 1,
            message: message.into(),
        }
    }

    fn tokenize(&self) -> TemplateResult<Vec<Token>> {
        let source = self.source;
        let mut tokens = Vec::new();
        let mut text = String::new();
        let mut pos = 0;

        while let Some(rel) = source[pos..].find('$') {
            let start = pos + rel;
            text.push_str(&source[pos..start]);
            let rest = &source[start + 1..];

            if rest.starts_with('$') {
                text.push('$');
                pos = start + 2;
                continue;
            }

            if rest.starts_with("--") {
                pos = rest.find('\n').map_or(source.len(), |i| start + 1 + i + 1);
                continue;
            }

            let (content, mut end) = if let Some(braced) = rest.strip_prefix('{') {
                let close = braced
                    .find('}')
                    .ok_or_else(|| self.error_at(start, "unterminated ${"))?;
                (braced[..close].trim(), start + 2 + close + 1)
            } else {
                let close = rest
                    .find(['$', '\n'])
                    .filter(|&i| rest.as_bytes()[i] == b'$')
                    .ok_or_else(|| self.error_at(start, "unterminated $"))?;
                (rest[..close].trim(), start + 1 + close + 1)
            };

            let directive = self.classify(content, start)?;

            if directive.is_block_keyword() {
                let line_start = source[..start].rfind('\n').map_or(0, |i| i + 1);
                let leading = &source[line_start..start];
                let after = &source[end..];
                let newline = if after.starts_with("\r\n") {
                    Some(2)
                } else if after.starts_with('\n') || after.is_empty() {
                    Some(usize::from(!after.is_empty()))
                } else {
                    None
                };
                if let Some(skip) = newline
                    && leading.chars().all(|c| c == ' ' || c == '\t')
                {
                    text.truncate(text.len() - leading.len());
                    end += skip;
                }
            }

            if !text.is_empty() {
                tokens.push(Token::Text(std::mem::take(&mut text)));
            }
            tokens.push(Token::Directive(directive, start));
            pos = end;
        }

        text.push_str(&source[pos..]);
        if !text.is_empty() {
            tokens.push(Token::Text(text));
        }
        Ok(tokens)
    }

    fn classify(&self, content: &str, offset: usize) -> TemplateResult<Directive> {
        match content {
            "else" => return Ok(Directive::Else),
            "endif" => return Ok(Directive::EndIf),
            "sep" => return Ok(Directive::Sep),
            "endfor" => return Ok(Directive::EndFor),
            "^" | "~" => return Ok(Directive::Ignored),
            "" => return Err(self.error_at(offset, "empty directive")),
            _ => {}
        }
        if let Some(arg) = keyword_arg(content, "elseif") {
            return Ok(Directive::ElseIf(self.parse_var(arg, offset)?));
        }
        if let Some(arg) = keyword_arg(content, "if") {
            return Ok(Directive::If(self.parse_var(arg, offset)?));
        }
        if let Some(arg) = keyword_arg(content, "for") {
            return Ok(Directive::For(self.parse_var(arg, offset)?));
        }
        self.parse_interpolation(content, offset)
            .map(Directive::Interpolate)
    }

    fn parse_interpolation(&self, content: &str, offset: usize) -> TemplateResult<TemplateNode> {
        if let Some(idx) = content.find("()") {
            let (head, tail) = (&content[..idx], &content[idx + 2..]);
            let (var, name) = match head.split_once(':') {
                Some((var, name)) => (Some(self.parse_var(var, offset)?), name.trim()),
                None => (None, head.trim()),
            };
            if name.is_empty() {
                return Err(self.error_at(offset, "missing partial name"));
            }
            let (separator, pipes) = self.parse_separator(tail, offset)?;
            return Ok(TemplateNode::Partial(Partial {
                name: name.to_string(),
                var,
                separator,
                pipes: self.parse_pipes(pipes, offset)?,
                resolved: None,
            }));
        }

        let (path, pipes) = match content.find('/') {
            Some(i) => (&content[..i], &content[i..]),
            None => (content, ""),
        };
        let (path, separator) = match path.find('[') {
            Some(i) => {
                let (sep, rest) = self.parse_separator(&path[i..], offset)?;
                if !rest.trim().is_empty() {
                    return Err(self.error_at(offset, "unexpected text after separator"));
                }
                (&path[..i], sep)
            }
            None => (path, None),
        };
        let mut var = self.parse_var(path, offset)?;
        var.separator = separator;
        var.pipes = self.parse_pipes(pipes, offset)?;
        Ok(TemplateNode::Variable(var))
    }

    fn parse_var(&self, text: &str, offset: usize) -> TemplateResult<VariableRef> {
        let text = text.trim();
        let valid = !text.is_empty()
            && text.split('.').all(|part| {
                !part.is_empty()
                    && part
                        .chars()
                        .all(|c| c.is_alphanumeric() || c == '_' || c == '-')
            });
        if !valid {
            return Err(self.error_at(offset, format!("invalid variable name '{}'", text)));
        }
        Ok(VariableRef::from_dotted(text))
    }

    fn parse_separator<'t>(
        &self,
        text: &'t str,
        offset: usize,
    ) -> TemplateResult<(Option<String>, &'t str)> {
        let Some(inner) = text.strip_prefix('[') else {
            return Ok((None, text));
        };
        let close = inner
            .find(']')
            .ok_or_else(|| self.error_at(offset, "unterminated separator"))?;
        Ok((Some(inner[..close].to_string()), &inner[close + 1..]))
    }

    fn parse_pipes(&self, text: &str, offset: usize) -> TemplateResult<Vec<Pipe>> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(Vec::new());
        }
        let Some(text) = text.strip_prefix('/') else {
            return Err(self.error_at(offset, format!("unexpected '{}'", text)));
        };
        text.split('/')
            .map(|segment| self.parse_pipe(segment.trim(), offset))
            .collect()
    }

    fn parse_pipe(&self, segment: &str, offset: usize) -> TemplateResult<Pipe> {
        let (name, rest) = segment
            .split_once(char::is_whitespace)
            .unwrap_or((segment, ""));
        if !KNOWN_PIPES.contains(&name) {
            return Err(TemplateError::UnknownPipe {
                name: name.to_string(),
            });
        }

        let mut args = Vec::new();
        let mut rest = rest.trim_start();
        while !rest.is_empty() {
            if let Some(quoted) = rest.strip_prefix('"') {
                let close = quoted
                    .find('"')
                    .ok_or_else(|| self.error_at(offset, "unterminated pipe argument"))?;
                args.push(PipeArg::String(quoted[..close].to_string()));
                rest = quoted[close + 1..].trim_start();
            } else {
                let (word, tail) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
                let n = word.parse::<i64>().map_err(|_| {
                    self.error_at(offset, format!("invalid pipe argument '{}'", word))
                })?;
                args.push(PipeArg::Integer(n));
                rest = tail.trim_start();
            }
        }

        Ok(Pipe {
            name: name.to_string(),
            args,
        })
    }

    /// Consume tokens until a block terminator or the end of input.
    fn parse_block(
        &self,
        tokens: &mut Tokens,
    ) -> TemplateResult<(Vec<TemplateNode>, Option<(Directive, usize)>)> {
        let mut nodes = Vec::new();
        while let Some(token) = tokens.next() {
            match token {
                Token::Text(text) => nodes.push(TemplateNode::Literal(text)),
                Token::Directive(directive, offset) => match directive {
                    Directive::Interpolate(node) => nodes.push(node),
                    Directive::Ignored => {}
                    Directive::If(var) => nodes.push(self.parse_conditional(var, tokens, offset)?),
                    Directive::For(var) => nodes.push(self.parse_for_loop(var, tokens, offset)?),
                    terminator => return Ok((nodes, Some((terminator, offset)))),
                },
            }
        }
        Ok((nodes, None))
    }

    fn parse_conditional(
        &self,
        first: VariableRef,
        tokens: &mut Tokens,
        offset: usize,
    ) -> TemplateResult<TemplateNode> {
        let mut branches = Vec::new();
        let mut condition = first;
        let mut else_branch = None;

        loop {
            let (body, terminator) = self.parse_block(tokens)?;
            match terminator {
                Some((Directive::ElseIf(next), _)) => {
                    branches.push((condition, body));
                    condition = next;
                }
                Some((Directive::Else, _)) => {
                    branches.push((condition, body));
                    let (body, terminator) = self.parse_block(tokens)?;
                    match terminator {
                        Some((Directive::EndIf, _)) => {}
                        Some((other, at)) => {
                            return Err(self.error_at(
                                at,
                                format!("unexpected ${}$ in $else$ branch", other.keyword()),
                            ));
                        }
                        None => return Err(self.error_at(offset, "unterminated $if$")),
                    }
                    else_branch = Some(body);
                    break;
                }
                Some((Directive::EndIf, _)) => {
                    branches.push((condition, body));
                    break;
                }
                Some((other, at)) => {
                    return Err(self.error_at(
                        at,
                        format!("unexpected ${}$ inside $if$", other.keyword()),
                    ));
                }
                None => return Err(self.error_at(offset, "unterminated $if$")),
            }
        }

        Ok(TemplateNode::Conditional(Conditional {
            branches,
            else_branch,
        }))
    }

    fn parse_for_loop(
        &self,
        var: VariableRef,
        tokens: &mut Tokens,
        offset: usize,
    ) -> TemplateResult<TemplateNode> {
        let (body, terminator) = self.parse_block(tokens)?;
        let separator = match terminator {
            Some((Directive::EndFor, _)) => None,
            Some((Directive::Sep, _)) => {
                let (sep, terminator) = self.parse_block(tokens)?;
                match terminator {
                    Some((Directive::EndFor, _)) => Some(sep),
                    Some((other, at)) => {
                        return Err(self.error_at(
                            at,
                            format!("unexpected ${}$ after $sep$", other.keyword()),
                        ));
                    }
                    None => return Err(self.error_at(offset, "unterminated $for$")),
                }
            }
            Some((other, at)) => {
                return Err(self.error_at(
                    at,
                    format!("unexpected ${}$ inside $for$", other.keyword()),
                ));
            }
            None => return Err(self.error_at(offset, "unterminated $for$")),
        };

        Ok(TemplateNode::ForLoop(ForLoop {
            var,
            body,
            separator,
        }))
    }
}

/// Match `keyword(arg)` and return `arg`.
fn keyword_arg<'a>(content: &'a str, keyword: &str) -> Option<&'a str> {
    content
        .strip_prefix(keyword)?
        .trim_start()
        .strip_prefix('(')?
        .strip_suffix(')')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::MemoryResolver;
    use pretty_assertions::assert_eq;

    fn literal(s: &str) -> TemplateNode {
        TemplateNode::Literal(s.to_string())
    }

    fn var(s: &str) -> TemplateNode {
        TemplateNode::Variable(VariableRef::from_dotted(s))
    }

    #[test]
    fn test_parse_plain_text() {
        let t = Template::compile("no directives here").unwrap();
        assert_eq!(t.nodes(), &[literal("no directives here")]);
    }

    #[test]
    fn test_parse_variables_both_syntaxes() {
        let t = Template::compile("$a$ and ${ b.c }").unwrap();
        assert_eq!(t.nodes(), &[var("a"), literal(" and "), var("b.c")]);
    }

    #[test]
    fn test_escaped_dollar() {
        let t = Template::compile("costs $$5").unwrap();
        assert_eq!(t.nodes(), &[literal("costs $5")]);
    }

    #[test]
    fn test_comment_is_dropped_with_its_newline() {
        let t = Template::compile("a\n$-- ignore me\nb").unwrap();
        assert_eq!(t.nodes(), &[literal("a\nb")]);
    }

    #[test]
    fn test_block_keyword_alone_on_line_swallows_line() {
        let t = Template::compile("$if(x)$\n  yes\n$endif$\nafter").unwrap();
        let TemplateNode::Conditional(c) = &t.nodes()[0] else {
            panic!("expected conditional, got {:?}", t.nodes());
        };
        assert_eq!(c.branches[0].1, vec![literal("  yes\n")]);
        assert_eq!(&t.nodes()[1], &literal("after"));
    }

    #[test]
    fn test_parse_conditional_with_elseif_and_else() {
        let t = Template::compile("$if(a)$A$elseif(b)$B$else$C$endif$").unwrap();
        let TemplateNode::Conditional(c) = &t.nodes()[0] else {
            panic!("expected conditional");
        };
        assert_eq!(c.branches.len(), 2);
        assert_eq!(c.branches[1].0.dotted(), "b");
        assert_eq!(c.else_branch, Some(vec![literal("C")]));
    }

    #[test]
    fn test_parse_for_loop_with_separator() {
        let t = Template::compile("$for(xs)$$xs$$sep$, $endfor$").unwrap();
        let TemplateNode::ForLoop(f) = &t.nodes()[0] else {
            panic!("expected for loop");
        };
        assert_eq!(f.var.dotted(), "xs");
        assert_eq!(f.body, vec![var("xs")]);
        assert_eq!(f.separator, Some(vec![literal(", ")]));
    }

    #[test]
    fn test_parse_partial_forms() {
        let t = Template::compile("$styles.html()$$authors:author()[, ]$").unwrap();
        let TemplateNode::Partial(bare) = &t.nodes()[0] else {
            panic!("expected partial");
        };
        assert_eq!(bare.name, "styles.html");
        assert!(bare.var.is_none());

        let TemplateNode::Partial(applied) = &t.nodes()[1] else {
            panic!("expected partial");
        };
        assert_eq!(applied.name, "author");
        assert_eq!(applied.var.as_ref().map(VariableRef::dotted).as_deref(), Some("authors"));
        assert_eq!(applied.separator.as_deref(), Some(", "));
    }

    #[test]
    fn test_parse_pipes_with_args() {
        let t = Template::compile(r#"$title/uppercase/left 10 "|"$"#).unwrap();
        let TemplateNode::Variable(v) = &t.nodes()[0] else {
            panic!("expected variable");
        };
        assert_eq!(v.pipes.len(), 2);
        assert_eq!(v.pipes[1].name, "left");
        assert_eq!(
            v.pipes[1].args,
            vec![PipeArg::Integer(10), PipeArg::String("|".to_string())]
        );
    }

    #[test]
    fn test_unknown_pipe_is_an_error() {
        let err = Template::compile("$x/frobnicate$").unwrap_err();
        assert!(matches!(err, TemplateError::UnknownPipe { name } if name == "frobnicate"));
    }

    #[test]
    fn test_unterminated_if_reports_location() {
        let err = Template::compile("line one\n  $if(x)$ never closed").unwrap_err();
        match err {
            TemplateError::ParseError {
                line,
                column,
                message,
                ..
            } => {
                assert_eq!(line, 2);
                assert_eq!(column, 3);
                assert!(message.contains("unterminated $if$"));
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_stray_endfor_is_an_error() {
        assert!(Template::compile("text $endfor$").is_err());
    }

    #[test]
    fn test_unterminated_dollar_is_an_error() {
        assert!(Template::compile("price: $5\nnext line").is_err());
    }

    #[test]
    fn test_resolve_partials_from_memory() {
        let resolver = MemoryResolver::with_partials([("header.html", "<h1>$title$</h1>\n")]);
        let t = Template::compile_with_resolver("$header()$", Path::new("main.html"), &resolver)
            .unwrap();
        let TemplateNode::Partial(p) = &t.nodes()[0] else {
            panic!("expected partial");
        };
        assert_eq!(
            p.resolved,
            Some(vec![literal("<h1>"), var("title"), literal("</h1>")])
        );
    }

    #[test]
    fn test_missing_partial_is_an_error() {
        let err = Template::compile_with_resolver(
            "$nothere()$",
            Path::new("main.html"),
            &MemoryResolver::new(),
        )
        .unwrap_err();
        assert!(matches!(err, TemplateError::PartialNotFound { name } if name == "nothere"));
    }

    #[test]
    fn test_recursive_partial_is_detected() {
        let resolver = MemoryResolver::with_partials([("loop.html", "$loop()$")]);
        let err = Template::compile_with_resolver("$loop()$", Path::new("main.html"), &resolver)
            .unwrap_err();
        assert!(matches!(err, TemplateError::RecursivePartial { .. }));
    }
}
