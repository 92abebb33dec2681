/*
 * lib.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Pandoc-compatible document template compiler for pampa.
//!
//! Templates follow the syntax of Pandoc's
//! [doctemplates](https://github.com/jgm/doctemplates) library:
//!
//! - Variable interpolation: `$variable$` or `${variable}`
//! - Nested field access: `$employee.salary$`
//! - Conditionals: `$if(var)$...$elseif(other)$...$else$...$endif$`
//! - For loops: `$for(items)$...$sep$...$endfor$`
//! - Partials: `$partial()$`, `$var:partial()$` and `$var:partial()[, ]$`
//! - Pipes: `$var/uppercase$`
//! - Comments: `$-- comment`
//! - Escaped dollar: `$$`
//!
//! The nesting (`$^$`) and breakable space (`$~$`) markers are accepted and
//! ignored, since output is never reflowed here.
//!
//! Compiling a template resolves all of its partials through a
//! [`PartialResolver`], so a compiled [`Template`] is self-contained and can be
//! rendered any number of times against a [`TemplateContext`].
//!
//! # Example
//!
//! ```ignore
//! use pampa_doctemplate::{Template, TemplateContext, TemplateValue};
//!
//! let template = Template::compile("Hello, $name$!")?;
//!
//! let mut ctx = TemplateContext::new();
//! ctx.insert("name", TemplateValue::String("World".to_string()));
//!
//! assert_eq!(template.render(&ctx)?, "Hello, World!");
//! ```

pub mod ast;
pub mod context;
pub mod error;
pub mod evaluator;
pub mod parser;
pub mod resolver;

pub use ast::{Conditional, ForLoop, Partial, Pipe, PipeArg, TemplateNode, VariableRef};
pub use context::{TemplateContext, TemplateValue};
pub use error::{TemplateError, TemplateResult};
pub use parser::Template;
pub use resolver::{FileSystemResolver, MemoryResolver, NullResolver, PartialResolver};
