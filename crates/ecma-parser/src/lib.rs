//! Recursive-descent EcmaScript parser
//!
//! This crate is the front end of the parser workspace: it consumes tokens
//! from [`ecma-lexer`](ecma_lexer), builds the position-rich AST defined in
//! [`ecma-ast`](ecma_ast), tracks scopes and bindings well enough to report
//! every redeclaration and strict-mode early error, applies automatic
//! semicolon insertion, and lowers destructuring patterns into an IR-friendly
//! step sequence.
//!
//! # Usage
//!
//! ```rust,ignore
//! use ecma_parser::{parse_script, ParserConfig, Parser};
//!
//! let out = parse_script("let x = 1; { let x = 2; } x").expect("parse");
//! assert!(!out.module);
//!
//! // Or with explicit configuration:
//! let config = ParserConfig::new().with_ide_mode(true);
//! let out = Parser::new("const [a, b] = pair;", config).parse_script().expect("parse");
//! assert_eq!(out.lowerings.len(), 1);
//! ```
//!
//! # Design
//!
//! - **Single token of lookahead.** Ambiguities (`let`, `async`, arrow
//!   parameter lists, regex vs. division) are resolved by committing to a
//!   token and re-entering the grammar with it, never by rewinding.
//! - **Single use.** `parse_script`/`parse_module` take the parser by value;
//!   a parser cannot run twice.
//! - **Recovery.** With recovery (or IDE mode) enabled the parser
//!   resynchronizes at statement boundaries, leaves `Error` nodes behind, and
//!   always returns an AST together with the collected diagnostics.

mod config;
mod lower;
mod parser;
mod scope;
mod token_buffer;

pub use config::{EcmaVersion, ParserConfig};
pub use lower::{BindTarget, LowerStep, Lowering, PropKey, TempId};
pub use parser::Parser;
pub use scope::{DefineOutcome, Scope, ScopeArena, ScopeId, ScopeKind, SymbolKind};

use ecma_ast::{Node, Span};
use ecma_error::{Diagnostic, ParseError};
use ecma_token::CommentKind;

/// A recorded comment, when comment recording is enabled.
#[derive(Debug, Clone, PartialEq)]
pub struct Comment {
    pub span: Span,
    pub kind: CommentKind,
    pub text: String,
}

/// Everything one parse produces.
#[derive(Debug)]
pub struct ParseOutput {
    /// The `Program` root; every node carries its source span
    pub root: Node,
    /// Whether the top level ended up strict (mode, module, or directive)
    pub strict: bool,
    pub module: bool,
    /// Comments in source order, when recording was requested
    pub comments: Vec<Comment>,
    /// Diagnostics in source order; errors and warnings
    pub diagnostics: Vec<Diagnostic>,
    /// Destructuring lowerings in source order
    pub lowerings: Vec<Lowering>,
}

/// Parse a classic script with the default configuration.
pub fn parse_script(source: &str) -> Result<ParseOutput, ParseError> {
    Parser::new(source, ParserConfig::default()).parse_script()
}

/// Parse a module with the default configuration.
pub fn parse_module(source: &str) -> Result<ParseOutput, ParseError> {
    Parser::new(source, ParserConfig::default()).parse_module()
}
