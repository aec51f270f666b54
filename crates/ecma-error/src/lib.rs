//! Diagnostics and error types for the EcmaScript parser
//!
//! Two layers live here. [`ParseError`] is the fatal, `Result`-carried layer:
//! a scanner fault, the recursion-depth guard, or the end-of-parse summary
//! when a non-recovering caller had syntax errors. [`Diagnostic`] is the
//! accumulated layer: position-tagged errors and warnings collected by an
//! [`ErrorReporter`] while the parser keeps going, which is what IDE-mode
//! callers consume.

use ecma_ast::Span;
use ecma_lexer::LexError;
use std::fmt;
use thiserror::Error;

/// Result type for parser operations
pub type ParseResult<T> = Result<T, ParseError>;

/// Fatal errors that abort a parse (or summarize one that failed).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("lexical error: {0}")]
    Lex(#[from] LexError),

    #[error("{message} ({line}:{column})")]
    Syntax { message: String, offset: usize, line: u32, column: u32 },

    #[error("too deep parser recursion")]
    TooDeepRecursion,

    #[error("got {count} syntax errors")]
    SyntaxErrorCount { count: usize },
}

impl ParseError {
    /// Create a syntax error pinned to a span.
    pub fn syntax(message: impl Into<String>, span: Span) -> Self {
        ParseError::Syntax {
            message: message.into(),
            offset: span.start,
            line: span.line,
            column: span.column,
        }
    }
}

/// Diagnostic severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Warning,
    Error,
}

/// A single position-tagged message.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    pub span: Span,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>, span: Span) -> Self {
        Diagnostic { severity: Severity::Error, message: message.into(), span }
    }

    pub fn warning(message: impl Into<String>, span: Span) -> Self {
        Diagnostic { severity: Severity::Warning, message: message.into(), span }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.severity {
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        write!(
            f,
            "{}: {} ({}:{})",
            tag, self.message, self.span.line, self.span.column
        )
    }
}

/// Collecting sink for diagnostics, written in source order during a parse.
///
/// The reporter may outlive a parse (tooling reuses one across files via
/// `take_diagnostics`), but a single parse writes to it from one place only.
#[derive(Debug, Default)]
pub struct ErrorReporter {
    diagnostics: Vec<Diagnostic>,
    /// Source URI attached to rendered messages, when known
    source_uri: Option<String>,
    warnings_as_errors: bool,
}

impl ErrorReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_source_uri(uri: impl Into<String>) -> Self {
        ErrorReporter { source_uri: Some(uri.into()), ..Self::default() }
    }

    /// Upgrade warnings to errors as they are recorded.
    pub fn set_warnings_as_errors(&mut self, enabled: bool) {
        self.warnings_as_errors = enabled;
    }

    pub fn source_uri(&self) -> Option<&str> {
        self.source_uri.as_deref()
    }

    pub fn error(&mut self, message: impl Into<String>, span: Span) {
        self.diagnostics.push(Diagnostic::error(message, span));
    }

    pub fn warning(&mut self, message: impl Into<String>, span: Span) {
        let mut diag = Diagnostic::warning(message, span);
        if self.warnings_as_errors {
            diag.severity = Severity::Error;
        }
        self.diagnostics.push(diag);
    }

    /// Number of error-severity diagnostics recorded so far.
    pub fn error_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.severity == Severity::Error).count()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Drain the recorded diagnostics, leaving the reporter reusable.
    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span() -> Span {
        Span::new(4, 7, 2, 1)
    }

    #[test]
    fn reporter_counts_errors_not_warnings() {
        let mut reporter = ErrorReporter::new();
        reporter.warning("semicolon inserted", span());
        reporter.error("unexpected token", span());
        assert_eq!(reporter.error_count(), 1);
        assert_eq!(reporter.diagnostics().len(), 2);
    }

    #[test]
    fn warnings_upgrade_when_requested() {
        let mut reporter = ErrorReporter::new();
        reporter.set_warnings_as_errors(true);
        reporter.warning("redeclared var", span());
        assert_eq!(reporter.error_count(), 1);
    }

    #[test]
    fn take_leaves_reporter_reusable() {
        let mut reporter = ErrorReporter::new();
        reporter.error("x", span());
        let drained = reporter.take_diagnostics();
        assert_eq!(drained.len(), 1);
        assert_eq!(reporter.error_count(), 0);
    }

    #[test]
    fn display_includes_position() {
        let d = Diagnostic::error("unexpected token", span());
        assert_eq!(d.to_string(), "error: unexpected token (2:1)");
    }
}
