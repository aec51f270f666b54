//! Recursive-descent grammar driver.
//!
//! One token of lookahead, context carried in parser fields rather than in the
//! token stream: strict mode, the in-generator/in-async flags, the `in`
//! suppression flag for `for` heads, the statement nesting depth that gates
//! module headers, and the per-function state that is saved and restored on
//! every function entry. Statements are parsed by one dispatch function;
//! expressions climb the precedence ladder in `expr.rs`; functions, classes,
//! and module headers live in sibling modules.
//!
//! Error discipline: structural faults (a missing `)`, an unexpected token)
//! unwind the current production and are caught at the nearest statement
//! boundary, which resynchronizes and leaves an `Error` node behind. Context
//! faults (redeclarations, strict-mode violations, accessor arity) are
//! recorded as diagnostics and parsing carries on, so one parse reports them
//! all in source order.

mod expr;
mod func;
mod modules;

use crate::config::{EcmaVersion, ParserConfig};
use crate::lower::lower_program;
use crate::scope::{DefineOutcome, ScopeArena, ScopeId, ScopeKind, SymbolKind};
use crate::token_buffer::TokenBuffer;
use crate::ParseOutput;
use ecma_ast::{Node, NodeKind, Span, VarKind};
use ecma_error::{ErrorReporter, ParseError, ParseResult};
use ecma_token::{Token, TokenKind};
use rustc_hash::FxHashMap;
use tracing::{debug, trace};

const MAX_RECURSION_DEPTH: usize = 500;

/// Statement position: some productions are barred from single-statement
/// bodies (`if (x) let y = 1` is an early error).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StmtCtx {
    Default,
    Single,
}

/// Per-function state, saved on function entry and restored on exit.
#[derive(Debug, Clone)]
pub(crate) struct FunctionState {
    /// Inside any function body, arrows included (`return` legality)
    pub in_function: bool,
    /// `new.target` legality: true in real functions and methods, inherited
    /// by arrows
    pub allow_new_target: bool,
    pub is_async: bool,
    pub is_generator: bool,
    /// Currently parsing a parameter list
    pub in_params: bool,
    pub allow_super_property: bool,
    pub allow_super_call: bool,
    pub strict: bool,
    /// Label name -> labels an iteration statement
    pub labels: FxHashMap<String, bool>,
    pub loop_depth: u32,
    pub switch_depth: u32,
    pub saw_return_value: bool,
    pub saw_return_bare: bool,
    /// `undefined` was declared as a binding in this function
    pub undefined_redefined: bool,
    /// Parameter names in source order, kept for retroactive strict checks
    pub param_names: Vec<(String, Span)>,
    pub params_simple: bool,
    /// The function's own name, for strict-mode validation after a directive
    pub name_span: Option<(String, Span)>,
}

impl FunctionState {
    pub(crate) fn top_level(strict: bool) -> Self {
        FunctionState {
            in_function: false,
            allow_new_target: false,
            is_async: false,
            is_generator: false,
            in_params: false,
            allow_super_property: false,
            allow_super_call: false,
            strict,
            labels: FxHashMap::default(),
            loop_depth: 0,
            switch_depth: 0,
            saw_return_value: false,
            saw_return_bare: false,
            undefined_redefined: false,
            param_names: Vec::new(),
            params_simple: true,
            name_span: None,
        }
    }
}

/// Private-name bookkeeping for one `class` body.
#[derive(Debug, Default)]
pub(crate) struct ClassInfo {
    /// name -> declared kinds bitmask (get=1, set=2, other=4)
    pub declared: FxHashMap<String, u8>,
    /// accesses seen in this class body, validated when the body closes
    pub accesses: Vec<(String, Span)>,
    pub has_constructor: bool,
}

/// The parser. One instance parses one source, once: the entry points take
/// `self` by value, so a second parse of the same instance is unrepresentable.
pub struct Parser<'a> {
    pub(crate) config: ParserConfig,
    pub(crate) tokens: TokenBuffer<'a>,
    pub(crate) reporter: ErrorReporter,
    pub(crate) arena: ScopeArena,
    pub(crate) current_scope: ScopeId,
    pub(crate) current_function_scope: ScopeId,
    pub(crate) module: bool,
    pub(crate) fstate: FunctionState,
    pub(crate) recursion_depth: usize,
    /// Depth of statement nesting; module headers require depth 1
    pub(crate) statement_nesting: u32,
    /// Suppress the `in` operator (inside a `for` head)
    pub(crate) no_in: bool,
    /// Span of the first `{ x = 1 }` cover-grammar initializer awaiting a
    /// destructuring context to legitimize it
    pub(crate) pending_cover: Option<Span>,
    /// Primary expression handed back by a disambiguation path
    pub(crate) prebuilt: Option<Node>,
    pub(crate) class_stack: Vec<ClassInfo>,
    /// A default export was already seen (modules)
    pub(crate) has_default_export: bool,
}

impl<'a> Parser<'a> {
    /// Create a parser over `source` with the given configuration.
    pub fn new(source: &'a str, config: ParserConfig) -> Self {
        let mut reporter = match &config.source_uri {
            Some(uri) => ErrorReporter::with_source_uri(uri.clone()),
            None => ErrorReporter::new(),
        };
        reporter.set_warnings_as_errors(config.warning_as_error);
        let tokens = TokenBuffer::new(source, config.start_line, config.record_comments);
        let mut arena = ScopeArena::new();
        let root = arena.push_root(ScopeKind::Script);
        let strict = config.strict;
        Parser {
            config,
            tokens,
            reporter,
            arena,
            current_scope: root,
            current_function_scope: root,
            module: false,
            fstate: FunctionState::top_level(strict),
            recursion_depth: 0,
            statement_nesting: 0,
            no_in: false,
            pending_cover: None,
            prebuilt: None,
            class_stack: Vec::new(),
            has_default_export: false,
        }
    }

    /// Parse the source as a classic script.
    pub fn parse_script(self) -> Result<ParseOutput, ParseError> {
        self.parse_top_level(false)
    }

    /// Parse the source as a module: strict throughout, `import`/`export`
    /// accepted at the top level.
    pub fn parse_module(self) -> Result<ParseOutput, ParseError> {
        self.parse_top_level(true)
    }

    fn parse_top_level(mut self, module: bool) -> Result<ParseOutput, ParseError> {
        self.module = module;
        if module {
            self.arena = ScopeArena::new();
            let root = self.arena.push_root(ScopeKind::Module);
            self.current_scope = root;
            self.current_function_scope = root;
            self.fstate.strict = true;
            self.tokens.set_html_comments(false);
        }
        let mut body = Vec::new();
        let top_error = self.parse_source_elements(&mut body);
        match top_error {
            Ok(()) => {}
            Err(ParseError::TooDeepRecursion) if self.config.ide_mode => {
                let span = self.current_span();
                self.reporter.error("too deep parser recursion", span);
            }
            // IDE callers always get an AST; whatever stopped the top-level
            // loop becomes a diagnostic on the partial tree
            Err(err) if self.config.ide_mode => {
                if let ParseError::Lex(lex) = &err {
                    let offset = lex.offset();
                    let span = Span::new(offset, offset, self.tokens.last_line(), 0);
                    self.reporter.error(lex.to_string(), span);
                }
            }
            Err(err) => return Err(err),
        }
        self.check_end_flags();

        let end = self.tokens.last_end();
        let root_span = Span::new(0, end, self.config.start_line, 0);
        let root = Node::new(
            NodeKind::Program { body, module, strict: self.fstate.strict },
            root_span,
        );
        let lowerings = lower_program(&root, self.config.es2015());
        let errors = self.reporter.error_count();
        if errors > 0 && !self.config.recovering() {
            return Err(ParseError::SyntaxErrorCount { count: errors });
        }
        Ok(ParseOutput {
            root,
            strict: self.fstate.strict,
            module,
            comments: self.tokens.take_comments(),
            diagnostics: self.reporter.take_diagnostics(),
            lowerings,
        })
    }

    /// Top-level item loop with directive-prologue handling.
    fn parse_source_elements(&mut self, body: &mut Vec<Node>) -> ParseResult<()> {
        let mut in_prologue = true;
        loop {
            let tok = self.tokens.peek()?;
            if tok.kind == TokenKind::Eof {
                return Ok(());
            }
            if in_prologue && tok.kind == TokenKind::String {
                let tok = tok.clone();
                let stmt = self.parse_statement_recovering(StmtCtx::Default)?;
                if let Some(directive) = directive_text(&stmt, &tok) {
                    if directive == "use strict" {
                        self.fstate.strict = true;
                    }
                } else {
                    in_prologue = false;
                }
                body.push(stmt);
                continue;
            }
            in_prologue = false;
            let before = self.tokens.last_end();
            let stmt = self.parse_statement_recovering(StmtCtx::Default)?;
            body.push(stmt);
            self.ensure_progress(before)?;
        }
    }

    /// Warn about functions that sometimes return a value and sometimes fall
    /// off the end.
    pub(crate) fn check_end_flags(&mut self) {
        if self.fstate.saw_return_value && self.fstate.saw_return_bare {
            let span = self.current_span();
            self.reporter.warning("function does not consistently return a value", span);
        }
    }

    // ===== error plumbing =====

    /// Record a diagnostic and return the sentinel that unwinds the current
    /// production.
    pub(crate) fn error(&mut self, message: impl Into<String>, span: Span) -> ParseError {
        let message = message.into();
        self.reporter.error(&message, span);
        ParseError::syntax(message, span)
    }

    /// Record a diagnostic but keep parsing; for context-sensitive early
    /// errors where the phrase structure is intact.
    pub(crate) fn soft_error(&mut self, message: impl Into<String>, span: Span) {
        self.reporter.error(message.into(), span);
    }

    pub(crate) fn warning(&mut self, message: impl Into<String>, span: Span) {
        self.reporter.warning(message.into(), span);
    }

    pub(crate) fn check_recursion(&mut self) -> ParseResult<()> {
        self.recursion_depth += 1;
        if self.recursion_depth > MAX_RECURSION_DEPTH {
            return Err(ParseError::TooDeepRecursion);
        }
        Ok(())
    }

    pub(crate) fn exit_recursion(&mut self) {
        self.recursion_depth = self.recursion_depth.saturating_sub(1);
    }

    // ===== token helpers =====

    /// Consume the next token, rejecting escaped reserved words.
    pub(crate) fn next_token(&mut self) -> ParseResult<Token> {
        let tok = self.tokens.consume()?;
        if tok.had_escape && tok.kind.is_reserved_word() {
            let span = token_span(&tok);
            return Err(self.error("keyword must not contain escape sequences", span));
        }
        Ok(tok)
    }

    /// Consume the next token when it matches, otherwise report `message`.
    pub(crate) fn must_match(&mut self, kind: TokenKind, message: &str) -> ParseResult<Token> {
        if self.tokens.peek_kind()? == kind {
            self.next_token()
        } else {
            let span = self.peek_span()?;
            Err(self.error(message.to_string(), span))
        }
    }

    pub(crate) fn peek_span(&mut self) -> ParseResult<Span> {
        Ok(token_span(self.tokens.peek()?))
    }

    /// Zero-width span at the current position, for diagnostics that point
    /// between tokens.
    pub(crate) fn current_span(&mut self) -> Span {
        let end = self.tokens.last_end();
        let line = self.tokens.last_line();
        Span::new(end, end, line, 0)
    }

    /// Span from `start` to the end of the last consumed token.
    pub(crate) fn span_from(&self, start: Span) -> Span {
        Span {
            start: start.start,
            end: self.tokens.last_end().max(start.start),
            line: start.line,
            column: start.column,
        }
    }

    // ===== scope helpers =====

    pub(crate) fn push_scope(&mut self, kind: ScopeKind) -> ScopeId {
        let id = self.arena.push_child(self.current_scope, kind);
        trace!(?kind, "push scope");
        self.current_scope = id;
        if kind.is_function_scope() {
            self.current_function_scope = id;
        }
        id
    }

    pub(crate) fn pop_scope(&mut self) {
        if let Some(parent) = self.arena.parent(self.current_scope) {
            self.current_scope = parent;
            self.current_function_scope = self.arena.function_scope(parent);
        }
    }

    /// Record a binding; redeclaration faults become diagnostics. Returns the
    /// Annex-B skip-hoisting signal for function declarations.
    pub(crate) fn define_symbol(
        &mut self,
        kind: SymbolKind,
        name: &str,
        span: Span,
        is_generator: bool,
    ) -> bool {
        if name == "undefined" && !self.fstate.undefined_redefined {
            self.fstate.undefined_redefined = true;
            self.warning("redefining undefined", span);
        }
        let outcome = self.arena.define(
            self.current_scope,
            kind,
            name,
            is_generator,
            self.fstate.strict,
            self.config.in_eval,
        );
        match outcome {
            DefineOutcome::Defined { skip_hoist, warning } => {
                if let Some(message) = warning {
                    self.warning(message, span);
                }
                skip_hoist
            }
            DefineOutcome::Error { message } => {
                self.soft_error(message, span);
                false
            }
        }
    }

    // ===== statement recovery =====

    /// Parse one statement; on a structural error, resynchronize and leave an
    /// `Error` node. Only the recursion fault propagates.
    pub(crate) fn parse_statement_recovering(&mut self, ctx: StmtCtx) -> ParseResult<Node> {
        let start = self.peek_span()?;
        match self.parse_statement(ctx) {
            Ok(stmt) => Ok(stmt),
            Err(ParseError::TooDeepRecursion) => Err(ParseError::TooDeepRecursion),
            Err(err) => {
                if let ParseError::Lex(lex) = &err {
                    let offset = lex.offset();
                    let span = Span::new(offset, offset, start.line, 0);
                    self.reporter.error(lex.to_string(), span);
                }
                debug!(error = %err, "resynchronizing after statement error");
                self.resync();
                Ok(Node::new(
                    NodeKind::Error { message: err.to_string() },
                    self.span_from(start),
                ))
            }
        }
    }

    /// Skip ahead to a plausible statement boundary: past a `;`, or up to a
    /// `}`, end of input, or the first token on a fresh line.
    fn resync(&mut self) {
        loop {
            match self.tokens.peek() {
                Err(_) => {
                    // A scanner fault mid-recovery: drop the broken token
                    let _ = self.tokens.consume();
                }
                Ok(tok) => match tok.kind {
                    TokenKind::Semicolon => {
                        let _ = self.tokens.consume();
                        break;
                    }
                    TokenKind::RightBrace | TokenKind::Eof => break,
                    _ if tok.newline_before => break,
                    _ => {
                        let _ = self.tokens.consume();
                    }
                },
            }
        }
    }

    /// Statement loops must consume something every iteration; when an error
    /// node was produced without progress, drop one token.
    fn ensure_progress(&mut self, before: usize) -> ParseResult<()> {
        if self.tokens.last_end() == before && self.tokens.peek_kind()? != TokenKind::Eof {
            let _ = self.tokens.consume()?;
        }
        Ok(())
    }

    // ===== statements =====

    pub(crate) fn parse_statement(&mut self, ctx: StmtCtx) -> ParseResult<Node> {
        self.check_recursion()?;
        self.statement_nesting += 1;
        let result = self.parse_statement_inner(ctx);
        self.statement_nesting -= 1;
        self.exit_recursion();
        result
    }

    fn parse_statement_inner(&mut self, ctx: StmtCtx) -> ParseResult<Node> {
        let tok = self.tokens.peek()?.clone();
        trace!(kind = ?tok.kind, line = tok.line, "statement");
        match tok.kind {
            TokenKind::Semicolon => {
                let start = self.peek_span()?;
                self.next_token()?;
                Ok(Node::new(NodeKind::Empty, start))
            }
            TokenKind::LeftBrace => self.parse_block_statement(),
            TokenKind::Var => self.parse_variable_statement(VarKind::Var, ctx),
            TokenKind::Const => self.parse_lexical_statement(VarKind::Const, ctx),
            TokenKind::Let => self.parse_let_statement(ctx),
            TokenKind::If => self.parse_if_statement(),
            TokenKind::While => self.parse_while_statement(),
            TokenKind::Do => self.parse_do_statement(),
            TokenKind::For => self.parse_for_statement(),
            TokenKind::Switch => self.parse_switch_statement(),
            TokenKind::Try => self.parse_try_statement(),
            TokenKind::Throw => self.parse_throw_statement(),
            TokenKind::Return => self.parse_return_statement(),
            TokenKind::Break | TokenKind::Continue => self.parse_break_or_continue(),
            TokenKind::With => self.parse_with_statement(),
            TokenKind::Debugger => {
                let start = self.peek_span()?;
                self.next_token()?;
                self.eat_semicolon()?;
                Ok(Node::new(NodeKind::Debugger, self.span_from(start)))
            }
            TokenKind::Function => self.parse_function_statement(ctx, None),
            TokenKind::Class => {
                if ctx == StmtCtx::Single {
                    let span = self.peek_span()?;
                    return Err(self.error("class declaration not allowed here", span));
                }
                self.parse_class_declaration()
            }
            TokenKind::Import => self.parse_import_or_expression(ctx),
            TokenKind::Export => self.parse_export_declaration(),
            _ => self.parse_expression_or_labeled_statement(ctx),
        }
    }

    fn parse_block_statement(&mut self) -> ParseResult<Node> {
        let start = self.peek_span()?;
        self.must_match(TokenKind::LeftBrace, "missing { before block")?;
        self.push_scope(ScopeKind::Block);
        let mut statements = Vec::new();
        let result = self.parse_statement_list(&mut statements);
        self.pop_scope();
        result?;
        self.must_match(TokenKind::RightBrace, "missing } after block")?;
        Ok(Node::new(NodeKind::Block { statements }, self.span_from(start)))
    }

    /// Statement list up to (not including) a `}` or end of input, with
    /// per-statement recovery.
    pub(crate) fn parse_statement_list(&mut self, out: &mut Vec<Node>) -> ParseResult<()> {
        loop {
            let kind = self.tokens.peek_kind()?;
            if kind == TokenKind::RightBrace || kind == TokenKind::Eof {
                return Ok(());
            }
            let before = self.tokens.last_end();
            let stmt = self.parse_statement_recovering(StmtCtx::Default)?;
            out.push(stmt);
            self.ensure_progress(before)?;
        }
    }

    // ----- declarations -----

    fn parse_lexical_statement(&mut self, kind: VarKind, ctx: StmtCtx) -> ParseResult<Node> {
        if !self.config.es2015() {
            let span = self.peek_span()?;
            self.soft_error(format!("{kind} declarations require ES2015"), span);
        }
        if ctx == StmtCtx::Single {
            let span = self.peek_span()?;
            self.soft_error(
                format!("{kind} declaration not directly inside a statement"),
                span,
            );
        }
        self.parse_variable_statement(kind, ctx)
    }

    /// `let` at statement level: declaration or plain identifier, decided by
    /// the token after it.
    fn parse_let_statement(&mut self, ctx: StmtCtx) -> ParseResult<Node> {
        if self.fstate.strict {
            return self.parse_lexical_statement(VarKind::Let, ctx);
        }
        let let_tok = self.next_token()?;
        let next = self.tokens.peek()?.clone();
        if next.kind == TokenKind::Colon {
            return self.parse_labeled_statement(let_tok, ctx);
        }
        let is_declaration = match next.kind {
            // `let [` opens a destructuring declaration even across newlines
            TokenKind::LeftBracket => true,
            // `let` then a newline then `{` is ASI: identifier, then a block
            TokenKind::LeftBrace => !next.newline_before,
            k if is_binding_name_kind(k) => {
                !(ctx == StmtCtx::Single && next.newline_before)
            }
            _ => false,
        };
        if is_declaration {
            if ctx == StmtCtx::Single {
                let span = token_span(&let_tok);
                self.soft_error("let declaration not directly inside a statement", span);
            }
            if !self.config.es2015() {
                let span = token_span(&let_tok);
                self.soft_error("let declarations require ES2015", span);
            }
            self.parse_variable_tail(VarKind::Let, token_span(&let_tok))
        } else {
            // `let` is just a name here
            self.prebuilt = Some(Node::new(
                NodeKind::Identifier { name: "let".into() },
                token_span(&let_tok),
            ));
            self.parse_expression_or_labeled_statement(ctx)
        }
    }

    fn parse_variable_statement(&mut self, kind: VarKind, _ctx: StmtCtx) -> ParseResult<Node> {
        let start = self.peek_span()?;
        self.next_token()?; // var / const / let
        self.parse_variable_tail(kind, start)
    }

    /// Declarator list after the keyword, shared by statements and the `let`
    /// disambiguation path.
    fn parse_variable_tail(&mut self, kind: VarKind, start: Span) -> ParseResult<Node> {
        let jsdoc = self.tokens.take_jsdoc();
        let mut declarations = Vec::new();
        loop {
            declarations.push(self.parse_variable_declarator(kind)?);
            if !self.tokens.match_kind(TokenKind::Comma)? {
                break;
            }
        }
        self.eat_semicolon()?;
        Ok(Node::new(
            NodeKind::VariableDeclaration { kind, declarations },
            self.span_from(start),
        )
        .with_jsdoc(jsdoc))
    }

    pub(crate) fn parse_variable_declarator(&mut self, kind: VarKind) -> ParseResult<Node> {
        let start = self.peek_span()?;
        let id = self.parse_binding_target(kind_to_symbol(kind))?;
        let is_pattern = !id.is_identifier();
        let init = if self.tokens.match_kind(TokenKind::Assign)? {
            Some(Box::new(self.parse_assignment()?))
        } else {
            // For-head declarators legitimately omit the initializer; the
            // for parser re-checks the classic-for case
            if !self.no_in {
                if kind == VarKind::Const {
                    self.soft_error("const declaration requires an initializer", id.span);
                } else if is_pattern {
                    self.soft_error("destructuring declaration requires an initializer", id.span);
                }
            }
            None
        };
        Ok(Node::new(
            NodeKind::VariableDeclarator { id: Box::new(id), init },
            self.span_from(start),
        ))
    }

    // ----- control flow -----

    fn parse_if_statement(&mut self) -> ParseResult<Node> {
        let start = self.peek_span()?;
        self.next_token()?;
        self.must_match(TokenKind::LeftParen, "missing ( before condition")?;
        let condition = self.parse_expression()?;
        self.must_match(TokenKind::RightParen, "missing ) after condition")?;
        let consequent = self.parse_statement(StmtCtx::Single)?;
        let mut else_pos = None;
        let alternate = if self.tokens.peek_kind()? == TokenKind::Else {
            let else_tok = self.next_token()?;
            else_pos = Some(else_tok.start);
            Some(Box::new(self.parse_statement(StmtCtx::Single)?))
        } else {
            None
        };
        Ok(Node::new(
            NodeKind::If {
                condition: Box::new(condition),
                consequent: Box::new(consequent),
                alternate,
                else_pos,
            },
            self.span_from(start),
        ))
    }

    fn parse_while_statement(&mut self) -> ParseResult<Node> {
        let start = self.peek_span()?;
        self.next_token()?;
        self.must_match(TokenKind::LeftParen, "missing ( before condition")?;
        let condition = self.parse_expression()?;
        self.must_match(TokenKind::RightParen, "missing ) after condition")?;
        let body = self.parse_loop_body()?;
        Ok(Node::new(
            NodeKind::While { condition: Box::new(condition), body: Box::new(body) },
            self.span_from(start),
        ))
    }

    fn parse_do_statement(&mut self) -> ParseResult<Node> {
        let start = self.peek_span()?;
        self.next_token()?;
        let body = self.parse_loop_body()?;
        self.must_match(TokenKind::While, "missing while after do body")?;
        self.must_match(TokenKind::LeftParen, "missing ( before condition")?;
        let condition = self.parse_expression()?;
        self.must_match(TokenKind::RightParen, "missing ) after condition")?;
        // A semicolon is always inserted after do-while
        self.tokens.match_kind(TokenKind::Semicolon)?;
        Ok(Node::new(
            NodeKind::DoWhile { body: Box::new(body), condition: Box::new(condition) },
            self.span_from(start),
        ))
    }

    fn parse_loop_body(&mut self) -> ParseResult<Node> {
        self.fstate.loop_depth += 1;
        let body = self.parse_statement(StmtCtx::Single);
        self.fstate.loop_depth -= 1;
        body
    }

    fn parse_with_statement(&mut self) -> ParseResult<Node> {
        let start = self.peek_span()?;
        if self.fstate.strict {
            self.soft_error("with statements are not allowed in strict mode", start);
        }
        self.next_token()?;
        self.must_match(TokenKind::LeftParen, "missing ( before with object")?;
        let object = self.parse_expression()?;
        self.must_match(TokenKind::RightParen, "missing ) after with object")?;
        let body = self.parse_statement(StmtCtx::Single)?;
        Ok(Node::new(
            NodeKind::With { object: Box::new(object), body: Box::new(body) },
            self.span_from(start),
        ))
    }

    fn parse_switch_statement(&mut self) -> ParseResult<Node> {
        let start = self.peek_span()?;
        self.next_token()?;
        self.must_match(TokenKind::LeftParen, "missing ( before switch expression")?;
        let discriminant = self.parse_expression()?;
        self.must_match(TokenKind::RightParen, "missing ) after switch expression")?;
        self.must_match(TokenKind::LeftBrace, "missing { before switch body")?;
        self.push_scope(ScopeKind::Switch);
        self.fstate.switch_depth += 1;
        let result = self.parse_switch_cases();
        self.fstate.switch_depth -= 1;
        self.pop_scope();
        let cases = result?;
        self.must_match(TokenKind::RightBrace, "missing } after switch body")?;
        Ok(Node::new(
            NodeKind::Switch { discriminant: Box::new(discriminant), cases },
            self.span_from(start),
        ))
    }

    fn parse_switch_cases(&mut self) -> ParseResult<Vec<Node>> {
        let mut cases = Vec::new();
        let mut saw_default = false;
        loop {
            let tok = self.tokens.peek()?.clone();
            let case_start = token_span(&tok);
            let test = match tok.kind {
                TokenKind::RightBrace | TokenKind::Eof => break,
                TokenKind::Case => {
                    self.next_token()?;
                    let test = self.parse_expression()?;
                    Some(Box::new(test))
                }
                TokenKind::Default => {
                    self.next_token()?;
                    if saw_default {
                        self.soft_error("double default label in switch", case_start);
                    }
                    saw_default = true;
                    None
                }
                _ => {
                    return Err(self.error("invalid switch case", case_start));
                }
            };
            self.must_match(TokenKind::Colon, "missing : after case expression")?;
            let mut body = Vec::new();
            loop {
                let kind = self.tokens.peek_kind()?;
                if matches!(
                    kind,
                    TokenKind::Case | TokenKind::Default | TokenKind::RightBrace | TokenKind::Eof
                ) {
                    break;
                }
                let before = self.tokens.last_end();
                body.push(self.parse_statement_recovering(StmtCtx::Default)?);
                self.ensure_progress(before)?;
            }
            cases.push(Node::new(
                NodeKind::SwitchCase { test, body },
                self.span_from(case_start),
            ));
        }
        Ok(cases)
    }

    fn parse_try_statement(&mut self) -> ParseResult<Node> {
        let start = self.peek_span()?;
        self.next_token()?;
        if self.tokens.peek_kind()? != TokenKind::LeftBrace {
            let span = self.peek_span()?;
            return Err(self.error("missing { before try block", span));
        }
        let block = self.parse_block_statement()?;
        let mut handler = None;
        if self.tokens.peek_kind()? == TokenKind::Catch {
            handler = Some(Box::new(self.parse_catch_clause()?));
        }
        let finalizer = if self.tokens.match_kind(TokenKind::Finally)? {
            if self.tokens.peek_kind()? != TokenKind::LeftBrace {
                let span = self.peek_span()?;
                return Err(self.error("missing { before finally block", span));
            }
            Some(Box::new(self.parse_block_statement()?))
        } else {
            None
        };
        if handler.is_none() && finalizer.is_none() {
            let span = self.current_span();
            self.soft_error("try without catch or finally", span);
        }
        Ok(Node::new(
            NodeKind::Try { block: Box::new(block), handler, finalizer },
            self.span_from(start),
        ))
    }

    fn parse_catch_clause(&mut self) -> ParseResult<Node> {
        let start = self.peek_span()?;
        self.next_token()?; // catch
        self.push_scope(ScopeKind::Catch);
        let result = self.parse_catch_clause_inner(start);
        self.pop_scope();
        result
    }

    fn parse_catch_clause_inner(&mut self, start: Span) -> ParseResult<Node> {
        let param = if self.tokens.match_kind(TokenKind::LeftParen)? {
            let pattern = self.parse_binding_target(SymbolKind::CatchParam)?;
            if let Some(name) = pattern.identifier_name() {
                self.arena.set_catch_param(self.current_scope, name);
            }
            self.must_match(TokenKind::RightParen, "missing ) after catch parameter")?;
            Some(Box::new(pattern))
        } else {
            // Optional catch binding
            if !self.config.version.at_least(EcmaVersion::Es2019) {
                let span = self.peek_span()?;
                self.soft_error("catch without a binding requires ES2019", span);
            }
            None
        };
        self.must_match(TokenKind::LeftBrace, "missing { before catch block")?;
        let block_start = self.current_span();
        let mut statements = Vec::new();
        // The catch scope spans the parameter and the body; no extra block
        self.parse_statement_list(&mut statements)?;
        self.must_match(TokenKind::RightBrace, "missing } after catch block")?;
        let body = Node::new(NodeKind::Block { statements }, self.span_from(block_start));
        Ok(Node::new(
            NodeKind::CatchClause { param, body: Box::new(body) },
            self.span_from(start),
        ))
    }

    fn parse_throw_statement(&mut self) -> ParseResult<Node> {
        let start = self.peek_span()?;
        self.next_token()?;
        if self.tokens.peek_or_eol()? == TokenKind::Eol {
            let span = self.current_span();
            return Err(self.error("throw requires an expression on the same line", span));
        }
        let argument = self.parse_expression()?;
        self.eat_semicolon()?;
        Ok(Node::new(
            NodeKind::Throw { argument: Box::new(argument) },
            self.span_from(start),
        ))
    }

    fn parse_return_statement(&mut self) -> ParseResult<Node> {
        let start = self.peek_span()?;
        if !self.fstate.in_function {
            self.soft_error("return outside of a function", start);
        }
        self.next_token()?;
        let argument = match self.tokens.peek_or_eol()? {
            TokenKind::Eol | TokenKind::Semicolon | TokenKind::RightBrace | TokenKind::Eof => {
                self.fstate.saw_return_bare = true;
                None
            }
            _ => {
                self.fstate.saw_return_value = true;
                Some(Box::new(self.parse_expression()?))
            }
        };
        self.eat_semicolon()?;
        Ok(Node::new(NodeKind::Return { argument }, self.span_from(start)))
    }

    fn parse_break_or_continue(&mut self) -> ParseResult<Node> {
        let keyword = self.next_token()?;
        let start = token_span(&keyword);
        let is_break = keyword.kind == TokenKind::Break;
        let label = match self.tokens.peek_or_eol()? {
            k if is_binding_name_kind(k) => {
                let tok = self.tokens.consume()?;
                let name = tok.name().to_string();
                let span = token_span(&tok);
                match self.fstate.labels.get(&name) {
                    None => {
                        self.soft_error(format!("undefined label \"{name}\""), span);
                    }
                    Some(&labels_loop) => {
                        if !is_break && !labels_loop {
                            self.soft_error(
                                format!("continue label \"{name}\" does not name a loop"),
                                span,
                            );
                        }
                    }
                }
                Some(Box::new(Node::new(NodeKind::Identifier { name }, span)))
            }
            _ => {
                if is_break {
                    if self.fstate.loop_depth == 0 && self.fstate.switch_depth == 0 {
                        self.soft_error("break outside of loop or switch", start);
                    }
                } else if self.fstate.loop_depth == 0 {
                    self.soft_error("continue outside of loop", start);
                }
                None
            }
        };
        self.eat_semicolon()?;
        let kind = if is_break {
            NodeKind::Break { label }
        } else {
            NodeKind::Continue { label }
        };
        Ok(Node::new(kind, self.span_from(start)))
    }

    // ----- for statements -----

    fn parse_for_statement(&mut self) -> ParseResult<Node> {
        let start = self.peek_span()?;
        self.next_token()?;
        self.must_match(TokenKind::LeftParen, "missing ( after for")?;
        self.push_scope(ScopeKind::ForHead);
        let result = self.parse_for_inner(start);
        self.pop_scope();
        result
    }

    fn parse_for_inner(&mut self, start: Span) -> ParseResult<Node> {
        let tok = self.tokens.peek()?.clone();
        match tok.kind {
            TokenKind::Semicolon => {
                self.next_token()?;
                self.parse_classic_for_tail(start, None)
            }
            TokenKind::Var | TokenKind::Const => {
                let kind = if tok.kind == TokenKind::Var { VarKind::Var } else { VarKind::Const };
                self.next_token()?;
                self.parse_for_declaration(start, kind, token_span(&tok))
            }
            TokenKind::Let => {
                self.next_token()?;
                let next = self.tokens.peek()?.clone();
                let is_declaration = matches!(next.kind, TokenKind::LeftBracket | TokenKind::LeftBrace)
                    || is_binding_name_kind(next.kind);
                if is_declaration {
                    self.parse_for_declaration(start, VarKind::Let, token_span(&tok))
                } else {
                    if self.fstate.strict {
                        self.soft_error("let is a reserved identifier in strict mode", token_span(&tok));
                    }
                    self.prebuilt = Some(Node::new(
                        NodeKind::Identifier { name: "let".into() },
                        token_span(&tok),
                    ));
                    self.parse_for_expression_head(start)
                }
            }
            _ => self.parse_for_expression_head(start),
        }
    }

    /// `for (<kind> declarator ...)` — classic, for-in, or for-of.
    fn parse_for_declaration(
        &mut self,
        start: Span,
        kind: VarKind,
        kw_span: Span,
    ) -> ParseResult<Node> {
        if kind.is_lexical() && !self.config.es2015() {
            self.soft_error(format!("{kind} declarations require ES2015"), kw_span);
        }
        let saved_no_in = std::mem::replace(&mut self.no_in, true);
        let first = self.parse_variable_declarator(kind);
        self.no_in = saved_no_in;
        let first = first?;

        let next = self.tokens.peek()?.clone();
        if next.kind == TokenKind::In || is_of_keyword(&next) {
            let is_of = next.kind != TokenKind::In;
            let has_init = matches!(&first.kind, NodeKind::VariableDeclarator { init: Some(_), .. });
            let is_pattern = matches!(
                &first.kind,
                NodeKind::VariableDeclarator { id, .. } if !id.is_identifier()
            );
            if has_init {
                // Annex B tolerates `for (var a = 0 in b)` in sloppy scripts
                let tolerated =
                    !is_of && kind == VarKind::Var && !self.fstate.strict && !is_pattern;
                if !tolerated {
                    self.soft_error(
                        format!(
                            "for-{} loop declaration may not have an initializer",
                            if is_of { "of" } else { "in" }
                        ),
                        first.span,
                    );
                }
            }
            self.next_token()?; // in / of
            let decl_span = self.span_from(kw_span);
            let left = Node::new(
                NodeKind::VariableDeclaration { kind, declarations: vec![first] },
                decl_span,
            );
            return self.parse_for_in_of_tail(start, left, is_of);
        }

        // Classic for: the remaining declarators
        let mut declarations = vec![first];
        while self.tokens.match_kind(TokenKind::Comma)? {
            let saved = std::mem::replace(&mut self.no_in, true);
            let decl = self.parse_variable_declarator(kind);
            self.no_in = saved;
            declarations.push(decl?);
        }
        // In a classic head the usual initializer rules apply after all
        for decl in &declarations {
            if let NodeKind::VariableDeclarator { id, init: None } = &decl.kind {
                if kind == VarKind::Const {
                    self.soft_error("const declaration requires an initializer", id.span);
                } else if !id.is_identifier() {
                    self.soft_error("destructuring declaration requires an initializer", id.span);
                }
            }
        }
        self.must_match(TokenKind::Semicolon, "missing ; after for-loop initializer")?;
        let init = Node::new(
            NodeKind::VariableDeclaration { kind, declarations },
            self.span_from(kw_span),
        );
        self.parse_classic_for_tail(start, Some(init))
    }

    /// Expression-first `for` head: classic, or destructuring for-in/for-of.
    fn parse_for_expression_head(&mut self, start: Span) -> ParseResult<Node> {
        let saved_no_in = std::mem::replace(&mut self.no_in, true);
        let expr = self.parse_expression();
        self.no_in = saved_no_in;
        let expr = expr?;

        let next = self.tokens.peek()?.clone();
        if next.kind == TokenKind::In || is_of_keyword(&next) {
            let is_of = next.kind != TokenKind::In;
            self.next_token()?;
            let left = self.to_assignment_target_root(expr)?;
            return self.parse_for_in_of_tail(start, left, is_of);
        }
        self.must_match(TokenKind::Semicolon, "missing ; after for-loop initializer")?;
        self.parse_classic_for_tail(start, Some(expr))
    }

    fn parse_classic_for_tail(&mut self, start: Span, init: Option<Node>) -> ParseResult<Node> {
        let test = if self.tokens.peek_kind()? == TokenKind::Semicolon {
            None
        } else {
            Some(Box::new(self.parse_expression()?))
        };
        self.must_match(TokenKind::Semicolon, "missing ; after for-loop condition")?;
        let update = if self.tokens.peek_kind()? == TokenKind::RightParen {
            None
        } else {
            Some(Box::new(self.parse_expression()?))
        };
        self.must_match(TokenKind::RightParen, "missing ) after for-loop control")?;
        let body = self.parse_loop_body()?;
        Ok(Node::new(
            NodeKind::For {
                init: init.map(Box::new),
                test,
                update,
                body: Box::new(body),
            },
            self.span_from(start),
        ))
    }

    fn parse_for_in_of_tail(&mut self, start: Span, left: Node, is_of: bool) -> ParseResult<Node> {
        if is_of && !self.config.es2015() {
            self.soft_error("for-of loops require ES2015", left.span);
        }
        let right = if is_of {
            self.parse_assignment()?
        } else {
            self.parse_expression()?
        };
        self.must_match(TokenKind::RightParen, "missing ) after for-loop control")?;
        let body = self.parse_loop_body()?;
        let kind = if is_of {
            NodeKind::ForOf {
                left: Box::new(left),
                right: Box::new(right),
                body: Box::new(body),
            }
        } else {
            NodeKind::ForIn {
                left: Box::new(left),
                right: Box::new(right),
                body: Box::new(body),
            }
        };
        Ok(Node::new(kind, self.span_from(start)))
    }

    // ----- expression / labeled statements -----

    /// Handles labels (`name:`), the `async` statement-level forms, and plain
    /// expression statements.
    fn parse_expression_or_labeled_statement(&mut self, ctx: StmtCtx) -> ParseResult<Node> {
        let tok = self.tokens.peek()?.clone();
        let label_candidate = self.prebuilt.is_none()
            && match tok.kind {
                TokenKind::Identifier => true,
                TokenKind::Yield => !self.fstate.is_generator && !self.fstate.strict,
                TokenKind::Await => !self.fstate.is_async && !self.module,
                _ => false,
            };
        if label_candidate {
            let name_tok = self.tokens.consume()?;
            if self.tokens.peek_kind()? == TokenKind::Colon {
                return self.parse_labeled_statement(name_tok, ctx);
            }
            if name_tok.kind == TokenKind::Identifier
                && &*name_tok.text == "async"
                && !name_tok.had_escape
                && self.tokens.peek_kind()? == TokenKind::Function
                && !self.tokens.peek_newline_before()?
            {
                // `async function` declaration
                return self.parse_function_statement(ctx, Some(name_tok));
            }
            // Re-enter expression parsing with the consumed name
            let span = token_span(&name_tok);
            self.check_reference_name(name_tok.name(), span, name_tok.kind);
            let first = if name_tok.kind == TokenKind::Identifier
                && &*name_tok.text == "async"
                && !name_tok.had_escape
            {
                self.parse_async_tail(name_tok)?
            } else {
                self.prebuilt = Some(Node::new(
                    NodeKind::Identifier { name: name_tok.name().to_string() },
                    span,
                ));
                self.parse_assignment()?
            };
            return self.finish_expression_statement(first, span);
        }
        let start = match &self.prebuilt {
            Some(node) => node.span,
            None => self.peek_span()?,
        };
        let first = self.parse_assignment()?;
        self.finish_expression_statement(first, start)
    }

    /// Comma tail, useless-expression warning, cover flush, and ASI.
    fn finish_expression_statement(&mut self, first: Node, start: Span) -> ParseResult<Node> {
        let expression = if self.tokens.peek_kind()? == TokenKind::Comma {
            let mut expressions = vec![first];
            while self.tokens.match_kind(TokenKind::Comma)? {
                expressions.push(self.parse_assignment()?);
            }
            Node::new(NodeKind::Sequence { expressions }, self.span_from(start))
        } else {
            first
        };
        if let Some(span) = self.pending_cover.take() {
            return Err(self.error("invalid property initializer outside destructuring", span));
        }
        if is_side_effect_free(&expression) {
            self.warning("statement has no side effects", expression.span);
        }
        self.eat_semicolon()?;
        Ok(Node::new(
            NodeKind::ExpressionStatement { expression: Box::new(expression) },
            self.span_from(start),
        ))
    }

    /// One or more labels, then the labeled statement.
    fn parse_labeled_statement(&mut self, first: Token, _ctx: StmtCtx) -> ParseResult<Node> {
        let start = token_span(&first);
        let mut chain: Vec<(String, Span)> = Vec::new();
        let mut name_tok = first;
        let mut pending: Option<Token> = None;
        loop {
            let name = name_tok.name().to_string();
            let span = token_span(&name_tok);
            self.must_match(TokenKind::Colon, "missing : after label")?;
            if self.fstate.labels.contains_key(&name) || chain.iter().any(|(n, _)| *n == name) {
                self.soft_error(format!("duplicate label \"{name}\""), span);
            }
            chain.push((name, span));
            let next = self.tokens.peek()?.clone();
            let another_label = match next.kind {
                TokenKind::Identifier => true,
                TokenKind::Yield => !self.fstate.is_generator && !self.fstate.strict,
                TokenKind::Await => !self.fstate.is_async && !self.module,
                _ => false,
            };
            if another_label {
                let candidate = self.tokens.consume()?;
                if self.tokens.peek_kind()? == TokenKind::Colon {
                    name_tok = candidate;
                    continue;
                }
                // Not a label after all: the body starts with this identifier
                pending = Some(candidate);
            }
            break;
        }
        let body_kind = self.tokens.peek_kind()?;
        let labels_loop = pending.is_none()
            && matches!(body_kind, TokenKind::While | TokenKind::Do | TokenKind::For);
        if body_kind == TokenKind::Function && self.fstate.strict && pending.is_none() {
            let span = self.peek_span()?;
            self.soft_error("functions may not be labeled in strict mode", span);
        }
        for (name, _) in &chain {
            self.fstate.labels.insert(name.clone(), labels_loop);
        }
        let body = match pending.take() {
            Some(tok) => {
                // Body is an expression statement beginning with `tok`
                let expr_start = token_span(&tok);
                self.check_reference_name(tok.name(), expr_start, tok.kind);
                let first = if tok.kind == TokenKind::Identifier
                    && &*tok.text == "async"
                    && !tok.had_escape
                {
                    self.parse_async_tail(tok)
                } else {
                    self.prebuilt = Some(Node::new(
                        NodeKind::Identifier { name: tok.name().to_string() },
                        expr_start,
                    ));
                    self.parse_assignment()
                };
                first.and_then(|first| self.finish_expression_statement(first, expr_start))
            }
            None => self.parse_statement(StmtCtx::Single),
        };
        for (name, _) in &chain {
            self.fstate.labels.remove(name);
        }
        let body = body?;
        // Innermost label closest to the statement
        let mut node = body;
        for (name, span) in chain.into_iter().rev() {
            let label = Node::new(NodeKind::Identifier { name }, span);
            let whole = self.span_from(start);
            node = Node::new(
                NodeKind::Labeled { label: Box::new(label), body: Box::new(node) },
                whole,
            );
        }
        Ok(node)
    }

    // ----- ASI -----

    /// Automatic semicolon insertion at a statement end: a real `;`, or a
    /// virtual one before `}`, at end of input, or at a line break.
    pub(crate) fn eat_semicolon(&mut self) -> ParseResult<()> {
        let tok = self.tokens.peek()?;
        match tok.kind {
            TokenKind::Semicolon => {
                self.tokens.consume()?;
                Ok(())
            }
            TokenKind::RightBrace | TokenKind::Eof => Ok(()),
            _ if tok.newline_before => {
                let span = self.current_span();
                self.warning("missing ; after statement", span);
                Ok(())
            }
            _ => {
                let span = token_span(tok);
                let text = tok.text.to_string();
                Err(self.error(format!("missing ; before \"{text}\""), span))
            }
        }
    }

    // ----- shared name checks -----

    /// Validate a name used as a reference (read/write of an identifier).
    pub(crate) fn check_reference_name(&mut self, name: &str, span: Span, kind: TokenKind) {
        match kind {
            TokenKind::Yield => {
                if self.fstate.strict {
                    self.soft_error("yield is a reserved identifier in strict mode", span);
                }
            }
            TokenKind::Await => {
                if self.module && !self.fstate.in_function {
                    self.soft_error("await is reserved at module top level", span);
                }
            }
            TokenKind::Let => {
                if self.fstate.strict {
                    self.soft_error("let is a reserved identifier in strict mode", span);
                }
            }
            _ => {
                if self.fstate.strict
                    && (ecma_token::STRICT_RESERVED.contains(name) || name == "let" || name == "yield")
                {
                    self.soft_error(
                        format!("\"{name}\" is a reserved identifier in strict mode"),
                        span,
                    );
                }
            }
        }
    }

    /// Validate a name introduced by a binding.
    pub(crate) fn check_binding_name(&mut self, name: &str, span: Span, lexical: bool) {
        if self.fstate.strict {
            if name == "eval" || name == "arguments" {
                self.soft_error(
                    format!("\"{name}\" may not be bound in strict mode"),
                    span,
                );
            }
            if ecma_token::STRICT_RESERVED.contains(name) || name == "yield" {
                self.soft_error(
                    format!("\"{name}\" is a reserved identifier in strict mode"),
                    span,
                );
            }
        }
        if lexical && name == "let" {
            self.soft_error("let may not be the name of a lexical declaration", span);
        }
        if name == "yield" && self.fstate.is_generator {
            self.soft_error("yield may not be bound inside a generator", span);
        }
        if name == "await" && (self.fstate.is_async || self.module && !self.fstate.in_function) {
            self.soft_error("await may not be bound here", span);
        }
    }
}

// ===== free helpers =====

pub(crate) fn token_span(tok: &Token) -> Span {
    Span::new(tok.start, tok.end, tok.line, tok.column)
}

/// Kinds that can carry a binding name once context is applied.
pub(crate) fn is_binding_name_kind(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Identifier | TokenKind::Let | TokenKind::Yield | TokenKind::Await
    )
}

/// The contextual `of` keyword in a for head: spelled plainly, no escapes.
pub(crate) fn is_of_keyword(tok: &Token) -> bool {
    tok.kind == TokenKind::Identifier && &*tok.text == "of" && !tok.had_escape
}

pub(crate) fn kind_to_symbol(kind: VarKind) -> SymbolKind {
    match kind {
        VarKind::Var => SymbolKind::Var,
        VarKind::Let => SymbolKind::Let,
        VarKind::Const => SymbolKind::Const,
    }
}

/// Directive prologue membership: an expression statement that is exactly one
/// string literal token.
fn directive_text(stmt: &Node, tok: &Token) -> Option<String> {
    let NodeKind::ExpressionStatement { expression } = &stmt.kind else {
        return None;
    };
    let NodeKind::StringLiteral { .. } = &expression.kind else {
        return None;
    };
    if expression.span.start != tok.start || expression.span.end != tok.end {
        return None;
    }
    // Escape sequences disqualify a directive; use the raw text
    let raw = &tok.text;
    if raw.len() < 2 {
        return None;
    }
    let inner = &raw[1..raw.len() - 1];
    if inner.contains('\\') {
        return None;
    }
    Some(inner.to_string())
}

/// Shallow side-effect check backing the "useless expression" warning.
fn is_side_effect_free(node: &Node) -> bool {
    matches!(
        node.kind,
        NodeKind::Identifier { .. }
            | NodeKind::NumberLiteral { .. }
            | NodeKind::BigIntLiteral { .. }
            | NodeKind::BooleanLiteral { .. }
            | NodeKind::NullLiteral
            | NodeKind::RegexLiteral { .. }
            | NodeKind::This
    )
}

#[cfg(test)]
mod tests;
