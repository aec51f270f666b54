//! Function, method, arrow, and class parsing.
//!
//! Every function-like body runs under a fresh [`FunctionState`] snapshot and
//! its own function scope; arrows inherit the `this`-adjacent permissions
//! (`super`, `new.target`) from the enclosing state. Parameter names are
//! recorded for the retroactive strict-mode checks a late `"use strict"`
//! directive triggers.

use super::{directive_text, is_binding_name_kind, token_span, FunctionState, Parser, StmtCtx};
use crate::config::EcmaVersion;
use crate::scope::{ScopeKind, SymbolKind};
use ecma_ast::{MethodKind, Node, NodeKind, Span};
use ecma_error::ParseResult;
use ecma_token::{Token, TokenKind};
use rustc_hash::FxHashSet;

impl<'a> Parser<'a> {
    // ===== function declarations and expressions =====

    /// `function` declaration statement, with an optional already-consumed
    /// `async` token.
    pub(crate) fn parse_function_statement(
        &mut self,
        ctx: StmtCtx,
        async_tok: Option<Token>,
    ) -> ParseResult<Node> {
        self.parse_function_declaration_ex(ctx, async_tok, false)
    }

    /// Function declaration; `anonymous_ok` is the `export default` case,
    /// which binds `*default*` when no name is written.
    pub(crate) fn parse_function_declaration_ex(
        &mut self,
        ctx: StmtCtx,
        async_tok: Option<Token>,
        anonymous_ok: bool,
    ) -> ParseResult<Node> {
        let jsdoc = self.tokens.take_jsdoc();
        let is_async = async_tok.is_some();
        let start = match &async_tok {
            Some(tok) => token_span(tok),
            None => self.peek_span()?,
        };
        self.must_match(TokenKind::Function, "missing function keyword")?;
        let is_generator = self.tokens.match_kind(TokenKind::Star)?;
        self.check_function_version(start, is_async, is_generator);
        if ctx == StmtCtx::Single {
            if self.fstate.strict {
                self.soft_error(
                    "function declarations are not allowed in this position in strict mode",
                    start,
                );
            } else if is_generator || is_async {
                self.soft_error(
                    "generator and async declarations are not allowed in this position",
                    start,
                );
            }
        }

        let (name_node, name_info) = if is_binding_name_kind(self.tokens.peek_kind()?) {
            let tok = self.tokens.consume()?;
            let span = token_span(&tok);
            let name = tok.name().to_string();
            self.check_binding_name(&name, span, false);
            self.define_symbol(SymbolKind::Function, &name, span, is_generator);
            (
                Some(Node::new(NodeKind::Identifier { name: name.clone() }, span)),
                Some((name, span)),
            )
        } else if anonymous_ok {
            // Anonymous default export gets the internal *default* binding
            self.define_symbol(SymbolKind::Function, "*default*", start, is_generator);
            (None, None)
        } else {
            let span = self.peek_span()?;
            return Err(self.error("function statement requires a name", span));
        };

        self.parse_function_common(
            start, name_node, name_info, is_async, is_generator, false, false, false, jsdoc,
        )
    }

    /// Function expression, the `function` keyword peeked.
    pub(crate) fn parse_function_expression_tail(
        &mut self,
        start: Span,
        is_async: bool,
    ) -> ParseResult<Node> {
        self.must_match(TokenKind::Function, "missing function keyword")?;
        let is_generator = self.tokens.match_kind(TokenKind::Star)?;
        self.check_function_version(start, is_async, is_generator);
        let (name_node, name_info) = if is_binding_name_kind(self.tokens.peek_kind()?) {
            let tok = self.tokens.consume()?;
            let span = token_span(&tok);
            let name = tok.name().to_string();
            self.check_binding_name(&name, span, false);
            (
                Some(Node::new(NodeKind::Identifier { name: name.clone() }, span)),
                Some((name, span)),
            )
        } else {
            (None, None)
        };
        self.parse_function_common(
            start, name_node, name_info, is_async, is_generator, true, false, false, None,
        )
    }

    fn check_function_version(&mut self, span: Span, is_async: bool, is_generator: bool) {
        if is_generator && !self.config.es2015() {
            self.soft_error("generators require ES2015", span);
        }
        if is_async && !self.config.version.at_least(EcmaVersion::Es2017) {
            self.soft_error("async functions require ES2017", span);
        }
        if is_async && is_generator && !self.config.version.at_least(EcmaVersion::Es2018) {
            self.soft_error("async generators require ES2018", span);
        }
    }

    /// Shared tail: parameters, body, state bookkeeping. The caller has
    /// handled the keywords and the name.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn parse_function_common(
        &mut self,
        start: Span,
        name: Option<Node>,
        name_info: Option<(String, Span)>,
        is_async: bool,
        is_generator: bool,
        is_expression: bool,
        allow_super_property: bool,
        allow_super_call: bool,
        jsdoc: Option<Box<str>>,
    ) -> ParseResult<Node> {
        let mut fs = FunctionState::top_level(self.fstate.strict);
        fs.in_function = true;
        fs.allow_new_target = true;
        fs.is_async = is_async;
        fs.is_generator = is_generator;
        fs.allow_super_property = allow_super_property;
        fs.allow_super_call = allow_super_call;
        fs.name_span = name_info.clone();
        let saved_state = std::mem::replace(&mut self.fstate, fs);
        let saved_scope = self.current_scope;
        let saved_fscope = self.current_function_scope;
        self.push_scope(ScopeKind::Function);

        // A function expression's name is visible only inside itself
        if is_expression {
            if let Some((n, s)) = &name_info {
                self.define_symbol(SymbolKind::Function, n, *s, is_generator);
            }
        }

        let result = self.parse_params_and_body();
        // Restore directly: an error may have left inner scopes unpopped
        self.current_scope = saved_scope;
        self.current_function_scope = saved_fscope;
        self.fstate = saved_state;
        let (params, params_trailing_comma, body) = result?;

        Ok(Node::new(
            NodeKind::Function {
                name: name.map(Box::new),
                params,
                body: Box::new(body),
                is_async,
                is_generator,
                is_expression,
                params_trailing_comma,
            },
            self.span_from(start),
        )
        .with_jsdoc(jsdoc))
    }

    fn parse_params_and_body(&mut self) -> ParseResult<(Vec<Node>, bool, Node)> {
        self.fstate.in_params = true;
        let params_result = self.parse_params();
        self.fstate.in_params = false;
        let (params, trailing) = params_result?;
        self.define_params(&params, false, false);
        let body = self.parse_function_body_block()?;
        self.check_end_flags();
        Ok((params, trailing, body))
    }

    /// Formal parameter list between parentheses.
    fn parse_params(&mut self) -> ParseResult<(Vec<Node>, bool)> {
        self.must_match(TokenKind::LeftParen, "missing ( before function parameters")?;
        let mut params = Vec::new();
        let mut trailing = false;
        loop {
            match self.tokens.peek_kind()? {
                TokenKind::RightParen => break,
                TokenKind::DotDotDot => {
                    let rest_tok = self.next_token()?;
                    if !self.config.es2015() {
                        self.soft_error("rest parameters require ES2015", token_span(&rest_tok));
                    }
                    let argument = self.parse_binding_target(SymbolKind::Param)?;
                    let span = token_span(&rest_tok).to(argument.span);
                    if self.tokens.peek_kind()? == TokenKind::Assign {
                        self.soft_error("rest parameter may not have a default", span);
                        self.next_token()?;
                        let _ = self.parse_assignment()?;
                    }
                    params.push(Node::new(
                        NodeKind::RestElement { argument: Box::new(argument) },
                        span,
                    ));
                    if self.tokens.match_kind(TokenKind::Comma)? {
                        self.soft_error("rest parameter must be last", span);
                        continue;
                    }
                    break;
                }
                _ => {
                    let target = self.parse_binding_target(SymbolKind::Param)?;
                    let param = if self.tokens.peek_kind()? == TokenKind::Assign {
                        if !self.config.es2015() {
                            self.soft_error("default parameters require ES2015", target.span);
                        }
                        self.maybe_default(target)?
                    } else {
                        target
                    };
                    params.push(param);
                    if self.tokens.match_kind(TokenKind::Comma)? {
                        if self.tokens.peek_kind()? == TokenKind::RightParen {
                            trailing = true;
                            if !self.config.version.at_least(EcmaVersion::Es2017) {
                                let span = self.current_span();
                                self.soft_error(
                                    "trailing comma in parameters requires ES2017",
                                    span,
                                );
                            }
                            break;
                        }
                        continue;
                    }
                    break;
                }
            }
        }
        self.must_match(TokenKind::RightParen, "missing ) after function parameters")?;
        Ok((params, trailing))
    }

    /// Record parameter facts and run the duplicate checks.
    ///
    /// `converted` marks arrow parameters recovered from the cover grammar:
    /// their names were never bound during parsing, so they are validated and
    /// defined here. `force_unique` is the arrow rule — duplicates are errors
    /// even for simple sloppy lists.
    pub(crate) fn define_params(&mut self, params: &[Node], converted: bool, force_unique: bool) {
        let mut names: Vec<(String, Span)> = Vec::new();
        let mut simple = true;
        for param in params {
            if !param.is_identifier() {
                simple = false;
            }
            collect_binding_names(param, &mut names);
        }
        self.fstate.params_simple = simple;
        self.fstate.param_names = names.clone();
        if self.fstate.strict || !simple || force_unique {
            let mut seen: FxHashSet<&str> = FxHashSet::default();
            for (name, span) in &names {
                if !seen.insert(name.as_str()) {
                    self.soft_error(format!("duplicate parameter name \"{name}\""), *span);
                }
            }
        }
        if converted {
            for (name, span) in &names {
                self.check_binding_name(name, *span, false);
                self.define_symbol(SymbolKind::Param, name, *span, false);
            }
        }
    }

    // ===== arrows =====

    /// Arrow body after the parameter list; `start` covers the whole arrow.
    pub(crate) fn parse_arrow_tail(
        &mut self,
        params: Vec<Node>,
        params_trailing_comma: bool,
        is_async: bool,
        start: Span,
    ) -> ParseResult<Node> {
        self.must_match(TokenKind::Arrow, "missing => in arrow function")?;
        let mut fs = FunctionState::top_level(self.fstate.strict);
        fs.in_function = true;
        // Arrows have no this-environment of their own
        fs.allow_new_target = self.fstate.allow_new_target;
        fs.allow_super_property = self.fstate.allow_super_property;
        fs.allow_super_call = self.fstate.allow_super_call;
        fs.is_async = is_async;
        let saved_state = std::mem::replace(&mut self.fstate, fs);
        let saved_scope = self.current_scope;
        let saved_fscope = self.current_function_scope;
        self.push_scope(ScopeKind::Function);
        self.define_params(&params, true, true);

        let result = if self.tokens.peek_kind().unwrap_or(TokenKind::Eof) == TokenKind::LeftBrace {
            let body = self.parse_function_body_block();
            if body.is_ok() {
                self.check_end_flags();
            }
            body.map(|body| (body, false))
        } else {
            let saved_no_in = std::mem::replace(&mut self.no_in, false);
            let body = self.parse_assignment();
            self.no_in = saved_no_in;
            body.map(|body| (body, true))
        };
        self.current_scope = saved_scope;
        self.current_function_scope = saved_fscope;
        self.fstate = saved_state;
        let (body, expression_body) = result?;

        Ok(Node::new(
            NodeKind::ArrowFunction {
                params,
                body: Box::new(body),
                is_async,
                expression_body,
                params_trailing_comma,
            },
            self.span_from(start),
        ))
    }

    // ===== bodies and directives =====

    /// Function body block with directive-prologue processing.
    pub(crate) fn parse_function_body_block(&mut self) -> ParseResult<Node> {
        let start = self.peek_span()?;
        self.must_match(TokenKind::LeftBrace, "missing { before function body")?;
        let mut statements = Vec::new();
        let mut in_prologue = true;
        loop {
            let tok = self.tokens.peek()?;
            if tok.kind == TokenKind::RightBrace || tok.kind == TokenKind::Eof {
                break;
            }
            if in_prologue && tok.kind == TokenKind::String {
                let tok = tok.clone();
                let stmt = self.parse_statement_recovering(StmtCtx::Default)?;
                match directive_text(&stmt, &tok) {
                    Some(directive) => {
                        if directive == "use strict" {
                            self.activate_function_strict(token_span(&tok));
                        }
                    }
                    None => in_prologue = false,
                }
                statements.push(stmt);
                continue;
            }
            in_prologue = false;
            let before = self.tokens.last_end();
            statements.push(self.parse_statement_recovering(StmtCtx::Default)?);
            self.ensure_progress(before)?;
        }
        self.must_match(TokenKind::RightBrace, "missing } after function body")?;
        Ok(Node::new(NodeKind::Block { statements }, self.span_from(start)))
    }

    /// A `"use strict"` directive in this function body: apply it and re-run
    /// the checks its parameters skipped while sloppy.
    fn activate_function_strict(&mut self, span: Span) {
        if !self.fstate.params_simple {
            self.soft_error(
                "use strict directive not allowed in a function with a non-simple parameter list",
                span,
            );
        }
        if self.fstate.strict {
            return;
        }
        self.fstate.strict = true;
        let names = self.fstate.param_names.clone();
        let mut seen: FxHashSet<String> = FxHashSet::default();
        for (name, nspan) in &names {
            if !seen.insert(name.clone()) {
                self.soft_error(format!("duplicate parameter name \"{name}\""), *nspan);
            }
            if name == "eval" || name == "arguments" {
                self.soft_error(
                    format!("\"{name}\" may not be a parameter name in strict mode"),
                    *nspan,
                );
            }
            if ecma_token::STRICT_RESERVED.contains(name.as_str()) || name == "yield" {
                self.soft_error(
                    format!("\"{name}\" is a reserved identifier in strict mode"),
                    *nspan,
                );
            }
        }
        if let Some((name, nspan)) = self.fstate.name_span.clone() {
            if name == "eval" || name == "arguments" {
                self.soft_error(
                    "function name may not be eval or arguments in strict mode",
                    nspan,
                );
            }
        }
    }

    // ===== methods =====

    /// Method body shared by object literals and classes: a function with a
    /// home object. Accessor arity is enforced here.
    pub(crate) fn parse_method_function(
        &mut self,
        is_async: bool,
        is_generator: bool,
        is_getter: bool,
        is_setter: bool,
        allow_super_call: bool,
    ) -> ParseResult<Node> {
        let start = self.peek_span()?;
        let node = self.parse_function_common(
            start, None, None, is_async, is_generator, true, true, allow_super_call, None,
        )?;
        if let NodeKind::Function { params, .. } = &node.kind {
            if is_getter && !params.is_empty() {
                self.soft_error("getter must have no parameters", node.span);
            }
            if is_setter
                && (params.len() != 1
                    || matches!(params[0].kind, NodeKind::RestElement { .. }))
            {
                self.soft_error("setter must have exactly one non-rest parameter", node.span);
            }
        }
        Ok(node)
    }

    // ===== classes =====

    pub(crate) fn parse_class_declaration(&mut self) -> ParseResult<Node> {
        self.parse_class_declaration_ex(false)
    }

    pub(crate) fn parse_class_declaration_ex(&mut self, anonymous_ok: bool) -> ParseResult<Node> {
        let jsdoc = self.tokens.take_jsdoc();
        let start = self.peek_span()?;
        self.next_token()?; // class
        if !self.config.es2015() {
            self.soft_error("classes require ES2015", start);
        }
        let name = if is_binding_name_kind(self.tokens.peek_kind()?) {
            let tok = self.tokens.consume()?;
            let span = token_span(&tok);
            let name = tok.name().to_string();
            self.check_binding_name(&name, span, true);
            // Class bindings behave like let
            self.define_symbol(SymbolKind::Let, &name, span, false);
            Some(Node::new(NodeKind::Identifier { name }, span))
        } else if anonymous_ok {
            self.define_symbol(SymbolKind::Let, "*default*", start, false);
            None
        } else {
            let span = self.peek_span()?;
            return Err(self.error("class statement requires a name", span));
        };
        self.parse_class_tail(start, name, false, jsdoc)
    }

    pub(crate) fn parse_class_expression(&mut self) -> ParseResult<Node> {
        let start = self.peek_span()?;
        self.next_token()?; // class
        if !self.config.es2015() {
            self.soft_error("classes require ES2015", start);
        }
        let name = if is_binding_name_kind(self.tokens.peek_kind()?) {
            let tok = self.tokens.consume()?;
            let span = token_span(&tok);
            Some(Node::new(NodeKind::Identifier { name: tok.name().to_string() }, span))
        } else {
            None
        };
        self.parse_class_tail(start, name, true, None)
    }

    fn parse_class_tail(
        &mut self,
        start: Span,
        name: Option<Node>,
        is_expression: bool,
        jsdoc: Option<Box<str>>,
    ) -> ParseResult<Node> {
        // Class bodies are strict throughout
        let saved_strict = std::mem::replace(&mut self.fstate.strict, true);
        let superclass = if self.tokens.match_kind(TokenKind::Extends)? {
            Some(Box::new(self.parse_lhs_expr()?))
        } else {
            None
        };
        let has_super = superclass.is_some();
        self.class_stack.push(super::ClassInfo::default());
        self.push_scope(ScopeKind::ClassBody);
        let result = self.parse_class_body(has_super);
        self.pop_scope();
        let info = self.class_stack.pop().unwrap_or_default();
        for (pname, pspan) in &info.accesses {
            let declared = info.declared.contains_key(pname)
                || self.class_stack.iter().any(|c| c.declared.contains_key(pname));
            if !declared {
                self.soft_error(
                    format!("reference to undeclared private name \"#{pname}\""),
                    *pspan,
                );
            }
        }
        self.fstate.strict = saved_strict;
        let elements = result?;
        Ok(Node::new(
            NodeKind::Class {
                name: name.map(Box::new),
                superclass,
                elements,
                is_expression,
            },
            self.span_from(start),
        )
        .with_jsdoc(jsdoc))
    }

    fn parse_class_body(&mut self, has_super: bool) -> ParseResult<Vec<Node>> {
        self.must_match(TokenKind::LeftBrace, "missing { before class body")?;
        let mut elements = Vec::new();
        loop {
            match self.tokens.peek_kind()? {
                TokenKind::RightBrace | TokenKind::Eof => break,
                TokenKind::Semicolon => {
                    self.next_token()?;
                }
                _ => elements.push(self.parse_class_element(has_super)?),
            }
        }
        self.must_match(TokenKind::RightBrace, "missing } after class body")?;
        Ok(elements)
    }

    fn parse_class_element(&mut self, has_super: bool) -> ParseResult<Node> {
        let start = self.peek_span()?;
        let mut is_static = false;
        let mut is_async = false;
        let mut is_generator = false;
        let mut accessor: Option<MethodKind> = None;
        let mut key_parts: Option<(Node, bool, Option<Token>)> = None;

        // `static`, unless it is itself the member name
        if self.peek_contextual("static")? {
            let tok = self.tokens.consume()?;
            if self.is_key_terminator()? {
                key_parts = Some((
                    Node::new(NodeKind::Identifier { name: "static".into() }, token_span(&tok)),
                    false,
                    Some(tok),
                ));
            } else {
                is_static = true;
            }
        }

        if key_parts.is_none() {
            if self.tokens.peek_kind()? == TokenKind::Star {
                self.next_token()?;
                is_generator = true;
            } else if self.peek_contextual("async")? {
                let tok = self.tokens.consume()?;
                if self.is_key_terminator()? {
                    key_parts = Some((
                        Node::new(NodeKind::Identifier { name: "async".into() }, token_span(&tok)),
                        false,
                        Some(tok),
                    ));
                } else {
                    is_async = true;
                    if self.tokens.match_kind(TokenKind::Star)? {
                        is_generator = true;
                    }
                }
            } else if self.peek_contextual("get")? || self.peek_contextual("set")? {
                let tok = self.tokens.consume()?;
                if self.is_key_terminator()? {
                    key_parts = Some((
                        Node::new(
                            NodeKind::Identifier { name: tok.text.to_string() },
                            token_span(&tok),
                        ),
                        false,
                        Some(tok),
                    ));
                } else {
                    accessor = Some(if &*tok.text == "get" {
                        MethodKind::Get
                    } else {
                        MethodKind::Set
                    });
                }
            }
        }

        let (key, computed, _key_tok) = match key_parts {
            Some(parts) => parts,
            None => self.parse_class_property_key()?,
        };
        let is_private = matches!(key.kind, NodeKind::PrivateName { .. });
        let plain_name = plain_key_name(&key);

        if self.tokens.peek_kind()? == TokenKind::LeftParen {
            // Method form
            let is_constructor =
                !is_static && !computed && !is_private && plain_name.as_deref() == Some("constructor");
            if is_constructor {
                if accessor.is_some() {
                    self.soft_error("constructor may not be an accessor", start);
                }
                if is_generator {
                    self.soft_error("constructor may not be a generator", start);
                }
                if is_async {
                    self.soft_error("constructor may not be async", start);
                }
                if let Some(info) = self.class_stack.last_mut() {
                    if info.has_constructor {
                        self.soft_error("duplicate constructor in class", start);
                    } else {
                        info.has_constructor = true;
                    }
                }
            }
            if is_private {
                if plain_name.as_deref() == Some("constructor") {
                    self.soft_error("#constructor is not a valid private name", key.span);
                }
                let bit = match accessor {
                    Some(MethodKind::Get) => 1,
                    Some(MethodKind::Set) => 2,
                    _ => 4,
                };
                self.declare_private(&key, bit);
            }
            if is_static && !is_private && plain_name.as_deref() == Some("prototype") {
                self.soft_error("static member may not be named prototype", key.span);
            }
            let kind = if is_constructor {
                MethodKind::Constructor
            } else {
                accessor.unwrap_or(MethodKind::Method)
            };
            let value = self.parse_method_function(
                is_async,
                is_generator,
                kind == MethodKind::Get,
                kind == MethodKind::Set,
                is_constructor && has_super,
            )?;
            return Ok(Node::new(
                NodeKind::MethodDefinition {
                    key: Box::new(key),
                    value: Box::new(value),
                    kind,
                    is_static,
                    computed,
                },
                self.span_from(start),
            ));
        }

        // Field form
        if let Some(kind) = accessor {
            let span = self.peek_span()?;
            let what = if kind == MethodKind::Get { "getter" } else { "setter" };
            return Err(self.error(format!("missing ( after {what} name"), span));
        }
        if is_async || is_generator {
            let span = self.peek_span()?;
            return Err(self.error("missing ( after method name", span));
        }
        if !self.config.version.at_least(EcmaVersion::Es2020) {
            self.soft_error("class fields require ES2020", start);
        }
        if !computed && !is_private && plain_name.as_deref() == Some("constructor") {
            self.soft_error("field may not be named constructor", key.span);
        }
        if is_static && !is_private && plain_name.as_deref() == Some("prototype") {
            self.soft_error("static member may not be named prototype", key.span);
        }
        if is_private {
            self.declare_private(&key, 4);
        }
        let value = if self.tokens.match_kind(TokenKind::Assign)? {
            Some(Box::new(self.parse_assignment()?))
        } else {
            None
        };
        self.eat_semicolon()?;
        Ok(Node::new(
            NodeKind::PropertyDefinition {
                key: Box::new(key),
                value,
                is_static,
                computed,
            },
            self.span_from(start),
        ))
    }

    /// Class member key: like an object key, plus private names.
    fn parse_class_property_key(&mut self) -> ParseResult<(Node, bool, Option<Token>)> {
        if self.tokens.peek_kind()? == TokenKind::PrivateName {
            let tok = self.tokens.consume()?;
            let span = token_span(&tok);
            return Ok((
                Node::new(NodeKind::PrivateName { name: tok.name().to_string() }, span),
                false,
                Some(tok),
            ));
        }
        self.parse_property_key()
    }

    /// True when the peeked token is the plainly-spelled contextual `word`.
    fn peek_contextual(&mut self, word: &str) -> ParseResult<bool> {
        let tok = self.tokens.peek()?;
        Ok(tok.kind == TokenKind::Identifier && &*tok.text == word && !tok.had_escape)
    }

    /// After a would-be modifier: these tokens mean the word was the member
    /// name itself.
    fn is_key_terminator(&mut self) -> ParseResult<bool> {
        Ok(matches!(
            self.tokens.peek_kind()?,
            TokenKind::LeftParen
                | TokenKind::Assign
                | TokenKind::Semicolon
                | TokenKind::RightBrace
        ))
    }

    fn declare_private(&mut self, key: &Node, bit: u8) {
        let NodeKind::PrivateName { name } = &key.kind else { return };
        let name = name.clone();
        let span = key.span;
        let Some(info) = self.class_stack.last_mut() else { return };
        let entry = info.declared.entry(name.clone()).or_insert(0);
        // A get/set pair may share a name; any other overlap is a duplicate
        let conflict = if bit == 4 { *entry != 0 } else { *entry & (bit | 4) != 0 };
        *entry |= bit;
        if conflict {
            self.soft_error(format!("duplicate private name \"#{name}\""), span);
        }
    }
}

/// Statically known member name, for the constructor/prototype rules.
fn plain_key_name(key: &Node) -> Option<String> {
    match &key.kind {
        NodeKind::Identifier { name } | NodeKind::PrivateName { name } => Some(name.clone()),
        NodeKind::StringLiteral { value } => Some(value.clone()),
        _ => None,
    }
}

/// Names bound by a parameter or pattern, in source order.
pub(crate) fn collect_binding_names(node: &Node, out: &mut Vec<(String, Span)>) {
    match &node.kind {
        NodeKind::Identifier { name } => out.push((name.clone(), node.span)),
        NodeKind::AssignmentPattern { target, .. } => collect_binding_names(target, out),
        NodeKind::RestElement { argument } => collect_binding_names(argument, out),
        NodeKind::ArrayPattern { elements } => {
            for element in elements.iter().flatten() {
                collect_binding_names(element, out);
            }
        }
        NodeKind::ObjectPattern { properties } => {
            for prop in properties {
                collect_binding_names(prop, out);
            }
        }
        NodeKind::Property { value, .. } => collect_binding_names(value, out),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecma_ast::{PropertyKind, Span};

    fn ident(name: &str) -> Node {
        Node::new(NodeKind::Identifier { name: name.into() }, Span::default())
    }

    #[test]
    fn collects_names_from_nested_patterns() {
        let inner = Node::new(
            NodeKind::ArrayPattern { elements: vec![Some(ident("b")), None, Some(ident("c"))] },
            Span::default(),
        );
        let prop = Node::new(
            NodeKind::Property {
                key: Box::new(ident("k")),
                value: Box::new(inner),
                kind: PropertyKind::Init,
                computed: false,
            },
            Span::default(),
        );
        let pattern = Node::new(NodeKind::ObjectPattern { properties: vec![prop] }, Span::default());
        let mut names = Vec::new();
        collect_binding_names(&pattern, &mut names);
        let flat: Vec<&str> = names.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(flat, vec!["b", "c"]);
    }
}
