//! Module headers: every `import` and `export` form.
//!
//! Headers are only legal at the top level of a module source — nesting depth
//! one, outside any function. `import(...)` and `import.meta` are ordinary
//! expressions and take the expression path instead.

use super::{is_binding_name_kind, token_span, Parser, StmtCtx};
use crate::config::EcmaVersion;
use crate::scope::SymbolKind;
use ecma_ast::{Node, NodeKind, Span};
use ecma_error::ParseResult;
use ecma_token::{Token, TokenKind, TokenValue};

impl<'a> Parser<'a> {
    /// Statement starting with `import`: a header, or an `import(...)` /
    /// `import.meta` expression statement.
    pub(crate) fn parse_import_or_expression(&mut self, _ctx: StmtCtx) -> ParseResult<Node> {
        let import_tok = self.next_token()?;
        let start = token_span(&import_tok);
        match self.tokens.peek_kind()? {
            TokenKind::LeftParen | TokenKind::Dot => {
                let head = self.parse_import_expression_tail(import_tok)?;
                self.prebuilt = Some(head);
                let first = self.parse_assignment()?;
                self.finish_expression_statement(first, start)
            }
            _ => self.parse_import_declaration(start),
        }
    }

    fn check_module_header_position(&mut self, what: &str, span: Span) {
        if !self.module {
            self.soft_error(format!("{what} is only allowed in modules"), span);
        } else if self.statement_nesting > 1 || self.fstate.in_function {
            self.soft_error(format!("{what} is only allowed at the top level"), span);
        }
    }

    fn parse_import_declaration(&mut self, start: Span) -> ParseResult<Node> {
        self.check_module_header_position("import", start);
        let mut specifiers = Vec::new();

        if self.tokens.peek_kind()? == TokenKind::String {
            // Side-effect import
            let source = self.parse_module_specifier()?;
            self.eat_semicolon()?;
            return Ok(Node::new(
                NodeKind::ImportDeclaration { specifiers, source: Box::new(source) },
                self.span_from(start),
            ));
        }

        let mut need_named = true;
        if is_binding_name_kind(self.tokens.peek_kind()?) {
            // Default binding
            let local = self.parse_import_binding()?;
            let span = local.span;
            specifiers.push(Node::new(
                NodeKind::ImportDefaultSpecifier { local: Box::new(local) },
                span,
            ));
            need_named = self.tokens.match_kind(TokenKind::Comma)?;
            if !need_named {
                // `import X from "m"` — fall through to the from clause
                self.expect_from_keyword()?;
                let source = self.parse_module_specifier()?;
                self.eat_semicolon()?;
                return Ok(Node::new(
                    NodeKind::ImportDeclaration { specifiers, source: Box::new(source) },
                    self.span_from(start),
                ));
            }
        }

        if need_named {
            match self.tokens.peek_kind()? {
                TokenKind::Star => {
                    let star = self.next_token()?;
                    self.expect_as_keyword()?;
                    let local = self.parse_import_binding()?;
                    let span = token_span(&star).to(local.span);
                    specifiers.push(Node::new(
                        NodeKind::ImportNamespaceSpecifier { local: Box::new(local) },
                        span,
                    ));
                }
                TokenKind::LeftBrace => {
                    self.next_token()?;
                    loop {
                        if self.tokens.peek_kind()? == TokenKind::RightBrace {
                            break;
                        }
                        specifiers.push(self.parse_named_import()?);
                        if !self.tokens.match_kind(TokenKind::Comma)? {
                            break;
                        }
                    }
                    self.must_match(TokenKind::RightBrace, "missing } in import specifier list")?;
                }
                _ => {
                    let span = self.peek_span()?;
                    return Err(self.error("invalid import specifier", span));
                }
            }
        }

        self.expect_from_keyword()?;
        let source = self.parse_module_specifier()?;
        self.eat_semicolon()?;
        Ok(Node::new(
            NodeKind::ImportDeclaration { specifiers, source: Box::new(source) },
            self.span_from(start),
        ))
    }

    /// `{ a, b as c, default as d }` entry.
    fn parse_named_import(&mut self) -> ParseResult<Node> {
        let imported_tok = self.parse_identifier_name_token()?;
        let imported_span = token_span(&imported_tok);
        let imported = Node::new(
            NodeKind::Identifier { name: imported_tok.name().to_string() },
            imported_span,
        );
        let local = if self.match_as_keyword()? {
            self.parse_import_binding()?
        } else {
            // Without `as`, the imported name is also the local binding and
            // must be a declarable name
            if !is_binding_name_kind(imported_tok.kind) {
                self.soft_error(
                    format!(
                        "\"{}\" must be renamed with as to be imported",
                        imported_tok.name()
                    ),
                    imported_span,
                );
            }
            let name = imported_tok.name().to_string();
            self.check_binding_name(&name, imported_span, true);
            self.define_symbol(SymbolKind::Const, &name, imported_span, false);
            Node::new(NodeKind::Identifier { name }, imported_span)
        };
        let span = imported_span.to(local.span);
        Ok(Node::new(
            NodeKind::ImportSpecifier { imported: Box::new(imported), local: Box::new(local) },
            span,
        ))
    }

    /// A local binding introduced by an import; imports are immutable.
    fn parse_import_binding(&mut self) -> ParseResult<Node> {
        let kind = self.tokens.peek_kind()?;
        if !is_binding_name_kind(kind) {
            let span = self.peek_span()?;
            return Err(self.error("missing name after import", span));
        }
        let tok = self.tokens.consume()?;
        let span = token_span(&tok);
        let name = tok.name().to_string();
        self.check_binding_name(&name, span, true);
        self.define_symbol(SymbolKind::Const, &name, span, false);
        Ok(Node::new(NodeKind::Identifier { name }, span))
    }

    // ===== export =====

    pub(crate) fn parse_export_declaration(&mut self) -> ParseResult<Node> {
        let export_tok = self.next_token()?;
        let start = token_span(&export_tok);
        self.check_module_header_position("export", start);

        match self.tokens.peek_kind()? {
            TokenKind::Star => {
                self.next_token()?;
                let exported = if self.match_as_keyword()? {
                    if !self.config.version.at_least(EcmaVersion::Es2020) {
                        let span = self.current_span();
                        self.soft_error("export * as name requires ES2020", span);
                    }
                    let tok = self.parse_identifier_name_token()?;
                    let span = token_span(&tok);
                    Some(Box::new(Node::new(
                        NodeKind::Identifier { name: tok.name().to_string() },
                        span,
                    )))
                } else {
                    None
                };
                self.expect_from_keyword()?;
                let source = self.parse_module_specifier()?;
                self.eat_semicolon()?;
                Ok(Node::new(
                    NodeKind::ExportAll { source: Box::new(source), exported },
                    self.span_from(start),
                ))
            }
            TokenKind::LeftBrace => {
                self.next_token()?;
                let mut specifiers = Vec::new();
                let mut local_keyword_span: Option<(String, Span)> = None;
                loop {
                    if self.tokens.peek_kind()? == TokenKind::RightBrace {
                        break;
                    }
                    let local_tok = self.parse_identifier_name_token()?;
                    let local_span = token_span(&local_tok);
                    if !is_binding_name_kind(local_tok.kind) && local_keyword_span.is_none() {
                        local_keyword_span =
                            Some((local_tok.name().to_string(), local_span));
                    }
                    let local = Node::new(
                        NodeKind::Identifier { name: local_tok.name().to_string() },
                        local_span,
                    );
                    let exported = if self.match_as_keyword()? {
                        // Any identifier-name works here, `default` included
                        let tok = self.parse_identifier_name_token()?;
                        let span = token_span(&tok);
                        Node::new(NodeKind::Identifier { name: tok.name().to_string() }, span)
                    } else {
                        local.clone()
                    };
                    let span = local_span.to(exported.span);
                    specifiers.push(Node::new(
                        NodeKind::ExportSpecifier {
                            local: Box::new(local),
                            exported: Box::new(exported),
                        },
                        span,
                    ));
                    if !self.tokens.match_kind(TokenKind::Comma)? {
                        break;
                    }
                }
                self.must_match(TokenKind::RightBrace, "missing } in export specifier list")?;
                let source = if self.peek_from_keyword()? {
                    self.expect_from_keyword()?;
                    Some(Box::new(self.parse_module_specifier()?))
                } else {
                    // Local re-exports must name declarable identifiers
                    if let Some((name, span)) = local_keyword_span {
                        self.soft_error(
                            format!("\"{name}\" may only be exported through a re-export"),
                            span,
                        );
                    }
                    None
                };
                self.eat_semicolon()?;
                Ok(Node::new(
                    NodeKind::ExportNamed { declaration: None, specifiers, source },
                    self.span_from(start),
                ))
            }
            TokenKind::Default => {
                self.next_token()?;
                if self.has_default_export {
                    self.soft_error("duplicate default export", start);
                }
                self.has_default_export = true;
                let declaration = self.parse_export_default_value()?;
                Ok(Node::new(
                    NodeKind::ExportDefault { declaration: Box::new(declaration) },
                    self.span_from(start),
                ))
            }
            TokenKind::Var => {
                let decl = self.parse_statement(StmtCtx::Default)?;
                self.export_named_declaration(start, decl)
            }
            TokenKind::Let | TokenKind::Const => {
                let decl = self.parse_statement(StmtCtx::Default)?;
                self.export_named_declaration(start, decl)
            }
            TokenKind::Function => {
                let decl = self.parse_function_statement(StmtCtx::Default, None)?;
                self.export_named_declaration(start, decl)
            }
            TokenKind::Class => {
                let decl = self.parse_class_declaration()?;
                self.export_named_declaration(start, decl)
            }
            TokenKind::Identifier => {
                // `export async function ...`
                let tok = self.tokens.peek()?.clone();
                if &*tok.text == "async" && !tok.had_escape {
                    let async_tok = self.tokens.consume()?;
                    if self.tokens.peek_kind()? == TokenKind::Function
                        && !self.tokens.peek_newline_before()?
                    {
                        let decl =
                            self.parse_function_statement(StmtCtx::Default, Some(async_tok))?;
                        return self.export_named_declaration(start, decl);
                    }
                }
                let span = self.peek_span()?;
                Err(self.error("invalid export declaration", span))
            }
            _ => {
                let span = self.peek_span()?;
                Err(self.error("invalid export declaration", span))
            }
        }
    }

    fn export_named_declaration(&mut self, start: Span, decl: Node) -> ParseResult<Node> {
        Ok(Node::new(
            NodeKind::ExportNamed {
                declaration: Some(Box::new(decl)),
                specifiers: Vec::new(),
                source: None,
            },
            self.span_from(start),
        ))
    }

    /// `export default <thing>`: a hoistable declaration (possibly
    /// anonymous) or an assignment expression.
    fn parse_export_default_value(&mut self) -> ParseResult<Node> {
        match self.tokens.peek_kind()? {
            TokenKind::Function => {
                self.parse_function_declaration_ex(StmtCtx::Default, None, true)
            }
            TokenKind::Class => self.parse_class_declaration_ex(true),
            TokenKind::Identifier => {
                let tok = self.tokens.peek()?.clone();
                if &*tok.text == "async" && !tok.had_escape {
                    let async_tok = self.tokens.consume()?;
                    if self.tokens.peek_kind()? == TokenKind::Function
                        && !self.tokens.peek_newline_before()?
                    {
                        return self.parse_function_declaration_ex(
                            StmtCtx::Default,
                            Some(async_tok),
                            true,
                        );
                    }
                    // Plain expression beginning with the word async
                    let value = self.parse_async_tail(async_tok)?;
                    self.eat_semicolon()?;
                    return Ok(value);
                }
                let value = self.parse_assignment()?;
                self.eat_semicolon()?;
                Ok(value)
            }
            _ => {
                let value = self.parse_assignment()?;
                self.eat_semicolon()?;
                Ok(value)
            }
        }
    }

    // ===== specifier helpers =====

    /// Any identifier-name token, keywords included (module export names).
    fn parse_identifier_name_token(&mut self) -> ParseResult<Token> {
        let tok = self.tokens.peek()?.clone();
        let ok = tok.kind == TokenKind::Identifier
            || tok.kind.is_reserved_word()
            || is_binding_name_kind(tok.kind);
        if !ok {
            let span = token_span(&tok);
            return Err(self.error("missing name in module specifier", span));
        }
        self.tokens.consume()
    }

    fn parse_module_specifier(&mut self) -> ParseResult<Node> {
        let tok = self.must_match(TokenKind::String, "missing module specifier string")?;
        let span = token_span(&tok);
        let value = match &tok.value {
            TokenValue::Str { cooked, .. } => cooked.to_string(),
            _ => String::new(),
        };
        Ok(Node::new(NodeKind::StringLiteral { value }, span))
    }

    fn peek_from_keyword(&mut self) -> ParseResult<bool> {
        let tok = self.tokens.peek()?;
        Ok(tok.kind == TokenKind::Identifier && &*tok.text == "from" && !tok.had_escape)
    }

    fn expect_from_keyword(&mut self) -> ParseResult<()> {
        if self.peek_from_keyword()? {
            self.tokens.consume()?;
            Ok(())
        } else {
            let span = self.peek_span()?;
            Err(self.error("missing from clause in module declaration", span))
        }
    }

    fn match_as_keyword(&mut self) -> ParseResult<bool> {
        let tok = self.tokens.peek()?;
        if tok.kind == TokenKind::Identifier && &*tok.text == "as" && !tok.had_escape {
            self.tokens.consume()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn expect_as_keyword(&mut self) -> ParseResult<()> {
        if self.match_as_keyword()? {
            Ok(())
        } else {
            let span = self.peek_span()?;
            Err(self.error("missing as in namespace import", span))
        }
    }
}
