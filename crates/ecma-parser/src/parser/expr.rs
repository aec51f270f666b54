//! Expression parsing: the precedence ladder, primaries, member/call tails,
//! literals, the arrow-function cover grammar, and expression-to-pattern
//! conversion.

use super::{is_binding_name_kind, token_span, Parser};
use crate::config::EcmaVersion;
use crate::scope::SymbolKind;
use ecma_ast::{
    AssignOp, BinaryOp, LogicalOp, Node, NodeKind, PropertyKind, Span, UnaryOp, UpdateOp,
};
use ecma_error::ParseResult;
use ecma_token::{Token, TokenKind, TokenValue};

/// Contents of a parenthesized head that may still become either an arrow
/// parameter list or a plain expression/call argument list.
pub(crate) struct ParenItems {
    pub items: Vec<Node>,
    pub trailing_comma: bool,
    pub has_rest: bool,
}

impl<'a> Parser<'a> {
    // ===== expression entry =====

    /// Comma-sequence expression.
    pub(crate) fn parse_expression(&mut self) -> ParseResult<Node> {
        let first = self.parse_assignment()?;
        if self.tokens.peek_kind()? != TokenKind::Comma {
            return Ok(first);
        }
        let mut expressions = vec![first];
        while self.tokens.match_kind(TokenKind::Comma)? {
            expressions.push(self.parse_assignment()?);
        }
        let span = expressions[0]
            .span
            .to(expressions.last().map(|n| n.span).unwrap_or_default());
        Ok(Node::new(NodeKind::Sequence { expressions }, span))
    }

    /// Assignment-level expression: `yield`, the `async` forms, arrows,
    /// conditional, and the assignment operators.
    pub(crate) fn parse_assignment(&mut self) -> ParseResult<Node> {
        self.check_recursion()?;
        let result = self.parse_assignment_inner();
        self.exit_recursion();
        result
    }

    fn parse_assignment_inner(&mut self) -> ParseResult<Node> {
        if self.prebuilt.is_none() {
            let tok = self.tokens.peek()?.clone();
            if tok.kind == TokenKind::Yield && self.fstate.is_generator {
                return self.parse_yield();
            }
            if tok.kind == TokenKind::Identifier && &*tok.text == "async" && !tok.had_escape {
                let tok = self.tokens.consume()?;
                return self.parse_async_tail(tok);
            }
        }
        let start = match &self.prebuilt {
            Some(node) => node.span,
            None => self.peek_span()?,
        };
        let left = self.parse_conditional()?;

        if self.tokens.peek_kind()? == TokenKind::Arrow && !self.tokens.peek_newline_before()? {
            if !self.config.es2015() {
                self.soft_error("arrow functions require ES2015", start);
            }
            // Only a bare identifier reaches here; parenthesized heads take
            // the paren-or-arrow path
            return match &left.kind {
                NodeKind::Identifier { name } => {
                    let param = Node::new(NodeKind::Identifier { name: clone_name(name) }, left.span);
                    self.parse_arrow_tail(vec![param], false, false, start)
                }
                _ => {
                    let span = left.span;
                    Err(self.error("malformed arrow function parameter list", span))
                }
            };
        }

        let op_kind = self.tokens.peek_kind()?;
        if op_kind.is_assign_op() {
            if matches!(
                op_kind,
                TokenKind::AndAndAssign | TokenKind::OrOrAssign | TokenKind::QuestionQuestionAssign
            ) && !self.config.version.at_least(EcmaVersion::Latest)
            {
                let span = self.peek_span()?;
                self.soft_error("logical assignment operators require a later language version", span);
            }
            self.next_token()?;
            let target = if op_kind == TokenKind::Assign {
                self.to_assignment_target_root(left)?
            } else {
                self.check_simple_assignment_target(&left);
                left
            };
            let value = self.parse_assignment()?;
            let span = target.span.to(value.span);
            return Ok(Node::new(
                NodeKind::Assignment {
                    op: assign_op_for(op_kind),
                    target: Box::new(target),
                    value: Box::new(value),
                },
                span,
            ));
        }
        Ok(left)
    }

    /// `yield` / `yield expr` / `yield* expr` inside a generator.
    fn parse_yield(&mut self) -> ParseResult<Node> {
        let tok = self.next_token()?;
        let start = token_span(&tok);
        if self.fstate.in_params {
            self.soft_error("yield expression may not appear in parameters", start);
        }
        let delegate = if self.tokens.peek_or_eol()? == TokenKind::Star {
            self.next_token()?;
            true
        } else {
            false
        };
        let argument = if delegate {
            // `yield *` demands an operand
            Some(Box::new(self.parse_assignment()?))
        } else {
            match self.tokens.peek_or_eol()? {
                TokenKind::Eol
                | TokenKind::Semicolon
                | TokenKind::RightBrace
                | TokenKind::RightParen
                | TokenKind::RightBracket
                | TokenKind::Comma
                | TokenKind::Colon
                | TokenKind::Eof => None,
                _ => Some(Box::new(self.parse_assignment()?)),
            }
        };
        let span = match &argument {
            Some(arg) => start.to(arg.span),
            None => start,
        };
        Ok(Node::new(NodeKind::Yield { argument, delegate }, span))
    }

    /// Everything that can follow the contextual word `async`.
    pub(crate) fn parse_async_tail(&mut self, async_tok: Token) -> ParseResult<Node> {
        let start = token_span(&async_tok);
        let next = self.tokens.peek()?.clone();
        if !next.newline_before {
            match next.kind {
                TokenKind::Function => {
                    return self.parse_function_expression_tail(start, true);
                }
                TokenKind::Arrow => {
                    // `async => ...`: a plain arrow whose parameter is the
                    // name async
                    let param =
                        Node::new(NodeKind::Identifier { name: "async".into() }, start);
                    return self.parse_arrow_tail(vec![param], false, false, start);
                }
                TokenKind::LeftParen => {
                    let saved_cover = self.pending_cover.take();
                    let items = self.parse_paren_items()?;
                    if self.tokens.peek_kind()? == TokenKind::Arrow
                        && !self.tokens.peek_newline_before()?
                    {
                        if !self.config.version.at_least(EcmaVersion::Es2017) {
                            self.soft_error("async functions require ES2017", start);
                        }
                        let node = self.parse_arrow_from_items(items, true, start)?;
                        self.pending_cover = saved_cover;
                        return Ok(node);
                    }
                    // A plain call of a function named async
                    if let Some(span) = self.pending_cover.take() {
                        return Err(self
                            .error("invalid property initializer outside destructuring", span));
                    }
                    self.pending_cover = saved_cover;
                    let callee = Node::new(NodeKind::Identifier { name: "async".into() }, start);
                    let span = self.span_from(start);
                    self.prebuilt = Some(Node::new(
                        NodeKind::Call {
                            callee: Box::new(callee),
                            arguments: items.items,
                            optional: false,
                            in_chain: false,
                            trailing_comma: items.trailing_comma,
                        },
                        span,
                    ));
                    return self.parse_assignment();
                }
                k if is_binding_name_kind(k) => {
                    if !self.config.version.at_least(EcmaVersion::Es2017) {
                        self.soft_error("async functions require ES2017", start);
                    }
                    let param_tok = self.tokens.consume()?;
                    let pspan = token_span(&param_tok);
                    let param = Node::new(
                        NodeKind::Identifier { name: param_tok.name().to_string() },
                        pspan,
                    );
                    if self.tokens.peek_kind()? != TokenKind::Arrow
                        || self.tokens.peek_newline_before()?
                    {
                        let span = self.peek_span()?;
                        return Err(self.error("missing => after async arrow parameter", span));
                    }
                    return self.parse_arrow_tail(vec![param], false, true, start);
                }
                _ => {}
            }
        }
        // Just a reference to something named async
        self.prebuilt = Some(Node::new(NodeKind::Identifier { name: "async".into() }, start));
        self.parse_assignment()
    }

    // ===== conditional and the binary ladder =====

    fn parse_conditional(&mut self) -> ParseResult<Node> {
        let test = self.parse_nullish()?;
        if !self.tokens.match_kind(TokenKind::Question)? {
            return Ok(test);
        }
        // `in` is an operator again inside the middle of a conditional
        let saved_no_in = std::mem::replace(&mut self.no_in, false);
        let consequent = self.parse_assignment();
        self.no_in = saved_no_in;
        let consequent = consequent?;
        self.must_match(TokenKind::Colon, "missing : in conditional expression")?;
        let alternate = self.parse_assignment()?;
        let span = test.span.to(alternate.span);
        Ok(Node::new(
            NodeKind::Conditional {
                test: Box::new(test),
                consequent: Box::new(consequent),
                alternate: Box::new(alternate),
            },
            span,
        ))
    }

    /// `??` sits beside `||`/`&&` but refuses to mix with them without
    /// parentheses.
    fn parse_nullish(&mut self) -> ParseResult<Node> {
        let mut left = self.parse_logical_or()?;
        if self.tokens.peek_kind()? != TokenKind::QuestionQuestion {
            return Ok(left);
        }
        if !self.config.version.at_least(EcmaVersion::Es2020) {
            let span = self.peek_span()?;
            self.soft_error("the ?? operator requires ES2020", span);
        }
        if is_and_or(&left) {
            self.soft_error("cannot mix ?? with && or || without parentheses", left.span);
        }
        while self.tokens.match_kind(TokenKind::QuestionQuestion)? {
            let right = self.parse_logical_or()?;
            if is_and_or(&right) {
                self.soft_error("cannot mix ?? with && or || without parentheses", right.span);
            }
            let span = left.span.to(right.span);
            left = Node::new(
                NodeKind::Logical {
                    op: LogicalOp::NullishCoalescing,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                span,
            );
        }
        Ok(left)
    }

    fn parse_logical_or(&mut self) -> ParseResult<Node> {
        let mut left = self.parse_logical_and()?;
        while self.tokens.match_kind(TokenKind::OrOr)? {
            let right = self.parse_logical_and()?;
            let span = left.span.to(right.span);
            left = Node::new(
                NodeKind::Logical { op: LogicalOp::Or, left: Box::new(left), right: Box::new(right) },
                span,
            );
        }
        Ok(left)
    }

    fn parse_logical_and(&mut self) -> ParseResult<Node> {
        let mut left = self.parse_bit_or()?;
        while self.tokens.match_kind(TokenKind::AndAnd)? {
            let right = self.parse_bit_or()?;
            let span = left.span.to(right.span);
            left = Node::new(
                NodeKind::Logical { op: LogicalOp::And, left: Box::new(left), right: Box::new(right) },
                span,
            );
        }
        Ok(left)
    }

    fn parse_bit_or(&mut self) -> ParseResult<Node> {
        let mut left = self.parse_bit_xor()?;
        while self.tokens.match_kind(TokenKind::BitOr)? {
            let right = self.parse_bit_xor()?;
            left = binary(BinaryOp::BitOr, left, right);
        }
        Ok(left)
    }

    fn parse_bit_xor(&mut self) -> ParseResult<Node> {
        let mut left = self.parse_bit_and()?;
        while self.tokens.match_kind(TokenKind::BitXor)? {
            let right = self.parse_bit_and()?;
            left = binary(BinaryOp::BitXor, left, right);
        }
        Ok(left)
    }

    fn parse_bit_and(&mut self) -> ParseResult<Node> {
        let mut left = self.parse_equality()?;
        while self.tokens.match_kind(TokenKind::BitAnd)? {
            let right = self.parse_equality()?;
            left = binary(BinaryOp::BitAnd, left, right);
        }
        Ok(left)
    }

    fn parse_equality(&mut self) -> ParseResult<Node> {
        let mut left = self.parse_relational()?;
        loop {
            let op = match self.tokens.peek_kind()? {
                TokenKind::Eq => BinaryOp::Eq,
                TokenKind::NotEq => BinaryOp::NotEq,
                TokenKind::StrictEq => BinaryOp::StrictEq,
                TokenKind::StrictNotEq => BinaryOp::StrictNotEq,
                _ => break,
            };
            self.next_token()?;
            let right = self.parse_relational()?;
            left = binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_relational(&mut self) -> ParseResult<Node> {
        let mut left = self.parse_shift()?;
        loop {
            let op = match self.tokens.peek_kind()? {
                TokenKind::Less => BinaryOp::Lt,
                TokenKind::Greater => BinaryOp::Gt,
                TokenKind::LessEqual => BinaryOp::Le,
                TokenKind::GreaterEqual => BinaryOp::Ge,
                TokenKind::Instanceof => BinaryOp::Instanceof,
                // Suppressed inside a for-loop head
                TokenKind::In if !self.no_in => BinaryOp::In,
                _ => break,
            };
            self.next_token()?;
            let right = self.parse_shift()?;
            left = binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_shift(&mut self) -> ParseResult<Node> {
        let mut left = self.parse_additive()?;
        loop {
            let op = match self.tokens.peek_kind()? {
                TokenKind::LeftShift => BinaryOp::LeftShift,
                TokenKind::RightShift => BinaryOp::RightShift,
                TokenKind::UnsignedRightShift => BinaryOp::UnsignedRightShift,
                _ => break,
            };
            self.next_token()?;
            let right = self.parse_additive()?;
            left = binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_additive(&mut self) -> ParseResult<Node> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.tokens.peek_kind()? {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => break,
            };
            self.next_token()?;
            let right = self.parse_multiplicative()?;
            left = binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> ParseResult<Node> {
        let mut left = self.parse_exponent()?;
        loop {
            let op = match self.tokens.peek_kind()? {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                TokenKind::Percent => BinaryOp::Mod,
                _ => break,
            };
            self.next_token()?;
            let right = self.parse_exponent()?;
            left = binary(op, left, right);
        }
        Ok(left)
    }

    /// `**` is right-associative; an unparenthesized unary left operand is an
    /// early error.
    fn parse_exponent(&mut self) -> ParseResult<Node> {
        let left = self.parse_unary()?;
        if self.tokens.peek_kind()? != TokenKind::StarStar {
            return Ok(left);
        }
        if !self.config.version.at_least(EcmaVersion::Es2016) {
            let span = self.peek_span()?;
            self.soft_error("the ** operator requires ES2016", span);
        }
        if matches!(left.kind, NodeKind::Unary { .. } | NodeKind::Await { .. }) {
            self.soft_error(
                "unparenthesized unary expression cannot be the left operand of **",
                left.span,
            );
        }
        self.next_token()?;
        let right = self.parse_exponent()?;
        Ok(binary(BinaryOp::Exp, left, right))
    }

    fn parse_unary(&mut self) -> ParseResult<Node> {
        if self.prebuilt.is_some() {
            return self.parse_postfix();
        }
        let tok = self.tokens.peek()?.clone();
        let op = match tok.kind {
            TokenKind::Delete => Some(UnaryOp::Delete),
            TokenKind::Void => Some(UnaryOp::Void),
            TokenKind::Typeof => Some(UnaryOp::Typeof),
            TokenKind::Plus => Some(UnaryOp::Plus),
            TokenKind::Minus => Some(UnaryOp::Minus),
            TokenKind::BitNot => Some(UnaryOp::BitNot),
            TokenKind::Not => Some(UnaryOp::Not),
            _ => None,
        };
        if let Some(op) = op {
            self.next_token()?;
            let argument = self.parse_unary()?;
            if op == UnaryOp::Delete {
                match &argument.kind {
                    NodeKind::Identifier { .. } if self.fstate.strict => {
                        self.soft_error("variables may not be deleted in strict mode", argument.span);
                    }
                    NodeKind::Member { property, .. }
                        if matches!(property.kind, NodeKind::PrivateName { .. }) =>
                    {
                        self.soft_error("private members may not be deleted", argument.span);
                    }
                    _ => {}
                }
            }
            let span = token_span(&tok).to(argument.span);
            return Ok(Node::new(NodeKind::Unary { op, argument: Box::new(argument) }, span));
        }
        match tok.kind {
            TokenKind::Increment | TokenKind::Decrement => {
                self.next_token()?;
                let argument = self.parse_unary()?;
                self.check_simple_assignment_target(&argument);
                let op = if tok.kind == TokenKind::Increment {
                    UpdateOp::Increment
                } else {
                    UpdateOp::Decrement
                };
                let span = token_span(&tok).to(argument.span);
                Ok(Node::new(
                    NodeKind::Update { op, prefix: true, argument: Box::new(argument) },
                    span,
                ))
            }
            TokenKind::Await if self.fstate.is_async => {
                if !self.config.version.at_least(EcmaVersion::Es2017) {
                    self.soft_error("await requires ES2017", token_span(&tok));
                }
                if self.fstate.in_params {
                    self.soft_error("await expression may not appear in parameters", token_span(&tok));
                }
                self.next_token()?;
                let argument = self.parse_unary()?;
                let span = token_span(&tok).to(argument.span);
                Ok(Node::new(NodeKind::Await { argument: Box::new(argument) }, span))
            }
            TokenKind::Await if self.module && !self.fstate.in_function => {
                Err(self.error("await is reserved at module top level", token_span(&tok)))
            }
            _ => self.parse_postfix(),
        }
    }

    fn parse_postfix(&mut self) -> ParseResult<Node> {
        let expr = self.parse_lhs_expr()?;
        let tok = self.tokens.peek()?.clone();
        if matches!(tok.kind, TokenKind::Increment | TokenKind::Decrement) && !tok.newline_before {
            self.next_token()?;
            self.check_simple_assignment_target(&expr);
            let op = if tok.kind == TokenKind::Increment {
                UpdateOp::Increment
            } else {
                UpdateOp::Decrement
            };
            let span = expr.span.to(token_span(&tok));
            return Ok(Node::new(
                NodeKind::Update { op, prefix: false, argument: Box::new(expr) },
                span,
            ));
        }
        Ok(expr)
    }

    // ===== left-hand-side: new, member tails, calls =====

    pub(crate) fn parse_lhs_expr(&mut self) -> ParseResult<Node> {
        let node = if self.prebuilt.is_none() && self.tokens.peek_kind()? == TokenKind::New {
            self.parse_new()?
        } else {
            self.parse_primary()?
        };
        self.parse_member_call_tail(node, true)
    }

    fn parse_new(&mut self) -> ParseResult<Node> {
        let new_tok = self.next_token()?;
        let start = token_span(&new_tok);
        if self.tokens.match_kind(TokenKind::Dot)? {
            let prop = self.tokens.consume()?;
            let pspan = token_span(&prop);
            if !(prop.kind == TokenKind::Identifier && &*prop.text == "target" && !prop.had_escape)
            {
                return Err(self.error("new.target is the only metaproperty after new", pspan));
            }
            if !self.fstate.allow_new_target {
                self.soft_error("new.target is only allowed within function bodies", pspan);
            }
            return Ok(Node::new(
                NodeKind::MetaProperty { meta: "new".into(), property: "target".into() },
                start.to(pspan),
            ));
        }
        let callee = if self.tokens.peek_kind()? == TokenKind::New {
            self.parse_new()?
        } else {
            let primary = self.parse_primary()?;
            self.parse_member_call_tail(primary, false)?
        };
        let (arguments, trailing_comma) = if self.tokens.peek_kind()? == TokenKind::LeftParen {
            self.parse_arguments()?
        } else {
            (Vec::new(), false)
        };
        let span = self.span_from(start);
        Ok(Node::new(
            NodeKind::New { callee: Box::new(callee), arguments, trailing_comma },
            span,
        ))
    }

    /// Member and call tail chain. Once a `?.` appears, every following link
    /// is tagged as part of the optional chain.
    pub(crate) fn parse_member_call_tail(
        &mut self,
        mut node: Node,
        allow_call: bool,
    ) -> ParseResult<Node> {
        let mut in_chain = false;
        loop {
            let tok = self.tokens.peek()?.clone();
            match tok.kind {
                TokenKind::Dot => {
                    self.next_token()?;
                    let property = self.parse_property_after_dot()?;
                    let span = node.span.to(property.span);
                    node = Node::new(
                        NodeKind::Member {
                            object: Box::new(node),
                            property: Box::new(property),
                            computed: false,
                            optional: false,
                            in_chain,
                        },
                        span,
                    );
                }
                TokenKind::QuestionDot => {
                    let qspan = token_span(&tok);
                    if !allow_call {
                        return Err(self.error("optional chain not allowed here", qspan));
                    }
                    if rooted_in_super(&node) {
                        return Err(self.error("super may not begin an optional chain", qspan));
                    }
                    if !self.config.version.at_least(EcmaVersion::Es2020) {
                        self.soft_error("optional chaining requires ES2020", qspan);
                    }
                    self.next_token()?;
                    in_chain = true;
                    match self.tokens.peek_kind()? {
                        TokenKind::LeftParen => {
                            let (arguments, trailing_comma) = self.parse_arguments()?;
                            let span = self.span_from(node.span);
                            node = Node::new(
                                NodeKind::Call {
                                    callee: Box::new(node),
                                    arguments,
                                    optional: true,
                                    in_chain: true,
                                    trailing_comma,
                                },
                                span,
                            );
                        }
                        TokenKind::LeftBracket => {
                            self.next_token()?;
                            let saved = std::mem::replace(&mut self.no_in, false);
                            let index = self.parse_expression();
                            self.no_in = saved;
                            let index = index?;
                            self.must_match(TokenKind::RightBracket, "missing ] in index expression")?;
                            let span = self.span_from(node.span);
                            node = Node::new(
                                NodeKind::Member {
                                    object: Box::new(node),
                                    property: Box::new(index),
                                    computed: true,
                                    optional: true,
                                    in_chain: true,
                                },
                                span,
                            );
                        }
                        _ => {
                            let property = self.parse_property_after_dot()?;
                            let span = node.span.to(property.span);
                            node = Node::new(
                                NodeKind::Member {
                                    object: Box::new(node),
                                    property: Box::new(property),
                                    computed: false,
                                    optional: true,
                                    in_chain: true,
                                },
                                span,
                            );
                        }
                    }
                }
                TokenKind::LeftBracket => {
                    self.next_token()?;
                    let saved = std::mem::replace(&mut self.no_in, false);
                    let index = self.parse_expression();
                    self.no_in = saved;
                    let index = index?;
                    self.must_match(TokenKind::RightBracket, "missing ] in index expression")?;
                    let span = self.span_from(node.span);
                    node = Node::new(
                        NodeKind::Member {
                            object: Box::new(node),
                            property: Box::new(index),
                            computed: true,
                            optional: false,
                            in_chain,
                        },
                        span,
                    );
                }
                TokenKind::LeftParen if allow_call => {
                    if matches!(node.kind, NodeKind::Super) && !self.fstate.allow_super_call {
                        self.soft_error(
                            "super call is only allowed in a derived class constructor",
                            token_span(&tok),
                        );
                    }
                    let (arguments, trailing_comma) = self.parse_arguments()?;
                    let span = self.span_from(node.span);
                    node = Node::new(
                        NodeKind::Call {
                            callee: Box::new(node),
                            arguments,
                            optional: false,
                            in_chain,
                            trailing_comma,
                        },
                        span,
                    );
                }
                TokenKind::TemplateHead | TokenKind::TemplateNoSub => {
                    if in_chain {
                        return Err(self.error(
                            "tagged template is not allowed in an optional chain",
                            token_span(&tok),
                        ));
                    }
                    let quasi = self.parse_template_literal(true)?;
                    let span = node.span.to(quasi.span);
                    node = Node::new(
                        NodeKind::TaggedTemplate { tag: Box::new(node), quasi: Box::new(quasi) },
                        span,
                    );
                }
                _ => break,
            }
        }
        Ok(node)
    }

    /// Property name after `.` or `?.`: any identifier-name (reserved words
    /// included, escapes fine) or a private name.
    fn parse_property_after_dot(&mut self) -> ParseResult<Node> {
        let tok = self.tokens.consume()?;
        let span = token_span(&tok);
        match tok.kind {
            TokenKind::PrivateName => {
                let name = tok.name().to_string();
                self.record_private_access(&name, span);
                Ok(Node::new(NodeKind::PrivateName { name }, span))
            }
            k if k == TokenKind::Identifier || k.is_reserved_word() || is_binding_name_kind(k) => {
                Ok(Node::new(NodeKind::Identifier { name: tok.name().to_string() }, span))
            }
            _ => Err(self.error("missing name after . operator", span)),
        }
    }

    pub(crate) fn record_private_access(&mut self, name: &str, span: Span) {
        match self.class_stack.last_mut() {
            None => self.soft_error("private name used outside of a class", span),
            Some(info) => info.accesses.push((name.to_string(), span)),
        }
    }

    fn parse_arguments(&mut self) -> ParseResult<(Vec<Node>, bool)> {
        self.must_match(TokenKind::LeftParen, "missing ( before argument list")?;
        let saved_no_in = std::mem::replace(&mut self.no_in, false);
        let result = self.parse_arguments_inner();
        self.no_in = saved_no_in;
        result
    }

    fn parse_arguments_inner(&mut self) -> ParseResult<(Vec<Node>, bool)> {
        let mut arguments = Vec::new();
        let mut trailing_comma = false;
        loop {
            if self.tokens.peek_kind()? == TokenKind::RightParen {
                break;
            }
            if self.tokens.peek_kind()? == TokenKind::DotDotDot {
                let spread_tok = self.next_token()?;
                let argument = self.parse_assignment()?;
                let span = token_span(&spread_tok).to(argument.span);
                arguments.push(Node::new(
                    NodeKind::SpreadElement { argument: Box::new(argument) },
                    span,
                ));
            } else {
                arguments.push(self.parse_assignment()?);
            }
            if self.tokens.match_kind(TokenKind::Comma)? {
                if self.tokens.peek_kind()? == TokenKind::RightParen {
                    trailing_comma = true;
                    if !self.config.version.at_least(EcmaVersion::Es2017) {
                        let span = self.current_span();
                        self.soft_error("trailing comma in argument list requires ES2017", span);
                    }
                    break;
                }
            } else {
                break;
            }
        }
        self.must_match(TokenKind::RightParen, "missing ) after argument list")?;
        if let Some(span) = self.pending_cover.take() {
            self.soft_error("invalid property initializer outside destructuring", span);
        }
        Ok((arguments, trailing_comma))
    }

    // ===== primary =====

    fn parse_primary(&mut self) -> ParseResult<Node> {
        if let Some(node) = self.prebuilt.take() {
            return Ok(node);
        }
        let tok = self.tokens.peek()?.clone();
        let start = token_span(&tok);
        match tok.kind {
            TokenKind::Number => {
                let tok = self.next_token()?;
                if let TokenValue::Number { value, legacy_octal } = tok.value {
                    if legacy_octal && self.fstate.strict {
                        self.soft_error("octal literals are not allowed in strict mode", start);
                    }
                    Ok(Node::new(
                        NodeKind::NumberLiteral { value, raw: tok.text.to_string() },
                        start,
                    ))
                } else {
                    Err(self.error("malformed numeric literal", start))
                }
            }
            TokenKind::BigInt => {
                let tok = self.next_token()?;
                if !self.config.version.at_least(EcmaVersion::Es2020) {
                    self.soft_error("BigInt literals require ES2020", start);
                }
                match tok.value {
                    TokenValue::BigInt { digits } => Ok(Node::new(
                        NodeKind::BigIntLiteral { digits: digits.to_string() },
                        start,
                    )),
                    _ => Err(self.error("malformed BigInt literal", start)),
                }
            }
            TokenKind::String => {
                let tok = self.next_token()?;
                match tok.value {
                    TokenValue::Str { cooked, has_octal_escape } => {
                        if has_octal_escape && self.fstate.strict {
                            self.soft_error(
                                "octal escape sequences are not allowed in strict mode",
                                start,
                            );
                        }
                        Ok(Node::new(NodeKind::StringLiteral { value: cooked.to_string() }, start))
                    }
                    _ => Err(self.error("malformed string literal", start)),
                }
            }
            TokenKind::Slash | TokenKind::SlashAssign => {
                // Expression position: this is a regex, not division
                self.tokens.regex_token()?;
                let tok = self.tokens.consume()?;
                let span = token_span(&tok);
                match tok.value {
                    TokenValue::Regex { pattern, flags } => Ok(Node::new(
                        NodeKind::RegexLiteral {
                            pattern: pattern.to_string(),
                            flags: flags.to_string(),
                        },
                        span,
                    )),
                    _ => Err(self.error("malformed regular expression", span)),
                }
            }
            TokenKind::Null => {
                self.next_token()?;
                Ok(Node::new(NodeKind::NullLiteral, start))
            }
            TokenKind::True | TokenKind::False => {
                self.next_token()?;
                Ok(Node::new(
                    NodeKind::BooleanLiteral { value: tok.kind == TokenKind::True },
                    start,
                ))
            }
            TokenKind::This => {
                self.next_token()?;
                Ok(Node::new(NodeKind::This, start))
            }
            TokenKind::Super => {
                self.next_token()?;
                let next = self.tokens.peek()?.clone();
                match next.kind {
                    TokenKind::Dot | TokenKind::LeftBracket => {
                        if !self.fstate.allow_super_property {
                            self.soft_error(
                                "super property access is only allowed in methods",
                                start,
                            );
                        }
                    }
                    TokenKind::LeftParen => {
                        // Checked again at the call site; this catches the
                        // plain misuse early
                        if !self.fstate.allow_super_call {
                            self.soft_error(
                                "super call is only allowed in a derived class constructor",
                                start,
                            );
                        }
                    }
                    _ => {
                        return Err(
                            self.error("super must be followed by . [ or (", start)
                        );
                    }
                }
                Ok(Node::new(NodeKind::Super, start))
            }
            TokenKind::Identifier => {
                let tok = self.next_token()?;
                self.check_reference_name(tok.name(), start, TokenKind::Identifier);
                Ok(Node::new(NodeKind::Identifier { name: tok.name().to_string() }, start))
            }
            TokenKind::Let | TokenKind::Yield | TokenKind::Await => {
                // Contextual words in a position where they are plain names
                let tok = self.tokens.consume()?;
                if tok.kind == TokenKind::Yield && self.fstate.is_generator {
                    return Err(self.error("yield is only valid as an expression of its own", start));
                }
                self.check_reference_name(tok.name(), start, tok.kind);
                Ok(Node::new(NodeKind::Identifier { name: tok.name().to_string() }, start))
            }
            TokenKind::LeftParen => self.parse_paren_or_arrow(),
            TokenKind::LeftBracket => self.parse_array_literal(),
            TokenKind::LeftBrace => self.parse_object_literal(),
            TokenKind::Function => self.parse_function_expression_tail(start, false),
            TokenKind::Class => self.parse_class_expression(),
            TokenKind::TemplateNoSub | TokenKind::TemplateHead => self.parse_template_literal(false),
            TokenKind::Import => {
                let import_tok = self.next_token()?;
                self.parse_import_expression_tail(import_tok)
            }
            TokenKind::PrivateName => {
                Err(self.error("private name is only valid as a member access", start))
            }
            TokenKind::Eof => Err(self.error("unexpected end of input", start)),
            _ => {
                if tok.kind.is_reserved_word() && self.config.reserved_keyword_as_identifier
                    && tok.kind == TokenKind::Enum
                    && !self.fstate.strict
                {
                    self.next_token()?;
                    return Ok(Node::new(
                        NodeKind::Identifier { name: tok.name().to_string() },
                        start,
                    ));
                }
                let text = tok.text.to_string();
                Err(self.error(format!("unexpected token \"{text}\""), start))
            }
        }
    }

    // ===== parenthesized heads and arrows =====

    /// Items between `(` and `)` that may become arrow parameters, call
    /// arguments (after `async`), or a plain parenthesized expression.
    pub(crate) fn parse_paren_items(&mut self) -> ParseResult<ParenItems> {
        self.must_match(TokenKind::LeftParen, "missing (")?;
        let saved_no_in = std::mem::replace(&mut self.no_in, false);
        let result = self.parse_paren_items_inner();
        self.no_in = saved_no_in;
        result
    }

    fn parse_paren_items_inner(&mut self) -> ParseResult<ParenItems> {
        let mut items = Vec::new();
        let mut trailing_comma = false;
        let mut has_rest = false;
        loop {
            if self.tokens.peek_kind()? == TokenKind::RightParen {
                break;
            }
            if self.tokens.peek_kind()? == TokenKind::DotDotDot {
                let spread_tok = self.next_token()?;
                has_rest = true;
                let argument = self.parse_assignment()?;
                let span = token_span(&spread_tok).to(argument.span);
                items.push(Node::new(
                    NodeKind::SpreadElement { argument: Box::new(argument) },
                    span,
                ));
            } else {
                items.push(self.parse_assignment()?);
            }
            if self.tokens.match_kind(TokenKind::Comma)? {
                if self.tokens.peek_kind()? == TokenKind::RightParen {
                    trailing_comma = true;
                    break;
                }
            } else {
                break;
            }
        }
        self.must_match(TokenKind::RightParen, "missing ) in parenthetical")?;
        Ok(ParenItems { items, trailing_comma, has_rest })
    }

    fn parse_paren_or_arrow(&mut self) -> ParseResult<Node> {
        let start = self.peek_span()?;
        let saved_cover = self.pending_cover.take();
        let items = self.parse_paren_items()?;
        if self.tokens.peek_kind()? == TokenKind::Arrow && !self.tokens.peek_newline_before()? {
            if !self.config.es2015() {
                self.soft_error("arrow functions require ES2015", start);
            }
            let node = self.parse_arrow_from_items(items, false, start)?;
            self.pending_cover = saved_cover;
            return Ok(node);
        }
        // A plain parenthesized expression after all
        if let Some(span) = self.pending_cover.take() {
            self.pending_cover = saved_cover;
            return Err(self.error("invalid property initializer outside destructuring", span));
        }
        self.pending_cover = saved_cover;
        if items.items.is_empty() {
            return Err(self.error("expected expression inside parentheses", start));
        }
        if items.has_rest {
            return Err(self.error("rest argument is only valid in a parameter list", start));
        }
        if items.trailing_comma {
            return Err(self.error("unexpected trailing comma in expression", start));
        }
        let span = self.span_from(start);
        let mut items = items;
        let expression = if items.items.len() == 1 {
            items.items.remove(0)
        } else {
            let seq_span = items.items[0]
                .span
                .to(items.items.last().map(|n| n.span).unwrap_or_default());
            Node::new(NodeKind::Sequence { expressions: items.items }, seq_span)
        };
        Ok(Node::new(NodeKind::Paren { expression: Box::new(expression) }, span))
    }

    /// Reinterpret cover items as an arrow parameter list and parse the rest
    /// of the arrow.
    pub(crate) fn parse_arrow_from_items(
        &mut self,
        items: ParenItems,
        is_async: bool,
        start: Span,
    ) -> ParseResult<Node> {
        let count = items.items.len();
        let mut params = Vec::new();
        for (i, item) in items.items.into_iter().enumerate() {
            let item_span = item.span;
            match item.kind {
                NodeKind::SpreadElement { argument } => {
                    if i + 1 != count || items.trailing_comma {
                        self.soft_error("rest parameter must be last", item_span);
                    }
                    if matches!(argument.kind, NodeKind::Assignment { .. }) {
                        self.soft_error("rest parameter may not have a default", item_span);
                    }
                    let target = self.to_assignment_target(*argument, true)?;
                    params.push(Node::new(
                        NodeKind::RestElement { argument: Box::new(target) },
                        item_span,
                    ));
                }
                NodeKind::Assignment { op: AssignOp::Assign, target, value } => {
                    let target = self.to_assignment_target(*target, true)?;
                    params.push(Node::new(
                        NodeKind::AssignmentPattern { target: Box::new(target), default: value },
                        item_span,
                    ));
                }
                _ => {
                    let target = self.to_assignment_target(item, true)?;
                    params.push(target);
                }
            }
        }
        self.pending_cover = None;
        self.parse_arrow_tail(params, items.trailing_comma, is_async, start)
    }

    // ===== literals =====

    fn parse_array_literal(&mut self) -> ParseResult<Node> {
        let start = self.peek_span()?;
        self.must_match(TokenKind::LeftBracket, "missing [")?;
        let saved_no_in = std::mem::replace(&mut self.no_in, false);
        let result = self.parse_array_literal_inner(start);
        self.no_in = saved_no_in;
        result
    }

    fn parse_array_literal_inner(&mut self, start: Span) -> ParseResult<Node> {
        let mut elements: Vec<Option<Node>> = Vec::new();
        let mut trailing_comma = false;
        loop {
            match self.tokens.peek_kind()? {
                TokenKind::RightBracket => break,
                TokenKind::Comma => {
                    // Elision advances the element index
                    self.next_token()?;
                    elements.push(None);
                    continue;
                }
                TokenKind::DotDotDot => {
                    let spread_tok = self.next_token()?;
                    let argument = self.parse_assignment()?;
                    let span = token_span(&spread_tok).to(argument.span);
                    elements.push(Some(Node::new(
                        NodeKind::SpreadElement { argument: Box::new(argument) },
                        span,
                    )));
                }
                _ => {
                    elements.push(Some(self.parse_assignment()?));
                }
            }
            if self.tokens.match_kind(TokenKind::Comma)? {
                if self.tokens.peek_kind()? == TokenKind::RightBracket {
                    trailing_comma = true;
                }
            } else {
                break;
            }
        }
        self.must_match(TokenKind::RightBracket, "missing ] after element list")?;
        Ok(Node::new(
            NodeKind::ArrayLiteral { elements, trailing_comma },
            self.span_from(start),
        ))
    }

    fn parse_object_literal(&mut self) -> ParseResult<Node> {
        let start = self.peek_span()?;
        self.must_match(TokenKind::LeftBrace, "missing {")?;
        let saved_no_in = std::mem::replace(&mut self.no_in, false);
        let result = self.parse_object_literal_inner(start);
        self.no_in = saved_no_in;
        result
    }

    fn parse_object_literal_inner(&mut self, start: Span) -> ParseResult<Node> {
        let mut properties = Vec::new();
        let mut trailing_comma = false;
        loop {
            if self.tokens.peek_kind()? == TokenKind::RightBrace {
                break;
            }
            if self.tokens.peek_kind()? == TokenKind::DotDotDot {
                let spread_tok = self.next_token()?;
                if !self.config.version.at_least(EcmaVersion::Es2018) {
                    self.soft_error("object spread requires ES2018", token_span(&spread_tok));
                }
                let argument = self.parse_assignment()?;
                let span = token_span(&spread_tok).to(argument.span);
                properties.push(Node::new(
                    NodeKind::SpreadElement { argument: Box::new(argument) },
                    span,
                ));
            } else {
                properties.push(self.parse_object_property()?);
            }
            if self.tokens.match_kind(TokenKind::Comma)? {
                if self.tokens.peek_kind()? == TokenKind::RightBrace {
                    trailing_comma = true;
                }
            } else {
                break;
            }
        }
        self.must_match(TokenKind::RightBrace, "missing } after property list")?;
        Ok(Node::new(
            NodeKind::ObjectLiteral { properties, trailing_comma },
            self.span_from(start),
        ))
    }

    fn parse_object_property(&mut self) -> ParseResult<Node> {
        let start = self.peek_span()?;
        let mut is_async = false;
        let mut is_generator = false;
        let mut accessor: Option<PropertyKind> = None;

        if self.tokens.peek_kind()? == TokenKind::Star {
            self.next_token()?;
            is_generator = true;
        } else {
            let tok = self.tokens.peek()?.clone();
            if tok.kind == TokenKind::Identifier
                && !tok.had_escape
                && matches!(&*tok.text, "get" | "set" | "async")
            {
                self.tokens.consume()?;
                let next = self.tokens.peek()?.clone();
                let is_modifier = !matches!(
                    next.kind,
                    TokenKind::Colon
                        | TokenKind::Comma
                        | TokenKind::RightBrace
                        | TokenKind::LeftParen
                        | TokenKind::Assign
                ) && !(&*tok.text == "async" && next.newline_before);
                if is_modifier {
                    match &*tok.text {
                        "async" => {
                            if !self.config.version.at_least(EcmaVersion::Es2017) {
                                self.soft_error("async methods require ES2017", start);
                            }
                            is_async = true;
                            if self.tokens.match_kind(TokenKind::Star)? {
                                if !self.config.version.at_least(EcmaVersion::Es2018) {
                                    self.soft_error("async generators require ES2018", start);
                                }
                                is_generator = true;
                            }
                        }
                        "get" => accessor = Some(PropertyKind::Get),
                        _ => accessor = Some(PropertyKind::Set),
                    }
                } else {
                    // The word itself is the key
                    let key = Node::new(
                        NodeKind::Identifier { name: tok.text.to_string() },
                        token_span(&tok),
                    );
                    return self.parse_property_tail(
                        start,
                        key,
                        false,
                        Some(tok),
                        false,
                        false,
                        None,
                    );
                }
            }
        }

        let (key, computed, key_tok) = self.parse_property_key()?;
        self.parse_property_tail(start, key, computed, key_tok, is_async, is_generator, accessor)
    }

    #[allow(clippy::too_many_arguments)]
    fn parse_property_tail(
        &mut self,
        start: Span,
        key: Node,
        computed: bool,
        key_tok: Option<Token>,
        is_async: bool,
        is_generator: bool,
        accessor: Option<PropertyKind>,
    ) -> ParseResult<Node> {
        let next_kind = self.tokens.peek_kind()?;
        if next_kind == TokenKind::LeftParen {
            let kind = accessor.unwrap_or(PropertyKind::Method);
            if !self.config.es2015() && kind == PropertyKind::Method {
                self.soft_error("shorthand methods require ES2015", start);
            }
            let value = self.parse_method_function(
                is_async,
                is_generator,
                kind == PropertyKind::Get,
                kind == PropertyKind::Set,
                false,
            )?;
            let span = self.span_from(start);
            return Ok(Node::new(make_property(kind, key, value, computed), span));
        }
        if let Some(kind) = accessor {
            // `get` / `set` was a modifier but no method followed
            let span = self.peek_span()?;
            let what = if kind == PropertyKind::Get { "getter" } else { "setter" };
            return Err(self.error(format!("missing ( after {what} name"), span));
        }
        if is_async || is_generator {
            let span = self.peek_span()?;
            return Err(self.error("missing ( after method name", span));
        }
        if next_kind == TokenKind::Colon {
            self.next_token()?;
            let value = self.parse_assignment()?;
            let span = start.to(value.span);
            return Ok(Node::new(
                NodeKind::Property {
                    key: Box::new(key),
                    value: Box::new(value),
                    kind: PropertyKind::Init,
                    computed,
                },
                span,
            ));
        }
        // Shorthand forms need a plain identifier key
        let Some(key_tok) = key_tok.filter(|t| is_binding_name_kind(t.kind)) else {
            let span = self.peek_span()?;
            return Err(self.error("missing : after property id", span));
        };
        if !self.config.es2015() {
            self.soft_error("shorthand properties require ES2015", start);
        }
        let key_span = token_span(&key_tok);
        if next_kind == TokenKind::Assign {
            // Cover grammar: only meaningful if this object turns out to be a
            // destructuring pattern
            self.next_token()?;
            let default = self.parse_assignment()?;
            if self.pending_cover.is_none() {
                self.pending_cover = Some(key_span);
            }
            let target =
                Node::new(NodeKind::Identifier { name: key_tok.name().to_string() }, key_span);
            let span = start.to(default.span);
            let value = Node::new(
                NodeKind::AssignmentPattern { target: Box::new(target), default: Box::new(default) },
                span,
            );
            return Ok(Node::new(
                NodeKind::Property {
                    key: Box::new(key),
                    value: Box::new(value),
                    kind: PropertyKind::Shorthand,
                    computed: false,
                },
                span,
            ));
        }
        self.check_reference_name(key_tok.name(), key_span, key_tok.kind);
        let value = Node::new(NodeKind::Identifier { name: key_tok.name().to_string() }, key_span);
        Ok(Node::new(
            NodeKind::Property {
                key: Box::new(key),
                value: Box::new(value),
                kind: PropertyKind::Shorthand,
                computed: false,
            },
            self.span_from(start),
        ))
    }

    /// Property key: identifier-name (any keyword), string, number, or a
    /// computed `[expr]`.
    pub(crate) fn parse_property_key(&mut self) -> ParseResult<(Node, bool, Option<Token>)> {
        let tok = self.tokens.peek()?.clone();
        let span = token_span(&tok);
        match tok.kind {
            TokenKind::String => {
                let tok = self.tokens.consume()?;
                let value = match &tok.value {
                    TokenValue::Str { cooked, .. } => cooked.to_string(),
                    _ => String::new(),
                };
                Ok((Node::new(NodeKind::StringLiteral { value }, span), false, Some(tok)))
            }
            TokenKind::Number => {
                let tok = self.tokens.consume()?;
                let value = match &tok.value {
                    TokenValue::Number { value, .. } => *value,
                    _ => 0.0,
                };
                Ok((
                    Node::new(NodeKind::NumberLiteral { value, raw: tok.text.to_string() }, span),
                    false,
                    Some(tok),
                ))
            }
            TokenKind::BigInt => {
                let tok = self.tokens.consume()?;
                let digits = match &tok.value {
                    TokenValue::BigInt { digits } => digits.to_string(),
                    _ => String::new(),
                };
                Ok((Node::new(NodeKind::BigIntLiteral { digits }, span), false, Some(tok)))
            }
            TokenKind::LeftBracket => {
                if !self.config.es2015() {
                    self.soft_error("computed property keys require ES2015", span);
                }
                self.next_token()?;
                let saved = std::mem::replace(&mut self.no_in, false);
                let key = self.parse_assignment();
                self.no_in = saved;
                let key = key?;
                self.must_match(TokenKind::RightBracket, "missing ] after computed key")?;
                Ok((key, true, None))
            }
            k if k == TokenKind::Identifier || k.is_reserved_word() || is_binding_name_kind(k) => {
                let tok = self.tokens.consume()?;
                Ok((
                    Node::new(NodeKind::Identifier { name: tok.name().to_string() }, span),
                    false,
                    Some(tok),
                ))
            }
            _ => Err(self.error("invalid property id", span)),
        }
    }

    /// Template literal; `tagged` relaxes invalid escapes to `cooked: None`.
    pub(crate) fn parse_template_literal(&mut self, tagged: bool) -> ParseResult<Node> {
        let head = self.tokens.consume()?;
        let start = token_span(&head);
        if !self.config.es2015() {
            self.soft_error("template literals require ES2015", start);
        }
        let mut quasis = vec![self.template_element(&head, tagged)?];
        let mut expressions = Vec::new();
        if head.kind == TokenKind::TemplateHead {
            loop {
                let saved = std::mem::replace(&mut self.no_in, false);
                let expr = self.parse_expression();
                self.no_in = saved;
                expressions.push(expr?);
                if self.tokens.peek_kind()? != TokenKind::RightBrace {
                    let span = self.peek_span()?;
                    return Err(self.error("missing } in template substitution", span));
                }
                self.tokens.template_continue()?;
                let chunk = self.tokens.consume()?;
                let tail = chunk.kind == TokenKind::TemplateTail;
                quasis.push(self.template_element(&chunk, tagged)?);
                if tail {
                    break;
                }
            }
        }
        let span = self.span_from(start);
        Ok(Node::new(NodeKind::TemplateLiteral { quasis, expressions }, span))
    }

    fn template_element(&mut self, tok: &Token, tagged: bool) -> ParseResult<Node> {
        let span = token_span(tok);
        match &tok.value {
            TokenValue::Template { cooked, raw } => {
                if cooked.is_none() && !tagged {
                    self.soft_error("invalid escape sequence in template literal", span);
                }
                Ok(Node::new(
                    NodeKind::TemplateElement {
                        cooked: cooked.as_ref().map(|c| c.to_string()),
                        raw: raw.to_string(),
                        tail: matches!(tok.kind, TokenKind::TemplateTail | TokenKind::TemplateNoSub),
                    },
                    span,
                ))
            }
            _ => Err(self.error("malformed template chunk", span)),
        }
    }

    /// `import(...)` / `import.meta` after the consumed `import` keyword.
    pub(crate) fn parse_import_expression_tail(&mut self, import_tok: Token) -> ParseResult<Node> {
        let start = token_span(&import_tok);
        match self.tokens.peek_kind()? {
            TokenKind::LeftParen => {
                if !self.config.version.at_least(EcmaVersion::Es2020) {
                    self.soft_error("dynamic import requires ES2020", start);
                }
                self.next_token()?;
                let argument = self.parse_assignment()?;
                self.must_match(TokenKind::RightParen, "missing ) after import specifier")?;
                let span = self.span_from(start);
                Ok(Node::new(NodeKind::ImportCall { argument: Box::new(argument) }, span))
            }
            TokenKind::Dot => {
                self.next_token()?;
                let prop = self.tokens.consume()?;
                let pspan = token_span(&prop);
                if !(prop.kind == TokenKind::Identifier && &*prop.text == "meta" && !prop.had_escape)
                {
                    return Err(self.error("import.meta is the only metaproperty after import", pspan));
                }
                if !self.module {
                    self.soft_error("import.meta is only allowed in modules", pspan);
                }
                Ok(Node::new(
                    NodeKind::MetaProperty { meta: "import".into(), property: "meta".into() },
                    start.to(pspan),
                ))
            }
            _ => Err(self.error("unexpected import outside module header", start)),
        }
    }

    // ===== binding patterns (direct parse) =====

    /// Binding position: identifier, array pattern, or object pattern. The
    /// names are defined in the current scope as they are parsed, so that
    /// redeclaration diagnostics carry source positions.
    pub(crate) fn parse_binding_target(&mut self, sym: SymbolKind) -> ParseResult<Node> {
        let tok = self.tokens.peek()?.clone();
        match tok.kind {
            TokenKind::LeftBracket => self.parse_array_binding_pattern(sym),
            TokenKind::LeftBrace => self.parse_object_binding_pattern(sym),
            k if is_binding_name_kind(k) => {
                let tok = self.tokens.consume()?;
                let span = token_span(&tok);
                let name = tok.name().to_string();
                self.check_binding_name(&name, span, sym.is_lexical());
                self.define_symbol(sym, &name, span, false);
                Ok(Node::new(NodeKind::Identifier { name }, span))
            }
            _ => {
                let span = token_span(&tok);
                Err(self.error("missing name in binding position", span))
            }
        }
    }

    fn parse_array_binding_pattern(&mut self, sym: SymbolKind) -> ParseResult<Node> {
        let start = self.peek_span()?;
        if !self.config.es2015() {
            self.soft_error("destructuring patterns require ES2015", start);
        }
        self.must_match(TokenKind::LeftBracket, "missing [")?;
        let mut elements: Vec<Option<Node>> = Vec::new();
        loop {
            match self.tokens.peek_kind()? {
                TokenKind::RightBracket => break,
                TokenKind::Comma => {
                    self.next_token()?;
                    elements.push(None);
                    continue;
                }
                TokenKind::DotDotDot => {
                    let rest_tok = self.next_token()?;
                    let argument = self.parse_binding_target(sym)?;
                    let span = token_span(&rest_tok).to(argument.span);
                    if self.tokens.peek_kind()? == TokenKind::Assign {
                        self.soft_error("rest element may not have a default", span);
                    }
                    elements.push(Some(Node::new(
                        NodeKind::RestElement { argument: Box::new(argument) },
                        span,
                    )));
                    if self.tokens.peek_kind()? == TokenKind::Comma {
                        self.soft_error("rest element must be last", span);
                    }
                }
                _ => {
                    let target = self.parse_binding_target(sym)?;
                    let element = self.maybe_default(target)?;
                    elements.push(Some(element));
                }
            }
            if !self.tokens.match_kind(TokenKind::Comma)? {
                break;
            }
        }
        self.must_match(TokenKind::RightBracket, "missing ] after pattern")?;
        Ok(Node::new(NodeKind::ArrayPattern { elements }, self.span_from(start)))
    }

    fn parse_object_binding_pattern(&mut self, sym: SymbolKind) -> ParseResult<Node> {
        let start = self.peek_span()?;
        if !self.config.es2015() {
            self.soft_error("destructuring patterns require ES2015", start);
        }
        self.must_match(TokenKind::LeftBrace, "missing {")?;
        let mut properties = Vec::new();
        loop {
            match self.tokens.peek_kind()? {
                TokenKind::RightBrace => break,
                TokenKind::DotDotDot => {
                    let rest_tok = self.next_token()?;
                    if !self.config.version.at_least(EcmaVersion::Es2018) {
                        self.soft_error("object rest requires ES2018", token_span(&rest_tok));
                    }
                    let argument = self.parse_binding_target(sym)?;
                    let span = token_span(&rest_tok).to(argument.span);
                    if !argument.is_identifier() {
                        self.soft_error("object rest target must be a plain name", span);
                    }
                    properties.push(Node::new(
                        NodeKind::RestElement { argument: Box::new(argument) },
                        span,
                    ));
                    if self.tokens.peek_kind()? == TokenKind::Comma {
                        self.soft_error("rest element must be last", span);
                    }
                }
                _ => {
                    let prop_start = self.peek_span()?;
                    let (key, computed, key_tok) = self.parse_property_key()?;
                    let (value, kind) = if self.tokens.match_kind(TokenKind::Colon)? {
                        let target = self.parse_binding_target(sym)?;
                        (self.maybe_default(target)?, PropertyKind::Init)
                    } else {
                        // Shorthand binding
                        let Some(key_tok) = key_tok.filter(|t| is_binding_name_kind(t.kind))
                        else {
                            let span = self.peek_span()?;
                            return Err(self.error("missing : after property id", span));
                        };
                        let span = token_span(&key_tok);
                        let name = key_tok.name().to_string();
                        self.check_binding_name(&name, span, sym.is_lexical());
                        self.define_symbol(sym, &name, span, false);
                        let target = Node::new(NodeKind::Identifier { name }, span);
                        (self.maybe_default(target)?, PropertyKind::Shorthand)
                    };
                    let span = prop_start.to(value.span);
                    properties.push(Node::new(
                        NodeKind::Property {
                            key: Box::new(key),
                            value: Box::new(value),
                            kind,
                            computed,
                        },
                        span,
                    ));
                }
            }
            if !self.tokens.match_kind(TokenKind::Comma)? {
                break;
            }
        }
        self.must_match(TokenKind::RightBrace, "missing } after pattern")?;
        Ok(Node::new(NodeKind::ObjectPattern { properties }, self.span_from(start)))
    }

    /// Wrap a binding target with its default when an `=` follows.
    pub(crate) fn maybe_default(&mut self, target: Node) -> ParseResult<Node> {
        if !self.tokens.match_kind(TokenKind::Assign)? {
            return Ok(target);
        }
        let default = self.parse_assignment()?;
        let span = target.span.to(default.span);
        Ok(Node::new(
            NodeKind::AssignmentPattern { target: Box::new(target), default: Box::new(default) },
            span,
        ))
    }

    // ===== expression-to-pattern conversion =====

    /// Convert an already-parsed expression into an assignment target,
    /// clearing any pending cover-grammar error.
    pub(crate) fn to_assignment_target_root(&mut self, expr: Node) -> ParseResult<Node> {
        let node = self.to_assignment_target(expr, false)?;
        self.pending_cover = None;
        Ok(node)
    }

    /// Expression-to-pattern reinterpretation. `binding` is true for arrow
    /// parameter lists, where only declarable names may appear.
    pub(crate) fn to_assignment_target(&mut self, expr: Node, binding: bool) -> ParseResult<Node> {
        let span = expr.span;
        match expr.kind {
            NodeKind::Identifier { ref name } => {
                if self.fstate.strict && (name == "eval" || name == "arguments") {
                    self.soft_error(
                        format!("\"{name}\" may not be assigned in strict mode"),
                        span,
                    );
                }
                if binding {
                    self.check_binding_name(&clone_name(name), span, false);
                }
                Ok(expr)
            }
            NodeKind::Member { ref in_chain, ref optional, .. } => {
                if binding {
                    return Err(self.error("member expression not allowed in binding pattern", span));
                }
                if *in_chain || *optional {
                    self.soft_error("optional chain is not a valid assignment target", span);
                }
                Ok(expr)
            }
            NodeKind::Paren { expression } => {
                if binding {
                    return Err(self.error("parentheses not allowed in binding pattern", span));
                }
                self.to_assignment_target(*expression, false)
            }
            NodeKind::ArrayLiteral { elements, .. } => {
                let count = elements.len();
                let mut out: Vec<Option<Node>> = Vec::with_capacity(count);
                for (i, element) in elements.into_iter().enumerate() {
                    match element {
                        None => out.push(None),
                        Some(node) => {
                            let espan = node.span;
                            match node.kind {
                                NodeKind::SpreadElement { argument } => {
                                    if i + 1 != count {
                                        self.soft_error("rest element must be last", espan);
                                    }
                                    if matches!(argument.kind, NodeKind::Assignment { .. }) {
                                        self.soft_error(
                                            "rest element may not have a default",
                                            espan,
                                        );
                                    }
                                    let target = self.to_assignment_target(*argument, binding)?;
                                    out.push(Some(Node::new(
                                        NodeKind::RestElement { argument: Box::new(target) },
                                        espan,
                                    )));
                                }
                                _ => out.push(Some(self.to_pattern_element(node, binding)?)),
                            }
                        }
                    }
                }
                Ok(Node::new(NodeKind::ArrayPattern { elements: out }, span))
            }
            NodeKind::ObjectLiteral { properties, .. } => {
                let count = properties.len();
                let mut out = Vec::with_capacity(count);
                for (i, prop) in properties.into_iter().enumerate() {
                    let pspan = prop.span;
                    match prop.kind {
                        NodeKind::SpreadElement { argument } => {
                            if i + 1 != count {
                                self.soft_error("rest element must be last", pspan);
                            }
                            let ok_target = matches!(
                                argument.kind,
                                NodeKind::Identifier { .. } | NodeKind::Member { .. }
                            );
                            if !ok_target || (binding && !argument.is_identifier()) {
                                self.soft_error(
                                    "object rest target must be a plain name",
                                    pspan,
                                );
                            }
                            let target = self.to_assignment_target(*argument, binding)?;
                            out.push(Node::new(
                                NodeKind::RestElement { argument: Box::new(target) },
                                pspan,
                            ));
                        }
                        NodeKind::Property { key, value, kind, computed } => {
                            match kind {
                                PropertyKind::Init | PropertyKind::Shorthand => {}
                                _ => {
                                    return Err(self.error(
                                        "object pattern may not contain methods or accessors",
                                        pspan,
                                    ));
                                }
                            }
                            let value = self.to_pattern_element(*value, binding)?;
                            out.push(Node::new(
                                NodeKind::Property {
                                    key,
                                    value: Box::new(value),
                                    kind,
                                    computed,
                                },
                                pspan,
                            ));
                        }
                        _ => {
                            return Err(
                                self.error("invalid destructuring assignment target", pspan)
                            );
                        }
                    }
                }
                Ok(Node::new(NodeKind::ObjectPattern { properties: out }, span))
            }
            NodeKind::AssignmentPattern { .. } => Ok(expr),
            _ => Err(self.error("invalid destructuring assignment target", span)),
        }
    }

    /// Pattern element with possible default: `a = 1` becomes a defaulted
    /// target.
    fn to_pattern_element(&mut self, node: Node, binding: bool) -> ParseResult<Node> {
        let span = node.span;
        match node.kind {
            NodeKind::Assignment { op: AssignOp::Assign, target, value } => {
                let target = self.to_assignment_target(*target, binding)?;
                Ok(Node::new(
                    NodeKind::AssignmentPattern { target: Box::new(target), default: value },
                    span,
                ))
            }
            NodeKind::Assignment { .. } => {
                Err(self.error("invalid destructuring assignment target", span))
            }
            _ => self.to_assignment_target(node, binding),
        }
    }

    /// Targets of compound assignment and update operators: a name or a
    /// member access, nothing structural.
    pub(crate) fn check_simple_assignment_target(&mut self, node: &Node) {
        match &node.kind {
            NodeKind::Identifier { name } => {
                if self.fstate.strict && (name == "eval" || name == "arguments") {
                    self.soft_error(
                        format!("\"{name}\" may not be assigned in strict mode"),
                        node.span,
                    );
                }
            }
            NodeKind::Member { in_chain, optional, .. } => {
                if *in_chain || *optional {
                    self.soft_error(
                        "optional chain is not a valid assignment target",
                        node.span,
                    );
                }
            }
            NodeKind::Paren { expression } => self.check_simple_assignment_target(expression),
            _ => {
                self.soft_error("invalid assignment target", node.span);
            }
        }
    }
}

/// Build a `Property` node for a parsed object-literal member.
fn make_property(kind: PropertyKind, key: Node, value: Node, computed: bool) -> NodeKind {
    NodeKind::Property { key: Box::new(key), value: Box::new(value), kind, computed }
}

fn binary(op: BinaryOp, left: Node, right: Node) -> Node {
    let span = left.span.to(right.span);
    Node::new(NodeKind::Binary { op, left: Box::new(left), right: Box::new(right) }, span)
}

/// Whether a member chain bottoms out at `super`; such chains may not turn
/// optional.
fn rooted_in_super(node: &Node) -> bool {
    match &node.kind {
        NodeKind::Super => true,
        NodeKind::Member { object, .. } => rooted_in_super(object),
        _ => false,
    }
}

fn is_and_or(node: &Node) -> bool {
    matches!(
        node.kind,
        NodeKind::Logical { op: LogicalOp::And, .. } | NodeKind::Logical { op: LogicalOp::Or, .. }
    )
}

fn assign_op_for(kind: TokenKind) -> AssignOp {
    match kind {
        TokenKind::Assign => AssignOp::Assign,
        TokenKind::PlusAssign => AssignOp::Add,
        TokenKind::MinusAssign => AssignOp::Sub,
        TokenKind::StarAssign => AssignOp::Mul,
        TokenKind::SlashAssign => AssignOp::Div,
        TokenKind::PercentAssign => AssignOp::Mod,
        TokenKind::StarStarAssign => AssignOp::Exp,
        TokenKind::LeftShiftAssign => AssignOp::LeftShift,
        TokenKind::RightShiftAssign => AssignOp::RightShift,
        TokenKind::UnsignedRightShiftAssign => AssignOp::UnsignedRightShift,
        TokenKind::BitAndAssign => AssignOp::BitAnd,
        TokenKind::BitOrAssign => AssignOp::BitOr,
        TokenKind::BitXorAssign => AssignOp::BitXor,
        TokenKind::AndAndAssign => AssignOp::LogicalAnd,
        TokenKind::OrOrAssign => AssignOp::LogicalOr,
        _ => AssignOp::Nullish,
    }
}

fn clone_name(name: &str) -> String {
    name.to_string()
}
