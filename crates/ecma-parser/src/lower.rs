//! Destructuring lowering.
//!
//! Patterns in declarations, parameters, assignments, catch clauses, and
//! `for-in`/`for-of` heads are lowered to flat sequences of primitive steps
//! that a code generator can emit directly. Array patterns drive the iterator
//! protocol (one iterator acquisition per pattern, a close on the non-rest
//! paths); object patterns test object-coercibility once and read properties,
//! with rest elements copying the remaining own keys. Pre-ES2015 targets get
//! the historical index-based array lowering instead.
//!
//! Lowering runs as a separate pass after parsing: the parser has already
//! defined every target name (so redeclaration diagnostics point at source
//! positions), and this pass only builds the instruction sequences.

use ecma_ast::{Node, NodeKind, Span, VarKind};

/// Temporary slot index, local to one [`Lowering`].
pub type TempId = u32;

/// How a lowered value is bound at a leaf.
#[derive(Debug, Clone, PartialEq)]
pub enum BindTarget {
    Var(String),
    LetInit(String),
    Const(String),
    Param(String),
    /// Assignment destructuring onto an arbitrary target expression
    Assign(Box<Node>),
}

/// Property key of an object-pattern step.
#[derive(Debug, Clone, PartialEq)]
pub enum PropKey {
    /// Statically known name
    Static(String),
    /// Array index (pre-ES2015 array lowering)
    Index(u32),
    /// Computed key expression, evaluated at the step
    Computed(Box<Node>),
}

/// One primitive operation in a lowering sequence.
#[derive(Debug, Clone, PartialEq)]
pub enum LowerStep {
    /// `tN := <expr>` — evaluate the source of the whole pattern
    EvalSource { dest: TempId, expr: Box<Node> },
    /// `tN := <current iteration value>` — for `for-in`/`for-of` heads
    IterationValue { dest: TempId },
    /// `tN := <caught exception>` — destructuring catch parameters
    CaughtValue { dest: TempId },
    /// `tN := <parameter slot i>` — destructuring parameters
    ParamSlot { dest: TempId, index: u32 },
    /// `tN := GetIterator(tSrc)`
    GetIterator { dest: TempId, source: TempId },
    /// `tN := IteratorNext(iter).value` (an elision still performs the next)
    IteratorNext { dest: TempId, iter: TempId },
    /// `tN := [remaining values of iter]`
    IteratorRest { dest: TempId, iter: TempId },
    /// `if !done: IteratorClose(iter)`
    IteratorClose { iter: TempId },
    /// Throw if the source is `null`/`undefined`
    RequireObjectCoercible { source: TempId },
    /// `tN := tObj.key` / `tObj[key]` / `tArr[i]`
    GetProp { dest: TempId, object: TempId, key: PropKey },
    /// `tN := slice(tSrc, from)` — pre-ES2015 array rest
    SliceRest { dest: TempId, source: TempId, from: u32 },
    /// Copy remaining own enumerable keys, excluding those already bound
    ObjectRestCopy { dest: TempId, source: TempId, excluded: Vec<PropKey> },
    /// `tN := tN === undefined ? <default> : tN`; `name_hint` names anonymous
    /// functions and classes when the target is statically nameable
    DefaultIfUndefined { dest: TempId, default: Box<Node>, name_hint: Option<String> },
    /// Bind the value of a temp to its final target
    Bind { target: BindTarget, value: TempId },
}

/// Lowered form of one destructuring site.
#[derive(Debug, Clone, PartialEq)]
pub struct Lowering {
    /// Span of the pattern this sequence implements
    pub span: Span,
    pub steps: Vec<LowerStep>,
    /// Number of temporaries the sequence uses
    pub temps: u32,
}

impl Lowering {
    /// Count the steps of a given shape; convenience for tests and sanity
    /// checks.
    pub fn count(&self, pred: impl Fn(&LowerStep) -> bool) -> usize {
        self.steps.iter().filter(|s| pred(s)).count()
    }
}

/// Binding flavor at the leaves of a pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BindKind {
    Var,
    Let,
    Const,
    Param,
    Assign,
}

impl BindKind {
    fn target(self, node: &Node) -> BindTarget {
        match (self, &node.kind) {
            (BindKind::Var, NodeKind::Identifier { name }) => BindTarget::Var(name.clone()),
            (BindKind::Let, NodeKind::Identifier { name }) => BindTarget::LetInit(name.clone()),
            (BindKind::Const, NodeKind::Identifier { name }) => BindTarget::Const(name.clone()),
            (BindKind::Param, NodeKind::Identifier { name }) => BindTarget::Param(name.clone()),
            _ => BindTarget::Assign(Box::new(node.clone())),
        }
    }
}

struct LowerCtx {
    steps: Vec<LowerStep>,
    next_temp: TempId,
    es2015: bool,
}

impl LowerCtx {
    fn new(es2015: bool) -> Self {
        LowerCtx { steps: Vec::new(), next_temp: 0, es2015 }
    }

    fn temp(&mut self) -> TempId {
        let t = self.next_temp;
        self.next_temp += 1;
        t
    }

    fn finish(self, span: Span) -> Lowering {
        Lowering { span, steps: self.steps, temps: self.next_temp }
    }
}

/// Walk a parsed program and produce the lowering for every destructuring
/// site, in source order.
pub fn lower_program(root: &Node, es2015: bool) -> Vec<Lowering> {
    let mut out = Vec::new();
    visit(root, es2015, &mut out);
    out
}

fn visit(node: &Node, es2015: bool, out: &mut Vec<Lowering>) {
    match &node.kind {
        NodeKind::VariableDeclaration { kind, declarations } => {
            for decl in declarations {
                if let NodeKind::VariableDeclarator { id, init } = &decl.kind {
                    if !id.is_identifier() && id.is_pattern() {
                        out.push(lower_declarator(id, init.as_deref(), *kind, es2015));
                    }
                    // Pattern defaults and computed keys can hold nested sites
                    id.for_each_child(&mut |c| visit(c, es2015, out));
                    if let Some(init) = init {
                        visit(init, es2015, out);
                    }
                }
            }
        }
        NodeKind::Assignment { op, target, value, .. } => {
            if matches!(op, ecma_ast::AssignOp::Assign)
                && !target.is_identifier()
                && target.is_pattern()
            {
                out.push(lower_assignment(target, value, es2015));
            }
            visit(value, es2015, out);
            target.for_each_child(&mut |c| visit(c, es2015, out));
        }
        NodeKind::Function { params, body, .. } | NodeKind::ArrowFunction { params, body, .. } => {
            for (index, param) in params.iter().enumerate() {
                if let Some(lowering) = lower_param(param, index as u32, es2015) {
                    out.push(lowering);
                }
                // Defaults may contain further destructuring sites
                param.for_each_child(&mut |c| visit(c, es2015, out));
            }
            visit(body, es2015, out);
        }
        NodeKind::ForIn { left, right, body } | NodeKind::ForOf { left, right, body } => {
            lower_for_target(left, es2015, out);
            // Only descend for nested sites; the head pattern itself is done
            left.for_each_child(&mut |c| visit(c, es2015, out));
            visit(right, es2015, out);
            visit(body, es2015, out);
        }
        NodeKind::CatchClause { param, body } => {
            if let Some(param) = param {
                if !param.is_identifier() && param.is_pattern() {
                    let mut ctx = LowerCtx::new(es2015);
                    let src = ctx.temp();
                    ctx.steps.push(LowerStep::CaughtValue { dest: src });
                    lower_pattern(&mut ctx, param, src, BindKind::Let, false);
                    out.push(ctx.finish(param.span));
                }
                param.for_each_child(&mut |c| visit(c, es2015, out));
            }
            visit(body, es2015, out);
        }
        _ => {
            node.for_each_child(&mut |child| visit(child, es2015, out));
        }
    }
}

fn lower_for_target(left: &Node, es2015: bool, out: &mut Vec<Lowering>) {
    // `for ([a, b] of x)` and `for (let [a, b] of x)` both bind a fresh
    // iteration value each pass
    let (pattern, kind) = match &left.kind {
        NodeKind::VariableDeclaration { kind, declarations } => {
            match declarations.first().map(|d| &d.kind) {
                Some(NodeKind::VariableDeclarator { id, .. }) => (id.as_ref(), bind_kind(*kind)),
                _ => return,
            }
        }
        _ => (left, BindKind::Assign),
    };
    if pattern.is_identifier() || !pattern.is_pattern() {
        return;
    }
    let mut ctx = LowerCtx::new(es2015);
    let src = ctx.temp();
    ctx.steps.push(LowerStep::IterationValue { dest: src });
    lower_pattern(&mut ctx, pattern, src, kind, false);
    out.push(ctx.finish(pattern.span));
}

fn bind_kind(kind: VarKind) -> BindKind {
    match kind {
        VarKind::Var => BindKind::Var,
        VarKind::Let => BindKind::Let,
        VarKind::Const => BindKind::Const,
    }
}

fn lower_declarator(id: &Node, init: Option<&Node>, kind: VarKind, es2015: bool) -> Lowering {
    let mut ctx = LowerCtx::new(es2015);
    let src = ctx.temp();
    match init {
        Some(init) => {
            ctx.steps.push(LowerStep::EvalSource { dest: src, expr: Box::new(init.clone()) })
        }
        // `for (const [a] of xs)` style declarators arrive without init
        None => ctx.steps.push(LowerStep::IterationValue { dest: src }),
    }
    lower_pattern(&mut ctx, id, src, bind_kind(kind), false);
    ctx.finish(id.span)
}

fn lower_assignment(target: &Node, value: &Node, es2015: bool) -> Lowering {
    let mut ctx = LowerCtx::new(es2015);
    let src = ctx.temp();
    ctx.steps.push(LowerStep::EvalSource { dest: src, expr: Box::new(value.clone()) });
    lower_pattern(&mut ctx, target, src, BindKind::Assign, false);
    ctx.finish(target.span)
}

fn lower_param(param: &Node, index: u32, es2015: bool) -> Option<Lowering> {
    // Simple names and simple defaults need no lowering sequence; patterns
    // bind a synthetic temporary for the slot and run at body entry
    let needs = match &param.kind {
        NodeKind::ArrayPattern { .. } | NodeKind::ObjectPattern { .. } => true,
        NodeKind::AssignmentPattern { target, .. } => !target.is_identifier(),
        NodeKind::RestElement { argument } => !argument.is_identifier(),
        _ => false,
    };
    if !needs {
        return None;
    }
    let mut ctx = LowerCtx::new(es2015);
    let src = ctx.temp();
    ctx.steps.push(LowerStep::ParamSlot { dest: src, index });
    let inner = match &param.kind {
        NodeKind::RestElement { argument } => argument,
        _ => param,
    };
    lower_pattern(&mut ctx, inner, src, BindKind::Param, true);
    Some(ctx.finish(param.span))
}

/// Lower one pattern whose source value sits in `src`.
///
/// `binding_param` marks binding-position array patterns in parameters, where
/// an empty `[]` only has to prove the source iterable.
fn lower_pattern(ctx: &mut LowerCtx, pattern: &Node, src: TempId, kind: BindKind, binding_param: bool) {
    match &pattern.kind {
        NodeKind::Identifier { .. } => {
            ctx.steps.push(LowerStep::Bind { target: kind.target(pattern), value: src });
        }
        NodeKind::AssignmentPattern { target, default } => {
            ctx.steps.push(LowerStep::DefaultIfUndefined {
                dest: src,
                default: Box::new((**default).clone()),
                name_hint: default_name_hint(target, default),
            });
            lower_pattern(ctx, target, src, kind, binding_param);
        }
        NodeKind::ArrayPattern { elements } => {
            if ctx.es2015 {
                lower_array_iterator(ctx, elements, src, kind, binding_param);
            } else {
                lower_array_indexed(ctx, elements, src, kind);
            }
        }
        NodeKind::ObjectPattern { properties } => {
            lower_object(ctx, properties, src, kind);
        }
        NodeKind::Paren { expression } => lower_pattern(ctx, expression, src, kind, binding_param),
        // Member expressions and other assignment targets bind directly
        _ => {
            ctx.steps.push(LowerStep::Bind { target: kind.target(pattern), value: src });
        }
    }
}

fn lower_array_iterator(
    ctx: &mut LowerCtx,
    elements: &[Option<Node>],
    src: TempId,
    kind: BindKind,
    binding_param: bool,
) {
    let iter = ctx.temp();
    ctx.steps.push(LowerStep::GetIterator { dest: iter, source: src });
    if elements.is_empty() {
        // An empty assignment pattern still opens and closes the iterator; in
        // binding-parameter position iterability alone is required
        if !binding_param {
            ctx.steps.push(LowerStep::IteratorClose { iter });
        }
        return;
    }
    let mut exhausted_by_rest = false;
    for element in elements {
        match element {
            None => {
                // Elision: the iterator still advances
                let hole = ctx.temp();
                ctx.steps.push(LowerStep::IteratorNext { dest: hole, iter });
            }
            Some(node) => match &node.kind {
                NodeKind::RestElement { argument } => {
                    let rest = ctx.temp();
                    ctx.steps.push(LowerStep::IteratorRest { dest: rest, iter });
                    lower_pattern(ctx, argument, rest, kind, binding_param);
                    exhausted_by_rest = true;
                }
                _ => {
                    let value = ctx.temp();
                    ctx.steps.push(LowerStep::IteratorNext { dest: value, iter });
                    lower_pattern(ctx, node, value, kind, binding_param);
                }
            },
        }
    }
    if !exhausted_by_rest {
        ctx.steps.push(LowerStep::IteratorClose { iter });
    }
}

fn lower_array_indexed(
    ctx: &mut LowerCtx,
    elements: &[Option<Node>],
    src: TempId,
    kind: BindKind,
) {
    for (i, element) in elements.iter().enumerate() {
        let Some(node) = element else { continue };
        match &node.kind {
            NodeKind::RestElement { argument } => {
                let rest = ctx.temp();
                ctx.steps.push(LowerStep::SliceRest { dest: rest, source: src, from: i as u32 });
                lower_pattern(ctx, argument, rest, kind, false);
            }
            _ => {
                let value = ctx.temp();
                ctx.steps.push(LowerStep::GetProp {
                    dest: value,
                    object: src,
                    key: PropKey::Index(i as u32),
                });
                lower_pattern(ctx, node, value, kind, false);
            }
        }
    }
}

fn lower_object(ctx: &mut LowerCtx, properties: &[Node], src: TempId, kind: BindKind) {
    ctx.steps.push(LowerStep::RequireObjectCoercible { source: src });
    let mut bound_keys: Vec<PropKey> = Vec::new();
    for prop in properties {
        match &prop.kind {
            NodeKind::RestElement { argument } => {
                let rest = ctx.temp();
                ctx.steps.push(LowerStep::ObjectRestCopy {
                    dest: rest,
                    source: src,
                    excluded: bound_keys.clone(),
                });
                lower_pattern(ctx, argument, rest, kind, false);
            }
            NodeKind::Property { key, value, computed, .. } => {
                let prop_key = if *computed {
                    PropKey::Computed(Box::new((**key).clone()))
                } else {
                    match &key.kind {
                        NodeKind::Identifier { name } => PropKey::Static(name.clone()),
                        NodeKind::StringLiteral { value } => PropKey::Static(value.clone()),
                        NodeKind::NumberLiteral { raw, .. } => PropKey::Static(raw.clone()),
                        _ => PropKey::Computed(Box::new((**key).clone())),
                    }
                };
                bound_keys.push(prop_key.clone());
                let value_temp = ctx.temp();
                ctx.steps.push(LowerStep::GetProp {
                    dest: value_temp,
                    object: src,
                    key: prop_key,
                });
                lower_pattern(ctx, value, value_temp, kind, false);
            }
            _ => {}
        }
    }
}

/// Anonymous function and class initializers take the target's name, but only
/// when the target is statically nameable.
fn default_name_hint(target: &Node, default: &Node) -> Option<String> {
    let name = target.identifier_name()?;
    let anonymous = match &default.kind {
        NodeKind::Function { name, is_expression: true, .. } => name.is_none(),
        NodeKind::ArrowFunction { .. } => true,
        NodeKind::Class { name, is_expression: true, .. } => name.is_none(),
        _ => false,
    };
    anonymous.then(|| name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecma_ast::Span;

    fn ident(name: &str) -> Node {
        Node::new(NodeKind::Identifier { name: name.into() }, Span::default())
    }

    fn array_pattern(elements: Vec<Option<Node>>) -> Node {
        Node::new(NodeKind::ArrayPattern { elements }, Span::default())
    }

    #[test]
    fn array_pattern_acquires_one_iterator_and_closes() {
        let pattern = array_pattern(vec![Some(ident("a")), None, Some(ident("b"))]);
        let init = ident("xs");
        let lowering = lower_declarator(&pattern, Some(&init), VarKind::Let, true);
        assert_eq!(lowering.count(|s| matches!(s, LowerStep::GetIterator { .. })), 1);
        // Three nexts: a, the elision, b
        assert_eq!(lowering.count(|s| matches!(s, LowerStep::IteratorNext { .. })), 3);
        assert_eq!(lowering.count(|s| matches!(s, LowerStep::IteratorClose { .. })), 1);
    }

    #[test]
    fn rest_element_skips_iterator_close() {
        let rest = Node::new(
            NodeKind::RestElement { argument: Box::new(ident("rest")) },
            Span::default(),
        );
        let pattern = array_pattern(vec![Some(ident("a")), Some(rest)]);
        let init = ident("xs");
        let lowering = lower_declarator(&pattern, Some(&init), VarKind::Const, true);
        assert_eq!(lowering.count(|s| matches!(s, LowerStep::IteratorRest { .. })), 1);
        assert_eq!(lowering.count(|s| matches!(s, LowerStep::IteratorClose { .. })), 0);
        // Const binding at the leaves
        assert!(lowering.steps.iter().any(|s| matches!(
            s,
            LowerStep::Bind { target: BindTarget::Const(name), .. } if name == "rest"
        )));
    }

    #[test]
    fn pre_es2015_lowers_by_index() {
        let pattern = array_pattern(vec![Some(ident("a")), Some(ident("b"))]);
        let init = ident("xs");
        let lowering = lower_declarator(&pattern, Some(&init), VarKind::Var, false);
        assert_eq!(lowering.count(|s| matches!(s, LowerStep::GetIterator { .. })), 0);
        assert_eq!(
            lowering.count(|s| matches!(s, LowerStep::GetProp { key: PropKey::Index(_), .. })),
            2
        );
    }

    #[test]
    fn empty_object_pattern_requires_coercible() {
        let pattern = Node::new(NodeKind::ObjectPattern { properties: vec![] }, Span::default());
        let init = ident("src");
        let lowering = lower_declarator(&pattern, Some(&init), VarKind::Let, true);
        assert_eq!(
            lowering.count(|s| matches!(s, LowerStep::RequireObjectCoercible { .. })),
            1
        );
    }

    #[test]
    fn object_rest_excludes_bound_keys() {
        let prop = Node::new(
            NodeKind::Property {
                key: Box::new(ident("a")),
                value: Box::new(ident("a")),
                kind: ecma_ast::PropertyKind::Shorthand,
                computed: false,
            },
            Span::default(),
        );
        let rest = Node::new(
            NodeKind::RestElement { argument: Box::new(ident("r")) },
            Span::default(),
        );
        let pattern =
            Node::new(NodeKind::ObjectPattern { properties: vec![prop, rest] }, Span::default());
        let init = ident("src");
        let lowering = lower_declarator(&pattern, Some(&init), VarKind::Let, true);
        let copy = lowering
            .steps
            .iter()
            .find_map(|s| match s {
                LowerStep::ObjectRestCopy { excluded, .. } => Some(excluded.clone()),
                _ => None,
            })
            .expect("rest copy step");
        assert_eq!(copy, vec![PropKey::Static("a".into())]);
    }

    #[test]
    fn defaults_carry_name_hints_for_anonymous_functions() {
        let func = Node::new(
            NodeKind::Function {
                name: None,
                params: vec![],
                body: Box::new(Node::new(NodeKind::Block { statements: vec![] }, Span::default())),
                is_async: false,
                is_generator: false,
                is_expression: true,
                params_trailing_comma: false,
            },
            Span::default(),
        );
        let elem = Node::new(
            NodeKind::AssignmentPattern {
                target: Box::new(ident("fn")),
                default: Box::new(func),
            },
            Span::default(),
        );
        let pattern = array_pattern(vec![Some(elem)]);
        let init = array_pattern(vec![]);
        let lowering = lower_declarator(&pattern, Some(&init), VarKind::Let, true);
        assert!(lowering.steps.iter().any(|s| matches!(
            s,
            LowerStep::DefaultIfUndefined { name_hint: Some(hint), .. } if hint == "fn"
        )));
    }

    #[test]
    fn empty_array_param_only_checks_iterability() {
        let pattern = array_pattern(vec![]);
        let lowering = lower_param(&pattern, 0, true).expect("lowering");
        assert_eq!(lowering.count(|s| matches!(s, LowerStep::GetIterator { .. })), 1);
        assert_eq!(lowering.count(|s| matches!(s, LowerStep::IteratorClose { .. })), 0);
    }

    #[test]
    fn empty_array_assignment_still_closes() {
        let pattern = array_pattern(vec![]);
        let value = ident("xs");
        let lowering = lower_assignment(&pattern, &value, true);
        assert_eq!(lowering.count(|s| matches!(s, LowerStep::IteratorClose { .. })), 1);
    }
}
