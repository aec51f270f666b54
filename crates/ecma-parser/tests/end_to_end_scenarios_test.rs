//! End-to-end scenarios exercising the whole pipeline: lexer, parser, scope
//! tracking, and destructuring lowering together.

use ecma_ast::{MethodKind, Node, NodeKind, VarKind};
use ecma_error::{ParseError, Severity};
use ecma_parser::{parse_script, LowerStep, Parser, ParserConfig};
use pretty_assertions::assert_eq;

fn parse_ide(src: &str) -> ecma_parser::ParseOutput {
    let config = ParserConfig::new().with_ide_mode(true);
    match Parser::new(src, config).parse_script() {
        Ok(out) => out,
        Err(e) => panic!("ide parse must not fail: {e}"),
    }
}

fn parse_module_ide(src: &str) -> ecma_parser::ParseOutput {
    let config = ParserConfig::new().with_ide_mode(true);
    match Parser::new(src, config).parse_module() {
        Ok(out) => out,
        Err(e) => panic!("ide parse must not fail: {e}"),
    }
}

fn error_count(out: &ecma_parser::ParseOutput) -> usize {
    out.diagnostics.iter().filter(|d| d.severity == Severity::Error).count()
}

fn body(out: &ecma_parser::ParseOutput) -> &[Node] {
    match &out.root.kind {
        NodeKind::Program { body, .. } => body,
        other => panic!("expected program root, got {other:?}"),
    }
}

#[test]
fn scenario_block_scoped_shadowing() {
    let out = parse_script("let x = 1; { let x = 2; } x").expect("parse");
    let stmts = body(&out);
    assert_eq!(stmts.len(), 3);
    assert!(matches!(
        stmts[0].kind,
        NodeKind::VariableDeclaration { kind: VarKind::Let, .. }
    ));
    assert!(matches!(stmts[1].kind, NodeKind::Block { .. }));
    // The trailing expression binds the outer x; no redeclaration error
    assert_eq!(error_count(&out), 0);
}

#[test]
fn scenario_for_loop_with_let() {
    let out = parse_script("for (let i = 0; i < 3; i++) {}").expect("parse");
    match &body(&out)[0].kind {
        NodeKind::For { init: Some(init), body: loop_body, .. } => {
            assert!(matches!(
                init.kind,
                NodeKind::VariableDeclaration { kind: VarKind::Let, .. }
            ));
            assert!(matches!(loop_body.kind, NodeKind::Block { .. }));
        }
        other => panic!("expected for loop, got {other:?}"),
    }
}

#[test]
fn scenario_async_arrow_with_await_body() {
    let out = parse_script("async x => await x").expect("parse");
    match &body(&out)[0].kind {
        NodeKind::ExpressionStatement { expression } => match &expression.kind {
            NodeKind::ArrowFunction { is_async: true, body, .. } => {
                assert!(matches!(body.kind, NodeKind::Await { .. }));
            }
            other => panic!("expected async arrow, got {other:?}"),
        },
        other => panic!("expected expression statement, got {other:?}"),
    }
}

#[test]
fn scenario_mixed_destructuring_declaration() {
    let out = parse_script("const {a, b: [c = 1, ...rest]} = obj;").expect("parse");
    match &body(&out)[0].kind {
        NodeKind::VariableDeclaration { kind: VarKind::Const, declarations } => {
            match &declarations[0].kind {
                NodeKind::VariableDeclarator { id, init: Some(_) } => {
                    assert!(matches!(id.kind, NodeKind::ObjectPattern { .. }));
                }
                other => panic!("expected declarator, got {other:?}"),
            }
        }
        other => panic!("expected const declaration, got {other:?}"),
    }
    // Iterator protocol for the inner array, property access for the object
    let lowering = &out.lowerings[0];
    assert_eq!(lowering.count(|s| matches!(s, LowerStep::GetIterator { .. })), 1);
    assert_eq!(lowering.count(|s| matches!(s, LowerStep::GetProp { .. })), 2);
    assert_eq!(lowering.count(|s| matches!(s, LowerStep::IteratorRest { .. })), 1);
    assert_eq!(lowering.count(|s| matches!(s, LowerStep::DefaultIfUndefined { .. })), 1);
}

#[test]
fn scenario_class_with_private_members() {
    let src = "class C extends B { #x = 1; static #y(){} get p(){return this.#x} }";
    let out = parse_script(src).expect("parse");
    match &body(&out)[0].kind {
        NodeKind::Class { superclass: Some(superclass), elements, .. } => {
            assert!(matches!(
                superclass.kind,
                NodeKind::Identifier { ref name } if name == "B"
            ));
            assert_eq!(elements.len(), 3);
            assert!(matches!(
                &elements[0].kind,
                NodeKind::PropertyDefinition { key, value: Some(_), is_static: false, .. }
                    if matches!(key.kind, NodeKind::PrivateName { .. })
            ));
            assert!(matches!(
                &elements[1].kind,
                NodeKind::MethodDefinition { kind: MethodKind::Method, is_static: true, .. }
            ));
            assert!(matches!(
                &elements[2].kind,
                NodeKind::MethodDefinition { kind: MethodKind::Get, is_static: false, .. }
            ));
        }
        other => panic!("expected class declaration, got {other:?}"),
    }
}

#[test]
fn scenario_reexport_under_the_name_default() {
    let out = parse_module_ide("export { foo as default } from \"m\"");
    assert_eq!(error_count(&out), 0);
    match &body(&out)[0].kind {
        NodeKind::ExportNamed { declaration: None, specifiers, source: Some(source) } => {
            assert!(matches!(
                source.kind,
                NodeKind::StringLiteral { ref value } if value == "m"
            ));
            match &specifiers[0].kind {
                NodeKind::ExportSpecifier { local, exported } => {
                    assert_eq!(local.identifier_name(), Some("foo"));
                    assert_eq!(exported.identifier_name(), Some("default"));
                }
                other => panic!("expected export specifier, got {other:?}"),
            }
        }
        other => panic!("expected re-export, got {other:?}"),
    }
}

#[test]
fn scenario_nullish_mixing_is_a_syntax_error() {
    match parse_script("a ?? b || c") {
        Err(ParseError::SyntaxErrorCount { count }) => assert_eq!(count, 1),
        other => panic!("expected one syntax error, got {other:?}"),
    }
}

#[test]
fn scenario_duplicate_strict_parameters() {
    let out = parse_ide("function f() { \"use strict\"; function g(a, a) {} }");
    let messages: Vec<&str> = out
        .diagnostics
        .iter()
        .filter(|d| d.severity == Severity::Error)
        .map(|d| d.message.as_str())
        .collect();
    assert_eq!(messages.len(), 1, "diagnostics: {messages:?}");
    assert!(messages[0].contains("duplicate parameter"));
}

#[test]
fn every_node_stays_inside_its_parent() {
    let src = r#"
        class Store extends Base {
            #items = [];
            add(item, ...extra) {
                for (const [k, v] of Object.entries(item)) {
                    this.#items.push(`${k}: ${v}`);
                }
                return extra.length ?? 0;
            }
        }
        const store = new Store();
        async function load(url) {
            const { data = {} } = await fetch(url);
            return data;
        }
    "#;
    let out = parse_script(src).expect("parse");
    fn check(node: &Node) {
        node.for_each_child(&mut |child| {
            assert!(
                node.span.contains(child.span),
                "child {} escapes parent {}",
                child.span,
                node.span
            );
            check(child);
        });
    }
    check(&out.root);
}

#[test]
fn sexp_round_trip_is_deterministic() {
    let src = "let a = f(x?.y ?? 1, ...rest); `t${a}`;";
    let first = parse_script(src).expect("parse").root.to_sexp();
    let second = parse_script(src).expect("parse").root.to_sexp();
    assert_eq!(first, second);
}

#[test]
fn ide_mode_always_returns_a_tree() {
    let out = parse_ide("let = ; function ) { class \u{1F980} }");
    assert!(error_count(&out) > 0);
    // Partial tree with error placeholders, never a hard failure
    assert!(body(&out).iter().any(|n| matches!(n.kind, NodeKind::Error { .. })));
}
