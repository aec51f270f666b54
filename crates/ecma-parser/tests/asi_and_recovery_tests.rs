//! Automatic semicolon insertion cases and parser robustness properties.

use ecma_ast::{Node, NodeKind};
use ecma_error::Severity;
use ecma_parser::{parse_script, Parser, ParserConfig};
use proptest::prelude::*;
use rstest::rstest;

fn parse_ide(src: &str) -> ecma_parser::ParseOutput {
    let config = ParserConfig::new().with_ide_mode(true);
    match Parser::new(src, config).parse_script() {
        Ok(out) => out,
        Err(e) => panic!("ide parse must not fail on {src:?}: {e}"),
    }
}

fn statement_count(out: &ecma_parser::ParseOutput) -> usize {
    match &out.root.kind {
        NodeKind::Program { body, .. } => body.len(),
        _ => 0,
    }
}

#[rstest]
// A line break ends the statement
#[case("a = 1\nb = 2", 2)]
// Explicit semicolons
#[case("a = 1; b = 2;", 2)]
// Virtual semicolon before a closing brace
#[case("{ a = 1 }", 1)]
// ... and at end of input
#[case("a = 1", 1)]
// do-while gets its semicolon for free
#[case("do f(); while (x) g()", 2)]
// A return argument may not start on the next line
#[case("function f() { return\n1; }", 1)]
fn asi_accepts(#[case] src: &str, #[case] statements: usize) {
    let out = parse_ide(src);
    let errors = out
        .diagnostics
        .iter()
        .filter(|d| d.severity == Severity::Error)
        .count();
    assert_eq!(errors, 0, "unexpected errors for {src:?}: {:?}", out.diagnostics);
    assert_eq!(statement_count(&out), statements, "wrong split for {src:?}");
}

#[rstest]
// No line break, no semicolon: a real error
#[case("a = 1 b = 2")]
// The argument must follow throw on the same line
#[case("throw\nnew Error()")]
fn asi_rejects(#[case] src: &str) {
    let out = parse_ide(src);
    let errors = out
        .diagnostics
        .iter()
        .filter(|d| d.severity == Severity::Error)
        .count();
    assert!(errors > 0, "expected errors for {src:?}");
}

#[test]
fn missing_semicolon_is_a_warning_not_an_error() {
    let out = parse_ide("a = 1\nb = 2");
    assert!(out
        .diagnostics
        .iter()
        .any(|d| d.severity == Severity::Warning && d.message.contains("missing ;")));
    assert!(parse_script("a = 1\nb = 2").is_ok());
}

#[test]
fn recovery_spans_stay_nested() {
    let out = parse_ide("let x = ;\nif (a { b; }\nlet y = 2;");
    fn check(node: &Node) {
        node.for_each_child(&mut |child| {
            assert!(node.span.contains(child.span));
            check(child);
        });
    }
    check(&out.root);
    // The good trailing statement survived recovery
    match &out.root.kind {
        NodeKind::Program { body, .. } => {
            assert!(body.iter().any(|n| matches!(n.kind, NodeKind::VariableDeclaration { .. })));
        }
        _ => panic!("expected program"),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// IDE mode never fails and never panics, whatever the input shape.
    #[test]
    fn ide_mode_is_total(src in "[ a-z0-9=+;(){}\\[\\]\\.,<>!&|*/\"'`\n-]{0,60}") {
        let out = parse_ide(&src);
        // And the tree it returns keeps the span-nesting invariant
        fn check(node: &Node) {
            node.for_each_child(&mut |child| {
                assert!(node.span.contains(child.span));
                check(child);
            });
        }
        check(&out.root);
    }

    /// Identifier statements survive a parse round intact.
    #[test]
    fn identifiers_round_trip(name in "[a-z][a-z0-9_]{0,10}") {
        prop_assume!(ecma_token::KEYWORDS.get(name.as_str()).is_none());
        prop_assume!(!matches!(name.as_str(), "async" | "of" | "get" | "set" | "as" | "from"));
        let src = format!("{name};");
        let out = parse_ide(&src);
        match &out.root.kind {
            NodeKind::Program { body, .. } => match &body[0].kind {
                NodeKind::ExpressionStatement { expression } => {
                    prop_assert_eq!(expression.identifier_name(), Some(name.as_str()));
                }
                other => prop_assert!(false, "expected expression statement, got {:?}", other),
            },
            _ => prop_assert!(false, "expected program"),
        }
    }
}
