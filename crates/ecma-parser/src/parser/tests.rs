use crate::lower::LowerStep;
use crate::{parse_script, EcmaVersion, Parser, ParserConfig};
use ecma_ast::{Node, NodeKind, VarKind};
use ecma_error::Severity;

fn parse_ide(src: &str) -> crate::ParseOutput {
    let config = ParserConfig::new().with_ide_mode(true);
    match Parser::new(src, config).parse_script() {
        Ok(out) => out,
        Err(e) => panic!("ide parse must not fail: {e}"),
    }
}

fn parse_module_ide(src: &str) -> crate::ParseOutput {
    let config = ParserConfig::new().with_ide_mode(true);
    match Parser::new(src, config).parse_module() {
        Ok(out) => out,
        Err(e) => panic!("ide parse must not fail: {e}"),
    }
}

fn errors(out: &crate::ParseOutput) -> Vec<String> {
    out.diagnostics
        .iter()
        .filter(|d| d.severity == Severity::Error)
        .map(|d| d.message.clone())
        .collect()
}

#[test]
fn empty_input_is_an_empty_program() {
    let out = parse_script("").expect("parse");
    match &out.root.kind {
        NodeKind::Program { body, .. } => assert!(body.is_empty()),
        other => panic!("expected program, got {other:?}"),
    }
    assert_eq!(out.root.span.len(), 0);
}

#[test]
fn use_strict_directive_sets_the_root_flag() {
    let out = parse_script("\"use strict\";").expect("parse");
    assert!(out.strict);
    let sloppy = parse_script("\"not a directive\";").expect("parse");
    assert!(!sloppy.strict);
}

#[test]
fn escaped_use_strict_is_not_a_directive() {
    let out = parse_script("\"use\\u0020strict\"; with ({}) {}").expect("parse");
    assert!(!out.strict);
    match &out.root.kind {
        NodeKind::Program { body, .. } => {
            assert!(matches!(body[1].kind, NodeKind::With { .. }))
        }
        _ => panic!("expected program"),
    }
}

#[test]
fn simple_let_declaration() {
    let out = parse_script("let x = 42;").expect("parse");
    assert_eq!(
        out.root.to_sexp(),
        "(program (let_declaration (declarator (identifier x) (number 42))))"
    );
}

#[test]
fn block_scoped_shadowing_parses_clean() {
    let out = parse_script("let x = 1; { let x = 2; } x").expect("parse");
    match &out.root.kind {
        NodeKind::Program { body, .. } => {
            assert_eq!(body.len(), 3);
            assert!(matches!(body[0].kind, NodeKind::VariableDeclaration { kind: VarKind::Let, .. }));
            assert!(matches!(body[1].kind, NodeKind::Block { .. }));
            assert!(matches!(body[2].kind, NodeKind::ExpressionStatement { .. }));
        }
        _ => panic!("expected program"),
    }
}

#[test]
fn let_redeclaration_reports_exactly_one_error() {
    let out = parse_ide("let x; let x;");
    let errs = errors(&out);
    assert_eq!(errs.len(), 1, "diagnostics: {errs:?}");
    assert!(errs[0].contains("redeclaration"));
    assert!(errs[0].contains('x'));
}

#[test]
fn var_let_conflicts_cross_block_boundaries() {
    // The var hoists through the block and collides with the outer let
    let out = parse_ide("{ var x; } let x;");
    assert_eq!(errors(&out).len(), 1);
    // Shadowing in a nested block is fine
    let ok = parse_ide("let x; { let x; }");
    assert!(errors(&ok).is_empty());
}

#[test]
fn for_loop_with_let_initializer() {
    let out = parse_script("for (let i = 0; i < 3; i++) {}").expect("parse");
    match &out.root.kind {
        NodeKind::Program { body, .. } => match &body[0].kind {
            NodeKind::For { init: Some(init), test: Some(_), update: Some(_), .. } => {
                assert!(matches!(
                    init.kind,
                    NodeKind::VariableDeclaration { kind: VarKind::Let, .. }
                ));
            }
            other => panic!("expected classic for, got {other:?}"),
        },
        _ => panic!("expected program"),
    }
}

#[test]
fn const_reassignment_in_loop_head_is_not_a_parse_error() {
    // The parser cannot see runtime writes; const in the head must parse
    let out = parse_script("for (const x = 0; x < 3; x++) {}").expect("parse");
    assert!(errors(&out).is_empty());
}

#[test]
fn for_of_and_for_in_heads() {
    let out = parse_script("for (const x of xs) {} for (let k in obj) {}").expect("parse");
    match &out.root.kind {
        NodeKind::Program { body, .. } => {
            assert!(matches!(body[0].kind, NodeKind::ForOf { .. }));
            assert!(matches!(body[1].kind, NodeKind::ForIn { .. }));
        }
        _ => panic!("expected program"),
    }
}

#[test]
fn for_in_var_initializer_tolerated_only_sloppy() {
    assert!(parse_script("for (var a = 0 in obj) {}").is_ok());
    let strict = parse_ide("\"use strict\"; for (var a = 0 in obj) {}");
    assert_eq!(errors(&strict).len(), 1);
    let of_form = parse_ide("for (var a = 0 of obj) {}");
    assert!(!errors(&of_form).is_empty());
}

#[test]
fn async_arrow_with_bare_parameter() {
    let out = parse_script("async x => await x").expect("parse");
    match &out.root.kind {
        NodeKind::Program { body, .. } => match &body[0].kind {
            NodeKind::ExpressionStatement { expression } => match &expression.kind {
                NodeKind::ArrowFunction { is_async, expression_body, params, body, .. } => {
                    assert!(*is_async);
                    assert!(*expression_body);
                    assert_eq!(params.len(), 1);
                    assert!(matches!(body.kind, NodeKind::Await { .. }));
                }
                other => panic!("expected arrow, got {other:?}"),
            },
            other => panic!("expected expression statement, got {other:?}"),
        },
        _ => panic!("expected program"),
    }
}

#[test]
fn async_call_versus_async_arrow() {
    let call = parse_script("async(1)").expect("parse");
    match &call.root.kind {
        NodeKind::Program { body, .. } => match &body[0].kind {
            NodeKind::ExpressionStatement { expression } => {
                assert!(matches!(expression.kind, NodeKind::Call { .. }));
            }
            _ => panic!("expected expression statement"),
        },
        _ => panic!("expected program"),
    }
    let arrow = parse_script("async (a) => a").expect("parse");
    match &arrow.root.kind {
        NodeKind::Program { body, .. } => match &body[0].kind {
            NodeKind::ExpressionStatement { expression } => {
                assert!(matches!(
                    expression.kind,
                    NodeKind::ArrowFunction { is_async: true, .. }
                ));
            }
            _ => panic!("expected expression statement"),
        },
        _ => panic!("expected program"),
    }
}

#[test]
fn arrow_requires_same_line() {
    // A newline before => means ASI already ended the statement
    let out = parse_ide("let f = x\n=> x");
    assert!(!errors(&out).is_empty());
}

#[test]
fn paren_arrow_with_default_and_rest() {
    let out = parse_script("(a = 1, ...rest) => rest").expect("parse");
    match &out.root.kind {
        NodeKind::Program { body, .. } => match &body[0].kind {
            NodeKind::ExpressionStatement { expression } => match &expression.kind {
                NodeKind::ArrowFunction { params, .. } => {
                    assert!(matches!(params[0].kind, NodeKind::AssignmentPattern { .. }));
                    assert!(matches!(params[1].kind, NodeKind::RestElement { .. }));
                }
                other => panic!("expected arrow, got {other:?}"),
            },
            _ => panic!("expected expression statement"),
        },
        _ => panic!("expected program"),
    }
}

#[test]
fn cover_initializer_outside_destructuring_is_an_error() {
    let out = parse_ide("({a = 1});");
    assert!(!errors(&out).is_empty());
    // ... but as an assignment pattern it is legitimate
    let ok = parse_script("({a = 1} = obj);").expect("parse");
    assert!(errors(&ok).is_empty());
}

#[test]
fn destructuring_assignment_converts_literals() {
    let out = parse_script("[a, {b}] = pair;").expect("parse");
    match &out.root.kind {
        NodeKind::Program { body, .. } => match &body[0].kind {
            NodeKind::ExpressionStatement { expression } => match &expression.kind {
                NodeKind::Assignment { target, .. } => {
                    assert!(matches!(target.kind, NodeKind::ArrayPattern { .. }));
                }
                other => panic!("expected assignment, got {other:?}"),
            },
            _ => panic!("expected expression statement"),
        },
        _ => panic!("expected program"),
    }
}

#[test]
fn nullish_may_not_mix_with_or() {
    let out = parse_ide("a ?? b || c;");
    let errs = errors(&out);
    assert_eq!(errs.len(), 1);
    assert!(errs[0].contains("??"));
    assert!(parse_script("a ?? (b || c);").is_ok());
    assert!(parse_script("(a ?? b) || c;").is_ok());
}

#[test]
fn exponent_rejects_unary_left_operand() {
    let out = parse_ide("-x ** 2;");
    assert_eq!(errors(&out).len(), 1);
    assert!(parse_script("(-x) ** 2;").is_ok());
    assert!(parse_script("2 ** -x;").is_ok());
}

#[test]
fn duplicate_parameters_in_strict_function() {
    let out = parse_ide("function f() { \"use strict\"; function g(a, a) {} }");
    let errs = errors(&out);
    assert_eq!(errs.len(), 1, "diagnostics: {errs:?}");
    assert!(errs[0].contains("duplicate parameter"));
}

#[test]
fn duplicate_parameters_with_defaults_even_sloppy() {
    let out = parse_ide("function f(a, a = 1) {}");
    assert_eq!(errors(&out).len(), 1);
    // Plain duplicates in sloppy simple lists are web reality
    assert!(parse_script("function f(a, a) {}").is_ok());
}

#[test]
fn use_strict_rejected_with_non_simple_parameters() {
    let out = parse_ide("function f(a = 1) { \"use strict\"; }");
    assert_eq!(errors(&out).len(), 1);
}

#[test]
fn optional_chain_tags_every_tail_link() {
    let out = parse_script("a?.b.c['d'](e)").expect("parse");
    fn assert_chain(node: &Node) {
        match &node.kind {
            NodeKind::Member { object, in_chain, .. } => {
                assert!(*in_chain, "member not tagged: {node:?}");
                assert_chain(object);
            }
            NodeKind::Call { callee, in_chain, .. } => {
                assert!(*in_chain, "call not tagged: {node:?}");
                assert_chain(callee);
            }
            NodeKind::Identifier { .. } => {}
            other => panic!("unexpected node in chain: {other:?}"),
        }
    }
    match &out.root.kind {
        NodeKind::Program { body, .. } => match &body[0].kind {
            NodeKind::ExpressionStatement { expression } => assert_chain(expression),
            _ => panic!("expected expression statement"),
        },
        _ => panic!("expected program"),
    }
}

#[test]
fn super_cannot_begin_an_optional_chain() {
    let out = parse_ide("class C extends B { constructor() { super.x?.y; x = super?.x; } }");
    assert!(!errors(&out).is_empty());
}

#[test]
fn postfix_update_requires_same_line() {
    // ASI splits this into `x;` and a prefix increment of y
    let out = parse_script("x\n++\ny").expect("parse");
    match &out.root.kind {
        NodeKind::Program { body, .. } => {
            assert_eq!(body.len(), 2);
            match &body[1].kind {
                NodeKind::ExpressionStatement { expression } => {
                    assert!(matches!(expression.kind, NodeKind::Update { prefix: true, .. }));
                }
                other => panic!("expected expression statement, got {other:?}"),
            }
        }
        _ => panic!("expected program"),
    }
    let ok = parse_script("x++").expect("parse");
    match &ok.root.kind {
        NodeKind::Program { body, .. } => match &body[0].kind {
            NodeKind::ExpressionStatement { expression } => {
                assert!(matches!(expression.kind, NodeKind::Update { prefix: false, .. }));
            }
            _ => panic!("expected expression statement"),
        },
        _ => panic!("expected program"),
    }
}

#[test]
fn return_argument_respects_asi() {
    let out = parse_script("function f() { return\n1; }").expect("parse");
    fn find_return(node: &Node, hits: &mut Vec<bool>) {
        if let NodeKind::Return { argument } = &node.kind {
            hits.push(argument.is_some());
        }
        node.for_each_child(&mut |c| find_return(c, hits));
    }
    let mut hits = Vec::new();
    find_return(&out.root, &mut hits);
    assert_eq!(hits, vec![false]);
}

#[test]
fn do_while_inserts_its_semicolon() {
    assert!(parse_script("do x(); while (a) b()").is_ok());
}

#[test]
fn template_literal_alternates_chunks_and_expressions() {
    let out = parse_script("`a${x}b${y}`").expect("parse");
    fn find_template(node: &Node, out: &mut Vec<(usize, usize)>) {
        if let NodeKind::TemplateLiteral { quasis, expressions } = &node.kind {
            out.push((quasis.len(), expressions.len()));
        }
        node.for_each_child(&mut |c| find_template(c, out));
    }
    let mut found = Vec::new();
    find_template(&out.root, &mut found);
    assert_eq!(found, vec![(3, 2)]);
}

#[test]
fn labeled_continue_must_name_a_loop() {
    assert!(parse_script("outer: while (a) { continue outer; }").is_ok());
    let bad = parse_ide("block: { continue block; }");
    assert!(!errors(&bad).is_empty());
    let undefined = parse_ide("while (a) { break nope; }");
    assert!(!errors(&undefined).is_empty());
}

#[test]
fn break_outside_loop_is_an_error() {
    let out = parse_ide("break;");
    assert_eq!(errors(&out).len(), 1);
}

#[test]
fn let_disambiguation() {
    // `let [` always opens a declaration
    let decl = parse_script("let [a] = xs;").expect("parse");
    match &decl.root.kind {
        NodeKind::Program { body, .. } => {
            assert!(matches!(body[0].kind, NodeKind::VariableDeclaration { .. }));
        }
        _ => panic!("expected program"),
    }
    // A lone `let` in sloppy code is an identifier
    let ident = parse_script("let;").expect("parse");
    match &ident.root.kind {
        NodeKind::Program { body, .. } => {
            assert!(matches!(body[0].kind, NodeKind::ExpressionStatement { .. }));
        }
        _ => panic!("expected program"),
    }
    // `let` then a newline then `{` is an identifier statement plus a block
    let split = parse_script("let\n{}").expect("parse");
    match &split.root.kind {
        NodeKind::Program { body, .. } => {
            assert_eq!(body.len(), 2);
            assert!(matches!(body[1].kind, NodeKind::Block { .. }));
        }
        _ => panic!("expected program"),
    }
}

#[test]
fn lexical_declaration_forbidden_in_single_statement_position() {
    let out = parse_ide("if (a) let x = 1;");
    assert!(!errors(&out).is_empty());
    let ok = parse_script("if (a) { let x = 1; }").expect("parse");
    assert!(errors(&ok).is_empty());
}

#[test]
fn yield_inside_and_outside_generators() {
    let gen_out = parse_script("function* g() { yield 1; yield* xs; yield; }").expect("parse");
    let mut yields = 0;
    fn count(node: &Node, n: &mut i32) {
        if matches!(node.kind, NodeKind::Yield { .. }) {
            *n += 1;
        }
        node.for_each_child(&mut |c| count(c, n));
    }
    count(&gen_out.root, &mut yields);
    assert_eq!(yields, 3);
    // Sloppy scripts may use yield as a plain name
    assert!(parse_script("var yield = 1;").is_ok());
    let strict = parse_ide("\"use strict\"; var yield = 1;");
    assert!(!errors(&strict).is_empty());
}

#[test]
fn class_with_private_members() {
    let src = "class C extends B { #x = 1; static #y() {} get p() { return this.#x; } }";
    let out = parse_script(src).expect("parse");
    match &out.root.kind {
        NodeKind::Program { body, .. } => match &body[0].kind {
            NodeKind::Class { name, superclass, elements, .. } => {
                assert!(name.is_some());
                assert!(superclass.is_some());
                assert_eq!(elements.len(), 3);
                assert!(matches!(
                    elements[0].kind,
                    NodeKind::PropertyDefinition { is_static: false, .. }
                ));
                assert!(matches!(
                    elements[1].kind,
                    NodeKind::MethodDefinition { is_static: true, .. }
                ));
                assert!(matches!(
                    elements[2].kind,
                    NodeKind::MethodDefinition { kind: ecma_ast::MethodKind::Get, .. }
                ));
            }
            other => panic!("expected class, got {other:?}"),
        },
        _ => panic!("expected program"),
    }
}

#[test]
fn undeclared_private_name_is_an_error() {
    let out = parse_ide("class C { m() { return this.#nope; } }");
    assert_eq!(errors(&out).len(), 1);
}

#[test]
fn constructor_rules() {
    let dup = parse_ide("class C { constructor() {} constructor() {} }");
    assert!(errors(&dup).iter().any(|e| e.contains("constructor")));
    let gen_out = parse_ide("class C { *constructor() {} }");
    assert!(!errors(&gen_out).is_empty());
    let proto = parse_ide("class C { static prototype() {} }");
    assert!(!errors(&proto).is_empty());
}

#[test]
fn accessor_arity() {
    let out = parse_ide("class C { get p(x) {} set q() {} }");
    assert_eq!(errors(&out).len(), 2);
}

#[test]
fn getters_and_setters_in_object_literals() {
    let out = parse_script("({ get x() { return 1; }, set x(v) {}, async m() {}, *g() {} });")
        .expect("parse");
    assert!(errors(&out).is_empty());
}

#[test]
fn module_export_forms() {
    let out = parse_module_ide(
        "export { foo as default } from \"m\";\n\
         export * as ns from \"m2\";\n\
         export default function () {}\n\
         export const k = 1;",
    );
    assert!(errors(&out).is_empty(), "diagnostics: {:?}", errors(&out));
    match &out.root.kind {
        NodeKind::Program { body, module: true, .. } => {
            assert!(matches!(
                &body[0].kind,
                NodeKind::ExportNamed { declaration: None, source: Some(_), specifiers }
                    if specifiers.len() == 1
            ));
            assert!(matches!(&body[1].kind, NodeKind::ExportAll { exported: Some(_), .. }));
            assert!(matches!(&body[2].kind, NodeKind::ExportDefault { .. }));
            assert!(matches!(&body[3].kind, NodeKind::ExportNamed { declaration: Some(_), .. }));
        }
        _ => panic!("expected module program"),
    }
}

#[test]
fn export_renames_keyword_as_exported_name() {
    let out = parse_module_ide("export { foo as default };\nlet foo = 1;");
    assert!(errors(&out).is_empty());
}

#[test]
fn import_forms() {
    let out = parse_module_ide(
        "import \"side-effect\";\n\
         import d from \"m\";\n\
         import * as ns from \"m\";\n\
         import { a, b as c } from \"m\";\n\
         import e, { f } from \"m\";",
    );
    assert!(errors(&out).is_empty(), "diagnostics: {:?}", errors(&out));
}

#[test]
fn module_headers_rejected_in_scripts_and_nested() {
    let script = parse_ide("import x from \"m\";");
    assert!(!errors(&script).is_empty());
    let nested = parse_module_ide("{ import x from \"m\"; }");
    assert!(!errors(&nested).is_empty());
    let in_function = parse_module_ide("function f() { import x from \"m\"; }");
    assert!(!errors(&in_function).is_empty());
}

#[test]
fn import_call_and_meta_are_expressions() {
    let out = parse_module_ide("import(\"m\").then(go);\nimport.meta.url;");
    assert!(errors(&out).is_empty(), "diagnostics: {:?}", errors(&out));
    let script = parse_ide("import.meta;");
    assert!(!errors(&script).is_empty());
}

#[test]
fn await_is_reserved_at_module_top_level() {
    let out = parse_module_ide("let x = await;");
    assert!(!errors(&out).is_empty());
    // In a script it is a plain identifier
    assert!(parse_script("let await = 1;").is_ok());
}

#[test]
fn destructuring_lowering_for_mixed_pattern() {
    let out = parse_script("const {a, b: [c = 1, ...rest]} = obj;").expect("parse");
    assert_eq!(out.lowerings.len(), 1);
    let lowering = &out.lowerings[0];
    assert_eq!(lowering.count(|s| matches!(s, LowerStep::GetIterator { .. })), 1);
    assert_eq!(lowering.count(|s| matches!(s, LowerStep::IteratorRest { .. })), 1);
    assert_eq!(
        lowering.count(|s| matches!(s, LowerStep::RequireObjectCoercible { .. })),
        1
    );
    assert_eq!(
        lowering.count(|s| matches!(s, LowerStep::DefaultIfUndefined { .. })),
        1
    );
    // Rest consumed the iterator, so no close
    assert_eq!(lowering.count(|s| matches!(s, LowerStep::IteratorClose { .. })), 0);
}

#[test]
fn array_lowering_closes_iterator_without_rest() {
    let out = parse_script("let [a, , b] = xs;").expect("parse");
    let lowering = &out.lowerings[0];
    assert_eq!(lowering.count(|s| matches!(s, LowerStep::GetIterator { .. })), 1);
    assert_eq!(lowering.count(|s| matches!(s, LowerStep::IteratorNext { .. })), 3);
    assert_eq!(lowering.count(|s| matches!(s, LowerStep::IteratorClose { .. })), 1);
}

#[test]
fn es5_lowers_arrays_by_index() {
    // The syntax is flagged under ES5, but the lowering falls back to the
    // index-based flavor
    let config = ParserConfig::new().with_version(EcmaVersion::Es5).with_ide_mode(true);
    let out = match Parser::new("var [a, b] = pair;", config).parse_script() {
        Ok(out) => out,
        Err(e) => panic!("parse: {e}"),
    };
    assert!(errors(&out).iter().any(|e| e.contains("ES2015")));
    let lowering = &out.lowerings[0];
    assert_eq!(lowering.count(|s| matches!(s, LowerStep::GetIterator { .. })), 0);
    assert_eq!(
        lowering.count(|s| matches!(s, LowerStep::GetProp { key: crate::PropKey::Index(_), .. })),
        2
    );
}

#[test]
fn function_name_inference_in_lowering() {
    let out = parse_script("let [fn = function () {}] = [];").expect("parse");
    let lowering = &out.lowerings[0];
    assert!(lowering.steps.iter().any(|s| matches!(
        s,
        LowerStep::DefaultIfUndefined { name_hint: Some(hint), .. } if hint == "fn"
    )));
}

#[test]
fn recovery_produces_error_nodes_and_continues() {
    let out = parse_ide("let x = ;\nlet y = 2;");
    assert!(!errors(&out).is_empty());
    match &out.root.kind {
        NodeKind::Program { body, .. } => {
            assert!(body.iter().any(|n| matches!(n.kind, NodeKind::Error { .. })));
            assert!(body.iter().any(|n| matches!(
                n.kind,
                NodeKind::VariableDeclaration { kind: VarKind::Let, .. }
            )));
        }
        _ => panic!("expected program"),
    }
}

#[test]
fn non_ide_callers_get_the_error_count() {
    match parse_script("a ?? b || c;") {
        Err(ecma_error::ParseError::SyntaxErrorCount { count }) => assert_eq!(count, 1),
        other => panic!("expected syntax error summary, got {other:?}"),
    }
}

#[test]
fn spans_nest_inside_parents() {
    let out = parse_script("if (a) { f(x + 1); } else g();").expect("parse");
    fn check(node: &Node) {
        node.for_each_child(&mut |child| {
            assert!(
                node.span.contains(child.span),
                "child {:?} escapes parent {:?}",
                child.span,
                node.span
            );
            check(child);
        });
    }
    check(&out.root);
}

#[test]
fn strict_mode_catches_the_usual_suspects() {
    let out = parse_ide(
        "\"use strict\"; var eval = 1; x = 015; s = \"\\07\"; delete x;",
    );
    let errs = errors(&out);
    assert_eq!(errs.len(), 4, "diagnostics: {errs:?}");
}

#[test]
fn missing_semicolon_warning_on_asi() {
    let out = parse_ide("a = 1\nb = 2");
    assert!(out
        .diagnostics
        .iter()
        .any(|d| d.severity == Severity::Warning && d.message.contains("missing ;")));
    assert!(errors(&out).is_empty());
}

#[test]
fn new_target_placement() {
    assert!(parse_script("function f() { return new.target; }").is_ok());
    let top = parse_ide("new.target;");
    assert!(!errors(&top).is_empty());
    // Arrows see the enclosing function's target
    assert!(parse_script("function f() { return () => new.target; }").is_ok());
}

#[test]
fn trailing_commas_recorded() {
    let out = parse_script("f(a, b,); function g(x,) {}").expect("parse");
    fn find(node: &Node, calls: &mut Vec<bool>, funcs: &mut Vec<bool>) {
        match &node.kind {
            NodeKind::Call { trailing_comma, .. } => calls.push(*trailing_comma),
            NodeKind::Function { params_trailing_comma, .. } => funcs.push(*params_trailing_comma),
            _ => {}
        }
        node.for_each_child(&mut |c| find(c, calls, funcs));
    }
    let mut calls = Vec::new();
    let mut funcs = Vec::new();
    find(&out.root, &mut calls, &mut funcs);
    assert_eq!(calls, vec![true]);
    assert_eq!(funcs, vec![true]);
}

#[test]
fn comments_recorded_and_jsdoc_attached() {
    let config = ParserConfig::new().with_comments(true);
    let out = match Parser::new("/** adds */ function add(a, b) { return a + b; } // tail", config)
        .parse_script()
    {
        Ok(out) => out,
        Err(e) => panic!("parse: {e}"),
    };
    assert_eq!(out.comments.len(), 2);
    match &out.root.kind {
        NodeKind::Program { body, .. } => {
            let doc = body[0].jsdoc.as_deref().unwrap_or("");
            assert!(doc.contains("adds"));
        }
        _ => panic!("expected program"),
    }
}

#[test]
fn deep_nesting_reports_recursion_limit() {
    let src = "(".repeat(2000) + &")".repeat(2000);
    match parse_script(&src) {
        Err(ecma_error::ParseError::TooDeepRecursion) => {}
        other => panic!("expected recursion fault, got {other:?}"),
    }
}

#[test]
fn single_use_parser_is_enforced_by_the_type_system() {
    // parse_script takes self by value; a second call simply cannot compile.
    let parser = Parser::new("1;", ParserConfig::default());
    let _ = parser.parse_script();
}
