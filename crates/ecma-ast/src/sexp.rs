//! S-expression rendering of the AST.
//!
//! The format is for tests and tooling: compact, deterministic, one
//! parenthesized form per node. It is not a source round-trip.

use crate::{Node, NodeKind, PropertyKind};

impl Node {
    /// Convert the AST to an S-expression string.
    pub fn to_sexp(&self) -> String {
        let mut out = String::new();
        self.write_sexp(&mut out);
        out
    }

    fn write_sexp(&self, out: &mut String) {
        fn join(nodes: &[Node], out: &mut String) {
            for n in nodes {
                out.push(' ');
                n.write_sexp(out);
            }
        }
        fn sparse(nodes: &[Option<Node>], out: &mut String) {
            for n in nodes {
                out.push(' ');
                match n {
                    Some(n) => n.write_sexp(out),
                    None => out.push_str("(hole)"),
                }
            }
        }
        fn one(node: &Node, out: &mut String) {
            out.push(' ');
            node.write_sexp(out);
        }
        fn opt(node: &Option<Box<Node>>, out: &mut String) {
            match node {
                Some(n) => one(n, out),
                None => out.push_str(" ()"),
            }
        }

        match &self.kind {
            NodeKind::Program { body, module, .. } => {
                out.push_str(if *module { "(module" } else { "(program" });
                join(body, out);
                out.push(')');
            }
            NodeKind::ExpressionStatement { expression } => {
                out.push_str("(expression_statement");
                one(expression, out);
                out.push(')');
            }
            NodeKind::Block { statements } => {
                out.push_str("(block");
                join(statements, out);
                out.push(')');
            }
            NodeKind::Empty => out.push_str("(empty)"),
            NodeKind::If { condition, consequent, alternate, .. } => {
                out.push_str("(if");
                one(condition, out);
                one(consequent, out);
                if let Some(alt) = alternate {
                    out.push_str(" (else ");
                    alt.write_sexp(out);
                    out.push(')');
                }
                out.push(')');
            }
            NodeKind::DoWhile { body, condition } => {
                out.push_str("(do_while");
                one(body, out);
                one(condition, out);
                out.push(')');
            }
            NodeKind::While { condition, body } => {
                out.push_str("(while");
                one(condition, out);
                one(body, out);
                out.push(')');
            }
            NodeKind::For { init, test, update, body } => {
                out.push_str("(for");
                opt(init, out);
                opt(test, out);
                opt(update, out);
                one(body, out);
                out.push(')');
            }
            NodeKind::ForIn { left, right, body } => {
                out.push_str("(for_in");
                one(left, out);
                one(right, out);
                one(body, out);
                out.push(')');
            }
            NodeKind::ForOf { left, right, body } => {
                out.push_str("(for_of");
                one(left, out);
                one(right, out);
                one(body, out);
                out.push(')');
            }
            NodeKind::Switch { discriminant, cases } => {
                out.push_str("(switch");
                one(discriminant, out);
                join(cases, out);
                out.push(')');
            }
            NodeKind::SwitchCase { test, body } => {
                match test {
                    Some(t) => {
                        out.push_str("(case");
                        one(t, out);
                    }
                    None => out.push_str("(default"),
                }
                join(body, out);
                out.push(')');
            }
            NodeKind::Break { label } => {
                out.push_str("(break");
                if let Some(l) = label {
                    one(l, out);
                }
                out.push(')');
            }
            NodeKind::Continue { label } => {
                out.push_str("(continue");
                if let Some(l) = label {
                    one(l, out);
                }
                out.push(')');
            }
            NodeKind::Return { argument } => {
                out.push_str("(return");
                if let Some(a) = argument {
                    one(a, out);
                }
                out.push(')');
            }
            NodeKind::Throw { argument } => {
                out.push_str("(throw");
                one(argument, out);
                out.push(')');
            }
            NodeKind::Try { block, handler, finalizer } => {
                out.push_str("(try");
                one(block, out);
                if let Some(h) = handler {
                    one(h, out);
                }
                if let Some(f) = finalizer {
                    out.push_str(" (finally ");
                    f.write_sexp(out);
                    out.push(')');
                }
                out.push(')');
            }
            NodeKind::CatchClause { param, body } => {
                out.push_str("(catch");
                if let Some(p) = param {
                    one(p, out);
                }
                one(body, out);
                out.push(')');
            }
            NodeKind::With { object, body } => {
                out.push_str("(with");
                one(object, out);
                one(body, out);
                out.push(')');
            }
            NodeKind::Labeled { label, body } => {
                out.push_str("(labeled");
                one(label, out);
                one(body, out);
                out.push(')');
            }
            NodeKind::Debugger => out.push_str("(debugger)"),
            NodeKind::VariableDeclaration { kind, declarations } => {
                out.push('(');
                out.push_str(kind.as_str());
                out.push_str("_declaration");
                join(declarations, out);
                out.push(')');
            }
            NodeKind::VariableDeclarator { id, init } => {
                out.push_str("(declarator");
                one(id, out);
                if let Some(init) = init {
                    one(init, out);
                }
                out.push(')');
            }
            NodeKind::Error { message } => {
                out.push_str("(ERROR \"");
                out.push_str(message);
                out.push_str("\")");
            }
            NodeKind::Identifier { name } => {
                out.push_str("(identifier ");
                out.push_str(name);
                out.push(')');
            }
            NodeKind::PrivateName { name } => {
                out.push_str("(private_name #");
                out.push_str(name);
                out.push(')');
            }
            NodeKind::This => out.push_str("(this)"),
            NodeKind::Super => out.push_str("(super)"),
            NodeKind::NumberLiteral { raw, .. } => {
                out.push_str("(number ");
                out.push_str(raw);
                out.push(')');
            }
            NodeKind::BigIntLiteral { digits } => {
                out.push_str("(bigint ");
                out.push_str(digits);
                out.push_str("n)");
            }
            NodeKind::StringLiteral { value } => {
                out.push_str("(string \"");
                out.push_str(&value.escape_default().to_string());
                out.push_str("\")");
            }
            NodeKind::BooleanLiteral { value } => {
                out.push_str(if *value { "(true)" } else { "(false)" });
            }
            NodeKind::NullLiteral => out.push_str("(null)"),
            NodeKind::RegexLiteral { pattern, flags } => {
                out.push_str("(regex /");
                out.push_str(pattern);
                out.push('/');
                out.push_str(flags);
                out.push(')');
            }
            NodeKind::TemplateLiteral { quasis, expressions } => {
                out.push_str("(template");
                let mut exprs = expressions.iter();
                for q in quasis {
                    one(q, out);
                    if let Some(e) = exprs.next() {
                        one(e, out);
                    }
                }
                out.push(')');
            }
            NodeKind::TemplateElement { cooked, raw, .. } => {
                match cooked {
                    Some(c) => {
                        out.push_str("(chunk \"");
                        out.push_str(&c.escape_default().to_string());
                        out.push_str("\")");
                    }
                    None => {
                        out.push_str("(chunk raw \"");
                        out.push_str(&raw.escape_default().to_string());
                        out.push_str("\")");
                    }
                }
            }
            NodeKind::TaggedTemplate { tag, quasi } => {
                out.push_str("(tagged_template");
                one(tag, out);
                one(quasi, out);
                out.push(')');
            }
            NodeKind::ArrayLiteral { elements, .. } => {
                out.push_str("(array");
                sparse(elements, out);
                out.push(')');
            }
            NodeKind::ObjectLiteral { properties, .. } => {
                out.push_str("(object");
                join(properties, out);
                out.push(')');
            }
            NodeKind::Property { key, value, kind, computed } => {
                out.push_str(match kind {
                    PropertyKind::Init => "(property",
                    PropertyKind::Shorthand => "(shorthand",
                    PropertyKind::Method => "(method",
                    PropertyKind::Get => "(getter",
                    PropertyKind::Set => "(setter",
                });
                if *computed {
                    out.push_str(" computed");
                }
                one(key, out);
                if !matches!(kind, PropertyKind::Shorthand) {
                    one(value, out);
                }
                out.push(')');
            }
            NodeKind::SpreadElement { argument } => {
                out.push_str("(spread");
                one(argument, out);
                out.push(')');
            }
            NodeKind::Paren { expression } => {
                out.push_str("(paren");
                one(expression, out);
                out.push(')');
            }
            NodeKind::Sequence { expressions } => {
                out.push_str("(sequence");
                join(expressions, out);
                out.push(')');
            }
            NodeKind::Conditional { test, consequent, alternate } => {
                out.push_str("(conditional");
                one(test, out);
                one(consequent, out);
                one(alternate, out);
                out.push(')');
            }
            NodeKind::Binary { op, left, right } => {
                out.push_str("(binary ");
                out.push_str(op.as_str());
                one(left, out);
                one(right, out);
                out.push(')');
            }
            NodeKind::Logical { op, left, right } => {
                out.push_str("(logical ");
                out.push_str(op.as_str());
                one(left, out);
                one(right, out);
                out.push(')');
            }
            NodeKind::Unary { op, argument } => {
                out.push_str("(unary ");
                out.push_str(op.as_str());
                one(argument, out);
                out.push(')');
            }
            NodeKind::Update { op, prefix, argument } => {
                out.push_str(if *prefix { "(update prefix " } else { "(update postfix " });
                out.push_str(op.as_str());
                one(argument, out);
                out.push(')');
            }
            NodeKind::Assignment { op, target, value } => {
                out.push_str("(assign ");
                out.push_str(op.as_str());
                one(target, out);
                one(value, out);
                out.push(')');
            }
            NodeKind::Member { object, property, computed, optional, .. } => {
                out.push_str(if *optional { "(optional_member" } else { "(member" });
                if *computed {
                    out.push_str(" computed");
                }
                one(object, out);
                one(property, out);
                out.push(')');
            }
            NodeKind::Call { callee, arguments, optional, .. } => {
                out.push_str(if *optional { "(optional_call" } else { "(call" });
                one(callee, out);
                join(arguments, out);
                out.push(')');
            }
            NodeKind::New { callee, arguments, .. } => {
                out.push_str("(new");
                one(callee, out);
                join(arguments, out);
                out.push(')');
            }
            NodeKind::ImportCall { argument } => {
                out.push_str("(import_call");
                one(argument, out);
                out.push(')');
            }
            NodeKind::MetaProperty { meta, property } => {
                out.push_str("(meta ");
                out.push_str(meta);
                out.push('.');
                out.push_str(property);
                out.push(')');
            }
            NodeKind::Function { name, params, body, is_async, is_generator, .. } => {
                out.push('(');
                if *is_async {
                    out.push_str("async_");
                }
                out.push_str("function");
                if *is_generator {
                    out.push_str("_generator");
                }
                if let Some(n) = name {
                    one(n, out);
                }
                out.push_str(" (params");
                join(params, out);
                out.push(')');
                one(body, out);
                out.push(')');
            }
            NodeKind::ArrowFunction { params, body, is_async, .. } => {
                out.push_str(if *is_async { "(async_arrow" } else { "(arrow" });
                out.push_str(" (params");
                join(params, out);
                out.push(')');
                one(body, out);
                out.push(')');
            }
            NodeKind::Class { name, superclass, elements, .. } => {
                out.push_str("(class");
                if let Some(n) = name {
                    one(n, out);
                }
                if let Some(s) = superclass {
                    out.push_str(" (extends ");
                    s.write_sexp(out);
                    out.push(')');
                }
                join(elements, out);
                out.push(')');
            }
            NodeKind::MethodDefinition { key, value, kind, is_static, computed } => {
                out.push_str("(class_method ");
                out.push_str(kind.as_str());
                if *is_static {
                    out.push_str(" static");
                }
                if *computed {
                    out.push_str(" computed");
                }
                one(key, out);
                one(value, out);
                out.push(')');
            }
            NodeKind::PropertyDefinition { key, value, is_static, computed } => {
                out.push_str("(field");
                if *is_static {
                    out.push_str(" static");
                }
                if *computed {
                    out.push_str(" computed");
                }
                one(key, out);
                if let Some(v) = value {
                    one(v, out);
                }
                out.push(')');
            }
            NodeKind::Yield { argument, delegate } => {
                out.push_str(if *delegate { "(yield_star" } else { "(yield" });
                if let Some(a) = argument {
                    one(a, out);
                }
                out.push(')');
            }
            NodeKind::Await { argument } => {
                out.push_str("(await");
                one(argument, out);
                out.push(')');
            }
            NodeKind::ArrayPattern { elements } => {
                out.push_str("(array_pattern");
                sparse(elements, out);
                out.push(')');
            }
            NodeKind::ObjectPattern { properties } => {
                out.push_str("(object_pattern");
                join(properties, out);
                out.push(')');
            }
            NodeKind::AssignmentPattern { target, default } => {
                out.push_str("(default");
                one(target, out);
                one(default, out);
                out.push(')');
            }
            NodeKind::RestElement { argument } => {
                out.push_str("(rest");
                one(argument, out);
                out.push(')');
            }
            NodeKind::ImportDeclaration { specifiers, source } => {
                out.push_str("(import");
                join(specifiers, out);
                out.push_str(" (from ");
                source.write_sexp(out);
                out.push_str("))");
            }
            NodeKind::ImportDefaultSpecifier { local } => {
                out.push_str("(default_import");
                one(local, out);
                out.push(')');
            }
            NodeKind::ImportNamespaceSpecifier { local } => {
                out.push_str("(namespace_import");
                one(local, out);
                out.push(')');
            }
            NodeKind::ImportSpecifier { imported, local } => {
                out.push_str("(named_import");
                one(imported, out);
                one(local, out);
                out.push(')');
            }
            NodeKind::ExportNamed { declaration, specifiers, source } => {
                out.push_str("(export");
                if let Some(d) = declaration {
                    one(d, out);
                }
                join(specifiers, out);
                if let Some(s) = source {
                    out.push_str(" (from ");
                    s.write_sexp(out);
                    out.push(')');
                }
                out.push(')');
            }
            NodeKind::ExportSpecifier { local, exported } => {
                out.push_str("(export_specifier");
                one(local, out);
                one(exported, out);
                out.push(')');
            }
            NodeKind::ExportDefault { declaration } => {
                out.push_str("(export_default");
                one(declaration, out);
                out.push(')');
            }
            NodeKind::ExportAll { source, exported } => {
                out.push_str("(export_all");
                if let Some(e) = exported {
                    out.push_str(" (as ");
                    e.write_sexp(out);
                    out.push(')');
                }
                out.push_str(" (from ");
                source.write_sexp(out);
                out.push_str("))");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{Node, NodeKind, Span, VarKind};

    #[test]
    fn renders_declarations() {
        let id = Node::new(NodeKind::Identifier { name: "x".into() }, Span::default());
        let init = Node::new(
            NodeKind::NumberLiteral { value: 1.0, raw: "1".into() },
            Span::default(),
        );
        let decl = Node::new(
            NodeKind::VariableDeclaration {
                kind: VarKind::Let,
                declarations: vec![Node::new(
                    NodeKind::VariableDeclarator {
                        id: Box::new(id),
                        init: Some(Box::new(init)),
                    },
                    Span::default(),
                )],
            },
            Span::default(),
        );
        assert_eq!(
            decl.to_sexp(),
            "(let_declaration (declarator (identifier x) (number 1)))"
        );
    }
}
