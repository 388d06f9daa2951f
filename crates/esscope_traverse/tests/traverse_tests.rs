//! Scope resolution integration tests.
//!
//! Programs are parsed (or built with the node builder), traversed, and the
//! rewritten identifier slots are checked for pointer identity with their
//! declaring nodes.

use esscope_ast::node::*;
use esscope_ast::shape_eq;
use esscope_core::arena::AstArena;
use esscope_nodebuilder::{FunctionOptions, NodeBuilder};
use esscope_parser::parse;
use esscope_traverse::{
    traverse, try_traverse, ScopeKind, Traversal, TraverseError, TraverseOptions, MAX_NESTING_DEPTH,
};

fn parse_program<'a>(arena: &'a AstArena, source: &str) -> &'a Node<'a> {
    parse(arena, source).unwrap_or_else(|d| panic!("parse failed: {:?}", d))
}

fn resolve<'a>(program: &'a Node<'a>) -> Traversal<'a> {
    traverse(&TraverseOptions::default(), program, |_, _| {}).unwrap()
}

fn statement<'a>(program: &'a Node<'a>, index: usize) -> &'a Node<'a> {
    program.statements().unwrap()[index].get()
}

fn expression_of<'a>(node: &'a Node<'a>) -> &'a Node<'a> {
    match &node.kind {
        NodeKind::ExpressionStatement(statement) => statement.expression.get(),
        other => panic!("expected ExpressionStatement, got {:?}", other),
    }
}

fn declarator<'a>(node: &'a Node<'a>, index: usize) -> &'a VariableDeclarator<'a> {
    let NodeKind::VariableDeclaration(declaration) = &node.kind else {
        panic!("expected VariableDeclaration, got {}", node.syntax_name());
    };
    let NodeKind::VariableDeclarator(declarator) = &declaration.declarations[index].get().kind else {
        panic!("expected VariableDeclarator");
    };
    declarator
}

fn function_of<'a>(node: &'a Node<'a>) -> &'a Function<'a> {
    node.as_function().unwrap_or_else(|| panic!("expected function, got {}", node.syntax_name()))
}

fn assignment_of<'a>(node: &'a Node<'a>) -> &'a AssignmentExpression<'a> {
    match &node.kind {
        NodeKind::AssignmentExpression(assign) => assign,
        other => panic!("expected AssignmentExpression, got {:?}", other),
    }
}

fn call_of<'a>(node: &'a Node<'a>) -> &'a CallExpression<'a> {
    match &node.kind {
        NodeKind::CallExpression(call) => call,
        other => panic!("expected CallExpression, got {:?}", other),
    }
}

/// Statement `index` of a function body.
fn body_statement<'a>(func: &'a Function<'a>, index: usize) -> &'a Node<'a> {
    func.body.get().statements().unwrap()[index].get()
}

// ============================================================================
// Resolution
// ============================================================================

#[test]
fn test_empty_block() {
    let arena = AstArena::new();
    let b = NodeBuilder::new(&arena);
    let program = parse_program(&arena, "{}");
    let traversal = resolve(program);

    let block = statement(traversal.program, 0);
    assert!(shape_eq(b.block(&[]), block));
    assert_eq!(block.line(), Some(1));
    assert!(traversal.global_scope().is_empty());
}

#[test]
fn test_use_resolves_to_declarator_id() {
    let arena = AstArena::new();
    let program = parse_program(&arena, "var a = 2;\nvar b = a;");
    let traversal = resolve(program);

    let a = declarator(statement(program, 0), 0);
    let b = declarator(statement(program, 1), 0);
    let init = b.init.get().unwrap();
    assert!(Node::same_node(init, a.id.get()));
    assert_eq!(init.line(), Some(1));

    let global = traversal.global_scope();
    assert_eq!(global.bindings().map(|(name, _)| name).collect::<Vec<_>>(), vec!["a", "b"]);
    assert_eq!(global.resolve_var("b").node().map(|n| Node::same_node(n, b.id.get())), Some(true));
}

#[test]
fn test_implicit_global_assignment() {
    let arena = AstArena::new();
    let program = parse_program(&arena, "a = 3;\na");
    let traversal = resolve(program);

    let assign = assignment_of(expression_of(statement(program, 0)));
    let use_site = expression_of(statement(program, 1));
    assert!(Node::same_node(use_site, assign.left.get()));
    assert_eq!(use_site.line(), Some(1));

    let implicit = traversal.scope_manager.implicit_globals();
    assert_eq!(implicit.len(), 1);
    assert!(Node::same_node(implicit[0], assign.left.get()));
    assert!(traversal.unresolved_references().is_empty());
}

#[test]
fn test_function_expression_callee() {
    let arena = AstArena::new();
    let program = parse_program(&arena, "var a = function (b) {b;};\na(2)");
    let traversal = resolve(program);

    let a = declarator(statement(program, 0), 0);
    let call = call_of(expression_of(statement(program, 1)));
    assert!(Node::same_node(call.callee.get(), a.id.get()));

    let func = function_of(a.init.get().unwrap());
    let param = func.params[0].get();
    let inner_use = expression_of(body_statement(func, 0));
    assert!(Node::same_node(inner_use, param));

    assert!(traversal.global_scope().resolve_var("b").is_unresolved());
}

#[test]
fn test_member_property_is_not_resolved() {
    let arena = AstArena::new();
    let b = NodeBuilder::new(&arena);
    let program = parse_program(&arena, "var b;\na.b");
    let traversal = resolve(program);

    let member_node = expression_of(statement(program, 1));
    assert!(shape_eq(b.me("a", "b"), member_node));
    let NodeKind::MemberExpression(member) = &member_node.kind else {
        panic!("expected MemberExpression");
    };
    assert_eq!(member.qualified_name().as_deref(), Some("a.b"));
    assert!(!Node::same_node(member.property.get(), declarator(statement(program, 0), 0).id.get()));

    let unresolved: Vec<_> = traversal.unresolved_references().iter().map(|(name, _)| *name).collect();
    assert_eq!(unresolved, vec!["a"]);
}

#[test]
fn test_computed_member_over_array() {
    let arena = AstArena::new();
    let b = NodeBuilder::new(&arena);
    let program = parse_program(&arena, "[1,2,3,4][0]");
    resolve(program);

    let NodeKind::MemberExpression(member) = &expression_of(statement(program, 0)).kind else {
        panic!("expected MemberExpression");
    };
    assert!(member.computed);
    assert!(shape_eq(b.l(0.0), member.property.get()));
    let NodeKind::ArrayExpression(array) = &member.object.get().kind else {
        panic!("expected ArrayExpression");
    };
    assert_eq!(array.elements.len(), 4);
    assert!(shape_eq(b.l(1.0), array.elements[0].get().unwrap()));
}

#[test]
fn test_nested_object_literal() {
    let arena = AstArena::new();
    let b = NodeBuilder::new(&arena);
    let program = parse_program(&arena, "({a: {b: 2}, c: function () {}})");
    resolve(program);

    let expected = b.oe(&[b.prop("a", b.oe(&[b.prop("b", b.l(2.0))])), b.prop("c", b.func(None))]);
    assert!(shape_eq(expected, expression_of(statement(program, 0))));
}

#[test]
fn test_property_key_is_not_resolved() {
    let arena = AstArena::new();
    let program = parse_program(&arena, "var a;\n({a: a})");
    resolve(program);

    let id = declarator(statement(program, 0), 0).id.get();
    let NodeKind::ObjectExpression(object) = &expression_of(statement(program, 1)).kind else {
        panic!("expected ObjectExpression");
    };
    let NodeKind::Property(property) = &object.properties[0].get().kind else {
        panic!("expected Property");
    };
    assert!(!Node::same_node(property.key.get(), id));
    assert!(Node::same_node(property.value.get(), id));
}

#[test]
fn test_function_declaration() {
    let arena = AstArena::new();
    let b = NodeBuilder::new(&arena);
    let program = parse_program(&arena, "function foo() {}");
    let traversal = resolve(program);

    let decl = statement(program, 0);
    assert!(shape_eq(b.dec_func("foo", &[], None, FunctionOptions::default()), decl));
    let func = function_of(decl);
    assert!(!func.generator);
    assert!(!func.expression);
    assert!(func.body.get().statements().unwrap().is_empty());

    let foo = traversal.global_scope().lookup("foo").unwrap();
    assert!(Node::same_node(foo, func.id.get().unwrap()));
}

#[test]
fn test_control_flow_traverses() {
    let arena = AstArena::new();
    let source = "\
if (a) { b; } else { c; }
for (var i = 0; i < 10; i++) { i; }
a, b, c;
while (i) { i--; }
do { i++; } while (i < 3);
x ? y : z;
!a && -b || typeof c;
new Date(i);";
    let program = parse_program(&arena, source);
    let traversal = resolve(program);

    let NodeKind::ForStatement(for_stmt) = &statement(program, 1).kind else {
        panic!("expected ForStatement");
    };
    let i = declarator(for_stmt.init.get().unwrap(), 0).id.get();
    let NodeKind::BinaryExpression(test) = &for_stmt.test.get().unwrap().kind else {
        panic!("expected BinaryExpression");
    };
    assert!(Node::same_node(test.left.get(), i));
    assert!(traversal.global_scope().resolve_var("i").is_resolved());
}

#[test]
fn test_for_in_declares_variable() {
    let arena = AstArena::new();
    let program = parse_program(&arena, "var o = {};\nfor (var k in o) { k; }");
    resolve(program);

    let NodeKind::ForInStatement(for_in) = &statement(program, 1).kind else {
        panic!("expected ForInStatement");
    };
    let k = declarator(for_in.left.get(), 0).id.get();
    assert!(Node::same_node(for_in.right.get(), declarator(statement(program, 0), 0).id.get()));
    let body = for_in.body.get().statements().unwrap();
    assert!(Node::same_node(expression_of(body[0].get()), k));
}

#[test]
fn test_labels_are_not_resolved() {
    let arena = AstArena::new();
    let program = parse_program(&arena, "var outer;\nouter: for (;;) { break outer; }");
    let traversal = resolve(program);

    let id = declarator(statement(program, 0), 0).id.get();
    let NodeKind::LabeledStatement(labeled) = &statement(program, 1).kind else {
        panic!("expected LabeledStatement");
    };
    assert!(!Node::same_node(labeled.label.get(), id));
    assert!(traversal.unresolved_references().is_empty());
}

#[test]
fn test_switch_cases() {
    let arena = AstArena::new();
    let program = parse_program(&arena, "switch (x) { case 1: var y; break; default: y; }");
    resolve(program);

    let NodeKind::SwitchStatement(switch) = &statement(program, 0).kind else {
        panic!("expected SwitchStatement");
    };
    let NodeKind::SwitchCase(first) = &switch.cases[0].get().kind else {
        panic!("expected SwitchCase");
    };
    let NodeKind::SwitchCase(default) = &switch.cases[1].get().kind else {
        panic!("expected SwitchCase");
    };
    let y = declarator(first.consequent[0].get(), 0).id.get();
    assert!(Node::same_node(expression_of(default.consequent[0].get()), y));
}

#[test]
fn test_undeclared_names_never_fail() {
    let arena = AstArena::new();
    let program = parse_program(&arena, "undefinedThing(1);\nx += 2;");
    let traversal = resolve(program);

    let names: Vec<_> = traversal.unresolved_references().iter().map(|(name, _)| *name).collect();
    assert_eq!(names, vec!["undefinedThing", "x"]);
    assert!(traversal.global_scope().is_empty());
    assert!(traversal.scope_manager.implicit_globals().is_empty());
}

#[test]
fn test_self_assignment_leaves_right_unresolved() {
    let arena = AstArena::new();
    let program = parse_program(&arena, "x = x;");
    let traversal = resolve(program);

    let assign = assignment_of(expression_of(statement(program, 0)));
    assert!(!Node::same_node(assign.right.get(), assign.left.get()));
    assert_eq!(traversal.unresolved_references().len(), 1);
    assert!(Node::same_node(traversal.unresolved_references()[0].1, assign.right.get()));
    assert!(Node::same_node(traversal.global_scope().lookup("x").unwrap(), assign.left.get()));
}

#[test]
fn test_implicit_global_from_function() {
    let arena = AstArena::new();
    let program = parse_program(&arena, "function f() { g = 1; }\ng;");
    let traversal = resolve(program);

    let func = function_of(statement(program, 0));
    let assign = assignment_of(expression_of(body_statement(func, 0)));
    assert!(Node::same_node(expression_of(statement(program, 1)), assign.left.get()));

    let function_scope = traversal.scope_manager.scopes().nth(1).unwrap();
    assert_eq!(function_scope.kind(), ScopeKind::Function);
    assert!(function_scope.lookup("g").is_none());
}

#[test]
fn test_implicit_globals_disabled() {
    let arena = AstArena::new();
    let program = parse_program(&arena, "a = 3;\na");
    let options = TraverseOptions {
        implicit_globals: false,
        ..TraverseOptions::default()
    };
    let traversal = traverse(&options, program, |_, _| {}).unwrap();

    assert!(traversal.global_scope().is_empty());
    assert_eq!(traversal.unresolved_references().len(), 2);
}

#[test]
fn test_function_expression_name_is_declared_outside() {
    let arena = AstArena::new();
    let program = parse_program(&arena, "var g = function h() {};\nh;");
    resolve(program);

    let func = function_of(declarator(statement(program, 0), 0).init.get().unwrap());
    assert!(Node::same_node(expression_of(statement(program, 1)), func.id.get().unwrap()));
}

// ============================================================================
// Hoisting and scopes
// ============================================================================

#[test]
fn test_hoisted_forward_references() {
    let arena = AstArena::new();
    let program = parse_program(&arena, "f();\nx;\nfunction f() {}\nvar x = 1;");
    let traversal = resolve(program);

    let call = call_of(expression_of(statement(program, 0)));
    let f = function_of(statement(program, 2)).id.get().unwrap();
    assert!(Node::same_node(call.callee.get(), f));
    let x = declarator(statement(program, 3), 0).id.get();
    assert!(Node::same_node(expression_of(statement(program, 1)), x));
    assert!(traversal.unresolved_references().is_empty());
}

#[test]
fn test_hoisting_disabled() {
    let arena = AstArena::new();
    let program = parse_program(&arena, "f();\nfunction f() {}");
    let options = TraverseOptions::from_json_str(r#"{"hoistDeclarations": false}"#).unwrap();
    let traversal = traverse(&options, program, |_, _| {}).unwrap();

    let names: Vec<_> = traversal.unresolved_references().iter().map(|(name, _)| *name).collect();
    assert_eq!(names, vec!["f"]);
    assert!(traversal.global_scope().resolve_var("f").is_resolved());
}

#[test]
fn test_hoisting_reaches_nested_blocks() {
    let arena = AstArena::new();
    let program = parse_program(&arena, "function g() {\n  y;\n  if (1) { var y; }\n}");
    let traversal = resolve(program);

    let func = function_of(statement(program, 0));
    let NodeKind::IfStatement(if_stmt) = &body_statement(func, 1).kind else {
        panic!("expected IfStatement");
    };
    let block = if_stmt.consequent.get().statements().unwrap();
    let y = declarator(block[0].get(), 0).id.get();
    assert!(Node::same_node(expression_of(body_statement(func, 0)), y));
    assert!(traversal.global_scope().lookup("y").is_none());
}

#[test]
fn test_hoisting_stops_at_nested_functions() {
    let arena = AstArena::new();
    let program = parse_program(&arena, "function outer() {\n  z;\n  function inner() { var z; }\n}");
    let traversal = resolve(program);

    let names: Vec<_> = traversal.unresolved_references().iter().map(|(name, _)| *name).collect();
    assert_eq!(names, vec!["z"]);
}

#[test]
fn test_redeclaration_last_wins() {
    let arena = AstArena::new();
    let program = parse_program(&arena, "var a = 1;\na;\nvar a = 2;\na;");
    let traversal = resolve(program);

    let first = declarator(statement(program, 0), 0).id.get();
    let second = declarator(statement(program, 2), 0).id.get();
    assert!(Node::same_node(expression_of(statement(program, 1)), first));
    assert!(Node::same_node(expression_of(statement(program, 3)), second));
    assert!(Node::same_node(traversal.global_scope().lookup("a").unwrap(), second));
}

#[test]
fn test_function_locals_invisible_outside() {
    let arena = AstArena::new();
    let program = parse_program(&arena, "function f(p) { var local = 1; }\nlocal;\np;");
    let traversal = resolve(program);

    let names: Vec<_> = traversal.unresolved_references().iter().map(|(name, _)| *name).collect();
    assert_eq!(names, vec!["local", "p"]);
    assert!(traversal.global_scope().resolve_var("local").is_unresolved());

    let scopes: Vec<_> = traversal.scope_manager.scopes().collect();
    assert_eq!(scopes.len(), 2);
    let function_scope = scopes[1];
    assert_eq!(function_scope.kind(), ScopeKind::Function);
    assert_eq!(function_scope.bindings().map(|(name, _)| name).collect::<Vec<_>>(), vec!["p", "local"]);
    assert!(Node::same_node(function_scope.owner().unwrap(), statement(program, 0)));
    assert_eq!(function_scope.parent().map(|p| p.kind()), Some(ScopeKind::Global));
}

#[test]
fn test_inner_function_sees_outer_bindings() {
    let arena = AstArena::new();
    let program = parse_program(&arena, "var n = 1;\nfunction f() { return function () { return n; }; }");
    let traversal = resolve(program);

    assert!(traversal.unresolved_references().is_empty());
    assert_eq!(traversal.scope_manager.scope_count(), 3);
    assert_eq!(traversal.scope_manager.depth(), 1);
}

// ============================================================================
// Lines and visitor
// ============================================================================

#[test]
fn test_visited_nodes_carry_source_lines() {
    let arena = AstArena::new();
    let program = parse_program(&arena, "var a = 1;\n\nfoo(\n  a\n);");
    let mut lines = Vec::new();
    traverse(&TraverseOptions::default(), program, |_, node| {
        lines.push((node.syntax_name(), node.identifier_name(), node.line()));
    })
    .unwrap();

    assert!(lines.iter().all(|(_, _, line)| line.is_some()));
    assert!(lines.contains(&("Identifier", Some("a"), Some(4))));
    assert!(lines.contains(&("CallExpression", None, Some(3))));
}

#[test]
fn test_builder_tree_lines_default_to_first_line() {
    let arena = AstArena::new();
    let b = NodeBuilder::new(&arena);
    let use_site = b.i("a");
    let program = b.program(&[b.var_decl("a", Some(b.l(2.0))), b.expr_stmt(use_site)]);
    let mut count = 0;
    let traversal = traverse(&TraverseOptions::default(), program, |_, node| {
        assert_eq!(node.line(), Some(1));
        count += 1;
    })
    .unwrap();

    assert_eq!(count, 7);
    assert_eq!(program.line(), Some(1));
    assert!(Node::same_node(
        expression_of(statement(program, 1)),
        traversal.global_scope().lookup("a").unwrap()
    ));
}

#[test]
fn test_synthesized_node_inherits_parent_line() {
    let arena = AstArena::new();
    let b = NodeBuilder::new(&arena);
    let program = parse_program(&arena, "var a;\n\nf(0);");
    let call = call_of(expression_of(statement(program, 1)));
    let synthesized = b.ce(b.i("a"), &[]);
    call.arguments[0].set(synthesized);
    resolve(program);

    assert_eq!(synthesized.line(), Some(3));
    let NodeKind::CallExpression(inner) = &synthesized.kind else {
        panic!("expected CallExpression");
    };
    assert!(Node::same_node(inner.callee.get(), declarator(statement(program, 0), 0).id.get()));
}

#[test]
fn test_visitor_order_and_scopes() {
    let arena = AstArena::new();
    let program = parse_program(&arena, "function f(p) { p; }");
    let mut seen = Vec::new();
    traverse(&TraverseOptions::default(), program, |scope, node| {
        seen.push((node.syntax_name(), node.identifier_name(), scope.kind()));
    })
    .unwrap();

    assert_eq!(
        seen,
        vec![
            ("Program", None, ScopeKind::Global),
            ("FunctionDeclaration", None, ScopeKind::Global),
            ("Identifier", Some("f"), ScopeKind::Global),
            ("Identifier", Some("p"), ScopeKind::Function),
            ("BlockStatement", None, ScopeKind::Function),
            ("ExpressionStatement", None, ScopeKind::Function),
            ("Identifier", Some("p"), ScopeKind::Function),
        ]
    );
}

#[test]
fn test_visitor_sees_use_before_rewrite() {
    let arena = AstArena::new();
    let program = parse_program(&arena, "var a;\na;");
    let use_site = expression_of(statement(program, 1));
    let mut visited_use = false;
    traverse(&TraverseOptions::default(), program, |_, node| {
        visited_use |= Node::same_node(node, use_site);
    })
    .unwrap();

    assert!(visited_use);
    assert!(!Node::same_node(expression_of(statement(program, 1)), use_site));
}

/// The contents of every child slot in the tree, in a fixed walk order.
/// `None` stands for an empty optional slot.
fn slot_contents<'a>(program: &'a Node<'a>) -> Vec<Option<&'a Node<'a>>> {
    fn slots<'a>(node: &'a Node<'a>) -> Vec<Option<&'a Node<'a>>> {
        let all_of = |list: NodeList<'a>| list.iter().map(|slot| Some(slot.get())).collect::<Vec<_>>();
        match &node.kind {
            NodeKind::Program(p) => all_of(p.body),
            NodeKind::BlockStatement(b) => all_of(b.body),
            NodeKind::ExpressionStatement(e) => vec![Some(e.expression.get())],
            NodeKind::VariableDeclaration(d) => all_of(d.declarations),
            NodeKind::VariableDeclarator(d) => vec![Some(d.id.get()), d.init.get()],
            NodeKind::FunctionDeclaration(f) | NodeKind::FunctionExpression(f) => {
                let mut all = vec![f.id.get()];
                all.extend(all_of(f.params));
                all.push(Some(f.body.get()));
                all
            }
            NodeKind::IfStatement(s) => vec![Some(s.test.get()), Some(s.consequent.get()), s.alternate.get()],
            NodeKind::ForStatement(s) => vec![s.init.get(), s.test.get(), s.update.get(), Some(s.body.get())],
            NodeKind::ForInStatement(s) => vec![Some(s.left.get()), Some(s.right.get()), Some(s.body.get())],
            NodeKind::WhileStatement(s) | NodeKind::DoWhileStatement(s) => vec![Some(s.test.get()), Some(s.body.get())],
            NodeKind::ReturnStatement(s) => vec![s.argument.get()],
            NodeKind::BreakStatement(s) | NodeKind::ContinueStatement(s) => vec![s.label.get()],
            NodeKind::ThrowStatement(s) => vec![Some(s.argument.get())],
            NodeKind::TryStatement(s) => vec![Some(s.block.get()), s.handler.get(), s.finalizer.get()],
            NodeKind::CatchClause(c) => vec![Some(c.param.get()), Some(c.body.get())],
            NodeKind::WithStatement(s) => vec![Some(s.object.get()), Some(s.body.get())],
            NodeKind::LabeledStatement(s) => vec![Some(s.label.get()), Some(s.body.get())],
            NodeKind::SwitchStatement(s) => {
                let mut all = vec![Some(s.discriminant.get())];
                all.extend(all_of(s.cases));
                all
            }
            NodeKind::SwitchCase(c) => {
                let mut all = vec![c.test.get()];
                all.extend(all_of(c.consequent));
                all
            }
            NodeKind::ArrayExpression(a) => a.elements.iter().map(|slot| slot.get()).collect(),
            NodeKind::ObjectExpression(o) => all_of(o.properties),
            NodeKind::Property(p) => vec![Some(p.key.get()), Some(p.value.get())],
            NodeKind::MemberExpression(m) => vec![Some(m.object.get()), Some(m.property.get())],
            NodeKind::CallExpression(c) | NodeKind::NewExpression(c) => {
                let mut all = vec![Some(c.callee.get())];
                all.extend(all_of(c.arguments));
                all
            }
            NodeKind::AssignmentExpression(e) => vec![Some(e.left.get()), Some(e.right.get())],
            NodeKind::BinaryExpression(e) => vec![Some(e.left.get()), Some(e.right.get())],
            NodeKind::LogicalExpression(e) => vec![Some(e.left.get()), Some(e.right.get())],
            NodeKind::UnaryExpression(e) => vec![Some(e.argument.get())],
            NodeKind::UpdateExpression(e) => vec![Some(e.argument.get())],
            NodeKind::ConditionalExpression(e) => {
                vec![Some(e.test.get()), Some(e.consequent.get()), Some(e.alternate.get())]
            }
            NodeKind::SequenceExpression(e) => all_of(e.expressions),
            NodeKind::EmptyStatement
            | NodeKind::ThisExpression
            | NodeKind::Identifier(_)
            | NodeKind::Literal(_) => Vec::new(),
        }
    }

    let mut contents = Vec::new();
    let mut pending = vec![program];
    while let Some(node) = pending.pop() {
        let children = slots(node);
        pending.extend(children.iter().rev().flatten());
        contents.extend(children);
    }
    contents
}

#[test]
fn test_retraversal_is_idempotent() {
    let arena = AstArena::new();
    let source = "var a = 2;\nvar b = a;\nfunction f(x) { return x + a; }\nc = a;\nc;\nvar o = { k: [b, , f(a)] };";
    let program = parse_program(&arena, source);
    resolve(program);
    let resolved = slot_contents(program);

    resolve(program);
    let again = slot_contents(program);
    assert_eq!(resolved.len(), again.len());
    for (before, after) in resolved.iter().zip(&again) {
        match (before, after) {
            (Some(before), Some(after)) => assert!(Node::same_node(before, after)),
            (None, None) => {}
            _ => panic!("an optional slot changed occupancy"),
        }
    }

    let a = declarator(statement(program, 0), 0).id.get();
    assert!(Node::same_node(declarator(statement(program, 1), 0).init.get().unwrap(), a));
    let assign = assignment_of(expression_of(statement(program, 3)));
    assert!(Node::same_node(expression_of(statement(program, 4)), assign.left.get()));
}

// ============================================================================
// Long chains and deep nesting
// ============================================================================

#[test]
fn test_long_binary_chain() {
    let arena = AstArena::new();
    let source = format!("var x;\n{};", vec!["x"; 10_000].join(" + "));
    let program = parse_program(&arena, &source);
    let mut uses = 0;
    traverse(&TraverseOptions::default(), program, |_, node| {
        uses += usize::from(node.identifier_name() == Some("x"));
    })
    .unwrap();

    // The declaration plus every term.
    assert_eq!(uses, 10_001);
    let x = declarator(statement(program, 0), 0).id.get();
    let mut link = expression_of(statement(program, 1));
    while let NodeKind::BinaryExpression(e) = &link.kind {
        assert!(Node::same_node(e.right.get(), x));
        link = e.left.get();
    }
    assert!(Node::same_node(link, x));
}

#[test]
fn test_long_logical_chain_keeps_lines() {
    let arena = AstArena::new();
    let source = format!("var y;\n{}y;", "y ||\n".repeat(5_000));
    let program = parse_program(&arena, &source);
    let mut lines = Vec::new();
    traverse(&TraverseOptions::default(), program, |_, node| {
        if node.identifier_name() == Some("y") {
            lines.push(node.line());
        }
    })
    .unwrap();

    // Uses are visited before they are rewritten, so each keeps its own line.
    assert_eq!(lines.len(), 5_002);
    assert_eq!(lines[1], Some(2));
    assert_eq!(lines[5_001], Some(5_002));
}

#[test]
fn test_long_member_chain() {
    let arena = AstArena::new();
    let source = format!("var a;\na{};", ".b".repeat(20_000));
    let program = parse_program(&arena, &source);
    resolve(program);

    let a = declarator(statement(program, 0), 0).id.get();
    let mut link = expression_of(statement(program, 1));
    let mut depth = 0;
    while let NodeKind::MemberExpression(m) = &link.kind {
        link = m.object.get();
        depth += 1;
    }
    assert_eq!(depth, 20_000);
    assert!(Node::same_node(link, a));
}

#[test]
fn test_long_call_chain() {
    let arena = AstArena::new();
    let source = format!("function f() {{ return f; }}\nf{}(f);", "()".repeat(20_000));
    let program = parse_program(&arena, &source);
    let traversal = resolve(program);
    assert!(traversal.unresolved_references().is_empty());

    let f = function_of(statement(program, 0)).id.get().unwrap();
    let outer = call_of(expression_of(statement(program, 1)));
    assert!(Node::same_node(outer.arguments[0].get(), f));
}

#[test]
fn test_nested_prefix_operators() {
    let arena = AstArena::new();
    let source = format!("var x;\n{}x;", "!".repeat(100));
    let program = parse_program(&arena, &source);
    resolve(program);

    let x = declarator(statement(program, 0), 0).id.get();
    let mut link = expression_of(statement(program, 1));
    while let NodeKind::UnaryExpression(e) = &link.kind {
        link = e.argument.get();
    }
    assert!(Node::same_node(link, x));
}

#[test]
fn test_over_deep_prefix_operators_fail_to_parse() {
    let arena = AstArena::new();
    let source = format!("{}x", "!".repeat(20_000));
    assert!(parse(&arena, &source).is_err());
}

#[test]
fn test_deep_blocks_stop_at_nesting_limit() {
    let arena = AstArena::new();
    let b = NodeBuilder::new(&arena);
    let mut inner = b.var_decl("deep", None);
    for _ in 0..100_000 {
        inner = b.block(&[inner]);
    }
    let program = b.program(&[inner]);

    let err = traverse(&TraverseOptions::default(), program, |_, _| {}).unwrap_err();
    assert!(matches!(err, TraverseError::NestingTooDeep { limit: MAX_NESTING_DEPTH, .. }));
}

#[test]
fn test_blocks_within_nesting_limit() {
    let arena = AstArena::new();
    let b = NodeBuilder::new(&arena);
    let mut inner = b.expr_stmt(b.i("deep"));
    for _ in 0..MAX_NESTING_DEPTH - 2 {
        inner = b.block(&[inner]);
    }
    let decl = b.var_decl("deep", None);
    let program = b.program(&[inner, decl]);

    let traversal = resolve(program);
    assert!(traversal.unresolved_references().is_empty());
}

// ============================================================================
// Errors
// ============================================================================

fn traverse_error(source: &str) -> TraverseError {
    let arena = AstArena::new();
    let program = parse_program(&arena, source);
    match traverse(&TraverseOptions::default(), program, |_, _| {}) {
        Ok(_) => panic!("expected traversal of {:?} to fail", source),
        Err(err) => err,
    }
}

#[test]
fn test_with_statement_is_unsupported() {
    let err = traverse_error("var o;\nwith (o) {}");
    assert!(matches!(err, TraverseError::UnsupportedNodeType { kind: "WithStatement", line: 2 }));
}

#[test]
fn test_catch_clause_is_unsupported() {
    let err = traverse_error("try {\n  a;\n} catch (e) {\n}");
    assert!(matches!(err, TraverseError::UnsupportedNodeType { kind: "CatchClause", line: 3 }));
}

#[test]
fn test_try_finally_is_supported() {
    let arena = AstArena::new();
    let program = parse_program(&arena, "try { var a; } finally { a; }");
    let traversal = resolve(program);
    assert!(traversal.unresolved_references().is_empty());
}

#[test]
fn test_block_scoped_declarations_are_unsupported() {
    assert!(matches!(
        traverse_error("let a = 1;"),
        TraverseError::UnsupportedNodeType { kind: "let", line: 1 }
    ));
    assert!(matches!(
        traverse_error("function f() {\n  const b = 1;\n}"),
        TraverseError::UnsupportedNodeType { kind: "const", line: 2 }
    ));
}

#[test]
fn test_root_must_be_program() {
    let arena = AstArena::new();
    let b = NodeBuilder::new(&arena);
    let err = traverse(&TraverseOptions::default(), b.i("a"), |_, _| {}).unwrap_err();
    assert!(matches!(err, TraverseError::RootNotProgram { kind: "Identifier" }));
}

#[test]
fn test_nested_program_is_unsupported() {
    let arena = AstArena::new();
    let b = NodeBuilder::new(&arena);
    let program = b.program(&[b.expr_stmt(b.program(&[]))]);
    let err = traverse(&TraverseOptions::default(), program, |_, _| {}).unwrap_err();
    assert!(matches!(err, TraverseError::UnsupportedNodeType { kind: "Program", .. }));
}

#[test]
fn test_visitor_error_aborts() {
    let arena = AstArena::new();
    let program = parse_program(&arena, "var a;\nstop;\nafter;");
    let mut visited = Vec::new();
    let err = try_traverse(&TraverseOptions::default(), program, |_, node| {
        if node.identifier_name() == Some("stop") {
            return Err("stop requested".into());
        }
        visited.extend(node.identifier_name());
        Ok(())
    })
    .unwrap_err();

    let TraverseError::Visitor { line, source } = err else {
        panic!("expected visitor error");
    };
    assert_eq!(line, 2);
    assert_eq!(source.to_string(), "stop requested");
    assert_eq!(visited, vec!["a"]);
}
