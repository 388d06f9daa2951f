//! Structural comparison of syntax trees.
//!
//! Two trees have the same shape when they have the same node kinds, names,
//! operators, flags and literal values in the same positions. Source lines and
//! ranges are ignored, so a tree built with the node builder compares equal to
//! the same construct produced by the parser.

use crate::node::*;

/// Compare two trees structurally, ignoring `line` and `range`.
pub fn shape_eq(expected: &Node<'_>, actual: &Node<'_>) -> bool {
    if Node::same_node(expected, actual) {
        return true;
    }
    match (&expected.kind, &actual.kind) {
        (NodeKind::Program(a), NodeKind::Program(b)) => list_eq(a.body, b.body),
        (NodeKind::EmptyStatement, NodeKind::EmptyStatement) => true,
        (NodeKind::ThisExpression, NodeKind::ThisExpression) => true,
        (NodeKind::ExpressionStatement(a), NodeKind::ExpressionStatement(b)) => {
            child_eq(&a.expression, &b.expression)
        }
        (NodeKind::BlockStatement(a), NodeKind::BlockStatement(b)) => list_eq(a.body, b.body),
        (NodeKind::VariableDeclaration(a), NodeKind::VariableDeclaration(b)) => {
            a.kind == b.kind && list_eq(a.declarations, b.declarations)
        }
        (NodeKind::VariableDeclarator(a), NodeKind::VariableDeclarator(b)) => {
            child_eq(&a.id, &b.id) && optional_eq(&a.init, &b.init)
        }
        (NodeKind::FunctionDeclaration(a), NodeKind::FunctionDeclaration(b))
        | (NodeKind::FunctionExpression(a), NodeKind::FunctionExpression(b)) => {
            function_eq(a, b)
        }
        (NodeKind::IfStatement(a), NodeKind::IfStatement(b)) => {
            child_eq(&a.test, &b.test)
                && child_eq(&a.consequent, &b.consequent)
                && optional_eq(&a.alternate, &b.alternate)
        }
        (NodeKind::ForStatement(a), NodeKind::ForStatement(b)) => {
            optional_eq(&a.init, &b.init)
                && optional_eq(&a.test, &b.test)
                && optional_eq(&a.update, &b.update)
                && child_eq(&a.body, &b.body)
        }
        (NodeKind::ForInStatement(a), NodeKind::ForInStatement(b)) => {
            child_eq(&a.left, &b.left) && child_eq(&a.right, &b.right) && child_eq(&a.body, &b.body)
        }
        (NodeKind::WhileStatement(a), NodeKind::WhileStatement(b))
        | (NodeKind::DoWhileStatement(a), NodeKind::DoWhileStatement(b)) => {
            child_eq(&a.test, &b.test) && child_eq(&a.body, &b.body)
        }
        (NodeKind::ReturnStatement(a), NodeKind::ReturnStatement(b)) => {
            optional_eq(&a.argument, &b.argument)
        }
        (NodeKind::BreakStatement(a), NodeKind::BreakStatement(b))
        | (NodeKind::ContinueStatement(a), NodeKind::ContinueStatement(b)) => {
            optional_eq(&a.label, &b.label)
        }
        (NodeKind::ThrowStatement(a), NodeKind::ThrowStatement(b)) => {
            child_eq(&a.argument, &b.argument)
        }
        (NodeKind::TryStatement(a), NodeKind::TryStatement(b)) => {
            child_eq(&a.block, &b.block)
                && optional_eq(&a.handler, &b.handler)
                && optional_eq(&a.finalizer, &b.finalizer)
        }
        (NodeKind::CatchClause(a), NodeKind::CatchClause(b)) => {
            child_eq(&a.param, &b.param) && child_eq(&a.body, &b.body)
        }
        (NodeKind::WithStatement(a), NodeKind::WithStatement(b)) => {
            child_eq(&a.object, &b.object) && child_eq(&a.body, &b.body)
        }
        (NodeKind::LabeledStatement(a), NodeKind::LabeledStatement(b)) => {
            child_eq(&a.label, &b.label) && child_eq(&a.body, &b.body)
        }
        (NodeKind::SwitchStatement(a), NodeKind::SwitchStatement(b)) => {
            child_eq(&a.discriminant, &b.discriminant) && list_eq(a.cases, b.cases)
        }
        (NodeKind::SwitchCase(a), NodeKind::SwitchCase(b)) => {
            optional_eq(&a.test, &b.test) && list_eq(a.consequent, b.consequent)
        }
        (NodeKind::Identifier(a), NodeKind::Identifier(b)) => a.name == b.name,
        (NodeKind::Literal(a), NodeKind::Literal(b)) => literal_eq(&a.value, &b.value),
        (NodeKind::ArrayExpression(a), NodeKind::ArrayExpression(b)) => {
            a.elements.len() == b.elements.len()
                && a.elements.iter().zip(b.elements).all(|(x, y)| optional_eq(x, y))
        }
        (NodeKind::ObjectExpression(a), NodeKind::ObjectExpression(b)) => {
            list_eq(a.properties, b.properties)
        }
        (NodeKind::Property(a), NodeKind::Property(b)) => {
            a.kind == b.kind && child_eq(&a.key, &b.key) && child_eq(&a.value, &b.value)
        }
        (NodeKind::MemberExpression(a), NodeKind::MemberExpression(b)) => {
            a.computed == b.computed
                && child_eq(&a.object, &b.object)
                && child_eq(&a.property, &b.property)
        }
        (NodeKind::CallExpression(a), NodeKind::CallExpression(b))
        | (NodeKind::NewExpression(a), NodeKind::NewExpression(b)) => {
            child_eq(&a.callee, &b.callee) && list_eq(a.arguments, b.arguments)
        }
        (NodeKind::AssignmentExpression(a), NodeKind::AssignmentExpression(b)) => {
            a.operator == b.operator && child_eq(&a.left, &b.left) && child_eq(&a.right, &b.right)
        }
        (NodeKind::BinaryExpression(a), NodeKind::BinaryExpression(b)) => {
            a.operator == b.operator && child_eq(&a.left, &b.left) && child_eq(&a.right, &b.right)
        }
        (NodeKind::LogicalExpression(a), NodeKind::LogicalExpression(b)) => {
            a.operator == b.operator && child_eq(&a.left, &b.left) && child_eq(&a.right, &b.right)
        }
        (NodeKind::UnaryExpression(a), NodeKind::UnaryExpression(b)) => {
            a.operator == b.operator && child_eq(&a.argument, &b.argument)
        }
        (NodeKind::UpdateExpression(a), NodeKind::UpdateExpression(b)) => {
            a.operator == b.operator && a.prefix == b.prefix && child_eq(&a.argument, &b.argument)
        }
        (NodeKind::ConditionalExpression(a), NodeKind::ConditionalExpression(b)) => {
            child_eq(&a.test, &b.test)
                && child_eq(&a.consequent, &b.consequent)
                && child_eq(&a.alternate, &b.alternate)
        }
        (NodeKind::SequenceExpression(a), NodeKind::SequenceExpression(b)) => {
            list_eq(a.expressions, b.expressions)
        }
        _ => false,
    }
}

fn function_eq(a: &Function<'_>, b: &Function<'_>) -> bool {
    a.generator == b.generator
        && a.expression == b.expression
        && optional_eq(&a.id, &b.id)
        && list_eq(a.params, b.params)
        && child_eq(&a.body, &b.body)
}

fn literal_eq(a: &LiteralValue<'_>, b: &LiteralValue<'_>) -> bool {
    match (a, b) {
        // NaN never appears in source, but compare bit patterns so it is reflexive.
        (LiteralValue::Number(x), LiteralValue::Number(y)) => x.to_bits() == y.to_bits() || x == y,
        (LiteralValue::Null, LiteralValue::Null) => true,
        (LiteralValue::Boolean(x), LiteralValue::Boolean(y)) => x == y,
        (LiteralValue::String(x), LiteralValue::String(y)) => x == y,
        (
            LiteralValue::RegExp { pattern: p1, flags: f1 },
            LiteralValue::RegExp { pattern: p2, flags: f2 },
        ) => p1 == p2 && f1 == f2,
        _ => false,
    }
}

#[inline]
fn child_eq(a: &Child<'_>, b: &Child<'_>) -> bool {
    shape_eq(a.get(), b.get())
}

fn optional_eq(a: &OptionalChild<'_>, b: &OptionalChild<'_>) -> bool {
    match (a.get(), b.get()) {
        (Some(x), Some(y)) => shape_eq(x, y),
        (None, None) => true,
        _ => false,
    }
}

fn list_eq(a: &[Child<'_>], b: &[Child<'_>]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| child_eq(x, y))
}
