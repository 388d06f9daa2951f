//! Declaration hoisting.
//!
//! Before a function body or the program is walked, every `var` declarator
//! and function declaration that belongs to its scope is declared, so uses
//! that precede the declaration in source order still resolve.

use esscope_ast::node::{NodeKind, NodeList, VariableDeclaration, VariableKind};
use esscope_ast::Node;
use log::debug;

use crate::scope_manager::ScopeManager;

/// Declare the hoisted names of `statements` in the current scope.
pub(crate) fn hoist_declarations<'a>(scopes: &mut ScopeManager<'a>, statements: NodeList<'a>) {
    let before = scopes.current_scope().len();
    hoist_list(scopes, statements);
    let after = scopes.current_scope().len();
    if after > before {
        debug!("hoisted {} name(s) into {}", after - before, scopes.current_id());
    }
}

/// Walks the statement tree with an explicit stack, so arbitrarily deep
/// statement nesting cannot exhaust the call stack. Names are declared in
/// source order.
fn hoist_list<'a>(scopes: &mut ScopeManager<'a>, statements: NodeList<'a>) {
    let mut pending: Vec<&'a Node<'a>> = statements.iter().rev().map(|slot| slot.get()).collect();
    while let Some(node) = pending.pop() {
        let mark = pending.len();
        match &node.kind {
            // Nested function bodies are hoisted when the walk enters them.
            NodeKind::FunctionDeclaration(func) => {
                if let Some(id) = func.id.get() {
                    if let Some(name) = id.identifier_name() {
                        scopes.declare(name, id);
                    }
                }
            }
            NodeKind::VariableDeclaration(decl) => hoist_var(scopes, decl),
            NodeKind::BlockStatement(block) => pending.extend(block.body.iter().map(|slot| slot.get())),
            NodeKind::IfStatement(stmt) => {
                pending.push(stmt.consequent.get());
                pending.extend(stmt.alternate.get());
            }
            NodeKind::ForStatement(stmt) => {
                pending.extend(stmt.init.get());
                pending.push(stmt.body.get());
            }
            NodeKind::ForInStatement(stmt) => {
                pending.push(stmt.left.get());
                pending.push(stmt.body.get());
            }
            NodeKind::WhileStatement(stmt) | NodeKind::DoWhileStatement(stmt) => pending.push(stmt.body.get()),
            NodeKind::LabeledStatement(stmt) => pending.push(stmt.body.get()),
            NodeKind::TryStatement(stmt) => {
                pending.push(stmt.block.get());
                pending.extend(stmt.finalizer.get());
            }
            NodeKind::SwitchStatement(stmt) => {
                for case in stmt.cases {
                    if let NodeKind::SwitchCase(case) = &case.get().kind {
                        pending.extend(case.consequent.iter().map(|slot| slot.get()));
                    }
                }
            }
            _ => {}
        }
        // Children were pushed in source order; the stack pops them reversed.
        pending[mark..].reverse();
    }
}

fn hoist_var<'a>(scopes: &mut ScopeManager<'a>, decl: &'a VariableDeclaration<'a>) {
    // let/const are rejected when the walk reaches them.
    if decl.kind != VariableKind::Var {
        return;
    }
    for declarator in decl.declarations {
        if let NodeKind::VariableDeclarator(declarator) = &declarator.get().kind {
            let id = declarator.id.get();
            if let Some(name) = id.identifier_name() {
                scopes.declare(name, id);
            }
        }
    }
}
