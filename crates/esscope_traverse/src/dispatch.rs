//! Per-node-type walk.
//!
//! Every node goes through [`Dispatcher::dispatch`], which calls the visitor,
//! declares bindings, recurses into children in syntactic order and returns
//! the node that now occupies the slot. Identifier uses come back as their
//! declaring node, so the caller's slot is rewritten in place.

use esscope_ast::node::*;
use esscope_ast::operators::AssignmentOperator;
use log::{debug, trace};

use crate::error::TraverseError;
use crate::hoist::hoist_declarations;
use crate::options::TraverseOptions;
use crate::scope::{Resolution, ScopeRef};
use crate::scope_manager::ScopeManager;
use crate::traverse::VisitResult;

type DispatchResult<T> = Result<T, TraverseError>;

/// Deepest node nesting the walk follows before giving up. Left-deep
/// operator, member and call chains are walked in a loop and do not count
/// their length against it.
pub const MAX_NESTING_DEPTH: usize = 512;

pub(crate) struct Dispatcher<'s, 'a, F> {
    scopes: &'s mut ScopeManager<'a>,
    options: TraverseOptions,
    visitor: F,
    /// Line of the innermost node entered so far; inherited by nodes
    /// without one.
    line: u32,
    /// Number of `dispatch` calls currently on the stack.
    depth: usize,
}

impl<'s, 'a, F> Dispatcher<'s, 'a, F>
where
    F: FnMut(ScopeRef<'_, 'a>, &'a Node<'a>) -> VisitResult,
{
    pub(crate) fn new(scopes: &'s mut ScopeManager<'a>, options: TraverseOptions, visitor: F) -> Self {
        Self {
            scopes,
            options,
            visitor,
            line: 1,
            depth: 0,
        }
    }

    /// Walk the root `Program`. Its hoisted names go into the global scope.
    pub(crate) fn dispatch_program(&mut self, node: &'a Node<'a>, program: &'a Program<'a>) -> DispatchResult<()> {
        self.enter(node)?;
        if self.options.hoist_declarations {
            hoist_declarations(self.scopes, program.body);
        }
        self.dispatch_list(program.body)
    }

    /// Walk one node and return the node that now occupies its slot.
    pub(crate) fn dispatch(&mut self, node: &'a Node<'a>) -> DispatchResult<&'a Node<'a>> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(TraverseError::NestingTooDeep {
                line: node.line().unwrap_or(self.line),
                limit: MAX_NESTING_DEPTH,
            });
        }
        let parent_line = self.line;
        self.depth += 1;
        let result = self.dispatch_node(node);
        self.depth -= 1;
        self.line = parent_line;
        result
    }

    fn dispatch_node(&mut self, node: &'a Node<'a>) -> DispatchResult<&'a Node<'a>> {
        self.enter(node)?;
        match &node.kind {
            NodeKind::EmptyStatement | NodeKind::ThisExpression | NodeKind::Literal(_) => {}

            NodeKind::ExpressionStatement(stmt) => self.dispatch_slot(&stmt.expression)?,
            NodeKind::BlockStatement(block) => self.dispatch_list(block.body)?,
            NodeKind::VariableDeclaration(decl) => self.dispatch_var(node, decl)?,
            NodeKind::FunctionDeclaration(func) | NodeKind::FunctionExpression(func) => {
                self.dispatch_function(node, func)?
            }

            NodeKind::IfStatement(stmt) => {
                self.dispatch_slot(&stmt.test)?;
                self.dispatch_slot(&stmt.consequent)?;
                self.dispatch_optional(&stmt.alternate)?;
            }
            NodeKind::ForStatement(stmt) => {
                self.dispatch_optional(&stmt.init)?;
                self.dispatch_optional(&stmt.test)?;
                self.dispatch_optional(&stmt.update)?;
                self.dispatch_slot(&stmt.body)?;
            }
            NodeKind::ForInStatement(stmt) => {
                self.dispatch_slot(&stmt.left)?;
                self.dispatch_slot(&stmt.right)?;
                self.dispatch_slot(&stmt.body)?;
            }
            NodeKind::WhileStatement(stmt) => {
                self.dispatch_slot(&stmt.test)?;
                self.dispatch_slot(&stmt.body)?;
            }
            NodeKind::DoWhileStatement(stmt) => {
                self.dispatch_slot(&stmt.body)?;
                self.dispatch_slot(&stmt.test)?;
            }
            NodeKind::ReturnStatement(stmt) => self.dispatch_optional(&stmt.argument)?,
            NodeKind::BreakStatement(stmt) | NodeKind::ContinueStatement(stmt) => {
                if let Some(label) = stmt.label.get() {
                    self.visit_name(label)?;
                }
            }
            NodeKind::ThrowStatement(stmt) => self.dispatch_slot(&stmt.argument)?,
            NodeKind::TryStatement(stmt) => {
                self.dispatch_slot(&stmt.block)?;
                if let Some(handler) = stmt.handler.get() {
                    return Err(self.unsupported(handler));
                }
                self.dispatch_optional(&stmt.finalizer)?;
            }
            NodeKind::LabeledStatement(stmt) => {
                self.visit_name(stmt.label.get())?;
                self.dispatch_slot(&stmt.body)?;
            }
            NodeKind::SwitchStatement(stmt) => {
                self.dispatch_slot(&stmt.discriminant)?;
                for case in stmt.cases {
                    self.dispatch_case(case.get())?;
                }
            }

            NodeKind::Identifier(ident) => return Ok(self.resolve_use(node, ident.name)),
            NodeKind::ArrayExpression(array) => {
                for element in array.elements {
                    self.dispatch_optional(element)?;
                }
            }
            NodeKind::ObjectExpression(object) => {
                for property in object.properties {
                    self.dispatch_property(property.get())?;
                }
            }
            NodeKind::MemberExpression(_)
            | NodeKind::CallExpression(_)
            | NodeKind::NewExpression(_)
            | NodeKind::BinaryExpression(_)
            | NodeKind::LogicalExpression(_) => self.dispatch_chain(node)?,
            NodeKind::AssignmentExpression(assign) => self.dispatch_assignment(assign)?,
            NodeKind::UnaryExpression(expr) => self.dispatch_slot(&expr.argument)?,
            NodeKind::UpdateExpression(expr) => self.dispatch_slot(&expr.argument)?,
            NodeKind::ConditionalExpression(expr) => {
                self.dispatch_slot(&expr.test)?;
                self.dispatch_slot(&expr.consequent)?;
                self.dispatch_slot(&expr.alternate)?;
            }
            NodeKind::SequenceExpression(expr) => self.dispatch_list(expr.expressions)?,

            // Dynamic or block scoping, or a node outside its parent.
            NodeKind::WithStatement(_)
            | NodeKind::CatchClause(_)
            | NodeKind::Program(_)
            | NodeKind::SwitchCase(_)
            | NodeKind::VariableDeclarator(_)
            | NodeKind::Property(_) => return Err(self.unsupported(node)),
        }
        Ok(node)
    }

    // ========================================================================
    // Chains
    // ========================================================================

    /// Walk a chain such as `a + b + c` or `a.b().c` whose first operand
    /// nests to the left. `node` has been entered already.
    ///
    /// The left spine is entered top-down, its innermost operand walked, then
    /// the remaining operands of each link bottom-up. Visitor order and
    /// lines match a recursive walk.
    fn dispatch_chain(&mut self, node: &'a Node<'a>) -> DispatchResult<()> {
        let mut spine = vec![node];
        let mut link = node;
        while let Some(head) = chain_head(link) {
            let next = head.get();
            if chain_head(next).is_none() {
                self.dispatch_slot(head)?;
                break;
            }
            self.enter(next)?;
            spine.push(next);
            link = next;
        }
        while let Some(link) = spine.pop() {
            if let Some(line) = link.line() {
                self.line = line;
            }
            self.dispatch_chain_tail(link)?;
        }
        Ok(())
    }

    /// Everything of a chain link after its head.
    fn dispatch_chain_tail(&mut self, node: &'a Node<'a>) -> DispatchResult<()> {
        match &node.kind {
            NodeKind::BinaryExpression(expr) => self.dispatch_slot(&expr.right),
            NodeKind::LogicalExpression(expr) => self.dispatch_slot(&expr.right),
            NodeKind::MemberExpression(member) if member.computed => self.dispatch_slot(&member.property),
            NodeKind::MemberExpression(member) => self.visit_name(member.property.get()),
            NodeKind::CallExpression(call) | NodeKind::NewExpression(call) => self.dispatch_list(call.arguments),
            _ => Ok(()),
        }
    }

    // ========================================================================
    // Slots
    // ========================================================================

    fn dispatch_slot(&mut self, slot: &Child<'a>) -> DispatchResult<()> {
        let node = self.dispatch(slot.get())?;
        slot.set(node);
        Ok(())
    }

    fn dispatch_optional(&mut self, slot: &OptionalChild<'a>) -> DispatchResult<()> {
        if let Some(node) = slot.get() {
            slot.set(Some(self.dispatch(node)?));
        }
        Ok(())
    }

    fn dispatch_list(&mut self, list: NodeList<'a>) -> DispatchResult<()> {
        for slot in list {
            self.dispatch_slot(slot)?;
        }
        Ok(())
    }

    // ========================================================================
    // Visitor and names
    // ========================================================================

    /// Fill in a missing line, then call the visitor with the current scope.
    fn enter(&mut self, node: &'a Node<'a>) -> DispatchResult<()> {
        match node.line() {
            Some(line) => self.line = line,
            None => node.set_line(self.line),
        }
        let line = self.line;
        let scope = self.scopes.current_scope();
        (self.visitor)(scope, node).map_err(|source| TraverseError::Visitor { line, source })
    }

    /// Visit a name that is never resolved: property keys, non-computed
    /// member properties, labels and binding identifiers.
    fn visit_name(&mut self, node: &'a Node<'a>) -> DispatchResult<()> {
        let parent_line = self.line;
        self.enter(node)?;
        self.line = parent_line;
        Ok(())
    }

    /// Visit a binding identifier and declare it in the current scope.
    fn declare_binding(&mut self, node: &'a Node<'a>) -> DispatchResult<()> {
        self.visit_name(node)?;
        let Some(name) = node.identifier_name() else {
            return Err(self.unsupported(node));
        };
        self.scopes.declare(name, node);
        Ok(())
    }

    fn resolve_use(&mut self, node: &'a Node<'a>, name: &'a str) -> &'a Node<'a> {
        match self.scopes.resolve_var(name) {
            Resolution::Resolved(decl) => {
                trace!("line {}: `{}` resolves to declaration on line {:?}", self.line, name, decl.line());
                decl
            }
            Resolution::Unresolved => {
                debug!("line {}: `{}` is unresolved", self.line, name);
                self.scopes.record_unresolved(name, node);
                node
            }
        }
    }

    fn unsupported(&self, node: &Node<'a>) -> TraverseError {
        TraverseError::UnsupportedNodeType {
            kind: node.syntax_name(),
            line: node.line().unwrap_or(self.line),
        }
    }

    // ========================================================================
    // Declarations
    // ========================================================================

    fn dispatch_var(&mut self, node: &'a Node<'a>, decl: &'a VariableDeclaration<'a>) -> DispatchResult<()> {
        if decl.kind != VariableKind::Var {
            return Err(TraverseError::UnsupportedNodeType {
                kind: decl.kind.as_str(),
                line: node.line().unwrap_or(self.line),
            });
        }
        for slot in decl.declarations {
            let declarator = slot.get();
            let NodeKind::VariableDeclarator(payload) = &declarator.kind else {
                return Err(self.unsupported(declarator));
            };
            let parent_line = self.line;
            self.enter(declarator)?;
            self.declare_binding(payload.id.get())?;
            self.dispatch_optional(&payload.init)?;
            self.line = parent_line;
        }
        Ok(())
    }

    /// Declare the name outward, then walk parameters and body in a new
    /// function scope.
    fn dispatch_function(&mut self, node: &'a Node<'a>, func: &'a Function<'a>) -> DispatchResult<()> {
        if let Some(id) = func.id.get() {
            self.declare_binding(id)?;
        }

        let scope = self.scopes.create_function_scope(node);
        for param in func.params {
            self.declare_binding(param.get())?;
        }
        let body = func.body.get();
        if self.options.hoist_declarations {
            if let Some(statements) = body.statements() {
                hoist_declarations(self.scopes, statements);
            }
        }
        self.dispatch_slot(&func.body)?;
        self.scopes.pop_scope(scope)
    }

    // ========================================================================
    // Expressions and clauses
    // ========================================================================

    fn dispatch_assignment(&mut self, assign: &'a AssignmentExpression<'a>) -> DispatchResult<()> {
        let left = assign.left.get();
        let Some(name) = left.identifier_name() else {
            self.dispatch_slot(&assign.left)?;
            return self.dispatch_slot(&assign.right);
        };

        self.visit_name(left)?;
        let resolution = self.scopes.resolve_var(name);
        if let Resolution::Resolved(decl) = resolution {
            trace!("line {}: `{}` resolves to declaration on line {:?}", self.line, name, decl.line());
            assign.left.set(decl);
        }
        self.dispatch_slot(&assign.right)?;

        if resolution.is_unresolved() {
            if assign.operator == AssignmentOperator::Assign && self.options.implicit_globals {
                debug!("line {}: `{}` becomes an implicit global", self.line, name);
                self.scopes.declare_global(name, left);
                self.scopes.record_implicit_global(left);
            } else {
                debug!("line {}: `{}` is unresolved", self.line, name);
                self.scopes.record_unresolved(name, left);
            }
        }
        Ok(())
    }

    fn dispatch_case(&mut self, node: &'a Node<'a>) -> DispatchResult<()> {
        let NodeKind::SwitchCase(case) = &node.kind else {
            return Err(self.unsupported(node));
        };
        let parent_line = self.line;
        self.enter(node)?;
        self.dispatch_optional(&case.test)?;
        self.dispatch_list(case.consequent)?;
        self.line = parent_line;
        Ok(())
    }

    fn dispatch_property(&mut self, node: &'a Node<'a>) -> DispatchResult<()> {
        let NodeKind::Property(property) = &node.kind else {
            return Err(self.unsupported(node));
        };
        let parent_line = self.line;
        self.enter(node)?;
        self.visit_name(property.key.get())?;
        self.dispatch_slot(&property.value)?;
        self.line = parent_line;
        Ok(())
    }
}

/// The left operand slot of a chain link.
fn chain_head<'n, 'a>(node: &'n Node<'a>) -> Option<&'n Child<'a>> {
    match &node.kind {
        NodeKind::BinaryExpression(expr) => Some(&expr.left),
        NodeKind::LogicalExpression(expr) => Some(&expr.left),
        NodeKind::MemberExpression(member) => Some(&member.object),
        NodeKind::CallExpression(call) | NodeKind::NewExpression(call) => Some(&call.callee),
        _ => None,
    }
}
