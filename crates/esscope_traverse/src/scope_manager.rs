//! The scope stack of one traversal.

use esscope_ast::Node;
use log::{debug, trace};

use crate::error::TraverseError;
use crate::scope::{Resolution, Scope, ScopeId, ScopeKind, ScopeRef};

/// Owns every scope created while walking one program.
///
/// Scopes live in a vector indexed by [`ScopeId`]. The active chain is a
/// stack of ids whose bottom is always the global scope. Popped function
/// scopes stay stored so their bindings can be reported after the walk.
#[derive(Debug)]
pub struct ScopeManager<'a> {
    scopes: Vec<Scope<'a>>,
    stack: Vec<ScopeId>,
    unresolved: Vec<(&'a str, &'a Node<'a>)>,
    implicit_globals: Vec<&'a Node<'a>>,
}

impl<'a> ScopeManager<'a> {
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope::new(ScopeKind::Global, None, None)],
            stack: vec![ScopeId::GLOBAL],
            unresolved: Vec::new(),
            implicit_globals: Vec::new(),
        }
    }

    pub(crate) fn scope_data(&self, id: ScopeId) -> &Scope<'a> {
        &self.scopes[id.index()]
    }

    // ========================================================================
    // Views
    // ========================================================================

    pub fn global_scope(&self) -> ScopeRef<'_, 'a> {
        ScopeRef::new(self, ScopeId::GLOBAL)
    }

    /// The innermost active scope.
    pub fn current_scope(&self) -> ScopeRef<'_, 'a> {
        ScopeRef::new(self, self.current_id())
    }

    pub fn current_id(&self) -> ScopeId {
        self.stack.last().copied().unwrap_or(ScopeId::GLOBAL)
    }

    pub fn scope(&self, id: ScopeId) -> Option<ScopeRef<'_, 'a>> {
        (id.index() < self.scopes.len()).then(|| ScopeRef::new(self, id))
    }

    /// Every scope created so far, in creation order.
    pub fn scopes(&self) -> impl Iterator<Item = ScopeRef<'_, 'a>> + '_ {
        (0..self.scopes.len()).map(move |index| ScopeRef::new(self, ScopeId::from_index(index)))
    }

    pub fn scope_count(&self) -> usize {
        self.scopes.len()
    }

    /// Number of active scopes, the global scope included.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    // ========================================================================
    // Push / pop
    // ========================================================================

    /// Open a function scope nested in the current scope.
    pub fn create_function_scope(&mut self, owner: &'a Node<'a>) -> ScopeId {
        let parent = self.current_id();
        let id = ScopeId::from_index(self.scopes.len());
        self.scopes.push(Scope::new(ScopeKind::Function, Some(parent), Some(owner)));
        self.stack.push(id);
        debug!("push function scope {} (parent {}, line {:?})", id, parent, owner.line());
        id
    }

    /// Close the scope opened by the matching [`create_function_scope`](Self::create_function_scope).
    pub fn pop_scope(&mut self, handle: ScopeId) -> Result<(), TraverseError> {
        let top = self.stack.last().copied();
        if handle == ScopeId::GLOBAL || top != Some(handle) {
            return Err(TraverseError::ScopeStackMismatch {
                expected: handle,
                found: top,
            });
        }
        self.stack.pop();
        debug!("pop function scope {} ({} bindings)", handle, self.scopes[handle.index()].bindings.len());
        Ok(())
    }

    // ========================================================================
    // Declarations
    // ========================================================================

    /// Bind `name` in the innermost function or global scope.
    pub fn declare(&mut self, name: &'a str, node: &'a Node<'a>) {
        let id = self.current_id();
        self.declare_in(id, name, node);
    }

    /// Bind `name` in the global scope.
    pub fn declare_global(&mut self, name: &'a str, node: &'a Node<'a>) {
        self.declare_in(ScopeId::GLOBAL, name, node);
    }

    fn declare_in(&mut self, id: ScopeId, name: &'a str, node: &'a Node<'a>) {
        let previous = self.scopes[id.index()].declare(name, node);
        match previous {
            Some(previous) if !Node::same_node(previous, node) => {
                trace!("redeclare `{}` in {}", name, id)
            }
            Some(_) => {}
            None => trace!("declare `{}` in {}", name, id),
        }
    }

    // ========================================================================
    // Resolution
    // ========================================================================

    /// Resolve `name` from the current scope outward.
    pub fn resolve_var(&self, name: &str) -> Resolution<'a> {
        self.resolve_from(self.current_id(), name)
    }

    pub(crate) fn resolve_from(&self, id: ScopeId, name: &str) -> Resolution<'a> {
        let mut next = Some(id);
        while let Some(id) = next {
            let scope = &self.scopes[id.index()];
            if let Some(node) = scope.bindings.get(name) {
                return Resolution::Resolved(*node);
            }
            next = scope.parent;
        }
        Resolution::Unresolved
    }

    pub(crate) fn record_unresolved(&mut self, name: &'a str, node: &'a Node<'a>) {
        self.unresolved.push((name, node));
    }

    pub(crate) fn record_implicit_global(&mut self, node: &'a Node<'a>) {
        self.implicit_globals.push(node);
    }

    /// Identifier uses that matched no declaration, in walk order.
    pub fn unresolved_references(&self) -> &[(&'a str, &'a Node<'a>)] {
        &self.unresolved
    }

    /// Assignment targets that were bound in the global scope because no
    /// declaration existed.
    pub fn implicit_globals(&self) -> &[&'a Node<'a>] {
        &self.implicit_globals
    }
}

impl Default for ScopeManager<'_> {
    fn default() -> Self {
        Self::new()
    }
}
