//! Lexical scopes.
//!
//! A scope maps each declared name to the node that declared it. Only
//! functions and the program open scopes; blocks share the scope of their
//! enclosing function.

use std::fmt;

use esscope_ast::Node;
use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;

use crate::scope_manager::ScopeManager;

/// Index of a scope inside its [`ScopeManager`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(u32);

impl ScopeId {
    /// The program-level scope. Always the first scope of a manager.
    pub const GLOBAL: ScopeId = ScopeId(0);

    pub(crate) fn from_index(index: usize) -> Self {
        ScopeId(index as u32)
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Global,
    Function,
}

impl fmt::Display for ScopeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScopeKind::Global => write!(f, "global"),
            ScopeKind::Function => write!(f, "function"),
        }
    }
}

pub(crate) type Bindings<'a> = IndexMap<&'a str, &'a Node<'a>, FxBuildHasher>;

/// One lexical scope.
#[derive(Debug)]
pub struct Scope<'a> {
    pub(crate) kind: ScopeKind,
    /// Name to declaring node, in first-declaration order.
    pub(crate) bindings: Bindings<'a>,
    pub(crate) parent: Option<ScopeId>,
    /// The function node that opened this scope; `None` for the global scope.
    pub(crate) owner: Option<&'a Node<'a>>,
}

impl<'a> Scope<'a> {
    pub(crate) fn new(kind: ScopeKind, parent: Option<ScopeId>, owner: Option<&'a Node<'a>>) -> Self {
        Self {
            kind,
            bindings: IndexMap::with_hasher(FxBuildHasher),
            parent,
            owner,
        }
    }

    /// Bind `name`, replacing any earlier binding of the same name.
    pub(crate) fn declare(&mut self, name: &'a str, node: &'a Node<'a>) -> Option<&'a Node<'a>> {
        self.bindings.insert(name, node)
    }
}

/// Outcome of looking a name up through the scope chain.
#[derive(Debug, Clone, Copy)]
pub enum Resolution<'a> {
    /// The name is bound; the payload is the declaring node.
    Resolved(&'a Node<'a>),
    Unresolved,
}

impl<'a> Resolution<'a> {
    pub fn is_resolved(&self) -> bool {
        matches!(self, Resolution::Resolved(_))
    }

    pub fn is_unresolved(&self) -> bool {
        matches!(self, Resolution::Unresolved)
    }

    pub fn node(&self) -> Option<&'a Node<'a>> {
        match self {
            Resolution::Resolved(node) => Some(node),
            Resolution::Unresolved => None,
        }
    }
}

/// Resolutions are equal when they name the very same declaring node.
impl PartialEq for Resolution<'_> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Resolution::Resolved(a), Resolution::Resolved(b)) => Node::same_node(a, b),
            (Resolution::Unresolved, Resolution::Unresolved) => true,
            _ => false,
        }
    }
}

/// A read-only view of one scope, borrowed from its manager.
#[derive(Clone, Copy)]
pub struct ScopeRef<'m, 'a> {
    manager: &'m ScopeManager<'a>,
    id: ScopeId,
}

impl<'m, 'a> ScopeRef<'m, 'a> {
    pub(crate) fn new(manager: &'m ScopeManager<'a>, id: ScopeId) -> Self {
        Self { manager, id }
    }

    fn data(&self) -> &'m Scope<'a> {
        self.manager.scope_data(self.id)
    }

    pub fn id(&self) -> ScopeId {
        self.id
    }

    pub fn kind(&self) -> ScopeKind {
        self.data().kind
    }

    pub fn parent(&self) -> Option<ScopeRef<'m, 'a>> {
        self.data().parent.map(|id| ScopeRef::new(self.manager, id))
    }

    pub fn owner(&self) -> Option<&'a Node<'a>> {
        self.data().owner
    }

    /// Bindings of this scope alone, in first-declaration order.
    pub fn bindings(&self) -> impl Iterator<Item = (&'a str, &'a Node<'a>)> + 'm {
        self.data().bindings.iter().map(|(name, node)| (*name, *node))
    }

    /// Look `name` up in this scope only.
    pub fn lookup(&self, name: &str) -> Option<&'a Node<'a>> {
        self.data().bindings.get(name).copied()
    }

    /// Look `name` up in this scope and then its ancestors.
    pub fn resolve_var(&self, name: &str) -> Resolution<'a> {
        self.manager.resolve_from(self.id, name)
    }

    pub fn len(&self) -> usize {
        self.data().bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data().bindings.is_empty()
    }
}

impl fmt::Debug for ScopeRef<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopeRef")
            .field("id", &self.id)
            .field("kind", &self.kind())
            .field("names", &self.bindings().map(|(name, _)| name).collect::<Vec<_>>())
            .finish()
    }
}
