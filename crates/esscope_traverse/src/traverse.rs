use esscope_ast::{Node, NodeKind};
use log::debug;

use crate::dispatch::Dispatcher;
use crate::error::TraverseError;
use crate::options::TraverseOptions;
use crate::scope::ScopeRef;
use crate::scope_manager::ScopeManager;

/// Result of a fallible visitor. An `Err` stops the walk.
pub type VisitResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// A resolved program together with the scopes built while walking it.
#[derive(Debug)]
pub struct Traversal<'a> {
    /// The same root that was passed in; its identifier slots now point at
    /// declaring nodes.
    pub program: &'a Node<'a>,
    pub scope_manager: ScopeManager<'a>,
}

impl<'a> Traversal<'a> {
    pub fn global_scope(&self) -> ScopeRef<'_, 'a> {
        self.scope_manager.global_scope()
    }

    pub fn unresolved_references(&self) -> &[(&'a str, &'a Node<'a>)] {
        self.scope_manager.unresolved_references()
    }
}

/// Walk `program`, resolving every identifier use in place, and call
/// `visitor` with the active scope for each node.
///
/// # Example
/// ```
/// use esscope_core::arena::AstArena;
/// use esscope_traverse::{traverse, TraverseOptions};
///
/// let arena = AstArena::new();
/// let program = esscope_parser::parse(&arena, "var a = 1;\na;").unwrap();
/// let traversal = traverse(&TraverseOptions::default(), program, |_, _| {}).unwrap();
/// assert!(traversal.global_scope().resolve_var("a").is_resolved());
/// ```
pub fn traverse<'a, F>(
    options: &TraverseOptions,
    program: &'a Node<'a>,
    mut visitor: F,
) -> Result<Traversal<'a>, TraverseError>
where
    F: FnMut(ScopeRef<'_, 'a>, &'a Node<'a>),
{
    try_traverse(options, program, |scope, node| {
        visitor(scope, node);
        Ok(())
    })
}

/// Like [`traverse`], but the visitor may fail. The first visitor error
/// aborts the walk and is returned as [`TraverseError::Visitor`].
pub fn try_traverse<'a, F>(
    options: &TraverseOptions,
    program: &'a Node<'a>,
    visitor: F,
) -> Result<Traversal<'a>, TraverseError>
where
    F: FnMut(ScopeRef<'_, 'a>, &'a Node<'a>) -> VisitResult,
{
    let NodeKind::Program(body) = &program.kind else {
        return Err(TraverseError::RootNotProgram {
            kind: program.syntax_name(),
        });
    };

    let mut scope_manager = ScopeManager::new();
    Dispatcher::new(&mut scope_manager, *options, visitor).dispatch_program(program, body)?;

    debug!(
        "traversal done: {} scope(s), {} global binding(s), {} unresolved reference(s)",
        scope_manager.scope_count(),
        scope_manager.global_scope().len(),
        scope_manager.unresolved_references().len()
    );
    Ok(Traversal {
        program,
        scope_manager,
    })
}
